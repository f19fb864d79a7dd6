//! Cover letter generation: orchestrates the full pipeline.
//!
//! Flow: fetch → extract → match → render → optional polish → store → return.
//!
//! Rendering is a pure function of its inputs. The application id and
//! timestamp are assigned afterwards, so identical requests produce identical
//! letter text but distinct ids.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::extract_job_posting;
use crate::fetcher::Fetcher;
use crate::generation::enhance::{polish_or_fallback, LetterPolisher};
use crate::generation::matcher::{match_profile, MatchResult};
use crate::generation::style::CoverLetterStyle;
use crate::models::job::{COMPANY_PLACEHOLDER, TITLE_PLACEHOLDER};
use crate::models::{ApplicantProfile, ApplicationRecord, GeneratedApplication, JobPosting};
use crate::store::ApplicationStore;
use crate::validation::ValidatedRequest;

const BULLET: &str = "•";
const SKILLS_FALLBACK: &str = "a broad range of professional skills";
const DEFAULT_ATTRACTION: &str = "your commitment to excellence and growth";

// ────────────────────────────────────────────────────────────────────────────
// Rendering
// ────────────────────────────────────────────────────────────────────────────

/// Fills `{slot}` placeholders in one left-to-right pass.
///
/// Substituted values are never scanned again, so user text containing braces
/// comes through verbatim. Unknown slots are left as written.
pub fn render_template(template: &str, values: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len() * 2);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let slot = after
            .find('}')
            .map(|close| &after[..close])
            .filter(|name| {
                !name.is_empty() && name.chars().all(|c| c.is_ascii_lowercase() || c == '_')
            });

        match slot.and_then(|name| values.get(name).map(|value| (name, value))) {
            Some((name, value)) => {
                out.push_str(value);
                rest = &after[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Strips trailing spaces and collapses the blank lines left by empty blocks.
fn tidy_letter(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim_end) {
        let blank = line.is_empty();
        if blank && lines.last().map_or(true, |prev| prev.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

/// "A", "A and B", "A, B and C"
fn join_list(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [head @ .., last] => format!("{} and {}", head.join(", "), last),
    }
}

fn bullets(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("{BULLET} {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn years_phrase(years: i64) -> String {
    if years == 1 {
        "1 year".to_string()
    } else {
        format!("{years} years")
    }
}

/// Why the applicant is drawn to this employer: industry first, then a
/// senior/lead title, then a generic reason.
pub fn attraction_reason(posting: &JobPosting) -> String {
    if let Some(industry) = &posting.industry {
        return format!(
            "your reputation for innovation in the {} sector",
            industry.to_lowercase()
        );
    }
    if let Some(title) = &posting.job_title {
        let lowered = title.to_lowercase();
        let senior = lowered
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == "senior" || word == "lead");
        if senior {
            return format!("the challenging nature of the {title} role");
        }
    }
    DEFAULT_ATTRACTION.to_string()
}

/// Renders the cover letter for one posting and profile.
///
/// Deterministic: identical inputs always produce byte-identical output.
pub fn generate_cover_letter(
    posting: &JobPosting,
    profile: &ApplicantProfile,
    matched: &MatchResult,
    style: CoverLetterStyle,
    custom_message: Option<&str>,
) -> String {
    let skills = &matched.selected_skills;
    let achievements = &matched.selected_achievements;
    let roles = &profile.previous_roles;

    let skills_text = match style {
        CoverLetterStyle::Technical if skills.is_empty() => format!("{BULLET} {SKILLS_FALLBACK}"),
        _ if skills.is_empty() => SKILLS_FALLBACK.to_string(),
        CoverLetterStyle::Technical => bullets(skills),
        _ => join_list(skills),
    };
    let top_skills = if skills.is_empty() {
        SKILLS_FALLBACK.to_string()
    } else {
        join_list(&skills[..skills.len().min(3)])
    };

    let roles_text = match (style, roles.is_empty()) {
        (_, true) => String::new(),
        (CoverLetterStyle::Professional, false) => {
            format!("In my previous roles as {}, ", join_list(roles))
        }
        (CoverLetterStyle::Creative, false) => {
            format!("{BULLET} Proven track record in {}\n", join_list(roles))
        }
        (CoverLetterStyle::Technical, false) => {
            format!("Professional Background:\n{}", bullets(roles))
        }
    };

    let achievements_text = match (style, achievements.is_empty()) {
        (_, true) => String::new(),
        (CoverLetterStyle::Professional, false) => {
            format!("Some of my key achievements include:\n{}", bullets(achievements))
        }
        (CoverLetterStyle::Creative, false) => format!("{}\n", bullets(achievements)),
        (CoverLetterStyle::Technical, false) => {
            format!("Key Technical Achievements:\n{}", bullets(achievements))
        }
    };

    let custom_text = match (style, custom_message) {
        (_, None) => String::new(),
        (CoverLetterStyle::Technical, Some(message)) => format!("Technical Note: {message}"),
        (_, Some(message)) => message.to_string(),
    };

    let portfolio_label = match style {
        CoverLetterStyle::Technical => "Portfolio/GitHub",
        _ => "Portfolio",
    };
    let links = [
        profile
            .linkedin_url
            .as_ref()
            .map(|url| format!("LinkedIn: {url}")),
        profile
            .portfolio_url
            .as_ref()
            .map(|url| format!("{portfolio_label}: {url}")),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join("\n");

    let role = match &posting.job_title {
        Some(title) => format!("the {title} role"),
        None => TITLE_PLACEHOLDER.to_string(),
    };
    let company_possessive = match &posting.company_name {
        Some(company) => format!("{company}'s"),
        None => format!("{COMPANY_PLACEHOLDER}'s"),
    };

    let values: HashMap<&str, String> = HashMap::from([
        ("greeting", style.greeting(posting.company_name.as_deref())),
        ("role", role),
        ("company", posting.company_or_placeholder().to_string()),
        ("company_possessive", company_possessive),
        ("experience", years_phrase(profile.experience_years)),
        ("degree", profile.degree.clone()),
        ("skills", skills_text),
        ("top_skills", top_skills),
        ("roles", roles_text),
        ("achievements", achievements_text),
        ("attraction_reason", attraction_reason(posting)),
        ("custom_message", custom_text),
        ("name", profile.name.clone()),
        ("email", profile.email.clone()),
        ("phone", profile.phone.clone()),
        ("links", links),
    ]);

    tidy_letter(&render_template(style.template(), &values))
}

// ────────────────────────────────────────────────────────────────────────────
// Generation pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Runs fetch → extract → match → render for one validated request.
///
/// Polishing is optional and never fails the request. When a store is
/// configured the letter and its metadata are written under the new id; a
/// failed write is logged and the letter is still returned.
pub async fn generate_application(
    fetcher: &Fetcher,
    polisher: Option<&dyn LetterPolisher>,
    store: Option<&ApplicationStore>,
    request: ValidatedRequest,
) -> Result<GeneratedApplication, AppError> {
    let page = fetcher.fetch(request.job_url.as_str()).await?;
    info!(
        "Generating {} letter for {} (cached page: {})",
        request.style, page.url, page.from_cache
    );

    // Extraction, matching and rendering are synchronous; the parsed document
    // is dropped before the next await.
    let (posting, letter) = {
        let posting = extract_job_posting(&page.html, page.url.as_str());
        let matched = match_profile(&posting.requirements, &request.profile);
        info!(
            "Matched {} skills, {} achievements, keywords={:?}",
            matched.selected_skills.len(),
            matched.selected_achievements.len(),
            matched.matched_keywords
        );
        let letter = generate_cover_letter(
            &posting,
            &request.profile,
            &matched,
            request.style,
            request.custom_message.as_deref(),
        );
        (posting, letter)
    };

    let (cover_letter_text, enhanced) = match polisher {
        Some(polisher) => polish_or_fallback(polisher, &letter, &posting).await,
        None => (letter, false),
    };

    let application = GeneratedApplication {
        application_id: Uuid::new_v4(),
        cover_letter_text,
        company_name: posting.company_name.clone(),
        job_title: posting.job_title.clone(),
        created_at: Utc::now(),
        enhanced,
    };

    if let Some(store) = store {
        let record = ApplicationRecord {
            application_id: application.application_id,
            created_at: application.created_at,
            source_url: posting.source_url.clone(),
            company_name: posting.company_name.clone(),
            job_title: posting.job_title.clone(),
            style: request.style,
            enhanced,
        };
        if let Err(e) = store.save(&record, &application.cover_letter_text).await {
            warn!(
                "Failed to store application {}: {e}",
                application.application_id
            );
        }
    }

    info!("Generated application {}", application.application_id);
    Ok(application)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::sample_profile;

    fn posting() -> JobPosting {
        JobPosting {
            source_url: "https://jobs.example.com/1".to_string(),
            company_name: Some("Globex".to_string()),
            job_title: Some("Senior Backend Engineer".to_string()),
            requirements: vec!["Python".to_string(), "Kubernetes".to_string()],
            ..Default::default()
        }
    }

    fn matched() -> MatchResult {
        MatchResult {
            selected_skills: vec!["Python".to_string(), "Kubernetes".to_string()],
            selected_achievements: vec![
                "Migrated 30 services to Kubernetes with zero downtime".to_string(),
            ],
            matched_keywords: vec!["kubernetes".to_string(), "python".to_string()],
        }
    }

    #[test]
    fn test_render_is_single_pass() {
        let values = HashMap::from([
            ("name", "{email}".to_string()),
            ("email", "grace@example.com".to_string()),
        ]);
        assert_eq!(
            render_template("Hi {name} <{email}> {unknown} {", &values),
            "Hi {email} <grace@example.com> {unknown} {"
        );
    }

    #[test]
    fn test_join_list_forms() {
        let items = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(join_list(&items(&[])), "");
        assert_eq!(join_list(&items(&["Go"])), "Go");
        assert_eq!(join_list(&items(&["Go", "Rust"])), "Go and Rust");
        assert_eq!(join_list(&items(&["Go", "Rust", "C"])), "Go, Rust and C");
    }

    #[test]
    fn test_professional_letter_contents() {
        let letter = generate_cover_letter(
            &posting(),
            &sample_profile(),
            &matched(),
            CoverLetterStyle::Professional,
            None,
        );
        assert!(letter.starts_with("Dear Hiring Manager at Globex,"));
        assert!(letter.contains("the Senior Backend Engineer role at Globex"));
        assert!(letter.contains("expertise in Python and Kubernetes"));
        assert!(letter.contains("In my previous roles as Backend Engineer, "));
        assert!(letter.contains("• Migrated 30 services to Kubernetes with zero downtime"));
        assert!(letter.contains("help drive Globex's continued success"));
        assert!(letter.ends_with("+1 (555) 010-2030"));
        assert!(!letter.contains("\n\n\n"));
    }

    #[test]
    fn test_technical_letter_lists_skills_as_bullets() {
        let letter = generate_cover_letter(
            &posting(),
            &sample_profile(),
            &matched(),
            CoverLetterStyle::Technical,
            Some("Happy to share code samples."),
        );
        assert!(letter.starts_with("Dear Globex Engineering Team,"));
        assert!(letter.contains("Technical Expertise:\n• Python\n• Kubernetes"));
        assert!(letter.contains("Key Technical Achievements:"));
        assert!(letter.contains("Technical Note: Happy to share code samples."));
        assert!(letter.contains("the challenging nature of the Senior Backend Engineer role"));
    }

    #[test]
    fn test_creative_letter_bullets_stay_together() {
        let letter = generate_cover_letter(
            &posting(),
            &sample_profile(),
            &matched(),
            CoverLetterStyle::Creative,
            None,
        );
        assert!(letter.starts_with("Hello Globex Team!"));
        assert!(letter.contains(
            "• MSc Computer Science with hands-on experience in Python and Kubernetes\n\
             • Proven track record in Backend Engineer\n\
             • Migrated 30 services to Kubernetes with zero downtime\n\nI'm not"
        ));
    }

    #[test]
    fn test_missing_company_and_title_use_placeholders() {
        let mut posting = posting();
        posting.company_name = None;
        posting.job_title = None;
        for style in CoverLetterStyle::ALL {
            let letter =
                generate_cover_letter(&posting, &sample_profile(), &matched(), style, None);
            assert!(letter.contains("this position"), "{style}: {letter}");
            assert!(letter.contains("your organization"), "{style}: {letter}");
            assert!(!letter.contains(" ,"), "{style}: {letter}");
            assert!(!letter.contains("  "), "{style}: {letter}");
            assert!(!letter.contains('{'), "{style}: {letter}");
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let render = || {
            generate_cover_letter(
                &posting(),
                &sample_profile(),
                &matched(),
                CoverLetterStyle::Creative,
                Some("See you soon {name}"),
            )
        };
        assert_eq!(render(), render());
        assert!(render().contains("See you soon {name}"));
    }

    #[test]
    fn test_attraction_reason_order() {
        let mut p = posting();
        p.industry = Some("Technology".to_string());
        assert_eq!(
            attraction_reason(&p),
            "your reputation for innovation in the technology sector"
        );
        p.industry = None;
        assert!(attraction_reason(&p).contains("Senior Backend Engineer"));
        p.job_title = Some("Leadership Coach".to_string());
        assert_eq!(attraction_reason(&p), DEFAULT_ATTRACTION);
    }

    #[test]
    fn test_empty_skills_never_render_blank() {
        let mut matched = matched();
        matched.selected_skills.clear();
        let letter = generate_cover_letter(
            &posting(),
            &sample_profile(),
            &matched,
            CoverLetterStyle::Professional,
            None,
        );
        assert!(letter.contains("expertise in a broad range of professional skills"));
    }
}
