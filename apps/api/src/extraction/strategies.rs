//! Ordered strategies for the title, company and description fields.

use std::sync::OnceLock;

use regex::Regex;
use scraper::Selector;
use serde_json::Value;

use crate::extraction::text::{
    block_texts, clean_text, first_selector_text, html_fragment_text, meta_content,
    truncate_chars, visible_text,
};
use crate::extraction::{Page, Strategy};

const MAX_TITLE_CHARS: usize = 150;
const MAX_COMPANY_CHARS: usize = 80;
pub const MAX_DESCRIPTION_CHARS: usize = 2000;

/// Call-to-action and navigation text that selectors sometimes pick up.
const NOISE_VALUES: &[&str] = &[
    "apply now",
    "apply",
    "click here",
    "more info",
    "sign in",
    "log in",
    "login",
    "jobs",
    "careers",
    "home",
];

// ────────────────────────────────────────────────────────────────────────────
// Strategy tables
// ────────────────────────────────────────────────────────────────────────────

pub const TITLE_STRATEGIES: &[Strategy] = &[
    ("json_ld", title_from_json_ld),
    ("board_selectors", title_from_board_selectors),
    ("og_title", title_from_og_meta),
    ("first_h1", title_from_h1),
    ("title_tag", title_from_title_tag),
];

pub const COMPANY_STRATEGIES: &[Strategy] = &[
    ("json_ld", company_from_json_ld),
    ("board_selectors", company_from_board_selectors),
    ("og_site_name", company_from_site_name),
    ("text_patterns", company_from_text_patterns),
];

/// Accepts a candidate if it is non-empty, within `max_chars` and not noise.
pub fn plausible(candidate: &str, max_chars: usize) -> Option<String> {
    let cleaned = clean_text(candidate);
    let cleaned = cleaned.trim_matches(|c: char| matches!(c, ':' | '|' | '-' | '–'));
    let cleaned = cleaned.trim();
    if cleaned.chars().count() < 2 || cleaned.chars().count() > max_chars {
        return None;
    }
    if NOISE_VALUES.contains(&cleaned.to_lowercase().as_str()) {
        return None;
    }
    Some(cleaned.to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Title
// ────────────────────────────────────────────────────────────────────────────

fn title_from_json_ld(page: &Page) -> Option<String> {
    let title = page.job_ld.as_ref()?.get("title")?.as_str()?;
    plausible(title, MAX_TITLE_CHARS)
}

fn title_from_board_selectors(page: &Page) -> Option<String> {
    let text = first_selector_text(
        &page.document,
        &[
            r#"h1[data-automation="job-detail-title"]"#, // SEEK
            "h1.jobsearch-JobInfoHeader-title",          // Indeed
            r#"[data-testid="job-title"]"#,
            ".job-title h1",
            ".job-header h1",
            "h1.job-title",
        ],
    )?;
    plausible(&text, MAX_TITLE_CHARS)
}

fn title_from_og_meta(page: &Page) -> Option<String> {
    let title = meta_content(&page.document, r#"meta[property="og:title"]"#)?;
    plausible(&strip_board_suffix(&title), MAX_TITLE_CHARS)
}

fn title_from_h1(page: &Page) -> Option<String> {
    let text = first_selector_text(&page.document, &["h1"])?;
    plausible(&text, MAX_TITLE_CHARS)
}

fn title_from_title_tag(page: &Page) -> Option<String> {
    let text = first_selector_text(&page.document, &["title"])?;
    plausible(&strip_board_suffix(&text), MAX_TITLE_CHARS)
}

/// Drops "- Jobs at X", "| Acme Careers" style suffixes from page titles.
pub fn strip_board_suffix(title: &str) -> String {
    static SUFFIX: OnceLock<Regex> = OnceLock::new();
    let suffix = SUFFIX.get_or_init(|| {
        Regex::new(r"(?i)\s*[-|–]\s*[^-|–]*\b(?:jobs?|careers?|hiring)\b.*$")
            .expect("valid title suffix regex")
    });
    suffix.replace(title, "").trim().to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// Company
// ────────────────────────────────────────────────────────────────────────────

fn company_from_json_ld(page: &Page) -> Option<String> {
    let org = page.job_ld.as_ref()?.get("hiringOrganization")?;
    let name = match org {
        Value::String(name) => name.as_str(),
        Value::Object(map) => map.get("name")?.as_str()?,
        _ => return None,
    };
    plausible(name, MAX_COMPANY_CHARS)
}

fn company_from_board_selectors(page: &Page) -> Option<String> {
    let text = first_selector_text(
        &page.document,
        &[
            r#"[data-automation="advertiser-name"]"#, // SEEK
            r#"[data-testid="company-name"]"#,
            r#"[data-company-name="true"]"#, // Indeed
            ".company-name",
            ".employer-name",
            ".company a",
        ],
    )?;
    plausible(&text, MAX_COMPANY_CHARS)
}

fn company_from_site_name(page: &Page) -> Option<String> {
    let name = meta_content(&page.document, r#"meta[property="og:site_name"]"#)?;
    plausible(&name, MAX_COMPANY_CHARS)
}

fn company_from_text_patterns(page: &Page) -> Option<String> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        // Up to five capitalised words: "Acme", "Acme Widgets & Co."
        let name = r"([A-Z][\w&'\.]*(?:\s+(?:&\s+)?[A-Z][\w&'\.]*){0,4})";
        [
            format!(r"(?:Company|Employer|Organization|Organisation):\s*{name}"),
            format!(r"{name}\s+(?:is hiring|is looking for|seeks)\b"),
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid company regex"))
        .collect()
    });

    // Per block, so a name never runs into the neighbouring heading or line.
    let blocks = block_texts(page.document.root_element());
    patterns.iter().find_map(|pattern| {
        blocks.iter().find_map(|block| {
            pattern
                .captures_iter(block)
                .filter_map(|caps| caps.get(1))
                .find_map(|m| plausible(m.as_str().trim_end_matches('.'), MAX_COMPANY_CHARS))
        })
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Description
// ────────────────────────────────────────────────────────────────────────────

/// Description text, capped at `MAX_DESCRIPTION_CHARS`. Never fails; falls back
/// to the main content area or the whole page.
pub fn extract_description(page: &Page) -> String {
    let description = description_from_json_ld(page)
        .or_else(|| {
            first_selector_text(
                &page.document,
                &[
                    r#"[data-automation="jobAdDetails"]"#,
                    "#jobDescriptionText",
                    ".jobsearch-jobDescriptionText",
                    ".job-description",
                    ".job-details",
                    ".description",
                ],
            )
        })
        .or_else(|| main_content_text(page))
        .unwrap_or_else(|| page.text.clone());

    truncate_chars(&description, MAX_DESCRIPTION_CHARS)
}

fn description_from_json_ld(page: &Page) -> Option<String> {
    let raw = page.job_ld.as_ref()?.get("description")?.as_str()?;
    let text = html_fragment_text(raw);
    (!text.is_empty()).then_some(text)
}

fn main_content_text(page: &Page) -> Option<String> {
    ["article", "main", "body"].iter().find_map(|tag| {
        let selector = Selector::parse(tag).ok()?;
        let element = page.document.select(&selector).next()?;
        let text = visible_text(element);
        (!text.is_empty()).then_some(text)
    })
}
