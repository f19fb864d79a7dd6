//! Request validation: normalizes the applicant profile and collects every
//! failing field before any network access happens.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::errors::{AppError, FieldError};
use crate::fetcher::normalize_url;
use crate::generation::style::CoverLetterStyle;
use crate::models::{ApplicantProfile, GenerationRequest};

pub const MAX_EXPERIENCE_YEARS: i64 = 50;
const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;
const MAX_CUSTOM_MESSAGE_CHARS: usize = 2000;

/// A request that passed validation, ready for the pipeline.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub job_url: Url,
    pub profile: ApplicantProfile,
    pub style: CoverLetterStyle,
    pub custom_message: Option<String>,
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"))
}

/// Trims every field, drops blank list items and collapses duplicate skills
/// (case-insensitive, first spelling wins).
pub fn normalize_profile(profile: ApplicantProfile) -> ApplicantProfile {
    let mut seen = HashSet::new();
    let skills = clean_list(profile.skills)
        .into_iter()
        .filter(|skill| seen.insert(skill.to_lowercase()))
        .collect();

    ApplicantProfile {
        name: profile.name.trim().to_string(),
        email: profile.email.trim().to_string(),
        phone: profile.phone.trim().to_string(),
        experience_years: profile.experience_years,
        degree: profile.degree.trim().to_string(),
        skills,
        previous_roles: clean_list(profile.previous_roles),
        achievements: clean_list(profile.achievements),
        linkedin_url: clean_optional(profile.linkedin_url),
        portfolio_url: clean_optional(profile.portfolio_url),
    }
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validates a normalized profile. Field names are prefixed with `prefix`.
pub fn validate_profile(profile: &ApplicantProfile, prefix: &str) -> Vec<FieldError> {
    let field = |name: &str| format!("{prefix}{name}");
    let mut errors = Vec::new();

    if profile.name.is_empty() {
        errors.push(FieldError::new(field("name"), "is required"));
    }

    if profile.email.is_empty() {
        errors.push(FieldError::new(field("email"), "is required"));
    } else if !email_pattern().is_match(&profile.email) {
        errors.push(FieldError::new(
            field("email"),
            "must be a valid email address",
        ));
    }

    if let Some(message) = phone_problem(&profile.phone) {
        errors.push(FieldError::new(field("phone"), message));
    }

    if !(0..=MAX_EXPERIENCE_YEARS).contains(&profile.experience_years) {
        errors.push(FieldError::new(
            field("experience_years"),
            format!("must be between 0 and {MAX_EXPERIENCE_YEARS}"),
        ));
    }

    if profile.degree.is_empty() {
        errors.push(FieldError::new(field("degree"), "is required"));
    }

    for (name, value) in [
        ("linkedin_url", &profile.linkedin_url),
        ("portfolio_url", &profile.portfolio_url),
    ] {
        if let Some(url) = value {
            if let Err(message) = normalize_url(url) {
                errors.push(FieldError::new(field(name), message));
            }
        }
    }

    errors
}

fn phone_problem(phone: &str) -> Option<String> {
    if phone.is_empty() {
        return Some("is required".to_string());
    }
    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | '.' | ' '))
    {
        return Some("may only contain digits, spaces and + - ( ) .".to_string());
    }
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
        return Some(format!(
            "must contain between {MIN_PHONE_DIGITS} and {MAX_PHONE_DIGITS} digits"
        ));
    }
    None
}

/// Validates a generation request.
///
/// Field problems are reported together as `InvalidInput`; the style is only
/// checked once every field is valid.
pub fn validate_request(request: GenerationRequest) -> Result<ValidatedRequest, AppError> {
    let profile = normalize_profile(request.user_profile);
    let mut errors = Vec::new();

    let job_url = match normalize_url(&request.job_url) {
        Ok(url) => Some(url),
        Err(message) => {
            errors.push(FieldError::new("job_url", message));
            None
        }
    };

    errors.extend(validate_profile(&profile, "user_profile."));

    let custom_message = clean_optional(request.custom_message);
    if custom_message
        .as_ref()
        .is_some_and(|m| m.chars().count() > MAX_CUSTOM_MESSAGE_CHARS)
    {
        errors.push(FieldError::new(
            "custom_message",
            format!("must be at most {MAX_CUSTOM_MESSAGE_CHARS} characters"),
        ));
    }

    let job_url = match job_url {
        Some(url) if errors.is_empty() => url,
        _ => return Err(AppError::InvalidInput(errors)),
    };

    let style: CoverLetterStyle = request.cover_letter_style.parse()?;

    Ok(ValidatedRequest {
        job_url,
        profile,
        style,
        custom_message,
    })
}

#[cfg(test)]
pub(crate) fn sample_profile() -> ApplicantProfile {
    ApplicantProfile {
        name: "Grace Hopper".to_string(),
        email: "grace@example.com".to_string(),
        phone: "+1 (555) 010-2030".to_string(),
        experience_years: 8,
        degree: "MSc Computer Science".to_string(),
        skills: vec![
            "Python".to_string(),
            "Kubernetes".to_string(),
            "PostgreSQL".to_string(),
        ],
        previous_roles: vec!["Backend Engineer".to_string()],
        achievements: vec![
            "Cut API latency by 40% by redesigning the caching layer".to_string(),
            "Migrated 30 services to Kubernetes with zero downtime".to_string(),
        ],
        linkedin_url: None,
        portfolio_url: None,
    }
}
