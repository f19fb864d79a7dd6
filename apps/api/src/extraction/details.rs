//! Secondary posting details: salary, location, employment type and industry.
//! All best-effort; a missing value is never an error.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::extraction::strategies::plausible;
use crate::extraction::text::first_selector_text;
use crate::extraction::Page;

const MAX_DETAIL_CHARS: usize = 100;

/// Keyword families, checked in order; the first family with a hit wins.
const INDUSTRY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "technology",
        &["software", "tech", "technology", "digital", "computer", "saas"],
    ),
    (
        "finance",
        &["bank", "banking", "finance", "financial", "investment", "accounting"],
    ),
    (
        "healthcare",
        &["health", "healthcare", "medical", "hospital", "pharmaceutical"],
    ),
    (
        "education",
        &["university", "school", "education", "academic"],
    ),
    ("retail", &["retail", "store", "shop", "commerce", "ecommerce"]),
];

// ────────────────────────────────────────────────────────────────────────────
// Salary
// ────────────────────────────────────────────────────────────────────────────

pub fn extract_salary(page: &Page) -> Option<String> {
    if let Some(salary) = page
        .job_ld
        .as_ref()
        .and_then(|ld| ld.get("baseSalary"))
        .and_then(salary_from_json_ld)
    {
        return Some(salary);
    }

    if let Some(text) = first_selector_text(
        &page.document,
        &[r#"[data-automation="job-detail-salary"]"#, ".salary"],
    ) {
        if let Some(salary) = plausible(&text, MAX_DETAIL_CHARS) {
            return Some(salary);
        }
    }

    salary_from_text(&page.text)
}

fn salary_from_json_ld(base: &Value) -> Option<String> {
    let currency = base.get("currency").and_then(Value::as_str).unwrap_or("");
    let value = base.get("value").unwrap_or(base);

    let amount = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Object(_) => {
            let min = value.get("minValue").map(json_amount);
            let max = value.get("maxValue").map(json_amount);
            match (min, max, value.get("value").map(json_amount)) {
                (Some(min), Some(max), _) => format!("{min} - {max}"),
                (Some(only), None, _) | (None, Some(only), _) | (None, None, Some(only)) => only,
                _ => return None,
            }
        }
        _ => return None,
    };

    let unit = value
        .get("unitText")
        .and_then(Value::as_str)
        .map(|u| format!(" per {}", u.to_lowercase()))
        .unwrap_or_default();

    let salary = format!("{currency} {amount}{unit}");
    plausible(&salary, MAX_DETAIL_CHARS)
}

fn json_amount(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn salary_from_text(text: &str) -> Option<String> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        [
            r"(?i)\$[\d,]+k?(?:\s*(?:-|–|to)\s*\$[\d,]+k?)?(?:\s*(?:per\s+(?:year|annum|hour)|annually|p\.?a\.?\b|an hour))?",
            r"(?i)[\d,]+k?\s*-\s*[\d,]+k?\s*(?:per\s+(?:year|annum)|annually|p\.?a\.?\b)",
            r"(?i)salary:?\s*([^.\n]+)",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid salary regex"))
        .collect()
    });

    patterns.iter().find_map(|pattern| {
        let caps = pattern.captures(text)?;
        let found = caps.get(1).or_else(|| caps.get(0))?;
        plausible(found.as_str(), MAX_DETAIL_CHARS)
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Location
// ────────────────────────────────────────────────────────────────────────────

pub fn extract_location(page: &Page) -> Option<String> {
    if let Some(location) = page.job_ld.as_ref().and_then(location_from_json_ld) {
        return Some(location);
    }

    let text = first_selector_text(
        &page.document,
        &[
            r#"[data-automation="job-detail-location"]"#,
            ".location",
            ".job-location",
            r#"[data-testid="location"]"#,
        ],
    )?;
    plausible(&text, MAX_DETAIL_CHARS)
}

fn location_from_json_ld(ld: &Value) -> Option<String> {
    let place = match ld.get("jobLocation") {
        Some(Value::Array(places)) => places.first(),
        Some(place) => Some(place),
        None => None,
    };

    let from_address = place.and_then(|place| match place.get("address")? {
        Value::String(address) => plausible(address, MAX_DETAIL_CHARS),
        address => {
            let parts: Vec<&str> = ["addressLocality", "addressRegion", "addressCountry"]
                .iter()
                .filter_map(|key| match address.get(*key)? {
                    Value::String(s) => Some(s.as_str()),
                    Value::Object(country) => country.get("name")?.as_str(),
                    _ => None,
                })
                .filter(|part| !part.trim().is_empty())
                .collect();
            plausible(&parts.join(", "), MAX_DETAIL_CHARS)
        }
    });

    from_address.or_else(|| {
        let remote = ld.get("jobLocationType")?.as_str()? == "TELECOMMUTE";
        remote.then(|| "Remote".to_string())
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Employment type
// ────────────────────────────────────────────────────────────────────────────

pub fn extract_job_type(page: &Page) -> Option<String> {
    let from_ld = page
        .job_ld
        .as_ref()
        .and_then(|ld| match ld.get("employmentType")? {
            Value::String(kind) => Some(kind.clone()),
            Value::Array(kinds) => kinds.first()?.as_str().map(str::to_string),
            _ => None,
        })
        .map(|kind| employment_type_label(&kind));
    if from_ld.is_some() {
        return from_ld;
    }

    static JOB_TYPE: OnceLock<Regex> = OnceLock::new();
    let pattern = JOB_TYPE.get_or_init(|| {
        Regex::new(r"(?i)\b(full[- ]time|part[- ]time|contract|temporary|permanent|casual)\b")
            .expect("valid job type regex")
    });
    let found = pattern.captures(&page.text)?.get(1)?.as_str();
    Some(title_case_hyphenated(&found.replace(' ', "-")))
}

/// Maps schema.org employment types ("FULL_TIME") to display labels.
fn employment_type_label(kind: &str) -> String {
    match kind.trim().to_uppercase().as_str() {
        "FULL_TIME" => "Full-Time".to_string(),
        "PART_TIME" => "Part-Time".to_string(),
        "CONTRACTOR" => "Contract".to_string(),
        "TEMPORARY" => "Temporary".to_string(),
        "INTERN" => "Internship".to_string(),
        other => title_case_hyphenated(&other.replace('_', "-")),
    }
}

/// "full-time" -> "Full-Time"
fn title_case_hyphenated(value: &str) -> String {
    value
        .split('-')
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join("-")
}

fn title_case_word(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Industry
// ────────────────────────────────────────────────────────────────────────────

/// Guesses the industry from whole-word keyword hits in the page text and
/// company name.
pub fn detect_industry(text: &str, company_name: Option<&str>) -> Option<String> {
    let haystack = format!("{} {}", text, company_name.unwrap_or("")).to_lowercase();
    let tokens: Vec<&str> = haystack
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    INDUSTRY_KEYWORDS
        .iter()
        .find(|(_, keywords)| tokens.iter().any(|t| keywords.contains(t)))
        .map(|(industry, _)| title_case_word(industry))
}
