//! Extractor: recovers a `JobPosting` from uncontrolled job-board markup.
//!
//! Each field is resolved by its own ordered list of strategies: structured
//! metadata first, then board-specific selectors, then generic fallbacks.
//! The first strategy that yields a plausible value wins. A field that no
//! strategy can fill stays `None`; extraction itself never fails.
//!
//! Everything here is synchronous. `scraper::Html` is not `Send`, so the
//! document must never be held across an `.await`.

pub mod details;
pub mod requirements;
pub mod strategies;
pub mod text;

use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, info};

use crate::models::JobPosting;

/// A parsed page plus the derived views most strategies need.
pub struct Page {
    pub document: Html,
    /// Visible text of the whole document, whitespace-collapsed.
    pub text: String,
    /// The first schema.org `JobPosting` object found in JSON-LD, if any.
    pub job_ld: Option<Value>,
}

impl Page {
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let text = text::visible_text(document.root_element());
        let job_ld = find_job_ld(&document);
        Self {
            document,
            text,
            job_ld,
        }
    }
}

/// A named extraction strategy for one field.
pub type Strategy = (&'static str, fn(&Page) -> Option<String>);

/// Runs `strategies` in order and returns the first value produced.
pub fn first_match(page: &Page, strategies: &[Strategy], field: &str) -> Option<String> {
    for (name, strategy) in strategies {
        if let Some(value) = strategy(page) {
            debug!("{field} resolved by strategy '{name}'");
            return Some(value);
        }
    }
    debug!("{field}: no strategy matched");
    None
}

/// Extracts every field of a job posting from raw HTML.
pub fn extract_job_posting(html: &str, source_url: &str) -> JobPosting {
    let page = Page::parse(html);

    let job_title = first_match(&page, strategies::TITLE_STRATEGIES, "job_title");
    let company_name = first_match(&page, strategies::COMPANY_STRATEGIES, "company_name");
    let description = strategies::extract_description(&page);
    let requirements = requirements::extract_requirements(&page, &description);

    let posting = JobPosting {
        source_url: source_url.to_string(),
        salary_range: details::extract_salary(&page),
        location: details::extract_location(&page),
        job_type: details::extract_job_type(&page),
        industry: details::detect_industry(&page.text, company_name.as_deref()),
        company_name,
        job_title,
        requirements,
        description,
        raw_text: page.text,
    };

    info!(
        "Extracted posting from {}: title={:?} company={:?} requirements={}",
        source_url,
        posting.job_title,
        posting.company_name,
        posting.requirements.len()
    );

    posting
}

fn find_job_ld(document: &Html) -> Option<Value> {
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;
    document.select(&selector).find_map(|script| {
        let raw: String = script.text().collect();
        let value: Value = serde_json::from_str(raw.trim()).ok()?;
        find_job_posting_node(&value).cloned()
    })
}

/// Depth-first search for an object whose `@type` is (or includes) `JobPosting`.
fn find_job_posting_node(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_job_posting_node),
        Value::Object(map) => {
            let is_job = match map.get("@type") {
                Some(Value::String(t)) => t == "JobPosting",
                Some(Value::Array(types)) => types.iter().any(|t| t == "JobPosting"),
                _ => false,
            };
            if is_job {
                return Some(value);
            }
            map.get("@graph").and_then(find_job_posting_node)
        }
        _ => None,
    }
}
