use serde::{Deserialize, Serialize};

/// Substituted when no company name could be extracted.
pub const COMPANY_PLACEHOLDER: &str = "your organization";
/// Substituted when no job title could be extracted.
pub const TITLE_PLACEHOLDER: &str = "this position";

/// Structured fields recovered from a job-posting page.
///
/// `company_name` / `job_title` are `None` when no extraction strategy found a
/// plausible value. That is a degraded result, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub source_url: String,
    pub company_name: Option<String>,
    pub job_title: Option<String>,
    /// Deduplicated, first-seen order.
    pub requirements: Vec<String>,
    pub description: String,
    pub salary_range: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub industry: Option<String>,
    /// Visible page text; kept for matching, never sent back to clients.
    #[serde(skip_serializing, default)]
    pub raw_text: String,
}

impl JobPosting {
    pub fn company_or_placeholder(&self) -> &str {
        self.company_name.as_deref().unwrap_or(COMPANY_PLACEHOLDER)
    }

    pub fn title_or_placeholder(&self) -> &str {
        self.job_title.as_deref().unwrap_or(TITLE_PLACEHOLDER)
    }
}
