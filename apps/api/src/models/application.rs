use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::generation::style::CoverLetterStyle;
use crate::models::profile::ApplicantProfile;

fn default_style() -> String {
    CoverLetterStyle::Professional.as_str().to_string()
}

/// Request body for `POST /generate-application`.
///
/// `cover_letter_style` stays a raw string here so an unrecognised value can be
/// reported as `UNKNOWN_STYLE` rather than a generic body parse failure.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationRequest {
    pub job_url: String,
    pub user_profile: ApplicantProfile,
    #[serde(default = "default_style")]
    pub cover_letter_style: String,
    #[serde(default)]
    pub custom_message: Option<String>,
}

/// Result of one generation request. Ephemeral unless the store is enabled.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedApplication {
    pub application_id: Uuid,
    pub cover_letter_text: String,
    pub company_name: Option<String>,
    pub job_title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub enhanced: bool,
}

/// Metadata persisted next to a stored letter. Holds no applicant data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub application_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub source_url: String,
    pub company_name: Option<String>,
    pub job_title: Option<String>,
    pub style: CoverLetterStyle,
    pub enhanced: bool,
}
