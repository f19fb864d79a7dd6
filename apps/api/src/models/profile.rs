use serde::{Deserialize, Serialize};

/// Applicant profile supplied with each generation request. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicantProfile {
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Signed so that negative input reaches validation instead of failing to parse.
    pub experience_years: i64,
    pub degree: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub previous_roles: Vec<String>,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub portfolio_url: Option<String>,
}
