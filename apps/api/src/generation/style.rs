//! Cover letter styles. Each style owns one template; there is no fallback
//! style for unrecognised input.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::generation::templates;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverLetterStyle {
    Professional,
    Creative,
    Technical,
}

impl CoverLetterStyle {
    pub const ALL: [CoverLetterStyle; 3] = [Self::Professional, Self::Creative, Self::Technical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Professional => "professional",
            Self::Creative => "creative",
            Self::Technical => "technical",
        }
    }

    /// The letter template for this style.
    pub fn template(&self) -> &'static str {
        match self {
            Self::Professional => templates::PROFESSIONAL_TEMPLATE,
            Self::Creative => templates::CREATIVE_TEMPLATE,
            Self::Technical => templates::TECHNICAL_TEMPLATE,
        }
    }

    /// Salutation used when the company name is known.
    pub fn greeting(&self, company: Option<&str>) -> String {
        match (self, company) {
            (Self::Professional, Some(company)) => format!("Dear Hiring Manager at {company},"),
            (Self::Professional, None) => "Dear Hiring Manager,".to_string(),
            (Self::Creative, Some(company)) => format!("Hello {company} Team!"),
            (Self::Creative, None) => "Hello there!".to_string(),
            (Self::Technical, Some(company)) => format!("Dear {company} Engineering Team,"),
            (Self::Technical, None) => "Dear Engineering Team,".to_string(),
        }
    }
}

impl fmt::Display for CoverLetterStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoverLetterStyle {
    type Err = AppError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim();
        Self::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AppError::UnknownStyle(raw.to_string()))
    }
}
