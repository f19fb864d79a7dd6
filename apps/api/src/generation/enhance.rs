//! Optional LLM polishing of a rendered letter.
//!
//! The template letter is always produced first. Polishing can only replace
//! it; any failure falls back to the template text.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::generation::generator::render_template;
use crate::llm_client::prompts::{POLISH_PROMPT_TEMPLATE, POLISH_SYSTEM};
use crate::llm_client::{LlmClient, LlmError};
use crate::models::JobPosting;

/// Pluggable polishing step. Production uses `LlmClient`; tests swap in fakes.
#[async_trait]
pub trait LetterPolisher: Send + Sync {
    async fn polish(&self, letter: &str, posting: &JobPosting) -> Result<String, LlmError>;
}

#[async_trait]
impl LetterPolisher for LlmClient {
    async fn polish(&self, letter: &str, posting: &JobPosting) -> Result<String, LlmError> {
        let requirements = if posting.requirements.is_empty() {
            "(none listed)".to_string()
        } else {
            posting
                .requirements
                .iter()
                .map(|r| format!("- {r}"))
                .collect::<Vec<_>>()
                .join("\n")
        };
        let values = HashMap::from([
            ("job_title", posting.title_or_placeholder().to_string()),
            ("company", posting.company_or_placeholder().to_string()),
            ("requirements", requirements),
            ("letter", letter.to_string()),
        ]);
        let prompt = render_template(POLISH_PROMPT_TEMPLATE, &values);
        self.complete(POLISH_SYSTEM, &prompt).await
    }
}

/// Returns `(letter, enhanced)`. Falls back to `letter` on error or on a
/// blank answer.
pub async fn polish_or_fallback(
    polisher: &dyn LetterPolisher,
    letter: &str,
    posting: &JobPosting,
) -> (String, bool) {
    match polisher.polish(letter, posting).await {
        Ok(polished) if !polished.trim().is_empty() => {
            info!("Letter polished ({} -> {} chars)", letter.len(), polished.len());
            (polished.trim().to_string(), true)
        }
        Ok(_) => {
            warn!("Polisher returned an empty letter, using template output");
            (letter.to_string(), false)
        }
        Err(e) => {
            warn!("Letter polishing failed, using template output: {e}");
            (letter.to_string(), false)
        }
    }
}
