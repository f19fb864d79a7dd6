// Cover letter generation.
// Implements: style selection, profile matching, template rendering and
// optional LLM polishing. All LLM calls go through llm_client.

pub mod enhance;
pub mod generator;
pub mod handlers;
pub mod matcher;
pub mod style;
pub mod templates;
