//! Matcher: picks the profile skills and achievements that speak to the
//! posting's requirements.
//!
//! Pure keyword overlap, no LLM calls. Skills keep the profile's own order;
//! achievements are ranked by how many distinct requirement keywords they hit.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::models::ApplicantProfile;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Subset of a profile selected for one posting.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchResult {
    pub selected_skills: Vec<String>,
    pub selected_achievements: Vec<String>,
    /// Requirement keywords found anywhere in the profile, sorted.
    pub matched_keywords: Vec<String>,
}

pub const ACHIEVEMENT_CAP: usize = 3;
const MIN_KEYWORD_CHARS: usize = 3;

const STOP_WORDS: &[&str] = &[
    "and", "the", "for", "with", "you", "your", "our", "are", "will", "have", "has", "this",
    "that", "from", "into", "about", "able", "who", "all", "any", "not", "but", "can", "work",
    "working", "years", "year", "plus", "including", "strong", "good", "great", "excellent",
    "experience", "knowledge", "understanding", "ability", "skills", "must", "should", "such",
    "within", "across", "using", "use", "etc",
];

// ────────────────────────────────────────────────────────────────────────────
// Tokenisation
// ────────────────────────────────────────────────────────────────────────────

/// Lower-cased word tokens. `+`, `#` and `.` count as word characters so
/// "C++", "C#" and "Node.js" survive; a trailing sentence dot does not.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
        .map(|token| token.trim_end_matches('.'))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn contains_sequence(haystack: &[String], needle: &[String]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|window| window == needle)
}

fn requirement_keywords(requirements: &[Vec<String>]) -> BTreeSet<String> {
    requirements
        .iter()
        .flatten()
        .filter(|token| token.chars().count() >= MIN_KEYWORD_CHARS)
        .filter(|token| !STOP_WORDS.contains(&token.as_str()))
        .cloned()
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Matching
// ────────────────────────────────────────────────────────────────────────────

/// Selects relevant skills and up to `ACHIEVEMENT_CAP` achievements.
///
/// Never returns an empty skill list when the profile has skills: with no
/// overlap at all, the full skill set is used.
pub fn match_profile(requirements: &[String], profile: &ApplicantProfile) -> MatchResult {
    let requirement_tokens: Vec<Vec<String>> =
        requirements.iter().map(|r| tokenize(r)).collect();
    let keywords = requirement_keywords(&requirement_tokens);

    let mut selected_skills: Vec<String> = profile
        .skills
        .iter()
        .filter(|skill| {
            let skill_tokens = tokenize(skill);
            requirement_tokens
                .iter()
                .any(|req| contains_sequence(req, &skill_tokens))
        })
        .cloned()
        .collect();
    if selected_skills.is_empty() {
        selected_skills = profile.skills.clone();
    }

    let selected_achievements = select_achievements(&profile.achievements, &keywords);

    let profile_tokens: HashSet<String> = profile
        .skills
        .iter()
        .chain(profile.achievements.iter())
        .flat_map(|text| tokenize(text))
        .collect();
    let matched_keywords = keywords
        .into_iter()
        .filter(|keyword| profile_tokens.contains(keyword))
        .collect();

    MatchResult {
        selected_skills,
        selected_achievements,
        matched_keywords,
    }
}

/// Relevance = distinct requirement keywords present in the achievement.
/// Ties keep the profile's order. Zero-relevance achievements are only used
/// when nothing is relevant.
fn select_achievements(achievements: &[String], keywords: &BTreeSet<String>) -> Vec<String> {
    let mut scored: Vec<(usize, &String)> = achievements
        .iter()
        .map(|achievement| {
            let tokens: HashSet<String> = tokenize(achievement).into_iter().collect();
            let relevance = keywords.iter().filter(|k| tokens.contains(*k)).count();
            (relevance, achievement)
        })
        .collect();

    if scored.iter().any(|(relevance, _)| *relevance > 0) {
        scored.retain(|(relevance, _)| *relevance > 0);
        // sort_by is stable
        scored.sort_by(|a, b| b.0.cmp(&a.0));
    }

    scored
        .into_iter()
        .take(ACHIEVEMENT_CAP)
        .map(|(_, achievement)| achievement.clone())
        .collect()
}
