//! Requirement extraction: structured JSON-LD lists first, then section
//! lists, then inline phrases, then keyword bullets anywhere on the page.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use crate::extraction::text::{clean_text, html_fragment_text, visible_text};
use crate::extraction::Page;

pub const MAX_REQUIREMENTS: usize = 10;
const MAX_ITEM_CHARS: usize = 300;
const MAX_HEADING_WORDS: usize = 6;
const PARENT_CLIMB_LIMIT: usize = 2;

/// Lower-cased phrases that mark a requirements-like section heading.
const SECTION_KEYWORDS: &[&str] = &[
    "requirement",
    "qualification",
    "responsibilit",
    "skills",
    "what you'll need",
    "what you\u{2019}ll need",
    "what you will need",
    "you will need",
    "must have",
    "what we're looking for",
    "about you",
];

/// Trailing words that make a heading a job title, not a section label.
const ROLE_NOUNS: &[&str] = &[
    "engineer",
    "developer",
    "manager",
    "analyst",
    "specialist",
    "architect",
    "designer",
    "scientist",
    "consultant",
    "officer",
    "administrator",
    "coordinator",
    "technician",
    "lead",
    "intern",
];

/// schema.org `JobPosting` properties that list requirements, by priority.
const JSON_LD_FIELDS: &[&str] = &[
    "qualifications",
    "skills",
    "experienceRequirements",
    "educationRequirements",
    "responsibilities",
];

/// Words that make a stray bullet look like a requirement.
const BULLET_KEYWORDS: &[&str] = &[
    "experience",
    "skill",
    "knowledge",
    "degree",
    "certification",
    "proficien",
];

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Ordered, de-duplicated requirement statements, capped at `MAX_REQUIREMENTS`.
pub fn extract_requirements(page: &Page, description: &str) -> Vec<String> {
    let mut found = json_ld_items(page);

    if found.is_empty() {
        found = section_items(&page.document);
    }

    if found.is_empty() {
        if let Some(fragment) = page
            .job_ld
            .as_ref()
            .and_then(|ld| ld.get("description"))
            .and_then(|d| d.as_str())
        {
            found = section_items(&Html::parse_fragment(fragment));
        }
    }

    if found.is_empty() {
        found = inline_items(description);
        if found.is_empty() {
            found = inline_items(&page.text);
        }
    }

    if found.is_empty() {
        found = keyword_bullets(&page.document);
    }

    dedupe_and_cap(found)
}

// ────────────────────────────────────────────────────────────────────────────
// Structured data
// ────────────────────────────────────────────────────────────────────────────

fn json_ld_items(page: &Page) -> Vec<String> {
    let Some(ld) = page.job_ld.as_ref() else {
        return Vec::new();
    };
    JSON_LD_FIELDS
        .iter()
        .filter_map(|field| ld.get(*field))
        .flat_map(structured_items)
        .collect()
}

/// A property value as a list: arrays item by item, `DefinedTerm`-style
/// objects by name or description, strings split into statements.
fn structured_items(value: &Value) -> Vec<String> {
    match value {
        Value::String(raw) => split_statements(raw),
        Value::Array(values) => values.iter().flat_map(structured_items).collect(),
        Value::Object(map) => ["name", "description"]
            .iter()
            .find_map(|key| map.get(*key))
            .map(structured_items)
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn split_statements(raw: &str) -> Vec<String> {
    if raw.contains('<') {
        let fragment = Html::parse_fragment(raw);
        if let Ok(list_items) = Selector::parse("li") {
            let items: Vec<String> = fragment
                .select(&list_items)
                .filter_map(|li| clean_item(&visible_text(li)))
                .collect();
            if !items.is_empty() {
                return items;
            }
        }
        return split_plain(&html_fragment_text(raw));
    }
    split_plain(raw)
}

fn split_plain(text: &str) -> Vec<String> {
    text.split(['\n', ';', '•']).filter_map(clean_item).collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Section pass
// ────────────────────────────────────────────────────────────────────────────

fn section_items(document: &Html) -> Vec<String> {
    let Ok(candidates) = Selector::parse("h1, h2, h3, h4, h5, h6, strong, b, dt, p") else {
        return Vec::new();
    };

    let mut items = Vec::new();
    for heading in document.select(&candidates) {
        if !is_section_heading(heading) {
            continue;
        }
        items.extend(items_after(heading));
    }
    items
}

fn is_section_heading(element: ElementRef<'_>) -> bool {
    let text = visible_text(element);
    let lowered = text.to_lowercase();
    let lowered = lowered.trim_end_matches(':').trim();
    if lowered.is_empty() || lowered.split_whitespace().count() > MAX_HEADING_WORDS {
        return false;
    }
    if !SECTION_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        return false;
    }
    // The posting's own title, e.g. "Requirements Engineer".
    if element.value().name() == "h1" || reads_as_job_title(lowered) {
        return false;
    }
    // A short paragraph only counts when it reads like a label.
    if element.value().name() == "p" {
        return text.ends_with(':') || is_bold_only(element);
    }
    true
}

fn reads_as_job_title(lowered: &str) -> bool {
    lowered
        .split_whitespace()
        .last()
        .is_some_and(|word| ROLE_NOUNS.contains(&word.trim_end_matches('s')))
}

/// `<p><strong>Benefits</strong></p>` style pseudo-headings.
fn is_bold_only(element: ElementRef<'_>) -> bool {
    let Ok(bold) = Selector::parse("strong, b") else {
        return false;
    };
    element
        .select(&bold)
        .next()
        .is_some_and(|b| visible_text(b) == visible_text(element))
}

fn is_boundary(element: ElementRef<'_>) -> bool {
    let name = element.value().name();
    HEADING_TAGS.contains(&name)
        || name == "dt"
        || (name == "p" && !visible_text(element).is_empty() && is_bold_only(element))
}

/// Items following `heading` up to the next heading. Climbs to the parent
/// when the heading is wrapped and has nothing after it.
fn items_after(heading: ElementRef<'_>) -> Vec<String> {
    let mut anchor = heading;
    for _ in 0..=PARENT_CLIMB_LIMIT {
        let items = collect_siblings(anchor);
        if !items.is_empty() {
            return items;
        }
        match anchor.parent().and_then(ElementRef::wrap) {
            Some(parent) => anchor = parent,
            None => break,
        }
    }
    Vec::new()
}

fn collect_siblings(anchor: ElementRef<'_>) -> Vec<String> {
    let Ok(list_items) = Selector::parse("li") else {
        return Vec::new();
    };

    let mut items = Vec::new();
    for sibling in anchor.next_siblings().filter_map(ElementRef::wrap) {
        if is_boundary(sibling) {
            break;
        }
        let mut lis = sibling.select(&list_items).peekable();
        if lis.peek().is_some() {
            items.extend(lis.filter_map(|li| clean_item(&visible_text(li))));
        } else if matches!(sibling.value().name(), "p" | "div") {
            items.extend(clean_item(&visible_text(sibling)));
        }
        if items.len() >= MAX_REQUIREMENTS * 2 {
            break;
        }
    }
    items
}

fn clean_item(raw: &str) -> Option<String> {
    let item = clean_text(raw);
    let item = item
        .trim_start_matches(['•', '·', '-', '*', '–'])
        .trim()
        .to_string();
    (!item.is_empty() && item.chars().count() <= MAX_ITEM_CHARS).then_some(item)
}

// ────────────────────────────────────────────────────────────────────────────
// Inline phrases and keyword bullets
// ────────────────────────────────────────────────────────────────────────────

fn inline_items(text: &str) -> Vec<String> {
    static INLINE: OnceLock<Regex> = OnceLock::new();
    let pattern = INLINE.get_or_init(|| {
        Regex::new(
            r"(?i)(?:requirements?|qualifications?|must have|you will need|we are looking for|ideal candidate|essential|required|mandatory)\s*:\s*([^.\n]+)",
        )
        .expect("valid inline requirement regex")
    });

    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| clean_text(m.as_str()))
        .filter(|item| (10..=200).contains(&item.chars().count()))
        .collect()
}

fn keyword_bullets(document: &Html) -> Vec<String> {
    let Ok(list_items) = Selector::parse("li") else {
        return Vec::new();
    };
    document
        .select(&list_items)
        .map(visible_text)
        .filter(|text| {
            let len = text.chars().count();
            let lowered = text.to_lowercase();
            len > 20 && len < 200 && BULLET_KEYWORDS.iter().any(|k| lowered.contains(k))
        })
        .collect()
}

/// First spelling wins; comparison ignores case.
fn dedupe_and_cap(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.to_lowercase()))
        .take(MAX_REQUIREMENTS)
        .collect()
}
