//! Text helpers shared by the extraction strategies.

use scraper::{ElementRef, Html, Selector};

/// Elements whose text never reaches the reader.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Collapses all runs of whitespace into single spaces and trims the ends.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Phrasing elements; every other element separates words.
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "cite", "code", "data", "dfn", "em", "font", "i", "kbd",
    "label", "mark", "q", "s", "samp", "small", "span", "strong", "sub", "sup", "time", "u", "var",
];

/// Visible text of an element, skipping script/style content.
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    collect_text(element, &mut out);
    clean_text(&out)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            let name = child_el.value().name();
            if HIDDEN_TAGS.contains(&name) {
                continue;
            }
            let block = !INLINE_TAGS.contains(&name);
            if block {
                out.push(' ');
            }
            collect_text(child_el, out);
            if block {
                out.push(' ');
            }
        }
    }
}

/// Visible text split at block boundaries: one entry per paragraph, list
/// item, heading or other block, with inline markup kept inside its block.
pub fn block_texts(element: ElementRef<'_>) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current = String::new();
    collect_blocks(element, &mut current, &mut blocks);
    flush_block(&mut current, &mut blocks);
    blocks
}

fn collect_blocks(element: ElementRef<'_>, current: &mut String, blocks: &mut Vec<String>) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            current.push_str(text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            let name = child_el.value().name();
            if HIDDEN_TAGS.contains(&name) {
                continue;
            }
            let block = !INLINE_TAGS.contains(&name);
            if block {
                flush_block(current, blocks);
            }
            collect_blocks(child_el, current, blocks);
            if block {
                flush_block(current, blocks);
            }
        }
    }
}

fn flush_block(current: &mut String, blocks: &mut Vec<String>) {
    let text = clean_text(current);
    if !text.is_empty() {
        blocks.push(text);
    }
    current.clear();
}

/// Visible text of the first element matching any selector, in order.
/// Empty matches are skipped so a later selector can still win.
pub fn first_selector_text(document: &Html, selectors: &[&str]) -> Option<String> {
    for selector_str in selectors {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        for element in document.select(&selector) {
            let text = visible_text(element);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// `content` attribute of the first `<meta>` matching `selector`.
pub fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("content"))
        .map(clean_text)
        .find(|content| !content.is_empty())
}

/// Truncates to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].trim_end().to_string(),
        None => text.to_string(),
    }
}

/// Strips markup from an HTML fragment (e.g. a JSON-LD description).
pub fn html_fragment_text(fragment: &str) -> String {
    let parsed = Html::parse_fragment(fragment);
    visible_text(parsed.root_element())
}
