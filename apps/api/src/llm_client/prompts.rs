// Prompt constants for letter polishing.
// Slots are filled with `generation::generator::render_template`, so letter
// text is inserted verbatim and never re-scanned.

/// System prompt for polishing: plain text only, no new facts.
pub const POLISH_SYSTEM: &str = "You are an experienced career coach editing cover letters. \
    You improve flow, tone and concision while keeping every fact unchanged. \
    Respond with the finished letter as plain text only. \
    Do NOT use markdown. \
    Do NOT add commentary before or after the letter.";

/// Replace: {job_title}, {company}, {requirements}, {letter}
pub const POLISH_PROMPT_TEMPLATE: &str = r#"Polish the cover letter below for the {job_title} role at {company}.

Key requirements from the posting:
{requirements}

HARD RULES:
1. Do NOT invent skills, employers, dates, numbers or achievements that are not already in the letter
2. Keep the greeting, the sign-off and the contact details exactly as written
3. Keep the letter under 400 words
4. Keep bullet lists as bullet lists

LETTER:
{letter}"#;
