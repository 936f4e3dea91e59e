//! Isolating the JSON payload in raw model output.
//!
//! Models wrap JSON in markdown fences and surround it with prose even when
//! told not to. [`extract_json_text`] strips the fences and cuts the text down
//! to the outermost `{ ... }` span. It never fails: when no object span is
//! found it hands back the trimmed text, and the validator's JSON parse
//! reports the problem.

/// Strip code fences and return the span from the first `{` to the last `}`.
///
/// Removes every `` ```json `` opening marker (any case) and every bare
/// `` ``` `` marker, trims, then slices. If there is no `{` ... `}` pair the
/// trimmed text is returned unchanged.
///
/// # Examples
///
/// ```
/// use revenue_engine::extract::extract_json_text;
///
/// assert_eq!(extract_json_text("```json\n{\"a\":1}\n```"), "{\"a\":1}");
/// assert_eq!(extract_json_text("Sure! {\"a\":1} Anything else?"), "{\"a\":1}");
/// assert_eq!(extract_json_text("  no json here "), "no json here");
/// ```
pub fn extract_json_text(raw: &str) -> String {
    let stripped = strip_fences(raw);
    let cleaned = stripped.trim();

    if let (Some(first), Some(last)) = (cleaned.find('{'), cleaned.rfind('}')) {
        if last > first {
            return cleaned[first..=last].to_string();
        }
    }

    cleaned.to_string()
}

/// Remove `` ```json `` (case-insensitive) and `` ``` `` markers.
fn strip_fences(text: &str) -> String {
    const FENCE: &str = "```";
    const LANG: &str = "json";

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find(FENCE) {
        out.push_str(&rest[..idx]);
        let after = &rest[idx + FENCE.len()..];
        rest = match after.get(..LANG.len()) {
            Some(tag) if tag.eq_ignore_ascii_case(LANG) => &after[LANG.len()..],
            _ => after,
        };
    }
    out.push_str(rest);
    out
}

/// Shorten `text` to at most `max_chars` characters for log output.
pub(crate) fn snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
