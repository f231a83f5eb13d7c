//! Marker extraction for loosely structured LLM handoffs.

/// Marker the strategist is asked to place before the writer's system prompt.
pub const WRITER_PROMPT_MARKER: &str = "[WRITER PROMPT]";

/// Returns the trimmed text after the first occurrence of `marker`, or the
/// whole trimmed text when the marker is absent.
///
/// Deliberately fallback-tolerant: upstream output is a free-form LLM
/// response that may or may not follow the requested format.
#[must_use]
pub fn extract_section<'a>(text: &'a str, marker: &str) -> &'a str {
    match text.find(marker) {
        Some(pos) => text[pos + marker.len()..].trim(),
        None => text.trim(),
    }
}
