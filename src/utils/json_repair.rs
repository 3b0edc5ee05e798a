//! Coercion of free-form LLM replies into JSON.
//!
//! Models wrap their output in markdown fences, prepend chatter, or leave
//! replacement characters behind. [`clean_llm_json`] strips all of that
//! and keeps the outermost `{ ... }` span, or the `[ ... ]` span when a bare
//! array encloses the objects.

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

pub fn clean_llm_json(raw: &str) -> String {
    let without_fences = raw.trim().replace("```json", "").replace("```", "");
    let trimmed = without_fences.trim();

    let body = match (span(trimmed, '{', '}'), span(trimmed, '[', ']')) {
        (Some(object), Some(array)) if array.0 < object.0 && array.1 > object.1 => {
            &trimmed[array.0..=array.1]
        }
        (Some(object), _) => &trimmed[object.0..=object.1],
        (None, Some(array)) => &trimmed[array.0..=array.1],
        (None, None) => trimmed,
    };

    body.replace(['\u{0}', '\u{fffd}'], "")
}

fn span(text: &str, open: char, close: char) -> Option<(usize, usize)> {
    match (text.find(open), text.rfind(close)) {
        (Some(start), Some(end)) if start < end => Some((start, end)),
        _ => None,
    }
}

pub fn parse_lenient<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(&clean_llm_json(raw))
}

pub fn parse_value(raw: &str) -> Result<JsonValue, serde_json::Error> {
    parse_lenient(raw)
}
