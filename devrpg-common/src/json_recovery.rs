//! JSON recovery from free-form LLM output
//!
//! LLM responses are untrusted text: JSON may be wrapped in markdown fences,
//! surrounded by prose, truncated, or missing entirely. [`extract_structured`]
//! tries a fixed sequence of strategies and returns the first value that
//! parses. When nothing parses it returns a sentinel object instead of an
//! error, so a bad completion degrades an analysis rather than failing it.
//!
//! Strategy order (first success wins):
//! 1. fenced blocks tagged `json`
//! 2. any fenced block
//! 3. object spans: greedy `{ ... }`, then the first `{` that starts a valid value
//! 4. array spans: greedy `[ ... ]`, then the first `[` that starts a valid value
//! 5. the whole trimmed input

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// `error` value carried by the parse-failure sentinel
pub const PARSE_FAILED: &str = "parse_failed";

/// Maximum number of characters of the raw input kept in the sentinel
pub const RAW_RESPONSE_LIMIT: usize = 500;

static JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```json\s*(.*?)\s*```").expect("valid json fence pattern"));
static ANY_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```\s*(.*?)\s*```").expect("valid fence pattern"));
static OBJECT_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid object pattern"));
static ARRAY_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[.*\]").expect("valid array pattern"));

/// Extract a structured value from unstructured text
///
/// Never fails: when no strategy succeeds the result is
/// `{"error": "parse_failed", "raw_response": <first 500 chars of input>}`.
/// Use [`is_parse_failure`] to recognize it.
pub fn extract_structured(text: &str) -> Value {
    if let Some(value) = from_fences(&JSON_FENCE, text, false) {
        debug!("Recovered JSON from tagged fenced block");
        return value;
    }

    if let Some(value) = from_fences(&ANY_FENCE, text, true) {
        debug!("Recovered JSON from fenced block");
        return value;
    }

    if let Some(value) = from_span(&OBJECT_SPAN, '{', text) {
        debug!("Recovered JSON object from surrounding text");
        return value;
    }

    if let Some(value) = from_span(&ARRAY_SPAN, '[', text) {
        debug!("Recovered JSON array from surrounding text");
        return value;
    }

    if let Some(value) = try_parse(text) {
        return value;
    }

    let preview: String = text.chars().take(200).collect();
    warn!(preview = %preview, "Could not extract JSON from response");
    parse_failure(text)
}

/// Build the parse-failure sentinel for `raw`
pub fn parse_failure(raw: &str) -> Value {
    let truncated: String = raw.chars().take(RAW_RESPONSE_LIMIT).collect();
    json!({
        "error": PARSE_FAILED,
        "raw_response": truncated,
    })
}

/// True when `value` is the sentinel produced by a failed extraction
///
/// Any object carrying both `error` and `raw_response` counts, so sentinels
/// relayed by a backend are recognized as well.
pub fn is_parse_failure(value: &Value) -> bool {
    value
        .as_object()
        .map(|map| map.contains_key("error") && map.contains_key("raw_response"))
        .unwrap_or(false)
}

fn try_parse(candidate: &str) -> Option<Value> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}

fn from_fences(pattern: &Regex, text: &str, allow_info_string: bool) -> Option<Value> {
    pattern.captures_iter(text).find_map(|caps| {
        let body = caps.get(1)?.as_str();
        try_parse(body).or_else(|| {
            if !allow_info_string {
                return None;
            }
            // ```python\n{...}``` style: drop a bare first-line language tag
            let (first, rest) = body.split_once('\n')?;
            if first.trim().chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
                try_parse(rest)
            } else {
                None
            }
        })
    })
}

fn from_span(greedy: &Regex, open: char, text: &str) -> Option<Value> {
    if let Some(found) = greedy.find(text) {
        if let Some(value) = try_parse(found.as_str()) {
            return Some(value);
        }
    }

    first_valid_value(text, open)
}

/// First position starting with `open` from which a complete JSON value parses
fn first_valid_value(text: &str, open: char) -> Option<Value> {
    text.match_indices(open).find_map(|(idx, _)| {
        let mut stream = serde_json::Deserializer::from_str(&text[idx..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) => Some(value),
            _ => None,
        }
    })
}
