//! Turning backend answers into strict classification results
//!
//! Every provider ends up with a string the model produced. This module
//! locates the JSON object inside it (models like to wrap answers in code
//! fences or add a sentence of prose), parses it strictly, and validates the
//! returned slug against the request.

use quire_core::{
    ClassificationRequest, ClassificationResult, ClassifyError, ClassifyResult, TransportKind,
    OTHER_SLUG,
};
use serde_json::{Map, Value};

/// Longest excerpt of a bad answer kept in error messages
const EXCERPT_CHARS: usize = 200;

/// Locate the JSON object in a model answer
///
/// Accepts a bare object, a ```` ```json ```` fenced block, a plain fenced
/// block, or an object with prose before or after it. The first complete
/// object wins; anything following it is ignored.
pub fn extract_json(output: &str) -> ClassifyResult<&str> {
    let trimmed = output.trim();

    let body = if let Some(start) = trimmed.find("```json") {
        let after_marker = &trimmed[start + 7..];
        after_marker.find("```").map_or(after_marker, |end| &after_marker[..end])
    } else if let Some(start) = trimmed.find("```") {
        let after_marker = &trimmed[start + 3..];
        let after_newline = after_marker
            .find('\n')
            .map_or(after_marker, |i| &after_marker[i + 1..]);
        after_newline.find("```").map_or(after_newline, |end| &after_newline[..end])
    } else {
        trimmed
    };

    first_object(body.trim()).ok_or_else(|| {
        if body.contains('{') {
            ClassifyError::parse("Could not find complete JSON object")
        } else {
            ClassifyError::parse(format!("No JSON found in output: {}", excerpt(trimmed)))
        }
    })
}

/// First `{` that opens a well-formed JSON value, sliced to where it ends
fn first_object(text: &str) -> Option<&str> {
    text.match_indices('{').find_map(|(start, _)| {
        let candidate = &text[start..];
        let mut values = serde_json::Deserializer::from_str(candidate).into_iter::<Value>();
        match values.next() {
            Some(Ok(_)) => Some(&candidate[..values.byte_offset()]),
            _ => None,
        }
    })
}

/// Parse a model answer into a [`ClassificationResult`]
///
/// - `category_slug` outside the allowed set (or empty) becomes `None`
/// - `confidence` is clamped into [0, 1]; a missing value counts as 0
/// - non-string entries in `suggestions` and `tags` are dropped
/// - the result is undecided when the model said so or named no valid slug
pub fn parse_classification(
    output: &str,
    request: &ClassificationRequest,
) -> ClassifyResult<ClassificationResult> {
    let json_str = extract_json(output)?;

    let value: Value = serde_json::from_str(json_str).map_err(|e| {
        ClassifyError::parse(format!("JSON parse error: {}. Input: {}", e, excerpt(json_str)))
    })?;

    let obj = value
        .as_object()
        .ok_or_else(|| ClassifyError::parse("Expected a JSON object"))?;

    let category_slug = match obj.get("category_slug") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(other) => {
            return Err(ClassifyError::parse(format!(
                "category_slug must be a string or null, got {other}"
            )))
        }
    }
    .filter(|slug| !slug.is_empty() && (slug == OTHER_SLUG || request.allows(slug)));

    let confidence = match obj.get("confidence") {
        None | Some(Value::Null) => 0.0,
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| {
            ClassifyError::parse(format!("confidence is not a number: {s:?}"))
        })?,
        Some(other) => {
            return Err(ClassifyError::parse(format!(
                "confidence must be a number, got {other}"
            )))
        }
    };
    let confidence = if confidence.is_finite() {
        confidence.clamp(0.0, 1.0)
    } else {
        0.0
    };

    let reasons = match obj.get("reasons").or_else(|| obj.get("reasoning")) {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    };

    let undecided = obj
        .get("undecided")
        .and_then(Value::as_bool)
        .unwrap_or(false)
        || category_slug.is_none();

    Ok(ClassificationResult {
        category_slug,
        confidence,
        reasons,
        suggestions: string_list(obj, "suggestions"),
        undecided,
        tags: string_list(obj, "tags"),
    })
}

fn string_list(obj: &Map<String, Value>, field: &str) -> Vec<String> {
    match obj.get(field) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Map a non-success HTTP status to the error taxonomy
pub fn status_error(provider: &str, status: u16, body: &str) -> ClassifyError {
    let message = format!("{provider} API error ({status}): {}", excerpt(body));
    match status {
        401 | 403 => ClassifyError::configuration(message),
        408 => ClassifyError::transport(TransportKind::Timeout, message),
        429 => ClassifyError::transport(TransportKind::RateLimited, message),
        500..=599 => ClassifyError::transport(TransportKind::Server(status), message),
        _ => ClassifyError::transport(TransportKind::Rejected(status), message),
    }
}

/// Map a client-side request failure to the error taxonomy
pub fn request_error(provider: &str, err: &reqwest::Error) -> ClassifyError {
    if err.is_timeout() {
        ClassifyError::timeout(format!("{provider} request timed out: {err}"))
    } else if err.is_decode() {
        ClassifyError::parse(format!("{provider} response could not be decoded: {err}"))
    } else {
        ClassifyError::transport(
            TransportKind::Connection,
            format!("{provider} request failed: {err}"),
        )
    }
}

fn excerpt(s: &str) -> String {
    s.chars().take(EXCERPT_CHARS).collect()
}
