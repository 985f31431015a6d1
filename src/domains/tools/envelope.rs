//! Response envelope helpers.
//!
//! Every tool answers with a `CallToolResult` whose content is a list of text
//! items. Domain failures (division by zero, missing credentials, upstream
//! errors) are reported with [`text_result`] so the caller always receives a
//! readable answer; only faults caught by the registry use [`error_result`].

use rmcp::model::{CallToolResult, Content, RawContent};

/// A successful result holding a single text item.
pub fn text_result(text: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text.into())])
}

/// A successful result holding one text item per entry, in order.
pub fn text_results<I, S>(texts: I) -> CallToolResult
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    CallToolResult::success(texts.into_iter().map(|t| Content::text(t.into())).collect())
}

/// An error-flagged result carrying `"Error: <message>"`.
pub fn error_result(message: impl std::fmt::Display) -> CallToolResult {
    CallToolResult::error(vec![Content::text(format!("Error: {}", message))])
}

/// Collect the text items of a result, skipping non-text content.
pub fn result_texts(result: &CallToolResult) -> Vec<&str> {
    result
        .content
        .iter()
        .filter_map(|c| match &c.raw {
            RawContent::Text(text) => Some(text.text.as_str()),
            _ => None,
        })
        .collect()
}

/// Render a number the way JavaScript's `String(number)` does for the
/// values these tools produce.
///
/// Integral values print without a fractional part, `-0` prints as `0`, and
/// non-finite values print as `Infinity`, `-Infinity` or `NaN`. Magnitudes
/// of at least `1e21` or below `1e-6` use exponent notation with an explicit
/// exponent sign (`1e+21`, `1.5e-7`).
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if value == 0.0 {
        "0".to_string()
    } else if value.abs() >= 1e21 || value.abs() < 1e-6 {
        let exponent = format!("{:e}", value);
        match exponent.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => exponent,
        }
    } else {
        value.to_string()
    }
}
