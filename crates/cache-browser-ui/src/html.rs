//! HTML detection in decoded file bodies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where an HTML document was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HtmlSource {
    /// The body itself is HTML.
    Raw,
    /// The body is a JSON object with an `html` string field.
    JsonField,
}

impl HtmlSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            HtmlSource::Raw => "raw",
            HtmlSource::JsonField => "json-field",
        }
    }
}

/// An HTML document extracted from a file body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedHtml {
    pub html: String,
    pub source: HtmlSource,
}

/// Whether `text` looks like an HTML document or fragment.
pub fn is_html_content(text: &str) -> bool {
    let trimmed = text.trim();
    if ["<!DOCTYPE", "<!doctype", "<html", "<HTML"]
        .iter()
        .any(|prefix| trimmed.starts_with(prefix))
    {
        return true;
    }
    trimmed.starts_with('<') && trimmed.contains("</")
}

fn html_field(value: &Value) -> Option<&str> {
    value.as_object()?.get("html")?.as_str()
}

/// Pull HTML out of a decoded body.
///
/// A string body is HTML itself, or a JSON document whose object carries an
/// `html` field. An object body is checked for the field directly.
pub fn extract_html(value: &Value) -> Option<ExtractedHtml> {
    match value {
        Value::String(text) => {
            if is_html_content(text) {
                return Some(ExtractedHtml {
                    html: text.clone(),
                    source: HtmlSource::Raw,
                });
            }
            let parsed: Value = serde_json::from_str(text.trim()).ok()?;
            html_field(&parsed).map(|html| ExtractedHtml {
                html: html.to_string(),
                source: HtmlSource::JsonField,
            })
        }
        Value::Object(_) => html_field(value).map(|html| ExtractedHtml {
            html: html.to_string(),
            source: HtmlSource::JsonField,
        }),
        _ => None,
    }
}
