//! Response classification.

use bytes::Bytes;
use serde::Serialize;

const DEFAULT_FILENAME: &str = "bootstrap";
const OCTET_STREAM: &str = "application/octet-stream";

/// What a downstream service handed back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GatewayResult {
    /// Text to show the operator (errors and JSON replies).
    Display { text: String, status_code: u16 },
    /// A file to hand to the operator.
    Download {
        #[serde(skip)]
        bytes: Bytes,
        filename: String,
        content_type: String,
    },
}

impl GatewayResult {
    pub fn display(text: impl Into<String>, status_code: u16) -> Self {
        Self::Display {
            text: text.into(),
            status_code,
        }
    }

    pub fn is_success(&self) -> bool {
        match self {
            Self::Display { status_code, .. } => (200..300).contains(status_code),
            Self::Download { .. } => true,
        }
    }
}

/// Classify a downstream response.
///
/// Non-2xx responses are shown as-is. JSON replies are shown through their
/// `response` field when present. Everything else is a download named from
/// `Content-Disposition`, or `fallback_filename`.
pub fn classify(
    status: u16,
    content_type: Option<&str>,
    content_disposition: Option<&str>,
    body: Bytes,
    fallback_filename: &str,
) -> GatewayResult {
    if !(200..300).contains(&status) {
        return GatewayResult::display(String::from_utf8_lossy(&body), status);
    }

    if content_type.is_some_and(is_json) {
        let text = match serde_json::from_slice::<serde_json::Value>(&body) {
            Ok(serde_json::Value::Object(map)) => match map.get("response") {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::from_utf8_lossy(&body).to_string(),
            },
            _ => String::from_utf8_lossy(&body).to_string(),
        };
        return GatewayResult::display(text, status);
    }

    let filename = content_disposition
        .and_then(filename_from_disposition)
        .unwrap_or_else(|| {
            if fallback_filename.trim().is_empty() {
                DEFAULT_FILENAME.to_string()
            } else {
                sanitize_filename(fallback_filename)
            }
        });

    GatewayResult::Download {
        bytes: body,
        filename,
        content_type: content_type.unwrap_or(OCTET_STREAM).to_string(),
    }
}

fn is_json(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// The filename carried by a `Content-Disposition` header, stripped of any
/// directory components.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for part in header.split(';').map(str::trim) {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename" => plain = Some(value.trim().trim_matches('"').to_string()),
            "filename*" => {
                // RFC 5987: charset'language'value
                let value = value.trim();
                let value = value.rsplit_once('\'').map_or(value, |(_, v)| v);
                extended = Some(value.trim_matches('"').to_string());
            }
            _ => {}
        }
    }

    extended
        .or(plain)
        .map(|name| sanitize_filename(&name))
        .filter(|name| !name.is_empty())
}

fn sanitize_filename(name: &str) -> String {
    name.rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}
