//! Turning a service answer into new editor content.

use serde::Deserialize;

use crate::editor::{EditorId, EditorSurface};
use crate::error::ConvertError;
use crate::request::ConversionDirection;

/// Shown when a failure body is JSON but carries no `error` field.
pub const UNKNOWN_FAILURE: &str = "conversion failed: unknown error";

/// Body of a service answer. Fields are independent; none is assumed present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConversionResponse {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, rename = "html")]
    pub markup: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ConversionResponse {
    /// The payload `direction` expects, if present and non-empty.
    pub fn payload(&self, direction: ConversionDirection) -> Option<&str> {
        let field = match direction {
            ConversionDirection::ToCode => &self.code,
            ConversionDirection::ToMarkup => &self.markup,
        };
        field.as_deref().filter(|text| !text.is_empty())
    }

    fn error_message(&self) -> Option<&str> {
        self.error.as_deref().filter(|text| !text.trim().is_empty())
    }
}

/// New content for one editor, and whether it is a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorMutation {
    pub target: EditorId,
    pub content: String,
    pub error: Option<ConvertError>,
}

impl EditorMutation {
    /// Write a converted payload into the direction's target.
    pub fn payload(direction: ConversionDirection, content: impl Into<String>) -> Self {
        Self {
            target: direction.target(),
            content: content.into(),
            error: None,
        }
    }

    /// Replace the direction's target with a rendered diagnostic.
    pub fn diagnostic(direction: ConversionDirection, error: ConvertError) -> Self {
        Self {
            target: direction.target(),
            content: error.render(direction),
            error: Some(error),
        }
    }

    pub fn is_diagnostic(&self) -> bool {
        self.error.is_some()
    }

    pub fn apply(&self, editor: &(impl EditorSurface + ?Sized)) {
        editor.set_content(&self.content);
    }
}

/// Interpret a service answer for `direction`.
///
/// Status decides success; payload presence is checked separately, so a 2xx
/// without the expected field still becomes a diagnostic.
pub fn reconcile(direction: ConversionDirection, status: u16, body: &str) -> EditorMutation {
    let success = (200..300).contains(&status);
    let parsed = serde_json::from_str::<ConversionResponse>(body);

    if !success {
        let error = match parsed {
            Ok(response) => ConvertError::RemoteValidationError {
                status,
                message: response.error_message().unwrap_or(UNKNOWN_FAILURE).to_string(),
            },
            Err(_) => {
                let raw = body.trim();
                ConvertError::RemoteUnstructuredError {
                    status,
                    body: if raw.is_empty() {
                        format!("HTTP {status}")
                    } else {
                        raw.to_string()
                    },
                }
            }
        };
        tracing::warn!(%direction, status, error = %error, "conversion rejected by service");
        return EditorMutation::diagnostic(direction, error);
    }

    let response = match parsed {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(%direction, status, %err, "unreadable success body");
            return EditorMutation::diagnostic(
                direction,
                ConvertError::UnexpectedEmptyPayload { direction },
            );
        }
    };

    if let Some(message) = response.error_message() {
        return EditorMutation::diagnostic(
            direction,
            ConvertError::RemoteValidationError {
                status,
                message: message.to_string(),
            },
        );
    }

    match response.payload(direction) {
        Some(payload) => EditorMutation::payload(direction, payload),
        None => {
            tracing::warn!(%direction, status, "success without payload");
            EditorMutation::diagnostic(direction, ConvertError::UnexpectedEmptyPayload { direction })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_written_verbatim() {
        let body = r#"{"code":"h.Div(\n\th.H1(\"Hello\"),\n)"}"#;
        let mutation = reconcile(ConversionDirection::ToCode, 200, body);
        assert_eq!(mutation.target, EditorId::Code);
        assert_eq!(mutation.content, "h.Div(\n\th.H1(\"Hello\"),\n)");
        assert!(!mutation.is_diagnostic());
    }

    #[test]
    fn test_reverse_payload() {
        let mutation = reconcile(ConversionDirection::ToMarkup, 200, r#"{"html":"<div></div>"}"#);
        assert_eq!(mutation.target, EditorId::Markup);
        assert_eq!(mutation.content, "<div></div>");
    }

    #[test]
    fn test_structured_400() {
        let mutation = reconcile(
            ConversionDirection::ToCode,
            400,
            r#"{"error":"HTML content is required"}"#,
        );
        assert_eq!(
            mutation.error,
            Some(ConvertError::RemoteValidationError {
                status: 400,
                message: "HTML content is required".into()
            })
        );
        insta::assert_snapshot!(mutation.content, @"// conversion error: HTML content is required");
    }

    #[test]
    fn test_structured_501_reverse() {
        let mutation = reconcile(
            ConversionDirection::ToMarkup,
            501,
            r#"{"error":"Go to HTML conversion is not implemented yet"}"#,
        );
        insta::assert_snapshot!(
            mutation.content,
            @"<!-- conversion error: Go to HTML conversion is not implemented yet -->"
        );
    }

    #[test]
    fn test_unstructured_failure_uses_raw_text() {
        let mutation = reconcile(ConversionDirection::ToCode, 405, "Method not allowed\n");
        assert_eq!(
            mutation.error,
            Some(ConvertError::RemoteUnstructuredError {
                status: 405,
                body: "Method not allowed".into()
            })
        );
        assert_eq!(mutation.content, "// conversion error: Method not allowed");
    }

    #[test]
    fn test_empty_failure_body_still_says_something() {
        let mutation = reconcile(ConversionDirection::ToMarkup, 502, "");
        assert_eq!(mutation.content, "<!-- conversion error: HTTP 502 -->");
    }

    #[test]
    fn test_failure_json_without_error_field() {
        let mutation = reconcile(ConversionDirection::ToCode, 500, r#"{"detail":"x"}"#);
        assert_eq!(mutation.content, format!("// conversion error: {UNKNOWN_FAILURE}"));
    }

    #[test]
    fn test_failure_status_wins_over_payload() {
        let mutation = reconcile(ConversionDirection::ToCode, 500, r#"{"code":"h.Div()"}"#);
        assert!(mutation.is_diagnostic());
        assert_ne!(mutation.content, "h.Div()");
    }

    #[test]
    fn test_success_without_payload() {
        for body in [r#"{}"#, r#"{"code":""}"#, r#"{"html":"<p/>"}"#, "not json"] {
            let mutation = reconcile(ConversionDirection::ToCode, 200, body);
            assert_eq!(
                mutation.error,
                Some(ConvertError::UnexpectedEmptyPayload {
                    direction: ConversionDirection::ToCode
                }),
                "{body}"
            );
            assert_eq!(mutation.content, "// conversion failed: the service returned no code");
        }
    }

    #[test]
    fn test_success_with_error_field() {
        let mutation = reconcile(ConversionDirection::ToMarkup, 200, r#"{"error":"bad code"}"#);
        assert_eq!(mutation.content, "<!-- conversion error: bad code -->");
    }
}
