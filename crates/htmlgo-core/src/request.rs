//! Conversion requests and how they are built.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::editor::EditorId;
use crate::error::BuildError;
use crate::prefix::PrefixConfig;
use crate::prevalidate::prevalidate;

/// Which way a conversion runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConversionDirection {
    /// Markup to generated code.
    #[serde(rename = "html2go")]
    ToCode,
    /// Generated code back to markup.
    #[serde(rename = "go2html")]
    ToMarkup,
}

impl ConversionDirection {
    /// Value of the `direction` field on the wire.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::ToCode => "html2go",
            Self::ToMarkup => "go2html",
        }
    }

    /// Editor the conversion reads from.
    pub fn source(self) -> EditorId {
        match self {
            Self::ToCode => EditorId::Markup,
            Self::ToMarkup => EditorId::Code,
        }
    }

    /// Editor the conversion writes into.
    pub fn target(self) -> EditorId {
        match self {
            Self::ToCode => EditorId::Code,
            Self::ToMarkup => EditorId::Markup,
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Self::ToCode => Self::ToMarkup,
            Self::ToMarkup => Self::ToCode,
        }
    }
}

impl fmt::Display for ConversionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// A request ready to be sent to the conversion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionRequest {
    ToCode {
        markup: String,
        prefixes: PrefixConfig,
        children_mode: bool,
    },
    ToMarkup {
        code: String,
    },
}

impl ConversionRequest {
    pub fn direction(&self) -> ConversionDirection {
        match self {
            Self::ToCode { .. } => ConversionDirection::ToCode,
            Self::ToMarkup { .. } => ConversionDirection::ToMarkup,
        }
    }

    /// The text being converted.
    pub fn source_text(&self) -> &str {
        match self {
            Self::ToCode { markup, .. } => markup,
            Self::ToMarkup { code } => code,
        }
    }

    /// JSON body as sent to the service.
    pub fn to_body(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    fn wire(&self) -> WireRequest<'_> {
        match self {
            Self::ToCode {
                markup,
                prefixes,
                children_mode,
            } => WireRequest::Html2Go {
                html: markup,
                package_prefix: &prefixes.package_prefix,
                vuetify_prefix: &prefixes.component_prefix_primary,
                vuetify_x_prefix: &prefixes.component_prefix_extended,
                children_mode: *children_mode,
            },
            Self::ToMarkup { code } => WireRequest::Go2Html { go_code: code },
        }
    }
}

impl Serialize for ConversionRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.wire().serialize(serializer)
    }
}

#[derive(Serialize)]
#[serde(tag = "direction")]
enum WireRequest<'a> {
    #[serde(rename = "html2go", rename_all = "camelCase")]
    Html2Go {
        html: &'a str,
        package_prefix: &'a str,
        vuetify_prefix: &'a str,
        vuetify_x_prefix: &'a str,
        children_mode: bool,
    },
    #[serde(rename = "go2html", rename_all = "camelCase")]
    Go2Html { go_code: &'a str },
}

/// Builds requests from editor text and the current prefixes.
#[derive(Debug, Clone)]
pub struct RequestBuilder<'a> {
    prefixes: &'a PrefixConfig,
    children_mode: bool,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(prefixes: &'a PrefixConfig) -> Self {
        Self {
            prefixes,
            children_mode: false,
        }
    }

    pub fn children_mode(mut self, children_mode: bool) -> Self {
        self.children_mode = children_mode;
        self
    }

    /// Build a request for `direction` from `source`.
    ///
    /// Blank input is rejected for both directions. Reverse requests go
    /// through the pre-validator first and carry its (possibly rewritten) code.
    pub fn build(
        &self,
        direction: ConversionDirection,
        source: &str,
    ) -> Result<ConversionRequest, BuildError> {
        if source.trim().is_empty() {
            return Err(BuildError::EmptyInput { direction });
        }

        let request = match direction {
            ConversionDirection::ToCode => ConversionRequest::ToCode {
                markup: source.to_string(),
                prefixes: self.prefixes.clone(),
                children_mode: self.children_mode,
            },
            ConversionDirection::ToMarkup => {
                let validated = prevalidate(source)?;
                ConversionRequest::ToMarkup {
                    code: validated.code,
                }
            }
        };
        tracing::debug!(%direction, len = source.len(), "built conversion request");
        Ok(request)
    }
}

/// Build a request with children mode off.
pub fn build(
    direction: ConversionDirection,
    source: &str,
    prefixes: &PrefixConfig,
) -> Result<ConversionRequest, BuildError> {
    RequestBuilder::new(prefixes).build(direction, source)
}
