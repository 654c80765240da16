//! Error types for conversion orchestration.
//!
//! Every conversion failure is eventually rendered into editor content, so
//! `ConvertError` carries enough to produce a readable diagnostic on its own.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::prevalidate::Defect;
use crate::request::ConversionDirection;

/// Failure of a single conversion attempt.
///
/// None of these escape the controller: each one is rendered into the target
/// editor via [`ConvertError::render`].
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[non_exhaustive]
pub enum ConvertError {
    /// Source editor was blank; nothing was sent.
    #[error("{}", empty_input_hint(*direction))]
    #[diagnostic(code(htmlgo::empty_input))]
    EmptyInput { direction: ConversionDirection },

    /// The pre-validator rejected the code before any request was built.
    #[error(transparent)]
    #[diagnostic(transparent)]
    LocalStructuralDefect(#[from] Defect),

    /// The request never completed at the transport level.
    #[error("conversion error: {message}")]
    #[diagnostic(code(htmlgo::network))]
    NetworkFailure { message: String },

    /// Non-2xx with a structured `{"error": ...}` body.
    #[error("conversion error: {message}")]
    #[diagnostic(code(htmlgo::remote::validation))]
    RemoteValidationError { status: u16, message: String },

    /// Non-2xx with a body that is not the structured error shape.
    #[error("conversion error: {body}")]
    #[diagnostic(code(htmlgo::remote::unstructured))]
    RemoteUnstructuredError { status: u16, body: String },

    /// 2xx, but the field the direction expects is missing or empty.
    #[error("conversion failed: the service returned no {}", direction.target().label())]
    #[diagnostic(code(htmlgo::remote::empty_payload))]
    UnexpectedEmptyPayload { direction: ConversionDirection },
}

fn empty_input_hint(direction: ConversionDirection) -> &'static str {
    match direction {
        ConversionDirection::ToCode => "enter markup in the left editor",
        ConversionDirection::ToMarkup => "enter code in the right editor",
    }
}

impl ConvertError {
    /// Render the error as a comment in the syntax of the direction's target editor.
    pub fn render(&self, direction: ConversionDirection) -> String {
        direction.target().comment(&self.to_string())
    }

    /// Stable short name, used for instrumentation.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyInput { .. } => "empty_input",
            Self::LocalStructuralDefect(_) => "local_structural_defect",
            Self::NetworkFailure { .. } => "network_failure",
            Self::RemoteValidationError { .. } => "remote_validation_error",
            Self::RemoteUnstructuredError { .. } => "remote_unstructured_error",
            Self::UnexpectedEmptyPayload { .. } => "unexpected_empty_payload",
        }
    }

    /// True when the attempt stopped before reaching the network.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput { .. } | Self::LocalStructuralDefect(_)
        )
    }
}

/// Why a request could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[non_exhaustive]
pub enum BuildError {
    #[error("source text for {direction} is empty")]
    #[diagnostic(code(htmlgo::build::empty_input))]
    EmptyInput { direction: ConversionDirection },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Defect(#[from] Defect),
}

impl From<BuildError> for ConvertError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::EmptyInput { direction } => ConvertError::EmptyInput { direction },
            BuildError::Defect(defect) => ConvertError::LocalStructuralDefect(defect),
        }
    }
}

/// Transport-level failures talking to the conversion service.
#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum TransportError {
    #[error("failed to build HTTP client")]
    #[diagnostic(code(htmlgo::transport::client))]
    Client {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to encode request body")]
    #[diagnostic(code(htmlgo::transport::encode))]
    Encode {
        #[source]
        source: serde_json::Error,
    },

    #[error("request to {url} failed: {source}")]
    #[diagnostic(code(htmlgo::transport::request))]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read response body: {source}")]
    #[diagnostic(code(htmlgo::transport::body))]
    Body {
        #[source]
        source: reqwest::Error,
    },

    #[error("connection failed: {0}")]
    #[diagnostic(code(htmlgo::transport::connection))]
    Connection(String),
}

impl From<TransportError> for ConvertError {
    fn from(err: TransportError) -> Self {
        ConvertError::NetworkFailure {
            message: err.to_string(),
        }
    }
}

/// Configuration loading errors.
#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config file {}", path.display())]
    #[diagnostic(code(config::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}", path.display())]
    #[diagnostic(code(config::parse))]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid URL '{url}': {message}")]
    #[diagnostic(code(config::url))]
    UrlParse { url: String, message: String },

    #[error("invalid environment '{value}'")]
    #[diagnostic(code(config::environment), help("expected 'prod' or 'local'"))]
    InvalidEnvironment { value: String },

    #[error("unknown prefix field '{field}'")]
    #[diagnostic(
        code(config::prefix_field),
        help("expected one of: package, vuetify, vuetify-x")
    )]
    InvalidPrefixField { field: String },

    #[error("invalid value '{value}' for {var}")]
    #[diagnostic(code(config::value))]
    InvalidValue { var: &'static str, value: String },
}

/// Prefix self-test failures.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[non_exhaustive]
pub enum ProbeError {
    #[error("another conversion is in flight")]
    #[diagnostic(code(htmlgo::probe::busy))]
    Busy,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Conversion(#[from] ConvertError),
}
