//! Client-side orchestration for the htmlgo converter.
//!
//! Two editors hold markup and generated code. Converting one into the other
//! goes through a remote service; this crate owns everything around that call:
//! - `Session`: both editors, the prefix store and the controller, wired up
//! - `ConversionController`: single-flight gate shared by both directions
//! - `RequestBuilder`: direction-tagged request bodies, forward and reverse
//! - `prevalidate`: local structural checks on code before a reverse request
//! - `reconcile`: service answer to editor content, diagnostics included
//! - `ClientConfig` and `resolve`: where to send requests, and with what prefixes

mod config;
mod controller;
mod editor;
mod environment;
mod error;
mod instrument;
mod prefix;
mod reconcile;
mod request;
mod session;
mod transport;

pub mod prevalidate;
pub mod probe;

pub use config::ClientConfig;
pub use controller::{ControllerState, ConversionController, Flight};
pub use editor::{BufferEditor, EditorId, EditorObserver, EditorSurface};
pub use environment::{DEV_PORTS, Environment, HostIdentity, resolve};
pub use error::{BuildError, ConfigError, ConvertError, ProbeError, TransportError};
pub use instrument::{
    CLIENT_VERSION, ConversionEvent, EventSink, Instrumentation, NoopSink, TracingSink, Tracked,
};
pub use prefix::{PrefixConfig, PrefixField, PrefixStore};
pub use prevalidate::{Defect, Prevalidated};
pub use probe::ProbeReport;
pub use reconcile::{ConversionResponse, EditorMutation, UNKNOWN_FAILURE, reconcile};
pub use request::{ConversionDirection, ConversionRequest, RequestBuilder, build};
pub use session::{Outcome, Session};
pub use transport::{ConversionTransport, DEFAULT_TIMEOUT, HttpTransport, RawResponse};
