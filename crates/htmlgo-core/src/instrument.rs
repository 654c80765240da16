//! Optional instrumentation of conversion activity.
//!
//! The controller reports what it does to an [`EventSink`]. Nothing depends on
//! the sink's behaviour; [`NoopSink`] is the default and changes nothing.

use std::rc::Rc;

use smol_str::SmolStr;

use crate::environment::Environment;
use crate::prefix::PrefixField;
use crate::request::ConversionDirection;

/// Client version attached to every event.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Something worth reporting about a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionEvent {
    /// The controller went busy for this direction.
    Started { direction: ConversionDirection },
    /// A trigger arrived while busy and was discarded.
    Dropped { direction: ConversionDirection },
    /// The attempt ended locally without a request.
    ShortCircuited {
        direction: ConversionDirection,
        reason: &'static str,
    },
    /// The service answered and the answer was applied.
    Completed {
        direction: ConversionDirection,
        status: u16,
        diagnostic: bool,
    },
    /// The request could not be completed.
    Failed {
        direction: ConversionDirection,
        message: SmolStr,
    },
    /// A prefix changed through an explicit edit.
    PrefixChanged { field: PrefixField, value: SmolStr },
}

/// An event plus the context every event carries.
#[derive(Debug, Clone, Copy)]
pub struct Tracked<'a> {
    pub event: &'a ConversionEvent,
    pub environment: Environment,
    pub version: &'static str,
}

/// Receives instrumentation events.
pub trait EventSink {
    fn record(&self, tracked: Tracked<'_>);
}

impl<S: EventSink + ?Sized> EventSink for &S {
    fn record(&self, tracked: Tracked<'_>) {
        (**self).record(tracked)
    }
}

impl<S: EventSink + ?Sized> EventSink for Rc<S> {
    fn record(&self, tracked: Tracked<'_>) {
        (**self).record(tracked)
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn record(&self, _tracked: Tracked<'_>) {}
}

/// Emits every event as a `tracing` event under the `htmlgo::events` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, tracked: Tracked<'_>) {
        let environment = tracked.environment.as_str();
        let version = tracked.version;
        match tracked.event {
            ConversionEvent::Started { direction } => {
                tracing::info!(target: "htmlgo::events", environment, version, %direction, "conversion started")
            }
            ConversionEvent::Dropped { direction } => {
                tracing::info!(target: "htmlgo::events", environment, version, %direction, "conversion dropped")
            }
            ConversionEvent::ShortCircuited { direction, reason } => {
                tracing::info!(target: "htmlgo::events", environment, version, %direction, reason, "conversion short-circuited")
            }
            ConversionEvent::Completed {
                direction,
                status,
                diagnostic,
            } => {
                tracing::info!(target: "htmlgo::events", environment, version, %direction, status, diagnostic, "conversion completed")
            }
            ConversionEvent::Failed { direction, message } => {
                tracing::info!(target: "htmlgo::events", environment, version, %direction, %message, "conversion failed")
            }
            ConversionEvent::PrefixChanged { field, value } => {
                tracing::info!(target: "htmlgo::events", environment, version, %field, %value, "prefix changed")
            }
        }
    }
}

/// Pairs a sink with the environment stamped onto each event.
#[derive(Debug, Clone)]
pub struct Instrumentation<S> {
    sink: S,
    environment: Environment,
}

impl<S: EventSink> Instrumentation<S> {
    pub fn new(sink: S, environment: Environment) -> Self {
        Self { sink, environment }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn emit(&self, event: ConversionEvent) {
        self.sink.record(Tracked {
            event: &event,
            environment: self.environment,
            version: CLIENT_VERSION,
        });
    }
}
