//! Single-flight gate around conversions.
//!
//! At most one conversion runs at a time, in either direction. A trigger that
//! arrives while another is in flight is dropped rather than queued. This is
//! what stops the two editors from converting into each other forever: the
//! write into the target editor happens while the controller is still busy.

use std::cell::Cell;

use smol_str::SmolStr;

use crate::environment::Environment;
use crate::error::{ConvertError, TransportError};
use crate::instrument::{ConversionEvent, EventSink, Instrumentation, NoopSink};
use crate::reconcile::{EditorMutation, reconcile};
use crate::request::{ConversionDirection, ConversionRequest, RequestBuilder};
use crate::transport::{ConversionTransport, RawResponse};

/// Controller state machine: `Idle -> Busy -> Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    #[default]
    Idle,
    Busy,
}

/// Proof that a conversion holds the controller.
///
/// Dropping the flight returns the controller to [`ControllerState::Idle`],
/// so every exit path releases it, including a cancelled future.
#[must_use = "the controller is released as soon as the flight is dropped"]
#[derive(Debug)]
pub struct Flight<'a> {
    state: &'a Cell<ControllerState>,
    direction: ConversionDirection,
}

impl Flight<'_> {
    pub fn direction(&self) -> ConversionDirection {
        self.direction
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        self.state.set(ControllerState::Idle);
        tracing::debug!(direction = %self.direction, "controller released");
    }
}

/// Owns the busy flag, the transport, and the instrumentation sink.
pub struct ConversionController<T, S = NoopSink> {
    state: Cell<ControllerState>,
    transport: T,
    instrumentation: Instrumentation<S>,
}

impl<T: ConversionTransport> ConversionController<T, NoopSink> {
    pub fn new(transport: T) -> Self {
        Self {
            state: Cell::new(ControllerState::Idle),
            transport,
            instrumentation: Instrumentation::new(NoopSink, Environment::default()),
        }
    }
}

impl<T: ConversionTransport, S: EventSink> ConversionController<T, S> {
    /// Swap in an instrumentation sink. Behaviour is identical with any sink.
    pub fn with_instrumentation<S2: EventSink>(
        self,
        sink: S2,
        environment: Environment,
    ) -> ConversionController<T, S2> {
        ConversionController {
            state: self.state,
            transport: self.transport,
            instrumentation: Instrumentation::new(sink, environment),
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state.get()
    }

    pub fn is_busy(&self) -> bool {
        self.state() == ControllerState::Busy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn instrumentation(&self) -> &Instrumentation<S> {
        &self.instrumentation
    }

    /// Enter `Busy` if idle. Returns `None`, and drops the trigger, if busy.
    pub fn begin(&self, direction: ConversionDirection) -> Option<Flight<'_>> {
        if self.is_busy() {
            tracing::warn!(%direction, "conversion already in flight, trigger dropped");
            self.instrumentation
                .emit(ConversionEvent::Dropped { direction });
            return None;
        }
        self.state.set(ControllerState::Busy);
        tracing::debug!(%direction, "controller busy");
        self.instrumentation
            .emit(ConversionEvent::Started { direction });
        Some(Flight {
            state: &self.state,
            direction,
        })
    }

    /// Send an already built request.
    pub async fn dispatch(
        &self,
        flight: &Flight<'_>,
        request: &ConversionRequest,
    ) -> Result<RawResponse, TransportError> {
        debug_assert!(std::ptr::eq(flight.state, &self.state));
        debug_assert_eq!(flight.direction, request.direction());
        self.transport.dispatch(request).await
    }

    /// Run one conversion of `source` and describe the resulting editor change.
    ///
    /// Build failures (blank input, local defects) never reach the transport.
    /// Every failure becomes a diagnostic mutation; nothing is returned as an
    /// error.
    pub async fn execute(
        &self,
        flight: &Flight<'_>,
        source: &str,
        builder: &RequestBuilder<'_>,
    ) -> EditorMutation {
        let direction = flight.direction();

        let request = match builder.build(direction, source) {
            Ok(request) => request,
            Err(err) => {
                let error = ConvertError::from(err);
                tracing::info!(%direction, reason = error.kind(), "conversion stopped locally");
                self.instrumentation.emit(ConversionEvent::ShortCircuited {
                    direction,
                    reason: error.kind(),
                });
                return EditorMutation::diagnostic(direction, error);
            }
        };

        match self.dispatch(flight, &request).await {
            Ok(response) => {
                let mutation = reconcile(direction, response.status, &response.body);
                tracing::info!(
                    %direction,
                    status = response.status,
                    diagnostic = mutation.is_diagnostic(),
                    "conversion completed"
                );
                self.instrumentation.emit(ConversionEvent::Completed {
                    direction,
                    status: response.status,
                    diagnostic: mutation.is_diagnostic(),
                });
                mutation
            }
            Err(err) => {
                tracing::warn!(%direction, error = %err, "conversion request failed");
                let error = ConvertError::from(err);
                if let ConvertError::NetworkFailure { message } = &error {
                    self.instrumentation.emit(ConversionEvent::Failed {
                        direction,
                        message: SmolStr::new(message),
                    });
                }
                EditorMutation::diagnostic(direction, error)
            }
        }
    }
}
