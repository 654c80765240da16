//! The two editors, the prefix store and the controller, wired together.

use std::cell::{Cell, RefCell};

use smol_str::SmolStr;

use crate::controller::ConversionController;
use crate::editor::{EditorId, EditorSurface};
use crate::environment::Environment;
use crate::error::{ConvertError, ProbeError};
use crate::instrument::{ConversionEvent, EventSink, NoopSink};
use crate::prefix::{PrefixConfig, PrefixField, PrefixStore};
use crate::probe::{ProbeReport, probe_request};
use crate::reconcile::{EditorMutation, reconcile};
use crate::request::{ConversionDirection, RequestBuilder};
use crate::transport::ConversionTransport;

/// What a conversion trigger ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Another conversion was in flight; nothing happened.
    Dropped,
    /// The target editor was rewritten with this mutation.
    Applied(EditorMutation),
}

impl Outcome {
    pub fn mutation(&self) -> Option<&EditorMutation> {
        match self {
            Self::Dropped => None,
            Self::Applied(mutation) => Some(mutation),
        }
    }
}

pub struct Session<M, C, T, S = NoopSink> {
    markup: M,
    code: C,
    prefixes: RefCell<PrefixStore>,
    children_mode: Cell<bool>,
    controller: ConversionController<T, S>,
}

impl<M, C, T> Session<M, C, T, NoopSink>
where
    M: EditorSurface,
    C: EditorSurface,
    T: ConversionTransport,
{
    pub fn new(markup: M, code: C, transport: T) -> Self {
        Self {
            markup,
            code,
            prefixes: RefCell::new(PrefixStore::default()),
            children_mode: Cell::new(false),
            controller: ConversionController::new(transport),
        }
    }
}

impl<M, C, T, S> Session<M, C, T, S>
where
    M: EditorSurface,
    C: EditorSurface,
    T: ConversionTransport,
    S: EventSink,
{
    pub fn with_instrumentation<S2: EventSink>(
        self,
        sink: S2,
        environment: Environment,
    ) -> Session<M, C, T, S2> {
        Session {
            markup: self.markup,
            code: self.code,
            prefixes: self.prefixes,
            children_mode: self.children_mode,
            controller: self.controller.with_instrumentation(sink, environment),
        }
    }

    /// Start from `prefixes` instead of the defaults. Not a user edit, so no
    /// conversion is triggered.
    pub fn with_prefixes(self, prefixes: PrefixConfig) -> Self {
        self.prefixes.replace(PrefixStore::new(prefixes));
        self
    }

    pub fn with_children_mode(self, children_mode: bool) -> Self {
        self.children_mode.set(children_mode);
        self
    }

    pub fn markup(&self) -> &M {
        &self.markup
    }

    pub fn code(&self) -> &C {
        &self.code
    }

    pub fn controller(&self) -> &ConversionController<T, S> {
        &self.controller
    }

    pub fn editor(&self, id: EditorId) -> &dyn EditorSurface {
        match id {
            EditorId::Markup => &self.markup,
            EditorId::Code => &self.code,
        }
    }

    /// Snapshot of the current prefixes.
    pub fn prefixes(&self) -> PrefixConfig {
        self.prefixes.borrow().get().clone()
    }

    pub fn children_mode(&self) -> bool {
        self.children_mode.get()
    }

    pub fn set_children_mode(&self, children_mode: bool) {
        self.children_mode.set(children_mode);
    }

    /// Convert the source editor of `direction` into its target.
    ///
    /// The target is written before the controller is released, so observers
    /// reacting to that write see a busy controller and their triggers drop.
    #[tracing::instrument(skip(self))]
    pub async fn convert(&self, direction: ConversionDirection) -> Outcome {
        let Some(flight) = self.controller.begin(direction) else {
            return Outcome::Dropped;
        };

        let source = self.editor(direction.source()).content();
        let prefixes = self.prefixes();
        let builder = RequestBuilder::new(&prefixes).children_mode(self.children_mode());

        let mutation = self.controller.execute(&flight, &source, &builder).await;
        mutation.apply(self.editor(mutation.target));
        drop(flight);

        Outcome::Applied(mutation)
    }

    /// Explicit user edit of one prefix.
    ///
    /// Re-runs the forward conversion whenever the markup editor has content,
    /// so generated code always reflects the prefixes on screen.
    pub async fn set_prefix(
        &self,
        field: PrefixField,
        value: impl Into<SmolStr>,
    ) -> Option<Outcome> {
        let value = value.into();
        let changed = self.prefixes.borrow_mut().set(field, value.clone());
        if changed {
            self.controller
                .instrumentation()
                .emit(ConversionEvent::PrefixChanged { field, value });
        }

        if self.markup.is_blank() {
            return None;
        }
        Some(self.convert(ConversionDirection::ToCode).await)
    }

    /// Run the prefix self-test. Holds the controller but writes no editor.
    #[tracing::instrument(skip(self))]
    pub async fn probe(&self) -> Result<ProbeReport, ProbeError> {
        let direction = ConversionDirection::ToCode;
        let flight = self.controller.begin(direction).ok_or(ProbeError::Busy)?;

        let prefixes = self.prefixes();
        let request = probe_request(&prefixes);
        let response = self
            .controller
            .dispatch(&flight, &request)
            .await
            .map_err(ConvertError::from)?;
        drop(flight);

        let mutation = reconcile(direction, response.status, &response.body);
        if let Some(error) = mutation.error {
            return Err(error.into());
        }

        let report = ProbeReport::evaluate(&prefixes, mutation.content);
        tracing::info!(passed = report.passed(), "prefix probe finished");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::{Rc, Weak};

    use super::*;
    use crate::controller::ControllerState;
    use crate::editor::{BufferEditor, EditorObserver};
    use crate::error::TransportError;
    use crate::request::ConversionRequest;
    use crate::transport::RawResponse;

    #[derive(Default)]
    struct Scripted {
        responses: RefCell<VecDeque<RawResponse>>,
        sent: RefCell<Vec<ConversionRequest>>,
    }

    impl Scripted {
        fn answering<'a>(answers: impl IntoIterator<Item = (u16, &'a str)>) -> Self {
            let scripted = Self::default();
            for (status, body) in answers {
                scripted
                    .responses
                    .borrow_mut()
                    .push_back(RawResponse::new(status, body));
            }
            scripted
        }
    }

    impl ConversionTransport for Scripted {
        async fn dispatch(&self, request: &ConversionRequest) -> Result<RawResponse, TransportError> {
            self.sent.borrow_mut().push(request.clone());
            tokio::task::yield_now().await;
            self.responses
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| TransportError::Connection("no scripted response".into()))
        }
    }

    type TestSession = Session<Rc<BufferEditor>, Rc<BufferEditor>, Scripted>;

    fn session(markup: &str, code: &str, transport: Scripted) -> TestSession {
        Session::new(
            Rc::new(BufferEditor::with_content(EditorId::Markup, markup)),
            Rc::new(BufferEditor::with_content(EditorId::Code, code)),
            transport,
        )
    }

    #[tokio::test]
    async fn test_convert_writes_target() {
        let session = session("<p>hi</p>", "", Scripted::answering([(200, r#"{"code":"h.P(h.Text(\"hi\"))"}"#)]));

        let outcome = session.convert(ConversionDirection::ToCode).await;

        assert!(matches!(outcome, Outcome::Applied(ref m) if !m.is_diagnostic()));
        assert_eq!(session.code().content(), "h.P(h.Text(\"hi\"))");
        assert_eq!(session.markup().content(), "<p>hi</p>");
        assert_eq!(session.controller().state(), ControllerState::Idle);
    }

    #[tokio::test]
    async fn test_second_trigger_while_busy_is_dropped() {
        let session = session(
            "<p>hi</p>",
            "var n = h.P()",
            Scripted::answering([(200, r#"{"code":"h.P()"}"#)]),
        );

        let (first, second) = tokio::join!(
            session.convert(ConversionDirection::ToCode),
            session.convert(ConversionDirection::ToMarkup),
        );

        assert!(matches!(first, Outcome::Applied(_)));
        assert_eq!(second, Outcome::Dropped);
        assert_eq!(session.controller().transport().sent.borrow().len(), 1);
        assert_eq!(session.markup().content(), "<p>hi</p>");
    }

    struct Echo {
        session: Weak<TestSession>,
        attempts: RefCell<Vec<bool>>,
    }

    impl EditorObserver for Echo {
        fn on_content_changed(&self, _editor: EditorId, _content: &str) {
            if let Some(session) = self.session.upgrade() {
                let started = session.controller().begin(ConversionDirection::ToMarkup);
                self.attempts.borrow_mut().push(started.is_some());
            }
        }
    }

    #[tokio::test]
    async fn test_write_into_target_does_not_retrigger() {
        let session = Rc::new(session(
            "<p>hi</p>",
            "",
            Scripted::answering([(200, r#"{"code":"h.P()"}"#)]),
        ));
        let echo = Rc::new(Echo {
            session: Rc::downgrade(&session),
            attempts: RefCell::new(Vec::new()),
        });
        session.code().subscribe(echo.clone());

        session.convert(ConversionDirection::ToCode).await;

        assert_eq!(*echo.attempts.borrow(), vec![false]);
        assert_eq!(session.controller().transport().sent.borrow().len(), 1);
        assert!(!session.controller().is_busy());
    }

    #[tokio::test]
    async fn test_local_defect_lands_in_markup_editor() {
        let session = session("<p>old</p>", "var n = if true { 1 }", Scripted::default());

        let outcome = session.convert(ConversionDirection::ToMarkup).await;

        assert!(matches!(
            outcome.mutation().and_then(|m| m.error.as_ref()),
            Some(ConvertError::LocalStructuralDefect(_))
        ));
        assert!(session.markup().content().starts_with("<!-- "));
        assert!(session.controller().transport().sent.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_set_prefix_reconverts_with_new_value() {
        let session = session(
            "<v-btn>go</v-btn>",
            "",
            Scripted::answering([(200, r#"{"code":"vt.VBtn()"}"#)]),
        );

        let outcome = session.set_prefix(PrefixField::ComponentPrimary, "vt").await;

        assert!(matches!(outcome, Some(Outcome::Applied(_))));
        assert_eq!(session.prefixes().component_prefix_primary, "vt");
        let sent = session.controller().transport().sent.borrow();
        let ConversionRequest::ToCode { prefixes, .. } = &sent[0] else {
            panic!("expected a forward request");
        };
        assert_eq!(prefixes.component_prefix_primary, "vt");
        assert_eq!(session.code().content(), "vt.VBtn()");
    }

    #[tokio::test]
    async fn test_set_prefix_with_blank_markup_only_stores() {
        let session = session("  ", "", Scripted::default());

        assert_eq!(session.set_prefix(PrefixField::Package, "html").await, None);
        assert_eq!(session.prefixes().package_prefix, "html");
        assert!(session.controller().transport().sent.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_children_mode_reaches_request() {
        let session = session("<ul><li>a</li></ul>", "", Scripted::answering([(200, r#"{"code":"x"}"#)]))
            .with_children_mode(true);

        session.convert(ConversionDirection::ToCode).await;

        let sent = session.controller().transport().sent.borrow();
        assert!(matches!(sent[0], ConversionRequest::ToCode { children_mode: true, .. }));
    }

    #[tokio::test]
    async fn test_probe_leaves_editors_alone() {
        let code = "h.Div(v.VBtn(h.Text(\"probe button\")), vx.VXDialog(h.Text(\"probe content\")))";
        let body = serde_json::json!({ "code": code }).to_string();
        let session = session("<p>mine</p>", "mine", Scripted::answering([(200, body.as_str())]));

        let report = session.probe().await.unwrap();

        assert!(report.passed());
        assert_eq!(session.markup().content(), "<p>mine</p>");
        assert_eq!(session.code().content(), "mine");
    }

    #[tokio::test]
    async fn test_probe_reports_remote_error_and_busy() {
        let session = session(
            "",
            "",
            Scripted::answering([(400, r#"{"error":"invalid direction"}"#)]),
        );

        let err = session.probe().await.unwrap_err();
        assert_eq!(
            err,
            ProbeError::Conversion(ConvertError::RemoteValidationError {
                status: 400,
                message: "invalid direction".into()
            })
        );

        let _flight = session.controller().begin(ConversionDirection::ToMarkup).unwrap();
        assert_eq!(session.probe().await.unwrap_err(), ProbeError::Busy);
    }
}
