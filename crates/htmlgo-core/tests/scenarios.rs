use std::cell::RefCell;
use std::collections::VecDeque;

use htmlgo_core::{
    BufferEditor, ConversionDirection, ConversionRequest, ConversionTransport, ConvertError,
    Defect, EditorId, EditorSurface, Outcome, PrefixConfig, RawResponse, Session, TransportError,
    build,
};
use serde_json::json;

/// Records every request and answers from a queue.
#[derive(Default)]
struct Recorder {
    answers: RefCell<VecDeque<RawResponse>>,
    sent: RefCell<Vec<Vec<u8>>>,
}

impl Recorder {
    fn with(status: u16, body: &str) -> Self {
        let recorder = Self::default();
        recorder
            .answers
            .borrow_mut()
            .push_back(RawResponse::new(status, body));
        recorder
    }

    fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent
            .borrow()
            .iter()
            .map(|body| serde_json::from_slice(body).unwrap())
            .collect()
    }
}

impl ConversionTransport for Recorder {
    async fn dispatch(&self, request: &ConversionRequest) -> Result<RawResponse, TransportError> {
        self.sent.borrow_mut().push(request.to_body().unwrap());
        tokio::task::yield_now().await;
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| TransportError::Connection("unexpected request".into()))
    }
}

fn session(markup: &str, code: &str, recorder: Recorder) -> Session<BufferEditor, BufferEditor, Recorder> {
    Session::new(
        BufferEditor::with_content(EditorId::Markup, markup),
        BufferEditor::with_content(EditorId::Code, code),
        recorder,
    )
}

const HELLO: &str = r#"<div class="container"><h1 class="text-xl font-bold">Hello World</h1></div>"#;

#[tokio::test]
async fn forward_request_carries_markup_and_default_prefixes() {
    let session = session(HELLO, "", Recorder::with(200, r#"{"code":"h.Div()"}"#));

    session.convert(ConversionDirection::ToCode).await;

    assert_eq!(
        session.controller().transport().sent_json(),
        vec![json!({
            "direction": "html2go",
            "html": HELLO,
            "packagePrefix": "h",
            "vuetifyPrefix": "v",
            "vuetifyXPrefix": "vx",
            "childrenMode": false,
        })]
    );
    assert_eq!(session.code().content(), "h.Div()");
}

#[test]
fn forward_request_is_byte_identical_when_nothing_changed() {
    let prefixes = PrefixConfig::default();
    let first = build(ConversionDirection::ToCode, HELLO, &prefixes).unwrap();
    let second = build(ConversionDirection::ToCode, HELLO, &prefixes).unwrap();
    assert_eq!(first.to_body().unwrap(), second.to_body().unwrap());
}

#[tokio::test]
async fn inline_conditional_is_rejected_without_a_request() {
    for code in ["var n = if true { 1 }", "var n =   if true { 1 }\n", "  var n=if true {1}"] {
        let session = session("<p>keep?</p>", code, Recorder::default());

        let outcome = session.convert(ConversionDirection::ToMarkup).await;

        let Outcome::Applied(mutation) = outcome else {
            panic!("conversion should not be dropped");
        };
        assert_eq!(
            mutation.error,
            Some(ConvertError::LocalStructuralDefect(Defect::InlineConditional))
        );
        let markup = session.markup().content();
        assert!(markup.starts_with("<!-- "), "{markup}");
        assert!(markup.contains("func() string"), "{markup}");
        assert!(markup.contains("map[bool]string"), "{markup}");
        assert!(session.controller().transport().sent.borrow().is_empty());
    }
}

#[tokio::test]
async fn brace_counts_are_reported() {
    let session = session(
        "",
        "var n = h.Div(func() { if a { b() } } {)",
        Recorder::default(),
    );

    session.convert(ConversionDirection::ToMarkup).await;

    assert_eq!(
        session.markup().content(),
        "<!-- mismatched braces, open: 3, close: 2 -->"
    );
    assert!(session.controller().transport().sent.borrow().is_empty());
}

#[tokio::test]
async fn validation_error_is_shown_verbatim() {
    let session = session(
        "<p>x</p>",
        "stale",
        Recorder::with(400, r#"{"error":"HTML content is required"}"#),
    );

    session.convert(ConversionDirection::ToCode).await;

    assert_eq!(session.code().content(), "// conversion error: HTML content is required");
}

#[tokio::test]
async fn unimplemented_reverse_direction_takes_the_same_path() {
    let session = session(
        "<p>stale</p>",
        "h.Div(h.Text(\"x\"))",
        Recorder::with(501, r#"{"error":"Go to HTML conversion is not implemented yet"}"#),
    );

    session.convert(ConversionDirection::ToMarkup).await;

    assert_eq!(
        session.markup().content(),
        "<!-- conversion error: Go to HTML conversion is not implemented yet -->"
    );
    assert_eq!(
        session.controller().transport().sent_json(),
        vec![json!({ "direction": "go2html", "goCode": "var n = h.Div(h.Text(\"x\"))" })]
    );
}

#[tokio::test]
async fn second_trigger_while_busy_sends_nothing() {
    let session = session(HELLO, "var n = h.Div()", Recorder::with(200, r#"{"code":"h.Div()"}"#));

    let (first, second, third) = tokio::join!(
        session.convert(ConversionDirection::ToCode),
        session.convert(ConversionDirection::ToCode),
        session.convert(ConversionDirection::ToMarkup),
    );

    assert!(matches!(first, Outcome::Applied(_)));
    assert_eq!(second, Outcome::Dropped);
    assert_eq!(third, Outcome::Dropped);
    assert_eq!(session.controller().transport().sent.borrow().len(), 1);
    assert!(!session.controller().is_busy());
}
