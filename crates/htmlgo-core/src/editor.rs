//! Editor surfaces and their subscription interface.
//!
//! The editor widgets themselves live outside this crate. The core only needs
//! to read and replace their text, and to be told when something changes.
//! `BufferEditor` is an in-memory surface used by the CLI and by tests.

use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;

/// Which of the two editors an operation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorId {
    /// The left editor, holding markup.
    Markup,
    /// The right editor, holding generated code.
    Code,
}

impl EditorId {
    pub fn label(self) -> &'static str {
        match self {
            Self::Markup => "markup",
            Self::Code => "code",
        }
    }

    /// Wrap `text` in this editor's comment syntax.
    ///
    /// Code comments are line comments, so every line gets its own marker.
    /// Markup comments cannot contain `--`, so dash runs are split apart.
    pub fn comment(self, text: &str) -> String {
        match self {
            Self::Markup => format!("<!-- {} -->", split_dash_runs(text)),
            Self::Code => text
                .lines()
                .map(|line| {
                    if line.is_empty() {
                        "//".to_string()
                    } else {
                        format!("// {line}")
                    }
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

fn split_dash_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev = None;
    for c in text.chars() {
        if c == '-' && prev == Some('-') {
            out.push(' ');
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

/// Read/write access to an editor's text.
///
/// Methods take `&self`: implementations own their interior mutability, the
/// same way a widget handle does.
pub trait EditorSurface {
    /// Current full text of the editor.
    fn content(&self) -> String;

    /// Replace the full text of the editor.
    fn set_content(&self, text: &str);

    /// True when the editor holds nothing but whitespace.
    fn is_blank(&self) -> bool {
        self.content().trim().is_empty()
    }
}

impl<E: EditorSurface + ?Sized> EditorSurface for Rc<E> {
    fn content(&self) -> String {
        (**self).content()
    }

    fn set_content(&self, text: &str) {
        (**self).set_content(text)
    }
}

impl<E: EditorSurface + ?Sized> EditorSurface for &E {
    fn content(&self) -> String {
        (**self).content()
    }

    fn set_content(&self, text: &str) {
        (**self).set_content(text)
    }
}

/// Callbacks an editor fires. All default to no-ops.
pub trait EditorObserver {
    fn on_content_changed(&self, _editor: EditorId, _content: &str) {}

    fn on_focus(&self, _editor: EditorId) {}

    fn on_selection_changed(&self, _editor: EditorId, _selection: Range<usize>) {}
}

/// In-memory editor surface that notifies subscribers on every change.
pub struct BufferEditor {
    id: EditorId,
    text: RefCell<String>,
    observers: RefCell<Vec<Rc<dyn EditorObserver>>>,
}

impl BufferEditor {
    pub fn new(id: EditorId) -> Self {
        Self::with_content(id, "")
    }

    pub fn with_content(id: EditorId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: RefCell::new(text.into()),
            observers: RefCell::new(Vec::new()),
        }
    }

    pub fn id(&self) -> EditorId {
        self.id
    }

    pub fn subscribe(&self, observer: Rc<dyn EditorObserver>) {
        self.observers.borrow_mut().push(observer);
    }

    /// Report that the editor gained focus.
    pub fn focus(&self) {
        for observer in self.snapshot_observers() {
            observer.on_focus(self.id);
        }
    }

    /// Report a selection change, in byte offsets.
    pub fn select(&self, selection: Range<usize>) {
        for observer in self.snapshot_observers() {
            observer.on_selection_changed(self.id, selection.clone());
        }
    }

    // Observers may call back into this editor, so never hold a borrow while notifying.
    fn snapshot_observers(&self) -> Vec<Rc<dyn EditorObserver>> {
        self.observers.borrow().clone()
    }
}

impl EditorSurface for BufferEditor {
    fn content(&self) -> String {
        self.text.borrow().clone()
    }

    fn set_content(&self, text: &str) {
        {
            let mut current = self.text.borrow_mut();
            current.clear();
            current.push_str(text);
        }
        tracing::trace!(editor = self.id.label(), len = text.len(), "editor content replaced");
        for observer in self.snapshot_observers() {
            observer.on_content_changed(self.id, text);
        }
    }
}

impl std::fmt::Debug for BufferEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferEditor")
            .field("id", &self.id)
            .field("text", &self.text.borrow())
            .field("observers", &self.observers.borrow().len())
            .finish()
    }
}
