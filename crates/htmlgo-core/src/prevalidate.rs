//! Local structural checks for generated code before a reverse conversion.
//!
//! This is a short list of heuristics, not a parser. Each [`Rule`] looks at
//! the raw text and either rejects it with a [`Defect`], rewrites it, or
//! passes. Rules run in [`RULES`] order and the first verdict wins. Code that
//! passes every rule may still be invalid; the service gets the final say.

use std::sync::LazyLock;

use miette::Diagnostic;
use regex::Regex;
use thiserror::Error;

/// Name the conversion service expects the top-level expression to be bound to.
pub const BINDING_NAME: &str = "n";

/// Structural problems found without asking the service.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[non_exhaustive]
pub enum Defect {
    /// A conditional used directly as an expression value (`var n = if ...`).
    #[error("{}", INLINE_CONDITIONAL_HELP)]
    #[diagnostic(code(htmlgo::prevalidate::inline_conditional))]
    InlineConditional,

    /// A conditional keyword where a well-formed block cannot start.
    #[error("warning: the code contains a malformed conditional statement, check the if blocks")]
    #[diagnostic(code(htmlgo::prevalidate::conditional_misuse))]
    ConditionalMisuse,

    #[error("mismatched braces, open: {open}, close: {close}")]
    #[diagnostic(code(htmlgo::prevalidate::braces))]
    MismatchedBraces { open: usize, close: usize },

    #[error("mismatched parentheses, open: {open}, close: {close}")]
    #[diagnostic(code(htmlgo::prevalidate::parens))]
    MismatchedParens { open: usize, close: usize },
}

const INLINE_CONDITIONAL_HELP: &str = r#"syntax error: unexpected if, expected expression
use one of these forms instead:

    // 1. wrap the branch in a function literal and call it
    var n = h.Div().Text(func() string {
        if condition {
            return "yes"
        }
        return "no"
    }())

    // 2. index a two-entry map with the condition
    condition := true
    var n = h.Div().Text(map[bool]string{true: "yes", false: "no"}[condition])"#;

/// What a rule decided about the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Reject(Defect),
    Rewrite(String),
}

/// A named check in the validation list.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    check: fn(&str) -> Option<Verdict>,
}

impl Rule {
    pub const fn new(name: &'static str, check: fn(&str) -> Option<Verdict>) -> Self {
        Self { name, check }
    }

    pub fn evaluate(&self, code: &str) -> Option<Verdict> {
        (self.check)(code)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Rule").field(&self.name).finish()
    }
}

/// The default rule list, in priority order.
pub const RULES: &[Rule] = &[
    Rule::new("inline-conditional", inline_conditional),
    Rule::new("conditional-misuse", conditional_misuse),
    Rule::new("balanced-braces", balanced_braces),
    Rule::new("balanced-parens", balanced_parens),
    Rule::new("top-level-binding", top_level_binding),
];

/// Code that survived validation, possibly rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prevalidated {
    pub code: String,
    /// Name of the rule that rewrote the code, if any.
    pub rewritten_by: Option<&'static str>,
}

impl Prevalidated {
    pub fn was_rewritten(&self) -> bool {
        self.rewritten_by.is_some()
    }
}

/// Run the default [`RULES`] over `code`.
pub fn prevalidate(code: &str) -> Result<Prevalidated, Defect> {
    prevalidate_with(RULES, code)
}

/// Run `rules` in order; the first rule with a verdict decides.
pub fn prevalidate_with(rules: &[Rule], code: &str) -> Result<Prevalidated, Defect> {
    for rule in rules {
        match rule.evaluate(code) {
            Some(Verdict::Reject(defect)) => {
                tracing::debug!(rule = rule.name, %defect, "code rejected locally");
                return Err(defect);
            }
            Some(Verdict::Rewrite(rewritten)) => {
                tracing::debug!(rule = rule.name, "code rewritten locally");
                return Ok(Prevalidated {
                    code: rewritten,
                    rewritten_by: Some(rule.name),
                });
            }
            None => {}
        }
    }
    Ok(Prevalidated {
        code: code.to_string(),
        rewritten_by: None,
    })
}

// An assignment (`=`, `:=`) whose right-hand side starts with `if`.
static INLINE_IF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^=!<>])=\s*if\b").expect("valid inline-if pattern"));

// `if {` with no condition, `if true {` / `if false {` with a constant one, or
// `if` in argument position. Matched with string literals and comments masked.
static MISPLACED_IF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bif\s*\{|\bif\s+(?:true|false)\s*\{|[(,]\s*if\b").expect("valid misplaced-if pattern")
});

static BINDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\bvar\s+{BINDING_NAME}\s*=|\b{BINDING_NAME}\s*:="
    ))
    .expect("valid binding pattern")
});

fn inline_conditional(code: &str) -> Option<Verdict> {
    INLINE_IF
        .is_match(code)
        .then_some(Verdict::Reject(Defect::InlineConditional))
}

fn conditional_misuse(code: &str) -> Option<Verdict> {
    MISPLACED_IF
        .is_match(&mask_literals(code))
        .then_some(Verdict::Reject(Defect::ConditionalMisuse))
}

/// Blank out string literal contents and drop `//` comments, keeping line
/// breaks, so prose such as `h.Text("Save (if needed)")` cannot look like code.
fn mask_literals(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    let mut chars = code.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' | '`' => {
                out.push(ch);
                let mut escaped = false;
                for inner in chars.by_ref() {
                    if inner == ch && !escaped {
                        out.push(inner);
                        break;
                    }
                    // Raw (backtick) strings have no escapes.
                    escaped = ch == '"' && inner == '\\' && !escaped;
                    out.push(if inner == '\n' { '\n' } else { ' ' });
                }
            }
            '/' if chars.peek() == Some(&'/') => {
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            _ => out.push(ch),
        }
    }
    out
}

fn count_pair(code: &str, open: char, close: char) -> (usize, usize) {
    code.chars().fold((0, 0), |(o, c), ch| {
        if ch == open {
            (o + 1, c)
        } else if ch == close {
            (o, c + 1)
        } else {
            (o, c)
        }
    })
}

fn balanced_braces(code: &str) -> Option<Verdict> {
    let (open, close) = count_pair(code, '{', '}');
    (open != close).then_some(Verdict::Reject(Defect::MismatchedBraces { open, close }))
}

fn balanced_parens(code: &str) -> Option<Verdict> {
    let (open, close) = count_pair(code, '(', ')');
    (open != close).then_some(Verdict::Reject(Defect::MismatchedParens { open, close }))
}

/// Bind the primary expression when neither binding idiom is present.
///
/// The primary expression starts at the first line that is neither blank nor
/// a `//` comment and runs to the end of the text.
fn top_level_binding(code: &str) -> Option<Verdict> {
    if BINDING.is_match(code) {
        return None;
    }

    let mut offset = 0;
    for line in code.split_inclusive('\n') {
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with("//") {
            let start = offset + (line.len() - line.trim_start().len());
            let expression = code[start..].trim_end();
            return Some(Verdict::Rewrite(format!("var {BINDING_NAME} = {expression}")));
        }
        offset += line.len();
    }
    None
}
