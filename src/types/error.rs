use thiserror::Error;

use crate::parse::ParseError;

/// The failure categories of evaluation and host binding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("unknown root '{0}'")]
    UnknownRoot(String),

    #[error("unknown field '{field}' on '{owner}'")]
    UnknownField { owner: String, field: String },

    #[error("null dereference at '{0}'")]
    NullDeref(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("numeric overflow: {0}")]
    NumericOverflow(String),

    #[error("division by zero")]
    DivideByZero,

    #[error("'{method}' expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        method: String,
        expected: usize,
        actual: usize,
    },

    #[error("'{0}' is not assignable")]
    NotAssignable(String),
}

impl ErrorKind {
    #[must_use]
    pub fn unknown_field(owner: &str, field: &str) -> Self {
        ErrorKind::UnknownField {
            owner: owner.to_owned(),
            field: field.to_owned(),
        }
    }

    pub(crate) fn mismatch(message: impl Into<String>) -> Self {
        ErrorKind::TypeMismatch(message.into())
    }
}

/// An evaluation failure annotated with the AST path where it surfaced.
///
/// Each node the error bubbles through prepends its segment, so the rendered
/// path reads from the scope down to the failing node, e.g.
/// `when.expr[0].left`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}{}", location(.trail))]
pub struct EvalError {
    kind: ErrorKind,
    trail: Vec<String>,
}

impl EvalError {
    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Dotted path from the outermost node to the node that failed.
    #[must_use]
    pub fn node_path(&self) -> String {
        joined(&self.trail)
    }

    pub(crate) fn within(mut self, segment: impl Into<String>) -> Self {
        self.trail.push(segment.into());
        self
    }
}

impl From<ErrorKind> for EvalError {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            trail: Vec::new(),
        }
    }
}

fn joined(trail: &[String]) -> String {
    let segments: Vec<&str> = trail.iter().rev().map(String::as_str).collect();
    segments.join(".")
}

fn location(trail: &[String]) -> String {
    if trail.is_empty() {
        String::new()
    } else {
        format!(" at {}", joined(trail))
    }
}

/// Errors reported while turning DSL text into a [`RuleSet`](crate::RuleSet).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error(transparent)]
    Syntax(#[from] ParseError),

    #[error("duplicate rule name '{name}'")]
    DuplicateRule { name: String },

    #[error("unknown operator '{token}' in rule '{rule}'")]
    UnknownOperator { rule: String, token: String },

    #[error("invalid literal '{token}' in rule '{rule}': {reason}")]
    InvalidLiteral {
        rule: String,
        token: String,
        reason: String,
    },

    #[error("malformed rule '{rule}': {message}")]
    Malformed { rule: String, message: String },

    #[error("builder invariant violated: {message}")]
    BuilderInvariant { message: String },
}

/// Errors that end an engine run early.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("rule '{rule}' failed: {source}")]
    Action { rule: String, source: EvalError },

    #[error("cycle limit of {limit} exceeded")]
    CycleLimit { limit: usize },

    #[error("run cancelled after {cycles} cycle(s)")]
    Cancelled { cycles: usize },
}
