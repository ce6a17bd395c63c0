use std::fmt;

#[cfg(feature = "binary-cache")]
use serde::{Deserialize, Serialize};

use super::expr::{ExpressionAtom, FunctionArgument, FunctionCall, Variable};

/// `target = source;`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "binary-cache", derive(Serialize, Deserialize))]
pub struct Assignment {
    pub target: Variable,
    pub source: ExpressionAtom,
}

/// One statement of a `then` block.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "binary-cache", derive(Serialize, Deserialize))]
pub enum AssignExpression {
    Assignment(Assignment),
    /// A call made for its side effect, e.g. `DEFUNC.Retract();`.
    Call(FunctionCall),
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "binary-cache", derive(Serialize, Deserialize))]
pub struct AssignExpressions {
    pub expressions: Vec<AssignExpression>,
}

/// The `then` block of a rule.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "binary-cache", derive(Serialize, Deserialize))]
pub struct ThenScope {
    pub assignments: AssignExpressions,
}

impl Assignment {
    #[must_use]
    pub fn new(target: &str, source: ExpressionAtom) -> Self {
        Self {
            target: Variable::new(target),
            source,
        }
    }
}

impl ThenScope {
    /// Append an assignment statement.
    #[must_use]
    pub fn assign(mut self, target: &str, source: ExpressionAtom) -> Self {
        self.assignments
            .expressions
            .push(AssignExpression::Assignment(Assignment::new(target, source)));
        self
    }

    /// Append a call statement such as `DEFUNC.Retract();`.
    #[must_use]
    pub fn call(mut self, method: &str, arguments: Vec<ExpressionAtom>) -> Self {
        self.assignments
            .expressions
            .push(AssignExpression::Call(FunctionCall {
                method: Variable::new(method),
                arguments: FunctionArgument { arguments },
            }));
        self
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {};", self.target, self.source)
    }
}

impl fmt::Display for AssignExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignExpression::Assignment(a) => write!(f, "{a}"),
            AssignExpression::Call(c) => write!(f, "{c};"),
        }
    }
}

impl fmt::Display for ThenScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, statement) in self.assignments.expressions.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{statement}")?;
        }
        Ok(())
    }
}
