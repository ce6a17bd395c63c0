use std::fmt;

#[cfg(feature = "binary-cache")]
use serde::{Deserialize, Serialize};

/// Comparison operators supported in rule conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "binary-cache", derive(Serialize, Deserialize))]
pub enum CompareOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    /// Map operator text to an operator; unknown text yields `None`.
    #[must_use]
    pub fn from_token(text: &str) -> Option<Self> {
        match text {
            "==" => Some(CompareOp::Eq),
            "!=" => Some(CompareOp::Neq),
            ">" => Some(CompareOp::Gt),
            ">=" => Some(CompareOp::Gte),
            "<" => Some(CompareOp::Lt),
            "<=" => Some(CompareOp::Lte),
            _ => None,
        }
    }

    /// The operator that gives the same result with its operands swapped.
    #[must_use]
    pub fn swapped(self) -> Self {
        match self {
            CompareOp::Eq => CompareOp::Eq,
            CompareOp::Neq => CompareOp::Neq,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::Gte => CompareOp::Lte,
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Lte => CompareOp::Gte,
        }
    }
}

/// Arithmetic operators. `*` and `/` bind tighter than `+` and `-`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "binary-cache", derive(Serialize, Deserialize))]
pub enum MathOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl MathOp {
    #[must_use]
    pub fn from_token(text: &str) -> Option<Self> {
        match text {
            "+" => Some(MathOp::Add),
            "-" => Some(MathOp::Sub),
            "*" => Some(MathOp::Mul),
            "/" => Some(MathOp::Div),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "binary-cache", derive(Serialize, Deserialize))]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    #[must_use]
    pub fn from_token(text: &str) -> Option<Self> {
        match text {
            "&&" => Some(LogicalOp::And),
            "||" => Some(LogicalOp::Or),
            _ => None,
        }
    }
}

/// The literal type of a [`Constant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Decimal,
    Float,
    String,
    Bool,
    Null,
}

/// A literal appearing in rule text.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "binary-cache", derive(Serialize, Deserialize))]
pub enum Constant {
    Decimal(i64),
    Float(f64),
    String(String),
    Bool(bool),
    /// `null` when `is_null` is true; the `not null` marker otherwise.
    Null { is_null: bool },
}

impl Constant {
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self {
            Constant::Decimal(_) => DataType::Decimal,
            Constant::Float(_) => DataType::Float,
            Constant::String(_) => DataType::String,
            Constant::Bool(_) => DataType::Bool,
            Constant::Null { .. } => DataType::Null,
        }
    }

    #[must_use]
    pub fn is_not_null_marker(&self) -> bool {
        matches!(self, Constant::Null { is_null: false })
    }
}

impl From<i64> for Constant {
    fn from(v: i64) -> Self {
        Constant::Decimal(v)
    }
}

impl From<f64> for Constant {
    fn from(v: f64) -> Self {
        Constant::Float(v)
    }
}

impl From<bool> for Constant {
    fn from(v: bool) -> Self {
        Constant::Bool(v)
    }
}

impl From<&str> for Constant {
    fn from(v: &str) -> Self {
        Constant::String(v.to_owned())
    }
}

impl From<String> for Constant {
    fn from(v: String) -> Self {
        Constant::String(v)
    }
}

/// A dotted path into the data context, e.g. `order.Customer.Tier`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "binary-cache", derive(Serialize, Deserialize))]
pub struct Variable {
    path: String,
}

impl Variable {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "binary-cache", derive(Serialize, Deserialize))]
pub struct FunctionArgument {
    pub arguments: Vec<ExpressionAtom>,
}

/// A method call such as `DEFUNC.Max(a, b)` or `order.Recalculate()`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "binary-cache", derive(Serialize, Deserialize))]
pub struct FunctionCall {
    pub method: Variable,
    pub arguments: FunctionArgument,
}

/// A value-producing node: a literal, a variable, a call or arithmetic.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "binary-cache", derive(Serialize, Deserialize))]
pub enum ExpressionAtom {
    Constant(Constant),
    Variable(Variable),
    FunctionCall(FunctionCall),
    Math {
        left: Box<ExpressionAtom>,
        op: MathOp,
        right: Box<ExpressionAtom>,
    },
}

/// One comparison, or a bare atom that must evaluate to a boolean.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "binary-cache", derive(Serialize, Deserialize))]
pub struct Predicate {
    pub left: ExpressionAtom,
    pub comparison: Option<(CompareOp, ExpressionAtom)>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "binary-cache", derive(Serialize, Deserialize))]
pub enum Operand {
    Predicate(Predicate),
    Group(Box<Expression>),
}

/// A boolean condition: a head operand followed by logical-operator-joined
/// sub-expressions, evaluated left to right with short-circuiting.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "binary-cache", derive(Serialize, Deserialize))]
pub struct Expression {
    pub head: Operand,
    pub tail: Vec<(LogicalOp, Expression)>,
}

// -- Fluent construction -----------------------------------------------------

/// Start an atom from a dotted variable path.
#[must_use]
pub fn var(path: &str) -> ExpressionAtom {
    ExpressionAtom::Variable(Variable::new(path))
}

/// Start an atom from a literal.
#[must_use]
pub fn lit(value: impl Into<Constant>) -> ExpressionAtom {
    ExpressionAtom::Constant(value.into())
}

/// A call atom, e.g. `call("DEFUNC.Max", vec![var("a"), lit(1)])`.
#[must_use]
pub fn call(path: &str, arguments: Vec<ExpressionAtom>) -> ExpressionAtom {
    ExpressionAtom::FunctionCall(FunctionCall {
        method: Variable::new(path),
        arguments: FunctionArgument { arguments },
    })
}

impl ExpressionAtom {
    fn math(self, op: MathOp, right: ExpressionAtom) -> ExpressionAtom {
        ExpressionAtom::Math {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }

    #[must_use]
    pub fn plus(self, right: ExpressionAtom) -> ExpressionAtom {
        self.math(MathOp::Add, right)
    }

    #[must_use]
    pub fn minus(self, right: ExpressionAtom) -> ExpressionAtom {
        self.math(MathOp::Sub, right)
    }

    #[must_use]
    pub fn times(self, right: ExpressionAtom) -> ExpressionAtom {
        self.math(MathOp::Mul, right)
    }

    #[must_use]
    pub fn divided_by(self, right: ExpressionAtom) -> ExpressionAtom {
        self.math(MathOp::Div, right)
    }

    #[must_use]
    pub fn compare(self, op: CompareOp, right: ExpressionAtom) -> Predicate {
        Predicate {
            left: self,
            comparison: Some((op, right)),
        }
    }

    #[must_use]
    pub fn eq(self, right: ExpressionAtom) -> Predicate {
        self.compare(CompareOp::Eq, right)
    }

    #[must_use]
    pub fn neq(self, right: ExpressionAtom) -> Predicate {
        self.compare(CompareOp::Neq, right)
    }

    #[must_use]
    pub fn gt(self, right: ExpressionAtom) -> Predicate {
        self.compare(CompareOp::Gt, right)
    }

    #[must_use]
    pub fn gte(self, right: ExpressionAtom) -> Predicate {
        self.compare(CompareOp::Gte, right)
    }

    #[must_use]
    pub fn lt(self, right: ExpressionAtom) -> Predicate {
        self.compare(CompareOp::Lt, right)
    }

    #[must_use]
    pub fn lte(self, right: ExpressionAtom) -> Predicate {
        self.compare(CompareOp::Lte, right)
    }
}

impl Predicate {
    /// A predicate without comparison; its atom must produce a boolean.
    #[must_use]
    pub fn truth(atom: ExpressionAtom) -> Self {
        Self {
            left: atom,
            comparison: None,
        }
    }
}

impl From<Predicate> for Expression {
    fn from(predicate: Predicate) -> Self {
        Expression {
            head: Operand::Predicate(predicate),
            tail: Vec::new(),
        }
    }
}

impl Expression {
    /// Wrap this expression as a parenthesised group.
    #[must_use]
    pub fn group(self) -> Expression {
        Expression {
            head: Operand::Group(Box::new(self)),
            tail: Vec::new(),
        }
    }

    /// Append `&& next`. A `next` with its own tail is appended as a group,
    /// the same shape the parser produces for `a && (b || c)`.
    #[must_use]
    pub fn and(self, next: impl Into<Expression>) -> Expression {
        self.link(LogicalOp::And, next.into())
    }

    /// Append `|| next`, grouping `next` like [`and`](Self::and).
    #[must_use]
    pub fn or(self, next: impl Into<Expression>) -> Expression {
        self.link(LogicalOp::Or, next.into())
    }

    fn link(mut self, op: LogicalOp, next: Expression) -> Expression {
        let next = if next.tail.is_empty() { next } else { next.group() };
        self.tail.push((op, next));
        self
    }
}

// -- Rendering back to rule text ---------------------------------------------

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "=="),
            CompareOp::Neq => write!(f, "!="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Gte => write!(f, ">="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Lte => write!(f, "<="),
        }
    }
}

impl fmt::Display for MathOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MathOp::Add => write!(f, "+"),
            MathOp::Sub => write!(f, "-"),
            MathOp::Mul => write!(f, "*"),
            MathOp::Div => write!(f, "/"),
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => write!(f, "&&"),
            LogicalOp::Or => write!(f, "||"),
        }
    }
}

pub(crate) fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in text.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Decimal(v) => write!(f, "{v}"),
            Constant::Float(v) => {
                let text = v.to_string();
                if text.contains('.') || !v.is_finite() {
                    f.write_str(&text)
                } else {
                    write!(f, "{text}.0")
                }
            }
            Constant::String(v) => write_quoted(f, v),
            Constant::Bool(v) => write!(f, "{v}"),
            Constant::Null { is_null: true } => write!(f, "null"),
            Constant::Null { is_null: false } => write!(f, "not null"),
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.method)?;
        for (i, arg) in self.arguments.arguments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{arg}")?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for ExpressionAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionAtom::Constant(c) => write!(f, "{c}"),
            ExpressionAtom::Variable(v) => write!(f, "{v}"),
            ExpressionAtom::FunctionCall(c) => write!(f, "{c}"),
            ExpressionAtom::Math { left, op, right } => {
                write_operand(f, left)?;
                write!(f, " {op} ")?;
                write_operand(f, right)
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, atom: &ExpressionAtom) -> fmt::Result {
    if matches!(atom, ExpressionAtom::Math { .. }) {
        write!(f, "({atom})")
    } else {
        write!(f, "{atom}")
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.comparison {
            Some((op, right)) => write!(f, "{} {op} {right}", self.left),
            None => write!(f, "{}", self.left),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Predicate(p) => write!(f, "{p}"),
            Operand::Group(e) => write!(f, "({e})"),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.head)?;
        for (op, next) in &self.tail {
            if next.tail.is_empty() {
                write!(f, " {op} {}", next.head)?;
            } else {
                write!(f, " {op} ({next})")?;
            }
        }
        Ok(())
    }
}
