use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};

use super::error::ErrorKind;
use super::expr::{CompareOp, MathOp};
use super::host::ObjectRef;

/// The kind tag carried by every [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Int,
    Uint,
    Float,
    String,
    Bool,
    Time,
    Null,
    Object,
}

/// Kind classification with every numeric width collapsed into one 64-bit class.
///
/// Host fields may be declared with any width (`i8`, `u32`, `f32`, ...); once they
/// enter the evaluator they are classified by their base kind only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseKind {
    Int64,
    Uint64,
    Float64,
    String,
    Bool,
    Time,
    Null,
    Object,
}

/// A dynamically typed value flowing through rule evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Any signed integer, widened to 64 bits.
    Int(i64),
    /// Any unsigned integer, widened to 64 bits.
    Uint(u64),
    /// Any floating-point number, widened to 64 bits.
    Float(f64),
    /// A UTF-8 string.
    String(String),
    /// A boolean value.
    Bool(bool),
    /// A point in time.
    Time(DateTime<Utc>),
    /// The absence of a value.
    Null,
    /// A handle to a host object, used only for member navigation.
    Object(ObjectRef),
}

impl Value {
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Value::Int(_) => Kind::Int,
            Value::Uint(_) => Kind::Uint,
            Value::Float(_) => Kind::Float,
            Value::String(_) => Kind::String,
            Value::Bool(_) => Kind::Bool,
            Value::Time(_) => Kind::Time,
            Value::Null => Kind::Null,
            Value::Object(_) => Kind::Object,
        }
    }

    #[must_use]
    pub fn base_kind(&self) -> BaseKind {
        match self.kind() {
            Kind::Int => BaseKind::Int64,
            Kind::Uint => BaseKind::Uint64,
            Kind::Float => BaseKind::Float64,
            Kind::String => BaseKind::String,
            Kind::Bool => BaseKind::Bool,
            Kind::Time => BaseKind::Time,
            Kind::Null => BaseKind::Null,
            Kind::Object => BaseKind::Object,
        }
    }

    #[must_use]
    pub fn is_time(&self) -> bool {
        matches!(self, Value::Time(_))
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self.base_kind(),
            BaseKind::Int64 | BaseKind::Uint64 | BaseKind::Float64
        )
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Value::Uint(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_time(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Time(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(v) => Some(v),
            _ => None,
        }
    }

    /// Promote any numeric value to `f64`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::TypeMismatch`] for non-numeric kinds.
    #[allow(clippy::cast_precision_loss)]
    pub fn to_float(&self) -> Result<f64, ErrorKind> {
        match self {
            Value::Int(v) => Ok(*v as f64),
            Value::Uint(v) => Ok(*v as f64),
            Value::Float(v) => Ok(*v),
            other => Err(ErrorKind::mismatch(format!(
                "expected a number, found {}",
                other.kind()
            ))),
        }
    }

    /// Convert an integer value to `i64`. Floats are never narrowed.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NumericOverflow`] when an unsigned value exceeds `i64::MAX`,
    /// [`ErrorKind::TypeMismatch`] for any other kind.
    pub fn to_int(&self) -> Result<i64, ErrorKind> {
        match self {
            Value::Int(v) => Ok(*v),
            Value::Uint(v) => i64::try_from(*v)
                .map_err(|_| ErrorKind::NumericOverflow(format!("{v} does not fit in i64"))),
            other => Err(ErrorKind::mismatch(format!(
                "expected an integer, found {}",
                other.kind()
            ))),
        }
    }

    /// Convert an integer value to `u64`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NumericOverflow`] for negative signed values,
    /// [`ErrorKind::TypeMismatch`] for any non-integer kind.
    pub fn to_uint(&self) -> Result<u64, ErrorKind> {
        match self {
            Value::Uint(v) => Ok(*v),
            Value::Int(v) => u64::try_from(*v).map_err(|_| {
                ErrorKind::NumericOverflow(format!("negative value {v} used as unsigned"))
            }),
            other => Err(ErrorKind::mismatch(format!(
                "expected an unsigned integer, found {}",
                other.kind()
            ))),
        }
    }

    /// Render a scalar value as plain text (no quoting), as used by string
    /// concatenation.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::TypeMismatch`] for `Null` and host objects.
    pub fn to_text(&self) -> Result<String, ErrorKind> {
        match self {
            Value::Int(v) => Ok(v.to_string()),
            Value::Uint(v) => Ok(v.to_string()),
            Value::Float(v) => Ok(v.to_string()),
            Value::String(v) => Ok(v.clone()),
            Value::Bool(v) => Ok(v.to_string()),
            Value::Time(v) => Ok(v.to_rfc3339()),
            other => Err(ErrorKind::mismatch(format!(
                "{} has no text form",
                other.kind()
            ))),
        }
    }

    /// Convert this value so it can be stored where a value of `target` kind
    /// currently lives, applying numeric widening.
    ///
    /// A `Null` target accepts anything; `Object` targets also accept `Null`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NumericOverflow`] if a number is not representable in the
    /// target kind, [`ErrorKind::TypeMismatch`] otherwise.
    pub fn coerce_to(self, target: Kind) -> Result<Value, ErrorKind> {
        match (target, self) {
            (Kind::Null, value) => Ok(value),
            (Kind::Int, value @ (Value::Int(_) | Value::Uint(_))) => value.to_int().map(Value::Int),
            (Kind::Uint, value @ (Value::Int(_) | Value::Uint(_))) => {
                value.to_uint().map(Value::Uint)
            }
            (Kind::Float, value) if value.is_numeric() => value.to_float().map(Value::Float),
            (Kind::Object, value @ (Value::Object(_) | Value::Null)) => Ok(value),
            (target, value) if value.kind() == target => Ok(value),
            (target, value) => Err(ErrorKind::mismatch(format!(
                "cannot store {} in a {target} field",
                value.kind()
            ))),
        }
    }

    /// Compare this value to another using the given operator.
    ///
    /// Values of the same primitive kind compare natively, times compare by
    /// instant, strings lexicographically, and mixed numeric kinds are
    /// promoted to `f64`. `null` and host objects support equality only.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::TypeMismatch`] for incompatible kinds or an ordering
    /// operator on a kind without ordering.
    pub fn compare(&self, op: CompareOp, other: &Value) -> Result<bool, ErrorKind> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => {
                equality(op, self.is_null() && other.is_null(), self, other)
            }
            (Value::Object(a), Value::Object(b)) => equality(op, a.ptr_eq(b), self, other),
            (Value::Bool(a), Value::Bool(b)) => equality(op, a == b, self, other),
            (Value::Time(a), Value::Time(b)) => Ok(ordered(op, a.cmp(b))),
            (Value::String(a), Value::String(b)) => Ok(ordered(op, a.cmp(b))),
            (Value::Int(a), Value::Int(b)) => Ok(ordered(op, a.cmp(b))),
            (Value::Uint(a), Value::Uint(b)) => Ok(ordered(op, a.cmp(b))),
            _ if self.is_numeric() && other.is_numeric() => {
                let (l, r) = (self.to_float()?, other.to_float()?);
                Ok(match op {
                    CompareOp::Eq => l == r,
                    CompareOp::Neq => l != r,
                    CompareOp::Gt => l > r,
                    CompareOp::Gte => l >= r,
                    CompareOp::Lt => l < r,
                    CompareOp::Lte => l <= r,
                })
            }
            _ => Err(ErrorKind::mismatch(format!(
                "cannot compare {} {op} {}",
                self.kind(),
                other.kind()
            ))),
        }
    }

    /// Apply a math operator.
    ///
    /// `+` with a string on either side concatenates. Otherwise both sides must
    /// be numeric: any float makes the result a float, else any unsigned
    /// operand makes it unsigned, else it is signed.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::TypeMismatch`], [`ErrorKind::NumericOverflow`] or
    /// [`ErrorKind::DivideByZero`].
    pub fn calculate(&self, op: MathOp, other: &Value) -> Result<Value, ErrorKind> {
        if matches!(self, Value::String(_)) || matches!(other, Value::String(_)) {
            if op != MathOp::Add {
                return Err(ErrorKind::mismatch(format!(
                    "operator {op} is not defined on strings"
                )));
            }
            return Ok(Value::String(format!(
                "{}{}",
                self.to_text()?,
                other.to_text()?
            )));
        }
        if !self.is_numeric() || !other.is_numeric() {
            return Err(ErrorKind::mismatch(format!(
                "cannot apply {op} to {} and {}",
                self.kind(),
                other.kind()
            )));
        }
        match (self.base_kind(), other.base_kind()) {
            (BaseKind::Float64, _) | (_, BaseKind::Float64) => {
                float_math(op, self.to_float()?, other.to_float()?)
            }
            (BaseKind::Uint64, _) | (_, BaseKind::Uint64) => {
                uint_math(op, self.to_uint()?, other.to_uint()?)
            }
            _ => int_math(op, self.to_int()?, other.to_int()?),
        }
    }
}

fn equality(op: CompareOp, equal: bool, l: &Value, r: &Value) -> Result<bool, ErrorKind> {
    match op {
        CompareOp::Eq => Ok(equal),
        CompareOp::Neq => Ok(!equal),
        _ => Err(ErrorKind::mismatch(format!(
            "operator {op} is not defined between {} and {}",
            l.kind(),
            r.kind()
        ))),
    }
}

fn ordered(op: CompareOp, ord: Ordering) -> bool {
    match op {
        CompareOp::Eq => ord == Ordering::Equal,
        CompareOp::Neq => ord != Ordering::Equal,
        CompareOp::Gt => ord == Ordering::Greater,
        CompareOp::Gte => ord != Ordering::Less,
        CompareOp::Lt => ord == Ordering::Less,
        CompareOp::Lte => ord != Ordering::Greater,
    }
}

fn int_math(op: MathOp, l: i64, r: i64) -> Result<Value, ErrorKind> {
    let result = match op {
        MathOp::Add => l.checked_add(r),
        MathOp::Sub => l.checked_sub(r),
        MathOp::Mul => l.checked_mul(r),
        MathOp::Div => {
            if r == 0 {
                return Err(ErrorKind::DivideByZero);
            }
            l.checked_div(r)
        }
    };
    result
        .map(Value::Int)
        .ok_or_else(|| ErrorKind::NumericOverflow(format!("{l} {op} {r}")))
}

fn uint_math(op: MathOp, l: u64, r: u64) -> Result<Value, ErrorKind> {
    let result = match op {
        MathOp::Add => l.checked_add(r),
        MathOp::Sub => l.checked_sub(r),
        MathOp::Mul => l.checked_mul(r),
        MathOp::Div => {
            if r == 0 {
                return Err(ErrorKind::DivideByZero);
            }
            l.checked_div(r)
        }
    };
    result
        .map(Value::Uint)
        .ok_or_else(|| ErrorKind::NumericOverflow(format!("{l} {op} {r}")))
}

fn float_math(op: MathOp, l: f64, r: f64) -> Result<Value, ErrorKind> {
    Ok(Value::Float(match op {
        MathOp::Add => l + r,
        MathOp::Sub => l - r,
        MathOp::Mul => l * r,
        MathOp::Div => {
            if r == 0.0 {
                return Err(ErrorKind::DivideByZero);
            }
            l / r
        }
    }))
}

macro_rules! impl_from_int {
    ($variant:ident as $wide:ty: $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(<$wide>::from(v))
                }
            }
        )*
    };
}

impl_from_int!(Int as i64: i8, i16, i32, i64);
impl_from_int!(Uint as u64: u8, u16, u32, u64);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Time(v)
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Value::Object(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Conversion from a [`Value`] into a statically typed host field or
/// method parameter.
///
/// Integers widen or narrow only when the value is representable in the
/// target type; strings, booleans and times convert by identity.
pub trait FromValue: Sized {
    /// # Errors
    ///
    /// [`ErrorKind::NumericOverflow`] or [`ErrorKind::TypeMismatch`].
    fn from_value(value: Value) -> Result<Self, ErrorKind>;
}

macro_rules! impl_from_value_int {
    ($via:ident: $($t:ty),*) => {
        $(
            impl FromValue for $t {
                fn from_value(value: Value) -> Result<Self, ErrorKind> {
                    let wide = value.$via()?;
                    <$t>::try_from(wide).map_err(|_| {
                        ErrorKind::NumericOverflow(format!(
                            "{wide} does not fit in {}",
                            stringify!($t)
                        ))
                    })
                }
            }
        )*
    };
}

impl_from_value_int!(to_int: i8, i16, i32, i64);
impl_from_value_int!(to_uint: u8, u16, u32, u64);

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ErrorKind> {
        value.to_float()
    }
}

impl FromValue for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_value(value: Value) -> Result<Self, ErrorKind> {
        value.to_float().map(|v| v as f32)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ErrorKind> {
        match value {
            Value::Bool(v) => Ok(v),
            other => Err(ErrorKind::mismatch(format!(
                "expected Bool, found {}",
                other.kind()
            ))),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ErrorKind> {
        match value {
            Value::String(v) => Ok(v),
            other => Err(ErrorKind::mismatch(format!(
                "expected String, found {}",
                other.kind()
            ))),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, ErrorKind> {
        match value {
            Value::Time(v) => Ok(v),
            other => Err(ErrorKind::mismatch(format!(
                "expected Time, found {}",
                other.kind()
            ))),
        }
    }
}

impl FromValue for ObjectRef {
    fn from_value(value: Value) -> Result<Self, ErrorKind> {
        match value {
            Value::Object(v) => Ok(v),
            other => Err(ErrorKind::mismatch(format!(
                "expected Object, found {}",
                other.kind()
            ))),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ErrorKind> {
        Ok(value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ErrorKind> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Int => "Int",
            Kind::Uint => "Uint",
            Kind::Float => "Float",
            Kind::String => "String",
            Kind::Bool => "Bool",
            Kind::Time => "Time",
            Kind::Null => "Null",
            Kind::Object => "Object",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Uint(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "\"{v}\""),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Time(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Null => write!(f, "null"),
            Value::Object(v) => write!(f, "<{}>", v.type_name()),
        }
    }
}
