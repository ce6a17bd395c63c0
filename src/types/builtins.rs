use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::error::ErrorKind;
use super::host::{expect_arity, HostObject};
use super::value::{BaseKind, Value};

/// Root name under which the built-in functions are registered.
pub const BUILTINS_ROOT: &str = "DEFUNC";

const METHODS: &[&str] = &["Now", "Retract", "Log", "Len", "IsZero", "Max", "Min"];

/// Built-in functions callable from rules as `DEFUNC.Name(...)` or `Name(...)`.
#[derive(Debug, Clone)]
pub(crate) struct Builtins {
    retracted: Arc<AtomicBool>,
}

impl Builtins {
    pub(crate) fn new(retracted: Arc<AtomicBool>) -> Self {
        Self { retracted }
    }
}

impl HostObject for Builtins {
    fn type_name(&self) -> &str {
        BUILTINS_ROOT
    }

    fn get_field(&self, _name: &str) -> Option<Value> {
        None
    }

    fn set_field(&mut self, name: &str, _value: Value) -> Result<(), ErrorKind> {
        Err(ErrorKind::NotAssignable(format!("{BUILTINS_ROOT}.{name}")))
    }

    fn has_method(&self, name: &str) -> bool {
        METHODS.contains(&name)
    }

    fn invoke(&mut self, method: &str, args: Vec<Value>) -> Result<Value, ErrorKind> {
        match method {
            "Now" => {
                expect_arity(method, &args, 0)?;
                Ok(Value::Time(Utc::now()))
            }
            "Retract" => {
                expect_arity(method, &args, 0)?;
                self.retracted.store(true, Ordering::SeqCst);
                Ok(Value::Null)
            }
            "Log" => {
                expect_arity(method, &args, 1)?;
                let text = args[0].to_text().unwrap_or_else(|_| args[0].to_string());
                info!(target: "ruleforge::rule", "{text}");
                Ok(Value::Null)
            }
            "Len" => {
                expect_arity(method, &args, 1)?;
                match &args[0] {
                    Value::String(s) => i64::try_from(s.chars().count())
                        .map(Value::Int)
                        .map_err(|_| ErrorKind::NumericOverflow("string length".into())),
                    other => Err(ErrorKind::mismatch(format!(
                        "Len expects a String, found {}",
                        other.kind()
                    ))),
                }
            }
            "IsZero" => {
                expect_arity(method, &args, 1)?;
                match &args[0] {
                    Value::Int(v) => Ok(Value::Bool(*v == 0)),
                    Value::Uint(v) => Ok(Value::Bool(*v == 0)),
                    Value::Float(v) => Ok(Value::Bool(*v == 0.0)),
                    other => Err(ErrorKind::mismatch(format!(
                        "IsZero expects a number, found {}",
                        other.kind()
                    ))),
                }
            }
            "Max" | "Min" => {
                expect_arity(method, &args, 2)?;
                extreme(&args[0], &args[1], method == "Max")
            }
            _ => Err(ErrorKind::unknown_field(BUILTINS_ROOT, method)),
        }
    }
}

fn extreme(a: &Value, b: &Value, greatest: bool) -> Result<Value, ErrorKind> {
    let pick = |a_wins: bool| if a_wins == greatest { a.clone() } else { b.clone() };
    match (a.base_kind(), b.base_kind()) {
        (BaseKind::Int64, BaseKind::Int64) => Ok(pick(a.to_int()? >= b.to_int()?)),
        (BaseKind::Uint64, BaseKind::Uint64) => Ok(pick(a.to_uint()? >= b.to_uint()?)),
        _ if a.is_numeric() && b.is_numeric() => {
            let (l, r) = (a.to_float()?, b.to_float()?);
            Ok(Value::Float(if greatest { l.max(r) } else { l.min(r) }))
        }
        _ => Err(ErrorKind::mismatch(format!(
            "expected two numbers, found {} and {}",
            a.kind(),
            b.kind()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtins() -> (Builtins, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(false));
        (Builtins::new(Arc::clone(&flag)), flag)
    }

    #[test]
    fn retract_sets_flag() {
        let (mut b, flag) = builtins();
        assert_eq!(b.invoke("Retract", vec![]), Ok(Value::Null));
        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn now_returns_time() {
        let (mut b, _) = builtins();
        assert!(b.invoke("Now", vec![]).unwrap().is_time());
    }

    #[test]
    fn arity_is_checked() {
        let (mut b, _) = builtins();
        assert_eq!(
            b.invoke("Now", vec![Value::Int(1)]),
            Err(ErrorKind::ArityMismatch {
                method: "Now".into(),
                expected: 0,
                actual: 1
            })
        );
        assert!(matches!(
            b.invoke("Max", vec![Value::Int(1)]),
            Err(ErrorKind::ArityMismatch { .. })
        ));
    }

    #[test]
    fn max_min() {
        let (mut b, _) = builtins();
        assert_eq!(
            b.invoke("Max", vec![Value::Int(3), Value::Int(9)]),
            Ok(Value::Int(9))
        );
        assert_eq!(
            b.invoke("Min", vec![Value::Int(3), Value::Int(9)]),
            Ok(Value::Int(3))
        );
        assert_eq!(
            b.invoke("Max", vec![Value::Int(3), Value::Float(2.5)]),
            Ok(Value::Float(3.0))
        );
        assert!(b.invoke("Min", vec![Value::from("a"), Value::Int(1)]).is_err());
    }

    #[test]
    fn len_and_is_zero() {
        let (mut b, _) = builtins();
        assert_eq!(b.invoke("Len", vec![Value::from("héllo")]), Ok(Value::Int(5)));
        assert_eq!(b.invoke("IsZero", vec![Value::Uint(0)]), Ok(Value::Bool(true)));
        assert_eq!(b.invoke("IsZero", vec![Value::Float(0.1)]), Ok(Value::Bool(false)));
    }

    #[test]
    fn builtins_are_not_assignable() {
        let (mut b, _) = builtins();
        assert!(b.has_method("Retract"));
        assert!(!b.has_method("Nope"));
        assert_eq!(
            b.set_field("Now", Value::Null),
            Err(ErrorKind::NotAssignable("DEFUNC.Now".into()))
        );
        assert_eq!(
            b.invoke("Nope", vec![]),
            Err(ErrorKind::unknown_field("DEFUNC", "Nope"))
        );
    }
}
