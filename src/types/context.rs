use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::builtins::{Builtins, BUILTINS_ROOT};
use super::error::ErrorKind;
use super::host::ObjectRef;
use super::value::Value;

/// The host data rules are evaluated against.
///
/// Roots are named values; dot-separated paths such as `"order.Customer.Tier"`
/// walk from a root through host object fields. The built-in functions are
/// always registered under `DEFUNC`.
#[derive(Debug)]
pub struct DataContext {
    roots: BTreeMap<String, Value>,
    retracted: Arc<AtomicBool>,
}

impl Default for DataContext {
    fn default() -> Self {
        Self::new()
    }
}

impl DataContext {
    #[must_use]
    pub fn new() -> Self {
        let retracted = Arc::new(AtomicBool::new(false));
        let mut roots = BTreeMap::new();
        roots.insert(
            BUILTINS_ROOT.to_owned(),
            Value::Object(ObjectRef::new(Builtins::new(Arc::clone(&retracted)))),
        );
        Self { roots, retracted }
    }

    /// Register a root value (builder style).
    #[must_use]
    pub fn set(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Register or replace a root value.
    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.roots.insert(name.to_owned(), value.into());
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.roots.contains_key(name)
    }

    /// Registered roots in name order, `DEFUNC` excluded.
    pub fn roots(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.roots
            .iter()
            .filter(|(name, _)| name.as_str() != BUILTINS_ROOT)
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Resolve a dotted path to its current value.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::UnknownRoot`] when the first segment is not registered
    /// - [`ErrorKind::NullDeref`] when an intermediate value is `null`
    /// - [`ErrorKind::TypeMismatch`] when selecting a field on a scalar
    /// - [`ErrorKind::UnknownField`] when a host object lacks the field
    pub fn lookup(&self, path: &str) -> Result<Value, ErrorKind> {
        let segments: Vec<&str> = path.split('.').collect();
        let mut current = self.root(segments[0])?;
        for (depth, field) in segments.iter().enumerate().skip(1) {
            current = select(&current, &segments[..depth], field)?;
        }
        Ok(current)
    }

    /// Write `value` to the field named by a dotted path.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NotAssignable`] for a bare root or a method name, any
    /// [`lookup`](Self::lookup) error for the parent path, or the host
    /// object's conversion error.
    pub fn assign(&self, path: &str, value: Value) -> Result<(), ErrorKind> {
        let Some((parent, field)) = path.rsplit_once('.') else {
            return Err(ErrorKind::NotAssignable(path.to_owned()));
        };
        let object = self.object_at(parent)?;
        let mut guard = object.write();
        if guard.has_method(field) {
            return Err(ErrorKind::NotAssignable(path.to_owned()));
        }
        guard.set_field(field, value)
    }

    /// Call the method named by a dotted path. A bare name is looked up on
    /// the built-in functions.
    ///
    /// # Errors
    ///
    /// Any [`lookup`](Self::lookup) error for the receiver,
    /// [`ErrorKind::TypeMismatch`] when the receiver is also an argument, or
    /// the error the method itself returns.
    pub fn invoke(&self, path: &str, args: Vec<Value>) -> Result<Value, ErrorKind> {
        let (receiver, method) = path.rsplit_once('.').unwrap_or((BUILTINS_ROOT, path));
        let object = self.object_at(receiver)?;
        if args.iter().any(|arg| arg.as_object().is_some_and(|a| a.ptr_eq(&object))) {
            return Err(ErrorKind::mismatch(format!(
                "'{receiver}' cannot be passed to its own method '{method}'"
            )));
        }
        let result = object.write().invoke(method, args);
        result
    }

    #[must_use]
    pub fn is_retracted(&self) -> bool {
        self.retracted.load(Ordering::SeqCst)
    }

    /// Ask the engine to stop after the current action.
    pub fn retract(&self) {
        self.retracted.store(true, Ordering::SeqCst);
    }

    pub fn reset_retract(&self) {
        self.retracted.store(false, Ordering::SeqCst);
    }

    fn root(&self, name: &str) -> Result<Value, ErrorKind> {
        self.roots
            .get(name)
            .cloned()
            .ok_or_else(|| ErrorKind::UnknownRoot(name.to_owned()))
    }

    fn object_at(&self, path: &str) -> Result<ObjectRef, ErrorKind> {
        match self.lookup(path)? {
            Value::Object(object) => Ok(object),
            Value::Null => Err(ErrorKind::NullDeref(path.to_owned())),
            other => Err(ErrorKind::mismatch(format!(
                "'{path}' is {}, not an object",
                other.kind()
            ))),
        }
    }
}

fn select(value: &Value, owner: &[&str], field: &str) -> Result<Value, ErrorKind> {
    match value {
        Value::Object(object) => object
            .read()
            .get_field(field)
            .ok_or_else(|| ErrorKind::unknown_field(&owner.join("."), field)),
        Value::Null => Err(ErrorKind::NullDeref(owner.join("."))),
        other => Err(ErrorKind::mismatch(format!(
            "cannot select '{field}' on {} value '{}'",
            other.kind(),
            owner.join(".")
        ))),
    }
}
