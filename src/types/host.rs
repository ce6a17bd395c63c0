use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::error::ErrorKind;
use super::value::{FromValue, Value};

/// A host object that rules can read, write and call methods on.
///
/// Implement it by hand, or with the [`host_object!`](crate::host_object)
/// macro for plain structs whose fields map one-to-one to rule fields.
pub trait HostObject: Send + Sync {
    /// The name used in error messages.
    fn type_name(&self) -> &str;

    /// Read a field. `None` means the object has no such field.
    fn get_field(&self, name: &str) -> Option<Value>;

    /// Write a field.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::UnknownField`] when the field does not exist, or a
    /// conversion error when `value` cannot be stored in it.
    fn set_field(&mut self, name: &str, value: Value) -> Result<(), ErrorKind>;

    /// Names of the readable fields, in a stable order.
    fn field_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Whether `name` is a method rather than a field.
    fn has_method(&self, name: &str) -> bool {
        let _ = name;
        false
    }

    /// Call a method with already evaluated arguments.
    ///
    /// The receiver is write-locked for the duration of the call, so the
    /// method must not lock an argument that refers back to the receiver.
    /// [`DataContext::invoke`](crate::DataContext::invoke) rejects calls that
    /// pass the receiver itself as an argument.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::UnknownField`] when the method does not exist, or
    /// [`ErrorKind::ArityMismatch`] / conversion errors from the call itself.
    fn invoke(&mut self, method: &str, args: Vec<Value>) -> Result<Value, ErrorKind> {
        let _ = args;
        Err(ErrorKind::unknown_field(self.type_name(), method))
    }
}

/// Shared handle to a host object.
///
/// Equality is identity: two handles are equal only when they point at the
/// same object.
#[derive(Clone)]
pub struct ObjectRef(Arc<RwLock<dyn HostObject>>);

impl ObjectRef {
    pub fn new<T: HostObject + 'static>(object: T) -> Self {
        Self(Arc::new(RwLock::new(object)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, dyn HostObject + 'static> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, dyn HostObject + 'static> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }

    #[must_use]
    pub fn type_name(&self) -> String {
        match self.0.try_read() {
            Ok(guard) => guard.type_name().to_owned(),
            Err(_) => "locked".to_owned(),
        }
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectRef").field(&self.type_name()).finish()
    }
}

/// Fail with [`ErrorKind::ArityMismatch`] unless exactly `expected` arguments
/// were passed.
///
/// # Errors
///
/// See above.
pub fn expect_arity(method: &str, args: &[Value], expected: usize) -> Result<(), ErrorKind> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(ErrorKind::ArityMismatch {
            method: method.to_owned(),
            expected,
            actual: args.len(),
        })
    }
}

/// Convert argument `index` to a host type.
///
/// # Errors
///
/// [`ErrorKind::ArityMismatch`] if the argument is missing, otherwise the
/// conversion error.
pub fn arg<T: FromValue>(method: &str, args: &[Value], index: usize) -> Result<T, ErrorKind> {
    let value = args.get(index).ok_or_else(|| ErrorKind::ArityMismatch {
        method: method.to_owned(),
        expected: index + 1,
        actual: args.len(),
    })?;
    T::from_value(value.clone())
}

/// Implement [`HostObject`] for a struct by mapping rule field names to
/// struct fields.
///
/// Field types must be `Clone + Into<Value>` and implement
/// [`FromValue`](crate::FromValue).
///
/// ```
/// use ruleforge::host_object;
///
/// #[derive(Debug, Clone)]
/// struct User {
///     age: i64,
///     adult: bool,
/// }
///
/// host_object!(User {
///     "Age" => age,
///     "Adult" => adult,
/// });
/// ```
#[macro_export]
macro_rules! host_object {
    ($ty:ident { $($name:literal => $field:ident),* $(,)? }) => {
        impl $crate::HostObject for $ty {
            fn type_name(&self) -> &str {
                stringify!($ty)
            }

            fn get_field(&self, name: &str) -> ::std::option::Option<$crate::Value> {
                match name {
                    $($name => ::std::option::Option::Some($crate::Value::from(
                        ::std::clone::Clone::clone(&self.$field),
                    )),)*
                    _ => ::std::option::Option::None,
                }
            }

            fn set_field(
                &mut self,
                name: &str,
                value: $crate::Value,
            ) -> ::std::result::Result<(), $crate::ErrorKind> {
                match name {
                    $($name => {
                        self.$field = $crate::FromValue::from_value(value)?;
                        ::std::result::Result::Ok(())
                    })*
                    _ => ::std::result::Result::Err($crate::ErrorKind::unknown_field(
                        stringify!($ty),
                        name,
                    )),
                }
            }

            fn field_names(&self) -> ::std::vec::Vec<::std::string::String> {
                ::std::vec![$(::std::string::String::from($name)),*]
            }
        }
    };
}

/// A dynamically shaped host object backed by an ordered field map.
///
/// Writes keep the kind of the value already stored in a field, with the
/// numeric widening of [`Value::coerce_to`]. A field holding `null` accepts
/// any value. New fields cannot be created by rules.
#[derive(Debug, Clone, Default)]
pub struct Record {
    name: String,
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Add or replace a field.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    #[must_use]
    pub fn into_ref(self) -> ObjectRef {
        ObjectRef::new(self)
    }
}

impl HostObject for Record {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn get_field(&self, name: &str) -> Option<Value> {
        self.fields.get(name).cloned()
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<(), ErrorKind> {
        let slot = self
            .fields
            .get_mut(name)
            .ok_or_else(|| ErrorKind::unknown_field(&self.name, name))?;
        *slot = value.coerce_to(slot.kind())?;
        Ok(())
    }

    fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }
}
