//! Values stored in and produced by the container
//!
//! Everything the container hands around is a [`Value`]: raw data, a built
//! service object, or a service closure that is invoked on read. Closures and
//! extensions carry identities so the container can tag them (factory,
//! protected) without comparing function pointers.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::{Container, DIError, DIResult};

/// A built service object, shared across everything that depends on it.
pub type Instance = Arc<dyn Any + Send + Sync>;

type ServiceFn = dyn Fn(&Container) -> DIResult<Value> + Send + Sync;
type ExtendFn = dyn Fn(Value, &Container) -> DIResult<Option<Value>> + Send + Sync;
type ProduceFn = dyn Fn() -> DIResult<Value> + Send + Sync;

static NEXT_CLOSURE_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_CLOSURE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Any value the container stores, binds, or injects.
#[derive(Clone)]
pub enum Value {
    /// Raw data. Arrays and maps can be extended, scalars cannot.
    Data(serde_json::Value),
    /// A built service object.
    Object(Instance),
    /// A service closure, invoked by the container when read.
    Closure(Closure),
}

impl Value {
    /// Wrap a service object.
    pub fn object<T: Send + Sync + 'static>(object: T) -> Self {
        Value::Object(Arc::new(object))
    }

    /// Wrap an already shared service object.
    pub fn from_arc<T: Send + Sync + 'static>(object: Arc<T>) -> Self {
        Value::Object(object as Instance)
    }

    /// Wrap raw data.
    pub fn data(data: impl Into<serde_json::Value>) -> Self {
        Value::Data(data.into())
    }

    /// Wrap a service closure.
    pub fn closure<F>(f: F) -> Self
    where
        F: Fn(&Container) -> DIResult<Value> + Send + Sync + 'static,
    {
        Value::Closure(Closure::new(f))
    }

    /// Downcast a service object to its concrete type.
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        match self {
            Value::Object(instance) => instance.clone().downcast::<T>().ok(),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Data(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_closure(&self) -> Option<&Closure> {
        match self {
            Value::Closure(closure) => Some(closure),
            _ => None,
        }
    }

    pub fn is_closure(&self) -> bool {
        matches!(self, Value::Closure(_))
    }

    /// Whether an extension can be composed onto this value.
    pub fn is_extendable(&self) -> bool {
        match self {
            Value::Closure(_) | Value::Object(_) => true,
            Value::Data(data) => data.is_array() || data.is_object(),
        }
    }

    /// Identity comparison: same object, same closure, or equal data.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => a.id() == b.id(),
            (Value::Data(a), Value::Data(b)) => a == b,
            _ => false,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Data(serde_json::Value::Array(_)) => "array",
            Value::Data(serde_json::Value::Object(_)) => "map",
            Value::Data(_) => "scalar",
            Value::Object(_) => "object",
            Value::Closure(_) => "closure",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Data(data) => f.debug_tuple("Data").field(data).finish(),
            Value::Object(_) => f.write_str("Object(..)"),
            Value::Closure(closure) => f.debug_tuple("Closure").field(&closure.id()).finish(),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(data: serde_json::Value) -> Self {
        Value::Data(data)
    }
}

impl From<Closure> for Value {
    fn from(closure: Closure) -> Self {
        Value::Closure(closure)
    }
}

impl From<&str> for Value {
    fn from(data: &str) -> Self {
        Value::Data(data.into())
    }
}

impl From<String> for Value {
    fn from(data: String) -> Self {
        Value::Data(data.into())
    }
}

impl From<i64> for Value {
    fn from(data: i64) -> Self {
        Value::Data(data.into())
    }
}

impl From<bool> for Value {
    fn from(data: bool) -> Self {
        Value::Data(data.into())
    }
}

/// Identity of a [`Closure`], shared by all of its clones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClosureId(u64);

/// A service closure. Plain closures are invoked once and their result cached;
/// factory closures run on every read; protected closures are never invoked.
#[derive(Clone)]
pub struct Closure {
    id: ClosureId,
    func: Arc<ServiceFn>,
}

impl Closure {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Container) -> DIResult<Value> + Send + Sync + 'static,
    {
        Self {
            id: ClosureId(next_id()),
            func: Arc::new(f),
        }
    }

    pub fn id(&self) -> ClosureId {
        self.id
    }

    pub fn invoke(&self, container: &Container) -> DIResult<Value> {
        (self.func)(container)
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure").field("id", &self.id).finish()
    }
}

/// A decorator composed onto a service by `Container::extend`.
///
/// Returning `Ok(None)` keeps the value the extension was given.
#[derive(Clone)]
pub struct Extension {
    func: Arc<ExtendFn>,
}

impl Extension {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value, &Container) -> DIResult<Option<Value>> + Send + Sync + 'static,
    {
        Self { func: Arc::new(f) }
    }

    /// Apply to `value`, falling back to it when the extension yields nothing.
    pub fn apply(&self, value: Value, container: &Container) -> DIResult<Value> {
        let fallback = value.clone();
        Ok((self.func)(value, container)?.unwrap_or(fallback))
    }
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Extension(..)")
    }
}

/// Zero-argument producer used as a binding target.
#[derive(Clone)]
pub struct Producer {
    func: Arc<ProduceFn>,
}

impl Producer {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> DIResult<Value> + Send + Sync + 'static,
    {
        Self { func: Arc::new(f) }
    }

    pub fn produce(&self) -> DIResult<Value> {
        (self.func)()
    }
}

impl fmt::Debug for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Producer(..)")
    }
}

/// Resolved arguments handed to a constructor, in declared parameter order.
#[derive(Debug, Clone, Default)]
pub struct Args {
    values: Vec<Value>,
}

impl Args {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, index: usize) -> DIResult<&Value> {
        self.values.get(index).ok_or_else(|| DIError::InvalidServiceType {
            message: format!("missing argument at position {}", index),
        })
    }

    /// The argument at `index` as a service object of type `T`.
    pub fn object<T: Send + Sync + 'static>(&self, index: usize) -> DIResult<Arc<T>> {
        let value = self.value(index)?;
        value.downcast::<T>().ok_or_else(|| DIError::InvalidServiceType {
            message: format!(
                "argument {} is {}, expected {}",
                index,
                value.kind(),
                std::any::type_name::<T>()
            ),
        })
    }

    pub fn data(&self, index: usize) -> DIResult<&serde_json::Value> {
        let value = self.value(index)?;
        value.as_data().ok_or_else(|| DIError::InvalidServiceType {
            message: format!("argument {} is {}, expected data", index, value.kind()),
        })
    }

    pub fn str(&self, index: usize) -> DIResult<&str> {
        self.data(index)?
            .as_str()
            .ok_or_else(|| DIError::InvalidServiceType {
                message: format!("argument {} is not a string", index),
            })
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq)]
    struct Logger {
        prefix: String,
    }

    #[test]
    fn test_closure_clones_share_identity() {
        let closure = Closure::new(|_| Ok(Value::data(1)));
        let copy = closure.clone();
        let other = Closure::new(|_| Ok(Value::data(1)));

        assert_eq!(closure.id(), copy.id());
        assert_ne!(closure.id(), other.id());
    }

    #[test]
    fn test_extendable_kinds() {
        assert!(Value::data(json!([1, 2])).is_extendable());
        assert!(Value::data(json!({"a": 1})).is_extendable());
        assert!(Value::object(Logger { prefix: "x".into() }).is_extendable());
        assert!(Value::closure(|_| Ok(Value::data(1))).is_extendable());
        assert!(!Value::data(42).is_extendable());
        assert!(!Value::data("text").is_extendable());
    }

    #[test]
    fn test_args_typed_access() {
        let args = Args::new(vec![
            Value::object(Logger { prefix: "app".into() }),
            Value::data("name"),
        ]);

        assert_eq!(args.object::<Logger>(0).unwrap().prefix, "app");
        assert_eq!(args.str(1).unwrap(), "name");
        assert!(matches!(
            args.object::<Logger>(1),
            Err(DIError::InvalidServiceType { .. })
        ));
        assert!(args.value(2).is_err());
    }

    #[test]
    fn test_ptr_eq_distinguishes_objects() {
        let shared = Arc::new(Logger { prefix: "a".into() });
        let a = Value::from_arc(shared.clone());
        let b = Value::from_arc(shared);
        let c = Value::object(Logger { prefix: "a".into() });

        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }
}
