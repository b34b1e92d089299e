//! Function values.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::Value;

pub const LAMBDA_PRECEDENCE: u8 = 1;

/// Native implementation behind a [`Func::Bridge`]. Receives the evaluated
/// arguments.
pub type BridgeFn = dyn Fn(&Value) -> Value + Send + Sync;

#[derive(Clone)]
pub enum Func {
    /// `bindings >> template`
    Lambda { bindings: Box<Value>, template: Box<Value> },
    /// A named native function. Has no literal form.
    Bridge { name: String, call: Arc<BridgeFn> },
}

impl Func {
    pub fn lambda(bindings: impl Into<Value>, template: impl Into<Value>) -> Self {
        Func::Lambda { bindings: Box::new(bindings.into()), template: Box::new(template.into()) }
    }

    pub fn bridge<F>(name: impl Into<String>, call: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Func::Bridge { name: name.into(), call: Arc::new(call) }
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Func::Lambda { bindings, template } => f
                .debug_struct("Lambda")
                .field("bindings", bindings)
                .field("template", template)
                .finish(),
            Func::Bridge { name, .. } => f.debug_tuple("Bridge").field(name).finish(),
        }
    }
}

/// Bridges are equal when they share both name and implementation.
impl PartialEq for Func {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Func::Lambda { bindings: b1, template: t1 },
                Func::Lambda { bindings: b2, template: t2 },
            ) => b1 == b2 && t1 == t2,
            (Func::Bridge { name: n1, call: c1 }, Func::Bridge { name: n2, call: c2 }) => {
                n1 == n2 && std::ptr::eq(Arc::as_ptr(c1) as *const (), Arc::as_ptr(c2) as *const ())
            }
            _ => false,
        }
    }
}

impl Eq for Func {}

impl Hash for Func {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Func::Lambda { bindings, template } => {
                bindings.hash(state);
                template.hash(state);
            }
            Func::Bridge { name, .. } => name.hash(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_equality_is_by_identity() {
        let double = Func::bridge("double", |v: &Value| v.clone());
        let same = double.clone();
        let other = Func::bridge("double", |v: &Value| v.clone());
        assert_eq!(double, same);
        assert_ne!(double, other);
        assert_eq!(format!("{:?}", double), "Bridge(\"double\")");
    }

    #[test]
    fn test_lambda_equality_is_structural() {
        assert_eq!(Func::lambda("x", "x"), Func::lambda("x", "x"));
        assert_ne!(Func::lambda("x", "x"), Func::lambda("y", "y"));
    }
}
