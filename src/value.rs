//! [`IntermediateValue`]: the typed payload a token/combinator computes
//! during a match and passes up the tree (spec §3, §GLOSSARY). Distinct from
//! a rule's user-level "value" produced by a value factory (spec §9), which
//! operates on an [`IntermediateValue`] (or on the node's text) and is owned
//! by the grammar description, not the engine.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A typed payload produced by a token or combinator match.
///
/// `Custom` is the escape hatch: `Map`, value factories and the `Number`
/// token's numeric-type parameter all need to carry arbitrary typed data
/// without making the whole engine generic over a value type (spec §9:
/// "`Custom` is the single extension point").
#[derive(Clone)]
pub enum IntermediateValue {
    Unit,
    Str(Arc<str>),
    Int(i64),
    Float(f64),
    Bool(bool),
    Custom(Arc<dyn Any + Send + Sync>),
}

impl IntermediateValue {
    pub fn str(s: impl Into<Arc<str>>) -> Self {
        IntermediateValue::Str(s.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            IntermediateValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            IntermediateValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            IntermediateValue::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            IntermediateValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn downcast_custom<T: 'static>(&self) -> Option<&T> {
        match self {
            IntermediateValue::Custom(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Debug for IntermediateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntermediateValue::Unit => write!(f, "Unit"),
            IntermediateValue::Str(s) => write!(f, "Str({s:?})"),
            IntermediateValue::Int(n) => write!(f, "Int({n})"),
            IntermediateValue::Float(n) => write!(f, "Float({n})"),
            IntermediateValue::Bool(b) => write!(f, "Bool({b})"),
            IntermediateValue::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl PartialEq for IntermediateValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (IntermediateValue::Unit, IntermediateValue::Unit) => true,
            (IntermediateValue::Str(a), IntermediateValue::Str(b)) => a == b,
            (IntermediateValue::Int(a), IntermediateValue::Int(b)) => a == b,
            (IntermediateValue::Float(a), IntermediateValue::Float(b)) => a == b,
            (IntermediateValue::Bool(a), IntermediateValue::Bool(b)) => a == b,
            _ => false,
        }
    }
}

/// Structural equality for build-time dedup (spec §4.6 step 2) needs a total
/// order over `Return`'s constant payload; `Float`'s bitwise comparison
/// means `NaN != NaN` still fails reflexivity in the IEEE sense, but two
/// `Return` nodes built from the literal same `f64::NAN` constant remain
/// distinguishable rather than silently colliding, which is the safer
/// default for a grammar author.
impl Eq for IntermediateValue {}

impl std::hash::Hash for IntermediateValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            IntermediateValue::Unit => {}
            IntermediateValue::Str(s) => s.hash(state),
            IntermediateValue::Int(n) => n.hash(state),
            IntermediateValue::Float(n) => n.to_bits().hash(state),
            IntermediateValue::Bool(b) => b.hash(state),
            IntermediateValue::Custom(arc) => (Arc::as_ptr(arc) as *const () as usize).hash(state),
        }
    }
}
