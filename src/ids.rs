//! Stable integer ids for tokens and rules (spec §3 invariant 1: "every rule
//! and token has a unique id in `[0, N)`; the parser stores them in parallel
//! arrays indexed by id"). Generalizes the teacher's `SyntaxKind(u16)`
//! newtype-over-an-index pattern from one closed per-grammar enum to two
//! open-ended, build-time-assigned index spaces.

use std::fmt;

macro_rules! index_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u32);

        impl $name {
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<usize> for $name {
            fn from(index: usize) -> Self {
                Self(index as u32)
            }
        }
    };
}

index_id!(TokenId, "Stable id of a [`crate::token::TokenPattern`] in a compiled [`crate::Parser`].");
index_id!(RuleId, "Stable id of a [`crate::rule::ParserRule`] in a compiled [`crate::Parser`].");

/// An element is either a token or a rule; many parts of the driver (errors,
/// walk trace, `ParsedRule::element_id`) need to refer to either uniformly.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementId {
    Token(TokenId),
    Rule(RuleId),
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementId::Token(id) => write!(f, "Token({})", id.index()),
            ElementId::Rule(id) => write!(f, "Rule({})", id.index()),
        }
    }
}

impl ElementId {
    pub fn is_token(self) -> bool {
        matches!(self, ElementId::Token(_))
    }
}
