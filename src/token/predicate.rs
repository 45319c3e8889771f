//! Character predicates for [`super::TokenPattern::Character`],
//! [`super::TokenPattern::RepeatCharacters`] and [`super::TokenPattern::Identifier`].
//!
//! A predicate is a boxed closure rather than a fn pointer so authoring code
//! can close over grammar-specific character classes (e.g. "identifier
//! continue, but not `_`"). Grounded on the teacher's `lexer.rs` free
//! functions (`is_whitespace`, `is_ident_char`, `is_digit_char`, ...), which
//! are plain `char -> bool` predicates inlined at lexer call sites; here they
//! become first-class values since token patterns are data, not code.

use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(char) -> bool + Send + Sync>);

impl Predicate {
    pub fn new(f: impl Fn(char) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn test(&self, c: char) -> bool {
        (self.0)(c)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate(..)")
    }
}

impl PartialEq for Predicate {
    /// Predicates compare by pointer identity, not behavior: structural
    /// dedup (spec §4.6 step 2) can only ever collapse two `Character`
    /// patterns built from the exact same `Predicate` value, never two
    /// behaviorally-equivalent-but-distinct closures.
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Predicate {}

impl std::hash::Hash for Predicate {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as *const () as usize).hash(state);
    }
}

pub fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

pub fn is_identifier_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

pub fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

pub fn is_whitespace(c: char) -> bool {
    // Excludes line terminators: `Whitespaces`/`Spaces` are distinct from
    // `Newline`, which owns `\n`/`\r` handling (spec §4.1).
    matches!(c, ' ' | '\t')
}

pub fn is_space(c: char) -> bool {
    c == ' '
}

pub fn identifier_start() -> Predicate {
    Predicate::new(is_identifier_start)
}

pub fn identifier_continue() -> Predicate {
    Predicate::new(is_identifier_continue)
}

pub fn digit() -> Predicate {
    Predicate::new(is_digit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicate_equality_is_identity_not_behavior() {
        let a = digit();
        let b = digit();
        assert_ne!(a, b, "two separately-built predicates are distinct values");
        let c = a.clone();
        assert_eq!(a, c);
    }
}
