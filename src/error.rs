//! Error taxonomy (spec §7). `BuildError` is a real `std::error::Error` —
//! build failures are exceptional and terminal. `RecordedError` is plain
//! data the engine *accumulates* during a parse (mirrors the teacher's
//! `crate::error::Error`, which is also plain data, not an exception type);
//! `ParseError` is the `std::error::Error` the caller actually sees when a
//! top-level parse fails.

use std::fmt;

use crate::ids::ElementId;
use crate::ids::RuleId;

/// What kind of thing went wrong while matching, per spec §7's taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A token/rule did not match at a position.
    Expectation,
    /// E.g. `Repeat` got fewer than `min` children.
    RangeViolation,
    /// A zero-length element appeared where not allowed.
    InvariantViolation,
    /// `Switch`'s selector produced an index with no branch and no default.
    SelectorOutOfRange,
    /// The runtime recursion-depth safety bound was exceeded.
    RecursionDepthExceeded,
    /// The runtime total-work safety bound was exceeded.
    WorkBudgetExceeded,
}

/// A single recorded failure, per spec §3 ("error is `{ position,
/// recursion_depth, message?, element_id, is_token }`").
#[derive(Debug, Clone)]
pub struct RecordedError {
    pub kind: ErrorKind,
    pub position: usize,
    pub recursion_depth: usize,
    pub message: Option<String>,
    pub element: ElementId,
    /// The chain of rules entered to reach this failure, outermost first,
    /// innermost (the rule that actually failed) last. Only populated when
    /// `ParserSettings::write_stack_trace` is set for the failing rule (spec
    /// §3 / §4.6 step 6 `WriteStackTrace`); empty otherwise.
    pub stack_trace: Vec<RuleId>,
}

impl RecordedError {
    pub fn is_token(&self) -> bool {
        self.element.is_token()
    }
}

impl fmt::Display for RecordedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "at {}: {message}", self.position),
            None => write!(f, "at {}: {:?} failed ({:?})", self.position, self.element, self.kind),
        }
    }
}

/// A `(line, column)` pair, 1-indexed, computed lazily from a byte position.
/// This is the one piece of position *rendering* kept in scope: it's
/// positional data, not prose formatting (spec §1 keeps prose formatting
/// external).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineColumn {
    pub line: usize,
    pub column: usize,
}

pub fn line_column(input: &str, position: usize) -> LineColumn {
    let mut line = 1;
    let mut column = 1;
    for ch in input[..position.min(input.len())].chars() {
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    LineColumn { line, column }
}

/// The user-facing result of a failed top-level parse (spec §6:
/// "`ParseError` carries: human-readable rendering, list of recorded errors,
/// position, line/column").
#[derive(Debug, Clone, thiserror::Error)]
#[error("parse failed at {}:{} (byte {furthest_position}): {} error(s) recorded", at.line, at.column, errors.len())]
pub struct ParseError {
    pub errors: Vec<RecordedError>,
    pub furthest_position: usize,
    pub at: LineColumn,
}

impl ParseError {
    pub fn from_errors(input: &str, mut errors: Vec<RecordedError>) -> Self {
        errors.sort_by_key(|e| e.position);
        let furthest_position = errors.iter().map(|e| e.position).max().unwrap_or(0);
        ParseError {
            at: line_column(input, furthest_position),
            errors,
            furthest_position,
        }
    }

    /// The error with the greatest position ("furthest error", spec
    /// §GLOSSARY): the primary candidate for user-facing reporting.
    pub fn furthest(&self) -> Option<&RecordedError> {
        self.errors.iter().max_by_key(|e| e.position)
    }
}

/// Tracks the single furthest-position failure seen so far, as described in
/// spec §4.1 ("may update a shared 'furthest error' record when the failure
/// position is ≥ the current furthest"). Token matching updates this
/// directly; the parse driver's own error list (spec §4.3) is the complete
/// record, this is just the fast running summary token patterns can see
/// without access to the full list.
#[derive(Debug, Clone, Default)]
pub struct FurthestError {
    furthest: Option<RecordedError>,
}

impl FurthestError {
    pub fn note(&mut self, error: RecordedError) {
        let supersedes = match &self.furthest {
            Some(current) => error.position >= current.position,
            None => true,
        };
        if supersedes {
            self.furthest = Some(error);
        }
    }

    pub fn get(&self) -> Option<&RecordedError> {
        self.furthest.as_ref()
    }

    pub fn into_inner(self) -> Option<RecordedError> {
        self.furthest
    }
}

/// Failures that can only happen at build time (spec §7: "only at build
/// time"), never during a parse.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BuildError {
    #[error("unresolved rule or token alias: {alias:?}")]
    UnresolvedAlias { alias: String },

    #[error("unbreakable cycle: every path through rule(s) {members:?} reaches the cycle without consuming input")]
    UnbreakableCycle { members: Vec<u32> },

    #[error("malformed parameters for {what}: {reason}")]
    MalformedParameters { what: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_column_counts_newlines() {
        let input = "ab\ncd\nef";
        assert_eq!(line_column(input, 0), LineColumn { line: 1, column: 1 });
        assert_eq!(line_column(input, 3), LineColumn { line: 2, column: 1 });
        assert_eq!(line_column(input, 7), LineColumn { line: 3, column: 2 });
    }

    #[test]
    fn furthest_error_is_max_position() {
        let err = ParseError::from_errors(
            "abcdef",
            vec![
                RecordedError {
                    kind: ErrorKind::Expectation,
                    position: 1,
                    recursion_depth: 0,
                    message: None,
                    element: ElementId::Token(crate::ids::TokenId::new(0)),
                    stack_trace: Vec::new(),
                },
                RecordedError {
                    kind: ErrorKind::Expectation,
                    position: 4,
                    recursion_depth: 0,
                    message: None,
                    element: ElementId::Token(crate::ids::TokenId::new(1)),
                    stack_trace: Vec::new(),
                },
            ],
        );
        assert_eq!(err.furthest().unwrap().position, 4);
        assert_eq!(err.furthest_position, 4);
    }
}
