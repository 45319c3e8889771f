//! `parsegraph`: a lexerless, declaratively-built combinator parser engine.
//!
//! A grammar is built once, at runtime, from an author-facing [`Grammar`]
//! description (named [`token::build::BuildableToken`]s and
//! [`rule::build::BuildableRule`]s referencing each other by alias) into a
//! compiled, immutable [`Parser`] via [`build()`]. The compiled parser is
//! then driven over arbitrarily many inputs — [`Parser::parse`] for the
//! common case, [`Parser::parse_with`] when a caller needs a parameter,
//! overridden [`parser::settings::ParserSettings`], a custom
//! [`parser::barrier::BarrierStream`], or tighter [`limit::WorkLimits`].
//!
//! Grounded on the teacher's split between compile-time-generated
//! `SyntaxKind` tables and the single `Parser::parse` loop that walks them
//! (`apollo-parser`) — generalized here so the "codegen" step runs at
//! runtime over an arbitrary grammar instead of over one fixed GraphQL
//! grammar fixed at compile time.

pub mod ast;
pub mod build;
pub mod error;
pub mod ids;
pub mod incremental;
pub mod interner;
pub mod limit;
pub mod parser;
pub mod rule;
pub mod scan;
pub mod token;
pub mod value;

pub use build::build;
pub use build::BuildFlags;
pub use build::Grammar;
pub use error::BuildError;
pub use error::ParseError;
pub use ids::ElementId;
pub use incremental::Change;
pub use ids::RuleId;
pub use ids::TokenId;
pub use parser::ParseOptions;
pub use parser::ParseOutcome;
pub use parser::Parser;
pub use value::IntermediateValue;
