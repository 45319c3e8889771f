//! The authoring-facing mirror of [`super::TokenPattern`] (spec §4.6 step 1:
//! "buildable descriptions are walked; named references resolved to ids;
//! unnamed inline children inlined"). A grammar author builds a tree of
//! [`BuildableToken`]s naming children either by alias or inline; the build
//! pipeline in [`crate::build`] canonicalizes this into a flat, id-indexed
//! [`super::TokenTable`].

use std::sync::Arc;

use super::CaseSensitivity;
use super::EscapeMap;
use super::LiteralSet;
use super::NumberFlags;
use super::NumberTarget;
use super::ParamFn;
use super::Predicate;
use super::RegexPattern;
use super::ValueFn;
use crate::value::IntermediateValue;

/// A reference to another token, either by alias (resolved during
/// canonicalization) or inlined directly.
#[derive(Debug, Clone)]
pub enum TokenRef {
    Alias(String),
    Inline(Box<BuildableToken>),
}

impl From<&str> for TokenRef {
    fn from(alias: &str) -> Self {
        TokenRef::Alias(alias.to_string())
    }
}

impl From<BuildableToken> for TokenRef {
    fn from(token: BuildableToken) -> Self {
        TokenRef::Inline(Box::new(token))
    }
}

#[derive(Debug, Clone)]
pub enum BuildableToken {
    Literal(Arc<str>, CaseSensitivity),
    LiteralChar(char),
    LiteralChoice(LiteralSet),
    Keyword(Arc<str>, CaseSensitivity, Option<Predicate>),
    KeywordChoice(LiteralSet, Option<Predicate>),
    Number(NumberFlags, NumberTarget),
    Regex(RegexPattern),
    Identifier { start: Predicate, cont: Predicate, min_len: usize },
    Whitespaces,
    Spaces,
    Newline,
    Character(Predicate),
    RepeatCharacters { predicate: Predicate, min: usize, max: Option<usize> },
    TextUntil(LiteralSet),
    EscapedText { escapes: EscapeMap, terminators: LiteralSet },
    Eof,
    Empty,
    Fail,

    Sequence(Vec<TokenRef>),
    Choice(super::ChoiceMode, Vec<TokenRef>),
    Optional(TokenRef),
    Repeat { child: TokenRef, min: usize, max: Option<usize> },
    SeparatedRepeat { element: TokenRef, separator: TokenRef, min: usize, max: Option<usize>, allow_trailing: bool, include_sep: bool },
    Between(TokenRef, TokenRef, TokenRef),
    First(TokenRef, TokenRef),
    Second(TokenRef, TokenRef),
    Map(TokenRef, ValueFn),
    Return(TokenRef, IntermediateValue),
    CaptureText { child: TokenRef, trim_start: bool, trim_end: bool },
    SkipWhitespaces(TokenRef),
    Lookahead { child: TokenRef, positive: bool },
    Switch { selector: ParamFn<i64>, branches: Vec<TokenRef>, default: Option<TokenRef> },
    If { predicate: ParamFn<bool>, then_branch: TokenRef, else_branch: Option<TokenRef> },

    /// A grammar-wide named declaration this token is an additional alias
    /// for (spec §4.6 step 2: "aliases of the winner accumulate").
    Alias(Box<BuildableToken>),
}

impl BuildableToken {
    pub fn literal(s: impl Into<Arc<str>>) -> Self {
        BuildableToken::Literal(s.into(), CaseSensitivity::Sensitive)
    }

    pub fn keyword(s: impl Into<Arc<str>>) -> Self {
        BuildableToken::Keyword(s.into(), CaseSensitivity::Sensitive, None)
    }
}
