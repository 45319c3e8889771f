//! Leaf matchers over the raw input character sequence (spec §3, §4.1).
//!
//! [`TokenPattern`] is a single closed tagged union, not a trait-object
//! hierarchy (spec §9: "implementations should model both tokens and rules
//! as tagged unions, not class hierarchies"). Combinator variants hold
//! [`TokenId`] children; [`match_token`] is the one recursive dispatch that
//! interprets the whole union, mirroring how the teacher's lexer is one
//! `Cursor::advance` loop rather than a method per token kind.

pub mod build;
pub mod number;
pub mod predicate;
pub mod trie;

use std::fmt;
use std::sync::Arc;
use std::sync::OnceLock;

use crate::error::ErrorKind;
use crate::error::FurthestError;
use crate::error::RecordedError;
use crate::ids::ElementId;
use crate::ids::TokenId;
use crate::value::IntermediateValue;

pub use number::NumberFlags;
pub use number::NumberTarget;
pub use predicate::Predicate;
pub use trie::CaseSensitivity;

/// A canonicalized, deduplicable set of fixed strings with a lazily-built
/// [`trie::Trie`]. Equality and hashing look only at the entries and case
/// sensitivity — the cached trie is derived data (spec §4.6 step 2:
/// structural hash is over "variant discriminator, children ids,
/// parameters", and the trie is not a parameter, it's a cache).
pub struct LiteralSet {
    entries: Vec<Arc<str>>,
    case: CaseSensitivity,
    trie: OnceLock<trie::Trie>,
}

impl LiteralSet {
    pub fn new(entries: impl IntoIterator<Item = impl Into<Arc<str>>>, case: CaseSensitivity) -> Self {
        let mut entries: Vec<Arc<str>> = entries.into_iter().map(Into::into).collect();
        entries.sort();
        entries.dedup();
        Self { entries, case, trie: OnceLock::new() }
    }

    fn trie(&self) -> &trie::Trie {
        self.trie.get_or_init(|| trie::Trie::new(self.entries.iter().map(|s| s.as_ref()), self.case))
    }

    pub fn first_chars(&self) -> std::collections::HashSet<char> {
        self.trie().first_chars().clone()
    }
}

impl Clone for LiteralSet {
    fn clone(&self) -> Self {
        Self { entries: self.entries.clone(), case: self.case, trie: OnceLock::new() }
    }
}

impl fmt::Debug for LiteralSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiteralSet").field("entries", &self.entries).field("case", &self.case).finish()
    }
}

impl PartialEq for LiteralSet {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries && self.case == other.case
    }
}

impl Eq for LiteralSet {}

impl std::hash::Hash for LiteralSet {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.entries.hash(state);
        self.case.hash(state);
    }
}

/// `(from, to)` substitutions for [`TokenPattern::EscapedText`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EscapeMap {
    entries: Vec<(Arc<str>, Arc<str>)>,
}

impl EscapeMap {
    pub fn new(entries: impl IntoIterator<Item = (impl Into<Arc<str>>, impl Into<Arc<str>>)>) -> Self {
        Self { entries: entries.into_iter().map(|(f, t)| (f.into(), t.into())).collect() }
    }

    /// Longest `from` entry matching a prefix of `text`, if any.
    fn longest_match<'a>(&'a self, text: &str) -> Option<(&'a str, &'a str)> {
        self.entries
            .iter()
            .filter(|(from, _)| text.starts_with(from.as_ref()))
            .max_by_key(|(from, _)| from.len())
            .map(|(from, to)| (from.as_ref(), to.as_ref()))
    }
}

/// A regex compared and hashed by pattern source, since `regex::Regex`
/// itself implements neither (spec §4.6 step 2 dedup needs both).
#[derive(Debug, Clone)]
pub struct RegexPattern(pub Arc<regex::Regex>);

impl PartialEq for RegexPattern {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

impl Eq for RegexPattern {}

impl std::hash::Hash for RegexPattern {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.as_str().hash(state);
    }
}

/// A closure parameterized over the user's opaque `parser_parameter` (spec
/// §3 "ParserContext ... optional parser-parameter"), used by `Switch`'s
/// selector and `If`'s predicate. Compared by pointer identity, like
/// [`predicate::Predicate`].
#[derive(Clone)]
pub struct ParamFn<O>(Arc<dyn Fn(Option<&dyn std::any::Any>) -> O + Send + Sync>);

impl<O> ParamFn<O> {
    pub fn new(f: impl Fn(Option<&dyn std::any::Any>) -> O + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, parameter: Option<&dyn std::any::Any>) -> O {
        (self.0)(parameter)
    }
}

impl<O> fmt::Debug for ParamFn<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParamFn(..)")
    }
}

impl<O> PartialEq for ParamFn<O> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<O> Eq for ParamFn<O> {}

impl<O> std::hash::Hash for ParamFn<O> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as *const () as usize).hash(state);
    }
}

/// A pure function over an [`IntermediateValue`], used by `Map`.
#[derive(Clone)]
pub struct ValueFn(Arc<dyn Fn(IntermediateValue) -> IntermediateValue + Send + Sync>);

impl ValueFn {
    pub fn new(f: impl Fn(IntermediateValue) -> IntermediateValue + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, value: IntermediateValue) -> IntermediateValue {
        (self.0)(value)
    }
}

impl fmt::Debug for ValueFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueFn(..)")
    }
}

impl PartialEq for ValueFn {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ValueFn {}

impl std::hash::Hash for ValueFn {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as *const () as usize).hash(state);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChoiceMode {
    First,
    Longest,
    Shortest,
}

/// The closed set of leaf matchers (spec §3 table).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenPattern {
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

    Sequence(Vec<TokenId>),
    Choice(ChoiceMode, Vec<TokenId>),
    Optional(TokenId),
    Repeat { child: TokenId, min: usize, max: Option<usize> },
    SeparatedRepeat { element: TokenId, separator: TokenId, min: usize, max: Option<usize>, allow_trailing: bool, include_sep: bool },
    Between(TokenId, TokenId, TokenId),
    First(TokenId, TokenId),
    Second(TokenId, TokenId),
    Map(TokenId, ValueFn),
    Return(TokenId, IntermediateValue),
    CaptureText { child: TokenId, trim_start: bool, trim_end: bool },
    SkipWhitespaces(TokenId),
    Lookahead { child: TokenId, positive: bool },
    Switch { selector: ParamFn<i64>, branches: Vec<TokenId>, default: Option<TokenId> },
    If { predicate: ParamFn<bool>, then_branch: TokenId, else_branch: Option<TokenId> },
}

/// Indexed, immutable table of compiled token patterns (spec §3 invariant 1).
#[derive(Debug, Default)]
pub struct TokenTable {
    patterns: Vec<TokenPattern>,
}

impl TokenTable {
    pub fn new(patterns: Vec<TokenPattern>) -> Self {
        Self { patterns }
    }

    pub fn get(&self, id: TokenId) -> &TokenPattern {
        &self.patterns[id.index()]
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TokenId, &TokenPattern)> {
        self.patterns.iter().enumerate().map(|(i, p)| (TokenId::new(i as u32), p))
    }
}

/// The result of a successful token match (spec §3 "Parsed element").
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedElement {
    pub start: usize,
    pub length: usize,
    pub value: Option<IntermediateValue>,
}

impl ParsedElement {
    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

/// The ambient state `match_token` threads through recursive calls (spec
/// §4.1's `match(...)` contract, bundled so the dispatch signature stays
/// readable).
pub struct MatchCx<'a> {
    pub input: &'a str,
    pub parameter: Option<&'a dyn std::any::Any>,
    pub furthest: &'a mut FurthestError,
}

impl<'a> MatchCx<'a> {
    fn fail(&mut self, id: TokenId, position: usize, kind: ErrorKind, message: Option<&str>) {
        self.furthest.note(RecordedError {
            kind,
            position,
            recursion_depth: 0,
            message: message.map(ToString::to_string),
            element: ElementId::Token(id),
            stack_trace: Vec::new(),
        });
    }
}

/// Dispatches a single token match (spec §4.1's `match` operation).
pub fn match_token(
    table: &TokenTable,
    id: TokenId,
    position: usize,
    barrier_position: usize,
    cx: &mut MatchCx<'_>,
    compute_value: bool,
) -> Result<ParsedElement, ()> {
    let limit = barrier_position.min(cx.input.len());
    if position > limit {
        cx.fail(id, position, ErrorKind::Expectation, None);
        return Err(());
    }
    let rest = &cx.input[position..limit];

    match table.get(id) {
        TokenPattern::Literal(s, case) => match_literal(cx, id, position, rest, s, *case),
        TokenPattern::LiteralChar(c) => match_literal_char(cx, id, position, rest, *c),
        TokenPattern::LiteralChoice(set) => match_literal_choice(cx, id, position, rest, set, compute_value),
        TokenPattern::Keyword(s, case, follow) => match_keyword(cx, id, position, rest, s, *case, follow.as_ref()),
        TokenPattern::KeywordChoice(set, follow) => match_keyword_choice(cx, id, position, rest, set, follow.as_ref()),
        TokenPattern::Number(flags, target) => match_number_token(cx, id, position, rest, *flags, *target, compute_value),
        TokenPattern::Regex(pattern) => match_regex(cx, id, position, pattern, limit, compute_value),
        TokenPattern::Identifier { start, cont, min_len } => match_identifier(cx, id, position, rest, start, cont, *min_len, compute_value),
        TokenPattern::Whitespaces => match_run(cx, id, position, rest, predicate::is_whitespace, 1, compute_value),
        TokenPattern::Spaces => match_run(cx, id, position, rest, predicate::is_space, 1, compute_value),
        TokenPattern::Newline => match_newline(cx, id, position, rest),
        TokenPattern::Character(pred) => match_character(cx, id, position, rest, pred, compute_value),
        TokenPattern::RepeatCharacters { predicate, min, max } => match_repeat_characters(cx, id, position, rest, predicate, *min, *max, compute_value),
        TokenPattern::TextUntil(terminators) => match_text_until(cx, id, position, rest, terminators, compute_value),
        TokenPattern::EscapedText { escapes, terminators } => match_escaped_text(cx, id, position, rest, escapes, terminators, compute_value),
        TokenPattern::Eof => match_eof(cx, id, position),
        TokenPattern::Empty => match_empty(cx, id, position, barrier_position),
        TokenPattern::Fail => {
            cx.fail(id, position, ErrorKind::Expectation, None);
            Err(())
        }

        TokenPattern::Sequence(children) => match_sequence(table, children, position, barrier_position, cx, compute_value),
        TokenPattern::Choice(mode, children) => match_choice(table, *mode, children, position, barrier_position, cx, compute_value),
        TokenPattern::Optional(child) => match_optional(table, *child, position, barrier_position, cx, compute_value),
        TokenPattern::Repeat { child, min, max } => match_repeat(table, *child, *min, *max, position, barrier_position, cx),
        TokenPattern::SeparatedRepeat { element, separator, min, max, allow_trailing, include_sep } => {
            match_separated_repeat(table, *element, *separator, *min, *max, *allow_trailing, *include_sep, position, barrier_position, cx)
        }
        TokenPattern::Between(a, b, c) => match_between(table, *a, *b, *c, position, barrier_position, cx, compute_value),
        TokenPattern::First(a, b) => match_first(table, *a, *b, position, barrier_position, cx, compute_value),
        TokenPattern::Second(a, b) => match_second(table, *a, *b, position, barrier_position, cx, compute_value),
        TokenPattern::Map(child, f) => match_map(table, *child, f, position, barrier_position, cx, compute_value),
        TokenPattern::Return(child, value) => match_return(table, *child, value, position, barrier_position, cx, compute_value),
        TokenPattern::CaptureText { child, trim_start, trim_end } => match_capture_text(table, *child, *trim_start, *trim_end, position, barrier_position, cx, compute_value),
        TokenPattern::SkipWhitespaces(child) => match_skip_whitespaces(table, *child, position, barrier_position, cx, compute_value),
        TokenPattern::Lookahead { child, positive } => match_lookahead(table, *child, *positive, position, barrier_position, cx),
        TokenPattern::Switch { selector, branches, default } => match_switch(table, selector, branches, default.as_ref(), position, barrier_position, cx, compute_value),
        TokenPattern::If { predicate, then_branch, else_branch } => match_if(table, predicate, *then_branch, else_branch.as_ref(), position, barrier_position, cx, compute_value),
    }
}

fn ok(start: usize, length: usize, value: Option<IntermediateValue>) -> Result<ParsedElement, ()> {
    Ok(ParsedElement { start, length, value })
}

fn match_literal(cx: &mut MatchCx<'_>, id: TokenId, position: usize, rest: &str, s: &str, case: CaseSensitivity) -> Result<ParsedElement, ()> {
    let matches = match case {
        CaseSensitivity::Sensitive => rest.starts_with(s),
        CaseSensitivity::Insensitive => rest.len() >= s.len() && rest[..s.len()].eq_ignore_ascii_case(s),
    };
    if matches {
        ok(position, s.len(), None)
    } else {
        cx.fail(id, position, ErrorKind::Expectation, None);
        Err(())
    }
}

fn match_literal_char(cx: &mut MatchCx<'_>, id: TokenId, position: usize, rest: &str, c: char) -> Result<ParsedElement, ()> {
    if rest.chars().next() == Some(c) {
        ok(position, c.len_utf8(), None)
    } else {
        cx.fail(id, position, ErrorKind::Expectation, None);
        Err(())
    }
}

fn match_literal_choice(cx: &mut MatchCx<'_>, id: TokenId, position: usize, rest: &str, set: &LiteralSet, compute_value: bool) -> Result<ParsedElement, ()> {
    match set.trie().longest_match(rest) {
        Some(len) => {
            let value = compute_value.then(|| IntermediateValue::str(&rest[..len]));
            ok(position, len, value)
        }
        None => {
            cx.fail(id, position, ErrorKind::Expectation, None);
            Err(())
        }
    }
}

fn follow_is_blocked(rest_after: &str, follow: Option<&Predicate>) -> bool {
    let next = rest_after.chars().next();
    match next {
        None => false,
        Some(c) => match follow {
            Some(pred) => pred.test(c),
            None => predicate::is_identifier_continue(c),
        },
    }
}

fn match_keyword(cx: &mut MatchCx<'_>, id: TokenId, position: usize, rest: &str, s: &str, case: CaseSensitivity, follow: Option<&Predicate>) -> Result<ParsedElement, ()> {
    let matches = match case {
        CaseSensitivity::Sensitive => rest.starts_with(s),
        CaseSensitivity::Insensitive => rest.len() >= s.len() && rest[..s.len()].eq_ignore_ascii_case(s),
    };
    if matches && !follow_is_blocked(&rest[s.len()..], follow) {
        ok(position, s.len(), None)
    } else {
        cx.fail(id, position, ErrorKind::Expectation, None);
        Err(())
    }
}

fn match_keyword_choice(cx: &mut MatchCx<'_>, id: TokenId, position: usize, rest: &str, set: &LiteralSet, follow: Option<&Predicate>) -> Result<ParsedElement, ()> {
    match set.trie().longest_match(rest) {
        Some(len) if !follow_is_blocked(&rest[len..], follow) => ok(position, len, None),
        _ => {
            cx.fail(id, position, ErrorKind::Expectation, None);
            Err(())
        }
    }
}

fn match_number_token(cx: &mut MatchCx<'_>, id: TokenId, position: usize, rest: &str, flags: NumberFlags, target: NumberTarget, compute_value: bool) -> Result<ParsedElement, ()> {
    match number::match_number(rest, flags, target) {
        Some((len, value)) => ok(position, len, compute_value.then_some(value)),
        None => {
            cx.fail(id, position, ErrorKind::Expectation, None);
            Err(())
        }
    }
}

fn match_regex(cx: &mut MatchCx<'_>, id: TokenId, position: usize, pattern: &RegexPattern, limit: usize, compute_value: bool) -> Result<ParsedElement, ()> {
    match pattern.0.find_at(cx.input, position) {
        Some(m) if m.start() == position && m.end() <= limit => {
            let value = compute_value.then(|| IntermediateValue::str(m.as_str()));
            ok(position, m.end() - m.start(), value)
        }
        _ => {
            cx.fail(id, position, ErrorKind::Expectation, None);
            Err(())
        }
    }
}

fn match_identifier(cx: &mut MatchCx<'_>, id: TokenId, position: usize, rest: &str, start: &Predicate, cont: &Predicate, min_len: usize, compute_value: bool) -> Result<ParsedElement, ()> {
    let mut chars = rest.chars();
    let Some(first) = chars.next() else {
        cx.fail(id, position, ErrorKind::Expectation, None);
        return Err(());
    };
    if !start.test(first) {
        cx.fail(id, position, ErrorKind::Expectation, None);
        return Err(());
    }
    let mut len = first.len_utf8();
    let mut count = 1;
    for c in chars {
        if !cont.test(c) {
            break;
        }
        len += c.len_utf8();
        count += 1;
    }
    if count < min_len {
        cx.fail(id, position, ErrorKind::RangeViolation, Some("identifier shorter than the minimum length"));
        return Err(());
    }
    let value = compute_value.then(|| IntermediateValue::str(&rest[..len]));
    ok(position, len, value)
}

fn match_run(cx: &mut MatchCx<'_>, id: TokenId, position: usize, rest: &str, pred: fn(char) -> bool, min: usize, compute_value: bool) -> Result<ParsedElement, ()> {
    let mut len = 0;
    let mut count = 0;
    for c in rest.chars() {
        if !pred(c) {
            break;
        }
        len += c.len_utf8();
        count += 1;
    }
    if count < min {
        cx.fail(id, position, ErrorKind::Expectation, None);
        return Err(());
    }
    let value = compute_value.then(|| IntermediateValue::str(&rest[..len]));
    ok(position, len, value)
}

fn match_newline(cx: &mut MatchCx<'_>, id: TokenId, position: usize, rest: &str) -> Result<ParsedElement, ()> {
    if rest.starts_with("\r\n") {
        ok(position, 2, None)
    } else if rest.starts_with('\n') || rest.starts_with('\r') {
        ok(position, 1, None)
    } else {
        cx.fail(id, position, ErrorKind::Expectation, None);
        Err(())
    }
}

fn match_character(cx: &mut MatchCx<'_>, id: TokenId, position: usize, rest: &str, pred: &Predicate, compute_value: bool) -> Result<ParsedElement, ()> {
    match rest.chars().next() {
        Some(c) if pred.test(c) => {
            let value = compute_value.then(|| IntermediateValue::str(c.to_string()));
            ok(position, c.len_utf8(), value)
        }
        _ => {
            cx.fail(id, position, ErrorKind::Expectation, None);
            Err(())
        }
    }
}

fn match_repeat_characters(cx: &mut MatchCx<'_>, id: TokenId, position: usize, rest: &str, pred: &Predicate, min: usize, max: Option<usize>, compute_value: bool) -> Result<ParsedElement, ()> {
    let mut len = 0;
    let mut count = 0;
    for c in rest.chars() {
        if max.is_some_and(|max| count >= max) || !pred.test(c) {
            break;
        }
        len += c.len_utf8();
        count += 1;
    }
    if count < min {
        cx.fail(id, position, ErrorKind::RangeViolation, Some("fewer characters than the minimum"));
        return Err(());
    }
    let value = compute_value.then(|| IntermediateValue::str(&rest[..len]));
    ok(position, len, value)
}

fn match_text_until(cx: &mut MatchCx<'_>, id: TokenId, position: usize, rest: &str, terminators: &LiteralSet, compute_value: bool) -> Result<ParsedElement, ()> {
    let len = match terminators.trie().find_first(rest) {
        Some((offset, _)) => offset,
        None => rest.len(),
    };
    let value = compute_value.then(|| IntermediateValue::str(&rest[..len]));
    let _ = id;
    let _ = cx;
    ok(position, len, value)
}

fn match_escaped_text(cx: &mut MatchCx<'_>, id: TokenId, position: usize, rest: &str, escapes: &EscapeMap, terminators: &LiteralSet, compute_value: bool) -> Result<ParsedElement, ()> {
    let mut consumed = 0usize;
    let mut text = compute_value.then(String::new);
    loop {
        let tail = &rest[consumed..];
        if tail.is_empty() {
            break;
        }
        if let Some((from, to)) = escapes.longest_match(tail) {
            consumed += from.len();
            if let Some(text) = &mut text {
                text.push_str(to);
            }
            continue;
        }
        if terminators.trie().longest_match(tail).is_some() {
            break;
        }
        let c = tail.chars().next().unwrap();
        if let Some(text) = &mut text {
            text.push(c);
        }
        consumed += c.len_utf8();
    }
    let _ = id;
    let _ = cx;
    ok(position, consumed, text.map(|s| IntermediateValue::Str(Arc::from(s))))
}

fn match_eof(cx: &mut MatchCx<'_>, id: TokenId, position: usize) -> Result<ParsedElement, ()> {
    if position == cx.input.len() {
        ok(position, 0, None)
    } else {
        cx.fail(id, position, ErrorKind::Expectation, None);
        Err(())
    }
}

fn match_empty(cx: &mut MatchCx<'_>, id: TokenId, position: usize, barrier_position: usize) -> Result<ParsedElement, ()> {
    if position <= barrier_position && position <= cx.input.len() {
        ok(position, 0, None)
    } else {
        cx.fail(id, position, ErrorKind::InvariantViolation, Some("position past the active barrier"));
        Err(())
    }
}

fn match_sequence(table: &TokenTable, children: &[TokenId], position: usize, barrier_position: usize, cx: &mut MatchCx<'_>, compute_value: bool) -> Result<ParsedElement, ()> {
    let mut pos = position;
    for &child in children {
        let r = match_token(table, child, pos, barrier_position, cx, compute_value)?;
        pos = r.end();
    }
    ok(position, pos - position, None)
}

fn match_choice(table: &TokenTable, mode: ChoiceMode, children: &[TokenId], position: usize, barrier_position: usize, cx: &mut MatchCx<'_>, compute_value: bool) -> Result<ParsedElement, ()> {
    match mode {
        ChoiceMode::First => {
            for &child in children {
                if let Ok(r) = match_token(table, child, position, barrier_position, cx, compute_value) {
                    return Ok(r);
                }
            }
            Err(())
        }
        ChoiceMode::Longest | ChoiceMode::Shortest => {
            let mut best: Option<ParsedElement> = None;
            for &child in children {
                if let Ok(r) = match_token(table, child, position, barrier_position, cx, compute_value) {
                    let better = match &best {
                        None => true,
                        Some(current) => match mode {
                            ChoiceMode::Longest => r.length > current.length,
                            ChoiceMode::Shortest => r.length < current.length,
                            ChoiceMode::First => unreachable!(),
                        },
                    };
                    if better {
                        best = Some(r);
                    }
                }
            }
            best.ok_or(())
        }
    }
}

fn match_optional(table: &TokenTable, child: TokenId, position: usize, barrier_position: usize, cx: &mut MatchCx<'_>, compute_value: bool) -> Result<ParsedElement, ()> {
    match match_token(table, child, position, barrier_position, cx, compute_value) {
        Ok(r) => Ok(r),
        Err(()) => ok(position, 0, None),
    }
}

fn match_repeat(table: &TokenTable, child: TokenId, min: usize, max: Option<usize>, position: usize, barrier_position: usize, cx: &mut MatchCx<'_>) -> Result<ParsedElement, ()> {
    let mut pos = position;
    let mut count = 0;
    loop {
        if max.is_some_and(|max| count >= max) {
            break;
        }
        match match_token(table, child, pos, barrier_position, cx, false) {
            Ok(r) if r.length == 0 => break, // spec §4.2: zero-length match terminates repetition
            Ok(r) => {
                pos = r.end();
                count += 1;
            }
            Err(()) => break,
        }
    }
    if count < min {
        cx.fail(child, pos, ErrorKind::RangeViolation, Some("fewer repetitions than the minimum"));
        return Err(());
    }
    ok(position, pos - position, None)
}

fn match_separated_repeat(
    table: &TokenTable,
    element: TokenId,
    separator: TokenId,
    min: usize,
    max: Option<usize>,
    allow_trailing: bool,
    include_sep: bool,
    position: usize,
    barrier_position: usize,
    cx: &mut MatchCx<'_>,
) -> Result<ParsedElement, ()> {
    let _ = include_sep; // the token-level result carries no child list to include separators into; meaningful at the rule level.
    let mut pos = position;
    let mut count = 0;

    match match_token(table, element, pos, barrier_position, cx, false) {
        Ok(r) => {
            pos = r.end();
            count += 1;
        }
        Err(()) => {
            if min == 0 {
                return ok(position, 0, None);
            }
            cx.fail(element, pos, ErrorKind::RangeViolation, Some("empty separated-repeat below minimum"));
            return Err(());
        }
    }

    loop {
        if max.is_some_and(|max| count >= max) {
            break;
        }
        let sep_start = pos;
        let Ok(sep) = match_token(table, separator, pos, barrier_position, cx, false) else {
            break;
        };
        if sep.length == 0 {
            cx.fail(separator, pos, ErrorKind::InvariantViolation, Some("zero-length separator"));
            return Err(());
        }
        match match_token(table, element, sep.end(), barrier_position, cx, false) {
            Ok(elem) if elem.length == 0 => {
                cx.fail(element, sep.end(), ErrorKind::InvariantViolation, Some("zero-length element after separator"));
                return Err(());
            }
            Ok(elem) => {
                pos = elem.end();
                count += 1;
            }
            Err(()) => {
                if allow_trailing {
                    pos = sep.end();
                } else {
                    pos = sep_start;
                }
                break;
            }
        }
    }

    if count < min {
        cx.fail(element, pos, ErrorKind::RangeViolation, Some("fewer elements than the minimum"));
        return Err(());
    }
    ok(position, pos - position, None)
}

fn match_between(table: &TokenTable, a: TokenId, b: TokenId, c: TokenId, position: usize, barrier_position: usize, cx: &mut MatchCx<'_>, compute_value: bool) -> Result<ParsedElement, ()> {
    let ra = match_token(table, a, position, barrier_position, cx, false)?;
    let rb = match_token(table, b, ra.end(), barrier_position, cx, compute_value)?;
    let rc = match_token(table, c, rb.end(), barrier_position, cx, false)?;
    ok(position, rc.end() - position, rb.value)
}

fn match_first(table: &TokenTable, a: TokenId, b: TokenId, position: usize, barrier_position: usize, cx: &mut MatchCx<'_>, compute_value: bool) -> Result<ParsedElement, ()> {
    let ra = match_token(table, a, position, barrier_position, cx, compute_value)?;
    let rb = match_token(table, b, ra.end(), barrier_position, cx, false)?;
    ok(position, rb.end() - position, ra.value)
}

fn match_second(table: &TokenTable, a: TokenId, b: TokenId, position: usize, barrier_position: usize, cx: &mut MatchCx<'_>, compute_value: bool) -> Result<ParsedElement, ()> {
    let ra = match_token(table, a, position, barrier_position, cx, false)?;
    let rb = match_token(table, b, ra.end(), barrier_position, cx, compute_value)?;
    ok(position, rb.end() - position, rb.value)
}

fn match_map(table: &TokenTable, child: TokenId, f: &ValueFn, position: usize, barrier_position: usize, cx: &mut MatchCx<'_>, compute_value: bool) -> Result<ParsedElement, ()> {
    let r = match_token(table, child, position, barrier_position, cx, compute_value)?;
    let value = compute_value.then(|| f.call(r.value.unwrap_or(IntermediateValue::Unit)));
    ok(position, r.length, value)
}

fn match_return(table: &TokenTable, child: TokenId, constant: &IntermediateValue, position: usize, barrier_position: usize, cx: &mut MatchCx<'_>, compute_value: bool) -> Result<ParsedElement, ()> {
    let r = match_token(table, child, position, barrier_position, cx, false)?;
    let value = compute_value.then(|| constant.clone());
    ok(position, r.length, value)
}

fn match_capture_text(table: &TokenTable, child: TokenId, trim_start: bool, trim_end: bool, position: usize, barrier_position: usize, cx: &mut MatchCx<'_>, compute_value: bool) -> Result<ParsedElement, ()> {
    let r = match_token(table, child, position, barrier_position, cx, false)?;
    let mut text = &cx.input[r.start..r.end()];
    if trim_start {
        text = text.trim_start();
    }
    if trim_end {
        text = text.trim_end();
    }
    let value = compute_value.then(|| IntermediateValue::str(text));
    ok(position, r.length, value)
}

fn match_skip_whitespaces(table: &TokenTable, child: TokenId, position: usize, barrier_position: usize, cx: &mut MatchCx<'_>, compute_value: bool) -> Result<ParsedElement, ()> {
    let limit = barrier_position.min(cx.input.len());
    let mut pos = position;
    for c in cx.input[position..limit].chars() {
        if !predicate::is_whitespace(c) && c != '\n' && c != '\r' {
            break;
        }
        pos += c.len_utf8();
    }
    let r = match_token(table, child, pos, barrier_position, cx, compute_value)?;
    ok(position, r.end() - position, r.value)
}

fn match_lookahead(table: &TokenTable, child: TokenId, positive: bool, position: usize, barrier_position: usize, cx: &mut MatchCx<'_>) -> Result<ParsedElement, ()> {
    let snapshot = cx.furthest.clone();
    let result = match_token(table, child, position, barrier_position, cx, false);
    *cx.furthest = snapshot;
    match (positive, result) {
        (true, Ok(_)) => ok(position, 0, None),
        (false, Err(())) => ok(position, 0, None),
        _ => Err(()),
    }
}

fn match_switch(
    table: &TokenTable,
    selector: &ParamFn<i64>,
    branches: &[TokenId],
    default: Option<&TokenId>,
    position: usize,
    barrier_position: usize,
    cx: &mut MatchCx<'_>,
    compute_value: bool,
) -> Result<ParsedElement, ()> {
    let index = selector.call(cx.parameter);
    let branch = usize::try_from(index).ok().filter(|&i| i < branches.len()).map(|i| branches[i]).or_else(|| default.copied());
    match branch {
        Some(child) => match_token(table, child, position, barrier_position, cx, compute_value),
        None => {
            cx.furthest.note(RecordedError {
                kind: ErrorKind::SelectorOutOfRange,
                position,
                recursion_depth: 0,
                message: Some(format!("selector index {index} out of range and no default")),
                element: ElementId::Token(branches.first().copied().unwrap_or(TokenId::new(0))),
                stack_trace: Vec::new(),
            });
            Err(())
        }
    }
}

fn match_if(
    table: &TokenTable,
    predicate: &ParamFn<bool>,
    then_branch: TokenId,
    else_branch: Option<&TokenId>,
    position: usize,
    barrier_position: usize,
    cx: &mut MatchCx<'_>,
    compute_value: bool,
) -> Result<ParsedElement, ()> {
    if predicate.call(cx.parameter) {
        match_token(table, then_branch, position, barrier_position, cx, compute_value)
    } else if let Some(else_branch) = else_branch {
        match_token(table, *else_branch, position, barrier_position, cx, compute_value)
    } else {
        cx.fail(then_branch, position, ErrorKind::Expectation, Some("If predicate false and no else branch"));
        Err(())
    }
}
