//! First-character-set / nullability analysis (spec §4.1, §4.6 step 6
//! "Specialize"). Computed once at build time so [`super::driver`]'s
//! `Choice` dispatch can skip branches that provably can't match the next
//! input character, without changing which branch wins.
//!
//! Every estimate here is a safe over-approximation: `first_chars: None`
//! means "unknown, don't filter" and `nullable: true` also disables
//! filtering for that element. Getting a set too large only costs a missed
//! optimization; getting it too small would reject a branch that could have
//! matched, so leaf patterns whose exact character set isn't cheap to
//! enumerate (regexes, predicates, numbers) are simply treated as unbounded.

use std::collections::HashSet;

use crate::ids::RuleId;
use crate::ids::TokenId;
use crate::rule::ParserRule;
use crate::rule::RuleElement;
use crate::rule::RuleTable;
use crate::token::TokenPattern;
use crate::token::TokenTable;

#[derive(Debug, Clone, Default)]
pub struct ElementInfo {
    pub first_chars: Option<HashSet<char>>,
    pub nullable: bool,
}

impl ElementInfo {
    fn unbounded(nullable: bool) -> Self {
        Self { first_chars: None, nullable }
    }

    fn single(c: char) -> Self {
        Self { first_chars: Some(HashSet::from([c])), nullable: false }
    }

    fn never() -> Self {
        Self { first_chars: Some(HashSet::new()), nullable: false }
    }

    fn union(items: impl IntoIterator<Item = ElementInfo>) -> Self {
        let mut acc = ElementInfo::never();
        for item in items {
            acc = acc.merge(&item);
        }
        acc
    }

    fn merge(&self, other: &ElementInfo) -> ElementInfo {
        let first_chars = match (&self.first_chars, &other.first_chars) {
            (Some(a), Some(b)) => Some(a.union(b).copied().collect()),
            _ => None,
        };
        ElementInfo { first_chars, nullable: self.nullable || other.nullable }
    }

    /// Folds a sequence of children left to right: a non-nullable child
    /// stops FIRST-set propagation past it (spec §4.2 Sequence semantics —
    /// everything after the first consuming child is irrelevant to what
    /// character the sequence can *start* with).
    fn sequence(children: impl IntoIterator<Item = ElementInfo>) -> ElementInfo {
        let mut acc = ElementInfo { first_chars: Some(HashSet::new()), nullable: true };
        for child in children {
            if !acc.nullable {
                break;
            }
            acc = ElementInfo { first_chars: merge_opt(&acc.first_chars, &child.first_chars), nullable: child.nullable };
        }
        acc
    }

    fn eq_fixed_point(&self, other: &ElementInfo) -> bool {
        self.nullable == other.nullable && self.first_chars == other.first_chars
    }
}

fn merge_opt(a: &Option<HashSet<char>>, b: &Option<HashSet<char>>) -> Option<HashSet<char>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.union(b).copied().collect()),
        _ => None,
    }
}

/// Build-time table of [`ElementInfo`] for every token and rule, keyed the
/// same way [`TokenTable`]/[`RuleTable`] are (spec §3 invariant 1).
#[derive(Debug, Default)]
pub struct FirstSets {
    tokens: Vec<ElementInfo>,
    rules: Vec<ElementInfo>,
}

impl FirstSets {
    pub fn rule(&self, id: RuleId) -> &ElementInfo {
        &self.rules[id.index()]
    }

    pub fn token(&self, id: TokenId) -> &ElementInfo {
        &self.tokens[id.index()]
    }

    pub fn element(&self, element: RuleElement) -> &ElementInfo {
        match element {
            RuleElement::Rule(id) => self.rule(id),
            RuleElement::Token(id) => self.token(id),
        }
    }
}

/// Computes [`FirstSets`] for a fully indexed grammar by iterating the
/// recurrence to a fixed point (bounded by `len + 2` passes — the lattice is
/// finite-height: `nullable` only flips false→true once, and `first_chars`
/// only grows or collapses to `None`, both monotonic).
pub fn compute(tokens: &TokenTable, rules: &RuleTable) -> FirstSets {
    let mut token_info = vec![ElementInfo::never(); tokens.len()];
    for _ in 0..tokens.len() + 2 {
        let mut changed = false;
        for (id, pattern) in tokens.iter() {
            let next = analyze_token(pattern, &token_info);
            if !next.eq_fixed_point(&token_info[id.index()]) {
                token_info[id.index()] = next;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let mut rule_info = vec![ElementInfo::never(); rules.len()];
    for _ in 0..rules.len() + 2 {
        let mut changed = false;
        for index in 0..rules.len() {
            let id = RuleId::new(index as u32);
            let next = analyze_rule(rules.body(id), &rule_info, &token_info);
            if !next.eq_fixed_point(&rule_info[index]) {
                rule_info[index] = next;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    FirstSets { tokens: token_info, rules: rule_info }
}

fn literal_info(s: &str) -> ElementInfo {
    match s.chars().next() {
        Some(c) => ElementInfo::single(c),
        None => ElementInfo::unbounded(true),
    }
}

fn analyze_token(pattern: &TokenPattern, info: &[ElementInfo]) -> ElementInfo {
    let at = |id: TokenId| info[id.index()].clone();
    match pattern {
        TokenPattern::Literal(s, _) => literal_info(s),
        TokenPattern::LiteralChar(c) => ElementInfo::single(*c),
        TokenPattern::LiteralChoice(set) => ElementInfo { first_chars: Some(set.first_chars()), nullable: false },
        TokenPattern::Keyword(s, ..) => literal_info(s),
        TokenPattern::KeywordChoice(set, _) => ElementInfo { first_chars: Some(set.first_chars()), nullable: false },
        TokenPattern::Number(..) => ElementInfo::unbounded(false),
        TokenPattern::Regex(_) => ElementInfo::unbounded(false),
        TokenPattern::Identifier { .. } => ElementInfo::unbounded(false),
        TokenPattern::Whitespaces | TokenPattern::Spaces => ElementInfo::unbounded(false),
        TokenPattern::Newline => ElementInfo { first_chars: Some(HashSet::from(['\n', '\r'])), nullable: false },
        TokenPattern::Character(_) => ElementInfo::unbounded(false),
        TokenPattern::RepeatCharacters { min, .. } => ElementInfo::unbounded(*min == 0),
        TokenPattern::TextUntil(_) => ElementInfo::unbounded(true),
        TokenPattern::EscapedText { .. } => ElementInfo::unbounded(true),
        TokenPattern::Eof => ElementInfo::unbounded(true),
        TokenPattern::Empty => ElementInfo::unbounded(true),
        TokenPattern::Fail => ElementInfo::never(),

        TokenPattern::Sequence(children) => ElementInfo::sequence(children.iter().map(|&c| at(c))),
        TokenPattern::Choice(_, children) => ElementInfo::union(children.iter().map(|&c| at(c))),
        TokenPattern::Optional(child) => ElementInfo { first_chars: at(*child).first_chars, nullable: true },
        TokenPattern::Repeat { child, min, .. } => ElementInfo { first_chars: at(*child).first_chars, nullable: *min == 0 || at(*child).nullable },
        TokenPattern::SeparatedRepeat { element, min, .. } => ElementInfo { first_chars: at(*element).first_chars, nullable: *min == 0 },
        TokenPattern::Between(a, b, c) => ElementInfo::sequence([at(*a), at(*b), at(*c)]),
        TokenPattern::First(a, b) => ElementInfo::sequence([at(*a), at(*b)]),
        TokenPattern::Second(a, b) => ElementInfo::sequence([at(*a), at(*b)]),
        TokenPattern::Map(child, _) => at(*child),
        TokenPattern::Return(child, _) => at(*child),
        TokenPattern::CaptureText { child, .. } => at(*child),
        TokenPattern::SkipWhitespaces(_) => ElementInfo::unbounded(false),
        TokenPattern::Lookahead { .. } => ElementInfo::unbounded(true),
        TokenPattern::Switch { branches, default, .. } => ElementInfo::union(branches.iter().chain(default.iter()).map(|&c| at(c))),
        TokenPattern::If { then_branch, else_branch, .. } => ElementInfo::union(std::iter::once(*then_branch).chain(*else_branch).map(at)),
    }
}

fn analyze_rule(rule: &ParserRule, rule_info: &[ElementInfo], token_info: &[ElementInfo]) -> ElementInfo {
    let at = |element: RuleElement| -> ElementInfo {
        match element {
            RuleElement::Rule(id) => rule_info[id.index()].clone(),
            RuleElement::Token(id) => token_info[id.index()].clone(),
        }
    };
    match rule {
        ParserRule::Sequence(children) => ElementInfo::sequence(children.iter().map(|&c| at(c))),
        ParserRule::Choice(_, children) => ElementInfo::union(children.iter().map(|&c| at(c))),
        ParserRule::Optional(child) => ElementInfo { first_chars: at(*child).first_chars, nullable: true },
        ParserRule::Repeat { child, min, .. } => {
            let info = at(*child);
            ElementInfo { first_chars: info.first_chars.clone(), nullable: *min == 0 || info.nullable }
        }
        ParserRule::SeparatedRepeat { element, min, .. } => ElementInfo { first_chars: at(*element).first_chars, nullable: *min == 0 },
        ParserRule::Lookahead { .. } => ElementInfo::unbounded(true),
        ParserRule::Token(id) => token_info[id.index()].clone(),
        ParserRule::Custom(_) => ElementInfo::unbounded(false),
        ParserRule::Switch { branches, default, .. } => ElementInfo::union(branches.iter().chain(default.iter()).map(|&c| at(c))),
        ParserRule::If { then_branch, else_branch, .. } => ElementInfo::union(std::iter::once(*then_branch).chain(*else_branch).map(at)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::CaseSensitivity;

    #[test]
    fn sequence_stops_at_first_non_nullable_child() {
        let tokens = TokenTable::new(vec![
            TokenPattern::Optional(TokenId::new(1)),
            TokenPattern::LiteralChar('a'),
            TokenPattern::LiteralChar('b'),
            TokenPattern::Sequence(vec![TokenId::new(0), TokenId::new(2)]),
        ]);
        let rules = RuleTable::new(Vec::new());
        let sets = compute(&tokens, &rules);
        let info = sets.token(TokenId::new(3));
        assert!(info.first_chars.as_ref().unwrap().contains(&'a'));
        assert!(info.first_chars.as_ref().unwrap().contains(&'b'));
        assert!(!info.nullable);
    }

    #[test]
    fn literal_choice_first_chars_come_from_the_trie() {
        let tokens = TokenTable::new(vec![TokenPattern::Literal(std::sync::Arc::from("true"), CaseSensitivity::Sensitive)]);
        let rules = RuleTable::new(Vec::new());
        let sets = compute(&tokens, &rules);
        let info = sets.token(TokenId::new(0));
        assert_eq!(info.first_chars.as_ref().unwrap(), &HashSet::from(['t']));
        assert!(!info.nullable);
    }
}
