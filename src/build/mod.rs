//! The build pipeline (spec §4.6): turns author-facing
//! [`crate::rule::build::BuildableRule`] / [`crate::token::build::BuildableToken`]
//! trees into the indexed, immutable [`Parser`] the driver executes against.
//! Grounded on the teacher's codegen step (`apollo-parser`'s generated
//! `SyntaxKind` table is fixed before any file is parsed) — generalized here
//! from compile-time codegen over a fixed GraphQL grammar to a runtime build
//! pass over an author-supplied [`Grammar`].
//!
//! Named rules are never structurally deduped against each other: each
//! carries its own [`RuleMeta`] (value factory, settings override, recovery,
//! memoize flag), and merging two differently-named rules onto one id would
//! silently drop one side's metadata. Only the token layer runs the
//! structural-hash dedup from spec §4.6 step 2 (via [`Interner`]), since
//! tokens are leaves with no such per-occurrence metadata and are, in
//! practice, where duplication (shared punctuation, whitespace, keywords)
//! actually accumulates.

pub mod firstset;

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::BuildError;
use crate::ids::RuleId;
use crate::ids::TokenId;
use crate::interner::Interner;
use crate::parser::driver::Parser;
use crate::rule::build::BuildableRule;
use crate::rule::build::BuildableRuleBody;
use crate::rule::build::RuleRef;
use crate::rule::ParserRule;
use crate::rule::RuleElement;
use crate::rule::RuleMeta;
use crate::rule::RuleTable;
use crate::token::build::BuildableToken;
use crate::token::build::TokenRef;
use crate::token::TokenPattern;
use crate::token::TokenTable;

/// Build-time switches that change the *compiled shape* of a [`Parser`]
/// (spec §A.3); per-call behavior (error handling, AST weight, tracing) is
/// [`crate::parser::settings::ParserSettings`] instead, since that can
/// legitimately vary from parse to parse against the same compiled grammar.
#[derive(Debug, Clone, Copy)]
pub struct BuildFlags {
    /// Reserved for a future rule-inlining pass. Currently every rule keeps
    /// its own id and node regardless of this flag's value.
    pub inline_rules: bool,
    /// Computes [`firstset::FirstSets`] and attaches it to the compiled
    /// [`Parser`] so `Choice` dispatch can skip branches the next input
    /// character provably excludes (spec §4.6 step 6 "Specialize").
    pub first_character_match: bool,
    /// Reserved: memoization is currently decided per rule via
    /// `RuleMeta::memoize` / `ParserSettings::memoize` regardless of this
    /// flag's value.
    pub enable_memoization: bool,
    /// Reserved for a future optimized whitespace-skip fast path;
    /// `SkippingStrategy` currently always runs through the general driver
    /// loop regardless of this flag's value.
    pub skip_whitespaces_optimized: bool,
}

impl Default for BuildFlags {
    fn default() -> Self {
        Self {
            inline_rules: false,
            first_character_match: true,
            enable_memoization: true,
            skip_whitespaces_optimized: false,
        }
    }
}

/// An author-facing grammar awaiting canonicalization (spec §4.6 step 1):
/// named tokens and rules referencing each other by alias, plus the name of
/// the rule a parse enters first.
#[derive(Default)]
pub struct Grammar {
    pub tokens: Vec<(String, BuildableToken)>,
    pub rules: Vec<BuildableRule>,
    pub root: String,
}

impl Grammar {
    pub fn new(root: impl Into<String>) -> Self {
        Self { tokens: Vec::new(), rules: Vec::new(), root: root.into() }
    }

    pub fn token(mut self, name: impl Into<String>, token: BuildableToken) -> Self {
        self.tokens.push((name.into(), token));
        self
    }

    pub fn rule(mut self, rule: BuildableRule) -> Self {
        self.rules.push(rule);
        self
    }
}

/// Canonicalizes and indexes `grammar`, returning a [`Parser`] ready to
/// parse, or a [`BuildError`] if an alias doesn't resolve or the grammar
/// contains an unbreakable same-position cycle (spec §3 invariant 3).
pub fn build(grammar: Grammar, flags: BuildFlags) -> Result<Parser, BuildError> {
    let named_tokens: HashMap<String, BuildableToken> = grammar.tokens.into_iter().collect();
    let mut token_builder = TokenBuilder {
        named: &named_tokens,
        resolved: HashMap::new(),
        in_progress: HashSet::new(),
        patterns: Vec::new(),
        interner: Interner::new(),
    };

    // Reserve a stable id for every named rule up front so mutually- and
    // self-recursive `RuleRef::Alias`es resolve regardless of declaration
    // order (spec §4.6 step 1).
    let mut rule_aliases: HashMap<String, RuleId> = HashMap::new();
    let mut bodies: Vec<ParserRule> = Vec::with_capacity(grammar.rules.len());
    let mut metas: Vec<RuleMeta> = Vec::with_capacity(grammar.rules.len());
    for rule in &grammar.rules {
        let name = rule.name.clone().ok_or_else(|| BuildError::MalformedParameters {
            what: "grammar rule".to_string(),
            reason: "top-level grammar rules must be named".to_string(),
        })?;
        let id = RuleId::new(bodies.len() as u32);
        bodies.push(ParserRule::Sequence(Vec::new()));
        metas.push(RuleMeta::default());
        if rule_aliases.insert(name.clone(), id).is_some() {
            return Err(BuildError::MalformedParameters { what: name, reason: "duplicate rule name".to_string() });
        }
        for alias in &rule.aliases {
            rule_aliases.insert(alias.clone(), id);
        }
    }

    // Now that every alias is resolvable, canonicalize each named rule's
    // body in place, inlining anonymous children as we go.
    for rule in &grammar.rules {
        let id = rule_aliases[rule.name.as_deref().unwrap()];
        let mut ctx = RuleBuildCtx { rule_aliases: &rule_aliases, bodies: &mut bodies, metas: &mut metas, tokens: &mut token_builder };
        let body = canonicalize_rule_body(&rule.body, &mut ctx)?;
        bodies[id.index()] = body;
        metas[id.index()] = RuleMeta {
            aliases: rule.aliases.clone(),
            value_factory: rule.value_factory.clone(),
            settings_override: rule.settings_override.clone(),
            recovery: rule.recovery.clone(),
            memoize: rule.memoize,
        };
    }

    let root_rule = *rule_aliases.get(&grammar.root).ok_or_else(|| BuildError::UnresolvedAlias { alias: grammar.root.clone() })?;

    let token_table = TokenTable::new(token_builder.patterns);
    tracing::debug!(tokens = token_table.len(), "dedup pass done");
    let rule_table = RuleTable::new(bodies.into_iter().zip(metas).collect());
    tracing::debug!(rules = rule_table.len(), "rule table assembled");

    // Cycle detection needs nullability, which needs the firstset fixed
    // point (spec §4.1) — compute it unconditionally and publish it on the
    // compiled `Parser` only when the caller asked for the fast path.
    let firstsets = firstset::compute(&token_table, &rule_table);
    tracing::debug!("firstset fixed point computed");
    check_cycles(&rule_table, &firstsets)?;
    tracing::debug!("cycle check done");
    if flags.first_character_match {
        tracing::debug!("specialize: firstsets attached to compiled parser");
    }

    Ok(Parser {
        tokens: token_table,
        rules: rule_table,
        root_rule,
        rule_aliases,
        token_aliases: token_builder.resolved,
        firstsets: flags.first_character_match.then(|| Arc::new(firstsets)),
    })
}

struct RuleBuildCtx<'a, 'g> {
    rule_aliases: &'a HashMap<String, RuleId>,
    bodies: &'a mut Vec<ParserRule>,
    metas: &'a mut Vec<RuleMeta>,
    tokens: &'a mut TokenBuilder<'g>,
}

fn canonicalize_rule_ref(r: &RuleRef, ctx: &mut RuleBuildCtx<'_, '_>) -> Result<RuleElement, BuildError> {
    match r {
        RuleRef::Alias(name) => {
            let id = *ctx.rule_aliases.get(name).ok_or_else(|| BuildError::UnresolvedAlias { alias: name.clone() })?;
            Ok(RuleElement::Rule(id))
        }
        RuleRef::InlineToken(token) => Ok(RuleElement::Token(ctx.tokens.resolve_token(token)?)),
        RuleRef::InlineRule(inner) => {
            let id = RuleId::new(ctx.bodies.len() as u32);
            ctx.bodies.push(ParserRule::Sequence(Vec::new()));
            ctx.metas.push(RuleMeta::default());
            let body = canonicalize_rule_body(&inner.body, ctx)?;
            ctx.bodies[id.index()] = body;
            ctx.metas[id.index()] = RuleMeta {
                aliases: inner.aliases.clone(),
                value_factory: inner.value_factory.clone(),
                settings_override: inner.settings_override.clone(),
                recovery: inner.recovery.clone(),
                memoize: inner.memoize,
            };
            Ok(RuleElement::Rule(id))
        }
    }
}

fn canonicalize_rule_body(body: &BuildableRuleBody, ctx: &mut RuleBuildCtx<'_, '_>) -> Result<ParserRule, BuildError> {
    Ok(match body {
        BuildableRuleBody::Sequence(children) => {
            let children = children.iter().map(|c| canonicalize_rule_ref(c, ctx)).collect::<Result<_, _>>()?;
            ParserRule::Sequence(children)
        }
        BuildableRuleBody::Choice(mode, children) => {
            let children = children.iter().map(|c| canonicalize_rule_ref(c, ctx)).collect::<Result<_, _>>()?;
            ParserRule::Choice(*mode, children)
        }
        BuildableRuleBody::Optional(child) => ParserRule::Optional(canonicalize_rule_ref(child, ctx)?),
        BuildableRuleBody::Repeat { child, min, max } => ParserRule::Repeat { child: canonicalize_rule_ref(child, ctx)?, min: *min, max: *max },
        BuildableRuleBody::SeparatedRepeat { element, separator, min, max, allow_trailing, include_sep } => {
            let element = canonicalize_rule_ref(element, ctx)?;
            let separator = canonicalize_rule_ref(separator, ctx)?;
            ParserRule::SeparatedRepeat { element, separator, min: *min, max: *max, allow_trailing: *allow_trailing, include_sep: *include_sep }
        }
        BuildableRuleBody::Lookahead { child, positive } => ParserRule::Lookahead { child: canonicalize_rule_ref(child, ctx)?, positive: *positive },
        BuildableRuleBody::Token(token) => ParserRule::Token(ctx.tokens.resolve_token(token)?),
        BuildableRuleBody::Custom(f) => ParserRule::Custom(f.clone()),
        BuildableRuleBody::Switch { selector, branches, default } => {
            let branches = branches.iter().map(|c| canonicalize_rule_ref(c, ctx)).collect::<Result<_, _>>()?;
            let default = default.as_ref().map(|d| canonicalize_rule_ref(d, ctx)).transpose()?;
            ParserRule::Switch { selector: selector.clone(), branches, default }
        }
        BuildableRuleBody::If { predicate, then_branch, else_branch } => {
            let then_branch = canonicalize_rule_ref(then_branch, ctx)?;
            let else_branch = else_branch.as_ref().map(|e| canonicalize_rule_ref(e, ctx)).transpose()?;
            ParserRule::If { predicate: predicate.clone(), then_branch, else_branch }
        }
    })
}

/// Resolves [`TokenRef`]/[`BuildableToken`] trees to [`TokenId`]s, deduping
/// structurally-identical canonicalized patterns via [`Interner`] (spec
/// §4.6 step 2) and detecting unresolvable or cyclic named-token aliases.
struct TokenBuilder<'g> {
    named: &'g HashMap<String, BuildableToken>,
    resolved: HashMap<String, TokenId>,
    in_progress: HashSet<String>,
    patterns: Vec<TokenPattern>,
    interner: Interner<TokenPattern, TokenId>,
}

impl<'g> TokenBuilder<'g> {
    fn push(&mut self, pattern: TokenPattern) -> TokenId {
        let next = self.patterns.len();
        let (id, fresh) = self.interner.intern(pattern.clone(), |_| TokenId::new(next as u32));
        if fresh {
            self.patterns.push(pattern);
        }
        id
    }

    fn resolve_ref(&mut self, r: &TokenRef) -> Result<TokenId, BuildError> {
        match r {
            TokenRef::Alias(name) => self.resolve_alias(name),
            TokenRef::Inline(token) => self.resolve_token(token),
        }
    }

    fn resolve_alias(&mut self, name: &str) -> Result<TokenId, BuildError> {
        if let Some(&id) = self.resolved.get(name) {
            return Ok(id);
        }
        if self.in_progress.contains(name) {
            return Err(BuildError::UnbreakableCycle { members: Vec::new() });
        }
        let body = self.named.get(name).ok_or_else(|| BuildError::UnresolvedAlias { alias: name.to_string() })?.clone();
        self.in_progress.insert(name.to_string());
        let id = self.resolve_token(&body)?;
        self.in_progress.remove(name);
        self.resolved.insert(name.to_string(), id);
        Ok(id)
    }

    fn resolve_token(&mut self, token: &BuildableToken) -> Result<TokenId, BuildError> {
        let pattern = match token {
            BuildableToken::Literal(s, case) => TokenPattern::Literal(s.clone(), *case),
            BuildableToken::LiteralChar(c) => TokenPattern::LiteralChar(*c),
            BuildableToken::LiteralChoice(set) => TokenPattern::LiteralChoice(set.clone()),
            BuildableToken::Keyword(s, case, follow) => TokenPattern::Keyword(s.clone(), *case, follow.clone()),
            BuildableToken::KeywordChoice(set, follow) => TokenPattern::KeywordChoice(set.clone(), follow.clone()),
            BuildableToken::Number(flags, target) => TokenPattern::Number(*flags, *target),
            BuildableToken::Regex(pattern) => TokenPattern::Regex(pattern.clone()),
            BuildableToken::Identifier { start, cont, min_len } => TokenPattern::Identifier { start: start.clone(), cont: cont.clone(), min_len: *min_len },
            BuildableToken::Whitespaces => TokenPattern::Whitespaces,
            BuildableToken::Spaces => TokenPattern::Spaces,
            BuildableToken::Newline => TokenPattern::Newline,
            BuildableToken::Character(pred) => TokenPattern::Character(pred.clone()),
            BuildableToken::RepeatCharacters { predicate, min, max } => {
                TokenPattern::RepeatCharacters { predicate: predicate.clone(), min: *min, max: *max }
            }
            BuildableToken::TextUntil(set) => TokenPattern::TextUntil(set.clone()),
            BuildableToken::EscapedText { escapes, terminators } => {
                TokenPattern::EscapedText { escapes: escapes.clone(), terminators: terminators.clone() }
            }
            BuildableToken::Eof => TokenPattern::Eof,
            BuildableToken::Empty => TokenPattern::Empty,
            BuildableToken::Fail => TokenPattern::Fail,

            BuildableToken::Sequence(children) => TokenPattern::Sequence(children.iter().map(|c| self.resolve_ref(c)).collect::<Result<_, _>>()?),
            BuildableToken::Choice(mode, children) => TokenPattern::Choice(*mode, children.iter().map(|c| self.resolve_ref(c)).collect::<Result<_, _>>()?),
            BuildableToken::Optional(child) => TokenPattern::Optional(self.resolve_ref(child)?),
            BuildableToken::Repeat { child, min, max } => TokenPattern::Repeat { child: self.resolve_ref(child)?, min: *min, max: *max },
            BuildableToken::SeparatedRepeat { element, separator, min, max, allow_trailing, include_sep } => {
                let element = self.resolve_ref(element)?;
                let separator = self.resolve_ref(separator)?;
                TokenPattern::SeparatedRepeat { element, separator, min: *min, max: *max, allow_trailing: *allow_trailing, include_sep: *include_sep }
            }
            BuildableToken::Between(a, b, c) => TokenPattern::Between(self.resolve_ref(a)?, self.resolve_ref(b)?, self.resolve_ref(c)?),
            BuildableToken::First(a, b) => TokenPattern::First(self.resolve_ref(a)?, self.resolve_ref(b)?),
            BuildableToken::Second(a, b) => TokenPattern::Second(self.resolve_ref(a)?, self.resolve_ref(b)?),
            BuildableToken::Map(child, f) => TokenPattern::Map(self.resolve_ref(child)?, f.clone()),
            BuildableToken::Return(child, value) => TokenPattern::Return(self.resolve_ref(child)?, value.clone()),
            BuildableToken::CaptureText { child, trim_start, trim_end } => {
                TokenPattern::CaptureText { child: self.resolve_ref(child)?, trim_start: *trim_start, trim_end: *trim_end }
            }
            BuildableToken::SkipWhitespaces(child) => TokenPattern::SkipWhitespaces(self.resolve_ref(child)?),
            BuildableToken::Lookahead { child, positive } => TokenPattern::Lookahead { child: self.resolve_ref(child)?, positive: *positive },
            BuildableToken::Switch { selector, branches, default } => {
                let branches = branches.iter().map(|c| self.resolve_ref(c)).collect::<Result<_, _>>()?;
                let default = default.as_ref().map(|d| self.resolve_ref(d)).transpose()?;
                TokenPattern::Switch { selector: selector.clone(), branches, default }
            }
            BuildableToken::If { predicate, then_branch, else_branch } => {
                let then_branch = self.resolve_ref(then_branch)?;
                let else_branch = else_branch.as_ref().map(|e| self.resolve_ref(e)).transpose()?;
                TokenPattern::If { predicate: predicate.clone(), then_branch, else_branch }
            }
            BuildableToken::Alias(inner) => return self.resolve_token(inner),
        };
        Ok(self.push(pattern))
    }
}

/// The rule ids `rule` might recurse into *without consuming any input
/// first* (spec §3 invariant 3's "unbreakable cycle" hazard): the leftmost
/// children of `Sequence` up to (and including) the first non-nullable one,
/// every branch of `Choice`/`Switch`/`If`, and the bodies `Optional`/
/// `Repeat`/`SeparatedRepeat`/`Lookahead` attempt at the same position.
fn zero_width_successors(rule: &ParserRule, firstsets: &firstset::FirstSets) -> Vec<RuleId> {
    fn push(out: &mut Vec<RuleId>, element: RuleElement) {
        if let RuleElement::Rule(id) = element {
            out.push(id);
        }
    }

    let mut out = Vec::new();
    match rule {
        ParserRule::Sequence(children) => {
            for &child in children {
                push(&mut out, child);
                if !firstsets.element(child).nullable {
                    break;
                }
            }
        }
        ParserRule::Choice(_, children) => {
            for &child in children {
                push(&mut out, child);
            }
        }
        ParserRule::Optional(child) | ParserRule::Lookahead { child, .. } => push(&mut out, *child),
        ParserRule::Repeat { child, .. } => push(&mut out, *child),
        ParserRule::SeparatedRepeat { element, .. } => push(&mut out, *element),
        ParserRule::Token(_) | ParserRule::Custom(_) => {}
        ParserRule::Switch { branches, default, .. } => {
            for &branch in branches {
                push(&mut out, branch);
            }
            if let Some(default) = default {
                push(&mut out, *default);
            }
        }
        ParserRule::If { then_branch, else_branch, .. } => {
            push(&mut out, *then_branch);
            if let Some(else_branch) = else_branch {
                push(&mut out, *else_branch);
            }
        }
    }
    out
}

fn check_cycles(rules: &RuleTable, firstsets: &firstset::FirstSets) -> Result<(), BuildError> {
    const WHITE: u8 = 0;
    const GRAY: u8 = 1;
    const BLACK: u8 = 2;

    fn visit(id: u32, rules: &RuleTable, firstsets: &firstset::FirstSets, state: &mut [u8], stack: &mut Vec<u32>) -> Result<(), BuildError> {
        state[id as usize] = GRAY;
        stack.push(id);
        for next in zero_width_successors(rules.body(RuleId::new(id)), firstsets) {
            match state[next.index()] {
                WHITE => visit(next.index() as u32, rules, firstsets, state, stack)?,
                GRAY => {
                    let start = stack.iter().position(|&x| x == next.index() as u32).unwrap();
                    return Err(BuildError::UnbreakableCycle { members: stack[start..].to_vec() });
                }
                _ => {}
            }
        }
        stack.pop();
        state[id as usize] = BLACK;
        Ok(())
    }

    let mut state = vec![WHITE; rules.len()];
    let mut stack = Vec::new();
    for id in 0..rules.len() as u32 {
        if state[id as usize] == WHITE {
            visit(id, rules, firstsets, &mut state, &mut stack)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::build::BuildableRule;
    use crate::rule::build::BuildableRuleBody;
    use crate::token::build::BuildableToken;

    fn lit(s: &str) -> RuleRef {
        RuleRef::InlineToken(BuildableToken::literal(s))
    }

    #[test]
    fn builds_a_simple_sequence_grammar() {
        let grammar = Grammar::new("greeting").rule(BuildableRule::new("greeting", BuildableRuleBody::Sequence(vec![lit("hello"), lit(" "), lit("world")])));
        let parser = build(grammar, BuildFlags::default()).expect("builds");
        let tree = parser.parse("hello world").expect("parses");
        let root = tree.root_view("hello world");
        assert_eq!(root.text(), "hello world");
        assert_eq!(root.children().count(), 3);
    }

    #[test]
    fn unresolved_alias_is_rejected() {
        let grammar = Grammar::new("missing").rule(BuildableRule::new("present", BuildableRuleBody::Token(BuildableToken::literal("x"))));
        let err = build(grammar, BuildFlags::default()).unwrap_err();
        assert!(matches!(err, BuildError::UnresolvedAlias { .. }));
    }

    #[test]
    fn self_referential_optional_is_an_unbreakable_cycle() {
        let grammar = Grammar::new("loop").rule(BuildableRule::new("loop", BuildableRuleBody::Optional(RuleRef::Alias("loop".to_string()))));
        let err = build(grammar, BuildFlags::default()).unwrap_err();
        assert!(matches!(err, BuildError::UnbreakableCycle { .. }));
    }

    #[test]
    fn mutually_recursive_rules_resolve_regardless_of_declaration_order() {
        let grammar = Grammar::new("a")
            .rule(BuildableRule::new(
                "a",
                BuildableRuleBody::Choice(crate::rule::ChoiceMode::First, vec![RuleRef::Alias("b".to_string()), lit("x")]),
            ))
            .rule(BuildableRule::new("b", BuildableRuleBody::Token(BuildableToken::literal("y"))));
        let parser = build(grammar, BuildFlags::default()).expect("builds");
        assert!(parser.parse("y").is_ok());
        assert!(parser.parse("x").is_ok());
    }

    #[test]
    fn duplicate_token_patterns_share_one_id() {
        let grammar = Grammar::new("pair").rule(BuildableRule::new("pair", BuildableRuleBody::Sequence(vec![lit("x"), lit("x")])));
        let parser = build(grammar, BuildFlags::default()).expect("builds");
        assert_eq!(parser.tokens.len(), 1);
    }
}
