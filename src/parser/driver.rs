//! The parse driver (spec §4.3): one recursive procedure, `enter_rule`,
//! descends the rule graph. Grounded on the teacher's single `Parser::parse`
//! loop (`apollo-parser`'s `Parser` drives its whole grammar through one
//! `parse` entry rather than one method per production) — generalized here
//! from a fixed GraphQL grammar to an arbitrary compiled [`RuleTable`].

use std::any::Any;

use crate::ast::NodeId;
use crate::ast::ParsedRuleNode;
use crate::ast::ParsedTree;
use crate::error::ErrorKind;
use crate::error::FurthestError;
use crate::error::ParseError;
use crate::error::RecordedError;
use crate::ids::ElementId;
use crate::ids::RuleId;
use crate::ids::TokenId;
use crate::limit::WorkLimits;
use crate::rule::ParserRule;
use crate::rule::RuleElement;
use crate::rule::RuleTable;
use crate::token::MatchCx;
use crate::token::ParsedElement;
use crate::token::TokenTable;

use super::barrier::BarrierStream;
use super::cache::CacheEntry;
use super::context::ParserContext;
use super::context::WalkTraceEntry;
use super::recovery;
use super::recovery::RecoveryStrategy;
use super::settings::ErrorHandling;
use super::settings::ParserSettings;
use super::skip;

/// A fully compiled, immutable grammar (spec §5: "safe to share across
/// threads once built"). Analogous to the teacher's generated `SyntaxKind`
/// tables, but built at runtime from a [`crate::rule::build::BuildableRule`]
/// tree instead of codegen.
#[derive(Debug)]
pub struct Parser {
    pub tokens: TokenTable,
    pub rules: RuleTable,
    pub root_rule: RuleId,
    pub rule_aliases: std::collections::HashMap<String, RuleId>,
    pub token_aliases: std::collections::HashMap<String, crate::ids::TokenId>,
    /// Present only when built with `BuildFlags::first_character_match`
    /// (spec §4.6 step 6 "Specialize"); lets [`match_rule_choice`] skip
    /// branches whose first-character set provably excludes the next input
    /// character, without changing which branch ultimately wins.
    pub firstsets: Option<std::sync::Arc<crate::build::firstset::FirstSets>>,
}

/// Per-call knobs layered over a rule's own (inherited) settings (spec §6:
/// `parse_with(input, opts)`).
#[derive(Default)]
pub struct ParseOptions<'a> {
    pub parameter: Option<&'a dyn Any>,
    pub settings: Option<ParserSettings>,
    pub barriers: Option<BarrierStream>,
    pub limits: Option<WorkLimits>,
}

/// What a top-level parse entry returns: either a tree, or the accumulated
/// diagnostics rendered as a [`ParseError`] (spec §6: "`ParsedRule |
/// ParseError`").
pub type ParseOutcome = Result<ParsedTree, ParseError>;

impl Parser {
    pub fn parse(&self, input: &str) -> ParseOutcome {
        self.parse_with(input, ParseOptions::default())
    }

    pub fn parse_with(&self, input: &str, opts: ParseOptions<'_>) -> ParseOutcome {
        self.parse_rule(self.root_rule, input, opts)
    }

    pub fn parse_rule(&self, rule: RuleId, input: &str, opts: ParseOptions<'_>) -> ParseOutcome {
        let barriers = opts.barriers.unwrap_or_else(BarrierStream::empty);
        let settings = opts.settings.unwrap_or_default();
        let limits = opts.limits.unwrap_or_default();
        let mut ctx = ParserContext::new(input, &self.tokens, &self.rules, &barriers, opts.parameter, settings, limits, self.firstsets.as_deref());

        match enter_rule(&mut ctx, rule, 0) {
            Ok(root) => {
                let mut tree = ctx.tree.finish(root, 0);
                if !settings.use_lazy_ast {
                    crate::ast::materialize_user_values(&mut tree, input, &self.rules);
                }
                Ok(tree)
            }
            Err(()) => {
                let mut errors = ctx.live_errors();
                if errors.is_empty() {
                    // `NoRecord`/`ignore_errors` may have suppressed every recorded
                    // error; the furthest-error tracker still saw the closest miss.
                    errors.extend(ctx.furthest.get().cloned());
                }
                Err(ParseError::from_errors(input, errors))
            }
        }
    }

    /// `match_token(parser, token_alias, input, parameter?) -> ParsedElement
    /// | Fail` (spec §6): matches a single named token against the start of
    /// `input`, bypassing the rule driver entirely. Unlike `parse_rule`,
    /// which takes an already-resolved `RuleId`, this is the one public
    /// entry spec §6 names by alias directly, so the resolution happens
    /// inside rather than being pushed onto the caller.
    pub fn match_token(&self, token_alias: &str, input: &str, opts: ParseOptions<'_>) -> Result<ParsedElement, ParseError> {
        let unresolved = || {
            ParseError::from_errors(
                input,
                vec![RecordedError {
                    kind: ErrorKind::Expectation,
                    position: 0,
                    recursion_depth: 0,
                    message: Some(format!("no token named {token_alias:?} in this grammar")),
                    element: ElementId::Token(TokenId::new(0)),
                    stack_trace: Vec::new(),
                }],
            )
        };
        let Some(id) = self.token_by_alias(token_alias) else { return Err(unresolved()) };

        let barriers = opts.barriers.unwrap_or_else(BarrierStream::empty);
        let barrier_limit = barriers.next_barrier_position(0, input.len());
        let compute_value = !opts.settings.unwrap_or_default().use_light_ast;

        let mut furthest = FurthestError::default();
        let mut cx = MatchCx { input, parameter: opts.parameter, furthest: &mut furthest };
        crate::token::match_token(&self.tokens, id, 0, barrier_limit, &mut cx, compute_value).map_err(|()| {
            let error = furthest.into_inner().unwrap_or_else(|| RecordedError {
                kind: ErrorKind::Expectation,
                position: 0,
                recursion_depth: 0,
                message: None,
                element: ElementId::Token(id),
                stack_trace: Vec::new(),
            });
            ParseError::from_errors(input, vec![error])
        })
    }

    pub fn rule_by_alias(&self, alias: &str) -> Option<RuleId> {
        self.rule_aliases.get(alias).copied()
    }

    pub fn token_by_alias(&self, alias: &str) -> Option<crate::ids::TokenId> {
        self.token_aliases.get(alias).copied()
    }
}

/// Enters `rule_id` at `position` (spec §4.3's 7-step procedure).
pub fn enter_rule(ctx: &mut ParserContext<'_>, rule_id: RuleId, position: usize) -> Result<NodeId, ()> {
    let span = tracing::trace_span!("enter_rule", rule = rule_id.index(), position);
    let _entered = span.enter();

    // Step 2: per-rule settings override.
    let meta = ctx.rules.meta(rule_id);
    let parent_settings = ctx.settings;
    let local_settings = match &meta.settings_override {
        Some(patch) => parent_settings.apply(patch),
        None => parent_settings,
    };

    // Step 3: memoization.
    let memoize = meta.memoize || local_settings.memoize;
    if memoize {
        if let Some(entry) = ctx.cache.get(rule_id, position) {
            return match entry {
                CacheEntry::Success(node, _) => Ok(node),
                CacheEntry::Failure => Err(()),
            };
        }
    }

    // Step 1: recursion-depth bound.
    if ctx.limits.recursion.limited() {
        ctx.settings = parent_settings;
        ctx.record_error(RecordedError {
            kind: ErrorKind::RecursionDepthExceeded,
            position,
            recursion_depth: ctx.recursion_depth,
            message: None,
            element: ElementId::Rule(rule_id),
            stack_trace: Vec::new(),
        });
        return Err(());
    }
    ctx.limits.recursion.consume();
    ctx.limits.total_steps.consume();
    ctx.recursion_depth += 1;
    ctx.settings = local_settings;
    ctx.rule_stack.push(rule_id);

    let barrier_limit = ctx.barriers.next_barrier_position(position, ctx.input.len());
    let recovery_strategy = meta.recovery.clone();

    // Step 4 + 5: skip strategy wraps the specialized match procedure.
    let skip_rule = local_settings.skip_rule;
    let record_skipped = local_settings.record_skipped_rules;
    let outcome = skip::apply(
        local_settings.skipping_strategy,
        ctx,
        position,
        |ctx, pos| {
            let sr = skip_rule?;
            let node = enter_rule(ctx, sr, pos).ok()?;
            if record_skipped {
                ctx.skipped_rules.push((sr, pos));
            }
            Some(ctx.tree.get(node).end())
        },
        |ctx, pos| match_rule_body(ctx, rule_id, pos, barrier_limit),
    );

    ctx.limits.recursion.release();
    ctx.recursion_depth = ctx.recursion_depth.saturating_sub(1);
    ctx.rule_stack.pop();

    let result = match outcome {
        Ok(node) => {
            let end = ctx.tree.get(node).end();
            ctx.position = end;
            ctx.passed_barriers = ctx.barriers.passed_before(end);
            ctx.mark_success(position);
            Ok(node)
        }
        Err(()) => {
            if !local_settings.ignore_errors {
                ctx.record_error(RecordedError {
                    kind: ErrorKind::Expectation,
                    position,
                    recursion_depth: ctx.recursion_depth,
                    message: None,
                    element: ElementId::Rule(rule_id),
                    stack_trace: Vec::new(),
                });
            }
            if local_settings.error_handling == ErrorHandling::Throw {
                Err(())
            } else {
                attempt_recovery(ctx, rule_id, recovery_strategy.as_ref(), position, barrier_limit)
            }
        }
    };

    if local_settings.record_walk_trace {
        ctx.walk_trace.push(WalkTraceEntry { element: ElementId::Rule(rule_id), position, succeeded: result.is_ok() });
    }

    if memoize {
        let entry = match result {
            Ok(node) => CacheEntry::Success(node, position),
            Err(()) => CacheEntry::Failure,
        };
        ctx.cache.insert(rule_id, position, entry);
    }

    ctx.settings = parent_settings;
    tracing::trace!(succeeded = result.is_ok(), "exit_rule");
    result
}

/// Step 4.5: error recovery (spec §4.5). Suppresses error recording for the
/// duration of the attempt, per "error recording is suppressed (NoRecord)".
fn attempt_recovery(
    ctx: &mut ParserContext<'_>,
    rule_id: RuleId,
    strategy: Option<&RecoveryStrategy>,
    failure_position: usize,
    barrier_limit: usize,
) -> Result<NodeId, ()> {
    let Some(strategy) = strategy else { return Err(()) };

    let saved_handling = ctx.settings.error_handling;
    ctx.settings.error_handling = ErrorHandling::NoRecord;
    let input = ctx.input;
    let recovered = recovery::recover(
        strategy,
        ctx,
        input,
        barrier_limit,
        failure_position,
        |ctx, element, pos| enter_element(ctx, rule_id, element, pos).ok().map(|node| ctx.tree.get(node).end()),
        |ctx, pos| enter_rule(ctx, rule_id, pos),
    );
    ctx.settings.error_handling = saved_handling;
    recovered.map(|r| r.node).ok_or(())
}

/// Step 5 proper: dispatches one rule body, building whatever
/// [`ParsedRuleNode`] its variant produces.
fn match_rule_body(ctx: &mut ParserContext<'_>, rule_id: RuleId, position: usize, barrier_limit: usize) -> Result<NodeId, ()> {
    let body = ctx.rules.body(rule_id).clone();
    match body {
        ParserRule::Sequence(children) => {
            let mut pos = position;
            let mut kids = Vec::with_capacity(children.len());
            for element in &children {
                let node = enter_element(ctx, rule_id, *element, pos)?;
                pos = ctx.tree.get(node).end();
                kids.push(node);
            }
            Ok(push_node(ctx, rule_id, position, pos - position, kids, None, None))
        }
        ParserRule::Choice(mode, children) => match_rule_choice(ctx, rule_id, mode, &children, position),
        ParserRule::Optional(child) => match enter_element(ctx, rule_id, child, position) {
            Ok(node) => {
                let end = ctx.tree.get(node).end();
                Ok(push_node(ctx, rule_id, position, end - position, vec![node], None, None))
            }
            Err(()) => Ok(push_node(ctx, rule_id, position, 0, Vec::new(), None, None)),
        },
        ParserRule::Repeat { child, min, max } => match_rule_repeat(ctx, rule_id, child, min, max, position),
        ParserRule::SeparatedRepeat { element, separator, min, max, allow_trailing, include_sep } => {
            match_rule_separated_repeat(ctx, rule_id, element, separator, min, max, allow_trailing, include_sep, position)
        }
        ParserRule::Lookahead { child, positive } => match_rule_lookahead(ctx, rule_id, child, positive, position),
        ParserRule::Token(token_id) => {
            let compute_value = !ctx.settings.use_light_ast;
            let mut cx = MatchCx { input: ctx.input, parameter: ctx.parameter, furthest: &mut ctx.furthest };
            let parsed = crate::token::match_token(ctx.tokens, token_id, position, barrier_limit, &mut cx, compute_value)?;
            let node = ParsedRuleNode {
                rule_id,
                is_token: true,
                token_id: Some(token_id),
                start: parsed.start,
                length: parsed.length,
                passed_barriers: ctx.barriers.passed_before(parsed.end()),
                intermediate_value: parsed.value,
                children: Vec::new(),
                occurrence: None,
                version: 0,
            };
            Ok(ctx.tree.push(node))
        }
        ParserRule::Custom(custom) => custom(ctx, rule_id),
        ParserRule::Switch { selector, branches, default } => {
            let index = selector.call(ctx.parameter);
            let chosen = usize::try_from(index).ok().filter(|&i| i < branches.len());
            let (occurrence, element) = match chosen {
                Some(i) => (Some(i), Some(branches[i])),
                None => (None, default),
            };
            let Some(element) = element else {
                ctx.record_error(RecordedError {
                    kind: ErrorKind::SelectorOutOfRange,
                    position,
                    recursion_depth: ctx.recursion_depth,
                    message: Some(format!("selector index {index} out of range and no default")),
                    element: ElementId::Rule(rule_id),
                    stack_trace: Vec::new(),
                });
                return Err(());
            };
            let node = enter_element(ctx, rule_id, element, position)?;
            let end = ctx.tree.get(node).end();
            Ok(push_node(ctx, rule_id, position, end - position, vec![node], occurrence, None))
        }
        ParserRule::If { predicate, then_branch, else_branch } => {
            let element = if predicate.call(ctx.parameter) {
                Some(then_branch)
            } else {
                else_branch
            };
            let Some(element) = element else {
                ctx.record_error(RecordedError {
                    kind: ErrorKind::Expectation,
                    position,
                    recursion_depth: ctx.recursion_depth,
                    message: Some("If predicate false and no else branch".to_string()),
                    element: ElementId::Rule(rule_id),
                    stack_trace: Vec::new(),
                });
                return Err(());
            };
            let node = enter_element(ctx, rule_id, element, position)?;
            let end = ctx.tree.get(node).end();
            Ok(push_node(ctx, rule_id, position, end - position, vec![node], None, None))
        }
    }
}

fn push_node(
    ctx: &mut ParserContext<'_>,
    rule_id: RuleId,
    start: usize,
    length: usize,
    children: Vec<NodeId>,
    occurrence: Option<usize>,
    intermediate_value: Option<crate::value::IntermediateValue>,
) -> NodeId {
    let node = ParsedRuleNode {
        rule_id,
        is_token: false,
        token_id: None,
        start,
        length,
        passed_barriers: ctx.barriers.passed_before(start + length),
        intermediate_value,
        children,
        occurrence,
        version: 0,
    };
    ctx.tree.push(node)
}

/// A bare `RuleElement` reference. `Token` references have no wrapper rule
/// of their own, so the produced leaf borrows `parent_rule_id` for its
/// `rule_id` field — `is_token` distinguishes it from a real rule node, and
/// nothing keys a value-factory lookup off a token leaf's `rule_id` (spec §9
/// value factories are rule-level).
fn enter_element(ctx: &mut ParserContext<'_>, parent_rule_id: RuleId, element: RuleElement, position: usize) -> Result<NodeId, ()> {
    match element {
        RuleElement::Rule(id) => enter_rule(ctx, id, position),
        RuleElement::Token(id) => {
            let barrier_limit = ctx.barriers.next_barrier_position(position, ctx.input.len());
            let compute_value = !ctx.settings.use_light_ast;
            let mut cx = MatchCx { input: ctx.input, parameter: ctx.parameter, furthest: &mut ctx.furthest };
            let parsed = crate::token::match_token(ctx.tokens, id, position, barrier_limit, &mut cx, compute_value)?;
            let node = ParsedRuleNode {
                rule_id: parent_rule_id,
                is_token: true,
                token_id: Some(id),
                start: parsed.start,
                length: parsed.length,
                passed_barriers: ctx.barriers.passed_before(parsed.end()),
                intermediate_value: parsed.value,
                children: Vec::new(),
                occurrence: None,
                version: 0,
            };
            Ok(ctx.tree.push(node))
        }
    }
}

/// Whether `element`'s first-character set provably can't start a match at
/// `position` — false whenever firstsets weren't built, or the set is
/// unbounded, or the element is nullable (an empty match doesn't consume a
/// "first" character at all, so it can't be ruled out this way).
fn provably_excluded(ctx: &ParserContext<'_>, element: RuleElement, position: usize) -> bool {
    let Some(firstsets) = ctx.firstsets else { return false };
    let info = firstsets.element(element);
    if info.nullable {
        return false;
    }
    match &info.first_chars {
        Some(set) => match ctx.input[position..].chars().next() {
            Some(c) => !set.contains(&c),
            None => !set.is_empty(),
        },
        None => false,
    }
}

fn match_rule_choice(ctx: &mut ParserContext<'_>, rule_id: RuleId, mode: crate::rule::ChoiceMode, children: &[RuleElement], position: usize) -> Result<NodeId, ()> {
    use crate::rule::ChoiceMode;
    match mode {
        ChoiceMode::First => {
            for (index, &element) in children.iter().enumerate() {
                if provably_excluded(ctx, element, position) {
                    continue;
                }
                if let Ok(node) = enter_element(ctx, rule_id, element, position) {
                    let end = ctx.tree.get(node).end();
                    return Ok(push_node(ctx, rule_id, position, end - position, vec![node], Some(index), None));
                }
            }
            Err(())
        }
        ChoiceMode::Longest | ChoiceMode::Shortest => {
            let mut best: Option<(usize, NodeId, usize)> = None;
            for (index, &element) in children.iter().enumerate() {
                if provably_excluded(ctx, element, position) {
                    continue;
                }
                if let Ok(node) = enter_element(ctx, rule_id, element, position) {
                    let length = ctx.tree.get(node).length;
                    let better = match &best {
                        None => true,
                        Some((_, _, best_len)) => match mode {
                            ChoiceMode::Longest => length > *best_len,
                            ChoiceMode::Shortest => length < *best_len,
                            ChoiceMode::First => unreachable!(),
                        },
                    };
                    if better {
                        best = Some((index, node, length));
                    }
                }
            }
            match best {
                Some((index, node, length)) => Ok(push_node(ctx, rule_id, position, length, vec![node], Some(index), None)),
                None => Err(()),
            }
        }
    }
}

fn match_rule_repeat(ctx: &mut ParserContext<'_>, rule_id: RuleId, child: RuleElement, min: usize, max: Option<usize>, position: usize) -> Result<NodeId, ()> {
    let mut pos = position;
    let mut kids = Vec::new();
    loop {
        if max.is_some_and(|max| kids.len() >= max) {
            break;
        }
        match enter_element(ctx, rule_id, child, pos) {
            Ok(node) => {
                let end = ctx.tree.get(node).end();
                if end == pos {
                    // spec §4.2: zero-length match terminates repetition.
                    break;
                }
                pos = end;
                kids.push(node);
            }
            Err(()) => break,
        }
    }
    if kids.len() < min {
        ctx.record_error(RecordedError {
            kind: ErrorKind::RangeViolation,
            position: pos,
            recursion_depth: ctx.recursion_depth,
            message: Some("fewer repetitions than the minimum".to_string()),
            element: ElementId::Rule(rule_id),
            stack_trace: Vec::new(),
        });
        return Err(());
    }
    for (index, &node) in kids.iter().enumerate() {
        ctx.tree.set_occurrence(node, index);
    }
    Ok(push_node(ctx, rule_id, position, pos - position, kids, None, None))
}

#[allow(clippy::too_many_arguments)]
fn match_rule_separated_repeat(
    ctx: &mut ParserContext<'_>,
    rule_id: RuleId,
    element: RuleElement,
    separator: RuleElement,
    min: usize,
    max: Option<usize>,
    allow_trailing: bool,
    include_sep: bool,
    position: usize,
) -> Result<NodeId, ()> {
    let mut pos = position;
    let mut kids = Vec::new();
    let mut element_nodes = Vec::new();

    match enter_element(ctx, rule_id, element, pos) {
        Ok(node) => {
            pos = ctx.tree.get(node).end();
            kids.push(node);
            element_nodes.push(node);
        }
        Err(()) => {
            if min == 0 {
                return Ok(push_node(ctx, rule_id, position, 0, Vec::new(), None, None));
            }
            ctx.record_error(RecordedError {
                kind: ErrorKind::RangeViolation,
                position: pos,
                recursion_depth: ctx.recursion_depth,
                message: Some("empty separated-repeat below minimum".to_string()),
                element: ElementId::Rule(rule_id),
                stack_trace: Vec::new(),
            });
            return Err(());
        }
    }

    let mut count = 1;
    loop {
        if max.is_some_and(|max| count >= max) {
            break;
        }
        let sep_start = pos;
        let Ok(sep_node) = enter_element(ctx, rule_id, separator, pos) else {
            break;
        };
        let sep_end = ctx.tree.get(sep_node).end();
        if sep_end == pos {
            ctx.record_error(RecordedError {
                kind: ErrorKind::InvariantViolation,
                position: pos,
                recursion_depth: ctx.recursion_depth,
                message: Some("zero-length separator".to_string()),
                element: ElementId::Rule(rule_id),
                stack_trace: Vec::new(),
            });
            return Err(());
        }
        match enter_element(ctx, rule_id, element, sep_end) {
            Ok(elem_node) => {
                let elem_end = ctx.tree.get(elem_node).end();
                if elem_end == sep_end {
                    ctx.record_error(RecordedError {
                        kind: ErrorKind::InvariantViolation,
                        position: sep_end,
                        recursion_depth: ctx.recursion_depth,
                        message: Some("zero-length element after separator".to_string()),
                        element: ElementId::Rule(rule_id),
                        stack_trace: Vec::new(),
                    });
                    return Err(());
                }
                if include_sep {
                    kids.push(sep_node);
                }
                kids.push(elem_node);
                element_nodes.push(elem_node);
                pos = elem_end;
                count += 1;
            }
            Err(()) => {
                if allow_trailing {
                    if include_sep {
                        kids.push(sep_node);
                    }
                    pos = sep_end;
                } else {
                    pos = sep_start;
                }
                break;
            }
        }
    }

    if count < min {
        ctx.record_error(RecordedError {
            kind: ErrorKind::RangeViolation,
            position: pos,
            recursion_depth: ctx.recursion_depth,
            message: Some("fewer elements than the minimum".to_string()),
            element: ElementId::Rule(rule_id),
            stack_trace: Vec::new(),
        });
        return Err(());
    }
    for (index, &node) in element_nodes.iter().enumerate() {
        ctx.tree.set_occurrence(node, index);
    }
    Ok(push_node(ctx, rule_id, position, pos - position, kids, None, None))
}

fn match_rule_lookahead(ctx: &mut ParserContext<'_>, rule_id: RuleId, child: RuleElement, positive: bool, position: usize) -> Result<NodeId, ()> {
    let saved_furthest = ctx.furthest.clone();
    let saved_errors_len = ctx.errors.len();
    let saved_position = ctx.position;
    let saved_passed = ctx.passed_barriers;

    let result = enter_element(ctx, rule_id, child, position);

    ctx.furthest = saved_furthest;
    ctx.errors.truncate(saved_errors_len);
    ctx.position = saved_position;
    ctx.passed_barriers = saved_passed;

    match (positive, result) {
        (true, Ok(_)) => Ok(push_node(ctx, rule_id, position, 0, Vec::new(), None, None)),
        (false, Err(())) => Ok(push_node(ctx, rule_id, position, 0, Vec::new(), None, None)),
        _ => Err(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build;
    use crate::build::BuildFlags;
    use crate::build::Grammar;
    use crate::rule::build::BuildableRule;
    use crate::rule::build::BuildableRuleBody;
    use crate::token::build::BuildableToken;
    use crate::token::build::TokenRef;
    use crate::token::CaseSensitivity;

    fn greeting_parser() -> Parser {
        // `hi` only lands in `token_aliases` once something resolves it via
        // `TokenRef::Alias`; `greeting`'s body does that, which is also what
        // makes `token_by_alias("hi")` succeed below.
        let grammar = Grammar::new("greeting")
            .token("hi", BuildableToken::Literal("hi".into(), CaseSensitivity::Sensitive))
            .rule(BuildableRule::new(
                "greeting",
                BuildableRuleBody::Token(BuildableToken::SkipWhitespaces(TokenRef::Alias("hi".to_string()))),
            ));
        build(grammar, BuildFlags::default()).expect("greeting grammar builds")
    }

    #[test]
    fn match_token_matches_a_named_token_directly() {
        let parser = greeting_parser();
        let matched = parser.match_token("hi", "hi there", ParseOptions::default()).expect("matches the leading literal");
        assert_eq!(matched.start, 0);
        assert_eq!(matched.length, 2);
    }

    #[test]
    fn match_token_fails_on_an_unknown_alias() {
        let parser = greeting_parser();
        assert!(parser.match_token("bye", "hi there", ParseOptions::default()).is_err());
    }

    #[test]
    fn match_token_fails_when_the_input_does_not_match() {
        let parser = greeting_parser();
        assert!(parser.match_token("hi", "nope", ParseOptions::default()).is_err());
    }
}
