//! Single-edit incremental reparse (spec §4.8): given a previous result tree
//! and a text change, reuse as much of the tree as possible instead of
//! reparsing the whole input.
//!
//! Grounded on the teacher's arena-based `SyntaxTree`, where nodes are
//! addressed by index rather than owned by their parent — that's what makes
//! splicing a replacement subtree in by index (rather than rebuilding every
//! ancestor's child list by hand) practical here too. The walk itself has no
//! direct teacher analogue (`apollo-parser` always reparses whole files); it
//! follows spec §4.8's algorithm directly.

use crate::ast::NodeId;
use crate::ast::ParsedRuleNode;
use crate::ast::ParsedTree;
use crate::error::ParseError;
use crate::limit::WorkLimits;
use crate::parser::barrier::BarrierStream;
use crate::parser::context::ParserContext;
use crate::parser::driver::enter_rule;
use crate::parser::driver::Parser;
use crate::parser::settings::ParserSettings;
use crate::parser::ParseOutcome;

/// A single text edit (spec §4.8: `{ start, old_length, new_length }`).
#[derive(Debug, Clone, Copy)]
pub struct Change {
    pub start: usize,
    pub old_length: usize,
    pub new_length: usize,
}

impl Change {
    fn old_end(&self) -> usize {
        self.start + self.old_length
    }
}

impl Parser {
    /// Reparses `new_input` by reusing as much of `prev` as the single edit
    /// `change` leaves untouched. Equivalent to `self.parse(new_input)` for
    /// any grammar without context-sensitive rules (spec §3 invariant 8),
    /// but cheaper when most of the tree falls outside the edit.
    pub fn reparse_incremental(&self, prev: &ParsedTree, prev_input: &str, change: Change, new_input: &str) -> ParseOutcome {
        let _ = prev_input; // spans are absolute offsets; the old text itself is never read back.
        let barriers = BarrierStream::empty();
        let mut ctx = ParserContext::new(new_input, &self.tokens, &self.rules, &barriers, None, ParserSettings::default(), WorkLimits::default(), self.firstsets.as_deref());
        let delta = change.new_length as i64 - change.old_length as i64;
        let next_version = prev.version + 1;

        match rebuild(&mut ctx, prev, prev.root, &change, delta, next_version) {
            Ok(root) => {
                let tree_builder = std::mem::take(&mut ctx.tree);
                Ok(tree_builder.finish(root, next_version))
            }
            Err(()) => {
                let mut errors = ctx.live_errors();
                if errors.is_empty() {
                    errors.extend(ctx.furthest.get().cloned());
                }
                Err(ParseError::from_errors(new_input, errors))
            }
        }
    }
}

/// Deep-copies a subtree into `ctx.tree` unchanged: every span, id and
/// version is preserved. Used for siblings entirely before the edit.
fn copy_unchanged(ctx: &mut ParserContext<'_>, prev: &ParsedTree, id: NodeId) -> NodeId {
    let node = prev.node(id).clone();
    let children = node.children.iter().map(|&child| copy_unchanged(ctx, prev, child)).collect();
    ctx.tree.push(ParsedRuleNode { children, ..node })
}

/// Deep-copies a subtree into `ctx.tree`, shifting every span's `start` by
/// `delta`. The content didn't change, only where it sits in `new_input`, so
/// the version is preserved too (spec §4.8: "unchanged subtrees keep their
/// old version").
fn shift_subtree(ctx: &mut ParserContext<'_>, prev: &ParsedTree, id: NodeId, delta: i64) -> NodeId {
    let node = prev.node(id).clone();
    let children = node.children.iter().map(|&child| shift_subtree(ctx, prev, child, delta)).collect();
    let start = (node.start as i64 + delta) as usize;
    ctx.tree.push(ParsedRuleNode { start, children, ..node })
}

/// Applies spec §4.8's algorithm at `id`, pushing the resulting (possibly
/// rebuilt) subtree onto `ctx.tree` and returning its new id.
///
/// Token-leaf nodes are never themselves re-entered as the "entirely
/// contains" recursion target: their `rule_id` names the *enclosing* rule
/// (see [`crate::parser::driver::enter_element`]), not an independently
/// reparseable rule, so a change fully inside a single token leaf always
/// falls through to reparsing the nearest enclosing rule node instead.
fn rebuild(ctx: &mut ParserContext<'_>, prev: &ParsedTree, id: NodeId, change: &Change, delta: i64, version: u64) -> Result<NodeId, ()> {
    let node = prev.node(id);
    let change_end = change.old_end();

    if node.end() <= change.start {
        return Ok(copy_unchanged(ctx, prev, id));
    }
    if node.start >= change_end {
        return Ok(shift_subtree(ctx, prev, id, delta));
    }

    let mut sole_contains: Option<NodeId> = None;
    let mut contains_count = 0usize;
    let mut any_overlap = false;
    for &child_id in &node.children {
        let child = prev.node(child_id);
        let contains = child.start <= change.start && child.end() >= change_end;
        let overlaps = child.end() > change.start && child.start < change_end;
        if contains && !child.is_token {
            contains_count += 1;
            sole_contains = Some(child_id);
        } else if overlaps && !contains {
            any_overlap = true;
        }
    }

    if contains_count == 1 && !any_overlap {
        let child_id = sole_contains.unwrap();
        if let Ok(new_child) = rebuild(ctx, prev, child_id, change, delta, version) {
            let (new_start, new_length) = {
                let rebuilt = ctx.tree.get(new_child);
                (rebuilt.start, rebuilt.length)
            };
            let old_child = prev.node(child_id);
            let expected_length = (old_child.length as i64 + delta) as usize;
            if new_start == old_child.start && new_length == expected_length {
                return Ok(splice(ctx, prev, id, child_id, new_child, change, delta, version));
            }
            // The child's own reparse didn't line up with the edit (e.g. it
            // grew past its old boundary) — invalidate up to this node and
            // reparse it whole instead, below.
        }
    }

    let fresh = enter_rule(ctx, prev.node(id).rule_id, prev.node(id).start)?;
    stamp_version(ctx, fresh, version);
    Ok(fresh)
}

/// A freshly reparsed subtree comes back with every node's `version` set to
/// 0 (the normal from-scratch value) — rewrites it in place to the
/// incremental reparse's version, since every node in it was, by definition,
/// just touched.
fn stamp_version(ctx: &mut ParserContext<'_>, id: NodeId, version: u64) {
    ctx.tree.set_version(id, version);
    let children = ctx.tree.get(id).children.clone();
    for child in children {
        stamp_version(ctx, child, version);
    }
}

/// Rebuilds `parent_id`'s child list around an already-rebuilt `new_child`,
/// copying untouched earlier siblings and shifting later ones by `delta`.
fn splice(ctx: &mut ParserContext<'_>, prev: &ParsedTree, parent_id: NodeId, child_id: NodeId, new_child: NodeId, change: &Change, delta: i64, version: u64) -> NodeId {
    let parent = prev.node(parent_id).clone();
    let change_end = change.old_end();
    let mut children = Vec::with_capacity(parent.children.len());
    for &sibling in &parent.children {
        if sibling == child_id {
            children.push(new_child);
            continue;
        }
        let sib = prev.node(sibling);
        if sib.start >= change_end {
            children.push(shift_subtree(ctx, prev, sibling, delta));
        } else {
            children.push(copy_unchanged(ctx, prev, sibling));
        }
    }
    let length = (parent.length as i64 + delta) as usize;
    ctx.tree.push(ParsedRuleNode {
        rule_id: parent.rule_id,
        is_token: parent.is_token,
        token_id: parent.token_id,
        start: parent.start,
        length,
        passed_barriers: parent.passed_barriers,
        // The parent's own span changed, so any cached value it held may
        // have been computed over the old text; dropped rather than reused.
        intermediate_value: None,
        children,
        occurrence: parent.occurrence,
        version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build;
    use crate::rule::build::BuildableRule;
    use crate::rule::build::BuildableRuleBody;
    use crate::rule::build::RuleRef;
    use crate::token::build::BuildableToken;
    use crate::token::predicate;
    use crate::token::Predicate;

    fn digit_list_parser() -> Parser {
        // `element` is a named rule (not a bare inline token) so an edit
        // contained in one list element recurses into a real rule node and
        // splices, rather than always falling back to a whole-list reparse.
        let digits = BuildableRule::new(
            "digits",
            BuildableRuleBody::Token(BuildableToken::RepeatCharacters { predicate: Predicate::new(predicate::is_digit), min: 1, max: None }),
        );
        let element = RuleRef::Alias("digits".to_string());
        let separator = RuleRef::InlineToken(BuildableToken::LiteralChar(','));
        let grammar = build::Grammar::new("list")
            .rule(BuildableRule::new(
                "list",
                BuildableRuleBody::SeparatedRepeat { element, separator, min: 1, max: None, allow_trailing: false, include_sep: false },
            ))
            .rule(digits);
        build::build(grammar, build::BuildFlags::default()).expect("builds")
    }

    #[test]
    fn splices_an_edit_contained_in_one_element() {
        let parser = digit_list_parser();
        let prev_input = "12,34,56";
        let prev = parser.parse(prev_input).expect("parses");

        let change = Change { start: 3, old_length: 2, new_length: 3 };
        let new_input = "12,789,56";
        let incremental = parser.reparse_incremental(&prev, prev_input, change, new_input).expect("reparses");
        let whole = parser.parse(new_input).expect("parses");

        let inc_texts: Vec<&str> = incremental.root_view(new_input).children().map(|c| c.text()).collect();
        let whole_texts: Vec<&str> = whole.root_view(new_input).children().map(|c| c.text()).collect();
        assert_eq!(inc_texts, whole_texts);
        assert_eq!(incremental.root_view(new_input).text(), "12,789,56");
    }

    #[test]
    fn shifts_later_siblings_without_reparsing_them() {
        let parser = digit_list_parser();
        let prev_input = "12,34,56";
        let prev = parser.parse(prev_input).expect("parses");
        let prev_last = prev.root_view(prev_input).children().last().unwrap();
        assert_eq!(prev_last.text(), "56");
        let prev_last_version = prev_last.version();

        let change = Change { start: 3, old_length: 2, new_length: 3 };
        let new_input = "12,789,56";
        let incremental = parser.reparse_incremental(&prev, prev_input, change, new_input).expect("reparses");
        let new_last = incremental.root_view(new_input).children().last().unwrap();
        assert_eq!(new_last.text(), "56");
        assert_eq!(new_last.version(), prev_last_version);
    }
}
