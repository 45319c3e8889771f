//! Parse-tree post-processing (spec §4.7). Each flag is a pure, composable
//! tree-to-tree transform; `optimize` applies the requested set in one
//! bottom-up pass so the result is itself an ordinary [`ParsedTree`] (spec
//! describes "a lazy optimized view"; we materialize eagerly — a tree this
//! shape is cheap to rebuild and callers that want laziness can defer
//! calling `optimize` until traversal, which has the same effect for a
//! single pass).

use super::NodeId;
use super::ParsedRuleNode;
use super::ParsedTree;
use super::TreeBuilder;
use crate::rule::RuleTable;
use crate::token::TokenPattern;
use crate::token::TokenTable;

/// Tree-optimization flags (spec §4.7). A small hand-rolled bitset: five
/// flags don't warrant a dependency, unlike the combinator/selector closures
/// elsewhere in the crate that genuinely need dynamic dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizeFlags(u32);

impl OptimizeFlags {
    pub const NONE: OptimizeFlags = OptimizeFlags(0);
    pub const REMOVE_EMPTY_NODES: OptimizeFlags = OptimizeFlags(1 << 0);
    pub const REMOVE_WHITESPACE_NODES: OptimizeFlags = OptimizeFlags(1 << 1);
    pub const REMOVE_PURE_LITERALS: OptimizeFlags = OptimizeFlags(1 << 2);
    pub const MERGE_SINGLE_CHILD: OptimizeFlags = OptimizeFlags(1 << 3);
    pub const TRIM_SPANS: OptimizeFlags = OptimizeFlags(1 << 4);

    /// `RemoveEmptyOrWhitespaceNodes | MergeSingleChildRules | TrimSpans`
    /// (spec §4.7 "Default preset").
    pub const DEFAULT: OptimizeFlags = OptimizeFlags(
        Self::REMOVE_EMPTY_NODES.0 | Self::REMOVE_WHITESPACE_NODES.0 | Self::MERGE_SINGLE_CHILD.0 | Self::TRIM_SPANS.0,
    );

    pub const fn contains(self, other: OptimizeFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for OptimizeFlags {
    type Output = OptimizeFlags;

    fn bitor(self, rhs: OptimizeFlags) -> OptimizeFlags {
        OptimizeFlags(self.0 | rhs.0)
    }
}

fn is_whitespace_only(text: &str) -> bool {
    !text.is_empty() && text.chars().all(char::is_whitespace)
}

fn is_pure_literal(node: &ParsedRuleNode, tokens: &TokenTable) -> bool {
    match node.token_id {
        Some(id) => matches!(tokens.get(id), TokenPattern::Literal(..) | TokenPattern::LiteralChar(_)),
        None => false,
    }
}

pub fn optimize(tree: &ParsedTree, input: &str, flags: OptimizeFlags, rules: &RuleTable, tokens: &TokenTable) -> ParsedTree {
    let mut builder = TreeBuilder::new();
    let new_root = rebuild(tree, tree.root, input, flags, rules, tokens, &mut builder);
    let root = new_root.unwrap_or_else(|| builder.push(tree.node(tree.root).clone()));
    builder.finish(root, tree.version)
}

fn rebuild(
    tree: &ParsedTree,
    id: NodeId,
    input: &str,
    flags: OptimizeFlags,
    rules: &RuleTable,
    tokens: &TokenTable,
    builder: &mut TreeBuilder,
) -> Option<NodeId> {
    let node = tree.node(id);
    let _ = rules;

    if node.length == 0 && node.children.is_empty() && flags.contains(OptimizeFlags::REMOVE_EMPTY_NODES) {
        return None;
    }
    if flags.contains(OptimizeFlags::REMOVE_WHITESPACE_NODES) && is_whitespace_only(&input[node.start..node.end()]) {
        return None;
    }
    if flags.contains(OptimizeFlags::REMOVE_PURE_LITERALS) && is_pure_literal(node, tokens) {
        return None;
    }

    let new_children: Vec<NodeId> = node
        .children
        .iter()
        .filter_map(|&child| rebuild(tree, child, input, flags, rules, tokens, builder))
        .collect();

    if flags.contains(OptimizeFlags::MERGE_SINGLE_CHILD) && !node.is_token && new_children.len() == 1 {
        return Some(new_children[0]);
    }

    let (mut start, mut length) = (node.start, node.length);
    if flags.contains(OptimizeFlags::TRIM_SPANS) {
        let text = &input[start..start + length];
        let trimmed_start = text.len() - text.trim_start().len();
        let trimmed_end = text.len() - text.trim_end().len();
        start += trimmed_start;
        length = length.saturating_sub(trimmed_start + trimmed_end);
    }

    Some(builder.push(ParsedRuleNode {
        rule_id: node.rule_id,
        is_token: node.is_token,
        token_id: node.token_id,
        start,
        length,
        passed_barriers: node.passed_barriers,
        intermediate_value: node.intermediate_value.clone(),
        children: new_children,
        occurrence: node.occurrence,
        version: node.version,
    }))
}
