//! The parsed-rule tree (spec §3 "Parsed rule (AST node)") and the
//! lazy/light facade over it.
//!
//! The tree is an arena (`Vec<ParsedRuleNode>` addressed by [`NodeId`]), not
//! an owned-child tree, so incremental reparse (spec §4.8) can splice
//! subtrees by index without rebuilding parent chains, and so a `NodeView`
//! can be `Copy` (an index plus two borrows). `NodeView` mirrors the
//! teacher's [`CstNode`]-style "zero runtime cost" typed wrapper, generalized
//! from per-grammar generated types (GraphQL's `Document`, `Field`, ...) to
//! one generic view keyed on `rule_id`, since rule shapes are data here, not
//! compiler-generated types.

pub mod optimize;

use crate::ids::RuleId;
use crate::ids::TokenId;
use crate::value::IntermediateValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single AST node (spec §3: `{ rule_id, is_token, token_id?, start,
/// length, passed_barriers, intermediate_value?, children?, occurrence?,
/// version }`).
#[derive(Debug, Clone)]
pub struct ParsedRuleNode {
    pub rule_id: RuleId,
    pub is_token: bool,
    pub token_id: Option<TokenId>,
    pub start: usize,
    pub length: usize,
    pub passed_barriers: usize,
    pub intermediate_value: Option<IntermediateValue>,
    pub children: Vec<NodeId>,
    pub occurrence: Option<usize>,
    pub version: u64,
}

impl ParsedRuleNode {
    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

/// The arena backing a parse result (spec §3 invariant 5: "a parse either
/// yields a single `ParsedRule` tree ... or reports failure").
#[derive(Debug, Clone)]
pub struct ParsedTree {
    pub(crate) nodes: Vec<ParsedRuleNode>,
    pub root: NodeId,
    pub version: u64,
}

impl ParsedTree {
    pub fn node(&self, id: NodeId) -> &ParsedRuleNode {
        &self.nodes[id.index()]
    }

    pub fn root_view<'a>(&'a self, input: &'a str) -> NodeView<'a> {
        NodeView { tree: self, input, id: self.root }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Builds a [`ParsedTree`] bottom-up; the driver allocates nodes as rules
/// succeed, so a node's children are always allocated before the node
/// itself (their [`NodeId`]s are already known).
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<ParsedRuleNode>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: ParsedRuleNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Reads back a node pushed earlier in the same build, e.g. so the
    /// driver can inspect a just-matched skip-rule node's end position
    /// before deciding to discard it.
    pub fn get(&self, id: NodeId) -> &ParsedRuleNode {
        &self.nodes[id.index()]
    }

    /// Patches a previously-pushed node's `occurrence` field (spec §3: "for
    /// repeaters, the element's index") after the fact, since the index
    /// within a repetition is only known once the whole repetition has run.
    pub fn set_occurrence(&mut self, id: NodeId, occurrence: usize) {
        self.nodes[id.index()].occurrence = Some(occurrence);
    }

    /// Patches a previously-pushed node's `version` field (spec §4.8: "every
    /// node touched gets `version = root.version + 1`"), for subtrees
    /// produced by a fresh match that has no notion of incremental-reparse
    /// versioning on its own.
    pub fn set_version(&mut self, id: NodeId, version: u64) {
        self.nodes[id.index()].version = version;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn finish(self, root: NodeId, version: u64) -> ParsedTree {
        ParsedTree { nodes: self.nodes, root, version }
    }
}

/// Per-rule data the facade needs that isn't carried on the node itself:
/// the optional value factory (spec §9: "invoked lazily during tree
/// traversal, not during parse").
pub trait RuleFacts {
    fn value_factory(&self, rule_id: RuleId) -> Option<&crate::rule::ValueFactory>;
}

/// A borrowed, zero-cost view of one node plus enough context (`input`) to
/// derive its text and (if a value factory is registered) its user value.
#[derive(Clone, Copy)]
pub struct NodeView<'a> {
    tree: &'a ParsedTree,
    input: &'a str,
    id: NodeId,
}

impl<'a> NodeView<'a> {
    pub fn node(&self) -> &'a ParsedRuleNode {
        self.tree.node(self.id)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn rule_id(&self) -> RuleId {
        self.node().rule_id
    }

    pub fn is_token(&self) -> bool {
        self.node().is_token
    }

    pub fn token_id(&self) -> Option<TokenId> {
        self.node().token_id
    }

    /// The exact source text this node spans.
    pub fn text(&self) -> &'a str {
        let node = self.node();
        &self.input[node.start..node.end()]
    }

    pub fn start(&self) -> usize {
        self.node().start
    }

    pub fn length(&self) -> usize {
        self.node().length
    }

    pub fn passed_barriers(&self) -> usize {
        self.node().passed_barriers
    }

    pub fn occurrence(&self) -> Option<usize> {
        self.node().occurrence
    }

    pub fn version(&self) -> u64 {
        self.node().version
    }

    /// The intermediate value computed during matching, if any was kept
    /// (spec's `use_light_ast` drops this to save allocations; see
    /// `crate::parser::settings`).
    pub fn value(&self) -> Option<&'a IntermediateValue> {
        self.node().intermediate_value.as_ref()
    }

    pub fn children(&self) -> impl Iterator<Item = NodeView<'a>> + 'a {
        let tree = self.tree;
        let input = self.input;
        self.node().children.iter().map(move |&id| NodeView { tree, input, id })
    }

    pub fn child(&self, index: usize) -> Option<NodeView<'a>> {
        self.node().children.get(index).map(|&id| NodeView { tree: self.tree, input: self.input, id })
    }

    /// Invokes this node's rule's value factory, if registered (spec §9).
    /// Lazy: nothing runs during the parse itself.
    pub fn user_value(&self, facts: &impl RuleFacts) -> Option<IntermediateValue> {
        facts.value_factory(self.rule_id()).map(|factory| factory.call(*self))
    }
}

/// Eagerly runs every node's value factory and stores the result back onto
/// `intermediate_value`, for `ParserSettings::use_lazy_ast = false` (spec §3:
/// "the engine may instead materialize the whole AST eagerly"). `user_value`
/// remains the lazy default; this just forces it for every node up front so
/// a caller touring the tree afterwards never invokes a factory itself.
pub fn materialize_user_values(tree: &mut ParsedTree, input: &str, facts: &impl RuleFacts) {
    let mut updates = Vec::new();
    for index in 0..tree.nodes.len() {
        let view = NodeView { tree: &*tree, input, id: NodeId(index as u32) };
        if let Some(value) = view.user_value(facts) {
            updates.push((index, value));
        }
    }
    for (index, value) in updates {
        tree.nodes[index].intermediate_value = Some(value);
    }
}
