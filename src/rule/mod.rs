//! Composite matchers over rules and tokens (spec §3 "ParserRule", §4.2).
//!
//! [`ParserRule`] mirrors [`crate::token::TokenPattern`]'s combinator
//! variants almost one for one (the spec calls this out explicitly: "parallel
//! the token combinators"), generalized over [`RuleElement`] children instead
//! of bare [`TokenId`]s so a rule can compose both rules and tokens, and adds
//! structure-building: every successful rule match allocates an
//! [`crate::ast::ParsedRuleNode`], where a token match only ever produces a
//! span.

pub mod build;

use std::fmt;
use std::sync::Arc;

use crate::ast::NodeView;
use crate::ids::RuleId;
use crate::ids::TokenId;
use crate::value::IntermediateValue;

/// A rule's child: either another rule, or a leaf token wrapped to become a
/// rule node (spec §3: "Token-wrapper" variant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleElement {
    Rule(RuleId),
    Token(TokenId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChoiceMode {
    First,
    Longest,
    Shortest,
}

/// A user value derived from a finished node (spec §9: "Each rule may carry
/// an optional `parsed_value -> user_value` function ... invoked lazily
/// during tree traversal, not during parse, and must be pure").
#[derive(Clone)]
pub struct ValueFactory(Arc<dyn for<'a> Fn(NodeView<'a>) -> IntermediateValue + Send + Sync>);

impl ValueFactory {
    pub fn new(f: impl for<'a> Fn(NodeView<'a>) -> IntermediateValue + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call<'a>(&self, view: NodeView<'a>) -> IntermediateValue {
        (self.0)(view)
    }
}

impl fmt::Debug for ValueFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueFactory(..)")
    }
}

/// The user-supplied match procedure backing `Custom` (spec §9: "the single
/// extension point"). Given the same inputs a token's `match` would see,
/// plus the rule's own id so it can allocate a node the same way built-in
/// variants do.
pub type CustomMatchFn = Arc<dyn Fn(&mut crate::parser::context::ParserContext<'_>, RuleId) -> Result<crate::ast::NodeId, ()> + Send + Sync>;

/// Closed set of rule combinators (spec §3 table). Unlike
/// [`crate::token::TokenPattern`], variants here don't carry their own
/// match-time value-function payloads for param-based dispatch separately —
/// `Switch`/`If` reuse [`crate::token::ParamFn`] since the contract
/// (`selector(parser_parameter) -> int`) is identical at both levels.
#[derive(Clone)]
pub enum ParserRule {
    Sequence(Vec<RuleElement>),
    Choice(ChoiceMode, Vec<RuleElement>),
    Optional(RuleElement),
    Repeat { child: RuleElement, min: usize, max: Option<usize> },
    SeparatedRepeat { element: RuleElement, separator: RuleElement, min: usize, max: Option<usize>, allow_trailing: bool, include_sep: bool },
    Lookahead { child: RuleElement, positive: bool },
    /// Wraps a bare token as a rule node (spec §3 "Token-wrapper").
    Token(TokenId),
    Custom(CustomMatchFn),
    Switch { selector: crate::token::ParamFn<i64>, branches: Vec<RuleElement>, default: Option<RuleElement> },
    If { predicate: crate::token::ParamFn<bool>, then_branch: RuleElement, else_branch: Option<RuleElement> },
}

impl fmt::Debug for ParserRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParserRule::Sequence(c) => f.debug_tuple("Sequence").field(c).finish(),
            ParserRule::Choice(m, c) => f.debug_tuple("Choice").field(m).field(c).finish(),
            ParserRule::Optional(c) => f.debug_tuple("Optional").field(c).finish(),
            ParserRule::Repeat { child, min, max } => f.debug_struct("Repeat").field("child", child).field("min", min).field("max", max).finish(),
            ParserRule::SeparatedRepeat { element, separator, min, max, allow_trailing, include_sep } => f
                .debug_struct("SeparatedRepeat")
                .field("element", element)
                .field("separator", separator)
                .field("min", min)
                .field("max", max)
                .field("allow_trailing", allow_trailing)
                .field("include_sep", include_sep)
                .finish(),
            ParserRule::Lookahead { child, positive } => f.debug_struct("Lookahead").field("child", child).field("positive", positive).finish(),
            ParserRule::Token(id) => f.debug_tuple("Token").field(id).finish(),
            ParserRule::Custom(_) => write!(f, "Custom(..)"),
            ParserRule::Switch { branches, default, .. } => f.debug_struct("Switch").field("branches", branches).field("default", default).finish(),
            ParserRule::If { then_branch, else_branch, .. } => f.debug_struct("If").field("then_branch", then_branch).field("else_branch", else_branch).finish(),
        }
    }
}

/// Per-rule metadata carried alongside the combinator body (spec §3:
/// "Carries an id, alias list, optional value-factory, per-rule settings
/// override, optional error-recovery strategy").
#[derive(Clone, Default)]
pub struct RuleMeta {
    pub aliases: Vec<String>,
    pub value_factory: Option<ValueFactory>,
    pub settings_override: Option<crate::parser::settings::SettingsOverride>,
    pub recovery: Option<crate::parser::recovery::RecoveryStrategy>,
    pub memoize: bool,
}

impl fmt::Debug for RuleMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleMeta")
            .field("aliases", &self.aliases)
            .field("has_value_factory", &self.value_factory.is_some())
            .field("settings_override", &self.settings_override)
            .field("memoize", &self.memoize)
            .finish()
    }
}

/// Indexed, immutable table of compiled rules (spec §3 invariant 1).
#[derive(Debug, Default)]
pub struct RuleTable {
    bodies: Vec<ParserRule>,
    meta: Vec<RuleMeta>,
}

impl RuleTable {
    pub fn new(entries: Vec<(ParserRule, RuleMeta)>) -> Self {
        let (bodies, meta) = entries.into_iter().unzip();
        Self { bodies, meta }
    }

    pub fn body(&self, id: RuleId) -> &ParserRule {
        &self.bodies[id.index()]
    }

    pub fn meta(&self, id: RuleId) -> &RuleMeta {
        &self.meta[id.index()]
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

impl crate::ast::RuleFacts for RuleTable {
    fn value_factory(&self, rule_id: RuleId) -> Option<&ValueFactory> {
        self.meta(rule_id).value_factory.as_ref()
    }
}
