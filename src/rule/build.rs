//! The authoring-facing mirror of [`super::ParserRule`], parallel to
//! [`crate::token::build::BuildableToken`] (spec §4.6 step 1).

use super::ChoiceMode;
use super::CustomMatchFn;
use super::RuleMeta;
use crate::parser::recovery::RecoveryStrategy;
use crate::parser::settings::SettingsOverride;
use crate::token::build::BuildableToken;
use crate::token::ParamFn;

/// A reference to a rule child: another named rule, an inline token, or an
/// inline nested rule.
#[derive(Clone)]
pub enum RuleRef {
    Alias(String),
    InlineToken(BuildableToken),
    InlineRule(Box<BuildableRule>),
}

impl From<&str> for RuleRef {
    fn from(alias: &str) -> Self {
        RuleRef::Alias(alias.to_string())
    }
}

#[derive(Clone)]
pub enum BuildableRuleBody {
    Sequence(Vec<RuleRef>),
    Choice(ChoiceMode, Vec<RuleRef>),
    Optional(RuleRef),
    Repeat { child: RuleRef, min: usize, max: Option<usize> },
    SeparatedRepeat { element: RuleRef, separator: RuleRef, min: usize, max: Option<usize>, allow_trailing: bool, include_sep: bool },
    Lookahead { child: RuleRef, positive: bool },
    Token(BuildableToken),
    Custom(CustomMatchFn),
    Switch { selector: ParamFn<i64>, branches: Vec<RuleRef>, default: Option<RuleRef> },
    If { predicate: ParamFn<bool>, then_branch: RuleRef, else_branch: Option<RuleRef> },
}

/// A named (or anonymous, if only ever referenced inline) rule description
/// awaiting canonicalization.
#[derive(Clone)]
pub struct BuildableRule {
    pub name: Option<String>,
    pub body: BuildableRuleBody,
    pub value_factory: Option<super::ValueFactory>,
    pub settings_override: Option<SettingsOverride>,
    pub recovery: Option<RecoveryStrategy>,
    pub memoize: bool,
    pub aliases: Vec<String>,
}

impl BuildableRule {
    pub fn new(name: impl Into<String>, body: BuildableRuleBody) -> Self {
        Self {
            name: Some(name.into()),
            body,
            value_factory: None,
            settings_override: None,
            recovery: None,
            memoize: false,
            aliases: Vec::new(),
        }
    }

    pub fn into_meta(self) -> RuleMeta {
        RuleMeta {
            aliases: self.aliases,
            value_factory: self.value_factory,
            settings_override: self.settings_override,
            recovery: self.recovery,
            memoize: self.memoize,
        }
    }
}
