//! `ParserSettings` (spec §3) and the per-rule override that composes onto
//! it. Settings are inherited down the call tree with per-rule overrides
//! "the engine must honor the innermost override for child dispatch" (spec
//! §9), so [`SettingsOverride`] is a sparse patch applied by
//! [`ParserSettings::apply`], not a full replacement.

use crate::ids::RuleId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkippingStrategy {
    None,
    SkipBefore,
    SkipBeforeLazy,
    SkipBeforeGreedy,
    TryParseThenSkip,
    TryParseThenSkipLazy,
    TryParseThenSkipGreedy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorHandling {
    Default,
    NoRecord,
    Throw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DisplayFlags {
    pub extended: bool,
    pub rules: bool,
    pub messages: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ParserSettings {
    pub skipping_strategy: SkippingStrategy,
    pub skip_rule: Option<RuleId>,
    pub error_handling: ErrorHandling,
    pub display: DisplayFlags,
    pub memoize: bool,
    pub record_walk_trace: bool,
    pub record_skipped_rules: bool,
    pub write_stack_trace: bool,
    pub use_lazy_ast: bool,
    pub use_light_ast: bool,
    pub ignore_errors: bool,
    /// Caps the recorded-error log; the lowest-position entries are dropped
    /// first once the cap is exceeded (spec §9 open point, resolved in
    /// `SPEC_FULL.md`: "the cap is a `ParserSettings` field ... default 10").
    pub max_recorded_errors: usize,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            skipping_strategy: SkippingStrategy::None,
            skip_rule: None,
            error_handling: ErrorHandling::Default,
            display: DisplayFlags::default(),
            memoize: false,
            record_walk_trace: false,
            record_skipped_rules: false,
            write_stack_trace: false,
            use_lazy_ast: true,
            use_light_ast: false,
            ignore_errors: false,
            max_recorded_errors: 10,
        }
    }
}

/// A sparse per-rule patch (spec §3: "per-rule overrides"). `None` fields
/// inherit the parent's value unchanged.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverride {
    pub skipping_strategy: Option<SkippingStrategy>,
    pub skip_rule: Option<RuleId>,
    pub error_handling: Option<ErrorHandling>,
    pub memoize: Option<bool>,
    pub record_walk_trace: Option<bool>,
    pub record_skipped_rules: Option<bool>,
    pub write_stack_trace: Option<bool>,
    pub use_lazy_ast: Option<bool>,
    pub use_light_ast: Option<bool>,
    pub ignore_errors: Option<bool>,
    pub max_recorded_errors: Option<usize>,
}

impl ParserSettings {
    /// Applies `patch` over `self`, returning the child-call settings (spec
    /// §4.3 step 2: "produce the local settings and child_settings").
    pub fn apply(&self, patch: &SettingsOverride) -> ParserSettings {
        ParserSettings {
            skipping_strategy: patch.skipping_strategy.unwrap_or(self.skipping_strategy),
            skip_rule: patch.skip_rule.or(self.skip_rule),
            error_handling: patch.error_handling.unwrap_or(self.error_handling),
            display: self.display,
            memoize: patch.memoize.unwrap_or(self.memoize),
            record_walk_trace: patch.record_walk_trace.unwrap_or(self.record_walk_trace),
            record_skipped_rules: patch.record_skipped_rules.unwrap_or(self.record_skipped_rules),
            write_stack_trace: patch.write_stack_trace.unwrap_or(self.write_stack_trace),
            use_lazy_ast: patch.use_lazy_ast.unwrap_or(self.use_lazy_ast),
            use_light_ast: patch.use_light_ast.unwrap_or(self.use_light_ast),
            ignore_errors: patch.ignore_errors.unwrap_or(self.ignore_errors),
            max_recorded_errors: patch.max_recorded_errors.unwrap_or(self.max_recorded_errors),
        }
    }
}
