//! `ParserContext` (spec §3): the one mutable bundle of per-parse state.
//! Everything else in the crate — the compiled [`crate::token::TokenTable`]
//! and [`crate::rule::RuleTable`], the barrier stream — is read-only for the
//! context's lifetime (spec §5: "A compiled parser ... is immutable after
//! build and safe to share across threads. A `ParserContext` is
//! single-threaded").

use std::any::Any;

use crate::ast::TreeBuilder;
use crate::error::FurthestError;
use crate::error::RecordedError;
use crate::ids::ElementId;
use crate::ids::RuleId;
use crate::limit::WorkLimits;
use crate::rule::RuleTable;
use crate::token::TokenTable;

use super::barrier::BarrierStream;
use super::cache::MemoCache;
use super::settings::ParserSettings;

/// One entry in the walk trace (spec §4.3 step 7: "append `(rule_id,
/// position, outcome)`").
#[derive(Debug, Clone, Copy)]
pub struct WalkTraceEntry {
    pub element: ElementId,
    pub position: usize,
    pub succeeded: bool,
}

pub struct ParserContext<'a> {
    pub input: &'a str,
    pub tokens: &'a TokenTable,
    pub rules: &'a RuleTable,
    pub barriers: &'a BarrierStream,
    pub parameter: Option<&'a dyn Any>,
    pub firstsets: Option<&'a crate::build::firstset::FirstSets>,

    pub position: usize,
    pub recursion_depth: usize,
    pub passed_barriers: usize,
    /// The settings in effect for whichever rule is currently being
    /// entered; the driver saves and restores this around each call so
    /// nested overrides (spec §9: "the engine must honor the innermost
    /// override") compose correctly through ordinary call-stack nesting.
    pub settings: ParserSettings,

    pub errors: Vec<RecordedError>,
    pub furthest: FurthestError,
    /// Positions at which at least one rule succeeded (spec §3: "success
    /// bitmap ... used to filter out stale errors").
    pub success_positions: std::collections::HashSet<usize>,
    pub skipped_rules: Vec<(RuleId, usize)>,
    /// The rules currently being entered, outermost first (spec §4.6 step 6
    /// `WriteStackTrace`): snapshotted onto a [`RecordedError`] by
    /// [`ParserContext::record_error`] when the failing rule's settings ask
    /// for it.
    pub rule_stack: Vec<RuleId>,
    pub walk_trace: Vec<WalkTraceEntry>,
    pub cache: MemoCache,
    pub limits: WorkLimits,
    pub tree: TreeBuilder,
}

impl<'a> ParserContext<'a> {
    pub fn new(
        input: &'a str,
        tokens: &'a TokenTable,
        rules: &'a RuleTable,
        barriers: &'a BarrierStream,
        parameter: Option<&'a dyn Any>,
        settings: ParserSettings,
        limits: WorkLimits,
        firstsets: Option<&'a crate::build::firstset::FirstSets>,
    ) -> Self {
        Self {
            input,
            tokens,
            rules,
            barriers,
            parameter,
            firstsets,
            position: 0,
            recursion_depth: 0,
            passed_barriers: 0,
            settings,
            errors: Vec::new(),
            furthest: FurthestError::default(),
            success_positions: std::collections::HashSet::new(),
            skipped_rules: Vec::new(),
            rule_stack: Vec::new(),
            walk_trace: Vec::new(),
            cache: MemoCache::new(),
            limits,
            tree: TreeBuilder::new(),
        }
    }

    pub fn record_error(&mut self, mut error: RecordedError) {
        use super::settings::ErrorHandling;
        if self.settings.ignore_errors {
            return;
        }
        if self.settings.write_stack_trace && error.stack_trace.is_empty() {
            error.stack_trace = self.rule_stack.clone();
        }
        match self.settings.error_handling {
            ErrorHandling::NoRecord => {}
            ErrorHandling::Default | ErrorHandling::Throw => {
                self.furthest.note(error.clone());
                self.errors.push(error);
                self.cap_errors();
            }
        }
    }

    /// Keeps only the `max_recorded_errors` highest-position entries (spec
    /// §9 resolved in `SPEC_FULL.md`), dropping the lowest-position ones
    /// first once the cap is exceeded.
    fn cap_errors(&mut self) {
        let cap = self.settings.max_recorded_errors;
        if self.errors.len() <= cap {
            return;
        }
        self.errors.sort_by_key(|e| e.position);
        let drop = self.errors.len() - cap;
        self.errors.drain(0..drop);
    }

    pub fn mark_success(&mut self, position: usize) {
        self.success_positions.insert(position);
    }

    /// Errors at positions that later succeeded are stale (spec §7:
    /// "filtered by the success_positions bitmap so that positions which
    /// later succeeded are suppressed").
    pub fn live_errors(&self) -> Vec<RecordedError> {
        self.errors.iter().filter(|e| !self.success_positions.contains(&e.position)).cloned().collect()
    }
}
