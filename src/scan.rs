//! Scanning mode (spec §4.9): exposes a compiled grammar as a "structured
//! regex" by retrying one rule at successive input positions instead of
//! requiring it to match the whole input from position 0.
//!
//! Grounded on the teacher's `Lexer`, which likewise advances one input
//! position at a time and restarts its token match on failure rather than
//! backtracking the whole file — generalized here from lexing (always
//! succeeds, every byte belongs to some token) to rule scanning (a position
//! may simply have no match, and the caller decides how far a hit advances).

use std::any::Any;

use crate::ast::ParsedTree;
use crate::ids::RuleId;
use crate::limit::WorkLimits;
use crate::parser::barrier::BarrierStream;
use crate::parser::context::ParserContext;
use crate::parser::driver::enter_rule;
use crate::parser::driver::Parser;
use crate::parser::settings::ParserSettings;

/// Per-scan knobs, mirroring [`crate::parser::ParseOptions`] plus the
/// overlap switch spec §4.9 calls out ("advance ... to end-of-match, or by 1
/// if overlap permitted").
#[derive(Default)]
pub struct ScanOptions<'a> {
    pub parameter: Option<&'a dyn Any>,
    pub settings: Option<ParserSettings>,
    pub limits: Option<WorkLimits>,
    /// When `true`, a successful match only advances the scan cursor by one
    /// character, so overlapping matches starting inside a previous hit are
    /// still found. When `false` (the default), the cursor jumps to the end
    /// of the match.
    pub overlap: bool,
}

impl Parser {
    /// Finds every match of `rule` in `input`, scanning forward one
    /// character at a time past positions where it fails.
    pub fn find_all_matches<'p, 'i>(&'p self, rule: RuleId, input: &'i str, opts: ScanOptions<'i>) -> ScanIter<'p, 'i> {
        ScanIter {
            parser: self,
            rule,
            input,
            position: 0,
            overlap: opts.overlap,
            parameter: opts.parameter,
            settings: opts.settings.unwrap_or_default(),
            limits: opts.limits.unwrap_or_default(),
        }
    }
}

/// Lazy sequence of matches (spec §6: "`find_all_matches(...) -> lazy
/// sequence of ParsedRule`"). Each item is a standalone [`ParsedTree`]
/// rooted at wherever the match started; positions are not normalized back
/// to zero.
pub struct ScanIter<'p, 'i> {
    parser: &'p Parser,
    rule: RuleId,
    input: &'i str,
    position: usize,
    overlap: bool,
    parameter: Option<&'i dyn Any>,
    settings: ParserSettings,
    limits: WorkLimits,
}

impl<'p, 'i> Iterator for ScanIter<'p, 'i> {
    type Item = ParsedTree;

    fn next(&mut self) -> Option<ParsedTree> {
        let barriers = BarrierStream::empty();
        while self.position <= self.input.len() {
            if !self.input.is_char_boundary(self.position) {
                self.position += 1;
                continue;
            }
            let mut ctx = ParserContext::new(
                self.input,
                &self.parser.tokens,
                &self.parser.rules,
                &barriers,
                self.parameter,
                self.settings.clone(),
                self.limits,
                self.parser.firstsets.as_deref(),
            );
            match enter_rule(&mut ctx, self.rule, self.position) {
                Ok(root) => {
                    let tree = ctx.tree.finish(root, 0);
                    let end = tree.node(root).end();
                    self.position = if self.overlap { self.position + 1 } else { end.max(self.position + 1) };
                    return Some(tree);
                }
                Err(()) => {
                    self.position += 1;
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build;
    use crate::rule::build::BuildableRule;
    use crate::rule::build::BuildableRuleBody;
    use crate::token::build::BuildableToken;

    #[test]
    fn finds_non_overlapping_matches_by_default() {
        let grammar = build::Grammar::new("num").rule(BuildableRule::new(
            "num",
            BuildableRuleBody::Token(BuildableToken::RepeatCharacters {
                predicate: crate::token::Predicate::new(crate::token::predicate::is_digit),
                min: 1,
                max: None,
            }),
        ));
        let parser = build::build(grammar, build::BuildFlags::default()).expect("builds");
        let rule = parser.rule_by_alias("num").unwrap();
        let matches: Vec<_> = parser.find_all_matches(rule, "12 ab 34 56", ScanOptions::default()).collect();
        let texts: Vec<&str> = matches.iter().map(|m| m.root_view("12 ab 34 56").text()).collect();
        assert_eq!(texts, vec!["12", "34", "56"]);
    }
}
