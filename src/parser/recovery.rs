//! Error-recovery strategies (spec §4.5). Grounded on the teacher's
//! `Strategy`/`skip_then_retry_until`/`nested_delimiters` design in
//! `Timmmm-chumsky`'s `recovery.rs` — that crate's recovery also advances
//! past a failure and retries, but assumes chumsky's parser-combinator
//! return-a-parser style; here a strategy is plain data resolved to rule
//! references at build time (spec §4.6 step 7: "Initialize strategies that
//! hold rule ids ... by resolving to rule references"), and `recover` is a
//! free function the driver calls with its own retry/match closures, since
//! only the driver can re-enter the full per-rule dispatch pipeline.
//!
//! `recover` is generic over a context type `C` and takes it as an explicit
//! parameter to every closure call instead of letting `try_element` and
//! `retry_rule` capture it — both closures need mutable access to the
//! driver's `ParserContext`, and two closures can't each hold their own
//! exclusive borrow of it at once.

use crate::ast::NodeId;
use crate::rule::RuleElement;

#[derive(Debug, Clone)]
pub enum RecoveryStrategy {
    None,
    /// After local failure, advance one character at a time looking for
    /// `anchor`; on success, resume *after* `anchor`, re-run the rule.
    SkipAfter { anchor: RuleElement, stop: Option<RuleElement>, repeat: bool },
    /// Like `SkipAfter` but re-run the rule *before* the anchor (anchor not
    /// consumed).
    SkipUntil { anchor: RuleElement, stop: Option<RuleElement>, repeat: bool },
    /// Scan forward retrying the rule at each position; stop early if
    /// `until` matches.
    FindNext { until: Option<RuleElement> },
}

/// What the driver hands back from a recovery attempt: the recovered node
/// (marked at the position recovery found, per spec §4.5: "the recovered
/// node is marked at the originating position") plus the position to resume
/// parsing from.
pub struct Recovered {
    pub node: NodeId,
    pub resume_at: usize,
}

/// Attempts recovery after `failure_position`. `try_element(ctx, element,
/// position)` matches a `RuleElement` at a given position, returning its end
/// position on success. `retry_rule(ctx, position)` re-runs the originally
/// failing rule at a given position. Recording is suppressed during recovery
/// (spec §4.5: "error recording is suppressed (NoRecord)") — that
/// suppression is the caller's job via the settings it installs before
/// calling `recover`.
pub fn recover<C>(
    strategy: &RecoveryStrategy,
    ctx: &mut C,
    input: &str,
    barrier_limit: usize,
    failure_position: usize,
    mut try_element: impl FnMut(&mut C, RuleElement, usize) -> Option<usize>,
    mut retry_rule: impl FnMut(&mut C, usize) -> Result<NodeId, ()>,
) -> Option<Recovered> {
    let limit = barrier_limit.min(input.len());

    let advance = |pos: usize| -> Option<usize> {
        if pos >= limit {
            return None;
        }
        Some(pos + input[pos..].chars().next().map_or(1, char::len_utf8))
    };

    match strategy {
        RecoveryStrategy::None => None,
        RecoveryStrategy::SkipAfter { anchor, stop, repeat } => {
            let mut pos = failure_position;
            loop {
                if pos > limit || stop.as_ref().is_some_and(|s| try_element(ctx, *s, pos).is_some()) {
                    return None;
                }
                if let Some(end) = try_element(ctx, *anchor, pos) {
                    if let Ok(node) = retry_rule(ctx, end) {
                        return Some(Recovered { node, resume_at: end });
                    }
                    if !*repeat {
                        return None;
                    }
                    pos = end;
                    continue;
                }
                pos = advance(pos)?;
            }
        }
        RecoveryStrategy::SkipUntil { anchor, stop, repeat } => {
            let mut pos = failure_position;
            loop {
                if pos > limit || stop.as_ref().is_some_and(|s| try_element(ctx, *s, pos).is_some()) {
                    return None;
                }
                if try_element(ctx, *anchor, pos).is_some() {
                    if let Ok(node) = retry_rule(ctx, pos) {
                        return Some(Recovered { node, resume_at: pos });
                    }
                    if !*repeat {
                        return None;
                    }
                    pos = advance(pos)?;
                    continue;
                }
                pos = advance(pos)?;
            }
        }
        RecoveryStrategy::FindNext { until } => {
            let mut pos = failure_position;
            loop {
                if pos > limit || until.as_ref().is_some_and(|u| try_element(ctx, *u, pos).is_some()) {
                    return None;
                }
                if let Ok(node) = retry_rule(ctx, pos) {
                    return Some(Recovered { node, resume_at: pos });
                }
                pos = advance(pos)?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_after_resumes_past_anchor_and_retries() {
        let strategy = RecoveryStrategy::SkipAfter {
            anchor: RuleElement::Token(crate::ids::TokenId::new(0)),
            stop: None,
            repeat: true,
        };
        let input = "xxx;yyy";
        let mut retried_at = None;
        let result = recover(
            &strategy,
            &mut (),
            input,
            input.len(),
            0,
            |_ctx, _element, pos| if input.as_bytes().get(pos) == Some(&b';') { Some(pos + 1) } else { None },
            |_ctx, pos| {
                retried_at = Some(pos);
                Ok(NodeId(0))
            },
        );
        assert!(result.is_some());
        assert_eq!(retried_at, Some(4));
        assert_eq!(result.unwrap().resume_at, 4);
    }

    #[test]
    fn find_next_stops_at_until_marker() {
        let strategy = RecoveryStrategy::FindNext { until: Some(RuleElement::Token(crate::ids::TokenId::new(0))) };
        let input = "abc}def";
        let result = recover(
            &strategy,
            &mut (),
            input,
            input.len(),
            0,
            |_ctx, _element, pos| if input.as_bytes().get(pos) == Some(&b'}') { Some(pos) } else { None },
            |_ctx, _pos| Err::<NodeId, ()>(()),
        );
        assert!(result.is_none());
    }
}
