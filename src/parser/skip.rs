//! Skip-strategy application (spec §4.4). Interleaves a "skip rule"
//! (whitespace/comments) around a target match. Generic over a caller
//! context `C` (in practice [`super::context::ParserContext`]) threaded
//! explicitly through every closure call rather than captured, since the
//! skip and target closures both need mutable access to it and can't each
//! capture it by reference at the same time.

use super::settings::SkippingStrategy;

fn run_skip_once<C>(ctx: &mut C, position: usize, skip: &mut impl FnMut(&mut C, usize) -> Option<usize>) -> usize {
    skip(ctx, position).unwrap_or(position)
}

fn run_skip_greedy<C>(ctx: &mut C, mut position: usize, skip: &mut impl FnMut(&mut C, usize) -> Option<usize>) -> usize {
    loop {
        match skip(ctx, position) {
            Some(next) if next > position => position = next,
            _ => return position,
        }
    }
}

/// Applies `strategy` around a `target` match attempt. `skip(ctx, position)
/// -> Some(new_position)` runs the skip rule once at `position` (`None` on
/// failure or if there is no skip rule); `target(ctx, position) ->
/// Result<T, ()>` runs the rule proper. Skip strategies never advance past a
/// barrier (spec §4.4) — enforced by `skip` itself, the same way any other
/// rule/token match is capped at its barrier.
pub fn apply<C, T>(
    strategy: SkippingStrategy,
    ctx: &mut C,
    position: usize,
    mut skip: impl FnMut(&mut C, usize) -> Option<usize>,
    mut target: impl FnMut(&mut C, usize) -> Result<T, ()>,
) -> Result<T, ()> {
    match strategy {
        SkippingStrategy::None => target(ctx, position),
        SkippingStrategy::SkipBefore => {
            let at = run_skip_once(ctx, position, &mut skip);
            target(ctx, at)
        }
        SkippingStrategy::SkipBeforeLazy => {
            let mut at = run_skip_once(ctx, position, &mut skip);
            loop {
                if let Ok(value) = target(ctx, at) {
                    return Ok(value);
                }
                let next = run_skip_once(ctx, at, &mut skip);
                if next == at {
                    return Err(());
                }
                at = next;
            }
        }
        SkippingStrategy::SkipBeforeGreedy => {
            let at = run_skip_greedy(ctx, position, &mut skip);
            target(ctx, at)
        }
        SkippingStrategy::TryParseThenSkip => {
            if let Ok(value) = target(ctx, position) {
                return Ok(value);
            }
            let at = run_skip_once(ctx, position, &mut skip);
            target(ctx, at)
        }
        SkippingStrategy::TryParseThenSkipLazy => {
            let mut at = position;
            loop {
                if let Ok(value) = target(ctx, at) {
                    return Ok(value);
                }
                let next = run_skip_once(ctx, at, &mut skip);
                // Open question resolved (spec §9 item 1): a zero-length
                // skip counts as "no progress" and ends the loop rather than
                // spinning forever.
                if next == at {
                    return Err(());
                }
                at = next;
            }
        }
        SkippingStrategy::TryParseThenSkipGreedy => {
            if let Ok(value) = target(ctx, position) {
                return Ok(value);
            }
            let at = run_skip_greedy(ctx, position, &mut skip);
            target(ctx, at)
        }
    }
}
