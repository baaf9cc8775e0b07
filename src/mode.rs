//! The strategy selector (C8): runtime mode flags in, a `GenerationResult`
//! out. `dispatch` is the only place that knows which strategy module and
//! which of the four queue policies a given combination of flags maps to.

use crate::error::GenerationError;
use crate::grammar::Rules;
use crate::queue::{AdditiveMergeQueue, ConservativeMergeQueue, DedupQueue, PlainQueue};
use crate::result::GenerationResult;
use crate::strategy::{controlled, dual, free};
use std::sync::Arc;

/// Run configuration. `Default` gives every flag false, 8 workers, and
/// start symbol `b'S'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode {
    /// Record derivation traces alongside each done string.
    pub derivation: bool,
    /// Preserve duplicate arrivals (plain: keep repeats/additive-merge
    /// traces) instead of deduping/conservative-merging them away.
    pub repetition: bool,
    /// Traced mode only: omit rewrite position from each step, keeping
    /// only `(nonterminal, alt_index)`.
    pub low_memory: bool,
    /// Prefer the dual-container strategy (no concurrent queue) over the
    /// controlled-queue strategy.
    pub fast: bool,
    /// Traced mode only: use the free-queue (self-terminating) strategy
    /// instead of controlled-queue/dual-container.
    pub derivation_fq: bool,
    /// Run the deterministic single-threaded reference variant of
    /// whichever strategy the other flags select, instead of spawning
    /// worker threads.
    pub single_threaded: bool,
    /// Worker thread count (ignored when `single_threaded`).
    pub workers: usize,
    /// Start symbol.
    pub start: u8,
}

impl Default for Mode {
    fn default() -> Self {
        Mode {
            derivation: false,
            repetition: false,
            low_memory: false,
            fast: false,
            derivation_fq: false,
            single_threaded: false,
            workers: 8,
            start: b'S',
        }
    }
}

/// Dispatches to the strategy `mode`'s flags select, and runs it to
/// completion. Only the free-queue
/// strategy can fail (an internal quiescence invariant violation, see
/// `strategy::free::run_traced`); every other strategy is infallible.
pub fn dispatch(rules: Arc<Rules>, depth: usize, mode: &Mode) -> Result<GenerationResult, GenerationError> {
    log::debug!(
        "dispatch: derivation={} repetition={} fast={} derivation_fq={} single_threaded={} workers={}",
        mode.derivation,
        mode.repetition,
        mode.fast,
        mode.derivation_fq,
        mode.single_threaded,
        mode.workers
    );

    if !mode.derivation {
        let sink = if mode.single_threaded {
            if mode.fast {
                dual::run_plain_single_threaded(&rules, mode.start, depth, mode.repetition)
            } else {
                controlled::run_plain_single_threaded(&rules, mode.start, depth, mode.repetition)
            }
        } else if mode.fast {
            dual::run_plain(rules, mode.start, depth, mode.workers.max(1), mode.repetition)
        } else if mode.repetition {
            controlled::run_plain::<PlainQueue>(rules, mode.start, depth, mode.workers.max(1), true)
        } else {
            controlled::run_plain::<DedupQueue>(rules, mode.start, depth, mode.workers.max(1), false)
        };
        return Ok(GenerationResult::Plain(sink.into_result()));
    }

    let sink = if mode.single_threaded {
        if mode.derivation_fq {
            free::run_traced_single_threaded(
                &rules,
                mode.start,
                depth,
                mode.low_memory,
                mode.repetition,
            )
        } else if mode.fast {
            dual::run_traced_single_threaded(
                &rules,
                mode.start,
                depth,
                mode.low_memory,
                mode.repetition,
            )
        } else {
            controlled::run_traced_single_threaded(
                &rules,
                mode.start,
                depth,
                mode.low_memory,
                mode.repetition,
            )
        }
    } else if mode.derivation_fq {
        free::run_traced(
            rules,
            mode.start,
            depth,
            mode.workers.max(1),
            mode.low_memory,
            mode.repetition,
        )?
    } else if mode.fast {
        dual::run_traced(
            rules,
            mode.start,
            depth,
            mode.workers.max(1),
            mode.low_memory,
            mode.repetition,
        )
    } else if mode.repetition {
        controlled::run_traced::<AdditiveMergeQueue>(
            rules,
            mode.start,
            depth,
            mode.workers.max(1),
            mode.low_memory,
            true,
        )
    } else {
        controlled::run_traced::<ConservativeMergeQueue>(
            rules,
            mode.start,
            depth,
            mode.workers.max(1),
            mode.low_memory,
            false,
        )
    };
    Ok(GenerationResult::Traced(sink.into_map()))
}
