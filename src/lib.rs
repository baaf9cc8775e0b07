//! Parallel, layered breadth-first enumeration of the strings a bounded-depth
//! context-free-grammar derivation can produce, with optional recording of
//! every derivation trace that reaches each string.
//!
//! The grammar is a mapping from single-byte nonterminals to an ordered,
//! nonempty list of right-hand-side alternatives ([`grammar::Rules`]).
//! Starting from a start symbol, [`generate`] applies leftmost-nonterminal
//! rewriting in breadth-first layers for exactly `depth` rounds; sentential
//! forms with no remaining nonterminal after any round are emitted as done
//! strings. Three independent execution strategies ([`strategy`]) implement
//! the same layered-BFS contract with different synchronization shapes; the
//! [`mode::Mode`] flags passed to [`generate`] select among them.
//!
//! Sentential forms unresolved at `depth` are silently dropped. This is the
//! intended meaning of a depth bound, not a failure, and is never reported
//! as an error.

pub mod done;
pub mod error;
pub mod expand;
pub mod grammar;
pub mod mode;
pub mod queue;
pub mod result;
pub mod strategy;
pub mod trace;

use std::sync::Arc;

pub use error::GenerationError;
pub use grammar::Rules;
pub use mode::Mode;
pub use result::{GenerationResult, PlainResult};

/// Enumerates every string derivable from `mode.start` within `depth`
/// leftmost-rewrite layers, per `rules`, using the strategy `mode` selects.
///
/// Validates `rules` and `mode.start` eagerly, before any thread is
/// spawned: an invalid grammar or missing start symbol returns an `Err`
/// without side effects. `depth == 0` returns an empty result, not an
/// error. A worker-thread panic propagates via poisoned-mutex panics on the
/// caller's next access to the shared queues; `generate` does not catch or
/// mask panics.
pub fn generate(
    rules: Rules,
    depth: usize,
    mode: &Mode,
) -> Result<GenerationResult, GenerationError> {
    rules.check_start(mode.start)?;
    log::debug!(
        "generate: start={:?} depth={} nonterminals={}",
        mode.start as char,
        depth,
        rules.nonterminal_count()
    );
    mode::dispatch(Arc::new(rules), depth, mode)
}
