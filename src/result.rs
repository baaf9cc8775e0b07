//! Result containers returned by [`crate::generate`].

use crate::grammar::PlainSf;
use crate::trace::Trace;
use fnv::{FnvHashMap, FnvHashSet};

/// The result of a plain (untraced) run: a sequence if `repetition` was
/// requested (duplicates preserved, order is nondeterministic across
/// workers but each worker's own emission order is preserved), or a set
/// otherwise.
#[derive(Debug)]
pub enum PlainResult {
    Sequence(Vec<PlainSf>),
    Set(FnvHashSet<PlainSf>),
}

impl PlainResult {
    /// Number of strings in the result (counting repeats in sequence mode).
    pub fn len(&self) -> usize {
        match self {
            PlainResult::Sequence(v) => v.len(),
            PlainResult::Set(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if `s` occurs at least once in the result.
    pub fn contains(&self, s: &[u8]) -> bool {
        match self {
            PlainResult::Sequence(v) => v.iter().any(|x| x == s),
            PlainResult::Set(set) => set.contains(s),
        }
    }

    /// The distinct strings in the result, regardless of mode.
    pub fn distinct_strings(&self) -> FnvHashSet<PlainSf> {
        match self {
            PlainResult::Sequence(v) => v.iter().cloned().collect(),
            PlainResult::Set(s) => s.clone(),
        }
    }
}

/// The top-level result of [`crate::generate`].
#[derive(Debug)]
pub enum GenerationResult {
    Plain(PlainResult),
    Traced(FnvHashMap<PlainSf, Vec<Trace>>),
}

impl GenerationResult {
    pub fn unwrap_plain(self) -> PlainResult {
        match self {
            GenerationResult::Plain(p) => p,
            GenerationResult::Traced(_) => panic!("called unwrap_plain on a traced result"),
        }
    }

    pub fn unwrap_traced(self) -> FnvHashMap<PlainSf, Vec<Trace>> {
        match self {
            GenerationResult::Traced(t) => t,
            GenerationResult::Plain(_) => panic!("called unwrap_traced on a plain result"),
        }
    }
}
