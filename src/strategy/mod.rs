//! The three BFS strategies (C5/C6/C7) and the sinks they share for
//! building a final result. `controlled.rs`'s multithreaded runs route the
//! done-queue through a dedicated [`crate::done`] collector thread and wrap
//! its output back into these sinks. The other paths build a sink directly
//! instead: every single-threaded reference variant and the dual-container
//! strategy's per-round merge have no separate done-queue at all, and the
//! free-queue strategy's done-queue carries layer-tagged items rather than
//! bare `TracedSf`, so it isn't the shape `crate::done`'s collectors accept.

pub mod controlled;
pub mod dual;
pub mod free;

use crate::grammar::{PlainSf, TracedSf};
use crate::result::PlainResult;
use crate::trace::Trace;
use fnv::{FnvHashMap, FnvHashSet};

/// Accumulates plain (untraced) done strings directly, honoring the
/// `repetition` flag, without routing through a queue-backed collector
/// thread.
pub struct PlainSink {
    repetition: bool,
    sequence: Vec<PlainSf>,
    set: FnvHashSet<PlainSf>,
}

impl PlainSink {
    pub fn new(repetition: bool) -> Self {
        PlainSink {
            repetition,
            sequence: Vec::new(),
            set: FnvHashSet::default(),
        }
    }

    pub fn push(&mut self, v: PlainSf) {
        if self.repetition {
            self.sequence.push(v);
        } else {
            self.set.insert(v);
        }
    }

    pub fn extend(&mut self, other: PlainSink) {
        if self.repetition {
            self.sequence.extend(other.sequence);
        } else {
            self.set.extend(other.set);
        }
    }

    pub fn into_result(self) -> PlainResult {
        if self.repetition {
            PlainResult::Sequence(self.sequence)
        } else {
            PlainResult::Set(self.set)
        }
    }

    /// Wraps a result already assembled by [`crate::done::spawn_plain_collector`]
    /// back into a `PlainSink`, so strategies that do route through the
    /// dedicated collector thread can still return the same sink type as
    /// their single-threaded counterparts.
    pub fn from_result(result: PlainResult) -> Self {
        match result {
            PlainResult::Sequence(sequence) => PlainSink {
                repetition: true,
                sequence,
                set: FnvHashSet::default(),
            },
            PlainResult::Set(set) => PlainSink {
                repetition: false,
                sequence: Vec::new(),
                set,
            },
        }
    }
}

/// Accumulates traced done strings directly, honoring the `repetition`
/// flag (additive merge) vs its absence (conservative merge, first
/// arrival wins).
pub struct TracedSink {
    repetition: bool,
    map: FnvHashMap<PlainSf, Vec<Trace>>,
}

impl TracedSink {
    pub fn new(repetition: bool) -> Self {
        TracedSink {
            repetition,
            map: FnvHashMap::default(),
        }
    }

    pub fn push(&mut self, sf: TracedSf) {
        if self.repetition {
            self.map.entry(sf.string).or_default().extend(sf.traces);
        } else {
            self.map.entry(sf.string).or_insert(sf.traces);
        }
    }

    pub fn into_map(self) -> FnvHashMap<PlainSf, Vec<Trace>> {
        self.map
    }

    /// Wraps a map already assembled by [`crate::done::spawn_traced_collector`]
    /// back into a `TracedSink`. `repetition` only matters for subsequent
    /// `push` calls; the map itself is already final.
    pub fn from_map(repetition: bool, map: FnvHashMap<PlainSf, Vec<Trace>>) -> Self {
        TracedSink { repetition, map }
    }
}
