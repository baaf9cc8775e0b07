//! The done collector (C3): a dedicated thread that drains a done-queue
//! into the final result container, so worker threads never contend on
//! that container directly.
//!
//! The done queue is just another [`WorkQueue`] instance, usually of the
//! dedup/merge policy matching the run's mode (so in-flight duplicates are
//! already collapsed before they reach this thread); the final container
//! built here is what actually guarantees the no-repetition/union
//! invariants end to end, since it is the only place that lives for the
//! whole run and is never emptied mid-flight the way a live work-queue
//! policy's membership set is.

use crate::grammar::{PlainSf, TracedSf};
use crate::queue::{Item, TakeResult, WorkQueue};
use crate::result::PlainResult;
use crate::trace::Trace;
use fnv::{FnvHashMap, FnvHashSet};
use std::sync::Arc;
use std::thread;

/// Spawns the collector thread for plain (untraced) mode.
pub fn spawn_plain_collector<Q>(done_queue: Arc<Q>, repetition: bool) -> thread::JoinHandle<PlainResult>
where
    Q: WorkQueue<PlainSf> + Send + Sync + 'static,
{
    thread::spawn(move || {
        let mut sequence = Vec::new();
        let mut set = FnvHashSet::default();
        loop {
            match done_queue.take() {
                TakeResult::Item(Item::Real(v)) => {
                    log::trace!("done collector: received {} bytes", v.len());
                    if repetition {
                        sequence.push(v);
                    } else {
                        set.insert(v);
                    }
                }
                TakeResult::Item(Item::Sentinel(_)) => {
                    unreachable!("the done queue never carries sentinels")
                }
                TakeResult::Completed => break,
            }
        }
        if repetition {
            PlainResult::Sequence(sequence)
        } else {
            PlainResult::Set(set)
        }
    })
}

/// Spawns the collector thread for traced mode. `repetition` selects
/// additive merge (accumulate all arriving trace lists) vs conservative
/// merge (keep only the first arrival's traces) at the final-container
/// level, mirroring the work queue's own membership policy.
pub fn spawn_traced_collector<Q>(
    done_queue: Arc<Q>,
    repetition: bool,
) -> thread::JoinHandle<FnvHashMap<PlainSf, Vec<Trace>>>
where
    Q: WorkQueue<TracedSf> + Send + Sync + 'static,
{
    thread::spawn(move || {
        let mut map: FnvHashMap<PlainSf, Vec<Trace>> = FnvHashMap::default();
        loop {
            match done_queue.take() {
                TakeResult::Item(Item::Real(sf)) => {
                    log::trace!(
                        "done collector: received {} bytes with {} trace(s)",
                        sf.string.len(),
                        sf.traces.len()
                    );
                    if repetition {
                        map.entry(sf.string).or_default().extend(sf.traces);
                    } else {
                        map.entry(sf.string).or_insert(sf.traces);
                    }
                }
                TakeResult::Item(Item::Sentinel(_)) => {
                    unreachable!("the done queue never carries sentinels")
                }
                TakeResult::Completed => break,
            }
        }
        map
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{BlockingQueue, ConservativeMergeQueue, DedupQueue, PlainQueue};
    use crate::trace::Step;

    #[test]
    fn plain_collector_dedups_across_the_whole_run() {
        let q: Arc<DedupQueue> = Arc::new(BlockingQueue::new());
        q.add(Item::Real(b"01".to_vec()));
        // simulate a requeue after the in-flight dedup set already released it
        let _ = q.take();
        q.add(Item::Real(b"01".to_vec()));
        q.complete_adding();
        let handle = spawn_plain_collector(q, false);
        let result = handle.join().unwrap();
        match result {
            PlainResult::Set(set) => {
                assert_eq!(set.len(), 1);
                assert!(set.contains(&b"01".to_vec()));
            }
            _ => panic!("expected a set"),
        }
    }

    #[test]
    fn plain_collector_repetition_keeps_all_arrivals() {
        let q: Arc<PlainQueue> = Arc::new(BlockingQueue::new());
        q.add(Item::Real(b"01".to_vec()));
        q.add(Item::Real(b"01".to_vec()));
        q.complete_adding();
        let handle = spawn_plain_collector(q, true);
        match handle.join().unwrap() {
            PlainResult::Sequence(seq) => assert_eq!(seq, vec![b"01".to_vec(), b"01".to_vec()]),
            _ => panic!("expected a sequence"),
        }
    }

    #[test]
    fn traced_collector_conservative_keeps_first_arrival_even_after_requeue() {
        let q: Arc<ConservativeMergeQueue> = Arc::new(BlockingQueue::new());
        let mut t0 = Trace::new();
        t0.push(Step::Low {
            nonterminal: b'S',
            alt_index: 0,
        });
        q.add(Item::Real(TracedSf {
            string: b"01".to_vec(),
            traces: vec![t0.clone()],
        }));
        // drain and requeue with a different trace; the queue's own live-set
        // no longer remembers the first arrival, but the final map does
        let _ = q.take();
        let mut t1 = Trace::new();
        t1.push(Step::Low {
            nonterminal: b'S',
            alt_index: 1,
        });
        q.add(Item::Real(TracedSf {
            string: b"01".to_vec(),
            traces: vec![t1],
        }));
        q.complete_adding();
        let handle = spawn_traced_collector(q, false);
        let map = handle.join().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map[&b"01".to_vec()], vec![t0]);
    }
}
