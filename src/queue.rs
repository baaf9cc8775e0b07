//! The work queue abstraction (C4): a blocking multi-producer/multi-consumer
//! queue parametrized by a membership policy, plus the four concrete
//! policies the engine needs.
//!
//! Every strategy module is generic over the [`WorkQueue`] capability set
//! rather than hardcoding a container, so the controlled-queue and
//! free-queue strategies can be instantiated with whichever of the four
//! policies below the requested [`crate::mode::Mode`] calls for.

use crate::grammar::PlainSf;
use crate::grammar::TracedSf;
use crate::trace::Trace;
use fnv::{FnvHashMap, FnvHashSet};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};

/// A queue entry: either a real sentential form, or a sentinel marking
/// end-of-layer for one worker (see `strategy::controlled`).
///
/// This tagged variant avoids smuggling sentinels through a homogeneous
/// string queue with a reserved NUL-prefix byte; no byte of the grammar's
/// alphabet is reserved.
#[derive(Debug, Clone)]
pub enum Item<T> {
    Real(T),
    Sentinel(usize),
}

/// Outcome of a blocking [`WorkQueue::take`].
pub enum TakeResult<T> {
    Item(T),
    /// The queue was latched closed (via `complete_adding`) and drained.
    Completed,
}

/// The capability set every strategy is written against: enqueue one or
/// many items, block for the next one, and latch the queue closed once no
/// more producers remain.
pub trait WorkQueue<T> {
    /// Enqueues one item. Returns `false` if the queue is already
    /// completed (the item is dropped in that case).
    fn add(&self, item: Item<T>) -> bool;
    /// Enqueues a burst of items, preserving their relative order. Returns
    /// the number actually admitted (equal to `items.len()` unless the
    /// queue was already completed, in which case it is 0).
    fn add_bulk(&self, items: Vec<Item<T>>) -> usize;
    /// Blocks until an item is available or the queue is completed and
    /// drained.
    fn take(&self) -> TakeResult<Item<T>>;
    /// Current live size (pending items, real or sentinel).
    fn size(&self) -> usize;
    /// Number of threads currently blocked inside `take`.
    fn active_consumers(&self) -> usize;
    /// Latches the queue closed: further `add`/`add_bulk` calls fail, and
    /// `take` returns `Completed` once the queue drains empty. Idempotent.
    fn complete_adding(&self);
    /// True once `complete_adding` has been called and the queue is empty.
    fn is_completed(&self) -> bool;
}

/// The container-specific admission/removal logic a [`BlockingQueue`] is
/// generic over. Sentinels always bypass any membership policy; only real
/// items are subject to dedup/merge.
trait Container<T>: Default + Send {
    fn push_real(&mut self, value: T);
    fn push_sentinel(&mut self, worker: usize);
    fn pop_front(&mut self) -> Option<Item<T>>;
    fn len(&self) -> usize;
}

struct QueueState<C> {
    container: C,
    completed: bool,
}

/// Shared blocking-queue core: one `Mutex`-guarded container plus a
/// `Condvar` for waking waiting consumers, generic over the membership
/// policy. Mirrors the teacher crate's own `Executor` work queue (a
/// `Mutex<BinaryHeap<Job>>` plus a `Condvar`), generalized from a priority
/// heap to a FIFO with pluggable admission.
pub struct BlockingQueue<T, C> {
    state: Mutex<QueueState<C>>,
    not_empty: Condvar,
    active_consumers: AtomicUsize,
    _marker: std::marker::PhantomData<T>,
}

impl<T, C: Container<T>> BlockingQueue<T, C> {
    pub fn new() -> Self {
        BlockingQueue {
            state: Mutex::new(QueueState {
                container: C::default(),
                completed: false,
            }),
            not_empty: Condvar::new(),
            active_consumers: AtomicUsize::new(0),
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T, C: Container<T>> Default for BlockingQueue<T, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C: Container<T>> WorkQueue<T> for BlockingQueue<T, C> {
    fn add(&self, item: Item<T>) -> bool {
        let mut st = self.state.lock().unwrap();
        if st.completed {
            return false;
        }
        match item {
            Item::Real(v) => st.container.push_real(v),
            Item::Sentinel(w) => st.container.push_sentinel(w),
        }
        drop(st);
        self.not_empty.notify_one();
        true
    }

    fn add_bulk(&self, items: Vec<Item<T>>) -> usize {
        let mut st = self.state.lock().unwrap();
        if st.completed {
            return 0;
        }
        let n = items.len();
        for item in items {
            match item {
                Item::Real(v) => st.container.push_real(v),
                Item::Sentinel(w) => st.container.push_sentinel(w),
            }
        }
        drop(st);
        self.not_empty.notify_all();
        n
    }

    fn take(&self) -> TakeResult<Item<T>> {
        let mut st = self.state.lock().unwrap();
        loop {
            if let Some(item) = st.container.pop_front() {
                return TakeResult::Item(item);
            }
            if st.completed {
                return TakeResult::Completed;
            }
            self.active_consumers.fetch_add(1, Ordering::AcqRel);
            st = self.not_empty.wait(st).unwrap();
            self.active_consumers.fetch_sub(1, Ordering::AcqRel);
        }
    }

    fn size(&self) -> usize {
        self.state.lock().unwrap().container.len()
    }

    fn active_consumers(&self) -> usize {
        self.active_consumers.load(Ordering::Acquire)
    }

    fn complete_adding(&self) {
        let mut st = self.state.lock().unwrap();
        st.completed = true;
        drop(st);
        self.not_empty.notify_all();
    }

    fn is_completed(&self) -> bool {
        let st = self.state.lock().unwrap();
        st.completed && st.container.len() == 0
    }
}

// ---------------------------------------------------------------------
// plain-append: ordinary FIFO, duplicates permitted (plain + repetition)
// ---------------------------------------------------------------------

#[derive(Default)]
pub struct PlainContainer<T> {
    queue: VecDeque<Item<T>>,
}

impl<T: Send> Container<T> for PlainContainer<T> {
    fn push_real(&mut self, value: T) {
        self.queue.push_back(Item::Real(value));
    }
    fn push_sentinel(&mut self, worker: usize) {
        self.queue.push_back(Item::Sentinel(worker));
    }
    fn pop_front(&mut self) -> Option<Item<T>> {
        self.queue.pop_front()
    }
    fn len(&self) -> usize {
        self.queue.len()
    }
}

pub type PlainQueue = BlockingQueue<PlainSf, PlainContainer<PlainSf>>;

// ---------------------------------------------------------------------
// set-dedup: FIFO whose add is a no-op if the string is already live
// (plain + no-repetition)
// ---------------------------------------------------------------------

#[derive(Default)]
pub struct DedupContainer {
    queue: VecDeque<Item<PlainSf>>,
    present: FnvHashSet<PlainSf>,
}

impl Container<PlainSf> for DedupContainer {
    fn push_real(&mut self, value: PlainSf) {
        if self.present.insert(value.clone()) {
            self.queue.push_back(Item::Real(value));
        }
    }
    fn push_sentinel(&mut self, worker: usize) {
        self.queue.push_back(Item::Sentinel(worker));
    }
    fn pop_front(&mut self) -> Option<Item<PlainSf>> {
        let item = self.queue.pop_front()?;
        if let Item::Real(ref v) = item {
            self.present.remove(v);
        }
        Some(item)
    }
    fn len(&self) -> usize {
        self.queue.len()
    }
}

pub type DedupQueue = BlockingQueue<PlainSf, DedupContainer>;

// ---------------------------------------------------------------------
// conservative-merge: keyed on the string; a second arrival's traces are
// discarded in favor of the first (traced + no-repetition)
// ---------------------------------------------------------------------

#[derive(Default)]
pub struct ConservativeMergeContainer {
    queue: VecDeque<Item<Vec<u8>>>,
    live: FnvHashMap<Vec<u8>, Vec<Trace>>,
}

impl Container<TracedSf> for ConservativeMergeContainer {
    fn push_real(&mut self, value: TracedSf) {
        if !self.live.contains_key(&value.string) {
            self.live.insert(value.string.clone(), value.traces);
            self.queue.push_back(Item::Real(value.string));
        }
        // else: already live, incoming traces are dropped.
    }
    fn push_sentinel(&mut self, worker: usize) {
        self.queue.push_back(Item::Sentinel(worker));
    }
    fn pop_front(&mut self) -> Option<Item<TracedSf>> {
        match self.queue.pop_front()? {
            Item::Sentinel(w) => Some(Item::Sentinel(w)),
            Item::Real(key) => {
                let traces = self.live.remove(&key).expect("queued key must be live");
                Some(Item::Real(TracedSf {
                    string: key,
                    traces,
                }))
            }
        }
    }
    fn len(&self) -> usize {
        self.queue.len()
    }
}

pub type ConservativeMergeQueue = BlockingQueue<TracedSf, ConservativeMergeContainer>;

// ---------------------------------------------------------------------
// additive-merge: keyed on the string; a second arrival's traces are
// appended onto the first's (traced + repetition)
// ---------------------------------------------------------------------

#[derive(Default)]
pub struct AdditiveMergeContainer {
    queue: VecDeque<Item<Vec<u8>>>,
    live: FnvHashMap<Vec<u8>, Vec<Trace>>,
}

impl Container<TracedSf> for AdditiveMergeContainer {
    fn push_real(&mut self, value: TracedSf) {
        match self.live.get_mut(&value.string) {
            Some(existing) => existing.extend(value.traces),
            None => {
                self.live.insert(value.string.clone(), value.traces);
                self.queue.push_back(Item::Real(value.string));
            }
        }
    }
    fn push_sentinel(&mut self, worker: usize) {
        self.queue.push_back(Item::Sentinel(worker));
    }
    fn pop_front(&mut self) -> Option<Item<TracedSf>> {
        match self.queue.pop_front()? {
            Item::Sentinel(w) => Some(Item::Sentinel(w)),
            Item::Real(key) => {
                let traces = self.live.remove(&key).expect("queued key must be live");
                Some(Item::Real(TracedSf {
                    string: key,
                    traces,
                }))
            }
        }
    }
    fn len(&self) -> usize {
        self.queue.len()
    }
}

pub type AdditiveMergeQueue = BlockingQueue<TracedSf, AdditiveMergeContainer>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_queue_preserves_fifo_order_and_duplicates() {
        let q: PlainQueue = BlockingQueue::new();
        q.add(Item::Real(b"a".to_vec()));
        q.add(Item::Real(b"a".to_vec()));
        q.add(Item::Real(b"b".to_vec()));
        assert_eq!(q.size(), 3);
        let items: Vec<_> = (0..3)
            .map(|_| match q.take() {
                TakeResult::Item(Item::Real(v)) => v,
                _ => panic!("expected real item"),
            })
            .collect();
        assert_eq!(items, vec![b"a".to_vec(), b"a".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn dedup_queue_drops_duplicate_while_live() {
        let q: DedupQueue = BlockingQueue::new();
        q.add(Item::Real(b"a".to_vec()));
        q.add(Item::Real(b"a".to_vec()));
        assert_eq!(q.size(), 1);
        match q.take() {
            TakeResult::Item(Item::Real(v)) => assert_eq!(v, b"a".to_vec()),
            _ => panic!("expected real item"),
        }
        assert_eq!(q.size(), 0);
        // once dequeued, the string is no longer live and can be re-added
        q.add(Item::Real(b"a".to_vec()));
        assert_eq!(q.size(), 1);
    }

    #[test]
    fn conservative_merge_discards_second_arrival_traces() {
        let q: ConservativeMergeQueue = BlockingQueue::new();
        let mut first_trace = Trace::new();
        first_trace.push(crate::trace::Step::Low {
            nonterminal: b'S',
            alt_index: 0,
        });
        q.add(Item::Real(TracedSf {
            string: b"01".to_vec(),
            traces: vec![first_trace.clone()],
        }));
        q.add(Item::Real(TracedSf {
            string: b"01".to_vec(),
            traces: vec![{
                let mut t = Trace::new();
                t.push(crate::trace::Step::Low {
                    nonterminal: b'S',
                    alt_index: 1,
                });
                t
            }],
        }));
        assert_eq!(q.size(), 1);
        match q.take() {
            TakeResult::Item(Item::Real(sf)) => {
                assert_eq!(sf.traces.len(), 1);
                assert_eq!(sf.traces[0], first_trace);
            }
            _ => panic!("expected real item"),
        }
    }

    #[test]
    fn additive_merge_accumulates_both_arrivals() {
        let q: AdditiveMergeQueue = BlockingQueue::new();
        q.add(Item::Real(TracedSf {
            string: b"01".to_vec(),
            traces: vec![Trace::new()],
        }));
        q.add(Item::Real(TracedSf {
            string: b"01".to_vec(),
            traces: vec![Trace::new()],
        }));
        assert_eq!(q.size(), 1);
        match q.take() {
            TakeResult::Item(Item::Real(sf)) => assert_eq!(sf.traces.len(), 2),
            _ => panic!("expected real item"),
        }
    }

    #[test]
    fn complete_adding_drains_then_completes() {
        let q: PlainQueue = BlockingQueue::new();
        q.add(Item::Real(b"a".to_vec()));
        q.complete_adding();
        assert!(!q.add(Item::Real(b"b".to_vec())));
        match q.take() {
            TakeResult::Item(Item::Real(v)) => assert_eq!(v, b"a".to_vec()),
            _ => panic!("expected real item"),
        }
        assert!(q.is_completed());
        match q.take() {
            TakeResult::Completed => {}
            _ => panic!("expected completed"),
        }
    }
}
