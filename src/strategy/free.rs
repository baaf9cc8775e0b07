//! Free-queue strategy (C6): no barrier, no rounds. Workers pull and push
//! continuously; the run terminates when the queue is provably quiescent,
//! meaning every worker is blocked in `take` and the queue is empty, so no
//! further item will ever be produced.
//!
//! Only used in traced mode: untraced runs have no use for the extra
//! bookkeeping this strategy buys over the controlled-queue strategy.
//!
//! Depth is enforced by tagging every in-flight item with the BFS layer it
//! belongs to (the count of rewrite steps already applied to reach it);
//! workers simply never enqueue a child whose layer would exceed `depth`.

use crate::error::GenerationError;
use crate::expand::{expand_traced, ExpandResult};
use crate::grammar::{Rules, TracedSf};
use crate::queue::{BlockingQueue, Item, PlainContainer, TakeResult, WorkQueue};
use crate::strategy::TracedSink;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

/// A traced SF tagged with the BFS layer (rewrite-step count) it belongs
/// to, so depth can be enforced without any round/barrier bookkeeping.
struct Layered {
    sf: TracedSf,
    layer: usize,
}

/// The free-queue strategy needs no in-flight dedup/merge: every worker
/// processes every item it dequeues independently, and the final
/// [`TracedSink`] is what applies the run's merge policy once a string is
/// actually done.
type LayeredQueue = BlockingQueue<Layered, PlainContainer<Layered>>;

/// A minimal queue wrapper around any `WorkQueue<Layered>` that also tracks
/// a live quiescence counter: incremented on every `add`/`add_bulk`,
/// decremented once a worker has fully processed (not merely dequeued) an
/// item. The run is over once this counter hits zero while every worker is
/// parked in `take`.
struct QuiescenceGate {
    lock: Mutex<usize>,
    cv: Condvar,
    /// Set if `finish_one` is ever called with nothing live. Every item's
    /// own unit of work is matched by exactly one `finish_one`, so this
    /// should be unreachable in correct code; kept as a safety net rather
    /// than an unchecked `usize` underflow.
    violated: AtomicBool,
}

impl QuiescenceGate {
    fn new(initial: usize) -> Self {
        QuiescenceGate {
            lock: Mutex::new(initial),
            cv: Condvar::new(),
            violated: AtomicBool::new(false),
        }
    }

    fn add(&self, n: usize) {
        let mut live = self.lock.lock().unwrap();
        *live += n;
    }

    fn finish_one(&self) {
        let mut live = self.lock.lock().unwrap();
        match live.checked_sub(1) {
            Some(v) => *live = v,
            None => self.violated.store(true, Ordering::Release),
        }
        if *live == 0 {
            self.cv.notify_all();
        }
    }

    fn wait_until_zero(&self) {
        let mut live = self.lock.lock().unwrap();
        while *live != 0 {
            live = self.cv.wait(live).unwrap();
        }
    }

    fn check(&self) -> Result<(), GenerationError> {
        if self.violated.load(Ordering::Acquire) {
            Err(GenerationError::InternalQuiescenceViolation)
        } else {
            Ok(())
        }
    }
}

/// Runs the free-queue strategy over a traced grammar. Returns
/// `Err(GenerationError::InternalQuiescenceViolation)` if the quiescence
/// counter is ever found inconsistent, see [`QuiescenceGate`]. This should
/// never actually happen, but is surfaced as an error rather than silently
/// ignored or left to panic on underflow.
pub fn run_traced(
    rules: Arc<Rules>,
    start: u8,
    depth: usize,
    workers: usize,
    low_memory: bool,
    repetition: bool,
) -> Result<TracedSink, GenerationError> {
    let mut sink = TracedSink::new(repetition);
    if depth == 0 {
        return Ok(sink);
    }

    let queue: Arc<LayeredQueue> = Arc::new(LayeredQueue::new());
    let done_queue: Arc<LayeredQueue> = Arc::new(LayeredQueue::new());
    let gate = Arc::new(QuiescenceGate::new(1));
    queue.add(Item::Real(Layered {
        sf: TracedSf::new_start(start),
        layer: 0,
    }));

    let handles: Vec<_> = (0..workers)
        .map(|_| {
            let rules = Arc::clone(&rules);
            let queue = Arc::clone(&queue);
            let done_queue = Arc::clone(&done_queue);
            let gate = Arc::clone(&gate);
            thread::spawn(move || loop {
                match queue.take() {
                    TakeResult::Item(Item::Real(item)) => {
                        match expand_traced(&item.sf, &rules, low_memory) {
                            ExpandResult::Done => {
                                done_queue.add(Item::Real(Layered {
                                    sf: item.sf,
                                    layer: item.layer,
                                }));
                                gate.finish_one();
                            }
                            ExpandResult::Children(children) => {
                                let next_layer = item.layer + 1;
                                if next_layer < depth {
                                    let admitted = children.len();
                                    gate.add(admitted);
                                    queue.add_bulk(
                                        children
                                            .into_iter()
                                            .map(|sf| {
                                                Item::Real(Layered {
                                                    sf,
                                                    layer: next_layer,
                                                })
                                            })
                                            .collect(),
                                    );
                                }
                                // else: these children reach layer `depth`
                                // with no round left to examine them in,
                                // so they are dropped unchecked, not
                                // done-tested.
                                gate.finish_one();
                            }
                        }
                    }
                    TakeResult::Item(Item::Sentinel(_)) => {
                        unreachable!("the free-queue strategy never enqueues sentinels")
                    }
                    TakeResult::Completed => break,
                }
            })
        })
        .collect();

    gate.wait_until_zero();
    queue.complete_adding();
    for h in handles {
        h.join().expect("free-queue worker panicked");
    }
    gate.check()?;

    done_queue.complete_adding();
    loop {
        match done_queue.take() {
            TakeResult::Item(Item::Real(item)) => sink.push(item.sf),
            TakeResult::Item(Item::Sentinel(_)) => unreachable!("done queue carries no sentinels"),
            TakeResult::Completed => break,
        }
    }
    Ok(sink)
}

/// Single-threaded deterministic reference variant, using an explicit
/// stack instead of the queue/quiescence machinery above.
pub fn run_traced_single_threaded(
    rules: &Rules,
    start: u8,
    depth: usize,
    low_memory: bool,
    repetition: bool,
) -> TracedSink {
    let mut sink = TracedSink::new(repetition);
    if depth == 0 {
        return sink;
    }
    let mut stack = vec![(TracedSf::new_start(start), 0usize)];
    while let Some((sf, layer)) = stack.pop() {
        match expand_traced(&sf, rules, low_memory) {
            ExpandResult::Done => sink.push(sf),
            ExpandResult::Children(children) => {
                let next_layer = layer + 1;
                if next_layer < depth {
                    for child in children {
                        stack.push((child, next_layer));
                    }
                }
                // else: dropped unchecked, same as the multithreaded path.
            }
        }
    }
    sink
}
