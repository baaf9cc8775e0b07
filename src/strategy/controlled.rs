//! Controlled-queue strategy (C5): workers synchronize on an explicit
//! `Barrier` at the end of every BFS layer, so the run progresses in
//! exactly `depth` lockstep rounds. Each worker owns one sentinel
//! (`Item::Sentinel(worker_id)`) that it re-enqueues at the end of every
//! round it survives, and the round ends once every worker has pulled its
//! own sentinel back out of the queue.
//!
//! Exactly `depth` barrier arrivals total, one per round, with `exit`
//! latched on the final round *before* the matching `go` release so every
//! worker observes it at the same round boundary instead of attempting a
//! `depth + 1`-th round.
//!
//! An SF gets its own done-check only on the round matching its layer (the
//! number of rewrites already applied to reach it); an SF produced during
//! the final round sits in the queue at the end with no round left to be
//! examined in, and is dropped there unchecked rather than done-tested.
//! Checking it would silently grant one round beyond `depth`.

use crate::expand::{expand_plain, expand_traced, ExpandResult};
use crate::grammar::{PlainSf, Rules, TracedSf};
use crate::queue::{Item, TakeResult, WorkQueue};
use crate::strategy::{PlainSink, TracedSink};
use std::sync::{Arc, Barrier};
use std::thread;

/// Runs the controlled-queue strategy over a plain (untraced) grammar.
///
/// `Q` is the work-queue's membership policy, already chosen by
/// [`crate::mode`] according to `repetition` (plain-append if `true`,
/// set-dedup otherwise).
pub fn run_plain<Q>(
    rules: Arc<Rules>,
    start: u8,
    depth: usize,
    workers: usize,
    repetition: bool,
) -> PlainSink
where
    Q: WorkQueue<PlainSf> + Default + Send + Sync + 'static,
{
    if depth == 0 {
        return PlainSink::new(repetition);
    }

    let queue: Arc<Q> = Arc::new(Q::default());
    queue.add(Item::Real(vec![start]));
    for w in 0..workers {
        queue.add(Item::Sentinel(w));
    }

    let barrier = Arc::new(Barrier::new(workers + 1));
    let go = Arc::new(Barrier::new(workers + 1));
    let exit = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let done_queue: Arc<Q> = Arc::new(Q::default());
    let collector = crate::done::spawn_plain_collector(Arc::clone(&done_queue), repetition);

    let handles: Vec<_> = (0..workers)
        .map(|w| {
            let rules = Arc::clone(&rules);
            let queue = Arc::clone(&queue);
            let done_queue = Arc::clone(&done_queue);
            let barrier = Arc::clone(&barrier);
            let go = Arc::clone(&go);
            let exit = Arc::clone(&exit);
            thread::spawn(move || loop {
                match queue.take() {
                    TakeResult::Item(Item::Real(sf)) => match expand_plain(&sf, &rules) {
                        ExpandResult::Done => {
                            done_queue.add(Item::Real(sf));
                        }
                        ExpandResult::Children(children) => {
                            queue.add_bulk(children.into_iter().map(Item::Real).collect());
                        }
                    },
                    TakeResult::Item(Item::Sentinel(_)) => {
                        barrier.wait();
                        go.wait();
                        if exit.load(std::sync::atomic::Ordering::Acquire) {
                            break;
                        }
                        queue.add(Item::Sentinel(w));
                    }
                    TakeResult::Completed => break,
                }
            })
        })
        .collect();

    for round in 0..depth {
        barrier.wait();
        if round + 1 == depth {
            exit.store(true, std::sync::atomic::Ordering::Release);
        }
        go.wait();
    }

    for h in handles {
        h.join().expect("controlled-queue worker panicked");
    }

    // Whatever is still in the queue belongs to layer `depth`: it was
    // produced during the final round but never given its own round to be
    // examined, so it is dropped unchecked rather than done-tested here.
    // Testing it would grant one round more than `depth` allows.
    queue.complete_adding();
    while !matches!(queue.take(), TakeResult::Completed) {}
    done_queue.complete_adding();
    let result = collector.join().expect("done collector panicked");
    PlainSink::from_result(result)
}

/// Single-threaded deterministic reference variant: one round is one
/// sweep over everything currently in the queue, with no barrier/thread
/// machinery at all. Used as the ground truth strategy-equivalence tests
/// compare every concurrent configuration against.
pub fn run_plain_single_threaded(
    rules: &Rules,
    start: u8,
    depth: usize,
    repetition: bool,
) -> PlainSink {
    let mut sink = PlainSink::new(repetition);
    let mut layer = vec![vec![start]];
    for _ in 0..depth {
        let mut next = Vec::new();
        for sf in layer {
            match expand_plain(&sf, rules) {
                ExpandResult::Done => sink.push(sf),
                ExpandResult::Children(children) => next.extend(children),
            }
        }
        layer = next;
    }
    // `layer` now holds layer-`depth` items, never given their own round;
    // they are dropped unexamined, not done-tested.
    sink
}

/// Runs the controlled-queue strategy over a traced grammar.
pub fn run_traced<Q>(
    rules: Arc<Rules>,
    start: u8,
    depth: usize,
    workers: usize,
    low_memory: bool,
    repetition: bool,
) -> TracedSink
where
    Q: WorkQueue<TracedSf> + Default + Send + Sync + 'static,
{
    if depth == 0 {
        return TracedSink::new(repetition);
    }

    let queue: Arc<Q> = Arc::new(Q::default());
    queue.add(Item::Real(TracedSf::new_start(start)));
    for w in 0..workers {
        queue.add(Item::Sentinel(w));
    }

    let barrier = Arc::new(Barrier::new(workers + 1));
    let go = Arc::new(Barrier::new(workers + 1));
    let exit = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let done_queue: Arc<Q> = Arc::new(Q::default());
    let collector = crate::done::spawn_traced_collector(Arc::clone(&done_queue), repetition);

    let handles: Vec<_> = (0..workers)
        .map(|w| {
            let rules = Arc::clone(&rules);
            let queue = Arc::clone(&queue);
            let done_queue = Arc::clone(&done_queue);
            let barrier = Arc::clone(&barrier);
            let go = Arc::clone(&go);
            let exit = Arc::clone(&exit);
            thread::spawn(move || loop {
                match queue.take() {
                    TakeResult::Item(Item::Real(sf)) => match expand_traced(&sf, &rules, low_memory) {
                        ExpandResult::Done => {
                            done_queue.add(Item::Real(sf));
                        }
                        ExpandResult::Children(children) => {
                            queue.add_bulk(children.into_iter().map(Item::Real).collect());
                        }
                    },
                    TakeResult::Item(Item::Sentinel(_)) => {
                        barrier.wait();
                        go.wait();
                        if exit.load(std::sync::atomic::Ordering::Acquire) {
                            break;
                        }
                        queue.add(Item::Sentinel(w));
                    }
                    TakeResult::Completed => break,
                }
            })
        })
        .collect();

    for round in 0..depth {
        barrier.wait();
        if round + 1 == depth {
            exit.store(true, std::sync::atomic::Ordering::Release);
        }
        go.wait();
    }

    for h in handles {
        h.join().expect("controlled-queue worker panicked");
    }

    // See the matching comment in `run_plain`: the queue's remaining
    // contents are layer-`depth` items, dropped unchecked.
    queue.complete_adding();
    while !matches!(queue.take(), TakeResult::Completed) {}
    done_queue.complete_adding();
    let map = collector.join().expect("done collector panicked");
    TracedSink::from_map(repetition, map)
}

/// Single-threaded deterministic reference variant for traced mode.
pub fn run_traced_single_threaded(
    rules: &Rules,
    start: u8,
    depth: usize,
    low_memory: bool,
    repetition: bool,
) -> TracedSink {
    let mut sink = TracedSink::new(repetition);
    let mut layer = vec![TracedSf::new_start(start)];
    for _ in 0..depth {
        let mut next: Vec<TracedSf> = Vec::new();
        for sf in layer {
            match expand_traced(&sf, rules, low_memory) {
                ExpandResult::Done => sink.push(sf),
                ExpandResult::Children(children) => next.extend(children),
            }
        }
        layer = next;
    }
    sink
}
