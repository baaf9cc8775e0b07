//! Dual-container strategy (C7): no concurrent queue at all. Each round
//! has a "current" generation buffer (read-only, sliced across workers)
//! and a "next" generation buffer (write-only, one private `Vec` per
//! worker, concatenated after the round). Workers synchronize purely via
//! a `Barrier` at the round boundary; there is nothing to dequeue and
//! nothing to dedup mid-round; a string can legitimately appear more than
//! once in `current` if `repetition` allows it, and each occurrence is
//! expanded independently.
//!
//! Mirrors `gen_dual_containers`/`gen_dual_containers_sth`: single
//! threaded ramp-up continues until the current generation has at least
//! `workers` entries (so every worker gets at least one slice), after
//! which every remaining round is run with the full worker pool.
//!
//! Exactly `depth` rounds run; the generation buffer produced by the
//! `depth`-th round is never itself examined (no SF gets a done-check
//! beyond the round matching its layer), so it is simply not carried
//! forward, not done-tested.

use crate::expand::{expand_plain, expand_traced, ExpandResult};
use crate::grammar::{PlainSf, Rules, TracedSf};
use crate::strategy::{PlainSink, TracedSink};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

/// Splits `n` items as evenly as possible across `workers` slices, any
/// remainder going to the earliest slices.
fn slice_bounds(n: usize, workers: usize) -> Vec<(usize, usize)> {
    let base = n / workers;
    let extra = n % workers;
    let mut bounds = Vec::with_capacity(workers);
    let mut start = 0;
    for w in 0..workers {
        let len = base + if w < extra { 1 } else { 0 };
        bounds.push((start, start + len));
        start += len;
    }
    bounds
}

/// Runs the dual-container strategy over a plain (untraced) grammar.
pub fn run_plain(
    rules: Arc<Rules>,
    start: u8,
    depth: usize,
    workers: usize,
    repetition: bool,
) -> PlainSink {
    let mut sink = PlainSink::new(repetition);
    let mut current: Vec<PlainSf> = vec![vec![start]];

    let mut round = 0;
    // single-threaded ramp-up until there is enough work to slice.
    while round < depth && current.len() < workers {
        let mut next = Vec::new();
        for sf in current {
            match expand_plain(&sf, &rules) {
                ExpandResult::Done => sink.push(sf),
                ExpandResult::Children(children) => next.extend(children),
            }
        }
        current = next;
        round += 1;
    }

    if round >= depth || current.is_empty() {
        return sink;
    }

    let barrier = Arc::new(Barrier::new(workers));
    while round < depth {
        let current_arc = Arc::new(current);
        let bounds = slice_bounds(current_arc.len(), workers);
        let next_parts: Arc<Mutex<Vec<Vec<PlainSf>>>> =
            Arc::new(Mutex::new(vec![Vec::new(); workers]));
        let done_parts: Arc<Mutex<Vec<PlainSf>>> = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..workers)
            .map(|w| {
                let rules = Arc::clone(&rules);
                let current = Arc::clone(&current_arc);
                let (lo, hi) = bounds[w];
                let next_parts = Arc::clone(&next_parts);
                let done_parts = Arc::clone(&done_parts);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let mut my_next = Vec::new();
                    let mut my_done = Vec::new();
                    for sf in &current[lo..hi] {
                        match expand_plain(sf, &rules) {
                            ExpandResult::Done => my_done.push(sf.clone()),
                            ExpandResult::Children(children) => my_next.extend(children),
                        }
                    }
                    next_parts.lock().unwrap()[w] = my_next;
                    done_parts.lock().unwrap().extend(my_done);
                    barrier.wait();
                })
            })
            .collect();
        for h in handles {
            h.join().expect("dual-container worker panicked");
        }

        for v in done_parts.lock().unwrap().drain(..) {
            sink.push(v);
        }
        let parts = Mutex::into_inner(
            Arc::try_unwrap(next_parts)
                .unwrap_or_else(|_| panic!("all worker threads have joined; the Arc must be uniquely held")),
        )
        .unwrap();
        current = itertools::concat(parts);
        round += 1;
    }
    sink
}

/// Single-threaded deterministic reference variant (never slices or
/// spawns threads at all).
pub fn run_plain_single_threaded(
    rules: &Rules,
    start: u8,
    depth: usize,
    repetition: bool,
) -> PlainSink {
    let mut sink = PlainSink::new(repetition);
    let mut current: Vec<PlainSf> = vec![vec![start]];
    for _ in 0..depth {
        let mut next = Vec::new();
        for sf in current {
            match expand_plain(&sf, rules) {
                ExpandResult::Done => sink.push(sf),
                ExpandResult::Children(children) => next.extend(children),
            }
        }
        current = next;
    }
    sink
}

/// Runs the dual-container strategy over a traced grammar. The per-round
/// merge of `next`'s generation buffer uses the same [`TracedSink`]-style
/// policy the queue-based strategies apply continuously, but applied once
/// per round instead of once per item: additive merge accumulates every
/// slice's contribution for a repeated string, conservative merge keeps
/// only the first.
pub fn run_traced(
    rules: Arc<Rules>,
    start: u8,
    depth: usize,
    workers: usize,
    low_memory: bool,
    repetition: bool,
) -> TracedSink {
    let mut sink = TracedSink::new(repetition);
    let mut current: Vec<TracedSf> = vec![TracedSf::new_start(start)];

    let mut round = 0;
    while round < depth && current.len() < workers {
        let mut next = Vec::new();
        for sf in current {
            match expand_traced(&sf, &rules, low_memory) {
                ExpandResult::Done => sink.push(sf),
                ExpandResult::Children(children) => next.extend(children),
            }
        }
        current = next;
        round += 1;
    }

    if round >= depth || current.is_empty() {
        return sink;
    }

    let barrier = Arc::new(Barrier::new(workers));
    while round < depth {
        let current_arc = Arc::new(current);
        let bounds = slice_bounds(current_arc.len(), workers);
        let next_parts: Arc<Mutex<Vec<Vec<TracedSf>>>> =
            Arc::new(Mutex::new(vec![Vec::new(); workers]));
        let done_parts: Arc<Mutex<Vec<TracedSf>>> = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..workers)
            .map(|w| {
                let rules = Arc::clone(&rules);
                let current = Arc::clone(&current_arc);
                let (lo, hi) = bounds[w];
                let next_parts = Arc::clone(&next_parts);
                let done_parts = Arc::clone(&done_parts);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let mut my_next = Vec::new();
                    let mut my_done = Vec::new();
                    for sf in &current[lo..hi] {
                        match expand_traced(sf, &rules, low_memory) {
                            ExpandResult::Done => my_done.push(sf.clone()),
                            ExpandResult::Children(children) => my_next.extend(children),
                        }
                    }
                    next_parts.lock().unwrap()[w] = my_next;
                    done_parts.lock().unwrap().extend(my_done);
                    barrier.wait();
                })
            })
            .collect();
        for h in handles {
            h.join().expect("dual-container worker panicked");
        }

        for sf in done_parts.lock().unwrap().drain(..) {
            sink.push(sf);
        }
        let parts = Mutex::into_inner(
            Arc::try_unwrap(next_parts)
                .unwrap_or_else(|_| panic!("all worker threads have joined; the Arc must be uniquely held")),
        )
        .unwrap();
        current = merge_generation(parts, repetition);
        round += 1;
    }
    sink
}

/// Merges the per-worker `next` buffers of one round into the single
/// `current` buffer for the next, applying the traced merge policy across
/// slice boundaries (a string produced by two different workers this
/// round must still merge its traces exactly as the queue-based
/// strategies would).
fn merge_generation(parts: Vec<Vec<TracedSf>>, repetition: bool) -> Vec<TracedSf> {
    if repetition {
        return parts.into_iter().flatten().collect();
    }
    let mut by_string: fnv::FnvHashMap<PlainSf, crate::trace::Trace> = fnv::FnvHashMap::default();
    let mut order: Vec<PlainSf> = Vec::new();
    for sf in parts.into_iter().flatten() {
        if !by_string.contains_key(&sf.string) {
            order.push(sf.string.clone());
        }
        let entry = by_string.entry(sf.string).or_default();
        // conservative merge keeps only the first trace set seen; later
        // arrivals for the same string contribute nothing further.
        if entry.is_empty() {
            if let Some(first) = sf.traces.into_iter().next() {
                *entry = first;
            }
        }
    }
    order
        .into_iter()
        .map(|string| {
            let trace = by_string.remove(&string).unwrap_or_default();
            TracedSf {
                string,
                traces: vec![trace],
            }
        })
        .collect()
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
    let mut current: Vec<TracedSf> = vec![TracedSf::new_start(start)];
    for _ in 0..depth {
        let mut next = Vec::new();
        for sf in current {
            match expand_traced(&sf, rules, low_memory) {
                ExpandResult::Done => sink.push(sf),
                ExpandResult::Children(children) => next.extend(children),
            }
        }
        current = next;
    }
    sink
}

#[cfg(test)]
mod tests {
    use super::*;
    use fnv::FnvHashMap;

    fn test_rules() -> Arc<Rules> {
        let mut table: FnvHashMap<u8, Vec<Vec<u8>>> = FnvHashMap::default();
        table.insert(b'S', vec![b"0A".to_vec(), b"1B".to_vec()]);
        table.insert(b'A', vec![b"0AA".to_vec(), b"1S".to_vec(), b"1".to_vec()]);
        table.insert(b'B', vec![b"1BB".to_vec(), b"0S".to_vec(), b"0".to_vec()]);
        Arc::new(Rules::new(table).unwrap())
    }

    #[test]
    fn slice_bounds_cover_every_index_exactly_once() {
        let bounds = slice_bounds(10, 3);
        assert_eq!(bounds, vec![(0, 4), (4, 7), (7, 10)]);
    }

    #[test]
    fn multithreaded_matches_single_threaded_set() {
        let rules = test_rules();
        let depth = 5;
        let mt = run_plain(Arc::clone(&rules), b'S', depth, 4, false);
        let st = run_plain_single_threaded(&rules, b'S', depth, false);
        assert_eq!(
            mt.into_result().distinct_strings(),
            st.into_result().distinct_strings()
        );
    }

    #[test]
    fn depth_zero_yields_nothing() {
        let rules = test_rules();
        let sink = run_plain(rules, b'S', 0, 4, true);
        assert!(sink.into_result().is_empty());
    }

    #[test]
    fn traced_multithreaded_matches_single_threaded_strings() {
        let rules = test_rules();
        let depth = 4;
        let mt = run_traced(Arc::clone(&rules), b'S', depth, 4, false, true);
        let st = run_traced_single_threaded(&rules, b'S', depth, false, true);
        let mt_map = mt.into_map();
        let st_map = st.into_map();
        let mt_strings: std::collections::BTreeSet<_> = mt_map.keys().cloned().collect();
        let st_strings: std::collections::BTreeSet<_> = st_map.keys().cloned().collect();
        assert_eq!(mt_strings, st_strings);
    }

    #[test]
    fn depth_two_is_empty_but_depth_three_resolves_the_shortest_strings() {
        let rules = test_rules();
        let two = run_plain_single_threaded(&rules, b'S', 2, false);
        assert!(two.into_result().is_empty());
        let three = run_plain(Arc::clone(&rules), b'S', 3, 4, false);
        let distinct = three.into_result().distinct_strings();
        assert_eq!(distinct.len(), 2);
        assert!(distinct.contains(b"01".as_slice()));
        assert!(distinct.contains(b"10".as_slice()));
    }
}
