//! Derivation-trace bookkeeping for traced sentential forms.
//!
//! A trace is the ordered sequence of leftmost rewrites that witnesses one
//! particular derivation of a string from the start symbol. Steps reference
//! their rule by `(nonterminal, alt_index)` rather than by pointer into
//! `Rules`, so a trace is `Copy`-free but otherwise ordinary owned data with
//! no lifetime tied to the grammar.

use tinyvec::TinyVec;

/// One leftmost rewrite: which alternative of which nonterminal was chosen,
/// and, outside low-memory mode, the position it was applied at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Low-memory mode: only the chosen alternative is recorded.
    Low { nonterminal: u8, alt_index: usize },
    /// Full mode: the rewrite position is recorded as well.
    Full {
        pos: usize,
        nonterminal: u8,
        alt_index: usize,
    },
}

/// Only needed so `[Step; N]` satisfies `tinyvec`'s `Array` bound for
/// `Trace`'s inline storage; this value is never observed (every slot up
/// to a `Trace`'s length holds a real step).
impl Default for Step {
    fn default() -> Self {
        Step::Low {
            nonterminal: 0,
            alt_index: 0,
        }
    }
}

impl Step {
    pub fn nonterminal(&self) -> u8 {
        match *self {
            Step::Low { nonterminal, .. } | Step::Full { nonterminal, .. } => nonterminal,
        }
    }

    pub fn alt_index(&self) -> usize {
        match *self {
            Step::Low { alt_index, .. } | Step::Full { alt_index, .. } => alt_index,
        }
    }

    pub fn pos(&self) -> Option<usize> {
        match *self {
            Step::Full { pos, .. } => Some(pos),
            Step::Low { .. } => None,
        }
    }
}

/// Most derivations stay well under this many steps before they either
/// finish or get pruned at `depth`; inlining avoids a heap allocation per
/// trace in the common case.
const INLINE_TRACE_STEPS: usize = 8;

/// The ordered sequence of rewrites witnessing one derivation of a string.
pub type Trace = TinyVec<[Step; INLINE_TRACE_STEPS]>;

/// Replay `trace` from `start`, returning the resulting sentential form.
///
/// Used by tests to verify trace soundness: every recorded trace, replayed
/// from the start symbol, must yield the string it is attached to.
pub fn replay(start: u8, trace: &Trace, rules: &crate::grammar::Rules) -> Vec<u8> {
    let mut s = vec![start];
    for step in trace.iter() {
        let pos = match step.pos() {
            Some(pos) => pos,
            None => s
                .iter()
                .position(|&b| rules.is_nonterminal(b))
                .expect("trace step must apply to a string with a pending nonterminal"),
        };
        assert_eq!(
            s[pos],
            step.nonterminal(),
            "trace step's recorded nonterminal does not match the leftmost nonterminal it claims to rewrite"
        );
        let rhs = &rules.alternatives(step.nonterminal())[step.alt_index()];
        s.splice(pos..=pos, rhs.iter().copied());
    }
    s
}
