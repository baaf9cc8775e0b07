//! The expansion kernel (C2): turns one sentential form into its children,
//! or recognizes it as done.

use crate::grammar::{PlainSf, Rules, TracedSf};
use crate::trace::Step;

/// Result of expanding a single sentential form.
pub enum ExpandResult<T> {
    /// No nonterminal remained; the SF is finished.
    Done,
    /// The leftmost nonterminal was rewritten; one child per alternative,
    /// in the grammar's alternative order.
    Children(Vec<T>),
}

/// Expand a plain SF: find the leftmost nonterminal, or report done.
pub fn expand_plain(s: &[u8], rules: &Rules) -> ExpandResult<PlainSf> {
    let Some(pos) = rules.leftmost_nonterminal(s) else {
        return ExpandResult::Done;
    };
    let nonterminal = s[pos];
    let alts = rules.alternatives(nonterminal);
    let mut children = Vec::with_capacity(alts.len());
    for alt in alts {
        let mut child = Vec::with_capacity(s.len() - 1 + alt.len());
        child.extend_from_slice(&s[..pos]);
        child.extend_from_slice(alt);
        child.extend_from_slice(&s[pos + 1..]);
        children.push(child);
    }
    ExpandResult::Children(children)
}

/// Expand a traced SF: as [`expand_plain`], but each child also carries a
/// clone of the parent's trace list with one step appended per trace.
pub fn expand_traced(s: &TracedSf, rules: &Rules, low_memory: bool) -> ExpandResult<TracedSf> {
    let Some(pos) = rules.leftmost_nonterminal(&s.string) else {
        return ExpandResult::Done;
    };
    let nonterminal = s.string[pos];
    let alts = rules.alternatives(nonterminal);
    let mut children = Vec::with_capacity(alts.len());
    for (alt_index, alt) in alts.iter().enumerate() {
        let mut string = Vec::with_capacity(s.string.len() - 1 + alt.len());
        string.extend_from_slice(&s.string[..pos]);
        string.extend_from_slice(alt);
        string.extend_from_slice(&s.string[pos + 1..]);

        let step = if low_memory {
            Step::Low {
                nonterminal,
                alt_index,
            }
        } else {
            Step::Full {
                pos,
                nonterminal,
                alt_index,
            }
        };
        let traces = s
            .traces
            .iter()
            .map(|t| {
                let mut t = t.clone();
                t.push(step);
                t
            })
            .collect();
        children.push(TracedSf { string, traces });
    }
    ExpandResult::Children(children)
}
