//! Grammar model: the nonterminal alphabet, the rule table, and sentential
//! form (SF) representation.
//!
//! A variable of type `Rules` represents a context-free grammar: a mapping
//! from single-byte nonterminal symbols to a nonempty, order-significant
//! sequence of right-hand-side alternatives. `Rules` is validated once, at
//! construction, and is shared read-only (`Arc<Rules>`) for the lifetime of
//! a `generate` call; no pass ever mutates it.

use crate::error::GenerationError;
use crate::trace::Trace;
use fnv::{FnvHashMap, FnvHashSet};

/// A right-hand-side alternative: a string over the full alphabet
/// (terminals and nonterminals), stored as raw bytes.
pub type Rhs = Vec<u8>;

/// The grammar's rule table: nonterminal byte -> ordered, nonempty
/// alternatives. Construct with [`Rules::new`], which validates the
/// grammar preconditions eagerly.
#[derive(Debug, Clone)]
pub struct Rules {
    table: FnvHashMap<u8, Vec<Rhs>>,
    nonterminals: FnvHashSet<u8>,
}

impl Rules {
    /// Builds a validated rule table.
    ///
    /// Returns [`GenerationError::InvalidGrammar`] if any nonterminal maps to
    /// an empty alternative list. Does *not* check the start symbol; that is
    /// validated separately once the start symbol is known (see
    /// [`Rules::check_start`]), since a `Rules` value may be reused across
    /// calls with different start symbols.
    pub fn new(table: FnvHashMap<u8, Vec<Rhs>>) -> Result<Self, GenerationError> {
        for (&nonterminal, alts) in &table {
            if alts.is_empty() {
                return Err(GenerationError::InvalidGrammar { nonterminal });
            }
        }
        let nonterminals = table.keys().copied().collect();
        Ok(Rules { table, nonterminals })
    }

    /// Validates that `start` is a key of this rule table.
    pub fn check_start(&self, start: u8) -> Result<(), GenerationError> {
        if self.table.contains_key(&start) {
            Ok(())
        } else {
            Err(GenerationError::StartSymbolMissing { start })
        }
    }

    /// The ordered alternatives for `nonterminal`. Panics if `nonterminal`
    /// is not a key; callers only look this up after first confirming
    /// `is_nonterminal`, or while replaying a trace produced by this same
    /// table.
    pub fn alternatives(&self, nonterminal: u8) -> &[Rhs] {
        &self.table[&nonterminal]
    }

    pub fn is_nonterminal(&self, byte: u8) -> bool {
        self.nonterminals.contains(&byte)
    }

    /// The leftmost index in `s` whose byte is a nonterminal, if any.
    pub fn leftmost_nonterminal(&self, s: &[u8]) -> Option<usize> {
        s.iter().position(|&b| self.is_nonterminal(b))
    }

    pub fn nonterminal_count(&self) -> usize {
        self.table.len()
    }
}

/// A sentential form without derivation-trace bookkeeping: just the string.
pub type PlainSf = Vec<u8>;

/// A sentential form with attached derivation traces: the string, plus one
/// trace per distinct derivation sequence currently known to reach it.
#[derive(Debug, Clone)]
pub struct TracedSf {
    pub string: Vec<u8>,
    pub traces: Vec<Trace>,
}

impl TracedSf {
    pub fn new_start(start: u8) -> Self {
        TracedSf {
            string: vec![start],
            traces: vec![Trace::new()],
        }
    }
}
