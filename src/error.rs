//! Error types for grammar validation and internal invariant violations.
//!
//! Matches the teacher crate's preference for a plain enum with hand-rolled
//! `Display`/`std::error::Error` impls over a derive-macro crate: there is
//! no `thiserror` dependency here, by design.

use std::fmt;

/// Errors `generate` can return. Depth exhaustion is deliberately *not* a
/// variant here: running out of depth is informational, not a failure, and
/// never gets constructed as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationError {
    /// A nonterminal's alternative list was empty.
    InvalidGrammar { nonterminal: u8 },
    /// The start symbol is not a key of the rule table.
    StartSymbolMissing { start: u8 },
    /// A worker in the free-queue strategy observed an inconsistent
    /// quiescence state. Should be unreachable.
    InternalQuiescenceViolation,
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            GenerationError::InvalidGrammar { nonterminal } => write!(
                f,
                "nonterminal {:?} has an empty alternative list",
                nonterminal as char
            ),
            GenerationError::StartSymbolMissing { start } => write!(
                f,
                "start symbol {:?} is not a key of the rule table",
                start as char
            ),
            GenerationError::InternalQuiescenceViolation => write!(
                f,
                "free-queue strategy observed an inconsistent quiescence state"
            ),
        }
    }
}

impl std::error::Error for GenerationError {}
