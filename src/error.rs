//! Error types for presentations and the completion engine.

use thiserror::Error;

use crate::node::{Letter, NumLetters};

/// Errors surfaced by presentation validation and the Stephen engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The alphabet contains the same letter twice.
    #[error("duplicate letter {letter} in alphabet")]
    DuplicateLetter { letter: Letter },

    /// A rule or input word contains a letter outside the alphabet.
    #[error("letter {letter} does not belong to the alphabet of {alphabet_size} letters")]
    LetterOutOfBounds {
        letter: Letter,
        alphabet_size: NumLetters,
    },

    /// A rule side is empty but the presentation does not contain the empty word.
    #[error("rule {rule} has an empty side but the empty word is not admitted")]
    EmptyRuleSide { rule: usize },

    /// A query or `run` was invoked before `set_word`.
    #[error("no word has been set, call set_word first")]
    WordNotSet,

    /// A query needed the fixed point, but `run` has not converged
    /// (it was cancelled, or never invoked).
    #[error("the engine has not reached its fixed point, call run first")]
    NotFinished,

    /// Merging two nodes of an inverse-presentation engine would violate the
    /// involution. The engine is unusable until re-initialised.
    #[error("identifying nodes {a} and {b} is inconsistent with the involution on label {label}")]
    InverseInconsistency {
        a: crate::node::RawNode,
        b: crate::node::RawNode,
        label: Letter,
    },
}

/// Result type for all fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;
