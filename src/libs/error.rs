use crate::libs::extended::Origin;
use thiserror::Error;

/// Fatal conditions of the decomposition and merge core. None of them are retried.
#[derive(Error, Debug)]
pub enum DivError {
    /// Incompatible or incomplete inputs, detected before any computation starts.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The stated backbone size disagrees with the backbone alignment.
    #[error("Backbone size mismatch: stated {stated}, backbone alignment has {actual} taxa")]
    Sizing { stated: usize, actual: usize },

    #[error(transparent)]
    MergeConsistency(#[from] MergeConsistencyError),

    /// An expected chunk or subset result is absent and the policy asks to fail.
    #[error("Missing result: {0}")]
    MissingResult(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A fold met two alignments that do not share one backbone coordinate system.
/// This signals an upstream invariant violation, not a user error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Merge consistency error in {origin}: {conflict}")]
pub struct MergeConsistencyError {
    pub origin: Origin,
    pub conflict: Conflict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    BackboneWidth {
        expected: usize,
        found: usize,
    },
    Symbol {
        name: String,
        column: usize,
        expected: u8,
        found: u8,
    },
    Insertion {
        name: String,
        anchor: usize,
    },
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Conflict::BackboneWidth { expected, found } => write!(
                f,
                "backbone column count {} differs from expected {}",
                found, expected
            ),
            Conflict::Symbol {
                name,
                column,
                expected,
                found,
            } => write!(
                f,
                "sequence {} has '{}' at backbone column {}, expected '{}'",
                name, *found as char, column, *expected as char
            ),
            Conflict::Insertion { name, anchor } => write!(
                f,
                "sequence {} has two different insertions at anchor {}",
                name, anchor
            ),
        }
    }
}
