use thiserror::Error;

/// Malformed Newick input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// `line` and `column` are 1-based. `snippet` is the unparsed input at that point.
    #[error("Newick parse error at line {line}, column {column}: {message} near \"{snippet}\"")]
    ParseError {
        message: String,
        line: usize,
        column: usize,
        snippet: String,
    },

    /// An arena operation on a node that is missing or in the wrong place.
    #[error("Tree logic error: {0}")]
    LogicError(String),
}
