use thiserror::Error;

/// A criteria string that fails to lex or fails the follow-token grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} (at byte {position})")]
pub struct LexError {
    pub reason: String,
    pub position: usize,
}

impl LexError {
    pub fn new(reason: impl Into<String>, position: usize) -> Self {
        LexError {
            reason: reason.into(),
            position,
        }
    }
}
