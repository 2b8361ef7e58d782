use thiserror::Error;

/// A smart-collection criterion received an operation outside its family,
/// or a value its family cannot parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("smart-collection criterion \"{criterion}\": {reason}")]
pub struct SmartError {
    pub criterion: String,
    pub reason: String,
}

impl SmartError {
    pub fn new(criterion: impl Into<String>, reason: impl Into<String>) -> Self {
        SmartError { criterion: criterion.into(), reason: reason.into() }
    }
}
