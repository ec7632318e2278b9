use thiserror::Error;

use crate::corpus::SegmentId;

/// A corpus id did not match what the caller assumed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("segment {0} is already present in the corpus")]
    DuplicateId(SegmentId),
    #[error("segment {0} is not present in the corpus")]
    MissingId(SegmentId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FindError {
    #[error("you must enter some text to search for")]
    EmptyPattern,
    #[error("invalid regular expression `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("placeholder \\{index} does not exist, the pattern has {capture_count} capture(s)")]
    Placeholder { index: usize, capture_count: usize },
    #[error("there is no current match to replace")]
    NoCurrentMatch,
}

pub type Result<T> = std::result::Result<T, FindError>;
