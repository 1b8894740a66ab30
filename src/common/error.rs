//! Error handling primitives shared across the core.
//!
//! Every variant maps onto a stable [`ErrorCode`] so that hosts on the other
//! side of the FFI boundary can branch on a number instead of a message.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::data::domain::{Isbn, UserId};
use crate::model::domain::ModelKind;

/// Stable error codes that cross the FFI boundary.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorCode {
    /// Success code used as a sentinel.
    Ok = 0,
    /// More recommendations were requested than unseen books exist.
    InsufficientCandidates = 1,
    /// Input failed validation.
    InvalidInput = 2,
    /// Requested model was not loaded.
    ModelMissing = 3,
    /// A predictor failed to score a user/book pair.
    Inference = 4,
    /// Filesystem access failed.
    Io = 5,
    /// A data file or model artefact could not be decoded.
    Data = 6,
    /// A response could not be encoded for the host.
    Internal = 7,
}

/// Canonical error type for the core.
#[derive(Debug, Error)]
pub enum BookrecError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("model {0} is not loaded")]
    ModelMissing(ModelKind),

    #[error("{kind} failed to score user {user} / book {item}: {reason}")]
    Inference {
        kind: ModelKind,
        user: UserId,
        item: Isbn,
        reason: String,
    },

    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed csv in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("column `{column}` missing from {}", path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("malformed model artefact {}: {source}", path.display())]
    Artefact {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("book {0} appears more than once in the catalog")]
    DuplicateItem(Isbn),
}

/// Result alias used throughout the crate.
pub type BookrecResult<T> = Result<T, BookrecError>;

impl BookrecError {
    /// Validation helper.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// IO helper that keeps the offending path for diagnostics.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Machine parsable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            BookrecError::InvalidInput(_) | BookrecError::DuplicateItem(_) => {
                ErrorCode::InvalidInput
            }
            BookrecError::ModelMissing(_) => ErrorCode::ModelMissing,
            BookrecError::Inference { .. } => ErrorCode::Inference,
            BookrecError::Io { .. } => ErrorCode::Io,
            BookrecError::Csv { .. }
            | BookrecError::MissingColumn { .. }
            | BookrecError::Artefact { .. } => ErrorCode::Data,
        }
    }
}
