//! Error taxonomy shared by the store, query engine, domain rules and
//! dispatcher.
//!
//! Lower layers return the most specific variant they can; the dispatcher
//! adds `InvalidArgument` / `UnknownOperation` at its own boundary and folds
//! anything unanticipated into `Internal` with the cause preserved.

use rust_decimal::Decimal;
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("id '{id}' already exists in {collection}")]
    DuplicateKey { collection: String, id: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("operation not permitted: {0}")]
    InvalidState(String),

    #[error("tendered {tendered} does not cover cart total {total}")]
    PaymentInsufficient { tendered: Decimal, total: Decimal },

    #[error("requested {requested} points but balance is {balance}")]
    InsufficientBalance { balance: i64, requested: i64 },

    /// A multi-collection operation applied some steps and then failed.
    /// `completed` lists what is already applied; nothing is rolled back.
    #[error("failed at step '{step}' after {} completed step(s): {source}", completed.len())]
    PartialFailure {
        completed: Vec<String>,
        step: String,
        #[source]
        source: Box<EngineError>,
    },

    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    #[error("internal error: {0}")]
    Internal(#[from] serde_json::Error),
}

impl EngineError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Wraps `source` as a partial failure, recording the steps that did run.
    pub fn partial(completed: Vec<String>, step: impl Into<String>, source: EngineError) -> Self {
        Self::PartialFailure {
            completed,
            step: step.into(),
            source: Box::new(source),
        }
    }

    /// Stable kind string reported in response envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NotFound",
            Self::DuplicateKey { .. } => "DuplicateKey",
            Self::InvalidArgument(_) => "InvalidArgument",
            Self::InvalidState(_) => "InvalidState",
            Self::PaymentInsufficient { .. } => "PaymentInsufficient",
            Self::InsufficientBalance { .. } => "InsufficientBalance",
            Self::PartialFailure { .. } => "PartialFailure",
            Self::UnknownOperation(_) => "UnknownOperation",
            Self::Internal(_) => "InternalError",
        }
    }

    /// For partial failures, the steps that were already applied.
    pub fn completed_steps(&self) -> Option<&[String]> {
        match self {
            Self::PartialFailure { completed, .. } => Some(completed),
            _ => None,
        }
    }
}
