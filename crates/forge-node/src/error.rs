//! Error taxonomy for the orchestration layer (spec §7). Wraps
//! [`forge_core::CoreError`] (the CPU-local kinds) plus the I/O-flavored
//! kinds that only make sense once a collaborator — a pool, the execution
//! engine, a builder — is in the picture.

use forge_core::types::Slot;
use forge_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProposerError {
    #[error("invalid request: {0}")]
    InvalidArgument(String),

    #[error("{collaborator} pool unavailable: {source}")]
    PoolUnavailable {
        collaborator: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("builder request failed ({reason}); falling back to local payload")]
    BuilderError { reason: String },

    #[error("execution engine request failed: {0}")]
    EngineError(String),

    #[error("state-transition failed while computing the state root for slot {slot}: {source}")]
    TransitionFailure {
        slot: Slot,
        #[source]
        source: anyhow::Error,
    },

    #[error("invariant violated: {0}")]
    Fatal(String),
}

impl ProposerError {
    pub fn pool_unavailable(collaborator: &'static str, source: impl Into<anyhow::Error>) -> Self {
        ProposerError::PoolUnavailable {
            collaborator,
            source: source.into(),
        }
    }
}
