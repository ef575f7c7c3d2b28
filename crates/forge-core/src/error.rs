use thiserror::Error;

/// Failure kinds that can arise inside the pure, synchronous pipeline
/// (bitfield algebra, max-cover, identity hashing, aggregation, sort).
///
/// Mirrors the `InvalidArgument` / `CryptoFailure` / `Fatal` rows of the
/// error taxonomy in spec.md §7; the I/O-flavored rows (`PoolUnavailable`,
/// `BuilderError`, `EngineError`, `TransitionFailure`) live one layer up in
/// `forge-node::error::ProposerError`, since they only make sense once a
/// collaborator (pool, engine, builder) is in the picture.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("BLS operation failed: {0}")]
    CryptoFailure(String),

    #[error("invariant violated: {0}")]
    Fatal(String),
}
