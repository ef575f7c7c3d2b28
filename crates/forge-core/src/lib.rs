//! Pure, synchronous algorithmic core for the block-proposer assembly
//! pipeline: bitfield algebra (C1), max-cover selection (C2), attestation
//! identity (C3), the attestation packing pipeline (C4) and sync-contribution
//! pipeline (C5) minus their pool I/O, plus the block/payload data model and
//! the CPU-local error taxonomy.
//!
//! Nothing in this crate talks to a network, a database, or an async
//! runtime — the orchestration layer that does lives in `forge-node`.

pub mod attestation;
pub mod bitfield;
pub mod crypto;
pub mod domain;
pub mod error;
pub mod maxcover;
pub mod ssz;
pub mod sync_aggregate;
pub mod types;

pub use error::CoreError;
pub use types::ChainSpec;
