//! Attestation identity (C3) and packing pipeline (C4).

pub mod identity;
pub mod pipeline;

pub use identity::{compute_id, data_id, AttestationId, DataId};
pub use pipeline::{pack, partition_by_fork, PackingStrategy};
