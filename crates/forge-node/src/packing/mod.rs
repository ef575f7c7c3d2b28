//! Pool I/O and collaborator-facing wrappers around the pure packing cores
//! in `forge-core` (C4, C5) plus the remaining per-slot operations (C6).

pub mod attestations;
pub mod operations;
pub mod sync_aggregate;
