//! C5's pool I/O: pull the slot's sync-committee contributions and hand
//! them to the pure aggregator in `forge_core::sync_aggregate`.

use forge_core::types::{ChainSpec, Root, Slot, SyncAggregate};

use crate::collaborators::SyncCommitteePool;

/// Build the block's `sync_aggregate`. A pool failure degrades to the empty
/// aggregate rather than failing the whole proposal (spec §4.5: sync
/// aggregation is best-effort, unlike attestation packing).
pub fn build(
    pool: &dyn SyncCommitteePool,
    slot: Slot,
    expected_parent_root: Root,
    spec: &ChainSpec,
) -> SyncAggregate {
    let contributions = match pool.contributions(slot) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(slot, error = %e, "sync committee pool unavailable; emitting empty aggregate");
            return SyncAggregate::empty(spec.sync_committee_size);
        }
    };

    match forge_core::sync_aggregate::build(contributions, expected_parent_root, spec) {
        Ok(agg) => agg,
        Err(e) => {
            tracing::warn!(slot, error = %e, "sync aggregate construction failed; emitting empty aggregate");
            SyncAggregate::empty(spec.sync_committee_size)
        }
    }
}
