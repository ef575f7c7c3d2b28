//! C6: the operations packer. Glue that fetches deposits, voluntary exits,
//! proposer/attester slashings, BLS-to-execution changes and the eth1-vote
//! winner — everything `BeaconBlockBody` needs besides attestations (C4)
//! and the sync aggregate (C5), which have their own modules.
//!
//! Per spec §7's propagation policy, every step here is independently
//! recoverable: a collaborator failure degrades that one field to its
//! empty/default value with a warn log rather than failing the whole
//! proposal.

use forge_core::types::{
    AttesterSlashing, ChainSpec, Deposit, Eth1Data, ProposerSlashing, SignedBlsToExecutionChange,
    SignedVoluntaryExit, Slot,
};

use crate::collaborators::{
    BeaconState, BlsChangesPool, DepositSource, Eth1VoteSource, ExitPool, SlashingPool,
};

/// Everything C9 needs from C6 besides attestations and the sync aggregate.
pub struct PackedOperations {
    pub eth1_data: Eth1Data,
    pub deposits: Vec<Deposit>,
    pub proposer_slashings: Vec<ProposerSlashing>,
    pub attester_slashings: Vec<AttesterSlashing>,
    pub voluntary_exits: Vec<SignedVoluntaryExit>,
    pub bls_to_execution_changes: Vec<SignedBlsToExecutionChange>,
}

/// Collect every operation category, degrading independently recoverable
/// failures to empty/default per-field rather than bubbling them up.
#[allow(clippy::too_many_arguments)]
pub fn pack(
    state: &dyn BeaconState,
    slot: Slot,
    spec: &ChainSpec,
    eth1_source: &dyn Eth1VoteSource,
    deposit_source: &dyn DepositSource,
    slashing_pool: &dyn SlashingPool,
    exit_pool: &dyn ExitPool,
    bls_changes_pool: &dyn BlsChangesPool,
) -> PackedOperations {
    let eth1_data = match eth1_source.winning_vote(state) {
        Ok(Some(data)) => data,
        Ok(None) => Eth1Data::default(),
        Err(e) => {
            tracing::warn!(slot, error = %e, "eth1 vote source unavailable; reusing default eth1_data");
            Eth1Data::default()
        }
    };

    let deposits = match deposit_source.for_inclusion(state, &eth1_data, max_deposits_per_block()) {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!(slot, error = %e, "deposit source unavailable; including no deposits");
            Vec::new()
        }
    };

    let mut proposer_slashings = slashing_pool.pending_proposer(state);
    proposer_slashings.truncate(spec.max_proposer_slashings);

    let mut attester_slashings = slashing_pool.pending_attester(state);
    attester_slashings.truncate(spec.max_attester_slashings);

    // Per spec §4.6: exits fetched without the pool's proposal-count limit
    // once per epoch boundary slot isn't modeled here, so this always
    // respects the pool's own cap (`no_limit = false`).
    let mut voluntary_exits = exit_pool.pending(state, slot, false);
    voluntary_exits.truncate(spec.max_voluntary_exits);

    let bls_to_execution_changes = match bls_changes_pool.for_inclusion(state) {
        Ok(mut changes) => {
            changes.truncate(spec.max_bls_to_execution_changes);
            changes
        }
        Err(e) => {
            tracing::warn!(slot, error = %e, "bls-to-execution change pool unavailable; including none");
            Vec::new()
        }
    };

    PackedOperations {
        eth1_data,
        deposits,
        proposer_slashings,
        attester_slashings,
        voluntary_exits,
        bls_to_execution_changes,
    }
}

/// Deposits aren't capacity-bounded by `ChainSpec` the way the other
/// operation lists are (spec treats the deposit queue as externally
/// managed); the protocol constant is fixed regardless of fork.
fn max_deposits_per_block() -> usize {
    16
}
