//! C4's pool I/O and signature-verification dispatch, wrapping the pure
//! pipeline in `forge_core::attestation::pipeline`.

use forge_core::types::{Att, ChainSpec, Slot};

use crate::collaborators::{AttestationPool, BeaconState};
use crate::error::ProposerError;

/// Stand-in for `verify_attestation_no_verify_signature` (spec §4.4.1):
/// committee shuffling and full state-transition validity are out of scope
/// here (external collaborators per spec §1), so this checks only what the
/// packer itself can: the attestation cannot vote for a slot after the
/// block being built, and its target epoch must be the current or previous
/// one relative to the block slot — the same conservative conjunction spec
/// §9's open question resolves `filter_current_epoch_attestation_by_forkchoice`
/// to.
fn basic_validity_check(att: &Att, block_slot: Slot, spec: &ChainSpec) -> bool {
    let data = att.data();
    if data.slot > block_slot {
        return false;
    }
    let block_epoch = spec.epoch_at_slot(block_slot);
    let target_epoch = data.target.epoch;
    target_epoch == block_epoch || target_epoch + 1 == block_epoch
}

/// Drain both pool partitions, delete anything that no longer validates
/// against the latest state, and return the valid survivors. Deletion
/// happens after the snapshot is taken but before the caller emits a block
/// (spec §5's ordering guarantee: a crash in between leaks nothing).
pub fn source_and_filter(
    pool: &dyn AttestationPool,
    block_slot: Slot,
    spec: &ChainSpec,
) -> Result<Vec<Att>, ProposerError> {
    let mut valid = Vec::new();

    for att in pool.aggregated() {
        if basic_validity_check(&att, block_slot, spec) {
            valid.push(att);
        } else {
            pool.delete_aggregated(&att);
        }
    }

    for att in pool
        .unaggregated()
        .map_err(|e| ProposerError::pool_unavailable("attestation_pool.unaggregated", e))?
    {
        if basic_validity_check(&att, block_slot, spec) {
            valid.push(att);
        } else {
            pool.delete_unaggregated(&att);
        }
    }

    Ok(valid)
}

/// Node's view of the current/previous epoch targets, used to decide which
/// attestations bypass signature verification (spec §4.4.8: attestations
/// whose target checkpoint matches either are assumed pre-verified by
/// gossip).
fn bypasses_signature_check(att: &Att, state: &dyn BeaconState) -> bool {
    let target = att.data().target;
    target == state.current_epoch_target() || target == state.previous_epoch_target()
}

/// Aggregate the pubkeys of an attestation's participating members. Real
/// committee shuffling is out of scope (spec §1); this treats each set bit
/// index in `aggregation_bits` as a direct validator index, which is the
/// simplification the fake pools in `testing` also assume.
fn attesting_pubkeys(
    att: &Att,
    state: &dyn BeaconState,
) -> Result<Vec<forge_core::types::BlsPubkey>, ProposerError> {
    att.aggregation_bits()
        .as_slice()
        .iter()
        .enumerate()
        .filter_map(|(idx, set)| set.then_some(idx))
        .map(|idx| {
            state
                .validator_pubkey(idx as u64)
                .ok_or_else(|| ProposerError::Fatal(format!("no pubkey for validator index {idx}")))
        })
        .collect()
}

/// Run the pure C4 pipeline, then verify the resulting attestations'
/// signatures: bypass anything gossip already covered, batch-verify the
/// rest, and on batch failure fall back to per-item verification, dropping
/// individual failures rather than poisoning the whole block (spec §4.4.8).
pub fn pack_and_verify(
    atts: Vec<Att>,
    block_slot: Slot,
    spec: &ChainSpec,
    strategy: forge_core::attestation::PackingStrategy,
    state: &dyn BeaconState,
) -> Result<Vec<Att>, ProposerError> {
    let packed = forge_core::attestation::pack(atts, block_slot, spec, strategy)?;

    let (bypassed, to_verify): (Vec<Att>, Vec<Att>) =
        packed.into_iter().partition(|a| bypasses_signature_check(a, state));

    if to_verify.is_empty() {
        return Ok(bypassed);
    }

    let mut pubkeys_per_att = Vec::with_capacity(to_verify.len());
    let mut messages = Vec::with_capacity(to_verify.len());
    for att in &to_verify {
        let pubkeys = attesting_pubkeys(att, state)?;
        let aggregate_pk = forge_core::crypto::aggregate_pubkeys(&pubkeys)?;
        let message = forge_core::ssz::hash_tree_root_attestation_data(att.data());
        pubkeys_per_att.push(aggregate_pk);
        messages.push(message);
    }

    let batch_items: Vec<_> = to_verify
        .iter()
        .zip(pubkeys_per_att.iter())
        .zip(messages.iter())
        .map(|((att, pk), msg)| (pk, msg.0.as_slice(), att.signature()))
        .collect();

    let batch_ok = forge_core::crypto::batch_verify(&batch_items)?;

    let mut verified = bypassed;
    if batch_ok {
        verified.extend(to_verify);
    } else {
        tracing::warn!(slot = block_slot, "attestation batch verify failed; falling back to per-item verification");
        for ((att, pk), msg) in to_verify.into_iter().zip(pubkeys_per_att.into_iter()).zip(messages.into_iter()) {
            match forge_core::crypto::verify_one(&pk, &msg.0, att.signature()) {
                Ok(true) => verified.push(att),
                Ok(false) => tracing::warn!("dropping attestation with invalid signature"),
                Err(e) => tracing::warn!(error = %e, "dropping attestation: signature verification errored"),
            }
        }
    }

    Ok(verified)
}
