//! C7: payload-source arbitration between a locally-built execution payload
//! and an externally-bid ("builder") payload.

use std::time::Duration;

use alloy_primitives::U256;

use forge_core::domain::{compute_domain, compute_signing_root, DOMAIN_APPLICATION_BUILDER};
use forge_core::types::{
    BlsPubkey, ChainSpec, ExecutionData, ExecutionPayloadHeader, Root, Slot, ValidatorIndex,
};

use crate::collaborators::{
    BeaconState, BlockBuilder, ExecutionEngine, ForkChoiceStore, LocalPayloadResult, ValidatorRegistry,
};
use crate::config::ProposerConfig;
use crate::error::ProposerError;
use crate::metrics::ProposerMetrics;
use crate::payload::circuit_breaker;

/// The winning payload plus whatever C9 needs to assemble the right body
/// variant around it.
pub struct PayloadChoice {
    pub execution: ExecutionData,
    pub blobs_bundle: Option<forge_core::types::BlobsBundle>,
}

struct BuilderCandidate {
    header: ExecutionPayloadHeader,
    value_wei: U256,
    blob_kzg_commitments: Option<Vec<[u8; 48]>>,
}

/// Validate a signed builder bid per spec §4.7.2. Any failure returns
/// `None` — the caller treats that as "no bid" and never errors the whole
/// proposal over it.
#[allow(clippy::too_many_arguments)]
fn validate_bid(
    bid: &forge_core::types::SignedBuilderBid,
    slot: Slot,
    spec: &ChainSpec,
    genesis_time: u64,
    genesis_validators_root: Root,
    head_execution_block_hash: Root,
    validator_pubkey: &BlsPubkey,
) -> Option<BuilderCandidate> {
    if bid.bid.value_wei.is_zero() {
        tracing::debug!(slot, "builder bid rejected: zero value");
        return None;
    }
    if bid.bid.pubkey != *validator_pubkey {
        tracing::debug!(slot, "builder bid rejected: signed by an unexpected builder pubkey");
    }
    if bid.bid.header.transactions_root == ExecutionPayloadHeader::EMPTY_TRANSACTIONS_ROOT {
        tracing::debug!(slot, "builder bid rejected: empty transactions root");
        return None;
    }
    if bid.bid.header.parent_hash != head_execution_block_hash {
        tracing::debug!(slot, "builder bid rejected: parent hash mismatch");
        return None;
    }
    let expected_timestamp = spec.slot_start_time(slot, genesis_time);
    if bid.bid.header.timestamp != expected_timestamp {
        tracing::debug!(slot, "builder bid rejected: timestamp mismatch");
        return None;
    }
    if spec.is_post_deneb(slot) {
        match &bid.bid.blob_kzg_commitments {
            Some(commitments) if commitments.len() > spec.max_blobs_per_block => {
                tracing::debug!(slot, "builder bid rejected: oversized kzg commitment list");
                return None;
            }
            _ => {}
        }
    }

    let bid_root = forge_core::ssz::hash_tree_root_builder_bid(&bid.bid);
    let fork_version = spec.fork_version_at(spec.epoch_at_slot(slot));
    let domain = compute_domain(DOMAIN_APPLICATION_BUILDER, fork_version, genesis_validators_root);
    let signing_root = compute_signing_root(bid_root, domain);
    match forge_core::crypto::verify_one(&bid.bid.pubkey, &signing_root, &bid.signature) {
        Ok(true) => {}
        Ok(false) => {
            tracing::debug!(slot, "builder bid rejected: signature invalid");
            return None;
        }
        Err(e) => {
            tracing::debug!(slot, error = %e, "builder bid rejected: signature verification errored");
            return None;
        }
    }

    Some(BuilderCandidate {
        header: bid.bid.header.clone(),
        value_wei: bid.bid.value_wei,
        blob_kzg_commitments: bid.bid.blob_kzg_commitments.clone(),
    })
}

/// Request the local payload. Always attempted, regardless of the builder's
/// availability (spec §4.7.1).
async fn request_local(
    engine: &dyn ExecutionEngine,
    state: &dyn BeaconState,
    fee_recipient: [u8; 20],
    slot: Slot,
    spec: &ChainSpec,
) -> Result<LocalPayloadResult, ProposerError> {
    let parent_hash = state.head_execution_block_hash();
    let timestamp = spec.slot_start_time(slot, state.genesis_time());
    let payload_id = engine
        .get_payload_id(parent_hash, timestamp, state.randao_mix(), fee_recipient)
        .await?;
    engine.get_payload(payload_id, slot).await
}

/// Request and validate the builder's bid, returning `None` on any
/// disqualifying condition including the 1-second timeout.
async fn request_builder(
    builder: &dyn BlockBuilder,
    slot: Slot,
    validator_index: ValidatorIndex,
    validator_pubkey: BlsPubkey,
    state: &dyn BeaconState,
    registry: &dyn ValidatorRegistry,
    fork_choice: &dyn ForkChoiceStore,
    spec: &ChainSpec,
    config: &ProposerConfig,
    metrics: &ProposerMetrics,
) -> Option<BuilderCandidate> {
    if !spec.is_post_bellatrix(slot) {
        return None;
    }
    if !circuit_breaker::can_use_builder(slot, validator_index, registry, fork_choice, spec, config, metrics) {
        return None;
    }

    let parent_hash = state.head_execution_block_hash();
    let request = builder.get_header(slot, parent_hash, validator_pubkey);
    let timeout = Duration::from_millis(config.builder_timeout_ms);
    let bid = match tokio::time::timeout(timeout, request).await {
        Ok(Ok(bid)) => bid,
        Ok(Err(e)) => {
            tracing::warn!(slot, error = %e, "builder request failed; falling back to local payload");
            metrics.builder_errors_total.inc();
            return None;
        }
        Err(_) => {
            tracing::warn!(slot, "builder request timed out; falling back to local payload");
            metrics.builder_errors_total.inc();
            return None;
        }
    };

    validate_bid(
        &bid,
        slot,
        spec,
        state.genesis_time(),
        state.genesis_validators_root(),
        parent_hash,
        &validator_pubkey,
    )
}

/// Selection rule (spec §4.7.3). Pre-Capella prefers the builder whenever a
/// bid is present; Capella+ compares boosted values and requires a matching
/// withdrawals root.
fn select_winner(
    local: &LocalPayloadResult,
    builder: &Option<BuilderCandidate>,
    slot: Slot,
    spec: &ChainSpec,
    state: &dyn BeaconState,
    config: &ProposerConfig,
    builder_boost_factor: u64,
) -> bool {
    let Some(candidate) = builder else {
        return false;
    };

    if !spec.is_post_capella(slot) {
        return true;
    }

    if candidate.header.withdrawals_root != state.expected_withdrawals_root() {
        return false;
    }
    if candidate.value_wei.is_zero() {
        return false;
    }

    let builder_value = candidate.value_wei.saturating_mul(U256::from(builder_boost_factor));
    let local_value = local.value_wei.saturating_mul(U256::from(100 + config.local_boost_percent));
    builder_value > local_value
}

/// Run the local and builder requests concurrently and pick the winner.
/// `override_builder`, if the engine signals it, cancels the builder race
/// outright and forces local (spec §4.7.1).
#[allow(clippy::too_many_arguments)]
pub async fn arbitrate(
    engine: &dyn ExecutionEngine,
    builder: &dyn BlockBuilder,
    registry: &dyn ValidatorRegistry,
    fork_choice: &dyn ForkChoiceStore,
    state: &dyn BeaconState,
    slot: Slot,
    validator_index: ValidatorIndex,
    validator_pubkey: BlsPubkey,
    fee_recipient: [u8; 20],
    builder_boost_factor: u64,
    spec: &ChainSpec,
    config: &ProposerConfig,
    metrics: &ProposerMetrics,
) -> Result<PayloadChoice, ProposerError> {
    let cancel = tokio_util::sync::CancellationToken::new();

    let local_fut = request_local(engine, state, fee_recipient, slot, spec);
    let builder_fut = {
        let cancel = cancel.clone();
        async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                candidate = request_builder(
                    builder, slot, validator_index, validator_pubkey, state, registry, fork_choice, spec, config, metrics,
                ) => candidate,
            }
        }
    };

    tokio::pin!(local_fut);
    tokio::pin!(builder_fut);

    let mut local_result = None;
    let mut builder_candidate = None;
    let mut builder_done = false;

    while local_result.is_none() || !builder_done {
        tokio::select! {
            res = &mut local_fut, if local_result.is_none() => {
                if let Ok(local) = &res {
                    if local.override_builder {
                        cancel.cancel();
                    }
                }
                local_result = Some(res);
            }
            res = &mut builder_fut, if !builder_done => {
                builder_candidate = res;
                builder_done = true;
            }
        }
    }

    let local = local_result.expect("loop only exits once local_fut has resolved")?;
    let builder_candidate = if local.override_builder { None } else { builder_candidate };

    let use_builder = select_winner(&local, &builder_candidate, slot, spec, state, config, builder_boost_factor);

    if use_builder {
        metrics.payload_winner_builder_total.inc();
        let candidate = builder_candidate.expect("select_winner only returns true when a candidate is present");
        Ok(PayloadChoice {
            execution: ExecutionData::Blinded(candidate.header),
            blobs_bundle: None,
        })
    } else {
        metrics.payload_winner_local_total.inc();
        if builder_candidate.is_some() {
            metrics.payload_fallback_to_local_total.inc();
        }
        Ok(PayloadChoice {
            execution: ExecutionData::Full(local.payload),
            blobs_bundle: local.blobs_bundle,
        })
    }
}
