//! C9: the proposal constructor. The single public entry point this crate
//! exists to provide — everything else (C4-C8) is glue this module wires
//! together.

use forge_core::types::{
    BeaconBlock, BeaconBlockBody, BlobsBundle, BlsPubkey, BlsSignature, ChainSpec, CommonBodyFields,
    ValidatorIndex,
};

use crate::collaborators::{
    AttestationPool, BeaconState, BlockBuilder, BlsChangesPool, DepositSource, Eth1VoteSource,
    ExecutionEngine, ExitPool, ForkChoiceStore, SlashingPool, StateTransition, SyncCommitteePool,
    ValidatorRegistry,
};
use crate::config::ProposerConfig;
use crate::error::ProposerError;
use crate::metrics::ProposerMetrics;
use crate::packing::{attestations, operations, sync_aggregate};
use crate::payload::arbitration;

/// Every collaborator `build_proposal` needs, gathered so the public
/// signature stays close to spec §4.9's.
pub struct Collaborators<'a> {
    pub attestation_pool: &'a dyn AttestationPool,
    pub sync_committee_pool: &'a dyn SyncCommitteePool,
    pub exit_pool: &'a dyn ExitPool,
    pub slashing_pool: &'a dyn SlashingPool,
    pub bls_changes_pool: &'a dyn BlsChangesPool,
    pub eth1_source: &'a dyn Eth1VoteSource,
    pub deposit_source: &'a dyn DepositSource,
    pub engine: &'a dyn ExecutionEngine,
    pub builder: &'a dyn BlockBuilder,
    pub validator_registry: &'a dyn ValidatorRegistry,
    pub fork_choice: &'a dyn ForkChoiceStore,
    pub state_transition: &'a dyn StateTransition,
}

fn empty_body_for_fork(spec: &ChainSpec, slot: forge_core::types::Slot) -> BeaconBlockBody {
    let common = CommonBodyFields::default();
    if spec.is_post_deneb(slot) {
        BeaconBlockBody::Deneb {
            common,
            attestations: Vec::new(),
            sync_aggregate: forge_core::types::SyncAggregate::empty(spec.sync_committee_size),
            execution: forge_core::types::ExecutionData::Full(empty_execution_payload()),
            bls_to_execution_changes: Vec::new(),
            blob_kzg_commitments: Vec::new(),
        }
    } else if spec.is_post_capella(slot) {
        BeaconBlockBody::Capella {
            common,
            attestations: Vec::new(),
            sync_aggregate: forge_core::types::SyncAggregate::empty(spec.sync_committee_size),
            execution: forge_core::types::ExecutionData::Full(empty_execution_payload()),
            bls_to_execution_changes: Vec::new(),
        }
    } else if spec.is_post_bellatrix(slot) {
        BeaconBlockBody::Bellatrix {
            common,
            attestations: Vec::new(),
            sync_aggregate: forge_core::types::SyncAggregate::empty(spec.sync_committee_size),
            execution: forge_core::types::ExecutionData::Full(empty_execution_payload()),
        }
    } else if spec.is_post_altair(slot) {
        BeaconBlockBody::Altair {
            common,
            attestations: Vec::new(),
            sync_aggregate: forge_core::types::SyncAggregate::empty(spec.sync_committee_size),
        }
    } else {
        BeaconBlockBody::Phase0 { common, attestations: Vec::new() }
    }
}

fn empty_execution_payload() -> forge_core::types::ExecutionPayload {
    forge_core::types::ExecutionPayload {
        parent_hash: forge_core::types::Root::zero(),
        block_hash: forge_core::types::Root::zero(),
        fee_recipient: [0u8; 20],
        timestamp: 0,
        transactions_root: forge_core::types::ExecutionPayloadHeader::EMPTY_TRANSACTIONS_ROOT,
        withdrawals_root: forge_core::types::Root::zero(),
        blob_gas_used: None,
        excess_blob_gas: None,
    }
}

/// Fill in attestations, sync aggregate, and execution data on an
/// already fork-shaped empty body, produced by `empty_body_for_fork`.
fn populate_body(
    body: &mut BeaconBlockBody,
    operations: operations::PackedOperations,
    atts: Vec<forge_core::types::Att>,
    sync_agg: forge_core::types::SyncAggregate,
    payload: arbitration::PayloadChoice,
    randao_reveal: BlsSignature,
    graffiti: [u8; 32],
) -> Option<BlobsBundle> {
    let common = CommonBodyFields {
        randao_reveal,
        eth1_data: operations.eth1_data,
        graffiti,
        proposer_slashings: operations.proposer_slashings,
        attester_slashings: operations.attester_slashings,
        deposits: operations.deposits,
        voluntary_exits: operations.voluntary_exits,
    };

    match body {
        BeaconBlockBody::Phase0 { common: c, attestations: a } => {
            *c = common;
            *a = atts;
            None
        }
        BeaconBlockBody::Altair { common: c, attestations: a, sync_aggregate: s } => {
            *c = common;
            *a = atts;
            *s = sync_agg;
            None
        }
        BeaconBlockBody::Bellatrix { common: c, attestations: a, sync_aggregate: s, execution: e } => {
            *c = common;
            *a = atts;
            *s = sync_agg;
            *e = payload.execution;
            payload.blobs_bundle
        }
        BeaconBlockBody::Capella { common: c, attestations: a, sync_aggregate: s, execution: e, bls_to_execution_changes: b } => {
            *c = common;
            *a = atts;
            *s = sync_agg;
            *e = payload.execution;
            *b = operations.bls_to_execution_changes;
            payload.blobs_bundle
        }
        BeaconBlockBody::Deneb { common: c, attestations: a, sync_aggregate: s, execution: e, bls_to_execution_changes: b, blob_kzg_commitments: k } => {
            *c = common;
            *a = atts;
            *s = sync_agg;
            *e = payload.execution;
            *b = operations.bls_to_execution_changes;
            if let Some(bundle) = &payload.blobs_bundle {
                *k = bundle.commitments.clone();
            }
            payload.blobs_bundle
        }
    }
}

/// The single public operation this crate exists to provide (spec §4.9):
/// given a head state and a target slot, assemble a beacon block body that
/// maximizes proposer reward while staying valid under consensus rules.
#[allow(clippy::too_many_arguments)]
pub async fn build_proposal(
    state: &dyn BeaconState,
    slot: forge_core::types::Slot,
    proposer_index: ValidatorIndex,
    proposer_pubkey: BlsPubkey,
    randao_reveal: BlsSignature,
    graffiti: [u8; 32],
    fee_recipient: [u8; 20],
    builder_boost_factor: u64,
    spec: &ChainSpec,
    config: &ProposerConfig,
    metrics: &ProposerMetrics,
    collaborators: Collaborators<'_>,
) -> Result<(BeaconBlock, Option<BlobsBundle>), ProposerError> {
    let parent_root = state.head_block_root();
    let mut body = empty_body_for_fork(spec, slot);

    // C6 (operations) and the packer/aggregator halves of C4/C5 are CPU-bound
    // and run synchronously within their half of the join; only C7 actually
    // suspends on network I/O. Still structured as a `tokio::join!` so the
    // two halves race rather than sequence (spec §4.9 step 3, §5.1).
    let operations_and_packing = async {
        let _t = metrics.timer("operations_packer");
        let c6 = operations::pack(
            state,
            slot,
            spec,
            collaborators.eth1_source,
            collaborators.deposit_source,
            collaborators.slashing_pool,
            collaborators.exit_pool,
            collaborators.bls_changes_pool,
        );
        drop(_t);

        let _t = metrics.timer("attestations_and_sync");
        let sourced = attestations::source_and_filter(collaborators.attestation_pool, slot, spec)?;
        let atts = attestations::pack_and_verify(sourced, slot, spec, config.attestation_packing_strategy, state)?;
        let sync_agg = sync_aggregate::build(collaborators.sync_committee_pool, slot, parent_root, spec);
        Ok::<_, ProposerError>((c6, atts, sync_agg))
    };

    let payload_arbitration = arbitration::arbitrate(
        collaborators.engine,
        collaborators.builder,
        collaborators.validator_registry,
        collaborators.fork_choice,
        state,
        slot,
        proposer_index,
        proposer_pubkey,
        fee_recipient,
        builder_boost_factor,
        spec,
        config,
        metrics,
    );

    let (operations_result, payload) = tokio::join!(operations_and_packing, payload_arbitration);
    let (c6, atts, sync_agg) = operations_result?;
    let payload = payload?;

    let blobs_bundle = populate_body(&mut body, c6, atts, sync_agg, payload, randao_reveal, graffiti);

    let mut block = BeaconBlock {
        slot,
        proposer_index,
        parent_root,
        state_root: forge_core::types::Root::zero(),
        body,
    };

    let _t = metrics.timer("state_root");
    let state_root = collaborators
        .state_transition
        .compute_state_root(state, &block)
        .map_err(|e| ProposerError::TransitionFailure { slot, source: anyhow::anyhow!(e) })?;
    block.state_root = state_root;

    let blinded = block.body.is_blinded();
    Ok((block, if blinded { None } else { blobs_bundle }))
}
