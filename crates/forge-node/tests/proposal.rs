//! End-to-end exercise of C9 using the in-memory fakes from
//! `forge_node::testing`, standing in for a real beacon database, execution
//! engine, and builder.

use forge_core::types::{BlsPubkey, BlsSignature, ChainSpec};
use forge_node::collaborators::LocalPayloadResult;
use forge_node::config::ProposerConfig;
use forge_node::metrics::ProposerMetrics;
use forge_node::testing::*;
use forge_node::{build_proposal, Collaborators};

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

/// Phase0-slot proposal with every pool empty and no builder bid: C7 still
/// runs, but the Phase0 body never reads the winning payload. Exercises the
/// full C6/C7 join plus state-root computation.
#[tokio::test]
async fn builds_a_minimal_phase0_proposal() {
    let spec = ChainSpec::mainnet();
    let config = ProposerConfig::default();
    let metrics = ProposerMetrics::default();

    let state = FakeBeaconState::default();
    let attestation_pool = FakeAttestationPool::default();
    let sync_committee_pool = FakeSyncCommitteePool::default();
    let exit_pool = FakeExitPool::default();
    let slashing_pool = FakeSlashingPool::default();
    let bls_changes_pool = FakeBlsChangesPool::default();
    let eth1_source = FakeEth1VoteSource::default();
    let deposit_source = FakeDepositSource::default();
    let engine = FakeExecutionEngine {
        payload: LocalPayloadResult {
            payload: empty_execution_payload(),
            value_wei: alloy_primitives::U256::ZERO,
            blobs_bundle: None,
            override_builder: false,
        },
    };
    let builder = FakeBlockBuilder::default();
    let validator_registry = AlwaysRegistered;
    let fork_choice = FakeForkChoiceStore::default();
    let state_transition = NoopStateTransition;

    let collaborators = Collaborators {
        attestation_pool: &attestation_pool,
        sync_committee_pool: &sync_committee_pool,
        exit_pool: &exit_pool,
        slashing_pool: &slashing_pool,
        bls_changes_pool: &bls_changes_pool,
        eth1_source: &eth1_source,
        deposit_source: &deposit_source,
        engine: &engine,
        builder: &builder,
        validator_registry: &validator_registry,
        fork_choice: &fork_choice,
        state_transition: &state_transition,
    };

    let (block, blobs_bundle) = build_proposal(
        &state,
        0,
        7,
        BlsPubkey::from_bytes(&[0u8; 48]).unwrap(),
        BlsSignature::infinity(),
        [0u8; 32],
        [0u8; 20],
        100,
        &spec,
        &config,
        &metrics,
        collaborators,
    )
    .await
    .expect("proposal construction should succeed with every collaborator empty");

    assert_eq!(block.slot, 0);
    assert_eq!(block.proposer_index, 7);
    assert!(matches!(block.body, forge_core::types::BeaconBlockBody::Phase0 { .. }));
    assert!(blobs_bundle.is_none());
}

/// A tripped circuit breaker (no registered validator) must never select
/// the builder even if one is offered — the arbitration layer should not
/// even attempt the request.
#[tokio::test]
async fn unregistered_validator_skips_builder_without_error() {
    let spec = ChainSpec::mainnet();
    let config = ProposerConfig::default();
    let metrics = ProposerMetrics::default();
    let state = FakeBeaconState { slot: spec.bellatrix_fork_epoch * spec.slots_per_epoch, ..Default::default() };

    let attestation_pool = FakeAttestationPool::default();
    let sync_committee_pool = FakeSyncCommitteePool::default();
    let exit_pool = FakeExitPool::default();
    let slashing_pool = FakeSlashingPool::default();
    let bls_changes_pool = FakeBlsChangesPool::default();
    let eth1_source = FakeEth1VoteSource::default();
    let deposit_source = FakeDepositSource::default();
    let engine = FakeExecutionEngine {
        payload: LocalPayloadResult {
            payload: empty_execution_payload(),
            value_wei: alloy_primitives::U256::from(10u64),
            blobs_bundle: None,
            override_builder: false,
        },
    };
    let builder = FakeBlockBuilder::default();

    struct NeverRegistered;
    impl forge_node::collaborators::ValidatorRegistry for NeverRegistered {
        fn is_registered(&self, _validator_index: forge_core::types::ValidatorIndex) -> bool {
            false
        }
    }
    let validator_registry = NeverRegistered;
    let fork_choice = FakeForkChoiceStore::default();
    let state_transition = NoopStateTransition;

    let slot = state.slot;
    let collaborators = Collaborators {
        attestation_pool: &attestation_pool,
        sync_committee_pool: &sync_committee_pool,
        exit_pool: &exit_pool,
        slashing_pool: &slashing_pool,
        bls_changes_pool: &bls_changes_pool,
        eth1_source: &eth1_source,
        deposit_source: &deposit_source,
        engine: &engine,
        builder: &builder,
        validator_registry: &validator_registry,
        fork_choice: &fork_choice,
        state_transition: &state_transition,
    };

    let (block, _) = build_proposal(
        &state,
        slot,
        3,
        BlsPubkey::from_bytes(&[0u8; 48]).unwrap(),
        BlsSignature::infinity(),
        [0u8; 32],
        [0u8; 20],
        100,
        &spec,
        &config,
        &metrics,
        collaborators,
    )
    .await
    .expect("local payload should still win when builder is skipped");

    assert!(!block.body.is_blinded());
}
