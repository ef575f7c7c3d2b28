//! In-memory fakes for every §6.1/§6.2 collaborator trait, gated behind the
//! `test-util` feature so downstream integration tests don't have to stand
//! up a real beacon database or execution client.

use std::sync::Mutex;

use async_trait::async_trait;

use forge_core::types::{
    Att, AttesterSlashing, BeaconBlock, BlsPubkey, Checkpoint, Deposit, Eth1Data, ProposerSlashing,
    Root, Slot, SignedBlsToExecutionChange, SignedBuilderBid, SignedVoluntaryExit,
    SyncCommitteeContribution, ValidatorIndex,
};

use crate::collaborators::{
    AttestationPool, BeaconState, BlockBuilder, BlsChangesPool, DepositSource, Eth1VoteSource,
    ExecutionEngine, ExitPool, ForkChoiceStore, LocalPayloadResult, PayloadId, SlashingPool,
    StateTransition, SyncCommitteePool, ValidatorRegistry,
};
use crate::error::ProposerError;

#[derive(Debug, Clone)]
pub struct FakeBeaconState {
    pub slot: Slot,
    pub genesis_validators_root: Root,
    pub genesis_time: u64,
    pub head_block_root: Root,
    pub randao_mix: Root,
    pub current_epoch_target: Checkpoint,
    pub previous_epoch_target: Checkpoint,
    pub expected_withdrawals_root: Root,
    pub head_execution_block_hash: Root,
    pub pubkeys: std::collections::HashMap<ValidatorIndex, BlsPubkey>,
}

impl Default for FakeBeaconState {
    fn default() -> Self {
        Self {
            slot: 0,
            genesis_validators_root: Root::zero(),
            genesis_time: 0,
            head_block_root: Root::zero(),
            randao_mix: Root::zero(),
            current_epoch_target: Checkpoint::default(),
            previous_epoch_target: Checkpoint::default(),
            expected_withdrawals_root: Root::zero(),
            head_execution_block_hash: Root::zero(),
            pubkeys: std::collections::HashMap::new(),
        }
    }
}

impl BeaconState for FakeBeaconState {
    fn slot(&self) -> Slot {
        self.slot
    }
    fn genesis_validators_root(&self) -> Root {
        self.genesis_validators_root
    }
    fn genesis_time(&self) -> u64 {
        self.genesis_time
    }
    fn head_block_root(&self) -> Root {
        self.head_block_root
    }
    fn randao_mix(&self) -> Root {
        self.randao_mix
    }
    fn current_epoch_target(&self) -> Checkpoint {
        self.current_epoch_target
    }
    fn previous_epoch_target(&self) -> Checkpoint {
        self.previous_epoch_target
    }
    fn expected_withdrawals_root(&self) -> Root {
        self.expected_withdrawals_root
    }
    fn head_execution_block_hash(&self) -> Root {
        self.head_execution_block_hash
    }
    fn validator_pubkey(&self, validator_index: ValidatorIndex) -> Option<BlsPubkey> {
        self.pubkeys.get(&validator_index).copied()
    }
}

#[derive(Default)]
pub struct FakeAttestationPool {
    pub aggregated: Mutex<Vec<Att>>,
    pub unaggregated: Mutex<Vec<Att>>,
    pub deleted_aggregated: Mutex<Vec<Att>>,
    pub deleted_unaggregated: Mutex<Vec<Att>>,
}

impl AttestationPool for FakeAttestationPool {
    fn aggregated(&self) -> Vec<Att> {
        self.aggregated.lock().unwrap().clone()
    }
    fn unaggregated(&self) -> Result<Vec<Att>, ProposerError> {
        Ok(self.unaggregated.lock().unwrap().clone())
    }
    fn delete_aggregated(&self, att: &Att) {
        self.deleted_aggregated.lock().unwrap().push(att.clone());
    }
    fn delete_unaggregated(&self, att: &Att) {
        self.deleted_unaggregated.lock().unwrap().push(att.clone());
    }
}

#[derive(Default)]
pub struct FakeSyncCommitteePool {
    pub contributions: Vec<SyncCommitteeContribution>,
}

impl SyncCommitteePool for FakeSyncCommitteePool {
    fn contributions(&self, _slot: Slot) -> Result<Vec<SyncCommitteeContribution>, ProposerError> {
        Ok(self.contributions.clone())
    }
}

#[derive(Default)]
pub struct FakeExitPool {
    pub pending: Vec<SignedVoluntaryExit>,
}

impl ExitPool for FakeExitPool {
    fn pending(&self, _state: &dyn BeaconState, _slot: Slot, _no_limit: bool) -> Vec<SignedVoluntaryExit> {
        self.pending.clone()
    }
}

#[derive(Default)]
pub struct FakeSlashingPool {
    pub proposer: Vec<ProposerSlashing>,
    pub attester: Vec<AttesterSlashing>,
}

impl SlashingPool for FakeSlashingPool {
    fn pending_proposer(&self, _state: &dyn BeaconState) -> Vec<ProposerSlashing> {
        self.proposer.clone()
    }
    fn pending_attester(&self, _state: &dyn BeaconState) -> Vec<AttesterSlashing> {
        self.attester.clone()
    }
}

#[derive(Default)]
pub struct FakeBlsChangesPool {
    pub changes: Vec<SignedBlsToExecutionChange>,
}

impl BlsChangesPool for FakeBlsChangesPool {
    fn for_inclusion(&self, _state: &dyn BeaconState) -> Result<Vec<SignedBlsToExecutionChange>, ProposerError> {
        Ok(self.changes.clone())
    }
}

#[derive(Default)]
pub struct FakeEth1VoteSource {
    pub vote: Option<Eth1Data>,
}

impl Eth1VoteSource for FakeEth1VoteSource {
    fn winning_vote(&self, _state: &dyn BeaconState) -> Result<Option<Eth1Data>, ProposerError> {
        Ok(self.vote.clone())
    }
}

#[derive(Default)]
pub struct FakeDepositSource {
    pub deposits: Vec<Deposit>,
}

impl DepositSource for FakeDepositSource {
    fn for_inclusion(
        &self,
        _state: &dyn BeaconState,
        _eth1_data: &Eth1Data,
        limit: usize,
    ) -> Result<Vec<Deposit>, ProposerError> {
        Ok(self.deposits.iter().take(limit).cloned().collect())
    }
}

pub struct FakeExecutionEngine {
    pub payload: LocalPayloadResult,
}

#[async_trait]
impl ExecutionEngine for FakeExecutionEngine {
    async fn get_payload_id(
        &self,
        _parent_hash: Root,
        _timestamp: u64,
        _prev_randao: Root,
        _fee_recipient: [u8; 20],
    ) -> Result<PayloadId, ProposerError> {
        Ok(PayloadId([0; 8]))
    }

    async fn get_payload(&self, _payload_id: PayloadId, _slot: Slot) -> Result<LocalPayloadResult, ProposerError> {
        Ok(LocalPayloadResult {
            payload: self.payload.payload.clone(),
            value_wei: self.payload.value_wei,
            blobs_bundle: self.payload.blobs_bundle.clone(),
            override_builder: self.payload.override_builder,
        })
    }
}

#[derive(Default)]
pub struct FakeBlockBuilder {
    pub bid: Option<SignedBuilderBid>,
}

#[async_trait]
impl BlockBuilder for FakeBlockBuilder {
    async fn get_header(
        &self,
        _slot: Slot,
        _parent_hash: Root,
        _validator_pubkey: BlsPubkey,
    ) -> Result<SignedBuilderBid, ProposerError> {
        self.bid
            .clone()
            .ok_or_else(|| ProposerError::BuilderError { reason: "no bid configured".into() })
    }
}

pub struct AlwaysRegistered;

impl ValidatorRegistry for AlwaysRegistered {
    fn is_registered(&self, _validator_index: ValidatorIndex) -> bool {
        true
    }
}

#[derive(Default)]
pub struct FakeForkChoiceStore {
    pub genesis_slot: Slot,
    pub canonical_slots: std::collections::HashSet<Slot>,
}

impl ForkChoiceStore for FakeForkChoiceStore {
    fn has_canonical_block_at(&self, slot: Slot) -> bool {
        self.canonical_slots.contains(&slot)
    }
    fn genesis_slot(&self) -> Slot {
        self.genesis_slot
    }
}

pub struct NoopStateTransition;

impl StateTransition for NoopStateTransition {
    fn compute_state_root(&self, _state: &dyn BeaconState, block: &BeaconBlock) -> Result<Root, ProposerError> {
        Ok(Root([block.slot as u8; 32]))
    }
}
