//! External collaborators (spec §6.1, §6.2): pools, the execution engine,
//! the block builder, fork choice, the validator registry, and state
//! transition. Spec §9's design note asks for a small trait surface here so
//! the core algorithms never depend on in-memory pool internals — production
//! implementations and the `testing` fakes both implement these same
//! traits.

use async_trait::async_trait;

use forge_core::types::{
    Att, AttesterSlashing, BeaconBlock, BlsPubkey, ChainSpec, Checkpoint, Deposit, Epoch,
    Eth1Data, ProposerSlashing, Root, Slot, SignedBlsToExecutionChange, SignedBuilderBid,
    SignedVoluntaryExit, SyncCommitteeContribution, ValidatorIndex,
};

use crate::error::ProposerError;

/// The head state a proposal is built against. The core treats it as an
/// opaque view (spec §1: state-transition is an external collaborator); this
/// trait exposes only the fields the packer and arbitration layers read.
pub trait BeaconState: Send + Sync + std::fmt::Debug {
    fn slot(&self) -> Slot;
    fn current_epoch(&self, spec: &ChainSpec) -> Epoch {
        spec.epoch_at_slot(self.slot())
    }
    fn genesis_validators_root(&self) -> Root;
    fn genesis_time(&self) -> u64;
    /// Root of the head block this proposal extends — becomes the new
    /// block's `parent_root`.
    fn head_block_root(&self) -> Root;
    fn randao_mix(&self) -> Root;
    /// The checkpoint this state expects as the current epoch's target —
    /// used to decide whether an attestation's signature was already
    /// verified at gossip time (spec §4.4.8).
    fn current_epoch_target(&self) -> Checkpoint;
    fn previous_epoch_target(&self) -> Checkpoint;
    /// SSZ root of the withdrawals list a local payload build would
    /// produce — compared against a builder bid's header (spec §4.7.3).
    fn expected_withdrawals_root(&self) -> Root;
    fn head_execution_block_hash(&self) -> Root;
    /// Fee recipient and registration status for `validator_index`, keyed
    /// the way the beacon database stores it (spec §6.5).
    fn validator_pubkey(&self, validator_index: ValidatorIndex) -> Option<BlsPubkey>;
}

/// Pool of gossip-validated attestations, partitioned into an aggregated and
/// an unaggregated set (spec §6.1). Implementations enforce their own
/// internal locking; `aggregated`/`unaggregated`/the two `delete_*` calls
/// must each be individually atomic (spec §5).
pub trait AttestationPool: Send + Sync {
    fn aggregated(&self) -> Vec<Att>;
    fn unaggregated(&self) -> Result<Vec<Att>, ProposerError>;
    fn delete_aggregated(&self, att: &Att);
    fn delete_unaggregated(&self, att: &Att);
}

pub trait SyncCommitteePool: Send + Sync {
    fn contributions(&self, slot: Slot) -> Result<Vec<SyncCommitteeContribution>, ProposerError>;
}

pub trait ExitPool: Send + Sync {
    fn pending(&self, state: &dyn BeaconState, slot: Slot, no_limit: bool) -> Vec<SignedVoluntaryExit>;
}

pub trait SlashingPool: Send + Sync {
    fn pending_proposer(&self, state: &dyn BeaconState) -> Vec<ProposerSlashing>;
    fn pending_attester(&self, state: &dyn BeaconState) -> Vec<AttesterSlashing>;
}

pub trait BlsChangesPool: Send + Sync {
    fn for_inclusion(&self, state: &dyn BeaconState) -> Result<Vec<SignedBlsToExecutionChange>, ProposerError>;
}

/// The deposit/eth1-vote subsystem's output (spec §1: consumed, not
/// redesigned here) — the majority-vote winner for the current voting
/// period, or `None` if the subsystem has nothing to offer this slot.
pub trait Eth1VoteSource: Send + Sync {
    fn winning_vote(&self, state: &dyn BeaconState) -> Result<Option<Eth1Data>, ProposerError>;
}

/// Deposit-contract tracking is out of scope (spec §1's non-goals); this
/// trait is the seam C6 reads through to get the deposits eligible for
/// inclusion against the slot's chosen `eth1_data`.
pub trait DepositSource: Send + Sync {
    fn for_inclusion(
        &self,
        state: &dyn BeaconState,
        eth1_data: &Eth1Data,
        limit: usize,
    ) -> Result<Vec<Deposit>, ProposerError>;
}

/// Opaque handle to an in-progress local payload build, returned by
/// `get_payload_id` and redeemed by `get_payload`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PayloadId(pub [u8; 8]);

pub struct LocalPayloadResult {
    pub payload: forge_core::types::ExecutionPayload,
    pub value_wei: alloy_primitives::U256,
    pub blobs_bundle: Option<forge_core::types::BlobsBundle>,
    /// Engine signal to cancel any in-flight builder request and force the
    /// local payload (spec §4.7.1, §7's `OverrideBuilder`).
    pub override_builder: bool,
}

#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    async fn get_payload_id(
        &self,
        parent_hash: Root,
        timestamp: u64,
        prev_randao: Root,
        fee_recipient: [u8; 20],
    ) -> Result<PayloadId, ProposerError>;

    async fn get_payload(&self, payload_id: PayloadId, slot: Slot) -> Result<LocalPayloadResult, ProposerError>;
}

#[async_trait]
pub trait BlockBuilder: Send + Sync {
    /// Timeout is enforced by the caller (spec §4.7.2: 1 second), not by
    /// the trait itself — a real HTTP client and a fake test client both
    /// just race against whatever deadline `payload::arbitration` sets up.
    async fn get_header(
        &self,
        slot: Slot,
        parent_hash: Root,
        validator_pubkey: BlsPubkey,
    ) -> Result<SignedBuilderBid, ProposerError>;
}

/// Local record of which validators have opted into builder-sourced blocks
/// (spec §6.5: `(fee_recipient, pubkey, timestamp)` keyed by validator
/// index).
pub trait ValidatorRegistry: Send + Sync {
    fn is_registered(&self, validator_index: ValidatorIndex) -> bool;
}

/// Read-only view of the fork-choice store, used only by the circuit
/// breaker (C8) to walk back from the head counting missed slots. Snapshot
/// consistency is the store's problem (spec §5).
pub trait ForkChoiceStore: Send + Sync {
    fn has_canonical_block_at(&self, slot: Slot) -> bool;
    fn genesis_slot(&self) -> Slot;
}

/// `(state, block) -> new state root`, modeled as a pure function even
/// though real implementations mutate a cloned state internally (spec §9's
/// design note). Runs with signature checks disabled per spec §4.9 step 5.
pub trait StateTransition: Send + Sync {
    fn compute_state_root(&self, state: &dyn BeaconState, block: &BeaconBlock) -> Result<Root, ProposerError>;
}
