use serde::{Deserialize, Serialize};

use super::attestation::Att;
use super::primitives::{BlsPubkey, BlsSignature, Checkpoint, Root, Slot, ValidatorIndex};
use super::sync::SyncAggregate;

/// The block-producer's view of the deposit-contract state on the
/// execution chain, as voted on across an epoch window. The eth1-vote
/// subsystem (out of scope here) produces this; C6 just consumes the
/// winner.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eth1Data {
    pub deposit_root: Root,
    pub deposit_count: u64,
    pub block_hash: Root,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub proof: Vec<Root>,
    pub pubkey: BlsPubkey,
    pub withdrawal_credentials: Root,
    pub amount: u64,
    pub signature: BlsSignature,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoluntaryExit {
    pub epoch: u64,
    pub validator_index: ValidatorIndex,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedVoluntaryExit {
    pub message: VoluntaryExit,
    pub signature: BlsSignature,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttesterSlashingAttestation {
    pub attesting_indices: Vec<ValidatorIndex>,
    pub data_slot: Slot,
    pub data_source: Checkpoint,
    pub data_target: Checkpoint,
    pub signature: BlsSignature,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttesterSlashing {
    pub attestation_1: AttesterSlashingAttestation,
    pub attestation_2: AttesterSlashingAttestation,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposerSlashing {
    pub signed_header_1: (Slot, ValidatorIndex, Root, BlsSignature),
    pub signed_header_2: (Slot, ValidatorIndex, Root, BlsSignature),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlsToExecutionChange {
    pub validator_index: ValidatorIndex,
    pub from_bls_pubkey: BlsPubkey,
    pub to_execution_address: [u8; 20],
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedBlsToExecutionChange {
    pub message: BlsToExecutionChange,
    pub signature: BlsSignature,
}

/// The execution-layer payload the core treats as an opaque value beyond
/// the fields it must read/compare (spec §3.4).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPayload {
    pub parent_hash: Root,
    pub block_hash: Root,
    pub fee_recipient: [u8; 20],
    pub timestamp: u64,
    pub transactions_root: Root,
    pub withdrawals_root: Root,
    pub blob_gas_used: Option<u64>,
    pub excess_blob_gas: Option<u64>,
}

/// The blinded counterpart used when a builder's payload wins: only the
/// SSZ-hashed header travels in the block, the full body arrives later
/// once the builder reveals it against the proposer's signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPayloadHeader {
    pub parent_hash: Root,
    pub block_hash: Root,
    pub fee_recipient: [u8; 20],
    pub timestamp: u64,
    pub transactions_root: Root,
    pub withdrawals_root: Root,
    pub blob_gas_used: Option<u64>,
    pub excess_blob_gas: Option<u64>,
}

impl ExecutionPayloadHeader {
    /// SSZ root of an empty transaction list — used to reject builder bids
    /// offering a payload with no transactions at all (spec §4.7.2).
    pub const EMPTY_TRANSACTIONS_ROOT: Root = Root([
        0x7f, 0xfe, 0x24, 0x1e, 0xa9, 0x42, 0xc5, 0xf5, 0x2f, 0x94, 0x6d, 0x1f, 0xd8, 0xb4, 0xe7,
        0x98, 0x66, 0xd1, 0xf8, 0x0d, 0x18, 0xf2, 0xc2, 0xd7, 0x03, 0x10, 0x2e, 0xe3, 0xbd, 0x1e,
        0x18, 0x1e,
    ]);
}

impl From<&ExecutionPayload> for ExecutionPayloadHeader {
    fn from(p: &ExecutionPayload) -> Self {
        Self {
            parent_hash: p.parent_hash,
            block_hash: p.block_hash,
            fee_recipient: p.fee_recipient,
            timestamp: p.timestamp,
            transactions_root: p.transactions_root,
            withdrawals_root: p.withdrawals_root,
            blob_gas_used: p.blob_gas_used,
            excess_blob_gas: p.excess_blob_gas,
        }
    }
}

/// A builder's unsigned offer: a payload header plus the fee it promises
/// to pay the proposer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderBid {
    pub header: ExecutionPayloadHeader,
    pub value_wei: alloy_primitives::U256,
    pub pubkey: BlsPubkey,
    pub blob_kzg_commitments: Option<Vec<[u8; 48]>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedBuilderBid {
    pub bid: BuilderBid,
    pub signature: BlsSignature,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobsBundle {
    pub commitments: Vec<[u8; 48]>,
    pub proofs: Vec<[u8; 48]>,
    pub blobs: Vec<Vec<u8>>,
}

/// Which execution-payload shape a body carries: the full payload (locally
/// built) or only its header (builder won and the block is blinded).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionData {
    Full(ExecutionPayload),
    Blinded(ExecutionPayloadHeader),
}

impl ExecutionData {
    pub fn parent_hash(&self) -> Root {
        match self {
            ExecutionData::Full(p) => p.parent_hash,
            ExecutionData::Blinded(h) => h.parent_hash,
        }
    }

    pub fn is_blinded(&self) -> bool {
        matches!(self, ExecutionData::Blinded(_))
    }
}

/// Operations common to every fork's block body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonBodyFields {
    pub randao_reveal: BlsSignature,
    pub eth1_data: Eth1Data,
    pub graffiti: [u8; 32],
    pub proposer_slashings: Vec<ProposerSlashing>,
    pub attester_slashings: Vec<AttesterSlashing>,
    pub deposits: Vec<Deposit>,
    pub voluntary_exits: Vec<SignedVoluntaryExit>,
}

/// A single fork-appropriate block body. Modeled as a closed tagged union
/// rather than a trait-object hierarchy per spec §9's design note: the set
/// of forks is closed and spec-defined, so an exhaustive match in C9 beats
/// dynamic dispatch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeaconBlockBody {
    Phase0 {
        common: CommonBodyFields,
        attestations: Vec<Att>,
    },
    Altair {
        common: CommonBodyFields,
        attestations: Vec<Att>,
        sync_aggregate: SyncAggregate,
    },
    Bellatrix {
        common: CommonBodyFields,
        attestations: Vec<Att>,
        sync_aggregate: SyncAggregate,
        execution: ExecutionData,
    },
    Capella {
        common: CommonBodyFields,
        attestations: Vec<Att>,
        sync_aggregate: SyncAggregate,
        execution: ExecutionData,
        bls_to_execution_changes: Vec<SignedBlsToExecutionChange>,
    },
    Deneb {
        common: CommonBodyFields,
        attestations: Vec<Att>,
        sync_aggregate: SyncAggregate,
        execution: ExecutionData,
        bls_to_execution_changes: Vec<SignedBlsToExecutionChange>,
        blob_kzg_commitments: Vec<[u8; 48]>,
    },
}

impl BeaconBlockBody {
    pub fn attestations(&self) -> &[Att] {
        match self {
            BeaconBlockBody::Phase0 { attestations, .. } => attestations,
            BeaconBlockBody::Altair { attestations, .. } => attestations,
            BeaconBlockBody::Bellatrix { attestations, .. } => attestations,
            BeaconBlockBody::Capella { attestations, .. } => attestations,
            BeaconBlockBody::Deneb { attestations, .. } => attestations,
        }
    }

    pub fn execution(&self) -> Option<&ExecutionData> {
        match self {
            BeaconBlockBody::Phase0 { .. } | BeaconBlockBody::Altair { .. } => None,
            BeaconBlockBody::Bellatrix { execution, .. } => Some(execution),
            BeaconBlockBody::Capella { execution, .. } => Some(execution),
            BeaconBlockBody::Deneb { execution, .. } => Some(execution),
        }
    }

    pub fn is_blinded(&self) -> bool {
        self.execution().is_some_and(ExecutionData::is_blinded)
    }
}

/// A full beacon block: the envelope common to every fork, wrapping a
/// fork-tagged body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconBlock {
    pub slot: Slot,
    pub proposer_index: ValidatorIndex,
    pub parent_root: Root,
    pub state_root: Root,
    pub body: BeaconBlockBody,
}
