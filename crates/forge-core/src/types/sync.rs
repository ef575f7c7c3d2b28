use serde::{Deserialize, Serialize};

use super::bitfield::Bitvector;
use super::primitives::{BlsSignature, Root, Slot};

/// One subcommittee's contribution to a slot's sync aggregate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCommitteeContribution {
    pub slot: Slot,
    pub subcommittee_index: u64,
    pub block_root: Root,
    pub aggregation_bits: Bitvector,
    pub signature: BlsSignature,
}

/// The block-level summary of sync-committee participation: one bit per
/// committee member (`sync_committee_bits`) and the BLS aggregate over
/// the signing members.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncAggregate {
    pub sync_committee_bits: Bitvector,
    pub sync_committee_signature: BlsSignature,
}

impl SyncAggregate {
    /// An aggregate with no participants: all-zero bits, infinity signature.
    pub fn empty(sync_committee_size: usize) -> Self {
        Self {
            sync_committee_bits: Bitvector::zeros(sync_committee_size),
            sync_committee_signature: BlsSignature::infinity(),
        }
    }
}
