use serde::{Deserialize, Serialize};

use super::bitfield::{Bitlist, Bitvector};
use super::primitives::{BlsSignature, CommitteeIndex, Checkpoint, Root, Slot};

/// The vote content an attestation carries: a beacon-block root plus the
/// justified (`source`) and to-be-justified (`target`) checkpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationData {
    pub slot: Slot,
    pub committee_index: CommitteeIndex,
    pub beacon_block_root: Root,
    pub source: Checkpoint,
    pub target: Checkpoint,
}

/// Pre-fork attestation: committee index lives directly on `data`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub data: AttestationData,
    pub aggregation_bits: Bitlist,
    pub signature: BlsSignature,
}

/// Post-fork attestation: the committee index is carried out-of-band in
/// `committee_bits`, letting a single attestation cover multiple
/// committees' aggregation bits concatenated together.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationWithCommittees {
    pub data: AttestationData,
    pub aggregation_bits: Bitlist,
    pub committee_bits: Bitvector,
    pub signature: BlsSignature,
}

/// The fork-tagged union consumed and produced by the attestation pipeline.
/// A single `Vec<Att>` is always homogeneous in this tag within one block
/// (see spec §4.4.2's fork-partitioning step).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Att {
    PreFork(Attestation),
    PostFork(AttestationWithCommittees),
}

impl Att {
    pub fn data(&self) -> &AttestationData {
        match self {
            Att::PreFork(a) => &a.data,
            Att::PostFork(a) => &a.data,
        }
    }

    pub fn slot(&self) -> Slot {
        self.data().slot
    }

    pub fn aggregation_bits(&self) -> &Bitlist {
        match self {
            Att::PreFork(a) => &a.aggregation_bits,
            Att::PostFork(a) => &a.aggregation_bits,
        }
    }

    pub fn signature(&self) -> &BlsSignature {
        match self {
            Att::PreFork(a) => &a.signature,
            Att::PostFork(a) => &a.signature,
        }
    }

    pub fn is_post_fork(&self) -> bool {
        matches!(self, Att::PostFork(_))
    }

    /// Committee index this attestation votes for. Pre-fork, this is
    /// `data.committee_index`. Post-fork, it's derived from the single set
    /// bit in `committee_bits` — callers at this layer must never see a
    /// multi-bit `committee_bits` (those only appear after C4's on-chain
    /// aggregate consolidation step; see spec §4.3).
    pub fn committee_index(&self) -> Result<CommitteeIndex, &'static str> {
        match self {
            Att::PreFork(a) => Ok(a.data.committee_index),
            Att::PostFork(a) => {
                let set: Vec<usize> = a.committee_bits.bit_indices();
                match set.as_slice() {
                    [single] => Ok(*single as CommitteeIndex),
                    _ => Err("post-fork attestation committee_bits must carry exactly one bit at the identity layer"),
                }
            }
        }
    }
}
