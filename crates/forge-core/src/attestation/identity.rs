//! Canonical attestation identity (component C3).

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ssz;
use crate::types::{Att, Root};

/// Two attestations with the same `AttestationId` are semantically
/// aggregatable: they vote for the same `AttestationData` (and, post-fork,
/// the same committee).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttestationId(pub Root);

/// Identity of `AttestationData` alone, ignoring committee index — used to
/// group post-fork attestations that vote for the same data across
/// different committees before consolidating them into one on-chain
/// attestation (spec §4.4.5).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataId(pub Root);

pub fn data_id(att: &Att) -> DataId {
    DataId(ssz::hash_tree_root_attestation_data(att.data()))
}

/// Compute the attestation's identity. Pre-fork: hash of `data` alone.
/// Post-fork: hash of `(data, committee_index)`, where the committee index
/// is read out of `committee_bits`'s single set bit.
pub fn compute_id(att: &Att) -> Result<AttestationId, CoreError> {
    let data_root = ssz::hash_tree_root_attestation_data(att.data());
    match att {
        Att::PreFork(_) => Ok(AttestationId(data_root)),
        Att::PostFork(_) => {
            let committee_index = att
                .committee_index()
                .map_err(|e| CoreError::InvalidArgument(e.to_string()))?;
            let mut buf = [0u8; 40];
            buf[..32].copy_from_slice(&data_root.0);
            buf[32..].copy_from_slice(&committee_index.to_le_bytes());
            Ok(AttestationId(Root(ssz::sha256_hash(&buf))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Attestation, AttestationData, AttestationWithCommittees, Bitlist, Bitvector, Checkpoint};

    fn sample_data(committee_index: u64) -> AttestationData {
        AttestationData {
            slot: 4,
            committee_index,
            beacon_block_root: Root([1u8; 32]),
            source: Checkpoint { epoch: 1, root: Root([2u8; 32]) },
            target: Checkpoint { epoch: 2, root: Root([3u8; 32]) },
        }
    }

    #[test]
    fn same_data_same_id_prefork() {
        let a = Att::PreFork(Attestation {
            data: sample_data(0),
            aggregation_bits: Bitlist::zeros(8),
            signature: Default::default(),
        });
        let b = Att::PreFork(Attestation {
            data: sample_data(0),
            aggregation_bits: Bitlist::new(vec![true; 8]),
            signature: Default::default(),
        });
        assert_eq!(compute_id(&a).unwrap(), compute_id(&b).unwrap());
    }

    #[test]
    fn different_committee_different_id_postfork() {
        let mut bits0 = Bitvector::zeros(64);
        bits0.set(0, true);
        let mut bits1 = Bitvector::zeros(64);
        bits1.set(1, true);

        let a = Att::PostFork(AttestationWithCommittees {
            data: sample_data(0),
            aggregation_bits: Bitlist::zeros(8),
            committee_bits: bits0,
            signature: Default::default(),
        });
        let b = Att::PostFork(AttestationWithCommittees {
            data: sample_data(0),
            aggregation_bits: Bitlist::zeros(8),
            committee_bits: bits1,
            signature: Default::default(),
        });
        assert_ne!(compute_id(&a).unwrap(), compute_id(&b).unwrap());
        assert_eq!(data_id(&a), data_id(&b));
    }
}
