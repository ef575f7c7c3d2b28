//! Minimal SSZ `hash_tree_root` merkleization, restricted to the fixed-size
//! containers the attestation-identity layer needs (`AttestationData`,
//! `Checkpoint`). Full variable-length SSZ (lists, unions, blobs) is out of
//! scope for this core — persistence and wire encoding are external
//! collaborators (spec §1).

use sha2::{Digest, Sha256};

use crate::types::{AttestationData, BlsPubkey, BuilderBid, Checkpoint, ExecutionPayloadHeader, Root};

pub fn sha256_hash(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

pub fn sha256_pair(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(a);
    buf[32..].copy_from_slice(b);
    sha256_hash(&buf)
}

pub fn uint64_to_leaf(v: u64) -> [u8; 32] {
    let mut leaf = [0u8; 32];
    leaf[..8].copy_from_slice(&v.to_le_bytes());
    leaf
}

/// Merkleize a leaf list, zero-padding to the next power of two.
pub fn merkleize(leaves: &[[u8; 32]]) -> [u8; 32] {
    if leaves.is_empty() {
        return [0u8; 32];
    }
    let mut width = leaves.len().next_power_of_two();
    if width == 0 {
        width = 1;
    }
    let mut layer: Vec<[u8; 32]> = leaves.to_vec();
    layer.resize(width, [0u8; 32]);

    while layer.len() > 1 {
        let mut next = Vec::with_capacity(layer.len() / 2);
        for pair in layer.chunks(2) {
            next.push(sha256_pair(&pair[0], &pair[1]));
        }
        layer = next;
    }
    layer[0]
}

pub fn hash_tree_root_checkpoint(cp: &Checkpoint) -> [u8; 32] {
    merkleize(&[uint64_to_leaf(cp.epoch), cp.root.0])
}

pub fn hash_tree_root_attestation_data(data: &AttestationData) -> Root {
    let leaves = [
        uint64_to_leaf(data.slot),
        uint64_to_leaf(data.committee_index),
        data.beacon_block_root.0,
        hash_tree_root_checkpoint(&data.source),
        hash_tree_root_checkpoint(&data.target),
    ];
    Root(merkleize(&leaves))
}

fn fixed_bytes_leaf(bytes: &[u8]) -> [u8; 32] {
    let mut leaf = [0u8; 32];
    leaf[..bytes.len().min(32)].copy_from_slice(&bytes[..bytes.len().min(32)]);
    leaf
}

pub fn hash_tree_root_execution_payload_header(header: &ExecutionPayloadHeader) -> [u8; 32] {
    let leaves = [
        header.parent_hash.0,
        header.block_hash.0,
        fixed_bytes_leaf(&header.fee_recipient),
        uint64_to_leaf(header.timestamp),
        header.transactions_root.0,
        header.withdrawals_root.0,
        uint64_to_leaf(header.blob_gas_used.unwrap_or_default()),
        uint64_to_leaf(header.excess_blob_gas.unwrap_or_default()),
    ];
    merkleize(&leaves)
}

pub fn hash_tree_root_pubkey(pubkey: &BlsPubkey) -> [u8; 32] {
    let leaves = [fixed_bytes_leaf(&pubkey.0[..32]), fixed_bytes_leaf(&pubkey.0[32..])];
    merkleize(&leaves)
}

/// Merkleize over the list of KZG commitments, each padded into two
/// 32-byte leaves (48 bytes doesn't fit one SSZ chunk).
fn hash_tree_root_kzg_commitments(commitments: &[[u8; 48]]) -> [u8; 32] {
    let mut leaves = Vec::with_capacity(commitments.len() * 2);
    for c in commitments {
        leaves.push(fixed_bytes_leaf(&c[..32]));
        leaves.push(fixed_bytes_leaf(&c[32..]));
    }
    merkleize(&leaves)
}

/// `hash_tree_root(BuilderBid)`, what the builder's signature commits to
/// under the application-builder domain (spec §4.7.2).
pub fn hash_tree_root_builder_bid(bid: &BuilderBid) -> Root {
    let value_bytes: [u8; 32] = bid.value_wei.to_le_bytes::<32>();
    let commitments_root = bid
        .blob_kzg_commitments
        .as_deref()
        .map(hash_tree_root_kzg_commitments)
        .unwrap_or([0u8; 32]);

    let leaves = [
        hash_tree_root_execution_payload_header(&bid.header),
        value_bytes,
        hash_tree_root_pubkey(&bid.pubkey),
        commitments_root,
    ];
    Root(merkleize(&leaves))
}
