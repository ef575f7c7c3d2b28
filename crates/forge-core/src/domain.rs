//! Signing-domain computation, grounded on the teacher's sync-committee
//! signing-root helpers (`compute_domain` / `compute_signing_root`),
//! generalized to the two domains this core verifies against: attestations
//! (gossip-bypass aside, a non-bypassed attestation still needs its
//! aggregate signature checked) and builder bids (spec §4.7.2).

use crate::ssz::{sha256_hash, sha256_pair};
use crate::types::Root;

pub const DOMAIN_BEACON_ATTESTER: [u8; 4] = [0x01, 0x00, 0x00, 0x00];
pub const DOMAIN_APPLICATION_BUILDER: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

fn fork_data_root(fork_version: [u8; 4], genesis_validators_root: Root) -> [u8; 32] {
    let mut data = [0u8; 64];
    data[..4].copy_from_slice(&fork_version);
    data[32..].copy_from_slice(&genesis_validators_root.0);
    sha256_hash(&data)
}

/// `domain = domain_type ‖ fork_data_root[:28]`.
pub fn compute_domain(domain_type: [u8; 4], fork_version: [u8; 4], genesis_validators_root: Root) -> [u8; 32] {
    let fdr = fork_data_root(fork_version, genesis_validators_root);
    let mut domain = [0u8; 32];
    domain[..4].copy_from_slice(&domain_type);
    domain[4..].copy_from_slice(&fdr[..28]);
    domain
}

/// `signing_root = hash(object_root ‖ domain)` — what the signer actually
/// signs, never the raw object root.
pub fn compute_signing_root(object_root: Root, domain: [u8; 32]) -> [u8; 32] {
    let mut domain32 = [0u8; 32];
    domain32.copy_from_slice(&domain);
    sha256_pair(&object_root.0, &domain32)
}
