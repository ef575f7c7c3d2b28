//! Sync-committee contribution aggregation (component C5), minus the pool
//! fetch — `forge-node::packing::sync_aggregate` fetches contributions for a
//! slot and hands them to [`build`].

use std::collections::HashMap;

use crate::bitfield;
use crate::crypto;
use crate::error::CoreError;
use crate::types::{Bitvector, BlsSignature, ChainSpec, Root, SyncAggregate, SyncCommitteeContribution};

/// Merge contributions with disjoint aggregation bits into single aggregates,
/// greedily, largest-popcount-first — the same merge rule C4 applies to
/// attestations within an `AttestationId` group (spec §4.4.4), generalized to
/// fixed-width subnet bitvectors.
fn aggregate_disjoint(mut group: Vec<SyncCommitteeContribution>) -> Result<Vec<(Vec<bool>, BlsSignature)>, CoreError> {
    group.sort_by(|a, b| b.aggregation_bits.count().cmp(&a.aggregation_bits.count()));

    struct Merging {
        bits: Vec<bool>,
        signatures: Vec<BlsSignature>,
    }
    let mut aggregates: Vec<Merging> = Vec::new();

    for contribution in group {
        let bits = contribution.aggregation_bits.as_slice().to_vec();
        let merged_into = aggregates
            .iter()
            .position(|agg| bitfield::disjoint(&agg.bits, &bits));
        match merged_into {
            Some(idx) => {
                let agg = &mut aggregates[idx];
                for (slot, &b) in agg.bits.iter_mut().zip(bits.iter()) {
                    *slot |= b;
                }
                agg.signatures.push(contribution.signature);
            }
            None => aggregates.push(Merging {
                bits,
                signatures: vec![contribution.signature],
            }),
        }
    }

    aggregates
        .into_iter()
        .map(|agg| {
            let signature = crypto::aggregate_signatures(&agg.signatures)?;
            Ok((agg.bits, signature))
        })
        .collect()
}

/// Prune proper subsets among same-subnet aggregates (same algorithm as C4's
/// `dedup_group`, spec §4.5 step 2).
fn dedup_subset(mut items: Vec<(Vec<bool>, BlsSignature)>) -> Result<Vec<(Vec<bool>, BlsSignature)>, CoreError> {
    let mut kept: Vec<(Vec<bool>, BlsSignature)> = Vec::with_capacity(items.len());
    'next: for candidate in items.drain(..) {
        let mut i = 0;
        while i < kept.len() {
            if bitfield::contains(&kept[i].0, &candidate.0)? {
                continue 'next;
            }
            if bitfield::contains(&candidate.0, &kept[i].0)? {
                kept.remove(i);
                continue;
            }
            i += 1;
        }
        kept.push(candidate);
    }
    Ok(kept)
}

/// Pick the highest-popcount aggregate in a subnet's deduped set; ties break
/// on whichever `max_by_key` happens to return last (any deterministic
/// choice is acceptable per spec §4.5 step 3).
fn pick_most_profitable(items: Vec<(Vec<bool>, BlsSignature)>) -> Option<(Vec<bool>, BlsSignature)> {
    items.into_iter().max_by_key(|(bits, _)| bitfield::count(bits))
}

/// Build the slot's `SyncAggregate` from the pool's raw contributions: filter
/// by `block_root`, partition by subnet, aggregate + dedup + pick the winner
/// per subnet, then stitch the per-subnet bits (zero-filled where a subnet
/// has no contributions) and BLS-aggregate the winning signatures.
pub fn build(
    contributions: Vec<SyncCommitteeContribution>,
    expected_parent_root: Root,
    spec: &ChainSpec,
) -> Result<SyncAggregate, CoreError> {
    let subnet_size = spec.sync_subcommittee_size();
    let mut by_subnet: HashMap<u64, Vec<SyncCommitteeContribution>> = HashMap::new();
    for c in contributions {
        if c.block_root == expected_parent_root {
            by_subnet.entry(c.subcommittee_index).or_default().push(c);
        }
    }

    let mut bits_parts: Vec<Bitvector> = Vec::with_capacity(spec.sync_committee_subnet_count);
    let mut signatures: Vec<BlsSignature> = Vec::new();

    for subnet in 0..spec.sync_committee_subnet_count as u64 {
        match by_subnet.remove(&subnet) {
            None => bits_parts.push(Bitvector::zeros(subnet_size)),
            Some(group) => {
                let aggregated = aggregate_disjoint(group)?;
                let deduped = dedup_subset(aggregated)?;
                match pick_most_profitable(deduped) {
                    Some((bits, sig)) => {
                        bits_parts.push(Bitvector::from_bits(bits));
                        signatures.push(sig);
                    }
                    None => bits_parts.push(Bitvector::zeros(subnet_size)),
                }
            }
        }
    }

    Ok(SyncAggregate {
        sync_committee_bits: Bitvector::concat(&bits_parts),
        sync_committee_signature: crypto::aggregate_signatures(&signatures)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Root;

    fn contribution(subnet: u64, bits: u8, root: Root) -> SyncCommitteeContribution {
        let bit_vec: Vec<bool> = (0..4).map(|i| (bits >> i) & 1 == 1).collect();
        SyncCommitteeContribution {
            slot: 1,
            subcommittee_index: subnet,
            block_root: root,
            aggregation_bits: Bitvector::from_bits(bit_vec),
            signature: BlsSignature::infinity(),
        }
    }

    #[test]
    fn s5_per_subnet_profitability() {
        let mut spec = ChainSpec::mainnet();
        spec.sync_committee_size = 16;
        spec.sync_committee_subnet_count = 4;
        let root = Root([7u8; 32]);

        let mut contributions = Vec::new();
        for subnet in 0..4u64 {
            contributions.push(contribution(subnet, 0b0001, root));
            contributions.push(contribution(subnet, 0b1001, root));
            contributions.push(contribution(subnet, 0b1110, root));
        }

        let aggregate = build(contributions, root, &spec).unwrap();
        assert_eq!(aggregate.sync_committee_bits.len(), 16);
        for subnet in 0..4usize {
            let nibble = &aggregate.sync_committee_bits.as_slice()[subnet * 4..subnet * 4 + 4];
            assert!(nibble.iter().all(|&b| b), "subnet {subnet} should be fully covered");
        }
    }

    #[test]
    fn missing_subnet_is_zero_filled() {
        let mut spec = ChainSpec::mainnet();
        spec.sync_committee_size = 8;
        spec.sync_committee_subnet_count = 2;
        let root = Root([1u8; 32]);

        let contributions = vec![contribution(0, 0b1111, root)];
        let aggregate = build(contributions, root, &spec).unwrap();
        assert_eq!(aggregate.sync_committee_bits.len(), 8);
        assert!(aggregate.sync_committee_bits.as_slice()[4..].iter().all(|&b| !b));
    }

    #[test]
    fn contributions_for_a_different_block_root_are_ignored() {
        let mut spec = ChainSpec::mainnet();
        spec.sync_committee_size = 8;
        spec.sync_committee_subnet_count = 2;
        let wanted = Root([1u8; 32]);
        let other = Root([2u8; 32]);

        let contributions = vec![contribution(0, 0b1111, other)];
        let aggregate = build(contributions, wanted, &spec).unwrap();
        assert!(aggregate.sync_committee_bits.as_slice().iter().all(|&b| !b));
        assert!(aggregate.sync_committee_signature.is_infinity());
    }
}
