//! The attestation packing pipeline (component C4), minus pool I/O and the
//! signature-verification dispatch — both of which need a collaborator
//! (the pool, or a worker-thread pool) that only `forge-node` has. This
//! module implements: fork partitioning, dedup, in-group aggregation,
//! post-fork on-chain consolidation, profitability sort, and the cap.

use std::collections::HashMap;

use crate::bitfield;
use crate::crypto;
use crate::error::CoreError;
use crate::maxcover;
use crate::types::{Att, AttestationWithCommittees, Bitlist, Bitvector, ChainSpec, Slot};

use super::identity::{compute_id, data_id, AttestationId, DataId};

/// Which profitability ordering to apply in the per-slot sort (spec
/// §4.4.6). `CommitteeAware` is the feature-gated newer ordering; the
/// default fallback is `SlotFirst`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PackingStrategy {
    SlotFirst,
    CommitteeAware,
}

/// Keep only attestations whose fork tag matches the block being built.
/// Always driven by `block_slot`, never by any state's own slot/version —
/// see the hazard note in spec §4.4.2: a head state can still be pre-fork
/// while the block under construction is post-fork.
pub fn partition_by_fork(atts: Vec<Att>, spec: &ChainSpec, block_slot: Slot) -> Vec<Att> {
    let post_fork = spec.attestations_post_fork_at(block_slot);
    atts.into_iter()
        .filter(|a| a.is_post_fork() == post_fork)
        .collect()
}

/// Prune proper subsets within one `AttestationId` group: if `a.bits ⊇
/// b.bits`, drop `b` (and symmetrically). Equal-bits duplicates collapse to
/// one. O(k²·w) in the group size `k`; acceptable since k is small.
fn dedup_group(group: Vec<Att>) -> Result<Vec<Att>, CoreError> {
    let mut kept: Vec<Att> = Vec::with_capacity(group.len());
    'next: for candidate in group {
        let cand_bits = candidate.aggregation_bits().as_slice().to_vec();
        let mut i = 0;
        while i < kept.len() {
            let kept_bits = kept[i].aggregation_bits().as_slice();
            if bitfield::contains(kept_bits, &cand_bits)? {
                // candidate is a subset of (or equal to) an already-kept
                // attestation; drop it.
                continue 'next;
            }
            if bitfield::contains(&cand_bits, kept_bits)? {
                // candidate strictly covers a kept one; replace it.
                kept.remove(i);
                continue;
            }
            i += 1;
        }
        kept.push(candidate);
    }
    Ok(kept)
}

/// Merge attestations within a group that have disjoint aggregation bits
/// into single aggregates, greedily, largest-bitcount-first. The result
/// may still hold multiple aggregates when bits conflict pairwise — two
/// legitimate disjoint covers of the same `AttestationData` (spec §4.4.4).
fn aggregate_group(mut group: Vec<Att>) -> Result<Vec<Att>, CoreError> {
    group.sort_by(|a, b| {
        bitfield::count(b.aggregation_bits().as_slice())
            .cmp(&bitfield::count(a.aggregation_bits().as_slice()))
    });

    struct Merging {
        template: Att,
        bits: Vec<bool>,
        signatures: Vec<crate::types::BlsSignature>,
    }

    let mut aggregates: Vec<Merging> = Vec::new();

    for att in group {
        let bits = att.aggregation_bits().as_slice().to_vec();
        let mut merged_into = None;
        for (idx, agg) in aggregates.iter().enumerate() {
            if bitfield::disjoint(&agg.bits, &bits) {
                merged_into = Some(idx);
                break;
            }
        }
        match merged_into {
            Some(idx) => {
                let agg = &mut aggregates[idx];
                for (slot, &b) in agg.bits.iter_mut().zip(bits.iter()) {
                    *slot |= b;
                }
                agg.signatures.push(*att.signature());
            }
            None => {
                aggregates.push(Merging {
                    signatures: vec![*att.signature()],
                    template: att,
                    bits,
                });
            }
        }
    }

    aggregates
        .into_iter()
        .map(|agg| {
            let signature = crypto::aggregate_signatures(&agg.signatures)?;
            let new_bits = Bitlist::new(agg.bits);
            Ok(with_bits_and_signature(agg.template, new_bits, signature))
        })
        .collect()
}

fn with_bits_and_signature(
    template: Att,
    bits: Bitlist,
    signature: crate::types::BlsSignature,
) -> Att {
    match template {
        Att::PreFork(mut a) => {
            a.aggregation_bits = bits;
            a.signature = signature;
            Att::PreFork(a)
        }
        Att::PostFork(mut a) => {
            a.aggregation_bits = bits;
            a.signature = signature;
            Att::PostFork(a)
        }
    }
}

/// Group attestations by `AttestationId`, dedup, and aggregate each group.
/// Returns the flattened list of remaining aggregates, tagged with the
/// `DataId` (AttestationData-only identity) they belong to, for the
/// post-fork consolidation step.
fn dedup_and_aggregate(atts: Vec<Att>) -> Result<Vec<(DataId, Att)>, CoreError> {
    let mut groups: HashMap<AttestationId, (DataId, Vec<Att>)> = HashMap::new();
    for att in atts {
        let id = compute_id(&att)?;
        let did = data_id(&att);
        groups.entry(id).or_insert_with(|| (did, Vec::new())).1.push(att);
    }

    let mut out = Vec::new();
    for (_, (did, group)) in groups {
        let deduped = dedup_group(group)?;
        let aggregated = aggregate_group(deduped)?;
        out.extend(aggregated.into_iter().map(|a| (did, a)));
    }
    Ok(out)
}

/// Post-fork on-chain consolidation (spec §4.4.5): within each `AttestationId`
/// group (i.e. same data + committee), pick the single best aggregate via
/// max-cover (not `v[0]` — see spec §9's open-question resolution), then
/// stitch one consolidated attestation per `AttestationData` across all its
/// committees.
fn consolidate_post_fork(per_id_aggregates: Vec<(DataId, Att)>, spec: &ChainSpec) -> Result<Vec<Att>, CoreError> {
    // Re-group by full AttestationId so max-cover picks one representative
    // per (data, committee) before cross-committee stitching.
    let mut by_id: HashMap<AttestationId, (DataId, Vec<Att>)> = HashMap::new();
    for (did, att) in per_id_aggregates {
        let id = compute_id(&att)?;
        by_id.entry(id).or_insert_with(|| (did, Vec::new())).1.push(att);
    }

    let mut representatives: HashMap<DataId, Vec<AttestationWithCommittees>> = HashMap::new();
    for (_, (did, group)) in by_id {
        let bit_vecs: Vec<Vec<bool>> = group
            .iter()
            .map(|a| a.aggregation_bits().as_slice().to_vec())
            .collect();
        let refs: Vec<&[bool]> = bit_vecs.iter().map(|v| v.as_slice()).collect();
        let result = maxcover::select(&refs, 1);
        let winner_idx = *result
            .selected
            .first()
            .ok_or_else(|| CoreError::Fatal("empty attestation group".into()))?;
        let winner = match group.into_iter().nth(winner_idx) {
            Some(Att::PostFork(a)) => a,
            _ => {
                return Err(CoreError::Fatal(
                    "post-fork consolidation saw a pre-fork attestation".into(),
                ))
            }
        };
        representatives.entry(did).or_default().push(winner);
    }

    representatives
        .into_values()
        .map(|mut constituents| {
            constituents.sort_by_key(|a| {
                a.committee_bits
                    .bit_indices()
                    .first()
                    .copied()
                    .unwrap_or(usize::MAX)
            });

            let data = constituents[0].data.clone();
            let mut committee_bits = Bitvector::zeros(spec.max_committees_per_slot as usize);
            let mut bits_parts = Vec::with_capacity(constituents.len());
            let mut signatures = Vec::with_capacity(constituents.len());

            for c in &constituents {
                for idx in c.committee_bits.bit_indices() {
                    committee_bits.set(idx, true);
                }
                bits_parts.push(c.aggregation_bits.as_slice().to_vec());
                signatures.push(c.signature);
            }

            let aggregation_bits = Bitlist::new(bits_parts.into_iter().flatten().collect());
            let signature = crypto::aggregate_signatures(&signatures)?;

            Ok(Att::PostFork(AttestationWithCommittees {
                data,
                aggregation_bits,
                committee_bits,
                signature,
            }))
        })
        .collect()
}

/// Sort by slot descending; within each slot, max-cover selects a subset
/// maximizing distinct-voter coverage, then selected/leftover are each
/// sorted by bit-count descending, selected-then-leftover (spec §4.4.6
/// "slot-first" strategy).
fn sort_slot_first(atts: Vec<Att>) -> Vec<Att> {
    let mut by_slot: HashMap<Slot, Vec<Att>> = HashMap::new();
    for att in atts {
        by_slot.entry(att.slot()).or_default().push(att);
    }
    let mut slots: Vec<Slot> = by_slot.keys().copied().collect();
    slots.sort_unstable_by(|a, b| b.cmp(a));

    let mut out = Vec::new();
    for slot in slots {
        let group = by_slot.remove(&slot).unwrap();
        out.extend(sort_one_slot_by_maxcover(group));
    }
    out
}

fn sort_one_slot_by_maxcover(group: Vec<Att>) -> Vec<Att> {
    let bit_vecs: Vec<Vec<bool>> = group
        .iter()
        .map(|a| a.aggregation_bits().as_slice().to_vec())
        .collect();
    let refs: Vec<&[bool]> = bit_vecs.iter().map(|v| v.as_slice()).collect();
    let result = maxcover::select(&refs, group.len());

    let mut items: Vec<Option<Att>> = group.into_iter().map(Some).collect();
    let mut selected: Vec<Att> = result
        .selected
        .iter()
        .map(|&i| items[i].take().unwrap())
        .collect();
    let mut leftover: Vec<Att> = result
        .leftover
        .iter()
        .map(|&i| items[i].take().unwrap())
        .collect();

    let by_bits_desc = |a: &Att, b: &Att| {
        bitfield::count(b.aggregation_bits().as_slice())
            .cmp(&bitfield::count(a.aggregation_bits().as_slice()))
    };
    selected.sort_by(by_bits_desc);
    leftover.sort_by(by_bits_desc);

    selected.into_iter().chain(leftover).collect()
}

/// Committee-aware packing (spec §4.4.6, feature-gated): partition by
/// slot then by committee index, run per-committee max-cover, and within a
/// slot interleave the #1 picks of every committee, then the #2 picks, and
/// so on, finally appending leftovers the same way; slots newest-first.
fn sort_committee_aware(atts: Vec<Att>, spec: &ChainSpec) -> Vec<Att> {
    let mut by_slot: HashMap<Slot, Vec<Att>> = HashMap::new();
    for att in atts {
        by_slot.entry(att.slot()).or_default().push(att);
    }
    let mut slots: Vec<Slot> = by_slot.keys().copied().collect();
    slots.sort_unstable_by(|a, b| b.cmp(a));

    let mut out = Vec::new();
    for slot in slots {
        let group = by_slot.remove(&slot).unwrap();
        out.extend(sort_one_slot_committee_aware(group, spec));
    }
    out
}

fn sort_one_slot_committee_aware(atts: Vec<Att>, spec: &ChainSpec) -> Vec<Att> {
    let mut by_committee: HashMap<u64, Vec<Att>> = HashMap::new();
    for att in atts {
        let idx = att.committee_index().unwrap_or(0);
        by_committee.entry(idx).or_default().push(att);
    }

    let mut committees: Vec<u64> = by_committee.keys().copied().collect();
    committees.sort_unstable();
    committees.truncate(spec.max_committees_per_slot as usize);

    let mut selected_per_committee: Vec<Vec<Att>> = Vec::with_capacity(committees.len());
    let mut leftover_per_committee: Vec<Vec<Att>> = Vec::with_capacity(committees.len());

    for c in committees {
        let group = by_committee.remove(&c).unwrap();
        let bit_vecs: Vec<Vec<bool>> = group
            .iter()
            .map(|a| a.aggregation_bits().as_slice().to_vec())
            .collect();
        let refs: Vec<&[bool]> = bit_vecs.iter().map(|v| v.as_slice()).collect();
        let result = maxcover::select(&refs, group.len());

        let mut items: Vec<Option<Att>> = group.into_iter().map(Some).collect();
        let mut selected: Vec<Att> = result.selected.iter().map(|&i| items[i].take().unwrap()).collect();
        let mut leftover: Vec<Att> = result.leftover.iter().map(|&i| items[i].take().unwrap()).collect();

        let by_bits_desc = |a: &Att, b: &Att| {
            bitfield::count(b.aggregation_bits().as_slice())
                .cmp(&bitfield::count(a.aggregation_bits().as_slice()))
        };
        selected.sort_by(by_bits_desc);
        leftover.sort_by(by_bits_desc);

        selected_per_committee.push(selected);
        leftover_per_committee.push(leftover);
    }

    interleave(selected_per_committee)
        .into_iter()
        .chain(interleave(leftover_per_committee))
        .collect()
}

/// Round-robin interleave: first element of each list, then second, etc.
fn interleave(mut lists: Vec<Vec<Att>>) -> Vec<Att> {
    let mut out = Vec::new();
    loop {
        let mut any = false;
        for list in lists.iter_mut() {
            if !list.is_empty() {
                out.push(list.remove(0));
                any = true;
            }
        }
        if !any {
            break;
        }
    }
    out
}

/// Truncate to the fork-appropriate cap, keyed on the first element's fork
/// tag. Empty input stays empty; mixed-version input is never produced
/// here since `partition_by_fork` runs first (spec §9's open-question
/// resolution for `MAX_ATTESTATIONS[_POST_FORK]` selection).
fn cap(atts: Vec<Att>, spec: &ChainSpec) -> Vec<Att> {
    let limit = match atts.first() {
        None => return atts,
        Some(first) if first.is_post_fork() => spec.max_attestations_post_fork,
        Some(_) => spec.max_attestations,
    };
    atts.into_iter().take(limit).collect()
}

/// Run the full pure pipeline: fork-partition, dedup, aggregate, (post-fork)
/// consolidate, profitability-sort, cap. Signature verification (spec
/// §4.4.8) is a separate step — see [`super::verify::verify_signatures`] —
/// since it needs a collaborator to supply validator pubkeys / epoch view.
pub fn pack(
    atts: Vec<Att>,
    block_slot: Slot,
    spec: &ChainSpec,
    strategy: PackingStrategy,
) -> Result<Vec<Att>, CoreError> {
    let post_fork = spec.attestations_post_fork_at(block_slot);
    let partitioned = partition_by_fork(atts, spec, block_slot);
    let per_id_aggregates = dedup_and_aggregate(partitioned)?;

    let consolidated = if post_fork {
        consolidate_post_fork(per_id_aggregates, spec)?
    } else {
        per_id_aggregates.into_iter().map(|(_, att)| att).collect()
    };

    let sorted = match strategy {
        PackingStrategy::SlotFirst => sort_slot_first(consolidated),
        PackingStrategy::CommitteeAware => sort_committee_aware(consolidated, spec),
    };

    Ok(cap(sorted, spec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Attestation, AttestationData, Checkpoint, Root};

    fn att(slot: Slot, bits: u8) -> Att {
        let data = AttestationData {
            slot,
            committee_index: 0,
            beacon_block_root: Root([1u8; 32]),
            source: Checkpoint { epoch: 1, root: Root([2u8; 32]) },
            target: Checkpoint { epoch: 2, root: Root([3u8; 32]) },
        };
        let bit_vec: Vec<bool> = (0..8).map(|i| (bits >> i) & 1 == 1).collect();
        Att::PreFork(Attestation {
            data,
            aggregation_bits: Bitlist::new(bit_vec),
            signature: Default::default(),
        })
    }

    #[test]
    fn s1_dedup_with_proper_subsets() {
        let slot = 4;
        let bits = [
            0b0000_1111u8,
            0b1100_1111,
            0b0000_1111,
            0b0000_1111,
            0b0000_0001,
            0b0000_0011,
            0b1100_1111,
            0b0000_0001,
            0b0110_1101,
        ];
        let atts: Vec<Att> = bits.iter().map(|&b| att(slot, b)).collect();
        let grouped = dedup_and_aggregate(atts).unwrap();
        // Every input shares the same AttestationData, so there's one
        // group; within it, proper subsets collapse away.
        let mut remaining: Vec<u8> = grouped
            .iter()
            .map(|(_, a)| {
                let bs = a.aggregation_bits().as_slice();
                bs.iter().enumerate().fold(0u8, |acc, (i, &b)| acc | ((b as u8) << i))
            })
            .collect();
        remaining.sort_unstable();
        let mut expected = vec![0b1100_1111u8, 0b0110_1101];
        expected.sort_unstable();
        assert_eq!(remaining, expected);
    }

    #[test]
    fn s2_sort_by_slot_then_maxcover() {
        let spec = ChainSpec::mainnet();
        let inputs = vec![
            (4u64, 0b0000_0001u8),
            (4, 0b1110_0001),
            (1, 0b1100_0000),
            (2, 0b1110_0000),
            (4, 0b1000_0011),
            (4, 0b1111_1000),
            (1, 0b1110_0000),
            (3, 0b1100_0000),
        ];
        let atts: Vec<Att> = inputs.iter().map(|&(s, b)| att(s, b)).collect();
        let packed = pack(atts, 0, &spec, PackingStrategy::SlotFirst).unwrap();

        let got: Vec<(u64, u8)> = packed
            .iter()
            .map(|a| {
                let bs = a.aggregation_bits().as_slice();
                let byte = bs.iter().enumerate().fold(0u8, |acc, (i, &b)| acc | ((b as u8) << i));
                (a.slot(), byte)
            })
            .collect();

        let expected = vec![
            (4, 0b1111_1000),
            (4, 0b1000_0011),
            (4, 0b1110_0001),
            (4, 0b0000_0001),
            (3, 0b1100_0000),
            (2, 0b1110_0000),
            (1, 0b1110_0000),
            (1, 0b1100_0000),
        ];
        assert_eq!(got, expected);
    }

    #[test]
    fn s3_cap_truncates() {
        let spec = ChainSpec::mainnet();
        let atts: Vec<Att> = (0..spec.max_attestations + 1)
            .map(|i| att(100 + i as u64, 0b0000_0001))
            .collect();
        let packed = pack(atts, 0, &spec, PackingStrategy::SlotFirst).unwrap();
        assert_eq!(packed.len(), spec.max_attestations);
    }

    #[test]
    fn cap_monotonicity_never_exceeds_limit() {
        let spec = ChainSpec::mainnet();
        for n in [0usize, 1, 50, 128, 200] {
            let atts: Vec<Att> = (0..n).map(|i| att(100 + i as u64, 0b0000_0001)).collect();
            let packed = pack(atts, 0, &spec, PackingStrategy::SlotFirst).unwrap();
            assert!(packed.len() <= spec.max_attestations);
        }
    }
}
