//! Greedy maximum-coverage selection (component C2).
//!
//! Given `N` equal-length candidate bit sequences and a budget `k`, picks
//! (at most) `k` of them so that the union of their set bits is as large as
//! possible. This is the classic NP-hard max-k-cover problem; the greedy
//! algorithm used here is the textbook `1 - 1/e` approximation — exact
//! optimality is explicitly not required (spec §4.2).

use crate::bitfield;

/// Result of a max-cover run: which candidate indices were selected, and
/// which were left over, both as index sets into the original candidate
/// slice, in the order they were chosen / remain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaxCoverResult {
    pub selected: Vec<usize>,
    pub leftover: Vec<usize>,
}

/// Run greedy max-cover over `candidates` (each a same-length bit slice),
/// selecting up to `k` of them.
///
/// Ties in marginal gain are broken by preferring the candidate with the
/// larger individual popcount. Stops early once the best remaining
/// candidate's marginal gain is zero — picking it would never worsen the
/// union, but it also wouldn't improve it, so greedy declines to "pad" the
/// selection with useless picks.
pub fn select(candidates: &[&[bool]], k: usize) -> MaxCoverResult {
    let n = candidates.len();
    let mut unused: Vec<usize> = (0..n).collect();
    let mut selected = Vec::with_capacity(k.min(n));
    let covered_len = candidates.first().map(|c| c.len()).unwrap_or(0);
    let mut covered = vec![false; covered_len];

    while selected.len() < k && !unused.is_empty() {
        let mut best_idx_pos: Option<usize> = None;
        let mut best_gain = 0usize;
        let mut best_count = 0usize;

        for (pos, &idx) in unused.iter().enumerate() {
            let cand = candidates[idx];
            let gain = cand
                .iter()
                .zip(covered.iter())
                .filter(|(&bit, &cov)| bit && !cov)
                .count();
            let total = bitfield::count(cand);

            let better = match best_idx_pos {
                None => true,
                Some(_) => gain > best_gain || (gain == best_gain && total > best_count),
            };
            if better {
                best_idx_pos = Some(pos);
                best_gain = gain;
                best_count = total;
            }
        }

        let Some(pos) = best_idx_pos else { break };
        if best_gain == 0 {
            break;
        }

        let idx = unused.remove(pos);
        for (c, cov) in candidates[idx].iter().zip(covered.iter_mut()) {
            *cov |= *c;
        }
        selected.push(idx);
    }

    MaxCoverResult {
        selected,
        leftover: unused,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(n: u16) -> Vec<bool> {
        (0..8).map(|i| (n >> i) & 1 == 1).collect()
    }

    #[test]
    fn selects_maximal_union_greedily() {
        let a = bits(0b0000_1111);
        let b = bits(0b1100_1111);
        let c = bits(0b0000_0001);
        let refs: Vec<&[bool]> = vec![&a, &b, &c];
        let result = select(&refs, 2);
        // b covers everything a does plus more, so it's picked first.
        assert_eq!(result.selected[0], 1);
        assert_eq!(result.selected.len(), 2);
    }

    #[test]
    fn stops_when_marginal_gain_is_zero() {
        let a = bits(0b0000_1111);
        let b = bits(0b0000_1111); // identical coverage
        let refs: Vec<&[bool]> = vec![&a, &b];
        let result = select(&refs, 2);
        assert_eq!(result.selected.len(), 1);
        assert_eq!(result.leftover.len(), 1);
    }

    #[test]
    fn never_worse_than_the_best_single_candidate() {
        let a = bits(0b0000_0001);
        let b = bits(0b0000_1110);
        let c = bits(0b1111_0000);
        let refs: Vec<&[bool]> = vec![&a, &b, &c];
        let result = select(&refs, 1);
        let chosen = refs[result.selected[0]];
        let max_individual = refs.iter().map(|r| bitfield::count(r)).max().unwrap();
        assert_eq!(bitfield::count(chosen), max_individual);
    }

    #[test]
    fn empty_candidates_yields_empty_result() {
        let refs: Vec<&[bool]> = vec![];
        let result = select(&refs, 5);
        assert!(result.selected.is_empty());
        assert!(result.leftover.is_empty());
    }
}
