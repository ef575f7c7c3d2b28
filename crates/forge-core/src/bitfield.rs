//! Set operations over bit-lists and bit-vectors (component C1).
//!
//! All operations here are defined over a plain `&[bool]` slice so the same
//! algebra serves `Bitlist` (attestation aggregation bits) and `Bitvector`
//! (sync-committee / committee bits) without duplicating the logic.

use crate::error::CoreError;

/// Popcount over the data bits (the sentinel, if any, is not part of the
/// slice passed in — callers extract `as_slice()` first).
pub fn count(bits: &[bool]) -> usize {
    bits.iter().filter(|&&b| b).count()
}

/// Ascending indices of set bits. Empty input yields an empty vec.
pub fn bit_indices(bits: &[bool]) -> Vec<usize> {
    bits.iter()
        .enumerate()
        .filter_map(|(i, &b)| b.then_some(i))
        .collect()
}

/// True iff `other` is a subset of `self`: every bit set in `other` is also
/// set in `self`. Hard errors (not booleans) on length mismatch, and a
/// zero-length list is trivially contained by any same-length list.
pub fn contains(this: &[bool], other: &[bool]) -> Result<bool, CoreError> {
    if this.len() != other.len() {
        return Err(CoreError::InvalidArgument(format!(
            "bitfield length mismatch: {} vs {}",
            this.len(),
            other.len()
        )));
    }
    Ok(this
        .iter()
        .zip(other.iter())
        .all(|(&a, &b)| !b || a))
}

/// Cardinality of the union of a set of equal-length bit sequences.
pub fn union_count(xs: &[&[bool]]) -> usize {
    let Some(len) = xs.first().map(|x| x.len()) else {
        return 0;
    };
    (0..len)
        .filter(|&i| xs.iter().any(|x| x[i]))
        .count()
}

/// Bitwise union of a set of equal-length bit sequences.
pub fn union(xs: &[&[bool]]) -> Vec<bool> {
    let Some(len) = xs.first().map(|x| x.len()) else {
        return Vec::new();
    };
    (0..len).map(|i| xs.iter().any(|x| x[i])).collect()
}

/// True iff the two bit sequences share no set bit in common — i.e. they
/// can be merged into a disjoint aggregate without double-counting any
/// voter (spec §4.4.4's "no intersecting bits" aggregation precondition).
pub fn disjoint(a: &[bool], b: &[bool]) -> bool {
    a.iter().zip(b.iter()).all(|(&x, &y)| !(x && y))
}

/// Pack a bit sequence into 64-bit words, for the max-cover selector (C2),
/// which operates on chunked bitmasks rather than `Vec<bool>` for speed.
pub fn to_chunks(bits: &[bool]) -> Vec<u64> {
    let num_words = (bits.len() + 63) / 64;
    let mut words = vec![0u64; num_words];
    for (i, &b) in bits.iter().enumerate() {
        if b {
            words[i / 64] |= 1u64 << (i % 64);
        }
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(n: u16) -> Vec<bool> {
        (0..8).map(|i| (n >> i) & 1 == 1).collect()
    }

    #[test]
    fn count_and_indices() {
        let b = bits(0b0000_1011);
        assert_eq!(count(&b), 3);
        assert_eq!(bit_indices(&b), vec![0, 1, 3]);
    }

    #[test]
    fn zero_length_is_contained_by_anything() {
        let empty: Vec<bool> = vec![];
        assert_eq!(count(&empty), 0);
        assert!(bit_indices(&empty).is_empty());
        assert!(contains(&empty, &empty).unwrap());
    }

    #[test]
    fn contains_is_subset_check() {
        let a = bits(0b1111_0000);
        let b = bits(0b0101_0000);
        assert!(contains(&a, &b).unwrap());
        assert!(!contains(&b, &a).unwrap());
    }

    #[test]
    fn contains_errors_on_length_mismatch() {
        let a = vec![true, false];
        let b = vec![true, false, true];
        assert!(contains(&a, &b).is_err());
    }

    #[test]
    fn union_count_matches_bitwise_or() {
        let a = bits(0b0000_0011);
        let b = bits(0b0000_1100);
        let slices: Vec<&[bool]> = vec![&a, &b];
        assert_eq!(union_count(&slices), 4);
    }

    #[test]
    fn disjoint_detects_overlap() {
        let a = bits(0b0000_0011);
        let b = bits(0b0000_0100);
        let c = bits(0b0000_0001);
        assert!(disjoint(&a, &b));
        assert!(!disjoint(&a, &c));
    }

    #[test]
    fn chunking_packs_into_64_bit_words() {
        let mut long = vec![false; 130];
        long[0] = true;
        long[64] = true;
        long[129] = true;
        let chunks = to_chunks(&long);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], 1);
        assert_eq!(chunks[1], 1);
        assert_eq!(chunks[2], 1 << 1);
    }
}
