use serde::{Deserialize, Serialize};

/// A variable-length bit sequence with an explicit length.
///
/// Internally this mirrors the SSZ `Bitlist[N]` sentinel-bit encoding: the
/// highest set bit in the last byte marks the length boundary. We don't
/// carry raw SSZ bytes here though — `bits` holds one `bool` per data bit
/// and `len` is the declared length, decoupled from storage so the
/// max-cover selector (C2) can freely clone/slice without re-deriving the
/// sentinel each time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bitlist {
    bits: Vec<bool>,
}

impl Bitlist {
    pub fn new(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    pub fn zeros(len: usize) -> Self {
        Self {
            bits: vec![false; len],
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn get(&self, index: usize) -> bool {
        self.bits[index]
    }

    pub fn set(&mut self, index: usize, value: bool) {
        self.bits[index] = value;
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    /// Decode from the SSZ sentinel-bit byte encoding (LSB-first within each
    /// byte, highest set bit in the last byte is the length marker).
    pub fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
        if bytes.is_empty() {
            return Err("bitlist must carry at least the sentinel byte");
        }
        let last = *bytes.last().unwrap();
        if last == 0 {
            return Err("sentinel byte must have the length marker bit set");
        }
        let sentinel_bit_in_last_byte = 7 - last.leading_zeros() as usize;
        let total_bits = (bytes.len() - 1) * 8 + sentinel_bit_in_last_byte;
        let mut bits = Vec::with_capacity(total_bits);
        for i in 0..total_bits {
            let byte = bytes[i / 8];
            bits.push((byte >> (i % 8)) & 1 == 1);
        }
        Ok(Self { bits })
    }

    /// Encode to the SSZ sentinel-bit byte form.
    pub fn to_ssz_bytes(&self) -> Vec<u8> {
        let total_bits = self.bits.len() + 1;
        let num_bytes = (total_bits + 7) / 8;
        let mut out = vec![0u8; num_bytes];
        for (i, &bit) in self.bits.iter().enumerate() {
            if bit {
                out[i / 8] |= 1 << (i % 8);
            }
        }
        let sentinel_index = self.bits.len();
        out[sentinel_index / 8] |= 1 << (sentinel_index % 8);
        out
    }
}

/// A fixed-length bit sequence (no sentinel bit; `N` is known to the
/// caller out-of-band, e.g. `SYNC_COMMITTEE_SIZE` or
/// `MAX_COMMITTEES_PER_SLOT`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bitvector {
    bits: Vec<bool>,
}

impl Bitvector {
    pub fn zeros(len: usize) -> Self {
        Self {
            bits: vec![false; len],
        }
    }

    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn get(&self, index: usize) -> bool {
        self.bits[index]
    }

    pub fn set(&mut self, index: usize, value: bool) {
        self.bits[index] = value;
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    /// Indices of all set bits, ascending.
    pub fn bit_indices(&self) -> Vec<usize> {
        self.bits
            .iter()
            .enumerate()
            .filter_map(|(i, &b)| b.then_some(i))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Concatenate a sequence of same- or different-length bitvectors in
    /// the order given — used to stitch per-subnet sync-committee bits or
    /// per-committee aggregation bits into one vector (spec §4.4.5, §4.5).
    pub fn concat(parts: &[Bitvector]) -> Self {
        let mut bits = Vec::with_capacity(parts.iter().map(|p| p.len()).sum());
        for p in parts {
            bits.extend_from_slice(&p.bits);
        }
        Self { bits }
    }
}
