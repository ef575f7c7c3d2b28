use serde::{Deserialize, Serialize};

/// A monotonic slot counter. Wall-clock time advances one slot every
/// `SECONDS_PER_SLOT` seconds; slots are the chain's scheduling unit.
pub type Slot = u64;

/// A epoch number, derived as `slot / SLOTS_PER_EPOCH`.
pub type Epoch = u64;

/// Index of a validator in the registry.
pub type ValidatorIndex = u64;

/// Index of a committee within a slot.
pub type CommitteeIndex = u64;

/// Number of bytes in a BLS12-381 public key (compressed G1 point).
pub const BLS_PUBKEY_LEN: usize = 48;

/// Number of bytes in a BLS12-381 signature (compressed G2 point).
pub const BLS_SIGNATURE_LEN: usize = 96;

/// 32-byte opaque hash. Equality is bytewise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Root(pub [u8; 32]);

impl Root {
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
        if bytes.len() != 32 {
            return Err("root must be 32 bytes");
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }
}

impl std::fmt::Display for Root {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// A compressed BLS12-381 signature. The all-zero-except-byte-0=0xC0 value
/// is the distinguished "point at infinity" constant used when no
/// signatures were aggregated.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlsSignature(pub [u8; BLS_SIGNATURE_LEN]);

impl BlsSignature {
    /// The infinity signature: used as the aggregate of an empty set.
    pub const fn infinity() -> Self {
        let mut bytes = [0u8; BLS_SIGNATURE_LEN];
        bytes[0] = 0xC0;
        Self(bytes)
    }

    pub fn is_infinity(&self) -> bool {
        *self == Self::infinity()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
        if bytes.len() != BLS_SIGNATURE_LEN {
            return Err("invalid BLS signature length");
        }
        let mut arr = [0u8; BLS_SIGNATURE_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }
}

impl std::fmt::Debug for BlsSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BlsSignature(0x{}...)", hex::encode(&self.0[..4]))
    }
}

impl Default for BlsSignature {
    fn default() -> Self {
        BlsSignature::infinity()
    }
}

/// A compressed BLS12-381 public key.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlsPubkey(pub [u8; BLS_PUBKEY_LEN]);

impl BlsPubkey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
        if bytes.len() != BLS_PUBKEY_LEN {
            return Err("invalid BLS public key length");
        }
        let mut arr = [0u8; BLS_PUBKEY_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }
}

impl std::fmt::Debug for BlsPubkey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BlsPubkey(0x{}...)", hex::encode(&self.0[..4]))
    }
}

/// A checkpoint pins an epoch to the block root that justifies/finalizes it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub epoch: Epoch,
    pub root: Root,
}

/// Fork-schedule constants. `mainnet()` gives the values the rest of this
/// crate assumes unless a caller builds a custom spec (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainSpec {
    pub slots_per_epoch: u64,
    pub max_committees_per_slot: u64,
    pub max_attestations: usize,
    pub max_attestations_post_fork: usize,
    pub max_voluntary_exits: usize,
    pub max_proposer_slashings: usize,
    pub max_attester_slashings: usize,
    pub max_bls_to_execution_changes: usize,
    pub max_blobs_per_block: usize,
    pub sync_committee_size: usize,
    pub sync_committee_subnet_count: usize,
    pub seconds_per_slot: u64,
    pub altair_fork_epoch: Epoch,
    pub bellatrix_fork_epoch: Epoch,
    pub capella_fork_epoch: Epoch,
    pub deneb_fork_epoch: Epoch,
    /// First epoch at which attestations carry `committee_bits` (EIP-7549 /
    /// "electra" packing); drives the pre-fork vs post-fork partition in C4.
    pub attestation_committee_fork_epoch: Epoch,
}

impl ChainSpec {
    pub fn mainnet() -> Self {
        Self {
            slots_per_epoch: 32,
            max_committees_per_slot: 64,
            max_attestations: 128,
            max_attestations_post_fork: 8,
            max_voluntary_exits: 16,
            max_proposer_slashings: 16,
            max_attester_slashings: 2,
            max_bls_to_execution_changes: 16,
            max_blobs_per_block: 6,
            sync_committee_size: 512,
            sync_committee_subnet_count: 4,
            seconds_per_slot: 12,
            altair_fork_epoch: 74_240,
            bellatrix_fork_epoch: 144_896,
            capella_fork_epoch: 194_048,
            deneb_fork_epoch: 269_568,
            attestation_committee_fork_epoch: 364_032,
        }
    }

    pub fn epoch_at_slot(&self, slot: Slot) -> Epoch {
        slot / self.slots_per_epoch
    }

    pub fn sync_subcommittee_size(&self) -> usize {
        self.sync_committee_size / self.sync_committee_subnet_count
    }

    /// Whether a block built for `slot` uses the post-fork (committee-bits)
    /// attestation format. Always partitioned on the *block* slot, never on
    /// head-state slot — see spec §4.4.2 hazard note.
    pub fn attestations_post_fork_at(&self, slot: Slot) -> bool {
        self.epoch_at_slot(slot) >= self.attestation_committee_fork_epoch
    }

    /// Current fork version for `epoch`, mainnet-numbered (genesis 0,
    /// Altair 1, Bellatrix 2, Capella 3, Deneb 4), used as the
    /// `fork_version` input to signing-domain computation.
    pub fn fork_version_at(&self, epoch: Epoch) -> [u8; 4] {
        if epoch >= self.deneb_fork_epoch {
            [0x04, 0, 0, 0]
        } else if epoch >= self.capella_fork_epoch {
            [0x03, 0, 0, 0]
        } else if epoch >= self.bellatrix_fork_epoch {
            [0x02, 0, 0, 0]
        } else if epoch >= self.altair_fork_epoch {
            [0x01, 0, 0, 0]
        } else {
            [0, 0, 0, 0]
        }
    }

    pub fn is_post_altair(&self, slot: Slot) -> bool {
        self.epoch_at_slot(slot) >= self.altair_fork_epoch
    }

    pub fn is_post_bellatrix(&self, slot: Slot) -> bool {
        self.epoch_at_slot(slot) >= self.bellatrix_fork_epoch
    }

    pub fn is_post_capella(&self, slot: Slot) -> bool {
        self.epoch_at_slot(slot) >= self.capella_fork_epoch
    }

    pub fn is_post_deneb(&self, slot: Slot) -> bool {
        self.epoch_at_slot(slot) >= self.deneb_fork_epoch
    }

    pub fn slot_start_time(&self, slot: Slot, genesis_time: u64) -> u64 {
        genesis_time + slot * self.seconds_per_slot
    }
}
