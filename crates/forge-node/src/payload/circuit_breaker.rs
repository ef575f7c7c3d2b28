//! C8: disables the builder after recent missed slots, so the proposer
//! stops trusting an external block-building service once local liveness
//! looks degraded.

use forge_core::types::{ChainSpec, Slot, ValidatorIndex};

use crate::collaborators::{ForkChoiceStore, ValidatorRegistry};
use crate::config::ProposerConfig;
use crate::metrics::ProposerMetrics;

/// Walk fork choice back from `slot - 1`, counting slots with no canonical
/// block, stopping at genesis or the first canonical block found.
fn consecutive_missed_slots(store: &dyn ForkChoiceStore, slot: Slot) -> u64 {
    let genesis = store.genesis_slot();
    let mut missed = 0u64;
    let mut cursor = slot;
    while cursor > genesis {
        cursor -= 1;
        if store.has_canonical_block_at(cursor) {
            break;
        }
        missed += 1;
    }
    missed
}

/// Count slots in `[slot - slots_per_epoch, slot)` with no canonical block.
fn epoch_missed_slots(store: &dyn ForkChoiceStore, slot: Slot, slots_per_epoch: u64) -> u64 {
    let genesis = store.genesis_slot();
    let window_start = slot.saturating_sub(slots_per_epoch).max(genesis);
    (window_start..slot)
        .filter(|s| !store.has_canonical_block_at(*s))
        .count() as u64
}

/// Whether builder-sourced blocks should be attempted for `slot` on behalf
/// of `validator_index`. Trips (returns false) on unregistered validators,
/// a long run of consecutive misses, or too many misses within the last
/// epoch — and records whichever tripped it in `metrics` (spec §4.8).
pub fn can_use_builder(
    slot: Slot,
    validator_index: ValidatorIndex,
    registry: &dyn ValidatorRegistry,
    store: &dyn ForkChoiceStore,
    spec: &ChainSpec,
    config: &ProposerConfig,
    metrics: &ProposerMetrics,
) -> bool {
    if !registry.is_registered(validator_index) {
        metrics.builder_circuit_broken.set(0);
        return false;
    }

    let consecutive = consecutive_missed_slots(store, slot);
    metrics.builder_consecutive_misses.set(consecutive as i64);
    if consecutive >= config.max_consecutive_missed_slots {
        tracing::warn!(
            slot,
            consecutive,
            threshold = config.max_consecutive_missed_slots,
            "builder circuit breaker tripped: consecutive missed slots"
        );
        metrics.builder_circuit_broken.set(1);
        return false;
    }

    let epoch_misses = epoch_missed_slots(store, slot, spec.slots_per_epoch);
    metrics.builder_epoch_misses.set(epoch_misses as i64);
    if epoch_misses >= config.max_epoch_missed_slots {
        tracing::warn!(
            slot,
            epoch_misses,
            threshold = config.max_epoch_missed_slots,
            "builder circuit breaker tripped: missed slots in last epoch"
        );
        metrics.builder_circuit_broken.set(1);
        return false;
    }

    metrics.builder_circuit_broken.set(0);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    struct FakeForkChoice {
        genesis: Slot,
        canonical: Mutex<HashSet<Slot>>,
    }

    impl ForkChoiceStore for FakeForkChoice {
        fn has_canonical_block_at(&self, slot: Slot) -> bool {
            self.canonical.lock().unwrap().contains(&slot)
        }
        fn genesis_slot(&self) -> Slot {
            self.genesis
        }
    }

    struct AlwaysRegistered;
    impl ValidatorRegistry for AlwaysRegistered {
        fn is_registered(&self, _validator_index: ValidatorIndex) -> bool {
            true
        }
    }

    struct NeverRegistered;
    impl ValidatorRegistry for NeverRegistered {
        fn is_registered(&self, _validator_index: ValidatorIndex) -> bool {
            false
        }
    }

    /// Spec §8's S6: canonical block only at slot 1, request at slot
    /// MAX_CONSECUTIVE_MISSED_SLOTS + 2 trips the breaker; filling in every
    /// intermediate slot clears it.
    #[test]
    fn s6_circuit_breaker_trip_and_recovery() {
        let config = ProposerConfig::default();
        let spec = ChainSpec::mainnet();
        let metrics = ProposerMetrics::default();
        let store = FakeForkChoice { genesis: 0, canonical: Mutex::new(HashSet::from([1])) };
        let slot = config.max_consecutive_missed_slots + 2;

        assert!(!can_use_builder(slot, 0, &AlwaysRegistered, &store, &spec, &config, &metrics));

        for s in 1..slot {
            store.canonical.lock().unwrap().insert(s);
        }
        assert!(can_use_builder(slot, 0, &AlwaysRegistered, &store, &spec, &config, &metrics));
    }

    #[test]
    fn unregistered_validator_never_uses_builder() {
        let config = ProposerConfig::default();
        let spec = ChainSpec::mainnet();
        let metrics = ProposerMetrics::default();
        let store = FakeForkChoice { genesis: 0, canonical: Mutex::new(HashSet::from([0, 1, 2, 3])) };
        assert!(!can_use_builder(4, 7, &NeverRegistered, &store, &spec, &config, &metrics));
    }

    #[test]
    fn trips_on_epoch_miss_threshold_without_consecutive_run() {
        let config = ProposerConfig::default();
        let spec = ChainSpec { slots_per_epoch: 8, ..ChainSpec::mainnet() };
        let metrics = ProposerMetrics::default();
        // Alternate canonical/missed slots within the epoch window so the
        // consecutive-miss count never climbs, but the epoch total does.
        let mut canonical = HashSet::new();
        for s in 0..8u64 {
            if s % 2 == 0 {
                canonical.insert(s);
            }
        }
        let store = FakeForkChoice { genesis: 0, canonical: Mutex::new(canonical) };
        let config = ProposerConfig { max_epoch_missed_slots: 3, ..config };
        assert!(!can_use_builder(8, 0, &AlwaysRegistered, &store, &spec, &config, &metrics));
    }
}
