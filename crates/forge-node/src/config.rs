//! Proposer configuration (spec §12 of SPEC_FULL.md): every tunable the
//! proposer needs beyond the fork-schedule constants in
//! [`forge_core::ChainSpec`], loaded from environment variables with typed
//! defaults.

use std::path::PathBuf;
use std::str::FromStr;

use forge_core::attestation::PackingStrategy;

use crate::env;
use crate::logging::LogFormat;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedPackingStrategy(pub PackingStrategy);

impl FromStr for ParsedPackingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "slot-first" => Ok(Self(PackingStrategy::SlotFirst)),
            "committee-aware" => Ok(Self(PackingStrategy::CommitteeAware)),
            other => Err(format!("unknown attestation packing strategy: {other}")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProposerConfig {
    /// C8: consecutive-miss trip threshold (spec §4.8, §8 property 9).
    pub max_consecutive_missed_slots: u64,
    /// C8: per-epoch-window miss trip threshold.
    pub max_epoch_missed_slots: u64,
    /// C7 §4.7.3: local-payload boost, as an integer percent added to 100.
    pub local_boost_percent: u64,
    /// C7 §4.7.2: builder HTTP request deadline.
    pub builder_timeout_ms: u64,
    /// C4 §4.4.6: which profitability ordering `pack_attestations` uses.
    pub attestation_packing_strategy: PackingStrategy,
    pub log_format: LogFormat,
    pub metrics_addr: String,
    /// S-4: directory `TransitionFailure` blocks are dumped to for
    /// post-mortem; `None` disables the dump.
    pub debug_dir: Option<PathBuf>,
}

impl Default for ProposerConfig {
    fn default() -> Self {
        Self {
            max_consecutive_missed_slots: 3,
            max_epoch_missed_slots: 8,
            local_boost_percent: 0,
            builder_timeout_ms: 1000,
            attestation_packing_strategy: PackingStrategy::SlotFirst,
            log_format: LogFormat::Plain,
            metrics_addr: "127.0.0.1:9090".to_string(),
            debug_dir: None,
        }
    }
}

impl ProposerConfig {
    /// Load from the environment, falling back to the defaults above for
    /// anything unset. Panics on a present-but-unparseable value — the same
    /// "fail fast at startup" policy the pack's `EnvVarSpec::required`
    /// follows for required keys.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_consecutive_missed_slots: env::MAX_CONSECUTIVE_MISSED_SLOTS
                .default(defaults.max_consecutive_missed_slots)
                .value,
            max_epoch_missed_slots: env::MAX_EPOCH_MISSED_SLOTS
                .default(defaults.max_epoch_missed_slots)
                .value,
            local_boost_percent: env::LOCAL_BOOST_PERCENT.default(defaults.local_boost_percent).value,
            builder_timeout_ms: env::BUILDER_TIMEOUT_MS.default(defaults.builder_timeout_ms).value,
            attestation_packing_strategy: env::ATTESTATION_PACKING_STRATEGY
                .default(ParsedPackingStrategy(defaults.attestation_packing_strategy))
                .value
                .0,
            log_format: env::LOG_FORMAT.default(defaults.log_format).value,
            metrics_addr: env::METRICS_ADDR.default(defaults.metrics_addr).value,
            debug_dir: env::DEBUG_DIR.optional::<String>().value.map(PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = ProposerConfig::default();
        assert_eq!(config.max_consecutive_missed_slots, 3);
        assert_eq!(config.max_epoch_missed_slots, 8);
        assert_eq!(config.builder_timeout_ms, 1000);
        assert_eq!(config.local_boost_percent, 0);
    }

    #[test]
    fn parses_committee_aware_strategy() {
        let parsed: ParsedPackingStrategy = "committee-aware".parse().unwrap();
        assert_eq!(parsed.0, PackingStrategy::CommitteeAware);
        assert!("bogus".parse::<ParsedPackingStrategy>().is_err());
    }
}
