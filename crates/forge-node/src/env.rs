//! Typed environment-variable reading, grounded on the pack's
//! `EnvVarSpec`/`EnvVarValue` pattern: each tunable is declared once as a
//! `&'static EnvVarSpec` naming its key, then read with `.default(...)`,
//! `.required()`, or `.optional()` depending on whether config.rs wants a
//! fallback.

use std::env;
use std::fmt::Debug;
use std::str::FromStr;

#[derive(Clone, Copy)]
pub struct EnvVarSpec {
    pub key: &'static str,
}

#[derive(Clone, Debug)]
pub struct EnvVarValue<T> {
    pub key: &'static str,
    pub value: T,
}

impl EnvVarSpec {
    pub fn default<T: FromStr>(&'static self, default: T) -> EnvVarValue<T> {
        let value = match env::var(self.key) {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                panic!("failed to parse env var {} (expected a valid value)", self.key)
            }),
            Err(_) => default,
        };
        EnvVarValue { key: self.key, value }
    }

    pub fn optional<T: FromStr>(&'static self) -> EnvVarValue<Option<T>> {
        let value = match env::var(self.key) {
            Ok(raw) => Some(
                raw.parse()
                    .unwrap_or_else(|_| panic!("failed to parse env var {}", self.key)),
            ),
            Err(_) => None,
        };
        EnvVarValue { key: self.key, value }
    }
}

pub const MAX_CONSECUTIVE_MISSED_SLOTS: EnvVarSpec = EnvVarSpec {
    key: "MAX_CONSECUTIVE_MISSED_SLOTS",
};
pub const MAX_EPOCH_MISSED_SLOTS: EnvVarSpec = EnvVarSpec {
    key: "MAX_EPOCH_MISSED_SLOTS",
};
pub const LOCAL_BOOST_PERCENT: EnvVarSpec = EnvVarSpec {
    key: "LOCAL_BOOST_PERCENT",
};
pub const BUILDER_TIMEOUT_MS: EnvVarSpec = EnvVarSpec {
    key: "BUILDER_TIMEOUT_MS",
};
pub const ATTESTATION_PACKING_STRATEGY: EnvVarSpec = EnvVarSpec {
    key: "ATTESTATION_PACKING_STRATEGY",
};
pub const LOG_FORMAT: EnvVarSpec = EnvVarSpec { key: "LOG_FORMAT" };
pub const METRICS_ADDR: EnvVarSpec = EnvVarSpec {
    key: "METRICS_ADDR",
};
pub const DEBUG_DIR: EnvVarSpec = EnvVarSpec { key: "DEBUG_DIR" };
