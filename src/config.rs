//! Layered configuration — `SPEC_FULL.md` §4.7.
//!
//! Grounded on `chenjjiaa-anvil`'s workspace, which already pulls in the `config` crate for
//! this exact shape: compiled-in defaults, overridden by an optional file, overridden by
//! `ENGINE_`-prefixed environment variables. No wire protocol means no listen address here —
//! just the knobs the engine and the demo harness actually read.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Configuration for a running engine and its demo harness.
///
/// `#[serde(default)]` on every field means a partial or absent config file still produces a
/// complete `EngineConfig` — only the env/file overrides that are actually present apply.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Starting price used to seed the simulator's random walk.
    #[serde(default = "defaults::starting_mid")]
    pub starting_mid: f64,

    /// Poisson arrival rate (orders/sec) the simulator drives the engine at.
    #[serde(default = "defaults::attack_rate_hz")]
    pub attack_rate_hz: f64,

    /// Standard deviation of the per-tick drift applied to the simulated mid price.
    #[serde(default = "defaults::noise_sigma")]
    pub noise_sigma: f64,

    /// Mean order size the simulator draws from (unit-exponential * this).
    #[serde(default = "defaults::mean_qty")]
    pub mean_qty: f64,
}

mod defaults {
    pub fn starting_mid() -> f64 {
        50.0
    }
    pub fn attack_rate_hz() -> f64 {
        5.0
    }
    pub fn noise_sigma() -> f64 {
        0.5
    }
    pub fn mean_qty() -> f64 {
        5.0
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            starting_mid: defaults::starting_mid(),
            attack_rate_hz: defaults::attack_rate_hz(),
            noise_sigma: defaults::noise_sigma(),
            mean_qty: defaults::mean_qty(),
        }
    }
}

impl EngineConfig {
    /// Load defaults, then an optional `engine.toml` in the working directory (missing is
    /// fine), then `ENGINE_*` environment overrides, in that order of increasing precedence.
    pub fn load() -> Result<Self, ConfigError> {
        let raw = Config::builder()
            .add_source(File::with_name("engine").required(false))
            .add_source(Environment::with_prefix("ENGINE"))
            .build()?;
        raw.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_self_consistent() {
        let cfg = EngineConfig::default();
        assert!(cfg.starting_mid > 0.0);
        assert!(cfg.attack_rate_hz > 0.0);
    }
}
