//! Builder and serializable configuration for a [`PedalChain`].

use serde::{Deserialize, Serialize};

use keylight_pedal::{DamperPedal, SoftPedal, SostenutoPedal, DEFAULT_SOFTEN_FACTOR};

use crate::{PedalChain, Result};

/// Which emulators a chain runs, and how the soft pedal scales velocity.
///
/// Missing fields take their defaults when deserialized, so `{}` is a valid
/// config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PedalChainConfig {
    pub damper: bool,
    pub sostenuto: bool,
    pub soft: bool,
    /// Velocity multiplier in `[0, 1]` applied while the soft pedal is down.
    pub soften_factor: f64,
}

impl Default for PedalChainConfig {
    fn default() -> Self {
        Self {
            damper: true,
            sostenuto: true,
            soft: true,
            soften_factor: DEFAULT_SOFTEN_FACTOR,
        }
    }
}

impl PedalChainConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// All emulators are enabled by default.
///
/// # Example
///
/// ```
/// use keylight::PedalChain;
///
/// let chain = PedalChain::builder()
///     .sostenuto(false)
///     .soften_factor(0.5)
///     .build()?;
///
/// assert!(chain.sostenuto().is_none());
/// # Ok::<(), keylight::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct PedalChainBuilder {
    config: PedalChainConfig,
}

impl PedalChainBuilder {
    pub fn from_config(config: PedalChainConfig) -> Self {
        Self { config }
    }

    pub fn damper(mut self, enabled: bool) -> Self {
        self.config.damper = enabled;
        self
    }

    pub fn sostenuto(mut self, enabled: bool) -> Self {
        self.config.sostenuto = enabled;
        self
    }

    pub fn soft(mut self, enabled: bool) -> Self {
        self.config.soft = enabled;
        self
    }

    /// Default: 2/3
    pub fn soften_factor(mut self, factor: f64) -> Self {
        self.config.soften_factor = factor;
        self
    }

    pub fn config(&self) -> &PedalChainConfig {
        &self.config
    }

    /// Fails if the soften factor is outside `[0, 1]`, even when the soft
    /// pedal is disabled.
    pub fn build(self) -> Result<PedalChain> {
        let config = self.config;
        let soft = SoftPedal::with_soften_factor(config.soften_factor)?;

        Ok(PedalChain::from_parts(
            config.soft.then_some(soft),
            config.sostenuto.then(SostenutoPedal::new),
            config.damper.then(DamperPedal::new),
        ))
    }
}
