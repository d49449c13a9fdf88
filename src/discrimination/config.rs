// Configuration for one-tailed discrimination tests
//
// pd0 fixes the null hypothesis in "share of discriminators" units so that the
// same threshold means the same thing across protocols with different
// guessing rates.

use crate::error::{DiscriminationError, Result};
use serde::{Deserialize, Serialize};

/// Null-hypothesis threshold and confidence level for a test
///
/// # Example
/// ```
/// use thurstone::discrimination::TestConfig;
///
/// let config = TestConfig::default();
/// assert_eq!(config.conf_level, 0.95);
/// assert!((config.alpha() - 0.05).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestConfig {
    /// Share of discriminators under the null hypothesis, in `[0, 1)`
    ///
    /// - difference tests: H0 pd ≤ pd0 (0 asks "is there any difference at all")
    /// - equivalence tests: H0 pd ≥ pd0 (the largest share you accept as "similar")
    pub pd0: f64,

    /// Confidence level in `(0, 1)`; the significance level is `1 − conf_level`
    pub conf_level: f64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            pd0: 0.0,
            conf_level: 0.95,
        }
    }
}

impl TestConfig {
    pub fn new(pd0: f64, conf_level: f64) -> Result<Self> {
        let config = Self { pd0, conf_level };
        config.validate()?;
        Ok(config)
    }

    /// 99% confidence
    pub fn strict() -> Self {
        Self {
            conf_level: 0.99,
            ..Self::default()
        }
    }

    /// 90% confidence
    pub fn permissive() -> Self {
        Self {
            conf_level: 0.90,
            ..Self::default()
        }
    }

    /// Significance level
    pub fn alpha(&self) -> f64 {
        1.0 - self.conf_level
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.pd0) {
            return Err(DiscriminationError::invalid(format!(
                "pd0 must be in [0, 1), got {}",
                self.pd0
            )));
        }

        if !(self.conf_level > 0.0 && self.conf_level < 1.0) {
            return Err(DiscriminationError::invalid(format!(
                "conf_level must be in (0, 1), got {}",
                self.conf_level
            )));
        }

        Ok(())
    }
}
