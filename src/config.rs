//! Batch analysis configuration (thurstone.toml)
//!
//! Describes a set of panels to analyse in one run, plus the defaults and
//! Monte Carlo settings they share.
//!
//! # Example thurstone.toml
//!
//! ```toml
//! [defaults]
//! conf_level = 0.95
//! pd0 = 0.0
//!
//! [monte_carlo]
//! seed = 12345
//! sample_size = 100000
//!
//! [[panel]]
//! name = "sweetener reformulation"
//! protocol = "triangle"
//! correct = 19
//! trials = 30
//!
//! [[panel]]
//! name = "packaging change"
//! protocol = "mplusn:m=4,n=3"
//! correct = 9
//! trials = 40
//! kind = "equivalence"
//! pd0 = 0.3
//! ```

use crate::discrimination::{DiscriminationTest, TestConfig, TestKind, TestResults};
use crate::error::DiscriminationError;
use crate::method::DiscriminationMethod;
use crate::mplusn::MonteCarloConfig;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// One panel outcome to analyse
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PanelSpec {
    pub name: String,

    /// Protocol spec string, e.g. `triangle` or `mplusn:m=4,n=3,specified`
    pub protocol: String,

    pub correct: u64,
    pub trials: u64,

    #[serde(default = "default_kind")]
    pub kind: TestKind,

    /// Overrides `[defaults] pd0`
    #[serde(default)]
    pub pd0: Option<f64>,

    /// Overrides `[defaults] conf_level`
    #[serde(default)]
    pub conf_level: Option<f64>,
}

fn default_kind() -> TestKind {
    TestKind::Difference
}

impl PanelSpec {
    /// Test settings for this panel on top of `defaults`
    pub fn test_config(&self, defaults: &TestConfig) -> TestConfig {
        TestConfig {
            pd0: self.pd0.unwrap_or(defaults.pd0),
            conf_level: self.conf_level.unwrap_or(defaults.conf_level),
        }
    }
}

/// Root configuration for thurstone.toml
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub defaults: TestConfig,

    #[serde(default)]
    pub monte_carlo: MonteCarloConfig,

    #[serde(default)]
    pub panel: Vec<PanelSpec>,
}

/// Result of analysing one panel
#[derive(Debug, Clone)]
pub struct PanelOutcome {
    pub name: String,
    pub result: std::result::Result<TestResults, DiscriminationError>,
}

impl AnalysisConfig {
    /// Load and validate a configuration file
    ///
    /// # Example
    ///
    /// ```no_run
    /// use thurstone::config::AnalysisConfig;
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = AnalysisConfig::from_file("thurstone.toml")?;
    /// println!("Loaded {} panels", config.panel.len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Parse and validate a configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.defaults.validate().context("Invalid [defaults]")?;
        self.monte_carlo
            .validate()
            .context("Invalid [monte_carlo]")?;

        for panel in &self.panel {
            if panel.trials == 0 {
                bail!("Panel '{}': trials must be positive", panel.name);
            }
            if panel.correct > panel.trials {
                bail!(
                    "Panel '{}': correct ({}) exceeds trials ({})",
                    panel.name,
                    panel.correct,
                    panel.trials
                );
            }
            panel
                .test_config(&self.defaults)
                .validate()
                .with_context(|| format!("Panel '{}'", panel.name))?;
        }

        Ok(())
    }

    /// Analyse every panel in order
    ///
    /// Methods are built once per distinct protocol spec, so several panels
    /// on the same M+N design share one simulation. A failing panel records
    /// its error and does not stop the others.
    pub fn run_panels(&self) -> Vec<PanelOutcome> {
        let mut methods: HashMap<&str, std::result::Result<DiscriminationMethod, DiscriminationError>> =
            HashMap::new();

        self.panel
            .iter()
            .map(|panel| {
                let method = methods.entry(panel.protocol.as_str()).or_insert_with(|| {
                    DiscriminationMethod::from_spec(&panel.protocol, &self.monte_carlo)
                });

                let result = method.as_ref().map_err(Clone::clone).and_then(|method| {
                    DiscriminationTest::new(method).run(
                        panel.kind,
                        panel.correct,
                        panel.trials,
                        &panel.test_config(&self.defaults),
                    )
                });
                if let Err(e) = &result {
                    tracing::warn!(panel = %panel.name, error = %e, "panel analysis failed");
                }

                PanelOutcome {
                    name: panel.name.clone(),
                    result,
                }
            })
            .collect()
    }
}
