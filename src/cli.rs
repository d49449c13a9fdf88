//! CLI argument parsing for thurstone

use crate::discrimination::TestKind;
use crate::mplusn::MonteCarloConfig;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for test results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

/// Which one-tailed tests to run on a panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindSelection {
    Difference,
    #[value(alias = "similarity")]
    Equivalence,
    /// Both directions on the same data
    Both,
}

impl KindSelection {
    pub fn kinds(self) -> &'static [TestKind] {
        match self {
            KindSelection::Difference => &[TestKind::Difference],
            KindSelection::Equivalence => &[TestKind::Equivalence],
            KindSelection::Both => &[TestKind::Difference, TestKind::Equivalence],
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "thurstone")]
#[command(version)]
#[command(about = "Thurstonian analysis of sensory discrimination tests", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug tracing output (to stderr)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Seed for M+N Monte Carlo simulation
    #[arg(long = "mc-seed", value_name = "SEED", global = true)]
    pub mc_seed: Option<u64>,

    /// Simulated trials per grid point for M+N curves
    #[arg(long = "mc-samples", value_name = "N", global = true)]
    pub mc_samples: Option<usize>,

    /// Grid points on the M+N d range
    #[arg(long = "mc-steps", value_name = "N", global = true)]
    pub mc_steps: Option<usize>,
}

impl Cli {
    /// Apply the `--mc-*` overrides on top of `base`
    pub fn monte_carlo(&self, base: MonteCarloConfig) -> MonteCarloConfig {
        let mut config = base;
        if let Some(seed) = self.mc_seed {
            config = config.with_seed(seed);
        }
        if let Some(samples) = self.mc_samples {
            config = config.with_sample_size(samples);
        }
        if let Some(steps) = self.mc_steps {
            config = config.with_steps(steps);
        }
        config
    }
}

/// True effect size of a planned test, as pc or as d'
#[derive(Args, Debug, Clone, Copy)]
#[group(required = true, multiple = false)]
pub struct EffectArgs {
    /// Assumed true probability correct
    #[arg(long)]
    pub pc: Option<f64>,

    /// Assumed true sensory distance
    #[arg(long = "d-prime", value_name = "D")]
    pub d_prime: Option<f64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a difference and/or equivalence test on a panel outcome
    Test {
        /// Protocol, e.g. triangle, m_afc:m=5, mplusn:m=4,n=3,specified
        #[arg(short, long)]
        protocol: String,

        /// Correct responses
        #[arg(short = 'x', long)]
        correct: u64,

        /// Total trials
        #[arg(short = 'n', long)]
        trials: u64,

        /// Share of discriminators under the null hypothesis
        #[arg(long, default_value_t = 0.0)]
        pd0: f64,

        /// Confidence level
        #[arg(long = "conf-level", default_value_t = 0.95)]
        conf_level: f64,

        #[arg(long, value_enum, default_value = "difference")]
        kind: KindSelection,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print probability correct by d' as CSV
    Table {
        /// Protocols to tabulate (repeatable; default: all analytic protocols)
        #[arg(short, long = "protocol")]
        protocols: Vec<String>,

        /// Largest d'
        #[arg(long, default_value_t = 8.0)]
        max: f64,

        /// Spacing of the d' grid
        #[arg(long, default_value_t = 0.05)]
        step: f64,
    },

    /// Print d' and B values by probability correct as CSV
    DprimeTable {
        #[arg(short, long)]
        protocol: String,
    },

    /// Power of a planned test with a fixed panel size
    Power {
        #[arg(short, long)]
        protocol: String,

        #[command(flatten)]
        effect: EffectArgs,

        /// Total trials
        #[arg(short = 'n', long)]
        trials: u64,

        #[arg(long, default_value_t = 0.05)]
        alpha: f64,

        #[arg(long, default_value_t = 0.0)]
        pd0: f64,

        #[arg(long, default_value = "difference")]
        kind: TestKind,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Smallest panel reaching a target power
    SampleSize {
        #[arg(short, long)]
        protocol: String,

        #[command(flatten)]
        effect: EffectArgs,

        /// Target power
        #[arg(long, default_value_t = 0.8)]
        power: f64,

        #[arg(long, default_value_t = 0.05)]
        alpha: f64,

        #[arg(long, default_value_t = 0.0)]
        pd0: f64,

        #[arg(long, default_value = "difference")]
        kind: TestKind,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Analyse every panel listed in a TOML file
    Batch {
        /// Configuration file (thurstone.toml)
        #[arg(short, long)]
        config: PathBuf,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}
