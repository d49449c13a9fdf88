//! Monte Carlo psychometric curves for the "M + N" protocol
//!
//! The M+N sorting task has no tractable closed form. Its curve is estimated
//! by simulation on a grid of sensory distances and exposed as a piecewise
//! linear interpolant with the same contract as the analytic functions.
//!
//! # Algorithm
//!
//! For every grid value `d`, draw `sample_size` trials of an n-tuple
//! A ~ N(0, 1) and an m-tuple B ~ N(d, 1), sort both, and count the trials in
//! which a panelist sorting by perceived intensity would recover the groups.
//! The generator is a locally owned `ChaCha8Rng` seeded from the config, so a
//! given seed always reproduces the same table bit for bit.

use crate::error::{DiscriminationError, Result};
use crate::protocol::Protocol;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Default seed for reproducible curves
pub const DEFAULT_SEED: u64 = 12345;

/// Default number of simulated trials per grid point
pub const DEFAULT_SAMPLE_SIZE: usize = 100_000;

/// Default number of grid points
pub const DEFAULT_STEPS: usize = 300;

/// Default upper end of the simulated d range
pub const DEFAULT_MAX_DELTA: f64 = 5.0;

/// Simulation settings for an M+N curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    /// Upper end of the d grid (the grid starts at 0)
    pub max_delta: f64,
    /// Number of grid points, endpoints included
    pub steps: usize,
    /// Simulated trials per grid point
    pub sample_size: usize,
    /// Generator seed
    pub seed: u64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            max_delta: DEFAULT_MAX_DELTA,
            steps: DEFAULT_STEPS,
            sample_size: DEFAULT_SAMPLE_SIZE,
            seed: DEFAULT_SEED,
        }
    }
}

impl MonteCarloConfig {
    /// A coarse grid for quick interactive runs
    pub fn quick() -> Self {
        Self {
            steps: 101,
            sample_size: 20_000,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.max_delta.is_finite() && self.max_delta > 0.0) {
            return Err(DiscriminationError::invalid(format!(
                "max_delta must be positive and finite, got {}",
                self.max_delta
            )));
        }
        if self.steps < 2 {
            return Err(DiscriminationError::invalid(format!(
                "steps must be >= 2 to interpolate, got {}",
                self.steps
            )));
        }
        if self.sample_size == 0 {
            return Err(DiscriminationError::invalid("sample_size must be positive"));
        }
        Ok(())
    }

    /// The d grid: `steps` evenly spaced values on `[0, max_delta]`
    pub fn grid(&self) -> Vec<f64> {
        let last = (self.steps - 1) as f64;
        (0..self.steps)
            .map(|i| self.max_delta * i as f64 / last)
            .collect()
    }
}

/// Which sorted outcomes count as a correct grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Criterion {
    /// Panelist knows which group is which: all of A below all of B
    Specified,
    /// Unspecified with m = n: either group entirely below the other
    Symmetric,
    /// Unspecified with m > n: the n-group must be separated from the rest by
    /// a larger gap than the one inside the m-group
    Gap { k: usize },
}

impl Criterion {
    fn for_design(m: usize, n: usize, specified: bool) -> Self {
        if specified {
            Criterion::Specified
        } else if m == n {
            Criterion::Symmetric
        } else {
            Criterion::Gap { k: m - n }
        }
    }

    /// `a` (length n) and `b` (length m) are sorted ascending
    fn is_correct(self, a: &[f64], b: &[f64]) -> bool {
        let (n, m) = (a.len(), b.len());
        let a_below = a[n - 1] < b[0];
        let a_above = a[0] > b[m - 1];

        match self {
            Criterion::Specified => a_below,
            Criterion::Symmetric => a_below || a_above,
            Criterion::Gap { k } => {
                let below = (b[k] - b[k - 1]) < (b[0] - a[n - 1]) && a_below;
                let above = (b[n] - b[n - 1]) < (a[0] - b[m - 1]) && a_above;
                below || above
            }
        }
    }
}

/// Simulated, linearly interpolated psychometric curve of an M+N design
#[derive(Debug, Clone, PartialEq)]
pub struct MPlusNCurve {
    m: u32,
    n: u32,
    specified: bool,
    deltas: Vec<f64>,
    proportions: Vec<f64>,
}

impl MPlusNCurve {
    /// Run the simulation and build the interpolant
    ///
    /// # Errors
    ///
    /// `InvalidParameter` when `m < n`, `n == 0`, a group exceeds
    /// [`crate::protocol::MAX_GROUP_SIZE`] or the config is invalid; checked
    /// before any sampling happens.
    pub fn simulate(m: u32, n: u32, specified: bool, config: &MonteCarloConfig) -> Result<Self> {
        Protocol::m_plus_n(m, n, specified)?;
        config.validate()?;

        let start = Instant::now();
        let criterion = Criterion::for_design(m as usize, n as usize, specified);
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut a = vec![0.0_f64; n as usize];
        let mut b = vec![0.0_f64; m as usize];

        let deltas = config.grid();
        let mut proportions = Vec::with_capacity(deltas.len());

        for &d in &deltas {
            let mut correct = 0usize;
            for _ in 0..config.sample_size {
                for x in a.iter_mut() {
                    *x = rng.sample(StandardNormal);
                }
                for x in b.iter_mut() {
                    *x = d + rng.sample::<f64, _>(StandardNormal);
                }
                a.sort_unstable_by(f64::total_cmp);
                b.sort_unstable_by(f64::total_cmp);

                if criterion.is_correct(&a, &b) {
                    correct += 1;
                }
            }
            let pc = correct as f64 / config.sample_size as f64;
            tracing::trace!(d, pc, "simulated grid point");
            proportions.push(pc);
        }

        tracing::debug!(
            m,
            n,
            specified,
            steps = config.steps,
            sample_size = config.sample_size,
            seed = config.seed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "simulated M+N psychometric curve"
        );

        Ok(Self {
            m,
            n,
            specified,
            deltas,
            proportions,
        })
    }

    /// Interpolated probability correct at `d`
    ///
    /// # Errors
    ///
    /// `DomainError` when `d` lies outside the simulated grid.
    pub fn evaluate(&self, d: f64) -> Result<f64> {
        let (lower, upper) = self.domain();
        if !(lower..=upper).contains(&d) {
            return Err(DiscriminationError::DomainError {
                value: d,
                lower,
                upper,
            });
        }

        let idx = self
            .deltas
            .partition_point(|&x| x <= d)
            .clamp(1, self.deltas.len() - 1);
        let (x0, x1) = (self.deltas[idx - 1], self.deltas[idx]);
        let (y0, y1) = (self.proportions[idx - 1], self.proportions[idx]);

        Ok(y0 + (y1 - y0) * (d - x0) / (x1 - x0))
    }

    /// Range of d covered by the simulation
    pub fn domain(&self) -> (f64, f64) {
        (self.deltas[0], self.deltas[self.deltas.len() - 1])
    }

    pub fn deltas(&self) -> &[f64] {
        &self.deltas
    }

    pub fn proportions(&self) -> &[f64] {
        &self.proportions
    }

    pub fn design(&self) -> (u32, u32, bool) {
        (self.m, self.n, self.specified)
    }
}
