//! Discrimination methods: a protocol bound to its psychometric function
//!
//! A [`DiscriminationMethod`] is built once and reused across many tests.
//! For M+N protocols construction runs the Monte Carlo simulation, and the
//! resulting curve is owned (read-only) for the method's lifetime.

use crate::error::{DiscriminationError, Result};
use crate::mplusn::{MPlusNCurve, MonteCarloConfig};
use crate::numerics::{brent_root, central_difference, DERIVATIVE_STEP};
use crate::protocol::{Protocol, ProtocolParams};
use crate::psychometric;

/// Upper limit for bracketing d-prime roots of analytic curves
pub const MAX_D_PRIME: f64 = 64.0;

/// Slack below the guessing rate still treated as chance performance
const GUESSING_SLACK: f64 = 1e-9;

/// Percent discriminators from probability correct: `(pc − pg)/(1 − pg)`
///
/// Clamped to `[0, 1]` so round-off at chance never yields a negative share.
pub fn discriminators_from_pc(pc: f64, guessing: f64) -> f64 {
    ((pc - guessing) / (1.0 - guessing)).clamp(0.0, 1.0)
}

/// Probability correct corresponding to a share of discriminators
pub fn pc_from_discriminators(pd: f64, guessing: f64) -> f64 {
    guessing + (1.0 - guessing) * pd
}

#[derive(Debug, Clone)]
enum Curve {
    Analytic,
    Simulated(MPlusNCurve),
}

/// A discrimination protocol together with its psychometric function
#[derive(Debug, Clone)]
pub struct DiscriminationMethod {
    protocol: Protocol,
    curve: Curve,
}

impl DiscriminationMethod {
    /// Bind a protocol; M+N curves are simulated with the default settings
    pub fn new(protocol: Protocol) -> Result<Self> {
        Self::with_monte_carlo(protocol, &MonteCarloConfig::default())
    }

    /// Bind a protocol, simulating M+N curves with `config`
    pub fn with_monte_carlo(protocol: Protocol, config: &MonteCarloConfig) -> Result<Self> {
        protocol.validate()?;

        let curve = match protocol {
            Protocol::MPlusN { m, n, specified } => {
                Curve::Simulated(MPlusNCurve::simulate(m, n, specified, config)?)
            }
            _ => Curve::Analytic,
        };

        Ok(Self { protocol, curve })
    }

    /// Look up a protocol by registry key and keyword parameters
    pub fn from_name(name: &str, params: &ProtocolParams) -> Result<Self> {
        Self::new(Protocol::from_name(name, params)?)
    }

    /// Parse a spec string such as `triangle` or `mplusn:m=4,n=3`
    pub fn from_spec(spec: &str, config: &MonteCarloConfig) -> Result<Self> {
        Self::with_monte_carlo(Protocol::parse(spec)?, config)
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn name(&self) -> String {
        self.protocol.to_string()
    }

    /// Guessing rate pg
    pub fn guessing(&self) -> f64 {
        self.protocol.guessing_rate()
    }

    /// The simulated curve backing an M+N method
    pub fn simulated_curve(&self) -> Option<&MPlusNCurve> {
        match &self.curve {
            Curve::Simulated(curve) => Some(curve),
            Curve::Analytic => None,
        }
    }

    /// Range of d on which the psychometric function is defined
    pub fn domain(&self) -> (f64, f64) {
        match &self.curve {
            Curve::Analytic => (f64::NEG_INFINITY, f64::INFINITY),
            Curve::Simulated(curve) => curve.domain(),
        }
    }

    /// Probability of a correct response at sensory distance `d`
    pub fn psychometric(&self, d: f64) -> Result<f64> {
        match &self.curve {
            Curve::Analytic => psychometric::evaluate(&self.protocol, d),
            Curve::Simulated(curve) => curve.evaluate(d),
        }
    }

    /// Share of true discriminators at sensory distance `d`
    pub fn discriminators(&self, d: f64) -> Result<f64> {
        Ok(discriminators_from_pc(self.psychometric(d)?, self.guessing()))
    }

    /// Slope of the psychometric function at `d` (central difference)
    pub fn derivative(&self, d: f64) -> Result<f64> {
        central_difference(|x| self.psychometric(x), d, DERIVATIVE_STEP, self.domain())
    }

    /// Solve `psi(d) = pc` for d ≥ 0
    ///
    /// Targets at or below the curve's value at d = 0 (but not below the
    /// guessing rate) resolve to 0.
    ///
    /// # Errors
    ///
    /// `NoConvergence` when `pc` is below the guessing rate, at or above 1, or
    /// above the largest value the curve attains on its domain.
    pub fn solve_d_prime(&self, pc: f64) -> Result<f64> {
        if pc.is_nan() {
            return Err(DiscriminationError::invalid("pc must be a number"));
        }
        let guessing = self.guessing();
        if pc < guessing - GUESSING_SLACK {
            return Err(DiscriminationError::no_convergence(format!(
                "pc = {pc:.6} is below the guessing rate {guessing:.6} of {}",
                self.protocol
            )));
        }
        if pc >= 1.0 {
            return Err(DiscriminationError::no_convergence(format!(
                "pc = {pc} has no finite d-prime"
            )));
        }

        let objective = |d: f64| -> Result<f64> { Ok(self.psychometric(d)? - pc) };
        if pc <= guessing + GUESSING_SLACK || objective(0.0)? >= 0.0 {
            return Ok(0.0);
        }

        let cap = self.domain().1.min(MAX_D_PRIME);
        let mut upper = cap.min(1.0);
        while objective(upper)? < 0.0 {
            if upper >= cap {
                return Err(DiscriminationError::no_convergence(format!(
                    "pc = {pc:.6} is not attained by {} for d <= {cap}",
                    self.protocol
                )));
            }
            upper = (upper * 2.0).min(cap);
        }

        let root = brent_root(objective, 0.0, upper)?;
        tracing::trace!(protocol = %self.protocol, pc, root, "solved d-prime");
        Ok(root)
    }
}
