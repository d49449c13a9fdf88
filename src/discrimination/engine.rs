// One-tailed discrimination tests on a bound method
//
// Both test kinds share the estimate and interval computation in `limits`, so
// they always agree on pc, pd and d' and differ only in p-value and power.

use crate::discrimination::config::TestConfig;
use crate::discrimination::results::TestResults;
use crate::discrimination::statistics::{
    clopper_pearson, critical_value, p_value, power, Statistic, TestKind,
};
use crate::error::{DiscriminationError, Result};
use crate::method::{discriminators_from_pc, pc_from_discriminators, DiscriminationMethod};
use tracing::warn;

/// Runs difference and equivalence tests against one discrimination method
///
/// # Example
/// ```
/// use thurstone::discrimination::DiscriminationTest;
/// use thurstone::method::DiscriminationMethod;
/// use thurstone::protocol::Protocol;
///
/// let method = DiscriminationMethod::new(Protocol::Triangle).unwrap();
/// let results = DiscriminationTest::new(&method)
///     .difference(19, 30, 0.0, 0.95)
///     .unwrap();
/// assert!(results.is_significant());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DiscriminationTest<'a> {
    method: &'a DiscriminationMethod,
}

/// Point estimates and intervals shared by both test kinds
struct Limits {
    pc: Statistic,
    pd: Statistic,
    d_prime: Statistic,
}

impl<'a> DiscriminationTest<'a> {
    pub fn new(method: &'a DiscriminationMethod) -> Self {
        Self { method }
    }

    pub fn method(&self) -> &DiscriminationMethod {
        self.method
    }

    /// Test H0: pd ≤ pd0 against H1: pd > pd0
    pub fn difference(&self, x: u64, n: u64, pd0: f64, conf_level: f64) -> Result<TestResults> {
        self.run(TestKind::Difference, x, n, &TestConfig::new(pd0, conf_level)?)
    }

    /// Test H0: pd ≥ pd0 against H1: pd < pd0
    pub fn equivalence(&self, x: u64, n: u64, pd0: f64, conf_level: f64) -> Result<TestResults> {
        self.run(TestKind::Equivalence, x, n, &TestConfig::new(pd0, conf_level)?)
    }

    /// Run a test of either kind with `config`
    ///
    /// # Errors
    ///
    /// - `InvalidParameter` for `n == 0`, `x > n` or an invalid config
    /// - `NoConvergence` when `x/n` lies below the guessing rate or no finite
    ///   d' reaches it (e.g. `x == n`)
    /// - `DomainError` from an M+N curve queried past its grid
    pub fn run(&self, kind: TestKind, x: u64, n: u64, config: &TestConfig) -> Result<TestResults> {
        if n == 0 {
            return Err(DiscriminationError::invalid("number of trials must be positive"));
        }
        if x > n {
            return Err(DiscriminationError::invalid(format!(
                "correct responses ({x}) cannot exceed trials ({n})"
            )));
        }
        config.validate()?;

        let alpha = config.alpha();
        let pg = self.method.guessing();
        let pc0 = pc_from_discriminators(config.pd0, pg);

        let limits = self.limits(x, n, alpha)?;
        let critical_value = critical_value(kind, n, pc0, alpha)?;

        tracing::debug!(
            method = %self.method.name(),
            %kind,
            x,
            n,
            pc0,
            ?critical_value,
            "ran discrimination test"
        );

        Ok(TestResults {
            method: self.method.name(),
            kind,
            correct: x,
            trials: n,
            pd0: config.pd0,
            pg,
            pc0,
            pc: limits.pc,
            pd: limits.pd,
            d_prime: limits.d_prime,
            p_value: p_value(kind, x, n, pc0)?,
            alpha,
            critical_value,
            power: power(kind, n, pc0, limits.pc.estimate, alpha)?,
        })
    }

    fn limits(&self, x: u64, n: u64, alpha: f64) -> Result<Limits> {
        let pg = self.method.guessing();
        let pc = x as f64 / n as f64;
        let pd = discriminators_from_pc(pc, pg);
        let d_prime = self.method.solve_d_prime(pc)?;

        let pc_err = (pc * (1.0 - pc) / n as f64).sqrt();
        let pd_err = pc_err / (1.0 - pg);
        let d_prime_err = pc_err / self.method.derivative(d_prime)?;
        if !d_prime_err.is_finite() {
            warn!(
                method = %self.method.name(),
                d_prime,
                "psychometric slope vanishes at the estimate; d' standard error is undefined"
            );
        }

        let (beta_lower, beta_upper) = clopper_pearson(x, n, alpha)?;
        let pc_lower = beta_lower.max(pg);
        let pc_upper = beta_upper.min(1.0);

        Ok(Limits {
            pc: Statistic {
                estimate: pc,
                stderr: pc_err,
                lower: pc_lower,
                upper: pc_upper,
            },
            pd: Statistic {
                estimate: pd,
                stderr: pd_err,
                lower: discriminators_from_pc(pc_lower, pg),
                upper: discriminators_from_pc(pc_upper, pg),
            },
            d_prime: Statistic {
                estimate: d_prime,
                stderr: d_prime_err,
                lower: self.method.solve_d_prime(pc_lower)?,
                upper: self.method.solve_d_prime(pc_upper)?,
            },
        })
    }
}
