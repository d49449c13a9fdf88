// Exact binomial statistics shared by the difference and equivalence tests
//
// - p-values are exact binomial tail probabilities under pc0
// - critical values come from the binomial quantile function
// - confidence limits for pc use the Clopper-Pearson beta construction

use crate::error::{DiscriminationError, Result};
use crate::numerics::{beta_quantile, binomial_cdf, binomial_quantile, binomial_sf_inclusive};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of the one-tailed test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestKind {
    /// H1: pd > pd0, the products are perceptibly different
    Difference,
    /// H1: pd < pd0, the products are similar
    #[serde(alias = "similarity")]
    Equivalence,
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestKind::Difference => write!(f, "difference"),
            TestKind::Equivalence => write!(f, "equivalence"),
        }
    }
}

impl FromStr for TestKind {
    type Err = DiscriminationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "difference" => Ok(TestKind::Difference),
            "equivalence" | "similarity" => Ok(TestKind::Equivalence),
            other => Err(DiscriminationError::invalid(format!(
                "test kind must be 'difference' or 'equivalence', got '{other}'"
            ))),
        }
    }
}

/// Point estimate, standard error and confidence bounds of one quantity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Statistic {
    pub estimate: f64,
    pub stderr: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Exact one-tailed p-value of observing `x` of `n` when pc = `pc0`
///
/// Difference: P(X ≥ x). Equivalence: P(X ≤ x).
pub fn p_value(kind: TestKind, x: u64, n: u64, pc0: f64) -> Result<f64> {
    match kind {
        TestKind::Difference => binomial_sf_inclusive(x, n, pc0),
        TestKind::Equivalence => binomial_cdf(x, n, pc0),
    }
}

/// Boundary of the rejection region at significance `alpha`
///
/// Difference: smallest `c` with P(X ≥ c | pc0) ≤ alpha, rejecting for X ≥ c.
/// Equivalence: largest `c` with P(X ≤ c | pc0) ≤ alpha, rejecting for X ≤ c.
/// `None` when no outcome out of `n` trials can reject.
pub fn critical_value(kind: TestKind, n: u64, pc0: f64, alpha: f64) -> Result<Option<u64>> {
    match kind {
        TestKind::Difference => {
            let c = binomial_quantile(1.0 - alpha, n, pc0)? + 1;
            Ok((c <= n).then_some(c))
        }
        TestKind::Equivalence => {
            let q = binomial_quantile(alpha, n, pc0)?;
            if binomial_cdf(q, n, pc0)? <= alpha {
                Ok(Some(q))
            } else {
                Ok(q.checked_sub(1))
            }
        }
    }
}

/// Probability of rejecting H0 when the true probability correct is `pc`
pub fn power(kind: TestKind, n: u64, pc0: f64, pc: f64, alpha: f64) -> Result<f64> {
    let Some(c) = critical_value(kind, n, pc0, alpha)? else {
        return Ok(0.0);
    };
    match kind {
        TestKind::Difference => binomial_sf_inclusive(c, n, pc),
        TestKind::Equivalence => binomial_cdf(c, n, pc),
    }
}

/// Two-sided Clopper-Pearson interval for a binomial proportion
///
/// Each bound holds `alpha/2` in its tail; `x = 0` gives a lower bound of 0
/// and `x = n` an upper bound of 1.
pub fn clopper_pearson(x: u64, n: u64, alpha: f64) -> Result<(f64, f64)> {
    if n == 0 || x > n {
        return Err(DiscriminationError::invalid(format!(
            "need 0 <= x <= n and n > 0, got x = {x}, n = {n}"
        )));
    }
    let (xf, nf) = (x as f64, n as f64);

    let lower = if x == 0 {
        0.0
    } else {
        beta_quantile(alpha / 2.0, xf, nf - xf + 1.0)?
    };
    let upper = if x == n {
        1.0
    } else {
        beta_quantile(1.0 - alpha / 2.0, xf + 1.0, nf - xf)?
    };

    Ok((lower, upper))
}
