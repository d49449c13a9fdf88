//! Numerical building blocks for the psychometric layer
//!
//! Thin wrappers over `statrs` (normal and binomial distributions, inverse
//! regularized incomplete beta) and `roots` (Brent's bracketing root finder),
//! plus composite Simpson quadrature on a fixed dense grid and a domain-aware
//! central difference.

use crate::error::{DiscriminationError, Result};
use roots::{find_root_brent, SimpleConvergency};
use statrs::distribution::{Binomial, Continuous, ContinuousCDF, DiscreteCDF, Normal};
use statrs::function::beta::inv_beta_reg;

/// Convergence tolerance for d-prime roots
pub const ROOT_TOLERANCE: f64 = 1e-12;

/// Iteration cap for Brent's method
pub const ROOT_MAX_ITER: usize = 100;

/// Step for the central-difference derivative of a psychometric function
pub const DERIVATIVE_STEP: f64 = 1e-6;

/// Standard normal CDF Φ(x)
#[inline]
pub fn norm_cdf(x: f64) -> f64 {
    Normal::standard().cdf(x)
}

/// Standard normal PDF φ(x)
#[inline]
pub fn norm_pdf(x: f64) -> f64 {
    Normal::standard().pdf(x)
}

/// Composite Simpson rule over a fixed, dense grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadrature {
    pub lower: f64,
    pub upper: f64,
    /// Number of sub-intervals (rounded up to an even count)
    pub intervals: usize,
}

impl Quadrature {
    pub const fn new(lower: f64, upper: f64, intervals: usize) -> Self {
        Self {
            lower,
            upper,
            intervals,
        }
    }

    /// Integrate `f` over `[lower, upper]`
    pub fn integrate<F>(&self, f: F) -> f64
    where
        F: Fn(f64) -> f64,
    {
        let intervals = self.intervals.max(2);
        let intervals = intervals + intervals % 2;
        let h = (self.upper - self.lower) / intervals as f64;

        let mut sum = f(self.lower) + f(self.upper);
        for i in 1..intervals {
            let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
            sum += weight * f(self.lower + i as f64 * h);
        }

        sum * h / 3.0
    }
}

/// Find a root of `f` inside `[lower, upper]` with Brent's method
///
/// `f(lower)` and `f(upper)` must have opposite signs (or one must be zero).
///
/// # Errors
///
/// `NoConvergence` when the interval does not bracket a root or the iteration
/// cap is reached; the first error raised by `f` itself is propagated.
pub fn brent_root<F>(f: F, lower: f64, upper: f64) -> Result<f64>
where
    F: Fn(f64) -> Result<f64>,
{
    let mut failure = None;
    let mut convergency = SimpleConvergency {
        eps: ROOT_TOLERANCE,
        max_iter: ROOT_MAX_ITER,
    };

    let root = find_root_brent(
        lower,
        upper,
        |x| match f(x) {
            Ok(y) => y,
            Err(e) => {
                failure.get_or_insert(e);
                f64::NAN
            }
        },
        &mut convergency,
    );

    if let Some(e) = failure {
        return Err(e);
    }
    root.map_err(|e| {
        DiscriminationError::no_convergence(format!(
            "Brent's method on [{lower}, {upper}]: {e:?}"
        ))
    })
}

/// Numerical derivative of `f` at `x`
///
/// Central difference with step `h`; falls back to a one-sided difference
/// when `x ± h` leaves `[domain.0, domain.1]`.
pub fn central_difference<F>(f: F, x: f64, h: f64, domain: (f64, f64)) -> Result<f64>
where
    F: Fn(f64) -> Result<f64>,
{
    let (lo, hi) = domain;
    let left = if x - h < lo { x } else { x - h };
    let right = if x + h > hi { x } else { x + h };

    if right <= left {
        return Err(DiscriminationError::invalid(format!(
            "cannot differentiate at {x}: domain [{lo}, {hi}] narrower than step {h}"
        )));
    }

    Ok((f(right)? - f(left)?) / (right - left))
}

fn binomial(n: u64, p: f64) -> Result<Binomial> {
    Binomial::new(p, n).map_err(|e| {
        DiscriminationError::invalid(format!("binomial(n = {n}, p = {p}): {e}"))
    })
}

/// P(X ≤ k) for X ~ Binomial(n, p)
pub fn binomial_cdf(k: u64, n: u64, p: f64) -> Result<f64> {
    Ok(binomial(n, p)?.cdf(k))
}

/// P(X ≥ k) for X ~ Binomial(n, p), inclusive of `k`
pub fn binomial_sf_inclusive(k: u64, n: u64, p: f64) -> Result<f64> {
    if k == 0 {
        return Ok(1.0);
    }
    Ok(binomial(n, p)?.sf(k - 1))
}

/// Smallest `k` in `0..=n` with `P(X ≤ k) ≥ q`
pub fn binomial_quantile(q: f64, n: u64, p: f64) -> Result<u64> {
    let dist = binomial(n, p)?;
    Ok((0..=n).find(|&k| dist.cdf(k) >= q).unwrap_or(n))
}

/// Inverse CDF of Beta(a, b) at `p` (inverse regularized incomplete beta)
pub fn beta_quantile(p: f64, a: f64, b: f64) -> Result<f64> {
    if !(a > 0.0 && b > 0.0 && a.is_finite() && b.is_finite()) {
        return Err(DiscriminationError::invalid(format!(
            "beta({a}, {b}) needs positive finite shape parameters"
        )));
    }
    if !(0.0..=1.0).contains(&p) {
        return Err(DiscriminationError::invalid(format!(
            "beta quantile needs p in [0, 1], got {p}"
        )));
    }
    Ok(inv_beta_reg(a, b, p))
}

/// Binomial coefficient C(n, k) as a float
pub fn choose(n: u64, k: u64) -> f64 {
    statrs::function::factorial::binomial(n, k)
}
