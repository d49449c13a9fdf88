//! Psychometric functions: sensory distance d ↦ probability correct
//!
//! Three protocols have closed forms. The remaining deterministic protocols
//! are integrals over standard-normal densities with no closed form; they are
//! evaluated by composite Simpson quadrature over a truncation wide enough
//! that the tails vanish in double precision.
//!
//! M+N curves are simulated instead, see [`crate::mplusn`].

use crate::error::{DiscriminationError, Result};
use crate::numerics::{norm_cdf, norm_pdf, Quadrature};
use crate::protocol::Protocol;

/// Truncation for integrands weighted by a standard normal density
pub const NORMAL_QUADRATURE: Quadrature = Quadrature::new(-100.0, 100.0, 10_000);

/// Truncation of the half-line integral used by the triangle construction
pub const TRIANGLE_QUADRATURE: Quadrature = Quadrature::new(0.0, 200.0, 10_000);

/// Evaluate the psychometric function of a deterministic protocol at `d`
///
/// The result is clamped to `[0, 1]` to absorb quadrature round-off.
///
/// # Errors
///
/// `InvalidParameter` for an invalid m-AFC, for a non-finite result and for
/// M+N, whose curve only exists once simulated.
pub fn evaluate(protocol: &Protocol, d: f64) -> Result<f64> {
    protocol.validate()?;

    let pc = match *protocol {
        Protocol::TwoAfc => two_afc(d),
        Protocol::DuoTrio => duo_trio(d),
        Protocol::DualPair => dual_pair(d),
        Protocol::Triangle => triangle(d),
        Protocol::ThreeAfc => three_afc(d),
        Protocol::FourAfc => four_afc(d),
        Protocol::MultipleAfc { m } => multiple_afc(m, d),
        Protocol::SpecifiedTetrad => specified_tetrad(d),
        Protocol::UnspecifiedTetrad => unspecified_tetrad(d),
        Protocol::MPlusN { .. } => {
            return Err(DiscriminationError::invalid(format!(
                "{protocol} has no analytic psychometric function; simulate it first"
            )))
        }
    };

    if !pc.is_finite() {
        return Err(DiscriminationError::invalid(format!(
            "psychometric function of {protocol} is not finite at d = {d}"
        )));
    }
    Ok(pc.clamp(0.0, 1.0))
}

/// Φ(d/√2)
pub fn two_afc(d: f64) -> f64 {
    norm_cdf(d / 2f64.sqrt())
}

/// 1 − Φ(d/√2) − Φ(d/√6) + 2Φ(d/√2)Φ(d/√6)
pub fn duo_trio(d: f64) -> f64 {
    let a = norm_cdf(d / 2f64.sqrt());
    let b = norm_cdf(d / 6f64.sqrt());
    1.0 - a - b + 2.0 * a * b
}

/// Φ(d/2)² + Φ(−d/2)²
pub fn dual_pair(d: f64) -> f64 {
    norm_cdf(d / 2.0).powi(2) + norm_cdf(-d / 2.0).powi(2)
}

/// ∫₀^∞ 2[Φ(−z√3 + √(2/3)·d) + Φ(−z√3 − √(2/3)·d)]·φ(z) dz
pub fn triangle(d: f64) -> f64 {
    let sqrt3 = 3f64.sqrt();
    let shift = (2.0 / 3.0f64).sqrt() * d;
    TRIANGLE_QUADRATURE.integrate(|z| {
        2.0 * (norm_cdf(-z * sqrt3 + shift) + norm_cdf(-z * sqrt3 - shift)) * norm_pdf(z)
    })
}

/// ∫ Φ(z)²·φ(z − d) dz
pub fn three_afc(d: f64) -> f64 {
    NORMAL_QUADRATURE.integrate(|z| norm_cdf(z).powi(2) * norm_pdf(z - d))
}

/// ∫ Φ(z)³·φ(z − d) dz
pub fn four_afc(d: f64) -> f64 {
    NORMAL_QUADRATURE.integrate(|z| norm_cdf(z).powi(3) * norm_pdf(z - d))
}

/// ∫ Φ(z)^(m−1)·φ(z − d) dz
pub fn multiple_afc(m: u32, d: f64) -> f64 {
    let exponent = i32::try_from(m.saturating_sub(1)).unwrap_or(i32::MAX);
    NORMAL_QUADRATURE.integrate(|z| norm_cdf(z).powi(exponent) * norm_pdf(z - d))
}

/// 1 − ∫ 2φ(z)Φ(z)[2Φ(z − d) − Φ(z − d)²] dz
pub fn specified_tetrad(d: f64) -> f64 {
    let area = NORMAL_QUADRATURE.integrate(|z| {
        let shifted = norm_cdf(z - d);
        2.0 * norm_pdf(z) * norm_cdf(z) * (2.0 * shifted - shifted * shifted)
    });
    1.0 - area
}

/// 1 − ∫ 2φ(z)[2Φ(z)Φ(z − d) − Φ(z − d)²] dz
pub fn unspecified_tetrad(d: f64) -> f64 {
    let area = NORMAL_QUADRATURE.integrate(|z| {
        let shifted = norm_cdf(z - d);
        2.0 * norm_pdf(z) * (2.0 * norm_cdf(z) * shifted - shifted * shifted)
    });
    1.0 - area
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deterministic_protocols() -> Vec<Protocol> {
        vec![
            Protocol::Triangle,
            Protocol::TwoAfc,
            Protocol::ThreeAfc,
            Protocol::FourAfc,
            Protocol::MultipleAfc { m: 6 },
            Protocol::SpecifiedTetrad,
            Protocol::UnspecifiedTetrad,
            Protocol::DualPair,
            Protocol::DuoTrio,
        ]
    }

    #[test]
    fn test_chance_performance_at_zero() {
        for protocol in deterministic_protocols() {
            let pc = evaluate(&protocol, 0.0).unwrap();
            assert!(
                (pc - protocol.guessing_rate()).abs() < 1e-4,
                "{protocol}: psi(0) = {pc}, expected {}",
                protocol.guessing_rate()
            );
        }
    }

    #[test]
    fn test_non_finite_input_rejected() {
        for protocol in deterministic_protocols() {
            assert!(
                matches!(
                    evaluate(&protocol, f64::NAN),
                    Err(DiscriminationError::InvalidParameter(_))
                ),
                "{protocol}"
            );
        }
    }

    #[test]
    fn test_multiple_afc_huge_m_stays_finite() {
        let pc = multiple_afc(u32::MAX, 1.0);
        assert!(pc.is_finite() && (0.0..=1.0).contains(&pc), "pc = {pc}");
    }

    #[test]
    fn test_monotone_on_zero_to_eight() {
        for protocol in deterministic_protocols() {
            let mut previous = evaluate(&protocol, 0.0).unwrap();
            for step in 1..=32 {
                let d = step as f64 * 0.25;
                let pc = evaluate(&protocol, d).unwrap();
                assert!(
                    pc >= previous - 1e-12,
                    "{protocol}: psi({d}) = {pc} < {previous}"
                );
                previous = pc;
            }
            assert!(previous > 0.95, "{protocol}: psi(8) = {previous}");
        }
    }

    #[test]
    fn test_multiple_afc_generalises_three_and_four() {
        for d in [0.0, 0.5, 1.3, 2.7, 4.0] {
            assert!((multiple_afc(3, d) - three_afc(d)).abs() < 1e-10);
            assert!((multiple_afc(4, d) - four_afc(d)).abs() < 1e-10);
        }
    }

    #[test]
    fn test_multiple_afc_two_matches_two_afc() {
        for d in [0.3, 1.0, 2.2] {
            assert!((multiple_afc(2, d) - two_afc(d)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_published_reference_values() {
        // Ennis (1993) tables: d' = 1 gives pc ≈ 0.7602 (2-AFC), 0.4180 (triangle)
        assert!((two_afc(1.0) - 0.760_249).abs() < 1e-5);
        assert!((triangle(1.0) - 0.4180).abs() < 1e-3);
        assert!((three_afc(1.0) - 0.6337).abs() < 1e-3);
    }

    #[test]
    fn test_m_plus_n_needs_simulation() {
        let protocol = Protocol::MPlusN {
            m: 2,
            n: 2,
            specified: false,
        };
        assert!(matches!(
            evaluate(&protocol, 1.0),
            Err(DiscriminationError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_invalid_multiple_afc_rejected() {
        assert!(evaluate(&Protocol::MultipleAfc { m: 1 }, 1.0).is_err());
    }
}
