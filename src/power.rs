//! Power and minimum sample size for planned discrimination tests
//!
//! Uses the same binomial rejection regions as [`crate::discrimination`], so a
//! planned panel of the returned size gets exactly the reported power when it
//! is later analysed with [`crate::discrimination::DiscriminationTest`].

use crate::discrimination::{critical_value, power, TestKind};
use crate::error::{DiscriminationError, Result};
use crate::method::{pc_from_discriminators, DiscriminationMethod};
use serde::Serialize;
use std::fmt;

/// Largest panel the sample size search will consider
pub const SAMPLE_SIZE_CAP: u64 = 1000;

/// Power of a test with a fixed number of trials
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerPoint {
    pub trials: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_value: Option<u64>,
    pub power: f64,
}

/// Outcome of a minimum sample size search
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SampleSize {
    /// Smallest panel reaching the target power
    Found(PowerPoint),
    /// Target not reached by any panel up to `cap` trials
    ExceedsCap { cap: u64 },
}

impl SampleSize {
    pub fn trials(&self) -> Option<u64> {
        match self {
            SampleSize::Found(point) => Some(point.trials),
            SampleSize::ExceedsCap { .. } => None,
        }
    }
}

impl fmt::Display for SampleSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleSize::Found(point) => write!(f, "{}", point.trials),
            SampleSize::ExceedsCap { cap } => write!(f, ">{cap}"),
        }
    }
}

/// A planned test: protocol guessing rate, assumed true pc and test settings
///
/// # Example
/// ```
/// use thurstone::discrimination::TestKind;
/// use thurstone::power::PowerQuery;
///
/// let query = PowerQuery::new(1.0 / 3.0, 19.0 / 30.0, TestKind::Difference);
/// let point = query.power_at(30).unwrap();
/// assert!(point.power > 0.9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerQuery {
    pub guessing: f64,
    /// Probability correct assumed under the alternative
    pub pc: f64,
    pub alpha: f64,
    pub pd0: f64,
    pub kind: TestKind,
}

impl PowerQuery {
    /// Query at alpha = 0.05 and pd0 = 0
    pub fn new(guessing: f64, pc: f64, kind: TestKind) -> Self {
        Self {
            guessing,
            pc,
            alpha: 0.05,
            pd0: 0.0,
            kind,
        }
    }

    /// Query for `method` with the true sensory distance `d_prime`
    pub fn from_d_prime(method: &DiscriminationMethod, d_prime: f64, kind: TestKind) -> Result<Self> {
        Ok(Self::new(method.guessing(), method.psychometric(d_prime)?, kind))
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_pd0(mut self, pd0: f64) -> Self {
        self.pd0 = pd0;
        self
    }

    /// Probability correct under the null hypothesis
    pub fn pc0(&self) -> f64 {
        pc_from_discriminators(self.pd0, self.guessing)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.guessing > 0.0 && self.guessing < 1.0) {
            return Err(DiscriminationError::invalid(format!(
                "guessing rate must be in (0, 1), got {}",
                self.guessing
            )));
        }
        if !(0.0..=1.0).contains(&self.pc) {
            return Err(DiscriminationError::invalid(format!(
                "pc must be in [0, 1], got {}",
                self.pc
            )));
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(DiscriminationError::invalid(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )));
        }
        if !(0.0..1.0).contains(&self.pd0) {
            return Err(DiscriminationError::invalid(format!(
                "pd0 must be in [0, 1), got {}",
                self.pd0
            )));
        }
        Ok(())
    }

    /// Critical value and power with `trials` assessors
    pub fn power_at(&self, trials: u64) -> Result<PowerPoint> {
        self.validate()?;
        if trials == 0 {
            return Err(DiscriminationError::invalid("number of trials must be positive"));
        }

        let pc0 = self.pc0();
        Ok(PowerPoint {
            trials,
            critical_value: critical_value(self.kind, trials, pc0, self.alpha)?,
            power: power(self.kind, trials, pc0, self.pc, self.alpha)?,
        })
    }

    /// Smallest panel whose power reaches `target`, searching up to
    /// [`SAMPLE_SIZE_CAP`] trials
    pub fn min_sample_size(&self, target: f64) -> Result<SampleSize> {
        self.validate()?;
        if !(target > 0.0 && target <= 1.0) {
            return Err(DiscriminationError::invalid(format!(
                "target power must be in (0, 1], got {target}"
            )));
        }

        for trials in 1..=SAMPLE_SIZE_CAP {
            let point = self.power_at(trials)?;
            if point.power >= target {
                tracing::debug!(trials, power = point.power, "found minimum sample size");
                return Ok(SampleSize::Found(point));
            }
        }

        tracing::warn!(
            cap = SAMPLE_SIZE_CAP,
            target,
            pc = self.pc,
            pc0 = self.pc0(),
            "target power not reached within the sample size cap"
        );
        Ok(SampleSize::ExceedsCap {
            cap: SAMPLE_SIZE_CAP,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Protocol;

    #[test]
    fn test_power_at_matches_discrimination_test() {
        let query = PowerQuery::new(1.0 / 3.0, 19.0 / 30.0, TestKind::Difference);
        let point = query.power_at(30).unwrap();
        assert_eq!(point.critical_value, Some(15));
        assert!((point.power - 0.9538).abs() < 1e-3);
    }

    #[test]
    fn test_min_sample_size_reaches_target() {
        let query = PowerQuery::new(1.0 / 3.0, 19.0 / 30.0, TestKind::Difference);
        let size = query.min_sample_size(0.8).unwrap();
        let n = size.trials().unwrap();

        assert!(query.power_at(n).unwrap().power >= 0.8);
        // Reported n is the panel that achieves the power, not one past it
        match size {
            SampleSize::Found(point) => assert_eq!(point, query.power_at(n).unwrap()),
            SampleSize::ExceedsCap { .. } => unreachable!(),
        }
        assert!(n > 5 && n < 30, "n = {n}");
    }

    #[test]
    fn test_min_sample_size_is_minimal() {
        let query = PowerQuery::new(0.5, 0.7, TestKind::Difference);
        let n = query.min_sample_size(0.9).unwrap().trials().unwrap();
        for smaller in 1..n {
            assert!(query.power_at(smaller).unwrap().power < 0.9);
        }
    }

    #[test]
    fn test_equivalence_sample_size() {
        let query = PowerQuery::new(1.0 / 3.0, 6.0 / 30.0, TestKind::Equivalence).with_pd0(0.05);
        let size = query.min_sample_size(0.8).unwrap();
        let n = size.trials().unwrap();
        assert!(query.power_at(n).unwrap().power >= 0.8);
        assert!(query.power_at(n).unwrap().critical_value.is_some());
    }

    #[test]
    fn test_unreachable_target_reports_cap() {
        // True pc equals pc0: power never exceeds alpha
        let query = PowerQuery::new(0.5, 0.5, TestKind::Difference);
        let size = query.min_sample_size(0.8).unwrap();
        assert_eq!(size, SampleSize::ExceedsCap { cap: SAMPLE_SIZE_CAP });
        assert_eq!(size.to_string(), ">1000");
        assert_eq!(size.trials(), None);
    }

    #[test]
    fn test_from_d_prime() {
        let method = DiscriminationMethod::new(Protocol::TwoAfc).unwrap();
        let query = PowerQuery::from_d_prime(&method, 1.0, TestKind::Difference).unwrap();
        assert_eq!(query.guessing, 0.5);
        assert!((query.pc - 0.760_249).abs() < 1e-5);
    }

    #[test]
    fn test_invalid_queries() {
        let base = PowerQuery::new(1.0 / 3.0, 0.6, TestKind::Difference);
        assert!(base.power_at(0).is_err());
        assert!(base.with_alpha(0.0).power_at(10).is_err());
        assert!(base.with_pd0(1.0).power_at(10).is_err());
        assert!(base.min_sample_size(1.5).is_err());
        assert!(PowerQuery::new(1.0, 0.6, TestKind::Difference)
            .power_at(10)
            .is_err());
    }

    #[test]
    fn test_serialize_sample_size() {
        let json = serde_json::to_value(SampleSize::ExceedsCap { cap: 1000 }).unwrap();
        assert_eq!(json["status"], "exceeds_cap");
        assert_eq!(json["cap"], 1000);
    }
}
