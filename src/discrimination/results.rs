// Result record of one discrimination test and its human-readable report

use crate::discrimination::statistics::{Statistic, TestKind};
use serde::{Deserialize, Serialize};

/// Complete outcome of a difference or equivalence test
///
/// Created fresh by every test invocation; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResults {
    /// Display name of the protocol, e.g. `triangle` or `4+3(U)`
    pub method: String,

    pub kind: TestKind,

    /// Correct responses x
    pub correct: u64,

    /// Trials n
    pub trials: u64,

    /// Null-hypothesis share of discriminators
    pub pd0: f64,

    /// Guessing rate of the protocol
    pub pg: f64,

    /// Probability correct under the null hypothesis
    pub pc0: f64,

    pub pc: Statistic,
    pub pd: Statistic,
    pub d_prime: Statistic,

    pub p_value: f64,
    pub alpha: f64,

    /// Boundary of the rejection region, absent when `trials` is too small to
    /// ever reject
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_value: Option<u64>,

    /// Power of the test at the observed pc
    pub power: f64,
}

impl TestResults {
    /// Whether H0 is rejected at `alpha`
    pub fn is_significant(&self) -> bool {
        self.p_value < self.alpha
    }

    /// The alternative hypothesis in plain words
    pub fn alternative(&self) -> String {
        match self.kind {
            TestKind::Difference => format!("pd > {}", self.pd0),
            TestKind::Equivalence => format!("pd < {}", self.pd0),
        }
    }

    /// Format as a human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();

        let title = match self.kind {
            TestKind::Difference => "DIFFERENCE TEST",
            TestKind::Equivalence => "EQUIVALENCE TEST",
        };
        report.push_str(&format!("🔬 {} ({})\n\n", title, self.method));
        report.push_str(&format!(
            "Correct responses: {} of {}\n",
            self.correct, self.trials
        ));
        report.push_str(&format!("Guessing rate: {:.4}\n", self.pg));
        report.push_str(&format!(
            "H1: {} (pc0 = {:.4})\n",
            self.alternative(),
            self.pc0
        ));

        report.push_str("\n📊 Estimates:\n");
        report.push_str(&format!(
            "  {:<8} {:>10} {:>10} {:>10} {:>10}\n",
            "", "estimate", "std.err", "lower", "upper"
        ));
        for (name, stat) in [("pc", &self.pc), ("pd", &self.pd), ("d'", &self.d_prime)] {
            report.push_str(&format!(
                "  {:<8} {:>10.4} {:>10.4} {:>10.4} {:>10.4}\n",
                name, stat.estimate, stat.stderr, stat.lower, stat.upper
            ));
        }

        report.push_str(&format!(
            "\nConfidence level: {}%\n",
            ((1.0 - self.alpha) * 100.0).round()
        ));
        report.push_str(&format!("p-value: {:.4}\n", self.p_value));
        match self.critical_value {
            Some(c) => report.push_str(&format!("Critical value: {}\n", c)),
            None => report.push_str("Critical value: none (too few trials to reject)\n"),
        }
        report.push_str(&format!("Power: {:.4}\n\n", self.power));

        if self.is_significant() {
            report.push_str(&format!("✅ SIGNIFICANT at alpha = {:.2}\n", self.alpha));
        } else {
            report.push_str(&format!(
                "❌ NOT SIGNIFICANT at alpha = {:.2}\n",
                self.alpha
            ));
        }

        report
    }
}
