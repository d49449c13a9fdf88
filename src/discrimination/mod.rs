// Thurstonian discrimination tests
//
// Given x correct responses out of n trials on a bound discrimination method,
// estimate pc, the share of discriminators pd and the sensory distance d',
// each with an exact Clopper-Pearson interval, and run one-tailed binomial
// tests in either direction:
//
// - difference:  H0 pd <= pd0, H1 pd > pd0
// - equivalence: H0 pd >= pd0, H1 pd < pd0
//
// References:
// Ennis, D. M. (1993). The power of sensory discrimination methods.
//     Journal of Sensory Studies 8, 353-370.
// Brockhoff, P. B., & Christensen, R. H. B. (2010). Thurstonian models for
//     sensory discrimination tests as generalized linear models. Food Quality
//     and Preference 21, 330-338.

mod config;
mod engine;
mod results;
mod statistics;

pub use config::TestConfig;
pub use engine::DiscriminationTest;
pub use results::TestResults;
pub use statistics::{clopper_pearson, critical_value, p_value, power, Statistic, TestKind};

#[cfg(test)]
mod tests;
