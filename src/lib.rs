//! Thurstone - Thurstonian statistics for sensory discrimination tests
//!
//! This library maps the outcome of a forced-choice sensory panel (x correct
//! out of n trials) to the underlying sensory distance d', with exact
//! binomial difference and equivalence tests, confidence intervals and power.
//!
//! ```
//! use thurstone::discrimination::DiscriminationTest;
//! use thurstone::method::DiscriminationMethod;
//! use thurstone::protocol::Protocol;
//!
//! let triangle = DiscriminationMethod::new(Protocol::Triangle).unwrap();
//! let results = DiscriminationTest::new(&triangle)
//!     .difference(19, 30, 0.0, 0.95)
//!     .unwrap();
//! println!("{}", results.to_report_string());
//! ```

pub mod cli;
pub mod config;
pub mod csv_output;
pub mod discrimination;
pub mod error;
pub mod json_output;
pub mod method;
pub mod mplusn;
pub mod numerics;
pub mod power;
pub mod protocol;
pub mod psychometric;
pub mod table;

pub use discrimination::{DiscriminationTest, Statistic, TestConfig, TestKind, TestResults};
pub use error::{DiscriminationError, Result};
pub use method::DiscriminationMethod;
pub use mplusn::MonteCarloConfig;
pub use protocol::{Protocol, ProtocolParams};
