//! Reference tables for sensory analysts
//!
//! - [`pc_table`]: probability correct over a grid of d' for several protocols
//! - [`dprime_table`]: d' and its variance factor B over a grid of pc, laid out
//!   by decile like the printed tables in the sensory literature
//!
//! Both render to CSV through [`crate::csv_output::CsvTable`].

use crate::csv_output::{format_number, CsvTable};
use crate::error::{DiscriminationError, Result};
use crate::method::DiscriminationMethod;

/// Hundredths shown per decile row of a d' table
const CELLS_PER_DECILE: u32 = 10;

/// Probability correct by d' for a set of protocols
#[derive(Debug, Clone, PartialEq)]
pub struct PcTable {
    names: Vec<String>,
    rows: Vec<(f64, Vec<Option<f64>>)>,
}

impl PcTable {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// `(d, pc per protocol)`; `None` where a simulated curve does not reach `d`
    pub fn rows(&self) -> &[(f64, Vec<Option<f64>>)] {
        &self.rows
    }

    pub fn to_csv(&self) -> String {
        let mut table = CsvTable::new(std::iter::once("d".to_string()).chain(self.names.clone()));
        for (d, values) in &self.rows {
            let mut row = vec![format!("{d:.2}")];
            row.extend(
                values
                    .iter()
                    .map(|pc| pc.map(format_number).unwrap_or_default()),
            );
            table.add_row(row);
        }
        table.to_csv()
    }
}

/// Tabulate pc on `0, d_step, 2·d_step, ... ≤ d_max`
pub fn pc_table(methods: &[DiscriminationMethod], d_max: f64, d_step: f64) -> Result<PcTable> {
    if !(d_step > 0.0 && d_step.is_finite()) {
        return Err(DiscriminationError::invalid(format!(
            "d step must be positive, got {d_step}"
        )));
    }
    if !(d_max >= 0.0 && d_max.is_finite()) {
        return Err(DiscriminationError::invalid(format!(
            "d max must be non-negative, got {d_max}"
        )));
    }

    let count = (d_max / d_step + 1e-9).floor() as usize + 1;
    let mut rows = Vec::with_capacity(count);

    for i in 0..count {
        let d = i as f64 * d_step;
        let values = methods
            .iter()
            .map(|method| match method.psychometric(d) {
                Ok(pc) => Ok(Some(pc)),
                Err(DiscriminationError::DomainError { .. }) => Ok(None),
                Err(e) => Err(e),
            })
            .collect::<Result<Vec<_>>>()?;
        rows.push((d, values));
    }

    tracing::debug!(protocols = methods.len(), rows = rows.len(), "built pc table");

    Ok(PcTable {
        names: methods.iter().map(DiscriminationMethod::name).collect(),
        rows,
    })
}

/// One decile of a d' table: pc = decile + j/100 for j in 0..10
#[derive(Debug, Clone, PartialEq)]
pub struct DPrimeRow {
    pub decile: f64,
    pub d_prime: Vec<Option<f64>>,
    /// Variance factor with Var(d') ≈ B / n
    pub b: Vec<Option<f64>>,
}

/// d' and B values by probability correct for one protocol
#[derive(Debug, Clone, PartialEq)]
pub struct DPrimeTable {
    pub method: String,
    pub guessing: f64,
    pub rows: Vec<DPrimeRow>,
}

impl DPrimeTable {
    /// Look up the cell for `pc` given in hundredths
    pub fn cell(&self, hundredths: u32) -> Option<(f64, f64)> {
        let decile = f64::from(hundredths / CELLS_PER_DECILE) / 10.0;
        let j = (hundredths % CELLS_PER_DECILE) as usize;
        let row = self
            .rows
            .iter()
            .find(|row| (row.decile - decile).abs() < 1e-9)?;
        Some((row.d_prime[j]?, row.b[j]?))
    }

    pub fn to_csv(&self) -> String {
        let mut table = CsvTable::new(
            ["decile".to_string(), "value".to_string()]
                .into_iter()
                .chain((0..CELLS_PER_DECILE).map(|j| format!("{:.2}", f64::from(j) / 100.0))),
        );

        for row in &self.rows {
            for (label, values) in [("d'", &row.d_prime), ("B", &row.b)] {
                let mut cells = vec![format!("{:.1}", row.decile), label.to_string()];
                cells.extend(values.iter().map(|v| v.map(format_number).unwrap_or_default()));
                table.add_row(cells);
            }
        }
        table.to_csv()
    }
}

/// Solve d' and `B = pc(1 − pc)/psi'(d')²` for pc on the 0.01 grid
///
/// Starts at the decile containing the guessing rate and stops at 0.99.
/// Cells below the guessing rate, and cells a simulated curve never reaches,
/// are left empty.
pub fn dprime_table(method: &DiscriminationMethod) -> Result<DPrimeTable> {
    let guessing = method.guessing();
    let first_decile = (guessing * 10.0 + 1e-9).floor() as u32;
    let mut rows = Vec::new();

    for decile in first_decile..10 {
        let mut d_primes = Vec::with_capacity(CELLS_PER_DECILE as usize);
        let mut bs = Vec::with_capacity(CELLS_PER_DECILE as usize);

        for j in 0..CELLS_PER_DECILE {
            let pc = f64::from(decile * CELLS_PER_DECILE + j) / 100.0;
            if pc < guessing {
                d_primes.push(None);
                bs.push(None);
                continue;
            }

            let d_prime = match method.solve_d_prime(pc) {
                Ok(d) => d,
                Err(DiscriminationError::NoConvergence(reason)) => {
                    tracing::debug!(pc, %reason, "leaving d' table cell empty");
                    d_primes.push(None);
                    bs.push(None);
                    continue;
                }
                Err(e) => return Err(e),
            };
            let slope = method.derivative(d_prime)?;
            let b = pc * (1.0 - pc) / (slope * slope);

            d_primes.push(Some(d_prime));
            bs.push(b.is_finite().then_some(b));
        }

        rows.push(DPrimeRow {
            decile: f64::from(decile) / 10.0,
            d_prime: d_primes,
            b: bs,
        });
    }

    Ok(DPrimeTable {
        method: method.name(),
        guessing,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mplusn::MonteCarloConfig;
    use crate::protocol::Protocol;

    fn method(protocol: Protocol) -> DiscriminationMethod {
        DiscriminationMethod::new(protocol).unwrap()
    }

    #[test]
    fn test_pc_table_shape() {
        let methods = vec![method(Protocol::Triangle), method(Protocol::TwoAfc)];
        let table = pc_table(&methods, 2.0, 0.5).unwrap();

        assert_eq!(table.names(), ["triangle", "2-AFC"]);
        assert_eq!(table.rows().len(), 5);
        assert_eq!(table.rows()[4].0, 2.0);

        let (_, at_zero) = &table.rows()[0];
        assert!((at_zero[1].unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_pc_table_csv() {
        let methods = vec![method(Protocol::TwoAfc)];
        let csv = pc_table(&methods, 1.0, 1.0).unwrap().to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, ["d,2-AFC", "0.00,0.500000", "1.00,0.760250"]);
    }

    #[test]
    fn test_pc_table_leaves_simulated_gaps_empty() {
        let config = MonteCarloConfig {
            steps: 11,
            sample_size: 2_000,
            max_delta: 1.0,
            ..MonteCarloConfig::default()
        };
        let methods = vec![DiscriminationMethod::from_spec("mplusn:m=2,n=2", &config).unwrap()];
        let table = pc_table(&methods, 2.0, 1.0).unwrap();
        assert!(table.rows()[1].1[0].is_some());
        assert!(table.rows()[2].1[0].is_none());
        assert!(table.to_csv().ends_with("2.00,\n"));
    }

    #[test]
    fn test_pc_table_rejects_bad_grid() {
        assert!(pc_table(&[], 1.0, 0.0).is_err());
        assert!(pc_table(&[], -1.0, 0.1).is_err());
    }

    #[test]
    fn test_dprime_table_two_afc() {
        let table = dprime_table(&method(Protocol::TwoAfc)).unwrap();
        assert_eq!(table.rows.len(), 5);
        assert_eq!(table.rows[0].decile, 0.5);

        let (d, b) = table.cell(50).unwrap();
        assert_eq!(d, 0.0);
        // B at chance is 0.25 / (phi(0)/sqrt 2)^2 = pi
        assert!((b - std::f64::consts::PI).abs() < 1e-4, "B = {b}");

        let (d, _) = table.cell(76).unwrap();
        assert!((d - 0.9989).abs() < 1e-3, "d' = {d}");
    }

    #[test]
    fn test_dprime_table_skips_below_chance() {
        let table = dprime_table(&method(Protocol::Triangle)).unwrap();
        assert_eq!(table.rows[0].decile, 0.3);
        assert!(table.cell(33).is_none());
        let (d, b) = table.cell(34).unwrap();
        assert!(d > 0.0 && b > 0.0);
        assert!(table.cell(99).is_some());

        let csv = table.to_csv();
        assert!(csv.starts_with("decile,value,0.00,0.01"));
        assert!(csv.contains("\n0.3,d',,,,,"));
    }
}
