//! CSV output for tables and test results
//!
//! Plain comma-separated text for spreadsheet analysis and machine parsing.

use crate::discrimination::TestResults;

/// Generic CSV table: a header row and string cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn new<S: Into<String>>(header: impl IntoIterator<Item = S>) -> Self {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Add a row; it may be shorter than the header
    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    pub fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn format_row(row: &[String]) -> String {
        row.iter()
            .map(|field| Self::escape_field(field))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::new();

        output.push_str(&Self::format_row(&self.header));
        output.push('\n');

        for row in &self.rows {
            output.push_str(&Self::format_row(row));
            output.push('\n');
        }

        output
    }
}

/// Format a number for a CSV cell; non-finite values become empty cells
pub fn format_number(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.6}")
    } else {
        String::new()
    }
}

/// CSV rendering of test results, one row per test
#[derive(Debug, Default)]
pub struct CsvResultsOutput {
    results: Vec<(String, TestResults)>,
}

impl CsvResultsOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a result under a panel label
    pub fn add_result(&mut self, label: impl Into<String>, results: TestResults) {
        self.results.push((label.into(), results));
    }

    pub fn to_csv(&self) -> String {
        let mut table = CsvTable::new([
            "panel", "method", "kind", "correct", "trials", "pd0", "pg", "pc", "pc_lower",
            "pc_upper", "pd", "pd_lower", "pd_upper", "d_prime", "d_prime_err",
            "d_prime_lower", "d_prime_upper", "p_value", "alpha", "power",
        ]);

        for (label, r) in &self.results {
            let mut row = vec![
                label.clone(),
                r.method.clone(),
                r.kind.to_string(),
                r.correct.to_string(),
                r.trials.to_string(),
            ];
            row.extend(
                [
                    r.pd0,
                    r.pg,
                    r.pc.estimate,
                    r.pc.lower,
                    r.pc.upper,
                    r.pd.estimate,
                    r.pd.lower,
                    r.pd.upper,
                    r.d_prime.estimate,
                    r.d_prime.stderr,
                    r.d_prime.lower,
                    r.d_prime.upper,
                    r.p_value,
                    r.alpha,
                    r.power,
                ]
                .into_iter()
                .map(format_number),
            );
            table.add_row(row);
        }

        table.to_csv()
    }
}
