//! Two-column numeric tables such as time/velocity recordings.

use crate::error::{DiffError, Result};
use crate::quadrature::{cumulative_trapezoid, trapezoid_samples};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Paired samples `(time[i], value[i])` read from a whitespace separated table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabulatedSeries {
    pub time: Vec<f64>,
    pub value: Vec<f64>,
}

/// Total and running integral of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesIntegral {
    pub total: f64,
    pub cumulative: Vec<f64>,
}

impl TabulatedSeries {
    pub fn new(time: Vec<f64>, value: Vec<f64>) -> Result<Self> {
        if time.len() != value.len() {
            return Err(DiffError::LengthMismatch {
                left: value.len(),
                right: time.len(),
            });
        }
        if time.len() < 2 {
            return Err(DiffError::InsufficientSamples {
                len: time.len(),
                min: 2,
            });
        }
        Ok(Self { time, value })
    }

    /// Parses rows of at least two numbers separated by whitespace or commas.
    /// Blank lines and lines starting with `#` are skipped; columns past the
    /// second are ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let mut time = Vec::new();
        let mut value = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|field| !field.is_empty());
            let (t, v) = match (fields.next(), fields.next()) {
                (Some(t), Some(v)) => (t, v),
                _ => {
                    return Err(DiffError::Parse(format!(
                        "line {}: expected two columns",
                        index + 1
                    )))
                }
            };
            time.push(parse_field(t, index + 1)?);
            value.push(parse_field(v, index + 1)?);
        }

        Self::new(time, value)
    }

    /// Reads and parses a table from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read data file {}", path.display()))?;
        let series = Self::parse(&raw)
            .with_context(|| format!("Failed to parse data file {}", path.display()))?;
        tracing::debug!(path = %path.display(), rows = series.len(), "loaded tabulated series");
        Ok(series)
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Trapezoidal integral over the whole series (distance for velocity data).
    pub fn total(&self) -> Result<f64> {
        trapezoid_samples(&self.value, &self.time)
    }

    pub fn integrate(&self) -> Result<SeriesIntegral> {
        let cumulative = cumulative_trapezoid(&self.value, &self.time)?;
        let total = self.total()?;
        Ok(SeriesIntegral { total, cumulative })
    }
}

fn parse_field(field: &str, line: usize) -> Result<f64> {
    field
        .parse::<f64>()
        .map_err(|_| DiffError::Parse(format!("line {line}: invalid number '{field}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VELOCITIES: &str = "\
# time velocity
0.0 0.0
1.0 2.0

2.0\t4.0
3.0 4.0 extra
";

    #[test]
    fn parse_skips_comments_and_blank_lines() {
        let series = TabulatedSeries::parse(VELOCITIES).expect("series");
        assert_eq!(series.len(), 4);
        assert_eq!(series.time, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(series.value, vec![0.0, 2.0, 4.0, 4.0]);
    }

    #[test]
    fn parse_accepts_comma_separated_rows() {
        let series = TabulatedSeries::parse("0, 1\n1, 3\n").expect("series");
        assert_eq!(series.value, vec![1.0, 3.0]);
    }

    #[test]
    fn parse_reports_line_of_malformed_row() {
        let err = TabulatedSeries::parse("0 1\n1\n").expect_err("short row");
        assert_eq!(err, DiffError::Parse("line 2: expected two columns".to_string()));

        let err = TabulatedSeries::parse("0 1\n1 x\n").expect_err("bad number");
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn integrate_gives_distance() {
        let series = TabulatedSeries::parse(VELOCITIES).unwrap();
        let integral = series.integrate().expect("integral");
        assert_eq!(integral.cumulative, vec![0.0, 1.0, 4.0, 8.0]);
        assert_eq!(integral.total, 8.0);
    }

    #[test]
    fn single_row_is_rejected() {
        let err = TabulatedSeries::parse("0 1\n").expect_err("one row");
        assert!(matches!(err, DiffError::InsufficientSamples { len: 1, .. }));
    }

    #[test]
    fn from_path_reports_missing_file() {
        let err = TabulatedSeries::from_path("definitely/not/here/Velocities.txt")
            .expect_err("missing file");
        assert!(format!("{err}").contains("Failed to read data file"));
    }

    #[test]
    fn from_path_reads_table() {
        let path = std::env::temp_dir().join(format!("numdiff_series_{}.txt", std::process::id()));
        fs::write(&path, VELOCITIES).unwrap();
        let series = TabulatedSeries::from_path(&path).expect("series from disk");
        fs::remove_file(&path).unwrap();
        assert_eq!(series.len(), 4);
    }
}
