//! Benchmark samples and the `[trial][position]` matrix.

use serde::{Deserialize, Serialize};

use crate::stats::{self, column_means, mean};

/// One measured ledger operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkSample {
    /// Wall time from submit to receipt, microseconds
    pub latency_us: u64,
    /// Metered cost units
    pub cost: u64,
}

impl BenchmarkSample {
    pub fn new(latency_us: u64, cost: u64) -> Self {
        Self { latency_us, cost }
    }
}

/// Mean latency and cost of a sample set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Average {
    pub time: u64,
    pub cost: u64,
}

impl Average {
    pub fn of<'a>(samples: impl IntoIterator<Item = &'a BenchmarkSample>) -> stats::Result<Self> {
        let (times, costs): (Vec<u64>, Vec<u64>) =
            samples.into_iter().map(|s| (s.latency_us, s.cost)).unzip();
        Ok(Self {
            time: mean(&times)?,
            cost: mean(&costs)?,
        })
    }
}

/// Per-position means across trials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnAnalysis {
    pub time: Vec<u64>,
    pub cost: Vec<u64>,
}

/// Borrowed first / last / interior slices of each trial row.
///
/// Built from indices only; the matrix is never modified.
#[derive(Debug, Clone, Default)]
pub struct PositionViews<'a> {
    pub first: Vec<&'a BenchmarkSample>,
    pub last: Vec<&'a BenchmarkSample>,
    pub interior: Vec<&'a BenchmarkSample>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BenchmarkMatrix {
    rows: Vec<Vec<BenchmarkSample>>,
}

impl BenchmarkMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_row(&mut self, row: Vec<BenchmarkSample>) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[Vec<BenchmarkSample>] {
        &self.rows
    }

    /// Number of trials
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Total number of samples over all trials
    pub fn sample_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn samples(&self) -> impl Iterator<Item = &BenchmarkSample> {
        self.rows.iter().flatten()
    }

    pub fn latencies(&self) -> Vec<Vec<u64>> {
        self.rows
            .iter()
            .map(|r| r.iter().map(|s| s.latency_us).collect())
            .collect()
    }

    pub fn costs(&self) -> Vec<Vec<u64>> {
        self.rows
            .iter()
            .map(|r| r.iter().map(|s| s.cost).collect())
            .collect()
    }

    pub fn column_analysis(&self) -> stats::Result<ColumnAnalysis> {
        Ok(ColumnAnalysis {
            time: column_means(&self.latencies())?,
            cost: column_means(&self.costs())?,
        })
    }

    pub fn views(&self) -> PositionViews<'_> {
        let mut views = PositionViews::default();
        for row in &self.rows {
            if let Some(first) = row.first() {
                views.first.push(first);
            }
            if row.len() > 1 {
                views.last.push(&row[row.len() - 1]);
                views.interior.extend(row[1..row.len() - 1].iter());
            }
        }
        views
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatsError;

    fn row(values: &[u64]) -> Vec<BenchmarkSample> {
        values.iter().map(|&v| BenchmarkSample::new(v, v * 10)).collect()
    }

    #[test]
    fn test_views_leave_matrix_intact() {
        let mut matrix = BenchmarkMatrix::new();
        matrix.push_row(row(&[1, 2, 3, 4]));
        matrix.push_row(row(&[5, 6, 7, 8]));
        let before = matrix.clone();

        let views = matrix.views();
        let first: Vec<u64> = views.first.iter().map(|s| s.latency_us).collect();
        let last: Vec<u64> = views.last.iter().map(|s| s.latency_us).collect();
        let interior: Vec<u64> = views.interior.iter().map(|s| s.latency_us).collect();

        assert_eq!(first, vec![1, 5]);
        assert_eq!(last, vec![4, 8]);
        assert_eq!(interior, vec![2, 3, 6, 7]);

        // a second pass sees the same data
        assert_eq!(matrix.views().first.len(), 2);
        assert_eq!(matrix, before);
    }

    #[test]
    fn test_two_column_rows_have_no_interior() {
        let mut matrix = BenchmarkMatrix::new();
        matrix.push_row(row(&[1, 2]));
        let views = matrix.views();
        assert_eq!(views.first.len(), 1);
        assert_eq!(views.last.len(), 1);
        assert!(views.interior.is_empty());
    }

    #[test]
    fn test_column_analysis() {
        let mut matrix = BenchmarkMatrix::new();
        matrix.push_row(row(&[1, 2, 3]));
        matrix.push_row(row(&[3, 4, 5]));
        let analysis = matrix.column_analysis().unwrap();
        assert_eq!(analysis.time, vec![2, 3, 4]);
        assert_eq!(analysis.cost, vec![20, 30, 40]);
        assert_eq!(matrix.sample_count(), 6);
    }

    #[test]
    fn test_ragged_matrix_fails_analysis() {
        let mut matrix = BenchmarkMatrix::new();
        matrix.push_row(row(&[1, 2, 3]));
        matrix.push_row(row(&[1, 2]));
        assert!(matches!(
            matrix.column_analysis(),
            Err(StatsError::DimensionMismatch { row: 1, .. })
        ));
    }

    #[test]
    fn test_average_of_nothing() {
        assert_eq!(Average::of(&[]), Err(StatsError::EmptyInput));
        let samples = row(&[10, 20, 30]);
        assert_eq!(
            Average::of(&samples),
            Ok(Average {
                time: 20,
                cost: 200
            })
        );
    }
}
