//! Sample aggregation.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    #[error("Cannot average an empty sample set")]
    EmptyInput,

    #[error("Row {row} has {found} columns, expected {expected}")]
    DimensionMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },
}

pub type Result<T> = std::result::Result<T, StatsError>;

/// Arithmetic mean, truncated toward zero
pub fn mean(values: &[u64]) -> Result<u64> {
    if values.is_empty() {
        return Err(StatsError::EmptyInput);
    }
    let sum: u128 = values.iter().map(|&v| v as u128).sum();
    Ok((sum / values.len() as u128) as u64)
}

/// Per-column means of a `[trial][position]` matrix.
///
/// All rows must have the length of the first one.
pub fn column_means<R: AsRef<[u64]>>(matrix: &[R]) -> Result<Vec<u64>> {
    let first = matrix.first().ok_or(StatsError::EmptyInput)?;
    let width = first.as_ref().len();

    for (row, values) in matrix.iter().enumerate() {
        let found = values.as_ref().len();
        if found != width {
            return Err(StatsError::DimensionMismatch {
                row,
                expected: width,
                found,
            });
        }
    }

    (0..width)
        .map(|col| {
            let column: Vec<u64> = matrix.iter().map(|r| r.as_ref()[col]).collect();
            mean(&column)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[10, 20, 30]), Ok(20));
        assert_eq!(mean(&[1, 2]), Ok(1));
        assert_eq!(mean(&[]), Err(StatsError::EmptyInput));
    }

    #[test]
    fn test_mean_does_not_overflow() {
        assert_eq!(mean(&[u64::MAX, u64::MAX]), Ok(u64::MAX));
    }

    #[test]
    fn test_column_means() {
        let matrix = vec![vec![1, 2, 3], vec![3, 4, 5]];
        assert_eq!(column_means(&matrix), Ok(vec![2, 3, 4]));
    }

    #[test]
    fn test_column_means_mismatch() {
        let matrix = vec![vec![1, 2, 3], vec![3, 4]];
        assert_eq!(
            column_means(&matrix),
            Err(StatsError::DimensionMismatch {
                row: 1,
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn test_column_means_empty() {
        let matrix: Vec<Vec<u64>> = Vec::new();
        assert_eq!(column_means(&matrix), Err(StatsError::EmptyInput));
    }
}
