//! Seeded train/test partitioning of row indices.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SplitError {
    #[error("test_size must be between 0 and 1, got {0}")]
    InvalidTestSize(f64),

    #[error("split would leave an empty side (n_train={n_train}, n_test={n_test})")]
    EmptySide { n_train: usize, n_test: usize },
}

/// Row indices assigned to each side of a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl Split {
    /// Gathers `(train, test)` copies of `values` in split order.
    pub fn select<T: Clone>(&self, values: &[T]) -> (Vec<T>, Vec<T>) {
        let gather =
            |indices: &[usize]| -> Vec<T> { indices.iter().map(|&i| values[i].clone()).collect() };
        (gather(&self.train), gather(&self.test))
    }
}

/// Shuffles `0..n_rows` with a seeded RNG and puts the first
/// `n_rows - round(n_rows * test_size)` indices on the training side.
pub fn train_test_split(n_rows: usize, test_size: f64, seed: u64) -> Result<Split, SplitError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(SplitError::InvalidTestSize(test_size));
    }

    let n_test = (n_rows as f64 * test_size).round() as usize;
    let n_train = n_rows - n_test;
    if n_test == 0 || n_train == 0 {
        return Err(SplitError::EmptySide { n_train, n_test });
    }

    let mut indices: Vec<usize> = (0..n_rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test = indices.split_off(n_train);
    Ok(Split {
        train: indices,
        test,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_every_row_once() {
        let split = train_test_split(10, 0.2, 42).unwrap();
        assert_eq!(split.train.len(), 8);
        assert_eq!(split.test.len(), 2);

        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn same_seed_same_split() {
        assert_eq!(
            train_test_split(50, 0.3, 7).unwrap(),
            train_test_split(50, 0.3, 7).unwrap()
        );
    }

    #[test]
    fn rejects_out_of_range_test_size() {
        for test_size in [0.0, 1.0, -0.1, f64::NAN] {
            assert!(matches!(
                train_test_split(10, test_size, 0),
                Err(SplitError::InvalidTestSize(_))
            ));
        }
    }

    #[test]
    fn rejects_empty_side() {
        assert_eq!(
            train_test_split(2, 0.1, 0),
            Err(SplitError::EmptySide { n_train: 2, n_test: 0 })
        );
        assert_eq!(
            train_test_split(0, 0.5, 0),
            Err(SplitError::EmptySide { n_train: 0, n_test: 0 })
        );
    }

    #[test]
    fn select_follows_indices() {
        let split = Split {
            train: vec![2, 0],
            test: vec![1],
        };
        let (train, test) = split.select(&["a", "b", "c"]);
        assert_eq!(train, vec!["c", "a"]);
        assert_eq!(test, vec!["b"]);
    }
}
