//! Vectorized event signals over a bars × trades grid.
//!
//! Every matrix here has one row per bar and one column per series (usually
//! one trade). [`catch_first`] reduces any number of boolean event matrices
//! to the first bar of each column at which some event fires.

use crate::domain::error::TradeflowError;
use ndarray::{Array2, ArrayView2, Axis, Zip};

/// Row number broadcast across `n_cols` columns.
pub fn row_index(n_rows: usize, n_cols: usize) -> Array2<usize> {
    Array2::from_shape_fn((n_rows, n_cols), |(t, _)| t)
}

/// Level signal: column `j` is true only at row `rows[j]`.
///
/// A row outside `0..n_rows` leaves its column all false.
pub fn true_at(rows: &[usize], n_rows: usize) -> Array2<bool> {
    Array2::from_shape_fn((n_rows, rows.len()), |(t, j)| rows[j] == t)
}

/// True where `series - threshold` moves from `<= 0` to `> 0`.
///
/// Row 0 has no predecessor and is never signaled.
pub fn cross_up(series: ArrayView2<'_, f64>, thresholds: &[f64]) -> Array2<bool> {
    crossing(series, thresholds, |prev, curr| prev <= 0.0 && curr > 0.0)
}

/// True where `series - threshold` moves from `>= 0` to `< 0`.
pub fn cross_down(series: ArrayView2<'_, f64>, thresholds: &[f64]) -> Array2<bool> {
    crossing(series, thresholds, |prev, curr| prev >= 0.0 && curr < 0.0)
}

fn crossing<F>(series: ArrayView2<'_, f64>, thresholds: &[f64], crossed: F) -> Array2<bool>
where
    F: Fn(f64, f64) -> bool,
{
    let (n_rows, n_cols) = series.dim();
    Array2::from_shape_fn((n_rows, n_cols), |(t, j)| {
        if t == 0 {
            return false;
        }
        let th = thresholds[j];
        crossed(series[[t - 1, j]] - th, series[[t, j]] - th)
    })
}

/// First row of each column at which any of `signals` is true.
///
/// Rows are masked with `n_rows` where no signal fires and the column-wise
/// minimum is taken; a column whose minimum is still `n_rows` has no event.
pub fn catch_first(signals: &[ArrayView2<'_, bool>]) -> Result<Vec<Option<usize>>, TradeflowError> {
    let Some(first) = signals.first() else {
        return Ok(Vec::new());
    };
    let (n_rows, n_cols) = first.dim();
    if let Some(other) = signals.iter().find(|s| s.dim() != (n_rows, n_cols)) {
        return Err(TradeflowError::InvalidSignal {
            reason: format!(
                "shape {:?} does not match {:?}",
                other.dim(),
                (n_rows, n_cols)
            ),
        });
    }

    let mut any = Array2::from_elem((n_rows, n_cols), false);
    for signal in signals {
        Zip::from(&mut any).and(signal).for_each(|a, &s| *a |= s);
    }

    let mut masked = row_index(n_rows, n_cols);
    Zip::from(&mut masked)
        .and(&any)
        .for_each(|m, &hit| {
            if !hit {
                *m = n_rows;
            }
        });

    Ok(masked
        .fold_axis(Axis(0), n_rows, |&acc, &m| acc.min(m))
        .iter()
        .map(|&first| (first < n_rows).then_some(first))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn row_index_broadcasts() {
        assert_eq!(row_index(3, 2), array![[0, 0], [1, 1], [2, 2]]);
    }

    #[test]
    fn true_at_marks_one_row_per_column() {
        let signal = true_at(&[1, 0, 5], 3);
        assert_eq!(
            signal,
            array![
                [false, true, false],
                [true, false, false],
                [false, false, false]
            ]
        );
    }

    #[test]
    fn cross_up_without_threshold() {
        let x = array![[1.0, -1.0], [0.0, 1.0], [1.0, 2.0]];
        let signal = cross_up(x.view(), &[0.0, 0.0]);
        assert_eq!(
            signal,
            array![[false, false], [false, true], [true, false]]
        );
    }

    #[test]
    fn cross_up_with_threshold() {
        let x = array![[1.0, -1.0], [0.0, 1.0], [1.0, 2.0]];
        let signal = cross_up(x.view(), &[0.0, 1.0]);
        assert_eq!(
            signal,
            array![[false, false], [false, false], [true, true]]
        );
    }

    #[test]
    fn cross_up_never_at_row_zero() {
        let x = array![[5.0], [6.0]];
        let signal = cross_up(x.view(), &[0.0]);
        assert_eq!(signal, array![[false], [false]]);
    }

    #[test]
    fn cross_down_requires_strict_drop() {
        let x = array![[0.0], [0.0], [-1.0], [-2.0]];
        let signal = cross_down(x.view(), &[0.0]);
        assert_eq!(signal, array![[false], [false], [true], [false]]);
    }

    #[test]
    fn touching_threshold_is_not_a_cross() {
        let x = array![[0.0], [1.0], [1.0], [1.5]];
        let signal = cross_up(x.view(), &[1.0]);
        assert_eq!(signal, array![[false], [false], [false], [true]]);
    }

    #[test]
    fn catch_first_single_matrix() {
        let x = array![
            [true, false, false],
            [false, true, false],
            [true, false, false]
        ];
        let first = catch_first(&[x.view()]).unwrap();
        assert_eq!(first, vec![Some(0), Some(1), None]);
    }

    #[test]
    fn catch_first_takes_earliest_across_matrices() {
        let a = array![[false, false], [false, false], [true, true]];
        let b = array![[false, false], [true, false], [false, false]];
        let first = catch_first(&[a.view(), b.view()]).unwrap();
        assert_eq!(first, vec![Some(1), Some(2)]);
    }

    #[test]
    fn catch_first_rejects_shape_mismatch() {
        let a = Array2::from_elem((2, 2), false);
        let b = Array2::from_elem((3, 2), false);
        assert!(matches!(
            catch_first(&[a.view(), b.view()]),
            Err(TradeflowError::InvalidSignal { .. })
        ));
    }

    #[test]
    fn catch_first_no_signals() {
        assert!(catch_first(&[]).unwrap().is_empty());
    }
}
