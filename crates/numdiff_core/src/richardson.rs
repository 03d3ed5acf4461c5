//! Richardson extrapolation over central differences.
//!
//! Row `i` of the table holds the raw central difference at step `h / 2^i`
//! followed by `i` extrapolated values. Because the central-difference error
//! expansion only contains even powers of `h`, column `m` removes the
//! `h^(2m)` term with the divisor `4^m - 1`.

use crate::error::{DiffError, Result};
use crate::stencil::{
    cancellation_threshold, central_difference_unchecked, validate_point, validate_step,
};
use crate::traits::{to_f64, Scalar, ScalarFunction};
use serde::Serialize;

/// Triangular Richardson table `D[i][m]`, `0 <= m <= i <= max_order`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RichardsonTable<T> {
    base_step: T,
    rows: Vec<Vec<T>>,
    cancellation_onset: Option<usize>,
}

impl<T: Scalar> RichardsonTable<T> {
    /// Builds the full table at `x` from base step `h`.
    ///
    /// `f` is evaluated twice per row. Rows are filled in order since row `i`
    /// reads row `i - 1`. Any failing evaluation aborts the build; no partial
    /// table is returned.
    ///
    /// Orders past roughly 10 are dominated by rounding. This is not
    /// enforced; the order at which the step first drops below
    /// [`cancellation_threshold`] is recorded in
    /// [`cancellation_onset`](Self::cancellation_onset), and a build fails
    /// with [`DiffError::StepUnderflow`] once the step no longer moves `x`
    /// or stops being a normal float.
    pub fn build<F>(f: &F, x: T, h: T, max_order: usize) -> Result<Self>
    where
        F: ScalarFunction<T> + ?Sized,
    {
        validate_step(h)?;
        validate_point(x)?;

        let two = T::one() + T::one();
        let four = two * two;
        let threshold = cancellation_threshold(x);

        // Reservation is bounded; huge orders stop at StepUnderflow.
        let mut rows: Vec<Vec<T>> = Vec::with_capacity(max_order.min(64) + 1);
        let mut cancellation_onset = None;
        let mut step = h;

        for i in 0..=max_order {
            if cancellation_onset.is_none() && step < threshold {
                cancellation_onset = Some(i);
                tracing::warn!(
                    order = i,
                    step = to_f64(step),
                    x = to_f64(x),
                    "step entered the cancellation regime; higher orders may lose accuracy"
                );
            }

            let mut row = Vec::with_capacity(i + 1);
            row.push(central_difference_unchecked(f, x, step, i)?);

            let mut power = T::one();
            for m in 1..=i {
                power = power * four;
                let current = row[m - 1];
                let previous = rows[i - 1][m - 1];
                row.push(current + (current - previous) / (power - T::one()));
            }

            rows.push(row);
            step = step / two;
        }

        tracing::debug!(
            x = to_f64(x),
            base_step = to_f64(h),
            max_order,
            "built Richardson table"
        );

        Ok(Self {
            base_step: h,
            rows,
            cancellation_onset,
        })
    }

    pub fn max_order(&self) -> usize {
        self.rows.len() - 1
    }

    pub fn base_step(&self) -> T {
        self.base_step
    }

    /// Step used for the raw estimate of row `i`, `h / 2^i`.
    pub fn step(&self, i: usize) -> Option<T> {
        if i >= self.rows.len() {
            return None;
        }
        let two = T::one() + T::one();
        Some((0..i).fold(self.base_step, |h, _| h / two))
    }

    pub fn row(&self, i: usize) -> Option<&[T]> {
        self.rows.get(i).map(Vec::as_slice)
    }

    pub fn entry(&self, i: usize, m: usize) -> Option<T> {
        self.rows.get(i).and_then(|row| row.get(m)).copied()
    }

    pub fn rows(&self) -> &[Vec<T>] {
        &self.rows
    }

    /// Best estimate at every order: `D[m][m]` for `m = 0..=max_order`.
    pub fn diagonal(&self) -> Vec<T> {
        self.rows.iter().enumerate().map(|(m, row)| row[m]).collect()
    }

    pub fn into_diagonal(self) -> Vec<T> {
        self.rows
            .into_iter()
            .enumerate()
            .map(|(m, row)| row[m])
            .collect()
    }

    /// Most refined value, the last column of the last row.
    pub fn best(&self) -> T {
        let last = self.max_order();
        self.rows[last][last]
    }

    /// First order whose step fell below the cancellation threshold, if any.
    pub fn cancellation_onset(&self) -> Option<usize> {
        self.cancellation_onset
    }
}

/// Derivative estimates at every extrapolation order `0..=max_order`.
///
/// The first entry is the plain central difference at `h`; the last is the
/// most refined estimate.
pub fn richardson_derivative<T, F>(f: &F, x: T, h: T, max_order: usize) -> Result<Vec<T>>
where
    T: Scalar,
    F: ScalarFunction<T> + ?Sized,
{
    RichardsonTable::build(f, x, h, max_order).map(RichardsonTable::into_diagonal)
}

/// Best Richardson estimate at each point of `xs`.
pub fn richardson_curve<T, F>(f: &F, xs: &[T], h: T, max_order: usize) -> Result<Vec<T>>
where
    T: Scalar,
    F: ScalarFunction<T> + ?Sized,
{
    validate_step(h)?;
    xs.iter()
        .map(|&x| RichardsonTable::build(f, x, h, max_order).map(|table| table.best()))
        .collect()
}

/// Parallel form of [`richardson_curve`]. Tables at different points share
/// nothing, so results match the sequential form exactly.
#[cfg(feature = "parallel")]
pub fn richardson_curve_par<T, F>(f: &F, xs: &[T], h: T, max_order: usize) -> Result<Vec<T>>
where
    T: Scalar,
    F: ScalarFunction<T> + Sync + ?Sized,
{
    use rayon::prelude::*;

    validate_step(h)?;
    xs.par_iter()
        .map(|&x| RichardsonTable::build(f, x, h, max_order).map(|table| table.best()))
        .collect()
}

/// Converts a signed order from an outer boundary into a table depth.
pub fn order_from_signed(order: i64) -> Result<usize> {
    usize::try_from(order).map_err(|_| DiffError::InvalidOrder { order })
}
