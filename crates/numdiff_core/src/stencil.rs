//! Central-difference estimators.
//!
//! Three forms share one formula, `(f(x + h) - f(x - h)) / (2h)`:
//! a single point, an array of points, and a sequence of values already
//! sampled at uniform spacing.

use crate::error::{DiffError, Result};
use crate::traits::{to_f64, Scalar, ScalarFunction};

/// Estimates `f'(x)` with the symmetric two-point stencil `x - h, x + h`.
///
/// The truncation error is `O(h^2)`. A zero, negative or non-finite `h` is
/// rejected before `f` is evaluated.
///
/// # Errors
///
/// * [`DiffError::InvalidStep`] if `h` is not positive and finite.
/// * [`DiffError::InvalidPoint`] if `x` is not finite.
/// * [`DiffError::StepUnderflow`] if `x + h` or `x - h` rounds to `x`, or `h`
///   is subnormal.
/// * [`DiffError::Domain`] if `f` is not finite at either stencil point.
pub fn central_difference<T, F>(f: &F, x: T, h: T) -> Result<T>
where
    T: Scalar,
    F: ScalarFunction<T> + ?Sized,
{
    validate_step(h)?;
    validate_point(x)?;
    central_difference_unchecked(f, x, h, 0)
}

/// Applies [`central_difference`] at every point of `xs`, stopping at the
/// first failure.
pub fn central_difference_at<T, F>(f: &F, xs: &[T], h: T) -> Result<Vec<T>>
where
    T: Scalar,
    F: ScalarFunction<T> + ?Sized,
{
    validate_step(h)?;
    xs.iter()
        .map(|&x| {
            validate_point(x)?;
            central_difference_unchecked(f, x, h, 0)
        })
        .collect()
}

/// Interior derivative estimates for values sampled at uniform spacing `h`.
///
/// Returns `(y[i+1] - y[i-1]) / (2h)` for every interior index, so the output
/// is two elements shorter than the input. The boundary points get no
/// estimate.
pub fn central_difference_samples<T: Scalar>(samples: &[T], h: T) -> Result<Vec<T>> {
    validate_step(h)?;
    if samples.len() < 3 {
        return Err(DiffError::InsufficientSamples {
            len: samples.len(),
            min: 3,
        });
    }

    let two_h = h + h;
    let mut out = Vec::with_capacity(samples.len() - 2);
    for (i, window) in samples.windows(3).enumerate() {
        let d = (window[2] - window[0]) / two_h;
        if !d.is_finite() {
            return Err(DiffError::SampleDomain {
                index: i + 1,
                value: to_f64(d),
            });
        }
        out.push(d);
    }
    Ok(out)
}

/// Step below which rounding error in `f(x + h) - f(x - h)` overtakes the
/// truncation error of the central difference.
pub fn cancellation_threshold<T: Scalar>(x: T) -> T {
    T::epsilon().cbrt() * x.abs().max(T::one())
}

pub(crate) fn validate_step<T: Scalar>(h: T) -> Result<()> {
    if h.is_finite() && h > T::zero() {
        Ok(())
    } else {
        Err(DiffError::InvalidStep { step: to_f64(h) })
    }
}

pub(crate) fn validate_point<T: Scalar>(x: T) -> Result<()> {
    if x.is_finite() {
        Ok(())
    } else {
        Err(DiffError::InvalidPoint { x: to_f64(x) })
    }
}

/// Stencil evaluation for an already validated step and point.
/// `order` is only used to label errors.
pub(crate) fn central_difference_unchecked<T, F>(f: &F, x: T, h: T, order: usize) -> Result<T>
where
    T: Scalar,
    F: ScalarFunction<T> + ?Sized,
{
    let forward = x + h;
    let backward = x - h;
    if !h.is_normal() || forward == x || backward == x {
        return Err(DiffError::StepUnderflow {
            x: to_f64(x),
            step: to_f64(h),
            order,
        });
    }

    let f_forward = eval_checked(f, forward, h, order)?;
    let f_backward = eval_checked(f, backward, h, order)?;
    Ok((f_forward - f_backward) / (h + h))
}

fn eval_checked<T, F>(f: &F, at: T, h: T, order: usize) -> Result<T>
where
    T: Scalar,
    F: ScalarFunction<T> + ?Sized,
{
    let value = f.eval(at);
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DiffError::Domain {
            x: to_f64(at),
            step: to_f64(h),
            order,
            value: to_f64(value),
        })
    }
}
