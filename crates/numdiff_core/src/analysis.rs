//! Accuracy studies against a known derivative: error by order, step-size
//! sensitivity, and a grid-wide comparison of the two estimators.
//!
//! The exact derivative is supplied by the caller; nothing here derives it.

use crate::error::{DiffError, Result};
use crate::richardson::{richardson_curve, richardson_derivative};
use crate::stencil::{central_difference, central_difference_samples};
use crate::traits::ScalarFunction;
use serde::{Deserialize, Serialize};

/// Errors of both estimators at one base step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepSensitivity {
    pub step: f64,
    pub central_error: f64,
    pub richardson_error: f64,
}

/// Estimates and reference values on the interior of a uniform grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivativeComparison {
    pub x: Vec<f64>,
    pub central: Vec<f64>,
    pub richardson: Vec<f64>,
    pub analytical: Vec<f64>,
}

impl DerivativeComparison {
    pub fn central_errors(&self) -> Vec<f64> {
        abs_errors(&self.central, &self.analytical)
    }

    pub fn richardson_errors(&self) -> Vec<f64> {
        abs_errors(&self.richardson, &self.analytical)
    }
}

/// Absolute error of the Richardson estimate at each order `0..=max_order`.
pub fn error_by_order<F>(f: &F, x: f64, h: f64, max_order: usize, exact: f64) -> Result<Vec<f64>>
where
    F: ScalarFunction<f64> + ?Sized,
{
    let estimates = richardson_derivative(f, x, h, max_order)?;
    Ok(estimates.iter().map(|d| (d - exact).abs()).collect())
}

/// Central-difference and best-Richardson errors for every step in `steps`.
pub fn step_sensitivity<F>(
    f: &F,
    x: f64,
    exact: f64,
    steps: &[f64],
    max_order: usize,
) -> Result<Vec<StepSensitivity>>
where
    F: ScalarFunction<f64> + ?Sized,
{
    steps
        .iter()
        .map(|&step| -> Result<StepSensitivity> {
            let central = central_difference(f, x, step)?;
            let refined = richardson_derivative(f, x, step, max_order)?;
            let best = refined.last().copied().unwrap_or(central);
            Ok(StepSensitivity {
                step,
                central_error: (central - exact).abs(),
                richardson_error: (best - exact).abs(),
            })
        })
        .collect()
}

/// Samples `f` on `n` evenly spaced points of `[a, b]` and compares the
/// sampled central difference, the pointwise Richardson estimate and the
/// reference derivative at the interior points.
pub fn compare_on_grid<F, D>(
    f: &F,
    derivative: &D,
    a: f64,
    b: f64,
    n: usize,
    max_order: usize,
) -> Result<DerivativeComparison>
where
    F: ScalarFunction<f64> + ?Sized,
    D: ScalarFunction<f64> + ?Sized,
{
    if n < 3 {
        return Err(DiffError::InsufficientSamples { len: n, min: 3 });
    }
    if !(a.is_finite() && b.is_finite() && a < b) {
        return Err(DiffError::InvalidInterval(format!(
            "grid bounds must be finite with a < b, got [{a}, {b}]"
        )));
    }
    let grid = linspace(a, b, n);
    let h = grid[1] - grid[0];

    let samples: Vec<f64> = grid.iter().map(|&x| f.eval(x)).collect();
    let central = central_difference_samples(&samples, h)?;
    let x = grid[1..n - 1].to_vec();
    let richardson = richardson_curve(f, &x, h, max_order)?;
    let analytical = x.iter().map(|&xi| derivative.eval(xi)).collect();

    Ok(DerivativeComparison {
        x,
        central,
        richardson,
        analytical,
    })
}

/// `n` points from `a` to `b` inclusive.
pub fn linspace(a: f64, b: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![a],
        _ => {
            let step = (b - a) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { b } else { a + i as f64 * step })
                .collect()
        }
    }
}

/// `n` points from `10^start` to `10^end`, evenly spaced in the exponent.
pub fn logspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    linspace(start, end, n)
        .into_iter()
        .map(|e| 10f64.powf(e))
        .collect()
}

fn abs_errors(estimates: &[f64], reference: &[f64]) -> Vec<f64> {
    estimates
        .iter()
        .zip(reference)
        .map(|(e, r)| (e - r).abs())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tanh_profile(x: f64) -> f64 {
        1.0 + 0.5 * (2.0 * x).tanh()
    }

    fn tanh_profile_derivative(x: f64) -> f64 {
        let sech = 1.0 / (2.0 * x).cosh();
        sech * sech
    }

    #[test]
    fn error_by_order_shrinks_for_tanh_profile() {
        let errors = error_by_order(&tanh_profile, 0.0, 4.0 / 999.0, 3, 1.0).expect("errors");
        assert_eq!(errors.len(), 4);
        assert!(errors[0] > 1.0e-5);
        assert!(errors[3] < 1.0e-8);
    }

    #[test]
    fn step_sensitivity_covers_every_step() {
        let steps = logspace(-5.0, 0.0, 10);
        let report =
            step_sensitivity(&tanh_profile, 0.5, tanh_profile_derivative(0.5), &steps, 3)
                .expect("sweep");
        assert_eq!(report.len(), 10);
        assert_eq!(report[0].step, steps[0]);
        // h ~ 6e-3: well clear of both truncation and rounding limits.
        let moderate = report[5];
        assert!(moderate.richardson_error < 1.0e-10);
        assert!(moderate.central_error > 1.0e-6);
    }

    #[test]
    fn grid_comparison_drops_boundaries() {
        let cmp = compare_on_grid(&tanh_profile, &tanh_profile_derivative, -2.0, 2.0, 1000, 3)
            .expect("comparison");
        assert_eq!(cmp.x.len(), 998);
        assert_eq!(cmp.central.len(), 998);
        assert_eq!(cmp.richardson.len(), 998);
        assert_eq!(cmp.analytical.len(), 998);

        let central_max = cmp.central_errors().into_iter().fold(0.0, f64::max);
        let richardson_max = cmp.richardson_errors().into_iter().fold(0.0, f64::max);
        assert!(central_max < 1.0e-4);
        assert!(richardson_max < 1.0e-8);
    }

    #[test]
    fn grid_comparison_needs_three_points() {
        let err = compare_on_grid(&tanh_profile, &tanh_profile_derivative, 0.0, 1.0, 2, 3)
            .expect_err("too few points");
        assert_eq!(err, DiffError::InsufficientSamples { len: 2, min: 3 });
    }

    #[test]
    fn grid_comparison_rejects_reversed_bounds() {
        for (a, b) in [(2.0, -2.0), (1.0, 1.0), (0.0, f64::INFINITY)] {
            let err = compare_on_grid(&tanh_profile, &tanh_profile_derivative, a, b, 10, 3)
                .expect_err("bad bounds");
            assert!(matches!(err, DiffError::InvalidInterval(_)), "{a}, {b}: {err:?}");
        }
    }

    #[test]
    fn spacing_helpers_hit_both_ends() {
        let grid = linspace(-2.0, 2.0, 5);
        assert_eq!(grid, vec![-2.0, -1.0, 0.0, 1.0, 2.0]);
        let logs = logspace(-2.0, 1.0, 4);
        for (value, expected) in logs.iter().zip([0.01, 0.1, 1.0, 10.0]) {
            assert!((value - expected).abs() < 1e-12);
        }
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(3.0, 4.0, 1), vec![3.0]);
    }
}
