//! Composite Newton-Cotes rules over functions and tabulated samples.

use crate::error::{DiffError, Result};
use crate::traits::ScalarFunction;

/// Composite trapezoidal rule with `n` equal subintervals on `[a, b]`.
pub fn trapezoidal<F>(f: &F, a: f64, b: f64, n: usize) -> Result<f64>
where
    F: ScalarFunction<f64> + ?Sized,
{
    validate_interval(a, b, n)?;
    let h = (b - a) / n as f64;
    let interior: f64 = (1..n).map(|i| f.eval(a + i as f64 * h)).sum();
    Ok(0.5 * h * (f.eval(a) + 2.0 * interior + f.eval(b)))
}

/// Composite Simpson rule with `n` equal subintervals on `[a, b]`; `n` must
/// be even.
pub fn simpson<F>(f: &F, a: f64, b: f64, n: usize) -> Result<f64>
where
    F: ScalarFunction<f64> + ?Sized,
{
    validate_interval(a, b, n)?;
    if n % 2 != 0 {
        return Err(DiffError::OddSubintervals { n });
    }
    let h = (b - a) / n as f64;
    let mut odd = 0.0;
    let mut even = 0.0;
    for i in 1..n {
        let y = f.eval(a + i as f64 * h);
        if i % 2 == 1 {
            odd += y;
        } else {
            even += y;
        }
    }
    Ok(h / 3.0 * (f.eval(a) + 4.0 * odd + 2.0 * even + f.eval(b)))
}

/// Trapezoidal integral of `y` over the (possibly non-uniform) grid `x`.
pub fn trapezoid_samples(y: &[f64], x: &[f64]) -> Result<f64> {
    validate_samples(y, x)?;
    Ok(y.windows(2)
        .zip(x.windows(2))
        .map(|(yw, xw)| 0.5 * (xw[1] - xw[0]) * (yw[0] + yw[1]))
        .sum())
}

/// Running trapezoidal integral of `y` over `x`, starting at 0.
///
/// The output has the same length as the input; the last entry equals
/// [`trapezoid_samples`].
pub fn cumulative_trapezoid(y: &[f64], x: &[f64]) -> Result<Vec<f64>> {
    validate_samples(y, x)?;
    let mut out = Vec::with_capacity(y.len());
    let mut acc = 0.0;
    out.push(acc);
    for (yw, xw) in y.windows(2).zip(x.windows(2)) {
        acc += 0.5 * (xw[1] - xw[0]) * (yw[0] + yw[1]);
        out.push(acc);
    }
    Ok(out)
}

/// Relative error `|estimate - exact| / |exact|`.
///
/// Undefined for `exact == 0`: the result is infinite, or NaN when the
/// estimate is also zero.
pub fn relative_error(estimate: f64, exact: f64) -> f64 {
    (estimate - exact).abs() / exact.abs()
}

fn validate_interval(a: f64, b: f64, n: usize) -> Result<()> {
    if !a.is_finite() || !b.is_finite() {
        return Err(DiffError::InvalidInterval(format!(
            "bounds must be finite, got [{a}, {b}]"
        )));
    }
    if n == 0 {
        return Err(DiffError::InvalidInterval(
            "number of subintervals must be positive".to_string(),
        ));
    }
    Ok(())
}

fn validate_samples(y: &[f64], x: &[f64]) -> Result<()> {
    if y.len() != x.len() {
        return Err(DiffError::LengthMismatch {
            left: y.len(),
            right: x.len(),
        });
    }
    if y.len() < 2 {
        return Err(DiffError::InsufficientSamples {
            len: y.len(),
            min: 2,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quartic(x: f64) -> f64 {
        x.powi(4) - 2.0 * x + 1.0
    }

    #[test]
    fn both_rules_integrate_quartic_within_one_percent() {
        let exact = 4.4;
        for n in [100, 1000] {
            let trap = trapezoidal(&quartic, 0.0, 2.0, n).expect("trapezoid");
            let simp = simpson(&quartic, 0.0, 2.0, n).expect("simpson");
            assert!(relative_error(trap, exact) < 0.01);
            assert!(relative_error(simp, exact) < 0.01);
            assert!(relative_error(simp, exact) < relative_error(trap, exact));
        }
    }

    #[test]
    fn relative_error_against_zero_is_not_finite() {
        assert_eq!(relative_error(0.5, 0.0), f64::INFINITY);
        assert!(relative_error(0.0, 0.0).is_nan());
        assert!((relative_error(4.4, 4.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn simpson_is_exact_for_cubics() {
        let cubic = |x: f64| x * x * x - x;
        let result = simpson(&cubic, -1.0, 3.0, 2).expect("simpson");
        // [x^4/4 - x^2/2] from -1 to 3
        assert!((result - 16.0).abs() < 1e-12);
    }

    #[test]
    fn simpson_rejects_odd_subintervals() {
        assert_eq!(
            simpson(&quartic, 0.0, 2.0, 101),
            Err(DiffError::OddSubintervals { n: 101 })
        );
    }

    #[test]
    fn rules_reject_empty_or_unbounded_intervals() {
        assert!(matches!(
            trapezoidal(&quartic, 0.0, 2.0, 0),
            Err(DiffError::InvalidInterval(_))
        ));
        assert!(matches!(
            simpson(&quartic, 0.0, f64::INFINITY, 10),
            Err(DiffError::InvalidInterval(_))
        ));
    }

    #[test]
    fn sample_integrals_handle_non_uniform_grids() {
        let x = [0.0, 0.5, 2.0, 3.0];
        let y: Vec<f64> = x.iter().map(|t| 2.0 * t + 1.0).collect();
        let total = trapezoid_samples(&y, &x).expect("total");
        // Linear integrands are integrated exactly: t^2 + t on [0, 3].
        assert!((total - 12.0).abs() < 1e-12);

        let running = cumulative_trapezoid(&y, &x).expect("running");
        assert_eq!(running.len(), x.len());
        assert_eq!(running[0], 0.0);
        for (acc, t) in running.iter().zip(x) {
            assert!((acc - (t * t + t)).abs() < 1e-12);
        }
        assert_eq!(*running.last().unwrap(), total);
    }

    #[test]
    fn sample_integrals_validate_inputs() {
        assert_eq!(
            trapezoid_samples(&[1.0, 2.0], &[0.0]),
            Err(DiffError::LengthMismatch { left: 2, right: 1 })
        );
        assert_eq!(
            cumulative_trapezoid(&[1.0], &[0.0]),
            Err(DiffError::InsufficientSamples { len: 1, min: 2 })
        );
    }
}
