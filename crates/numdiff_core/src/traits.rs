use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars by the differentiation engine.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + Send + Sync + 'static {}

impl<T: Float + FromPrimitive + Debug + Send + Sync + 'static> Scalar for T {}

/// A real function of one real variable.
///
/// Implementations must be pure: the same input always yields the same output
/// and evaluation has no side effects. The engine does not check this, but the
/// error scaling of central differences and Richardson extrapolation only holds
/// for deterministic functions.
///
/// A point where the function is undefined should evaluate to NaN (or an
/// infinity); the engine reports it as a domain error.
pub trait ScalarFunction<T: Scalar> {
    fn eval(&self, x: T) -> T;
}

impl<T, F> ScalarFunction<T> for F
where
    T: Scalar,
    F: Fn(T) -> T,
{
    fn eval(&self, x: T) -> T {
        self(x)
    }
}

/// Converts a scalar to f64 for error reporting.
pub(crate) fn to_f64<T: Scalar>(value: T) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

/// Converts an f64 constant into the scalar type.
pub(crate) fn from_f64<T: Scalar>(value: f64) -> T {
    T::from_f64(value).unwrap_or_else(T::nan)
}
