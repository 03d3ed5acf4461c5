use thiserror::Error;

/// Errors raised by the differentiation and quadrature routines.
///
/// Every variant that involves a stencil carries the abscissa, the step and the
/// extrapolation order that triggered it, so a caller can pick a larger base
/// step or a smaller order and retry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiffError {
    /// Step size is zero, negative, or not finite.
    #[error("step size must be positive and finite, got {step}")]
    InvalidStep { step: f64 },
    /// Evaluation point is not finite.
    #[error("evaluation point must be finite, got {x}")]
    InvalidPoint { x: f64 },
    /// Extrapolation order supplied through a signed boundary is negative.
    #[error("extrapolation order must be non-negative, got {order}")]
    InvalidOrder { order: i64 },
    /// The function is undefined (non-finite) at a stencil point.
    #[error("function is not finite at x = {x} (value {value}) for step {step} at order {order}")]
    Domain {
        x: f64,
        step: f64,
        order: usize,
        value: f64,
    },
    /// A sampled derivative entry is not finite.
    #[error("sampled derivative is not finite at index {index} (value {value})")]
    SampleDomain { index: usize, value: f64 },
    /// Repeated halving shrank the step until the stencil collapsed onto `x`.
    #[error("step {step} at order {order} vanishes relative to x = {x}; use a larger step or a smaller order")]
    StepUnderflow { x: f64, step: f64, order: usize },
    /// Not enough samples for the requested stencil or rule.
    #[error("need at least {min} samples, got {len}")]
    InsufficientSamples { len: usize, min: usize },
    /// Paired sequences have different lengths.
    #[error("length mismatch: {left} values versus {right} abscissae")]
    LengthMismatch { left: usize, right: usize },
    /// Simpson's rule requires an even number of subintervals.
    #[error("Simpson's rule requires an even number of subintervals, got {n}")]
    OddSubintervals { n: usize },
    /// Integration bounds or subinterval count are unusable.
    #[error("invalid integration interval: {0}")]
    InvalidInterval(String),
    /// Expression text could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
    /// Expression references a name that is neither the variable nor a known function.
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),
}

/// Result type for differentiation operations.
pub type Result<T, E = DiffError> = std::result::Result<T, E>;
