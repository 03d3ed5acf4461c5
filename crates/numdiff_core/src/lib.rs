//! The `numdiff_core` crate estimates derivatives of scalar functions from
//! function values alone. It is generic over `Scalar` (`f64`, `f32`).
//!
//! Key components:
//! - **Stencil**: central differences at a point, over an array of points, and
//!   over uniformly sampled values.
//! - **Richardson**: the triangular extrapolation table built from halved steps,
//!   returning one estimate per extrapolation order.
//! - **Quadrature**: trapezoidal and Simpson rules, sample and cumulative
//!   integration, and two-column tabulated series.
//! - **Equation Engine**: a small bytecode VM so callers can supply the
//!   function as text.
pub mod analysis;
pub mod equation_engine;
pub mod error;
pub mod quadrature;
pub mod richardson;
pub mod series;
pub mod settings;
pub mod stencil;
pub mod traits;

pub use error::{DiffError, Result};
pub use richardson::{richardson_derivative, RichardsonTable};
pub use stencil::{central_difference, central_difference_samples};
