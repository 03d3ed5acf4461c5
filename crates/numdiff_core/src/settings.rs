use crate::error::Result;
use crate::richardson::{richardson_derivative, RichardsonTable};
use crate::stencil::validate_step;
use crate::traits::ScalarFunction;
use serde::{Deserialize, Serialize};

/// Base step and extrapolation depth for a Richardson build.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivativeSettings {
    pub step_size: f64,
    pub max_order: usize,
}

impl Default for DerivativeSettings {
    fn default() -> Self {
        Self {
            // Grid spacing of 1000 points over [-2, 2].
            step_size: 4.0 / 999.0,
            max_order: 3,
        }
    }
}

impl DerivativeSettings {
    pub fn new(step_size: f64, max_order: usize) -> Result<Self> {
        let settings = Self {
            step_size,
            max_order,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        validate_step(self.step_size)
    }

    /// Estimates at every order for `f` at `x`.
    pub fn estimates<F>(&self, f: &F, x: f64) -> Result<Vec<f64>>
    where
        F: ScalarFunction<f64> + ?Sized,
    {
        richardson_derivative(f, x, self.step_size, self.max_order)
    }

    pub fn table<F>(&self, f: &F, x: f64) -> Result<RichardsonTable<f64>>
    where
        F: ScalarFunction<f64> + ?Sized,
    {
        RichardsonTable::build(f, x, self.step_size, self.max_order)
    }

    /// Step of the deepest row, `step_size / 2^max_order`.
    pub fn finest_step(&self) -> f64 {
        (0..self.max_order).fold(self.step_size, |h, _| h / 2.0)
    }
}
