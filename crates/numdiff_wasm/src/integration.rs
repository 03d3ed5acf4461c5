//! Sample-based routines that need no compiled expression.

use crate::to_js_error;
use numdiff_core::quadrature;
use numdiff_core::series::TabulatedSeries;
use numdiff_core::stencil::central_difference_samples;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

/// Interior derivative of values sampled at spacing `h` (two shorter than the input).
#[wasm_bindgen]
pub fn sampled_derivative(samples: Vec<f64>, h: f64) -> Result<Vec<f64>, JsValue> {
    central_difference_samples(&samples, h).map_err(to_js_error)
}

#[wasm_bindgen]
pub fn trapezoid_samples(y: Vec<f64>, x: Vec<f64>) -> Result<f64, JsValue> {
    quadrature::trapezoid_samples(&y, &x).map_err(to_js_error)
}

#[wasm_bindgen]
pub fn cumulative_trapezoid(y: Vec<f64>, x: Vec<f64>) -> Result<Vec<f64>, JsValue> {
    quadrature::cumulative_trapezoid(&y, &x).map_err(to_js_error)
}

/// Parses a two-column time/value table and returns `{ total, cumulative }`.
#[wasm_bindgen]
pub fn integrate_series(text: &str) -> Result<JsValue, JsValue> {
    let integral = TabulatedSeries::parse(text)
        .and_then(|series| series.integrate())
        .map_err(to_js_error)?;
    to_value(&integral).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Log-spaced step sizes, `10^start ..= 10^end`.
#[wasm_bindgen]
pub fn logspace(start: f64, end: f64, n: u32) -> Vec<f64> {
    numdiff_core::analysis::logspace(start, end, n as usize)
}
