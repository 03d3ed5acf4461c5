use numdiff_core::error::DiffError;
use wasm_bindgen::prelude::*;

mod derivative;
mod integration;

pub use derivative::WasmDerivative;
pub use integration::{
    cumulative_trapezoid, integrate_series, logspace, sampled_derivative, trapezoid_samples,
};

pub(crate) fn to_js_error(err: DiffError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Orders arrive from JavaScript as signed integers.
pub(crate) fn order_from_js(max_order: i32) -> Result<usize, DiffError> {
    numdiff_core::richardson::order_from_signed(i64::from(max_order))
}
