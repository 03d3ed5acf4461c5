//! Expression-backed derivative estimator exposed to JavaScript.

use crate::{order_from_js, to_js_error};
use numdiff_core::analysis::{compare_on_grid, error_by_order, step_sensitivity};
use numdiff_core::equation_engine::Expression;
use numdiff_core::error::DiffError;
use numdiff_core::quadrature::{simpson, trapezoidal};
use numdiff_core::richardson::{richardson_curve, richardson_derivative, RichardsonTable};
use numdiff_core::settings::DerivativeSettings;
use numdiff_core::stencil::{central_difference, central_difference_at};
use numdiff_core::traits::ScalarFunction;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmDerivative {
    expression: Expression,
}

/// Table payload with the per-row steps alongside the entries.
#[derive(Serialize)]
struct TablePayload {
    rows: Vec<Vec<f64>>,
    steps: Vec<f64>,
    diagonal: Vec<f64>,
    cancellation_onset: Option<usize>,
}

impl From<&RichardsonTable<f64>> for TablePayload {
    fn from(table: &RichardsonTable<f64>) -> Self {
        Self {
            rows: table.rows().to_vec(),
            steps: (0..=table.max_order()).filter_map(|i| table.step(i)).collect(),
            diagonal: table.diagonal(),
            cancellation_onset: table.cancellation_onset(),
        }
    }
}

impl WasmDerivative {
    fn richardson_internal(&self, x: f64, h: f64, max_order: i32) -> Result<Vec<f64>, DiffError> {
        let order = order_from_js(max_order)?;
        richardson_derivative(&self.expression, x, h, order)
    }

    fn table_internal(&self, x: f64, h: f64, max_order: i32) -> Result<TablePayload, DiffError> {
        let order = order_from_js(max_order)?;
        let table = RichardsonTable::build(&self.expression, x, h, order)?;
        Ok(TablePayload::from(&table))
    }
}

#[wasm_bindgen]
impl WasmDerivative {
    #[wasm_bindgen(constructor)]
    pub fn new(expression: &str, variable: &str) -> Result<WasmDerivative, JsValue> {
        console_error_panic_hook::set_once();

        let expression = Expression::compile(expression, variable).map_err(to_js_error)?;
        Ok(WasmDerivative { expression })
    }

    pub fn source(&self) -> String {
        self.expression.source().to_string()
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        ScalarFunction::<f64>::eval(&self.expression, x)
    }

    pub fn central_difference(&self, x: f64, h: f64) -> Result<f64, JsValue> {
        central_difference(&self.expression, x, h).map_err(to_js_error)
    }

    pub fn central_difference_at(&self, xs: Vec<f64>, h: f64) -> Result<Vec<f64>, JsValue> {
        central_difference_at(&self.expression, &xs, h).map_err(to_js_error)
    }

    /// Estimates for orders `0..=max_order`.
    pub fn richardson(&self, x: f64, h: f64, max_order: i32) -> Result<Vec<f64>, JsValue> {
        self.richardson_internal(x, h, max_order).map_err(to_js_error)
    }

    /// Same as `richardson`, with `{ step_size, max_order }` passed as an object.
    pub fn richardson_with_settings(&self, x: f64, settings: JsValue) -> Result<Vec<f64>, JsValue> {
        let settings: DerivativeSettings = from_value(settings)
            .map_err(|e| JsValue::from_str(&format!("Invalid settings: {}", e)))?;
        settings.validate().map_err(to_js_error)?;
        settings.estimates(&self.expression, x).map_err(to_js_error)
    }

    pub fn richardson_table(&self, x: f64, h: f64, max_order: i32) -> Result<JsValue, JsValue> {
        let payload = self.table_internal(x, h, max_order).map_err(to_js_error)?;
        to_value(&payload).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Best estimate at each point of `xs`.
    pub fn richardson_curve(
        &self,
        xs: Vec<f64>,
        h: f64,
        max_order: i32,
    ) -> Result<Vec<f64>, JsValue> {
        let order = order_from_js(max_order).map_err(to_js_error)?;
        richardson_curve(&self.expression, &xs, h, order).map_err(to_js_error)
    }

    pub fn error_by_order(
        &self,
        x: f64,
        h: f64,
        max_order: i32,
        exact: f64,
    ) -> Result<Vec<f64>, JsValue> {
        let order = order_from_js(max_order).map_err(to_js_error)?;
        error_by_order(&self.expression, x, h, order, exact).map_err(to_js_error)
    }

    pub fn step_sensitivity(
        &self,
        x: f64,
        exact: f64,
        steps: Vec<f64>,
        max_order: i32,
    ) -> Result<JsValue, JsValue> {
        let order = order_from_js(max_order).map_err(to_js_error)?;
        let report =
            step_sensitivity(&self.expression, x, exact, &steps, order).map_err(to_js_error)?;
        to_value(&report).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Grid comparison against a reference derivative given as an expression
    /// in the same variable.
    pub fn compare(
        &self,
        derivative: &str,
        variable: &str,
        a: f64,
        b: f64,
        n: u32,
        max_order: i32,
    ) -> Result<JsValue, JsValue> {
        let reference = Expression::compile(derivative, variable).map_err(to_js_error)?;
        let order = order_from_js(max_order).map_err(to_js_error)?;
        let comparison = compare_on_grid(&self.expression, &reference, a, b, n as usize, order)
            .map_err(to_js_error)?;
        to_value(&comparison).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    pub fn trapezoidal(&self, a: f64, b: f64, n: u32) -> Result<f64, JsValue> {
        trapezoidal(&self.expression, a, b, n as usize).map_err(to_js_error)
    }

    pub fn simpson(&self, a: f64, b: f64, n: u32) -> Result<f64, JsValue> {
        simpson(&self.expression, a, b, n as usize).map_err(to_js_error)
    }
}
