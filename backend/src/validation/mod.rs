//! JSON Schema validation for conversion plans.
//!
//! Plans arrive from plan files, the registry and the HTTP API. They are
//! checked against an embedded JSON Schema (Draft 7) before being
//! deserialised, so callers get every problem at once instead of the first
//! serde error.
//!
//! # Embedded Schemas
//!
//! - `schemas/conversion-plan.json`
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use periodshift::validation::is_valid_conversion_plan;
//!
//! let plan = json!({ "operation": "aggregate", "to": "Y", "method": "sum" });
//! assert!(is_valid_conversion_plan(&plan));
//! ```

use once_cell::sync::Lazy;
use serde_json::Value;

static CONVERSION_PLAN_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/conversion-plan.json"))
        .expect("Invalid embedded schema")
});

/// Validate a JSON value against a JSON schema.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with every validation error otherwise
///
/// # Example
/// ```ignore
/// use serde_json::json;
/// use periodshift::validation::validate;
///
/// let schema = json!({
///     "type": "object",
///     "required": ["to"],
///     "properties": { "to": { "type": "string" } }
/// });
///
/// assert!(validate(&schema, &json!({ "to": "Y" })).is_ok());
/// assert!(validate(&schema, &json!({ "from": "Q" })).is_err());
/// ```
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick true/false check.
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

/// Validate against the conversion plan schema.
pub fn validate_conversion_plan(data: &Value) -> Result<(), Vec<String>> {
    validate(&CONVERSION_PLAN_SCHEMA, data)
}

/// Quick check against the conversion plan schema.
pub fn is_valid_conversion_plan(data: &Value) -> bool {
    is_valid(&CONVERSION_PLAN_SCHEMA, data)
}
