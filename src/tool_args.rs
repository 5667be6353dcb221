//! Typed access to `tools/call` argument objects.

use crate::error::ToolError;
use serde_json::{Map, Value};

pub type ToolArgs = Map<String, Value>;

pub fn args_object(arguments: &Value) -> Result<ToolArgs, ToolError> {
    match arguments {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map.clone()),
        _ => Err(ToolError::invalid_input("Tool arguments must be a JSON object")),
    }
}

pub fn optional_str(args: &ToolArgs, key: &str) -> Option<String> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

pub fn str_or(args: &ToolArgs, key: &str, default: &str) -> String {
    optional_str(args, key).unwrap_or_else(|| default.to_string())
}

pub fn required_str(args: &ToolArgs, key: &str) -> Result<String, ToolError> {
    optional_str(args, key)
        .ok_or_else(|| ToolError::invalid_input(format!("Missing required argument '{key}'")))
}

/// Accepts JSON integers and numeric strings; clients disagree on which they send.
pub fn optional_u64(args: &ToolArgs, key: &str) -> Result<Option<u64>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_u64().map(Some).ok_or_else(|| {
            ToolError::invalid_input(format!("Argument '{key}' must be a non-negative integer"))
        }),
        Some(Value::String(s)) => s.trim().parse::<u64>().map(Some).map_err(|e| {
            ToolError::invalid_input(format!("Argument '{key}' is not an integer ('{s}'): {e}"))
        }),
        Some(_) => Err(ToolError::invalid_input(format!(
            "Argument '{key}' must be a non-negative integer"
        ))),
    }
}

pub fn required_u64(args: &ToolArgs, key: &str) -> Result<u64, ToolError> {
    optional_u64(args, key)?
        .ok_or_else(|| ToolError::invalid_input(format!("Missing required argument '{key}'")))
}

pub fn optional_f64(args: &ToolArgs, key: &str) -> Result<Option<f64>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => s.trim().parse::<f64>().map(Some).map_err(|e| {
            ToolError::invalid_input(format!("Argument '{key}' is not a number ('{s}'): {e}"))
        }),
        Some(_) => Err(ToolError::invalid_input(format!(
            "Argument '{key}' must be a number"
        ))),
    }
}

pub fn string_list(args: &ToolArgs, key: &str) -> Result<Vec<String>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(vec![]),
        Some(Value::Array(values)) => values
            .iter()
            .map(|value| {
                value.as_str().map(|s| s.trim().to_string()).ok_or_else(|| {
                    ToolError::invalid_input(format!(
                        "Argument '{key}' must contain only string values"
                    ))
                })
            })
            .filter(|v| v.as_ref().map(|s| !s.is_empty()).unwrap_or(true))
            .collect(),
        Some(_) => Err(ToolError::invalid_input(format!(
            "Argument '{key}' must be an array of strings"
        ))),
    }
}

pub fn one_of(key: &str, value: String, allowed: &[&str]) -> Result<String, ToolError> {
    if allowed.iter().any(|candidate| *candidate == value) {
        Ok(value)
    } else {
        Err(ToolError::invalid_input(format!(
            "Unsupported {key} '{value}' (expected {})",
            allowed.join("|")
        )))
    }
}
