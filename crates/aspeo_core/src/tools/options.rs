//! Free-form tool options forwarded to external binaries.
//!
//! A stage section in the workflow file carries its orchestration fields
//! plus any number of tool options:
//!
//! ```toml
//! [stereo]
//! alignment-method = "none"
//! corr-kernel = [21, 21]
//! t = "rpc"
//! subpixel-mode = 3
//! skip-rough-homography = true
//! ```
//!
//! These render to `--alignment-method none --corr-kernel 21 21 -t rpc
//! --subpixel-mode 3 --skip-rough-homography`, in file order.

use serde::{Deserialize, Serialize};
use toml::{Table, Value};

/// Ordered option table for one external tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolOptions(Table);

impl ToolOptions {
    pub fn new() -> Self {
        Self(Table::new())
    }

    /// Set an option (builder pattern).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set an option, replacing any previous value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Remove an option (builder pattern).
    pub fn without(mut self, key: &str) -> Self {
        self.0.remove(key);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check that every value can be rendered as command-line arguments.
    ///
    /// Nested tables and nested arrays are rejected.
    pub fn validate(&self) -> Result<(), String> {
        for (key, value) in self.0.iter() {
            if key.is_empty() {
                return Err("empty option name".to_string());
            }
            match value {
                Value::Table(_) => {
                    return Err(format!("option '{}' must not be a table", key));
                }
                Value::Array(items) => {
                    if items
                        .iter()
                        .any(|v| matches!(v, Value::Array(_) | Value::Table(_)))
                    {
                        return Err(format!("option '{}' must be a flat list", key));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Render all options as command-line arguments.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        for (key, value) in self.0.iter() {
            push_option(&mut args, key, value);
        }
        args
    }
}

/// `-k` for single-character keys, `--key` otherwise.
pub fn flag_name(key: &str) -> String {
    if key.chars().count() > 1 {
        format!("--{}", key)
    } else {
        format!("-{}", key)
    }
}

fn push_option(args: &mut Vec<String>, key: &str, value: &Value) {
    match value {
        Value::Boolean(true) => args.push(flag_name(key)),
        Value::Boolean(false) => {}
        Value::Array(items) => {
            args.push(flag_name(key));
            args.extend(items.iter().map(value_to_arg));
        }
        other => {
            args.push(flag_name(key));
            args.push(value_to_arg(other));
        }
    }
}

/// String form of a scalar option value.
pub fn value_to_arg(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Datetime(d) => d.to_string(),
        Value::Array(items) => items.iter().map(value_to_arg).collect::<Vec<_>>().join(" "),
        Value::Table(t) => t.to_string(),
    }
}
