//! Per-operation time budgets
//!
//! Resources accept an optional `timeouts` block:
//!
//! ```text
//! timeouts = {
//!   create = "3h"
//!   delete = "30m"
//! }
//! ```
//!
//! Unset operations fall back to the resource type's defaults.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::resource::Value;

/// Attribute name of the timeouts block
pub const TIMEOUTS_ATTRIBUTE: &str = "timeouts";

#[derive(Debug, Error, PartialEq)]
pub enum TimeoutsError {
    #[error("invalid duration '{0}': expected a sequence like \"1h30m\", \"45s\" or \"500ms\"")]
    InvalidDuration(String),

    #[error("unknown timeout '{0}': expected one of create, read, update, delete")]
    UnknownOperation(String),

    #[error("timeout '{0}' must be a string")]
    NotAString(String),
}

/// Provider operation a timeout applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Time budget for each provider operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::uniform(Duration::from_secs(20 * 60))
    }
}

impl Timeouts {
    pub const fn uniform(timeout: Duration) -> Self {
        Self {
            create: timeout,
            read: timeout,
            update: timeout,
            delete: timeout,
        }
    }

    pub fn with_create(mut self, timeout: Duration) -> Self {
        self.create = timeout;
        self
    }

    pub fn with_delete(mut self, timeout: Duration) -> Self {
        self.delete = timeout;
        self
    }

    pub fn get(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Create => self.create,
            Operation::Read => self.read,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }

    /// Apply the `timeouts` block of a resource on top of these defaults
    pub fn merge_attributes(self, attributes: &HashMap<String, Value>) -> Result<Self, TimeoutsError> {
        let Some(block) = attributes.get(TIMEOUTS_ATTRIBUTE).and_then(Value::as_map) else {
            return Ok(self);
        };

        let mut merged = self;
        for (key, value) in block {
            let raw = value
                .as_str()
                .ok_or_else(|| TimeoutsError::NotAString(key.clone()))?;
            let duration = parse_duration(raw)?;
            match key.as_str() {
                "create" => merged.create = duration,
                "read" => merged.read = duration,
                "update" => merged.update = duration,
                "delete" => merged.delete = duration,
                other => return Err(TimeoutsError::UnknownOperation(other.to_string())),
            }
        }
        Ok(merged)
    }
}

/// Parse a duration such as `"1h30m"`, `"45s"`, `"1.5h"` or `"500ms"`
pub fn parse_duration(input: &str) -> Result<Duration, TimeoutsError> {
    let invalid = || TimeoutsError::InvalidDuration(input.to_string());
    let s = input.trim();
    if s.is_empty() {
        return Err(invalid());
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total_secs = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return Err(invalid());
        }
        let number: f64 = rest[..number_len].parse().map_err(|_| invalid())?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit_secs = match &rest[..unit_len] {
            "ms" => 0.001,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];

        total_secs += number * unit_secs;
    }

    Duration::try_from_secs_f64(total_secs).map_err(|_| invalid())
}
