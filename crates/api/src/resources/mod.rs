//! Request and response payloads.
//!
//! Each resource has an input type that accepts loosely-typed JSON and
//! validates it field by field, and an output type that shapes a domain
//! model for the wire. Read-only fields sent by a client (`id`, `retailer`,
//! `customer`, `cart`, `user`, `created_at`) are simply not part of the input
//! types, so they are ignored rather than applied.
//!
//! Validation failures are collected per field and reported together as a
//! `{"field": ["message", ...]}` map.

pub mod cart;
pub mod order;
pub mod product;
pub mod user;

use std::collections::BTreeMap;
use std::fmt;

use axum::extract::FromRequest;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;

pub(crate) const REQUIRED: &str = "This field is required.";
pub(crate) const BLANK: &str = "This field may not be blank.";
pub(crate) const INVALID_INTEGER: &str = "A valid integer is required.";
pub(crate) const INVALID_NUMBER: &str = "A valid number is required.";

/// JSON body extractor whose rejections render as API errors.
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// A `{"message": ...}` response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    #[must_use]
    pub const fn new(message: &'static str) -> Self {
        Self { message }
    }
}

/// Field-keyed validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Errors consisting of a single message on a single field.
    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record a message against a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded against `field`, if any.
    #[must_use]
    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(value)` when nothing was recorded, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns the collected errors if any were recorded.
    pub fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Record "required" for a missing value and pass present values through.
pub(crate) fn require<T>(errors: &mut ValidationErrors, field: &str, value: Option<T>) -> Option<T> {
    if value.is_none() {
        errors.add(field, REQUIRED);
    }
    value
}

/// Validate a free-text field: must not be blank, optionally length-capped.
pub(crate) fn text_field(
    errors: &mut ValidationErrors,
    field: &str,
    value: String,
    max_chars: Option<usize>,
) -> Option<String> {
    if value.trim().is_empty() {
        errors.add(field, BLANK);
        return None;
    }
    if let Some(max) = max_chars
        && value.chars().count() > max
    {
        errors.add(
            field,
            format!("Ensure this field has no more than {max} characters."),
        );
        return None;
    }
    Some(value)
}

/// Read an integer from a JSON number or a numeric string.
pub(crate) fn integer_field(errors: &mut ValidationErrors, field: &str, value: &Value) -> Option<i64> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    if parsed.is_none() {
        errors.add(field, INVALID_INTEGER);
    }
    parsed
}

/// Read an integer that must be at least `min`.
pub(crate) fn bounded_count(
    errors: &mut ValidationErrors,
    field: &str,
    value: &Value,
    min: u32,
) -> Option<u32> {
    let raw = integer_field(errors, field, value)?;
    if raw < i64::from(min) {
        errors.add(
            field,
            format!("Ensure this value is greater than or equal to {min}."),
        );
        return None;
    }
    match u32::try_from(raw) {
        Ok(n) if i32::try_from(n).is_ok() => Some(n),
        _ => {
            errors.add(
                field,
                format!("Ensure this value is less than or equal to {}.", i32::MAX),
            );
            None
        }
    }
}

/// Read a decimal from a JSON number or a numeric string.
pub(crate) fn decimal_field(
    errors: &mut ValidationErrors,
    field: &str,
    value: &Value,
) -> Option<Decimal> {
    let parsed = match value {
        Value::Number(n) => n.to_string().parse::<Decimal>().ok(),
        Value::String(s) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    };
    if parsed.is_none() {
        errors.add(field, INVALID_NUMBER);
    }
    parsed
}

/// Read a money amount from a JSON number or a numeric string.
pub(crate) fn money_field(
    errors: &mut ValidationErrors,
    field: &str,
    value: &Value,
) -> Option<marketstall_core::Money> {
    let amount = decimal_field(errors, field, value)?;
    marketstall_core::Money::new(amount)
        .map_err(|e| errors.add(field, e.to_string()))
        .ok()
}

/// Read a primary key reference from a JSON number or a numeric string.
pub(crate) fn pk_field(errors: &mut ValidationErrors, field: &str, value: &Value) -> Option<i32> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    if parsed.is_none() {
        let received = match value {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(n) if n.is_f64() => "float",
            Value::Number(_) => "int",
            Value::String(_) => "str",
            Value::Array(_) => "list",
            Value::Object(_) => "dict",
        };
        errors.add(
            field,
            format!("Incorrect type. Expected pk value, received {received}."),
        );
    }
    parsed
}

/// Message for a reference to a row that does not exist.
#[must_use]
pub fn missing_pk(id: impl fmt::Display) -> String {
    format!("Invalid pk \"{id}\" - object does not exist.")
}
