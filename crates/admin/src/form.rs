//! Shared parsing helpers for the admin forms.
//!
//! Form inputs arrive as strings and are validated all at once so the
//! operator sees every problem in a single pass instead of fixing them
//! one submit at a time.

use chispa_core::types::Money;
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;

/// A validation problem tied to a single form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    /// Form field identifier, stable across renders.
    pub field: &'static str,
    /// User-facing message in Spanish.
    pub message: String,
}

impl FieldIssue {
    pub(crate) fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Parse a money amount from a form input.
///
/// The amount must be a valid decimal greater than zero.
pub(crate) fn parse_money(field: &'static str, value: &str) -> Result<Money, FieldIssue> {
    let amount = value
        .trim()
        .parse::<Decimal>()
        .map_err(|_| FieldIssue::new(field, "El precio debe ser un número válido"))?;
    if amount <= Decimal::ZERO {
        return Err(FieldIssue::new(field, "El precio debe ser mayor a cero"));
    }
    Ok(Money::new(amount))
}

/// Parse a non-negative integer quantity from a form input.
pub(crate) fn parse_quantity(field: &'static str, value: &str) -> Result<u32, FieldIssue> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| FieldIssue::new(field, "El stock debe ser un número entero"))
}

/// Parse an optional discount percentage. Empty input means "not set".
pub(crate) fn parse_optional_percent(
    field: &'static str,
    value: &str,
) -> Result<Option<u8>, FieldIssue> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let percent = trimmed
        .parse::<u8>()
        .map_err(|_| FieldIssue::new(field, "El descuento debe estar entre 1 y 99"))?;
    if !(1..=99).contains(&percent) {
        return Err(FieldIssue::new(field, "El descuento debe estar entre 1 y 99"));
    }
    Ok(Some(percent))
}

/// Parse an optional UTC timestamp. Empty input means "not set".
///
/// Accepts RFC 3339 as well as the `datetime-local` input format
/// (`2026-03-01T18:30`), which is read as UTC.
pub(crate) fn parse_optional_date(
    field: &'static str,
    value: &str,
) -> Result<Option<DateTime<Utc>>, FieldIssue> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M")
        .map(|naive| Some(naive.and_utc()))
        .map_err(|_| FieldIssue::new(field, "La fecha no tiene un formato válido"))
}
