//! Numeric coercion for user-supplied amounts.
//!
//! Amounts arrive from text fields, JSON bodies and float-based callers. Every
//! source is funnelled through [`ToDecimal`]; anything that is not a finite
//! number yields `None` and is coerced to zero by [`coerce_amount`].

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

/// Conversion of a loosely-typed value into a decimal.
pub trait ToDecimal {
    /// Returns `None` for missing, non-numeric, NaN or infinite input.
    fn to_decimal(&self) -> Option<Decimal>;
}

impl ToDecimal for Decimal {
    fn to_decimal(&self) -> Option<Decimal> {
        Some(*self)
    }
}

impl ToDecimal for f64 {
    fn to_decimal(&self) -> Option<Decimal> {
        if !self.is_finite() {
            return None;
        }
        Decimal::from_f64(*self)
    }
}

impl ToDecimal for i64 {
    fn to_decimal(&self) -> Option<Decimal> {
        Some(Decimal::from(*self))
    }
}

impl ToDecimal for u64 {
    fn to_decimal(&self) -> Option<Decimal> {
        Some(Decimal::from(*self))
    }
}

impl ToDecimal for str {
    fn to_decimal(&self) -> Option<Decimal> {
        let trimmed = self.trim();
        if trimmed.is_empty() {
            return None;
        }
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .ok()
    }
}

impl ToDecimal for String {
    fn to_decimal(&self) -> Option<Decimal> {
        self.as_str().to_decimal()
    }
}

impl ToDecimal for serde_json::Value {
    fn to_decimal(&self) -> Option<Decimal> {
        match self {
            // Go through the textual form so integers keep full precision
            serde_json::Value::Number(n) => n.to_string().as_str().to_decimal(),
            serde_json::Value::String(s) => s.to_decimal(),
            _ => None,
        }
    }
}

impl<T: ToDecimal> ToDecimal for Option<T> {
    fn to_decimal(&self) -> Option<Decimal> {
        self.as_ref().and_then(ToDecimal::to_decimal)
    }
}

impl<T: ToDecimal + ?Sized> ToDecimal for &T {
    fn to_decimal(&self) -> Option<Decimal> {
        (**self).to_decimal()
    }
}

/// Coerce a user-supplied amount to a non-negative decimal.
///
/// Invalid, missing and negative input all become zero.
pub fn coerce_amount<T: ToDecimal + ?Sized>(value: &T) -> Decimal {
    match value.to_decimal() {
        Some(d) if d.is_sign_positive() && !d.is_zero() => d,
        _ => Decimal::ZERO,
    }
}
