//! Input coercion. Invalid numbers never abort a computation; they are
//! replaced with a safe value and recorded once per cause.

use serde::Serialize;
use std::collections::HashSet;
use tracing::warn;

pub const NON_FINITE: &str = "non_finite";
pub const NEGATIVE: &str = "negative";
pub const UNKNOWN_SPECIES: &str = "unknown_species";
pub const FILTER_TYPE_FALLBACK: &str = "filter_type_fallback";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub code: &'static str,
    pub subject: String,
    pub message: String,
}

/// Per-computation collector, de-duplicated on `(code, subject)`.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    seen: HashSet<(&'static str, String)>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic. Returns `false` if the same cause was already recorded.
    pub fn record(&mut self, code: &'static str, subject: &str, message: String) -> bool {
        if !self.seen.insert((code, subject.to_string())) {
            return false;
        }
        warn!(code, subject, "{}", message);
        self.entries.push(Diagnostic {
            code,
            subject: subject.to_string(),
            message,
        });
        true
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Coerces NaN, infinities and negatives to 0.
pub fn non_negative(value: f64, subject: &str, diagnostics: &mut Diagnostics) -> f64 {
    if !value.is_finite() {
        diagnostics.record(
            NON_FINITE,
            subject,
            format!("{} is not a finite number ({}); using 0", subject, value),
        );
        0.0
    } else if value < 0.0 {
        diagnostics.record(
            NEGATIVE,
            subject,
            format!("{} is negative ({}); using 0", subject, value),
        );
        0.0
    } else {
        value
    }
}

/// Like `non_negative`, but an invalid value drops the option entirely.
pub fn optional_non_negative(
    value: Option<f64>,
    subject: &str,
    diagnostics: &mut Diagnostics,
) -> Option<f64> {
    match value {
        Some(v) if v.is_finite() && v >= 0.0 => Some(v),
        Some(v) => {
            non_negative(v, subject, diagnostics);
            None
        }
        None => None,
    }
}

/// Coerces a negative count to 0.
pub fn quantity(value: i32, subject: &str, diagnostics: &mut Diagnostics) -> u32 {
    u32::try_from(value).unwrap_or_else(|_| {
        diagnostics.record(
            NEGATIVE,
            subject,
            format!("{} quantity is negative ({}); using 0", subject, value),
        );
        0
    })
}

/// Coerces a non-finite reading to `fallback` without a sign check (temperatures, pH).
pub fn finite_or(value: f64, fallback: f64, subject: &str, diagnostics: &mut Diagnostics) -> f64 {
    if value.is_finite() {
        value
    } else {
        diagnostics.record(
            NON_FINITE,
            subject,
            format!("{} is not a finite number ({}); using {}", subject, value, fallback),
        );
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_values_are_coerced_and_logged_once() {
        let mut diagnostics = Diagnostics::new();
        assert_eq!(non_negative(f64::NAN, "tank.gallons", &mut diagnostics), 0.0);
        assert_eq!(non_negative(f64::NAN, "tank.gallons", &mut diagnostics), 0.0);
        assert_eq!(non_negative(-4.0, "filter[0].rated_gph", &mut diagnostics), 0.0);
        assert_eq!(non_negative(12.5, "tank.sump_gallons", &mut diagnostics), 12.5);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.entries()[0].code, NON_FINITE);
        assert_eq!(diagnostics.entries()[1].code, NEGATIVE);
    }

    #[test]
    fn test_negative_quantity_becomes_zero() {
        let mut diagnostics = Diagnostics::new();
        assert_eq!(quantity(-3, "neon", &mut diagnostics), 0);
        assert_eq!(quantity(6, "neon", &mut diagnostics), 6);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_optional_value_is_dropped_when_invalid() {
        let mut diagnostics = Diagnostics::new();
        assert_eq!(optional_non_negative(Some(-1.0), "tank.length_in", &mut diagnostics), None);
        assert_eq!(
            optional_non_negative(Some(36.0), "tank.length_in", &mut diagnostics),
            Some(36.0)
        );
        assert_eq!(finite_or(f64::INFINITY, 7.0, "water.ph", &mut diagnostics), 7.0);
        assert_eq!(diagnostics.len(), 2);
    }
}
