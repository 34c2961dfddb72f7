//! Small builder for collecting field-level validation failures.
//!
//! Payload validation must run to completion so the caller sees every broken
//! field at once, not just the first one.

use chrono::NaiveTime;

use crate::error::{FieldError, ServiceError, ServiceResult};

/// Accumulates [`FieldError`]s and turns them into one `Validation` error.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error for `field`.
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Requires `value` to contain at least one non-whitespace character.
    pub fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, format!("{field} wajib diisi"));
        }
    }

    /// Requires an `HH:MM:SS` clock time when the value is present.
    pub fn time_format(&mut self, field: &str, value: Option<&str>) {
        if let Some(raw) = value {
            if NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S").is_err() {
                self.push(field, format!("{field} harus berformat HH:MM:SS"));
            }
        }
    }

    /// Requires a positive value when present (weights, lengths, ages).
    pub fn positive(&mut self, field: &str, value: Option<f64>) {
        if let Some(v) = value {
            if v <= 0.0 {
                self.push(field, format!("{field} harus lebih dari 0"));
            }
        }
    }

    /// Finishes validation, failing when any error was recorded.
    pub fn finish(self) -> ServiceResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_every_failure() {
        let mut v = Validator::new();
        v.require("nama", "  ");
        v.time_format("jam", Some("25:00"));
        v.positive("berat_badan", Some(-1.0));
        let err = v.finish().expect_err("three failures expected");
        match err {
            ServiceError::Validation(fields) => assert_eq!(fields.len(), 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn passes_clean_input() {
        let mut v = Validator::new();
        v.require("nama", "Siti");
        v.time_format("jam", Some("08:00:00"));
        v.positive("berat_badan", Some(3.2));
        assert!(v.finish().is_ok());
    }

    #[test]
    fn absent_optionals_are_accepted() {
        let mut v = Validator::new();
        v.time_format("jam", None);
        v.positive("berat_badan", None);
        assert!(v.finish().is_ok());
    }
}
