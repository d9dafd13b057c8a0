//! Declarative option validation.
//!
//! Options types describe their constraints as a chain of rules in
//! `Payload::validate`:
//!
//! ```
//! use doppler::validate::Validator;
//!
//! let name = String::new();
//! let result = Validator::new().required("name", &name).finish();
//! assert!(result.is_err());
//! ```
//!
//! Every rule runs; the error lists all violations rather than the first.

use crate::encode::Scalar;

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("field '{field}' failed on the '{rule}' rule")]
pub struct Violation {
    pub field: &'static str,
    pub rule: &'static str,
}

/// All violations found on one payload. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", join(.violations))]
pub struct ValidationErrors {
    violations: Vec<Violation>,
}

fn join(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Whether `field` failed any rule.
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

/// Collects rule violations for one payload.
#[derive(Debug, Default)]
pub struct Validator {
    violations: Vec<Violation>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The value must not be the zero of its type.
    pub fn required<V: Scalar + ?Sized>(self, field: &'static str, value: &V) -> Self {
        self.check(field, "required", !value.is_zero())
    }

    /// The value must equal `expected`.
    pub fn equals<V: PartialEq + ?Sized>(self, field: &'static str, value: &V, expected: &V) -> Self {
        self.check(field, "eq", value == expected)
    }

    /// The length or count must be greater than zero.
    pub fn greater_than_zero(self, field: &'static str, count: usize) -> Self {
        self.check(field, "gt=0", count > 0)
    }

    fn check(mut self, field: &'static str, rule: &'static str, ok: bool) -> Self {
        if !ok {
            self.violations.push(Violation { field, rule });
        }
        self
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors {
                violations: self.violations,
            })
        }
    }
}
