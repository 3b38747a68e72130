//! Semantic checks on a resolved snapshot.
//!
//! Type correctness is guaranteed by resolution; the [`Validator`] covers
//! everything else (allowed values, port ranges, cross-field rules). Checks
//! run in the order they were added and never short-circuit, so one run
//! reports every problem.
//!
//! ```
//! use layerfig::Validator;
//!
//! let validator = Validator::new()
//!     .one_of("log_level", &["info", "warn", "error", "debug"])
//!     .in_range("web.port", 1024, 65535);
//! # let _ = validator;
//! ```

use std::fmt;

use crate::error::LayerfigError;
use crate::snapshot::Snapshot;

/// One failed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

/// The outcome of [`Validator::validate`]. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    failures: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failures in check order.
    pub fn failures(&self) -> &[Violation] {
        &self.failures
    }

    /// `Ok(())` if valid, otherwise [`LayerfigError::ValidationFailure`].
    pub fn into_result(self) -> Result<(), LayerfigError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(LayerfigError::ValidationFailure(self))
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.failures.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  - {}: {}", v.field, v.message)?;
        }
        Ok(())
    }
}

type CheckFn = Box<dyn Fn(&Snapshot) -> Result<(), String>>;

struct Check {
    name: String,
    field: String,
    run: CheckFn,
}

/// An ordered list of named checks.
#[derive(Default)]
pub struct Validator {
    checks: Vec<Check>,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.checks.iter().map(|c| &c.name))
            .finish()
    }
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a custom check. `field` is what failures are reported against; the
    /// closure returns the failure message.
    pub fn check<F>(mut self, name: &str, field: &str, run: F) -> Self
    where
        F: Fn(&Snapshot) -> Result<(), String> + 'static,
    {
        self.checks.push(Check {
            name: name.to_string(),
            field: field.to_string(),
            run: Box::new(run),
        });
        self
    }

    /// The string at `key` must equal one of `allowed`, ignoring ASCII case.
    pub fn one_of(self, key: &str, allowed: &[&str]) -> Self {
        let owned_key = key.to_string();
        let allowed: Vec<String> = allowed.iter().map(|s| s.to_string()).collect();
        self.check(&format!("{key} one of"), key, move |snap| {
            let value = snap
                .get_str(&owned_key)
                .ok_or_else(|| "is missing or not a string".to_string())?;
            if allowed.iter().any(|a| a.eq_ignore_ascii_case(value)) {
                Ok(())
            } else {
                Err(format!(
                    "must be one of: {} (got: {value})",
                    allowed.join(", ")
                ))
            }
        })
    }

    /// The integer at `key` must lie in `[min, max]`.
    pub fn in_range(self, key: &str, min: i32, max: i32) -> Self {
        let owned_key = key.to_string();
        self.check(&format!("{key} in range"), key, move |snap| {
            let value = snap
                .get_i32(&owned_key)
                .ok_or_else(|| "is missing or not an integer".to_string())?;
            if (min..=max).contains(&value) {
                Ok(())
            } else {
                Err(format!("must be between [{min}, {max}] (got: {value})"))
            }
        })
    }

    /// Run every check against `snapshot`.
    pub fn validate(&self, snapshot: &Snapshot) -> ValidationReport {
        let failures = self
            .checks
            .iter()
            .filter_map(|check| {
                (check.run)(snapshot).err().map(|message| {
                    tracing::debug!(check = %check.name, %message, "check failed");
                    Violation {
                        field: check.field.clone(),
                        message,
                    }
                })
            })
            .collect();
        ValidationReport { failures }
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::test_schema;
    use crate::merge::Layers;
    use crate::resolve::Resolver;
    use crate::source::RawMap;
    use crate::value::RawValue;

    fn snapshot(env: &[(&str, &str)]) -> Snapshot {
        let env: RawMap = env
            .iter()
            .map(|(k, v)| (k.to_string(), RawValue::from(*v)))
            .collect();
        let layers = Layers {
            env,
            ..Default::default()
        };
        Resolver::new(test_schema()).resolve(&layers).unwrap()
    }

    #[test]
    fn empty_validator_accepts_anything() {
        let report = Validator::new().validate(&snapshot(&[]));
        assert!(report.is_valid());
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn one_of_ignores_case() {
        let v = Validator::new().one_of("host", &["localhost", "example"]);
        assert!(v.validate(&snapshot(&[("host", "LocalHost")])).is_valid());
    }

    #[test]
    fn one_of_failure_message() {
        let v = Validator::new().one_of("host", &["info", "warn", "error", "debug"]);
        let report = v.validate(&snapshot(&[("host", "verbose")]));
        assert_eq!(
            report.failures(),
            &[Violation {
                field: "host".into(),
                message: "must be one of: info, warn, error, debug (got: verbose)".into(),
            }]
        );
    }

    #[test]
    fn in_range_bounds_inclusive() {
        let v = Validator::new().in_range("port", 1024, 65535);
        assert!(v.validate(&snapshot(&[("port", "1024")])).is_valid());
        assert!(v.validate(&snapshot(&[("port", "65535")])).is_valid());

        let report = v.validate(&snapshot(&[("port", "80")]));
        assert_eq!(
            report.failures()[0].message,
            "must be between [1024, 65535] (got: 80)"
        );
    }

    #[test]
    fn all_failures_collected_in_order() {
        let v = Validator::new()
            .in_range("port", 1024, 65535)
            .one_of("host", &["a"])
            .in_range("database.pool_size", 1, 10);
        let report = v.validate(&snapshot(&[("port", "80"), ("host", "b")]));
        let fields: Vec<&str> = report.failures().iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["port", "host"]);
    }

    #[test]
    fn wrong_type_or_missing_key_is_a_failure() {
        let v = Validator::new()
            .in_range("host", 0, 1)
            .one_of("missing", &["x"]);
        let report = v.validate(&snapshot(&[]));
        assert_eq!(report.failures().len(), 2);
        assert!(report.failures()[0].message.contains("not an integer"));
    }

    #[test]
    fn custom_check() {
        let v = Validator::new().check("debug off in prod", "debug", |snap| {
            if snap.get_bool("debug") == Some(true) && snap.get_str("host") != Some("localhost") {
                Err("must be off outside localhost".into())
            } else {
                Ok(())
            }
        });
        assert!(v.validate(&snapshot(&[("debug", "true")])).is_valid());
        assert!(
            !v.validate(&snapshot(&[("debug", "true"), ("host", "prod")]))
                .is_valid()
        );
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn into_result_wraps_report() {
        let v = Validator::new().in_range("port", 1, 2);
        let err = v.validate(&snapshot(&[])).into_result().unwrap_err();
        match err {
            LayerfigError::ValidationFailure(report) => {
                assert_eq!(report.to_string(), "  - port: must be between [1, 2] (got: 8080)");
            }
            other => panic!("Expected ValidationFailure, got {other:?}"),
        }
    }
}
