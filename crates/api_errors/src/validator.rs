//! Convenience wrapper for accumulating per-field validation failures.

use std::collections::HashSet;

use crate::{
    error::{Error, ErrorBuilder, ValidationErrors},
    kind::Kind,
};

/// Accumulates validation failures, at most one per parameter name, and
/// finishes into a single [`Kind::Validation`] error.
///
/// ```
/// use api_errors::{validator::Validator, Error, Kind};
///
/// let mut v = Validator::new();
/// v.check(false, "email", Error::build().message("must not be empty"));
/// v.check(true, "name", Error::build().message("must not be empty"));
/// let err = v.finish().unwrap_err();
/// assert_eq!(err.kind(), Kind::Validation);
/// ```
#[derive(Debug, Default)]
pub struct Validator {
    seen: HashSet<String>,
    errors: ValidationErrors,
}

impl Validator {
    /// Creates an empty validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `builder` against `param` when `ok` is false.
    pub fn check(&mut self, ok: bool, param: &str, builder: ErrorBuilder) {
        if !ok {
            self.add_error(param, builder);
        }
    }

    /// Records `builder` against `param`.
    ///
    /// Only the first failure per parameter is kept; later ones for the same
    /// parameter are dropped.
    pub fn add_error(&mut self, param: &str, builder: ErrorBuilder) {
        if self.seen.insert(param.to_owned()) {
            self.errors.push(builder.param(param).build());
        }
    }

    /// Returns the aggregate validation error, or `Ok` when every check
    /// passed.
    pub fn finish(self) -> Result<(), Error> {
        if self.errors.is_empty() {
            return Ok(());
        }

        Err(Error::build()
            .kind(Kind::Validation)
            .fields(self.errors)
            .build())
    }
}
