//! Constants shared across the crate.

/// Authentication realm reported in the `WWW-Authenticate` challenge when an
/// error does not carry one of its own.
pub const DEFAULT_REALM: &str = "restricted";
