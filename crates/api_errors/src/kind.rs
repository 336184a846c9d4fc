//! The error classification taxonomy.

use serde::{Deserialize, Serialize};

/// The class of an error, independent of its message text.
///
/// [`Kind::Other`] is the unclassified zero value. The error builder hoists a
/// wrapped error's kind into an `Other` outer layer, so the outermost error
/// always carries the most specific classification (see
/// [`ErrorBuilder::build`](crate::ErrorBuilder::build)).
///
/// Every match over `Kind` in this crate is exhaustive; adding a variant is a
/// compile-visible change everywhere it is consumed.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum Kind {
    /// Unclassified error.
    #[default]
    #[serde(rename = "other_error")]
    #[strum(serialize = "other_error")]
    Other,
    /// External I/O error such as a network failure.
    #[serde(rename = "io_error")]
    #[strum(serialize = "io_error")]
    Io,
    /// Information withheld.
    #[serde(rename = "private")]
    #[strum(serialize = "private")]
    Private,
    /// Internal error or inconsistency.
    #[serde(rename = "internal_error")]
    #[strum(serialize = "internal_error")]
    Internal,
    /// Database error.
    #[serde(rename = "database_error")]
    #[strum(serialize = "database_error")]
    Database,
    /// Resource already exists.
    #[serde(rename = "resource_already_exists")]
    #[strum(serialize = "resource_already_exists")]
    Exist,
    /// Resource does not exist.
    #[serde(rename = "resource_does_not_exist")]
    #[strum(serialize = "resource_does_not_exist")]
    NotExist,
    /// Invalid operation for this type of item.
    #[serde(rename = "invalid_operation")]
    #[strum(serialize = "invalid_operation")]
    Invalid,
    /// Input validation error.
    #[serde(rename = "input_validation_error")]
    #[strum(serialize = "input_validation_error")]
    Validation,
    /// Invalid request.
    #[serde(rename = "invalid_request_error")]
    #[strum(serialize = "invalid_request_error")]
    InvalidRequest,
    /// Permission denied.
    #[serde(rename = "permission_denied")]
    #[strum(serialize = "permission_denied")]
    Permission,
    /// The request carried no valid authentication.
    #[serde(rename = "unauthenticated_request")]
    #[strum(serialize = "unauthenticated_request")]
    Unauthenticated,
    /// The authenticated caller is not allowed to perform the operation.
    #[serde(rename = "unauthorized_request")]
    #[strum(serialize = "unauthorized_request")]
    Unauthorized,
}
