//! Shared request types: methods, retry predicates, raw responses.

use bytes::Bytes;
use reqwest::{header::HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};

use crate::errors::{CustomResult, HttpClientError};

/// HTTP method of an outbound request.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
    /// `PATCH`
    Patch,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
            Method::Patch => Self::PATCH,
        }
    }
}

/// The fixed catalog of retry predicates.
///
/// Predicates registered on a request are OR'd: any match triggers another
/// attempt, up to the configured retry limit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryOn {
    /// Retry when the response status is not a success (2xx).
    Non2xx,
    /// Retry on any client or server error (status 400 and above).
    ClientAndServerErrors,
    /// Retry on the gateway statuses 502, 503 and 504 exactly.
    GatewayErrors,
}

impl RetryOn {
    /// Whether this predicate asks for another attempt given `status`.
    pub fn should_retry(self, status: StatusCode) -> bool {
        match self {
            Self::Non2xx => !status.is_success(),
            Self::ClientAndServerErrors => status.is_client_error() || status.is_server_error(),
            Self::GatewayErrors => matches!(status.as_u16(), 502 | 503 | 504),
        }
    }
}

/// An undecoded response, handed to per-status handlers.
#[derive(Debug)]
pub struct RawResponse {
    /// Response status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Fully read response body.
    pub body: Bytes,
}

/// Handler registered for one exact status code.
///
/// Its verdict is returned to the caller directly; the engine performs no
/// body decoding for handled statuses.
pub type StatusHandlerFn =
    Box<dyn Fn(&RawResponse) -> CustomResult<(), HttpClientError> + Send + Sync>;

/// Custom decoder from `(content type, raw body)` to the receiver value,
/// overriding the built-in content-type-driven decoding entirely.
pub type DecodeFn<T> =
    Box<dyn Fn(&str, &[u8]) -> CustomResult<T, HttpClientError> + Send + Sync>;
