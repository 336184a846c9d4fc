//! Error surface of the request builder and invocation engine.

/// Custom Result
/// A custom datatype that wraps the error variant <E> into a report, allowing
/// error_stack::Report<E> specific extendability
///
/// Effectively, equivalent to `Result<T, error_stack::Report<E>>`
pub type CustomResult<T, E> = error_stack::Result<T, E>;

/// Failures produced while building or invoking a request.
///
/// Transport failures (`RequestNotSent`, `RequestTimedOut`) and decode
/// failures are fatal and never retried; only status-code-triggered retries
/// consume the retry budget, and exhausting it is its own variant so callers
/// can branch on "gave up" versus "could not reach the server" versus "could
/// not parse the response".
#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum HttpClientError {
    /// The base URL could not be parsed.
    #[error("URL parsing failed")]
    UrlParsingFailed,
    /// The base URL carries no scheme; `http://` or `https://` is required.
    #[error("invalid base URL, protocol/scheme is required")]
    ProtocolRequired,
    /// A header name or value was rejected.
    #[error("header map construction failed")]
    HeaderMapConstructionFailed,
    /// The request payload could not be serialized.
    #[error("failed to serialize request payload")]
    BodySerializationFailed,
    /// The transport failed before a response was produced.
    #[error("failed to send request")]
    RequestNotSent,
    /// The transport gave up waiting for a response.
    #[error("request timed out")]
    RequestTimedOut,
    /// The response body could not be decoded into the receiver.
    #[error("failed to decode response body")]
    ResponseDecodingFailed,
    /// Every attempt was consumed by retry predicates.
    #[error("retry limit exceeded after {attempts} attempts")]
    RetryExceeded {
        /// Total number of attempts dispatched before giving up.
        attempts: u16,
    },
    /// A registered per-status handler rejected the response.
    #[error("status handler rejected the response")]
    StatusHandlerFailed,
}
