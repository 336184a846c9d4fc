#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    clippy::expect_used,
    clippy::unwrap_used
)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/", "README.md"))]

pub mod errors;
mod request;
mod types;

pub use self::{
    errors::{CustomResult, HttpClientError},
    request::{Request, RequestBuilder},
    types::{DecodeFn, Method, RawResponse, RetryOn, StatusHandlerFn},
};
