#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    clippy::expect_used,
    clippy::unwrap_used
)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/", "README.md"))]

pub mod consts;
mod error;
pub mod http;
mod kind;
pub mod validator;

pub use self::{
    error::{get_kind, kind_is, AnyError, Cause, Error, ErrorBuilder, ValidationErrors},
    kind::Kind,
};
