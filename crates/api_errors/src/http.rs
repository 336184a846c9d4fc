//! Translation of errors into HTTP status codes and JSON response bodies.

use actix_web::{
    http::{header, StatusCode},
    HttpResponse,
};
use serde::Serialize;
use tracing::error;

use crate::{
    error::{AnyError, Cause, Error},
    kind::Kind,
};

const UNKNOWN_ERROR_CODE: &str = "unknown_error";
const UNKNOWN_ERROR_MESSAGE: &str = "unknown error - please contact support";
const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// Body of a single service error. Fields are present only when non-empty.
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Canonical kind string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Short machine-readable error code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// The field the error pertains to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    /// Human-readable message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Top-level error response body: one error, or a list of field errors.
#[derive(Debug, Serialize)]
pub struct ErrResponse {
    /// A single service error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    /// Per-field validation errors.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ApiError>,
}

impl ErrResponse {
    fn single(error: ApiError) -> Self {
        Self {
            error: Some(error),
            errors: Vec::new(),
        }
    }

    fn fields(errors: Vec<ApiError>) -> Self {
        Self {
            error: None,
            errors,
        }
    }
}

/// Maps an error to its HTTP status code.
///
/// Pure and idempotent: calling it twice on the same error yields the same
/// status. Failures not produced by the structured-error machinery map to
/// `501 Not Implemented`, distinct from the `500` used for generic kinds.
pub fn status_code(err: &AnyError) -> StatusCode {
    match err {
        AnyError::App(error) => kind_status(error.kind()),
        AnyError::Opaque(_) => StatusCode::NOT_IMPLEMENTED,
    }
}

fn kind_status(kind: Kind) -> StatusCode {
    match kind {
        Kind::Validation => StatusCode::BAD_REQUEST,
        Kind::NotExist => StatusCode::NOT_FOUND,
        Kind::Invalid | Kind::InvalidRequest => StatusCode::NOT_ACCEPTABLE,
        Kind::Exist => StatusCode::CONFLICT,
        Kind::Unauthenticated => StatusCode::UNAUTHORIZED,
        Kind::Unauthorized => StatusCode::FORBIDDEN,
        Kind::Other
        | Kind::Io
        | Kind::Private
        | Kind::Internal
        | Kind::Database
        | Kind::Permission => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Renders an error into the HTTP response relayed to the caller, logging it
/// on the way out.
///
/// `None` means a handler reported a failure without an error value; it is
/// logged and answered with a bare `500`.
pub fn error_response(err: Option<&AnyError>) -> HttpResponse {
    let Some(err) = err else {
        error!(
            status = StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            "nil error - no response body sent"
        );
        return HttpResponse::InternalServerError().finish();
    };

    let error = match err {
        AnyError::App(error) => error,
        AnyError::Opaque(cause) => return unknown_error_response(cause.as_ref()),
    };

    match error.kind() {
        Kind::Validation => validation_error_response(error),
        Kind::Unauthenticated => unauthenticated_response(error),
        Kind::Unauthorized => unauthorized_response(error),
        _ => common_error_response(error),
    }
}

fn common_error_response(error: &Error) -> HttpResponse {
    error!(
        kind = %error.kind(),
        user = error.user().unwrap_or_default(),
        code = error.code().unwrap_or_default(),
        param = error.param().unwrap_or_default(),
        %error,
        "service error"
    );

    let body = match error.kind() {
        // Never leak the underlying cause text for internal failure classes.
        Kind::Internal | Kind::Database | Kind::Io => ErrResponse::single(ApiError {
            kind: Some(error.kind().to_string()),
            code: None,
            param: None,
            message: Some(INTERNAL_ERROR_MESSAGE.to_owned()),
        }),
        _ => ErrResponse::single(ApiError {
            kind: Some(error.kind().to_string()),
            code: error.code().map(ToOwned::to_owned),
            param: error.param().map(ToOwned::to_owned),
            message: non_empty(error.to_string()),
        }),
    };

    json_response(kind_status(error.kind()), &body)
}

fn validation_error_response(error: &Error) -> HttpResponse {
    let Some(Cause::Fields(fields)) = error.cause() else {
        // Construction-time misuse must not crash a live request path.
        error!("validation error without aggregated field errors");
        return HttpResponse::InternalServerError().finish();
    };

    error!(fields = fields.len(), "input validation error");

    let errors = fields
        .iter()
        .map(|field| ApiError {
            kind: None,
            code: field.code().map(ToOwned::to_owned),
            param: field.param().map(ToOwned::to_owned),
            message: non_empty(field.to_string()),
        })
        .collect();

    json_response(kind_status(error.kind()), &ErrResponse::fields(errors))
}

fn unauthenticated_response(error: &Error) -> HttpResponse {
    error!(
        realm = error.realm(),
        user = error.user().unwrap_or_default(),
        "unauthenticated request"
    );

    HttpResponse::build(kind_status(error.kind()))
        .insert_header((
            header::WWW_AUTHENTICATE,
            format!(r#"Bearer realm="{}""#, error.realm()),
        ))
        .finish()
}

fn unauthorized_response(error: &Error) -> HttpResponse {
    error!(
        realm = error.realm(),
        user = error.user().unwrap_or_default(),
        "unauthorized request"
    );

    HttpResponse::build(kind_status(error.kind())).finish()
}

fn unknown_error_response(cause: &(dyn std::error::Error + 'static)) -> HttpResponse {
    error!(error = %cause, "unknown error");

    let body = ErrResponse::single(ApiError {
        kind: None,
        code: Some(UNKNOWN_ERROR_CODE.to_owned()),
        param: None,
        message: Some(UNKNOWN_ERROR_MESSAGE.to_owned()),
    });

    json_response(StatusCode::NOT_IMPLEMENTED, &body)
}

fn json_response(status: StatusCode, body: &ErrResponse) -> HttpResponse {
    HttpResponse::build(status)
        .insert_header((header::CONTENT_TYPE, mime::APPLICATION_JSON))
        .insert_header((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .body(serde_json::to_string(body).unwrap_or_default())
}

fn non_empty(message: String) -> Option<String> {
    if message.is_empty() {
        None
    } else {
        Some(message)
    }
}
