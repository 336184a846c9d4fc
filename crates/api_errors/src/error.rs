//! The structured error value, its builder, and classification predicates.

use std::fmt;

use crate::{consts, kind::Kind};

/// The cause wrapped by an [`Error`].
///
/// Exactly one cause occupies an error; it is assigned once, at build time,
/// so chain traversal always terminates.
pub enum Cause {
    /// Plain message text.
    Message(String),
    /// Another structured error, one semantic layer below this one.
    Layered(Box<Error>),
    /// Aggregated per-field validation failures.
    Fields(ValidationErrors),
    /// An opaque error produced outside this crate's machinery.
    External(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(message) => f.write_str(message),
            Self::Layered(inner) => write!(f, "{inner}"),
            Self::Fields(fields) => write!(f, "{fields}"),
            Self::External(err) => write!(f, "{err}"),
        }
    }
}

impl fmt::Debug for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(message) => f.debug_tuple("Message").field(message).finish(),
            Self::Layered(inner) => f.debug_tuple("Layered").field(inner).finish(),
            Self::Fields(fields) => f.debug_tuple("Fields").field(&fields.len()).finish(),
            Self::External(err) => f.debug_tuple("External").field(&err.to_string()).finish(),
        }
    }
}

/// A structured, chainable service error.
///
/// Carries the identity of the user attempting the operation, the error
/// [`Kind`], a short machine-readable code, the offending parameter name, the
/// authentication realm, and the wrapped cause. Every field except the kind
/// may be left unset. Values are immutable after construction; use
/// [`Error::build`] to create one.
#[derive(Debug, Default)]
pub struct Error {
    user: Option<String>,
    kind: Kind,
    code: Option<String>,
    param: Option<String>,
    realm: Option<String>,
    source: Option<Cause>,
}

impl Error {
    /// Starts building a new error.
    pub fn build() -> ErrorBuilder {
        ErrorBuilder::default()
    }

    /// The classification of this error.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Identity of the user attempting the operation, if recorded.
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Short machine-readable discriminator within the kind, if recorded.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// The field or argument name this error pertains to, if recorded.
    pub fn param(&self) -> Option<&str> {
        self.param.as_deref()
    }

    /// Authentication realm reported to unauthenticated callers.
    ///
    /// Falls back to [`consts::DEFAULT_REALM`] when none was set.
    pub fn realm(&self) -> &str {
        self.realm.as_deref().unwrap_or(consts::DEFAULT_REALM)
    }

    /// The wrapped cause, if any.
    pub fn cause(&self) -> Option<&Cause> {
        self.source.as_ref()
    }

    /// Wildcard comparison of two structured errors, intended for test
    /// assertions.
    ///
    /// Every set field of `want` (user, a kind other than [`Kind::Other`],
    /// param, code) must equal the corresponding field of `got`; unset fields
    /// are "don't care". When `want` wraps another structured error the
    /// comparison recurses on the wrapped pair; any other set cause must
    /// render to the same message as `got`'s cause.
    pub fn matches(want: &Self, got: &Self) -> bool {
        if want.user.is_some() && got.user != want.user {
            return false;
        }
        if want.kind != Kind::Other && got.kind != want.kind {
            return false;
        }
        if want.param.is_some() && got.param != want.param {
            return false;
        }
        if want.code.is_some() && got.code != want.code {
            return false;
        }
        match (&want.source, &got.source) {
            (None, _) => true,
            (Some(Cause::Layered(want_inner)), Some(Cause::Layered(got_inner))) => {
                Self::matches(want_inner, got_inner)
            }
            (Some(Cause::Layered(_)), _) => false,
            (Some(want_cause), Some(got_cause)) => {
                want_cause.to_string() == got_cause.to_string()
            }
            (Some(_), None) => false,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(cause) => write!(f, "{cause}"),
            None => Ok(()),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.source {
            Some(Cause::Layered(inner)) => Some(inner.as_ref()),
            Some(Cause::External(err)) => Some(&**err),
            _ => None,
        }
    }
}

/// Incremental builder for [`Error`].
///
/// One explicit setter exists per field; setting the same field twice keeps
/// the last value. Building with no setter ever invoked is a programming
/// error and panics.
#[derive(Debug, Default)]
pub struct ErrorBuilder {
    inner: Error,
    touched: bool,
}

impl ErrorBuilder {
    /// Sets the error classification.
    pub fn kind(mut self, kind: Kind) -> Self {
        self.inner.kind = kind;
        self.touched = true;
        self
    }

    /// Records the identity of the user attempting the operation.
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.inner.user = Some(user.into());
        self.touched = true;
        self
    }

    /// Sets the short machine-readable error code.
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.inner.code = Some(code.into());
        self.touched = true;
        self
    }

    /// Names the field or argument the error pertains to.
    pub fn param(mut self, param: impl Into<String>) -> Self {
        self.inner.param = Some(param.into());
        self.touched = true;
        self
    }

    /// Sets the authentication realm reported to unauthenticated callers.
    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.inner.realm = Some(realm.into());
        self.touched = true;
        self
    }

    /// Uses a plain message as the cause.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.inner.source = Some(Cause::Message(message.into()));
        self.touched = true;
        self
    }

    /// Wraps another structured error as the cause.
    ///
    /// Triggers the field pull-up in [`ErrorBuilder::build`].
    pub fn wrap(mut self, inner: Error) -> Self {
        self.inner.source = Some(Cause::Layered(Box::new(inner)));
        self.touched = true;
        self
    }

    /// Uses aggregated per-field validation failures as the cause.
    pub fn fields(mut self, fields: ValidationErrors) -> Self {
        self.inner.source = Some(Cause::Fields(fields));
        self.touched = true;
        self
    }

    /// Wraps an opaque external error as the cause.
    pub fn external(
        mut self,
        err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        self.inner.source = Some(Cause::External(err.into()));
        self.touched = true;
        self
    }

    /// Finalizes the error.
    ///
    /// When the cause is another structured error, hoists its classification
    /// into this layer so the outermost error carries the most specific
    /// non-default values without duplicating them below:
    ///
    /// 1. an unclassified outer kind adopts the inner kind, which is reset;
    /// 2. an inner code equal to the outer one is cleared;
    /// 3. an unset outer code is hoisted from the inner error, which is
    ///    cleared; likewise for the parameter name.
    ///
    /// # Panics
    ///
    /// Panics when no setter was ever invoked. An empty error is a contract
    /// violation at the call site, not a condition to propagate.
    pub fn build(mut self) -> Error {
        assert!(
            self.touched,
            "api_errors: Error::build() finalized with no arguments"
        );

        if let Some(Cause::Layered(prev)) = self.inner.source.as_mut() {
            if self.inner.kind == Kind::Other {
                self.inner.kind = prev.kind;
                prev.kind = Kind::Other;
            }
            if prev.code == self.inner.code {
                prev.code = None;
            }
            if self.inner.code.is_none() {
                self.inner.code = prev.code.take();
            }
            if prev.param == self.inner.param {
                prev.param = None;
            }
            if self.inner.param.is_none() {
                self.inner.param = prev.param.take();
            }
        }

        self.inner
    }
}

/// Ordered aggregate of per-field validation failures.
///
/// Entries are rendered as `"param: message"` lines in insertion order;
/// entries without a parameter name are skipped when rendering.
#[derive(Debug, Default)]
pub struct ValidationErrors(Vec<Error>);

impl ValidationErrors {
    /// Creates an empty aggregate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an already-built error.
    pub fn push(&mut self, error: Error) {
        self.0.push(error);
    }

    /// Builds an error from `builder` and appends it.
    pub fn append(&mut self, builder: ErrorBuilder) {
        self.0.push(builder.build());
    }

    /// Number of recorded failures.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no failure has been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the recorded failures in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.0.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.0 {
            let Some(param) = error.param() else {
                continue;
            };
            if !first {
                f.write_str("\n")?;
            }
            write!(f, "{param}: {error}")?;
            first = false;
        }
        Ok(())
    }
}

impl IntoIterator for ValidationErrors {
    type Item = Error;
    type IntoIter = std::vec::IntoIter<Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a Error;
    type IntoIter = std::slice::Iter<'a, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A failure surfaced at the HTTP boundary.
///
/// Either an [`Error`] produced by this crate's machinery or an opaque error
/// from elsewhere. The two are told apart by pattern matching, never by a
/// blind downcast.
#[derive(Debug)]
pub enum AnyError {
    /// A structured error.
    App(Error),
    /// A failure not produced by the structured-error machinery.
    Opaque(Box<dyn std::error::Error + Send + Sync>),
}

impl AnyError {
    /// Wraps an opaque external error.
    pub fn opaque(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Opaque(err.into())
    }
}

impl From<Error> for AnyError {
    fn from(error: Error) -> Self {
        Self::App(error)
    }
}

impl fmt::Display for AnyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::App(error) => write!(f, "{error}"),
            Self::Opaque(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for AnyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::App(error) => Some(error),
            Self::Opaque(err) => Some(&**err),
        }
    }
}

/// The [`Kind`] of `err`, or [`Kind::Other`] when the failure was not
/// produced by the structured-error machinery.
pub fn get_kind(err: &AnyError) -> Kind {
    match err {
        AnyError::App(error) => error.kind(),
        AnyError::Opaque(_) => Kind::Other,
    }
}

/// Whether `err` is a structured error of exactly the given kind.
///
/// `false` for `None` and for opaque errors.
pub fn kind_is(kind: Kind, err: Option<&AnyError>) -> bool {
    matches!(err, Some(AnyError::App(error)) if error.kind() == kind)
}
