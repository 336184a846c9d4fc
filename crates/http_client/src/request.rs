//! Request construction and the retrying invocation engine.

use std::{collections::HashMap, fmt, time::Duration};

use error_stack::{report, Report, ResultExt};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE},
    StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::{
    errors::{CustomResult, HttpClientError},
    types::{DecodeFn, Method, RawResponse, RetryOn, StatusHandlerFn},
};

/// Assembles an outbound request from composable options.
///
/// Options are applied in call order; later options of the same kind replace
/// earlier ones, except [`query_param`](Self::query_param) which accumulates.
/// Each fallible option validates its input and fails immediately.
///
/// ```no_run
/// use http_client::{Method, RequestBuilder, RetryOn};
///
/// #[derive(serde::Deserialize)]
/// struct User {
///     id: u64,
/// }
///
/// # async fn run() {
/// let user = RequestBuilder::new(reqwest::Client::new(), "https://api.example.com")
///     .unwrap()
///     .method(Method::Get)
///     .path("/users/42")
///     .response_receiver::<User>()
///     .retry_on(RetryOn::GatewayErrors)
///     .retry_limit(2)
///     .build()
///     .invoke()
///     .await
///     .unwrap();
/// # }
/// ```
pub struct RequestBuilder<T = ()> {
    client: reqwest::Client,
    url: Url,
    method: Method,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    timeout: Option<Duration>,
    retry_limit: u16,
    retry_predicates: Vec<RetryOn>,
    status_handlers: HashMap<u16, StatusHandlerFn>,
    decoder: Option<DecodeFn<T>>,
    receive: bool,
}

impl RequestBuilder {
    /// Starts a request against `base_url`, dispatched through `client`.
    ///
    /// The client is the shared transport collaborator: internally pooled,
    /// cheap to clone, and safe to reuse across concurrent requests. The
    /// request never owns it.
    ///
    /// A base URL without a scheme fails with
    /// [`HttpClientError::ProtocolRequired`], distinct from the general
    /// [`HttpClientError::UrlParsingFailed`].
    pub fn new(client: reqwest::Client, base_url: &str) -> CustomResult<Self, HttpClientError> {
        let url = Url::parse(base_url).map_err(|err| {
            let context = match err {
                url::ParseError::RelativeUrlWithoutBase => HttpClientError::ProtocolRequired,
                _ => HttpClientError::UrlParsingFailed,
            };
            Report::new(err).change_context(context)
        })?;

        Ok(Self {
            client,
            url,
            method: Method::Get,
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: None,
            timeout: None,
            retry_limit: 0,
            retry_predicates: Vec::new(),
            status_handlers: HashMap::new(),
            decoder: None,
            receive: false,
        })
    }

    /// Declares the decode target for the response body.
    ///
    /// Call before [`decode_with`](Self::decode_with); re-typing the builder
    /// resets any previously installed decoder.
    pub fn response_receiver<U: DeserializeOwned>(self) -> RequestBuilder<U> {
        RequestBuilder {
            client: self.client,
            url: self.url,
            method: self.method,
            headers: self.headers,
            query: self.query,
            body: self.body,
            timeout: self.timeout,
            retry_limit: self.retry_limit,
            retry_predicates: self.retry_predicates,
            status_handlers: self.status_handlers,
            decoder: None,
            receive: true,
        }
    }
}

impl<T> RequestBuilder<T> {
    /// Sets the HTTP method. Defaults to `GET`.
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Replaces the URL path.
    pub fn path(mut self, path: &str) -> Self {
        self.url.set_path(path);
        self
    }

    /// Adds one query parameter.
    ///
    /// Cumulative: parameters already present in the base URL and parameters
    /// added here are both preserved and merged at invoke time.
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Sets a header, replacing any earlier value for the same name.
    pub fn header(mut self, name: &str, value: &str) -> CustomResult<Self, HttpClientError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .change_context(HttpClientError::HeaderMapConstructionFailed)?;
        let value = HeaderValue::from_str(value)
            .change_context(HttpClientError::HeaderMapConstructionFailed)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Serializes `payload` as the JSON request body.
    ///
    /// Defaults the `Content-Type` header to `application/json` only when no
    /// content type was set explicitly. JSON is the only supported payload
    /// kind.
    pub fn json_body<B: Serialize>(mut self, payload: &B) -> CustomResult<Self, HttpClientError> {
        let body =
            serde_json::to_vec(payload).change_context(HttpClientError::BodySerializationFailed)?;
        self.body = Some(body);
        if !self.headers.contains_key(CONTENT_TYPE) {
            self.headers
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        Ok(self)
    }

    /// Installs a custom decoder for the raw response bytes, overriding the
    /// built-in content-type-driven decoding entirely.
    pub fn decode_with<F>(mut self, decoder: F) -> Self
    where
        F: Fn(&str, &[u8]) -> CustomResult<T, HttpClientError> + Send + Sync + 'static,
    {
        self.decoder = Some(Box::new(decoder));
        self
    }

    /// Registers `handler` for one exact status code, replacing any earlier
    /// handler for that code.
    ///
    /// The handler receives the raw response and its verdict is returned to
    /// the caller directly; no body decoding happens for handled statuses.
    pub fn on_status<F>(mut self, status: StatusCode, handler: F) -> Self
    where
        F: Fn(&RawResponse) -> CustomResult<(), HttpClientError> + Send + Sync + 'static,
    {
        self.status_handlers.insert(status.as_u16(), Box::new(handler));
        self
    }

    /// Appends a retry predicate from the fixed catalog. Predicates are OR'd.
    pub fn retry_on(mut self, predicate: RetryOn) -> Self {
        self.retry_predicates.push(predicate);
        self
    }

    /// Sets the maximum number of retries; total attempts are `limit + 1`.
    pub fn retry_limit(mut self, limit: u16) -> Self {
        self.retry_limit = limit;
        self
    }

    /// Bounds every attempt's transport dispatch to `timeout`.
    ///
    /// Unset means no deadline. Dropping the [`Request::invoke`] future is
    /// the other cancellation mechanism; both surface as transport errors and
    /// are never retried.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Finalizes the request description.
    pub fn build(self) -> Request<T> {
        Request {
            client: self.client,
            url: self.url,
            method: self.method,
            headers: self.headers,
            query: self.query,
            body: self.body,
            timeout: self.timeout,
            retry_limit: self.retry_limit,
            retry_predicates: self.retry_predicates,
            status_handlers: self.status_handlers,
            decoder: self.decoder,
            receive: self.receive,
        }
    }
}

impl<T> fmt::Debug for RequestBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("retry_limit", &self.retry_limit)
            .field("retry_predicates", &self.retry_predicates)
            .field("status_handlers", &self.status_handlers.len())
            .finish_non_exhaustive()
    }
}

/// A fully assembled request, consumed exactly once by
/// [`invoke`](Self::invoke).
pub struct Request<T = ()> {
    client: reqwest::Client,
    url: Url,
    method: Method,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    timeout: Option<Duration>,
    retry_limit: u16,
    retry_predicates: Vec<RetryOn>,
    status_handlers: HashMap<u16, StatusHandlerFn>,
    decoder: Option<DecodeFn<T>>,
    receive: bool,
}

impl<T: DeserializeOwned> Request<T> {
    /// Executes the request, driving the retry loop to completion.
    ///
    /// Consuming `self` makes the one-time query-parameter merge safe: a
    /// finished request cannot be re-sent, so parameters can never be
    /// appended twice.
    ///
    /// Transport and decode failures are fatal and returned as-is; only
    /// status-code-triggered retries consume the retry budget, and exhausting
    /// it yields [`HttpClientError::RetryExceeded`]. The decoded receiver
    /// value is returned when a receiver was declared and decoding ran;
    /// `None` when a per-status handler short-circuited or no receiver was
    /// configured.
    pub async fn invoke(self) -> CustomResult<Option<T>, HttpClientError> {
        let url = self.materialize_url();

        let mut attempt: u16 = 0;
        while attempt <= self.retry_limit {
            let response = self.dispatch(&url, attempt).await?;
            let status = response.status();

            if self
                .retry_predicates
                .iter()
                .any(|predicate| predicate.should_retry(status))
            {
                warn!(%status, attempt, "retry predicate matched, re-dispatching");
                attempt += 1;
                // The response is dropped here, releasing its connection
                // before the next dispatch.
                continue;
            }

            let headers = response.headers().clone();
            let body = response
                .bytes()
                .await
                .change_context(HttpClientError::RequestNotSent)
                .attach_printable("failed reading the response body")?;

            if let Some(handler) = self.status_handlers.get(&status.as_u16()) {
                handler(&RawResponse {
                    status,
                    headers,
                    body,
                })?;
                return Ok(None);
            }

            let content_type = headers
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default();
            return self.decode(content_type, &body);
        }

        Err(report!(HttpClientError::RetryExceeded { attempts: attempt }))
    }

    async fn dispatch(
        &self,
        url: &Url,
        attempt: u16,
    ) -> CustomResult<reqwest::Response, HttpClientError> {
        debug!(method = %self.method, url = %url, attempt, "dispatching request");

        let mut transport = self
            .client
            .request(self.method.into(), url.clone())
            .headers(self.headers.clone());
        if let Some(body) = &self.body {
            transport = transport.body(body.clone());
        }
        if let Some(timeout) = self.timeout {
            transport = transport.timeout(timeout);
        }

        transport
            .send()
            .await
            .map_err(|err| {
                let context = if err.is_timeout() {
                    HttpClientError::RequestTimedOut
                } else {
                    HttpClientError::RequestNotSent
                };
                Report::new(err).change_context(context)
            })
            .attach_printable("unable to reach the remote server")
    }

    fn decode(&self, content_type: &str, data: &[u8]) -> CustomResult<Option<T>, HttpClientError> {
        if let Some(decoder) = &self.decoder {
            return decoder(content_type, data).map(Some);
        }

        if !self.receive {
            return Ok(None);
        }

        // JSON is the only built-in decoder; unknown content types fall back
        // to it.
        serde_json::from_slice(data)
            .map(Some)
            .change_context(HttpClientError::ResponseDecodingFailed)
            .attach_printable_lazy(|| format!("content type {content_type:?}"))
    }

    fn materialize_url(&self) -> Url {
        let mut url = self.url.clone();
        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
        }
        url
    }
}

impl<T> fmt::Debug for Request<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("retry_limit", &self.retry_limit)
            .field("retry_predicates", &self.retry_predicates)
            .field("receive", &self.receive)
            .finish_non_exhaustive()
    }
}
