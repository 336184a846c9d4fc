#![allow(clippy::unwrap_used, clippy::expect_used)]

use http_client::{HttpClientError, Method, RequestBuilder, RetryOn};
use reqwest::StatusCode;
use serde::Deserialize;
use wiremock::{
    matchers::{body_json, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    id: u64,
    name: String,
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

#[tokio::test]
async fn decodes_a_json_response_into_the_receiver() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/42"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 42,
                "name": "john"
            })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let user = RequestBuilder::new(client(), &server.uri())
        .unwrap()
        .method(Method::Get)
        .path("/users/42")
        .response_receiver::<User>()
        .build()
        .invoke()
        .await
        .unwrap();

    assert_eq!(
        user,
        Some(User {
            id: 42,
            name: "john".to_owned()
        })
    );
}

#[tokio::test]
async fn retry_budget_exhaustion_is_its_own_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(400))
        // retry limit 3 means exactly 4 attempts, no more.
        .expect(4)
        .mount(&server)
        .await;

    let err = RequestBuilder::new(client(), &server.uri())
        .unwrap()
        .path("/flaky")
        .retry_on(RetryOn::Non2xx)
        .retry_limit(3)
        .build()
        .invoke()
        .await
        .unwrap_err();

    assert_eq!(
        err.current_context(),
        &HttpClientError::RetryExceeded { attempts: 4 }
    );
}

#[tokio::test]
async fn gateway_retry_leaves_other_errors_alone() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/teapot"))
        .respond_with(ResponseTemplate::new(418))
        .expect(1)
        .mount(&server)
        .await;

    // 418 is not a gateway status, so the first response is taken as-is.
    let result = RequestBuilder::new(client(), &server.uri())
        .unwrap()
        .path("/teapot")
        .retry_on(RetryOn::GatewayErrors)
        .retry_limit(5)
        .build()
        .invoke()
        .await
        .unwrap();

    assert_eq!(result, None::<()>);
}

#[tokio::test]
async fn status_handler_short_circuits_decoding() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("this is not json"))
        .expect(1)
        .mount(&server)
        .await;

    let result = RequestBuilder::new(client(), &server.uri())
        .unwrap()
        .path("/missing")
        .response_receiver::<User>()
        .on_status(StatusCode::NOT_FOUND, |raw| {
            assert_eq!(raw.status, StatusCode::NOT_FOUND);
            assert_eq!(raw.body.as_ref(), b"this is not json");
            Ok(())
        })
        .build()
        .invoke()
        .await
        .unwrap();

    // The handler's verdict is returned directly; nothing was decoded.
    assert_eq!(result, None);
}

#[tokio::test]
async fn failing_status_handler_surfaces_its_verdict() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = RequestBuilder::new(client(), &server.uri())
        .unwrap()
        .path("/missing")
        .on_status(StatusCode::NOT_FOUND, |_raw| {
            Err(error_stack::report!(HttpClientError::StatusHandlerFailed))
        })
        .build()
        .invoke()
        .await
        .unwrap_err();

    assert_eq!(
        err.current_context(),
        &HttpClientError::StatusHandlerFailed
    );
}

#[tokio::test]
async fn undecodable_body_is_a_decode_failure_not_a_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let err = RequestBuilder::new(client(), &server.uri())
        .unwrap()
        .path("/garbled")
        .response_receiver::<User>()
        .retry_on(RetryOn::Non2xx)
        .retry_limit(3)
        .build()
        .invoke()
        .await
        .unwrap_err();

    assert_eq!(
        err.current_context(),
        &HttpClientError::ResponseDecodingFailed
    );
}

#[tokio::test]
async fn custom_decoder_overrides_builtin_decoding() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/csv"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("42,john", "text/csv"),
        )
        .mount(&server)
        .await;

    let user = RequestBuilder::new(client(), &server.uri())
        .unwrap()
        .path("/csv")
        .response_receiver::<User>()
        .decode_with(|content_type, data| {
            assert!(content_type.starts_with("text/csv"));
            let text = std::str::from_utf8(data)
                .map_err(|_| error_stack::report!(HttpClientError::ResponseDecodingFailed))?;
            let (id, name) = text
                .split_once(',')
                .ok_or_else(|| error_stack::report!(HttpClientError::ResponseDecodingFailed))?;
            Ok(User {
                id: id
                    .parse()
                    .map_err(|_| error_stack::report!(HttpClientError::ResponseDecodingFailed))?,
                name: name.to_owned(),
            })
        })
        .build()
        .invoke()
        .await
        .unwrap();

    assert_eq!(
        user,
        Some(User {
            id: 42,
            name: "john".to_owned()
        })
    );
}

#[tokio::test]
async fn base_url_and_added_query_parameters_are_merged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let base = format!("{}/search?page=1", server.uri());
    RequestBuilder::new(client(), &base)
        .unwrap()
        .query_param("limit", "10")
        .build()
        .invoke()
        .await
        .unwrap();
}

#[tokio::test]
async fn json_payload_reaches_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .and(body_json(serde_json::json!({"name": "john"})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    RequestBuilder::new(client(), &server.uri())
        .unwrap()
        .method(Method::Post)
        .path("/users")
        .json_body(&serde_json::json!({"name": "john"}))
        .unwrap()
        .build()
        .invoke()
        .await
        .unwrap();
}

#[tokio::test]
async fn transport_failures_abort_without_retrying() {
    // Nothing listens on this port; the connection is refused immediately.
    let err = RequestBuilder::new(client(), "http://127.0.0.1:1")
        .unwrap()
        .retry_on(RetryOn::Non2xx)
        .retry_limit(3)
        .build()
        .invoke()
        .await
        .unwrap_err();

    assert_eq!(err.current_context(), &HttpClientError::RequestNotSent);
}
