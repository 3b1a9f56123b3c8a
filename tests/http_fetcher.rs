//! HTTP JSON collaborator against a mock server

mod common;

use batch_fetch::{FetchError, Fetcher, HttpConfig, HttpJsonFetcher, IsRetryable};
use common::*;
use wiremock::MockServer;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn fetches_and_decodes_post() {
    let server = post_server(1).await;
    let fetcher: HttpJsonFetcher<Post> = posts_fetcher(&server);

    let post = fetcher.fetch_one(&1u32).await.unwrap();

    assert_eq!(
        post,
        Post {
            id: 1,
            title: "post 1".to_string()
        }
    );
}

#[tokio::test]
async fn untyped_fetcher_returns_json_value() {
    let server = post_server(2).await;
    let fetcher: HttpJsonFetcher = posts_fetcher(&server);

    let value = fetcher.fetch_one(&2u32).await.unwrap();

    assert_eq!(value, post_body(2));
}

#[tokio::test]
async fn not_found_is_a_status_error() {
    let server = MockServer::start().await;
    mount_status(&server, 7, 404).await;
    let fetcher: HttpJsonFetcher = posts_fetcher(&server);

    let err = fetcher.fetch_one(&7u32).await.unwrap_err();

    match &err {
        FetchError::Status { id, status } => {
            assert_eq!(id, "7");
            assert_eq!(*status, 404);
        }
        other => panic!("expected Status, got {other:?}"),
    }
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn server_error_is_retryable() {
    let server = MockServer::start().await;
    mount_status(&server, 1, 503).await;
    let fetcher: HttpJsonFetcher = posts_fetcher(&server);

    let err = fetcher.fetch_one(&1u32).await.unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;
    let fetcher: HttpJsonFetcher = posts_fetcher(&server);

    let err = fetcher.fetch_one(&1u32).await.unwrap_err();

    assert!(matches!(err, FetchError::Decode { ref id, .. } if id == "1"));
}

#[tokio::test]
async fn wrong_shape_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([1, 2])))
        .mount(&server)
        .await;
    let fetcher: HttpJsonFetcher<Post> = posts_fetcher(&server);

    let err = fetcher.fetch_one(&1u32).await.unwrap_err();

    assert!(matches!(err, FetchError::Decode { .. }));
}

#[tokio::test]
async fn string_ids_are_path_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts/hello%20world"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;
    let fetcher: HttpJsonFetcher = posts_fetcher(&server);

    let value = fetcher.fetch_one(&"hello world").await.unwrap();

    assert_eq!(value["ok"], true);
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    // Grab a free port and close it again so nothing is listening
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let config = HttpConfig {
        base_url: format!("http://127.0.0.1:{}/posts", port),
        timeout: std::time::Duration::from_secs(2),
        ..HttpConfig::default()
    };
    let fetcher: HttpJsonFetcher = HttpJsonFetcher::new(&config).unwrap();

    let err = fetcher.fetch_one(&1u32).await.unwrap_err();

    assert!(matches!(err, FetchError::Network(_)));
}
