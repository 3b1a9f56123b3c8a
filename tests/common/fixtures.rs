//! Mock post server fixtures

use std::time::Duration;

use batch_fetch::{HttpConfig, HttpJsonFetcher};
use serde::Deserialize;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Shape of the posts served by the mock server
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: u32,
    pub title: String,
}

/// JSON body for post `id`
pub fn post_body(id: u32) -> serde_json::Value {
    json!({ "id": id, "userId": 1, "title": format!("post {}", id), "body": "..." })
}

/// Mount `GET /posts/{id}` answering with the post after `delay_ms`
pub async fn mount_post(server: &MockServer, id: u32, delay_ms: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/posts/{}", id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(post_body(id))
                .set_delay(Duration::from_millis(delay_ms)),
        )
        .mount(server)
        .await;
}

/// Mount `GET /posts/{id}` answering with `status` and an empty JSON object
pub async fn mount_status(server: &MockServer, id: u32, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/posts/{}", id)))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({})))
        .mount(server)
        .await;
}

/// Start a server serving posts `1..=count` with no delay
pub async fn post_server(count: u32) -> MockServer {
    let server = MockServer::start().await;
    for id in 1..=count {
        mount_post(&server, id, 0).await;
    }
    server
}

/// Fetcher pointed at the mock server's `/posts` collection
pub fn posts_fetcher<T>(server: &MockServer) -> HttpJsonFetcher<T> {
    let config = HttpConfig {
        base_url: format!("{}/posts", server.uri()),
        timeout: Duration::from_secs(5),
        ..HttpConfig::default()
    };
    HttpJsonFetcher::new(&config).expect("mock server URL is valid")
}

/// Paths requested from the server, in arrival order
pub async fn requested_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|r| r.url.path().to_string())
        .collect()
}
