// tests/dispatcher_tests.rs

mod common;

use common::{completion, generative_dispatcher, weather_dispatcher, GENERATE_PATH};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use weather_dispatch::{
    dispatch::{CredentialSet, Dispatcher, DispatcherState, InvalidKeyPolicy, Params, WeatherEndpoint},
    error::FailureKind,
};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn london() -> Params {
    let mut params = Params::new();
    params.insert("q".to_string(), "London".to_string());
    params
}

async fn mount_key(server: &MockServer, key: &str, response: ResponseTemplate, calls: u64) {
    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .and(query_param("key", key))
        .respond_with(response)
        .expect(calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_rate_limited_key_falls_through_to_next() {
    let server = MockServer::start().await;
    mount_key(&server, "A", ResponseTemplate::new(429), 1).await;
    mount_key(
        &server,
        "B",
        ResponseTemplate::new(200).set_body_json(json!({ "current": { "temp_c": "20.000" } })),
        1,
    )
    .await;

    let dispatcher = weather_dispatcher(&server.uri(), &["A", "B"]);
    let body = dispatcher.dispatch("current", &london()).await.unwrap();

    assert_eq!(body, json!({ "current": { "temp_c": "20.000" } }));
    assert_eq!(dispatcher.state().current_index(), 1);
}

#[tokio::test]
async fn test_pointer_persists_across_calls() {
    let server = MockServer::start().await;
    mount_key(&server, "k0", ResponseTemplate::new(500), 1).await;
    mount_key(&server, "k1", ResponseTemplate::new(401), 1).await;
    mount_key(
        &server,
        "k2",
        ResponseTemplate::new(200).set_body_json(json!({ "ok": true })),
        2,
    )
    .await;

    let dispatcher = weather_dispatcher(&server.uri(), &["k0", "k1", "k2"]);
    dispatcher.dispatch("current", &london()).await.unwrap();
    assert_eq!(dispatcher.state().current_index(), 2);

    // The second call goes straight to k2; the mock expectations verify k0/k1 are not retried.
    dispatcher.dispatch("current", &london()).await.unwrap();
    assert_eq!(dispatcher.state().current_index(), 2);
}

#[tokio::test]
async fn test_exhaustion_reports_last_failure() {
    let server = MockServer::start().await;
    mount_key(&server, "k0", ResponseTemplate::new(429), 1).await;
    mount_key(&server, "k1", ResponseTemplate::new(500), 1).await;
    mount_key(
        &server,
        "k2",
        ResponseTemplate::new(403)
            .set_body_json(json!({ "error": { "code": 403, "message": "API key disabled" } })),
        1,
    )
    .await;

    let dispatcher = weather_dispatcher(&server.uri(), &["k0", "k1", "k2"]);
    let err = dispatcher.dispatch("current", &london()).await.unwrap_err();

    assert_eq!(err.service, "weather");
    assert_eq!(err.attempts, 3);
    assert_eq!(err.kind(), FailureKind::AuthError);
    assert_eq!(err.last.key_index, 2);
    assert_eq!(err.last.status, Some(403));
    assert_eq!(err.last.message, "API key disabled");
    // Pointer wrapped back to where this call started.
    assert_eq!(dispatcher.state().current_index(), 0);
}

#[tokio::test]
async fn test_invalid_json_success_is_unknown_failure() {
    let server = MockServer::start().await;
    mount_key(&server, "A", ResponseTemplate::new(200).set_body_string("<html>"), 1).await;
    mount_key(&server, "B", ResponseTemplate::new(400), 1).await;

    let dispatcher = weather_dispatcher(&server.uri(), &["A", "B"]);
    let err = dispatcher.dispatch("current", &london()).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::BadRequest);
    assert_eq!(err.attempts, 2);
}

#[tokio::test]
async fn test_timeout_is_network_error() {
    let server = MockServer::start().await;
    mount_key(
        &server,
        "slow",
        ResponseTemplate::new(200)
            .set_body_json(json!({}))
            .set_delay(Duration::from_millis(500)),
        1,
    )
    .await;

    let credentials = CredentialSet::new(["slow"]).unwrap();
    let dispatcher = Dispatcher::new(
        reqwest::Client::new(),
        credentials,
        Arc::new(DispatcherState::new(1)),
        Arc::new(WeatherEndpoint::new(&format!("{}/v1", server.uri())).unwrap()),
        Duration::from_millis(100),
    )
    .unwrap();

    let err = dispatcher.dispatch("current", &london()).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::NetworkError);
    assert_eq!(err.last.status, None);
}

#[tokio::test]
async fn test_unreachable_host_is_network_error_and_key_is_not_leaked() {
    let dispatcher = weather_dispatcher("http://127.0.0.1:1", &["secret-key-0000", "secret-key-1111"]);
    let err = dispatcher.dispatch("current", &london()).await.unwrap_err();

    assert_eq!(err.attempts, 2);
    assert_eq!(err.kind(), FailureKind::NetworkError);
    assert!(!err.to_string().contains("secret-key"));
}

#[tokio::test]
async fn test_generative_dispatch_posts_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "g1"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "g2"))
        .and(body_partial_json(json!({
            "contents": [{ "parts": [{ "text": "Is it raining?" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("No.")))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = generative_dispatcher(&server.uri(), &["g1", "g2"]);
    let mut params = Params::new();
    params.insert("prompt".to_string(), "Is it raining?".to_string());

    let body = dispatcher.dispatch("generateContent", &params).await.unwrap();
    assert_eq!(body["candidates"][0]["content"]["parts"][0]["text"], "No.");
    assert_eq!(dispatcher.state().current_index(), 1);
}

#[tokio::test]
async fn test_skip_permanently_stops_retrying_invalid_key() {
    let server = MockServer::start().await;
    mount_key(&server, "bad", ResponseTemplate::new(401), 1).await;
    mount_key(
        &server,
        "good",
        ResponseTemplate::new(200).set_body_json(json!({ "ok": true })),
        2,
    )
    .await;

    let dispatcher = weather_dispatcher(&server.uri(), &["bad", "good"])
        .with_policy(InvalidKeyPolicy::SkipPermanently);
    dispatcher.dispatch("current", &london()).await.unwrap();
    assert!(dispatcher.state().is_disabled(0));

    dispatcher.dispatch("current", &london()).await.unwrap();
    assert_eq!(dispatcher.state().current_index(), 1);
}

#[tokio::test]
async fn test_probe_keys_reports_each_key_without_moving_pointer() {
    let server = MockServer::start().await;
    mount_key(
        &server,
        "working-key-1234",
        ResponseTemplate::new(200).set_body_json(json!({ "current": {} })),
        1,
    )
    .await;
    mount_key(&server, "revoked-key-5678", ResponseTemplate::new(401), 1).await;

    let credentials = CredentialSet::new(["working-key-1234", "revoked-key-5678"]).unwrap();
    let dispatcher = Dispatcher::new(
        reqwest::Client::new(),
        credentials,
        Arc::new(DispatcherState::starting_at(2, 1)),
        Arc::new(WeatherEndpoint::new(&format!("{}/v1", server.uri())).unwrap()),
        Duration::from_secs(5),
    )
    .unwrap();

    let report = dispatcher.probe_keys().await;
    assert_eq!(report.total, 2);
    assert_eq!(report.working, 1);
    assert_eq!(report.failed, 1);
    assert!(report.results[0].working);
    assert_eq!(report.results[0].preview, "work...1234");
    assert_eq!(
        report.results[1].failure.as_ref().map(|f| f.kind),
        Some(FailureKind::AuthError)
    );
    assert_eq!(dispatcher.state().current_index(), 1);
}

#[tokio::test]
async fn test_shared_state_is_seen_by_cloned_dispatchers() {
    let server = MockServer::start().await;
    mount_key(&server, "A", ResponseTemplate::new(429), 1).await;
    mount_key(
        &server,
        "B",
        ResponseTemplate::new(200).set_body_json(json!({})),
        2,
    )
    .await;

    let dispatcher = weather_dispatcher(&server.uri(), &["A", "B"]);
    let clone = dispatcher.clone();
    dispatcher.dispatch("current", &london()).await.unwrap();
    clone.dispatch("current", &london()).await.unwrap();
    assert_eq!(clone.state().current_index(), 1);
}

#[tokio::test]
async fn test_concurrent_dispatches_all_succeed() {
    let server = MockServer::start().await;
    mount_key(
        &server,
        "A",
        ResponseTemplate::new(200).set_body_json(json!({ "ok": true })),
        8,
    )
    .await;

    let dispatcher = weather_dispatcher(&server.uri(), &["A", "B"]);
    let calls = (0..8).map(|_| {
        let dispatcher = dispatcher.clone();
        async move { dispatcher.dispatch("current", &london()).await }
    });
    let results = futures::future::join_all(calls).await;

    assert!(results.iter().all(|r| r.as_ref().map(|v| v["ok"] == true).unwrap_or(false)));
    assert_eq!(dispatcher.state().current_index(), 0);
}
