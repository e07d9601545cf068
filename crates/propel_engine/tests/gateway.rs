use std::sync::Arc;
use std::time::Duration;

use propel_core::{GatewayFailure, GenerationRequest, IdeaRecord, CONNECTIVITY_MESSAGE};
use propel_engine::{
    CredentialProvider, FailureKind, Gateway, GatewaySettings, HttpGateway, NoCredentials,
    StaticToken,
};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request() -> GenerationRequest {
    GenerationRequest::new(
        "https://example.com/article",
        "Long enough article text about supply chains.",
        "anonymous_dev_user",
    )
    .unwrap()
}

fn gateway(endpoint: &str, timeout: Duration, credentials: Arc<dyn CredentialProvider>) -> HttpGateway {
    HttpGateway::new(
        GatewaySettings {
            endpoint: Url::parse(endpoint).unwrap(),
            connect_timeout: Duration::from_secs(2),
            request_timeout: timeout,
        },
        credentials,
    )
    .unwrap()
}

#[tokio::test]
async fn ideas_are_returned_in_order_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .and(header("Authorization", "Bearer secret-token"))
        .and(body_json(json!({
            "url": "https://example.com/article",
            "text_content": "Long enough article text about supply chains.",
            "user_id": "anonymous_dev_user",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": "Success! 2 credits remaining.",
            "ideas": [
                {"Name": "First", "Problem": "P1", "Solution": "S1"},
                {"Name": "Second", "Problem": "P2", "Solution": "S2"},
            ],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway(
        &format!("{}/generate", server.uri()),
        Duration::from_secs(5),
        Arc::new(StaticToken("secret-token".into())),
    );
    let ideas = gateway.generate(&request()).await.expect("ideas");
    let names: Vec<_> = ideas.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["First", "Second"]);
    assert_eq!(
        ideas[1],
        IdeaRecord {
            name: "Second".into(),
            problem: "P2".into(),
            solution: "S2".into(),
        }
    );
}

#[tokio::test]
async fn empty_idea_list_is_a_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ideas": []})))
        .mount(&server)
        .await;

    let gateway = gateway(&format!("{}/generate", server.uri()), Duration::from_secs(5), Arc::new(NoCredentials));
    assert_eq!(gateway.generate(&request()).await.unwrap(), Vec::new());
}

#[tokio::test]
async fn null_idea_list_is_treated_as_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "success", "ideas": null})),
        )
        .mount(&server)
        .await;

    let gateway = gateway(&format!("{}/generate", server.uri()), Duration::from_secs(5), Arc::new(NoCredentials));
    assert_eq!(gateway.generate(&request()).await.unwrap(), Vec::new());
}

#[tokio::test]
async fn server_error_detail_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "model overloaded"})))
        .mount(&server)
        .await;

    let gateway = gateway(&format!("{}/generate", server.uri()), Duration::from_secs(5), Arc::new(NoCredentials));
    let err = gateway.generate(&request()).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::HttpStatus {
            status: 500,
            detail: Some("model overloaded".into())
        }
    );
    assert_eq!(GatewayFailure::from(&err).user_message(), "model overloaded");
}

#[tokio::test]
async fn error_without_detail_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let gateway = gateway(&format!("{}/generate", server.uri()), Duration::from_secs(5), Arc::new(NoCredentials));
    let err = gateway.generate(&request()).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::HttpStatus {
            status: 502,
            detail: None
        }
    );
    assert_eq!(err.message, "request failed with status 502");
    assert_eq!(GatewayFailure::from(&err).user_message(), CONNECTIVITY_MESSAGE);
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_json(json!({"ideas": []})),
        )
        .mount(&server)
        .await;

    let gateway = gateway(&format!("{}/generate", server.uri()), Duration::from_millis(50), Arc::new(NoCredentials));
    let err = gateway.generate(&request()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
    assert_eq!(GatewayFailure::from(&err), GatewayFailure::Connectivity);
}

#[tokio::test]
async fn refused_connection_is_a_network_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let gateway = gateway(
        &format!("http://127.0.0.1:{port}/generate"),
        Duration::from_secs(2),
        Arc::new(NoCredentials),
    );
    let err = gateway.generate(&request()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Network);
}

#[tokio::test]
async fn malformed_success_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let gateway = gateway(&format!("{}/generate", server.uri()), Duration::from_secs(5), Arc::new(NoCredentials));
    let err = gateway.generate(&request()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidResponse);
}
