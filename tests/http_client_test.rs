/// Integration tests for the HTTP generation client
///
/// Each test starts a one-shot HTTP stub on a local port, points the client at
/// it and checks both what was sent and how the reply was classified.

use billcopy::contexts::{
    ClientConfig, GenerationBackend, GenerationError, GenerationOrchestrator, HttpGenerationClient,
};
use billcopy::data::{Credentials, GenerationRequest, LimitSpec, StyleRuleSet};
use billcopy::registries::StaticCredentialProvider;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Reads one request (headers plus content-length body) and returns it as text
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = socket.read(&mut chunk).await.expect("read request");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(header_end) = find(&buf, b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).to_string()
}

/// Serves a single canned response; the handle yields the raw request received
async fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {} {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            reason(status),
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.expect("write response");
        let _ = socket.shutdown().await;
        request
    });

    (format!("http://{}/v1/messages", addr), handle)
}

fn client(endpoint: String) -> HttpGenerationClient {
    HttpGenerationClient::new(ClientConfig {
        endpoint,
        model: "test-model".to_string(),
        timeout: Duration::from_secs(5),
        ..Default::default()
    })
    .expect("client")
}

#[tokio::test]
async fn test_success_returns_model_text_and_sends_headers() {
    let (endpoint, server) = serve_once(
        200,
        r#"{"id": "msg_1", "content": [{"type": "text", "text": "{\"Short\": \"A drama\"}"}]}"#,
    )
    .await;

    let text = client(endpoint)
        .invoke("Write billing copy", &Credentials::new("sk-test"))
        .await
        .unwrap();
    assert_eq!(text, r#"{"Short": "A drama"}"#);

    let request = server.await.unwrap();
    let lower = request.to_lowercase();
    assert!(request.starts_with("POST /v1/messages"));
    assert!(lower.contains("x-api-key: sk-test"));
    assert!(lower.contains("anthropic-version: 2023-06-01"));
    assert!(request.contains(r#""model":"test-model""#));
    assert!(request.contains(r#""content":"Write billing copy""#));
    assert!(request.contains(r#""max_tokens":1024"#));
}

#[tokio::test]
async fn test_unauthorized_is_authentication_rejected() {
    let (endpoint, server) = serve_once(
        401,
        r#"{"type": "error", "error": {"type": "authentication_error", "message": "invalid x-api-key"}}"#,
    )
    .await;

    let err = client(endpoint).invoke("prompt", &Credentials::new("sk-bad")).await.unwrap_err();
    server.await.unwrap();

    assert_eq!(err, GenerationError::AuthenticationRejected("401 invalid x-api-key".to_string()));
}

#[tokio::test]
async fn test_too_many_requests_is_rate_limited() {
    let (endpoint, server) = serve_once(429, r#"{"error": {"message": "slow down"}}"#).await;

    let err = client(endpoint).invoke("prompt", &Credentials::new("sk-test")).await.unwrap_err();
    server.await.unwrap();

    assert!(matches!(err, GenerationError::RateLimited(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_bad_request_is_classified() {
    let (endpoint, server) = serve_once(400, r#"{"error": {"message": "max_tokens: must be positive"}}"#).await;

    let err = client(endpoint).invoke("prompt", &Credentials::new("sk-test")).await.unwrap_err();
    server.await.unwrap();

    assert!(matches!(err, GenerationError::BadRequest(_)));
}

#[tokio::test]
async fn test_server_error_is_upstream_error() {
    let (endpoint, server) = serve_once(500, "internal failure").await;

    let err = client(endpoint).invoke("prompt", &Credentials::new("sk-test")).await.unwrap_err();
    server.await.unwrap();

    assert_eq!(err, GenerationError::UpstreamError("500 internal failure".to_string()));
}

#[tokio::test]
async fn test_timeout_is_upstream_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // Accept and then hold the connection open without answering
    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
        drop(socket);
    });

    let client = HttpGenerationClient::new(ClientConfig {
        endpoint: format!("http://{}/v1/messages", addr),
        timeout: Duration::from_millis(200),
        ..Default::default()
    })
    .unwrap();

    let err = client.invoke("prompt", &Credentials::new("sk-test")).await.unwrap_err();
    server.abort();

    match err {
        GenerationError::UpstreamError(detail) => assert!(detail.contains("timed out"), "{}", detail),
        other => panic!("Expected UpstreamError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connection_refused_is_upstream_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(format!("http://{}/v1/messages", addr))
        .invoke("prompt", &Credentials::new("sk-test"))
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::UpstreamError(_)));
}

#[tokio::test]
async fn test_full_pipeline_over_http() {
    let (endpoint, server) = serve_once(
        200,
        r#"{"content": [{"type": "text", "text": "{\"Short\": \"The quick brown fox jumps\", \"Count\": \"one two three four five\"}"}]}"#,
    )
    .await;

    let orchestrator = GenerationOrchestrator::new(
        client(endpoint),
        StaticCredentialProvider::new(Some(Credentials::new("sk-test"))),
    );
    let request = GenerationRequest::new(
        "The quick brown fox jumps over the lazy dog near the riverbank in early morning light",
        StyleRuleSet::default(),
        vec![LimitSpec::characters("Short", 20), LimitSpec::words("Count", 3)],
    );

    let result = orchestrator.generate_one(&request).await.unwrap();
    let sent = server.await.unwrap();

    assert_eq!(result.value("Short"), "The quick brown fox");
    assert_eq!(result.value("Count"), "one two three");
    assert!(sent.contains("ABSOLUTE MAXIMUM 20 characters"));
}
