use serde_json::{Value, json};
use std::time::Duration;
use testforge::{
    CompletionBackend, HttpBackend, Provider, ProviderConfig, ProviderErrorKind,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(10);

fn config_for(provider: Provider, server: &MockServer) -> ProviderConfig {
    ProviderConfig::with_defaults(provider)
        .with_api_key("test-key")
        .with_endpoint(server.uri())
}

async fn sent_body(server: &MockServer) -> Value {
    let requests = server
        .received_requests()
        .await
        .expect("request recording is on by default");
    assert_eq!(requests.len(), 1);
    serde_json::from_slice(&requests[0].body).expect("json request body")
}

#[tokio::test]
async fn test_openai_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-4o-2024-08-06",
            "choices": [{"message": {"role": "assistant", "content": "```python\npass\n```"}}],
            "usage": {"prompt_tokens": 30, "completion_tokens": 5, "total_tokens": 35}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(Provider::OpenAI, &server);
    let completion = HttpBackend::new()
        .complete(&config, "write a login test", TIMEOUT)
        .await
        .expect("completion");

    assert_eq!(completion.text, "```python\npass\n```");
    assert_eq!(completion.model, "gpt-4o-2024-08-06");
    assert_eq!(completion.usage.and_then(|u| u.total_tokens), Some(35));
    assert!(completion.raw_response.contains("\"choices\""));

    let body = sent_body(&server).await;
    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["content"], "write a login test");
}

#[tokio::test]
async fn test_anthropic_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "claude-sonnet-4-5",
            "content": [{"type": "text", "text": "```java\nclass LoginTest {}\n```"}],
            "usage": {"input_tokens": 50, "output_tokens": 10}
        })))
        .mount(&server)
        .await;

    let config = config_for(Provider::Anthropic, &server);
    let completion = HttpBackend::new()
        .complete(&config, "write a login test", TIMEOUT)
        .await
        .expect("completion");
    assert_eq!(completion.text, "```java\nclass LoginTest {}\n```");

    let body = sent_body(&server).await;
    assert!(body["system"].as_str().is_some_and(|s| !s.is_empty()));
    assert_eq!(body["messages"][0]["content"], "write a login test");
}

#[tokio::test]
async fn test_google_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "```typescript\ntest('x', () => {});\n```"}]}}],
            "usageMetadata": {"promptTokenCount": 20, "candidatesTokenCount": 7}
        })))
        .mount(&server)
        .await;

    let config = config_for(Provider::Google, &server);
    let completion = HttpBackend::new()
        .complete(&config, "write a login test", TIMEOUT)
        .await
        .expect("completion");
    assert!(completion.text.contains("test('x'"));
    assert_eq!(completion.model, "gemini-2.5-flash");

    let body = sent_body(&server).await;
    let text = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default();
    assert!(text.ends_with("write a login test"));
}

#[tokio::test]
async fn test_ollama_round_trip_without_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3",
            "response": "```python\nassert True\n```",
            "done": true
        })))
        .mount(&server)
        .await;

    let config = ProviderConfig::with_defaults(Provider::Ollama).with_endpoint(server.uri());
    let completion = HttpBackend::new()
        .complete(&config, "write a login test", TIMEOUT)
        .await
        .expect("completion");
    assert_eq!(completion.text, "```python\nassert True\n```");

    let body = sent_body(&server).await;
    assert_eq!(body["stream"], false);
    assert_eq!(body["prompt"], "write a login test");
}

#[tokio::test]
async fn test_custom_accepts_plain_content_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"content": "```python\npass\n```"})),
        )
        .mount(&server)
        .await;

    let config = ProviderConfig::with_defaults(Provider::Custom)
        .with_api_key("test-key")
        .with_endpoint(format!("{}/v1", server.uri()));
    let completion = HttpBackend::new()
        .complete(&config, "write a login test", TIMEOUT)
        .await
        .expect("completion");
    assert_eq!(completion.text, "```python\npass\n```");
}

async fn failing_status(
    provider: Provider,
    route: &str,
    status: u16,
    body: &str,
) -> ProviderErrorKind {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;

    HttpBackend::new()
        .complete(&config_for(provider, &server), "prompt", TIMEOUT)
        .await
        .expect_err("error status")
        .kind
}

#[tokio::test]
async fn test_error_statuses_are_classified() {
    assert_eq!(
        failing_status(Provider::OpenAI, "/chat/completions", 401, "bad key").await,
        ProviderErrorKind::Authentication
    );
    assert_eq!(
        failing_status(Provider::OpenAI, "/chat/completions", 429, "slow down").await,
        ProviderErrorKind::RateLimit
    );
    assert_eq!(
        failing_status(Provider::Anthropic, "/messages", 529, "overloaded").await,
        ProviderErrorKind::RateLimit
    );
    assert_eq!(
        failing_status(
            Provider::Google,
            "/models/gemini-2.5-flash:generateContent",
            400,
            r#"{"error":{"details":[{"reason":"API_KEY_INVALID"}]}}"#,
        )
        .await,
        ProviderErrorKind::Authentication
    );
    assert_eq!(
        failing_status(Provider::OpenAI, "/chat/completions", 500, "boom").await,
        ProviderErrorKind::Network
    );
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"response": "late"}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let config = ProviderConfig::with_defaults(Provider::Ollama).with_endpoint(server.uri());
    let err = HttpBackend::new()
        .complete(&config, "prompt", Duration::from_millis(200))
        .await
        .expect_err("timeout");
    assert_eq!(err.kind, ProviderErrorKind::Timeout);
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let err = HttpBackend::new()
        .complete(&config_for(Provider::OpenAI, &server), "prompt", TIMEOUT)
        .await
        .expect_err("malformed");
    assert_eq!(err.kind, ProviderErrorKind::MalformedResponse);
    assert!(err.detail.contains("non-JSON"));
}

#[tokio::test]
async fn test_unexpected_json_shape_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "msg_1"})))
        .mount(&server)
        .await;

    let err = HttpBackend::new()
        .complete(&config_for(Provider::Anthropic, &server), "prompt", TIMEOUT)
        .await
        .expect_err("malformed");
    assert_eq!(err.kind, ProviderErrorKind::MalformedResponse);
}

#[tokio::test]
async fn test_unreachable_endpoint_is_network_error() {
    // Port 9 (discard) is closed on test machines
    let config =
        ProviderConfig::with_defaults(Provider::Ollama).with_endpoint("http://127.0.0.1:9");
    let err = HttpBackend::new()
        .complete(&config, "prompt", TIMEOUT)
        .await
        .expect_err("closed port");
    assert_eq!(err.kind, ProviderErrorKind::Network);
}

#[tokio::test]
async fn test_empty_prompt_is_rejected_before_sending() {
    let server = MockServer::start().await;
    let err = HttpBackend::new()
        .complete(&config_for(Provider::OpenAI, &server), "   ", TIMEOUT)
        .await
        .expect_err("empty prompt");
    assert_eq!(err.kind, ProviderErrorKind::InvalidRequest);
    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());
}
