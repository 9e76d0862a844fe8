use serde_json::{json, Value};
use shopbot_core::ImageInput;
use shopbot_judge::{LlmClient, LlmError, OpenAiClient, OpenAiConfig, Prompt};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> OpenAiClient {
    OpenAiClient::new(OpenAiConfig {
        api_key: "sk-test".to_string(),
        base_url: server.uri(),
        model: "gpt-test".to_string(),
        timeout_secs: 5,
    })
    .unwrap()
}

fn prompt(json_output: bool) -> Prompt {
    Prompt {
        version: "test-v1",
        system: "You are a test.".to_string(),
        user: "Say hi".to_string(),
        json_output,
        image: None,
        temperature: 0.0,
    }
}

fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }
        ]
    })
}

#[tokio::test]
async fn returns_trimmed_assistant_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("  {\"ok\": true}\n")))
        .expect(1)
        .mount(&server)
        .await;

    let out = client(&server).complete(&prompt(true)).await.unwrap();
    assert_eq!(out, "{\"ok\": true}");

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["model"], "gpt-test");
    assert_eq!(body["response_format"]["type"], "json_object");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["content"], "Say hi");
}

#[tokio::test]
async fn image_prompt_is_sent_as_multipart_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("a mug")))
        .mount(&server)
        .await;

    let mut p = prompt(false);
    p.image = Some(ImageInput {
        bytes: b"png".to_vec(),
        mime_type: "image/png".to_string(),
    });
    client(&server).complete(&p).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let parts = body["messages"][1]["content"].as_array().unwrap();
    assert_eq!(parts[0]["type"], "text");
    assert_eq!(parts[1]["type"], "image_url");
    assert_eq!(parts[1]["image_url"]["url"], "data:image/png;base64,cG5n");
}

#[tokio::test]
async fn rate_limit_maps_to_quota_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = client(&server).complete(&prompt(false)).await.unwrap_err();
    assert!(matches!(err, LlmError::QuotaExhausted));
}

#[tokio::test]
async fn insufficient_quota_body_maps_to_quota_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "message": "You exceeded your current quota", "type": "insufficient_quota" }
        })))
        .mount(&server)
        .await;

    let err = client(&server).complete(&prompt(false)).await.unwrap_err();
    assert!(matches!(err, LlmError::QuotaExhausted));
}

#[tokio::test]
async fn server_error_carries_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "message": "upstream overloaded" }
        })))
        .mount(&server)
        .await;

    let err = client(&server).complete(&prompt(false)).await.unwrap_err();
    match err {
        LlmError::UnexpectedStatus { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "upstream overloaded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn missing_choices_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = client(&server).complete(&prompt(false)).await.unwrap_err();
    assert!(matches!(err, LlmError::EmptyResponse));
}

#[tokio::test]
async fn non_json_success_body_is_deserialize_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let err = client(&server).complete(&prompt(false)).await.unwrap_err();
    assert!(matches!(err, LlmError::Deserialize(_)));
}
