use futures_util::StreamExt;
use khulnasoft::{Client, Error, Message};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> Client {
    Client::builder()
        .api_key("test-api-key")
        .base_url(server.uri())
        .build()
        .expect("client should build")
}

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "cmpl-1",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }
        ]
    })
}

#[tokio::test]
async fn test_send_normalizes_input_and_strips_padding() {
    let server = MockServer::start().await;

    let expected_request = json!({
        "model": "llama-2-13b-chat@anyscale",
        "messages": [
            {"role": "system", "content": "Answer concisely."},
            {"role": "user", "content": "What is the capital of France?"},
        ],
        "stream": false,
    });

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_json(expected_request))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(" Paris. ")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let answer = client
        .generate("What is the capital of France?")
        .system_prompt("Answer concisely.")
        .send()
        .await
        .unwrap();

    assert_eq!(answer, "Paris.");
}

#[tokio::test]
async fn test_requests_carry_the_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let answer = client.generate("ping").send().await.unwrap();

    assert_eq!(answer, "ok");
}

#[tokio::test]
async fn test_history_and_model_selection_pass_through() {
    let server = MockServer::start().await;

    let expected_request = json!({
        "model": "llama-2-70b-chat@bedrock",
        "messages": [
            {"role": "user", "content": "Hi"},
            {"role": "assistant", "content": "Hello! How can I help?"},
            {"role": "user", "content": "What did I just say?"},
        ],
        "stream": false,
    });

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_json(expected_request))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("You said hi.")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let history = vec![
        Message::user("Hi"),
        Message::assistant("Hello! How can I help?"),
        Message::user("What did I just say?"),
    ];
    let answer = client
        .generate(history)
        .model("llama-2-70b-chat")
        .provider("bedrock")
        .send()
        .await
        .unwrap();

    assert_eq!(answer, "You said hi.");
}

#[tokio::test]
async fn test_empty_system_prompt_is_not_sent() {
    let server = MockServer::start().await;

    let expected_request = json!({
        "model": "llama-2-13b-chat@anyscale",
        "messages": [{"role": "user", "content": "Hi"}],
        "stream": false,
    });

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_json(expected_request))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Hello.")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let answer = client
        .generate("Hi")
        .system_prompt("")
        .send()
        .await
        .unwrap();

    assert_eq!(answer, "Hello.");
}

#[tokio::test]
async fn test_one_client_serves_sequential_requests() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("pong")))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.generate("ping").send().await.unwrap(), "pong");
    assert_eq!(client.generate("ping again").send().await.unwrap(), "pong");
}

#[tokio::test]
async fn test_response_without_content_becomes_empty_string() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cmpl-2",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": null}, "finish_reason": "stop"}
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let answer = client.generate("hi").send().await.unwrap();

    assert_eq!(answer, "");
}

#[tokio::test]
async fn test_authentication_failures_map_to_their_variant() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "invalid api key", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let error = client.generate("hi").send().await.unwrap_err();

    match error {
        Error::Authentication(message) => assert_eq!(message, "invalid api key"),
        other => panic!("expected Error::Authentication, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_model_maps_to_internal_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"message": "model 'does-not-exist@anyscale' is not available"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let error = client
        .generate("hi")
        .model("does-not-exist")
        .send()
        .await
        .unwrap_err();

    match error {
        Error::InternalServer(message) => assert!(message.contains("does-not-exist")),
        other => panic!("expected Error::InternalServer, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unmapped_statuses_fall_back_to_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let error = client.generate("hi").send().await.unwrap_err();

    match error {
        Error::Api { status, message } => {
            assert_eq!(status, 502);
            assert_eq!(message, "bad gateway");
        }
        other => panic!("expected Error::Api, got {other:?}"),
    }
}

#[tokio::test]
async fn test_stream_yields_deltas_in_order() {
    let server = MockServer::start().await;

    let expected_request = json!({
        "model": "llama-2-13b-chat@anyscale",
        "messages": [{"role": "user", "content": "Count to three."}],
        "stream": true,
    });

    let sse = "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\",\"content\":\"one\"}}]}\n\n\
               data: {\"choices\":[{\"delta\":{\"content\":\" two\"}}]}\n\n\
               data: {\"choices\":[{\"delta\":{\"content\":\" three\"}}]}\n\n\
               data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n\
               data: [DONE]\n\n";

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_json(expected_request))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(sse)
                .insert_header("content-type", "text/event-stream")
                .insert_header("cache-control", "no-cache"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut deltas = client.generate("Count to three.").stream().await.unwrap();

    let mut collected = Vec::new();
    while let Some(delta) = deltas.next().await {
        collected.push(delta.unwrap());
    }

    assert_eq!(collected, vec!["one", " two", " three"]);
    assert_eq!(collected.concat(), "one two three");
}

#[tokio::test]
async fn test_stream_surfaces_errors_before_any_delta() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "slow down"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let error = client.generate("hi").stream().await.unwrap_err();

    match error {
        Error::RateLimit(message) => assert_eq!(message, "slow down"),
        other => panic!("expected Error::RateLimit, got {other:?}"),
    }
}
