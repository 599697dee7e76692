use calcbot::cli::Args;
use calcbot::config::{Config, FileConfig};
use calcbot::dispatch::{Dispatcher, Exchange};
use calcbot::error::{CalcError, Result};
use calcbot::providers::build_provider;
use calcbot::tools::ToolRegistry;
use clap::Parser;
use mockito::{Matcher, Server};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

async fn ask(args: &[&str], env: &[(&str, String)], prompt: &str) -> Result<Exchange> {
    let map: HashMap<String, String> = env.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
    let lookup = move |key: &str| map.get(key).cloned();

    let args = Args::parse_from(args.iter().copied());
    let config = Config::resolve(&args, &FileConfig::default(), &lookup)?;
    let settings = &config.providers[0];

    let provider = build_provider(settings, config.request_timeout())?;
    let registry = Arc::new(ToolRegistry::arithmetic()?);
    Dispatcher::new(provider, registry, config.dispatch_options(settings))
        .run(prompt)
        .await
}

#[tokio::test]
async fn test_mistral_manual_round_trip() {
    let mut server = Server::new_async().await;

    let first = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer m-key")
        .match_body(Matcher::PartialJson(json!({
            "model": "mistral-large-latest",
            "tool_choice": "any"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": "",
                        "tool_calls": [{
                            "id": "call_abc",
                            "type": "function",
                            "function": { "name": "multiply_nums", "arguments": "{\"a\": 5, \"b\": 7}" }
                        }]
                    },
                    "finish_reason": "tool_calls"
                }]
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let follow_up = server
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({ "tool_choice": "none" })),
            Matcher::Regex(r#""tool_call_id":"call_abc""#.to_string()),
            Matcher::Regex(r#""content":"35""#.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "choices": [{
                    "message": { "role": "assistant", "content": "5 times 7 is 35." },
                    "finish_reason": "stop"
                }]
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let env = [
        ("MISTRAL_API_KEY", "m-key".to_string()),
        ("MISTRAL_API_ENDPOINT", format!("{}/v1", server.url())),
    ];
    let exchange = ask(&["calcbot", "-p", "mistral"], &env, "what is 5 * 7").await.unwrap();

    assert!(exchange.answer.contains("35"));
    assert_eq!(exchange.tool_rounds, 1);
    first.assert_async().await;
    follow_up.assert_async().await;
}

#[tokio::test]
async fn test_gemini_automatic_round_trip() {
    let mut server = Server::new_async().await;
    let path = "/v1beta/models/gemini-2.5-flash:generateContent";

    let first = server
        .mock("POST", path)
        .match_header("x-goog-api-key", "g-key")
        .match_body(Matcher::PartialJson(json!({
            "toolConfig": { "functionCallingConfig": { "mode": "ANY" } }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [{
                            "functionCall": { "name": "subtract_nums", "args": { "a": 5, "b": 7 } },
                            "thoughtSignature": "sig-round-1"
                        }]
                    },
                    "finishReason": "STOP"
                }]
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let follow_up = server
        .mock("POST", path)
        .match_header("x-goog-api-key", "g-key")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({
                "toolConfig": { "functionCallingConfig": { "mode": "AUTO" } }
            })),
            Matcher::Regex(r#""response":\{"result":-2\}"#.to_string()),
            Matcher::Regex(r#""thoughtSignature":"sig-round-1""#.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "5 - 7 = -2" }] },
                    "finishReason": "STOP"
                }]
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let env = [
        ("GOOGLE_API_KEY", "g-key".to_string()),
        ("GEMINI_API_ENDPOINT", format!("{}/v1beta", server.url())),
    ];
    let exchange = ask(
        &["calcbot", "-p", "gemini", "--tool-choice", "any"],
        &env,
        "what is 5 - 7",
    )
    .await
    .unwrap();

    assert_eq!(exchange.answer, "5 - 7 = -2");
    assert_eq!(exchange.tool_rounds, 1);
    first.assert_async().await;
    follow_up.assert_async().await;
}

#[tokio::test]
async fn test_gemini_manual_follow_up_disables_tools() {
    let mut server = Server::new_async().await;
    let path = "/v1beta/models/gemini-2.5-flash:generateContent";

    let first = server
        .mock("POST", path)
        .match_body(Matcher::PartialJson(json!({
            "toolConfig": { "functionCallingConfig": { "mode": "ANY" } }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [{ "functionCall": { "id": "fc-9", "name": "add_nums", "args": { "a": 2.0, "b": 3.0 } } }]
                    }
                }]
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let follow_up = server
        .mock("POST", path)
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({
                "toolConfig": { "functionCallingConfig": { "mode": "NONE" } }
            })),
            Matcher::Regex(r#""id":"fc-9","name":"add_nums","response":\{"result":5\}"#.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "candidates": [{ "content": { "role": "model", "parts": [{ "text": "2 + 3 = 5" }] } }]
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let env = [
        ("GOOGLE_API_KEY", "g-key".to_string()),
        ("GEMINI_API_ENDPOINT", format!("{}/v1beta", server.url())),
    ];
    let exchange = ask(
        &["calcbot", "-p", "gemini", "-m", "manual", "--tool-choice", "any"],
        &env,
        "what is 2 + 3",
    )
    .await
    .unwrap();

    assert_eq!(exchange.answer, "2 + 3 = 5");
    first.assert_async().await;
    follow_up.assert_async().await;
}

#[tokio::test]
async fn test_unauthorized_is_a_provider_error() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(json!({ "message": "Unauthorized" }).to_string())
        .expect(1)
        .create_async()
        .await;

    let env = [
        ("MISTRAL_API_KEY", "wrong-key".to_string()),
        ("MISTRAL_API_ENDPOINT", format!("{}/v1", server.url())),
    ];
    let result = ask(&["calcbot", "-p", "mistral"], &env, "what is 5 * 7").await;

    match result {
        Err(CalcError::Provider { provider, status, message }) => {
            assert_eq!(provider, "mistral");
            assert_eq!(status, Some(401));
            assert_eq!(message, "Unauthorized");
        }
        other => panic!("expected provider error, got {:?}", other.map(|e| e.answer)),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_gemini_error_body_message_is_reported() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "error": { "code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT" }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let env = [
        ("GOOGLE_API_KEY", "bad".to_string()),
        ("GEMINI_API_ENDPOINT", format!("{}/v1beta", server.url())),
    ];
    let err = ask(&["calcbot", "-p", "gemini"], &env, "what is 5 - 7").await.unwrap_err();

    assert!(matches!(err, CalcError::Provider { status: Some(400), .. }));
    assert_eq!(err.to_string(), "gemini error (status 400): API key not valid");
}

#[tokio::test]
async fn test_unknown_tool_from_model_stops_the_exchange() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "tool_calls": [{
                            "id": "call_div",
                            "type": "function",
                            "function": { "name": "divide_nums", "arguments": "{\"a\": 10, \"b\": 2}" }
                        }]
                    }
                }]
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let env = [
        ("MISTRAL_API_KEY", "m-key".to_string()),
        ("MISTRAL_API_ENDPOINT", format!("{}/v1", server.url())),
    ];
    let result = ask(&["calcbot", "-p", "mistral"], &env, "what is 10 / 2").await;

    assert!(matches!(result, Err(CalcError::UnknownTool(name)) if name == "divide_nums"));
    mock.assert_async().await;
}
