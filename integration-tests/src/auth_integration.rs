//! Bearer token handling over real HTTP

use crate::test_utils::*;
use serde_json::json;
use wasm_gateway_client::ClientError;
use wasm_gateway_runtime::MockSandbox;

fn with_token(token: &str) -> GatewayOptions {
    GatewayOptions {
        token: Some(token.to_string()),
        ..GatewayOptions::default()
    }
}

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let sandbox = MockSandbox::with_demo_tools();
    let gateway = TestGateway::start_mock(&sandbox, with_token("s3cret")).await;

    let response = reqwest::get(format!("{}/tools/list", gateway.url()))
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let err = gateway.client().list_tools().await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(_)));

    let err = gateway
        .client()
        .call_tool("say_hello", json!({"name": "Bob"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(_)));
    assert_eq!(sandbox.call_count("say_hello"), 0);

    gateway.stop().await;
}

#[tokio::test]
async fn test_wrong_token_is_rejected() {
    let sandbox = MockSandbox::with_demo_tools();
    let gateway = TestGateway::start_mock(&sandbox, with_token("s3cret")).await;

    let client = gateway.client().with_token("guess");
    assert!(matches!(
        client.list_tools().await,
        Err(ClientError::Unauthorized(_))
    ));

    let response = reqwest::Client::new()
        .get(format!("{}/tools/list", gateway.url()))
        .header("Authorization", "Token s3cret")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    gateway.stop().await;
}

#[tokio::test]
async fn test_correct_token_behaves_like_open_gateway() {
    let sandbox = MockSandbox::with_demo_tools();
    let open = TestGateway::start_mock(&sandbox, GatewayOptions::default()).await;
    let gated = TestGateway::start_mock(&sandbox, with_token("s3cret")).await;

    let open_client = open.client();
    let gated_client = gated.client().with_token("s3cret");

    assert_eq!(
        open_client.list_tools_raw().await.unwrap(),
        gated_client.list_tools_raw().await.unwrap()
    );

    let arguments = json!({"number1": 28, "number2": 12});
    let from_open = open_client
        .call_tool("add_numbers", arguments.clone())
        .await
        .unwrap();
    let from_gated = gated_client
        .call_tool("add_numbers", arguments)
        .await
        .unwrap();
    assert_eq!(from_open, from_gated);

    open.stop().await;
    gated.stop().await;
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let sandbox = MockSandbox::with_demo_tools();
    let gateway = TestGateway::start_mock(&sandbox, with_token("s3cret")).await;
    assert!(gateway.client().health().await.unwrap());
    gateway.stop().await;
}
