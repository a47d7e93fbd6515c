//! End-to-end scenarios: a host discovering tools and relaying calls

use crate::test_utils::*;
use serde_json::{Value, json};
use wasm_gateway_client::ClientError;
use wasm_gateway_protocol::{JSON_CONTENT_TYPE, translate};
use wasm_gateway_runtime::{LoadPolicy, MockSandbox};

#[tokio::test]
async fn test_list_tools_returns_shipped_catalog() {
    let sandbox = MockSandbox::with_demo_tools();
    let gateway = TestGateway::start_mock(&sandbox, GatewayOptions::default()).await;

    let response = reqwest::get(format!("{}/tools/list", gateway.url()))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        JSON_CONTENT_TYPE
    );
    assert_eq!(&response.bytes().await.unwrap()[..], SHIPPED_CATALOG);

    let catalog = gateway.client().list_tools().await.unwrap();
    let names: Vec<_> = catalog.result.tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["add_numbers", "say_hello"]);

    gateway.stop().await;
}

#[tokio::test]
async fn test_host_flow_discover_translate_call() {
    let sandbox = MockSandbox::with_demo_tools();
    let gateway = TestGateway::start_mock(&sandbox, GatewayOptions::default()).await;
    let client = gateway.client();

    let functions = client.function_tools().await.unwrap();
    assert_eq!(functions.len(), 2);
    assert!(functions.iter().all(|f| f.kind == "function"));
    assert_eq!(functions[0].function.name, "add_numbers");
    assert_eq!(functions[0].function.parameters.required, ["number1", "number2"]);

    // A model picking the first function with these arguments
    let response = client
        .call_tool(
            &functions[0].function.name,
            json!({"number1": 28, "number2": 12}),
        )
        .await
        .unwrap();
    assert!(!response.is_error());
    assert!(response.text().unwrap().contains("40"));

    let response = client
        .call_tool("say_hello", json!({"name": "Bob Morane"}))
        .await
        .unwrap();
    assert!(response.text().unwrap().contains("Bob Morane"));

    gateway.stop().await;
}

#[tokio::test]
async fn test_translation_over_the_wire_is_deterministic() {
    let sandbox = MockSandbox::with_demo_tools();
    let gateway = TestGateway::start_mock(&sandbox, GatewayOptions::default()).await;
    let client = gateway.client();

    let first = client.function_tools_json().await.unwrap();
    let second = client.function_tools_json().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first, translate(SHIPPED_CATALOG).unwrap());

    let parsed: Value = serde_json::from_slice(&first).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 2);

    gateway.stop().await;
}

#[tokio::test]
async fn test_failures_come_back_as_error_envelopes() {
    let sandbox = MockSandbox::with_demo_tools();
    let gateway = TestGateway::start_mock(&sandbox, GatewayOptions::default()).await;
    let client = gateway.client();

    let response = client
        .call_tool("does_not_exist", json!({}))
        .await
        .unwrap();
    assert!(response.is_error());

    let raw = reqwest::Client::new()
        .post(format!("{}/tools/call", gateway.url()))
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(raw.status(), 400);
    let body: Value = raw.json().await.unwrap();
    assert_eq!(body["result"]["isError"], json!(true));
    assert_eq!(body["result"]["content"][0]["type"], json!("text"));

    gateway.stop().await;
}

#[tokio::test]
async fn test_per_call_policy_end_to_end() {
    let sandbox = MockSandbox::with_demo_tools();
    let options = GatewayOptions {
        policy: LoadPolicy::PerCall,
        ..GatewayOptions::default()
    };
    let gateway = TestGateway::start_mock(&sandbox, options).await;
    let client = gateway.client();

    for _ in 0..3 {
        let response = client
            .call_tool("say_hello", json!({"name": "Jane"}))
            .await
            .unwrap();
        assert!(!response.is_error());
    }
    assert_eq!(sandbox.load_count("say_hello"), 3);

    gateway.stop().await;
}

#[tokio::test]
async fn test_health_and_shutdown() {
    let sandbox = MockSandbox::with_demo_tools();
    let gateway = TestGateway::start_mock(&sandbox, GatewayOptions::default()).await;
    let client = gateway.client();
    assert!(client.health().await.unwrap());

    let url = gateway.url();
    gateway.stop().await;

    let client = wasm_gateway_client::GatewayClient::new(url).unwrap();
    assert!(matches!(
        client.list_tools().await,
        Err(ClientError::Http(_))
    ));
}
