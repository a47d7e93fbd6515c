//! Concurrent traffic against one gateway

use crate::test_utils::*;
use serde_json::json;
use std::time::{Duration, Instant};
use wasm_gateway_runtime::MockSandbox;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_calls_share_one_unit() {
    let sandbox = MockSandbox::with_demo_tools();
    sandbox.set_load_delay("say_hello", Duration::from_millis(200));
    let gateway = TestGateway::start_mock(&sandbox, GatewayOptions::default()).await;
    let client = gateway.client();

    let mut handles = Vec::new();
    for i in 0..16 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            client
                .call_tool("say_hello", json!({"name": format!("caller {i}")}))
                .await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let response = handle.await.unwrap().unwrap();
        assert!(response.text().unwrap().contains(&format!("caller {i}")));
    }
    assert_eq!(sandbox.load_count("say_hello"), 1);
    assert_eq!(sandbox.call_count("say_hello"), 16);

    gateway.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_slow_tool_does_not_block_other_tools() {
    let sandbox = MockSandbox::with_demo_tools();
    sandbox.set_call_delay("add_numbers", Duration::from_secs(2));
    let gateway = TestGateway::start_mock(&sandbox, GatewayOptions::default()).await;
    let client = gateway.client();

    let slow = {
        let client = client.clone();
        tokio::spawn(async move {
            client
                .call_tool("add_numbers", json!({"number1": 1, "number2": 2}))
                .await
        })
    };

    let observer = sandbox.clone();
    wait_for_condition(
        || {
            let observer = observer.clone();
            async move { observer.call_count("add_numbers") == 1 }
        },
        Duration::from_secs(2),
        Duration::from_millis(10),
    )
    .await
    .unwrap();

    let started = Instant::now();
    let response = client
        .call_tool("say_hello", json!({"name": "quick"}))
        .await
        .unwrap();
    assert!(!response.is_error());
    assert!(started.elapsed() < Duration::from_secs(1));

    let response = slow.await.unwrap().unwrap();
    assert!(response.text().unwrap().contains('3'));

    gateway.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mixed_load_every_request_completes() {
    let sandbox = MockSandbox::with_demo_tools();
    let gateway = TestGateway::start_mock(&sandbox, GatewayOptions::default()).await;
    let client = gateway.client();

    let mut handles = Vec::new();
    for i in 0..20i64 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            let response = match i % 3 {
                0 => client
                    .call_tool("add_numbers", json!({"number1": i, "number2": 1}))
                    .await,
                1 => client.call_tool("say_hello", json!({"name": i.to_string()})).await,
                _ => client.call_tool("missing_tool", json!({})).await,
            };
            (i, response.unwrap())
        }));
    }

    for handle in handles {
        let (i, response) = handle.await.unwrap();
        assert_eq!(response.is_error(), i % 3 == 2, "request {i}");
    }
    assert_eq!(sandbox.load_count("add_numbers"), 1);
    assert_eq!(sandbox.load_count("say_hello"), 1);

    gateway.stop().await;
}
