//! Gateway backed by the wasmtime sandbox, with plugins compiled from WAT

use crate::test_utils::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wasm_gateway_protocol::{InputSchema, PropertySpec, Tool, ToolCatalog};
use wasm_gateway_runtime::{LoadPolicy, WasmConfig, WasmSandbox};

/// Writes "Hello " followed by whatever arrives on stdin
const GREETER: &str = r#"
(module
  (import "wasi_snapshot_preview1" "fd_read"
    (func $fd_read (param i32 i32 i32 i32) (result i32)))
  (import "wasi_snapshot_preview1" "fd_write"
    (func $fd_write (param i32 i32 i32 i32) (result i32)))
  (memory (export "memory") 1)
  (data (i32.const 512) "Hello ")
  (func (export "handle")
    (i32.store (i32.const 0) (i32.const 1024))
    (i32.store (i32.const 4) (i32.const 4096))
    (drop (call $fd_read (i32.const 0) (i32.const 0) (i32.const 1) (i32.const 8)))
    (i32.store (i32.const 16) (i32.const 512))
    (i32.store (i32.const 20) (i32.const 6))
    (i32.store (i32.const 24) (i32.const 1024))
    (i32.store (i32.const 28) (i32.load (i32.const 8)))
    (drop (call $fd_write (i32.const 1) (i32.const 16) (i32.const 2) (i32.const 40)))))
"#;

const SPIN: &str = r#"(module (func (export "handle") (loop $spin (br $spin))))"#;

const TRAP: &str = r#"(module (func (export "handle") unreachable))"#;

fn provision(dir: &Path, name: &str, source: &str) {
    fs::create_dir_all(dir.join(name)).unwrap();
    fs::write(dir.join(name).join("plugin.wasm"), source).unwrap();
}

fn catalog_of(names: &[&str]) -> ToolCatalog {
    let tools = names
        .iter()
        .map(|name| Tool {
            name: name.to_string(),
            description: format!("{name} test plugin"),
            input_schema: InputSchema::object().with_property(
                "name",
                PropertySpec::new("string", "who to greet"),
                false,
            ),
        })
        .collect();
    ToolCatalog::from_tools(tools).unwrap()
}

async fn start(dir: &Path, options: GatewayOptions) -> TestGateway {
    let sandbox = WasmSandbox::new(WasmConfig::new(dir)).unwrap();
    TestGateway::start(Arc::new(sandbox), options).await
}

#[tokio::test]
async fn test_wasm_plugin_round_trip() {
    let functions = tempfile::tempdir().unwrap();
    provision(functions.path(), "say_hello", GREETER);
    let gateway = start(functions.path(), GatewayOptions::default()).await;

    let response = gateway
        .client()
        .call_tool("say_hello", json!({"name": "Bob Morane"}))
        .await
        .unwrap();
    assert!(!response.is_error());
    assert_eq!(response.text(), Some(r#"Hello {"name":"Bob Morane"}"#));

    gateway.stop().await;
}

#[tokio::test]
async fn test_unprovisioned_catalog_tool_is_an_error_envelope() {
    let functions = tempfile::tempdir().unwrap();
    provision(functions.path(), "say_hello", GREETER);
    let gateway = start(functions.path(), GatewayOptions::default()).await;
    let client = gateway.client();

    let response = client
        .call_tool("add_numbers", json!({"number1": 1, "number2": 2}))
        .await
        .unwrap();
    assert!(response.is_error());

    // The failure stays local to that name
    let response = client
        .call_tool("say_hello", json!({"name": "Jane"}))
        .await
        .unwrap();
    assert!(!response.is_error());

    gateway.stop().await;
}

#[tokio::test]
async fn test_trapping_plugin_does_not_poison_the_gateway() {
    let functions = tempfile::tempdir().unwrap();
    provision(functions.path(), "trap", TRAP);
    provision(functions.path(), "say_hello", GREETER);
    let options = GatewayOptions {
        catalog: catalog_of(&["trap", "say_hello"]),
        ..GatewayOptions::default()
    };
    let gateway = start(functions.path(), options).await;
    let client = gateway.client();

    for _ in 0..2 {
        let response = client.call_tool("trap", json!({})).await.unwrap();
        assert!(response.is_error());
        assert!(response.text().unwrap().contains("executing the WASM function"));
    }

    let response = client
        .call_tool("say_hello", json!({"name": "after trap"}))
        .await
        .unwrap();
    assert!(response.text().unwrap().contains("after trap"));

    gateway.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_hung_plugin_times_out_without_blocking_others() {
    let functions = tempfile::tempdir().unwrap();
    provision(functions.path(), "spin", SPIN);
    provision(functions.path(), "say_hello", GREETER);
    let options = GatewayOptions {
        catalog: catalog_of(&["spin", "say_hello"]),
        timeout: Duration::from_millis(800),
        ..GatewayOptions::default()
    };
    let gateway = start(functions.path(), options).await;
    let client = gateway.client();

    let spinning = {
        let client = client.clone();
        tokio::spawn(async move { client.call_tool("spin", json!({})).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = Instant::now();
    let response = client
        .call_tool("say_hello", json!({"name": "meanwhile"}))
        .await
        .unwrap();
    assert!(!response.is_error());
    assert!(started.elapsed() < Duration::from_millis(700));

    let response = spinning.await.unwrap().unwrap();
    assert!(response.is_error());

    gateway.stop().await;
}

#[tokio::test]
async fn test_per_call_policy_with_wasm() {
    let functions = tempfile::tempdir().unwrap();
    provision(functions.path(), "say_hello", GREETER);
    let options = GatewayOptions {
        policy: LoadPolicy::PerCall,
        ..GatewayOptions::default()
    };
    let gateway = start(functions.path(), options).await;
    let client = gateway.client();

    for name in ["one", "two", "three"] {
        let response = client
            .call_tool("say_hello", json!({"name": name}))
            .await
            .unwrap();
        assert!(response.text().unwrap().contains(name));
    }

    gateway.stop().await;
}
