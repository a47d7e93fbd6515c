// Integration tests for wasm-gateway-runtime: registry + executor on real wasmtime units

use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wasm_gateway_runtime::{
    Error, Executor, LoadPolicy, PluginRegistry, ToolName, WasmConfig, WasmSandbox,
};

const ECHO: &str = r#"
(module
  (import "wasi_snapshot_preview1" "fd_read"
    (func $fd_read (param i32 i32 i32 i32) (result i32)))
  (import "wasi_snapshot_preview1" "fd_write"
    (func $fd_write (param i32 i32 i32 i32) (result i32)))
  (memory (export "memory") 1)
  (func (export "handle")
    (i32.store (i32.const 0) (i32.const 1024))
    (i32.store (i32.const 4) (i32.const 4096))
    (drop (call $fd_read (i32.const 0) (i32.const 0) (i32.const 1) (i32.const 8)))
    (i32.store (i32.const 16) (i32.const 1024))
    (i32.store (i32.const 20) (i32.load (i32.const 8)))
    (drop (call $fd_write (i32.const 1) (i32.const 16) (i32.const 1) (i32.const 24)))))
"#;

const SPIN: &str = r#"(module (func (export "handle") (loop $spin (br $spin))))"#;

fn functions_dir(plugins: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, source) in plugins {
        fs::create_dir_all(dir.path().join(name)).unwrap();
        fs::write(dir.path().join(name).join("plugin.wasm"), source).unwrap();
    }
    dir
}

fn registry(dir: &tempfile::TempDir, policy: LoadPolicy) -> Arc<PluginRegistry> {
    let sandbox = WasmSandbox::new(WasmConfig::new(dir.path())).unwrap();
    Arc::new(PluginRegistry::new(Arc::new(sandbox), policy))
}

fn name(raw: &str) -> ToolName {
    ToolName::parse(raw).unwrap()
}

#[tokio::test]
async fn test_cached_unit_serves_repeated_calls() {
    let dir = functions_dir(&[("echo", ECHO)]);
    let registry = registry(&dir, LoadPolicy::Cached);
    let executor = Executor::new("handle", Duration::from_secs(10));

    for round in 0..3 {
        let lease = registry.get_or_load(&name("echo")).await.unwrap();
        let input = format!(r#"{{"round":{round}}}"#).into_bytes();
        let output = executor.invoke(&lease, input.clone()).await.unwrap();
        assert_eq!(output, input);
    }
    assert_eq!(registry.loaded_count().await, 1);
}

#[tokio::test]
async fn test_per_call_units_are_not_cached() {
    let dir = functions_dir(&[("echo", ECHO)]);
    let registry = registry(&dir, LoadPolicy::PerCall);
    let executor = Executor::new("handle", Duration::from_secs(10));

    let lease = registry.get_or_load(&name("echo")).await.unwrap();
    let output = executor.invoke(&lease, b"hi".to_vec()).await.unwrap();
    assert_eq!(output, b"hi".to_vec());
    drop(lease);

    assert_eq!(registry.loaded_count().await, 0);
}

#[tokio::test]
async fn test_missing_plugin_is_not_found() {
    let dir = functions_dir(&[]);
    let registry = registry(&dir, LoadPolicy::Cached);

    let err = registry.get_or_load(&name("add_numbers")).await.unwrap_err();
    assert!(matches!(err, Error::ArtifactNotFound { .. }));
    assert_eq!(registry.loaded_count().await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_hung_plugin_does_not_stall_other_tools() {
    let dir = functions_dir(&[("echo", ECHO), ("spin", SPIN)]);
    let registry = registry(&dir, LoadPolicy::Cached);
    let executor = Executor::new("handle", Duration::from_millis(500));

    let spinning = {
        let registry = registry.clone();
        let executor = executor.clone();
        tokio::spawn(async move {
            let lease = registry.get_or_load(&name("spin")).await.unwrap();
            executor.invoke(&lease, Vec::new()).await
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    let started = Instant::now();
    let lease = registry.get_or_load(&name("echo")).await.unwrap();
    let output = executor.invoke(&lease, b"still here".to_vec()).await.unwrap();
    assert_eq!(output, b"still here".to_vec());
    assert!(started.elapsed() < Duration::from_millis(450));

    let err = spinning.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }));
}
