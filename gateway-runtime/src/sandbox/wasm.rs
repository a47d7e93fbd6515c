//! Wasmtime-backed sandbox for WASI preview1 plugins
//!
//! A plugin is a core WASM module exporting a single entry point
//! (`handle` by default) with signature `() -> ()`. The call input is fed to
//! the module on stdin and whatever it writes to stdout is the call output.
//! Reactor modules get their `_initialize` export called first.
//!
//! Compiled modules are linked once at load time (`InstancePre`); each call
//! then instantiates into a fresh `Store`, which is dropped when the call
//! returns, whatever the outcome.

use super::{ArtifactLayout, ExecutionUnit, Sandbox};
use crate::error::{Error, Result};
use crate::name::ToolName;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info};
use wasmtime::{Config, Engine, InstancePre, Linker, Module, Store, StoreLimits, StoreLimitsBuilder, Trap};
use wasmtime_wasi::pipe::{MemoryInputPipe, MemoryOutputPipe};
use wasmtime_wasi::preview1::{self, WasiP1Ctx};
use wasmtime_wasi::{I32Exit, WasiCtxBuilder};

const STDERR_CAPACITY: usize = 64 * 1024;

/// Configuration for [`WasmSandbox`]
#[derive(Debug, Clone)]
pub struct WasmConfig {
    /// Where plugin artifacts live
    pub layout: ArtifactLayout,
    /// Upper bound on linear memory per call
    pub max_memory_bytes: usize,
    /// Upper bound on captured stdout per call
    pub max_output_bytes: usize,
    /// Epoch tick used to enforce deadlines
    pub epoch_tick: Duration,
}

impl WasmConfig {
    /// Default limits for plugins stored under `functions_dir`
    pub fn new(functions_dir: impl Into<PathBuf>) -> Self {
        Self {
            layout: ArtifactLayout::new(functions_dir),
            max_memory_bytes: 64 * 1024 * 1024,
            max_output_bytes: 1024 * 1024,
            epoch_tick: Duration::from_millis(10),
        }
    }

    /// Set the per-call memory limit
    pub fn with_max_memory_bytes(mut self, bytes: usize) -> Self {
        self.max_memory_bytes = bytes;
        self
    }

    /// Set the per-call output limit
    pub fn with_max_output_bytes(mut self, bytes: usize) -> Self {
        self.max_output_bytes = bytes;
        self
    }
}

/// Per-call store data
struct UnitState {
    wasi: WasiP1Ctx,
    limits: StoreLimits,
}

/// Runs WASI plugins with wasmtime
pub struct WasmSandbox {
    engine: Engine,
    linker: Linker<UnitState>,
    config: WasmConfig,
    _ticker: EpochTicker,
}

impl WasmSandbox {
    /// Create the engine, link WASI preview1 and start the epoch ticker
    pub fn new(config: WasmConfig) -> Result<Self> {
        let mut engine_config = Config::new();
        engine_config.epoch_interruption(true);
        let engine = Engine::new(&engine_config)?;

        let mut linker = Linker::new(&engine);
        preview1::add_to_linker_sync(&mut linker, |state: &mut UnitState| &mut state.wasi)?;

        let ticker = EpochTicker::start(engine.clone(), config.epoch_tick)?;

        info!(
            "WASM sandbox ready, plugins under {}",
            config.layout.root().display()
        );

        Ok(Self {
            engine,
            linker,
            config,
            _ticker: ticker,
        })
    }

    /// Artifact layout in use
    pub fn layout(&self) -> &ArtifactLayout {
        &self.config.layout
    }
}

impl fmt::Debug for WasmSandbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WasmSandbox")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Sandbox for WasmSandbox {
    fn load(&self, name: &ToolName) -> Result<Arc<dyn ExecutionUnit>> {
        let path = self.config.layout.path_for(name);
        if !path.is_file() {
            return Err(Error::ArtifactNotFound {
                name: name.to_string(),
                path,
            });
        }

        debug!("Compiling plugin {} from {}", name, path.display());
        let module = Module::from_file(&self.engine, &path)
            .map_err(|e| Error::construction(name, format!("{e:#}")))?;
        let pre = self
            .linker
            .instantiate_pre(&module)
            .map_err(|e| Error::construction(name, format!("{e:#}")))?;

        Ok(Arc::new(WasmUnit {
            tool: name.clone(),
            engine: self.engine.clone(),
            pre,
            max_memory_bytes: self.config.max_memory_bytes,
            max_output_bytes: self.config.max_output_bytes,
            epoch_tick: self.config.epoch_tick,
        }))
    }
}

/// A compiled and linked plugin
struct WasmUnit {
    tool: ToolName,
    engine: Engine,
    pre: InstancePre<UnitState>,
    max_memory_bytes: usize,
    max_output_bytes: usize,
    epoch_tick: Duration,
}

impl WasmUnit {
    fn deadline_ticks(&self, deadline: Duration) -> u64 {
        let tick = self.epoch_tick.as_millis().max(1);
        let ticks = deadline.as_millis().div_ceil(tick).max(1);
        u64::try_from(ticks).unwrap_or(u64::MAX)
    }

    fn fault(&self, err: wasmtime::Error, deadline: Duration) -> Error {
        match err.downcast_ref::<Trap>() {
            Some(Trap::Interrupt) => Error::timeout(&self.tool, deadline),
            _ => Error::invocation(&self.tool, format!("{err:#}")),
        }
    }
}

impl fmt::Debug for WasmUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WasmUnit")
            .field("tool", &self.tool)
            .finish_non_exhaustive()
    }
}

impl ExecutionUnit for WasmUnit {
    fn tool(&self) -> &ToolName {
        &self.tool
    }

    fn call(&self, entry_point: &str, input: &[u8], deadline: Duration) -> Result<Vec<u8>> {
        // One spare byte tells an output of exactly the limit from a truncated one
        let stdout = MemoryOutputPipe::new(self.max_output_bytes.saturating_add(1));
        let stderr = MemoryOutputPipe::new(STDERR_CAPACITY);
        let wasi = WasiCtxBuilder::new()
            .stdin(MemoryInputPipe::new(input.to_vec()))
            .stdout(stdout.clone())
            .stderr(stderr.clone())
            .build_p1();
        let limits = StoreLimitsBuilder::new()
            .memory_size(self.max_memory_bytes)
            .build();

        let mut store = Store::new(&self.engine, UnitState { wasi, limits });
        store.limiter(|state| &mut state.limits);
        store.set_epoch_deadline(self.deadline_ticks(deadline));

        let instance = self
            .pre
            .instantiate(&mut store)
            .map_err(|e| self.fault(e, deadline))?;

        if let Some(init) = instance.get_func(&mut store, "_initialize") {
            init.typed::<(), ()>(&store)
                .and_then(|init| init.call(&mut store, ()))
                .map_err(|e| self.fault(e, deadline))?;
        }

        let entry = instance
            .get_typed_func::<(), ()>(&mut store, entry_point)
            .map_err(|e| {
                Error::invocation(&self.tool, format!("entry point '{entry_point}': {e:#}"))
            })?;

        if let Err(err) = entry.call(&mut store, ()) {
            match err.downcast_ref::<I32Exit>() {
                Some(I32Exit(0)) => {}
                Some(I32Exit(code)) => {
                    return Err(Error::invocation(
                        &self.tool,
                        format!("exited with status {code}"),
                    ));
                }
                None => return Err(self.fault(err, deadline)),
            }
        }
        drop(store);

        let diagnostics = stderr.contents();
        if !diagnostics.is_empty() {
            debug!(
                "Plugin {} stderr: {}",
                self.tool,
                String::from_utf8_lossy(&diagnostics)
            );
        }

        let output = stdout.contents();
        if output.len() > self.max_output_bytes {
            return Err(Error::invocation(
                &self.tool,
                format!("output exceeded {} bytes", self.max_output_bytes),
            ));
        }
        Ok(output.to_vec())
    }
}

/// Background thread advancing the engine epoch
struct EpochTicker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl EpochTicker {
    fn start(engine: Engine, tick: Duration) -> Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let handle = std::thread::Builder::new()
            .name("wasm-epoch".to_string())
            .spawn(move || {
                while !flag.load(Ordering::Relaxed) {
                    std::thread::sleep(tick);
                    engine.increment_epoch();
                }
            })?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }
}

impl Drop for EpochTicker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const ECHO: &str = r#"
(module
  (import "wasi_snapshot_preview1" "fd_read"
    (func $fd_read (param i32 i32 i32 i32) (result i32)))
  (import "wasi_snapshot_preview1" "fd_write"
    (func $fd_write (param i32 i32 i32 i32) (result i32)))
  (memory (export "memory") 1)
  (data (i32.const 512) "echo: ")
  (func (export "handle")
    (i32.store (i32.const 0) (i32.const 1024))
    (i32.store (i32.const 4) (i32.const 4096))
    (drop (call $fd_read (i32.const 0) (i32.const 0) (i32.const 1) (i32.const 8)))
    (i32.store (i32.const 16) (i32.const 512))
    (i32.store (i32.const 20) (i32.const 6))
    (drop (call $fd_write (i32.const 1) (i32.const 16) (i32.const 1) (i32.const 24)))
    (i32.store (i32.const 16) (i32.const 1024))
    (i32.store (i32.const 20) (i32.load (i32.const 8)))
    (drop (call $fd_write (i32.const 1) (i32.const 16) (i32.const 1) (i32.const 24)))))
"#;

    const REACTOR: &str = r#"
(module
  (import "wasi_snapshot_preview1" "fd_write"
    (func $fd_write (param i32 i32 i32 i32) (result i32)))
  (memory (export "memory") 1)
  (func (export "_initialize")
    (i32.store8 (i32.const 512) (i32.const 82)))
  (func (export "handle")
    (i32.store (i32.const 16) (i32.const 512))
    (i32.store (i32.const 20) (i32.const 1))
    (drop (call $fd_write (i32.const 1) (i32.const 16) (i32.const 1) (i32.const 24)))))
"#;

    const TRAP: &str = r#"(module (func (export "handle") unreachable))"#;

    const SPIN: &str = r#"(module (func (export "handle") (loop $spin (br $spin))))"#;

    fn exit_with(code: i32) -> String {
        format!(
            r#"(module
  (import "wasi_snapshot_preview1" "proc_exit" (func $exit (param i32)))
  (memory (export "memory") 1)
  (func (export "handle") (call $exit (i32.const {code}))))"#
        )
    }

    fn sandbox_with(plugins: &[(&str, &str)]) -> (tempfile::TempDir, WasmSandbox) {
        let dir = tempfile::tempdir().unwrap();
        for (name, source) in plugins {
            let tool_dir = dir.path().join(name);
            fs::create_dir_all(&tool_dir).unwrap();
            fs::write(tool_dir.join("plugin.wasm"), source).unwrap();
        }
        let sandbox = WasmSandbox::new(WasmConfig::new(dir.path())).unwrap();
        (dir, sandbox)
    }

    fn name(raw: &str) -> ToolName {
        ToolName::parse(raw).unwrap()
    }

    const DEADLINE: Duration = Duration::from_secs(10);

    #[test]
    fn test_echo_round_trips_input() {
        let (_dir, sandbox) = sandbox_with(&[("echo", ECHO)]);
        let unit = sandbox.load(&name("echo")).unwrap();
        assert_eq!(unit.tool().as_str(), "echo");

        let output = unit.call("handle", br#"{"name":"Bob Morane"}"#, DEADLINE).unwrap();
        assert_eq!(output, br#"echo: {"name":"Bob Morane"}"#.to_vec());
    }

    #[test]
    fn test_unit_is_reusable() {
        let (_dir, sandbox) = sandbox_with(&[("echo", ECHO)]);
        let unit = sandbox.load(&name("echo")).unwrap();

        assert_eq!(unit.call("handle", b"one", DEADLINE).unwrap(), b"echo: one".to_vec());
        assert_eq!(unit.call("handle", b"two", DEADLINE).unwrap(), b"echo: two".to_vec());
    }

    #[test]
    fn test_reactor_initialize_runs_first() {
        let (_dir, sandbox) = sandbox_with(&[("reactor", REACTOR)]);
        let unit = sandbox.load(&name("reactor")).unwrap();
        assert_eq!(unit.call("handle", b"", DEADLINE).unwrap(), b"R".to_vec());
    }

    #[test]
    fn test_missing_artifact() {
        let (_dir, sandbox) = sandbox_with(&[]);
        let err = sandbox.load(&name("absent")).unwrap_err();
        assert!(matches!(err, Error::ArtifactNotFound { .. }));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_invalid_module_fails_construction() {
        let (_dir, sandbox) = sandbox_with(&[("broken", "this is not wasm")]);
        let err = sandbox.load(&name("broken")).unwrap_err();
        assert!(matches!(err, Error::ConstructionFailed { .. }));
    }

    #[test]
    fn test_unsatisfied_import_fails_construction() {
        let source = r#"(module (import "env" "missing" (func)) (func (export "handle")))"#;
        let (_dir, sandbox) = sandbox_with(&[("needs_env", source)]);
        let err = sandbox.load(&name("needs_env")).unwrap_err();
        assert!(matches!(err, Error::ConstructionFailed { .. }));
    }

    #[test]
    fn test_trap_is_invocation_failure() {
        let (_dir, sandbox) = sandbox_with(&[("trap", TRAP)]);
        let unit = sandbox.load(&name("trap")).unwrap();
        let err = unit.call("handle", b"{}", DEADLINE).unwrap_err();
        assert!(matches!(err, Error::InvocationFailed { .. }));
    }

    #[test]
    fn test_missing_entry_point() {
        let (_dir, sandbox) = sandbox_with(&[("echo", ECHO)]);
        let unit = sandbox.load(&name("echo")).unwrap();
        let err = unit.call("run", b"{}", DEADLINE).unwrap_err();
        assert!(err.to_string().contains("entry point 'run'"));
    }

    #[test]
    fn test_exit_status() {
        let success = exit_with(0);
        let failure = exit_with(3);
        let (_dir, sandbox) = sandbox_with(&[("ok", &success), ("bad", &failure)]);

        let ok = sandbox.load(&name("ok")).unwrap();
        assert!(ok.call("handle", b"", DEADLINE).unwrap().is_empty());

        let bad = sandbox.load(&name("bad")).unwrap();
        let err = bad.call("handle", b"", DEADLINE).unwrap_err();
        assert!(err.to_string().contains("exited with status 3"));
    }

    #[test]
    fn test_spinning_plugin_hits_deadline() {
        let (_dir, sandbox) = sandbox_with(&[("spin", SPIN)]);
        let unit = sandbox.load(&name("spin")).unwrap();
        let err = unit
            .call("handle", b"", Duration::from_millis(100))
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }

    const DIGITS: &str = r#"
(module
  (import "wasi_snapshot_preview1" "fd_write"
    (func $fd_write (param i32 i32 i32 i32) (result i32)))
  (memory (export "memory") 1)
  (data (i32.const 512) "0123456789")
  (func (export "handle")
    (i32.store (i32.const 16) (i32.const 512))
    (i32.store (i32.const 20) (i32.const 10))
    (drop (call $fd_write (i32.const 1) (i32.const 16) (i32.const 1) (i32.const 24)))))
"#;

    fn digits_sandbox(max_output_bytes: usize) -> (tempfile::TempDir, WasmSandbox) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("digits")).unwrap();
        fs::write(dir.path().join("digits").join("plugin.wasm"), DIGITS).unwrap();
        let config = WasmConfig::new(dir.path()).with_max_output_bytes(max_output_bytes);
        (dir, WasmSandbox::new(config).unwrap())
    }

    #[test]
    fn test_output_over_limit_is_invocation_failure() {
        let (_dir, sandbox) = digits_sandbox(4);
        let unit = sandbox.load(&name("digits")).unwrap();
        let err = unit.call("handle", b"", DEADLINE).unwrap_err();
        assert!(matches!(err, Error::InvocationFailed { .. }));
        assert!(err.to_string().contains("output exceeded 4 bytes"));
    }

    #[test]
    fn test_output_at_limit_is_accepted() {
        let (_dir, sandbox) = digits_sandbox(10);
        let unit = sandbox.load(&name("digits")).unwrap();
        assert_eq!(unit.call("handle", b"", DEADLINE).unwrap(), b"0123456789".to_vec());
    }

    #[test]
    fn test_memory_limit_blocks_oversized_modules() {
        let source = r#"(module (memory (export "memory") 32) (func (export "handle")))"#;
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("big")).unwrap();
        fs::write(dir.path().join("big").join("plugin.wasm"), source).unwrap();
        let sandbox =
            WasmSandbox::new(WasmConfig::new(dir.path()).with_max_memory_bytes(64 * 1024)).unwrap();

        let unit = sandbox.load(&name("big")).unwrap();
        assert!(unit.call("handle", b"", DEADLINE).is_err());
    }
}
