//! Mock sandbox for testing

use super::{ExecutionUnit, Sandbox};
use crate::error::{Error, Result};
use crate::name::ToolName;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Behaviour of a mock tool: input bytes in, output bytes or failure out
pub type MockHandler = Arc<dyn Fn(&[u8]) -> std::result::Result<Vec<u8>, String> + Send + Sync>;

#[derive(Clone)]
struct MockTool {
    handler: MockHandler,
    load_delay: Duration,
    call_delay: Duration,
    broken: bool,
}

#[derive(Default)]
struct MockState {
    tools: Mutex<HashMap<String, MockTool>>,
    loads: Mutex<HashMap<String, usize>>,
    calls: Mutex<HashMap<String, usize>>,
    next_serial: AtomicUsize,
}

fn parse_args(input: &[u8]) -> std::result::Result<Value, String> {
    serde_json::from_slice(input).map_err(|e| format!("invalid arguments: {e}"))
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory sandbox
///
/// Tools are closures registered by name. Every construction and call is
/// counted so tests can assert on load policy behaviour.
#[derive(Clone, Default)]
pub struct MockSandbox {
    state: Arc<MockState>,
}

impl MockSandbox {
    /// Create an empty mock sandbox
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock sandbox preloaded with `add_numbers` and `say_hello`
    pub fn with_demo_tools() -> Self {
        let sandbox = Self::new();
        sandbox.register("add_numbers", |input| {
            let args = parse_args(input)?;
            let number = |key: &str| args.get(key).and_then(Value::as_i64).unwrap_or(0);
            let sum = number("number1") + number("number2");
            Ok(format!("🤖 result = {sum}").into_bytes())
        });
        sandbox.register("say_hello", |input| {
            let args = parse_args(input)?;
            let name = args.get("name").and_then(Value::as_str).unwrap_or_default();
            Ok(format!("🟣👋🙂 Hello {name}").into_bytes())
        });
        sandbox
    }

    /// Register a tool
    pub fn register<F>(&self, name: &str, handler: F) -> &Self
    where
        F: Fn(&[u8]) -> std::result::Result<Vec<u8>, String> + Send + Sync + 'static,
    {
        locked(&self.state.tools).insert(
            name.to_string(),
            MockTool {
                handler: Arc::new(handler),
                load_delay: Duration::ZERO,
                call_delay: Duration::ZERO,
                broken: false,
            },
        );
        self
    }

    /// Register a tool that echoes its input
    pub fn register_echo(&self, name: &str) -> &Self {
        self.register(name, |input| Ok(input.to_vec()))
    }

    /// Make construction of `name` take `delay`
    pub fn set_load_delay(&self, name: &str, delay: Duration) -> &Self {
        self.update(name, |tool| tool.load_delay = delay)
    }

    /// Make every call of `name` take `delay`
    pub fn set_call_delay(&self, name: &str, delay: Duration) -> &Self {
        self.update(name, |tool| tool.call_delay = delay)
    }

    /// Make construction of `name` fail
    pub fn set_broken(&self, name: &str, broken: bool) -> &Self {
        self.update(name, |tool| tool.broken = broken)
    }

    /// Number of units constructed for `name`
    pub fn load_count(&self, name: &str) -> usize {
        locked(&self.state.loads).get(name).copied().unwrap_or(0)
    }

    /// Number of calls made to `name`
    pub fn call_count(&self, name: &str) -> usize {
        locked(&self.state.calls).get(name).copied().unwrap_or(0)
    }

    fn update(&self, name: &str, change: impl FnOnce(&mut MockTool)) -> &Self {
        if let Some(tool) = locked(&self.state.tools).get_mut(name) {
            change(tool);
        }
        self
    }
}

impl fmt::Debug for MockSandbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tools: Vec<_> = locked(&self.state.tools).keys().cloned().collect();
        tools.sort();
        f.debug_struct("MockSandbox").field("tools", &tools).finish()
    }
}

impl Sandbox for MockSandbox {
    fn load(&self, name: &ToolName) -> Result<Arc<dyn ExecutionUnit>> {
        let tool = locked(&self.state.tools)
            .get(name.as_str())
            .cloned()
            .ok_or_else(|| Error::ArtifactNotFound {
                name: name.to_string(),
                path: PathBuf::from(format!("mock://{name}")),
            })?;

        if !tool.load_delay.is_zero() {
            std::thread::sleep(tool.load_delay);
        }
        if tool.broken {
            return Err(Error::construction(name, "mock plugin is broken"));
        }

        *locked(&self.state.loads)
            .entry(name.to_string())
            .or_insert(0) += 1;

        Ok(Arc::new(MockUnit {
            tool: name.clone(),
            serial: self.state.next_serial.fetch_add(1, Ordering::SeqCst),
            handler: tool.handler,
            call_delay: tool.call_delay,
            state: self.state.clone(),
        }))
    }
}

struct MockUnit {
    tool: ToolName,
    serial: usize,
    handler: MockHandler,
    call_delay: Duration,
    state: Arc<MockState>,
}

impl fmt::Debug for MockUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockUnit")
            .field("tool", &self.tool)
            .field("serial", &self.serial)
            .finish()
    }
}

impl ExecutionUnit for MockUnit {
    fn tool(&self) -> &ToolName {
        &self.tool
    }

    fn call(&self, _entry_point: &str, input: &[u8], deadline: Duration) -> Result<Vec<u8>> {
        *locked(&self.state.calls)
            .entry(self.tool.to_string())
            .or_insert(0) += 1;

        if !self.call_delay.is_zero() {
            if self.call_delay > deadline {
                std::thread::sleep(deadline);
                return Err(Error::timeout(&self.tool, deadline));
            }
            std::thread::sleep(self.call_delay);
        }

        (self.handler)(input).map_err(|message| Error::invocation(&self.tool, message))
    }
}
