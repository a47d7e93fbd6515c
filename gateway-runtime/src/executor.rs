//! Execution adapter: runs a leased unit's entry point

use crate::error::{Error, Result};
use crate::registry::UnitLease;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Grace period on top of the plugin deadline before the adapter gives up
/// on the worker thread
const BACKSTOP_GRACE: Duration = Duration::from_secs(1);

/// Invokes units on the blocking pool under a per-call deadline
///
/// The adapter only reports failures of the execution mechanism. A plugin
/// that runs to completion and reports an application error in its own
/// output is a success from the adapter's point of view.
#[derive(Debug, Clone)]
pub struct Executor {
    entry_point: Arc<str>,
    timeout: Duration,
}

impl Executor {
    /// Create an executor calling `entry_point` with the given deadline
    pub fn new(entry_point: impl Into<Arc<str>>, timeout: Duration) -> Self {
        Self {
            entry_point: entry_point.into(),
            timeout,
        }
    }

    /// Entry point name
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Per-call deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the unit once with `input`
    pub async fn invoke(&self, lease: &UnitLease, input: Vec<u8>) -> Result<Vec<u8>> {
        let unit = lease.unit().clone();
        let tool = lease.tool().clone();
        let entry_point = self.entry_point.clone();
        let deadline = self.timeout;

        debug!("Invoking {}::{} with {} bytes", tool, entry_point, input.len());

        let task = tokio::task::spawn_blocking(move || unit.call(&entry_point, &input, deadline));

        let result = match tokio::time::timeout(deadline + BACKSTOP_GRACE, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(Error::invocation(
                &tool,
                format!("execution task failed: {join}"),
            )),
            Err(_) => Err(Error::timeout(&tool, deadline)),
        };

        match &result {
            Ok(output) => debug!("{} returned {} bytes", tool, output.len()),
            Err(err) => error!("{} failed: {}", tool, err),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::ToolName;
    use crate::registry::{LoadPolicy, PluginRegistry};
    use crate::sandbox::mock::MockSandbox;

    async fn lease(sandbox: &MockSandbox, tool: &str) -> UnitLease {
        PluginRegistry::new(Arc::new(sandbox.clone()), LoadPolicy::PerCall)
            .get_or_load(&ToolName::parse(tool).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_invoke_passes_bytes_through() {
        let sandbox = MockSandbox::new();
        sandbox.register("bytes", |_| Ok(vec![0xff, 0x00, 0xfe]));
        let executor = Executor::new("handle", Duration::from_secs(5));

        let unit = lease(&sandbox, "bytes").await;
        let output = executor.invoke(&unit, b"{}".to_vec()).await.unwrap();
        assert_eq!(output, vec![0xff, 0x00, 0xfe]);
        assert_eq!(executor.entry_point(), "handle");
    }

    #[tokio::test]
    async fn test_application_error_is_not_adapter_error() {
        let sandbox = MockSandbox::new();
        sandbox.register("reports_error", |_| {
            Ok(br#"{"isError": true, "message": "bad input"}"#.to_vec())
        });
        let executor = Executor::new("handle", Duration::from_secs(5));

        let unit = lease(&sandbox, "reports_error").await;
        assert!(executor.invoke(&unit, b"{}".to_vec()).await.is_ok());
    }

    #[tokio::test]
    async fn test_plugin_failure_is_invocation_error() {
        let sandbox = MockSandbox::new();
        sandbox.register("fails", |_| Err("trap: unreachable".to_string()));
        let executor = Executor::new("handle", Duration::from_secs(5));

        let unit = lease(&sandbox, "fails").await;
        let err = executor.invoke(&unit, b"{}".to_vec()).await.unwrap_err();
        assert!(matches!(err, Error::InvocationFailed { .. }));
        assert!(err.to_string().contains("unreachable"));
    }

    #[tokio::test]
    async fn test_deadline_expiry_is_timeout() {
        let sandbox = MockSandbox::new();
        sandbox.register_echo("sleepy");
        sandbox.set_call_delay("sleepy", Duration::from_secs(5));
        let executor = Executor::new("handle", Duration::from_millis(100));

        let unit = lease(&sandbox, "sleepy").await;
        let err = executor.invoke(&unit, b"{}".to_vec()).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_demo_tools() {
        let sandbox = MockSandbox::with_demo_tools();
        let executor = Executor::new("handle", Duration::from_secs(5));

        let add = lease(&sandbox, "add_numbers").await;
        let output = executor
            .invoke(&add, br#"{"number1":28,"number2":12}"#.to_vec())
            .await
            .unwrap();
        assert!(String::from_utf8(output).unwrap().contains("40"));

        let hello = lease(&sandbox, "say_hello").await;
        let output = executor
            .invoke(&hello, br#"{"name":"Bob Morane"}"#.to_vec())
            .await
            .unwrap();
        assert!(String::from_utf8(output).unwrap().contains("Bob Morane"));
    }
}
