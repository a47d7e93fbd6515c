//! Plugin registry
//!
//! Maps tool names to constructed [`ExecutionUnit`]s. Under the cached
//! policy each name owns a construction slot; the map lock is only held to
//! find or create that slot, and construction happens inside the slot. Two
//! requests racing to load the same name therefore build it once and share
//! the result, while loads of different names never wait on each other.

use crate::error::{Error, Result};
use crate::name::ToolName;
use crate::sandbox::{ExecutionUnit, Sandbox};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

/// When units are constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    /// Construct once per name and reuse across calls
    #[default]
    Cached,
    /// Construct a fresh unit for every call and drop it afterwards
    PerCall,
}

impl FromStr for LoadPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cached" => Ok(Self::Cached),
            "per-call" | "per_call" | "percall" => Ok(Self::PerCall),
            other => Err(format!(
                "unknown plugin policy '{other}', expected 'cached' or 'per-call'"
            )),
        }
    }
}

impl fmt::Display for LoadPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cached => f.write_str("cached"),
            Self::PerCall => f.write_str("per-call"),
        }
    }
}

/// A unit handed out by the registry for one call
///
/// Dropping the lease releases the caller's hold on the unit. Per-call units
/// are destroyed at that point; cached units stay in the registry.
pub struct UnitLease {
    unit: Arc<dyn ExecutionUnit>,
    policy: LoadPolicy,
}

impl UnitLease {
    /// The leased unit
    pub fn unit(&self) -> &Arc<dyn ExecutionUnit> {
        &self.unit
    }

    /// Tool the unit belongs to
    pub fn tool(&self) -> &ToolName {
        self.unit.tool()
    }

    /// Policy the lease was issued under
    pub fn policy(&self) -> LoadPolicy {
        self.policy
    }
}

impl fmt::Debug for UnitLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitLease")
            .field("unit", &self.unit)
            .field("policy", &self.policy)
            .finish()
    }
}

impl Drop for UnitLease {
    fn drop(&mut self) {
        if self.policy == LoadPolicy::PerCall {
            debug!("Releasing per-call unit for {}", self.unit.tool());
        }
    }
}

type Slot = Arc<OnceCell<Arc<dyn ExecutionUnit>>>;

/// Concurrency-safe store of loaded plugins
pub struct PluginRegistry {
    sandbox: Arc<dyn Sandbox>,
    policy: LoadPolicy,
    slots: Mutex<HashMap<ToolName, Slot>>,
}

impl PluginRegistry {
    /// Create an empty registry
    pub fn new(sandbox: Arc<dyn Sandbox>, policy: LoadPolicy) -> Self {
        info!("Plugin registry using {} policy", policy);
        Self {
            sandbox,
            policy,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Policy in effect
    pub fn policy(&self) -> LoadPolicy {
        self.policy
    }

    /// Get the unit for `name`, constructing it if needed
    pub async fn get_or_load(&self, name: &ToolName) -> Result<UnitLease> {
        let unit = match self.policy {
            LoadPolicy::PerCall => self.construct(name).await?,
            LoadPolicy::Cached => self.get_or_load_cached(name).await?,
        };

        Ok(UnitLease {
            unit,
            policy: self.policy,
        })
    }

    async fn get_or_load_cached(&self, name: &ToolName) -> Result<Arc<dyn ExecutionUnit>> {
        let slot = {
            let mut slots = self.slots.lock().await;
            slots.entry(name.clone()).or_default().clone()
        };

        match slot.get_or_try_init(|| self.construct(name)).await {
            Ok(unit) => Ok(unit.clone()),
            Err(err) => {
                self.discard_empty_slot(name, &slot).await;
                Err(err)
            }
        }
    }

    async fn construct(&self, name: &ToolName) -> Result<Arc<dyn ExecutionUnit>> {
        debug!("Constructing unit for {}", name);
        let sandbox = self.sandbox.clone();
        let target = name.clone();

        let unit = tokio::task::spawn_blocking(move || sandbox.load(&target))
            .await
            .map_err(|e| Error::construction(name, format!("loader task failed: {e}")))?;

        if let Err(err) = &unit {
            warn!("Failed to construct unit for {}: {}", name, err);
        }
        unit
    }

    /// Remove a slot whose construction failed, unless someone else has
    /// already replaced or filled it, or is still waiting on it
    async fn discard_empty_slot(&self, name: &ToolName, slot: &Slot) {
        let mut slots = self.slots.lock().await;
        if let Some(current) = slots.get(name) {
            // Clones are only taken under this lock: one for the map, one for us
            let waiters = Arc::strong_count(current) > 2;
            if Arc::ptr_eq(current, slot) && !current.initialized() && !waiters {
                slots.remove(name);
            }
        }
    }

    /// Whether a unit for `name` is cached
    pub async fn is_loaded(&self, name: &ToolName) -> bool {
        self.slots
            .lock()
            .await
            .get(name)
            .is_some_and(|slot| slot.initialized())
    }

    /// Number of cached units
    pub async fn loaded_count(&self) -> usize {
        self.slots
            .lock()
            .await
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    /// Drop the cached unit for `name`; the next call constructs a new one
    pub async fn evict(&self, name: &ToolName) -> bool {
        let removed = self.slots.lock().await.remove(name).is_some();
        if removed {
            info!("Evicted plugin {}", name);
        }
        removed
    }

    /// Drop every cached unit
    pub async fn clear(&self) {
        self.slots.lock().await.clear();
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("sandbox", &self.sandbox)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
