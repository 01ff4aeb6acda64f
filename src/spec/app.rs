//! Resolved app specification types.

use std::collections::{BTreeMap, BTreeSet};

/// One application's fully resolved specification.
#[derive(Debug, Clone, PartialEq)]
pub struct AppSpec {
    pub id: String,
    pub container_type: String,
    pub s3_key: Option<String>,
    pub cpu_request: u32,
    pub memory_request: u32,
    pub pre_init: PreInitPolicy,
    pub headers: BTreeMap<String, String>,
    pub env: BTreeMap<String, String>,
    /// Session-store isolation key, `<team>:<id>`.
    pub namespace: String,
    pub resources: ResourceBlock,
    /// Author keys the compiler does not interpret.
    pub passthrough: BTreeMap<String, serde_yaml::Value>,
}

impl AppSpec {
    /// Sharing only exists for pre-initialized apps.
    pub fn sharing(&self) -> Option<&SharingPolicy> {
        match &self.pre_init {
            PreInitPolicy::Enabled(pool) if pool.sharing.enabled => Some(&pool.sharing),
            _ => None,
        }
    }

    /// One tab-separated line: id, namespace, pool sizing.
    pub fn summary(&self) -> String {
        let pool = match self.pre_init.pool() {
            Some(p) => format!("pre-init {}..{} seats", p.min_seats, p.max_seats),
            None => "on demand".to_string(),
        };
        format!("{}\t{}\t{}", self.id, self.namespace, pool)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PreInitPolicy {
    #[default]
    Disabled,
    Enabled(PoolPolicy),
}

impl PreInitPolicy {
    pub fn is_enabled(&self) -> bool {
        matches!(self, PreInitPolicy::Enabled(_))
    }

    pub fn pool(&self) -> Option<&PoolPolicy> {
        match self {
            PreInitPolicy::Enabled(pool) => Some(pool),
            PreInitPolicy::Disabled => None,
        }
    }
}

/// Standby pool sizing and lifecycle. `1 <= min_seats <= max_seats`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolPolicy {
    pub min_seats: u32,
    pub max_seats: u32,
    pub wait_time_ms: u64,
    pub idle_timeout_ms: u64,
    pub sharing: SharingPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SharingPolicy {
    pub enabled: bool,
    pub allowed_users: BTreeSet<String>,
    pub allowed_groups: BTreeSet<String>,
}

impl SharingPolicy {
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Enabled but nobody is allowed in.
    pub fn is_ineffective(&self) -> bool {
        self.enabled && self.allowed_users.is_empty() && self.allowed_groups.is_empty()
    }
}

/// ECS task descriptor for one app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBlock {
    pub task_definition: String,
    /// ECS CPU units, e.g. "1024" for one vCPU.
    pub cpu: String,
    /// MiB.
    pub memory: String,
    pub enable_execute_command: bool,
    pub log: LogTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    pub driver: String,
    pub group: String,
    pub region: String,
    pub stream_prefix: String,
}
