//! Platform defaults and deployment environment.
//!
//! `PlatformDefaults` holds the constants the compiler falls back to when an app
//! entry leaves something unspecified. It is plain data so tests (and the
//! `--defaults` file) can override any of it.
//!
//! `Deployment` holds identifiers that differ per deployment (region, cluster,
//! roles, Redis). They are read from environment variables, never computed.

use crate::error::Error;
use crate::Result;
use serde::Deserialize;
use std::path::Path;

/// Fallback values for unspecified app fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct PlatformDefaults {
    pub container_type: String,
    pub cpu_request: u32,
    pub memory_request: u32,
    pub minimum_seats: u32,
    /// `maximum-seats` defaults to `minimum-seats * max-seats-multiplier`.
    pub max_seats_multiplier: u32,
    /// Milliseconds.
    pub wait_time: u64,
    /// Milliseconds.
    pub idle_timeout: u64,
    /// Treat sharing enabled with empty allow-lists as an error instead of a warning.
    pub strict_sharing: bool,
}

impl Default for PlatformDefaults {
    fn default() -> Self {
        Self {
            container_type: "rshiny".to_string(),
            cpu_request: 1024,
            memory_request: 2048,
            minimum_seats: 1,
            max_seats_multiplier: 3,
            wait_time: 60_000,
            idle_timeout: 3_600_000,
            strict_sharing: false,
        }
    }
}

impl PlatformDefaults {
    /// Load overrides from a YAML file. Fields missing from the file keep their
    /// built-in value.
    pub fn from_file(path: &Path) -> Result<Self> {
        let what = || format!("defaults file {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|e| Error::collaborator(what(), e))?;
        serde_yaml::from_str(&text).map_err(|e| Error::collaborator(what(), e))
    }
}

/// Deployment-specific identifiers for the ECS backend and the session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub region: String,
    pub cluster_name: String,
    pub security_groups: Vec<String>,
    pub subnets: Vec<String>,
    pub task_role_arn: Option<String>,
    pub execution_role_arn: Option<String>,
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_password: String,
}

impl Deployment {
    pub fn from_env(team: &str) -> Result<Self> {
        Self::from_lookup(team, |key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(team: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let redis_port = match var("REDIS_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| Error::collaborator("environment variable REDIS_PORT", e))?,
            None => 6379,
        };

        Ok(Self {
            region: var("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            cluster_name: var("CLUSTER_NAME").unwrap_or_else(|| format!("{}-cluster", team)),
            security_groups: var("SECURITY_GROUP").map(|v| split_list(&v)).unwrap_or_default(),
            subnets: var("SUBNETS").map(|v| split_list(&v)).unwrap_or_default(),
            task_role_arn: var("TASK_ROLE_ARN"),
            execution_role_arn: var("EXECUTION_ROLE_ARN"),
            redis_host: var("REDIS_HOST").unwrap_or_else(|| "localhost".to_string()),
            redis_port,
            redis_password: lookup("REDIS_PASSWORD").unwrap_or_default(),
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
