//! Output model: the platform configuration document built from a `ProxySpec`.
//!
//! Field order in these structs is the key order of the emitted YAML.

use crate::compile::ProxySpec;
use crate::spec::{AppSpec, ResourceBlock};
use chrono::SecondsFormat;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

pub const SCHEMA_VERSION: &str = "2.0";

const HEARTBEAT_RATE_MS: u64 = 10_000;
const HEARTBEAT_TIMEOUT_MS: u64 = 60_000;
const CONTAINER_WAIT_TIME_MS: u64 = 60_000;
const CLEANUP_INTERVAL_MS: u64 = 3_600_000;
const PROXY_PORT: u16 = 8080;

const OIDC_BASE: &str = "https://login.microsoftonline.com";

#[derive(Debug, Clone, Serialize)]
pub struct ConfigDocument {
    pub server: ServerView,
    pub logging: LoggingView,
    pub management: ManagementView,
    pub spring: SpringView,
    pub proxy: ProxyView,
    pub openid: OpenIdView,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerView {
    pub forward_headers_strategy: String,
    pub use_forward_headers: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoggingView {
    pub level: LogLevels,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogLevels {
    pub root: String,
    #[serde(rename = "eu.openanalytics")]
    pub openanalytics: String,
    #[serde(rename = "org.springframework.web")]
    pub spring_web: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManagementView {
    pub metrics: MetricsView,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsView {
    pub export: MetricsExport,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsExport {
    pub cloudwatch: CloudWatchView,
}

#[derive(Debug, Clone, Serialize)]
pub struct CloudWatchView {
    pub enabled: bool,
    pub namespace: String,
    pub step: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpringView {
    pub session: SessionView,
    pub redis: RedisView,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SessionView {
    pub store_type: String,
    pub redis: SessionRedisView,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SessionRedisView {
    pub namespace: String,
    pub flush_mode: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RedisView {
    pub host: String,
    pub port: u16,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProxyView {
    pub title: String,
    pub logo_url: String,
    pub landing_page: String,
    pub heartbeat_rate: u64,
    pub heartbeat_timeout: u64,
    pub port: u16,
    pub authentication: String,
    pub admin_groups: Vec<String>,
    pub container_backend: String,
    pub container_wait_time: u64,
    pub container_log_path: String,
    pub support_container_re_use: bool,
    pub container_cleanup_interval: u64,
    /// 0 = unlimited, pre-initialized containers must not age out.
    pub max_container_age: u64,
    pub track_app_url: bool,
    pub store_mode: String,
    pub recover_running_proxies: bool,
    pub recover_running_proxies_from_different_config: bool,
    pub ecs: EcsBackendView,
    pub specs: Vec<SpecView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct EcsBackendView {
    pub cluster: String,
    pub region: String,
    pub security_groups: Vec<String>,
    pub subnets: Vec<String>,
    pub enable_cloudwatch: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_role: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct OpenIdView {
    pub auth_url: String,
    pub token_url: String,
    pub jwks_url: String,
    pub logout_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub scopes: Vec<String>,
    pub username_attribute: String,
    pub roles_claim: String,
}

/// One app as it appears under `proxy.specs`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SpecView {
    pub id: String,
    #[serde(rename = "type")]
    pub app_type: String,
    #[serde(rename = "s3_key", skip_serializing_if = "Option::is_none")]
    pub s3_key: Option<String>,
    #[serde(flatten)]
    pub passthrough: BTreeMap<String, serde_yaml::Value>,
    pub container_cpu_request: u32,
    pub container_memory_request: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_instances_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_instances_max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_wait_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_idle_timeout: Option<u64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub http_headers: BTreeMap<String, String>,
    pub container_env: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_sharing_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_sharing_groups: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_users: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_groups: Option<Vec<String>>,
    pub ecs: EcsTaskView,
    pub metadata: MetadataView,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct EcsTaskView {
    pub task_definition: String,
    pub cpu: String,
    pub memory: String,
    pub enable_execute_command: bool,
    pub log_configuration: LogConfigurationView,
}

/// ECS task-definition JSON spelling, hence camelCase.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfigurationView {
    pub log_driver: String,
    pub options: LogOptionsView,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogOptionsView {
    #[serde(rename = "awslogs-group")]
    pub group: String,
    #[serde(rename = "awslogs-region")]
    pub region: String,
    #[serde(rename = "awslogs-stream-prefix")]
    pub stream_prefix: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetadataView {
    pub team: String,
    pub created: String,
    pub version: String,
}

/// Build the full configuration document.
pub fn build_config_document(spec: &ProxySpec) -> ConfigDocument {
    let team = spec.team.as_str();
    let settings = &spec.settings;
    let deployment = &settings.deployment;
    let created = spec.generated_at.to_rfc3339_opts(SecondsFormat::Millis, true);

    ConfigDocument {
        server: ServerView {
            forward_headers_strategy: "native".to_string(),
            use_forward_headers: true,
        },
        logging: LoggingView {
            level: LogLevels {
                root: "INFO".to_string(),
                openanalytics: "DEBUG".to_string(),
                spring_web: "INFO".to_string(),
            },
        },
        management: ManagementView {
            metrics: MetricsView {
                export: MetricsExport {
                    cloudwatch: CloudWatchView {
                        enabled: true,
                        namespace: format!("ShinyProxy/{}", team),
                        step: "1m".to_string(),
                    },
                },
            },
        },
        spring: SpringView {
            session: SessionView {
                store_type: "redis".to_string(),
                redis: SessionRedisView {
                    namespace: settings.session_namespace.clone(),
                    flush_mode: "immediate".to_string(),
                },
            },
            redis: RedisView {
                host: deployment.redis_host.clone(),
                port: deployment.redis_port,
                password: deployment.redis_password.clone(),
            },
        },
        proxy: ProxyView {
            title: settings.title.clone(),
            logo_url: "https://www.openanalytics.eu/shinyproxy/logo.png".to_string(),
            landing_page: "/".to_string(),
            heartbeat_rate: HEARTBEAT_RATE_MS,
            heartbeat_timeout: HEARTBEAT_TIMEOUT_MS,
            port: PROXY_PORT,
            authentication: "openid".to_string(),
            admin_groups: settings.admin_groups.clone(),
            container_backend: "ecs".to_string(),
            container_wait_time: CONTAINER_WAIT_TIME_MS,
            container_log_path: format!("/var/log/shinyproxy/{}", team),
            support_container_re_use: true,
            container_cleanup_interval: CLEANUP_INTERVAL_MS,
            max_container_age: 0,
            track_app_url: true,
            store_mode: "Redis".to_string(),
            recover_running_proxies: true,
            recover_running_proxies_from_different_config: false,
            ecs: EcsBackendView {
                cluster: deployment.cluster_name.clone(),
                region: deployment.region.clone(),
                security_groups: deployment.security_groups.clone(),
                subnets: deployment.subnets.clone(),
                enable_cloudwatch: true,
                task_role: deployment.task_role_arn.clone(),
                execution_role: deployment.execution_role_arn.clone(),
            },
            specs: spec
                .apps
                .iter()
                .map(|app| spec_view(app, team, &created))
                .collect(),
        },
        openid: OpenIdView {
            auth_url: format!("{}/oauth/v2.0/authorize", OIDC_BASE),
            token_url: format!("{}/oauth/v2.0/token", OIDC_BASE),
            jwks_url: format!("{}/discovery/v2.0/keys", OIDC_BASE),
            logout_url: format!("{}/common/oauth2/v2.0/logout", OIDC_BASE),
            client_id: settings.openid.client_id.clone(),
            client_secret: settings.openid.client_secret.clone(),
            scopes: ["openid", "profile", "email", "offline_access"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            username_attribute: "preferred_username".to_string(),
            roles_claim: "groups".to_string(),
        },
    }
}

pub fn spec_view(app: &AppSpec, team: &str, created: &str) -> SpecView {
    let pool = app.pre_init.pool();
    let sharing = app.sharing();
    let non_empty = |set: &std::collections::BTreeSet<String>| {
        (!set.is_empty()).then(|| set.iter().cloned().collect::<Vec<_>>())
    };

    let mut view = SpecView {
        id: app.id.clone(),
        app_type: app.container_type.clone(),
        s3_key: app.s3_key.clone(),
        passthrough: BTreeMap::new(),
        container_cpu_request: app.cpu_request,
        container_memory_request: app.memory_request,
        container_instances_min: pool.map(|p| p.min_seats),
        container_instances_max: pool.map(|p| p.max_seats),
        container_wait_time: pool.map(|p| p.wait_time_ms),
        container_idle_timeout: pool.map(|p| p.idle_timeout_ms),
        http_headers: app.headers.clone(),
        container_env: app.env.clone(),
        container_sharing_enabled: sharing.map(|_| true),
        container_sharing_groups: sharing
            .map(|s| s.allowed_groups.iter().cloned().collect()),
        access_users: sharing.and_then(|s| non_empty(&s.allowed_users)),
        access_groups: sharing.and_then(|s| non_empty(&s.allowed_groups)),
        ecs: ecs_task_view(&app.resources),
        metadata: MetadataView {
            team: team.to_string(),
            created: created.to_string(),
            version: SCHEMA_VERSION.to_string(),
        },
    };

    // Compiled keys win over author keys of the same name.
    let emitted = view.emitted_keys();
    for (key, value) in &app.passthrough {
        if emitted.contains(&key.as_str()) {
            warn!(app = %app.id, key = %key, "Ignoring author value for a compiler-managed key");
            continue;
        }
        view.passthrough.insert(key.clone(), value.clone());
    }

    view
}

impl SpecView {
    /// Keys this view serializes on its own, excluding passthrough.
    pub fn emitted_keys(&self) -> Vec<&'static str> {
        let mut keys = vec![
            "id",
            "type",
            "container-cpu-request",
            "container-memory-request",
            "container-env",
            "ecs",
            "metadata",
        ];
        let optional = [
            ("s3_key", self.s3_key.is_some()),
            ("container-instances-min", self.container_instances_min.is_some()),
            ("container-instances-max", self.container_instances_max.is_some()),
            ("container-wait-time", self.container_wait_time.is_some()),
            ("container-idle-timeout", self.container_idle_timeout.is_some()),
            ("http-headers", !self.http_headers.is_empty()),
            ("container-sharing-enabled", self.container_sharing_enabled.is_some()),
            ("container-sharing-groups", self.container_sharing_groups.is_some()),
            ("access-users", self.access_users.is_some()),
            ("access-groups", self.access_groups.is_some()),
        ];
        keys.extend(optional.iter().filter(|(_, set)| *set).map(|(k, _)| *k));
        keys
    }
}

fn ecs_task_view(block: &ResourceBlock) -> EcsTaskView {
    EcsTaskView {
        task_definition: block.task_definition.clone(),
        cpu: block.cpu.clone(),
        memory: block.memory.clone(),
        enable_execute_command: block.enable_execute_command,
        log_configuration: LogConfigurationView {
            log_driver: block.log.driver.clone(),
            options: LogOptionsView {
                group: block.log.group.clone(),
                region: block.log.region.clone(),
                stream_prefix: block.log.stream_prefix.clone(),
            },
        },
    }
}
