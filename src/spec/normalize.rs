//! Structural defaults for a single raw entry.

use crate::error::Error;
use crate::settings::PlatformDefaults;
use crate::spec::raw::{RawApp, RawPreInit, scalar_string};
use crate::Result;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// The id ends up in ECS task definition names and CloudWatch log groups.
static APP_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("app id pattern"));

const MAX_ID_LEN: usize = 200;

/// Entry with every structural field populated. Policy and derived fields are
/// resolved later by the compiler.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedApp {
    /// Position in the input list.
    pub index: usize,
    pub id: String,
    pub container_type: String,
    pub s3_key: Option<String>,
    pub cpu_request: u32,
    pub memory_request: u32,
    pub pre_initialization: Option<RawPreInit>,
    pub headers: BTreeMap<String, String>,
    pub env: BTreeMap<String, String>,
    pub passthrough: BTreeMap<String, serde_yaml::Value>,
}

/// Fill defaults on one raw entry. `index` is only used for error reporting.
pub fn normalize(raw: &RawApp, index: usize, defaults: &PlatformDefaults) -> Result<NormalizedApp> {
    let id = match raw.id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => return Err(Error::MissingRequiredField { index, field: "id" }),
    };

    if id.len() > MAX_ID_LEN {
        return Err(Error::invalid_field(
            &id,
            "id",
            format!("longer than {} characters", MAX_ID_LEN),
        ));
    }
    if !APP_ID.is_match(&id) {
        return Err(Error::invalid_field(
            &id,
            "id",
            "only letters, digits, '-' and '_' are allowed, starting with a letter or digit",
        ));
    }

    let cpu_request = positive(&id, "container-cpu-request", raw.cpu_request, defaults.cpu_request)?;
    let memory_request = positive(
        &id,
        "container-memory-request",
        raw.memory_request,
        defaults.memory_request,
    )?;

    let container_type = raw
        .app_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(defaults.container_type.as_str())
        .to_string();

    let headers = stringify(&id, "http-headers", &raw.http_headers)?;
    let env = stringify(&id, "container-env", &raw.container_env)?;

    Ok(NormalizedApp {
        index,
        id,
        container_type,
        s3_key: raw.s3_key.clone(),
        cpu_request,
        memory_request,
        pre_initialization: raw.pre_initialization.clone(),
        headers,
        env,
        passthrough: raw.extra.clone(),
    })
}

fn positive(id: &str, field: &'static str, value: Option<u32>, default: u32) -> Result<u32> {
    match value.unwrap_or(default) {
        0 => Err(Error::invalid_field(id, field, "must be greater than zero")),
        v => Ok(v),
    }
}

fn stringify(
    id: &str,
    field: &'static str,
    map: &BTreeMap<String, serde_yaml::Value>,
) -> Result<BTreeMap<String, String>> {
    map.iter()
        .map(|(k, v)| match scalar_string(v) {
            Some(s) => Ok((k.clone(), s)),
            None => Err(Error::invalid_field(
                id,
                field,
                format!("value of `{}` must be a scalar", k),
            )),
        })
        .collect()
}
