//! Raw app entries as they appear in apps.yml.
//!
//! YAML shape:
//! specs:
//!   - id: dash1                       # required
//!     type: rshiny                    # optional, platform default otherwise
//!     s3_key: apps/dash1.tar.gz       # optional, passed through
//!     container-cpu-request: 1024
//!     container-memory-request: 2048
//!     pre-initialization:
//!       enabled: true
//!       minimum-seats: 2
//!       maximum-seats: 4              # `max-seats` accepted too
//!       wait-time: 60000
//!       idle-timeout: 3600000
//!       sharing:
//!         enabled: true
//!         allowed-users: [alice]
//!         allowed-groups: [analysts]
//!     http-headers: { X-Custom: value }
//!     container-env: { LOG_LEVEL: debug }
//!     display-name: Dashboard         # anything else is passed through
//!
//! Everything is optional here; requiredness is checked by the normalizer so
//! errors can name the offending entry.

use crate::error::Error;
use crate::Result;
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppsDocument {
    #[serde(default)]
    pub specs: Vec<RawApp>,
}

impl AppsDocument {
    /// Interpret an already parsed document. `location` only labels errors.
    ///
    /// `<<` merge keys are resolved first; serde_yaml leaves them as plain keys.
    pub fn from_value(mut value: Value, location: &str) -> Result<Self> {
        // An empty apps.yml parses to null.
        if value.is_null() {
            return Ok(Self::default());
        }
        let invalid = |source: serde_yaml::Error| Error::InvalidDocument {
            location: location.to_string(),
            source,
        };
        value.apply_merge().map_err(invalid)?;
        serde_yaml::from_value(value).map_err(invalid)
    }

    pub fn from_yaml_str(text: &str, location: &str) -> Result<Self> {
        let value = serde_yaml::from_str(text).map_err(|source| Error::InvalidDocument {
            location: location.to_string(),
            source,
        })?;
        Self::from_value(value, location)
    }
}

/// Raw app entry. Unknown keys are kept in `extra`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawApp {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default, rename = "type")]
    pub app_type: Option<String>,

    #[serde(default, rename = "s3_key")]
    pub s3_key: Option<String>,

    #[serde(default, rename = "container-cpu-request")]
    pub cpu_request: Option<u32>,

    #[serde(default, rename = "container-memory-request")]
    pub memory_request: Option<u32>,

    #[serde(default, rename = "pre-initialization")]
    pub pre_initialization: Option<RawPreInit>,

    /// Values stay untyped until `scalar_string`; authors write `DEBUG: true`
    /// or `PORT: 3838` and the platform only deals in strings.
    #[serde(default, rename = "http-headers")]
    pub http_headers: BTreeMap<String, Value>,

    #[serde(default, rename = "container-env")]
    pub container_env: BTreeMap<String, Value>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawPreInit {
    #[serde(default)]
    pub enabled: Option<bool>,

    #[serde(default)]
    pub minimum_seats: Option<u32>,

    // Older apps.yml files spell it `max-seats`.
    #[serde(default, alias = "max-seats")]
    pub maximum_seats: Option<u32>,

    #[serde(default)]
    pub wait_time: Option<u64>,

    #[serde(default)]
    pub idle_timeout: Option<u64>,

    #[serde(default)]
    pub sharing: Option<RawSharing>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawSharing {
    #[serde(default)]
    pub enabled: Option<bool>,

    #[serde(default)]
    pub allowed_users: Vec<String>,

    #[serde(default)]
    pub allowed_groups: Vec<String>,
}

/// String form of a header or env value, as the author wrote it: `1.0` stays
/// `1.0` and an empty value is `""`. Sequences and mappings have none.
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Tagged(tagged) => scalar_string(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(yaml: &str) -> AppsDocument {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn full_entry_parses() {
        let doc = parse(
            r#"
specs:
  - id: dash1
    type: python
    s3_key: apps/dash1.tar.gz
    container-cpu-request: 512
    pre-initialization:
      enabled: true
      minimum-seats: 2
      sharing:
        enabled: true
        allowed-groups: [analysts]
    http-headers:
      X-Custom: abc
    container-env:
      DEBUG: true
      PORT: 3838
    display-name: Dashboard
"#,
        );
        let app = &doc.specs[0];
        assert_eq!(app.id.as_deref(), Some("dash1"));
        assert_eq!(app.app_type.as_deref(), Some("python"));
        assert_eq!(app.cpu_request, Some(512));
        assert_eq!(app.memory_request, None);

        let pre = app.pre_initialization.as_ref().unwrap();
        assert_eq!(pre.minimum_seats, Some(2));
        assert_eq!(pre.maximum_seats, None);
        assert_eq!(
            pre.sharing.as_ref().unwrap().allowed_groups,
            vec!["analysts".to_string()]
        );

        assert_eq!(scalar_string(&app.container_env["DEBUG"]).as_deref(), Some("true"));
        assert_eq!(scalar_string(&app.container_env["PORT"]).as_deref(), Some("3838"));
        assert_eq!(app.http_headers["X-Custom"], Value::from("abc"));
        assert_eq!(
            app.extra.keys().collect::<Vec<_>>(),
            vec!["display-name"]
        );
    }

    #[test]
    fn max_seats_alias_is_accepted() {
        let doc = parse("specs:\n  - id: a\n    pre-initialization: {enabled: true, max-seats: 7}\n");
        let pre = doc.specs[0].pre_initialization.as_ref().unwrap();
        assert_eq!(pre.maximum_seats, Some(7));
    }

    #[test]
    fn typos_inside_pre_initialization_are_rejected() {
        let res = AppsDocument::from_yaml_str(
            "specs:\n  - id: a\n    pre-initialization: {enabled: true, minimum-seat: 2}\n",
            "apps.yml",
        );
        assert!(matches!(res, Err(Error::InvalidDocument { .. })));
    }

    #[test]
    fn missing_specs_key_is_an_empty_list() {
        assert!(parse("{}").specs.is_empty());
    }

    #[test]
    fn empty_document_has_no_specs() {
        let doc = AppsDocument::from_yaml_str("", "apps.yml").unwrap();
        assert!(doc.specs.is_empty());
    }

    #[test]
    fn wrong_shape_is_an_invalid_document() {
        let err = AppsDocument::from_yaml_str("specs:\n  - id: a\n    container-cpu-request: lots\n", "acme/apps.yml")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDocument { ref location, .. } if location == "acme/apps.yml"));
    }

    #[test]
    fn entry_without_id_still_parses() {
        let doc = parse("specs:\n  - type: rshiny\n");
        assert_eq!(doc.specs[0].id, None);
    }

    #[test]
    fn scalar_values_keep_their_written_form() {
        let doc = parse(
            "specs:\n  - id: a\n    container-env:\n      VERSION: 1.0\n      BIG: 18446744073709551615\n      NEG: -42\n      EMPTY:\n      TILDE: ~\n      OFF: false\n",
        );
        let env: BTreeMap<_, _> = doc.specs[0]
            .container_env
            .iter()
            .map(|(k, v)| (k.as_str(), scalar_string(v)))
            .collect();
        assert_eq!(env["VERSION"].as_deref(), Some("1.0"));
        assert_eq!(env["BIG"].as_deref(), Some("18446744073709551615"));
        assert_eq!(env["NEG"].as_deref(), Some("-42"));
        assert_eq!(env["EMPTY"].as_deref(), Some(""));
        assert_eq!(env["TILDE"].as_deref(), Some(""));
        assert_eq!(env["OFF"].as_deref(), Some("false"));
    }

    #[test]
    fn nested_values_have_no_string_form() {
        assert_eq!(scalar_string(&serde_yaml::from_str("[a, b]").unwrap()), None);
        assert_eq!(scalar_string(&serde_yaml::from_str("{a: b}").unwrap()), None);
    }

    #[test]
    fn merge_keys_are_resolved() {
        let doc = AppsDocument::from_yaml_str(
            r#"
base: &base
  container-cpu-request: 512
  display-name: Shared
specs:
  - <<: *base
    id: a
  - <<: *base
    id: b
    container-cpu-request: 256
"#,
            "apps.yml",
        )
        .unwrap();
        assert_eq!(doc.specs[0].cpu_request, Some(512));
        assert_eq!(doc.specs[1].cpu_request, Some(256));
        for app in &doc.specs {
            assert_eq!(app.extra.keys().collect::<Vec<_>>(), vec!["display-name"]);
        }
    }
}
