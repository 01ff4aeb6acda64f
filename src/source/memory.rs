use crate::error::Error;
use crate::source::{Secret, Store};
use crate::Result;
use std::collections::BTreeMap;
use std::io;

/// Store backed by in-process maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    secrets: BTreeMap<String, Secret>,
    parameters: BTreeMap<String, String>,
    documents: BTreeMap<(String, String), serde_yaml::Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, id: impl Into<String>, secret: Secret) -> Self {
        self.secrets.insert(id.into(), secret);
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_document(
        mut self,
        location: impl Into<String>,
        path: impl Into<String>,
        document: serde_yaml::Value,
    ) -> Self {
        self.documents.insert((location.into(), path.into()), document);
        self
    }
}

fn not_found(what: String) -> Error {
    Error::collaborator(what, io::Error::new(io::ErrorKind::NotFound, "not found"))
}

impl Store for MemoryStore {
    fn secret(&self, id: &str) -> Result<Secret> {
        self.secrets
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(format!("secret {}", id)))
    }

    fn parameter(&self, name: &str) -> Result<String> {
        self.parameters
            .get(name)
            .cloned()
            .ok_or_else(|| not_found(format!("parameter {}", name)))
    }

    fn document(&self, location: &str, path: &str) -> Result<serde_yaml::Value> {
        self.documents
            .get(&(location.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| not_found(format!("document {}/{}", location, path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_hit_and_miss() {
        let store = MemoryStore::new()
            .with_parameter("/acme/openid/client-id", "cid")
            .with_document("loc", "apps.yml", serde_yaml::Value::Null);

        assert_eq!(store.parameter("/acme/openid/client-id").unwrap(), "cid");
        assert!(store.document("loc", "apps.yml").is_ok());

        let err = store.secret("acme/openid/client-secret").unwrap_err();
        assert!(err.to_string().contains("acme/openid/client-secret"));
        assert!(store.document("loc", "other.yml").is_err());
    }
}
