//! Filesystem-backed store.
//!
//! Layout under the root directory:
//!   <root>/<location>/<path>           documents (YAML)
//!   <root>/secrets/<id>.json           secrets (JSON object)
//!   <root>/parameters/<name>           parameters (text, surrounding whitespace trimmed)

use crate::error::Error;
use crate::source::{Secret, Store};
use crate::Result;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `key` below `base`, refusing anything that escapes it.
    fn resolve(&self, base: &Path, key: &str, what: &str) -> Result<PathBuf> {
        let rel = Path::new(key.trim_start_matches('/'));
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes || rel.as_os_str().is_empty() {
            return Err(Error::collaborator(
                what.to_string(),
                io::Error::new(io::ErrorKind::InvalidInput, format!("bad key {:?}", key)),
            ));
        }
        Ok(base.join(rel))
    }

    fn read(&self, path: &Path, what: &str) -> Result<String> {
        debug!(path = %path.display(), "Reading {}", what);
        fs::read_to_string(path).map_err(|e| Error::collaborator(what.to_string(), e))
    }
}

impl Store for LocalStore {
    fn secret(&self, id: &str) -> Result<Secret> {
        let what = format!("secret {}", id);
        let path = self.resolve(&self.root.join("secrets"), &format!("{}.json", id), &what)?;
        let text = self.read(&path, &what)?;
        serde_json::from_str(&text).map_err(|e| Error::collaborator(what, e))
    }

    fn parameter(&self, name: &str) -> Result<String> {
        let what = format!("parameter {}", name);
        let path = self.resolve(&self.root.join("parameters"), name, &what)?;
        Ok(self.read(&path, &what)?.trim().to_string())
    }

    fn document(&self, location: &str, path: &str) -> Result<serde_yaml::Value> {
        let what = format!("document {}/{}", location, path);
        let dir = self.resolve(&self.root, location, &what)?;
        let file = self.resolve(&dir, path, &what)?;
        let text = self.read(&file, &what)?;
        serde_yaml::from_str(&text).map_err(|e| Error::collaborator(what, e))
    }
}
