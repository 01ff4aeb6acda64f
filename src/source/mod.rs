//! Collaborators: where apps.yml, secrets and parameters come from.
//!
//! The compiler never talks to a remote service itself. Everything it needs
//! from outside goes through `Store`, keyed the same way the deployment's
//! secret store, parameter store and config bucket are:
//! - secrets: `<team>/<purpose>`, JSON object
//! - parameters: `/<team>/<purpose>`, plain string
//! - documents: `(<team>-shinyproxy-config, apps.yml)`, parsed YAML

pub mod local;
pub mod memory;

pub use local::LocalStore;
pub use memory::MemoryStore;

use crate::Result;

/// JSON object stored under one secret id.
pub type Secret = serde_json::Map<String, serde_json::Value>;

/// Path of the apps document inside the team's config location.
pub const APPS_PATH: &str = "apps.yml";

pub trait Store {
    fn secret(&self, id: &str) -> Result<Secret>;

    fn parameter(&self, name: &str) -> Result<String>;

    fn document(&self, location: &str, path: &str) -> Result<serde_yaml::Value>;
}

impl<S: Store + ?Sized> Store for &S {
    fn secret(&self, id: &str) -> Result<Secret> {
        (**self).secret(id)
    }

    fn parameter(&self, name: &str) -> Result<String> {
        (**self).parameter(name)
    }

    fn document(&self, location: &str, path: &str) -> Result<serde_yaml::Value> {
        (**self).document(location, path)
    }
}

pub fn secret_id(team: &str, purpose: &str) -> String {
    format!("{}/{}", team, purpose)
}

pub fn parameter_name(team: &str, purpose: &str) -> String {
    format!("/{}/{}", team, purpose)
}

/// Bucket-like location holding a team's apps.yml.
pub fn config_location(team: &str) -> String {
    format!("{}-shinyproxy-config", team)
}
