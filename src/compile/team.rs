//! Team-level settings: everything in the document that is not an app.

use crate::error::Error;
use crate::settings::Deployment;
use crate::source::{self, Store};
use crate::Result;
use std::fmt;
use std::io;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSettings {
    pub title: String,
    pub admin_groups: Vec<String>,
    pub deployment: Deployment,
    /// Redis key prefix for the proxy's own session data.
    pub session_namespace: String,
    pub openid: OpenIdClient,
}

#[derive(Clone, PartialEq, Eq)]
pub struct OpenIdClient {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for OpenIdClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenIdClient")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

pub fn resolve<S: Store>(team: &str, deployment: &Deployment, store: &S) -> Result<TeamSettings> {
    Ok(TeamSettings {
        title: format!("{} Analytics Platform", team),
        admin_groups: vec!["shinyproxy-admins".to_string(), format!("{}-admins", team)],
        deployment: deployment.clone(),
        session_namespace: format!("shinyproxy:{}", team),
        openid: openid_client(team, store)?,
    })
}

fn openid_client<S: Store>(team: &str, store: &S) -> Result<OpenIdClient> {
    let client_id = store.parameter(&source::parameter_name(team, "openid/client-id"))?;

    let id = source::secret_id(team, "openid/client-secret");
    let secret = store.secret(&id)?;
    let client_secret = secret
        .get("value")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            Error::collaborator(
                format!("secret {}", id),
                io::Error::new(io::ErrorKind::InvalidData, "missing string field `value`"),
            )
        })?
        .to_string();

    Ok(OpenIdClient {
        client_id,
        client_secret,
    })
}
