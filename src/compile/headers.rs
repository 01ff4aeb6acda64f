//! Identity header and environment injection for pre-initialized apps.
//!
//! A pre-initialized container starts before any user is assigned to it, so
//! user context reaches it through proxy-templated headers instead of env.
//! Injected keys always replace author keys of the same name: identity headers
//! must not be spoofable from apps.yml. Header names are compared ignoring
//! ASCII case, env names exactly.

use crate::spec::PreInitPolicy;
use std::collections::BTreeMap;
use tracing::warn;

/// Header name to proxy template, `X-SP-TeamName` excluded (team-specific).
pub const IDENTITY_HEADERS: [(&str, &str); 7] = [
    ("X-SP-UserId", "#{proxy.userId}"),
    ("X-SP-UserGroups", "#{proxy.userGroups}"),
    ("X-SP-UserAttributes", "#{proxy.userAttributes}"),
    ("X-SP-AccessToken", "#{oidcUser.accessToken}"),
    ("X-SP-IdToken", "#{oidcUser.idToken}"),
    ("X-SP-RefreshToken", "#{oidcUser.refreshToken}"),
    ("X-SP-SessionId", "#{proxy.sessionId}"),
];

pub const TEAM_HEADER: &str = "X-SP-TeamName";

pub const ENV_PRE_INIT: &str = "SP_CONTAINER_PRE_INIT";
pub const ENV_AUTH_TYPE: &str = "SP_AUTH_TYPE";
pub const ENV_TEAM_NAME: &str = "SP_TEAM_NAME";
pub const ENV_INSTANCE_ID: &str = "SP_APP_INSTANCE_ID";

/// Final header and env maps for one app.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Merged {
    pub headers: BTreeMap<String, String>,
    pub env: BTreeMap<String, String>,
}

/// Merge author maps with the platform-managed keys for `policy`.
///
/// Disabled policies pass both maps through untouched. The result only depends
/// on map contents, so merging an already merged pair is a no-op.
pub fn merge(
    headers: &BTreeMap<String, String>,
    env: &BTreeMap<String, String>,
    policy: &PreInitPolicy,
    team: &str,
) -> Merged {
    let mut merged = Merged {
        headers: headers.clone(),
        env: env.clone(),
    };
    if !policy.is_enabled() {
        return merged;
    }

    let injected: Vec<_> = injected_headers(team).collect();
    merged.headers.retain(|name, value| {
        let Some((platform, template)) = injected
            .iter()
            .find(|(platform, _)| platform.eq_ignore_ascii_case(name))
        else {
            return true;
        };
        if platform != name || *template != *value {
            warn!(
                team = %team,
                header = %name,
                "Dropping author header shadowing platform header {}",
                platform
            );
        }
        false
    });
    merged.headers.extend(injected);
    merged.env.extend(injected_env(team));
    merged
}

pub fn injected_headers(team: &str) -> impl Iterator<Item = (String, String)> + '_ {
    IDENTITY_HEADERS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .chain(std::iter::once((TEAM_HEADER.to_string(), team.to_string())))
}

pub fn injected_env(team: &str) -> impl Iterator<Item = (String, String)> + '_ {
    [
        (ENV_PRE_INIT, "true"),
        (ENV_AUTH_TYPE, "header"),
        (ENV_TEAM_NAME, team),
        (ENV_INSTANCE_ID, "#{proxy.appInstanceId}"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
}
