//! App-spec compiler.
//!
//! `Compiler` turns raw apps.yml entries into resolved `AppSpec`s. Each entry
//! goes through the same pure steps:
//! 1. normalize (structural defaults, id check)
//! 2. resolve the pre-initialization policy
//! 3. merge identity headers / env
//! 4. assign the session namespace
//! 5. derive the ECS resource block
//!
//! The only cross-entry check is id uniqueness. Any failure aborts the run.
//!
//! `Generator` wraps the compiler with the collaborator reads for one team and
//! returns a `ProxySpec`, ready for `render::write`.

pub mod headers;
pub mod namespace;
pub mod resources;
pub mod team;

pub use team::{OpenIdClient, TeamSettings};

use crate::settings::{Deployment, PlatformDefaults};
use crate::source::{self, Store};
use crate::spec::{self, AppSpec, AppsDocument, RawApp};
use crate::Result;
use chrono::{DateTime, Utc};
use namespace::SeenIds;
use tracing::{debug, info};

/// A team's complete, resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxySpec {
    pub team: String,
    /// Same order as the input entries.
    pub apps: Vec<AppSpec>,
    pub settings: TeamSettings,
    pub generated_at: DateTime<Utc>,
}

pub struct Compiler<'a> {
    team: &'a str,
    defaults: &'a PlatformDefaults,
    region: &'a str,
}

impl<'a> Compiler<'a> {
    /// `region` is the ECS log region stamped into every resource block.
    pub fn new(team: &'a str, defaults: &'a PlatformDefaults, region: &'a str) -> Self {
        Self {
            team,
            defaults,
            region,
        }
    }

    /// Resolve one entry. `index` is its position in the input list.
    pub fn compile_app(&self, raw: &RawApp, index: usize) -> Result<AppSpec> {
        let app = spec::normalize(raw, index, self.defaults)?;
        let pre_init = spec::preinit::resolve(&app.id, app.pre_initialization.as_ref(), self.defaults)?;
        debug!(app = %app.id, ?pre_init, "Resolved pre-initialization");

        let merged = headers::merge(&app.headers, &app.env, &pre_init, self.team);
        let ns = namespace::namespace(self.team, &app.id);
        let env = namespace::inject(&merged.env, &ns);
        let resources = resources::assemble(self.team, &app, self.region);

        Ok(AppSpec {
            id: app.id,
            container_type: app.container_type,
            s3_key: app.s3_key,
            cpu_request: app.cpu_request,
            memory_request: app.memory_request,
            pre_init,
            headers: merged.headers,
            env,
            namespace: ns,
            resources,
            passthrough: app.passthrough,
        })
    }

    /// Resolve every entry in order. Returns nothing unless all entries resolve
    /// and ids are unique.
    pub fn compile_apps(&self, raws: &[RawApp]) -> Result<Vec<AppSpec>> {
        let mut seen = SeenIds::new();
        let mut apps = Vec::with_capacity(raws.len());

        for (index, raw) in raws.iter().enumerate() {
            let app = self.compile_app(raw, index)?;
            seen.claim(&app.id, index)?;
            info!(
                team = %self.team,
                app = %app.id,
                pre_init = app.pre_init.is_enabled(),
                "Compiled app"
            );
            apps.push(app);
        }

        Ok(apps)
    }
}

/// Produces a team's `ProxySpec` from its collaborators.
pub struct Generator<S> {
    team: String,
    store: S,
    defaults: PlatformDefaults,
    deployment: Deployment,
}

impl<S: Store> Generator<S> {
    pub fn new(
        team: impl Into<String>,
        store: S,
        defaults: PlatformDefaults,
        deployment: Deployment,
    ) -> Self {
        Self {
            team: team.into(),
            store,
            defaults,
            deployment,
        }
    }

    pub fn team(&self) -> &str {
        &self.team
    }

    pub fn generate(&self) -> Result<ProxySpec> {
        self.generate_at(Utc::now())
    }

    /// Like `generate`, with a fixed metadata timestamp.
    pub fn generate_at(&self, generated_at: DateTime<Utc>) -> Result<ProxySpec> {
        info!(team = %self.team, "Generating configuration");

        let location = source::config_location(&self.team);
        let document = self.store.document(&location, source::APPS_PATH)?;
        let apps = AppsDocument::from_value(
            document,
            &format!("{}/{}", location, source::APPS_PATH),
        )?;

        let compiler = Compiler::new(&self.team, &self.defaults, &self.deployment.region);
        let apps = compiler.compile_apps(&apps.specs)?;
        let settings = team::resolve(&self.team, &self.deployment, &self.store)?;

        info!(team = %self.team, apps = apps.len(), "Configuration generated");

        Ok(ProxySpec {
            team: self.team.clone(),
            apps,
            settings,
            generated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::spec::{PreInitPolicy, RawPreInit};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn raw(id: &str) -> RawApp {
        RawApp {
            id: Some(id.to_string()),
            ..Default::default()
        }
    }

    fn pre_init(min: Option<u32>, max: Option<u32>) -> Option<RawPreInit> {
        Some(RawPreInit {
            enabled: Some(true),
            minimum_seats: min,
            maximum_seats: max,
            ..Default::default()
        })
    }

    fn compile(raws: &[RawApp]) -> Result<Vec<AppSpec>> {
        let defaults = PlatformDefaults::default();
        Compiler::new("acme", &defaults, "us-east-1").compile_apps(raws)
    }

    #[test]
    fn disabled_app_only_gets_the_namespace() {
        let mut r = raw("dash1");
        r.http_headers.insert("X-Custom".into(), "abc".into());
        r.container_env.insert("LOG_LEVEL".into(), "debug".into());

        let apps = compile(&[r]).unwrap();
        let app = &apps[0];
        assert_eq!(app.pre_init, PreInitPolicy::Disabled);
        assert_eq!(app.namespace, "acme:dash1");
        assert_eq!(
            app.headers,
            BTreeMap::from([("X-Custom".to_string(), "abc".to_string())])
        );
        assert_eq!(
            app.env,
            BTreeMap::from([
                ("LOG_LEVEL".to_string(), "debug".to_string()),
                ("REDIS_NAMESPACE".to_string(), "acme:dash1".to_string()),
            ])
        );
        assert_eq!(app.sharing(), None);
    }

    #[test]
    fn enabled_app_gets_pool_and_identity() {
        let mut r = raw("dash1");
        r.pre_initialization = pre_init(Some(2), None);

        let app = compile(&[r]).unwrap().remove(0);
        let pool = app.pre_init.pool().unwrap();
        assert_eq!((pool.min_seats, pool.max_seats), (2, 6));
        assert_eq!(app.headers["X-SP-TeamName"], "acme");
        assert_eq!(app.env["SP_CONTAINER_PRE_INIT"], "true");
        assert_eq!(app.env["REDIS_NAMESPACE"], "acme:dash1");
        assert_eq!(app.resources.task_definition, "acme-dash1-task");
    }

    #[test]
    fn output_preserves_input_order() {
        let apps = compile(&[raw("zeta"), raw("alpha"), raw("mid")]).unwrap();
        let ids: Vec<_> = apps.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn duplicate_ids_abort_the_run() {
        let err = compile(&[raw("app1"), raw("app2"), raw("app1")]).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateAppId { ref app, first: 0, second: 2 } if app == "app1"
        ));
    }

    #[test]
    fn one_bad_policy_aborts_the_run() {
        let mut bad = raw("bad");
        bad.pre_initialization = pre_init(Some(5), Some(2));
        let err = compile(&[raw("good"), bad]).unwrap_err();
        assert!(matches!(err, Error::InvalidPolicy { ref app, .. } if app == "bad"));
    }

    #[test]
    fn missing_id_reports_its_position() {
        let err = compile(&[raw("a"), RawApp::default()]).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingRequiredField { index: 1, field: "id" }
        ));
    }

    #[test]
    fn recompiling_a_merged_app_changes_nothing() {
        let mut r = raw("dash1");
        r.pre_initialization = pre_init(None, None);
        r.http_headers.insert("X-SP-UserId".into(), "spoofed".into());

        let first = compile(&[r.clone()]).unwrap().remove(0);

        // Feed the merged maps back in as if an author had written them.
        let mut again = r;
        again.http_headers = first.headers.iter().map(|(k, v)| (k.clone(), v.as_str().into())).collect();
        again.container_env = first.env.iter().map(|(k, v)| (k.clone(), v.as_str().into())).collect();
        let second = compile(&[again]).unwrap().remove(0);

        assert_eq!(first.headers, second.headers);
        assert_eq!(first.env, second.env);
    }

    #[test]
    fn summary_lines_show_namespace_and_pool() {
        let mut pooled = raw("dash1");
        pooled.pre_initialization = pre_init(Some(2), None);
        let apps = compile(&[pooled, raw("report")]).unwrap();
        let lines: Vec<_> = apps.iter().map(AppSpec::summary).collect();
        assert_eq!(
            lines,
            vec![
                "dash1\tacme:dash1\tpre-init 2..6 seats",
                "report\tacme:report\ton demand",
            ]
        );
    }
}
