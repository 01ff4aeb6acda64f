//! Session-store isolation keys.

use crate::error::Error;
use crate::Result;
use std::collections::BTreeMap;

/// Env variable the container reads its Redis key prefix from.
pub const NAMESPACE_ENV: &str = "REDIS_NAMESPACE";

pub fn namespace(team: &str, id: &str) -> String {
    format!("{}:{}", team, id)
}

/// Copy of `env` with the namespace set, replacing any author value.
pub fn inject(env: &BTreeMap<String, String>, namespace: &str) -> BTreeMap<String, String> {
    let mut env = env.clone();
    env.insert(NAMESPACE_ENV.to_string(), namespace.to_string());
    env
}

/// Ids seen so far in one compilation run, with their entry positions.
#[derive(Debug, Default)]
pub struct SeenIds(BTreeMap<String, usize>);

impl SeenIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, id: &str, index: usize) -> Result<()> {
        if let Some(&first) = self.0.get(id) {
            return Err(Error::DuplicateAppId {
                app: id.to_string(),
                first,
                second: index,
            });
        }
        self.0.insert(id.to_string(), index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn namespace_is_team_colon_id() {
        assert_eq!(namespace("acme", "dash1"), "acme:dash1");
    }

    #[test]
    fn injection_overrides_author_value() {
        let mut env = BTreeMap::new();
        env.insert(NAMESPACE_ENV.to_string(), "elsewhere".to_string());
        env.insert("KEEP".to_string(), "1".to_string());

        let out = inject(&env, "acme:dash1");
        assert_eq!(out[NAMESPACE_ENV], "acme:dash1");
        assert_eq!(out["KEEP"], "1");
        assert_eq!(env[NAMESPACE_ENV], "elsewhere");
    }

    #[test]
    fn second_claim_of_an_id_fails() {
        let mut seen = SeenIds::new();
        seen.claim("app1", 0).unwrap();
        seen.claim("app2", 1).unwrap();
        let err = seen.claim("app1", 2).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateAppId { ref app, first: 0, second: 2 } if app == "app1"
        ));
    }

    #[test]
    fn ids_are_case_sensitive() {
        let mut seen = SeenIds::new();
        seen.claim("App1", 0).unwrap();
        seen.claim("app1", 1).unwrap();
    }

    proptest! {
        #[test]
        fn namespace_is_deterministic(team in "[a-z0-9-]{1,16}", id in "[A-Za-z0-9_-]{1,16}") {
            let ns = namespace(&team, &id);
            prop_assert_eq!(&ns, &namespace(&team, &id));
            prop_assert_eq!(ns, format!("{}:{}", team, id));
        }
    }
}
