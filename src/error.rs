//! Error types for spec compilation.

use thiserror::Error;

/// Boxed source error from a collaborator (store, environment, filesystem).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Every way a compilation run can fail. All variants abort the whole run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An entry lacks a field that has no default.
    #[error("app entry #{index} is missing required field `{field}`")]
    MissingRequiredField { index: usize, field: &'static str },

    /// A field is present but unusable.
    #[error("app `{app}`: invalid `{field}`: {reason}")]
    InvalidField {
        app: String,
        field: &'static str,
        reason: String,
    },

    /// The pre-initialization policy is internally inconsistent.
    #[error("app `{app}`: invalid pre-initialization policy: {reason}")]
    InvalidPolicy { app: String, reason: String },

    /// Two entries of the same team resolve to the same id.
    #[error("duplicate app id `{app}` (entries #{first} and #{second})")]
    DuplicateAppId {
        app: String,
        first: usize,
        second: usize,
    },

    /// A secret, parameter, document or environment read failed.
    #[error("failed to read {what}")]
    CollaboratorFailure {
        what: String,
        #[source]
        source: BoxError,
    },

    /// The apps document was read but does not have the expected shape.
    #[error("malformed apps document {location}")]
    InvalidDocument {
        location: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// The configuration could not be rendered or written.
    #[error("failed to render configuration: {0}")]
    SerializationFailure(#[source] BoxError),
}

impl Error {
    pub fn invalid_field(app: &str, field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            app: app.to_string(),
            field,
            reason: reason.into(),
        }
    }

    pub fn invalid_policy(app: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPolicy {
            app: app.to_string(),
            reason: reason.into(),
        }
    }

    pub fn collaborator(what: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::CollaboratorFailure {
            what: what.into(),
            source: source.into(),
        }
    }

    pub fn serialization(source: impl Into<BoxError>) -> Self {
        Self::SerializationFailure(source.into())
    }

    /// Id of the app the error is attributed to, if any.
    pub fn app(&self) -> Option<&str> {
        match self {
            Self::InvalidField { app, .. }
            | Self::InvalidPolicy { app, .. }
            | Self::DuplicateAppId { app, .. } => Some(app),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_id_is_reported_by_position() {
        let err = Error::MissingRequiredField {
            index: 3,
            field: "id",
        };
        assert_eq!(err.to_string(), "app entry #3 is missing required field `id`");
        assert_eq!(err.app(), None);
    }

    #[test]
    fn policy_errors_carry_the_app_id() {
        let err = Error::invalid_policy("dash1", "maximum-seats (2) < minimum-seats (5)");
        assert_eq!(err.app(), Some("dash1"));
        assert!(err.to_string().contains("dash1"));
        assert!(err.to_string().contains("maximum-seats (2)"));
    }

    #[test]
    fn duplicate_reports_both_entries() {
        let err = Error::DuplicateAppId {
            app: "app1".into(),
            first: 0,
            second: 2,
        };
        assert_eq!(
            err.to_string(),
            "duplicate app id `app1` (entries #0 and #2)"
        );
    }

    #[test]
    fn collaborator_failure_keeps_its_source() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such key");
        let err = Error::collaborator("secret acme/openid/client-secret", io);
        assert_eq!(
            err.to_string(),
            "failed to read secret acme/openid/client-secret"
        );
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("no such key"));
    }
}
