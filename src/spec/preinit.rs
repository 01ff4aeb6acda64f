//! Pre-initialization policy resolution.
//!
//! Explicit values in the block always win. Each missing value falls back to
//! its own platform default; defaults never derive from one another, except
//! `maximum-seats`, which scales the resolved `minimum-seats`.

use crate::error::Error;
use crate::settings::PlatformDefaults;
use crate::spec::app::{PoolPolicy, PreInitPolicy, SharingPolicy};
use crate::spec::raw::{RawPreInit, RawSharing};
use crate::Result;
use tracing::warn;

pub fn resolve(
    app: &str,
    block: Option<&RawPreInit>,
    defaults: &PlatformDefaults,
) -> Result<PreInitPolicy> {
    let block = match block {
        Some(b) if b.enabled.unwrap_or(false) => b,
        Some(b) => {
            if b.sharing.as_ref().is_some_and(|s| s.enabled.unwrap_or(false)) {
                warn!(app = %app, "sharing is enabled but pre-initialization is not; ignoring sharing");
            }
            return Ok(PreInitPolicy::Disabled);
        }
        None => return Ok(PreInitPolicy::Disabled),
    };

    let min_seats = block.minimum_seats.unwrap_or(defaults.minimum_seats);
    if min_seats == 0 {
        return Err(Error::invalid_policy(app, "minimum-seats must be at least 1"));
    }

    let max_seats = match block.maximum_seats {
        Some(max) => max,
        None => min_seats
            .checked_mul(defaults.max_seats_multiplier)
            .ok_or_else(|| {
                Error::invalid_policy(
                    app,
                    format!(
                        "default maximum-seats overflows ({} * {})",
                        min_seats, defaults.max_seats_multiplier
                    ),
                )
            })?,
    };
    if max_seats < min_seats {
        return Err(Error::invalid_policy(
            app,
            format!(
                "maximum-seats ({}) is less than minimum-seats ({})",
                max_seats, min_seats
            ),
        ));
    }

    let sharing = match &block.sharing {
        Some(raw) => resolve_sharing(app, raw, defaults)?,
        None => SharingPolicy::disabled(),
    };

    Ok(PreInitPolicy::Enabled(PoolPolicy {
        min_seats,
        max_seats,
        wait_time_ms: block.wait_time.unwrap_or(defaults.wait_time),
        idle_timeout_ms: block.idle_timeout.unwrap_or(defaults.idle_timeout),
        sharing,
    }))
}

fn resolve_sharing(app: &str, raw: &RawSharing, defaults: &PlatformDefaults) -> Result<SharingPolicy> {
    if !raw.enabled.unwrap_or(false) {
        return Ok(SharingPolicy::disabled());
    }

    let policy = SharingPolicy {
        enabled: true,
        allowed_users: raw.allowed_users.iter().cloned().collect(),
        allowed_groups: raw.allowed_groups.iter().cloned().collect(),
    };

    if policy.is_ineffective() {
        if defaults.strict_sharing {
            return Err(Error::invalid_policy(
                app,
                "sharing is enabled but allowed-users and allowed-groups are both empty",
            ));
        }
        warn!(app = %app, "sharing is enabled with empty allowed-users and allowed-groups; it has no effect");
    }

    Ok(policy)
}
