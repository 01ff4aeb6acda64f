//! Spec layer: apps.yml schema, normalization, and resolved app types.
//!
//! This module is separate from compilation and rendering. It owns:
//! - the raw, serde-friendly entry shape (raw)
//! - structural defaults for one entry (normalize)
//! - pre-initialization policy resolution (preinit)
//! - the resolved AppSpec and its policy types (app)

pub mod app;
pub mod normalize;
pub mod preinit;
pub mod raw;

pub use app::{AppSpec, LogTarget, PoolPolicy, PreInitPolicy, ResourceBlock, SharingPolicy};
pub use normalize::{NormalizedApp, normalize};
pub use raw::{AppsDocument, RawApp, RawPreInit, RawSharing, scalar_string};
