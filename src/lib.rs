//! Compile a team's apps.yml into container-proxy platform configuration.

pub mod compile;
pub mod error;
pub mod model;
pub mod render;
pub mod settings;
pub mod source;
pub mod spec;

pub use compile::{Compiler, Generator, ProxySpec};
pub use error::Error;
pub use render::{Destination, render_yaml, write};
pub use settings::{Deployment, PlatformDefaults};

pub type Result<T> = std::result::Result<T, Error>;
