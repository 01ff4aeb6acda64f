//! Rendering and writing the configuration document.

pub mod yaml;

pub use yaml::render_yaml;

use crate::compile::ProxySpec;
use crate::error::Error;
use crate::Result;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// Where a rendered configuration goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

impl From<&str> for Destination {
    /// `-` means stdout.
    fn from(s: &str) -> Self {
        match s {
            "-" => Destination::Stdout,
            path => Destination::File(PathBuf::from(path)),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Stdout => f.write_str("<stdout>"),
            Destination::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Render `spec` completely, then write it. A file destination is replaced
/// atomically: readers see the old document or the new one, never a prefix.
pub fn write(spec: &ProxySpec, dest: &Destination) -> Result<()> {
    let text = render_yaml(spec)?;

    match dest {
        Destination::Stdout => {
            let mut out = std::io::stdout().lock();
            out.write_all(text.as_bytes())
                .and_then(|_| out.flush())
                .map_err(Error::serialization)?;
        }
        Destination::File(path) => {
            let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
                Some(parent) => {
                    fs::create_dir_all(parent).map_err(Error::serialization)?;
                    parent
                }
                None => Path::new("."),
            };
            // Unique name in the destination directory, so concurrent writers
            // never share a temp file and the rename stays on one filesystem.
            let mut tmp = NamedTempFile::new_in(dir).map_err(Error::serialization)?;
            tmp.write_all(text.as_bytes())
                .and_then(|_| tmp.as_file().sync_all())
                .map_err(Error::serialization)?;
            tmp.persist(path).map_err(|e| Error::serialization(e.error))?;
        }
    }

    info!(team = %spec.team, dest = %dest, "Configuration written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_is_stdout() {
        assert_eq!(Destination::from("-"), Destination::Stdout);
        assert_eq!(
            Destination::from("/opt/shinyproxy/application.yml"),
            Destination::File(PathBuf::from("/opt/shinyproxy/application.yml"))
        );
    }
}
