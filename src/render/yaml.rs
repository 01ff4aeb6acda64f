use crate::compile::ProxySpec;
use crate::error::Error;
use crate::model::build_config_document;
use crate::Result;

/// Render the full platform configuration as YAML.
pub fn render_yaml(spec: &ProxySpec) -> Result<String> {
    let doc = build_config_document(spec);
    serde_yaml::to_string(&doc).map_err(Error::serialization)
}
