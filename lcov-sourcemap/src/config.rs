// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use path_absolutize::Absolutize;
use serde::Deserialize;

use crate::normalize::SchemeRules;
use crate::remap::Options;

pub const DEFAULT_MAP_SUFFIX: &str = ".map";
pub const DEFAULT_UNMAPPED_EXTENSION: &str = ".unmapped";

/// Settings for a remapping run.
///
/// Every field is optional in JSON form; missing fields take their defaults.
///
/// ```json
/// {
///     "source_dir": "packages/app",
///     "maps": { "dist/vendor.js": "build/maps/vendor.js.map" },
///     "pass_through": true,
///     "schemes": ["esbuild"]
/// }
/// ```
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base for path resolution and output existence checks.
    pub source_dir: PathBuf,

    /// Appended to a coverage key to locate its source map, when `maps` has no entry for it.
    pub map_suffix: String,

    /// Explicit coverage key to source map path pairs.
    pub maps: BTreeMap<String, PathBuf>,

    /// Keep coverage for files without a source map, under `<key><unmapped_extension>`,
    /// instead of failing.
    pub pass_through: bool,

    pub unmapped_extension: String,

    /// Bundler URL schemes to strip, in addition to the built-in ones.
    pub schemes: Vec<String>,

    /// Drop remapped records whose file does not exist under `source_dir`.
    pub check_exists: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            map_suffix: DEFAULT_MAP_SUFFIX.to_owned(),
            maps: BTreeMap::new(),
            pass_through: false,
            unmapped_extension: DEFAULT_UNMAPPED_EXTENSION.to_owned(),
            schemes: vec![],
            check_exists: true,
        }
    }
}

impl Config {
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            ..Self::default()
        }
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let data = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("unable to read config: {}", path.display()))?;

        let config = serde_json::from_str(&data)
            .with_context(|| format!("invalid config: {}", path.display()))?;

        Ok(config)
    }

    /// Absolute form of `source_dir`, resolved against the current directory.
    pub fn absolute_source_dir(&self) -> Result<PathBuf> {
        let dir = self.source_dir.absolutize().with_context(|| {
            format!(
                "unable to resolve source directory: {}",
                self.source_dir.display()
            )
        })?;

        Ok(dir.into_owned())
    }

    /// Where the source map of a coverage key lives.
    pub fn map_path(&self, key: &str) -> PathBuf {
        match self.maps.get(key) {
            Some(path) => path.clone(),
            None => PathBuf::from(format!("{key}{}", self.map_suffix)),
        }
    }

    pub fn scheme_rules(&self) -> Result<SchemeRules> {
        SchemeRules::with_extra(&self.schemes)
    }

    pub fn remap_options(&self) -> Result<Options> {
        Ok(Options {
            source_dir: self.absolute_source_dir()?,
            pass_through: self.pass_through,
            unmapped_extension: self.unmapped_extension.clone(),
            schemes: self.scheme_rules()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_defaults_from_empty_json() -> Result<()> {
        let config: Config = serde_json::from_str("{}")?;
        assert_eq!(config, Config::default());
        assert!(config.check_exists);
        assert_eq!(config.map_suffix, ".map");
        Ok(())
    }

    #[test]
    fn test_partial_json() -> Result<()> {
        let config: Config = serde_json::from_str(
            r#"{"source_dir": "app", "pass_through": true, "maps": {"dist/a.js": "maps/a.map"}}"#,
        )?;

        assert_eq!(config.source_dir, PathBuf::from("app"));
        assert!(config.pass_through);
        assert_eq!(config.unmapped_extension, ".unmapped");
        assert_eq!(config.map_path("dist/a.js"), PathBuf::from("maps/a.map"));
        assert_eq!(config.map_path("dist/b.js"), PathBuf::from("dist/b.js.map"));
        Ok(())
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result = serde_json::from_str::<Config>(r#"{"sourceDir": "app"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_absolute_source_dir() -> Result<()> {
        let config = Config::new("some/dir");
        let dir = config.absolute_source_dir()?;
        assert!(dir.is_absolute());
        assert!(dir.ends_with("some/dir"));
        Ok(())
    }
}
