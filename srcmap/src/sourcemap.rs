// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::path::{Path, PathBuf};

use log::*;
use serde::Deserialize;

use crate::{inline, Error, Mapping, Mappings};

/// Tie-break for positions that have no exact mapping.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Bias {
    /// Nearest mapping at or before the position.
    GreatestLowerBound,

    /// Nearest mapping at or after the position.
    LeastUpperBound,
}

/// Result of a position lookup.
///
/// `source` is `None` when the closest mapping covers generated-only code. When present, it has
/// already been joined with the map's `sourceRoot`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OriginalPosition {
    pub source: Option<String>,

    /// 1-indexed.
    pub line: Option<u32>,

    /// 0-indexed.
    pub column: Option<u32>,

    pub name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSourceMap {
    version: u32,

    #[serde(default)]
    file: Option<String>,

    #[serde(default)]
    source_root: Option<String>,

    #[serde(default)]
    sources: Vec<Option<String>>,

    #[serde(default)]
    names: Vec<String>,

    #[serde(default)]
    mappings: String,

    #[serde(default)]
    sections: Option<serde_json::Value>,
}

/// A parsed revision 3 source map, plus the path it was read from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SourceMap {
    path: PathBuf,
    file: Option<String>,
    source_root: Option<String>,
    sources: Vec<Option<String>>,
    names: Vec<String>,
    mappings: Mappings,
}

impl SourceMap {
    /// Parse source map JSON.
    ///
    /// # Arguments
    ///
    /// * `path` - Where the map lives. Not read; used to resolve map-relative sources.
    /// * `data` - The JSON text of the map.
    ///
    /// # Errors
    ///
    /// If the JSON is invalid, the version is not 3, the map is an indexed map, or `mappings`
    /// cannot be decoded.
    pub fn from_slice(path: impl Into<PathBuf>, data: &[u8]) -> Result<Self, Error> {
        // Maps served over HTTP may start with `)]}'` to defeat XSSI.
        let data = match data.iter().position(|&b| b == b'\n') {
            Some(newline) if data.starts_with(b")]}") => &data[newline + 1..],
            _ => data,
        };

        let raw: RawSourceMap = serde_json::from_slice(data)?;
        Self::from_raw(path.into(), raw)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(path: impl Into<PathBuf>, text: &str) -> Result<Self, Error> {
        Self::from_slice(path, text.as_bytes())
    }

    /// Parse the map embedded in a `sourceMappingURL` data url comment of generated code.
    ///
    /// # Errors
    ///
    /// If there is no such comment, or its payload is not a valid source map.
    pub fn from_source_text(path: impl Into<PathBuf>, text: &str) -> Result<Self, Error> {
        let json = inline::extract(text)?;
        Self::from_slice(path, &json)
    }

    /// Read a map from disk.
    ///
    /// A `.map` file is parsed as JSON. Any other file is taken to be generated code with an
    /// inline map.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        Self::from_contents(path, &data)
    }

    /// Parse the already-read contents of `path`, choosing JSON or inline by extension, as
    /// [`SourceMap::from_path`] does.
    pub fn from_contents(path: impl Into<PathBuf>, data: &[u8]) -> Result<Self, Error> {
        let path = path.into();

        if is_map_file(&path) {
            Self::from_slice(path, data)
        } else {
            let text = String::from_utf8_lossy(data);
            Self::from_source_text(path, &text)
        }
    }

    fn from_raw(path: PathBuf, raw: RawSourceMap) -> Result<Self, Error> {
        if raw.sections.is_some() {
            return Err(Error::IndexedMap);
        }

        if raw.version != 3 {
            return Err(Error::UnsupportedVersion(raw.version));
        }

        let mappings = Mappings::parse(&raw.mappings)?;

        debug!(
            "parsed source map {}: {} sources, {} mappings",
            path.display(),
            raw.sources.len(),
            mappings.len()
        );

        Ok(Self {
            path,
            file: raw.file,
            source_root: raw.source_root,
            sources: raw.sources,
            names: raw.names,
            mappings,
        })
    }

    /// Path of the map file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The generated file the map describes, if declared.
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// Declared `sourceRoot`, exactly as written (may be empty).
    pub fn source_root(&self) -> Option<&str> {
        self.source_root.as_deref()
    }

    /// Sources joined with `sourceRoot`. Null entries are skipped.
    pub fn sources(&self) -> impl Iterator<Item = String> + '_ {
        self.sources
            .iter()
            .flatten()
            .map(|source| self.join_source_root(source))
    }

    pub fn mappings(&self) -> &Mappings {
        &self.mappings
    }

    /// Find the original position for a generated position.
    ///
    /// Returns `None` if no mapping satisfies `bias`.
    ///
    /// # Arguments
    ///
    /// * `line` - 1-indexed generated line
    /// * `column` - 0-indexed generated column
    /// * `bias` - Which neighbour to use when there is no exact mapping
    pub fn original_position_for(
        &self,
        line: u32,
        column: u32,
        bias: Bias,
    ) -> Option<OriginalPosition> {
        let mapping = match bias {
            Bias::LeastUpperBound => self.mappings.least_upper_bound(line, column),
            Bias::GreatestLowerBound => self.mappings.greatest_lower_bound(line, column),
        }?;

        Some(self.position_of(mapping))
    }

    fn position_of(&self, mapping: &Mapping) -> OriginalPosition {
        let original = match mapping.original {
            Some(original) => original,
            None => return OriginalPosition::default(),
        };

        let source = self
            .sources
            .get(original.source as usize)
            .and_then(|source| source.as_deref())
            .map(|source| self.join_source_root(source));

        if source.is_none() {
            trace!(
                "mapping at {}:{} references unknown source {}",
                mapping.generated_line,
                mapping.generated_column,
                original.source
            );
        }

        let name = original
            .name
            .and_then(|name| self.names.get(name as usize))
            .cloned();

        OriginalPosition {
            source,
            line: Some(original.line),
            column: Some(original.column),
            name,
        }
    }

    fn join_source_root(&self, source: &str) -> String {
        match self.source_root.as_deref() {
            None | Some("") => source.to_owned(),
            Some(_) if source.starts_with('/') || has_scheme(source) => source.to_owned(),
            Some(root) => format!("{}/{}", root.trim_end_matches('/'), source),
        }
    }
}

fn is_map_file(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "map")
}

/// True for URL-like strings such as `webpack:///src/a.js` or `file:///a.js`.
pub(crate) fn has_scheme(text: &str) -> bool {
    match text.find("://") {
        Some(end) if end > 0 => {
            let scheme = &text[..end];
            scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn map(json: &str) -> SourceMap {
        SourceMap::from_str("dist/bundle.js.map", json).unwrap()
    }

    #[test]
    fn test_least_upper_bound_crosses_lines() {
        let sm = map(r#"{"version":3,"sources":["a.ts"],"names":[],"mappings":";;AAEA;AACA"}"#);

        let pos = sm
            .original_position_for(1, 0, Bias::LeastUpperBound)
            .unwrap();
        assert_eq!(pos.source.as_deref(), Some("a.ts"));
        assert_eq!(pos.line, Some(3));

        let pos = sm
            .original_position_for(4, 0, Bias::LeastUpperBound)
            .unwrap();
        assert_eq!(pos.line, Some(4));

        assert_eq!(sm.original_position_for(5, 0, Bias::LeastUpperBound), None);
    }

    #[test]
    fn test_greatest_lower_bound() {
        let sm = map(r#"{"version":3,"sources":["a.ts"],"names":[],"mappings":";;AAEA;AACA"}"#);

        assert_eq!(sm.original_position_for(2, 0, Bias::GreatestLowerBound), None);

        let pos = sm
            .original_position_for(9, 0, Bias::GreatestLowerBound)
            .unwrap();
        assert_eq!(pos.line, Some(4));
    }

    #[test]
    fn test_sourceless_mapping() {
        let sm = map(r#"{"version":3,"sources":["a.ts"],"names":[],"mappings":"A;AAAA"}"#);

        let pos = sm
            .original_position_for(1, 0, Bias::LeastUpperBound)
            .unwrap();
        assert_eq!(pos, OriginalPosition::default());
    }

    #[test]
    fn test_source_root_join() {
        let sm = map(
            r#"{"version":3,"sourceRoot":"/app/src/","sources":["a.ts","/abs/b.ts","webpack:///c.ts"],"names":[],"mappings":"AAAA"}"#,
        );

        assert_eq!(sm.source_root(), Some("/app/src/"));
        assert_eq!(
            sm.sources().collect::<Vec<_>>(),
            vec!["/app/src/a.ts", "/abs/b.ts", "webpack:///c.ts"]
        );

        let pos = sm
            .original_position_for(1, 0, Bias::LeastUpperBound)
            .unwrap();
        assert_eq!(pos.source.as_deref(), Some("/app/src/a.ts"));
    }

    #[test]
    fn test_names() {
        let sm = map(r#"{"version":3,"sources":["a.ts"],"names":["main"],"mappings":"AAAAA"}"#);

        let pos = sm
            .original_position_for(1, 0, Bias::LeastUpperBound)
            .unwrap();
        assert_eq!(pos.name.as_deref(), Some("main"));
        assert_eq!(pos.column, Some(0));
    }

    #[test]
    fn test_xssi_prefix() {
        let sm = map(")]}'\n{\"version\":3,\"sources\":[],\"names\":[],\"mappings\":\"\"}");
        assert!(sm.mappings().is_empty());
    }

    #[test]
    fn test_rejects_unsupported_maps() {
        let v2 = SourceMap::from_str("a.map", r#"{"version":2,"sources":[],"mappings":""}"#);
        assert!(matches!(v2, Err(Error::UnsupportedVersion(2))));

        let indexed = SourceMap::from_str("a.map", r#"{"version":3,"sections":[]}"#);
        assert!(matches!(indexed, Err(Error::IndexedMap)));

        let garbage = SourceMap::from_str("a.map", "not json");
        assert!(matches!(garbage, Err(Error::Json(_))));
    }

    #[test]
    fn test_from_contents_dispatches_on_extension() {
        let json = r#"{"version":3,"sources":["a.ts"],"names":[],"mappings":"AAAA"}"#;
        let sm = SourceMap::from_contents("out/a.js.map", json.as_bytes()).unwrap();
        assert_eq!(sm.path(), Path::new("out/a.js.map"));

        let inline = SourceMap::from_contents("out/a.js", json.as_bytes());
        assert!(matches!(inline, Err(Error::MissingInlineMap)));
    }

    #[test]
    fn test_has_scheme() {
        assert!(has_scheme("webpack:///src/a.js"));
        assert!(has_scheme("webpack-internal:///./a.js"));
        assert!(has_scheme("file:///a.js"));
        assert!(!has_scheme("src/a.js"));
        assert!(!has_scheme("://a.js"));
        assert!(!has_scheme("./x://a.js"));
    }
}
