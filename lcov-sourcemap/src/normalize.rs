// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Turning the sources named by a source map into canonical, `source_dir`-relative paths.

use std::path::Path;

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;

use crate::resolve::SourceMapHandle;

/// Scheme markers stripped by default. These are what common bundlers write into `sources`.
pub const DEFAULT_SCHEMES: &[&str] = &[
    "webpack",
    "webpack-internal",
    "rollup",
    "vite",
    "turbopack",
    "file",
];

const FILE_SCHEME: &str = "file";

lazy_static! {
    static ref URL: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://").unwrap();
    static ref DEFAULT_RULES: SchemeRules =
        SchemeRules::new(DEFAULT_SCHEMES.iter().copied()).unwrap();
}

/// How the sources of one map are resolved, chosen once per map.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Strategy {
    /// The map declares a real `sourceRoot`. Its first occurrence in a source is replaced by
    /// `./`.
    SourceRoot(String),

    /// No usable `sourceRoot`: sources are relative to the directory of the map file.
    DirectoryRelative { map_dir: String },
}

impl Strategy {
    pub fn for_map<M>(map: &M) -> Self
    where
        M: SourceMapHandle + ?Sized,
    {
        match map.source_root() {
            Some(root) if !matches!(root, "" | "." | "./") => Self::SourceRoot(root.to_owned()),
            _ => {
                let map_dir = map
                    .path()
                    .parent()
                    .map(|dir| dir.to_string_lossy().into_owned())
                    .unwrap_or_default();

                Self::DirectoryRelative { map_dir }
            }
        }
    }

    fn apply(&self, raw: &str, source_dir: &str) -> String {
        match self {
            Self::SourceRoot(root) => raw.replacen(root.as_str(), "./", 1),
            Self::DirectoryRelative { .. } if URL.is_match(raw) => format!("./{raw}"),
            Self::DirectoryRelative { map_dir } => {
                let raw = collapse(raw);

                let path = if is_absolute(&raw) || map_dir.is_empty() {
                    raw
                } else {
                    collapse(&format!("{map_dir}/{raw}"))
                };

                if is_absolute(&path) {
                    relative_path(&path, source_dir)
                } else {
                    path
                }
            }
        }
    }
}

/// Bundler scheme prefixes to strip, e.g. `webpack:///src/a.js` to `src/a.js`.
#[derive(Clone, Debug)]
pub struct SchemeRules {
    schemes: Vec<String>,
    pattern: Regex,
}

impl SchemeRules {
    pub fn new(schemes: impl IntoIterator<Item = impl Into<String>>) -> Result<Self> {
        let schemes: Vec<String> = schemes.into_iter().map(Into::into).collect();

        let alternatives = schemes
            .iter()
            .map(|scheme| regex::escape(scheme))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = Regex::new(&format!(r"^(?:\./|/)?({alternatives})://(.*)$"))
            .context("invalid scheme rule")?;

        Ok(Self { schemes, pattern })
    }

    /// Default schemes plus `extra`.
    pub fn with_extra(extra: &[String]) -> Result<Self> {
        let schemes = DEFAULT_SCHEMES
            .iter()
            .map(|s| s.to_string())
            .chain(extra.iter().cloned());

        Self::new(schemes)
    }

    pub fn schemes(&self) -> &[String] {
        &self.schemes
    }

    /// Strip a recognised scheme prefix. `file://` paths keep their leading `/`.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        let captures = self.pattern.captures(path)?;
        let scheme = captures.get(1)?.as_str();
        let rest = captures.get(2)?.as_str();

        if scheme == FILE_SCHEME {
            Some(rest)
        } else {
            Some(rest.trim_start_matches('/'))
        }
    }
}

impl Default for SchemeRules {
    fn default() -> Self {
        DEFAULT_RULES.clone()
    }
}

/// Maps raw map sources to canonical paths relative to `source_dir`.
#[derive(Clone, Debug)]
pub struct Normalizer {
    source_dir: String,
    rules: SchemeRules,
}

impl Normalizer {
    /// `source_dir` should be absolute.
    pub fn new(source_dir: &Path, rules: SchemeRules) -> Self {
        Self {
            source_dir: collapse(&source_dir.to_string_lossy()),
            rules,
        }
    }

    pub fn normalize(&self, raw: &str, strategy: &Strategy) -> String {
        let path = strategy.apply(raw, &self.source_dir);
        self.canonicalize(&path)
    }

    /// Scheme stripping and segment collapsing, then made relative to `source_dir` if the
    /// result is an absolute path below it.
    pub fn canonicalize(&self, path: &str) -> String {
        let path = self.rules.strip(path).unwrap_or(path);
        let path = collapse(path);

        if is_absolute(&path) && is_within(&path, &self.source_dir) {
            relative_path(&path, &self.source_dir)
        } else {
            path
        }
    }
}

/// Root of an absolute path with `/` separators: `/`, a drive such as `C:/`, or `//` for a
/// UNC share. The rest of the path follows the root.
fn split_root(path: &str) -> (Option<&str>, &str) {
    let len = match path.as_bytes() {
        [b'/', b'/', ..] => 2,
        [b'/', ..] => 1,
        [drive, b':', b'/', ..] if drive.is_ascii_alphabetic() => 3,
        _ => return (None, path),
    };

    (Some(&path[..len]), &path[len..])
}

fn is_absolute(path: &str) -> bool {
    split_root(path).0.is_some()
}

// Drive letters are case-insensitive.
fn same_root(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        (None, None) => true,
        _ => false,
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn is_within(path: &str, dir: &str) -> bool {
    let (path_root, path) = split_root(path);
    let (dir_root, dir) = split_root(dir);

    let mut path = segments(path);
    same_root(path_root, dir_root) && segments(dir).all(|segment| path.next() == Some(segment))
}

/// Lexically normalize a path with `/` separators.
///
/// Backslashes become `/`, empty and `.` segments are dropped, and `..` removes the segment
/// before it. Leading `..` of a relative path are kept; at the root of an absolute path they
/// are dropped. Roots (`/`, `C:/`, `//`) are kept as written.
pub fn collapse(path: &str) -> String {
    let path = path.replace('\\', "/");
    let (root, rest) = split_root(&path);

    let mut out: Vec<&str> = vec![];

    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => match out.last() {
                Some(&last) if last != ".." => {
                    out.pop();
                }
                _ if root.is_some() => {}
                _ => out.push(".."),
            },
            _ => out.push(segment),
        }
    }

    let joined = out.join("/");

    match root {
        Some(root) => format!("{root}{joined}"),
        None => joined,
    }
}

/// Path from `base` to `path`, both absolute and collapsed.
///
/// Paths under different roots have no relative form and are returned unchanged.
pub fn relative_path(path: &str, base: &str) -> String {
    let (path_root, path_rest) = split_root(path);
    let (base_root, base_rest) = split_root(base);

    if !same_root(path_root, base_root) {
        return path.to_owned();
    }

    let path: Vec<&str> = segments(path_rest).collect();
    let base: Vec<&str> = segments(base_rest).collect();

    let common = path
        .iter()
        .zip(&base)
        .take_while(|(p, b)| p == b)
        .count();

    let mut out = vec![".."; base.len() - common];
    out.extend(&path[common..]);
    out.join("/")
}
