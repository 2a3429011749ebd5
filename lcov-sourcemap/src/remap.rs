// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use lcov::{BranchDetail, FileRecord, FunctionDetail, LcovReport, LineDetail};
use log::*;

use crate::config::DEFAULT_UNMAPPED_EXTENSION;
use crate::error::RemapError;
use crate::normalize::{Normalizer, SchemeRules, Strategy};
use crate::resolve::{resolve, SourceMapHandle};
use crate::store::{Contribution, RecordStore};

/// Engine settings. See [`Config`](crate::Config) for the user-facing form.
#[derive(Clone, Debug)]
pub struct Options {
    /// Absolute base directory that output paths are relative to.
    pub source_dir: PathBuf,

    pub pass_through: bool,
    pub unmapped_extension: String,
    pub schemes: SchemeRules,
}

impl Options {
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            pass_through: false,
            unmapped_extension: DEFAULT_UNMAPPED_EXTENSION.to_owned(),
            schemes: SchemeRules::default(),
        }
    }

    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(&self.source_dir, self.schemes.clone())
    }
}

/// Remap every generated file of `inputs` through its map in `maps`.
///
/// Files are processed in input order, and the records of the result are in order of first
/// contribution. A key with no map fails the whole remap unless pass-through is enabled, in
/// which case its coverage is kept unchanged under `<key><unmapped_extension>`.
pub fn remap<M>(
    inputs: &LcovReport,
    maps: &BTreeMap<String, M>,
    options: &Options,
) -> Result<RecordStore, RemapError>
where
    M: SourceMapHandle,
{
    let normalizer = options.normalizer();

    let per_file = inputs
        .files()
        .map(|record| {
            let key = record.path.as_str();

            match maps.get(key) {
                Some(map) => Ok(contributions(key, record, map, &normalizer)),
                None if options.pass_through => {
                    debug!("no source map for {}, passing through", key);
                    Ok(pass_through(
                        key,
                        record,
                        &normalizer,
                        &options.unmapped_extension,
                    ))
                }
                None => Err(RemapError::MissingSourceMap {
                    key: key.to_owned(),
                }),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let store: RecordStore = per_file.into_iter().flatten().collect();

    info!(
        "remapped {} generated files onto {} original files",
        inputs.len(),
        store.len()
    );

    Ok(store)
}

/// Remap the details of one generated file.
///
/// Details whose generated line has no original position are dropped. Everything except the
/// line number is carried over unchanged.
pub fn contributions<M>(
    key: &str,
    record: &FileRecord,
    map: &M,
    normalizer: &Normalizer,
) -> Vec<Contribution>
where
    M: SourceMapHandle + ?Sized,
{
    let strategy = Strategy::for_map(map);

    // Functions, lines and branches mostly share generated lines.
    let mut cache: HashMap<u32, Option<(String, u32)>> = HashMap::new();
    let mut locate = |line: u32| {
        cache
            .entry(line)
            .or_insert_with(|| {
                resolve(map, line)
                    .map(|pos| (normalizer.normalize(&pos.source, &strategy), pos.line))
            })
            .clone()
    };

    let mut out = vec![];
    let mut dropped = 0;

    for function in record.functions.details() {
        match locate(function.line) {
            Some((path, line)) => out.push(Contribution::function(
                path,
                FunctionDetail::new(function.name.clone(), line, function.hit),
            )),
            None => dropped += 1,
        }
    }

    for line in record.lines.details() {
        match locate(line.line) {
            Some((path, original)) => {
                out.push(Contribution::line(path, LineDetail::new(original, line.hit)))
            }
            None => dropped += 1,
        }
    }

    for branch in record.branches.details() {
        match locate(branch.line) {
            Some((path, line)) => out.push(Contribution::branch(
                path,
                BranchDetail::new(line, branch.block, branch.branch, branch.taken),
            )),
            None => dropped += 1,
        }
    }

    debug!(
        "{}: {} details remapped, {} without an original position",
        key,
        out.len(),
        dropped
    );

    out
}

/// Identity contributions for a generated file without a map.
pub fn pass_through(
    key: &str,
    record: &FileRecord,
    normalizer: &Normalizer,
    unmapped_extension: &str,
) -> Vec<Contribution> {
    let path = normalizer.canonicalize(&format!("{key}{unmapped_extension}"));

    let functions = record
        .functions
        .details()
        .iter()
        .map(|f| Contribution::function(path.clone(), f.clone()));

    let lines = record
        .lines
        .details()
        .iter()
        .map(|l| Contribution::line(path.clone(), *l));

    let branches = record
        .branches
        .details()
        .iter()
        .map(|b| Contribution::branch(path.clone(), *b));

    functions.chain(lines).chain(branches).collect()
}
