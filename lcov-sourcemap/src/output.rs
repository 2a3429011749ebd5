// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::path::{Path, PathBuf};

use anyhow::Result;
use futures::future::join_all;
use lcov::FileRecord;
use log::*;

use crate::fs::exists;

/// Keep only records whose file exists under `source_dir`.
///
/// Pass-through records, whose path ends in `unmapped_extension`, are checked against the
/// generated file they were copied from. Missing files are dropped with a warning.
pub async fn filter_existing(
    records: Vec<FileRecord>,
    source_dir: &Path,
    unmapped_extension: &str,
) -> Result<Vec<FileRecord>> {
    let probes: Vec<PathBuf> = records
        .iter()
        .map(|record| probe_path(&record.path, source_dir, unmapped_extension))
        .collect();

    let found = join_all(probes.iter().map(|path| exists(path))).await;

    let total = records.len();
    let mut kept = Vec::with_capacity(total);

    for (record, present) in records.into_iter().zip(found) {
        if present? {
            kept.push(record);
        } else {
            warn!("skipping coverage for missing file: {}", record.path);
        }
    }

    info!("{} of {} remapped files found on disk", kept.len(), total);

    Ok(kept)
}

fn probe_path(path: &str, source_dir: &Path, unmapped_extension: &str) -> PathBuf {
    let path = match path.strip_suffix(unmapped_extension) {
        Some(generated) if !unmapped_extension.is_empty() => generated,
        _ => path,
    };

    source_dir.join(path)
}
