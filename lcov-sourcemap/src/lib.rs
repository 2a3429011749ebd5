// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Remap LCOV coverage of generated JavaScript onto the original sources, using source maps.
//!
//! The pipeline for one run:
//!
//! 1. parse the tracefile into one [`FileRecord`](lcov::FileRecord) per generated file;
//! 2. [`load`] the source map of every generated file, concurrently;
//! 3. [`remap`](remap::remap) each file's details through its map into a [`RecordStore`];
//! 4. drop records for files that are not on disk ([`output`]);
//! 5. serialize what is left as LCOV again.
//!
//! [`get_lcov`] and [`write_lcov`] run all of it.

use std::path::Path;

use anyhow::{Context, Result};
use lcov::LcovReport;
use log::*;

pub mod config;
pub mod error;
pub mod fs;
pub mod load;
pub mod normalize;
pub mod output;
pub mod remap;
pub mod resolve;
pub mod store;

pub use config::Config;
pub use error::RemapError;
pub use normalize::{Normalizer, SchemeRules, Strategy};
pub use remap::Options;
pub use resolve::{resolve, ResolvedPosition, SourceMapHandle};
pub use store::{Contribution, RecordStore, RemappedDetail};

/// Remap `lcov` text and return the resulting LCOV text.
///
/// Blocks are joined by a single newline, with no trailing newline.
pub async fn get_lcov(lcov: &str, config: &Config) -> Result<String> {
    let report = LcovReport::parse(lcov).context("unable to parse lcov input")?;
    let options = config.remap_options()?;

    let maps = load::load_maps(report.keys(), config).await?;
    let store = remap::remap(&report, &maps, &options)?;

    let records = if config.check_exists {
        output::filter_existing(
            store.into_records(),
            &options.source_dir,
            &options.unmapped_extension,
        )
        .await?
    } else {
        store.into_records()
    };

    Ok(lcov::write_report(&records))
}

/// Remap `lcov` text and write the result to `output`, creating parent directories as needed.
pub async fn write_lcov(lcov: &str, config: &Config, output: impl AsRef<Path>) -> Result<()> {
    let output = output.as_ref();
    let text = get_lcov(lcov, config).await?;

    fs::write_file(output, &text).await?;
    info!("wrote remapped coverage to {}", output.display());

    Ok(())
}
