// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal remapping failures. Any of these aborts the whole run; no partial report is produced.
#[derive(Debug, Error)]
pub enum RemapError {
    #[error("missing source map: {key}")]
    MissingSourceMap { key: String },

    #[error("unable to load source map for {key}: {}", path.display())]
    SourceMap {
        key: String,
        path: PathBuf,
        source: srcmap::Error,
    },
}

impl RemapError {
    /// Coverage key the error refers to.
    pub fn key(&self) -> &str {
        match self {
            Self::MissingSourceMap { key } | Self::SourceMap { key, .. } => key,
        }
    }
}
