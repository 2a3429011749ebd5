// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use thiserror::Error;

use crate::vlq::VlqError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unable to read source map")]
    Io(#[from] std::io::Error),

    #[error("invalid source map json")]
    Json(#[from] serde_json::Error),

    #[error("unsupported source map version: {0}")]
    UnsupportedVersion(u32),

    #[error("indexed source maps (`sections`) are not supported")]
    IndexedMap,

    #[error("invalid vlq on generated line {line}")]
    Vlq { line: u32, source: VlqError },

    #[error("invalid mapping on generated line {line}: {reason}")]
    InvalidMapping { line: u32, reason: String },

    #[error("no inline `sourceMappingURL` data url found")]
    MissingInlineMap,

    #[error("unsupported `sourceMappingURL` data url: {0}")]
    InvalidDataUrl(String),

    #[error("invalid base64 in inline source map")]
    Base64(#[from] base64::DecodeError),
}
