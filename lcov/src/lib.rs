// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! # lcov
//!
//! Reading and writing of LCOV tracefiles, the line-oriented coverage format emitted by
//! `geninfo`, `c8`, `nyc`, `istanbul` and most JavaScript test runners.
//!
//! A tracefile is a sequence of per-file blocks:
//!
//! ```text
//! TN:
//! SF:src/a.js
//! FN:3,f
//! FNF:1
//! FNH:1
//! FNDA:5,f
//! DA:3,5
//! LF:1
//! LH:1
//! BRF:0
//! BRH:0
//! end_of_record
//! ```
//!
//! Each block parses to a [`FileRecord`], which holds three [`Summary`] collections (functions,
//! lines and branches). A `Summary` keeps its `found`/`hit` totals derived from its details, so
//! declared totals in the input (`FNF`, `LF`, ...) are never trusted.
//!
//! The same `FileRecord` type is used as the accumulator when coverage is rebuilt from other
//! data, e.g. when it is remapped through source maps: details are added one at a time and the
//! record serializes back to exactly one block via its `Display` impl.

mod parse;
mod record;
mod write;

pub use parse::{LcovReport, ParseError, ParseErrorKind};
pub use record::{BranchDetail, Detail, FileRecord, FunctionDetail, LineDetail, Summary};
pub use write::{write_report, WriteLcov};
