// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! # srcmap
//!
//! A small consumer for revision 3 JavaScript source maps: enough to ask "which original file
//! and line does this generated position come from?".
//!
//! - [`vlq`] decodes the base64 VLQ fields of the `mappings` string.
//! - [`Mappings`] expands `mappings` into absolute, position-sorted [`Mapping`]s.
//! - [`SourceMap`] ties mappings to `sources`/`sourceRoot`/`names` and answers
//!   [`SourceMap::original_position_for`] queries with a [`Bias`].
//! - [`inline`] pulls a map out of a `//# sourceMappingURL=data:...` comment in generated code.
//!
//! Lines are 1-indexed and columns 0-indexed, matching what coverage tools and the usual
//! JavaScript consumers report.
//!
//! ```
//! use srcmap::{Bias, SourceMap};
//!
//! let json = r#"{
//!     "version": 3,
//!     "sources": ["src/app.ts"],
//!     "names": [],
//!     "mappings": "AAAA;;AAEA"
//! }"#;
//!
//! let map = SourceMap::from_str("dist/app.js.map", json).unwrap();
//!
//! // Generated line 2 has no mapping; the nearest later mapping is on line 3.
//! let pos = map.original_position_for(2, 0, Bias::LeastUpperBound).unwrap();
//! assert_eq!(pos.source.as_deref(), Some("src/app.ts"));
//! assert_eq!(pos.line, Some(3));
//! ```

mod error;
pub mod inline;
mod mappings;
mod sourcemap;
pub mod vlq;

pub use error::Error;
pub use mappings::{Mapping, Mappings, Original};
pub use sourcemap::{Bias, OriginalPosition, SourceMap};
