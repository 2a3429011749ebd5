// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::path::Path;

use log::*;
use srcmap::{Bias, OriginalPosition, SourceMap};

/// What the remapper needs from a loaded source map.
pub trait SourceMapHandle {
    /// See [`SourceMap::original_position_for`]. Lines are 1-indexed, columns 0-indexed.
    fn original_position_for(
        &self,
        line: u32,
        column: u32,
        bias: Bias,
    ) -> Option<OriginalPosition>;

    /// The declared `sourceRoot`, if any.
    fn source_root(&self) -> Option<&str>;

    /// Where the map was read from.
    fn path(&self) -> &Path;
}

impl SourceMapHandle for SourceMap {
    fn original_position_for(
        &self,
        line: u32,
        column: u32,
        bias: Bias,
    ) -> Option<OriginalPosition> {
        SourceMap::original_position_for(self, line, column, bias)
    }

    fn source_root(&self) -> Option<&str> {
        SourceMap::source_root(self)
    }

    fn path(&self) -> &Path {
        SourceMap::path(self)
    }
}

/// Original source and line for a generated line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedPosition {
    /// As reported by the map, joined with `sourceRoot` but not yet normalized.
    pub source: String,

    /// 1-indexed.
    pub line: u32,
}

/// Resolve the start of a generated line.
///
/// Coverage only knows lines, so the lookup is at column 0 with a least-upper-bound bias: an
/// exact mapping at the line start wins, otherwise the next mapping in generated order, which
/// may be on a later line. Returns `None` if that mapping has no source, or there is none.
pub fn resolve<M>(map: &M, generated_line: u32) -> Option<ResolvedPosition>
where
    M: SourceMapHandle + ?Sized,
{
    let position = map.original_position_for(generated_line, 0, Bias::LeastUpperBound);

    match position {
        Some(OriginalPosition {
            source: Some(source),
            line: Some(line),
            ..
        }) => Some(ResolvedPosition { source, line }),
        _ => {
            trace!(
                "no original position for {}:{}",
                map.path().display(),
                generated_line
            );
            None
        }
    }
}
