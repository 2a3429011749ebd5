// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::{self, Write};

use crate::{BranchDetail, FileRecord, FunctionDetail, LcovReport, LineDetail, Summary};

/// Emit LCOV records. Every record line is written with a trailing newline.
pub trait WriteLcov {
    fn write_lcov<W: Write>(&self, writer: &mut W) -> fmt::Result;
}

// FN:<line>,<name>
// FNF:<found>
// FNH:<hit>
// FNDA:<hit>,<name>
impl WriteLcov for Summary<FunctionDetail> {
    fn write_lcov<W: Write>(&self, writer: &mut W) -> fmt::Result {
        for function in self.details() {
            writeln!(writer, "FN:{},{}", function.line, function.name)?;
        }

        writeln!(writer, "FNF:{}", self.found())?;
        writeln!(writer, "FNH:{}", self.hit())?;

        for function in self.details() {
            writeln!(writer, "FNDA:{},{}", function.hit, function.name)?;
        }

        Ok(())
    }
}

// DA:<line>,<hit>
// LF:<found>
// LH:<hit>
impl WriteLcov for Summary<LineDetail> {
    fn write_lcov<W: Write>(&self, writer: &mut W) -> fmt::Result {
        for line in self.details() {
            writeln!(writer, "DA:{},{}", line.line, line.hit)?;
        }

        writeln!(writer, "LF:{}", self.found())?;
        writeln!(writer, "LH:{}", self.hit())?;

        Ok(())
    }
}

// BRDA:<line>,<block>,<branch>,<taken>
// BRF:<found>
// BRH:<hit>
impl WriteLcov for Summary<BranchDetail> {
    fn write_lcov<W: Write>(&self, writer: &mut W) -> fmt::Result {
        for branch in self.details() {
            writeln!(
                writer,
                "BRDA:{},{},{},{}",
                branch.line, branch.block, branch.branch, branch.taken
            )?;
        }

        writeln!(writer, "BRF:{}", self.found())?;
        writeln!(writer, "BRH:{}", self.hit())?;

        Ok(())
    }
}

impl WriteLcov for FileRecord {
    fn write_lcov<W: Write>(&self, writer: &mut W) -> fmt::Result {
        writeln!(writer, "TN:")?;
        writeln!(writer, "SF:{}", self.path)?;

        self.functions.write_lcov(writer)?;
        self.lines.write_lcov(writer)?;
        self.branches.write_lcov(writer)?;

        writeln!(writer, "end_of_record")
    }
}

impl WriteLcov for LcovReport {
    fn write_lcov<W: Write>(&self, writer: &mut W) -> fmt::Result {
        for file in self.files() {
            file.write_lcov(writer)?;
        }

        Ok(())
    }
}

/// One block, without a trailing newline.
impl fmt::Display for FileRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut block = String::new();
        self.write_lcov(&mut block)?;

        f.write_str(block.trim_end_matches('\n'))
    }
}

/// Render records as newline-joined blocks, in the given order.
pub fn write_report<'a>(records: impl IntoIterator<Item = &'a FileRecord>) -> String {
    records
        .into_iter()
        .map(|record| record.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
