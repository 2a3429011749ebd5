// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;

use log::*;

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{char, u32, u64};
use nom::combinator::{all_consuming, map, opt, rest, value};
use nom::sequence::{preceded, separated_pair, terminated, tuple};
use nom::IResult;
use thiserror::Error;

use crate::{BranchDetail, FileRecord, FunctionDetail, LineDetail};

#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("invalid lcov at line {line}: {kind}")]
pub struct ParseError {
    /// 1-indexed line of the tracefile.
    pub line: usize,
    pub kind: ParseErrorKind,
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error("malformed `{0}` record")]
    Malformed(String),

    #[error("`{0}` record outside of a `SF` block")]
    OutsideFile(String),

    #[error("`SF` record inside unterminated block for `{0}`")]
    Unterminated(String),
}

/// One line of a tracefile.
#[derive(Clone, Debug, Eq, PartialEq)]
enum Entry<'a> {
    TestName,
    SourceFile(&'a str),
    Function { line: u32, name: &'a str },
    FunctionHit { hit: u64, name: &'a str },
    Line { line: u32, hit: u64 },
    Branch(BranchDetail),
    EndOfRecord,

    // Totals (`FNF`, `LH`, ...) and anything we don't understand, e.g. `VER:`.
    Ignored,
}

impl<'a> Entry<'a> {
    fn parse_source_file(input: &'a str) -> IResult<&'a str, Self> {
        map(preceded(tag("SF:"), rest), Entry::SourceFile)(input)
    }

    fn parse_function(input: &'a str) -> IResult<&'a str, Self> {
        // `FN:<line>[,<end_line>],<name>`
        map(
            preceded(
                tag("FN:"),
                tuple((u32, char(','), opt(terminated(u32, char(','))), rest)),
            ),
            |(line, _, _, name)| Entry::Function { line, name },
        )(input)
    }

    fn parse_function_hit(input: &'a str) -> IResult<&'a str, Self> {
        map(
            preceded(tag("FNDA:"), separated_pair(u64, char(','), rest)),
            |(hit, name)| Entry::FunctionHit { hit, name },
        )(input)
    }

    fn parse_line(input: &'a str) -> IResult<&'a str, Self> {
        // `DA:<line>,<hit>[,<checksum>]`
        map(
            preceded(
                tag("DA:"),
                tuple((u32, char(','), u64, opt(preceded(char(','), rest)))),
            ),
            |(line, _, hit, _)| Entry::Line { line, hit },
        )(input)
    }

    fn parse_taken(input: &str) -> IResult<&str, u64> {
        // `-` marks a branch whose block never executed.
        alt((value(0, char('-')), u64))(input)
    }

    fn parse_branch(input: &'a str) -> IResult<&'a str, Self> {
        map(
            preceded(
                tag("BRDA:"),
                tuple((
                    u32,
                    char(','),
                    u32,
                    char(','),
                    u32,
                    char(','),
                    Self::parse_taken,
                )),
            ),
            |(line, _, block, _, branch, _, taken)| {
                Entry::Branch(BranchDetail::new(line, block, branch, taken))
            },
        )(input)
    }

    fn tag_of(line: &str) -> &str {
        line.split(':').next().unwrap_or(line)
    }

    fn parse(line: &'a str) -> Result<Self, ParseErrorKind> {
        let line = line.trim();
        let malformed = || ParseErrorKind::Malformed(Self::tag_of(line).to_owned());

        let parser: fn(&'a str) -> IResult<&'a str, Self> = match Self::tag_of(line) {
            "" => return Ok(Entry::Ignored),
            "end_of_record" if line == "end_of_record" => return Ok(Entry::EndOfRecord),
            "TN" => return Ok(Entry::TestName),
            "SF" => Self::parse_source_file,
            "FN" => Self::parse_function,
            "FNDA" => Self::parse_function_hit,
            "DA" => Self::parse_line,
            "BRDA" => Self::parse_branch,
            _ => return Ok(Entry::Ignored),
        };

        all_consuming(parser)(line)
            .map(|(_, entry)| entry)
            .map_err(|_| malformed())
    }
}

/// Accumulates the entries of one `SF` block.
struct Block {
    record: FileRecord,
    functions: Vec<(String, u32)>,
    function_hits: BTreeMap<String, u64>,
}

impl Block {
    fn new(path: &str) -> Self {
        Self {
            record: FileRecord::new(path),
            functions: Vec::new(),
            function_hits: BTreeMap::new(),
        }
    }

    fn finish(mut self) -> FileRecord {
        for (name, line) in self.functions {
            let hit = self.function_hits.remove(&name).unwrap_or(0);
            self.record
                .add_function(FunctionDetail::new(name, line, hit));
        }

        for name in self.function_hits.keys() {
            debug!(
                "ignoring `FNDA` for undeclared function `{}` in {}",
                name, self.record.path
            );
        }

        self.record
    }
}

/// A parsed tracefile: one [`FileRecord`] per distinct `SF` path, in input order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LcovReport {
    files: Vec<FileRecord>,
    index: BTreeMap<String, usize>,
}

impl LcovReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse LCOV tracefile text.
    ///
    /// Blocks naming the same `SF` path are merged into one record. Declared totals are ignored
    /// in favor of totals derived from the details.
    ///
    /// # Errors
    ///
    /// If a known record is malformed or appears outside of an `SF` block.
    ///
    /// # Example
    /// ```
    /// use lcov::LcovReport;
    ///
    /// let report = LcovReport::parse("SF:dist/a.js\nDA:1,2\nend_of_record\n").unwrap();
    /// let file = report.get("dist/a.js").unwrap();
    ///
    /// assert_eq!(file.lines.found(), 1);
    /// assert_eq!(file.lines.hit(), 1);
    /// ```
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut report = Self::new();
        let mut block: Option<Block> = None;

        for (index, line) in text.lines().enumerate() {
            let at = |kind| ParseError {
                line: index + 1,
                kind,
            };

            let entry = Entry::parse(line).map_err(at)?;

            let current = match entry {
                Entry::TestName | Entry::Ignored => continue,
                Entry::SourceFile(path) => {
                    if let Some(open) = &block {
                        return Err(at(ParseErrorKind::Unterminated(
                            open.record.path.clone(),
                        )));
                    }

                    block = Some(Block::new(path));
                    continue;
                }
                Entry::EndOfRecord => {
                    match block.take() {
                        Some(done) => report.insert(done.finish()),
                        None => {
                            return Err(at(ParseErrorKind::OutsideFile("end_of_record".into())))
                        }
                    }
                    continue;
                }
                _ => match &mut block {
                    Some(current) => current,
                    None => {
                        let tag = Entry::tag_of(line.trim()).to_owned();
                        return Err(at(ParseErrorKind::OutsideFile(tag)));
                    }
                },
            };

            match entry {
                Entry::Function { line, name } => {
                    current.functions.push((name.to_owned(), line));
                }
                Entry::FunctionHit { hit, name } => {
                    let total = current.function_hits.entry(name.to_owned()).or_default();
                    *total = total.saturating_add(hit);
                }
                Entry::Line { line, hit } => {
                    current.record.add_line(LineDetail::new(line, hit));
                }
                Entry::Branch(branch) => {
                    current.record.add_branch(branch);
                }
                _ => {}
            }
        }

        // Tolerate a missing final `end_of_record`.
        if let Some(open) = block {
            debug!("unterminated final block for {}", open.record.path);
            report.insert(open.finish());
        }

        info!("parsed {} lcov file entries", report.files.len());

        Ok(report)
    }

    /// Add a record, merging it into an existing record with the same path.
    pub fn insert(&mut self, record: FileRecord) {
        match self.index.get(&record.path) {
            Some(&pos) => self.files[pos].merge(&record),
            None => {
                self.index.insert(record.path.clone(), self.files.len());
                self.files.push(record);
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        self.index.get(path).map(|&pos| &self.files[pos])
    }

    pub fn files(&self) -> impl Iterator<Item = &FileRecord> {
        self.files.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|file| file.path.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
