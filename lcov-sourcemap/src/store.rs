// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;

use lcov::{BranchDetail, FileRecord, FunctionDetail, LineDetail};

/// A remapped detail, bound to the canonical path of the file it belongs to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Contribution {
    pub path: String,
    pub detail: RemappedDetail,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RemappedDetail {
    Function(FunctionDetail),
    Line(LineDetail),
    Branch(BranchDetail),
}

impl Contribution {
    pub fn function(path: impl Into<String>, detail: FunctionDetail) -> Self {
        Self {
            path: path.into(),
            detail: RemappedDetail::Function(detail),
        }
    }

    pub fn line(path: impl Into<String>, detail: LineDetail) -> Self {
        Self {
            path: path.into(),
            detail: RemappedDetail::Line(detail),
        }
    }

    pub fn branch(path: impl Into<String>, detail: BranchDetail) -> Self {
        Self {
            path: path.into(),
            detail: RemappedDetail::Branch(detail),
        }
    }
}

/// Original-file records, one per canonical path, in order of first contribution.
#[derive(Clone, Debug, Default)]
pub struct RecordStore {
    records: Vec<FileRecord>,
    index: BTreeMap<String, usize>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for `path`, created empty on first use.
    pub fn record(&mut self, path: &str) -> &mut FileRecord {
        let pos = match self.index.get(path) {
            Some(&pos) => pos,
            None => {
                let pos = self.records.len();
                self.records.push(FileRecord::new(path));
                self.index.insert(path.to_owned(), pos);
                pos
            }
        };

        &mut self.records[pos]
    }

    pub fn add(&mut self, contribution: Contribution) {
        let record = self.record(&contribution.path);

        match contribution.detail {
            RemappedDetail::Function(detail) => record.add_function(detail),
            RemappedDetail::Line(detail) => record.add_line(detail),
            RemappedDetail::Branch(detail) => record.add_branch(detail),
        };
    }

    /// Merge contributions in order.
    pub fn fold(&mut self, contributions: impl IntoIterator<Item = Contribution>) {
        for contribution in contributions {
            self.add(contribution);
        }
    }

    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        self.index.get(path).map(|&pos| &self.records[pos])
    }

    pub fn records(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<FileRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<Contribution> for RecordStore {
    fn from_iter<I: IntoIterator<Item = Contribution>>(iter: I) -> Self {
        let mut store = Self::new();
        store.fold(iter);
        store
    }
}
