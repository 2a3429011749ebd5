// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// A single coverage entry of one of the three LCOV categories.
///
/// Details with equal keys describe the same thing (the same function, line, or branch arm) and
/// are merged by summing their counts.
pub trait Detail {
    type Key: Clone + fmt::Debug + Eq + Hash;

    fn key(&self) -> Self::Key;

    /// Execution count (`hit` for functions and lines, `taken` for branches).
    fn count(&self) -> u64;

    fn add_count(&mut self, count: u64);
}

/// `FN`/`FNDA` entry.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct FunctionDetail {
    pub name: String,

    /// Line of the function declaration (1-indexed).
    pub line: u32,

    pub hit: u64,
}

impl FunctionDetail {
    pub fn new(name: impl Into<String>, line: u32, hit: u64) -> Self {
        Self {
            name: name.into(),
            line,
            hit,
        }
    }
}

// Names alone are not unique: coverage tools number anonymous functions per generated file.
impl Detail for FunctionDetail {
    type Key = (u32, String);

    fn key(&self) -> (u32, String) {
        (self.line, self.name.clone())
    }

    fn count(&self) -> u64 {
        self.hit
    }

    fn add_count(&mut self, count: u64) {
        self.hit = self.hit.saturating_add(count);
    }
}

/// `DA` entry.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct LineDetail {
    pub line: u32,
    pub hit: u64,
}

impl LineDetail {
    pub fn new(line: u32, hit: u64) -> Self {
        Self { line, hit }
    }
}

impl Detail for LineDetail {
    type Key = u32;

    fn key(&self) -> u32 {
        self.line
    }

    fn count(&self) -> u64 {
        self.hit
    }

    fn add_count(&mut self, count: u64) {
        self.hit = self.hit.saturating_add(count);
    }
}

/// `BRDA` entry.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct BranchDetail {
    pub line: u32,
    pub block: u32,
    pub branch: u32,
    pub taken: u64,
}

impl BranchDetail {
    pub fn new(line: u32, block: u32, branch: u32, taken: u64) -> Self {
        Self {
            line,
            block,
            branch,
            taken,
        }
    }
}

impl Detail for BranchDetail {
    type Key = (u32, u32, u32);

    fn key(&self) -> (u32, u32, u32) {
        (self.line, self.block, self.branch)
    }

    fn count(&self) -> u64 {
        self.taken
    }

    fn add_count(&mut self, count: u64) {
        self.taken = self.taken.saturating_add(count);
    }
}

/// Totals plus details for one coverage category of a file.
///
/// `found` is always the number of details, and `hit` the number of details with a non-zero
/// count. Details keep first-seen order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Summary<T: Detail> {
    found: usize,
    hit: usize,
    details: Vec<T>,
    index: HashMap<T::Key, usize>,
}

impl<T: Detail> Default for Summary<T> {
    fn default() -> Self {
        Self {
            found: 0,
            hit: 0,
            details: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Detail> Summary<T> {
    pub fn found(&self) -> usize {
        self.found
    }

    pub fn hit(&self) -> usize {
        self.hit
    }

    pub fn details(&self) -> &[T] {
        &self.details
    }

    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }

    /// Add a detail, or fold its count into an existing detail with the same key.
    pub fn add(&mut self, detail: T) {
        if let Some(&pos) = self.index.get(&detail.key()) {
            let existing = &mut self.details[pos];
            let was_hit = existing.count() > 0;
            existing.add_count(detail.count());

            if !was_hit && existing.count() > 0 {
                self.hit += 1;
            }

            return;
        }

        if detail.count() > 0 {
            self.hit += 1;
        }

        self.index.insert(detail.key(), self.details.len());
        self.details.push(detail);
        self.found += 1;
    }

    pub fn extend(&mut self, details: impl IntoIterator<Item = T>) {
        for detail in details {
            self.add(detail);
        }
    }
}

/// Coverage of one source file, i.e. one LCOV block.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FileRecord {
    /// Path as written after `SF:`.
    pub path: String,

    pub functions: Summary<FunctionDetail>,
    pub lines: Summary<LineDetail>,
    pub branches: Summary<BranchDetail>,
}

impl FileRecord {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn add_function(&mut self, function: FunctionDetail) -> &mut Self {
        self.functions.add(function);
        self
    }

    pub fn add_line(&mut self, line: LineDetail) -> &mut Self {
        self.lines.add(line);
        self
    }

    pub fn add_branch(&mut self, branch: BranchDetail) -> &mut Self {
        self.branches.add(branch);
        self
    }

    /// Fold all details of `other` into `self`, keeping `self.path`.
    pub fn merge(&mut self, other: &FileRecord) {
        self.functions.extend(other.functions.details().iter().cloned());
        self.lines.extend(other.lines.details().iter().copied());
        self.branches.extend(other.branches.details().iter().copied());
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.lines.is_empty() && self.branches.is_empty()
    }
}
