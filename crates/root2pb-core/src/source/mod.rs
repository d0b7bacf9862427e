//! Columnar data source abstraction.
//!
//! A [`TreeSource`] is an opened data file holding one or more named trees.
//! A [`Tree`] exposes its branches in declaration order, an entry count, and
//! a cursor that refreshes bound [`ColumnBinding`] buffers in place, one
//! entry at a time.
//!
//! The conversion engine never sees the on-disk format: it binds typed
//! buffers by branch name and reads them back after every
//! [`Tree::load_entry`] call.

pub mod buffer;
pub mod json;

pub use buffer::{ArrayValue, ColumnBuffer, ScalarValue};
pub use json::JsonTreeSource;

use crate::schema::ScalarKind;
use root2pb_common::{Result, Root2pbError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Schema of one branch as declared by the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    pub name: String,
    /// Class of object-valued branches, empty for plain leaves
    #[serde(default)]
    pub class_name: String,
    /// Type of the branch's first leaf
    #[serde(default)]
    pub leaf_type: String,
}

impl BranchInfo {
    /// The type name used for mapping: the class name when present,
    /// otherwise the leaf type.
    pub fn native_type(&self) -> &str {
        if self.class_name.is_empty() {
            &self.leaf_type
        } else {
            &self.class_name
        }
    }
}

/// A typed buffer bound to one branch of a tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBinding {
    branch: String,
    /// Position of the branch inside its tree
    handle: usize,
    buffer: ColumnBuffer,
}

impl ColumnBinding {
    pub fn new(branch: impl Into<String>, handle: usize, buffer: ColumnBuffer) -> Self {
        Self {
            branch: branch.into(),
            handle,
            buffer,
        }
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn handle(&self) -> usize {
        self.handle
    }

    /// Values loaded by the last successful [`Tree::load_entry`].
    pub fn buffer(&self) -> &ColumnBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut ColumnBuffer {
        &mut self.buffer
    }
}

/// One named table of typed columns.
pub trait Tree {
    fn name(&self) -> &str;

    /// Branches in declaration order.
    fn branches(&self) -> &[BranchInfo];

    /// Number of entries (rows).
    fn entries(&self) -> u64;

    /// Allocate a buffer of `kind` for `branch` and associate the two.
    ///
    /// Fails with `BranchNotFound` when the branch does not exist and with
    /// `BindMismatch` when its values cannot be read as `kind` (or the
    /// repeatedness differs).
    fn bind(&self, branch: &str, kind: ScalarKind, repeated: bool) -> Result<ColumnBinding>;

    /// Refresh every binding with the values of `entry`.
    ///
    /// Returns the number of branches read; 0 means the entry does not
    /// exist.
    fn load_entry(&mut self, entry: u64, bindings: &mut [ColumnBinding]) -> Result<usize>;
}

/// An opened data file.
pub trait TreeSource: Send {
    /// Path the source was opened from.
    fn path(&self) -> &Path;

    /// Names of the trees in the file.
    fn tree_names(&self) -> Vec<String>;

    /// Open the named tree, `None` when absent.
    fn open_tree(&self, name: &str) -> Option<Box<dyn Tree + '_>>;

    /// Like [`TreeSource::open_tree`], failing with `TreeNotFound`.
    fn require_tree(&self, name: &str) -> Result<Box<dyn Tree + '_>> {
        self.open_tree(name).ok_or_else(|| Root2pbError::TreeNotFound {
            tree: name.to_string(),
            path: self.path().display().to_string(),
        })
    }
}

/// Open a data file, picking the reader from its extension.
///
/// Supported: `.json` and `.json.gz` tree dumps.
pub fn open_source(path: impl AsRef<Path>) -> Result<Box<dyn TreeSource>> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    if name.ends_with(".json") || name.ends_with(".json.gz") {
        return Ok(Box::new(JsonTreeSource::open(path)?));
    }

    // A missing file is reported as such before the format complaint.
    if !path.exists() {
        return Err(Root2pbError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }

    Err(Root2pbError::source_format(format!(
        "{}: no reader for this file type (expected .json or .json.gz)",
        path.display()
    )))
}
