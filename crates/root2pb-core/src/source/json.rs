//! JSON tree dumps.
//!
//! A dump holds one or more trees, each a list of branches with their
//! declared types and one value per entry:
//!
//! ```json
//! {
//!   "trees": [
//!     {
//!       "name": "events",
//!       "branches": [
//!         { "name": "x",  "leaf_type": "Int_t", "values": [1, 2] },
//!         { "name": "ys", "class_name": "vector<int>", "values": [[10], [20, 21]] }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Files ending in `.gz` are decompressed on the fly. Every branch of a tree
//! must hold the same number of values.

use super::{BranchInfo, ColumnBinding, ColumnBuffer, ScalarValue, Tree, TreeSource};
use crate::schema::{FieldType, ScalarKind};
use crate::typemap::map_native_type;
use flate2::read::GzDecoder;
use root2pb_common::{Result, Root2pbError};
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct DumpFile {
    trees: Vec<DumpTree>,
}

#[derive(Debug, Deserialize)]
struct DumpTree {
    name: String,
    #[serde(default)]
    branches: Vec<DumpBranch>,
}

#[derive(Debug, Deserialize)]
struct DumpBranch {
    #[serde(flatten)]
    info: BranchInfo,
    #[serde(default)]
    values: Vec<Value>,
}

#[derive(Debug)]
struct TreeData {
    name: String,
    branches: Vec<BranchInfo>,
    columns: Vec<Vec<Value>>,
    entries: u64,
}

/// A tree-dump file loaded into memory.
#[derive(Debug)]
pub struct JsonTreeSource {
    path: PathBuf,
    trees: Vec<TreeData>,
}

impl JsonTreeSource {
    /// Read and validate a dump.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "gz") {
            Box::new(GzDecoder::new(BufReader::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };

        let dump: DumpFile = serde_json::from_reader(reader).map_err(|e| {
            Root2pbError::source_format(format!("{}: {}", path.display(), e))
        })?;

        let trees = dump
            .trees
            .into_iter()
            .map(|tree| TreeData::validate(tree, path))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            path = %path.display(),
            trees = trees.len(),
            "Opened JSON tree dump"
        );

        Ok(Self {
            path: path.to_path_buf(),
            trees,
        })
    }
}

impl TreeData {
    fn validate(tree: DumpTree, path: &Path) -> Result<Self> {
        let entries = tree.branches.first().map_or(0, |b| b.values.len());

        let mut branches = Vec::with_capacity(tree.branches.len());
        let mut columns = Vec::with_capacity(tree.branches.len());
        for branch in tree.branches {
            if branch.values.len() != entries {
                return Err(Root2pbError::source_format(format!(
                    "{}: branch {} of tree {} has {} entries, expected {}",
                    path.display(),
                    branch.info.name,
                    tree.name,
                    branch.values.len(),
                    entries
                )));
            }
            branches.push(branch.info);
            columns.push(branch.values);
        }

        Ok(Self {
            name: tree.name,
            branches,
            columns,
            entries: entries as u64,
        })
    }
}

impl TreeSource for JsonTreeSource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn tree_names(&self) -> Vec<String> {
        self.trees.iter().map(|t| t.name.clone()).collect()
    }

    fn open_tree(&self, name: &str) -> Option<Box<dyn Tree + '_>> {
        self.trees
            .iter()
            .find(|t| t.name == name)
            .map(|data| Box::new(JsonTree { data }) as Box<dyn Tree + '_>)
    }
}

struct JsonTree<'a> {
    data: &'a TreeData,
}

impl Tree for JsonTree<'_> {
    fn name(&self) -> &str {
        &self.data.name
    }

    fn branches(&self) -> &[BranchInfo] {
        &self.data.branches
    }

    fn entries(&self) -> u64 {
        self.data.entries
    }

    fn bind(&self, branch: &str, kind: ScalarKind, repeated: bool) -> Result<ColumnBinding> {
        let handle = self
            .data
            .branches
            .iter()
            .position(|b| b.name == branch)
            .ok_or_else(|| Root2pbError::BranchNotFound {
                tree: self.data.name.clone(),
                branch: branch.to_string(),
            })?;

        let native = self.data.branches[handle].native_type();
        let (declared, declared_repeated) = map_native_type(native);
        if declared != FieldType::Scalar(kind) || declared_repeated != repeated {
            let expected = if repeated {
                format!("repeated {}", kind)
            } else {
                kind.to_string()
            };
            return Err(Root2pbError::bind_mismatch(branch, expected, native));
        }

        Ok(ColumnBinding::new(branch, handle, ColumnBuffer::new(kind, repeated)))
    }

    fn load_entry(&mut self, entry: u64, bindings: &mut [ColumnBinding]) -> Result<usize> {
        if entry >= self.data.entries {
            return Ok(0);
        }
        let row = entry as usize;

        for binding in bindings.iter_mut() {
            let value = self
                .data
                .columns
                .get(binding.handle)
                .and_then(|column| column.get(row))
                .ok_or_else(|| Root2pbError::EntryLoad {
                    tree: self.data.name.clone(),
                    entry,
                })?;
            fill(&mut binding.buffer, value, &binding.branch, entry)?;
        }

        Ok(self.data.branches.len())
    }
}

/// Overwrite `buffer` with `value`, converting it to the buffer's kind.
fn fill(buffer: &mut ColumnBuffer, value: &Value, branch: &str, entry: u64) -> Result<()> {
    let kind = buffer.kind();
    match buffer {
        ColumnBuffer::Scalar(slot) => {
            *slot = scalar(value, kind, branch, entry)?;
        },
        ColumnBuffer::Array(values) => {
            let items = value.as_array().ok_or_else(|| out_of_range(branch, entry, "expected an array"))?;
            values.clear();
            for item in items {
                values.push(scalar(item, kind, branch, entry)?);
            }
        },
    }
    Ok(())
}

fn scalar(value: &Value, kind: ScalarKind, branch: &str, entry: u64) -> Result<ScalarValue> {
    let bad = |what: &str| out_of_range(branch, entry, format!("{} is not a valid {}", what, kind));

    let converted = match kind {
        ScalarKind::Bool => match value {
            Value::Bool(b) => ScalarValue::Bool(*b),
            Value::Number(n) => match n.as_u64() {
                Some(0) => ScalarValue::Bool(false),
                Some(1) => ScalarValue::Bool(true),
                _ => return Err(bad(&value.to_string())),
            },
            _ => return Err(bad(&value.to_string())),
        },
        ScalarKind::Int32 => value
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(ScalarValue::Int32)
            .ok_or_else(|| bad(&value.to_string()))?,
        ScalarKind::Int64 => value
            .as_i64()
            .map(ScalarValue::Int64)
            .ok_or_else(|| bad(&value.to_string()))?,
        ScalarKind::Uint32 => value
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .map(ScalarValue::Uint32)
            .ok_or_else(|| bad(&value.to_string()))?,
        ScalarKind::Uint64 => value
            .as_u64()
            .map(ScalarValue::Uint64)
            .ok_or_else(|| bad(&value.to_string()))?,
        ScalarKind::Float => {
            let v = float(value).ok_or_else(|| bad(&value.to_string()))?;
            if v.is_finite() && v.abs() > f64::from(f32::MAX) {
                return Err(bad(&value.to_string()));
            }
            ScalarValue::Float(v as f32)
        },
        ScalarKind::Double => {
            ScalarValue::Double(float(value).ok_or_else(|| bad(&value.to_string()))?)
        },
        ScalarKind::String => match value {
            Value::String(s) => ScalarValue::String(s.clone()),
            _ => return Err(bad(&value.to_string())),
        },
        ScalarKind::Bytes => match value {
            Value::String(s) => ScalarValue::Bytes(s.as_bytes().to_vec()),
            Value::Array(items) => ScalarValue::Bytes(
                items
                    .iter()
                    .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
                    .collect::<Option<Vec<u8>>>()
                    .ok_or_else(|| bad(&value.to_string()))?,
            ),
            _ => return Err(bad(&value.to_string())),
        },
    };
    Ok(converted)
}

/// Numbers, plus the strings `"nan"`, `"inf"` and `"-inf"` JSON cannot
/// express natively.
fn float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn out_of_range(branch: &str, entry: u64, detail: impl Into<String>) -> Root2pbError {
    Root2pbError::ValueOutOfRange {
        branch: branch.to_string(),
        entry,
        detail: detail.into(),
    }
}
