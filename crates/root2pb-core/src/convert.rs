//! Conversion engine.
//!
//! Streams the entries of a tree into a data file laid out by a compiled
//! descriptor set: one [`DataHeader`] record carrying the entry count, then
//! one data record per entry. Every field of the data message is bound to
//! the branch named by its `(source_branch)` option; the binding buffers are
//! refreshed by the tree for each entry and encoded straight from there.

use crate::descriptor::{field_specs, find_target_message, load_descriptor_set, FileDescriptorSet};
use crate::record::{Codec, Record};
use crate::source::{open_source, ColumnBinding, Tree};
use indicatif::ProgressBar;
use prost::Message;
use root2pb_common::{Result, Root2pbError};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Record written once before the data records.
#[derive(Clone, PartialEq, Message)]
pub struct DataHeader {
    #[prost(uint64, required, tag = "1")]
    pub entries: u64,
}

/// How records are delimited in the output file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Framing {
    /// Records written back to back
    #[default]
    Concatenated,
    /// Each record preceded by its varint-encoded length
    LengthDelimited,
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Framing::Concatenated => f.write_str("concatenated"),
            Framing::LengthDelimited => f.write_str("length-delimited"),
        }
    }
}

/// Inputs of one conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertRequest {
    pub source: PathBuf,
    pub tree: String,
    pub descriptor: PathBuf,
    /// Data message name; discovered next to `DataHeader` when `None`
    pub message: Option<String>,
    /// Entries to convert; negative means all
    pub max_entries: i64,
    pub output: PathBuf,
    pub framing: Framing,
}

/// What a finished conversion wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertSummary {
    pub message: String,
    pub entries: u64,
    pub bytes: u64,
    pub output: PathBuf,
}

/// Run a conversion on the current thread.
pub fn convert(request: &ConvertRequest, progress: &ProgressBar) -> Result<ConvertSummary> {
    let set = load_descriptor_set(&request.descriptor)?;
    let source = open_source(&request.source)?;
    let mut tree = source.require_tree(&request.tree)?;

    let mut out = File::create(&request.output)?;
    let (message, entries, bytes) = convert_tree(
        tree.as_mut(),
        &set,
        request.message.as_deref(),
        request.max_entries,
        request.framing,
        &mut out,
        progress,
    )?;
    out.sync_all()?;

    info!(
        output = %request.output.display(),
        message = %message,
        entries,
        bytes,
        "Conversion finished"
    );

    Ok(ConvertSummary {
        message,
        entries,
        bytes,
        output: request.output.clone(),
    })
}

/// Run a conversion on the blocking thread pool.
pub async fn convert_blocking(
    request: ConvertRequest,
    progress: ProgressBar,
) -> Result<ConvertSummary> {
    tokio::task::spawn_blocking(move || convert(&request, &progress))
        .await
        .map_err(|e| Root2pbError::Io(std::io::Error::other(e.to_string())))?
}

/// Write the header and `max_entries` data records of `tree` to `out`.
///
/// Returns the full message name, the entry count and the bytes written.
/// Records go to `out` one by one; on error whatever was written stays.
pub fn convert_tree(
    tree: &mut dyn Tree,
    set: &FileDescriptorSet,
    message: Option<&str>,
    max_entries: i64,
    framing: Framing,
    out: &mut impl Write,
    progress: &ProgressBar,
) -> Result<(String, u64, u64)> {
    let target = find_target_message(set, message)?;
    let specs = field_specs(target.message)?;

    let mut bindings: Vec<ColumnBinding> = Vec::with_capacity(specs.len());
    let mut record = Record::default();
    for spec in &specs {
        let codec = Codec::for_field(spec)?;
        bindings.push(tree.bind(&spec.branch, codec.buffer_kind(), spec.repeated)?);
        record.push(spec, codec, bindings.len() - 1);
        debug!(
            field = %spec.name,
            branch = %spec.branch,
            codec = ?codec,
            repeated = spec.repeated,
            packed = spec.packed,
            "Bound field"
        );
    }

    let available = tree.entries();
    let mut entries = u64::try_from(max_entries).unwrap_or(available);
    if entries > available {
        warn!(
            requested = entries,
            available,
            "Requested more entries than the tree holds; converting all of them"
        );
        entries = available;
    }

    info!(
        tree = %tree.name(),
        message = %target.full_name(),
        fields = record.len(),
        entries,
        "Converting"
    );

    let header = DataHeader { entries }.encode_to_vec();
    let mut written = write_record(out, &header, framing)?;

    let mut buf = Vec::with_capacity(256);

    progress.set_length(entries);
    for entry in 0..entries {
        if tree.load_entry(entry, &mut bindings)? == 0 {
            return Err(Root2pbError::EntryLoad {
                tree: tree.name().to_string(),
                entry,
            });
        }

        buf.clear();
        record.encode(&bindings, &mut buf)?;
        written += write_record(out, &buf, framing)?;
        progress.inc(1);
    }
    progress.finish_and_clear();
    out.flush()?;

    Ok((target.full_name(), entries, written))
}

fn write_record(out: &mut impl Write, record: &[u8], framing: Framing) -> Result<u64> {
    let mut written = record.len() as u64;
    if framing == Framing::LengthDelimited {
        let mut prefix = Vec::with_capacity(10);
        prost::encoding::encode_varint(record.len() as u64, &mut prefix);
        out.write_all(&prefix)?;
        written += prefix.len() as u64;
    }
    out.write_all(record)?;
    Ok(written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::descriptor::testing::{describe, field, set_with};
    use crate::descriptor::{DescriptorProto, Type};
    use crate::schema::{Field, FieldType, ScalarKind, SchemaDocument};
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;

    #[derive(Clone, PartialEq, Message)]
    struct Event {
        #[prost(int32, optional, tag = "1")]
        x: Option<i32>,
        #[prost(int32, repeated, packed = "true", tag = "2")]
        ys: Vec<i32>,
    }

    fn event_doc() -> SchemaDocument {
        let fields = vec![
            Field {
                name: "x".to_string(),
                field_type: FieldType::Scalar(ScalarKind::Int32),
                id: 1,
                branch: "x".to_string(),
                repeated: false,
            },
            Field {
                name: "ys".to_string(),
                field_type: FieldType::Scalar(ScalarKind::Int32),
                id: 2,
                branch: "ys".to_string(),
                repeated: true,
            },
        ];
        SchemaDocument::new("root2pb", "Event", fields).unwrap()
    }

    fn fixture(dir: &Path, set: &FileDescriptorSet) -> ConvertRequest {
        let dump = json!({
            "trees": [{
                "name": "events",
                "branches": [
                    { "name": "x", "leaf_type": "Int_t", "values": [1, 2, 3] },
                    { "name": "ys", "class_name": "vector<int>", "values": [[10], [20, 21], []] }
                ]
            }]
        });
        let source = dir.join("events.json");
        std::fs::write(&source, serde_json::to_vec(&dump).unwrap()).unwrap();

        let descriptor = dir.join("event.desc");
        std::fs::write(&descriptor, set.encode_to_vec()).unwrap();

        ConvertRequest {
            source,
            tree: "events".to_string(),
            descriptor,
            message: None,
            max_entries: -1,
            output: dir.join("events.pbuf"),
            framing: Framing::Concatenated,
        }
    }

    /// Split a length-delimited stream into its records.
    fn records(mut bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        while !bytes.is_empty() {
            let len = prost::encoding::decode_varint(&mut bytes).unwrap() as usize;
            out.push(bytes[..len].to_vec());
            bytes = &bytes[len..];
        }
        out
    }

    #[test]
    fn test_header_then_records() {
        let dir = TempDir::new().unwrap();
        let request = fixture(dir.path(), &describe(&event_doc()));

        let summary = convert(&request, &ProgressBar::hidden()).unwrap();
        assert_eq!(summary.message, "root2pb.Event");
        assert_eq!(summary.entries, 3);

        let bytes = std::fs::read(&request.output).unwrap();
        assert_eq!(bytes.len() as u64, summary.bytes);

        let header = DataHeader { entries: 3 }.encode_to_vec();
        assert!(bytes.starts_with(&header));

        let mut expected = header.clone();
        for (x, ys) in [(1, vec![10]), (2, vec![20, 21]), (3, vec![])] {
            expected.extend(Event { x: Some(x), ys }.encode_to_vec());
        }
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_length_delimited_records_decode() {
        let dir = TempDir::new().unwrap();
        let mut request = fixture(dir.path(), &describe(&event_doc()));
        request.framing = Framing::LengthDelimited;
        convert(&request, &ProgressBar::hidden()).unwrap();

        let bytes = std::fs::read(&request.output).unwrap();
        let records = records(&bytes);
        assert_eq!(records.len(), 4);
        assert_eq!(DataHeader::decode(records[0].as_slice()).unwrap().entries, 3);

        let second = Event::decode(records[2].as_slice()).unwrap();
        assert_eq!(second, Event { x: Some(2), ys: vec![20, 21] });
        let third = Event::decode(records[3].as_slice()).unwrap();
        assert!(third.ys.is_empty());
    }

    #[test]
    fn test_conversion_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let request = fixture(dir.path(), &describe(&event_doc()));

        convert(&request, &ProgressBar::hidden()).unwrap();
        let first = std::fs::read(&request.output).unwrap();
        convert(&request, &ProgressBar::hidden()).unwrap();
        let second = std::fs::read(&request.output).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_max_entries_limits_and_clamps() {
        let dir = TempDir::new().unwrap();
        let mut request = fixture(dir.path(), &describe(&event_doc()));

        request.max_entries = 1;
        assert_eq!(convert(&request, &ProgressBar::hidden()).unwrap().entries, 1);

        request.max_entries = 0;
        let summary = convert(&request, &ProgressBar::hidden()).unwrap();
        assert_eq!(summary.entries, 0);
        assert_eq!(
            std::fs::read(&request.output).unwrap(),
            DataHeader { entries: 0 }.encode_to_vec()
        );

        request.max_entries = 1000;
        assert_eq!(convert(&request, &ProgressBar::hidden()).unwrap().entries, 3);
    }

    #[test]
    fn test_missing_branch_is_fatal() {
        let dir = TempDir::new().unwrap();
        let set = set_with(
            "root2pb",
            DescriptorProto {
                name: Some("Event".to_string()),
                field: vec![field("z", 1, Type::Int32, false, false, Some("z"))],
            },
        );
        let request = fixture(dir.path(), &set);

        let err = convert(&request, &ProgressBar::hidden()).unwrap_err();
        assert!(matches!(err, Root2pbError::BranchNotFound { .. }));
    }

    #[test]
    fn test_missing_branch_option_is_fatal() {
        let dir = TempDir::new().unwrap();
        let set = set_with(
            "root2pb",
            DescriptorProto {
                name: Some("Event".to_string()),
                field: vec![field("x", 1, Type::Int32, false, false, None)],
            },
        );
        let request = fixture(dir.path(), &set);

        let err = convert(&request, &ProgressBar::hidden()).unwrap_err();
        assert!(matches!(err, Root2pbError::Descriptor(_)));
    }

    #[test]
    fn test_declared_type_mismatch_is_fatal() {
        let dir = TempDir::new().unwrap();
        let set = set_with(
            "root2pb",
            DescriptorProto {
                name: Some("Event".to_string()),
                field: vec![field("x", 1, Type::Double, false, false, Some("x"))],
            },
        );
        let request = fixture(dir.path(), &set);

        let err = convert(&request, &ProgressBar::hidden()).unwrap_err();
        assert!(matches!(err, Root2pbError::BindMismatch { .. }));
    }

    #[test]
    fn test_zigzag_field_reads_signed_column() {
        let dir = TempDir::new().unwrap();
        let set = set_with(
            "root2pb",
            DescriptorProto {
                name: Some("Event".to_string()),
                field: vec![field("x", 1, Type::Sint32, false, false, Some("x"))],
            },
        );
        let request = fixture(dir.path(), &set);
        convert(&request, &ProgressBar::hidden()).unwrap();

        let bytes = std::fs::read(&request.output).unwrap();
        let header_len = DataHeader { entries: 3 }.encoded_len();
        // sint32 1 zigzags to 2
        assert_eq!(&bytes[header_len..header_len + 2], &[0x08, 0x02]);
    }

    #[test]
    fn test_framing_display() {
        assert_eq!(Framing::Concatenated.to_string(), "concatenated");
        assert_eq!(Framing::LengthDelimited.to_string(), "length-delimited");
    }

    #[tokio::test]
    async fn test_convert_blocking() {
        let dir = TempDir::new().unwrap();
        let request = fixture(dir.path(), &describe(&event_doc()));
        let summary = convert_blocking(request.clone(), ProgressBar::hidden())
            .await
            .unwrap();
        assert_eq!(summary.entries, 3);
        assert!(request.output.exists());
    }
}
