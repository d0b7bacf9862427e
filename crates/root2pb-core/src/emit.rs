//! `.proto` schema text rendering

use crate::schema::{SchemaDocument, BRANCH_OPTION, BRANCH_OPTION_NUMBER, HEADER_MESSAGE};
use root2pb_common::Result;
use std::fmt::Write as _;
use std::fs::File;
use std::io::Write as _;
use std::path::Path;
use tracing::{debug, info};

/// Render `doc` as proto2 schema text.
///
/// The output holds the package, the `source_branch` field option, the data
/// message with one line per field and the fixed [`HEADER_MESSAGE`].
pub fn render(doc: &SchemaDocument) -> String {
    let mut out = String::with_capacity(512 + doc.fields.len() * 80);

    // Writing into a String cannot fail.
    let _ = writeln!(out, "syntax = \"proto2\";");
    let _ = writeln!(out);
    let _ = writeln!(out, "package {};", doc.package);
    let _ = writeln!(out);
    let _ = writeln!(out, "import \"google/protobuf/descriptor.proto\";");
    let _ = writeln!(out);
    let _ = writeln!(out, "extend google.protobuf.FieldOptions {{");
    let _ = writeln!(out, "  optional string {} = {};", BRANCH_OPTION, BRANCH_OPTION_NUMBER);
    let _ = writeln!(out, "}}");
    let _ = writeln!(out);

    let _ = writeln!(out, "message {} {{", doc.message);
    for field in &doc.fields {
        let _ = write!(
            out,
            "  {} {} {} = {} [({}) = \"{}\"",
            field.modifier(),
            field.field_type,
            field.name,
            field.id,
            BRANCH_OPTION,
            escape(&field.branch)
        );
        if field.is_packed() {
            out.push_str(", packed = true");
        }
        out.push_str("];\n");
    }
    let _ = writeln!(out, "}}");
    let _ = writeln!(out);

    let _ = writeln!(out, "message {} {{", HEADER_MESSAGE);
    let _ = writeln!(out, "  // number of data records following this header");
    let _ = writeln!(out, "  required uint64 entries = 1;");
    let _ = writeln!(out, "}}");

    out
}

/// Render `doc` and write it to `path`.
///
/// A failed write leaves whatever was written in place.
pub fn write_schema(doc: &SchemaDocument, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let text = render(doc);

    let mut file = File::create(path)?;
    file.write_all(text.as_bytes())?;
    file.sync_all()?;

    info!(
        path = %path.display(),
        message = %doc.message,
        fields = doc.fields.len(),
        "Wrote schema"
    );
    debug!(bytes = text.len(), "Schema size");
    Ok(())
}

/// Escape a branch name for a proto string literal.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}
