//! Schema model shared by the extractor, the emitter and the conversion engine

use root2pb_common::{Result, Root2pbError};
use serde::Serialize;
use std::fmt;

/// Name of the fixed message written once before the data records.
pub const HEADER_MESSAGE: &str = "DataHeader";

/// Name of the custom field option carrying the source branch name.
pub const BRANCH_OPTION: &str = "source_branch";

/// Extension number of [`BRANCH_OPTION`] on `google.protobuf.FieldOptions`.
pub const BRANCH_OPTION_NUMBER: u32 = 50002;

/// Protobuf scalar types a branch can be mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Bool,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Float,
    Double,
    Bytes,
    String,
}

impl ScalarKind {
    /// The keyword used in `.proto` text.
    pub fn proto_name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Int32 => "int32",
            ScalarKind::Int64 => "int64",
            ScalarKind::Uint32 => "uint32",
            ScalarKind::Uint64 => "uint64",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
            ScalarKind::Bytes => "bytes",
            ScalarKind::String => "string",
        }
    }

    /// Whether repeated fields of this kind may use packed encoding.
    pub fn is_packable(self) -> bool {
        !matches!(self, ScalarKind::Bytes | ScalarKind::String)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.proto_name())
    }
}

/// Result of mapping a native branch type.
///
/// `Unresolved` carries the native name verbatim; it ends up in the schema
/// text and is rejected there by the schema compiler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FieldType {
    Scalar(ScalarKind),
    Unresolved(String),
}

impl FieldType {
    pub fn scalar(&self) -> Option<ScalarKind> {
        match self {
            FieldType::Scalar(kind) => Some(*kind),
            FieldType::Unresolved(_) => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Scalar(kind) => f.write_str(kind.proto_name()),
            FieldType::Unresolved(name) => f.write_str(name),
        }
    }
}

/// One field of the generated message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    /// Protobuf field name (lower_snake_case)
    pub name: String,
    pub field_type: FieldType,
    /// Field number, unique and increasing within a run
    pub id: u32,
    /// Name of the branch the values come from
    pub branch: String,
    pub repeated: bool,
}

impl Field {
    /// `repeated` or `optional`
    pub fn modifier(&self) -> &'static str {
        if self.repeated {
            "repeated"
        } else {
            "optional"
        }
    }

    /// Whether the emitted field carries `packed = true`.
    pub fn is_packed(&self) -> bool {
        self.repeated && self.field_type.scalar().is_some_and(ScalarKind::is_packable)
    }
}

/// Ordered field list produced by one extraction pass.
pub type FieldList = Vec<Field>;

/// Everything the emitter needs to render one `.proto` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDocument {
    pub package: String,
    pub message: String,
    pub fields: FieldList,
}

impl SchemaDocument {
    /// Create a document after validating the package and message names.
    pub fn new(
        package: impl Into<String>,
        message: impl Into<String>,
        fields: FieldList,
    ) -> Result<Self> {
        let package = package.into();
        let message = message.into();

        if !package.split('.').all(is_identifier) {
            return Err(Root2pbError::InvalidName(format!(
                "package '{}' must be dot-separated identifiers",
                package
            )));
        }
        if !is_identifier(&message) {
            return Err(Root2pbError::InvalidName(format!(
                "message '{}' is not an identifier",
                message
            )));
        }
        if message == HEADER_MESSAGE {
            return Err(Root2pbError::InvalidName(format!(
                "message name '{}' is reserved for the row-count header",
                HEADER_MESSAGE
            )));
        }

        Ok(Self {
            package,
            message,
            fields,
        })
    }
}

/// Whether `name` is a valid protobuf identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {},
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Normalize a branch name into a protobuf field name.
///
/// CamelCase and camelCase humps become `_`-separated lower case, every
/// character outside `[A-Za-z0-9_]` becomes `_`, and a leading digit gets an
/// `f_` prefix. `"ElEta"`, `"el.eta"` and `"el_eta"` all give `"el_eta"`.
pub fn field_name(branch: &str) -> String {
    let chars: Vec<char> = branch.chars().collect();
    let mut out = String::with_capacity(branch.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_ascii_uppercase() => next.is_some_and(|n| n.is_ascii_lowercase()),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }

    let trimmed = out.trim_end_matches('_');
    let mut name = if trimmed.is_empty() && !out.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    };

    if name.is_empty() {
        name.push_str("field");
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert_str(0, "f_");
    }
    name
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_field_name_normalization() {
        assert_eq!(field_name("x"), "x");
        assert_eq!(field_name("ElEta"), "el_eta");
        assert_eq!(field_name("el.eta"), "el_eta");
        assert_eq!(field_name("el_eta"), "el_eta");
        assert_eq!(field_name("runNumber"), "run_number");
        assert_eq!(field_name("HLTPath"), "hlt_path");
        assert_eq!(field_name("jet_pt[4]"), "jet_pt_4");
        assert_eq!(field_name("2mu"), "f_2mu");
        assert_eq!(field_name(""), "field");
    }

    #[test]
    fn test_identifier_rules() {
        assert!(is_identifier("Event"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier("my-event"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_document_validation() {
        assert!(SchemaDocument::new("hep.data", "Event", vec![]).is_ok());
        assert!(SchemaDocument::new("hep..data", "Event", vec![]).is_err());
        assert!(SchemaDocument::new("root2pb", "Event!", vec![]).is_err());
        assert!(SchemaDocument::new("root2pb", HEADER_MESSAGE, vec![]).is_err());
    }

    #[test]
    fn test_packed_only_for_numeric_repeated() {
        let mut field = Field {
            name: "ys".to_string(),
            field_type: FieldType::Scalar(ScalarKind::Int32),
            id: 2,
            branch: "ys".to_string(),
            repeated: true,
        };
        assert!(field.is_packed());

        field.field_type = FieldType::Scalar(ScalarKind::String);
        assert!(!field.is_packed());

        field.field_type = FieldType::Unresolved("vector<TLorentzVector>".to_string());
        assert!(!field.is_packed());

        field.field_type = FieldType::Scalar(ScalarKind::Double);
        field.repeated = false;
        assert!(!field.is_packed());
        assert_eq!(field.modifier(), "optional");
    }
}
