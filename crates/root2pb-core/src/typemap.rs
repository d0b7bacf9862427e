//! Type mapping from ROOT branch types to protobuf scalar types.
//!
//! Narrow native widths are promoted to the closest protobuf type that can
//! hold every value; nothing is truncated. Names that cannot be mapped are
//! passed through unchanged so the schema compiler reports them.

use crate::schema::{FieldType, ScalarKind};

/// Map a native type name to `(schema type, is_repeated)`.
pub fn map_native_type(native: &str) -> (FieldType, bool) {
    let native = native.trim();

    if let Some(kind) = scalar_for(native) {
        return (FieldType::Scalar(kind), false);
    }

    if let Some(inner) = sequence_element(native) {
        let field_type = match map_native_type(inner) {
            (field_type @ FieldType::Scalar(_), false) => field_type,
            // Unknown elements and nested sequences keep the element name.
            _ => FieldType::Unresolved(inner.to_string()),
        };
        return (field_type, true);
    }

    (FieldType::Unresolved(native.to_string()), false)
}

/// Exact-match table of scalar spellings.
fn scalar_for(native: &str) -> Option<ScalarKind> {
    let kind = match native {
        "bool" | "Bool_t" => ScalarKind::Bool,

        // Signed integers up to 32 bits
        "char" | "Char_t" | "short" | "Short_t" | "int" | "Int_t" | "int32_t" => ScalarKind::Int32,

        // Signed 64-bit integers
        "long" | "Long_t" | "Long64_t" | "long long" | "int64_t" => ScalarKind::Int64,

        // Unsigned integers up to 32 bits
        "unsigned char" | "UChar_t" | "unsigned short" | "UShort_t" | "unsigned int"
        | "unsigned" | "UInt_t" | "uint32_t" => ScalarKind::Uint32,

        // Unsigned 64-bit integers
        "unsigned long" | "ULong_t" | "ULong64_t" | "unsigned long long" | "uint64_t" => {
            ScalarKind::Uint64
        },

        "float" | "Float_t" | "Float16_t" => ScalarKind::Float,
        "double" | "Double_t" | "Double32_t" => ScalarKind::Double,

        "UChar_t*" | "unsigned char*" => ScalarKind::Bytes,
        "char*" | "Char_t*" | "string" | "std::string" | "TString" => ScalarKind::String,

        _ => return None,
    };
    Some(kind)
}

/// Element type of a `vector<T>` or `std::vector<T>` spelling.
fn sequence_element(native: &str) -> Option<&str> {
    let rest = native
        .strip_prefix("std::vector<")
        .or_else(|| native.strip_prefix("vector<"))?;
    let inner = rest.strip_suffix('>')?.trim();
    (!inner.is_empty()).then_some(inner)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TABLE: &[(&str, ScalarKind)] = &[
        ("bool", ScalarKind::Bool),
        ("Bool_t", ScalarKind::Bool),
        ("Char_t", ScalarKind::Int32),
        ("Short_t", ScalarKind::Int32),
        ("short", ScalarKind::Int32),
        ("Int_t", ScalarKind::Int32),
        ("int", ScalarKind::Int32),
        ("Long64_t", ScalarKind::Int64),
        ("long", ScalarKind::Int64),
        ("UChar_t", ScalarKind::Uint32),
        ("UShort_t", ScalarKind::Uint32),
        ("unsigned int", ScalarKind::Uint32),
        ("UInt_t", ScalarKind::Uint32),
        ("ULong64_t", ScalarKind::Uint64),
        ("unsigned long", ScalarKind::Uint64),
        ("Float_t", ScalarKind::Float),
        ("float", ScalarKind::Float),
        ("Double_t", ScalarKind::Double),
        ("Double32_t", ScalarKind::Double),
        ("double", ScalarKind::Double),
        ("UChar_t*", ScalarKind::Bytes),
        ("string", ScalarKind::String),
        ("std::string", ScalarKind::String),
        ("TString", ScalarKind::String),
        ("char*", ScalarKind::String),
    ];

    #[test]
    fn test_table_entries_are_scalar() {
        for (native, kind) in TABLE {
            assert_eq!(
                map_native_type(native),
                (FieldType::Scalar(*kind), false),
                "native type {}",
                native
            );
        }
    }

    #[test]
    fn test_sequence_spellings() {
        for (native, kind) in TABLE {
            for wrapped in [format!("vector<{}>", native), format!("std::vector<{}>", native)] {
                assert_eq!(map_native_type(&wrapped), (FieldType::Scalar(*kind), true));
            }
        }
    }

    #[test]
    fn test_sequence_with_inner_spaces() {
        assert_eq!(
            map_native_type("vector<unsigned int>"),
            (FieldType::Scalar(ScalarKind::Uint32), true)
        );
        assert_eq!(
            map_native_type("std::vector< double >"),
            (FieldType::Scalar(ScalarKind::Double), true)
        );
    }

    #[test]
    fn test_unsigned_64_is_not_narrowed() {
        assert_eq!(map_native_type("ULong64_t").0, FieldType::Scalar(ScalarKind::Uint64));
        assert_eq!(map_native_type("UShort_t").0, FieldType::Scalar(ScalarKind::Uint32));
    }

    #[test]
    fn test_unknown_types_pass_through() {
        for native in ["TLorentzVector", "vector<>", "map<int,float>"] {
            assert_eq!(
                map_native_type(native),
                (FieldType::Unresolved(native.to_string()), false)
            );
        }
    }

    #[test]
    fn test_sequence_of_unknown_is_repeated() {
        for (native, inner) in [
            ("vector<TLorentzVector>", "TLorentzVector"),
            ("std::vector<TLorentzVector>", "TLorentzVector"),
            ("vector<vector<int>>", "vector<int>"),
        ] {
            assert_eq!(
                map_native_type(native),
                (FieldType::Unresolved(inner.to_string()), true)
            );
        }
    }

    proptest! {
        #[test]
        fn prop_unknown_identifiers_unchanged(name in "[A-Z][a-z]{3,12}Obj") {
            prop_assert_eq!(map_native_type(&name), (FieldType::Unresolved(name.clone()), false));
        }
    }
}
