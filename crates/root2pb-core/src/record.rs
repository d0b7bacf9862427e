//! Wire encoding of data records.
//!
//! A record is encoded straight from the column buffers: each slot names a
//! binding, a field number and a codec, and [`Record::encode`] walks the
//! slots in descriptor order. Singular fields are always written (proto2
//! presence), repeated fields are written element by element or as one
//! packed run.

use crate::descriptor::{FieldSpec, Type};
use crate::schema::ScalarKind;
use crate::source::{ArrayValue, ColumnBinding, ColumnBuffer, ScalarValue};
use prost::encoding;
use root2pb_common::{Result, Root2pbError};

/// Encoding of one declared protobuf scalar type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
}

impl Codec {
    /// Codec for a declared field type; message, group and enum fields
    /// have no column equivalent.
    pub fn for_field(spec: &FieldSpec) -> Result<Self> {
        let codec = match spec.declared {
            Type::Double => Codec::Double,
            Type::Float => Codec::Float,
            Type::Int32 => Codec::Int32,
            Type::Int64 => Codec::Int64,
            Type::Uint32 => Codec::Uint32,
            Type::Uint64 => Codec::Uint64,
            Type::Sint32 => Codec::Sint32,
            Type::Sint64 => Codec::Sint64,
            Type::Fixed32 => Codec::Fixed32,
            Type::Fixed64 => Codec::Fixed64,
            Type::Sfixed32 => Codec::Sfixed32,
            Type::Sfixed64 => Codec::Sfixed64,
            Type::Bool => Codec::Bool,
            Type::String => Codec::String,
            Type::Bytes => Codec::Bytes,
            Type::Message | Type::Group | Type::Enum => {
                return Err(Root2pbError::UnsupportedFieldType {
                    field: spec.name.clone(),
                    declared: spec.declared.proto_name().to_string(),
                })
            },
        };
        Ok(codec)
    }

    /// Buffer kind the column must be read as.
    pub fn buffer_kind(self) -> ScalarKind {
        match self {
            Codec::Double => ScalarKind::Double,
            Codec::Float => ScalarKind::Float,
            Codec::Int32 | Codec::Sint32 | Codec::Sfixed32 => ScalarKind::Int32,
            Codec::Int64 | Codec::Sint64 | Codec::Sfixed64 => ScalarKind::Int64,
            Codec::Uint32 | Codec::Fixed32 => ScalarKind::Uint32,
            Codec::Uint64 | Codec::Fixed64 => ScalarKind::Uint64,
            Codec::Bool => ScalarKind::Bool,
            Codec::String => ScalarKind::String,
            Codec::Bytes => ScalarKind::Bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    number: u32,
    codec: Codec,
    packed: bool,
    /// Index into the binding list
    binding: usize,
    field: String,
}

/// Field layout of the data message, matched to column bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    slots: Vec<Slot>,
}

impl Record {
    /// Add a slot for `spec`, read from `bindings[binding]`.
    pub fn push(&mut self, spec: &FieldSpec, codec: Codec, binding: usize) {
        self.slots.push(Slot {
            number: spec.number,
            codec,
            packed: spec.packed && spec.repeated,
            binding,
            field: spec.name.clone(),
        });
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Append the wire encoding of the current buffer contents to `out`.
    pub fn encode(&self, bindings: &[ColumnBinding], out: &mut Vec<u8>) -> Result<()> {
        for slot in &self.slots {
            let binding = bindings.get(slot.binding).ok_or_else(|| {
                Root2pbError::descriptor(format!("field {} lost its binding", slot.field))
            })?;
            if !slot.put(binding.buffer(), out) {
                return Err(Root2pbError::bind_mismatch(
                    binding.branch(),
                    format!("{:?}", slot.codec).to_lowercase(),
                    binding.buffer().kind().to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Encode a numeric buffer with one of the `prost::encoding` modules.
macro_rules! numeric {
    ($module:ident, $variant:ident, $slot:expr, $buffer:expr, $out:expr) => {
        match $buffer {
            ColumnBuffer::Scalar(ScalarValue::$variant(v)) => {
                encoding::$module::encode($slot.number, v, $out)
            },
            ColumnBuffer::Array(ArrayValue::$variant(vs)) if $slot.packed => {
                encoding::$module::encode_packed($slot.number, vs, $out)
            },
            ColumnBuffer::Array(ArrayValue::$variant(vs)) => {
                encoding::$module::encode_repeated($slot.number, vs, $out)
            },
            _ => return false,
        }
    };
}

impl Slot {
    /// `false` when the buffer does not hold the codec's kind.
    fn put(&self, buffer: &ColumnBuffer, out: &mut Vec<u8>) -> bool {
        match self.codec {
            Codec::Double => numeric!(double, Double, self, buffer, out),
            Codec::Float => numeric!(float, Float, self, buffer, out),
            Codec::Int32 => numeric!(int32, Int32, self, buffer, out),
            Codec::Int64 => numeric!(int64, Int64, self, buffer, out),
            Codec::Uint32 => numeric!(uint32, Uint32, self, buffer, out),
            Codec::Uint64 => numeric!(uint64, Uint64, self, buffer, out),
            Codec::Sint32 => numeric!(sint32, Int32, self, buffer, out),
            Codec::Sint64 => numeric!(sint64, Int64, self, buffer, out),
            Codec::Fixed32 => numeric!(fixed32, Uint32, self, buffer, out),
            Codec::Fixed64 => numeric!(fixed64, Uint64, self, buffer, out),
            Codec::Sfixed32 => numeric!(sfixed32, Int32, self, buffer, out),
            Codec::Sfixed64 => numeric!(sfixed64, Int64, self, buffer, out),
            Codec::Bool => numeric!(bool, Bool, self, buffer, out),
            Codec::String => match buffer {
                ColumnBuffer::Scalar(ScalarValue::String(v)) => {
                    encoding::string::encode(self.number, v, out)
                },
                ColumnBuffer::Array(ArrayValue::String(vs)) => {
                    encoding::string::encode_repeated(self.number, vs, out)
                },
                _ => return false,
            },
            Codec::Bytes => match buffer {
                ColumnBuffer::Scalar(ScalarValue::Bytes(v)) => {
                    encoding::bytes::encode(self.number, v, out)
                },
                ColumnBuffer::Array(ArrayValue::Bytes(vs)) => {
                    encoding::bytes::encode_repeated(self.number, vs, out)
                },
                _ => return false,
            },
        }
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use prost::Message;

    #[derive(Clone, PartialEq, Message)]
    struct Sample {
        #[prost(sint32, optional, tag = "1")]
        s: Option<i32>,
        #[prost(fixed64, repeated, packed = "true", tag = "2")]
        f: Vec<u64>,
        #[prost(string, repeated, tag = "3")]
        names: Vec<String>,
        #[prost(double, repeated, packed = "false", tag = "4")]
        loose: Vec<f64>,
        #[prost(bytes = "vec", optional, tag = "5")]
        raw: Option<Vec<u8>>,
    }

    fn spec(name: &str, number: u32, declared: Type, repeated: bool, packed: bool) -> FieldSpec {
        FieldSpec {
            name: name.to_string(),
            number,
            declared,
            repeated,
            packed,
            branch: name.to_string(),
        }
    }

    #[test]
    fn test_codec_buffer_kinds() {
        let sint = Codec::for_field(&spec("s", 1, Type::Sint32, false, false)).unwrap();
        assert_eq!(sint.buffer_kind(), ScalarKind::Int32);
        let fixed = Codec::for_field(&spec("f", 1, Type::Fixed64, false, false)).unwrap();
        assert_eq!(fixed.buffer_kind(), ScalarKind::Uint64);
    }

    #[test]
    fn test_message_fields_rejected() {
        for declared in [Type::Message, Type::Group, Type::Enum] {
            let err = Codec::for_field(&spec("p4", 1, declared, false, false)).unwrap_err();
            assert!(matches!(err, Root2pbError::UnsupportedFieldType { .. }));
        }
    }

    #[test]
    fn test_encode_matches_prost() {
        let specs = [
            spec("s", 1, Type::Sint32, false, false),
            spec("f", 2, Type::Fixed64, true, true),
            spec("names", 3, Type::String, true, false),
            spec("loose", 4, Type::Double, true, false),
            spec("raw", 5, Type::Bytes, false, false),
        ];
        let bindings = vec![
            ColumnBinding::new("s", 0, ColumnBuffer::Scalar(ScalarValue::Int32(-3))),
            ColumnBinding::new("f", 1, ColumnBuffer::Array(ArrayValue::Uint64(vec![1, u64::MAX]))),
            ColumnBinding::new(
                "names",
                2,
                ColumnBuffer::Array(ArrayValue::String(vec!["a".to_string(), "bc".to_string()])),
            ),
            ColumnBinding::new("loose", 3, ColumnBuffer::Array(ArrayValue::Double(vec![0.5, -2.0]))),
            ColumnBinding::new("raw", 4, ColumnBuffer::Scalar(ScalarValue::Bytes(vec![0, 1, 2]))),
        ];

        let mut record = Record::default();
        for (i, spec) in specs.iter().enumerate() {
            record.push(spec, Codec::for_field(spec).unwrap(), i);
        }
        assert_eq!(record.len(), 5);

        let mut out = Vec::new();
        record.encode(&bindings, &mut out).unwrap();

        let expected = Sample {
            s: Some(-3),
            f: vec![1, u64::MAX],
            names: vec!["a".to_string(), "bc".to_string()],
            loose: vec![0.5, -2.0],
            raw: Some(vec![0, 1, 2]),
        };
        assert_eq!(out, expected.encode_to_vec());
        assert_eq!(Sample::decode(out.as_slice()).unwrap(), expected);
    }

    #[test]
    fn test_zero_scalars_are_present() {
        let spec = spec("s", 1, Type::Sint32, false, false);
        let mut record = Record::default();
        record.push(&spec, Codec::Sint32, 0);
        let bindings = vec![ColumnBinding::new("s", 0, ColumnBuffer::Scalar(ScalarValue::Int32(0)))];

        let mut out = Vec::new();
        record.encode(&bindings, &mut out).unwrap();
        assert_eq!(out, vec![0x08, 0x00]);
    }

    #[test]
    fn test_empty_repeated_writes_nothing() {
        let spec = spec("f", 2, Type::Fixed64, true, true);
        let mut record = Record::default();
        record.push(&spec, Codec::Fixed64, 0);
        let bindings = vec![ColumnBinding::new("f", 0, ColumnBuffer::Array(ArrayValue::Uint64(vec![])))];

        let mut out = Vec::new();
        record.encode(&bindings, &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_kind_mismatch_is_reported() {
        let spec = spec("s", 1, Type::Int32, false, false);
        let mut record = Record::default();
        record.push(&spec, Codec::Int32, 0);
        let bindings = vec![ColumnBinding::new("s", 0, ColumnBuffer::Scalar(ScalarValue::Double(1.0)))];

        let err = record.encode(&bindings, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, Root2pbError::BindMismatch { .. }));
    }
}
