//! Typed value buffers shared between a tree and the conversion loop

use crate::schema::ScalarKind;

/// Initial capacity of array buffers bound to repeated fields.
pub const ARRAY_SEED_CAPACITY: usize = 10;

/// A single value of one of the schema scalar kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Uint32(u32),
    Uint64(u64),
    Float(f32),
    Double(f64),
    Bytes(Vec<u8>),
    String(String),
}

impl ScalarValue {
    /// Zero value of `kind`.
    pub fn zero(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Bool => ScalarValue::Bool(false),
            ScalarKind::Int32 => ScalarValue::Int32(0),
            ScalarKind::Int64 => ScalarValue::Int64(0),
            ScalarKind::Uint32 => ScalarValue::Uint32(0),
            ScalarKind::Uint64 => ScalarValue::Uint64(0),
            ScalarKind::Float => ScalarValue::Float(0.0),
            ScalarKind::Double => ScalarValue::Double(0.0),
            ScalarKind::Bytes => ScalarValue::Bytes(Vec::new()),
            ScalarKind::String => ScalarValue::String(String::new()),
        }
    }

    pub fn kind(&self) -> ScalarKind {
        match self {
            ScalarValue::Bool(_) => ScalarKind::Bool,
            ScalarValue::Int32(_) => ScalarKind::Int32,
            ScalarValue::Int64(_) => ScalarKind::Int64,
            ScalarValue::Uint32(_) => ScalarKind::Uint32,
            ScalarValue::Uint64(_) => ScalarKind::Uint64,
            ScalarValue::Float(_) => ScalarKind::Float,
            ScalarValue::Double(_) => ScalarKind::Double,
            ScalarValue::Bytes(_) => ScalarKind::Bytes,
            ScalarValue::String(_) => ScalarKind::String,
        }
    }
}

/// A growable array of one scalar kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayValue {
    Bool(Vec<bool>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Uint32(Vec<u32>),
    Uint64(Vec<u64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Bytes(Vec<Vec<u8>>),
    String(Vec<String>),
}

impl ArrayValue {
    /// Empty array of `kind` with room for `capacity` elements.
    pub fn with_capacity(kind: ScalarKind, capacity: usize) -> Self {
        match kind {
            ScalarKind::Bool => ArrayValue::Bool(Vec::with_capacity(capacity)),
            ScalarKind::Int32 => ArrayValue::Int32(Vec::with_capacity(capacity)),
            ScalarKind::Int64 => ArrayValue::Int64(Vec::with_capacity(capacity)),
            ScalarKind::Uint32 => ArrayValue::Uint32(Vec::with_capacity(capacity)),
            ScalarKind::Uint64 => ArrayValue::Uint64(Vec::with_capacity(capacity)),
            ScalarKind::Float => ArrayValue::Float(Vec::with_capacity(capacity)),
            ScalarKind::Double => ArrayValue::Double(Vec::with_capacity(capacity)),
            ScalarKind::Bytes => ArrayValue::Bytes(Vec::with_capacity(capacity)),
            ScalarKind::String => ArrayValue::String(Vec::with_capacity(capacity)),
        }
    }

    pub fn kind(&self) -> ScalarKind {
        match self {
            ArrayValue::Bool(_) => ScalarKind::Bool,
            ArrayValue::Int32(_) => ScalarKind::Int32,
            ArrayValue::Int64(_) => ScalarKind::Int64,
            ArrayValue::Uint32(_) => ScalarKind::Uint32,
            ArrayValue::Uint64(_) => ScalarKind::Uint64,
            ArrayValue::Float(_) => ScalarKind::Float,
            ArrayValue::Double(_) => ScalarKind::Double,
            ArrayValue::Bytes(_) => ScalarKind::Bytes,
            ArrayValue::String(_) => ScalarKind::String,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ArrayValue::Bool(v) => v.len(),
            ArrayValue::Int32(v) => v.len(),
            ArrayValue::Int64(v) => v.len(),
            ArrayValue::Uint32(v) => v.len(),
            ArrayValue::Uint64(v) => v.len(),
            ArrayValue::Float(v) => v.len(),
            ArrayValue::Double(v) => v.len(),
            ArrayValue::Bytes(v) => v.len(),
            ArrayValue::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all elements, keeping the allocation.
    pub fn clear(&mut self) {
        match self {
            ArrayValue::Bool(v) => v.clear(),
            ArrayValue::Int32(v) => v.clear(),
            ArrayValue::Int64(v) => v.clear(),
            ArrayValue::Uint32(v) => v.clear(),
            ArrayValue::Uint64(v) => v.clear(),
            ArrayValue::Float(v) => v.clear(),
            ArrayValue::Double(v) => v.clear(),
            ArrayValue::Bytes(v) => v.clear(),
            ArrayValue::String(v) => v.clear(),
        }
    }

    /// Append one element; `false` when its kind does not match.
    pub fn push(&mut self, value: ScalarValue) -> bool {
        match (self, value) {
            (ArrayValue::Bool(v), ScalarValue::Bool(x)) => v.push(x),
            (ArrayValue::Int32(v), ScalarValue::Int32(x)) => v.push(x),
            (ArrayValue::Int64(v), ScalarValue::Int64(x)) => v.push(x),
            (ArrayValue::Uint32(v), ScalarValue::Uint32(x)) => v.push(x),
            (ArrayValue::Uint64(v), ScalarValue::Uint64(x)) => v.push(x),
            (ArrayValue::Float(v), ScalarValue::Float(x)) => v.push(x),
            (ArrayValue::Double(v), ScalarValue::Double(x)) => v.push(x),
            (ArrayValue::Bytes(v), ScalarValue::Bytes(x)) => v.push(x),
            (ArrayValue::String(v), ScalarValue::String(x)) => v.push(x),
            _ => return false,
        }
        true
    }
}

/// Storage a tree refreshes in place for one bound branch.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnBuffer {
    Scalar(ScalarValue),
    Array(ArrayValue),
}

impl ColumnBuffer {
    /// Allocate a zeroed scalar, or an array seeded with a small capacity.
    pub fn new(kind: ScalarKind, repeated: bool) -> Self {
        if repeated {
            ColumnBuffer::Array(ArrayValue::with_capacity(kind, ARRAY_SEED_CAPACITY))
        } else {
            ColumnBuffer::Scalar(ScalarValue::zero(kind))
        }
    }

    pub fn kind(&self) -> ScalarKind {
        match self {
            ColumnBuffer::Scalar(value) => value.kind(),
            ColumnBuffer::Array(values) => values.kind(),
        }
    }

    pub fn is_repeated(&self) -> bool {
        matches!(self, ColumnBuffer::Array(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffers() {
        let scalar = ColumnBuffer::new(ScalarKind::Uint64, false);
        assert_eq!(scalar, ColumnBuffer::Scalar(ScalarValue::Uint64(0)));
        assert!(!scalar.is_repeated());

        let ColumnBuffer::Array(ArrayValue::Float(values)) = ColumnBuffer::new(ScalarKind::Float, true)
        else {
            panic!("expected a float array");
        };
        assert!(values.is_empty());
        assert!(values.capacity() >= ARRAY_SEED_CAPACITY);
    }

    #[test]
    fn test_push_checks_kind() {
        let mut array = ArrayValue::with_capacity(ScalarKind::Int32, 2);
        assert!(array.push(ScalarValue::Int32(7)));
        assert!(!array.push(ScalarValue::Int64(7)));
        assert_eq!(array.len(), 1);
        array.clear();
        assert!(array.is_empty());
    }
}
