//! Minimal view of a compiled descriptor set.
//!
//! Only the parts of `google/protobuf/descriptor.proto` the conversion
//! engine reads are declared; everything else in a `protoc
//! --descriptor_set_out` file is skipped on decode. The custom
//! `source_branch` option is declared directly on [`FieldOptions`] under its
//! extension number, so it decodes like any other field.

use crate::schema::HEADER_MESSAGE;
use prost::Message;
use root2pb_common::{Result, Root2pbError};
use std::path::Path;
use tracing::debug;

#[derive(Clone, PartialEq, Message)]
pub struct FileDescriptorSet {
    #[prost(message, repeated, tag = "1")]
    pub file: Vec<FileDescriptorProto>,
}

#[derive(Clone, PartialEq, Message)]
pub struct FileDescriptorProto {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub package: Option<String>,
    #[prost(message, repeated, tag = "4")]
    pub message_type: Vec<DescriptorProto>,
}

#[derive(Clone, PartialEq, Message)]
pub struct DescriptorProto {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(message, repeated, tag = "2")]
    pub field: Vec<FieldDescriptorProto>,
}

#[derive(Clone, PartialEq, Message)]
pub struct FieldDescriptorProto {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(int32, optional, tag = "3")]
    pub number: Option<i32>,
    #[prost(enumeration = "Label", optional, tag = "4")]
    pub label: Option<i32>,
    #[prost(enumeration = "Type", optional, tag = "5")]
    pub r#type: Option<i32>,
    #[prost(message, optional, tag = "8")]
    pub options: Option<FieldOptions>,
}

#[derive(Clone, PartialEq, Message)]
pub struct FieldOptions {
    #[prost(bool, optional, tag = "2")]
    pub packed: Option<bool>,
    /// `(source_branch)`, extension 50002
    #[prost(string, optional, tag = "50002")]
    pub source_branch: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum Label {
    Optional = 1,
    Required = 2,
    Repeated = 3,
}

/// Declared field types, numbered as in `descriptor.proto`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum Type {
    Double = 1,
    Float = 2,
    Int64 = 3,
    Uint64 = 4,
    Int32 = 5,
    Fixed64 = 6,
    Fixed32 = 7,
    Bool = 8,
    String = 9,
    Group = 10,
    Message = 11,
    Bytes = 12,
    Uint32 = 13,
    Enum = 14,
    Sfixed32 = 15,
    Sfixed64 = 16,
    Sint32 = 17,
    Sint64 = 18,
}

impl Type {
    /// The keyword used in `.proto` text.
    pub fn proto_name(self) -> &'static str {
        match self {
            Type::Double => "double",
            Type::Float => "float",
            Type::Int64 => "int64",
            Type::Uint64 => "uint64",
            Type::Int32 => "int32",
            Type::Fixed64 => "fixed64",
            Type::Fixed32 => "fixed32",
            Type::Bool => "bool",
            Type::String => "string",
            Type::Group => "group",
            Type::Message => "message",
            Type::Bytes => "bytes",
            Type::Uint32 => "uint32",
            Type::Enum => "enum",
            Type::Sfixed32 => "sfixed32",
            Type::Sfixed64 => "sfixed64",
            Type::Sint32 => "sint32",
            Type::Sint64 => "sint64",
        }
    }
}

/// Read and decode a descriptor set file.
pub fn load_descriptor_set(path: impl AsRef<Path>) -> Result<FileDescriptorSet> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let set = FileDescriptorSet::decode(bytes.as_slice())?;
    debug!(path = %path.display(), files = set.file.len(), "Loaded descriptor set");
    Ok(set)
}

/// The data message selected from a descriptor set.
#[derive(Debug, Clone, Copy)]
pub struct TargetMessage<'a> {
    pub package: &'a str,
    pub message: &'a DescriptorProto,
}

impl TargetMessage<'_> {
    pub fn name(&self) -> &str {
        self.message.name()
    }

    /// `package.Message`, or just the name without a package.
    pub fn full_name(&self) -> String {
        if self.package.is_empty() {
            self.name().to_string()
        } else {
            format!("{}.{}", self.package, self.name())
        }
    }
}

/// Locate the data message.
///
/// With `name`, the message of that simple or package-qualified name is
/// used. Otherwise the set must contain exactly one message declared in a
/// file next to [`HEADER_MESSAGE`].
pub fn find_target_message<'a>(
    set: &'a FileDescriptorSet,
    name: Option<&str>,
) -> Result<TargetMessage<'a>> {
    let all = set.file.iter().flat_map(|file| {
        file.message_type.iter().map(move |message| TargetMessage {
            package: file.package(),
            message,
        })
    });

    if let Some(name) = name {
        return all
            .filter(|t| t.name() != HEADER_MESSAGE)
            .find(|t| t.name() == name || t.full_name() == name)
            .ok_or_else(|| {
                Root2pbError::descriptor(format!("message '{}' not found in descriptor set", name))
            });
    }

    let candidates: Vec<TargetMessage<'a>> = set
        .file
        .iter()
        .filter(|file| file.message_type.iter().any(|m| m.name() == HEADER_MESSAGE))
        .flat_map(|file| {
            file.message_type
                .iter()
                .filter(|m| m.name() != HEADER_MESSAGE)
                .map(move |message| TargetMessage {
                    package: file.package(),
                    message,
                })
        })
        .collect();

    match candidates.as_slice() {
        [only] => Ok(*only),
        [] => Err(Root2pbError::descriptor(format!(
            "no data message declared next to {}",
            HEADER_MESSAGE
        ))),
        many => Err(Root2pbError::descriptor(format!(
            "several data messages found ({}); pick one with --message",
            many.iter().map(TargetMessage::full_name).collect::<Vec<_>>().join(", ")
        ))),
    }
}

/// One field of the data message with its source branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub number: u32,
    pub declared: Type,
    pub repeated: bool,
    pub packed: bool,
    pub branch: String,
}

/// Read every field of `message` together with its `(source_branch)`.
pub fn field_specs(message: &DescriptorProto) -> Result<Vec<FieldSpec>> {
    message
        .field
        .iter()
        .map(|field| {
            let number = u32::try_from(field.number())
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    Root2pbError::descriptor(format!(
                        "field {} has invalid number {}",
                        field.name(),
                        field.number()
                    ))
                })?;

            let branch = field
                .options
                .as_ref()
                .and_then(|o| o.source_branch.clone())
                .ok_or_else(|| {
                    Root2pbError::descriptor(format!(
                        "field {}.{} has no (source_branch) option",
                        message.name(),
                        field.name()
                    ))
                })?;

            Ok(FieldSpec {
                name: field.name().to_string(),
                number,
                declared: field.r#type(),
                repeated: field.label() == Label::Repeated,
                packed: field.options.as_ref().is_some_and(|o| o.packed()),
                branch,
            })
        })
        .collect()
}
