//! root2pb Core Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Turns a columnar tree into a protobuf schema and, driven by the compiled
//! schema, into a stream of protobuf records.
//!
//! # Pipeline
//!
//! 1. [`extract::extract_fields`] walks the branches of a tree, maps their
//!    native types ([`typemap`]), filters them ([`select`]) and numbers them
//!    ([`ids`]).
//! 2. [`emit::write_schema`] renders the field list as proto2 text.
//! 3. [`orchestrate::run`] compiles the text with `protoc` ([`protoc`]) and
//!    optionally converts the tree, in process or in a disposable
//!    [`workspace`].
//! 4. [`convert::convert`] reads the descriptor set ([`descriptor`]), binds
//!    every field to its branch ([`source`]) and writes the records
//!    ([`record`]).
//!
//! # Example
//!
//! ```no_run
//! use root2pb_core::extract::extract_fields;
//! use root2pb_core::ids::IdAllocator;
//! use root2pb_core::schema::SchemaDocument;
//! use root2pb_core::select::BranchSelection;
//! use root2pb_core::source::open_source;
//! use root2pb_core::emit::write_schema;
//!
//! fn schema() -> root2pb_common::Result<()> {
//!     let source = open_source("events.json")?;
//!     let ids = IdAllocator::start()?;
//!     let selection = BranchSelection::parse("+*,-internal*");
//!     let fields = extract_fields(source.as_ref(), "events", &selection, &ids, false)?;
//!     let doc = SchemaDocument::new("root2pb", "Event", fields)?;
//!     write_schema(&doc, "event.proto")
//! }
//! ```

pub mod convert;
pub mod descriptor;
pub mod emit;
pub mod extract;
pub mod ids;
pub mod orchestrate;
pub mod protoc;
pub mod record;
pub mod schema;
pub mod select;
pub mod source;
pub mod typemap;
pub mod workspace;

pub use convert::{ConvertRequest, ConvertSummary, Framing};
pub use orchestrate::{BuildRequest, ConversionPlan, ConvertMode};
pub use schema::{Field, FieldList, FieldType, ScalarKind, SchemaDocument};
