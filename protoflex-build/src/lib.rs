//! `protoflex-build` resolves parsed `.proto` schemas into field tables bound
//! to protoflex runtime codecs.
//!
//! The input is an AST (see [`ast`]), served by a [`SchemaSource`]: an
//! in-memory [`MemorySource`] of hand-built files, or a
//! [`DescriptorSource`](descriptor::DescriptorSource) decoded from a
//! `FileDescriptorSet`. The output is one [`ResolvedFile`] per loaded file,
//! plus a ready-to-use runtime [`Registry`](protoflex::Registry).
//!
//! # Example
//!
//! ```rust
//! use protoflex::{MessageValue, Value};
//! use protoflex_build::ast::{Field, Message, ProtoFile};
//! use protoflex_build::MemorySource;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let source = MemorySource::new().with(
//!     "test.proto",
//!     ProtoFile::new().message(Message::new("Test1").field(Field::new("a", 1, "int32"))),
//! );
//!
//! let resolution = protoflex_build::resolve(&source, "test.proto")?;
//! let registry = resolution.registry()?;
//!
//! let message = MessageValue::new().with("a", Value::I32(150));
//! assert_eq!(registry.encode("Test1", &message)?, [0x08, 0x96, 0x01]);
//! # Ok(())
//! # }
//! ```
//!
//! # Resolution
//!
//! Every import is loaded first, relative to the importing file and then
//! under each include root configured with [`Config::include`]. Type names
//! are then looked up in order: local enums, local messages, primitive
//! types, and finally the enums and messages of imported files (including
//! whatever those re-export with `import public`).
//!
//! Recursive message fields are detected and marked:
//!
//! ```protobuf
//! message Node {
//!   Node left = 1;   // recursive, default absent
//!   Node right = 2;  // recursive, default absent
//! }
//! ```

pub mod ast;
mod config;
mod context;
pub mod descriptor;
mod error;
mod output;
mod resolver;
pub mod source;

pub use config::Config;
pub use error::Error;
pub use output::{FieldKind, Resolution, ResolvedField, ResolvedFile, ResolvedMessage, TypeRef};
pub use source::{MemorySource, SchemaSource};

/// Resolve `entry` and everything it imports with default settings.
///
/// Use [`Config`] to add include roots or change the assumed syntax.
pub fn resolve<S>(source: &S, entry: impl AsRef<str>) -> Result<Resolution, Error>
where
    S: SchemaSource + ?Sized,
{
    Config::new().resolve(source, entry)
}
