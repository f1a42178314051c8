//! Schema-driven codec for the [protobuf](https://protobuf.dev) wire format.
//!
//! Messages are described at runtime by a [`MessageSchema`] registered in a
//! [`Registry`], and carried as dynamic [`MessageValue`]s. The same schema
//! drives both the binary encoding and the JSON mapping.
//!
//! ```
//! use protoflex::codec::ScalarType;
//! use protoflex::{MessageSchema, MessageValue, Registry};
//!
//! let mut registry = Registry::new();
//! registry
//!     .insert_message(MessageSchema::builder("Test1").field("a", 1, ScalarType::Int32).build()?)?;
//!
//! let bytes = registry.encode("Test1", &MessageValue::new().with("a", 150i32))?;
//! assert_eq!(bytes, [0x08, 0x96, 0x01]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod codec;
pub mod error;
pub mod leb128;
pub mod schema;
pub mod value;
pub mod wire;

pub use error::{DecodeError, EncodeError, JsonError, SchemaError};
pub use schema::{EnumSchema, MessageSchema, Registry};
pub use value::{MapKey, MessageValue, OneofValue, Value};

static_assertions::assert_impl_all!(Registry: Send, Sync);
