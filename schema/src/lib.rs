//! Runtime support for compiled TL schemas: little-endian byte buffers, the
//! dynamic [`Value`] type, compiled definitions and the [`Registry`] that
//! encodes and decodes values against them.
//!
//! ```
//! use brine_tl_schema::*;
//!
//! let registry = Registry::new(vec![
//!     Def {
//!         name: "userEmpty".to_owned(),
//!         id: Some(0xd3bc4b7a),
//!         kind: DefKind::Constructor,
//!         params: vec![Param {
//!             name: "id".to_owned(),
//!             ty: TypeRef::Primitive(Primitive::Long),
//!             flag: None,
//!         }],
//!         result: ResultType::Known(TypeRef::Named { name: "User".to_owned(), bare: false }),
//!         generics: vec![],
//!         signature: "userEmpty id:long = User".to_owned(),
//!     },
//! ], None);
//!
//! let value = Value::object("userEmpty", [("id", Value::Long(42))]);
//! let bytes = registry.encode(&value).unwrap();
//! assert_eq!(bytes, [0x7a, 0x4b, 0xbc, 0xd3, 42, 0, 0, 0, 0, 0, 0, 0]);
//! assert_eq!(registry.decode(&bytes).unwrap(), value);
//! ```

pub mod bb;
pub mod error;
pub mod registry;
pub mod schema;
pub mod value;

pub use bb::*;
pub use error::*;
pub use registry::*;
pub use schema::*;
pub use value::*;

pub const BOOL_TRUE_ID: u32 = 0x997275b5;
pub const BOOL_FALSE_ID: u32 = 0xbc799737;
pub const VECTOR_ID: u32 = 0x1cb5c415;
