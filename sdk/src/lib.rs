//! brine-tl
//!
//! Compiles TL schemas into a [`Registry`] and encodes or decodes values
//! against it.
//!
//! - `FromTl` trait and `TlError` (re-exported from the compiler)
//! - Runtime types: [`Registry`], [`Value`], byte buffers
//! - JSON helpers for inspecting compiled registries and decoded values
//!
//! ```
//! use brine_tl::{build_registry, SchemaSource, CompileOptions, Value};
//!
//! let registry = build_registry(
//!     &[SchemaSource::new("api.tl", "userEmpty#d3bc4b7a id:long = User;")],
//!     &CompileOptions::default(),
//! ).unwrap();
//!
//! let user = Value::object("userEmpty", [("id", Value::Long(7))]);
//! let bytes = registry.encode(&user).unwrap();
//! assert_eq!(registry.decode(&bytes).unwrap(), user);
//! ```

pub use brine_tl_compiler::{
    compile_registry_to_rust, compile_schema, compile_sources, required, strip_schema, CompileOptions,
    CompileOutput, FromTl, SchemaSource, TlError, ValidationWarning,
};
pub use brine_tl_schema::{
    ByteBuffer, ByteBufferMut, DecodeError, Def, DefKind, Descriptor, EncodeError, Primitive, Registry,
    ResultType, TypeRef, Value,
};

/// Compile `sources` into a registry, dropping the id warnings after they
/// have been logged.
pub fn build_registry(sources: &[SchemaSource], options: &CompileOptions) -> Result<Registry, TlError> {
    Ok(compile_sources(sources, options)?.registry)
}

/// The registry's definitions as pretty-printed JSON.
pub fn registry_to_json(registry: &Registry) -> Result<String, TlError> {
    Ok(serde_json::to_string_pretty(registry)?)
}

/// Decode a boxed value and render it as pretty-printed JSON.
pub fn decode_to_json(registry: &Registry, buffer: &[u8]) -> Result<String, TlError> {
    let value = registry.decode(buffer)?;
    Ok(serde_json::to_string_pretty(&value)?)
}

pub mod traits {
    pub use brine_tl_compiler::traits::{required, FromTl};
}

pub mod error {
    pub use brine_tl_compiler::error::{TlError, ValidationWarning};
    pub use brine_tl_schema::{DecodeError, EncodeError};
}

pub mod schema {
    pub use brine_tl_schema::{Def, DefKind, Param, Primitive, Registry, ResultType, TypeRef, Value};
}
