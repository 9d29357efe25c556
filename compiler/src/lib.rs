//! brine-tl-compiler
//!
//! This crate implements:
//!  1) A loader for `.tl` sources (layer comments, comment stripping),
//!  2) A tokenizer + parser for TL declarations,
//!  3) A model builder resolving every type reference across sources,
//!  4) Constructor id derivation and checking (CRC-32 of the signature),
//!  5) Emission and assembly into a [`brine_tl_schema::Registry`],
//!  6) Code generation (`compile_registry_to_rust` → `String`),
//!  7) Error types (`TlError`), and the `FromTl` trait.

pub mod error;
pub mod types;
pub mod utils;
pub mod loader;
pub mod tokenizer;
pub mod parser;
pub mod model;
pub mod ids;
pub mod emitter;
pub mod assembler;
pub mod compiler;
pub mod gen_rust;
pub mod traits;

pub use compiler::{compile_schema, compile_sources, parse_source, CompileOptions, CompileOutput};
pub use error::{TlError, ValidationWarning};
pub use gen_rust::compile_registry_to_rust;
pub use ids::{canonical_signature, signature_id};
pub use loader::{strip_schema, SchemaSource};
pub use traits::{required, FromTl};
