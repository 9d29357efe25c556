use brine_tl_schema::{DecodeError, EncodeError};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TlError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}, column {column}: {msg}")]
    ParseError {
        msg:    String,
        line:   usize,
        column: usize,
    },

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Duplicate constructor id 0x{id:08x}: {first} and {second} have different signatures")]
    DuplicateId {
        id:     u32,
        first:  String,
        second: String,
    },

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Missing required field \"{0}\"")]
    MissingField(String),

    #[error("Expected {expected} but found {found}")]
    UnexpectedValue {
        expected: String,
        found:    String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A declared constructor id that differs from the checksum of its
/// signature. The build keeps the declared id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationWarning {
    pub name:     String,
    pub declared: u32,
    pub computed: u32,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} declares id 0x{:08x} but its signature hashes to 0x{:08x}",
            self.name, self.declared, self.computed
        )
    }
}
