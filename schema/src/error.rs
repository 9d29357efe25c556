use thiserror::Error;

/// Failure while reading TL data. Every variant carries the byte offset at
/// which the problem was detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Unexpected end of buffer at offset {offset}: needed {needed} more bytes")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
    },

    #[error("Malformed length prefix 0x{prefix:02x} at offset {offset}")]
    MalformedLength {
        offset: usize,
        prefix: u8,
    },

    #[error("Negative vector length {len} at offset {offset}")]
    NegativeLength {
        offset: usize,
        len:    i32,
    },

    #[error("Unknown constructor id 0x{id:08x} at offset {offset}")]
    UnknownId {
        offset: usize,
        id:     u32,
    },

    #[error("Expected constructor id 0x{expected:08x} but found 0x{found:08x} at offset {offset}")]
    IdMismatch {
        offset:   usize,
        expected: u32,
        found:    u32,
    },

    #[error("Expected a constructor of type {expected} but found {found} at offset {offset}")]
    TypeMismatch {
        offset:   usize,
        expected: String,
        found:    String,
    },

    #[error("Invalid boolean id 0x{id:08x} at offset {offset}")]
    InvalidBool {
        offset: usize,
        id:     u32,
    },

    #[error("Objects nested deeper than {limit} levels at offset {offset}")]
    TooDeep {
        offset: usize,
        limit:  usize,
    },

    #[error("Definition {name} cannot be decoded: {reason} (offset {offset})")]
    Unsupported {
        offset: usize,
        name:   String,
        reason: String,
    },
}

impl DecodeError {
    /// Byte offset into the input where decoding failed.
    pub fn offset(&self) -> usize {
        match *self {
            DecodeError::UnexpectedEof { offset, .. }
            | DecodeError::MalformedLength { offset, .. }
            | DecodeError::NegativeLength { offset, .. }
            | DecodeError::UnknownId { offset, .. }
            | DecodeError::IdMismatch { offset, .. }
            | DecodeError::TypeMismatch { offset, .. }
            | DecodeError::InvalidBool { offset, .. }
            | DecodeError::TooDeep { offset, .. }
            | DecodeError::Unsupported { offset, .. } => offset,
        }
    }
}

/// Failure while writing TL data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("Missing required field \"{field}\" on {name}")]
    MissingField {
        name:  String,
        field: String,
    },

    #[error("Unknown constructor \"{0}\"")]
    UnknownConstructor(String),

    #[error("Expected {expected} but got {found}")]
    TypeMismatch {
        expected: String,
        found:    String,
    },

    #[error("Byte string of {0} bytes exceeds the maximum TL length")]
    TooLong(usize),

    #[error("Definition \"{0}\" has no id and cannot be written boxed")]
    Abstract(String),
}
