use std::borrow::Cow;

use crate::error::{DecodeError, EncodeError};
use crate::{BOOL_FALSE_ID, BOOL_TRUE_ID};

/// Largest length representable by the extended TL length prefix.
pub const MAX_BYTES_LEN: usize = 0x00FF_FFFF;

/// A TL byte buffer meant for reading.
///
/// All integers are little-endian. Reads never panic; running past the end of
/// the slice produces [`DecodeError::UnexpectedEof`] with the offset at which
/// the read started.
///
/// ```
/// let mut bb = brine_tl_schema::ByteBuffer::new(&[2, 65, 108, 0, 42, 0, 0, 0]);
/// assert_eq!(bb.read_string().unwrap(), "Al");
/// assert_eq!(bb.read_int(), Ok(42));
/// ```
pub struct ByteBuffer<'a> {
    data: &'a [u8],
    index: usize,
}

impl<'a> ByteBuffer<'a> {
    /// Create a new ByteBuffer that wraps the provided byte slice.
    pub fn new(data: &'a [u8]) -> ByteBuffer<'a> {
        ByteBuffer { data, index: 0 }
    }

    /// Retrieves the underlying byte slice.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Retrieves the current index into the underlying byte slice. This starts
    /// off as 0 and ends up as `self.data().len()` when everything has been
    /// read.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.index
    }

    /// Try to read `len` raw bytes starting at the current index.
    pub fn read_raw(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if len > self.remaining() {
            return Err(DecodeError::UnexpectedEof {
                offset: self.index,
                needed: len - self.remaining(),
            });
        }
        let value = &self.data[self.index..self.index + len];
        self.index += len;
        Ok(value)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_raw(N)?);
        Ok(out)
    }

    /// Try to read a 32-bit signed integer.
    pub fn read_int(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    /// Try to read a 32-bit unsigned integer (constructor ids, flags).
    pub fn read_uint(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Try to read a 64-bit signed integer.
    pub fn read_long(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    /// Try to read an IEEE-754 double.
    pub fn read_double(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_le_bytes(self.read_array()?))
    }

    /// Try to read a 128-bit value as raw bytes.
    pub fn read_int128(&mut self) -> Result<[u8; 16], DecodeError> {
        self.read_array()
    }

    /// Try to read a 256-bit value as raw bytes.
    pub fn read_int256(&mut self) -> Result<[u8; 32], DecodeError> {
        self.read_array()
    }

    /// Try to read a boxed boolean (`boolTrue` / `boolFalse`).
    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        let offset = self.index;
        match self.read_uint()? {
            BOOL_TRUE_ID => Ok(true),
            BOOL_FALSE_ID => Ok(false),
            id => Err(DecodeError::InvalidBool { offset, id }),
        }
    }

    /// Try to read a length-prefixed TL byte string, consuming its padding.
    /// The returned slice aliases the underlying memory.
    pub fn read_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        let offset = self.index;
        let first = self.read_raw(1)?[0];
        let (len, header) = match first {
            0..=253 => (first as usize, 1),
            254 => {
                let b = self.read_raw(3)?;
                (b[0] as usize | (b[1] as usize) << 8 | (b[2] as usize) << 16, 4)
            }
            prefix => return Err(DecodeError::MalformedLength { offset, prefix }),
        };
        let value = self.read_raw(len)?;
        self.read_raw(padding(header + len))?;
        Ok(value)
    }

    /// Try to read a UTF-8 string. Invalid sequences are replaced rather than
    /// rejected.
    pub fn read_string(&mut self) -> Result<Cow<'a, str>, DecodeError> {
        Ok(String::from_utf8_lossy(self.read_bytes()?))
    }
}

fn padding(len: usize) -> usize {
    (4 - len % 4) % 4
}

#[test]
fn read_int() {
    let read = |bytes| ByteBuffer::new(bytes).read_int();
    assert_eq!(read(&[]), Err(DecodeError::UnexpectedEof { offset: 0, needed: 4 }));
    assert_eq!(read(&[1, 0, 0]), Err(DecodeError::UnexpectedEof { offset: 0, needed: 1 }));
    assert_eq!(read(&[0, 0, 0, 0]), Ok(0));
    assert_eq!(read(&[1, 0, 0, 0]), Ok(1));
    assert_eq!(read(&[255, 255, 255, 255]), Ok(-1));
    assert_eq!(read(&[0, 0, 0, 128]), Ok(i32::MIN));
}

#[test]
fn read_long() {
    let read = |bytes| ByteBuffer::new(bytes).read_long();
    assert_eq!(read(&[42, 0, 0, 0, 0, 0, 0, 0]), Ok(42));
    assert_eq!(read(&[255; 8]), Ok(-1));
    assert_eq!(read(&[42, 0, 0, 0]).map_err(|e| e.offset()), Err(0));
}

#[test]
fn read_double() {
    let read = |bytes| ByteBuffer::new(bytes).read_double();
    assert_eq!(read(&[0, 0, 0, 0, 0, 0, 0xf8, 0x3f]), Ok(1.5));
    assert_eq!(read(&[0, 0, 0, 0, 0, 0, 0xd0, 0xbf]), Ok(-0.25));
}

#[test]
fn read_bool() {
    let read = |bytes| ByteBuffer::new(bytes).read_bool();
    assert_eq!(read(&[0xb5, 0x75, 0x72, 0x99]), Ok(true));
    assert_eq!(read(&[0x37, 0x97, 0x79, 0xbc]), Ok(false));
    assert_eq!(read(&[1, 0, 0, 0]), Err(DecodeError::InvalidBool { offset: 0, id: 1 }));
}

#[test]
fn read_bytes() {
    let read = |bytes| ByteBuffer::new(bytes).read_bytes();
    assert_eq!(read(&[0, 0, 0, 0]), Ok(&[][..]));
    assert_eq!(read(&[3, 1, 2, 3]), Ok(&[1, 2, 3][..]));
    assert_eq!(read(&[2, 1, 2, 0]), Ok(&[1, 2][..]));
    assert_eq!(read(&[2, 1, 2]), Err(DecodeError::UnexpectedEof { offset: 3, needed: 1 }));
    assert_eq!(read(&[5, 1, 2]), Err(DecodeError::UnexpectedEof { offset: 1, needed: 3 }));
    assert_eq!(read(&[255, 0, 0, 0]), Err(DecodeError::MalformedLength { offset: 0, prefix: 255 }));

    let mut long = vec![254, 0, 1, 0];
    long.extend(std::iter::repeat(7).take(256));
    let mut bb = ByteBuffer::new(&long);
    assert_eq!(bb.read_bytes().map(|b| b.len()), Ok(256));
    assert_eq!(bb.index(), 260);
}

#[test]
fn read_string() {
    let read = |bytes| ByteBuffer::new(bytes).read_string();
    assert_eq!(read(&[2, 65, 108, 0]), Ok(Cow::Borrowed("Al")));
    assert_eq!(read(&[4, 240, 159, 141, 149, 0, 0, 0]), Ok(Cow::Borrowed("🍕")));
    assert_eq!(
        read(&[3, 97, 237, 99]),
        Ok(Cow::Owned("a\u{FFFD}c".to_owned()))
    );
}

#[test]
fn read_sequence() {
    let mut bb = ByteBuffer::new(&[
        1, 0, 0, 0, 2, 104, 105, 0, 0x15, 0xc4, 0xb5, 0x1c, 9, 0, 0, 0, 0, 0, 0, 0,
    ]);
    assert_eq!(bb.read_int(), Ok(1));
    assert_eq!(bb.read_string(), Ok(Cow::Borrowed("hi")));
    assert_eq!(bb.read_uint(), Ok(crate::VECTOR_ID));
    assert_eq!(bb.read_long(), Ok(9));
    assert_eq!(bb.remaining(), 0);
}

/// A TL byte buffer meant for writing.
///
/// ```
/// let mut bb = brine_tl_schema::ByteBufferMut::new();
/// bb.write_string("Al").unwrap();
/// bb.write_int(42);
/// assert_eq!(bb.data(), [2, 65, 108, 0, 42, 0, 0, 0]);
/// ```
#[derive(Default)]
pub struct ByteBufferMut {
    data: Vec<u8>,
}

impl ByteBufferMut {
    /// Creates an empty ByteBufferMut ready for writing.
    pub fn new() -> ByteBufferMut {
        ByteBufferMut { data: vec![] }
    }

    /// Consumes this buffer and returns the underlying backing store.
    pub fn data(self) -> Vec<u8> {
        self.data
    }

    /// Returns the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Write a raw byte slice to the end of the buffer.
    pub fn write_raw(&mut self, value: &[u8]) {
        self.data.extend_from_slice(value);
    }

    pub fn write_int(&mut self, value: i32) {
        self.write_raw(&value.to_le_bytes());
    }

    pub fn write_uint(&mut self, value: u32) {
        self.write_raw(&value.to_le_bytes());
    }

    pub fn write_long(&mut self, value: i64) {
        self.write_raw(&value.to_le_bytes());
    }

    pub fn write_double(&mut self, value: f64) {
        self.write_raw(&value.to_le_bytes());
    }

    /// Write a boxed boolean.
    pub fn write_bool(&mut self, value: bool) {
        self.write_uint(if value { BOOL_TRUE_ID } else { BOOL_FALSE_ID });
    }

    /// Write a length-prefixed TL byte string followed by zero padding up to a
    /// multiple of four bytes.
    pub fn write_bytes(&mut self, value: &[u8]) -> Result<(), EncodeError> {
        let len = value.len();
        let header = if len < 254 {
            self.data.push(len as u8);
            1
        } else if len <= MAX_BYTES_LEN {
            self.data.extend_from_slice(&[254, len as u8, (len >> 8) as u8, (len >> 16) as u8]);
            4
        } else {
            return Err(EncodeError::TooLong(len));
        };
        self.data.extend_from_slice(value);
        self.data.resize(self.data.len() + padding(header + len), 0);
        Ok(())
    }

    /// Write a UTF-8 string as a TL byte string.
    pub fn write_string(&mut self, value: &str) -> Result<(), EncodeError> {
        self.write_bytes(value.as_bytes())
    }
}

#[cfg(test)]
fn write_once(cb: fn(&mut ByteBufferMut)) -> Vec<u8> {
    let mut bb = ByteBufferMut::new();
    cb(&mut bb);
    bb.data()
}

#[test]
fn write_int() {
    assert_eq!(write_once(|bb| bb.write_int(0)), [0, 0, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_int(1)), [1, 0, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_int(-1)), [255, 255, 255, 255]);
    assert_eq!(write_once(|bb| bb.write_uint(0x1cb5c415)), [0x15, 0xc4, 0xb5, 0x1c]);
}

#[test]
fn write_long() {
    assert_eq!(write_once(|bb| bb.write_long(42)), [42, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_long(-2)), [254, 255, 255, 255, 255, 255, 255, 255]);
}

#[test]
fn write_double() {
    assert_eq!(write_once(|bb| bb.write_double(1.0)), [0, 0, 0, 0, 0, 0, 0xf0, 0x3f]);
}

#[test]
fn write_bool() {
    assert_eq!(write_once(|bb| bb.write_bool(true)), [0xb5, 0x75, 0x72, 0x99]);
    assert_eq!(write_once(|bb| bb.write_bool(false)), [0x37, 0x97, 0x79, 0xbc]);
}

#[test]
fn write_bytes() {
    assert_eq!(write_once(|bb| bb.write_bytes(&[]).unwrap()), [0, 0, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_bytes(&[1, 2, 3]).unwrap()), [3, 1, 2, 3]);
    assert_eq!(write_once(|bb| bb.write_string("Al").unwrap()), [2, 65, 108, 0]);
    assert_eq!(write_once(|bb| bb.write_bytes(&[9; 4]).unwrap()), [4, 9, 9, 9, 9, 0, 0, 0]);

    let short = write_once(|bb| bb.write_bytes(&[1; 253]).unwrap());
    assert_eq!(short.len(), 256);
    assert_eq!(short[0], 253);

    let long = write_once(|bb| bb.write_bytes(&[1; 254]).unwrap());
    assert_eq!(&long[..4], &[254, 254, 0, 0]);
    assert_eq!(long.len(), 260);

    let mut bb = ByteBufferMut::new();
    assert_eq!(
        bb.write_bytes(&vec![0; MAX_BYTES_LEN + 1]),
        Err(EncodeError::TooLong(MAX_BYTES_LEN + 1))
    );
}

#[test]
fn write_sequence() {
    let mut bb = ByteBufferMut::new();
    bb.write_int(1);
    bb.write_string("hi").unwrap();
    bb.write_uint(crate::VECTOR_ID);
    bb.write_long(9);
    assert_eq!(
        bb.data(),
        [1, 0, 0, 0, 2, 104, 105, 0, 0x15, 0xc4, 0xb5, 0x1c, 9, 0, 0, 0, 0, 0, 0, 0]
    );
}
