//! Big-endian cursor types shared by every PDU body codec.
//!
//! DIS puts every multi-byte field on the wire in network byte order, so the
//! reader and writer only ever speak big-endian. Decoding never aliases the
//! buffer as a typed structure: each field is pulled out explicitly and a
//! short buffer becomes a [`DecodeError`] instead of undefined behavior.

use thiserror::Error as ThisError;

/// Errors produced while decoding a PDU from network bytes
#[derive(Debug, ThisError, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("PDU is truncated: needed {needed} bytes but only {available} remain")]
    TooShort { needed: usize, available: usize },
    #[error("Declared PDU length {declared} exceeds the {available} bytes received")]
    LengthExceedsBuffer { declared: usize, available: usize },
    #[error("Declared PDU length {declared} is smaller than the PDU header")]
    LengthTooSmall { declared: usize },
    #[error("PDU length {declared} does not match the {expected} bytes its contents require")]
    LengthMismatch { declared: usize, expected: usize },
    #[error("PDU type {pdu_type} belongs to family {expected}, header says {found}")]
    FamilyMismatch { pdu_type: u8, expected: u8, found: u8 },
    #[error("Expected PDU type {expected}, found {found}")]
    WrongPduType { expected: u8, found: u8 },
}

/// Errors produced while encoding a PDU
#[derive(Debug, ThisError, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Invalid value for field `{field}`: {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },
}

/// Reads big-endian fields from a byte slice, front to back.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Number of bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Fails with [`DecodeError::TooShort`] unless `needed` more bytes remain.
    pub fn require(&self, needed: usize) -> Result<(), DecodeError> {
        if self.remaining() < needed {
            Err(DecodeError::TooShort {
                needed: self.offset + needed,
                available: self.bytes.len(),
            })
        } else {
            Ok(())
        }
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        self.require(len)?;
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), DecodeError> {
        self.take(len).map(|_| ())
    }

    /// The unread tail of the buffer; consumes it.
    pub fn rest(&mut self) -> &'a [u8] {
        let slice = &self.bytes[self.offset..];
        self.offset = self.bytes.len();
        slice
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.array::<1>()?[0])
    }

    pub fn u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    pub fn u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    pub fn u64(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_be_bytes(self.array()?))
    }

    pub fn f32(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_be_bytes(self.array()?))
    }

    pub fn f64(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_be_bytes(self.array()?))
    }
}

/// Appends big-endian fields to a growable buffer.
#[derive(Debug, Default, Clone)]
pub struct Writer {
    bytes: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn put_u8(&mut self, v: u8) {
        self.bytes.push(v);
    }

    pub fn put_u16(&mut self, v: u16) {
        self.bytes.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_u32(&mut self, v: u32) {
        self.bytes.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_u64(&mut self, v: u64) {
        self.bytes.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_f32(&mut self, v: f32) {
        self.bytes.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_f64(&mut self, v: f64) {
        self.bytes.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    pub fn put_zeros(&mut self, count: usize) {
        self.bytes.resize(self.bytes.len() + count, 0);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Narrows a record count or length to a one-byte wire field.
pub fn narrow_u8(field: &'static str, value: usize) -> Result<u8, EncodeError> {
    u8::try_from(value).map_err(|_| EncodeError::InvalidField {
        field,
        reason: "does not fit in its 8-bit wire field",
    })
}

/// Narrows a record count or length to a two-byte wire field.
pub fn narrow_u16(field: &'static str, value: usize) -> Result<u16, EncodeError> {
    u16::try_from(value).map_err(|_| EncodeError::InvalidField {
        field,
        reason: "does not fit in its 16-bit wire field",
    })
}

/// Bytes needed to pad `len` up to a multiple of `align`.
pub fn padding_for(len: usize, align: usize) -> usize {
    (align - len % align) % align
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_big_endian() {
        let bytes = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.u8().unwrap(), 0x01);
        assert_eq!(reader.u16().unwrap(), 0x0203);
        assert_eq!(reader.u32().unwrap(), 0x04050607);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_reader_too_short() {
        let bytes = [0xAA, 0xBB, 0xCC];
        let mut reader = Reader::new(&bytes);
        reader.u8().unwrap();
        assert_eq!(
            reader.u32(),
            Err(DecodeError::TooShort {
                needed: 5,
                available: 3
            })
        );
        // A failed read consumes nothing
        assert_eq!(reader.position(), 1);
    }

    #[test]
    fn test_writer_layout() {
        let mut writer = Writer::new();
        writer.put_u16(0x1234);
        writer.put_f32(1.0);
        writer.put_zeros(2);
        assert_eq!(
            writer.as_bytes(),
            &[0x12, 0x34, 0x3F, 0x80, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_narrow_counts() {
        assert_eq!(narrow_u8("count", 255), Ok(255));
        assert!(matches!(
            narrow_u8("count", 256),
            Err(EncodeError::InvalidField { field: "count", .. })
        ));
        assert_eq!(narrow_u16("length", 65_535), Ok(65_535));
        assert!(narrow_u16("length", 65_536).is_err());
    }

    #[test]
    fn test_padding_for() {
        assert_eq!(padding_for(0, 4), 0);
        assert_eq!(padding_for(1, 4), 3);
        assert_eq!(padding_for(4, 4), 0);
        assert_eq!(padding_for(9, 8), 7);
    }
}
