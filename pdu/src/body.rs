//! Whole-PDU encode/decode on top of the header codec.

use crate::codec::{DecodeError, EncodeError, Writer};
use crate::header::{
    decode_header, encode_header, PduHeader, PduType, ProtocolVersion, Timestamp, HEADER_SIZE,
    MAX_PDU_SIZE,
};

/// A PDU body with a fixed PDU type.
pub trait PduBody: Sized {
    const PDU_TYPE: PduType;

    /// Decodes the body bytes that follow the header.
    fn decode(body: &[u8]) -> Result<Self, DecodeError>;

    /// Appends the body bytes; fails when a count or length does not fit
    /// its wire field.
    fn encode_body(&self, writer: &mut Writer) -> Result<(), EncodeError>;
}

/// Encodes `body` behind a header whose length field is the exact encoded size.
pub fn encode_pdu<B: PduBody>(
    version: ProtocolVersion,
    exercise_id: u8,
    timestamp: Timestamp,
    body: &B,
) -> Result<Vec<u8>, EncodeError> {
    let mut writer = Writer::with_capacity(256);
    body.encode_body(&mut writer)?;

    let length = HEADER_SIZE + writer.len();
    if length > MAX_PDU_SIZE {
        return Err(EncodeError::InvalidField {
            field: "length",
            reason: "PDU exceeds the maximum PDU size",
        });
    }

    let header = PduHeader::new(version, exercise_id, B::PDU_TYPE, timestamp, length as u16);
    let mut bytes = encode_header(&header)?.to_vec();
    bytes.extend_from_slice(writer.as_bytes());
    Ok(bytes)
}

/// Decodes a complete PDU of type `B`.
pub fn decode_pdu<B: PduBody>(bytes: &[u8]) -> Result<(PduHeader, B), DecodeError> {
    let (header, body) = decode_header(bytes)?;
    if header.pdu_type != B::PDU_TYPE {
        return Err(DecodeError::WrongPduType {
            expected: B::PDU_TYPE.as_u8(),
            found: header.pdu_type.as_u8(),
        });
    }
    Ok((header, B::decode(body)?))
}

/// Fails unless the body is exactly `expected` bytes long.
pub(crate) fn expect_body_len(body: &[u8], expected: usize) -> Result<(), DecodeError> {
    if body.len() < expected {
        return Err(DecodeError::TooShort {
            needed: expected + HEADER_SIZE,
            available: body.len() + HEADER_SIZE,
        });
    }
    if body.len() != expected {
        return Err(DecodeError::LengthMismatch {
            declared: body.len() + HEADER_SIZE,
            expected: expected + HEADER_SIZE,
        });
    }
    Ok(())
}

/// Splits a datagram into the PDUs it carries back to back.
///
/// Iteration stops at the first PDU whose header fails to decode; that
/// error is yielded as the final item.
pub fn split_pdus(datagram: &[u8]) -> PduIter<'_> {
    PduIter {
        remaining: datagram,
        failed: false,
    }
}

pub struct PduIter<'a> {
    remaining: &'a [u8],
    failed: bool,
}

impl<'a> Iterator for PduIter<'a> {
    type Item = Result<&'a [u8], DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining.is_empty() {
            return None;
        }
        match decode_header(self.remaining) {
            Ok((header, _)) => {
                let len = header.length as usize;
                let (pdu, rest) = self.remaining.split_at(len);
                self.remaining = rest;
                Some(Ok(pdu))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
