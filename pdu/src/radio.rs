use crate::body::PduBody;
use crate::codec::{
    narrow_u16, narrow_u8, padding_for, DecodeError, EncodeError, Reader, Writer,
};
use crate::header::{PduType, HEADER_SIZE};
use crate::records::{EntityId, Vec3};

/// Signal PDU: 32 bytes plus the signal data padded to 32 bits
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignalPdu {
    pub entity_id: EntityId,
    pub radio_id: u16,
    pub encoding_scheme: u16,
    pub tdl_type: u16,
    pub sample_rate: u32,
    pub samples: u16,
    pub data: Vec<u8>,
    /// Low-order bits of the last data byte that carry no signal [0 .. 7]
    pub unused_bits: u8,
}

impl SignalPdu {
    pub const FIXED_SIZE: usize = 32;

    /// Signal length in bits as carried by the data length field.
    pub fn data_bits(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.unused_bits as usize)
    }
}

impl PduBody for SignalPdu {
    const PDU_TYPE: PduType = PduType::Signal;

    fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(body);
        reader.require(Self::FIXED_SIZE - HEADER_SIZE)?;
        let entity_id = EntityId::decode(&mut reader)?;
        let radio_id = reader.u16()?;
        let encoding_scheme = reader.u16()?;
        let tdl_type = reader.u16()?;
        let sample_rate = reader.u32()?;
        let data_bits = reader.u16()? as usize;
        let samples = reader.u16()?;

        let data_len = data_bits.div_ceil(8);
        let expected = Self::FIXED_SIZE + data_len + padding_for(data_len, 4);
        if body.len() + HEADER_SIZE != expected {
            return Err(DecodeError::LengthMismatch {
                declared: body.len() + HEADER_SIZE,
                expected,
            });
        }
        let data = reader.take(data_len)?.to_vec();
        let unused_bits = (data_len * 8 - data_bits) as u8;

        Ok(Self {
            entity_id,
            radio_id,
            encoding_scheme,
            tdl_type,
            sample_rate,
            samples,
            data,
            unused_bits,
        })
    }

    fn encode_body(&self, writer: &mut Writer) -> Result<(), EncodeError> {
        self.entity_id.encode(writer);
        writer.put_u16(self.radio_id);
        writer.put_u16(self.encoding_scheme);
        writer.put_u16(self.tdl_type);
        writer.put_u32(self.sample_rate);
        if self.unused_bits > 7 || (self.unused_bits > 0 && self.data.is_empty()) {
            return Err(EncodeError::InvalidField {
                field: "unused_bits",
                reason: "must leave at least one bit of the last data byte",
            });
        }
        writer.put_u16(narrow_u16("data_length", self.data_bits())?);
        writer.put_u16(self.samples);
        writer.put_bytes(&self.data);
        writer.put_zeros(padding_for(self.data.len(), 4));
        Ok(())
    }
}

/// Radio type record (8 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RadioType {
    pub kind: u8,
    pub domain: u8,
    pub country: u16,
    pub category: u8,
    pub nomenclature_version: u8,
    pub nomenclature: u16,
}

/// Modulation type record (8 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModulationType {
    pub spread_spectrum: u16,
    pub major: u16,
    pub detail: u16,
    pub system: u16,
}

/// Transmitter PDU: 104 bytes plus modulation parameters and antenna pattern
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransmitterPdu {
    pub entity_id: EntityId,
    pub radio_id: u16,
    pub radio_type: RadioType,
    /// 0 = off, 1 = on but not transmitting, 2 = on and transmitting
    pub transmit_state: u8,
    pub input_source: u8,
    pub antenna_location: Vec3,
    pub relative_antenna_location: Vec3,
    pub antenna_pattern_type: u16,
    /// Center frequency in hertz
    pub frequency: u64,
    pub bandwidth: f32,
    /// Transmit power in dBmW
    pub power: f32,
    pub modulation: ModulationType,
    pub crypto_system: u16,
    pub crypto_key_id: u16,
    pub modulation_parameters: Vec<u8>,
    pub antenna_pattern: Vec<u8>,
}

impl TransmitterPdu {
    pub const FIXED_SIZE: usize = 104;

    pub fn is_transmitting(&self) -> bool {
        self.transmit_state == 2
    }
}

impl PduBody for TransmitterPdu {
    const PDU_TYPE: PduType = PduType::Transmitter;

    fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(body);
        reader.require(Self::FIXED_SIZE - HEADER_SIZE)?;
        let entity_id = EntityId::decode(&mut reader)?;
        let radio_id = reader.u16()?;
        let radio_type = RadioType {
            kind: reader.u8()?,
            domain: reader.u8()?,
            country: reader.u16()?,
            category: reader.u8()?,
            nomenclature_version: reader.u8()?,
            nomenclature: reader.u16()?,
        };
        let transmit_state = reader.u8()?;
        let input_source = reader.u8()?;
        reader.skip(2)?;
        let antenna_location = Vec3::decode_f64(&mut reader)?;
        let relative_antenna_location = Vec3::decode_f32(&mut reader)?;
        let antenna_pattern_type = reader.u16()?;
        let antenna_pattern_len = reader.u16()? as usize;
        let frequency = reader.u64()?;
        let bandwidth = reader.f32()?;
        let power = reader.f32()?;
        let modulation = ModulationType {
            spread_spectrum: reader.u16()?,
            major: reader.u16()?,
            detail: reader.u16()?,
            system: reader.u16()?,
        };
        let crypto_system = reader.u16()?;
        let crypto_key_id = reader.u16()?;
        let modulation_len = reader.u8()? as usize;
        reader.skip(3)?;

        let expected = Self::FIXED_SIZE + modulation_len + antenna_pattern_len;
        if body.len() + HEADER_SIZE != expected {
            return Err(DecodeError::LengthMismatch {
                declared: body.len() + HEADER_SIZE,
                expected,
            });
        }
        let modulation_parameters = reader.take(modulation_len)?.to_vec();
        let antenna_pattern = reader.take(antenna_pattern_len)?.to_vec();

        Ok(Self {
            entity_id,
            radio_id,
            radio_type,
            transmit_state,
            input_source,
            antenna_location,
            relative_antenna_location,
            antenna_pattern_type,
            frequency,
            bandwidth,
            power,
            modulation,
            crypto_system,
            crypto_key_id,
            modulation_parameters,
            antenna_pattern,
        })
    }

    fn encode_body(&self, writer: &mut Writer) -> Result<(), EncodeError> {
        self.entity_id.encode(writer);
        writer.put_u16(self.radio_id);
        writer.put_u8(self.radio_type.kind);
        writer.put_u8(self.radio_type.domain);
        writer.put_u16(self.radio_type.country);
        writer.put_u8(self.radio_type.category);
        writer.put_u8(self.radio_type.nomenclature_version);
        writer.put_u16(self.radio_type.nomenclature);
        writer.put_u8(self.transmit_state);
        writer.put_u8(self.input_source);
        writer.put_u16(0);
        self.antenna_location.encode_f64(writer);
        self.relative_antenna_location.encode_f32(writer);
        writer.put_u16(self.antenna_pattern_type);
        writer.put_u16(narrow_u16("antenna_pattern_length", self.antenna_pattern.len())?);
        writer.put_u64(self.frequency);
        writer.put_f32(self.bandwidth);
        writer.put_f32(self.power);
        writer.put_u16(self.modulation.spread_spectrum);
        writer.put_u16(self.modulation.major);
        writer.put_u16(self.modulation.detail);
        writer.put_u16(self.modulation.system);
        writer.put_u16(self.crypto_system);
        writer.put_u16(self.crypto_key_id);
        writer.put_u8(narrow_u8("modulation_parameter_count", self.modulation_parameters.len())?);
        writer.put_zeros(3);
        writer.put_bytes(&self.modulation_parameters);
        writer.put_bytes(&self.antenna_pattern);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{decode_pdu, encode_pdu};
    use crate::header::{ProtocolVersion, Timestamp};

    #[test]
    fn test_signal_roundtrip_with_padding() {
        let pdu = SignalPdu {
            entity_id: EntityId::new(1, 2, 3),
            radio_id: 1,
            encoding_scheme: 4,
            sample_rate: 8000,
            samples: 5,
            data: vec![1, 2, 3, 4, 5],
            ..Default::default()
        };
        let bytes = encode_pdu(ProtocolVersion::Ieee1278_1A, 1, Timestamp(0), &pdu).unwrap();
        assert_eq!(bytes.len(), 32 + 8);
        let (_, decoded) = decode_pdu::<SignalPdu>(&bytes).unwrap();
        assert_eq!(decoded, pdu);
    }

    #[test]
    fn test_signal_keeps_partial_byte_length() {
        let pdu = SignalPdu {
            entity_id: EntityId::new(1, 2, 3),
            data: vec![0xAB, 0xC0],
            unused_bits: 4,
            ..Default::default()
        };
        let bytes = encode_pdu(ProtocolVersion::Ieee1278_1A, 1, Timestamp(0), &pdu).unwrap();
        // Data length field counts bits
        assert_eq!(u16::from_be_bytes([bytes[28], bytes[29]]), 12);

        let (_, decoded) = decode_pdu::<SignalPdu>(&bytes).unwrap();
        assert_eq!(decoded.data_bits(), 12);
        assert_eq!(decoded, pdu);
    }

    #[test]
    fn test_signal_rejects_bad_unused_bits() {
        let pdu = SignalPdu {
            data: vec![0xFF],
            unused_bits: 8,
            ..Default::default()
        };
        assert!(matches!(
            encode_pdu(ProtocolVersion::Ieee1278_1A, 1, Timestamp(0), &pdu),
            Err(EncodeError::InvalidField { field: "unused_bits", .. })
        ));
    }

    #[test]
    fn test_transmitter_modulation_count_limit() {
        let mut pdu = TransmitterPdu {
            modulation_parameters: vec![0; 255],
            ..Default::default()
        };
        let bytes = encode_pdu(ProtocolVersion::Ieee1278_1A, 1, Timestamp(0), &pdu).unwrap();
        assert_eq!(bytes.len(), TransmitterPdu::FIXED_SIZE + 255);
        let (_, decoded) = decode_pdu::<TransmitterPdu>(&bytes).unwrap();
        assert_eq!(decoded.modulation_parameters.len(), 255);

        pdu.modulation_parameters.push(0);
        assert!(matches!(
            encode_pdu(ProtocolVersion::Ieee1278_1A, 1, Timestamp(0), &pdu),
            Err(EncodeError::InvalidField {
                field: "modulation_parameter_count",
                ..
            })
        ));
    }

    #[test]
    fn test_transmitter_roundtrip() {
        let pdu = TransmitterPdu {
            entity_id: EntityId::new(1, 2, 3),
            radio_id: 2,
            transmit_state: 2,
            antenna_location: Vec3::new(1.0, 2.0, 3.0),
            frequency: 243_000_000,
            bandwidth: 25_000.0,
            power: 40.0,
            modulation_parameters: vec![9, 9, 9, 9],
            ..Default::default()
        };
        let bytes = encode_pdu(ProtocolVersion::Ieee1278_1A, 1, Timestamp(0), &pdu).unwrap();
        assert_eq!(bytes.len(), TransmitterPdu::FIXED_SIZE + 4);
        let (_, decoded) = decode_pdu::<TransmitterPdu>(&bytes).unwrap();
        assert_eq!(decoded, pdu);
        assert!(decoded.is_transmitting());
    }

    #[test]
    fn test_transmitter_truncated() {
        let bytes = encode_pdu(
            ProtocolVersion::Ieee1278_1A,
            1,
            Timestamp(0),
            &TransmitterPdu::default(),
        )
        .unwrap();
        assert!(TransmitterPdu::decode(&bytes[HEADER_SIZE..60]).is_err());
    }
}
