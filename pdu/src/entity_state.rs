use crate::body::PduBody;
use crate::codec::{narrow_u8, DecodeError, EncodeError, Reader, Writer};
use crate::enums::{appearance, ForceId};
use crate::header::{PduType, HEADER_SIZE};
use crate::records::{
    decode_records, ArticulationParameter, DeadReckoningParameters, EntityId, EntityTypeCode,
    EulerAngles, Marking, Vec3,
};

/// Entity State PDU: 144 bytes plus 16 per articulation parameter
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntityStatePdu {
    pub entity_id: EntityId,
    pub force_id: ForceId,
    pub entity_type: EntityTypeCode,
    pub alternative_type: EntityTypeCode,
    pub linear_velocity: Vec3,
    /// Geocentric world coordinates in meters
    pub location: Vec3,
    pub orientation: EulerAngles,
    pub appearance: u32,
    pub dead_reckoning: DeadReckoningParameters,
    pub marking: Marking,
    pub capabilities: u32,
    pub articulation: Vec<ArticulationParameter>,
}

impl EntityStatePdu {
    /// Fixed size of the PDU without articulation parameters
    pub const FIXED_SIZE: usize = 144;

    pub fn is_deactivated(&self) -> bool {
        self.appearance & appearance::DEACTIVATED != 0
    }
}

impl PduBody for EntityStatePdu {
    const PDU_TYPE: PduType = PduType::EntityState;

    fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(body);
        reader.require(Self::FIXED_SIZE - HEADER_SIZE)?;

        let entity_id = EntityId::decode(&mut reader)?;
        let force_id = ForceId::from_u8(reader.u8()?);
        let articulation_count = reader.u8()? as usize;
        let entity_type = EntityTypeCode::decode(&mut reader)?;
        let alternative_type = EntityTypeCode::decode(&mut reader)?;
        let linear_velocity = Vec3::decode_f32(&mut reader)?;
        let location = Vec3::decode_f64(&mut reader)?;
        let orientation = EulerAngles::decode(&mut reader)?;
        let appearance = reader.u32()?;
        let dead_reckoning = DeadReckoningParameters::decode(&mut reader)?;
        let marking = Marking::decode(&mut reader)?;
        let capabilities = reader.u32()?;

        let expected = Self::FIXED_SIZE + articulation_count * ArticulationParameter::SIZE;
        if body.len() + HEADER_SIZE != expected {
            return Err(DecodeError::LengthMismatch {
                declared: body.len() + HEADER_SIZE,
                expected,
            });
        }
        let articulation = decode_records(
            &mut reader,
            articulation_count,
            ArticulationParameter::SIZE,
            ArticulationParameter::decode,
        )?;

        Ok(Self {
            entity_id,
            force_id,
            entity_type,
            alternative_type,
            linear_velocity,
            location,
            orientation,
            appearance,
            dead_reckoning,
            marking,
            capabilities,
            articulation,
        })
    }

    fn encode_body(&self, writer: &mut Writer) -> Result<(), EncodeError> {
        self.entity_id.encode(writer);
        writer.put_u8(self.force_id.as_u8());
        writer.put_u8(narrow_u8("articulation_count", self.articulation.len())?);
        self.entity_type.encode(writer);
        self.alternative_type.encode(writer);
        self.linear_velocity.encode_f32(writer);
        self.location.encode_f64(writer);
        self.orientation.encode(writer);
        writer.put_u32(self.appearance);
        self.dead_reckoning.encode(writer);
        self.marking.encode(writer);
        writer.put_u32(self.capabilities);
        for parameter in &self.articulation {
            parameter.encode(writer);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{decode_pdu, encode_pdu};
    use crate::header::{ProtocolVersion, Timestamp};
    use crate::records::DeadReckoningAlgorithm;

    fn sample() -> EntityStatePdu {
        EntityStatePdu {
            entity_id: EntityId::new(10, 143, 7),
            force_id: ForceId::Friendly,
            entity_type: EntityTypeCode::new(1, 2, 225, 1, 3, 0, 0),
            location: Vec3::new(1_000_000.5, -4_500_000.25, 4_000_000.0),
            linear_velocity: Vec3::new(100.0, 0.5, -2.0),
            orientation: EulerAngles::new(0.5, 0.25, 0.0),
            dead_reckoning: DeadReckoningParameters {
                algorithm: DeadReckoningAlgorithm::Rvw,
                ..Default::default()
            },
            marking: Marking::ascii("EAGLE1"),
            ..Default::default()
        }
    }

    #[test]
    fn test_entity_state_size() {
        let bytes = encode_pdu(ProtocolVersion::Ieee1278_1A, 1, Timestamp(0), &sample()).unwrap();
        assert_eq!(bytes.len(), EntityStatePdu::FIXED_SIZE);
        assert_eq!(u16::from_be_bytes([bytes[8], bytes[9]]), 144);
    }

    #[test]
    fn test_entity_state_roundtrip_with_articulation() {
        let mut pdu = sample();
        pdu.articulation.push(ArticulationParameter {
            type_designator: 0,
            change_indicator: 1,
            attachment_id: 0,
            parameter_type: 4096 + 11,
            value: 0x3FF0_0000_0000_0000,
        });
        let bytes = encode_pdu(ProtocolVersion::Ieee1278_1A, 1, Timestamp(0), &pdu).unwrap();
        assert_eq!(bytes.len(), 160);

        let (header, decoded) = decode_pdu::<EntityStatePdu>(&bytes).unwrap();
        assert_eq!(header.pdu_type, PduType::EntityState);
        assert_eq!(decoded, pdu);
    }

    #[test]
    fn test_entity_state_articulation_limits() {
        // (1536 - 144) / 16 records fit in the largest PDU
        let mut pdu = sample();
        pdu.articulation = vec![ArticulationParameter::default(); 87];
        let bytes = encode_pdu(ProtocolVersion::Ieee1278_1A, 1, Timestamp(0), &pdu).unwrap();
        assert_eq!(bytes[HEADER_SIZE + 7], 87);
        assert_eq!(decode_pdu::<EntityStatePdu>(&bytes).unwrap().1, pdu);

        pdu.articulation.push(ArticulationParameter::default());
        assert!(matches!(
            encode_pdu(ProtocolVersion::Ieee1278_1A, 1, Timestamp(0), &pdu),
            Err(EncodeError::InvalidField { field: "length", .. })
        ));

        // A count past the one-byte field never gets clamped
        pdu.articulation = vec![ArticulationParameter::default(); 256];
        assert!(matches!(
            encode_pdu(ProtocolVersion::Ieee1278_1A, 1, Timestamp(0), &pdu),
            Err(EncodeError::InvalidField {
                field: "articulation_count",
                ..
            })
        ));
    }

    #[test]
    fn test_entity_state_truncated() {
        let bytes = encode_pdu(ProtocolVersion::Ieee1278_1A, 1, Timestamp(0), &sample()).unwrap();
        let body = &bytes[HEADER_SIZE..100];
        assert!(matches!(
            EntityStatePdu::decode(body),
            Err(DecodeError::TooShort { .. })
        ));
    }

    #[test]
    fn test_entity_state_articulation_count_mismatch() {
        let mut bytes =
            encode_pdu(ProtocolVersion::Ieee1278_1A, 1, Timestamp(0), &sample()).unwrap();
        // Claim two articulation parameters without carrying them
        bytes[HEADER_SIZE + 7] = 2;
        assert_eq!(
            EntityStatePdu::decode(&bytes[HEADER_SIZE..]),
            Err(DecodeError::LengthMismatch {
                declared: 144,
                expected: 176
            })
        );
    }

    #[test]
    fn test_deactivated_flag() {
        let mut pdu = sample();
        assert!(!pdu.is_deactivated());
        pdu.appearance |= appearance::DEACTIVATED;
        assert!(pdu.is_deactivated());
    }
}
