use crate::body::PduBody;
use crate::codec::{narrow_u8, DecodeError, EncodeError, Reader, Writer};
use crate::header::{PduType, HEADER_SIZE};
use crate::records::{decode_records, EntityId, EventId, Vec3};

/// Electrical and scanning characteristics of one beam (40 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FundamentalParameters {
    pub frequency: f32,
    pub frequency_range: f32,
    pub effective_radiated_power: f32,
    pub pulse_repetition_frequency: f32,
    pub pulse_width: f32,
    pub azimuth_center: f32,
    pub azimuth_sweep: f32,
    pub elevation_center: f32,
    pub elevation_sweep: f32,
    pub sweep_sync: f32,
}

impl FundamentalParameters {
    fn decode(reader: &mut Reader) -> Result<Self, DecodeError> {
        Ok(Self {
            frequency: reader.f32()?,
            frequency_range: reader.f32()?,
            effective_radiated_power: reader.f32()?,
            pulse_repetition_frequency: reader.f32()?,
            pulse_width: reader.f32()?,
            azimuth_center: reader.f32()?,
            azimuth_sweep: reader.f32()?,
            elevation_center: reader.f32()?,
            elevation_sweep: reader.f32()?,
            sweep_sync: reader.f32()?,
        })
    }

    fn encode(&self, writer: &mut Writer) {
        writer.put_f32(self.frequency);
        writer.put_f32(self.frequency_range);
        writer.put_f32(self.effective_radiated_power);
        writer.put_f32(self.pulse_repetition_frequency);
        writer.put_f32(self.pulse_width);
        writer.put_f32(self.azimuth_center);
        writer.put_f32(self.azimuth_sweep);
        writer.put_f32(self.elevation_center);
        writer.put_f32(self.elevation_sweep);
        writer.put_f32(self.sweep_sync);
    }
}

/// An entity a beam is tracking or jamming (8 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackJamTarget {
    pub entity: EntityId,
    pub emitter_id: u8,
    pub beam_id: u8,
}

impl TrackJamTarget {
    const SIZE: usize = 8;

    fn decode(reader: &mut Reader) -> Result<Self, DecodeError> {
        Ok(Self {
            entity: EntityId::decode(reader)?,
            emitter_id: reader.u8()?,
            beam_id: reader.u8()?,
        })
    }

    fn encode(&self, writer: &mut Writer) {
        self.entity.encode(writer);
        writer.put_u8(self.emitter_id);
        writer.put_u8(self.beam_id);
    }
}

/// Emitter beam record: 52 bytes plus 8 per track/jam target
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EmitterBeam {
    pub beam_id: u8,
    pub parameter_index: u16,
    pub parameters: FundamentalParameters,
    pub beam_function: u8,
    pub high_density_track_jam: u8,
    pub jamming_mode_sequence: u32,
    pub targets: Vec<TrackJamTarget>,
}

impl EmitterBeam {
    const FIXED_SIZE: usize = 52;

    fn encoded_len(&self) -> usize {
        Self::FIXED_SIZE + self.targets.len() * TrackJamTarget::SIZE
    }

    fn decode(reader: &mut Reader) -> Result<Self, DecodeError> {
        reader.require(Self::FIXED_SIZE)?;
        let _length_words = reader.u8()?;
        let beam_id = reader.u8()?;
        let parameter_index = reader.u16()?;
        let parameters = FundamentalParameters::decode(reader)?;
        let beam_function = reader.u8()?;
        let target_count = reader.u8()? as usize;
        let high_density_track_jam = reader.u8()?;
        reader.skip(1)?;
        let jamming_mode_sequence = reader.u32()?;
        let targets = decode_records(
            reader,
            target_count,
            TrackJamTarget::SIZE,
            TrackJamTarget::decode,
        )?;
        Ok(Self {
            beam_id,
            parameter_index,
            parameters,
            beam_function,
            high_density_track_jam,
            jamming_mode_sequence,
            targets,
        })
    }

    fn encode(&self, writer: &mut Writer) -> Result<(), EncodeError> {
        writer.put_u8(narrow_u8("beam_length", self.encoded_len() / 4)?);
        writer.put_u8(self.beam_id);
        writer.put_u16(self.parameter_index);
        self.parameters.encode(writer);
        writer.put_u8(self.beam_function);
        writer.put_u8(narrow_u8("target_count", self.targets.len())?);
        writer.put_u8(self.high_density_track_jam);
        writer.put_u8(0);
        writer.put_u32(self.jamming_mode_sequence);
        for target in &self.targets {
            target.encode(writer);
        }
        Ok(())
    }
}

/// One emitter system on the emitting entity: 20 bytes plus its beams
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EmitterSystem {
    /// DIS emitter name enumeration
    pub emitter_name: u16,
    pub function: u8,
    /// Distinguishes multiple emitters on the same entity
    pub emitter_id: u8,
    /// Emitter location relative to the entity's body origin
    pub location: Vec3,
    pub beams: Vec<EmitterBeam>,
}

impl EmitterSystem {
    const FIXED_SIZE: usize = 20;

    fn encoded_len(&self) -> usize {
        Self::FIXED_SIZE + self.beams.iter().map(EmitterBeam::encoded_len).sum::<usize>()
    }

    fn decode(reader: &mut Reader) -> Result<Self, DecodeError> {
        reader.require(Self::FIXED_SIZE)?;
        let _length_words = reader.u8()?;
        let beam_count = reader.u8()? as usize;
        reader.skip(2)?;
        let emitter_name = reader.u16()?;
        let function = reader.u8()?;
        let emitter_id = reader.u8()?;
        let location = Vec3::decode_f32(reader)?;
        let beams = decode_records(reader, beam_count, EmitterBeam::FIXED_SIZE, EmitterBeam::decode)?;
        Ok(Self {
            emitter_name,
            function,
            emitter_id,
            location,
            beams,
        })
    }

    fn encode(&self, writer: &mut Writer) -> Result<(), EncodeError> {
        writer.put_u8(narrow_u8("system_length", self.encoded_len() / 4)?);
        writer.put_u8(narrow_u8("beam_count", self.beams.len())?);
        writer.put_u16(0);
        writer.put_u16(self.emitter_name);
        writer.put_u8(self.function);
        writer.put_u8(self.emitter_id);
        self.location.encode_f32(writer);
        for beam in &self.beams {
            beam.encode(writer)?;
        }
        Ok(())
    }
}

/// Electromagnetic Emission PDU: 28 bytes plus emitter systems
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElectromagneticEmissionPdu {
    pub emitting_entity: EntityId,
    pub event_id: EventId,
    /// 0 = heartbeat, 1 = changed data
    pub state_update: u8,
    pub systems: Vec<EmitterSystem>,
}

impl ElectromagneticEmissionPdu {
    pub const FIXED_SIZE: usize = 28;
    pub const STATE_HEARTBEAT: u8 = 0;
    pub const STATE_CHANGED: u8 = 1;
}

impl PduBody for ElectromagneticEmissionPdu {
    const PDU_TYPE: PduType = PduType::ElectromagneticEmission;

    fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(body);
        reader.require(Self::FIXED_SIZE - HEADER_SIZE)?;
        let emitting_entity = EntityId::decode(&mut reader)?;
        let event_id = EventId::decode(&mut reader)?;
        let state_update = reader.u8()?;
        let system_count = reader.u8()? as usize;
        reader.skip(2)?;
        let systems = decode_records(
            &mut reader,
            system_count,
            EmitterSystem::FIXED_SIZE,
            EmitterSystem::decode,
        )?;

        if reader.remaining() != 0 {
            return Err(DecodeError::LengthMismatch {
                declared: body.len() + HEADER_SIZE,
                expected: reader.position() + HEADER_SIZE,
            });
        }
        Ok(Self {
            emitting_entity,
            event_id,
            state_update,
            systems,
        })
    }

    fn encode_body(&self, writer: &mut Writer) -> Result<(), EncodeError> {
        self.emitting_entity.encode(writer);
        self.event_id.encode(writer);
        writer.put_u8(self.state_update);
        writer.put_u8(narrow_u8("system_count", self.systems.len())?);
        writer.put_u16(0);
        for system in &self.systems {
            system.encode(writer)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{decode_pdu, encode_pdu};
    use crate::header::{ProtocolVersion, Timestamp};

    fn radar_system() -> EmitterSystem {
        EmitterSystem {
            emitter_name: 2530,
            function: 2,
            emitter_id: 1,
            location: Vec3::new(5.0, 0.0, -1.0),
            beams: vec![EmitterBeam {
                beam_id: 1,
                parameter_index: 7,
                parameters: FundamentalParameters {
                    frequency: 9.5e9,
                    frequency_range: 1.0e8,
                    effective_radiated_power: 70.0,
                    pulse_repetition_frequency: 1000.0,
                    pulse_width: 1.5,
                    azimuth_center: 0.0,
                    azimuth_sweep: 1.0,
                    elevation_center: 0.1,
                    elevation_sweep: 0.2,
                    sweep_sync: 0.0,
                },
                beam_function: 3,
                targets: vec![TrackJamTarget {
                    entity: EntityId::new(3, 4, 5),
                    emitter_id: 0,
                    beam_id: 0,
                }],
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_emission_roundtrip() {
        let pdu = ElectromagneticEmissionPdu {
            emitting_entity: EntityId::new(1, 2, 3),
            event_id: EventId {
                site: 1,
                application: 2,
                event_number: 9,
            },
            state_update: ElectromagneticEmissionPdu::STATE_CHANGED,
            systems: vec![radar_system()],
        };
        let bytes = encode_pdu(ProtocolVersion::Ieee1278_1A, 1, Timestamp(0), &pdu).unwrap();
        assert_eq!(bytes.len(), 28 + 20 + 52 + 8);
        // System length in 32-bit words
        assert_eq!(bytes[28], (20 + 52 + 8) / 4);

        let (_, decoded) = decode_pdu::<ElectromagneticEmissionPdu>(&bytes).unwrap();
        assert_eq!(decoded, pdu);
    }

    fn system_with_targets(count: usize) -> EmitterSystem {
        let mut system = radar_system();
        system.beams[0].targets = vec![TrackJamTarget::default(); count];
        system
    }

    #[test]
    fn test_emission_length_words_at_limit() {
        // 20 + 52 + 8 * 118 = 1016 bytes, 254 words
        let pdu = ElectromagneticEmissionPdu {
            systems: vec![system_with_targets(118)],
            ..Default::default()
        };
        let bytes = encode_pdu(ProtocolVersion::Ieee1278_1A, 1, Timestamp(0), &pdu).unwrap();
        assert_eq!(bytes[28], 254);
        assert_eq!(bytes[48] as usize, (52 + 8 * 118) / 4);
        assert_eq!(bytes[48 + 45], 118);

        let (_, decoded) = decode_pdu::<ElectromagneticEmissionPdu>(&bytes).unwrap();
        assert_eq!(decoded.systems[0].beams[0].targets.len(), 118);
    }

    #[test]
    fn test_emission_length_words_overflow() {
        for count in [119, 150] {
            let pdu = ElectromagneticEmissionPdu {
                systems: vec![system_with_targets(count)],
                ..Default::default()
            };
            assert!(matches!(
                encode_pdu(ProtocolVersion::Ieee1278_1A, 1, Timestamp(0), &pdu),
                Err(EncodeError::InvalidField {
                    field: "system_length",
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_emission_system_count_too_large() {
        let pdu = ElectromagneticEmissionPdu {
            systems: vec![radar_system()],
            ..Default::default()
        };
        let mut bytes = encode_pdu(ProtocolVersion::Ieee1278_1A, 1, Timestamp(0), &pdu).unwrap();
        bytes[HEADER_SIZE + 13] = 4;
        assert!(matches!(
            ElectromagneticEmissionPdu::decode(&bytes[HEADER_SIZE..]),
            Err(DecodeError::TooShort { .. })
        ));
    }

    #[test]
    fn test_emission_trailing_bytes() {
        let pdu = ElectromagneticEmissionPdu::default();
        let bytes = encode_pdu(ProtocolVersion::Ieee1278_1A, 1, Timestamp(0), &pdu).unwrap();
        let mut body = bytes[HEADER_SIZE..].to_vec();
        body.extend_from_slice(&[0; 4]);
        assert!(matches!(
            ElectromagneticEmissionPdu::decode(&body),
            Err(DecodeError::LengthMismatch { .. })
        ));
    }
}
