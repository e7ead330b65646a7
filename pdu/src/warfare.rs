use crate::body::{expect_body_len, PduBody};
use crate::codec::{narrow_u8, DecodeError, EncodeError, Reader, Writer};
use crate::header::{PduType, HEADER_SIZE};
use crate::records::{
    decode_records, ArticulationParameter, BurstDescriptor, EntityId, EventId, Vec3,
};

/// Fire PDU (96 bytes)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FirePdu {
    pub firing_entity: EntityId,
    pub target_entity: EntityId,
    /// The munition's own entity id when it is simulated as an entity
    pub munition_entity: EntityId,
    pub event_id: EventId,
    pub fire_mission_index: u32,
    pub location: Vec3,
    pub burst: BurstDescriptor,
    pub velocity: Vec3,
    pub range: f32,
}

impl FirePdu {
    pub const SIZE: usize = 96;
}

impl PduBody for FirePdu {
    const PDU_TYPE: PduType = PduType::Fire;

    fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        expect_body_len(body, Self::SIZE - HEADER_SIZE)?;
        let mut reader = Reader::new(body);
        Ok(Self {
            firing_entity: EntityId::decode(&mut reader)?,
            target_entity: EntityId::decode(&mut reader)?,
            munition_entity: EntityId::decode(&mut reader)?,
            event_id: EventId::decode(&mut reader)?,
            fire_mission_index: reader.u32()?,
            location: Vec3::decode_f64(&mut reader)?,
            burst: BurstDescriptor::decode(&mut reader)?,
            velocity: Vec3::decode_f32(&mut reader)?,
            range: reader.f32()?,
        })
    }

    fn encode_body(&self, writer: &mut Writer) -> Result<(), EncodeError> {
        self.firing_entity.encode(writer);
        self.target_entity.encode(writer);
        self.munition_entity.encode(writer);
        self.event_id.encode(writer);
        writer.put_u32(self.fire_mission_index);
        self.location.encode_f64(writer);
        self.burst.encode(writer);
        self.velocity.encode_f32(writer);
        writer.put_f32(self.range);
        Ok(())
    }
}

/// Detonation PDU: 104 bytes plus 16 per articulation parameter
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetonationPdu {
    pub firing_entity: EntityId,
    pub target_entity: EntityId,
    pub munition_entity: EntityId,
    pub event_id: EventId,
    pub velocity: Vec3,
    pub location: Vec3,
    pub burst: BurstDescriptor,
    /// Impact point relative to the target's body origin
    pub location_in_entity: Vec3,
    pub result: u8,
    pub articulation: Vec<ArticulationParameter>,
}

impl DetonationPdu {
    pub const FIXED_SIZE: usize = 104;
}

impl PduBody for DetonationPdu {
    const PDU_TYPE: PduType = PduType::Detonation;

    fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(body);
        reader.require(Self::FIXED_SIZE - HEADER_SIZE)?;

        let firing_entity = EntityId::decode(&mut reader)?;
        let target_entity = EntityId::decode(&mut reader)?;
        let munition_entity = EntityId::decode(&mut reader)?;
        let event_id = EventId::decode(&mut reader)?;
        let velocity = Vec3::decode_f32(&mut reader)?;
        let location = Vec3::decode_f64(&mut reader)?;
        let burst = BurstDescriptor::decode(&mut reader)?;
        let location_in_entity = Vec3::decode_f32(&mut reader)?;
        let result = reader.u8()?;
        let articulation_count = reader.u8()? as usize;
        reader.skip(2)?;

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
            firing_entity,
            target_entity,
            munition_entity,
            event_id,
            velocity,
            location,
            burst,
            location_in_entity,
            result,
            articulation,
        })
    }

    fn encode_body(&self, writer: &mut Writer) -> Result<(), EncodeError> {
        self.firing_entity.encode(writer);
        self.target_entity.encode(writer);
        self.munition_entity.encode(writer);
        self.event_id.encode(writer);
        self.velocity.encode_f32(writer);
        self.location.encode_f64(writer);
        self.burst.encode(writer);
        self.location_in_entity.encode_f32(writer);
        writer.put_u8(self.result);
        writer.put_u8(narrow_u8("articulation_count", self.articulation.len())?);
        writer.put_zeros(2);
        for parameter in &self.articulation {
            parameter.encode(writer);
        }
        Ok(())
    }
}
