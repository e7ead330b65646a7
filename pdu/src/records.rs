//! Records shared between PDU bodies.

use crate::codec::{padding_for, DecodeError, Reader, Writer};
use serde::{Deserialize, Serialize};

/// Site/application/entity triple identifying an entity on the exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EntityId {
    pub site: u16,
    pub application: u16,
    pub entity: u16,
}

impl EntityId {
    pub const SIZE: usize = 6;
    /// Wildcard for site/application/entity in addressing fields
    pub const ALL: u16 = 0xFFFF;

    pub fn new(site: u16, application: u16, entity: u16) -> Self {
        Self {
            site,
            application,
            entity,
        }
    }

    pub fn is_none(&self) -> bool {
        self.site == 0 && self.application == 0 && self.entity == 0
    }

    pub fn decode(reader: &mut Reader) -> Result<Self, DecodeError> {
        Ok(Self {
            site: reader.u16()?,
            application: reader.u16()?,
            entity: reader.u16()?,
        })
    }

    pub fn encode(&self, writer: &mut Writer) {
        writer.put_u16(self.site);
        writer.put_u16(self.application);
        writer.put_u16(self.entity);
    }
}

/// Event identifier; same layout as [`EntityId`] with an event number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EventId {
    pub site: u16,
    pub application: u16,
    pub event_number: u16,
}

impl EventId {
    pub fn decode(reader: &mut Reader) -> Result<Self, DecodeError> {
        Ok(Self {
            site: reader.u16()?,
            application: reader.u16()?,
            event_number: reader.u16()?,
        })
    }

    pub fn encode(&self, writer: &mut Writer) {
        writer.put_u16(self.site);
        writer.put_u16(self.application);
        writer.put_u16(self.event_number);
    }
}

/// Seven-field DIS entity type code.
///
/// Used both as the wire representation of an entity's type and as the key
/// into the type-mapping registry, where a zero in the trailing
/// subcategory/specific/extra fields acts as a wildcard.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct EntityTypeCode {
    pub kind: u8,
    pub domain: u8,
    pub country: u16,
    pub category: u8,
    #[serde(default)]
    pub subcategory: u8,
    #[serde(default)]
    pub specific: u8,
    #[serde(default)]
    pub extra: u8,
}

impl EntityTypeCode {
    pub const SIZE: usize = 8;

    pub fn new(
        kind: u8,
        domain: u8,
        country: u16,
        category: u8,
        subcategory: u8,
        specific: u8,
        extra: u8,
    ) -> Self {
        Self {
            kind,
            domain,
            country,
            category,
            subcategory,
            specific,
            extra,
        }
    }

    pub fn decode(reader: &mut Reader) -> Result<Self, DecodeError> {
        Ok(Self {
            kind: reader.u8()?,
            domain: reader.u8()?,
            country: reader.u16()?,
            category: reader.u8()?,
            subcategory: reader.u8()?,
            specific: reader.u8()?,
            extra: reader.u8()?,
        })
    }

    pub fn encode(&self, writer: &mut Writer) {
        writer.put_u8(self.kind);
        writer.put_u8(self.domain);
        writer.put_u16(self.country);
        writer.put_u8(self.category);
        writer.put_u8(self.subcategory);
        writer.put_u8(self.specific);
        writer.put_u8(self.extra);
    }
}

impl std::fmt::Display for EntityTypeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}.{}.{}.{}",
            self.kind,
            self.domain,
            self.country,
            self.category,
            self.subcategory,
            self.specific,
            self.extra
        )
    }
}

/// Three-component vector.
///
/// World coordinates travel as 64-bit floats, velocities and accelerations
/// as 32-bit floats; the record is held in `f64` either way.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn add(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn sub(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn scale(&self, scalar: f64) -> Vec3 {
        Vec3::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }

    pub fn length_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    pub fn distance_squared(&self, other: &Vec3) -> f64 {
        self.sub(other).length_squared()
    }

    pub fn decode_f32(reader: &mut Reader) -> Result<Self, DecodeError> {
        Ok(Self::new(
            reader.f32()? as f64,
            reader.f32()? as f64,
            reader.f32()? as f64,
        ))
    }

    pub fn encode_f32(&self, writer: &mut Writer) {
        writer.put_f32(self.x as f32);
        writer.put_f32(self.y as f32);
        writer.put_f32(self.z as f32);
    }

    pub fn decode_f64(reader: &mut Reader) -> Result<Self, DecodeError> {
        Ok(Self::new(reader.f64()?, reader.f64()?, reader.f64()?))
    }

    pub fn encode_f64(&self, writer: &mut Writer) {
        writer.put_f64(self.x);
        writer.put_f64(self.y);
        writer.put_f64(self.z);
    }
}

/// Euler angles in radians (psi = heading, theta = pitch, phi = roll)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EulerAngles {
    pub psi: f64,
    pub theta: f64,
    pub phi: f64,
}

impl EulerAngles {
    pub fn new(psi: f64, theta: f64, phi: f64) -> Self {
        Self { psi, theta, phi }
    }

    pub fn decode(reader: &mut Reader) -> Result<Self, DecodeError> {
        Ok(Self::new(
            reader.f32()? as f64,
            reader.f32()? as f64,
            reader.f32()? as f64,
        ))
    }

    pub fn encode(&self, writer: &mut Writer) {
        writer.put_f32(self.psi as f32);
        writer.put_f32(self.theta as f32);
        writer.put_f32(self.phi as f32);
    }
}

/// Dead-reckoning algorithm codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeadReckoningAlgorithm {
    Other,
    Static,
    #[default]
    Fpw,
    Rpw,
    Rvw,
    Fvw,
    Fpb,
    Rpb,
    Rvb,
    Fvb,
    Unassigned(u8),
}

impl DeadReckoningAlgorithm {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Other,
            1 => Self::Static,
            2 => Self::Fpw,
            3 => Self::Rpw,
            4 => Self::Rvw,
            5 => Self::Fvw,
            6 => Self::Fpb,
            7 => Self::Rpb,
            8 => Self::Rvb,
            9 => Self::Fvb,
            v => Self::Unassigned(v),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::Other => 0,
            Self::Static => 1,
            Self::Fpw => 2,
            Self::Rpw => 3,
            Self::Rvw => 4,
            Self::Fvw => 5,
            Self::Fpb => 6,
            Self::Rpb => 7,
            Self::Rvb => 8,
            Self::Fvb => 9,
            Self::Unassigned(v) => v,
        }
    }
}

/// Dead-reckoning parameter record (40 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeadReckoningParameters {
    pub algorithm: DeadReckoningAlgorithm,
    pub other: [u8; 15],
    pub linear_acceleration: Vec3,
    pub angular_velocity: Vec3,
}

impl DeadReckoningParameters {
    pub const SIZE: usize = 40;

    pub fn decode(reader: &mut Reader) -> Result<Self, DecodeError> {
        let algorithm = DeadReckoningAlgorithm::from_u8(reader.u8()?);
        let mut other = [0u8; 15];
        other.copy_from_slice(reader.take(15)?);
        Ok(Self {
            algorithm,
            other,
            linear_acceleration: Vec3::decode_f32(reader)?,
            angular_velocity: Vec3::decode_f32(reader)?,
        })
    }

    pub fn encode(&self, writer: &mut Writer) {
        writer.put_u8(self.algorithm.as_u8());
        writer.put_bytes(&self.other);
        self.linear_acceleration.encode_f32(writer);
        self.angular_velocity.encode_f32(writer);
    }
}

/// Munition burst descriptor (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BurstDescriptor {
    pub munition: EntityTypeCode,
    pub warhead: u16,
    pub fuse: u16,
    pub quantity: u16,
    pub rate: u16,
}

impl BurstDescriptor {
    pub fn decode(reader: &mut Reader) -> Result<Self, DecodeError> {
        Ok(Self {
            munition: EntityTypeCode::decode(reader)?,
            warhead: reader.u16()?,
            fuse: reader.u16()?,
            quantity: reader.u16()?,
            rate: reader.u16()?,
        })
    }

    pub fn encode(&self, writer: &mut Writer) {
        self.munition.encode(writer);
        writer.put_u16(self.warhead);
        writer.put_u16(self.fuse);
        writer.put_u16(self.quantity);
        writer.put_u16(self.rate);
    }
}

/// Articulation parameter record (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArticulationParameter {
    pub type_designator: u8,
    pub change_indicator: u8,
    pub attachment_id: u16,
    pub parameter_type: u32,
    /// Raw 64-bit parameter value
    pub value: u64,
}

impl ArticulationParameter {
    pub const SIZE: usize = 16;

    pub fn decode(reader: &mut Reader) -> Result<Self, DecodeError> {
        Ok(Self {
            type_designator: reader.u8()?,
            change_indicator: reader.u8()?,
            attachment_id: reader.u16()?,
            parameter_type: reader.u32()?,
            value: reader.u64()?,
        })
    }

    pub fn encode(&self, writer: &mut Writer) {
        writer.put_u8(self.type_designator);
        writer.put_u8(self.change_indicator);
        writer.put_u16(self.attachment_id);
        writer.put_u32(self.parameter_type);
        writer.put_u64(self.value);
    }
}

/// Entity marking: a character set byte plus 11 characters
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Marking {
    pub character_set: u8,
    pub text: String,
}

impl Marking {
    pub const CHARACTERS: usize = 11;

    /// ASCII marking, truncated to 11 characters.
    pub fn ascii(text: &str) -> Self {
        Self {
            character_set: 1,
            text: text
                .chars()
                .filter(char::is_ascii)
                .take(Self::CHARACTERS)
                .collect(),
        }
    }

    pub fn decode(reader: &mut Reader) -> Result<Self, DecodeError> {
        let character_set = reader.u8()?;
        let raw = reader.take(Self::CHARACTERS)?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        Ok(Self {
            character_set,
            text: String::from_utf8_lossy(&raw[..end]).into_owned(),
        })
    }

    pub fn encode(&self, writer: &mut Writer) {
        writer.put_u8(self.character_set);
        let bytes = self.text.as_bytes();
        let len = bytes.len().min(Self::CHARACTERS);
        writer.put_bytes(&bytes[..len]);
        writer.put_zeros(Self::CHARACTERS - len);
    }
}

/// Hours since 1 January 1970 plus time past the hour (timestamp units)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockTime {
    pub hour: u32,
    pub time_past_hour: u32,
}

impl ClockTime {
    pub fn decode(reader: &mut Reader) -> Result<Self, DecodeError> {
        Ok(Self {
            hour: reader.u32()?,
            time_past_hour: reader.u32()?,
        })
    }

    pub fn encode(&self, writer: &mut Writer) {
        writer.put_u32(self.hour);
        writer.put_u32(self.time_past_hour);
    }
}

/// Fixed datum record: 32-bit id and 32-bit value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FixedDatum {
    pub id: u32,
    pub value: u32,
}

impl FixedDatum {
    pub fn decode(reader: &mut Reader) -> Result<Self, DecodeError> {
        Ok(Self {
            id: reader.u32()?,
            value: reader.u32()?,
        })
    }

    pub fn encode(&self, writer: &mut Writer) {
        writer.put_u32(self.id);
        writer.put_u32(self.value);
    }
}

/// Variable datum record; the value is padded to a 64-bit boundary on the wire
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VariableDatum {
    pub id: u32,
    pub value: Vec<u8>,
}

impl VariableDatum {
    pub fn text(id: u32, text: &str) -> Self {
        Self {
            id,
            value: text.as_bytes().to_vec(),
        }
    }

    pub fn as_text(&self) -> String {
        String::from_utf8_lossy(&self.value)
            .trim_end_matches('\0')
            .to_string()
    }

    pub fn decode(reader: &mut Reader) -> Result<Self, DecodeError> {
        let id = reader.u32()?;
        let length_bits = reader.u32()? as usize;
        let length_bytes = length_bits.div_ceil(8);
        let value = reader.take(length_bytes)?.to_vec();
        reader.skip(padding_for(length_bytes, 8))?;
        Ok(Self { id, value })
    }

    pub fn encode(&self, writer: &mut Writer) {
        writer.put_u32(self.id);
        writer.put_u32((self.value.len() * 8) as u32);
        writer.put_bytes(&self.value);
        writer.put_zeros(padding_for(self.value.len(), 8));
    }
}

/// Reads `count` records with `decode`, checking first that the minimum
/// record size fits in what remains.
pub(crate) fn decode_records<T>(
    reader: &mut Reader,
    count: usize,
    min_size: usize,
    decode: impl Fn(&mut Reader) -> Result<T, DecodeError>,
) -> Result<Vec<T>, DecodeError> {
    reader.require(count * min_size)?;
    (0..count).map(|_| decode(reader)).collect()
}
