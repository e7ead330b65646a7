//! The 12-byte header carried at the front of every DIS PDU.

use crate::codec::{DecodeError, EncodeError, Reader, Writer};

/// Size of the PDU header in bytes
pub const HEADER_SIZE: usize = 12;

/// Largest PDU the engine will build or accept
pub const MAX_PDU_SIZE: usize = 1536;

/// DIS protocol version codes [0 .. 7]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProtocolVersion {
    Other = 0,
    /// DIS PDU version 1.0 (May 92)
    Dis100 = 1,
    /// IEEE 1278-1993
    Ieee1278 = 2,
    /// DIS PDU version 2.0 third draft (May 93)
    Dis203 = 3,
    /// DIS PDU version 2.0 fourth draft (March 94)
    Dis204 = 4,
    /// IEEE 1278.1-1995
    Ieee1278_1 = 5,
    /// IEEE 1278.1A-1998
    Ieee1278_1A = 6,
    /// IEEE 1278.1-2012
    Dis7 = 7,
}

impl ProtocolVersion {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::Other,
            1 => Self::Dis100,
            2 => Self::Ieee1278,
            3 => Self::Dis203,
            4 => Self::Dis204,
            5 => Self::Ieee1278_1,
            6 => Self::Ieee1278_1A,
            7 => Self::Dis7,
            _ => return None,
        })
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// PDU family (protocol family) codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PduFamily {
    Other,
    EntityInformation,
    Warfare,
    Logistics,
    RadioCommunication,
    SimulationManagement,
    DistributedEmissionRegeneration,
    EntityManagement,
    Minefield,
    SyntheticEnvironment,
    SimulationManagementReliable,
    LiveEntity,
    NonRealTime,
    Experimental,
    Unassigned(u8),
}

impl PduFamily {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Other,
            1 => Self::EntityInformation,
            2 => Self::Warfare,
            3 => Self::Logistics,
            4 => Self::RadioCommunication,
            5 => Self::SimulationManagement,
            6 => Self::DistributedEmissionRegeneration,
            7 => Self::EntityManagement,
            8 => Self::Minefield,
            9 => Self::SyntheticEnvironment,
            10 => Self::SimulationManagementReliable,
            11 => Self::LiveEntity,
            12 => Self::NonRealTime,
            129 => Self::Experimental,
            v => Self::Unassigned(v),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::Other => 0,
            Self::EntityInformation => 1,
            Self::Warfare => 2,
            Self::Logistics => 3,
            Self::RadioCommunication => 4,
            Self::SimulationManagement => 5,
            Self::DistributedEmissionRegeneration => 6,
            Self::EntityManagement => 7,
            Self::Minefield => 8,
            Self::SyntheticEnvironment => 9,
            Self::SimulationManagementReliable => 10,
            Self::LiveEntity => 11,
            Self::NonRealTime => 12,
            Self::Experimental => 129,
            Self::Unassigned(v) => v,
        }
    }
}

macro_rules! pdu_types {
    ($($name:ident = $value:literal => $family:ident),* $(,)?) => {
        /// PDU type codes (SISO-REF-010 section 3.2)
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum PduType {
            $($name,)*
            /// A code with no assigned meaning; routed to the unknown-PDU hook.
            Unassigned(u8),
        }

        impl PduType {
            pub fn from_u8(value: u8) -> Self {
                match value {
                    $($value => Self::$name,)*
                    v => Self::Unassigned(v),
                }
            }

            pub fn as_u8(self) -> u8 {
                match self {
                    $(Self::$name => $value,)*
                    Self::Unassigned(v) => v,
                }
            }

            /// The family this type belongs to, or `None` for unassigned codes.
            pub fn family(self) -> Option<PduFamily> {
                match self {
                    $(Self::$name => Some(PduFamily::$family),)*
                    Self::Unassigned(_) => None,
                }
            }
        }
    };
}

pdu_types! {
    Other = 0 => Other,
    EntityState = 1 => EntityInformation,
    Fire = 2 => Warfare,
    Detonation = 3 => Warfare,
    Collision = 4 => EntityInformation,
    ServiceRequest = 5 => Logistics,
    ResupplyOffer = 6 => Logistics,
    ResupplyReceived = 7 => Logistics,
    ResupplyCancel = 8 => Logistics,
    RepairComplete = 9 => Logistics,
    RepairResponse = 10 => Logistics,
    CreateEntity = 11 => SimulationManagement,
    RemoveEntity = 12 => SimulationManagement,
    StartResume = 13 => SimulationManagement,
    StopFreeze = 14 => SimulationManagement,
    Acknowledge = 15 => SimulationManagement,
    ActionRequest = 16 => SimulationManagement,
    ActionResponse = 17 => SimulationManagement,
    DataQuery = 18 => SimulationManagement,
    SetData = 19 => SimulationManagement,
    Data = 20 => SimulationManagement,
    EventReport = 21 => SimulationManagement,
    Comment = 22 => SimulationManagement,
    ElectromagneticEmission = 23 => DistributedEmissionRegeneration,
    Designator = 24 => DistributedEmissionRegeneration,
    Transmitter = 25 => RadioCommunication,
    Signal = 26 => RadioCommunication,
    Receiver = 27 => RadioCommunication,
    IffAtcNavaids = 28 => DistributedEmissionRegeneration,
    UnderwaterAcoustic = 29 => DistributedEmissionRegeneration,
    SupplementalEmission = 30 => DistributedEmissionRegeneration,
    IntercomSignal = 31 => RadioCommunication,
    IntercomControl = 32 => RadioCommunication,
    AggregateState = 33 => EntityManagement,
    IsGroupOf = 34 => EntityManagement,
    TransferControl = 35 => EntityManagement,
    IsPartOf = 36 => EntityManagement,
    MinefieldState = 37 => Minefield,
    MinefieldQuery = 38 => Minefield,
    MinefieldData = 39 => Minefield,
    MinefieldResponseNak = 40 => Minefield,
    EnvironmentalProcess = 41 => SyntheticEnvironment,
    GriddedData = 42 => SyntheticEnvironment,
    PointObjectState = 43 => SyntheticEnvironment,
    LinearObjectState = 44 => SyntheticEnvironment,
    ArealObjectState = 45 => SyntheticEnvironment,
    Tspi = 46 => LiveEntity,
    Appearance = 47 => LiveEntity,
    ArticulatedParts = 48 => LiveEntity,
    LeFire = 49 => LiveEntity,
    LeDetonation = 50 => LiveEntity,
    CreateEntityR = 51 => SimulationManagementReliable,
    RemoveEntityR = 52 => SimulationManagementReliable,
    StartResumeR = 53 => SimulationManagementReliable,
    StopFreezeR = 54 => SimulationManagementReliable,
    AcknowledgeR = 55 => SimulationManagementReliable,
    ActionRequestR = 56 => SimulationManagementReliable,
    ActionResponseR = 57 => SimulationManagementReliable,
    DataQueryR = 58 => SimulationManagementReliable,
    SetDataR = 59 => SimulationManagementReliable,
    DataR = 60 => SimulationManagementReliable,
    EventReportR = 61 => SimulationManagementReliable,
    CommentR = 62 => SimulationManagementReliable,
    RecordR = 63 => SimulationManagementReliable,
    SetRecordR = 64 => SimulationManagementReliable,
    RecordQueryR = 65 => SimulationManagementReliable,
    CollisionElastic = 66 => EntityInformation,
    EntityStateUpdate = 67 => EntityInformation,
    AnnounceObject = 129 => Experimental,
    DeleteObject = 130 => Experimental,
    DescribeApplication = 131 => Experimental,
    DescribeEvent = 132 => Experimental,
    DescribeObject = 133 => Experimental,
    RequestEvent = 134 => Experimental,
    RequestObject = 135 => Experimental,
}

/// DIS timestamp: units of 3600/2^31 seconds past the hour in the upper 31
/// bits, with the low bit set for absolute (clock-synchronized) time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Timestamp(pub u32);

impl Timestamp {
    const UNITS_PER_HOUR: f64 = 2_147_483_647.0;

    /// Builds a timestamp from a time in seconds; only the position within
    /// the current hour is kept.
    pub fn from_seconds(seconds: f64, absolute: bool) -> Self {
        let past_hour = seconds.rem_euclid(3600.0);
        let units = ((past_hour / 3600.0) * Self::UNITS_PER_HOUR) as u32 & 0x7FFF_FFFF;
        Timestamp((units << 1) | absolute as u32)
    }

    pub fn is_absolute(self) -> bool {
        self.0 & 1 == 1
    }

    pub fn seconds_past_hour(self) -> f64 {
        (self.0 >> 1) as f64 / Self::UNITS_PER_HOUR * 3600.0
    }
}

/// Common PDU header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PduHeader {
    pub version: ProtocolVersion,
    /// Partitions independent simulation sessions sharing a network
    pub exercise_id: u8,
    pub pdu_type: PduType,
    pub family: PduFamily,
    pub timestamp: Timestamp,
    /// Total PDU length in bytes, header included
    pub length: u16,
    /// PDU status byte (DIS 7); zero for older versions
    pub status: u8,
}

impl PduHeader {
    /// Creates a header with the family derived from the PDU type.
    pub fn new(
        version: ProtocolVersion,
        exercise_id: u8,
        pdu_type: PduType,
        timestamp: Timestamp,
        length: u16,
    ) -> Self {
        Self {
            version,
            exercise_id,
            pdu_type,
            family: pdu_type.family().unwrap_or(PduFamily::Other),
            timestamp,
            length,
            status: 0,
        }
    }
}

/// Decodes the header at the front of `bytes`, returning it together with
/// the PDU body (the bytes between the header and the declared length).
pub fn decode_header(bytes: &[u8]) -> Result<(PduHeader, &[u8]), DecodeError> {
    let mut reader = Reader::new(bytes);
    reader.require(HEADER_SIZE)?;

    let version_byte = reader.u8()?;
    let exercise_id = reader.u8()?;
    let pdu_type = PduType::from_u8(reader.u8()?);
    let family = PduFamily::from_u8(reader.u8()?);
    let timestamp = Timestamp(reader.u32()?);
    let length = reader.u16()?;
    let status = reader.u8()?;
    reader.skip(1)?;

    let declared = length as usize;
    if declared < HEADER_SIZE {
        return Err(DecodeError::LengthTooSmall { declared });
    }
    if declared > bytes.len() {
        return Err(DecodeError::LengthExceedsBuffer {
            declared,
            available: bytes.len(),
        });
    }
    if let Some(expected) = pdu_type.family() {
        if expected != family {
            return Err(DecodeError::FamilyMismatch {
                pdu_type: pdu_type.as_u8(),
                expected: expected.as_u8(),
                found: family.as_u8(),
            });
        }
    }

    // Versions past 7 are kept as Other so the caller can report them
    let version = ProtocolVersion::from_u8(version_byte).unwrap_or(ProtocolVersion::Other);

    let header = PduHeader {
        version,
        exercise_id,
        pdu_type,
        family,
        timestamp,
        length,
        status,
    };
    Ok((header, &bytes[HEADER_SIZE..declared]))
}

/// Raw protocol version byte of a PDU, before any validation.
pub fn peek_version(bytes: &[u8]) -> Option<u8> {
    bytes.first().copied()
}

/// Encodes a header into its 12 wire bytes.
pub fn encode_header(header: &PduHeader) -> Result<[u8; HEADER_SIZE], EncodeError> {
    if (header.length as usize) < HEADER_SIZE {
        return Err(EncodeError::InvalidField {
            field: "length",
            reason: "shorter than the PDU header",
        });
    }
    if let PduType::Unassigned(code) = header.pdu_type {
        if !matches!(PduType::from_u8(code), PduType::Unassigned(_)) {
            return Err(EncodeError::InvalidField {
                field: "pdu_type",
                reason: "unassigned variant shadows an assigned type code",
            });
        }
    }
    if let Some(expected) = header.pdu_type.family() {
        if expected != header.family {
            return Err(EncodeError::InvalidField {
                field: "family",
                reason: "does not match the PDU type",
            });
        }
    }

    let mut writer = Writer::with_capacity(HEADER_SIZE);
    write_header(&mut writer, header);
    let mut out = [0u8; HEADER_SIZE];
    out.copy_from_slice(writer.as_bytes());
    Ok(out)
}

fn write_header(writer: &mut Writer, header: &PduHeader) {
    writer.put_u8(header.version.as_u8());
    writer.put_u8(header.exercise_id);
    writer.put_u8(header.pdu_type.as_u8());
    writer.put_u8(header.family.as_u8());
    writer.put_u32(header.timestamp.0);
    writer.put_u16(header.length);
    writer.put_u8(header.status);
    writer.put_u8(0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn sample_header() -> PduHeader {
        PduHeader::new(
            ProtocolVersion::Ieee1278_1A,
            7,
            PduType::EntityState,
            Timestamp::from_seconds(1234.5, true),
            144,
        )
    }

    #[test]
    fn test_header_roundtrip() {
        let header = sample_header();
        let mut bytes = encode_header(&header).unwrap().to_vec();
        bytes.resize(144, 0);

        let (decoded, body) = decode_header(&bytes).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(body.len(), 144 - HEADER_SIZE);
    }

    #[test]
    fn test_header_wire_layout() {
        let header = PduHeader::new(
            ProtocolVersion::Ieee1278_1A,
            1,
            PduType::Fire,
            Timestamp(0x0102_0304),
            96,
        );
        let bytes = encode_header(&header).unwrap();
        assert_eq!(bytes, [6, 1, 2, 2, 0x01, 0x02, 0x03, 0x04, 0x00, 0x60, 0, 0]);
    }

    #[test]
    fn test_decode_too_short() {
        let bytes = [6u8, 1, 1, 1, 0, 0];
        assert_eq!(
            decode_header(&bytes),
            Err(DecodeError::TooShort {
                needed: HEADER_SIZE,
                available: 6
            })
        );
    }

    #[test]
    fn test_decode_length_exceeds_buffer() {
        let mut bytes = encode_header(&sample_header()).unwrap().to_vec();
        bytes.resize(100, 0);
        assert_eq!(
            decode_header(&bytes),
            Err(DecodeError::LengthExceedsBuffer {
                declared: 144,
                available: 100
            })
        );
    }

    #[test]
    fn test_decode_family_mismatch() {
        let mut bytes = encode_header(&sample_header()).unwrap().to_vec();
        bytes.resize(144, 0);
        bytes[3] = 2;
        assert!(matches!(
            decode_header(&bytes),
            Err(DecodeError::FamilyMismatch { pdu_type: 1, .. })
        ));
    }

    #[test]
    fn test_unassigned_type_decodes() {
        let header = PduHeader::new(
            ProtocolVersion::Dis7,
            3,
            PduType::Unassigned(200),
            Timestamp::default(),
            12,
        );
        let bytes = encode_header(&header).unwrap();
        let (decoded, body) = decode_header(&bytes).unwrap();
        assert_eq!(decoded.pdu_type, PduType::Unassigned(200));
        assert!(body.is_empty());
    }

    #[test]
    fn test_encode_rejects_short_length() {
        let mut header = sample_header();
        header.length = 4;
        assert!(matches!(
            encode_header(&header),
            Err(EncodeError::InvalidField { field: "length", .. })
        ));
    }

    #[test]
    fn test_encode_rejects_shadowing_unassigned() {
        let mut header = sample_header();
        header.pdu_type = PduType::Unassigned(1);
        assert!(encode_header(&header).is_err());
    }

    #[test]
    fn test_type_codes_roundtrip() {
        for code in 0..=255u8 {
            assert_eq!(PduType::from_u8(code).as_u8(), code);
        }
        assert_eq!(
            PduType::ElectromagneticEmission.family(),
            Some(PduFamily::DistributedEmissionRegeneration)
        );
        assert_eq!(PduType::Signal.family(), Some(PduFamily::RadioCommunication));
        assert_eq!(PduType::from_u8(68), PduType::Unassigned(68));
    }

    #[test]
    fn test_timestamp_encoding() {
        let ts = Timestamp::from_seconds(7200.0 + 1800.0, true);
        assert!(ts.is_absolute());
        assert_approx_eq!(ts.seconds_past_hour(), 1800.0, 1e-3);

        let relative = Timestamp::from_seconds(59.25, false);
        assert!(!relative.is_absolute());
        assert_approx_eq!(relative.seconds_past_hour(), 59.25, 1e-3);
    }
}
