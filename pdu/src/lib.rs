//! # DIS PDU Library
//!
//! Wire types and the byte-exact codec for the Distributed Interactive
//! Simulation protocol (IEEE 1278.1). Both the NetIO engine and the command
//! line tools depend on this crate, so every PDU layout lives here once.
//!
//! ## Layout
//!
//! ### Header (`header`)
//! The 12-byte header at the front of every PDU: protocol version, exercise,
//! PDU type and family, timestamp and total length.
//!
//! ### Records (`records`, `enums`)
//! Building blocks shared between PDU bodies (entity ids, entity type codes,
//! vectors, dead-reckoning parameters, datum records) and the standard
//! enumeration values the engine needs.
//!
//! ### Bodies
//! One module per PDU group, each type implementing [`PduBody`]:
//! - `entity_state`: Entity State
//! - `warfare`: Fire and Detonation
//! - `emission`: Electromagnetic Emission
//! - `radio`: Signal and Transmitter
//! - `simman`: simulation management (start, stop, acknowledge, action,
//!   data query, data, comment and the reliable action variants)
//!
//! ## Encoding
//!
//! All multi-byte fields are big-endian. Decoding reads field by field
//! through [`codec::Reader`] and returns a [`DecodeError`] for truncated or
//! inconsistent input; it never reinterprets the buffer in place.
//!
//! ```rust
//! use pdu::{decode_pdu, encode_pdu, EntityId, EntityStatePdu, ProtocolVersion, Timestamp};
//!
//! let state = EntityStatePdu {
//!     entity_id: EntityId::new(10, 143, 1),
//!     ..Default::default()
//! };
//! let bytes = encode_pdu(ProtocolVersion::Ieee1278_1A, 1, Timestamp(0), &state).unwrap();
//! assert_eq!(bytes.len(), 144);
//!
//! let (header, decoded) = decode_pdu::<EntityStatePdu>(&bytes).unwrap();
//! assert_eq!(header.exercise_id, 1);
//! assert_eq!(decoded.entity_id.application, 143);
//! ```

pub mod body;
pub mod codec;
pub mod emission;
pub mod entity_state;
pub mod enums;
pub mod header;
pub mod radio;
pub mod records;
pub mod simman;
pub mod warfare;

pub use body::{decode_pdu, encode_pdu, split_pdus, PduBody};
pub use codec::{DecodeError, EncodeError};
pub use emission::{
    ElectromagneticEmissionPdu, EmitterBeam, EmitterSystem, FundamentalParameters, TrackJamTarget,
};
pub use entity_state::EntityStatePdu;
pub use enums::{ForceId, RequestStatus};
pub use header::{
    decode_header, encode_header, peek_version, PduFamily, PduHeader, PduType, ProtocolVersion,
    Timestamp, HEADER_SIZE, MAX_PDU_SIZE,
};
pub use radio::{SignalPdu, TransmitterPdu};
pub use records::{
    ArticulationParameter, BurstDescriptor, ClockTime, DeadReckoningAlgorithm,
    DeadReckoningParameters, EntityId, EntityTypeCode, EulerAngles, EventId, FixedDatum, Marking,
    VariableDatum, Vec3,
};
pub use simman::{
    AcknowledgePdu, ActionRequestPdu, ActionRequestRPdu, ActionResponsePdu, ActionResponseRPdu,
    CommentPdu, DataPdu, DataQueryPdu, DatumRecords, StartResumePdu, StopFreezePdu,
};
pub use warfare::{DetonationPdu, FirePdu};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_datagram_splits_into_pdus() {
        let fire = encode_pdu(
            ProtocolVersion::Ieee1278_1A,
            1,
            Timestamp(0),
            &FirePdu::default(),
        )
        .unwrap();
        let state = encode_pdu(
            ProtocolVersion::Ieee1278_1A,
            1,
            Timestamp(0),
            &EntityStatePdu::default(),
        )
        .unwrap();

        let mut datagram = fire.clone();
        datagram.extend_from_slice(&state);

        let pdus: Vec<_> = split_pdus(&datagram).collect();
        assert_eq!(pdus.len(), 2);
        assert_eq!(pdus[0].unwrap(), fire.as_slice());
        assert_eq!(pdus[1].unwrap(), state.as_slice());
    }

    #[test]
    fn test_split_stops_at_garbage() {
        let mut datagram = encode_pdu(
            ProtocolVersion::Ieee1278_1A,
            1,
            Timestamp(0),
            &AcknowledgePdu::default(),
        )
        .unwrap();
        datagram.extend_from_slice(&[6, 1, 1]);

        let pdus: Vec<_> = split_pdus(&datagram).collect();
        assert_eq!(pdus.len(), 2);
        assert!(pdus[0].is_ok());
        assert!(matches!(pdus[1], Err(DecodeError::TooShort { .. })));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let bytes = encode_pdu(
            ProtocolVersion::Ieee1278_1A,
            1,
            Timestamp(0),
            &FirePdu::default(),
        )
        .unwrap();
        assert_eq!(
            decode_pdu::<DetonationPdu>(&bytes).unwrap_err(),
            DecodeError::WrongPduType {
                expected: 3,
                found: 2
            }
        );
    }
}
