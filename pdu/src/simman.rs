//! Simulation-management PDUs.
//!
//! Every body starts with the originating and receiving entity ids; the
//! receiving id is how a PDU is addressed to one application or, with
//! 0xFFFF wildcards, to all of them.

use crate::body::{expect_body_len, PduBody};
use crate::codec::{DecodeError, EncodeError, Reader, Writer};
use crate::enums::RequestStatus;
use crate::header::{PduType, HEADER_SIZE};
use crate::records::{decode_records, ClockTime, EntityId, FixedDatum, VariableDatum};

const ADDRESSING_SIZE: usize = 2 * EntityId::SIZE;

/// Fixed and variable datum records carried by action, data and comment PDUs
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DatumRecords {
    pub fixed: Vec<FixedDatum>,
    pub variable: Vec<VariableDatum>,
}

impl DatumRecords {
    fn decode_counted(reader: &mut Reader) -> Result<Self, DecodeError> {
        let fixed_count = reader.u32()? as usize;
        let variable_count = reader.u32()? as usize;
        let fixed = decode_records(reader, fixed_count, 8, FixedDatum::decode)?;
        let variable = decode_records(reader, variable_count, 8, VariableDatum::decode)?;
        Ok(Self { fixed, variable })
    }

    fn encode_counted(&self, writer: &mut Writer) {
        writer.put_u32(self.fixed.len() as u32);
        writer.put_u32(self.variable.len() as u32);
        for datum in &self.fixed {
            datum.encode(writer);
        }
        for datum in &self.variable {
            datum.encode(writer);
        }
    }
}

fn expect_consumed(reader: &Reader, body: &[u8]) -> Result<(), DecodeError> {
    if reader.remaining() != 0 {
        return Err(DecodeError::LengthMismatch {
            declared: body.len() + HEADER_SIZE,
            expected: reader.position() + HEADER_SIZE,
        });
    }
    Ok(())
}

/// Start/Resume PDU (44 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StartResumePdu {
    pub originating: EntityId,
    pub receiving: EntityId,
    pub real_world_time: ClockTime,
    pub simulation_time: ClockTime,
    pub request_id: u32,
}

impl PduBody for StartResumePdu {
    const PDU_TYPE: PduType = PduType::StartResume;

    fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        expect_body_len(body, 44 - HEADER_SIZE)?;
        let mut reader = Reader::new(body);
        Ok(Self {
            originating: EntityId::decode(&mut reader)?,
            receiving: EntityId::decode(&mut reader)?,
            real_world_time: ClockTime::decode(&mut reader)?,
            simulation_time: ClockTime::decode(&mut reader)?,
            request_id: reader.u32()?,
        })
    }

    fn encode_body(&self, writer: &mut Writer) -> Result<(), EncodeError> {
        self.originating.encode(writer);
        self.receiving.encode(writer);
        self.real_world_time.encode(writer);
        self.simulation_time.encode(writer);
        writer.put_u32(self.request_id);
        Ok(())
    }
}

/// Stop/Freeze PDU (40 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StopFreezePdu {
    pub originating: EntityId,
    pub receiving: EntityId,
    pub real_world_time: ClockTime,
    pub reason: u8,
    pub frozen_behavior: u8,
    pub request_id: u32,
}

impl PduBody for StopFreezePdu {
    const PDU_TYPE: PduType = PduType::StopFreeze;

    fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        expect_body_len(body, 40 - HEADER_SIZE)?;
        let mut reader = Reader::new(body);
        let originating = EntityId::decode(&mut reader)?;
        let receiving = EntityId::decode(&mut reader)?;
        let real_world_time = ClockTime::decode(&mut reader)?;
        let reason = reader.u8()?;
        let frozen_behavior = reader.u8()?;
        reader.skip(2)?;
        Ok(Self {
            originating,
            receiving,
            real_world_time,
            reason,
            frozen_behavior,
            request_id: reader.u32()?,
        })
    }

    fn encode_body(&self, writer: &mut Writer) -> Result<(), EncodeError> {
        self.originating.encode(writer);
        self.receiving.encode(writer);
        self.real_world_time.encode(writer);
        writer.put_u8(self.reason);
        writer.put_u8(self.frozen_behavior);
        writer.put_u16(0);
        writer.put_u32(self.request_id);
        Ok(())
    }
}

/// Acknowledge PDU (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AcknowledgePdu {
    pub originating: EntityId,
    pub receiving: EntityId,
    pub acknowledge_flag: u16,
    pub response_flag: u16,
    pub request_id: u32,
}

impl PduBody for AcknowledgePdu {
    const PDU_TYPE: PduType = PduType::Acknowledge;

    fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        expect_body_len(body, 32 - HEADER_SIZE)?;
        let mut reader = Reader::new(body);
        Ok(Self {
            originating: EntityId::decode(&mut reader)?,
            receiving: EntityId::decode(&mut reader)?,
            acknowledge_flag: reader.u16()?,
            response_flag: reader.u16()?,
            request_id: reader.u32()?,
        })
    }

    fn encode_body(&self, writer: &mut Writer) -> Result<(), EncodeError> {
        self.originating.encode(writer);
        self.receiving.encode(writer);
        writer.put_u16(self.acknowledge_flag);
        writer.put_u16(self.response_flag);
        writer.put_u32(self.request_id);
        Ok(())
    }
}

/// Action Request PDU: 40 bytes plus datum records
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionRequestPdu {
    pub originating: EntityId,
    pub receiving: EntityId,
    pub request_id: u32,
    pub action_id: u32,
    pub data: DatumRecords,
}

impl PduBody for ActionRequestPdu {
    const PDU_TYPE: PduType = PduType::ActionRequest;

    fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(body);
        reader.require(ADDRESSING_SIZE + 16)?;
        let pdu = Self {
            originating: EntityId::decode(&mut reader)?,
            receiving: EntityId::decode(&mut reader)?,
            request_id: reader.u32()?,
            action_id: reader.u32()?,
            data: DatumRecords::decode_counted(&mut reader)?,
        };
        expect_consumed(&reader, body)?;
        Ok(pdu)
    }

    fn encode_body(&self, writer: &mut Writer) -> Result<(), EncodeError> {
        self.originating.encode(writer);
        self.receiving.encode(writer);
        writer.put_u32(self.request_id);
        writer.put_u32(self.action_id);
        self.data.encode_counted(writer);
        Ok(())
    }
}

/// Action Response PDU: 40 bytes plus datum records
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionResponsePdu {
    pub originating: EntityId,
    pub receiving: EntityId,
    pub request_id: u32,
    pub status: RequestStatus,
    pub data: DatumRecords,
}

fn decode_action_response(body: &[u8]) -> Result<ActionResponsePdu, DecodeError> {
    let mut reader = Reader::new(body);
    reader.require(ADDRESSING_SIZE + 16)?;
    let pdu = ActionResponsePdu {
        originating: EntityId::decode(&mut reader)?,
        receiving: EntityId::decode(&mut reader)?,
        request_id: reader.u32()?,
        status: RequestStatus::from_u32(reader.u32()?),
        data: DatumRecords::decode_counted(&mut reader)?,
    };
    expect_consumed(&reader, body)?;
    Ok(pdu)
}

fn encode_action_response(pdu: &ActionResponsePdu, writer: &mut Writer) {
    pdu.originating.encode(writer);
    pdu.receiving.encode(writer);
    writer.put_u32(pdu.request_id);
    writer.put_u32(pdu.status.as_u32());
    pdu.data.encode_counted(writer);
}

impl PduBody for ActionResponsePdu {
    const PDU_TYPE: PduType = PduType::ActionResponse;

    fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        decode_action_response(body)
    }

    fn encode_body(&self, writer: &mut Writer) -> Result<(), EncodeError> {
        encode_action_response(self, writer);
        Ok(())
    }
}

/// Action Request-R PDU: the reliable variant with a required service level
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionRequestRPdu {
    pub originating: EntityId,
    pub receiving: EntityId,
    pub required_reliability: u8,
    pub request_id: u32,
    pub action_id: u32,
    pub data: DatumRecords,
}

impl PduBody for ActionRequestRPdu {
    const PDU_TYPE: PduType = PduType::ActionRequestR;

    fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(body);
        reader.require(ADDRESSING_SIZE + 20)?;
        let originating = EntityId::decode(&mut reader)?;
        let receiving = EntityId::decode(&mut reader)?;
        let required_reliability = reader.u8()?;
        reader.skip(3)?;
        let pdu = Self {
            originating,
            receiving,
            required_reliability,
            request_id: reader.u32()?,
            action_id: reader.u32()?,
            data: DatumRecords::decode_counted(&mut reader)?,
        };
        expect_consumed(&reader, body)?;
        Ok(pdu)
    }

    fn encode_body(&self, writer: &mut Writer) -> Result<(), EncodeError> {
        self.originating.encode(writer);
        self.receiving.encode(writer);
        writer.put_u8(self.required_reliability);
        writer.put_zeros(3);
        writer.put_u32(self.request_id);
        writer.put_u32(self.action_id);
        self.data.encode_counted(writer);
        Ok(())
    }
}

/// Action Response-R PDU; same layout as [`ActionResponsePdu`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionResponseRPdu(pub ActionResponsePdu);

impl PduBody for ActionResponseRPdu {
    const PDU_TYPE: PduType = PduType::ActionResponseR;

    fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        decode_action_response(body).map(Self)
    }

    fn encode_body(&self, writer: &mut Writer) -> Result<(), EncodeError> {
        encode_action_response(&self.0, writer);
        Ok(())
    }
}

/// Data Query PDU: 40 bytes plus the requested datum ids
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataQueryPdu {
    pub originating: EntityId,
    pub receiving: EntityId,
    pub request_id: u32,
    /// Reporting interval in milliseconds; zero asks for a single reply
    pub time_interval: u32,
    pub fixed_ids: Vec<u32>,
    pub variable_ids: Vec<u32>,
}

impl PduBody for DataQueryPdu {
    const PDU_TYPE: PduType = PduType::DataQuery;

    fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(body);
        reader.require(ADDRESSING_SIZE + 16)?;
        let originating = EntityId::decode(&mut reader)?;
        let receiving = EntityId::decode(&mut reader)?;
        let request_id = reader.u32()?;
        let time_interval = reader.u32()?;
        let fixed_count = reader.u32()? as usize;
        let variable_count = reader.u32()? as usize;
        let fixed_ids = decode_records(&mut reader, fixed_count, 4, |r| r.u32())?;
        let variable_ids = decode_records(&mut reader, variable_count, 4, |r| r.u32())?;
        expect_consumed(&reader, body)?;
        Ok(Self {
            originating,
            receiving,
            request_id,
            time_interval,
            fixed_ids,
            variable_ids,
        })
    }

    fn encode_body(&self, writer: &mut Writer) -> Result<(), EncodeError> {
        self.originating.encode(writer);
        self.receiving.encode(writer);
        writer.put_u32(self.request_id);
        writer.put_u32(self.time_interval);
        writer.put_u32(self.fixed_ids.len() as u32);
        writer.put_u32(self.variable_ids.len() as u32);
        for id in self.fixed_ids.iter().chain(&self.variable_ids) {
            writer.put_u32(*id);
        }
        Ok(())
    }
}

/// Data PDU: 40 bytes plus datum records
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataPdu {
    pub originating: EntityId,
    pub receiving: EntityId,
    pub request_id: u32,
    pub data: DatumRecords,
}

impl PduBody for DataPdu {
    const PDU_TYPE: PduType = PduType::Data;

    fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(body);
        reader.require(ADDRESSING_SIZE + 16)?;
        let originating = EntityId::decode(&mut reader)?;
        let receiving = EntityId::decode(&mut reader)?;
        let request_id = reader.u32()?;
        reader.skip(4)?;
        let pdu = Self {
            originating,
            receiving,
            request_id,
            data: DatumRecords::decode_counted(&mut reader)?,
        };
        expect_consumed(&reader, body)?;
        Ok(pdu)
    }

    fn encode_body(&self, writer: &mut Writer) -> Result<(), EncodeError> {
        self.originating.encode(writer);
        self.receiving.encode(writer);
        writer.put_u32(self.request_id);
        writer.put_u32(0);
        self.data.encode_counted(writer);
        Ok(())
    }
}

/// Comment PDU: 32 bytes plus datum records
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommentPdu {
    pub originating: EntityId,
    pub receiving: EntityId,
    pub data: DatumRecords,
}

impl CommentPdu {
    /// Text of every variable datum, one per line.
    pub fn text(&self) -> String {
        self.data
            .variable
            .iter()
            .map(VariableDatum::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl PduBody for CommentPdu {
    const PDU_TYPE: PduType = PduType::Comment;

    fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(body);
        reader.require(ADDRESSING_SIZE + 8)?;
        let pdu = Self {
            originating: EntityId::decode(&mut reader)?,
            receiving: EntityId::decode(&mut reader)?,
            data: DatumRecords::decode_counted(&mut reader)?,
        };
        expect_consumed(&reader, body)?;
        Ok(pdu)
    }

    fn encode_body(&self, writer: &mut Writer) -> Result<(), EncodeError> {
        self.originating.encode(writer);
        self.receiving.encode(writer);
        self.data.encode_counted(writer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{decode_pdu, encode_pdu};
    use crate::enums::{acknowledge_flag, response_flag};
    use crate::header::{ProtocolVersion, Timestamp};

    const V: ProtocolVersion = ProtocolVersion::Ieee1278_1A;

    fn origin() -> EntityId {
        EntityId::new(1, 1, 0)
    }

    fn everyone() -> EntityId {
        EntityId::new(EntityId::ALL, EntityId::ALL, 0)
    }

    #[test]
    fn test_start_resume_size_and_roundtrip() {
        let pdu = StartResumePdu {
            originating: origin(),
            receiving: everyone(),
            real_world_time: ClockTime {
                hour: 480_000,
                time_past_hour: 100,
            },
            request_id: 42,
            ..Default::default()
        };
        let bytes = encode_pdu(V, 1, Timestamp(0), &pdu).unwrap();
        assert_eq!(bytes.len(), 44);
        assert_eq!(decode_pdu::<StartResumePdu>(&bytes).unwrap().1, pdu);
    }

    #[test]
    fn test_stop_and_acknowledge_sizes() {
        let stop = encode_pdu(V, 1, Timestamp(0), &StopFreezePdu::default()).unwrap();
        assert_eq!(stop.len(), 40);

        let ack = AcknowledgePdu {
            originating: origin(),
            receiving: everyone(),
            acknowledge_flag: acknowledge_flag::START_RESUME,
            response_flag: response_flag::ABLE_TO_COMPLY,
            request_id: 7,
        };
        let bytes = encode_pdu(V, 1, Timestamp(0), &ack).unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(decode_pdu::<AcknowledgePdu>(&bytes).unwrap().1, ack);
    }

    #[test]
    fn test_action_request_with_datums() {
        let pdu = ActionRequestPdu {
            originating: origin(),
            receiving: EntityId::new(10, 143, 0),
            request_id: 3,
            action_id: 12,
            data: DatumRecords {
                fixed: vec![FixedDatum { id: 1, value: 2 }],
                variable: vec![VariableDatum::text(5, "launch")],
            },
        };
        let bytes = encode_pdu(V, 1, Timestamp(0), &pdu).unwrap();
        assert_eq!(bytes.len(), 40 + 8 + 16);
        assert_eq!(decode_pdu::<ActionRequestPdu>(&bytes).unwrap().1, pdu);
    }

    #[test]
    fn test_action_request_r_layout() {
        let pdu = ActionRequestRPdu {
            originating: origin(),
            receiving: everyone(),
            required_reliability: 1,
            request_id: 9,
            action_id: 2,
            data: DatumRecords::default(),
        };
        let bytes = encode_pdu(V, 1, Timestamp(0), &pdu).unwrap();
        assert_eq!(bytes.len(), 44);
        assert_eq!(decode_pdu::<ActionRequestRPdu>(&bytes).unwrap().1, pdu);
    }

    #[test]
    fn test_action_response_r_type() {
        let pdu = ActionResponseRPdu(ActionResponsePdu {
            status: RequestStatus::Complete,
            ..Default::default()
        });
        let bytes = encode_pdu(V, 1, Timestamp(0), &pdu).unwrap();
        assert_eq!(bytes[2], PduType::ActionResponseR.as_u8());
        assert_eq!(
            decode_pdu::<ActionResponseRPdu>(&bytes).unwrap().1 .0.status,
            RequestStatus::Complete
        );
    }

    #[test]
    fn test_data_query_ids() {
        let pdu = DataQueryPdu {
            originating: origin(),
            receiving: everyone(),
            request_id: 5,
            time_interval: 0,
            fixed_ids: vec![100, 200],
            variable_ids: vec![300],
        };
        let bytes = encode_pdu(V, 1, Timestamp(0), &pdu).unwrap();
        assert_eq!(bytes.len(), 40 + 12);
        assert_eq!(decode_pdu::<DataQueryPdu>(&bytes).unwrap().1, pdu);
    }

    #[test]
    fn test_data_roundtrip() {
        let pdu = DataPdu {
            originating: origin(),
            receiving: everyone(),
            request_id: 5,
            data: DatumRecords {
                fixed: vec![FixedDatum { id: 100, value: 1 }],
                variable: vec![],
            },
        };
        let bytes = encode_pdu(V, 1, Timestamp(0), &pdu).unwrap();
        assert_eq!(decode_pdu::<DataPdu>(&bytes).unwrap().1, pdu);
    }

    #[test]
    fn test_comment_text() {
        let pdu = CommentPdu {
            originating: origin(),
            receiving: everyone(),
            data: DatumRecords {
                fixed: vec![],
                variable: vec![
                    VariableDatum::text(1, "exercise paused"),
                    VariableDatum::text(1, "resume at 1200"),
                ],
            },
        };
        let bytes = encode_pdu(V, 1, Timestamp(0), &pdu).unwrap();
        let (_, decoded) = decode_pdu::<CommentPdu>(&bytes).unwrap();
        assert_eq!(decoded.text(), "exercise paused\nresume at 1200");
    }

    #[test]
    fn test_comment_count_overflow() {
        let bytes = encode_pdu(V, 1, Timestamp(0), &CommentPdu::default()).unwrap();
        let mut body = bytes[HEADER_SIZE..].to_vec();
        // Claim a million variable datums
        body[16..20].copy_from_slice(&1_000_000u32.to_be_bytes());
        assert!(matches!(
            CommentPdu::decode(&body),
            Err(DecodeError::TooShort { .. })
        ));
    }
}
