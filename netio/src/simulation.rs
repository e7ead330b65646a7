//! Simulation collaborator
//!
//! The engine never owns entity physics. It asks the simulation for the
//! entities to publish and hands it every applied network update through
//! the [`Simulation`] callbacks.

use crate::nib::{EntityHandle, Nib};
use pdu::{
    AcknowledgePdu, ActionRequestPdu, ActionResponsePdu, CommentPdu, DataPdu, DataQueryPdu,
    DatumRecords, DeadReckoningAlgorithm, DetonationPdu, ElectromagneticEmissionPdu, EntityId,
    EntityStatePdu, EntityTypeCode, EulerAngles, FirePdu, ForceId, FundamentalParameters,
    PduHeader, RequestStatus, SignalPdu, StartResumePdu, StopFreezePdu, TransmitterPdu, Vec3,
};

/// State of one local entity offered for publication
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySnapshot {
    /// Entity number; site and application are the engine's own
    pub player_id: u16,
    /// Local type name, mapped to a DIS entity type through the NTM registry
    pub type_name: String,
    pub force_id: ForceId,
    pub marking: String,
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    pub orientation: EulerAngles,
    pub angular_velocity: Vec3,
    pub algorithm: DeadReckoningAlgorithm,
    pub appearance: u32,
    pub handle: Option<EntityHandle>,
    pub sensors: Vec<SensorSnapshot>,
}

impl EntitySnapshot {
    pub fn new(player_id: u16, type_name: impl Into<String>) -> Self {
        Self {
            player_id,
            type_name: type_name.into(),
            force_id: ForceId::Other,
            marking: String::new(),
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            orientation: EulerAngles::default(),
            angular_velocity: Vec3::ZERO,
            algorithm: DeadReckoningAlgorithm::Fpw,
            appearance: 0,
            handle: None,
            sensors: Vec::new(),
        }
    }
}

/// An emitting sensor carried by a local entity
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSnapshot {
    /// Matched against the emission handler table
    pub sensor_type_id: String,
    pub emitter_id: u8,
    /// Location relative to the entity's body origin
    pub location: Vec3,
    pub parameters: FundamentalParameters,
    /// An inactive sensor is published with no beams
    pub active: bool,
    pub targets: Vec<EntityId>,
}

/// Weapon release by a local entity
#[derive(Debug, Clone, PartialEq)]
pub struct FireEvent {
    pub shooter: u16,
    pub target: EntityId,
    /// Player id of the munition when it is simulated as an entity, else 0
    pub munition: u16,
    pub munition_type: EntityTypeCode,
    pub location: Vec3,
    pub velocity: Vec3,
    pub range: f32,
}

/// Munition detonation caused by a local entity
#[derive(Debug, Clone, PartialEq)]
pub struct DetonationEvent {
    pub shooter: u16,
    pub target: EntityId,
    pub munition: u16,
    pub munition_type: EntityTypeCode,
    pub location: Vec3,
    pub velocity: Vec3,
    pub location_in_entity: Vec3,
    pub result: u8,
}

/// Events the simulation wants sent this cycle
#[derive(Debug, Clone, PartialEq)]
pub enum OutgoingEvent {
    Fire(FireEvent),
    Detonation(DetonationEvent),
    Comment { receiving: EntityId, lines: Vec<String> },
}

/// Collaborator the engine publishes from and applies updates to
pub trait Simulation {
    /// Local entities to publish this cycle
    fn publishable_entities(&self) -> Vec<EntitySnapshot>;

    /// Ownship position used for range filtering; `None` disables distance
    /// filtering but zero-range exclusions still apply.
    fn ownship_position(&self) -> Option<Vec3>;

    /// Accepted entity-state update. The returned handle is stored on the NIB.
    fn on_entity_state_update(&mut self, _nib: &Nib, _state: &EntityStatePdu) -> Option<EntityHandle> {
        None
    }

    /// An input entity was deactivated, filtered out or reaped.
    fn on_entity_removed(&mut self, _nib: &Nib) {}

    fn on_fire_event(&mut self, _fire: &FirePdu, _firing: Option<&Nib>, _target: Option<&Nib>) {}

    fn on_detonation_event(
        &mut self,
        _detonation: &DetonationPdu,
        _firing: Option<&Nib>,
        _target: Option<&Nib>,
    ) {
    }

    fn on_emission_update(&mut self, _nib: &Nib, _emission: &ElectromagneticEmissionPdu) {}

    fn on_signal(&mut self, _signal: &SignalPdu) {}

    fn on_transmitter(&mut self, _transmitter: &TransmitterPdu) {}

    /// Returns whether the simulation is able to comply.
    fn on_start(&mut self, _start: &StartResumePdu) -> bool {
        true
    }

    /// Returns whether the simulation is able to comply.
    fn on_stop(&mut self, _stop: &StopFreezePdu) -> bool {
        true
    }

    fn on_acknowledge(&mut self, _ack: &AcknowledgePdu) {}

    /// Status and datums for the action response.
    fn on_action_request(&mut self, _request: &ActionRequestPdu) -> (RequestStatus, DatumRecords) {
        (RequestStatus::Rejected, DatumRecords::default())
    }

    fn on_action_response(&mut self, _response: &ActionResponsePdu) {}

    /// Datums answering a data query.
    fn on_data_query(&mut self, _query: &DataQueryPdu) -> DatumRecords {
        DatumRecords::default()
    }

    fn on_data(&mut self, _data: &DataPdu) {}

    fn on_comment(&mut self, _comment: &CommentPdu) {}

    /// PDU types with no registered handler.
    fn on_unknown_pdu(&mut self, _header: &PduHeader, _pdu: &[u8]) {}

    /// Drains events queued since the last cycle.
    fn take_outgoing_events(&mut self) -> Vec<OutgoingEvent> {
        Vec::new()
    }
}
