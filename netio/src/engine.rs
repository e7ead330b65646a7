//! The NetIO engine: receive, dispatch, apply, publish
//!
//! One engine serves one DIS session. Each call to [`NetIo::run_cycle`]:
//! 1. Drains up to `max_receives_per_cycle` datagrams from the transport
//! 2. Splits each datagram into PDUs and checks version and exercise
//! 3. Routes each PDU through the type-keyed handler table
//! 4. Reaps input NIBs that have gone silent
//! 5. Publishes local entities, emissions and queued events
//!
//! A failure in one PDU is counted in [`Stats`] and logged; it never stops
//! the rest of the cycle.
//!
//! Registries are configured between construction and [`NetIo::start`].
//! Once the engine is running they are read-only and further registration
//! fails with `RegistrationClosed`.

use crate::dead_reckoning::{DrOverride, DrParams, DrState, DrTable};
use crate::emission::{
    EmissionHandlerTable, EmissionPduHandler, EmissionThresholds, DEFAULT_HBT_TIMEOUT_MULTIPLIER,
    DEFAULT_MAX_EMISSION_HANDLERS, DEFAULT_MAX_TRACK_JAM_TARGETS,
};
use crate::error::{NetIoError, Result};
use crate::federate::{make_federate_name, make_federation_name};
use crate::handlers::{default_handlers, HandlerFn};
use crate::nib::{IoType, Nib, NibKey, NibRegistry};
use crate::ntm::{NtmRegistry, TypeDescriptor};
use crate::simulation::{DetonationEvent, EntitySnapshot, FireEvent, OutgoingEvent, Simulation};
use crate::transport::Transport;
use log::{debug, error, info, trace, warn};
use pdu::enums::appearance;
use pdu::{
    decode_header, encode_pdu, peek_version, split_pdus, BurstDescriptor, CommentPdu,
    DatumRecords, DeadReckoningParameters, DetonationPdu, ElectromagneticEmissionPdu,
    EmitterBeam, EmitterSystem, EntityId, EntityStatePdu, EntityTypeCode, EventId, FirePdu,
    Marking, PduBody, PduType, ProtocolVersion, Timestamp, TrackJamTarget, VariableDatum,
    MAX_PDU_SIZE,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::{SystemTime, UNIX_EPOCH};

/// Largest datagram read from the transport
pub const MAX_DATAGRAM_SIZE: usize = MAX_PDU_SIZE;

/// Session settings fixed for the life of an engine
#[derive(Debug, Clone, PartialEq)]
pub struct NetIoSettings {
    pub version: ProtocolVersion,
    pub site_id: u16,
    pub application_id: u16,
    pub exercise_id: u8,
    /// Cap on NIBs per direction
    pub max_nibs: usize,
    /// Refuse input entities whose type has no mapping
    pub require_resolved_type: bool,
    pub max_receives_per_cycle: usize,
    /// Stamp PDUs with wall-clock time instead of simulation time
    pub absolute_timestamps: bool,
    /// Seconds between unchanged emission PDUs
    pub ee_heartbeat: f64,
    /// Remote emitters silent for `ee_heartbeat` times this are dropped
    pub hbt_timeout_multiplier: f64,
    pub ee_thresholds: EmissionThresholds,
    /// Beams tracking more targets than this are sent in high-density mode
    pub max_track_jam_targets: usize,
    pub max_emission_handlers: usize,
}

impl Default for NetIoSettings {
    fn default() -> Self {
        Self {
            version: ProtocolVersion::Ieee1278_1A,
            site_id: 1,
            application_id: 1,
            exercise_id: 1,
            max_nibs: 1000,
            require_resolved_type: false,
            max_receives_per_cycle: 100,
            absolute_timestamps: false,
            ee_heartbeat: 10.0,
            hbt_timeout_multiplier: DEFAULT_HBT_TIMEOUT_MULTIPLIER,
            ee_thresholds: EmissionThresholds::default(),
            max_track_jam_targets: DEFAULT_MAX_TRACK_JAM_TARGETS,
            max_emission_handlers: DEFAULT_MAX_EMISSION_HANDLERS,
        }
    }
}

/// Where the engine is within a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    Receiving,
    Decoding,
    Routing,
    Applying,
}

/// Counters for everything the engine drops, filters or sends
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    pub cycles: u64,
    pub datagrams_received: u64,
    pub pdus_received: u64,
    pub pdus_applied: u64,
    pub malformed: u64,
    pub unsupported_version: u64,
    pub wrong_exercise: u64,
    pub own_pdus: u64,
    pub unknown_type: u64,
    pub not_addressed: u64,
    pub filtered_by_range: u64,
    pub updates_suppressed: u64,
    pub capacity_rejected: u64,
    pub type_unresolved: u64,
    pub emitters_unmatched: u64,
    pub emissions_without_entity: u64,
    pub emissions_expired: u64,
    pub entities_removed: u64,
    pub entities_reaped: u64,
    pub outputs_unresolved: u64,
    pub pdus_sent: u64,
    pub responses_sent: u64,
    pub send_failures: u64,
    pub encode_failures: u64,
    pub other_errors: u64,
}

impl Stats {
    /// Counts a per-PDU failure.
    fn record(&mut self, e: &NetIoError) {
        match e {
            NetIoError::MalformedPdu(_) => {
                warn!("Dropping PDU: {}", e);
                self.malformed += 1;
            }
            NetIoError::UnsupportedVersion { .. } => {
                warn!("Dropping PDU: {}", e);
                self.unsupported_version += 1;
            }
            NetIoError::CapacityExceeded { .. } => {
                warn!("Dropping PDU: {}", e);
                self.capacity_rejected += 1;
            }
            NetIoError::TypeUnresolved(_) => {
                debug!("Dropping PDU: {}", e);
                self.type_unresolved += 1;
            }
            NetIoError::Encode(_) => {
                warn!("{}", e);
                self.encode_failures += 1;
            }
            _ => {
                warn!("PDU handler failed: {}", e);
                self.other_errors += 1;
            }
        }
    }
}

/// DIS network interface for one session
pub struct NetIo<T: Transport, S: Simulation> {
    pub(crate) settings: NetIoSettings,
    pub(crate) ntms: NtmRegistry,
    pub(crate) dr_table: DrTable,
    pub(crate) emission_handlers: EmissionHandlerTable,
    pub(crate) nibs: NibRegistry,
    pub(crate) simulation: S,
    pub(crate) stats: Stats,
    transport: T,
    handlers: HashMap<PduType, HandlerFn<T, S>>,
    running: bool,
    phase: CyclePhase,
    next_event_number: u16,
    /// Event numbers of fired munitions, reused by their detonation
    fire_events: BTreeMap<u16, u16>,
}

impl<T: Transport, S: Simulation> NetIo<T, S> {
    pub fn new(settings: NetIoSettings, transport: T, simulation: S) -> Self {
        Self {
            ntms: NtmRegistry::new(),
            dr_table: DrTable::default(),
            emission_handlers: EmissionHandlerTable::new(settings.max_emission_handlers),
            nibs: NibRegistry::new(settings.max_nibs),
            simulation,
            stats: Stats::default(),
            transport,
            handlers: default_handlers(),
            running: false,
            phase: CyclePhase::Idle,
            next_event_number: 1,
            fire_events: BTreeMap::new(),
            settings,
        }
    }

    fn ensure_registration_open(&self) -> Result<()> {
        if self.running {
            return Err(NetIoError::RegistrationClosed);
        }
        Ok(())
    }

    /// Sets the session protocol version (0 ..= 7).
    pub fn set_version(&mut self, version: u8) -> Result<()> {
        self.ensure_registration_open()?;
        self.settings.version = ProtocolVersion::from_u8(version).ok_or_else(|| {
            NetIoError::InvalidConfig(format!("unsupported DIS version {}", version))
        })?;
        Ok(())
    }

    pub fn register_ntm(&mut self, code: EntityTypeCode, descriptor: TypeDescriptor) -> Result<()> {
        self.ensure_registration_open()?;
        self.ntms.register(code, descriptor)
    }

    pub fn configure_dr_default(&mut self, params: DrParams) -> Result<()> {
        self.ensure_registration_open()?;
        self.dr_table.configure_default(params);
        Ok(())
    }

    pub fn configure_dr_override(
        &mut self,
        kind: u8,
        domain: Option<u8>,
        values: impl Into<DrOverride>,
    ) -> Result<()> {
        self.ensure_registration_open()?;
        self.dr_table.configure_override(kind, domain, values);
        Ok(())
    }

    pub fn add_emission_handler(&mut self, handler: EmissionPduHandler) -> Result<()> {
        self.ensure_registration_open()?;
        self.emission_handlers.add(handler)
    }

    /// Installs or replaces the handler for one PDU type.
    pub fn register_handler(&mut self, pdu_type: PduType, handler: HandlerFn<T, S>) -> Result<()> {
        self.ensure_registration_open()?;
        self.handlers.insert(pdu_type, handler);
        Ok(())
    }

    /// Opens the transport and closes registration.
    pub fn start(&mut self) -> Result<()> {
        if self.running {
            return Ok(());
        }
        let federation = make_federation_name(self.settings.exercise_id)?;
        self.transport.open()?;
        self.running = true;
        info!(
            "Federate {} joined federation {} (DIS version {})",
            self.federate_name(),
            federation,
            self.settings.version.as_u8()
        );
        Ok(())
    }

    /// Closes the transport. Registries and NIBs are kept.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.transport.close();
        self.running = false;
        info!("Federate {} left the federation", self.federate_name());
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    fn set_phase(&mut self, phase: CyclePhase) {
        trace!("{:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    pub fn federate_name(&self) -> String {
        make_federate_name(self.settings.site_id, self.settings.application_id)
    }

    pub fn federation_name(&self) -> Result<String> {
        make_federation_name(self.settings.exercise_id)
    }

    /// Runs one full processing cycle at simulation time `now` (seconds).
    pub fn run_cycle(&mut self, now: f64) -> Result<()> {
        if !self.running {
            return Err(NetIoError::NotRunning);
        }
        self.stats.cycles += 1;

        for _ in 0..self.settings.max_receives_per_cycle {
            self.set_phase(CyclePhase::Receiving);
            let Some(datagram) = self.transport.receive(MAX_DATAGRAM_SIZE) else {
                break;
            };
            self.stats.datagrams_received += 1;
            self.process_datagram(&datagram, now);
        }
        self.set_phase(CyclePhase::Idle);

        for nib in self.nibs.reap(now, &self.dr_table) {
            self.stats.entities_reaped += 1;
            self.simulation.on_entity_removed(&nib);
        }
        self.expire_emissions(now);

        self.publish(now);
        Ok(())
    }

    /// Drops emitter state of input entities whose emissions went quiet.
    fn expire_emissions(&mut self, now: f64) {
        let timeout = self.settings.ee_heartbeat * self.settings.hbt_timeout_multiplier;
        for nib in self.nibs.iter_mut(IoType::Input) {
            let Some(heard) = nib.last_emission else {
                continue;
            };
            if now - heard > timeout && !nib.emitters.is_empty() {
                debug!(
                    "Emitters of {:?} silent for {:.1}s, dropping them",
                    nib.key,
                    now - heard
                );
                nib.emitters.clear();
                nib.last_emission = None;
                self.stats.emissions_expired += 1;
            }
        }
    }

    /// Processes every PDU bundled in one datagram.
    pub fn process_datagram(&mut self, datagram: &[u8], now: f64) {
        self.set_phase(CyclePhase::Decoding);
        for pdu in split_pdus(datagram) {
            match pdu {
                Ok(bytes) => self.process_pdu(bytes, now),
                Err(e) => {
                    self.stats.pdus_received += 1;
                    self.stats.record(&NetIoError::MalformedPdu(e));
                }
            }
        }
    }

    fn process_pdu(&mut self, bytes: &[u8], now: f64) {
        self.stats.pdus_received += 1;
        self.set_phase(CyclePhase::Decoding);

        let found = peek_version(bytes).unwrap_or(0);
        if found != self.settings.version.as_u8() {
            self.stats.record(&NetIoError::UnsupportedVersion {
                expected: self.settings.version.as_u8(),
                found,
            });
            return;
        }

        let (header, body) = match decode_header(bytes) {
            Ok(decoded) => decoded,
            Err(e) => {
                self.stats.record(&NetIoError::from(e));
                return;
            }
        };
        if header.exercise_id != self.settings.exercise_id {
            debug!("Ignoring PDU for exercise {}", header.exercise_id);
            self.stats.wrong_exercise += 1;
            return;
        }

        self.set_phase(CyclePhase::Routing);
        let Some(handler) = self.handlers.get(&header.pdu_type).copied() else {
            debug!("{}", NetIoError::UnknownPduType(header.pdu_type.as_u8()));
            self.stats.unknown_type += 1;
            self.simulation.on_unknown_pdu(&header, bytes);
            return;
        };

        self.set_phase(CyclePhase::Applying);
        match handler(self, &header, body, now) {
            Ok(()) => self.stats.pdus_applied += 1,
            Err(e) => self.stats.record(&e),
        }
    }

    pub(crate) fn own_ids(&self) -> (u16, u16) {
        (self.settings.site_id, self.settings.application_id)
    }

    pub(crate) fn own_entity_id(&self) -> EntityId {
        EntityId::new(self.settings.site_id, self.settings.application_id, 0)
    }

    pub(crate) fn is_own_entity(&self, id: EntityId) -> bool {
        (id.site, id.application) == self.own_ids()
    }

    /// Receiving site and application each match ours or are the wildcard.
    pub(crate) fn is_addressed_to_us(&self, receiving: EntityId) -> bool {
        let matches = |field: u16, ours: u16| field == ours || field == EntityId::ALL;
        matches(receiving.site, self.settings.site_id)
            && matches(receiving.application, self.settings.application_id)
    }

    fn timestamp(&self, now: f64) -> Timestamp {
        if self.settings.absolute_timestamps {
            let wall = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs_f64())
                .unwrap_or(now);
            Timestamp::from_seconds(wall, true)
        } else {
            Timestamp::from_seconds(now, false)
        }
    }

    /// Encodes and sends one PDU, counting the outcome.
    pub fn send_pdu<B: PduBody>(&mut self, body: &B, now: f64) -> bool {
        let bytes = match encode_pdu(
            self.settings.version,
            self.settings.exercise_id,
            self.timestamp(now),
            body,
        ) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.stats.record(&NetIoError::from(e));
                return false;
            }
        };
        if self.transport.send(&bytes) {
            self.stats.pdus_sent += 1;
            true
        } else {
            error!("Transport failed to send {:?} PDU", B::PDU_TYPE);
            self.stats.send_failures += 1;
            false
        }
    }

    pub(crate) fn send_response<B: PduBody>(&mut self, body: &B, now: f64) {
        if self.send_pdu(body, now) {
            self.stats.responses_sent += 1;
        }
    }

    fn next_event_id(&mut self) -> EventId {
        let number = self.next_event_number;
        self.next_event_number = match number.wrapping_add(1) {
            0 => 1,
            n => n,
        };
        EventId {
            site: self.settings.site_id,
            application: self.settings.application_id,
            event_number: number,
        }
    }

    fn local_entity(&self, player: u16) -> EntityId {
        EntityId::new(self.settings.site_id, self.settings.application_id, player)
    }

    /// Send side of the cycle: entity states, emissions, then queued events.
    pub fn publish(&mut self, now: f64) {
        let snapshots = self.simulation.publishable_entities();
        let mut seen = BTreeSet::new();
        for snapshot in &snapshots {
            seen.insert(NibKey::new(
                snapshot.player_id,
                self.settings.site_id,
                self.settings.application_id,
            ));
            self.publish_entity(snapshot, now);
        }

        let gone: Vec<NibKey> = self
            .nibs
            .keys(IoType::Output)
            .into_iter()
            .filter(|key| !seen.contains(key))
            .collect();
        for key in gone {
            if let Some(nib) = self.nibs.remove(IoType::Output, &key) {
                let mut pdu = entity_state_from_nib(&nib);
                pdu.appearance |= appearance::DEACTIVATED;
                self.send_pdu(&pdu, now);
            }
        }

        for event in self.simulation.take_outgoing_events() {
            self.send_event(event, now);
        }
    }

    fn publish_entity(&mut self, snapshot: &EntitySnapshot, now: f64) {
        let key = NibKey::new(
            snapshot.player_id,
            self.settings.site_id,
            self.settings.application_id,
        );
        let Some(code) = self
            .ntms
            .lookup_by_descriptor(&snapshot.type_name)
            .map(|ntm| ntm.code)
        else {
            debug!("No DIS type for local type {:?}", snapshot.type_name);
            self.stats.outputs_unresolved += 1;
            return;
        };
        let systems = self.emitter_systems(snapshot);

        let (nib, _created) =
            match self
                .nibs
                .find_or_create(IoType::Output, key, code, &self.ntms, false)
            {
                Ok(found) => found,
                Err(e) => {
                    self.stats.record(&e);
                    return;
                }
            };
        nib.descriptor = Some(TypeDescriptor::new(snapshot.type_name.clone()));
        nib.type_unresolved = false;
        nib.entity_type = code;
        nib.last_heard = now;
        nib.force_id = snapshot.force_id;
        nib.marking = Marking::ascii(&snapshot.marking);
        nib.appearance = snapshot.appearance;
        nib.handle = snapshot.handle;

        let state = if self
            .dr_table
            .should_send(nib, &snapshot.position, &snapshot.orientation, now)
        {
            nib.dead_reckoning = Some(DrState {
                algorithm: snapshot.algorithm,
                position: snapshot.position,
                velocity: snapshot.velocity,
                acceleration: snapshot.acceleration,
                orientation: snapshot.orientation,
                angular_velocity: snapshot.angular_velocity,
                time: now,
            });
            nib.last_sent = Some(now);
            Some(entity_state_from_nib(nib))
        } else {
            None
        };

        let changed = self
            .settings
            .ee_thresholds
            .systems_changed(&nib.emitters, &systems);
        let heartbeat_due = nib
            .last_emission
            .map_or(true, |sent| now - sent >= self.settings.ee_heartbeat);
        let emission = if changed || (heartbeat_due && !systems.is_empty()) {
            nib.emitters = systems;
            nib.last_emission = Some(now);
            Some((
                nib.entity_id(),
                if changed {
                    ElectromagneticEmissionPdu::STATE_CHANGED
                } else {
                    ElectromagneticEmissionPdu::STATE_HEARTBEAT
                },
                nib.emitters.values().cloned().collect::<Vec<_>>(),
            ))
        } else {
            None
        };

        if let Some(pdu) = state {
            self.send_pdu(&pdu, now);
        }
        if let Some((emitting_entity, state_update, systems)) = emission {
            let pdu = ElectromagneticEmissionPdu {
                emitting_entity,
                event_id: self.next_event_id(),
                state_update,
                systems,
            };
            self.send_pdu(&pdu, now);
        }
    }

    /// Emitter systems for the snapshot's sensors that have a handler.
    fn emitter_systems(&mut self, snapshot: &EntitySnapshot) -> BTreeMap<u8, EmitterSystem> {
        let mut systems = BTreeMap::new();
        for sensor in &snapshot.sensors {
            let Some(handler) = self
                .emission_handlers
                .find_by_local_sensor(&sensor.sensor_type_id)
            else {
                self.stats.emitters_unmatched += 1;
                continue;
            };
            let beams = if sensor.active {
                let high_density = sensor.targets.len() > self.settings.max_track_jam_targets;
                let targets = if high_density {
                    Vec::new()
                } else {
                    sensor
                        .targets
                        .iter()
                        .map(|&entity| TrackJamTarget {
                            entity,
                            emitter_id: 0,
                            beam_id: 0,
                        })
                        .collect()
                };
                vec![EmitterBeam {
                    beam_id: 1,
                    parameters: sensor.parameters,
                    beam_function: handler.beam_function,
                    high_density_track_jam: u8::from(high_density),
                    targets,
                    ..Default::default()
                }]
            } else {
                Vec::new()
            };
            systems.insert(
                sensor.emitter_id,
                EmitterSystem {
                    emitter_name: handler.emitter_name,
                    function: handler.emitter_function,
                    emitter_id: sensor.emitter_id,
                    location: sensor.location,
                    beams,
                },
            );
        }
        systems
    }

    fn send_event(&mut self, event: OutgoingEvent, now: f64) {
        match event {
            OutgoingEvent::Fire(fire) => {
                let pdu = self.fire_pdu(fire);
                self.send_pdu(&pdu, now);
            }
            OutgoingEvent::Detonation(detonation) => {
                let pdu = self.detonation_pdu(detonation);
                self.send_pdu(&pdu, now);
            }
            OutgoingEvent::Comment { receiving, lines } => {
                let pdu = CommentPdu {
                    originating: self.own_entity_id(),
                    receiving,
                    data: DatumRecords {
                        fixed: Vec::new(),
                        variable: lines
                            .iter()
                            .map(|line| VariableDatum::text(COMMENT_DATUM_ID, line))
                            .collect(),
                    },
                };
                self.send_pdu(&pdu, now);
            }
        }
    }

    fn munition_entity(&self, player: u16) -> EntityId {
        if player == 0 {
            EntityId::default()
        } else {
            self.local_entity(player)
        }
    }

    fn fire_pdu(&mut self, fire: FireEvent) -> FirePdu {
        let event_id = self.next_event_id();
        if fire.munition != 0 {
            self.fire_events.insert(fire.munition, event_id.event_number);
        }
        FirePdu {
            firing_entity: self.local_entity(fire.shooter),
            target_entity: fire.target,
            munition_entity: self.munition_entity(fire.munition),
            event_id,
            fire_mission_index: 0,
            location: fire.location,
            burst: burst(fire.munition_type),
            velocity: fire.velocity,
            range: fire.range,
        }
    }

    fn detonation_pdu(&mut self, detonation: DetonationEvent) -> DetonationPdu {
        let event_id = match self.fire_events.remove(&detonation.munition) {
            Some(event_number) if detonation.munition != 0 => EventId {
                site: self.settings.site_id,
                application: self.settings.application_id,
                event_number,
            },
            _ => self.next_event_id(),
        };
        DetonationPdu {
            firing_entity: self.local_entity(detonation.shooter),
            target_entity: detonation.target,
            munition_entity: self.munition_entity(detonation.munition),
            event_id,
            velocity: detonation.velocity,
            location: detonation.location,
            burst: burst(detonation.munition_type),
            location_in_entity: detonation.location_in_entity,
            result: detonation.result,
            articulation: Vec::new(),
        }
    }

    pub fn settings(&self) -> &NetIoSettings {
        &self.settings
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn nibs(&self) -> &NibRegistry {
        &self.nibs
    }

    pub fn ntms(&self) -> &NtmRegistry {
        &self.ntms
    }

    pub fn dr_table(&self) -> &DrTable {
        &self.dr_table
    }

    pub fn emission_handlers(&self) -> &EmissionHandlerTable {
        &self.emission_handlers
    }

    pub fn simulation(&self) -> &S {
        &self.simulation
    }

    pub fn simulation_mut(&mut self) -> &mut S {
        &mut self.simulation
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

/// Datum id carried by outgoing comment text
const COMMENT_DATUM_ID: u32 = 0;

fn burst(munition: EntityTypeCode) -> BurstDescriptor {
    BurstDescriptor {
        munition,
        warhead: 0,
        fuse: 0,
        quantity: 1,
        rate: 0,
    }
}

/// Entity-state PDU for an output NIB from its current baseline.
fn entity_state_from_nib(nib: &Nib) -> EntityStatePdu {
    let baseline = nib.dead_reckoning.unwrap_or_default();
    EntityStatePdu {
        entity_id: nib.entity_id(),
        force_id: nib.force_id,
        entity_type: nib.entity_type,
        alternative_type: nib.entity_type,
        linear_velocity: baseline.velocity,
        location: baseline.position,
        orientation: baseline.orientation,
        appearance: nib.appearance,
        dead_reckoning: DeadReckoningParameters {
            algorithm: baseline.algorithm,
            other: [0; 15],
            linear_acceleration: baseline.acceleration,
            angular_velocity: baseline.angular_velocity,
        },
        marking: nib.marking.clone(),
        capabilities: 0,
        articulation: Vec::new(),
    }
}
