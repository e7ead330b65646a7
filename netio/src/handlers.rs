//! Per-PDU-type handlers and the default dispatch table.
//!
//! Each handler decodes one body type and applies it to the engine. Any
//! entry can be replaced through [`NetIo::register_handler`] without
//! touching the others.

use crate::dead_reckoning::DrState;
use crate::engine::NetIo;
use crate::error::Result;
use crate::nib::{IoType, Nib, NibKey, NibRegistry};
use crate::simulation::Simulation;
use crate::transport::Transport;
use log::debug;
use pdu::enums::{acknowledge_flag, response_flag};
use pdu::{
    AcknowledgePdu, ActionRequestPdu, ActionRequestRPdu, ActionResponsePdu, ActionResponseRPdu,
    CommentPdu, DataPdu, DataQueryPdu, DetonationPdu, ElectromagneticEmissionPdu, EntityId,
    EntityStatePdu, FirePdu, PduBody, PduHeader, PduType, SignalPdu, StartResumePdu,
    StopFreezePdu, TransmitterPdu,
};
use std::collections::HashMap;

/// Decodes a PDU body and applies it
pub type HandlerFn<T, S> = fn(&mut NetIo<T, S>, &PduHeader, &[u8], f64) -> Result<()>;

/// Handlers for every PDU type the engine understands out of the box
pub fn default_handlers<T: Transport, S: Simulation>() -> HashMap<PduType, HandlerFn<T, S>> {
    let mut table: HashMap<PduType, HandlerFn<T, S>> = HashMap::new();
    table.insert(PduType::EntityState, entity_state);
    table.insert(PduType::Fire, fire);
    table.insert(PduType::Detonation, detonation);
    table.insert(PduType::ElectromagneticEmission, emission);
    table.insert(PduType::Signal, signal);
    table.insert(PduType::Transmitter, transmitter);
    table.insert(PduType::StartResume, start_resume);
    table.insert(PduType::StopFreeze, stop_freeze);
    table.insert(PduType::Acknowledge, acknowledge);
    table.insert(PduType::ActionRequest, action_request);
    table.insert(PduType::ActionRequestR, action_request_r);
    table.insert(PduType::ActionResponse, action_response);
    table.insert(PduType::ActionResponseR, action_response_r);
    table.insert(PduType::DataQuery, data_query);
    table.insert(PduType::Data, data);
    table.insert(PduType::Comment, comment);
    table
}

/// Input NIB for a remote entity, output NIB for one of ours
fn find_nib<'a>(nibs: &'a NibRegistry, own: (u16, u16), id: EntityId) -> Option<&'a Nib> {
    let io = if (id.site, id.application) == own {
        IoType::Output
    } else {
        IoType::Input
    };
    nibs.find(io, &NibKey::from(id))
}

fn touch(nibs: &mut NibRegistry, id: EntityId, now: f64) {
    if let Some(nib) = nibs.find_mut(IoType::Input, &NibKey::from(id)) {
        nib.last_heard = now;
    }
}

fn remove_input<T: Transport, S: Simulation>(io: &mut NetIo<T, S>, key: &NibKey) {
    if let Some(nib) = io.nibs.remove(IoType::Input, key) {
        io.stats.entities_removed += 1;
        io.simulation.on_entity_removed(&nib);
    }
}

fn is_own<T: Transport, S: Simulation>(io: &mut NetIo<T, S>, id: EntityId) -> bool {
    if io.is_own_entity(id) {
        io.stats.own_pdus += 1;
        return true;
    }
    false
}

fn entity_state<T: Transport, S: Simulation>(
    io: &mut NetIo<T, S>,
    _header: &PduHeader,
    body: &[u8],
    now: f64,
) -> Result<()> {
    let pdu = EntityStatePdu::decode(body)?;
    if is_own(io, pdu.entity_id) {
        return Ok(());
    }
    let key = NibKey::from(pdu.entity_id);

    if pdu.is_deactivated() {
        debug!("{:?} deactivated", key);
        remove_input(io, &key);
        return Ok(());
    }

    let (kind, domain) = (pdu.entity_type.kind, pdu.entity_type.domain);
    let ownship = io.simulation.ownship_position().unwrap_or(pdu.location);
    if !io
        .dr_table
        .is_within_range(&ownship, &pdu.location, kind, domain)
    {
        debug!("{:?} ({}) outside range", key, pdu.entity_type);
        io.stats.filtered_by_range += 1;
        remove_input(io, &key);
        return Ok(());
    }

    let (nib, _created) = io.nibs.find_or_create(
        IoType::Input,
        key,
        pdu.entity_type,
        &io.ntms,
        io.settings.require_resolved_type,
    )?;
    nib.last_heard = now;
    nib.force_id = pdu.force_id;
    nib.appearance = pdu.appearance;
    nib.marking = pdu.marking.clone();

    if !io
        .dr_table
        .should_accept_update(nib, &pdu.location, &pdu.orientation, now)
    {
        io.stats.updates_suppressed += 1;
        return Ok(());
    }

    nib.dead_reckoning = Some(DrState {
        algorithm: pdu.dead_reckoning.algorithm,
        position: pdu.location,
        velocity: pdu.linear_velocity,
        acceleration: pdu.dead_reckoning.linear_acceleration,
        orientation: pdu.orientation,
        angular_velocity: pdu.dead_reckoning.angular_velocity,
        time: now,
    });
    if let Some(handle) = io.simulation.on_entity_state_update(nib, &pdu) {
        nib.handle = Some(handle);
    }
    Ok(())
}

fn fire<T: Transport, S: Simulation>(
    io: &mut NetIo<T, S>,
    _header: &PduHeader,
    body: &[u8],
    now: f64,
) -> Result<()> {
    let pdu = FirePdu::decode(body)?;
    if is_own(io, pdu.firing_entity) {
        return Ok(());
    }
    touch(&mut io.nibs, pdu.firing_entity, now);

    let own = io.own_ids();
    let firing = find_nib(&io.nibs, own, pdu.firing_entity);
    let target = find_nib(&io.nibs, own, pdu.target_entity);
    io.simulation.on_fire_event(&pdu, firing, target);
    Ok(())
}

fn detonation<T: Transport, S: Simulation>(
    io: &mut NetIo<T, S>,
    _header: &PduHeader,
    body: &[u8],
    now: f64,
) -> Result<()> {
    let pdu = DetonationPdu::decode(body)?;
    if is_own(io, pdu.firing_entity) {
        return Ok(());
    }
    touch(&mut io.nibs, pdu.firing_entity, now);

    {
        let own = io.own_ids();
        let firing = find_nib(&io.nibs, own, pdu.firing_entity);
        let target = find_nib(&io.nibs, own, pdu.target_entity);
        io.simulation.on_detonation_event(&pdu, firing, target);
    }

    // The munition entity ends with its detonation
    if !pdu.munition_entity.is_none() {
        remove_input(io, &NibKey::from(pdu.munition_entity));
    }
    Ok(())
}

fn emission<T: Transport, S: Simulation>(
    io: &mut NetIo<T, S>,
    _header: &PduHeader,
    body: &[u8],
    now: f64,
) -> Result<()> {
    let pdu = ElectromagneticEmissionPdu::decode(body)?;
    if is_own(io, pdu.emitting_entity) {
        return Ok(());
    }
    let key = NibKey::from(pdu.emitting_entity);
    let Some(nib) = io.nibs.find_mut(IoType::Input, &key) else {
        debug!("Emission from unknown entity {:?}", key);
        io.stats.emissions_without_entity += 1;
        return Ok(());
    };
    nib.last_heard = now;
    nib.last_emission = Some(now);

    for system in &pdu.systems {
        if io
            .emission_handlers
            .find_by_emitter_name(system.emitter_name)
            .is_none()
        {
            debug!("No handler for emitter name {}", system.emitter_name);
            io.stats.emitters_unmatched += 1;
            continue;
        }
        if system.beams.is_empty() {
            nib.emitters.remove(&system.emitter_id);
        } else {
            nib.emitters.insert(system.emitter_id, system.clone());
        }
    }
    io.simulation.on_emission_update(nib, &pdu);
    Ok(())
}

fn signal<T: Transport, S: Simulation>(
    io: &mut NetIo<T, S>,
    _header: &PduHeader,
    body: &[u8],
    now: f64,
) -> Result<()> {
    let pdu = SignalPdu::decode(body)?;
    if is_own(io, pdu.entity_id) {
        return Ok(());
    }
    touch(&mut io.nibs, pdu.entity_id, now);
    io.simulation.on_signal(&pdu);
    Ok(())
}

fn transmitter<T: Transport, S: Simulation>(
    io: &mut NetIo<T, S>,
    _header: &PduHeader,
    body: &[u8],
    now: f64,
) -> Result<()> {
    let pdu = TransmitterPdu::decode(body)?;
    if is_own(io, pdu.entity_id) {
        return Ok(());
    }
    if let Some(nib) = io
        .nibs
        .find_mut(IoType::Input, &NibKey::from(pdu.entity_id))
    {
        nib.last_heard = now;
        nib.radios.insert(pdu.radio_id, pdu.transmit_state);
    }
    io.simulation.on_transmitter(&pdu);
    Ok(())
}

/// Simulation-management PDUs are acted on only when addressed to us.
fn addressed<T: Transport, S: Simulation>(io: &mut NetIo<T, S>, receiving: EntityId) -> bool {
    if io.is_addressed_to_us(receiving) {
        return true;
    }
    io.stats.not_addressed += 1;
    false
}

fn reply_flag(able: bool) -> u16 {
    if able {
        response_flag::ABLE_TO_COMPLY
    } else {
        response_flag::UNABLE_TO_COMPLY
    }
}

fn start_resume<T: Transport, S: Simulation>(
    io: &mut NetIo<T, S>,
    _header: &PduHeader,
    body: &[u8],
    now: f64,
) -> Result<()> {
    let pdu = StartResumePdu::decode(body)?;
    if !addressed(io, pdu.receiving) {
        return Ok(());
    }
    let able = io.simulation.on_start(&pdu);
    let ack = AcknowledgePdu {
        originating: io.own_entity_id(),
        receiving: pdu.originating,
        acknowledge_flag: acknowledge_flag::START_RESUME,
        response_flag: reply_flag(able),
        request_id: pdu.request_id,
    };
    io.send_response(&ack, now);
    Ok(())
}

fn stop_freeze<T: Transport, S: Simulation>(
    io: &mut NetIo<T, S>,
    _header: &PduHeader,
    body: &[u8],
    now: f64,
) -> Result<()> {
    let pdu = StopFreezePdu::decode(body)?;
    if !addressed(io, pdu.receiving) {
        return Ok(());
    }
    let able = io.simulation.on_stop(&pdu);
    let ack = AcknowledgePdu {
        originating: io.own_entity_id(),
        receiving: pdu.originating,
        acknowledge_flag: acknowledge_flag::STOP_FREEZE,
        response_flag: reply_flag(able),
        request_id: pdu.request_id,
    };
    io.send_response(&ack, now);
    Ok(())
}

fn acknowledge<T: Transport, S: Simulation>(
    io: &mut NetIo<T, S>,
    _header: &PduHeader,
    body: &[u8],
    _now: f64,
) -> Result<()> {
    let pdu = AcknowledgePdu::decode(body)?;
    if addressed(io, pdu.receiving) {
        io.simulation.on_acknowledge(&pdu);
    }
    Ok(())
}

fn action_request<T: Transport, S: Simulation>(
    io: &mut NetIo<T, S>,
    _header: &PduHeader,
    body: &[u8],
    now: f64,
) -> Result<()> {
    let pdu = ActionRequestPdu::decode(body)?;
    if !addressed(io, pdu.receiving) {
        return Ok(());
    }
    let (status, data) = io.simulation.on_action_request(&pdu);
    let response = ActionResponsePdu {
        originating: io.own_entity_id(),
        receiving: pdu.originating,
        request_id: pdu.request_id,
        status,
        data,
    };
    io.send_response(&response, now);
    Ok(())
}

fn action_request_r<T: Transport, S: Simulation>(
    io: &mut NetIo<T, S>,
    _header: &PduHeader,
    body: &[u8],
    now: f64,
) -> Result<()> {
    let pdu = ActionRequestRPdu::decode(body)?;
    if !addressed(io, pdu.receiving) {
        return Ok(());
    }
    let request = ActionRequestPdu {
        originating: pdu.originating,
        receiving: pdu.receiving,
        request_id: pdu.request_id,
        action_id: pdu.action_id,
        data: pdu.data,
    };
    let (status, data) = io.simulation.on_action_request(&request);
    let response = ActionResponseRPdu(ActionResponsePdu {
        originating: io.own_entity_id(),
        receiving: request.originating,
        request_id: request.request_id,
        status,
        data,
    });
    io.send_response(&response, now);
    Ok(())
}

fn action_response<T: Transport, S: Simulation>(
    io: &mut NetIo<T, S>,
    _header: &PduHeader,
    body: &[u8],
    _now: f64,
) -> Result<()> {
    let pdu = ActionResponsePdu::decode(body)?;
    if addressed(io, pdu.receiving) {
        io.simulation.on_action_response(&pdu);
    }
    Ok(())
}

fn action_response_r<T: Transport, S: Simulation>(
    io: &mut NetIo<T, S>,
    _header: &PduHeader,
    body: &[u8],
    _now: f64,
) -> Result<()> {
    let ActionResponseRPdu(pdu) = ActionResponseRPdu::decode(body)?;
    if addressed(io, pdu.receiving) {
        io.simulation.on_action_response(&pdu);
    }
    Ok(())
}

fn data_query<T: Transport, S: Simulation>(
    io: &mut NetIo<T, S>,
    _header: &PduHeader,
    body: &[u8],
    now: f64,
) -> Result<()> {
    let pdu = DataQueryPdu::decode(body)?;
    if !addressed(io, pdu.receiving) {
        return Ok(());
    }
    let data = io.simulation.on_data_query(&pdu);
    let reply = DataPdu {
        originating: io.own_entity_id(),
        receiving: pdu.originating,
        request_id: pdu.request_id,
        data,
    };
    io.send_response(&reply, now);
    Ok(())
}

fn data<T: Transport, S: Simulation>(
    io: &mut NetIo<T, S>,
    _header: &PduHeader,
    body: &[u8],
    _now: f64,
) -> Result<()> {
    let pdu = DataPdu::decode(body)?;
    if addressed(io, pdu.receiving) {
        io.simulation.on_data(&pdu);
    }
    Ok(())
}

fn comment<T: Transport, S: Simulation>(
    io: &mut NetIo<T, S>,
    _header: &PduHeader,
    body: &[u8],
    _now: f64,
) -> Result<()> {
    let pdu = CommentPdu::decode(body)?;
    if addressed(io, pdu.receiving) {
        io.simulation.on_comment(&pdu);
    }
    Ok(())
}
