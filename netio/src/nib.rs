//! Network interface blocks and their registry
//!
//! A NIB is the engine's per-entity synchronization record:
//! - Input NIBs mirror remote entities heard on the network
//! - Output NIBs track local entities the engine publishes
//!
//! The registry keeps one ordered map per direction, keyed by
//! (player, site, application), so lookups are logarithmic and iteration
//! order is deterministic. Each direction is capped to keep a misbehaving
//! peer from growing the tables without bound, and silent input entities
//! are reaped once per cycle.

use crate::dead_reckoning::{DrState, DrTable};
use crate::error::{NetIoError, Result};
use crate::ntm::{NtmRegistry, TypeDescriptor};
use log::{info, warn};
use pdu::{EmitterSystem, EntityId, EntityTypeCode, ForceId, Marking};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Direction of a NIB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoType {
    /// Remote entity reflected into the local simulation
    Input,
    /// Local entity published to the network
    Output,
}

/// Registry key, ordered by player, then site, then application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NibKey {
    pub player: u16,
    pub site: u16,
    pub app: u16,
}

impl NibKey {
    pub fn new(player: u16, site: u16, app: u16) -> Self {
        Self { player, site, app }
    }

    pub fn entity_id(&self) -> EntityId {
        EntityId::new(self.site, self.app, self.player)
    }
}

impl From<EntityId> for NibKey {
    fn from(id: EntityId) -> Self {
        Self::new(id.entity, id.site, id.application)
    }
}

/// Opaque reference to an entity owned by the simulation.
///
/// The simulation may delete the entity at any time; holders must treat the
/// handle as a lookup key and never assume it still resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle(pub u64);

/// Per-entity synchronization state
#[derive(Debug, Clone, PartialEq)]
pub struct Nib {
    pub io_type: IoType,
    pub key: NibKey,
    pub entity_type: EntityTypeCode,
    /// Local type the entity type resolved to
    pub descriptor: Option<TypeDescriptor>,
    /// Set when no type mapping matched at creation
    pub type_unresolved: bool,
    pub force_id: ForceId,
    pub marking: Marking,
    pub appearance: u32,
    /// Last accepted (input) or last sent (output) kinematic baseline
    pub dead_reckoning: Option<DrState>,
    /// Last time any PDU for this entity arrived, or it was seen in the
    /// publishable set for output NIBs
    pub last_heard: f64,
    /// Last time an entity-state PDU was sent for an output NIB
    pub last_sent: Option<f64>,
    /// Active emitter systems keyed by emitter id
    pub emitters: BTreeMap<u8, EmitterSystem>,
    /// Last time an emission PDU was sent (output) or received (input)
    pub last_emission: Option<f64>,
    /// Transmit state per radio id
    pub radios: BTreeMap<u16, u8>,
    pub handle: Option<EntityHandle>,
}

impl Nib {
    pub fn new(io_type: IoType, key: NibKey, entity_type: EntityTypeCode) -> Self {
        Self {
            io_type,
            key,
            entity_type,
            descriptor: None,
            type_unresolved: false,
            force_id: ForceId::Other,
            marking: Marking::default(),
            appearance: 0,
            dead_reckoning: None,
            last_heard: 0.0,
            last_sent: None,
            emitters: BTreeMap::new(),
            last_emission: None,
            radios: BTreeMap::new(),
            handle: None,
        }
    }

    pub fn entity_id(&self) -> EntityId {
        self.key.entity_id()
    }

    /// Seconds since this NIB was last heard
    pub fn age(&self, now: f64) -> f64 {
        now - self.last_heard
    }
}

/// Input and output NIBs, each direction capped at `max_nibs`
#[derive(Debug, Clone)]
pub struct NibRegistry {
    inputs: BTreeMap<NibKey, Nib>,
    outputs: BTreeMap<NibKey, Nib>,
    max_nibs: usize,
}

impl NibRegistry {
    pub fn new(max_nibs: usize) -> Self {
        Self {
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            max_nibs,
        }
    }

    fn map(&self, io: IoType) -> &BTreeMap<NibKey, Nib> {
        match io {
            IoType::Input => &self.inputs,
            IoType::Output => &self.outputs,
        }
    }

    fn map_mut(&mut self, io: IoType) -> &mut BTreeMap<NibKey, Nib> {
        match io {
            IoType::Input => &mut self.inputs,
            IoType::Output => &mut self.outputs,
        }
    }

    pub fn capacity(&self) -> usize {
        self.max_nibs
    }

    pub fn find(&self, io: IoType, key: &NibKey) -> Option<&Nib> {
        self.map(io).get(key)
    }

    pub fn find_mut(&mut self, io: IoType, key: &NibKey) -> Option<&mut Nib> {
        self.map_mut(io).get_mut(key)
    }

    /// Returns the NIB for `key`, creating it when absent
    ///
    /// A new NIB has its local type resolved through `ntm`. When nothing
    /// matches, creation fails with `TypeUnresolved` if `require_resolved`
    /// is set; otherwise the NIB is created and flagged `type_unresolved`.
    /// The boolean is true when the NIB was created by this call.
    pub fn find_or_create(
        &mut self,
        io: IoType,
        key: NibKey,
        entity_type: EntityTypeCode,
        ntm: &NtmRegistry,
        require_resolved: bool,
    ) -> Result<(&mut Nib, bool)> {
        let capacity = self.max_nibs;
        let map = self.map_mut(io);
        let len = map.len();

        match map.entry(key) {
            Entry::Occupied(entry) => Ok((entry.into_mut(), false)),
            Entry::Vacant(entry) => {
                if len >= capacity {
                    warn!("{:?} NIB table full, rejecting {:?}", io, key);
                    return Err(NetIoError::CapacityExceeded {
                        what: "NIB registry",
                        capacity,
                    });
                }

                let descriptor = ntm.lookup(&entity_type).map(|m| m.descriptor.clone());
                if descriptor.is_none() && require_resolved {
                    return Err(NetIoError::TypeUnresolved(entity_type));
                }

                let mut nib = Nib::new(io, key, entity_type);
                nib.type_unresolved = descriptor.is_none();
                nib.descriptor = descriptor;
                info!(
                    "Created {:?} NIB {:?} type {} ({})",
                    io,
                    key,
                    entity_type,
                    nib.descriptor
                        .as_ref()
                        .map_or("unresolved", |d| d.name.as_str())
                );
                Ok((entry.insert(nib), true))
            }
        }
    }

    pub fn remove(&mut self, io: IoType, key: &NibKey) -> Option<Nib> {
        let removed = self.map_mut(io).remove(key);
        if removed.is_some() {
            info!("Removed {:?} NIB {:?}", io, key);
        }
        removed
    }

    /// Removes and returns every input NIB silent for longer than its
    /// kind/domain max age.
    pub fn reap(&mut self, now: f64, dr_table: &DrTable) -> Vec<Nib> {
        let stale: Vec<NibKey> = self
            .inputs
            .values()
            .filter(|nib| {
                nib.age(now) > dr_table.max_age(nib.entity_type.kind, nib.entity_type.domain)
            })
            .map(|nib| nib.key)
            .collect();

        stale
            .iter()
            .filter_map(|key| {
                let nib = self.inputs.remove(key)?;
                info!("Reaped input NIB {:?} after {:.1}s of silence", key, nib.age(now));
                Some(nib)
            })
            .collect()
    }

    /// NIBs of one direction in key order
    pub fn iter(&self, io: IoType) -> impl Iterator<Item = &Nib> {
        self.map(io).values()
    }

    pub fn iter_mut(&mut self, io: IoType) -> impl Iterator<Item = &mut Nib> {
        self.map_mut(io).values_mut()
    }

    pub fn keys(&self, io: IoType) -> Vec<NibKey> {
        self.map(io).keys().copied().collect()
    }

    pub fn len(&self, io: IoType) -> usize {
        self.map(io).len()
    }

    pub fn is_empty(&self, io: IoType) -> bool {
        self.map(io).is_empty()
    }
}
