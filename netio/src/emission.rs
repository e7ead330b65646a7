//! Emission PDU handlers and change thresholds.
//!
//! A handler ties a local sensor type to the DIS emitter it is published
//! as. The outbound path looks handlers up by the local sensor's type id,
//! the inbound path by the emitter name carried in the emission PDU.
//!
//! [`EmissionThresholds`] decides when a beam has drifted far enough from
//! what was last published to be worth a new emission PDU.

use crate::error::{NetIoError, Result};
use pdu::{EmitterBeam, EmitterSystem, FundamentalParameters};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::f64::consts::{PI, TAU};

/// Default bound on the number of emission handlers
pub const DEFAULT_MAX_EMISSION_HANDLERS: usize = 500;

/// Most track/jam targets one published beam may list. A single-beam
/// system's length in 32-bit words must fit one byte: (20 + 52 + 8n) / 4 <= 255.
pub const MAX_TRACK_JAM_TARGETS: usize = 118;

/// Default target count above which a beam is sent in high-density mode
pub const DEFAULT_MAX_TRACK_JAM_TARGETS: usize = 10;

/// Default multiple of the emission heartbeat after which silent remote
/// emitters are dropped
pub const DEFAULT_HBT_TIMEOUT_MULTIPLIER: f64 = 2.4;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EmissionPduHandler {
    /// Type id of the local sensor model
    pub sensor_type_id: String,
    /// DIS emitter name enumeration
    pub emitter_name: u16,
    #[serde(default)]
    pub emitter_function: u8,
    #[serde(default)]
    pub beam_function: u8,
}

/// Bounded, ordered handler list; lookups return the first match
#[derive(Debug, Clone)]
pub struct EmissionHandlerTable {
    handlers: Vec<EmissionPduHandler>,
    capacity: usize,
}

impl Default for EmissionHandlerTable {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EMISSION_HANDLERS)
    }
}

impl EmissionHandlerTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            handlers: Vec::new(),
            capacity,
        }
    }

    pub fn add(&mut self, handler: EmissionPduHandler) -> Result<()> {
        if self.handlers.len() >= self.capacity {
            return Err(NetIoError::CapacityExceeded {
                what: "emission handler table",
                capacity: self.capacity,
            });
        }
        self.handlers.push(handler);
        Ok(())
    }

    pub fn find_by_local_sensor(&self, sensor_type_id: &str) -> Option<&EmissionPduHandler> {
        self.handlers
            .iter()
            .find(|h| h.sensor_type_id == sensor_type_id)
    }

    pub fn find_by_emitter_name(&self, emitter_name: u16) -> Option<&EmissionPduHandler> {
        self.handlers.iter().find(|h| h.emitter_name == emitter_name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Smallest changes in beam parameters that trigger a new emission PDU.
///
/// Defaults are the IEEE 1278.1-2012 values: 1 degree of azimuth or
/// elevation, 1 dBm of radiated power, 1 Hz of frequency, frequency range
/// or PRF and 1 microsecond of pulse width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmissionThresholds {
    /// Azimuth center or sweep, radians
    pub azimuth: f64,
    /// Elevation center or sweep, radians
    pub elevation: f64,
    /// Effective radiated power, dBm
    pub erp: f64,
    /// Hz
    pub frequency: f64,
    /// Hz
    pub frequency_range: f64,
    /// Pulse repetition frequency, Hz
    pub prf: f64,
    /// Microseconds
    pub pulse_width: f64,
}

impl Default for EmissionThresholds {
    fn default() -> Self {
        Self {
            azimuth: 1.0_f64.to_radians(),
            elevation: 1.0_f64.to_radians(),
            erp: 1.0,
            frequency: 1.0,
            frequency_range: 1.0,
            prf: 1.0,
            pulse_width: 1.0,
        }
    }
}

fn angle_delta(a: f32, b: f32) -> f64 {
    ((a as f64 - b as f64 + PI).rem_euclid(TAU) - PI).abs()
}

fn delta(a: f32, b: f32) -> f64 {
    (a as f64 - b as f64).abs()
}

impl EmissionThresholds {
    /// Sweep sync is not compared; it moves continuously on scanning beams.
    pub fn parameters_changed(
        &self,
        sent: &FundamentalParameters,
        current: &FundamentalParameters,
    ) -> bool {
        angle_delta(sent.azimuth_center, current.azimuth_center) > self.azimuth
            || delta(sent.azimuth_sweep, current.azimuth_sweep) > self.azimuth
            || angle_delta(sent.elevation_center, current.elevation_center) > self.elevation
            || delta(sent.elevation_sweep, current.elevation_sweep) > self.elevation
            || delta(sent.effective_radiated_power, current.effective_radiated_power) > self.erp
            || delta(sent.frequency, current.frequency) > self.frequency
            || delta(sent.frequency_range, current.frequency_range) > self.frequency_range
            || delta(sent.pulse_repetition_frequency, current.pulse_repetition_frequency)
                > self.prf
            || delta(sent.pulse_width, current.pulse_width) > self.pulse_width
    }

    pub fn beam_changed(&self, sent: &EmitterBeam, current: &EmitterBeam) -> bool {
        sent.beam_id != current.beam_id
            || sent.parameter_index != current.parameter_index
            || sent.beam_function != current.beam_function
            || sent.high_density_track_jam != current.high_density_track_jam
            || sent.jamming_mode_sequence != current.jamming_mode_sequence
            || sent.targets != current.targets
            || self.parameters_changed(&sent.parameters, &current.parameters)
    }

    pub fn system_changed(&self, sent: &EmitterSystem, current: &EmitterSystem) -> bool {
        sent.emitter_name != current.emitter_name
            || sent.function != current.function
            || sent.emitter_id != current.emitter_id
            || sent.location != current.location
            || sent.beams.len() != current.beams.len()
            || sent
                .beams
                .iter()
                .zip(&current.beams)
                .any(|(a, b)| self.beam_changed(a, b))
    }

    /// Compares the last published systems with the current ones, both
    /// keyed by emitter id.
    pub fn systems_changed(
        &self,
        sent: &BTreeMap<u8, EmitterSystem>,
        current: &BTreeMap<u8, EmitterSystem>,
    ) -> bool {
        sent.len() != current.len()
            || sent
                .iter()
                .zip(current)
                .any(|((id_a, a), (id_b, b))| id_a != id_b || self.system_changed(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdu::TrackJamTarget;

    fn handler(sensor: &str, name: u16) -> EmissionPduHandler {
        EmissionPduHandler {
            sensor_type_id: sensor.to_string(),
            emitter_name: name,
            emitter_function: 2,
            beam_function: 3,
        }
    }

    #[test]
    fn test_lookup_both_directions() {
        let mut table = EmissionHandlerTable::default();
        table.add(handler("APG-68", 2530)).unwrap();
        table.add(handler("APG-63", 2520)).unwrap();

        assert_eq!(table.find_by_local_sensor("APG-63").unwrap().emitter_name, 2520);
        assert_eq!(
            table.find_by_emitter_name(2530).unwrap().sensor_type_id,
            "APG-68"
        );
        assert!(table.find_by_local_sensor("AN/SPY-1").is_none());
        assert!(table.find_by_emitter_name(1).is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let mut table = EmissionHandlerTable::default();
        table.add(handler("APG-68", 2530)).unwrap();
        table.add(handler("APG-68(v9)", 2530)).unwrap();
        assert_eq!(
            table.find_by_emitter_name(2530).unwrap().sensor_type_id,
            "APG-68"
        );
    }

    #[test]
    fn test_capacity() {
        let mut table = EmissionHandlerTable::new(2);
        table.add(handler("a", 1)).unwrap();
        table.add(handler("b", 2)).unwrap();
        assert!(matches!(
            table.add(handler("c", 3)),
            Err(NetIoError::CapacityExceeded { capacity: 2, .. })
        ));
        assert_eq!(table.len(), 2);
        assert_eq!(EmissionHandlerTable::default().capacity(), 500);
    }

    fn scanning_system(azimuth: f32, frequency: f32) -> BTreeMap<u8, EmitterSystem> {
        let beam = EmitterBeam {
            beam_id: 1,
            parameters: FundamentalParameters {
                frequency,
                effective_radiated_power: 70.0,
                azimuth_center: azimuth,
                azimuth_sweep: 1.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let system = EmitterSystem {
            emitter_name: 2530,
            emitter_id: 1,
            beams: vec![beam],
            ..Default::default()
        };
        BTreeMap::from([(1, system)])
    }

    #[test]
    fn test_jitter_below_thresholds() {
        let thresholds = EmissionThresholds::default();
        let sent = scanning_system(0.10, 9.5e9);

        // Half a degree of azimuth and a sweep sync change are not news
        let mut jittered = scanning_system(0.10 + 0.5_f32.to_radians(), 9.5e9);
        jittered.get_mut(&1).unwrap().beams[0].parameters.sweep_sync = 42.0;
        assert!(!thresholds.systems_changed(&sent, &jittered));

        let moved = scanning_system(0.10 + 2.0_f32.to_radians(), 9.5e9);
        assert!(thresholds.systems_changed(&sent, &moved));
    }

    #[test]
    fn test_azimuth_wraps() {
        let thresholds = EmissionThresholds::default();
        let sent = scanning_system(3.14, 9.5e9);
        let wrapped = scanning_system(-3.14, 9.5e9);
        assert!(!thresholds.systems_changed(&sent, &wrapped));
    }

    #[test]
    fn test_structural_changes() {
        let thresholds = EmissionThresholds::default();
        let sent = scanning_system(0.0, 9.5e9);

        let mut tracking = sent.clone();
        tracking.get_mut(&1).unwrap().beams[0]
            .targets
            .push(TrackJamTarget::default());
        assert!(thresholds.systems_changed(&sent, &tracking));

        let mut off = sent.clone();
        off.get_mut(&1).unwrap().beams.clear();
        assert!(thresholds.systems_changed(&sent, &off));

        assert!(thresholds.systems_changed(&sent, &BTreeMap::new()));
        assert!(!thresholds.systems_changed(&BTreeMap::new(), &BTreeMap::new()));
    }
}
