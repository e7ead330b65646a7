//! Engine configuration loaded from TOML
//!
//! ```toml
//! version = 5
//! site_id = 10
//! application_id = 143
//! exercise_id = 1
//!
//! [dead_reckoning.default]
//! max_time_dr = 5.0
//! max_orientation_error_deg = 3.0
//!
//! [dead_reckoning.overrides.K1D2]
//! max_entity_range = 100000.0
//!
//! [[ntm]]
//! type_name = "F-16"
//! code = { kind = 1, domain = 2, country = 225, category = 1, subcategory = 3, specific = 0, extra = 0 }
//!
//! [[emission_handlers]]
//! sensor_type_id = "APG-68"
//! emitter_name = 1234
//!
//! [ee_thresholds]
//! azimuth_deg = 2.0
//! ```
//!
//! Override keys are `K<kind>` for a whole kind or `K<kind>D<domain>` for
//! one kind/domain pair. Orientation and beam angle thresholds are written
//! in degrees.

use crate::dead_reckoning::{DrOverride, DrParams};
use crate::emission::{
    EmissionPduHandler, EmissionThresholds, DEFAULT_MAX_EMISSION_HANDLERS, MAX_TRACK_JAM_TARGETS,
};
use crate::engine::{NetIo, NetIoSettings};
use crate::error::{NetIoError, Result};
use crate::ntm::TypeDescriptor;
use crate::simulation::Simulation;
use crate::transport::Transport;
use log::info;
use pdu::enums::{kind, MAX_ENTITY_DOMAIN};
use pdu::{EntityTypeCode, ProtocolVersion};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetIoConfig {
    pub version: u8,
    pub site_id: u16,
    pub application_id: u16,
    pub exercise_id: u8,
    pub max_nibs: usize,
    pub require_resolved_type: bool,
    pub max_receives_per_cycle: usize,
    pub absolute_timestamps: bool,
    pub ee_heartbeat: f64,
    pub hbt_timeout_multiplier: f64,
    pub max_track_jam_targets: usize,
    pub ee_thresholds: EeThresholdValues,
    pub max_emission_handlers: usize,
    pub dead_reckoning: DeadReckoningConfig,
    pub ntm: Vec<NtmEntry>,
    pub emission_handlers: Vec<EmissionPduHandler>,
}

impl Default for NetIoConfig {
    fn default() -> Self {
        let settings = NetIoSettings::default();
        Self {
            version: settings.version.as_u8(),
            site_id: settings.site_id,
            application_id: settings.application_id,
            exercise_id: settings.exercise_id,
            max_nibs: settings.max_nibs,
            require_resolved_type: settings.require_resolved_type,
            max_receives_per_cycle: settings.max_receives_per_cycle,
            absolute_timestamps: settings.absolute_timestamps,
            ee_heartbeat: settings.ee_heartbeat,
            hbt_timeout_multiplier: settings.hbt_timeout_multiplier,
            max_track_jam_targets: settings.max_track_jam_targets,
            ee_thresholds: EeThresholdValues::default(),
            max_emission_handlers: DEFAULT_MAX_EMISSION_HANDLERS,
            dead_reckoning: DeadReckoningConfig::default(),
            ntm: Vec::new(),
            emission_handlers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeadReckoningConfig {
    pub default: DrValues,
    /// Keyed by `K<kind>` or `K<kind>D<domain>`
    pub overrides: BTreeMap<String, DrValues>,
}

/// Threshold values as written in the file; unset fields fall through
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DrValues {
    pub max_time_dr: Option<f64>,
    pub max_position_error: Option<f64>,
    pub max_orientation_error_deg: Option<f64>,
    pub max_age: Option<f64>,
    pub max_entity_range: Option<f64>,
}

impl DrValues {
    fn validate(&self, slot: &str) -> Result<()> {
        let fields = [
            ("max_time_dr", self.max_time_dr),
            ("max_position_error", self.max_position_error),
            ("max_orientation_error_deg", self.max_orientation_error_deg),
            ("max_age", self.max_age),
            ("max_entity_range", self.max_entity_range),
        ];
        for (name, value) in fields {
            if let Some(v) = value {
                if v.is_nan() || v < 0.0 {
                    return Err(NetIoError::InvalidConfig(format!(
                        "{}.{} must be a non-negative number, got {}",
                        slot, name, v
                    )));
                }
            }
        }
        Ok(())
    }

    /// Values layered over `base`.
    fn over(&self, base: DrParams) -> DrParams {
        DrParams {
            max_time_dr: self.max_time_dr.unwrap_or(base.max_time_dr),
            max_position_error: self.max_position_error.unwrap_or(base.max_position_error),
            max_orientation_error: self
                .max_orientation_error_deg
                .map(f64::to_radians)
                .unwrap_or(base.max_orientation_error),
            max_age: self.max_age.unwrap_or(base.max_age),
            max_entity_range: self.max_entity_range.unwrap_or(base.max_entity_range),
        }
    }
}

impl From<DrValues> for DrOverride {
    fn from(values: DrValues) -> Self {
        Self {
            max_time_dr: values.max_time_dr,
            max_position_error: values.max_position_error,
            max_orientation_error: values.max_orientation_error_deg.map(f64::to_radians),
            max_age: values.max_age,
            max_entity_range: values.max_entity_range,
        }
    }
}

/// Emission change thresholds as written in the file
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EeThresholdValues {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub erp_dbm: f64,
    pub frequency_hz: f64,
    pub frequency_range_hz: f64,
    pub prf_hz: f64,
    pub pulse_width_us: f64,
}

impl Default for EeThresholdValues {
    fn default() -> Self {
        Self {
            azimuth_deg: 1.0,
            elevation_deg: 1.0,
            erp_dbm: 1.0,
            frequency_hz: 1.0,
            frequency_range_hz: 1.0,
            prf_hz: 1.0,
            pulse_width_us: 1.0,
        }
    }
}

impl EeThresholdValues {
    fn validate(&self) -> Result<()> {
        let fields = [
            ("azimuth_deg", self.azimuth_deg),
            ("elevation_deg", self.elevation_deg),
            ("erp_dbm", self.erp_dbm),
            ("frequency_hz", self.frequency_hz),
            ("frequency_range_hz", self.frequency_range_hz),
            ("prf_hz", self.prf_hz),
            ("pulse_width_us", self.pulse_width_us),
        ];
        for (name, v) in fields {
            if !v.is_finite() || v < 0.0 {
                return Err(NetIoError::InvalidConfig(format!(
                    "ee_thresholds.{} must be a non-negative number, got {}",
                    name, v
                )));
            }
        }
        Ok(())
    }
}

impl From<EeThresholdValues> for EmissionThresholds {
    fn from(values: EeThresholdValues) -> Self {
        Self {
            azimuth: values.azimuth_deg.to_radians(),
            elevation: values.elevation_deg.to_radians(),
            erp: values.erp_dbm,
            frequency: values.frequency_hz,
            frequency_range: values.frequency_range_hz,
            prf: values.prf_hz,
            pulse_width: values.pulse_width_us,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NtmEntry {
    pub code: EntityTypeCode,
    pub type_name: String,
}

/// Parses an override key into (kind, domain).
pub fn parse_override_key(key: &str) -> Result<(u8, Option<u8>)> {
    let invalid = || NetIoError::InvalidConfig(format!("bad dead-reckoning override key {:?}", key));
    let number = |digits: &str| -> Option<u8> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    };

    let rest = key.strip_prefix('K').ok_or_else(invalid)?;
    let (kind_digits, domain) = match rest.split_once('D') {
        Some((k, d)) => (k, Some(number(d).ok_or_else(invalid)?)),
        None => (rest, None),
    };
    let entity_kind = number(kind_digits).ok_or_else(invalid)?;

    if entity_kind >= kind::COUNT {
        return Err(NetIoError::InvalidConfig(format!(
            "override {:?}: entity kind {} out of range",
            key, entity_kind
        )));
    }
    if let Some(d) = domain {
        if d > MAX_ENTITY_DOMAIN {
            return Err(NetIoError::InvalidConfig(format!(
                "override {:?}: domain {} out of range",
                key, d
            )));
        }
    }
    Ok((entity_kind, domain))
}

impl NetIoConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if ProtocolVersion::from_u8(self.version).is_none() {
            return Err(NetIoError::InvalidConfig(format!(
                "unsupported DIS version {}",
                self.version
            )));
        }
        if self.exercise_id == 0 {
            return Err(NetIoError::InvalidConfig(
                "exercise_id must be greater than zero".to_string(),
            ));
        }
        if self.max_receives_per_cycle == 0 {
            return Err(NetIoError::InvalidConfig(
                "max_receives_per_cycle must be at least 1".to_string(),
            ));
        }
        if self.ee_heartbeat.is_nan() || self.ee_heartbeat <= 0.0 {
            return Err(NetIoError::InvalidConfig(
                "ee_heartbeat must be positive".to_string(),
            ));
        }
        if self.hbt_timeout_multiplier.is_nan() || self.hbt_timeout_multiplier < 1.0 {
            return Err(NetIoError::InvalidConfig(
                "hbt_timeout_multiplier must be at least 1".to_string(),
            ));
        }
        if self.max_track_jam_targets > MAX_TRACK_JAM_TARGETS {
            return Err(NetIoError::InvalidConfig(format!(
                "max_track_jam_targets must not exceed {}",
                MAX_TRACK_JAM_TARGETS
            )));
        }
        self.ee_thresholds.validate()?;
        self.dead_reckoning.default.validate("dead_reckoning.default")?;
        for (key, values) in &self.dead_reckoning.overrides {
            parse_override_key(key)?;
            values.validate(key)?;
        }
        Ok(())
    }

    pub fn settings(&self) -> Result<NetIoSettings> {
        Ok(NetIoSettings {
            version: ProtocolVersion::from_u8(self.version).ok_or_else(|| {
                NetIoError::InvalidConfig(format!("unsupported DIS version {}", self.version))
            })?,
            site_id: self.site_id,
            application_id: self.application_id,
            exercise_id: self.exercise_id,
            max_nibs: self.max_nibs,
            require_resolved_type: self.require_resolved_type,
            max_receives_per_cycle: self.max_receives_per_cycle,
            absolute_timestamps: self.absolute_timestamps,
            ee_heartbeat: self.ee_heartbeat,
            hbt_timeout_multiplier: self.hbt_timeout_multiplier,
            ee_thresholds: self.ee_thresholds.into(),
            max_track_jam_targets: self.max_track_jam_targets,
            max_emission_handlers: self.max_emission_handlers,
        })
    }

    /// Builds an engine with every registry populated from this config.
    pub fn build_engine<T: Transport, S: Simulation>(
        &self,
        transport: T,
        simulation: S,
    ) -> Result<NetIo<T, S>> {
        self.validate()?;
        let mut engine = NetIo::new(self.settings()?, transport, simulation);

        engine.configure_dr_default(self.dead_reckoning.default.over(DrParams::default()))?;
        for (key, values) in &self.dead_reckoning.overrides {
            let (entity_kind, domain) = parse_override_key(key)?;
            engine.configure_dr_override(entity_kind, domain, *values)?;
        }
        for entry in &self.ntm {
            engine.register_ntm(entry.code, TypeDescriptor::new(entry.type_name.clone()))?;
        }
        for handler in &self.emission_handlers {
            engine.add_emission_handler(handler.clone())?;
        }

        info!(
            "Configured {} type mappings, {} emission handlers, {} DR overrides",
            self.ntm.len(),
            self.emission_handlers.len(),
            self.dead_reckoning.overrides.len()
        );
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::EntitySnapshot;
    use crate::transport::LoopbackTransport;
    use assert_approx_eq::assert_approx_eq;
    use pdu::Vec3;

    struct Idle;

    impl Simulation for Idle {
        fn publishable_entities(&self) -> Vec<EntitySnapshot> {
            Vec::new()
        }

        fn ownship_position(&self) -> Option<Vec3> {
            None
        }
    }

    const SAMPLE: &str = r#"
version = 5
site_id = 10
application_id = 143
exercise_id = 3
max_nibs = 50

[dead_reckoning.default]
max_time_dr = 4.0
max_orientation_error_deg = 6.0

[dead_reckoning.overrides.K1]
max_age = 30.0

[dead_reckoning.overrides.K1D2]
max_entity_range = 1000.0

[[ntm]]
type_name = "F-16"
code = { kind = 1, domain = 2, country = 225, category = 1, subcategory = 3, specific = 0, extra = 0 }

[[emission_handlers]]
sensor_type_id = "APG-68"
emitter_name = 1234
"#;

    #[test]
    fn test_defaults_match_engine_settings() {
        let config = NetIoConfig::from_toml_str("").unwrap();
        assert_eq!(config.settings().unwrap(), NetIoSettings::default());
    }

    #[test]
    fn test_sample_builds_engine() {
        let config = NetIoConfig::from_toml_str(SAMPLE).unwrap();
        let engine = config
            .build_engine(LoopbackTransport::new(), Idle)
            .unwrap();

        assert_eq!(engine.settings().version, ProtocolVersion::Ieee1278_1A);
        assert_eq!(engine.settings().exercise_id, 3);
        assert_eq!(engine.nibs().capacity(), 50);
        assert_eq!(engine.ntms().len(), 1);
        assert_eq!(engine.emission_handlers().len(), 1);
        assert_eq!(engine.federate_name(), "S10A143");

        let air = engine.dr_table().params_for(1, 2);
        assert_approx_eq!(air.max_time_dr, 4.0);
        assert_approx_eq!(air.max_orientation_error, 6.0_f64.to_radians());
        assert_approx_eq!(air.max_age, 30.0);
        assert_approx_eq!(air.max_entity_range, 1000.0);

        let land = engine.dr_table().params_for(1, 1);
        assert_approx_eq!(land.max_age, 30.0);
        assert!(land.max_entity_range.is_infinite());

        let munition = engine.dr_table().params_for(2, 2);
        assert_approx_eq!(munition.max_age, 12.5);
    }

    #[test]
    fn test_emission_settings() {
        let config = NetIoConfig::from_toml_str(
            "hbt_timeout_multiplier = 3.0\nmax_track_jam_targets = 20\n\n[ee_thresholds]\nazimuth_deg = 2.0\nerp_dbm = 0.5\n",
        )
        .unwrap();
        let settings = config.settings().unwrap();
        assert_approx_eq!(settings.hbt_timeout_multiplier, 3.0);
        assert_eq!(settings.max_track_jam_targets, 20);
        assert_approx_eq!(settings.ee_thresholds.azimuth, 2.0_f64.to_radians());
        assert_approx_eq!(settings.ee_thresholds.elevation, 1.0_f64.to_radians());
        assert_approx_eq!(settings.ee_thresholds.erp, 0.5);

        for bad in [
            "max_track_jam_targets = 119",
            "hbt_timeout_multiplier = 0.5",
            "[ee_thresholds]\nprf_hz = -1.0",
        ] {
            assert!(
                matches!(NetIoConfig::from_toml_str(bad), Err(NetIoError::InvalidConfig(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_override_keys() {
        assert_eq!(parse_override_key("K1").unwrap(), (1, None));
        assert_eq!(parse_override_key("K1D2").unwrap(), (1, Some(2)));
        assert_eq!(parse_override_key("K9D11").unwrap(), (9, Some(11)));
        for bad in ["", "K", "KD2", "K1D", "k1", "K10", "K1D12", "K1D2x", "D2K1", "K-1"] {
            assert!(
                matches!(parse_override_key(bad), Err(NetIoError::InvalidConfig(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            NetIoConfig::from_toml_str("version = 8"),
            Err(NetIoError::InvalidConfig(_))
        ));
        assert!(matches!(
            NetIoConfig::from_toml_str("exercise_id = 0"),
            Err(NetIoError::InvalidConfig(_))
        ));
        assert!(matches!(
            NetIoConfig::from_toml_str("[dead_reckoning.default]\nmax_age = -1.0"),
            Err(NetIoError::InvalidConfig(_))
        ));
        assert!(matches!(
            NetIoConfig::from_toml_str("[dead_reckoning.overrides.K12]\nmax_age = 1.0"),
            Err(NetIoError::InvalidConfig(_))
        ));
        assert!(matches!(
            NetIoConfig::from_toml_str("unknown_key = 1"),
            Err(NetIoError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_duplicate_ntm_rejected_at_build() {
        let text = format!(
            "{}\n[[ntm]]\ntype_name = \"Viper\"\ncode = {{ kind = 1, domain = 2, country = 225, category = 1, subcategory = 3, specific = 0, extra = 0 }}\n",
            SAMPLE
        );
        let config = NetIoConfig::from_toml_str(&text).unwrap();
        assert!(matches!(
            config.build_engine(LoopbackTransport::new(), Idle),
            Err(NetIoError::DuplicateMapping(_))
        ));
    }
}
