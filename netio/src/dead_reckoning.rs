//! Dead-reckoning thresholds and prediction
//!
//! Thresholds are resolved per entity kind and domain through three layers:
//! an exact (kind, domain) override, then a kind-wide override, then the
//! table default. Each field resolves on its own, so an override may set
//! only the values it cares about.
//!
//! The same accept predicate serves both directions: on receive it decides
//! whether an entity-state update is worth applying, on send whether the
//! remote side's prediction has drifted far enough to owe a new PDU.

use crate::nib::Nib;
use log::debug;
use pdu::{DeadReckoningAlgorithm, EulerAngles, Vec3};
use std::collections::BTreeMap;
use std::f64::consts::PI;

/// Dead-reckoning and filtering thresholds for one kind/domain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrParams {
    /// Heartbeat: seconds after which an update is owed regardless of error
    pub max_time_dr: f64,
    /// Position error threshold in meters
    pub max_position_error: f64,
    /// Orientation error threshold in radians
    pub max_orientation_error: f64,
    /// Seconds of silence after which an input entity is dropped
    pub max_age: f64,
    /// Meters from ownship beyond which entities are ignored.
    /// `INFINITY` means no limit, zero excludes the kind/domain entirely.
    pub max_entity_range: f64,
}

impl Default for DrParams {
    fn default() -> Self {
        Self {
            max_time_dr: 5.0,
            max_position_error: 3.0,
            max_orientation_error: 3.0_f64.to_radians(),
            max_age: 12.5,
            max_entity_range: f64::INFINITY,
        }
    }
}

/// A partial set of thresholds layered over the default
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DrOverride {
    pub max_time_dr: Option<f64>,
    pub max_position_error: Option<f64>,
    pub max_orientation_error: Option<f64>,
    pub max_age: Option<f64>,
    pub max_entity_range: Option<f64>,
}

impl DrOverride {
    pub fn range(max_entity_range: f64) -> Self {
        Self {
            max_entity_range: Some(max_entity_range),
            ..Default::default()
        }
    }
}

impl From<DrParams> for DrOverride {
    fn from(params: DrParams) -> Self {
        Self {
            max_time_dr: Some(params.max_time_dr),
            max_position_error: Some(params.max_position_error),
            max_orientation_error: Some(params.max_orientation_error),
            max_age: Some(params.max_age),
            max_entity_range: Some(params.max_entity_range),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Layer {
    values: DrOverride,
    range_squared: Option<f64>,
}

impl Layer {
    fn new(values: DrOverride) -> Self {
        Self {
            values,
            range_squared: values.max_entity_range.map(|r| r * r),
        }
    }
}

/// Per-(kind, domain) threshold table
#[derive(Debug, Clone)]
pub struct DrTable {
    default: DrParams,
    default_range_squared: f64,
    /// Keyed by kind and `Some(domain)` for exact overrides, `None` for kind-wide
    overrides: BTreeMap<(u8, Option<u8>), Layer>,
}

impl Default for DrTable {
    fn default() -> Self {
        Self::new(DrParams::default())
    }
}

impl DrTable {
    pub fn new(default: DrParams) -> Self {
        Self {
            default,
            default_range_squared: default.max_entity_range * default.max_entity_range,
            overrides: BTreeMap::new(),
        }
    }

    pub fn configure_default(&mut self, params: DrParams) {
        self.default = params;
        self.default_range_squared = params.max_entity_range * params.max_entity_range;
    }

    /// Sets values for every domain of `kind` (`domain == None`) or for one
    /// exact (kind, domain) pair. Reconfiguring a layer replaces it.
    pub fn configure_override(&mut self, kind: u8, domain: Option<u8>, values: impl Into<DrOverride>) {
        self.overrides.insert((kind, domain), Layer::new(values.into()));
    }

    pub fn default_params(&self) -> &DrParams {
        &self.default
    }

    fn layers(&self, kind: u8, domain: u8) -> [Option<&Layer>; 2] {
        [
            self.overrides.get(&(kind, Some(domain))),
            self.overrides.get(&(kind, None)),
        ]
    }

    fn resolve(&self, kind: u8, domain: u8, field: impl Fn(&DrOverride) -> Option<f64>) -> Option<f64> {
        self.layers(kind, domain)
            .into_iter()
            .flatten()
            .find_map(|layer| field(&layer.values))
    }

    /// Fully resolved thresholds for a kind/domain.
    pub fn params_for(&self, kind: u8, domain: u8) -> DrParams {
        let d = &self.default;
        DrParams {
            max_time_dr: self
                .resolve(kind, domain, |o| o.max_time_dr)
                .unwrap_or(d.max_time_dr),
            max_position_error: self
                .resolve(kind, domain, |o| o.max_position_error)
                .unwrap_or(d.max_position_error),
            max_orientation_error: self
                .resolve(kind, domain, |o| o.max_orientation_error)
                .unwrap_or(d.max_orientation_error),
            max_age: self
                .resolve(kind, domain, |o| o.max_age)
                .unwrap_or(d.max_age),
            max_entity_range: self
                .resolve(kind, domain, |o| o.max_entity_range)
                .unwrap_or(d.max_entity_range),
        }
    }

    pub fn max_age(&self, kind: u8, domain: u8) -> f64 {
        self.resolve(kind, domain, |o| o.max_age)
            .unwrap_or(self.default.max_age)
    }

    fn range_limit(&self, kind: u8, domain: u8) -> (f64, f64) {
        self.layers(kind, domain)
            .into_iter()
            .flatten()
            .find_map(|layer| layer.values.max_entity_range.zip(layer.range_squared))
            .unwrap_or((self.default.max_entity_range, self.default_range_squared))
    }

    /// Whether an entity of this kind/domain at `entity` is close enough to
    /// `ownship` to be tracked.
    pub fn is_within_range(&self, ownship: &Vec3, entity: &Vec3, kind: u8, domain: u8) -> bool {
        let (range, range_squared) = self.range_limit(kind, domain);
        if range == 0.0 {
            return false;
        }
        ownship.distance_squared(entity) <= range_squared
    }

    /// Receive side: whether a candidate state should replace the NIB's
    /// dead-reckoning baseline.
    pub fn should_accept_update(
        &self,
        nib: &Nib,
        position: &Vec3,
        orientation: &EulerAngles,
        now: f64,
    ) -> bool {
        self.exceeds_thresholds(nib, position, orientation, now)
    }

    /// Send side: whether the remote prediction of an output NIB has drifted
    /// far enough, or aged enough, that a new entity-state PDU is owed.
    pub fn should_send(&self, nib: &Nib, position: &Vec3, orientation: &EulerAngles, now: f64) -> bool {
        self.exceeds_thresholds(nib, position, orientation, now)
    }

    fn exceeds_thresholds(
        &self,
        nib: &Nib,
        position: &Vec3,
        orientation: &EulerAngles,
        now: f64,
    ) -> bool {
        let Some(baseline) = nib.dead_reckoning.as_ref() else {
            return true;
        };
        let params = self.params_for(nib.entity_type.kind, nib.entity_type.domain);

        if now - baseline.time > params.max_time_dr {
            return true;
        }

        let (predicted_position, predicted_orientation) = baseline.predict(now);
        let position_error_squared = predicted_position.distance_squared(position);
        if position_error_squared > params.max_position_error * params.max_position_error {
            return true;
        }
        let orientation_error = orientation_error(&predicted_orientation, orientation);
        if orientation_error > params.max_orientation_error {
            return true;
        }

        debug!(
            "{:?} within thresholds: position error {:.2} m, orientation error {:.4} rad",
            nib.key,
            position_error_squared.sqrt(),
            orientation_error
        );
        false
    }
}

/// Kinematic baseline an entity is dead-reckoned from
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DrState {
    pub algorithm: DeadReckoningAlgorithm,
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    pub orientation: EulerAngles,
    pub angular_velocity: Vec3,
    /// Time the baseline was accepted or sent
    pub time: f64,
}

impl DrState {
    /// Predicted position and orientation at `now`.
    pub fn predict(&self, now: f64) -> (Vec3, EulerAngles) {
        use DeadReckoningAlgorithm::*;

        let dt = (now - self.time).max(0.0);
        let position = match self.algorithm {
            Fpw | Rpw | Fpb | Rpb => self.position.add(&self.velocity.scale(dt)),
            Rvw | Fvw | Rvb | Fvb => self
                .position
                .add(&self.velocity.scale(dt))
                .add(&self.acceleration.scale(0.5 * dt * dt)),
            Static | Other | Unassigned(_) => self.position,
        };
        let orientation = match self.algorithm {
            Rpw | Rvw | Rpb | Rvb => EulerAngles::new(
                self.orientation.psi + self.angular_velocity.z * dt,
                self.orientation.theta + self.angular_velocity.y * dt,
                self.orientation.phi + self.angular_velocity.x * dt,
            ),
            _ => self.orientation,
        };
        (position, orientation)
    }
}

fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    wrapped.abs()
}

/// Largest per-axis difference between two attitudes, wrapped to [0, PI].
pub fn orientation_error(a: &EulerAngles, b: &EulerAngles) -> f64 {
    wrap_angle(a.psi - b.psi)
        .max(wrap_angle(a.theta - b.theta))
        .max(wrap_angle(a.phi - b.phi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nib::{IoType, NibKey};
    use assert_approx_eq::assert_approx_eq;
    use pdu::enums::{kind, platform_domain};
    use pdu::EntityTypeCode;

    fn air_nib(baseline: Option<DrState>) -> Nib {
        let mut nib = Nib::new(
            IoType::Input,
            NibKey::new(1, 10, 20),
            EntityTypeCode::new(kind::PLATFORM, platform_domain::AIR, 225, 1, 0, 0, 0),
        );
        nib.dead_reckoning = baseline;
        nib
    }

    fn moving(time: f64) -> DrState {
        DrState {
            algorithm: DeadReckoningAlgorithm::Fpw,
            position: Vec3::new(0.0, 0.0, 0.0),
            velocity: Vec3::new(100.0, 0.0, 0.0),
            time,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_thresholds() {
        let params = DrParams::default();
        assert_approx_eq!(params.max_time_dr, 5.0);
        assert_approx_eq!(params.max_position_error, 3.0);
        assert_approx_eq!(params.max_orientation_error, 0.0523598775598, 1e-9);
        assert_approx_eq!(params.max_age, 12.5);
        assert!(params.max_entity_range.is_infinite());
    }

    #[test]
    fn test_override_precedence_per_field() {
        let mut table = DrTable::default();
        table.configure_override(
            kind::PLATFORM,
            None,
            DrOverride {
                max_age: Some(30.0),
                max_entity_range: Some(50_000.0),
                ..Default::default()
            },
        );
        table.configure_override(kind::PLATFORM, Some(platform_domain::AIR), DrOverride::range(20_000.0));

        let air = table.params_for(kind::PLATFORM, platform_domain::AIR);
        assert_approx_eq!(air.max_entity_range, 20_000.0);
        // Not set on the exact layer, inherited from the kind layer
        assert_approx_eq!(air.max_age, 30.0);
        assert_approx_eq!(air.max_time_dr, 5.0);

        let land = table.params_for(kind::PLATFORM, platform_domain::LAND);
        assert_approx_eq!(land.max_entity_range, 50_000.0);

        let munition = table.params_for(kind::MUNITION, 1);
        assert!(munition.max_entity_range.is_infinite());
        assert_approx_eq!(munition.max_age, 12.5);
    }

    #[test]
    fn test_zero_range_excludes() {
        let mut table = DrTable::default();
        table.configure_override(kind::LIFEFORM, None, DrOverride::range(0.0));
        let here = Vec3::ZERO;
        assert!(!table.is_within_range(&here, &here, kind::LIFEFORM, 1));
        assert!(table.is_within_range(&here, &Vec3::new(1e9, 0.0, 0.0), kind::PLATFORM, 1));
    }

    #[test]
    fn test_range_boundaries() {
        let mut table = DrTable::default();
        table.configure_default(DrParams {
            max_entity_range: 5_000.0,
            ..Default::default()
        });
        let here = Vec3::ZERO;
        assert!(table.is_within_range(&here, &Vec3::new(4_999.0, 0.0, 0.0), 1, 1));
        assert!(!table.is_within_range(&here, &Vec3::new(3_000.0, 4_001.0, 0.0), 1, 1));
    }

    #[test]
    fn test_accept_without_baseline() {
        let table = DrTable::default();
        assert!(table.should_accept_update(&air_nib(None), &Vec3::ZERO, &EulerAngles::default(), 0.0));
    }

    #[test]
    fn test_heartbeat_threshold() {
        let table = DrTable::default();
        let nib = air_nib(Some(moving(100.0)));

        // On the predicted track, 4 s later: suppressed
        let on_track = Vec3::new(400.0, 0.0, 0.0);
        assert!(!table.should_accept_update(&nib, &on_track, &EulerAngles::default(), 104.0));

        // 6 s later: accepted regardless of error
        let on_track = Vec3::new(600.0, 0.0, 0.0);
        assert!(table.should_accept_update(&nib, &on_track, &EulerAngles::default(), 106.0));
    }

    #[test]
    fn test_position_threshold() {
        let table = DrTable::default();
        let nib = air_nib(Some(moving(0.0)));
        assert!(!table.should_send(&nib, &Vec3::new(102.0, 2.0, 0.0), &EulerAngles::default(), 1.0));
        assert!(table.should_send(&nib, &Vec3::new(104.0, 0.0, 0.0), &EulerAngles::default(), 1.0));
    }

    #[test]
    fn test_orientation_threshold() {
        let table = DrTable::default();
        let nib = air_nib(Some(DrState {
            algorithm: DeadReckoningAlgorithm::Static,
            ..Default::default()
        }));
        let slight = EulerAngles::new(0.01, 0.0, 0.0);
        let turned = EulerAngles::new(0.1, 0.0, 0.0);
        assert!(!table.should_accept_update(&nib, &Vec3::ZERO, &slight, 1.0));
        assert!(table.should_accept_update(&nib, &Vec3::ZERO, &turned, 1.0));
    }

    #[test]
    fn test_orientation_error_wraps() {
        let a = EulerAngles::new(PI - 0.01, 0.0, 0.0);
        let b = EulerAngles::new(-PI + 0.01, 0.0, 0.0);
        assert_approx_eq!(orientation_error(&a, &b), 0.02, 1e-9);
    }

    #[test]
    fn test_predict_with_acceleration() {
        let state = DrState {
            algorithm: DeadReckoningAlgorithm::Fvw,
            position: Vec3::new(10.0, 0.0, 0.0),
            velocity: Vec3::new(1.0, 0.0, 0.0),
            acceleration: Vec3::new(2.0, 0.0, 0.0),
            time: 5.0,
            ..Default::default()
        };
        let (position, _) = state.predict(7.0);
        // 10 + 1*2 + 0.5*2*4
        assert_approx_eq!(position.x, 16.0);
    }

    #[test]
    fn test_predict_rotation() {
        let state = DrState {
            algorithm: DeadReckoningAlgorithm::Rpw,
            angular_velocity: Vec3::new(0.0, 0.0, 0.1),
            ..Default::default()
        };
        let (_, orientation) = state.predict(2.0);
        assert_approx_eq!(orientation.psi, 0.2);

        let fixed = DrState {
            algorithm: DeadReckoningAlgorithm::Fpw,
            ..state
        };
        assert_approx_eq!(fixed.predict(2.0).1.psi, 0.0);
    }
}
