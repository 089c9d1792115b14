use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::debug;

use crate::home::{HomeInner, NexiaHome};
use crate::merge::{Keyed, reconcile};
use crate::snapshot::{ThermostatRecord, ThermostatSnapshot};
use crate::types::*;
use crate::units::{canonical_lower, fraction_limits, status_moves_air, to_fraction};
use crate::zone::Zone;

/// Handle to one physical thermostat and the zones it controls.
///
/// Clones share the same thermostat; equality is identity. Merges update the
/// thermostat in place, so a handle taken before a refresh reflects the
/// refreshed data as long as its id is still in the snapshot.
#[derive(Clone)]
pub struct Thermostat {
    inner: Arc<ThermostatInner>,
}

pub(crate) struct ThermostatInner {
    id: i64,
    home: Weak<HomeInner>,
    state: RwLock<ThermostatState>,
}

struct ThermostatState {
    record: ThermostatRecord,
    zones: Vec<Zone>,
}

impl Thermostat {
    pub(crate) fn new(snapshot: ThermostatSnapshot, home: Weak<HomeInner>) -> Self {
        let thermostat = Self {
            inner: Arc::new(ThermostatInner {
                id: snapshot.record.id,
                home,
                state: RwLock::new(ThermostatState {
                    record: ThermostatRecord::default(),
                    zones: Vec::new(),
                }),
            }),
        };
        thermostat.apply(snapshot);
        thermostat
    }

    pub(crate) fn from_inner(inner: Arc<ThermostatInner>) -> Self {
        Self { inner }
    }

    /// Replaces the raw record and reconciles the zones against `snapshot`.
    pub(crate) fn apply(&self, snapshot: ThermostatSnapshot) {
        let ThermostatSnapshot { record, zones } = snapshot;
        let owner = Arc::downgrade(&self.inner);

        let mut state = self.inner.state.write();
        state.record = record;
        let counts = reconcile(
            &mut state.zones,
            zones,
            |z| z.id,
            |zone, z| zone.apply(z),
            |z| Zone::new(z, owner.clone()),
        );
        debug!(
            thermostat = self.inner.id,
            added = counts.added,
            updated = counts.updated,
            removed = counts.removed,
            "merged zones"
        );
    }

    pub fn get_id(&self) -> i64 {
        self.inner.id
    }

    /// The home this thermostat was merged into, while it is still alive.
    pub fn home(&self) -> Option<NexiaHome> {
        self.inner.home.upgrade().map(NexiaHome::from_inner)
    }

    /// Copy of the most recently merged raw record.
    pub fn record(&self) -> ThermostatRecord {
        self.inner.state.read().record.clone()
    }

    fn read<T>(&self, f: impl FnOnce(&ThermostatRecord) -> T) -> T {
        f(&self.inner.state.read().record)
    }

    // -- Identity --

    pub fn get_thermostat_name(&self) -> Option<String> {
        self.read(|r| r.name.clone())
    }

    pub fn get_thermostat_model(&self) -> Option<String> {
        self.read(|r| r.model.clone())
    }

    pub fn get_thermostat_type(&self) -> Option<String> {
        self.read(|r| r.thermostat_type.clone())
    }

    pub fn get_thermostat_manufacturer(&self) -> Option<String> {
        self.read(|r| r.manufacturer.clone())
    }

    pub fn get_thermostat_firmware(&self) -> Option<String> {
        self.read(|r| r.firmware_version.clone())
    }

    pub fn get_thermostat_dev_build_number(&self) -> Option<String> {
        self.read(|r| r.firmware_build_number.clone())
    }

    pub fn get_thermostat_device_id(&self) -> Option<String> {
        self.read(|r| r.device_id.clone())
    }

    // -- Limits --

    pub fn get_unit(&self) -> TemperatureUnit {
        self.read(|r| r.unit.unwrap_or_default())
    }

    fn default_setpoint_limits(&self) -> (f64, f64) {
        match self.get_unit() {
            TemperatureUnit::Fahrenheit => DEFAULT_SETPOINT_LIMITS_F,
            TemperatureUnit::Celsius => DEFAULT_SETPOINT_LIMITS_C,
        }
    }

    /// Minimum separation between heating and cooling setpoints.
    pub fn get_deadband(&self) -> i64 {
        self.read(|r| r.deadband.unwrap_or(DEFAULT_DEADBAND))
    }

    /// `(lowest heating setpoint, highest cooling setpoint)` in native units.
    pub fn get_setpoint_limits(&self) -> (f64, f64) {
        let (lo, hi) = self.default_setpoint_limits();
        self.read(|r| (r.setpoint_heat_min.unwrap_or(lo), r.setpoint_cool_max.unwrap_or(hi)))
    }

    pub fn get_heat_setpoint_limits(&self) -> (f64, f64) {
        let (lo, hi) = self.default_setpoint_limits();
        self.read(|r| (r.setpoint_heat_min.unwrap_or(lo), r.setpoint_heat_max.unwrap_or(hi)))
    }

    pub fn get_cool_setpoint_limits(&self) -> (f64, f64) {
        let (lo, hi) = self.default_setpoint_limits();
        self.read(|r| (r.setpoint_cool_min.unwrap_or(lo), r.setpoint_cool_max.unwrap_or(hi)))
    }

    pub fn get_variable_fan_speed_limits(&self) -> (f64, f64) {
        self.read(|r| fraction_limits(&r.fan_speed_values).unwrap_or(DEFAULT_FAN_SPEED_LIMITS))
    }

    pub fn get_humidity_setpoint_limits(&self) -> (f64, f64) {
        self.read(|r| {
            fraction_limits(&r.dehumidify_values)
                .or_else(|| fraction_limits(&r.humidify_values))
                .unwrap_or(DEFAULT_HUMIDITY_LIMITS)
        })
    }

    // -- Capabilities --

    pub fn has_outdoor_temperature(&self) -> bool {
        self.read(|r| r.has_outdoor_temperature.unwrap_or(false))
    }

    pub fn has_relative_humidity(&self) -> bool {
        self.read(|r| r.has_indoor_humidity.unwrap_or(false))
    }

    pub fn has_dehumidify_support(&self) -> bool {
        self.read(|r| r.has_dehumidify_support)
    }

    pub fn has_humidify_support(&self) -> bool {
        self.read(|r| r.has_humidify_support)
    }

    pub fn has_variable_fan_speed(&self) -> bool {
        self.read(|r| r.has_variable_fan_speed)
    }

    pub fn has_variable_speed_compressor(&self) -> bool {
        self.read(|r| r.has_variable_speed_compressor)
    }

    pub fn has_emergency_heat(&self) -> bool {
        self.read(|r| r.has_emergency_heat)
    }

    // -- Live state --

    pub fn get_fan_mode(&self) -> Option<String> {
        self.read(|r| r.fan_mode.as_deref().map(canonical_lower))
    }

    pub fn get_fan_modes(&self) -> Vec<String> {
        self.read(|r| r.fan_modes.iter().map(|m| canonical_lower(m)).collect())
    }

    pub fn get_air_cleaner_mode(&self) -> Option<String> {
        self.read(|r| r.air_cleaner_mode.as_deref().map(canonical_lower))
    }

    /// Outdoor temperature in native units; `None` when the sensor is absent
    /// or reports no reading.
    pub fn get_outdoor_temperature(&self) -> Option<f64> {
        self.read(|r| match r.has_outdoor_temperature {
            Some(false) => None,
            _ => r.outdoor_temperature,
        })
    }

    pub fn get_relative_humidity(&self) -> Option<f64> {
        self.read(|r| match r.has_indoor_humidity {
            Some(false) => None,
            _ => r.indoor_humidity.map(to_fraction),
        })
    }

    pub fn get_current_compressor_speed(&self) -> Option<f64> {
        self.read(|r| r.compressor_speed.map(to_fraction))
    }

    pub fn get_requested_compressor_speed(&self) -> Option<f64> {
        self.read(|r| r.requested_compressor_speed.map(to_fraction))
    }

    pub fn get_fan_speed_setpoint(&self) -> Option<f64> {
        self.read(|r| r.fan_speed.map(to_fraction))
    }

    pub fn get_dehumidify_setpoint(&self) -> Option<f64> {
        self.read(|r| r.dehumidify_setpoint.map(to_fraction))
    }

    pub fn get_humidify_setpoint(&self) -> Option<f64> {
        self.read(|r| r.humidify_setpoint.map(to_fraction))
    }

    pub fn is_emergency_heat_active(&self) -> bool {
        self.read(|r| r.has_emergency_heat && r.emergency_heat_active.unwrap_or(false))
    }

    /// Equipment state as reported, e.g. "System Idle" or "Cooling".
    pub fn get_system_status(&self) -> Option<String> {
        self.read(|r| r.system_status.clone())
    }

    pub fn is_blower_active(&self) -> bool {
        self.read(|r| {
            r.blower_active
                .unwrap_or_else(|| r.system_status.as_deref().is_some_and(status_moves_air))
        })
    }

    // -- Zones --

    pub fn get_zone_ids(&self) -> Vec<i64> {
        self.inner.state.read().zones.iter().map(Zone::get_id).collect()
    }

    pub fn get_zone_by_id(&self, id: i64) -> Option<Zone> {
        self.inner
            .state
            .read()
            .zones
            .iter()
            .find(|z| z.get_id() == id)
            .cloned()
    }

    pub fn zones(&self) -> Vec<Zone> {
        self.inner.state.read().zones.clone()
    }
}

impl Keyed for Thermostat {
    fn key(&self) -> i64 {
        self.inner.id
    }
}

impl PartialEq for Thermostat {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Thermostat {}

impl fmt::Debug for Thermostat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("Thermostat")
            .field("id", &self.inner.id)
            .field("name", &state.record.name)
            .field("zones", &state.zones)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::ZoneRecord;

    fn snapshot(record: ThermostatRecord, zone_ids: &[i64]) -> ThermostatSnapshot {
        ThermostatSnapshot {
            record,
            zones: zone_ids
                .iter()
                .map(|&id| ZoneRecord { id, ..Default::default() })
                .collect(),
        }
    }

    fn thermostat(record: ThermostatRecord) -> Thermostat {
        Thermostat::new(snapshot(record, &[]), Weak::new())
    }

    #[test]
    fn defaults_for_sparse_record() {
        let t = thermostat(ThermostatRecord { id: 1, ..Default::default() });
        assert_eq!(t.get_unit(), TemperatureUnit::Fahrenheit);
        assert_eq!(t.get_deadband(), 3);
        assert_eq!(t.get_setpoint_limits(), (55.0, 99.0));
        assert_eq!(t.get_variable_fan_speed_limits(), (0.35, 1.0));
        assert_eq!(t.get_humidity_setpoint_limits(), (0.35, 0.65));
        assert_eq!(t.get_outdoor_temperature(), None);
        assert_eq!(t.get_relative_humidity(), None);
        assert_eq!(t.get_system_status(), None);
        assert!(!t.is_blower_active());
        assert!(!t.has_dehumidify_support());
        assert!(t.get_zone_ids().is_empty());
        assert!(t.home().is_none());
    }

    #[test]
    fn celsius_default_limits() {
        let t = thermostat(ThermostatRecord {
            id: 1,
            unit: Some(TemperatureUnit::Celsius),
            ..Default::default()
        });
        assert_eq!(t.get_unit().as_str(), "C");
        assert_eq!(t.get_setpoint_limits(), (12.5, 37.0));
    }

    #[test]
    fn percent_fields_become_fractions() {
        let t = thermostat(ThermostatRecord {
            id: 1,
            indoor_humidity: Some(52.0),
            compressor_speed: Some(69.0),
            requested_compressor_speed: Some(100.0),
            fan_speed: Some(35.0),
            dehumidify_setpoint: Some(0.45),
            ..Default::default()
        });
        assert_eq!(t.get_relative_humidity(), Some(0.52));
        assert_eq!(t.get_current_compressor_speed(), Some(0.69));
        assert_eq!(t.get_requested_compressor_speed(), Some(1.0));
        assert_eq!(t.get_fan_speed_setpoint(), Some(0.35));
        assert_eq!(t.get_dehumidify_setpoint(), Some(0.45));
    }

    #[test]
    fn fractional_readings_pass_through() {
        let t = thermostat(ThermostatRecord {
            id: 1,
            indoor_humidity: Some(0.41),
            compressor_speed: Some(0.69),
            requested_compressor_speed: Some(0.75),
            ..Default::default()
        });
        assert_eq!(t.get_relative_humidity(), Some(0.41));
        assert_eq!(t.get_current_compressor_speed(), Some(0.69));
        assert_eq!(t.get_requested_compressor_speed(), Some(0.75));
    }

    #[test]
    fn capability_flag_hides_readings() {
        let t = thermostat(ThermostatRecord {
            id: 1,
            has_outdoor_temperature: Some(false),
            outdoor_temperature: Some(40.0),
            has_indoor_humidity: Some(false),
            indoor_humidity: Some(30.0),
            ..Default::default()
        });
        assert_eq!(t.get_outdoor_temperature(), None);
        assert_eq!(t.get_relative_humidity(), None);
    }

    #[test]
    fn humidity_limits_fall_back_to_humidify() {
        let t = thermostat(ThermostatRecord {
            id: 1,
            humidify_values: vec![0.1, 0.45],
            ..Default::default()
        });
        assert_eq!(t.get_humidity_setpoint_limits(), (0.1, 0.45));
    }

    #[test]
    fn explicit_blower_flag_wins() {
        let t = thermostat(ThermostatRecord {
            id: 1,
            system_status: Some("System Idle".into()),
            blower_active: Some(true),
            ..Default::default()
        });
        assert!(t.is_blower_active());

        t.apply(snapshot(
            ThermostatRecord {
                id: 1,
                system_status: Some("Heating".into()),
                ..Default::default()
            },
            &[],
        ));
        assert!(t.is_blower_active());
    }

    #[test]
    fn emergency_heat_requires_support() {
        let t = thermostat(ThermostatRecord {
            id: 1,
            emergency_heat_active: Some(true),
            ..Default::default()
        });
        assert!(!t.is_emergency_heat_active());
        t.apply(snapshot(
            ThermostatRecord {
                id: 1,
                has_emergency_heat: true,
                emergency_heat_active: Some(true),
                ..Default::default()
            },
            &[],
        ));
        assert!(t.is_emergency_heat_active());
    }

    #[test]
    fn zones_keep_identity_and_back_reference() {
        let t = Thermostat::new(
            snapshot(ThermostatRecord { id: 1, ..Default::default() }, &[10, 20, 30]),
            Weak::new(),
        );
        let zone = t.get_zone_by_id(20).unwrap();
        assert_eq!(zone.thermostat(), Some(t.clone()));

        t.apply(snapshot(ThermostatRecord { id: 1, ..Default::default() }, &[30, 20]));
        assert_eq!(t.get_zone_ids(), vec![30, 20]);
        assert_eq!(t.get_zone_by_id(20), Some(zone.clone()));
        assert_eq!(t.get_zone_by_id(10), None);
        assert_eq!(zone.thermostat(), Some(t));
    }
}
