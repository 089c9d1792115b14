use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{trace, warn};

use crate::merge::Keyed;
use crate::snapshot::ZoneRecord;
use crate::thermostat::{Thermostat, ThermostatInner};
use crate::types::{DEFAULT_ZONE_MODES, SetpointStatus, ZONE_STATUS_IDLE};
use crate::units::canonical_mode;

/// Handle to one climate zone.
///
/// Clones share the same zone; equality is identity. The handle stays valid
/// after its zone disappears from a snapshot, but then stops receiving updates.
#[derive(Clone)]
pub struct Zone {
    inner: Arc<ZoneInner>,
}

struct ZoneInner {
    id: i64,
    thermostat: Weak<ThermostatInner>,
    record: RwLock<ZoneRecord>,
}

impl Zone {
    pub(crate) fn new(record: ZoneRecord, thermostat: Weak<ThermostatInner>) -> Self {
        check_integrity(&record);
        Self {
            inner: Arc::new(ZoneInner {
                id: record.id,
                thermostat,
                record: RwLock::new(record),
            }),
        }
    }

    /// Replaces the whole raw record; fields absent from `record` become absent.
    pub(crate) fn apply(&self, record: ZoneRecord) {
        check_integrity(&record);
        trace!(zone = self.inner.id, "updating zone record");
        *self.inner.record.write() = record;
    }

    pub fn get_id(&self) -> i64 {
        self.inner.id
    }

    /// The owning thermostat, while any handle to it is still alive.
    pub fn thermostat(&self) -> Option<Thermostat> {
        self.inner.thermostat.upgrade().map(Thermostat::from_inner)
    }

    /// Copy of the most recently merged raw record.
    pub fn record(&self) -> ZoneRecord {
        self.inner.record.read().clone()
    }

    pub fn get_name(&self) -> Option<String> {
        self.inner.record.read().name.clone()
    }

    pub fn get_temperature(&self) -> Option<f64> {
        self.inner.record.read().temperature
    }

    pub fn get_cooling_setpoint(&self) -> Option<f64> {
        self.inner.record.read().cooling_setpoint
    }

    pub fn get_heating_setpoint(&self) -> Option<f64> {
        self.inner.record.read().heating_setpoint
    }

    pub fn get_current_mode(&self) -> Option<String> {
        self.inner.record.read().current_mode.as_deref().map(canonical_mode)
    }

    pub fn get_requested_mode(&self) -> Option<String> {
        self.inner.record.read().requested_mode.as_deref().map(canonical_mode)
    }

    pub fn get_modes(&self) -> Vec<String> {
        let record = self.inner.record.read();
        if record.modes.is_empty() {
            return DEFAULT_ZONE_MODES.iter().map(|m| m.to_string()).collect();
        }
        record.modes.iter().map(|m| canonical_mode(m)).collect()
    }

    pub fn get_presets(&self) -> Vec<String> {
        self.inner.record.read().presets.clone()
    }

    /// Current preset. Expected to be one of [`Zone::get_presets`]; when it is
    /// not, the raw selection is returned as-is.
    pub fn get_preset(&self) -> Option<String> {
        self.inner.record.read().preset.clone()
    }

    pub fn get_status(&self) -> String {
        match self.inner.record.read().status.as_deref().map(str::trim) {
            Some(status) if !status.is_empty() => status.to_string(),
            _ => ZONE_STATUS_IDLE.to_string(),
        }
    }

    /// Whether the zone is currently asking for conditioned air.
    pub fn is_calling(&self) -> bool {
        let status = self.get_status();
        !(status.eq_ignore_ascii_case(ZONE_STATUS_IDLE) || status.eq_ignore_ascii_case("Damper Closed"))
    }

    /// Hold classification, if the run mode is one of the known codes.
    pub fn setpoint_status(&self) -> Option<SetpointStatus> {
        match self.inner.record.read().run_mode.as_deref() {
            Some(code) => SetpointStatus::from_run_mode(code),
            None => Some(SetpointStatus::FollowingSchedule),
        }
    }

    pub fn get_setpoint_status(&self) -> String {
        if let Some(status) = self.setpoint_status() {
            return status.as_str().to_string();
        }
        let record = self.inner.record.read();
        record
            .run_mode_label
            .clone()
            .or_else(|| record.run_mode.clone())
            .unwrap_or_default()
    }

    pub fn is_in_permanent_hold(&self) -> bool {
        self.setpoint_status() == Some(SetpointStatus::PermanentHold)
    }
}

fn check_integrity(record: &ZoneRecord) {
    if let Some(preset) = &record.preset
        && !record.presets.contains(preset)
    {
        warn!(
            zone = record.id,
            preset = %preset,
            presets = ?record.presets,
            "current preset is not among the listed presets"
        );
    }
    if let Some(code) = &record.run_mode
        && SetpointStatus::from_run_mode(code).is_none()
    {
        warn!(zone = record.id, run_mode = %code, "unrecognized run mode");
    }
}

impl Keyed for Zone {
    fn key(&self) -> i64 {
        self.inner.id
    }
}

impl PartialEq for Zone {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Zone {}

impl fmt::Debug for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Zone")
            .field("id", &self.inner.id)
            .field("name", &self.inner.record.read().name)
            .finish()
    }
}
