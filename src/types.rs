use std::fmt;

use serde::Serialize;

/// Temperature scale a thermostat reports its setpoints and readings in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TemperatureUnit {
    #[default]
    Fahrenheit,
    Celsius,
}

impl TemperatureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::Fahrenheit => "F",
            TemperatureUnit::Celsius => "C",
        }
    }

    pub fn from_nexia_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "f" | "fahrenheit" => Some(TemperatureUnit::Fahrenheit),
            "c" | "celsius" => Some(TemperatureUnit::Celsius),
            _ => None,
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hold classification of a zone's active setpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SetpointStatus {
    /// No hold: the zone runs its schedule.
    FollowingSchedule,
    TemporaryHold,
    PermanentHold,
}

impl SetpointStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetpointStatus::FollowingSchedule => "Following Schedule",
            SetpointStatus::TemporaryHold => "Temporary Hold",
            SetpointStatus::PermanentHold => "Permanent Hold",
        }
    }

    /// Maps a `thermostat_run_mode` code.
    pub fn from_run_mode(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "run_schedule" | "schedule" => Some(SetpointStatus::FollowingSchedule),
            "temporary_hold" | "hold" => Some(SetpointStatus::TemporaryHold),
            "permanent_hold" => Some(SetpointStatus::PermanentHold),
            _ => None,
        }
    }
}

impl fmt::Display for SetpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Zone operating modes offered when a zone record does not list its own.
pub const DEFAULT_ZONE_MODES: &[&str] = &["AUTO", "COOL", "HEAT", "OFF"];

/// Zone status reported when the record carries none.
pub const ZONE_STATUS_IDLE: &str = "Idle";

/// `(min, max)` fan speed when the thermostat omits its fan speed choices.
pub const DEFAULT_FAN_SPEED_LIMITS: (f64, f64) = (0.35, 1.0);

/// `(min, max)` humidity setpoint when the thermostat omits its choices.
pub const DEFAULT_HUMIDITY_LIMITS: (f64, f64) = (0.35, 0.65);

/// Setpoint bounds used when the thermostat feature block is absent.
pub const DEFAULT_SETPOINT_LIMITS_F: (f64, f64) = (55.0, 99.0);
pub const DEFAULT_SETPOINT_LIMITS_C: (f64, f64) = (12.5, 37.0);

pub const DEFAULT_DEADBAND: i64 = 3;
