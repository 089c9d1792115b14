//! Navigation of the mobile API `houses` document into typed raw records.
//!
//! Only the document skeleton (`result`, `houses`, `thermostats`) is
//! mandatory. Every field below it is best-effort: a missing or mistyped field
//! becomes `None` in the record rather than an error.

use serde::Serialize;
use serde_json::Value;
use tracing::{trace, warn};

use crate::types::TemperatureUnit;
use crate::units::{flag, integer, number, text};
use crate::{Error, Result};

/// Raw thermostat fields as last reported, parsed but not normalized.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThermostatRecord {
    pub id: i64,
    pub name: Option<String>,
    pub thermostat_type: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub device_id: Option<String>,
    pub firmware_version: Option<String>,
    pub firmware_build_number: Option<String>,

    pub unit: Option<TemperatureUnit>,
    pub deadband: Option<i64>,
    pub setpoint_heat_min: Option<f64>,
    pub setpoint_heat_max: Option<f64>,
    pub setpoint_cool_min: Option<f64>,
    pub setpoint_cool_max: Option<f64>,

    pub has_outdoor_temperature: Option<bool>,
    pub has_indoor_humidity: Option<bool>,
    pub has_dehumidify_support: bool,
    pub has_humidify_support: bool,
    pub has_variable_fan_speed: bool,
    pub has_variable_speed_compressor: bool,
    pub has_emergency_heat: bool,

    pub outdoor_temperature: Option<f64>,
    /// Percent, or already a fraction.
    pub indoor_humidity: Option<f64>,
    /// Percent, or already a fraction.
    pub compressor_speed: Option<f64>,
    /// Percent, or already a fraction.
    pub requested_compressor_speed: Option<f64>,

    pub fan_mode: Option<String>,
    pub fan_modes: Vec<String>,
    pub fan_speed: Option<f64>,
    pub fan_speed_values: Vec<f64>,
    pub dehumidify_setpoint: Option<f64>,
    pub dehumidify_values: Vec<f64>,
    pub humidify_setpoint: Option<f64>,
    pub humidify_values: Vec<f64>,
    pub air_cleaner_mode: Option<String>,
    pub emergency_heat_active: Option<bool>,

    pub system_status: Option<String>,
    pub blower_active: Option<bool>,
}

/// Raw zone fields as last reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ZoneRecord {
    pub id: i64,
    pub name: Option<String>,
    pub temperature: Option<f64>,
    pub heating_setpoint: Option<f64>,
    pub cooling_setpoint: Option<f64>,
    pub current_mode: Option<String>,
    pub requested_mode: Option<String>,
    pub modes: Vec<String>,
    pub presets: Vec<String>,
    /// Label of the selected preset, or the raw selection when no option
    /// matches it.
    pub preset: Option<String>,
    pub status: Option<String>,
    pub run_mode: Option<String>,
    pub run_mode_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThermostatSnapshot {
    pub record: ThermostatRecord,
    pub zones: Vec<ZoneRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HouseSnapshot {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub thermostats: Vec<ThermostatSnapshot>,
}

/// A whole parsed document, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub houses: Vec<HouseSnapshot>,
}

impl Snapshot {
    pub fn parse(document: &Value) -> Result<Self> {
        Self::parse_selected(document, None)
    }

    /// Parses only the house with id `house_id`, or every house when `None`.
    ///
    /// Houses that are not selected are skipped before their `thermostats`
    /// array is checked, so a malformed sibling does not fail the parse.
    pub fn parse_selected(document: &Value, house_id: Option<i64>) -> Result<Self> {
        let result = document
            .get("result")
            .filter(|v| v.is_object())
            .ok_or(Error::MissingKey("result"))?;
        let Some(Value::Array(houses)) = result.get("houses") else {
            return Err(Error::MissingKey("houses"));
        };

        let houses = match house_id {
            Some(id) => {
                let house = houses
                    .iter()
                    .find(|h| h.get("id").and_then(integer) == Some(id))
                    .ok_or(Error::HouseNotFound(id))?;
                vec![parse_house(house)?]
            }
            None => houses
                .iter()
                .map(parse_house)
                .collect::<Result<Vec<_>>>()?,
        };
        Ok(Snapshot { houses })
    }
}

fn parse_house(house: &Value) -> Result<HouseSnapshot> {
    let Some(Value::Array(thermostats)) = house.get("thermostats") else {
        return Err(Error::MissingKey("thermostats"));
    };

    let id = house.get("id").and_then(integer);
    let thermostats = thermostats
        .iter()
        .filter_map(|t| {
            let parsed = parse_thermostat(t);
            if parsed.is_none() {
                warn!(house = ?id, "skipping thermostat record without an id");
            }
            parsed
        })
        .collect();

    Ok(HouseSnapshot {
        id,
        name: house.get("name").and_then(text),
        thermostats,
    })
}

/// Finds the entry of a `features` or `settings` array whose `key` equals `name`.
fn entry<'a>(list: Option<&'a Value>, key: &str, name: &str) -> Option<&'a Value> {
    list?
        .as_array()?
        .iter()
        .find(|item| item.get(key).and_then(Value::as_str) == Some(name))
}

fn numbers(value: Option<&Value>) -> Vec<f64> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(number).collect(),
        _ => Vec::new(),
    }
}

/// `value` fields of an `options` array, falling back to labels.
fn option_values(options: Option<&Value>) -> Vec<String> {
    match options {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|o| o.get("value").and_then(text).or_else(|| o.get("label").and_then(text)))
            .collect(),
        _ => Vec::new(),
    }
}

fn option_labels(options: Option<&Value>) -> Vec<String> {
    match options {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|o| o.get("label").and_then(text))
            .collect(),
        _ => Vec::new(),
    }
}

/// Label of the option whose `value` matches `selected`.
fn selected_label(options: Option<&Value>, selected: &Value) -> Option<String> {
    let selected_text = text(selected);
    options?
        .as_array()?
        .iter()
        .find(|o| match o.get("value") {
            Some(v) => v == selected || (selected_text.is_some() && text(v) == selected_text),
            None => false,
        })
        .and_then(|o| o.get("label"))
        .and_then(text)
}

fn advanced_info(features: Option<&Value>, label: &str) -> Option<String> {
    entry(features, "name", "advanced_info")?
        .get("items")?
        .as_array()?
        .iter()
        .find(|item| item.get("label").and_then(Value::as_str) == Some(label))
        .and_then(|item| item.get("value"))
        .and_then(text)
}

fn parse_thermostat(data: &Value) -> Option<ThermostatSnapshot> {
    let id = data.get("id").and_then(integer)?;

    let features = data.get("features");
    let settings = data.get("settings");
    let core = entry(features, "name", "thermostat").unwrap_or(&Value::Null);
    let compressor = entry(features, "name", "thermostat_compressor_speed").unwrap_or(&Value::Null);

    let fan_mode = entry(settings, "type", "fan_mode");
    let fan_speed = entry(settings, "type", "fan_speed");
    let dehumidify = entry(settings, "type", "dehumidify");
    let humidify = entry(settings, "type", "humidify");
    let scale = entry(settings, "type", "scale");

    let unit = scale
        .and_then(|s| s.get("current_value"))
        .or_else(|| core.get("scale"))
        .and_then(Value::as_str)
        .and_then(TemperatureUnit::from_nexia_str);

    let record = ThermostatRecord {
        id,
        name: data.get("name").and_then(text),
        thermostat_type: data.get("type").and_then(text),
        manufacturer: data.get("manufacturer").and_then(text),
        model: advanced_info(features, "Model"),
        device_id: advanced_info(features, "AUID"),
        firmware_version: advanced_info(features, "Firmware Version"),
        firmware_build_number: advanced_info(features, "Firmware Build Number"),

        unit,
        deadband: core.get("setpoint_delta").and_then(integer),
        setpoint_heat_min: core.get("setpoint_heat_min").and_then(number),
        setpoint_heat_max: core.get("setpoint_heat_max").and_then(number),
        setpoint_cool_min: core.get("setpoint_cool_min").and_then(number),
        setpoint_cool_max: core.get("setpoint_cool_max").and_then(number),

        has_outdoor_temperature: data.get("has_outdoor_temperature").and_then(flag),
        has_indoor_humidity: data.get("has_indoor_humidity").and_then(flag),
        has_dehumidify_support: capability(data, "has_dehumidify_support"),
        has_humidify_support: capability(data, "has_humidify_support"),
        has_variable_fan_speed: capability(data, "has_variable_fan_speed"),
        has_variable_speed_compressor: capability(data, "has_variable_speed_compressor"),
        has_emergency_heat: capability(data, "has_emergency_heat"),

        outdoor_temperature: data.get("outdoor_temperature").and_then(number),
        indoor_humidity: data.get("indoor_humidity").and_then(number),
        compressor_speed: compressor.get("compressor_speed").and_then(number),
        requested_compressor_speed: compressor.get("requested_compressor_speed").and_then(number),

        fan_mode: fan_mode.and_then(|s| s.get("current_value")).and_then(text),
        fan_modes: option_values(fan_mode.and_then(|s| s.get("options"))),
        fan_speed: fan_speed.and_then(|s| s.get("current_value")).and_then(number),
        fan_speed_values: numbers(fan_speed.and_then(|s| s.get("values"))),
        dehumidify_setpoint: dehumidify.and_then(|s| s.get("current_value")).and_then(number),
        dehumidify_values: numbers(dehumidify.and_then(|s| s.get("values"))),
        humidify_setpoint: humidify.and_then(|s| s.get("current_value")).and_then(number),
        humidify_values: numbers(humidify.and_then(|s| s.get("values"))),
        air_cleaner_mode: entry(settings, "type", "air_cleaner_mode")
            .and_then(|s| s.get("current_value"))
            .and_then(text),
        emergency_heat_active: entry(settings, "type", "emergency_heat")
            .and_then(|s| s.get("current_value"))
            .and_then(flag),

        system_status: data
            .get("system_status")
            .or_else(|| core.get("system_status"))
            .and_then(text),
        blower_active: core.get("blower_active").and_then(flag),
    };

    let zones = match data.get("zones") {
        Some(Value::Array(zones)) => zones
            .iter()
            .filter_map(|z| {
                let parsed = parse_zone(z);
                if parsed.is_none() {
                    warn!(thermostat = id, "skipping zone record without an id");
                }
                parsed
            })
            .collect(),
        _ => Vec::new(),
    };

    trace!(thermostat = id, zones = zones.len(), "parsed thermostat record");
    Some(ThermostatSnapshot { record, zones })
}

fn capability(data: &Value, key: &str) -> bool {
    data.get(key).and_then(flag).unwrap_or(false)
}

fn parse_zone(data: &Value) -> Option<ZoneRecord> {
    let id = data.get("id").and_then(integer)?;

    let features = data.get("features");
    let mode = entry(features, "name", "thermostat_mode");
    let preset = entry(features, "name", "preset_selected");
    let run_mode = entry(features, "name", "thermostat_run_mode");

    let preset_options = preset.and_then(|p| p.get("options"));
    let selected_preset = preset.and_then(|p| p.get("value")).map(|selected| {
        selected_label(preset_options, selected).or_else(|| text(selected))
    });

    let run_mode_code = run_mode.and_then(|r| r.get("value"));

    Some(ZoneRecord {
        id,
        name: data.get("name").and_then(text),
        temperature: data.get("temperature").and_then(number),
        heating_setpoint: data.pointer("/setpoints/heat").and_then(number),
        cooling_setpoint: data.pointer("/setpoints/cool").and_then(number),
        current_mode: data.get("current_zone_mode").and_then(text),
        requested_mode: mode.and_then(|m| m.get("value")).and_then(text),
        modes: option_values(mode.and_then(|m| m.get("options"))),
        presets: option_labels(preset_options),
        preset: selected_preset.flatten(),
        status: data.get("zone_status").and_then(text),
        run_mode: run_mode_code.and_then(text),
        run_mode_label: run_mode_code
            .and_then(|code| selected_label(run_mode.and_then(|r| r.get("options")), code)),
    })
}
