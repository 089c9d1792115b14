//! Live object graph of a Nexia home: thermostats and their zones, refreshed
//! in place from full mobile API `houses` snapshots.
//!
//! The crate performs no I/O. A fetcher hands each document to
//! [`NexiaHome::update_from_snapshot`] (or implements [`SnapshotSource`] and
//! calls [`NexiaHome::refresh`]); [`Thermostat`] and [`Zone`] handles obtained
//! earlier keep pointing at the same entities and see the new data.

mod config;
mod error;
mod home;
mod merge;
mod snapshot;
mod source;
mod thermostat;
mod types;
pub mod units;
mod zone;

pub use config::HomeConfig;
pub use error::{Error, Result};
pub use home::{HomeBuilder, NexiaHome};
pub use snapshot::{HouseSnapshot, Snapshot, ThermostatRecord, ThermostatSnapshot, ZoneRecord};
pub use source::SnapshotSource;
pub use thermostat::Thermostat;
pub use types::*;
pub use zone::Zone;
