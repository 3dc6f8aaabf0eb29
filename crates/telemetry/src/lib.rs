//! Raw battery telemetry model and normalizer.
//!
//! The private battery service exposes one nested key/value dictionary per
//! refresh. This crate turns that untyped dictionary into a fully optional
//! typed record ([`RawBatteryInfo`]) and defines the [`TelemetrySource`]
//! strategy used to obtain it.

mod raw;
mod source;

pub use raw::{
    AccessoryDetails, AdapterDetails, BatteryPackData, ChargerData, LifetimeData, RawBatteryInfo,
    UsbHvcOption,
};
pub use source::{IoRegSource, StaticSource, TelemetrySource};
