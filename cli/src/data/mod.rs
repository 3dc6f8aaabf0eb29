pub mod controller;
pub mod format;
pub mod history_store;
pub mod items;
pub mod recorder;
pub mod settings_battery;

pub use controller::{BatteryDataController, ChargeState};
pub use history_store::{BatteryRecord, HistoryStore, HistoryStoreError};
pub use items::{InfoItem, InfoItemGroup};
pub use recorder::Recorder;
pub use settings_battery::{
    HelperFetcher, SettingsBatteryCache, SettingsBatteryData, SettingsBatteryFetcher, StaticFetcher,
};
