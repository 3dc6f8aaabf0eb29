//! Typed view over the raw battery telemetry dictionary.
//!
//! Every field is optional: a key the device or OS build does not report is
//! simply absent, never an error. Values pass through unvalidated.

use plist::{Dictionary, Value};

fn get_int(dict: &Dictionary, key: &str) -> Option<i64> {
    dict.get(key).and_then(Value::as_signed_integer)
}

fn get_string(dict: &Dictionary, key: &str) -> Option<String> {
    dict.get(key).and_then(Value::as_string).map(str::to_owned)
}

// Boolean-like telemetry fields are integers; only an exact 1 means true.
fn get_flag(dict: &Dictionary, key: &str) -> Option<bool> {
    get_int(dict, key).map(|v| v == 1)
}

fn get_dict<'a>(dict: &'a Dictionary, key: &str) -> Option<&'a Dictionary> {
    dict.get(key).and_then(Value::as_dictionary)
}

fn get_dict_array<'a>(dict: &'a Dictionary, key: &str) -> Vec<&'a Dictionary> {
    dict.get(key)
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_dictionary).collect())
        .unwrap_or_default()
}

/// One advertised USB-PD voltage/current tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsbHvcOption {
    pub index: i64,
    pub max_current: i64,
    pub max_voltage: i64,
}

impl UsbHvcOption {
    fn from_dict(dict: &Dictionary) -> Self {
        Self {
            index: get_int(dict, "Index").unwrap_or(0),
            max_current: get_int(dict, "MaxCurrent").unwrap_or(0),
            max_voltage: get_int(dict, "MaxVoltage").unwrap_or(0),
        }
    }
}

/// Charger/adapter identity and negotiation state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdapterDetails {
    pub adapter_id: Option<i64>,
    pub adapter_voltage: Option<i64>,
    pub current: Option<i64>,
    pub description: Option<String>,
    pub family_code: Option<String>,
    pub is_wireless: Option<bool>,
    pub pmu_configuration: Option<i64>,
    pub shared_source: Option<bool>,
    pub source: Option<i64>,
    pub usb_hvc_index: Option<i64>,
    pub usb_hvc_menu: Vec<UsbHvcOption>,
    pub voltage: Option<i64>,
    pub watts: Option<i64>,
    pub name: Option<String>,
    pub model: Option<String>,
    pub manufacturer: Option<String>,
    pub serial: Option<String>,
    pub hw_version: Option<String>,
    pub fw_version: Option<String>,
}

impl AdapterDetails {
    pub fn from_dict(dict: &Dictionary) -> Self {
        Self {
            adapter_id: get_int(dict, "AdapterID"),
            adapter_voltage: get_int(dict, "AdapterVoltage"),
            current: get_int(dict, "Current"),
            description: get_string(dict, "Description"),
            family_code: get_string(dict, "FamilyCode"),
            is_wireless: get_flag(dict, "IsWireless"),
            pmu_configuration: get_int(dict, "PMUConfiguration"),
            shared_source: get_flag(dict, "SharedSource"),
            source: get_int(dict, "Source"),
            usb_hvc_index: get_int(dict, "UsbHvcHvcIndex"),
            usb_hvc_menu: get_dict_array(dict, "UsbHvcMenu")
                .into_iter()
                .map(UsbHvcOption::from_dict)
                .collect(),
            voltage: get_int(dict, "Voltage"),
            watts: get_int(dict, "Watts"),
            name: get_string(dict, "Name"),
            model: get_string(dict, "Model"),
            manufacturer: get_string(dict, "Manufacturer"),
            serial: get_string(dict, "SerialString"),
            hw_version: get_string(dict, "HwVersion"),
            fw_version: get_string(dict, "FwVersion"),
        }
    }
}

/// External accessory state (e.g. a battery pack). The telemetry reports a
/// list but only one accessory is modeled; the first entry wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessoryDetails {
    pub current_capacity: Option<i64>,
    pub is_charging: Option<bool>,
    pub external_connected: Option<bool>,
}

impl AccessoryDetails {
    pub fn from_dict(dict: &Dictionary) -> Self {
        Self {
            current_capacity: get_int(dict, "CurrentCapacity"),
            is_charging: get_flag(dict, "IsCharging"),
            external_connected: get_flag(dict, "ExternalConnected"),
        }
    }
}

/// Live charge-path measurements reported by the charger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChargerData {
    pub charging_voltage: Option<i64>,
    pub charging_current: Option<i64>,
    pub not_charging_reason: Option<i64>,
    pub vac_voltage_limit: Option<i64>,
}

impl ChargerData {
    pub fn from_dict(dict: &Dictionary) -> Self {
        Self {
            charging_voltage: get_int(dict, "ChargingVoltage"),
            charging_current: get_int(dict, "ChargingCurrent"),
            not_charging_reason: get_int(dict, "NotChargingReason"),
            vac_voltage_limit: get_int(dict, "VacVoltageLimit"),
        }
    }
}

/// Historical extremes recorded by the gas gauge over the pack's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifetimeData {
    pub average_temperature: Option<i64>,
    pub maximum_temperature: Option<i64>,
    pub minimum_temperature: Option<i64>,
    pub cycle_count_last_qmax: Option<i64>,
    pub maximum_charge_current: Option<i64>,
    pub maximum_discharge_current: Option<i64>,
    pub maximum_pack_voltage: Option<i64>,
    pub minimum_pack_voltage: Option<i64>,
    pub maximum_qmax: Option<i64>,
    pub minimum_qmax: Option<i64>,
    pub total_operating_time: Option<i64>,
}

impl LifetimeData {
    pub fn from_dict(dict: &Dictionary) -> Self {
        Self {
            average_temperature: get_int(dict, "AverageTemperature"),
            maximum_temperature: get_int(dict, "MaximumTemperature"),
            minimum_temperature: get_int(dict, "MinimumTemperature"),
            cycle_count_last_qmax: get_int(dict, "CycleCountLastQmax"),
            maximum_charge_current: get_int(dict, "MaximumChargeCurrent"),
            maximum_discharge_current: get_int(dict, "MaximumDischargeCurrent"),
            maximum_pack_voltage: get_int(dict, "MaximumPackVoltage"),
            minimum_pack_voltage: get_int(dict, "MinimumPackVoltage"),
            maximum_qmax: get_int(dict, "MaximumQmax"),
            minimum_qmax: get_int(dict, "MinimumQmax"),
            total_operating_time: get_int(dict, "TotalOperatingTime"),
        }
    }
}

/// Pack-level data nested under `BatteryData`.
///
/// Qmax fields also appear inside [`LifetimeData`]; the two namespaces are
/// kept independent and are not cross-checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatteryPackData {
    pub lifetime_data: Option<LifetimeData>,
    pub maximum_qmax: Option<i64>,
    pub minimum_qmax: Option<i64>,
}

impl BatteryPackData {
    pub fn from_dict(dict: &Dictionary) -> Self {
        Self {
            lifetime_data: get_dict(dict, "LifetimeData").map(LifetimeData::from_dict),
            maximum_qmax: get_int(dict, "MaximumQmax"),
            minimum_qmax: get_int(dict, "MinimumQmax"),
        }
    }
}

/// Snapshot of everything the telemetry interface reported for one refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBatteryInfo {
    pub update_time: Option<i64>,
    pub battery_installed: Option<i64>,
    pub boot_path_updated: Option<i64>,
    pub boot_voltage: Option<i64>,
    pub serial_number: Option<String>,
    pub voltage: Option<i64>,
    pub instant_amperage: Option<i64>,
    pub current_capacity: Option<i64>,
    pub apple_raw_current_capacity: Option<i64>,
    pub design_capacity: Option<i64>,
    pub nominal_charge_capacity: Option<i64>,
    pub is_charging: Option<bool>,
    pub cycle_count: Option<i64>,
    pub temperature: Option<i64>,
    pub best_adapter_index: Option<i64>,
    pub battery_data: Option<BatteryPackData>,
    pub adapter_details: Option<AdapterDetails>,
    pub accessory_details: Option<AccessoryDetails>,
    pub raw_adapter_details: Vec<AdapterDetails>,
    pub charger_data: Option<ChargerData>,
}

impl RawBatteryInfo {
    pub fn from_dict(dict: &Dictionary) -> Self {
        Self {
            update_time: get_int(dict, "UpdateTime"),
            battery_installed: get_int(dict, "BatteryInstalled"),
            boot_path_updated: get_int(dict, "BootPathUpdated"),
            boot_voltage: get_int(dict, "BootVoltage"),
            serial_number: get_string(dict, "Serial"),
            voltage: get_int(dict, "Voltage"),
            instant_amperage: get_int(dict, "InstantAmperage"),
            current_capacity: get_int(dict, "CurrentCapacity"),
            apple_raw_current_capacity: get_int(dict, "AppleRawCurrentCapacity"),
            design_capacity: get_int(dict, "DesignCapacity"),
            nominal_charge_capacity: get_int(dict, "NominalChargeCapacity"),
            is_charging: get_flag(dict, "IsCharging"),
            cycle_count: get_int(dict, "CycleCount"),
            temperature: get_int(dict, "Temperature"),
            best_adapter_index: get_int(dict, "BestAdapterIndex"),
            battery_data: get_dict(dict, "BatteryData").map(BatteryPackData::from_dict),
            adapter_details: get_dict(dict, "AdapterDetails").map(AdapterDetails::from_dict),
            accessory_details: get_dict_array(dict, "AccessoryDetails")
                .first()
                .map(|d| AccessoryDetails::from_dict(d)),
            raw_adapter_details: get_dict_array(dict, "AppleRawAdapterDetails")
                .into_iter()
                .map(AdapterDetails::from_dict)
                .collect(),
            charger_data: get_dict(dict, "ChargerData").map(ChargerData::from_dict),
        }
    }
}
