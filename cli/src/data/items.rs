//! Display items: typed rows with stable IDs, grouped into titled sections.

/// Stable group identifiers. Persisted in the home view ordering setting,
/// so the values never change once shipped.
pub mod group_id {
    pub const BASIC: i64 = 1;
    pub const CHARGE: i64 = 2;
    pub const SETTINGS_BATTERY: i64 = 3;
    pub const SERIAL: i64 = 4;
    pub const QMAX: i64 = 5;
    pub const CHARGER: i64 = 6;
    pub const VOLTAGE: i64 = 7;
    pub const LIFETIME: i64 = 8;
    pub const NOT_CHARGE_REASON: i64 = 9;
    pub const CHARGING_POWER_AND_REASON: i64 = 10;
    pub const ACCESSORY: i64 = 11;
}

/// Stable item identifiers, namespaced by hundreds under their group.
pub mod item_id {
    // Basic (1xx)
    pub const HEALTH: i64 = 101;
    pub const CYCLE_COUNT: i64 = 102;
    pub const NOMINAL_CAPACITY: i64 = 103;
    pub const DESIGN_CAPACITY: i64 = 104;
    pub const CURRENT_CAPACITY: i64 = 105;
    pub const RAW_CURRENT_CAPACITY: i64 = 106;
    pub const TEMPERATURE: i64 = 107;
    pub const UPDATE_TIME: i64 = 108;
    pub const BATTERY_INSTALLED: i64 = 109;
    pub const BOOT_VOLTAGE: i64 = 110;

    // Charge (2xx)
    pub const CHARGING_STATE: i64 = 201;
    pub const CHARGING_POWER: i64 = 202;
    pub const ADAPTER_NAME: i64 = 203;
    pub const ADAPTER_WATTS: i64 = 204;
    pub const POWER_OPTION: i64 = 205;
    pub const POWER_OPTIONS: i64 = 206;
    pub const NOT_CHARGING_REASON: i64 = 207;
    pub const ADAPTER_MODEL: i64 = 208;
    pub const ADAPTER_MANUFACTURER: i64 = 209;

    // Settings battery info (3xx)
    pub const OS_MAXIMUM_CAPACITY: i64 = 301;
    pub const OS_CYCLE_COUNT: i64 = 302;
    pub const OS_POSSIBLE_REFRESH_DATE: i64 = 303;

    // Serial (4xx)
    pub const BATTERY_SERIAL: i64 = 401;
    pub const BATTERY_MANUFACTURER: i64 = 402;
    pub const ADAPTER_SERIAL: i64 = 403;

    // Qmax (5xx)
    pub const MAXIMUM_QMAX: i64 = 501;
    pub const MINIMUM_QMAX: i64 = 502;

    // Charger (6xx)
    pub const CHARGER_VOLTAGE: i64 = 601;
    pub const CHARGER_CURRENT: i64 = 602;
    pub const VAC_VOLTAGE_LIMIT: i64 = 603;

    // Voltage (7xx)
    pub const VOLTAGE: i64 = 701;
    pub const INSTANT_AMPERAGE: i64 = 702;

    // Lifetime (8xx)
    pub const AVERAGE_TEMPERATURE: i64 = 801;
    pub const MAXIMUM_TEMPERATURE: i64 = 802;
    pub const MINIMUM_TEMPERATURE: i64 = 803;
    pub const CYCLE_COUNT_LAST_QMAX: i64 = 804;
    pub const MAX_CHARGE_CURRENT: i64 = 805;
    pub const MAX_DISCHARGE_CURRENT: i64 = 806;
    pub const MAX_PACK_VOLTAGE: i64 = 807;
    pub const MIN_PACK_VOLTAGE: i64 = 808;
    pub const MAX_QMAX: i64 = 809;
    pub const MIN_QMAX: i64 = 810;
    pub const TOTAL_OPERATING_TIME: i64 = 811;

    // Accessory (11xx)
    pub const ACCESSORY_NAME: i64 = 1101;
    pub const ACCESSORY_POWER_MODE: i64 = 1102;
    pub const ACCESSORY_CURRENT_CAPACITY: i64 = 1103;
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfoItem {
    pub id: i64,
    pub text: String,
    pub detail: Option<String>,
    pub sort: i64,
}

impl InfoItem {
    pub fn new(id: i64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            detail: None,
            sort: id,
        }
    }

    pub fn with_detail(id: i64, text: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            detail: Some(detail.into()),
            sort: id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfoItemGroup {
    pub id: i64,
    pub title: String,
    pub footer: Option<String>,
    pub items: Vec<InfoItem>,
}

impl InfoItemGroup {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            footer: None,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, item: InfoItem) {
        self.items.push(item);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
