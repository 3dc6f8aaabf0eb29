//! Builds the display model from a telemetry snapshot.
//!
//! The controller owns one snapshot at a time and turns it into grouped
//! [`InfoItem`]s. Missing hardware data never errors; every row falls back
//! to its own "Unknown" independently.

use batinfo_telemetry::{AdapterDetails, RawBatteryInfo, TelemetrySource};
use tracing::debug;

use crate::config::Settings;
use crate::data::format::{
    battery_manufacturer, format_centi_celsius, format_charging_power, format_millivolts,
    format_milliamps_rounded, format_maximum_capacity, format_operating_hours, format_timestamp,
    mask_serial_number, not_charging_reason_text, UNKNOWN,
};
use crate::data::items::{group_id, item_id, InfoItem, InfoItemGroup};
use crate::data::recorder::Recorder;
use crate::data::settings_battery::SettingsBatteryCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeState {
    Charging,
    NotCharging,
    Full,
    Unknown,
}

impl ChargeState {
    pub fn label(&self) -> &'static str {
        match self {
            ChargeState::Charging => "Charging",
            ChargeState::NotCharging => "Not charging",
            ChargeState::Full => "Fully charged",
            ChargeState::Unknown => UNKNOWN,
        }
    }
}

pub struct BatteryDataController {
    source: Box<dyn TelemetrySource>,
    settings: Settings,
    settings_battery: SettingsBatteryCache,
    snapshot: Option<RawBatteryInfo>,
    mask_serials: bool,
}

impl BatteryDataController {
    pub fn new(
        source: Box<dyn TelemetrySource>,
        settings: Settings,
        settings_battery: SettingsBatteryCache,
    ) -> Self {
        Self {
            source,
            settings,
            settings_battery,
            snapshot: None,
            mask_serials: true,
        }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn snapshot(&self) -> Option<&RawBatteryInfo> {
        self.snapshot.as_ref()
    }

    pub fn toggle_serial_mask(&mut self) {
        self.mask_serials = !self.mask_serials;
    }

    /// Re-fetch telemetry and hand the sample to the recorder.
    ///
    /// Returns the recorder outcome when a complete sample was available,
    /// so `true` means a row was persisted (or recording is off). An
    /// incomplete snapshot returns `true`; it is not a recording failure.
    pub fn refresh(&mut self, recorder: &mut Recorder) -> bool {
        self.snapshot = self.source.fetch();

        let Some(info) = &self.snapshot else {
            debug!(source = self.source.name(), "refresh produced no telemetry");
            return true;
        };

        match (
            info.cycle_count,
            info.nominal_charge_capacity,
            info.design_capacity,
        ) {
            (Some(cycles), Some(nominal), Some(design)) => {
                recorder.record_if_due(false, cycles, nominal, design)
            }
            _ => true,
        }
    }

    /// User-requested sample. Fails when the snapshot is incomplete.
    pub fn record_manual(&mut self, recorder: &mut Recorder) -> bool {
        if self.snapshot.is_none() {
            self.snapshot = self.source.fetch();
        }

        let Some(info) = &self.snapshot else {
            return false;
        };

        match (
            info.cycle_count,
            info.nominal_charge_capacity,
            info.design_capacity,
        ) {
            (Some(cycles), Some(nominal), Some(design)) => {
                recorder.record_if_due(true, cycles, nominal, design)
            }
            _ => false,
        }
    }

    pub fn charge_state(&self) -> ChargeState {
        let Some(info) = &self.snapshot else {
            return ChargeState::Unknown;
        };

        let reason = info
            .charger_data
            .and_then(|c| c.not_charging_reason)
            .unwrap_or(0);

        match info.is_charging {
            Some(true) => ChargeState::Charging,
            Some(false) if reason == 1 => ChargeState::Full,
            Some(false) => ChargeState::NotCharging,
            None => ChargeState::Unknown,
        }
    }

    /// Groups in the user-configured home order, empty groups dropped.
    pub fn home_groups(&mut self, recorder: &Recorder) -> Vec<InfoItemGroup> {
        let sequence = self.settings.effective_home_sequence();
        sequence
            .into_iter()
            .filter_map(|id| self.build_group(id, recorder))
            .filter(|g| !g.is_empty())
            .collect()
    }

    /// The fixed full-detail sequence.
    pub fn all_groups(&mut self, recorder: &Recorder) -> Vec<InfoItemGroup> {
        [
            group_id::BASIC,
            group_id::CHARGE,
            group_id::SETTINGS_BATTERY,
            group_id::SERIAL,
            group_id::QMAX,
            group_id::CHARGER,
            group_id::VOLTAGE,
            group_id::LIFETIME,
            group_id::ACCESSORY,
        ]
        .into_iter()
        .filter_map(|id| self.build_group(id, recorder))
        .filter(|g| !g.is_empty())
        .collect()
    }

    fn build_group(&mut self, id: i64, recorder: &Recorder) -> Option<InfoItemGroup> {
        match id {
            group_id::BASIC => Some(self.basic_group()),
            // Older sequences stored the charge data under separate ids;
            // they all map to today's combined group.
            group_id::CHARGE | group_id::NOT_CHARGE_REASON | group_id::CHARGING_POWER_AND_REASON => {
                Some(self.charge_group())
            }
            group_id::SETTINGS_BATTERY => Some(self.settings_battery_group(recorder)),
            group_id::SERIAL => Some(self.serial_group()),
            group_id::QMAX => Some(self.qmax_group()),
            group_id::CHARGER => Some(self.charger_group()),
            group_id::VOLTAGE => Some(self.voltage_group()),
            group_id::LIFETIME => Some(self.lifetime_group()),
            group_id::ACCESSORY => Some(self.accessory_group()),
            _ => None,
        }
    }

    fn basic_group(&self) -> InfoItemGroup {
        let mut group = InfoItemGroup::new(group_id::BASIC, "Battery");
        let info = self.snapshot.clone().unwrap_or_default();

        let health = format_maximum_capacity(
            info.nominal_charge_capacity,
            info.design_capacity,
            self.settings.accuracy,
        );
        group.push(row(
            item_id::HEALTH,
            "Maximum capacity",
            health.map(|h| format!("{}%", h)),
        ));
        group.push(row(
            item_id::CYCLE_COUNT,
            "Cycle count",
            info.cycle_count.map(|v| v.to_string()),
        ));
        group.push(row(
            item_id::NOMINAL_CAPACITY,
            "Nominal charge capacity",
            info.nominal_charge_capacity.map(|v| format!("{} mAh", v)),
        ));
        group.push(row(
            item_id::DESIGN_CAPACITY,
            "Design capacity",
            info.design_capacity.map(|v| format!("{} mAh", v)),
        ));
        group.push(row(
            item_id::CURRENT_CAPACITY,
            "Current charge",
            info.current_capacity.map(|v| format!("{}%", v)),
        ));
        group.push(row(
            item_id::RAW_CURRENT_CAPACITY,
            "Raw current capacity",
            info.apple_raw_current_capacity.map(|v| format!("{} mAh", v)),
        ));
        group.push(row(
            item_id::TEMPERATURE,
            "Temperature",
            info.temperature.map(format_centi_celsius),
        ));
        group.push(row(
            item_id::UPDATE_TIME,
            "Data updated",
            info.update_time.map(format_timestamp),
        ));
        if let Some(installed) = info.battery_installed {
            group.push(row(
                item_id::BATTERY_INSTALLED,
                "Battery installed",
                Some(if installed == 1 { "Yes" } else { "No" }.to_string()),
            ));
        }
        group.push(row(
            item_id::BOOT_VOLTAGE,
            "Boot voltage",
            info.boot_voltage.map(format_millivolts),
        ));

        group
    }

    /// Shown while charging, or whenever the adapter reports nonzero watts:
    /// some external battery packs deliver power without raising the
    /// charging flag. A setting can force the group on.
    fn show_charge_data(&self) -> bool {
        if self.settings.force_show_charging_data {
            return true;
        }
        let Some(info) = &self.snapshot else {
            return false;
        };
        if info.is_charging == Some(true) {
            return true;
        }
        info.adapter_details
            .as_ref()
            .and_then(|a| a.watts)
            .map(|w| w > 0)
            .unwrap_or(false)
    }

    fn charge_group(&self) -> InfoItemGroup {
        let mut group = InfoItemGroup::new(group_id::CHARGE, "Charging");
        if !self.show_charge_data() {
            return group;
        }

        let info = self.snapshot.clone().unwrap_or_default();
        let charger = info.charger_data.unwrap_or_default();
        let adapter = info.adapter_details.clone().unwrap_or_default();

        group.push(row(
            item_id::CHARGING_STATE,
            "State",
            Some(self.charge_state().label().to_string()),
        ));
        group.push(row(
            item_id::CHARGING_POWER,
            "Charging power",
            format_charging_power(charger.charging_voltage, charger.charging_current)
                .map(|p| format!("{} W", p)),
        ));
        group.push(row(item_id::ADAPTER_NAME, "Adapter", adapter.name.clone()));
        group.push(row(
            item_id::ADAPTER_MODEL,
            "Adapter model",
            adapter.model.clone(),
        ));
        group.push(row(
            item_id::ADAPTER_MANUFACTURER,
            "Adapter manufacturer",
            adapter.manufacturer.clone(),
        ));
        group.push(row(
            item_id::ADAPTER_WATTS,
            "Rated power",
            adapter.watts.map(|w| format!("{} W", w)),
        ));
        group.push(row(
            item_id::POWER_OPTION,
            "Active power option",
            power_option_detail(&adapter),
        ));
        if !adapter.usb_hvc_menu.is_empty() {
            let mut item = InfoItem::new(item_id::POWER_OPTIONS, "Available power options");
            item.detail = Some(power_options_detail(&adapter));
            group.push(item);
        }

        let reason = charger.not_charging_reason.unwrap_or(0);
        if reason != 0 {
            group.push(row(
                item_id::NOT_CHARGING_REASON,
                "Not charging reason",
                Some(not_charging_reason_text(reason)),
            ));
        }

        group
    }

    fn settings_battery_group(&mut self, recorder: &Recorder) -> InfoItemGroup {
        let mut group = InfoItemGroup::new(group_id::SETTINGS_BATTERY, "Settings app battery data");
        if !self.settings.show_settings_battery_info {
            return group;
        }

        let Some(data) = self.settings_battery.get(false) else {
            return group;
        };

        group.push(row(
            item_id::OS_MAXIMUM_CAPACITY,
            "Maximum capacity (OS)",
            Some(format!("{}%", data.maximum_capacity_percent)),
        ));
        group.push(row(
            item_id::OS_CYCLE_COUNT,
            "Cycle count (OS)",
            Some(data.cycle_count.to_string()),
        ));

        if self.settings.use_history_for_refresh_date {
            let refresh_date = recorder
                .store()
                .record_for_cycle_count(data.cycle_count)
                .ok()
                .flatten()
                .map(|r| format_timestamp(r.create_date));
            group.push(row(
                item_id::OS_POSSIBLE_REFRESH_DATE,
                "Possible refresh date",
                refresh_date,
            ));
        }

        group
    }

    fn serial_group(&self) -> InfoItemGroup {
        let mut group = InfoItemGroup::new(group_id::SERIAL, "Serial numbers");
        let info = self.snapshot.clone().unwrap_or_default();

        group.push(row(
            item_id::BATTERY_SERIAL,
            "Battery serial",
            info.serial_number.as_deref().map(|s| self.render_serial(s)),
        ));
        group.push(row(
            item_id::BATTERY_MANUFACTURER,
            "Battery manufacturer",
            info.serial_number.as_deref().map(battery_manufacturer),
        ));
        group.push(row(
            item_id::ADAPTER_SERIAL,
            "Adapter serial",
            info.adapter_details
                .as_ref()
                .and_then(|a| a.serial.as_deref())
                .map(|s| self.render_serial(s)),
        ));

        group
    }

    fn render_serial(&self, serial: &str) -> String {
        if self.mask_serials {
            mask_serial_number(serial)
        } else {
            serial.to_string()
        }
    }

    fn qmax_group(&self) -> InfoItemGroup {
        let mut group = InfoItemGroup::new(group_id::QMAX, "Qmax");
        let pack = self
            .snapshot
            .as_ref()
            .and_then(|i| i.battery_data)
            .unwrap_or_default();

        group.push(row(
            item_id::MAXIMUM_QMAX,
            "Maximum Qmax",
            pack.maximum_qmax.map(|v| format!("{} mAh", v)),
        ));
        group.push(row(
            item_id::MINIMUM_QMAX,
            "Minimum Qmax",
            pack.minimum_qmax.map(|v| format!("{} mAh", v)),
        ));

        group
    }

    fn charger_group(&self) -> InfoItemGroup {
        let mut group = InfoItemGroup::new(group_id::CHARGER, "Charger");
        let charger = self
            .snapshot
            .as_ref()
            .and_then(|i| i.charger_data)
            .unwrap_or_default();

        group.push(row(
            item_id::CHARGER_VOLTAGE,
            "Charging voltage",
            charger.charging_voltage.map(format_millivolts),
        ));
        group.push(row(
            item_id::CHARGER_CURRENT,
            "Charging current",
            charger.charging_current.map(|v| format!("{} mA", v)),
        ));
        group.push(row(
            item_id::VAC_VOLTAGE_LIMIT,
            "VAC voltage limit",
            charger.vac_voltage_limit.map(format_millivolts),
        ));

        group
    }

    fn voltage_group(&self) -> InfoItemGroup {
        let mut group = InfoItemGroup::new(group_id::VOLTAGE, "Voltage");
        let info = self.snapshot.clone().unwrap_or_default();

        group.push(row(
            item_id::VOLTAGE,
            "Battery voltage",
            info.voltage.map(format_millivolts),
        ));
        group.push(row(
            item_id::INSTANT_AMPERAGE,
            "Instant amperage",
            info.instant_amperage.map(|v| format!("{} mA", v)),
        ));

        group
    }

    fn lifetime_group(&self) -> InfoItemGroup {
        let mut group = InfoItemGroup::new(group_id::LIFETIME, "Lifetime");
        let lifetime = self
            .snapshot
            .as_ref()
            .and_then(|i| i.battery_data)
            .and_then(|p| p.lifetime_data)
            .unwrap_or_default();

        group.push(row(
            item_id::AVERAGE_TEMPERATURE,
            "Average temperature",
            lifetime.average_temperature.map(format_centi_celsius),
        ));
        group.push(row(
            item_id::MAXIMUM_TEMPERATURE,
            "Maximum temperature",
            lifetime.maximum_temperature.map(format_centi_celsius),
        ));
        group.push(row(
            item_id::MINIMUM_TEMPERATURE,
            "Minimum temperature",
            lifetime.minimum_temperature.map(format_centi_celsius),
        ));
        group.push(row(
            item_id::CYCLE_COUNT_LAST_QMAX,
            "Cycles since last Qmax",
            lifetime.cycle_count_last_qmax.map(|v| v.to_string()),
        ));
        group.push(row(
            item_id::MAX_CHARGE_CURRENT,
            "Maximum charge current",
            lifetime.maximum_charge_current.map(|v| format!("{} mA", v)),
        ));
        group.push(row(
            item_id::MAX_DISCHARGE_CURRENT,
            "Maximum discharge current",
            lifetime
                .maximum_discharge_current
                .map(|v| format!("{} mA", v)),
        ));
        group.push(row(
            item_id::MAX_PACK_VOLTAGE,
            "Maximum pack voltage",
            lifetime.maximum_pack_voltage.map(format_millivolts),
        ));
        group.push(row(
            item_id::MIN_PACK_VOLTAGE,
            "Minimum pack voltage",
            lifetime.minimum_pack_voltage.map(format_millivolts),
        ));
        group.push(row(
            item_id::MAX_QMAX,
            "Maximum Qmax",
            lifetime.maximum_qmax.map(|v| format!("{} mAh", v)),
        ));
        group.push(row(
            item_id::MIN_QMAX,
            "Minimum Qmax",
            lifetime.minimum_qmax.map(|v| format!("{} mAh", v)),
        ));
        group.push(row(
            item_id::TOTAL_OPERATING_TIME,
            "Total operating time",
            lifetime.total_operating_time.map(format_operating_hours),
        ));

        group
    }

    fn accessory_group(&self) -> InfoItemGroup {
        let mut group = InfoItemGroup::new(group_id::ACCESSORY, "Accessory");
        let Some(accessory) = self.snapshot.as_ref().and_then(|i| i.accessory_details) else {
            return group;
        };

        group.push(row(
            item_id::ACCESSORY_CURRENT_CAPACITY,
            "Accessory charge",
            accessory.current_capacity.map(|v| format!("{}%", v)),
        ));
        group.push(row(
            item_id::ACCESSORY_POWER_MODE,
            "Accessory charging",
            accessory.is_charging.map(|b| yes_no(b).to_string()),
        ));
        group.push(row(
            item_id::ACCESSORY_NAME,
            "Externally connected",
            accessory.external_connected.map(|b| yes_no(b).to_string()),
        ));

        group
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

fn row(id: i64, label: &str, value: Option<String>) -> InfoItem {
    InfoItem::new(
        id,
        format!("{}: {}", label, value.as_deref().unwrap_or(UNKNOWN)),
    )
}

/// The power tier the charger actually negotiated. Falls back to the
/// adapter's instantaneous readings when the advertised index is missing
/// or out of range.
fn power_option_detail(adapter: &AdapterDetails) -> Option<String> {
    if let Some(index) = adapter.usb_hvc_index {
        if index >= 0 && (index as usize) < adapter.usb_hvc_menu.len() {
            let option = adapter.usb_hvc_menu[index as usize];
            return Some(format!(
                "{} / {}",
                format_millivolts(option.max_voltage),
                format_milliamps_rounded(option.max_current)
            ));
        }
    }

    let voltage = adapter.adapter_voltage?;
    let current = adapter.current?;
    Some(format!(
        "{} / {}",
        format_millivolts(voltage),
        format_milliamps_rounded(current)
    ))
}

fn power_options_detail(adapter: &AdapterDetails) -> String {
    adapter
        .usb_hvc_menu
        .iter()
        .map(|option| {
            format!(
                "Option {}: {} / {}",
                option.index + 1,
                format_millivolts(option.max_voltage),
                format_milliamps_rounded(option.max_current)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RecordPolicy, RecordingConfig};
    use crate::data::history_store::HistoryStore;
    use crate::data::settings_battery::{SettingsBatteryData, StaticFetcher};
    use batinfo_telemetry::StaticSource;
    use plist::{Dictionary, Value};
    use pretty_assertions::assert_eq;

    fn dict(entries: &[(&str, Value)]) -> Dictionary {
        let mut d = Dictionary::new();
        for (k, v) in entries {
            d.insert((*k).to_string(), v.clone());
        }
        d
    }

    fn healthy_dict() -> Dictionary {
        dict(&[
            ("CycleCount", Value::Integer(421.into())),
            ("NominalChargeCapacity", Value::Integer(3333.into())),
            ("DesignCapacity", Value::Integer(4000.into())),
            ("Serial", Value::String("F8Y12345XYZ".into())),
            ("IsCharging", Value::Integer(0.into())),
        ])
    }

    fn controller_with(dict: Dictionary, settings: Settings) -> BatteryDataController {
        BatteryDataController::new(
            Box::new(StaticSource::new("test", dict)),
            settings,
            SettingsBatteryCache::new(Box::new(StaticFetcher(None))),
        )
    }

    fn recorder() -> Recorder {
        Recorder::new(
            HistoryStore::open_in_memory().expect("open"),
            RecordingConfig {
                enabled: true,
                policy: RecordPolicy::Automatic,
            },
            crate::config::AccuracyMode::Ceiling,
        )
    }

    fn find_item(groups: &[InfoItemGroup], group: i64, item: i64) -> Option<InfoItem> {
        groups
            .iter()
            .find(|g| g.id == group)?
            .items
            .iter()
            .find(|i| i.id == item)
            .cloned()
    }

    #[test]
    fn refresh_records_and_builds_health_item() {
        let mut ctrl = controller_with(healthy_dict(), Settings::default());
        let mut rec = recorder();

        assert!(ctrl.refresh(&mut rec));
        assert_eq!(rec.store().count().expect("count"), 1);

        let groups = ctrl.all_groups(&rec);
        let health = find_item(&groups, group_id::BASIC, item_id::HEALTH).expect("health");
        // 3333/4000 = 83.325%, Ceiling by default.
        assert_eq!(health.text, "Maximum capacity: 84%");
    }

    #[test]
    fn refresh_with_incomplete_snapshot_still_succeeds() {
        let partial = dict(&[("CycleCount", Value::Integer(421.into()))]);
        let mut ctrl = controller_with(partial, Settings::default());
        let mut rec = recorder();

        assert!(ctrl.refresh(&mut rec));
        assert_eq!(rec.store().count().expect("count"), 0);

        let groups = ctrl.all_groups(&rec);
        let health = find_item(&groups, group_id::BASIC, item_id::HEALTH).expect("health");
        assert_eq!(health.text, "Maximum capacity: Unknown");
    }

    #[test]
    fn manual_record_fails_without_complete_data() {
        let mut ctrl = controller_with(Dictionary::new(), Settings::default());
        let mut rec = recorder();
        assert!(!ctrl.record_manual(&mut rec));
        assert_eq!(rec.store().count().expect("count"), 0);
    }

    #[test]
    fn charge_group_is_hidden_while_discharging() {
        let mut ctrl = controller_with(healthy_dict(), Settings::default());
        let mut rec = recorder();
        ctrl.refresh(&mut rec);

        let groups = ctrl.all_groups(&rec);
        assert!(groups.iter().all(|g| g.id != group_id::CHARGE));
    }

    #[test]
    fn nonzero_adapter_watts_reveal_charge_group() {
        // External packs can feed power without raising IsCharging.
        let mut d = healthy_dict();
        d.insert(
            "AdapterDetails".into(),
            Value::Dictionary(dict(&[("Watts", Value::Integer(20.into()))])),
        );
        let mut ctrl = controller_with(d, Settings::default());
        let mut rec = recorder();
        ctrl.refresh(&mut rec);

        let groups = ctrl.all_groups(&rec);
        let watts = find_item(&groups, group_id::CHARGE, item_id::ADAPTER_WATTS).expect("watts");
        assert_eq!(watts.text, "Rated power: 20 W");
    }

    #[test]
    fn force_show_setting_reveals_charge_group() {
        let settings = Settings {
            force_show_charging_data: true,
            ..Settings::default()
        };
        let mut ctrl = controller_with(healthy_dict(), settings);
        let mut rec = recorder();
        ctrl.refresh(&mut rec);

        let groups = ctrl.all_groups(&rec);
        assert!(groups.iter().any(|g| g.id == group_id::CHARGE));
    }

    #[test]
    fn not_charging_reason_row_appears_only_when_nonzero() {
        let mut d = healthy_dict();
        d.insert("IsCharging".into(), Value::Integer(1.into()));
        d.insert(
            "ChargerData".into(),
            Value::Dictionary(dict(&[
                ("ChargingVoltage", Value::Integer(5000.into())),
                ("ChargingCurrent", Value::Integer(2000.into())),
                ("NotChargingReason", Value::Integer(0.into())),
            ])),
        );
        let mut ctrl = controller_with(d.clone(), Settings::default());
        let mut rec = recorder();
        ctrl.refresh(&mut rec);

        let groups = ctrl.all_groups(&rec);
        assert!(find_item(&groups, group_id::CHARGE, item_id::NOT_CHARGING_REASON).is_none());
        let power =
            find_item(&groups, group_id::CHARGE, item_id::CHARGING_POWER).expect("power row");
        assert_eq!(power.text, "Charging power: 10.00 W");

        d.insert(
            "ChargerData".into(),
            Value::Dictionary(dict(&[("NotChargingReason", Value::Integer(8192.into()))])),
        );
        let mut ctrl = controller_with(d, Settings::default());
        ctrl.refresh(&mut rec);
        let groups = ctrl.all_groups(&rec);
        let reason = find_item(&groups, group_id::CHARGE, item_id::NOT_CHARGING_REASON)
            .expect("reason row");
        assert_eq!(
            reason.text,
            "Not charging reason: Negotiating with charger"
        );
    }

    #[test]
    fn serials_are_masked_until_toggled() {
        let mut ctrl = controller_with(healthy_dict(), Settings::default());
        let mut rec = recorder();
        ctrl.refresh(&mut rec);

        let groups = ctrl.all_groups(&rec);
        let serial =
            find_item(&groups, group_id::SERIAL, item_id::BATTERY_SERIAL).expect("serial");
        assert_eq!(serial.text, "Battery serial: F8Y12******");

        ctrl.toggle_serial_mask();
        let groups = ctrl.all_groups(&rec);
        let serial =
            find_item(&groups, group_id::SERIAL, item_id::BATTERY_SERIAL).expect("serial");
        assert_eq!(serial.text, "Battery serial: F8Y12345XYZ");
    }

    #[test]
    fn manufacturer_derives_from_unmasked_prefix() {
        let mut ctrl = controller_with(healthy_dict(), Settings::default());
        let mut rec = recorder();
        ctrl.refresh(&mut rec);

        let groups = ctrl.all_groups(&rec);
        let manufacturer = find_item(&groups, group_id::SERIAL, item_id::BATTERY_MANUFACTURER)
            .expect("manufacturer");
        assert_eq!(manufacturer.text, "Battery manufacturer: Sunwoda");
    }

    #[test]
    fn power_option_prefers_menu_entry_over_live_readings() {
        let adapter = dict(&[
            ("UsbHvcHvcIndex", Value::Integer(1.into())),
            (
                "UsbHvcMenu",
                Value::Array(vec![
                    Value::Dictionary(dict(&[
                        ("Index", Value::Integer(0.into())),
                        ("MaxVoltage", Value::Integer(5000.into())),
                        ("MaxCurrent", Value::Integer(3000.into())),
                    ])),
                    Value::Dictionary(dict(&[
                        ("Index", Value::Integer(1.into())),
                        ("MaxVoltage", Value::Integer(9000.into())),
                        ("MaxCurrent", Value::Integer(2200.into())),
                    ])),
                ]),
            ),
            ("AdapterVoltage", Value::Integer(4900.into())),
            ("Current", Value::Integer(1400.into())),
        ]);
        let details = AdapterDetails::from_dict(&adapter);
        assert_eq!(
            power_option_detail(&details).as_deref(),
            Some("9.00 V / 2.00 A")
        );

        // Index out of range: synthesize from live readings.
        let adapter = dict(&[
            ("UsbHvcHvcIndex", Value::Integer(7.into())),
            ("AdapterVoltage", Value::Integer(4900.into())),
            ("Current", Value::Integer(1400.into())),
        ]);
        let details = AdapterDetails::from_dict(&adapter);
        assert_eq!(
            power_option_detail(&details).as_deref(),
            Some("4.90 V / 1.00 A")
        );
    }

    #[test]
    fn home_groups_follow_configured_sequence() {
        let settings = Settings {
            home_group_sequence: vec![group_id::SERIAL, group_id::BASIC],
            ..Settings::default()
        };
        let mut ctrl = controller_with(healthy_dict(), settings);
        let mut rec = recorder();
        ctrl.refresh(&mut rec);

        let groups = ctrl.home_groups(&rec);
        let ids: Vec<i64> = groups.iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![group_id::SERIAL, group_id::BASIC]);
    }

    #[test]
    fn settings_battery_group_reads_helper_and_history() {
        let settings = Settings {
            show_settings_battery_info: true,
            ..Settings::default()
        };
        let mut ctrl = BatteryDataController::new(
            Box::new(StaticSource::new("test", healthy_dict())),
            settings,
            SettingsBatteryCache::new(Box::new(StaticFetcher(Some(SettingsBatteryData {
                cycle_count: 421,
                maximum_capacity_percent: 87,
            })))),
        );
        let mut rec = recorder();
        // The refresh records a row at cycle count 421, which then serves as
        // the possible refresh date for the OS figure.
        ctrl.refresh(&mut rec);

        let groups = ctrl.all_groups(&rec);
        let capacity = find_item(
            &groups,
            group_id::SETTINGS_BATTERY,
            item_id::OS_MAXIMUM_CAPACITY,
        )
        .expect("os capacity");
        assert_eq!(capacity.text, "Maximum capacity (OS): 87%");

        let refresh = find_item(
            &groups,
            group_id::SETTINGS_BATTERY,
            item_id::OS_POSSIBLE_REFRESH_DATE,
        )
        .expect("refresh date");
        assert!(!refresh.text.ends_with("Unknown"));
    }

    #[test]
    fn charge_state_is_four_way() {
        let mut ctrl = controller_with(Dictionary::new(), Settings::default());
        assert_eq!(ctrl.charge_state(), ChargeState::Unknown);

        let mut rec = recorder();
        let mut d = healthy_dict();
        d.insert("IsCharging".into(), Value::Integer(1.into()));
        ctrl = controller_with(d.clone(), Settings::default());
        ctrl.refresh(&mut rec);
        assert_eq!(ctrl.charge_state(), ChargeState::Charging);

        d.insert("IsCharging".into(), Value::Integer(0.into()));
        d.insert(
            "ChargerData".into(),
            Value::Dictionary(dict(&[("NotChargingReason", Value::Integer(1.into()))])),
        );
        ctrl = controller_with(d, Settings::default());
        ctrl.refresh(&mut rec);
        assert_eq!(ctrl.charge_state(), ChargeState::Full);
    }
}
