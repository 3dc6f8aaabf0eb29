//! Formatting for derived battery metrics.
//!
//! Every function here degrades to `None` (or a literal "Unknown") instead of
//! erroring; callers render placeholders for whatever the hardware withheld.

use chrono::{DateTime, Datelike, Local, TimeZone};

use crate::config::AccuracyMode;

pub const UNKNOWN: &str = "Unknown";

/// Health percentage, `nominal / design * 100`, under the configured
/// rounding mode. `None` when design capacity is missing or zero.
pub fn format_maximum_capacity(
    nominal: Option<i64>,
    design: Option<i64>,
    mode: AccuracyMode,
) -> Option<String> {
    let nominal = nominal?;
    let design = design?;
    if design == 0 {
        return None;
    }

    let percent = nominal as f64 / design as f64 * 100.0;
    let text = match mode {
        AccuracyMode::Keep => trim_trailing_zeros(&format!("{:.2}", percent)),
        AccuracyMode::Ceiling => format!("{}", percent.ceil() as i64),
        AccuracyMode::Round => format!("{}", percent.round() as i64),
        AccuracyMode::Floor => format!("{}", percent.floor() as i64),
    };
    Some(text)
}

fn trim_trailing_zeros(s: &str) -> String {
    if !s.contains('.') {
        return s.to_string();
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Instantaneous charging power in watts, from millivolts and milliamps.
pub fn format_charging_power(voltage_mv: Option<i64>, current_ma: Option<i64>) -> Option<String> {
    let volts = voltage_mv? as f64 / 1000.0;
    let amps = current_ma? as f64 / 1000.0;
    Some(format!("{:.2}", volts * amps))
}

/// Closed mapping of the charger's NotChargingReason code. Unknown codes
/// render the raw integer so they are still diagnosable.
pub fn not_charging_reason_text(code: i64) -> String {
    match code {
        0 => "None".to_string(),
        1 => "Battery fully charged".to_string(),
        128 => "Charging disabled".to_string(),
        256 | 272 => "Battery overheating".to_string(),
        1024 | 8192 => "Negotiating with charger".to_string(),
        32768 => "Optimized battery charging engaged".to_string(),
        other => format!("Unknown reason ({})", other),
    }
}

/// Keep the first five characters, star out the rest. Shorter serials pass
/// through unchanged.
pub fn mask_serial_number(serial: &str) -> String {
    let chars: Vec<char> = serial.chars().collect();
    if chars.len() < 5 {
        return serial.to_string();
    }
    let mut masked: String = chars[..5].iter().collect();
    masked.extend(std::iter::repeat('*').take(chars.len() - 5));
    masked
}

/// Infer the pack manufacturer from the serial number prefix.
pub fn battery_manufacturer(serial: &str) -> String {
    let prefix: String = serial.chars().take(3).collect();
    match prefix.as_str() {
        "F8Y" | "SWD" => "Sunwoda".to_string(),
        "F5D" | "DTP" | "DSY" => "Desay".to_string(),
        "FG9" | "SMP" => "Simplo".to_string(),
        "ATL" => "ATL".to_string(),
        "LGC" => "LG".to_string(),
        "SON" => "Sony".to_string(),
        _ => UNKNOWN.to_string(),
    }
}

/// Adapter/menu voltage in volts, two decimals, from millivolts.
pub fn format_millivolts(mv: i64) -> String {
    format!("{:.2} V", mv as f64 / 1000.0)
}

/// Adapter/menu current in amps: divide by 1000, round to the nearest
/// integer amp, render with two decimals.
pub fn format_milliamps_rounded(ma: i64) -> String {
    format!("{:.2} A", (ma as f64 / 1000.0).round())
}

/// Temperature reported in centi-degrees Celsius.
pub fn format_centi_celsius(value: i64) -> String {
    format!("{:.2} \u{00b0}C", value as f64 / 100.0)
}

pub fn format_timestamp(epoch_secs: i64) -> String {
    match Local.timestamp_opt(epoch_secs, 0) {
        chrono::LocalResult::Single(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        _ => UNKNOWN.to_string(),
    }
}

/// Operating time reported in hours.
pub fn format_operating_hours(hours: i64) -> String {
    format!("{} days {} hours", hours / 24, hours % 24)
}

/// Same calendar day in the local timezone.
pub fn is_same_day(a: i64, b: i64) -> bool {
    let (Some(a), Some(b)) = (local_datetime(a), local_datetime(b)) else {
        return false;
    };
    a.year() == b.year() && a.month() == b.month() && a.day() == b.day()
}

fn local_datetime(epoch_secs: i64) -> Option<DateTime<Local>> {
    match Local.timestamp_opt(epoch_secs, 0) {
        chrono::LocalResult::Single(dt) => Some(dt),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn health_accuracy_matrix() {
        // A factory-fresh battery shows a clean 100 in every mode.
        for mode in [
            AccuracyMode::Keep,
            AccuracyMode::Ceiling,
            AccuracyMode::Round,
            AccuracyMode::Floor,
        ] {
            assert_eq!(
                format_maximum_capacity(Some(4000), Some(4000), mode).as_deref(),
                Some("100")
            );
        }

        // 3333/4000 = 83.325%
        assert_eq!(
            format_maximum_capacity(Some(3333), Some(4000), AccuracyMode::Keep).as_deref(),
            Some("83.33")
        );
        assert_eq!(
            format_maximum_capacity(Some(3333), Some(4000), AccuracyMode::Ceiling).as_deref(),
            Some("84")
        );
        assert_eq!(
            format_maximum_capacity(Some(3333), Some(4000), AccuracyMode::Round).as_deref(),
            Some("83")
        );
        assert_eq!(
            format_maximum_capacity(Some(3333), Some(4000), AccuracyMode::Floor).as_deref(),
            Some("83")
        );
    }

    #[test]
    fn health_undefined_without_design_capacity() {
        assert_eq!(
            format_maximum_capacity(Some(3000), None, AccuracyMode::Ceiling),
            None
        );
        assert_eq!(
            format_maximum_capacity(Some(3000), Some(0), AccuracyMode::Ceiling),
            None
        );
        assert_eq!(
            format_maximum_capacity(None, Some(4000), AccuracyMode::Ceiling),
            None
        );
    }

    #[test]
    fn charging_power_needs_both_inputs() {
        assert_eq!(
            format_charging_power(Some(5000), Some(2000)).as_deref(),
            Some("10.00")
        );
        assert_eq!(format_charging_power(Some(5000), None), None);
        assert_eq!(format_charging_power(None, Some(2000)), None);
    }

    #[test]
    fn not_charging_reason_covers_known_codes() {
        assert_eq!(not_charging_reason_text(0), "None");
        assert_eq!(not_charging_reason_text(1), "Battery fully charged");
        assert_eq!(not_charging_reason_text(128), "Charging disabled");
        assert_eq!(not_charging_reason_text(256), "Battery overheating");
        assert_eq!(not_charging_reason_text(272), "Battery overheating");
        assert_eq!(not_charging_reason_text(1024), "Negotiating with charger");
        assert_eq!(not_charging_reason_text(8192), "Negotiating with charger");
        assert_eq!(
            not_charging_reason_text(32768),
            "Optimized battery charging engaged"
        );
        assert_eq!(not_charging_reason_text(77), "Unknown reason (77)");
    }

    #[test]
    fn serial_masking_keeps_first_five() {
        assert_eq!(mask_serial_number("F8Y12345XYZ"), "F8Y12******");
        assert_eq!(mask_serial_number("F8Y1"), "F8Y1");
        assert_eq!(mask_serial_number("ABCDE"), "ABCDE");
        assert_eq!(mask_serial_number(""), "");
    }

    #[test]
    fn manufacturer_prefix_table() {
        assert_eq!(battery_manufacturer("F8Y12345"), "Sunwoda");
        assert_eq!(battery_manufacturer("SWD00001"), "Sunwoda");
        assert_eq!(battery_manufacturer("F5D00001"), "Desay");
        assert_eq!(battery_manufacturer("DTP00001"), "Desay");
        assert_eq!(battery_manufacturer("DSY00001"), "Desay");
        assert_eq!(battery_manufacturer("FG900001"), "Simplo");
        assert_eq!(battery_manufacturer("SMP00001"), "Simplo");
        assert_eq!(battery_manufacturer("ATL00001"), "ATL");
        assert_eq!(battery_manufacturer("LGC00001"), "LG");
        assert_eq!(battery_manufacturer("SON00001"), "Sony");
        assert_eq!(battery_manufacturer("ZZZ00001"), "Unknown");
        assert_eq!(battery_manufacturer("ZZ"), "Unknown");
    }

    #[test]
    fn same_day_is_a_calendar_comparison() {
        // Two timestamps 30 seconds apart are the same day.
        let now = Local::now().timestamp();
        assert!(is_same_day(now, now - 30));
        // 48 hours apart can never share a calendar day.
        assert!(!is_same_day(now, now - 48 * 3600));
    }

    #[test]
    fn milliamp_rounding_matches_display_rules() {
        assert_eq!(format_milliamps_rounded(2900), "3.00 A");
        assert_eq!(format_milliamps_rounded(2400), "2.00 A");
        assert_eq!(format_millivolts(9150), "9.15 V");
    }
}
