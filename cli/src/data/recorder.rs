//! Decides when a battery health sample is worth persisting.

use chrono::Local;
use tracing::{debug, warn};

use crate::config::{AccuracyMode, RecordPolicy, RecordingConfig};
use crate::data::format::{format_maximum_capacity, is_same_day};
use crate::data::history_store::{BatteryRecord, HistoryStore};

pub struct Recorder {
    store: HistoryStore,
    config: RecordingConfig,
    accuracy: AccuracyMode,
}

impl Recorder {
    pub fn new(store: HistoryStore, config: RecordingConfig, accuracy: AccuracyMode) -> Self {
        Self {
            store,
            config,
            accuracy,
        }
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Persist a sample if the active policy calls for one.
    ///
    /// Returns `true` only when a row was inserted, or when recording is
    /// disabled (a no-op, not a failure). A refresh that the policy decides
    /// is not worth persisting returns `false`, as does a failed insert.
    /// Disabling recording also blocks manual requests.
    pub fn record_if_due(
        &mut self,
        manual: bool,
        cycle_count: i64,
        nominal_charge_capacity: i64,
        design_capacity: i64,
    ) -> bool {
        if !self.config.enabled {
            return true;
        }

        if manual {
            return self.insert_sample(RecordPolicy::Manual, cycle_count, nominal_charge_capacity, design_capacity);
        }

        let policy = self.config.policy;
        if policy == RecordPolicy::Manual {
            return false;
        }

        let latest = match self.store.latest() {
            Ok(latest) => latest,
            Err(e) => {
                warn!("failed to read latest history record: {}", e);
                return false;
            }
        };

        let due = match latest {
            // First sample ever: always record, whatever the policy.
            None => true,
            Some(last) => self.is_due(policy, &last, cycle_count, nominal_charge_capacity),
        };

        if !due {
            return false;
        }

        self.insert_sample(policy, cycle_count, nominal_charge_capacity, design_capacity)
    }

    fn is_due(
        &self,
        policy: RecordPolicy,
        last: &BatteryRecord,
        cycle_count: i64,
        nominal_charge_capacity: i64,
    ) -> bool {
        let day_changed = !is_same_day(last.create_date, Local::now().timestamp());
        let data_changed = last.cycle_count != cycle_count
            || last.nominal_charge_capacity != Some(nominal_charge_capacity);

        match policy {
            RecordPolicy::Automatic => day_changed || data_changed,
            RecordPolicy::DataChanged => data_changed,
            RecordPolicy::EveryDay => day_changed,
            RecordPolicy::Manual => false,
        }
    }

    fn insert_sample(
        &mut self,
        policy: RecordPolicy,
        cycle_count: i64,
        nominal_charge_capacity: i64,
        design_capacity: i64,
    ) -> bool {
        let maximum_capacity = format_maximum_capacity(
            Some(nominal_charge_capacity),
            Some(design_capacity),
            self.accuracy,
        );

        let record = BatteryRecord::new(
            Local::now().timestamp(),
            policy.record_type_code(),
            cycle_count,
            Some(nominal_charge_capacity),
            Some(design_capacity),
            maximum_capacity,
        );

        match self.store.insert(&record) {
            Ok(id) => {
                debug!(id, cycle_count, policy = policy.label(), "recorded battery sample");
                true
            }
            Err(e) => {
                warn!("failed to insert battery record: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn recorder(policy: RecordPolicy, enabled: bool) -> Recorder {
        Recorder::new(
            HistoryStore::open_in_memory().expect("open"),
            RecordingConfig { enabled, policy },
            AccuracyMode::Ceiling,
        )
    }

    #[test]
    fn disabled_recording_succeeds_without_inserting() {
        let mut rec = recorder(RecordPolicy::Automatic, false);
        assert!(rec.record_if_due(false, 100, 3500, 4000));
        assert_eq!(rec.store().count().expect("count"), 0);
    }

    #[test]
    fn disabled_recording_blocks_manual_requests() {
        let mut rec = recorder(RecordPolicy::Automatic, false);
        assert!(rec.record_if_due(true, 100, 3500, 4000));
        assert_eq!(rec.store().count().expect("count"), 0);
    }

    #[test]
    fn manual_request_inserts_with_manual_record_type() {
        let mut rec = recorder(RecordPolicy::Automatic, true);
        assert!(rec.record_if_due(true, 100, 3500, 4000));
        assert_eq!(rec.store().count().expect("count"), 1);
        let row = rec.store().latest().expect("latest").expect("row");
        assert_eq!(row.record_type, RecordPolicy::Manual.record_type_code());
        assert_eq!(row.maximum_capacity.as_deref(), Some("88"));
    }

    #[test]
    fn empty_store_always_records_under_auto_policies() {
        for policy in [
            RecordPolicy::Automatic,
            RecordPolicy::DataChanged,
            RecordPolicy::EveryDay,
        ] {
            let mut rec = recorder(policy, true);
            assert!(rec.record_if_due(false, 100, 3500, 4000));
            assert_eq!(rec.store().count().expect("count"), 1);
        }
    }

    #[test]
    fn manual_policy_rejects_automatic_attempts() {
        let mut rec = recorder(RecordPolicy::Manual, true);
        assert!(!rec.record_if_due(false, 100, 3500, 4000));
        assert_eq!(rec.store().count().expect("count"), 0);
    }

    #[test]
    fn unchanged_data_same_day_records_nothing_and_says_so() {
        let mut rec = recorder(RecordPolicy::Automatic, true);
        assert!(rec.record_if_due(false, 100, 3500, 4000));
        // Second identical refresh on the same day: no row, and the
        // return value reflects that nothing was persisted.
        assert!(!rec.record_if_due(false, 100, 3500, 4000));
        assert_eq!(rec.store().count().expect("count"), 1);
    }

    #[test]
    fn cycle_count_change_triggers_data_policies() {
        for policy in [RecordPolicy::Automatic, RecordPolicy::DataChanged] {
            let mut rec = recorder(policy, true);
            assert!(rec.record_if_due(false, 100, 3500, 4000));
            assert!(rec.record_if_due(false, 101, 3500, 4000));
            assert_eq!(rec.store().count().expect("count"), 2);
        }
    }

    #[test]
    fn nominal_capacity_change_triggers_data_policies() {
        let mut rec = recorder(RecordPolicy::DataChanged, true);
        assert!(rec.record_if_due(false, 100, 3500, 4000));
        assert!(rec.record_if_due(false, 100, 3499, 4000));
        assert_eq!(rec.store().count().expect("count"), 2);
    }

    #[test]
    fn every_day_policy_ignores_data_changes() {
        let mut rec = recorder(RecordPolicy::EveryDay, true);
        assert!(rec.record_if_due(false, 100, 3500, 4000));
        // Same day: a cycle count bump is not a trigger for this policy.
        assert!(!rec.record_if_due(false, 101, 3400, 4000));
        assert_eq!(rec.store().count().expect("count"), 1);
    }

    #[test]
    fn day_boundary_triggers_automatic_policy() {
        let mut rec = recorder(RecordPolicy::Automatic, true);
        // Seed a record dated two days ago.
        let old = BatteryRecord::new(
            Local::now().timestamp() - 48 * 3600,
            RecordPolicy::Automatic.record_type_code(),
            100,
            Some(3500),
            Some(4000),
            Some("88".to_string()),
        );
        rec.store.insert(&old).expect("seed");

        assert!(rec.record_if_due(false, 100, 3500, 4000));
        assert_eq!(rec.store().count().expect("count"), 2);
    }

    #[test]
    fn day_boundary_does_not_trigger_data_changed_policy() {
        let mut rec = recorder(RecordPolicy::DataChanged, true);
        let old = BatteryRecord::new(
            Local::now().timestamp() - 48 * 3600,
            RecordPolicy::DataChanged.record_type_code(),
            100,
            Some(3500),
            Some(4000),
            Some("88".to_string()),
        );
        rec.store.insert(&old).expect("seed");

        assert!(!rec.record_if_due(false, 100, 3500, 4000));
        assert_eq!(rec.store().count().expect("count"), 1);
    }
}
