//! Versioned session snapshots of every instance manager plus the window stack.
//!
//! Saves are debounced through a shared [`Debouncer`]; the immediate path (blur, teardown,
//! hidden, export) cancels the pending run and writes at once. Every write is size-guarded
//! against the storage budget. A snapshot whose `version` differs from [`SESSION_VERSION`] is
//! rejected as a whole.

use std::{
    collections::{BTreeMap, HashSet},
    rc::Rc,
};

use leptos::logging;
use platform_host::PrefsStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    debounce::Debouncer,
    error::DesktopError,
    instances::{InstanceRecord, SessionParticipant},
    z_order::ZOrderStack,
};

pub const SESSION_KEY: &str = "windowInstancesSession";
pub const SESSION_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SessionSnapshot {
    pub version: u32,
    /// Unix milliseconds at capture time.
    pub timestamp: u64,
    pub instances: BTreeMap<String, Vec<InstanceRecord>>,
    pub active: BTreeMap<String, Option<String>>,
    /// Least recent first.
    pub window_stack: Vec<String>,
}

impl SessionSnapshot {
    /// Captures every participant and the current stack order.
    pub fn capture(
        participants: &[&dyn SessionParticipant],
        stack: &ZOrderStack,
        timestamp: u64,
    ) -> Self {
        let mut instances = BTreeMap::new();
        let mut active = BTreeMap::new();
        for participant in participants {
            let kind = participant.kind().to_string();
            active.insert(
                kind.clone(),
                participant.active_instance_id().map(str::to_string),
            );
            instances.insert(kind, participant.serialize_all());
        }
        Self {
            version: SESSION_VERSION,
            timestamp,
            instances,
            active,
            window_stack: stack.ids().to_vec(),
        }
    }

    /// Parses a stored or imported payload. The version is checked before the shape so an
    /// incompatible snapshot reports a version mismatch rather than a structural error.
    pub fn parse(raw: &str) -> Result<Self, DesktopError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|err| DesktopError::InvalidSnapshot(err.to_string()))?;
        let found = value
            .get("version")
            .and_then(Value::as_u64)
            .ok_or_else(|| DesktopError::InvalidSnapshot("missing numeric version".to_string()))?;
        if found != u64::from(SESSION_VERSION) {
            return Err(DesktopError::VersionMismatch {
                found,
                expected: SESSION_VERSION,
            });
        }
        let snapshot: Self = serde_json::from_value(value)
            .map_err(|err| DesktopError::InvalidSnapshot(err.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    fn validate(&self) -> Result<(), DesktopError> {
        for (kind, records) in &self.instances {
            let mut seen = HashSet::new();
            for record in records {
                if &record.kind != kind {
                    return Err(DesktopError::InvalidSnapshot(format!(
                        "instance `{}` of type `{}` listed under `{kind}`",
                        record.instance_id, record.kind
                    )));
                }
                if !seen.insert(record.instance_id.as_str()) {
                    return Err(DesktopError::InvalidSnapshot(format!(
                        "duplicate {kind} instance id `{}`",
                        record.instance_id
                    )));
                }
            }
        }
        for (kind, active) in &self.active {
            let Some(active) = active else { continue };
            let known = self
                .instances
                .get(kind)
                .is_some_and(|records| records.iter().any(|r| &r.instance_id == active));
            if !known {
                return Err(DesktopError::InvalidSnapshot(format!(
                    "active {kind} instance `{active}` is not in the snapshot"
                )));
            }
        }
        Ok(())
    }
}

/// Approximate stored size: UTF-16 code units at two bytes each, as browsers account for
/// `localStorage` quota.
pub fn estimate_stored_bytes(raw: &str) -> usize {
    raw.encode_utf16().count() * 2
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Written { bytes: usize },
    /// Over budget while the quota flag was already set; nothing was attempted.
    SkippedOverQuota,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub quota_exceeded: bool,
    pub writes: usize,
    pub skipped_writes: usize,
    pub last_write_bytes: Option<usize>,
    pub last_saved_at: Option<u64>,
    pub pending_save: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored_instances: usize,
    /// Snapshot types with no live manager.
    pub skipped_kinds: Vec<String>,
}

pub struct SessionEngine {
    prefs: Rc<dyn PrefsStore>,
    debouncer: Debouncer,
    budget_bytes: usize,
    stats: SessionStats,
}

impl SessionEngine {
    pub fn new(prefs: Rc<dyn PrefsStore>, debouncer: Debouncer, budget_bytes: usize) -> Self {
        Self {
            prefs,
            debouncer,
            budget_bytes,
            stats: SessionStats::default(),
        }
    }

    /// Schedules a debounced save.
    pub fn schedule_save(&self) {
        self.debouncer.trigger();
    }

    /// Drops any pending debounced save; used by the immediate path before writing.
    pub fn cancel_pending(&self) -> bool {
        self.debouncer.cancel()
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            pending_save: self.debouncer.is_pending(),
            ..self.stats.clone()
        }
    }

    pub fn quota_exceeded(&self) -> bool {
        self.stats.quota_exceeded
    }

    /// Writes `snapshot` unless it exceeds the budget.
    ///
    /// The first over-budget write returns [`DesktopError::StorageQuotaExceeded`] and sets the
    /// sticky flag; later over-budget writes are skipped silently until one fits.
    pub fn persist(&mut self, snapshot: &SessionSnapshot) -> Result<SaveOutcome, DesktopError> {
        let raw = serde_json::to_string(snapshot)
            .map_err(|err| DesktopError::InvalidSnapshot(err.to_string()))?;
        let estimated = estimate_stored_bytes(&raw);
        if estimated > self.budget_bytes {
            self.stats.skipped_writes += 1;
            if self.stats.quota_exceeded {
                return Ok(SaveOutcome::SkippedOverQuota);
            }
            self.stats.quota_exceeded = true;
            return Err(DesktopError::StorageQuotaExceeded {
                estimated,
                budget: self.budget_bytes,
            });
        }

        self.prefs
            .save_pref(SESSION_KEY, &raw)
            .map_err(DesktopError::Storage)?;
        if self.stats.quota_exceeded {
            logging::log!("session snapshot back under storage budget ({estimated} bytes)");
        }
        self.stats.quota_exceeded = false;
        self.stats.writes += 1;
        self.stats.last_write_bytes = Some(estimated);
        self.stats.last_saved_at = Some(snapshot.timestamp);
        Ok(SaveOutcome::Written { bytes: estimated })
    }

    /// Reads the stored snapshot, if any.
    pub fn load(&self) -> Result<Option<SessionSnapshot>, DesktopError> {
        let raw = self
            .prefs
            .load_pref(SESSION_KEY)
            .map_err(DesktopError::Storage)?;
        raw.as_deref().map(SessionSnapshot::parse).transpose()
    }

    /// Applies `snapshot` to the live managers and restores the stack.
    ///
    /// Every manager checks its records before any live instance is replaced, so a rejected
    /// kind leaves all managers and the stack untouched. Debounced saves are suspended while
    /// restoring. Stack ids that `is_live` rejects are dropped.
    pub fn apply(
        &self,
        snapshot: &SessionSnapshot,
        participants: &mut [&mut dyn SessionParticipant],
        stack: &mut ZOrderStack,
        is_live: impl Fn(&str) -> bool,
    ) -> Result<RestoreReport, DesktopError> {
        for (kind, records) in &snapshot.instances {
            if let Some(participant) = participants.iter().find(|p| p.kind() == kind) {
                participant.check_records(records)?;
            }
        }

        let _suspended = self.debouncer.suspend();
        let mut report = RestoreReport::default();

        for (kind, records) in &snapshot.instances {
            let Some(participant) = participants.iter_mut().find(|p| p.kind() == kind) else {
                logging::warn!("session has {kind} instances but no manager is registered");
                report.skipped_kinds.push(kind.clone());
                continue;
            };
            report.restored_instances += participant.deserialize_all(records)?;
            if let Some(Some(active)) = snapshot.active.get(kind) {
                participant.set_active_instance(active);
            }
        }

        stack.restore_stack(snapshot.window_stack.iter().map(String::as_str), is_live);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use platform_host::{ManualScheduler, MemoryPrefsStore};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::{
        apps::TerminalInstance,
        instances::{InstanceManager, InstanceSeed, WindowInstance},
    };

    fn engine(store: &MemoryPrefsStore, budget: usize) -> SessionEngine {
        let debouncer = Debouncer::new(Rc::new(ManualScheduler::default()), 750);
        SessionEngine::new(Rc::new(store.clone()), debouncer, budget)
    }

    fn terminals() -> InstanceManager<TerminalInstance> {
        InstanceManager::new("terminal", "terminal", |core| TerminalInstance::new(core, 50))
            .with_title_prefix("Terminal")
    }

    fn empty_snapshot() -> SessionSnapshot {
        SessionSnapshot::capture(&[], &ZOrderStack::new(1, 10), 42)
    }

    #[test]
    fn capture_records_instances_active_and_stack() {
        let mut terms = terminals();
        terms.create_instance(InstanceSeed::default());
        terms.create_instance(InstanceSeed::default());
        let mut stack = ZOrderStack::new(1_000, 9_000);
        stack.bring_to_front("finder");
        stack.bring_to_front("terminal");

        let snapshot = SessionSnapshot::capture(&[&terms], &stack, 7);

        assert_eq!(snapshot.version, SESSION_VERSION);
        assert_eq!(snapshot.instances["terminal"].len(), 2);
        assert_eq!(snapshot.active["terminal"].as_deref(), Some("terminal-2"));
        assert_eq!(snapshot.window_stack, vec!["finder", "terminal"]);
    }

    #[test]
    fn parse_reports_version_before_shape() {
        let raw = json!({"version": 2, "unexpected": true}).to_string();
        assert_eq!(
            SessionSnapshot::parse(&raw),
            Err(DesktopError::VersionMismatch {
                found: 2,
                expected: SESSION_VERSION
            })
        );
    }

    #[test]
    fn parse_rejects_structural_mismatch() {
        let unknown_field = json!({
            "version": 1, "timestamp": 0, "instances": {}, "active": {},
            "windowStack": [], "extra": 1
        });
        let dangling_active = json!({
            "version": 1, "timestamp": 0, "instances": {},
            "active": {"terminal": "terminal-9"}, "windowStack": []
        });
        let missing_version = json!({"timestamp": 0});

        for raw in [unknown_field, dangling_active, missing_version] {
            assert!(matches!(
                SessionSnapshot::parse(&raw.to_string()),
                Err(DesktopError::InvalidSnapshot(_))
            ));
        }
    }

    #[test]
    fn over_budget_write_sets_sticky_flag_until_one_fits() {
        let store = MemoryPrefsStore::default();
        let mut small = engine(&store, 10);
        let snapshot = empty_snapshot();

        assert!(matches!(
            small.persist(&snapshot),
            Err(DesktopError::StorageQuotaExceeded { .. })
        ));
        assert_eq!(small.persist(&snapshot), Ok(SaveOutcome::SkippedOverQuota));
        assert!(small.quota_exceeded());
        assert_eq!(store.write_count(), 0);

        small.budget_bytes = 1_000_000;
        assert!(matches!(
            small.persist(&snapshot),
            Ok(SaveOutcome::Written { .. })
        ));
        let stats = small.stats();
        assert!(!stats.quota_exceeded);
        assert_eq!(stats.writes, 1);
        assert_eq!(stats.skipped_writes, 2);
        assert_eq!(stats.last_saved_at, Some(42));
    }

    #[test]
    fn size_estimate_counts_utf16_units() {
        assert_eq!(estimate_stored_bytes("abc"), 6);
        assert_eq!(estimate_stored_bytes("é"), 2);
        assert_eq!(estimate_stored_bytes("𝄞"), 4);
    }

    #[test]
    fn parse_rejects_duplicate_instance_ids() {
        let record = json!({"instanceId": "terminal-1", "type": "terminal", "title": "One"});
        let raw = json!({
            "version": SESSION_VERSION,
            "timestamp": 0,
            "instances": {"terminal": [record.clone(), record]},
            "active": {"terminal": "terminal-1"},
            "windowStack": []
        })
        .to_string();

        assert!(matches!(
            SessionSnapshot::parse(&raw),
            Err(DesktopError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn apply_rejects_whole_snapshot_when_one_kind_is_invalid() {
        let store = MemoryPrefsStore::default();
        let session = engine(&store, 1_000_000);
        let mut scratch =
            InstanceManager::new("scratch", "scratch", |core| TerminalInstance::new(core, 50))
                .with_title_prefix("Scratch");
        scratch.create_instance(InstanceSeed::default());
        let mut terms = terminals();
        terms.create_instance(InstanceSeed::default().with_title("Keep me"));
        let mut stack = ZOrderStack::new(1_000, 9_000);
        stack.bring_to_front("terminal");

        let mut snapshot = SessionSnapshot::capture(&[&scratch], &ZOrderStack::new(1, 10), 3);
        snapshot.instances.get_mut("scratch").expect("scratch")[0].title = "Replaced".to_string();
        let duplicate = terms.serialize_all()[0].clone();
        snapshot
            .instances
            .insert("terminal".to_string(), vec![duplicate.clone(), duplicate]);

        let result = session.apply(
            &snapshot,
            &mut [&mut scratch, &mut terms],
            &mut stack,
            |_| true,
        );

        assert!(matches!(result, Err(DesktopError::InvalidSnapshot(_))));
        assert_eq!(
            scratch.active_instance().map(|i| i.core().title().to_string()),
            Some("Scratch 1".to_string())
        );
        assert_eq!(
            terms.active_instance().map(|i| i.core().title().to_string()),
            Some("Keep me".to_string())
        );
        assert_eq!(stack.ids(), ["terminal"]);
    }

    #[test]
    fn apply_restores_managers_and_filters_stack() {
        let store = MemoryPrefsStore::default();
        let mut session = engine(&store, 1_000_000);
        let mut source = terminals();
        source.create_instance(InstanceSeed::default());
        source.create_instance(InstanceSeed::default());
        source.set_active_instance("terminal-1");
        let mut stack = ZOrderStack::new(1_000, 9_000);
        stack.bring_to_front("terminal");
        stack.bring_to_front("ghost");
        let mut snapshot = SessionSnapshot::capture(&[&source], &stack, 1);
        snapshot.instances.insert("paint".to_string(), Vec::new());
        session.persist(&snapshot).expect("persist");

        let loaded = session.load().expect("load").expect("stored");
        let mut target = terminals();
        let mut restored_stack = ZOrderStack::new(1_000, 9_000);
        let report = session
            .apply(
                &loaded,
                &mut [&mut target],
                &mut restored_stack,
                |id| id == "terminal",
            )
            .expect("apply");

        assert_eq!(report.restored_instances, 2);
        assert_eq!(report.skipped_kinds, vec!["paint".to_string()]);
        assert_eq!(target.active_instance_id(), Some("terminal-1"));
        assert_eq!(restored_stack.ids(), ["terminal"]);
    }
}
