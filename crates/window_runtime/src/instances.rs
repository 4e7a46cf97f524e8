//! Multi-instance windows: a shared lifecycle contract plus a generic manager per instance kind.
//!
//! Concrete variants (terminal, editor, finder) implement [`WindowInstance`] and delegate their
//! bookkeeping to an embedded [`InstanceCore`]. An [`InstanceManager`] owns every instance of one
//! kind, tracks which one is active, and notifies subscribers on structural change.

use std::{collections::HashSet, rc::Rc};

use leptos::logging;
use platform_host::PrefsStore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{debounce::Debouncer, error::DesktopError, persistence};

/// Metadata flag marking the active instance inside serialized records.
pub const ACTIVE_METADATA_KEY: &str = "isActive";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
/// Serialized form of one instance.
pub struct InstanceRecord {
    pub instance_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub state: Value,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl InstanceRecord {
    pub fn is_flagged_active(&self) -> bool {
        self.metadata
            .get(ACTIVE_METADATA_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Initialized { region: String },
    Shown,
    Hidden,
    Focused,
    Blurred,
    StateChanged,
    TitleChanged(String),
    Destroyed,
}

impl LifecycleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialized { .. } => "initialized",
            Self::Shown => "shown",
            Self::Hidden => "hidden",
            Self::Focused => "focused",
            Self::Blurred => "blurred",
            Self::StateChanged => "state-changed",
            Self::TitleChanged(_) => "title-changed",
            Self::Destroyed => "destroyed",
        }
    }
}

/// Lifecycle listener. Receives the instance id and the event; an `Err` is logged and skipped.
pub type LifecycleListener = Rc<dyn Fn(&str, &LifecycleEvent) -> Result<(), String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Bookkeeping shared by every instance variant.
pub struct InstanceCore {
    id: String,
    kind: String,
    title: String,
    metadata: Map<String, Value>,
    region: Option<String>,
    visible: bool,
    focused: bool,
    destroyed: bool,
    listeners: Vec<(ListenerId, LifecycleListener)>,
    next_listener: u64,
}

impl InstanceCore {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            title: title.into(),
            metadata: Map::new(),
            region: None,
            visible: false,
            focused: false,
            destroyed: false,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn is_initialized(&self) -> bool {
        self.region.is_some()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        if title == self.title {
            return;
        }
        self.title = title.clone();
        self.emit(&LifecycleEvent::TitleChanged(title));
    }

    /// Shallow-merges `metadata` into the instance metadata. The active flag is never stored.
    pub fn merge_metadata(&mut self, metadata: &Map<String, Value>) {
        for (key, value) in metadata {
            if key != ACTIVE_METADATA_KEY {
                self.metadata.insert(key.clone(), value.clone());
            }
        }
    }

    pub fn add_listener(
        &mut self,
        listener: impl Fn(&str, &LifecycleEvent) -> Result<(), String> + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        let listener: LifecycleListener = Rc::new(listener);
        self.listeners.push((id, listener));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        before != self.listeners.len()
    }

    /// Delivers `event` to every listener. Returns how many listeners failed.
    pub fn emit(&self, event: &LifecycleEvent) -> usize {
        let mut failures = 0;
        for (_, listener) in &self.listeners {
            if let Err(message) = listener(&self.id, event) {
                failures += 1;
                let err = DesktopError::ListenerFailed {
                    event: format!("{} on `{}`", event.name(), self.id),
                    message,
                };
                logging::warn!("{err}");
            }
        }
        failures
    }

    pub fn mark_initialized(&mut self, region: &str) {
        self.region = Some(region.to_string());
        self.emit(&LifecycleEvent::Initialized {
            region: region.to_string(),
        });
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.visible == visible {
            return;
        }
        self.visible = visible;
        self.emit(if visible {
            &LifecycleEvent::Shown
        } else {
            &LifecycleEvent::Hidden
        });
    }

    pub fn set_focused(&mut self, focused: bool) {
        if self.focused == focused {
            return;
        }
        self.focused = focused;
        self.emit(if focused {
            &LifecycleEvent::Focused
        } else {
            &LifecycleEvent::Blurred
        });
    }

    pub fn state_changed(&self) {
        self.emit(&LifecycleEvent::StateChanged);
    }

    /// Emits `Destroyed` once, then drops every listener.
    pub fn mark_destroyed(&mut self) {
        if self.destroyed {
            return;
        }
        self.focused = false;
        self.visible = false;
        self.destroyed = true;
        self.emit(&LifecycleEvent::Destroyed);
        self.listeners.clear();
    }

    pub fn record(&self, state: Value) -> InstanceRecord {
        InstanceRecord {
            instance_id: self.id.clone(),
            kind: self.kind.clone(),
            title: self.title.clone(),
            state,
            metadata: self.metadata.clone(),
        }
    }

    /// Applies the record's title and metadata without notifying listeners.
    pub fn apply_record(&mut self, record: &InstanceRecord) {
        self.title = record.title.clone();
        self.metadata.clear();
        self.merge_metadata(&record.metadata);
    }
}

/// Capability set every multi-instance window content implements.
pub trait WindowInstance {
    fn core(&self) -> &InstanceCore;
    fn core_mut(&mut self) -> &mut InstanceCore;

    /// Variant-specific state for [`WindowInstance::serialize`].
    fn serialize_state(&self) -> Value;
    /// Restores variant-specific state from a record's `state` payload.
    fn restore_state(&mut self, state: &Value) -> Result<(), DesktopError>;

    fn init(&mut self, region: &str) {
        self.core_mut().mark_initialized(region);
    }

    fn show(&mut self) {
        self.core_mut().set_visible(true);
    }

    fn hide(&mut self) {
        self.core_mut().set_visible(false);
    }

    fn focus(&mut self) {
        self.core_mut().set_visible(true);
        self.core_mut().set_focused(true);
    }

    fn blur(&mut self) {
        self.core_mut().set_focused(false);
    }

    fn destroy(&mut self) {
        self.core_mut().mark_destroyed();
    }

    fn serialize(&self) -> InstanceRecord {
        self.core().record(self.serialize_state())
    }

    fn deserialize(&mut self, record: &InstanceRecord) -> Result<(), DesktopError> {
        self.restore_state(&record.state)?;
        self.core_mut().apply_record(record);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Caller-supplied options for [`InstanceManager::create_instance`].
pub struct InstanceSeed {
    pub instance_id: Option<String>,
    pub title: Option<String>,
    pub metadata: Map<String, Value>,
}

impl InstanceSeed {
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.instance_id = Some(id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceChange {
    Created(String),
    Destroyed(String),
    Activated(Option<String>),
    Reordered,
    Restored(usize),
}

pub type ChangeListener = Rc<dyn Fn(&InstanceChange)>;
pub type InstanceFactory<I> = Box<dyn Fn(InstanceCore) -> I>;

/// Type-erased view the session engine uses to snapshot and restore managers.
pub trait SessionParticipant {
    fn kind(&self) -> &str;
    fn serialize_all(&self) -> Vec<InstanceRecord>;
    fn check_records(&self, records: &[InstanceRecord]) -> Result<(), DesktopError>;
    fn deserialize_all(&mut self, records: &[InstanceRecord]) -> Result<usize, DesktopError>;
    fn active_instance_id(&self) -> Option<&str>;
    fn set_active_instance(&mut self, instance_id: &str) -> bool;
    fn destroy_all(&mut self);
}

pub struct InstanceManager<I: WindowInstance> {
    kind: String,
    title_prefix: String,
    content_region: String,
    max_instances: usize,
    factory: InstanceFactory<I>,
    instances: Vec<I>,
    active: Option<String>,
    /// Least recently activated first.
    activation_order: Vec<String>,
    next_seq: u64,
    change_listeners: Vec<(ListenerId, ChangeListener)>,
    next_listener: u64,
    save: Option<Debouncer>,
    prefs: Option<Rc<dyn PrefsStore>>,
}

impl<I: WindowInstance> InstanceManager<I> {
    /// Creates an empty manager for `kind` whose instances live inside `content_region`.
    pub fn new(
        kind: impl Into<String>,
        content_region: impl Into<String>,
        factory: impl Fn(InstanceCore) -> I + 'static,
    ) -> Self {
        let kind = kind.into();
        Self {
            title_prefix: kind.clone(),
            kind,
            content_region: content_region.into(),
            max_instances: 0,
            factory: Box::new(factory),
            instances: Vec::new(),
            active: None,
            activation_order: Vec::new(),
            next_seq: 1,
            change_listeners: Vec::new(),
            next_listener: 0,
            save: None,
            prefs: None,
        }
    }

    pub fn with_title_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.title_prefix = prefix.into();
        self
    }

    /// Caps the instance count. `0` means unlimited.
    pub fn with_max_instances(mut self, max: usize) -> Self {
        self.max_instances = max;
        self
    }

    pub fn with_save_trigger(mut self, save: Debouncer) -> Self {
        self.save = Some(save);
        self
    }

    pub fn with_prefs(mut self, prefs: Rc<dyn PrefsStore>) -> Self {
        self.prefs = Some(prefs);
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn max_instances(&self) -> usize {
        self.max_instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn instance_ids(&self) -> Vec<String> {
        self.instances
            .iter()
            .map(|instance| instance.core().id().to_string())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &I> + '_ {
        self.instances.iter()
    }

    pub fn get(&self, instance_id: &str) -> Option<&I> {
        self.instances
            .iter()
            .find(|instance| instance.core().id() == instance_id)
    }

    pub fn get_mut(&mut self, instance_id: &str) -> Option<&mut I> {
        self.instances
            .iter_mut()
            .find(|instance| instance.core().id() == instance_id)
    }

    pub fn active_instance_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_instance(&self) -> Option<&I> {
        self.get(self.active.as_deref()?)
    }

    pub fn active_instance_mut(&mut self) -> Option<&mut I> {
        let active = self.active.clone()?;
        self.get_mut(&active)
    }

    pub fn on_change(&mut self, listener: impl Fn(&InstanceChange) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.change_listeners.push((id, Rc::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.change_listeners.len();
        self.change_listeners
            .retain(|(listener_id, _)| *listener_id != id);
        before != self.change_listeners.len()
    }

    /// Creates (or reuses, for a known caller-supplied id) an instance and makes it active.
    /// Returns `None` when the manager is at capacity.
    pub fn create_instance(&mut self, seed: InstanceSeed) -> Option<&mut I> {
        match self.try_create_instance(seed) {
            Ok(index) => self.instances.get_mut(index),
            Err(err) => {
                logging::warn!("{err}");
                None
            }
        }
    }

    fn try_create_instance(&mut self, seed: InstanceSeed) -> Result<usize, DesktopError> {
        if let Some(existing) = seed
            .instance_id
            .as_deref()
            .and_then(|id| self.position_of(id))
        {
            let instance = &mut self.instances[existing];
            if let Some(title) = seed.title {
                instance.core_mut().set_title(title);
            }
            instance.core_mut().merge_metadata(&seed.metadata);
            let id = instance.core().id().to_string();
            self.activate(&id);
            self.trigger_save();
            return Ok(existing);
        }

        if self.max_instances > 0 && self.instances.len() >= self.max_instances {
            return Err(DesktopError::InstanceCapacity {
                kind: self.kind.clone(),
                max: self.max_instances,
            });
        }

        let (id, seq) = match seed.instance_id {
            Some(id) => (id, self.next_seq),
            None => self.allocate_id(),
        };
        let title = seed
            .title
            .unwrap_or_else(|| format!("{} {seq}", self.title_prefix));
        self.next_seq = self.next_seq.max(seq + 1);

        let mut core = InstanceCore::new(id.clone(), self.kind.clone(), title);
        core.merge_metadata(&seed.metadata);
        let instance = self.build(core);
        self.instances.push(instance);
        self.notify(&InstanceChange::Created(id.clone()));
        self.activate(&id);
        self.trigger_save();
        Ok(self.instances.len() - 1)
    }

    /// Tears down and removes an instance. Active falls back to the most recently active
    /// remaining instance.
    pub fn destroy_instance(&mut self, instance_id: &str) -> bool {
        let Some(index) = self.position_of(instance_id) else {
            logging::warn!(
                "{}",
                DesktopError::UnknownInstance {
                    kind: self.kind.clone(),
                    instance_id: instance_id.to_string(),
                }
            );
            return false;
        };
        let mut instance = self.instances.remove(index);
        instance.destroy();
        self.activation_order.retain(|id| id != instance_id);
        self.notify(&InstanceChange::Destroyed(instance_id.to_string()));

        if self.active.as_deref() == Some(instance_id) {
            self.active = None;
            let fallback = self
                .activation_order
                .last()
                .cloned()
                .or_else(|| self.instance_ids().pop());
            match fallback {
                Some(next) => self.activate(&next),
                None => self.notify(&InstanceChange::Activated(None)),
            }
        }
        self.trigger_save();
        true
    }

    pub fn set_active_instance(&mut self, instance_id: &str) -> bool {
        if self.active.as_deref() == Some(instance_id) {
            return true;
        }
        if self.position_of(instance_id).is_none() {
            logging::warn!(
                "{}",
                DesktopError::UnknownInstance {
                    kind: self.kind.clone(),
                    instance_id: instance_id.to_string(),
                }
            );
            return false;
        }
        self.activate(instance_id);
        self.trigger_save();
        true
    }

    /// Serializes every instance in order, flagging the active one in its metadata.
    pub fn serialize_all(&self) -> Vec<InstanceRecord> {
        self.instances
            .iter()
            .map(|instance| {
                let mut record = instance.serialize();
                record.metadata.remove(ACTIVE_METADATA_KEY);
                if self.active.as_deref() == Some(record.instance_id.as_str()) {
                    record
                        .metadata
                        .insert(ACTIVE_METADATA_KEY.to_string(), Value::Bool(true));
                }
                record
            })
            .collect()
    }

    /// Replaces every instance with the given records and reselects the flagged active one.
    ///
    /// Records of another kind or with duplicate ids reject the whole batch. A record whose state
    /// cannot be restored is skipped.
    pub fn deserialize_all(&mut self, records: &[InstanceRecord]) -> Result<usize, DesktopError> {
        self.check_records(records)?;

        let _suspended = self.save.as_ref().map(Debouncer::suspend);
        self.destroy_all();

        let mut flagged_active = None;
        for record in records {
            if self.max_instances > 0 && self.instances.len() >= self.max_instances {
                logging::warn!(
                    "{} restore truncated at {} instances",
                    self.kind,
                    self.max_instances
                );
                break;
            }
            let core = InstanceCore::new(
                record.instance_id.clone(),
                self.kind.clone(),
                record.title.clone(),
            );
            let mut instance = self.build(core);
            if let Err(err) = instance.deserialize(record) {
                logging::warn!("skipping {} `{}`: {err}", self.kind, record.instance_id);
                instance.destroy();
                continue;
            }
            if record.is_flagged_active() {
                flagged_active = Some(record.instance_id.clone());
            }
            self.bump_seq_past(&record.instance_id);
            self.instances.push(instance);
        }

        let restored = self.instances.len();
        if let Some(active) = flagged_active.or_else(|| self.instance_ids().pop()) {
            self.activate(&active);
        }
        self.notify(&InstanceChange::Restored(restored));
        Ok(restored)
    }

    /// Rejects records of another kind and duplicate ids without touching live instances.
    pub fn check_records(&self, records: &[InstanceRecord]) -> Result<(), DesktopError> {
        let mut seen = HashSet::new();
        for record in records {
            if record.kind != self.kind {
                return Err(DesktopError::InvalidSnapshot(format!(
                    "record `{}` has type `{}`, expected `{}`",
                    record.instance_id, record.kind, self.kind
                )));
            }
            if !seen.insert(record.instance_id.as_str()) {
                return Err(DesktopError::InvalidSnapshot(format!(
                    "duplicate {} instance id `{}`",
                    self.kind, record.instance_id
                )));
            }
        }
        Ok(())
    }

    /// Accepts `new_order` only when it is a permutation of the current instance ids.
    pub fn reorder_instances(&mut self, new_order: &[&str]) -> bool {
        let current: HashSet<&str> = self
            .instances
            .iter()
            .map(|instance| instance.core().id())
            .collect();
        let requested: HashSet<&str> = new_order.iter().copied().collect();
        if new_order.len() != self.instances.len()
            || requested.len() != new_order.len()
            || requested != current
        {
            logging::warn!(
                "ignoring {} reorder: {:?} is not a permutation of the current instances",
                self.kind,
                new_order
            );
            return false;
        }

        let mut remaining = std::mem::take(&mut self.instances);
        for id in new_order {
            if let Some(index) = remaining.iter().position(|i| i.core().id() == *id) {
                self.instances.push(remaining.swap_remove(index));
            }
        }
        self.notify(&InstanceChange::Reordered);
        self.trigger_save();
        true
    }

    /// Destroys every instance without activating a fallback.
    pub fn destroy_all(&mut self) {
        for mut instance in self.instances.drain(..) {
            instance.destroy();
        }
        self.activation_order.clear();
        if self.active.take().is_some() {
            self.notify(&InstanceChange::Activated(None));
        }
    }

    fn position_of(&self, instance_id: &str) -> Option<usize> {
        self.instances
            .iter()
            .position(|instance| instance.core().id() == instance_id)
    }

    fn allocate_id(&mut self) -> (String, u64) {
        loop {
            let seq = self.next_seq;
            self.next_seq += 1;
            let id = format!("{}-{seq}", self.kind);
            if self.position_of(&id).is_none() {
                return (id, seq);
            }
        }
    }

    fn bump_seq_past(&mut self, instance_id: &str) {
        let suffix = instance_id
            .strip_prefix(self.kind.as_str())
            .and_then(|rest| rest.strip_prefix('-'))
            .and_then(|seq| seq.parse::<u64>().ok());
        if let Some(seq) = suffix {
            self.next_seq = self.next_seq.max(seq + 1);
        }
    }

    fn build(&self, core: InstanceCore) -> I {
        let mut instance = (self.factory)(core);
        if let Some(save) = self.save.clone() {
            instance
                .core_mut()
                .add_listener(move |_, event| {
                    if matches!(
                        event,
                        LifecycleEvent::StateChanged | LifecycleEvent::TitleChanged(_)
                    ) {
                        save.trigger();
                    }
                    Ok(())
                });
        }
        instance.init(&self.content_region);
        instance
    }

    fn activate(&mut self, instance_id: &str) {
        if self.active.as_deref() != Some(instance_id) {
            if let Some(previous) = self.active_instance_mut() {
                previous.blur();
            }
        }
        if let Some(next) = self.get_mut(instance_id) {
            next.focus();
        }
        self.active = Some(instance_id.to_string());
        self.activation_order.retain(|id| id != instance_id);
        self.activation_order.push(instance_id.to_string());

        if let Some(prefs) = self.prefs.as_deref() {
            if let Err(err) = persistence::save_last_active_instance(prefs, &self.kind, instance_id)
            {
                logging::warn!("last active {} instance not saved: {err}", self.kind);
            }
        }
        self.notify(&InstanceChange::Activated(Some(instance_id.to_string())));
    }

    fn trigger_save(&self) {
        if let Some(save) = &self.save {
            save.trigger();
        }
    }

    fn notify(&self, change: &InstanceChange) {
        for (_, listener) in &self.change_listeners {
            listener(change);
        }
    }
}

impl<I: WindowInstance> SessionParticipant for InstanceManager<I> {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn serialize_all(&self) -> Vec<InstanceRecord> {
        InstanceManager::serialize_all(self)
    }

    fn check_records(&self, records: &[InstanceRecord]) -> Result<(), DesktopError> {
        InstanceManager::check_records(self, records)
    }

    fn deserialize_all(&mut self, records: &[InstanceRecord]) -> Result<usize, DesktopError> {
        InstanceManager::deserialize_all(self, records)
    }

    fn active_instance_id(&self) -> Option<&str> {
        InstanceManager::active_instance_id(self)
    }

    fn set_active_instance(&mut self, instance_id: &str) -> bool {
        InstanceManager::set_active_instance(self, instance_id)
    }

    fn destroy_all(&mut self) {
        InstanceManager::destroy_all(self)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use platform_host::{ManualScheduler, MemoryPrefsStore};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    struct NoteInstance {
        core: InstanceCore,
        text: String,
    }

    impl NoteInstance {
        fn write(&mut self, text: &str) {
            self.text = text.to_string();
            self.core.state_changed();
        }
    }

    impl WindowInstance for NoteInstance {
        fn core(&self) -> &InstanceCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut InstanceCore {
            &mut self.core
        }

        fn serialize_state(&self) -> Value {
            json!({ "text": self.text })
        }

        fn restore_state(&mut self, state: &Value) -> Result<(), DesktopError> {
            self.text = state
                .get("text")
                .and_then(Value::as_str)
                .ok_or_else(|| DesktopError::InvalidSnapshot("missing text".to_string()))?
                .to_string();
            Ok(())
        }
    }

    fn manager() -> InstanceManager<NoteInstance> {
        InstanceManager::new("note", "notes", |core| NoteInstance {
            core,
            text: String::new(),
        })
        .with_title_prefix("Note")
    }

    #[test]
    fn create_allocates_sequential_ids_and_titles() {
        let mut notes = manager();
        notes.create_instance(InstanceSeed::default());
        notes.create_instance(InstanceSeed::default());

        assert_eq!(notes.instance_ids(), vec!["note-1", "note-2"]);
        assert_eq!(notes.get("note-2").expect("created").core().title(), "Note 2");
        assert_eq!(notes.active_instance_id(), Some("note-2"));
        let first = notes.get("note-1").expect("created");
        assert!(!first.core().is_focused());
        assert_eq!(first.core().region(), Some("notes"));
    }

    #[test]
    fn create_with_known_id_reuses_and_merges() {
        let mut notes = manager();
        notes.create_instance(InstanceSeed::default().with_id("a").with_title("First"));
        notes.create_instance(InstanceSeed::default());

        let reused = notes
            .create_instance(
                InstanceSeed::default()
                    .with_id("a")
                    .with_title("Renamed")
                    .with_metadata("pinned", json!(true)),
            )
            .expect("reused");
        assert_eq!(reused.core().title(), "Renamed");
        assert_eq!(reused.core().metadata().get("pinned"), Some(&json!(true)));
        assert_eq!(notes.len(), 2);
        assert_eq!(notes.active_instance_id(), Some("a"));
    }

    #[test]
    fn create_at_capacity_returns_none_and_keeps_count() {
        let mut notes = manager().with_max_instances(2);
        assert!(notes.create_instance(InstanceSeed::default()).is_some());
        assert!(notes.create_instance(InstanceSeed::default()).is_some());

        assert!(notes.create_instance(InstanceSeed::default()).is_none());
        assert_eq!(notes.len(), 2);
    }

    #[test]
    fn destroying_active_falls_back_to_most_recent_remaining() {
        let mut notes = manager();
        for _ in 0..3 {
            notes.create_instance(InstanceSeed::default());
        }
        notes.set_active_instance("note-1");
        notes.set_active_instance("note-3");

        assert!(notes.destroy_instance("note-3"));
        assert_eq!(notes.active_instance_id(), Some("note-1"));

        assert!(notes.destroy_instance("note-1"));
        assert!(notes.destroy_instance("note-2"));
        assert_eq!(notes.active_instance_id(), None);
        assert!(!notes.destroy_instance("note-2"));
    }

    #[test]
    fn serialize_then_deserialize_round_trips_ids_titles_and_active() {
        let mut notes = manager();
        notes.create_instance(InstanceSeed::default().with_title("Groceries"));
        notes.create_instance(InstanceSeed::default().with_title("Todo"));
        notes
            .get_mut("note-1")
            .expect("created")
            .write("milk, eggs");
        notes.set_active_instance("note-1");

        let records = notes.serialize_all();
        assert!(records[0].is_flagged_active());
        assert!(!records[1].is_flagged_active());

        let mut restored = manager();
        assert_eq!(restored.deserialize_all(&records), Ok(2));
        assert_eq!(restored.instance_ids(), notes.instance_ids());
        assert_eq!(restored.active_instance_id(), Some("note-1"));
        let groceries = restored.get("note-1").expect("restored");
        assert_eq!(groceries.core().title(), "Groceries");
        assert_eq!(groceries.text, "milk, eggs");
        assert!(!groceries.core().metadata().contains_key(ACTIVE_METADATA_KEY));

        restored.create_instance(InstanceSeed::default());
        assert!(restored.get("note-3").is_some());
    }

    #[test]
    fn deserialize_rejects_foreign_kinds_without_touching_state() {
        let mut notes = manager();
        notes.create_instance(InstanceSeed::default());
        let foreign = InstanceRecord {
            instance_id: "x".to_string(),
            kind: "terminal".to_string(),
            title: "X".to_string(),
            state: json!({}),
            metadata: Map::new(),
        };

        assert!(notes.deserialize_all(&[foreign]).is_err());
        assert_eq!(notes.instance_ids(), vec!["note-1"]);
    }

    #[test]
    fn deserialize_skips_unrestorable_records() {
        let mut notes = manager();
        let records = vec![
            InstanceRecord {
                instance_id: "note-4".to_string(),
                kind: "note".to_string(),
                title: "Broken".to_string(),
                state: Value::Null,
                metadata: Map::new(),
            },
            InstanceRecord {
                instance_id: "note-5".to_string(),
                kind: "note".to_string(),
                title: "Fine".to_string(),
                state: json!({"text": "ok"}),
                metadata: Map::new(),
            },
        ];

        assert_eq!(notes.deserialize_all(&records), Ok(1));
        assert_eq!(notes.active_instance_id(), Some("note-5"));
    }

    #[test]
    fn reorder_requires_exact_permutation() {
        let mut notes = manager();
        for _ in 0..3 {
            notes.create_instance(InstanceSeed::default());
        }

        assert!(!notes.reorder_instances(&["note-1", "note-2"]));
        assert!(!notes.reorder_instances(&["note-1", "note-1", "note-2"]));
        assert!(!notes.reorder_instances(&["note-1", "note-2", "ghost"]));
        assert_eq!(notes.instance_ids(), vec!["note-1", "note-2", "note-3"]);

        assert!(notes.reorder_instances(&["note-3", "note-1", "note-2"]));
        assert_eq!(notes.instance_ids(), vec!["note-3", "note-1", "note-2"]);
    }

    #[test]
    fn change_listeners_observe_structure_and_can_be_removed() {
        let mut notes = manager();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let listener = notes.on_change(move |change| sink.borrow_mut().push(change.clone()));

        notes.create_instance(InstanceSeed::default());
        notes.destroy_instance("note-1");
        assert!(notes.remove_listener(listener));
        notes.create_instance(InstanceSeed::default());

        assert_eq!(
            *seen.borrow(),
            vec![
                InstanceChange::Created("note-1".to_string()),
                InstanceChange::Activated(Some("note-1".to_string())),
                InstanceChange::Destroyed("note-1".to_string()),
                InstanceChange::Activated(None),
            ]
        );
    }

    #[test]
    fn failing_lifecycle_listener_does_not_block_siblings() {
        let mut core = InstanceCore::new("note-1", "note", "Note 1");
        let delivered = Rc::new(Cell::new(0));
        let counter = Rc::clone(&delivered);
        core.add_listener(|_, _| Err("boom".to_string()));
        core.add_listener(move |_, _| {
            counter.set(counter.get() + 1);
            Ok(())
        });

        assert_eq!(core.emit(&LifecycleEvent::Shown), 1);
        assert_eq!(delivered.get(), 1);
    }

    #[test]
    fn state_changes_coalesce_into_one_debounced_save() {
        let scheduler = ManualScheduler::default();
        let save = Debouncer::new(Rc::new(scheduler.clone()), 750);
        let saves = Rc::new(Cell::new(0));
        let counter = Rc::clone(&saves);
        save.set_action(move || counter.set(counter.get() + 1));
        let prefs = MemoryPrefsStore::default();
        let mut notes = manager()
            .with_save_trigger(save)
            .with_prefs(Rc::new(prefs.clone()));

        notes.create_instance(InstanceSeed::default());
        for text in ["a", "ab", "abc"] {
            notes.get_mut("note-1").expect("created").write(text);
            scheduler.advance(50);
        }
        scheduler.advance(1_000);

        assert_eq!(saves.get(), 1);
        assert!(prefs.contains_key(persistence::LAST_ACTIVE_INSTANCES_KEY));
    }
}
