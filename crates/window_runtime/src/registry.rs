//! Window registry: one configuration record per declared window id.

use std::collections::HashMap;

use leptos::logging;

use crate::{
    dialog::DialogController,
    error::DesktopError,
    model::{WindowCategory, WindowConfig},
};

include!(concat!(env!("OUT_DIR"), "/window_catalog_generated.rs"));

struct RegistryEntry {
    config: WindowConfig,
    dialog: Option<DialogController>,
}

#[derive(Default)]
/// Registered window configurations in registration order, plus their attached dialogs.
pub struct WindowRegistry {
    entries: HashMap<String, RegistryEntry>,
    order: Vec<String>,
}

impl WindowRegistry {
    /// Stores `config` under its id. A second registration of the same id is logged and ignored.
    pub fn register(&mut self, config: WindowConfig) -> bool {
        match self.try_register(config) {
            Ok(()) => true,
            Err(err) => {
                logging::warn!("{err}");
                false
            }
        }
    }

    pub fn try_register(&mut self, config: WindowConfig) -> Result<(), DesktopError> {
        if self.entries.contains_key(&config.id) {
            return Err(DesktopError::RegistrationConflict(config.id));
        }
        self.order.push(config.id.clone());
        self.entries.insert(
            config.id.clone(),
            RegistryEntry {
                config,
                dialog: None,
            },
        );
        Ok(())
    }

    /// Registers each config in order and returns how many were new.
    pub fn register_all(&mut self, configs: impl IntoIterator<Item = WindowConfig>) -> usize {
        configs
            .into_iter()
            .map(|config| self.register(config))
            .filter(|added| *added)
            .count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get_config(&self, id: &str) -> Option<&WindowConfig> {
        self.entries.get(id).map(|entry| &entry.config)
    }

    pub fn get_all_window_ids(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn get_persistent_window_ids(&self) -> Vec<String> {
        self.ids_in_category(WindowCategory::Persistent)
    }

    pub fn get_transient_window_ids(&self) -> Vec<String> {
        self.ids_in_category(WindowCategory::Transient)
    }

    fn ids_in_category(&self, category: WindowCategory) -> Vec<String> {
        self.order
            .iter()
            .filter(|id| {
                self.entries
                    .get(id.as_str())
                    .is_some_and(|entry| entry.config.category == category)
            })
            .cloned()
            .collect()
    }

    /// Attaches the runtime dialog for a registered window, replacing any previous one.
    pub fn attach_dialog(&mut self, id: &str, dialog: DialogController) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.dialog = Some(dialog);
                true
            }
            None => {
                logging::warn!("cannot attach dialog to unknown window `{id}`");
                false
            }
        }
    }

    pub fn get_dialog(&self, id: &str) -> Option<&DialogController> {
        self.entries.get(id)?.dialog.as_ref()
    }

    pub fn get_dialog_mut(&mut self, id: &str) -> Option<&mut DialogController> {
        self.entries.get_mut(id)?.dialog.as_mut()
    }
}

/// Parses the build-time window catalog generated from `windows.manifest.toml`.
pub fn builtin_window_configs() -> Vec<WindowConfig> {
    match serde_json::from_str::<Vec<WindowConfig>>(WINDOW_CATALOG_JSON) {
        Ok(configs) => configs,
        Err(err) => {
            logging::warn!("window catalog parse failed: {err}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::WindowGeometry;

    fn registry_with(ids: &[(&str, WindowCategory)]) -> WindowRegistry {
        let mut registry = WindowRegistry::default();
        for (id, category) in ids {
            registry.register(WindowConfig::new(*id, *category));
        }
        registry
    }

    #[test]
    fn re_registration_keeps_first_config() {
        let mut registry = WindowRegistry::default();
        assert!(registry.register(WindowConfig::new("finder", WindowCategory::Persistent)));
        assert!(!registry.register(
            WindowConfig::new("finder", WindowCategory::Transient).with_icon("other")
        ));

        assert_eq!(
            registry.try_register(WindowConfig::new("finder", WindowCategory::Persistent)),
            Err(DesktopError::RegistrationConflict("finder".to_string()))
        );

        let config = registry.get_config("finder").expect("registered");
        assert_eq!(config.category, WindowCategory::Persistent);
        assert_eq!(registry.get_all_window_ids(), vec!["finder".to_string()]);
    }

    #[test]
    fn category_filters_preserve_registration_order() {
        let registry = registry_with(&[
            ("terminal", WindowCategory::Persistent),
            ("alert", WindowCategory::Transient),
            ("finder", WindowCategory::Persistent),
        ]);

        assert_eq!(
            registry.get_persistent_window_ids(),
            vec!["terminal".to_string(), "finder".to_string()]
        );
        assert_eq!(registry.get_transient_window_ids(), vec!["alert".to_string()]);
    }

    #[test]
    fn unknown_lookups_are_empty() {
        let mut registry = WindowRegistry::default();
        assert!(registry.get_config("nope").is_none());
        assert!(registry.get_dialog("nope").is_none());
        assert!(!registry.attach_dialog(
            "nope",
            DialogController::new("nope", WindowGeometry::default(), true)
        ));
    }

    #[test]
    fn register_all_counts_only_new_ids() {
        let mut registry = WindowRegistry::default();
        let added = registry.register_all([
            WindowConfig::new("a", WindowCategory::Persistent),
            WindowConfig::new("b", WindowCategory::Persistent),
            WindowConfig::new("a", WindowCategory::Transient),
        ]);
        assert_eq!(added, 2);
    }

    #[test]
    fn builtin_catalog_declares_instance_windows() {
        let ids: Vec<String> = builtin_window_configs()
            .into_iter()
            .map(|config| config.id)
            .collect();
        for expected in ["finder", "terminal", "text-editor"] {
            assert!(ids.iter().any(|id| id == expected), "missing {expected}");
        }
    }
}
