//! Runtime façade tying the registry, stack, dialogs, instance managers, and session engine
//! together behind an API that never returns errors.
//!
//! Internal failures are [`DesktopError`]s; this layer logs them through `leptos::logging` and
//! hands callers a `bool` or `Option`. Deferred work (debounced saves and frame-paced pointer
//! updates) reaches the runtime through a weak self-reference, so the runtime lives in a
//! [`SharedDesktop`] cell.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use leptos::logging;
use platform_host::{PrefsStore, TaskHandle, TaskScheduler};
use platform_host_web::{host_strategy_name, prefs_store, task_scheduler};

use crate::{
    apps::{
        self, FinderInstance, TerminalInstance, TextEditorInstance, FINDER_KIND, TERMINAL_KIND,
        TEXT_EDITOR_KIND,
    },
    config::DesktopConfig,
    debounce::Debouncer,
    dialog::{DialogController, DialogEffect, DialogEnv},
    error::DesktopError,
    instances::{InstanceCore, InstanceManager, SessionParticipant, WindowInstance},
    model::{
        PointerPosition, ResizeEdge, SnapSide, Viewport, WindowConfig, WindowGeometry,
        WindowState,
    },
    persistence,
    program_info::{program_info, FallbackTranslator, ProgramInfo, Translate},
    registry::{builtin_window_configs, WindowRegistry},
    session::{SaveOutcome, SessionEngine, SessionSnapshot, SessionStats},
    z_order::ZOrderStack,
};

/// Shared handle to a [`DesktopRuntime`].
pub type SharedDesktop = Rc<RefCell<DesktopRuntime>>;

#[derive(Clone)]
/// Host service bundle the runtime depends on.
pub struct DesktopServices {
    prefs: Rc<dyn PrefsStore>,
    scheduler: Rc<dyn TaskScheduler>,
    translator: Rc<dyn Translate>,
    host_strategy_name: &'static str,
}

impl Default for DesktopServices {
    fn default() -> Self {
        Self {
            prefs: Rc::new(prefs_store()),
            scheduler: Rc::new(task_scheduler()),
            translator: Rc::new(FallbackTranslator),
            host_strategy_name: host_strategy_name(),
        }
    }
}

impl DesktopServices {
    /// Bundles explicit adapters, e.g. in-memory ones for tests.
    pub fn new(prefs: Rc<dyn PrefsStore>, scheduler: Rc<dyn TaskScheduler>) -> Self {
        Self {
            prefs,
            scheduler,
            translator: Rc::new(FallbackTranslator),
            host_strategy_name: "custom",
        }
    }

    pub fn with_translator(mut self, translator: Rc<dyn Translate>) -> Self {
        self.translator = translator;
        self
    }

    pub fn prefs(&self) -> Rc<dyn PrefsStore> {
        self.prefs.clone()
    }

    pub fn scheduler(&self) -> Rc<dyn TaskScheduler> {
        self.scheduler.clone()
    }

    pub fn host_strategy_name(&self) -> &'static str {
        self.host_strategy_name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Page-level events that force an immediate session save.
pub enum PageEvent {
    /// The page lost foreground focus. Live drags and resizes are cancelled first.
    Blur,
    /// The page is being unloaded.
    Teardown,
    /// The document became hidden.
    Hidden,
}

struct ActiveInteraction {
    window_id: String,
    frame: Option<TaskHandle>,
}

pub struct DesktopRuntime {
    services: DesktopServices,
    config: DesktopConfig,
    viewport: Viewport,
    registry: WindowRegistry,
    stack: ZOrderStack,
    terminals: InstanceManager<TerminalInstance>,
    editors: InstanceManager<TextEditorInstance>,
    finders: InstanceManager<FinderInstance>,
    session: SessionEngine,
    interaction: Option<ActiveInteraction>,
    snap_preview: Option<SnapSide>,
    self_ref: Weak<RefCell<DesktopRuntime>>,
}

impl DesktopRuntime {
    /// Builds a runtime with the stored config override, or defaults.
    pub fn new(services: DesktopServices) -> SharedDesktop {
        let config = DesktopConfig::load(services.prefs.as_ref());
        Self::with_config(services, config)
    }

    pub fn with_config(services: DesktopServices, config: DesktopConfig) -> SharedDesktop {
        let config = config.normalized();
        Rc::new_cyclic(|self_ref: &Weak<RefCell<DesktopRuntime>>| {
            let debouncer = Debouncer::new(services.scheduler(), config.save_debounce_ms);
            let save_target = self_ref.clone();
            debouncer.set_action(move || {
                let Some(runtime) = save_target.upgrade() else {
                    return;
                };
                let Ok(mut runtime) = runtime.try_borrow_mut() else {
                    logging::warn!("debounced session save skipped: runtime is busy");
                    return;
                };
                runtime.save_now();
            });

            let history_limit = config.terminal_history_limit;
            let terminals = instance_manager(&services, &debouncer, TERMINAL_KIND, move |core| {
                TerminalInstance::new(core, history_limit)
            });
            let editors =
                instance_manager(&services, &debouncer, TEXT_EDITOR_KIND, TextEditorInstance::new);
            let start_location = match persistence::load_finder_state(services.prefs.as_ref()) {
                Ok(location) => location.unwrap_or_default(),
                Err(err) => {
                    logging::warn!("finder state load failed: {err}");
                    Default::default()
                }
            };
            let finders = instance_manager(&services, &debouncer, FINDER_KIND, move |core| {
                FinderInstance::new(core, start_location.clone())
            });

            let session =
                SessionEngine::new(services.prefs(), debouncer, config.storage_budget_bytes);
            RefCell::new(Self {
                stack: ZOrderStack::new(config.z_index_base, config.z_index_ceiling),
                services,
                config,
                viewport: Viewport::default(),
                registry: WindowRegistry::default(),
                terminals,
                editors,
                finders,
                session,
                interaction: None,
                snap_preview: None,
                self_ref: self_ref.clone(),
            })
        })
    }

    pub fn config(&self) -> &DesktopConfig {
        &self.config
    }

    pub fn services(&self) -> &DesktopServices {
        &self.services
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Updates the viewport and re-fits maximized and snapped windows.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        for id in self.registry.get_all_window_ids() {
            if let Some(dialog) = self.registry.get_dialog_mut(&id) {
                dialog.fit_to_viewport(viewport, &self.config);
            }
        }
    }

    // Registry

    /// Registers a window and attaches its dialog. Duplicate ids are ignored.
    pub fn register(&mut self, config: WindowConfig) -> bool {
        let id = config.id.clone();
        let dialog = DialogController::new(
            id.clone(),
            config.default_geometry.unwrap_or_default(),
            config.resizable,
        );
        if !self.registry.register(config) {
            return false;
        }
        self.registry.attach_dialog(&id, dialog)
    }

    pub fn register_all(&mut self, configs: impl IntoIterator<Item = WindowConfig>) -> usize {
        configs
            .into_iter()
            .filter(|config| self.register(config.clone()))
            .count()
    }

    /// Registers every window declared in the build-time manifest.
    pub fn register_builtin_windows(&mut self) -> usize {
        self.register_all(builtin_window_configs())
    }

    pub fn get_config(&self, id: &str) -> Option<&WindowConfig> {
        self.registry.get_config(id)
    }

    pub fn get_all_window_ids(&self) -> Vec<String> {
        self.registry.get_all_window_ids()
    }

    pub fn get_persistent_window_ids(&self) -> Vec<String> {
        self.registry.get_persistent_window_ids()
    }

    pub fn get_transient_window_ids(&self) -> Vec<String> {
        self.registry.get_transient_window_ids()
    }

    pub fn get_dialog(&self, id: &str) -> Option<&DialogController> {
        self.registry.get_dialog(id)
    }

    pub fn window_state(&self, id: &str) -> Option<WindowState> {
        self.registry.get_dialog(id).map(DialogController::state)
    }

    pub fn geometry(&self, id: &str) -> Option<WindowGeometry> {
        self.registry.get_dialog(id).map(DialogController::geometry)
    }

    pub fn z_index_of(&self, id: &str) -> Option<u32> {
        self.stack.z_index_of(id)
    }

    /// Tracked window ids, least recent first.
    pub fn window_stack(&self) -> &[String] {
        self.stack.ids()
    }

    pub fn program_info(&self, id: &str) -> Option<ProgramInfo> {
        let Some(config) = self.registry.get_config(id) else {
            logging::warn!("{}", DesktopError::UnknownWindowId(id.to_string()));
            return None;
        };
        Some(program_info(config, self.services.translator.as_ref()))
    }

    /// Records that the visual layer mounted the window's surface.
    pub fn mount_surface(&mut self, id: &str) -> bool {
        self.set_surface_mounted(id, true)
    }

    pub fn unmount_surface(&mut self, id: &str) -> bool {
        if self.interaction_window() == Some(id) {
            self.cancel_interaction();
        }
        self.set_surface_mounted(id, false)
    }

    fn set_surface_mounted(&mut self, id: &str, mounted: bool) -> bool {
        match self.registry.get_dialog_mut(id) {
            Some(dialog) => {
                dialog.set_surface_mounted(mounted);
                true
            }
            None => {
                logging::warn!("{}", DesktopError::UnknownWindowId(id.to_string()));
                false
            }
        }
    }

    // Dialog transitions

    pub fn open(&mut self, id: &str) -> bool {
        let result = self.with_dialog(id, |dialog, env| Ok(dialog.open(env)));
        self.finish(id, result)
    }

    pub fn close(&mut self, id: &str) -> bool {
        if self.interaction_window() == Some(id) {
            self.cancel_interaction();
        }
        let result = self.with_dialog(id, |dialog, env| Ok(dialog.close(env)));
        self.finish(id, result)
    }

    pub fn minimize(&mut self, id: &str) -> bool {
        if self.interaction_window() == Some(id) {
            self.cancel_interaction();
        }
        let result = self.with_dialog(id, |dialog, _| dialog.minimize());
        self.finish(id, result)
    }

    pub fn toggle_maximize(&mut self, id: &str) -> bool {
        let result = self.with_dialog(id, |dialog, env| dialog.toggle_maximize(env));
        self.finish(id, result)
    }

    pub fn snap_to(&mut self, id: &str, side: SnapSide) -> bool {
        let result = self.with_dialog(id, |dialog, env| dialog.snap_to(side, env));
        self.finish(id, result)
    }

    pub fn unsnap(&mut self, id: &str) -> bool {
        let result = self.with_dialog(id, |dialog, _| dialog.unsnap());
        self.finish(id, result)
    }

    pub fn bring_to_front(&mut self, id: &str) -> bool {
        let result = self.with_dialog(id, |dialog, env| {
            if !dialog.is_visible() {
                return Err(DesktopError::InvalidTransition {
                    window_id: id.to_string(),
                    operation: "bring to front",
                    state: dialog.state(),
                });
            }
            env.stack.bring_to_front(id);
            Ok(Vec::new())
        });
        self.finish(id, result)
    }

    /// Topmost window that is open and not minimized.
    pub fn get_top_window(&self) -> Option<String> {
        self.stack
            .ids()
            .iter()
            .rev()
            .find(|id| {
                self.registry
                    .get_dialog(id)
                    .is_some_and(DialogController::is_displayed)
            })
            .cloned()
    }

    /// Dock click: opens a closed or minimized window, minimizes the topmost one, and raises
    /// any other.
    pub fn toggle_from_dock(&mut self, id: &str) -> bool {
        match self.window_state(id) {
            None => {
                logging::warn!("{}", DesktopError::UnknownWindowId(id.to_string()));
                false
            }
            Some(WindowState::Closed | WindowState::Minimized) => self.open(id),
            Some(_) if self.get_top_window().as_deref() == Some(id) => self.minimize(id),
            Some(_) => self.bring_to_front(id),
        }
    }

    // Pointer interactions

    pub fn begin_drag(&mut self, id: &str, pointer: PointerPosition) -> bool {
        self.cancel_interaction();
        let result = self.with_dialog(id, |dialog, env| dialog.begin_drag(pointer, env));
        let started = self.finish(id, result);
        if started {
            self.interaction = Some(ActiveInteraction {
                window_id: id.to_string(),
                frame: None,
            });
        }
        started
    }

    pub fn begin_resize(&mut self, id: &str, edge: ResizeEdge, pointer: PointerPosition) -> bool {
        self.cancel_interaction();
        let result = self.with_dialog(id, |dialog, env| dialog.begin_resize(edge, pointer, env));
        let started = self.finish(id, result);
        if started {
            self.interaction = Some(ActiveInteraction {
                window_id: id.to_string(),
                frame: None,
            });
        }
        started
    }

    /// Queues a pointer move for the live interaction; the geometry updates on the next frame.
    pub fn pointer_move(&mut self, pointer: PointerPosition) -> bool {
        let Some(window_id) = self.interaction_window().map(str::to_string) else {
            return false;
        };
        let Some(dialog) = self.registry.get_dialog_mut(&window_id) else {
            return false;
        };
        dialog.queue_pointer(pointer);
        let needs_frame = self
            .interaction
            .as_ref()
            .is_some_and(|interaction| interaction.frame.is_none());
        if needs_frame {
            let target = self.self_ref.clone();
            let handle = self.services.scheduler.request_frame(Box::new(move || {
                let Some(runtime) = target.upgrade() else {
                    return;
                };
                if let Ok(mut runtime) = runtime.try_borrow_mut() {
                    runtime.flush_interaction_frame();
                };
            }));
            if let Some(interaction) = self.interaction.as_mut() {
                interaction.frame = Some(handle);
            }
        }
        true
    }

    /// Applies the queued pointer move, if any. Normally called from the frame callback.
    pub fn flush_interaction_frame(&mut self) {
        let Some(interaction) = self.interaction.as_mut() else {
            return;
        };
        interaction.frame = None;
        let window_id = interaction.window_id.clone();
        let env = DialogEnv {
            stack: &mut self.stack,
            viewport: self.viewport,
            config: &self.config,
        };
        let effects = match self.registry.get_dialog_mut(&window_id) {
            Some(dialog) => dialog.apply_pending_frame(&env),
            None => return,
        };
        self.run_effects(&window_id, effects);
    }

    /// Pointer-up: flushes the final position and resolves the live interaction.
    pub fn end_pointer(&mut self, pointer: Option<PointerPosition>) -> bool {
        let Some(interaction) = self.take_interaction() else {
            return false;
        };
        let id = interaction.window_id;
        let result = self.with_dialog(&id, |dialog, env| Ok(dialog.end_interaction(pointer, env)));
        self.finish(&id, result)
    }

    /// Abandons the live interaction, keeping the current geometry without snapping.
    pub fn cancel_interaction(&mut self) -> bool {
        let Some(interaction) = self.take_interaction() else {
            return false;
        };
        let id = interaction.window_id;
        let result = self.with_dialog(&id, |dialog, env| Ok(dialog.cancel_interaction(env)));
        self.finish(&id, result)
    }

    pub fn interaction_window(&self) -> Option<&str> {
        self.interaction
            .as_ref()
            .map(|interaction| interaction.window_id.as_str())
    }

    /// Side the drag-to-snap preview currently shows, if any.
    pub fn snap_preview(&self) -> Option<SnapSide> {
        self.snap_preview
    }

    fn take_interaction(&mut self) -> Option<ActiveInteraction> {
        let interaction = self.interaction.take()?;
        if let Some(frame) = interaction.frame {
            self.services.scheduler.cancel(frame);
        }
        Some(interaction)
    }

    fn with_dialog(
        &mut self,
        id: &str,
        apply: impl FnOnce(&mut DialogController, &mut DialogEnv<'_>) -> Result<Vec<DialogEffect>, DesktopError>,
    ) -> Result<Vec<DialogEffect>, DesktopError> {
        let dialog = self
            .registry
            .get_dialog_mut(id)
            .ok_or_else(|| DesktopError::UnknownWindowId(id.to_string()))?;
        let mut env = DialogEnv {
            stack: &mut self.stack,
            viewport: self.viewport,
            config: &self.config,
        };
        apply(dialog, &mut env)
    }

    fn finish(&mut self, id: &str, result: Result<Vec<DialogEffect>, DesktopError>) -> bool {
        match result {
            Ok(effects) => {
                self.run_effects(id, effects);
                true
            }
            Err(err) => {
                logging::warn!("{err}");
                false
            }
        }
    }

    fn run_effects(&mut self, id: &str, effects: Vec<DialogEffect>) {
        for effect in effects {
            match effect {
                DialogEffect::PersistGeometry => self.persist_geometry(id),
                DialogEffect::PersistOpenWindows => self.persist_open_windows(),
                DialogEffect::SnapPreviewChanged(side) => self.snap_preview = side,
            }
        }
    }

    fn persist_geometry(&self, id: &str) {
        let Some(dialog) = self.registry.get_dialog(id) else {
            return;
        };
        if let Err(err) = persistence::save_modal_position(
            self.services.prefs.as_ref(),
            id,
            dialog.restorable_geometry(),
        ) {
            logging::warn!("{}", DesktopError::Storage(err));
        }
    }

    /// Open persistent windows in registration order.
    pub fn open_persistent_windows(&self) -> Vec<String> {
        self.registry
            .get_persistent_window_ids()
            .into_iter()
            .filter(|id| {
                self.registry
                    .get_dialog(id)
                    .is_some_and(DialogController::is_visible)
            })
            .collect()
    }

    fn persist_open_windows(&self) {
        let open = self.open_persistent_windows();
        if let Err(err) = persistence::save_open_modals(self.services.prefs.as_ref(), &open) {
            logging::warn!("{}", DesktopError::Storage(err));
        }
    }

    // Instances

    pub fn terminals(&self) -> &InstanceManager<TerminalInstance> {
        &self.terminals
    }

    pub fn terminals_mut(&mut self) -> &mut InstanceManager<TerminalInstance> {
        &mut self.terminals
    }

    pub fn editors(&self) -> &InstanceManager<TextEditorInstance> {
        &self.editors
    }

    pub fn editors_mut(&mut self) -> &mut InstanceManager<TextEditorInstance> {
        &mut self.editors
    }

    pub fn finders(&self) -> &InstanceManager<FinderInstance> {
        &self.finders
    }

    pub fn finders_mut(&mut self) -> &mut InstanceManager<FinderInstance> {
        &mut self.finders
    }

    /// Navigates a file-browser instance. The active instance's location is saved as
    /// `finderState`.
    pub fn finder_navigate(&mut self, instance_id: &str, repo: &str, path: &str) -> bool {
        let Some(finder) = self.finders.get_mut(instance_id) else {
            logging::warn!(
                "{}",
                DesktopError::UnknownInstance {
                    kind: FINDER_KIND.to_string(),
                    instance_id: instance_id.to_string(),
                }
            );
            return false;
        };
        if !finder.navigate(repo, path) {
            return true;
        }
        let location = finder.location().clone();
        if self.finders.active_instance_id() == Some(instance_id) {
            if let Err(err) =
                persistence::save_finder_state(self.services.prefs.as_ref(), &location)
            {
                logging::warn!("{}", DesktopError::Storage(err));
            }
        }
        true
    }

    // Session

    /// Saves the session: debounced by default, or at once with `immediate`.
    pub fn save_session(&mut self, immediate: bool) -> bool {
        if immediate {
            self.session.cancel_pending();
            self.save_now()
        } else {
            self.session.schedule_save();
            true
        }
    }

    fn capture_session(&self) -> SessionSnapshot {
        let participants: [&dyn SessionParticipant; 3] =
            [&self.terminals, &self.editors, &self.finders];
        SessionSnapshot::capture(
            &participants,
            &self.stack,
            self.services.scheduler.now_ms(),
        )
    }

    fn save_now(&mut self) -> bool {
        let snapshot = self.capture_session();
        match self.session.persist(&snapshot) {
            Ok(SaveOutcome::Written { .. }) => true,
            Ok(SaveOutcome::SkippedOverQuota) => false,
            Err(err) => {
                logging::warn!("session save skipped: {err}");
                false
            }
        }
    }

    /// Restores the stored session. A missing, version-mismatched, or malformed snapshot leaves
    /// the live state untouched and returns `false`.
    pub fn restore_session(&mut self) -> bool {
        let snapshot = match self.session.load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return false,
            Err(err) => {
                logging::warn!("session restore aborted: {err}");
                return false;
            }
        };
        let registry = &self.registry;
        let mut participants: [&mut dyn SessionParticipant; 3] =
            [&mut self.terminals, &mut self.editors, &mut self.finders];
        let applied = self.session.apply(
            &snapshot,
            &mut participants,
            &mut self.stack,
            |id| {
                registry.get_dialog(id).is_some_and(|dialog| {
                    dialog.surface_mounted() && dialog.is_visible()
                })
            },
        );
        let report = match applied {
            Ok(report) => report,
            Err(err) => {
                logging::warn!("session restore aborted: {err}");
                return false;
            }
        };
        logging::log!(
            "restored {} instances from session saved at {}",
            report.restored_instances,
            snapshot.timestamp
        );
        true
    }

    /// Saves immediately and returns the current snapshot as JSON.
    pub fn export_session(&mut self) -> Option<String> {
        self.session.cancel_pending();
        self.save_now();
        let snapshot = self.capture_session();
        match serde_json::to_string(&snapshot) {
            Ok(raw) => Some(raw),
            Err(err) => {
                logging::warn!("session export failed: {err}");
                None
            }
        }
    }

    /// Validates `payload`, stores it as the session, and restores from it.
    pub fn import_session(&mut self, payload: &str) -> bool {
        let snapshot = match SessionSnapshot::parse(payload) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                logging::warn!("session import rejected: {err}");
                return false;
            }
        };
        self.session.cancel_pending();
        match self.session.persist(&snapshot) {
            Ok(SaveOutcome::Written { .. }) => {}
            Ok(SaveOutcome::SkippedOverQuota) => {
                logging::warn!("session import not stored: over storage budget");
                return false;
            }
            Err(err) => {
                logging::warn!("session import not stored: {err}");
                return false;
            }
        }
        self.restore_session()
    }

    pub fn session_stats(&self) -> SessionStats {
        self.session.stats()
    }

    /// Boot restore: saved positions, then previously open windows, then the session.
    ///
    /// Returns how many windows were reopened. Unknown or unmounted windows are skipped.
    pub fn restore_layout(&mut self) -> usize {
        if !self.config.restore_on_boot {
            return 0;
        }
        let prefs = self.services.prefs();

        match persistence::load_modal_positions(prefs.as_ref()) {
            Ok(positions) => {
                for (id, geometry) in positions {
                    if let Some(dialog) = self.registry.get_dialog_mut(&id) {
                        dialog.apply_saved_geometry(geometry, self.config.menu_bar_height);
                    }
                }
            }
            Err(err) => logging::warn!("saved window positions ignored: {err}"),
        }

        let open_ids = persistence::load_open_modals(prefs.as_ref()).unwrap_or_else(|err| {
            logging::warn!("saved open windows ignored: {err}");
            Vec::new()
        });
        let mut reopened = 0;
        for id in open_ids {
            if reopened >= self.config.max_restore_windows {
                break;
            }
            let Some(config) = self.registry.get_config(&id) else {
                logging::warn!("{}", DesktopError::UnknownWindowId(id));
                continue;
            };
            if !config.is_persistent() {
                continue;
            }
            if !self
                .registry
                .get_dialog(&id)
                .is_some_and(DialogController::surface_mounted)
            {
                logging::warn!("{}", DesktopError::MissingSurface(id));
                continue;
            }
            if self.open(&id) {
                reopened += 1;
            }
        }

        self.restore_session();
        reopened
    }

    /// Immediate save on blur, teardown, or hidden; blur also cancels live pointer work.
    pub fn handle_page_event(&mut self, event: PageEvent) -> bool {
        if event == PageEvent::Blur {
            self.cancel_interaction();
        }
        self.save_session(true)
    }
}

fn instance_manager<I: WindowInstance>(
    services: &DesktopServices,
    debouncer: &Debouncer,
    kind: &str,
    factory: impl Fn(InstanceCore) -> I + 'static,
) -> InstanceManager<I> {
    let (window_id, title_prefix, max_instances) = match apps::instance_kind(kind) {
        Some(descriptor) => (
            descriptor.window_id,
            descriptor.title_prefix,
            descriptor.max_instances,
        ),
        None => (kind, kind, 0),
    };
    InstanceManager::new(kind, window_id, factory)
        .with_title_prefix(title_prefix)
        .with_max_instances(max_instances)
        .with_save_trigger(debouncer.clone())
        .with_prefs(services.prefs())
}
