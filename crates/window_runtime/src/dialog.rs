//! Per-window state machine: open/close/minimize/maximize/snap plus drag and resize sessions.
//!
//! Stable states are derived from [`WindowRuntimeState`]. Dragging and resizing exist only
//! between a pointer-down and the matching pointer-up or cancel, and always resolve back into a
//! stable state. Live pointer moves are queued and applied at most once per frame by the owner
//! calling [`DialogController::apply_pending_frame`].

use crate::{
    config::DesktopConfig,
    error::DesktopError,
    model::{
        PointerPosition, ResizeEdge, SnapSide, SnapState, Viewport, WindowGeometry,
        WindowRuntimeState, WindowState,
    },
    window_manager::{
        clamp_below_menu_bar, constrained_resize, maximized_geometry, snap_candidate,
        snapped_geometry, unsnap_under_pointer,
    },
    z_order::ZOrderStack,
};

/// Shared collaborators a dialog transition needs.
pub struct DialogEnv<'a> {
    pub stack: &'a mut ZOrderStack,
    pub viewport: Viewport,
    pub config: &'a DesktopConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Follow-up work the owner performs after a transition.
pub enum DialogEffect {
    /// Persist this window's restorable geometry.
    PersistGeometry,
    /// Rewrite the list of open persistent windows.
    PersistOpenWindows,
    /// Show (`Some`) or hide (`None`) the drag-to-snap preview.
    SnapPreviewChanged(Option<SnapSide>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub pointer_start: PointerPosition,
    pub geometry_start: WindowGeometry,
    pub pending: Option<PointerPosition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeSession {
    pub edge: ResizeEdge,
    pub pointer_start: PointerPosition,
    pub geometry_start: WindowGeometry,
    pub pending: Option<PointerPosition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    Dragging(DragSession),
    Resizing(ResizeSession),
}

impl Interaction {
    fn queue(&mut self, pointer: PointerPosition) -> bool {
        let pending = match self {
            Self::Dragging(session) => &mut session.pending,
            Self::Resizing(session) => &mut session.pending,
        };
        pending.replace(pointer).is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DialogController {
    window_id: String,
    geometry: WindowGeometry,
    runtime: WindowRuntimeState,
    resizable: bool,
    surface_mounted: bool,
    interaction: Option<Interaction>,
    snap_preview: Option<SnapSide>,
}

impl DialogController {
    pub fn new(window_id: impl Into<String>, geometry: WindowGeometry, resizable: bool) -> Self {
        Self {
            window_id: window_id.into(),
            geometry,
            runtime: WindowRuntimeState::default(),
            resizable,
            surface_mounted: false,
            interaction: None,
            snap_preview: None,
        }
    }

    pub fn window_id(&self) -> &str {
        &self.window_id
    }

    pub fn geometry(&self) -> WindowGeometry {
        self.geometry
    }

    pub fn runtime_state(&self) -> &WindowRuntimeState {
        &self.runtime
    }

    pub fn state(&self) -> WindowState {
        self.runtime.state()
    }

    pub fn is_visible(&self) -> bool {
        self.runtime.visible
    }

    /// Visible and not minimized.
    pub fn is_displayed(&self) -> bool {
        self.runtime.visible && !self.runtime.minimized
    }

    pub fn interaction(&self) -> Option<&Interaction> {
        self.interaction.as_ref()
    }

    pub fn snap_preview(&self) -> Option<SnapSide> {
        self.snap_preview
    }

    pub fn surface_mounted(&self) -> bool {
        self.surface_mounted
    }

    pub fn set_surface_mounted(&mut self, mounted: bool) {
        self.surface_mounted = mounted;
    }

    /// Geometry to persist and to return to once maximize or snap is cleared.
    pub fn restorable_geometry(&self) -> WindowGeometry {
        if let Some(prior) = self.runtime.maximized {
            return prior;
        }
        if let Some(snap) = self.runtime.snapped {
            return snap.prior;
        }
        self.geometry
    }

    /// Applies a previously persisted geometry to a window that is not maximized or snapped.
    pub fn apply_saved_geometry(&mut self, geometry: WindowGeometry, menu_bar_height: i32) -> bool {
        if self.runtime.maximized.is_some() || self.runtime.snapped.is_some() {
            return false;
        }
        self.geometry = clamp_below_menu_bar(geometry, menu_bar_height);
        true
    }

    /// Recomputes maximized or snapped geometry after a viewport change.
    pub fn fit_to_viewport(&mut self, viewport: Viewport, config: &DesktopConfig) {
        let mode = self.geometry.position_mode;
        if self.runtime.maximized.is_some() {
            self.geometry = maximized_geometry(viewport, config, mode);
        } else if let Some(snap) = self.runtime.snapped {
            self.geometry = snapped_geometry(snap.side, viewport, config, mode);
        }
    }

    fn invalid(&self, operation: &'static str) -> DesktopError {
        DesktopError::InvalidTransition {
            window_id: self.window_id.clone(),
            operation,
            state: self.state(),
        }
    }

    /// Closed/Minimized -> displayed; always raises the window.
    pub fn open(&mut self, env: &mut DialogEnv<'_>) -> Vec<DialogEffect> {
        let was_visible = self.runtime.visible;
        self.runtime.visible = true;
        self.runtime.minimized = false;
        if self.runtime.maximized.is_none() && self.runtime.snapped.is_none() {
            self.geometry = clamp_below_menu_bar(self.geometry, env.config.menu_bar_height);
        }
        env.stack.bring_to_front(&self.window_id);

        if was_visible {
            Vec::new()
        } else {
            vec![DialogEffect::PersistOpenWindows]
        }
    }

    /// Any state -> Closed. Maximize/snap snapshots are folded back into the geometry so the
    /// window reopens at its normal size.
    pub fn close(&mut self, env: &mut DialogEnv<'_>) -> Vec<DialogEffect> {
        if !self.runtime.visible {
            return Vec::new();
        }
        let mut effects = self.drop_interaction();
        self.geometry = self.restorable_geometry();
        self.runtime = WindowRuntimeState::default();
        env.stack.remove_window(&self.window_id);
        effects.push(DialogEffect::PersistOpenWindows);
        effects
    }

    pub fn minimize(&mut self) -> Result<Vec<DialogEffect>, DesktopError> {
        match self.state() {
            WindowState::Open | WindowState::Maximized | WindowState::Snapped(_) => {
                let effects = self.drop_interaction();
                self.runtime.minimized = true;
                Ok(effects)
            }
            WindowState::Minimized => Ok(Vec::new()),
            WindowState::Closed => Err(self.invalid("minimize")),
        }
    }

    /// Open/Snapped <-> Maximized.
    pub fn toggle_maximize(
        &mut self,
        env: &mut DialogEnv<'_>,
    ) -> Result<Vec<DialogEffect>, DesktopError> {
        match self.state() {
            WindowState::Maximized => {
                if let Some(prior) = self.runtime.maximized.take() {
                    self.geometry = prior;
                }
            }
            WindowState::Open | WindowState::Snapped(_) => {
                if let Some(snap) = self.runtime.snapped.take() {
                    self.geometry = snap.prior;
                }
                self.runtime.maximized = Some(self.geometry);
                self.geometry =
                    maximized_geometry(env.viewport, env.config, self.geometry.position_mode);
            }
            WindowState::Minimized | WindowState::Closed => {
                return Err(self.invalid("toggle maximize"))
            }
        }
        let effects = self.drop_interaction();
        env.stack.bring_to_front(&self.window_id);
        Ok(effects)
    }

    /// Open/Maximized/Snapped -> Snapped(side). Repeated snaps keep the first prior geometry.
    pub fn snap_to(
        &mut self,
        side: SnapSide,
        env: &mut DialogEnv<'_>,
    ) -> Result<Vec<DialogEffect>, DesktopError> {
        let prior = match self.state() {
            WindowState::Snapped(current) if current == side => return Ok(Vec::new()),
            WindowState::Snapped(_) => self.restorable_geometry(),
            WindowState::Maximized => self.runtime.maximized.take().unwrap_or(self.geometry),
            WindowState::Open => self.geometry,
            WindowState::Minimized | WindowState::Closed => return Err(self.invalid("snap")),
        };
        self.runtime.maximized = None;
        self.runtime.snapped = Some(SnapState { side, prior });
        self.geometry = snapped_geometry(side, env.viewport, env.config, prior.position_mode);
        env.stack.bring_to_front(&self.window_id);
        Ok(Vec::new())
    }

    /// Snapped -> Open, restoring the pre-snap geometry exactly.
    pub fn unsnap(&mut self) -> Result<Vec<DialogEffect>, DesktopError> {
        let Some(snap) = self.runtime.snapped.take() else {
            return Err(self.invalid("unsnap"));
        };
        self.geometry = snap.prior;
        Ok(Vec::new())
    }

    /// Pointer-down on the header. A snapped window is silently unsnapped under the pointer.
    pub fn begin_drag(
        &mut self,
        pointer: PointerPosition,
        env: &mut DialogEnv<'_>,
    ) -> Result<Vec<DialogEffect>, DesktopError> {
        match self.state() {
            WindowState::Open => {}
            WindowState::Snapped(_) => {
                if let Some(snap) = self.runtime.snapped.take() {
                    self.geometry = unsnap_under_pointer(
                        self.geometry,
                        snap.prior,
                        pointer,
                        env.config.menu_bar_height,
                    );
                }
            }
            _ => return Err(self.invalid("drag")),
        }
        let effects = self.drop_interaction();
        env.stack.bring_to_front(&self.window_id);
        self.interaction = Some(Interaction::Dragging(DragSession {
            pointer_start: pointer,
            geometry_start: self.geometry,
            pending: None,
        }));
        Ok(effects)
    }

    /// Pointer-down on one of the eight resize handles.
    pub fn begin_resize(
        &mut self,
        edge: ResizeEdge,
        pointer: PointerPosition,
        env: &mut DialogEnv<'_>,
    ) -> Result<Vec<DialogEffect>, DesktopError> {
        if self.state() != WindowState::Open || !self.resizable {
            return Err(self.invalid("resize"));
        }
        let effects = self.drop_interaction();
        env.stack.bring_to_front(&self.window_id);
        self.interaction = Some(Interaction::Resizing(ResizeSession {
            edge,
            pointer_start: pointer,
            geometry_start: self.geometry,
            pending: None,
        }));
        Ok(effects)
    }

    /// Records the latest pointer position. Returns `true` when no frame was pending yet, so the
    /// caller should request one.
    pub fn queue_pointer(&mut self, pointer: PointerPosition) -> bool {
        self.interaction
            .as_mut()
            .is_some_and(|interaction| interaction.queue(pointer))
    }

    /// Applies the queued pointer position, if any.
    pub fn apply_pending_frame(&mut self, env: &DialogEnv<'_>) -> Vec<DialogEffect> {
        let mut effects = Vec::new();
        match self.interaction.as_mut() {
            Some(Interaction::Dragging(session)) => {
                let Some(pointer) = session.pending.take() else {
                    return effects;
                };
                let dx = pointer.x - session.pointer_start.x;
                let dy = pointer.y - session.pointer_start.y;
                self.geometry = clamp_below_menu_bar(
                    session.geometry_start.offset(dx, dy),
                    env.config.menu_bar_height,
                );
                let candidate = snap_candidate(self.geometry, pointer, env.viewport, env.config);
                if candidate != self.snap_preview {
                    self.snap_preview = candidate;
                    effects.push(DialogEffect::SnapPreviewChanged(candidate));
                }
            }
            Some(Interaction::Resizing(session)) => {
                let Some(pointer) = session.pending.take() else {
                    return effects;
                };
                let dx = pointer.x - session.pointer_start.x;
                let dy = pointer.y - session.pointer_start.y;
                self.geometry =
                    constrained_resize(session.geometry_start, session.edge, dx, dy, env.config);
            }
            None => {}
        }
        effects
    }

    /// Pointer-up: flushes the final position and resolves the interaction. A drag released
    /// over a snap candidate becomes `Snapped(side)`.
    pub fn end_interaction(
        &mut self,
        pointer: Option<PointerPosition>,
        env: &mut DialogEnv<'_>,
    ) -> Vec<DialogEffect> {
        if let Some(pointer) = pointer {
            self.queue_pointer(pointer);
        }
        let mut effects = self.apply_pending_frame(env);
        let target = self.snap_preview;
        let Some(interaction) = self.interaction.take() else {
            return effects;
        };
        if self.snap_preview.take().is_some() {
            effects.push(DialogEffect::SnapPreviewChanged(None));
        }
        if let (Interaction::Dragging(_), Some(side)) = (&interaction, target) {
            let prior = self.geometry;
            self.runtime.snapped = Some(SnapState { side, prior });
            self.geometry = snapped_geometry(side, env.viewport, env.config, prior.position_mode);
        }
        effects.push(DialogEffect::PersistGeometry);
        effects
    }

    /// Pointer-cancel or window blur: keeps the live geometry and discards any snap candidate.
    pub fn cancel_interaction(&mut self, env: &DialogEnv<'_>) -> Vec<DialogEffect> {
        if self.interaction.is_none() {
            return Vec::new();
        }
        let mut effects = self.apply_pending_frame(env);
        effects.extend(self.drop_interaction());
        effects.push(DialogEffect::PersistGeometry);
        effects
    }

    fn drop_interaction(&mut self) -> Vec<DialogEffect> {
        self.interaction = None;
        if self.snap_preview.take().is_some() {
            vec![DialogEffect::SnapPreviewChanged(None)]
        } else {
            Vec::new()
        }
    }
}
