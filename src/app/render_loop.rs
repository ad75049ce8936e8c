//! The single driving component of the viewer.
//!
//! ```text
//!   Idle ──attach──▶ Running ──detach──▶ Stopped
//!     └──────────────detach──────────────▲
//! ```
//!
//! Each tick, in order: apply finished loads, apply the latest resize, ease
//! the model toward the target orientation, draw one frame. While running the
//! loop requests exactly one frame callback after each tick; once stopped it
//! does no work and schedules nothing.

use std::sync::Arc;

use glam::{Vec2, Vec3};

use crate::app::host::{EventSource, Host};
use crate::app::input::InputEvent;
use crate::app::lifecycle::LifecycleManager;
use crate::assets::{AssetLoader, AssetSources, LoadEvent, SlotState, dispatch_loads};
use crate::controls::{InputPolicy, Orientation, OrientationController, normalize_pointer};
use crate::errors::{ConfigurationError, Error, Result};
use crate::renderer::{RenderBackend, Viewport};
use crate::resources::MaterialOverride;
use crate::scene::{EnvironmentMapping, NodeHandle, SceneGraph};
use crate::settings::ViewerSettings;

/// Name of the group node a loaded asset is adopted under.
pub const MODEL_NODE_NAME: &str = "model";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Constructed, not attached.
    Idle,
    /// Attached and ticking every display refresh.
    Running,
    /// Detached; resources released. Terminal.
    Stopped,
}

pub struct RenderLoop<B: RenderBackend> {
    state: LoopState,

    controller: OrientationController,
    current: Orientation,

    scene: SceneGraph,
    model: Option<NodeHandle>,
    viewport: Viewport<B>,
    lifecycle: LifecycleManager,

    pending_resize: Option<(u32, u32)>,
    load_tx: Option<flume::Sender<LoadEvent>>,
    load_rx: Option<flume::Receiver<LoadEvent>>,
    scene_slot: SlotState,
    environment_slot: SlotState,

    material: MaterialOverride,
    model_scale: f32,
    environment_mapping: Option<EnvironmentMapping>,

    frame_count: u64,
}

impl<B: RenderBackend> RenderLoop<B> {
    #[must_use]
    pub fn new(viewport: Viewport<B>, controller: OrientationController) -> Self {
        let (load_tx, load_rx) = flume::unbounded();
        Self {
            state: LoopState::Idle,
            controller,
            current: Orientation::ZERO,
            scene: SceneGraph::new(),
            model: None,
            viewport,
            lifecycle: LifecycleManager::new(),
            pending_resize: None,
            load_tx: Some(load_tx),
            load_rx: Some(load_rx),
            scene_slot: SlotState::Pending,
            environment_slot: SlotState::Pending,
            material: MaterialOverride::default(),
            model_scale: 1.0,
            environment_mapping: None,
            frame_count: 0,
        }
    }

    /// Builds a loop from settings around `backend`.
    pub fn from_settings(
        backend: B,
        settings: &ViewerSettings,
    ) -> std::result::Result<Self, ConfigurationError> {
        settings.validate()?;
        let viewport = Viewport::new(backend, settings.camera.build());
        let controller = settings.controls.build()?;
        Ok(Self::new(viewport, controller)
            .with_material(settings.material)
            .with_model_scale(settings.model_scale)
            .with_environment_mapping(settings.assets.environment_mapping))
    }

    #[must_use]
    pub fn with_material(mut self, material: MaterialOverride) -> Self {
        self.material = material;
        self
    }

    #[must_use]
    pub fn with_model_scale(mut self, scale: f32) -> Self {
        self.model_scale = scale;
        self
    }

    /// Overrides the mapping of every loaded environment texture.
    #[must_use]
    pub fn with_environment_mapping(mut self, mapping: EnvironmentMapping) -> Self {
        self.environment_mapping = Some(mapping);
        self
    }

    /// Starts easing from `orientation` instead of facing forward.
    #[must_use]
    pub fn with_initial_orientation(mut self, orientation: Orientation) -> Self {
        self.current = orientation;
        self
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// `Idle -> Running`: mounts the surface, registers listeners, configures
    /// the viewport to the host size and schedules the first tick.
    pub fn attach<H: Host>(&mut self, host: &mut H) -> Result<()> {
        match self.state {
            LoopState::Running => {
                log::warn!("Render loop already attached");
                return Ok(());
            }
            LoopState::Stopped => return Err(Error::ResourceAlreadyReleased("render loop")),
            LoopState::Idle => {}
        }

        let mut sources = vec![
            EventSource::Resize,
            EventSource::PointerMove,
            EventSource::TouchMove,
            EventSource::FrameScheduler,
        ];
        if self.controller.policy() == InputPolicy::Scroll {
            sources.push(EventSource::Wheel);
        }
        self.lifecycle.attach(host, &sources);

        let (width, height) = host.size();
        if let Err(e) = self.viewport.configure(width, height) {
            log::warn!("{e}; waiting for the first valid resize");
        }

        self.state = LoopState::Running;
        self.lifecycle.reschedule(host);
        log::info!("Render loop attached ({width}x{height})");
        Ok(())
    }

    /// Kicks off both asset loads in the background.
    pub fn begin_loading<L: AssetLoader>(&mut self, loader: Arc<L>, sources: AssetSources) {
        let Some(sender) = self.load_tx.clone() else {
            log::warn!("Render loop stopped; not loading {:?}", sources.scene);
            return;
        };
        dispatch_loads(loader, sources, sender);
    }

    /// Sender for load outcomes; `None` once stopped.
    #[must_use]
    pub fn load_sender(&self) -> Option<flume::Sender<LoadEvent>> {
        self.load_tx.clone()
    }

    /// `-> Stopped`: listeners removed, surface unmounted, then GPU resources
    /// released. Later load outcomes are dropped. Returns `false` if already
    /// stopped.
    pub fn detach<H: Host>(&mut self, host: &mut H) -> bool {
        if self.state == LoopState::Stopped {
            return false;
        }

        self.lifecycle.teardown(host);
        self.viewport.release();
        self.load_tx = None;
        self.load_rx = None;
        self.pending_resize = None;
        self.state = LoopState::Stopped;

        log::info!("Render loop stopped after {} frames", self.frame_count);
        true
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Routes an input event; dropped silently when not running.
    pub fn handle_event(&mut self, event: InputEvent) {
        if let Err(e) = self.try_handle_event(event) {
            log::trace!("Input event ignored: {e}");
        }
    }

    pub fn try_handle_event(&mut self, event: InputEvent) -> Result<()> {
        if self.state != LoopState::Running {
            return Err(Error::ResourceAlreadyReleased("input event"));
        }
        if !self.lifecycle.is_listening(event.source()) {
            log::trace!("No listener for {:?}", event.source());
            return Ok(());
        }

        match event {
            InputEvent::Resized { width, height } => {
                // coalesced: only the latest size is applied next tick
                self.pending_resize = Some((width, height));
            }
            InputEvent::PointerMoved {
                x,
                y,
                width,
                height,
            } => {
                if let Some(p) = normalize_pointer(x, y, width, height) {
                    self.controller.on_pointer_move(p.x, p.y);
                }
            }
            InputEvent::TouchMoved {
                contacts,
                width,
                height,
            } => {
                let normalized: Option<Vec<Vec2>> = contacts
                    .iter()
                    .map(|c| normalize_pointer(c.x, c.y, width, height))
                    .collect();
                if let Some(normalized) = normalized
                    && !self.controller.on_touch_move(&normalized)
                {
                    log::trace!("Ignoring touch move with {} contacts", normalized.len());
                }
            }
            InputEvent::Scrolled { delta } => self.controller.on_scroll(delta),
        }
        Ok(())
    }

    /// Frame callback from the host. Ticks only when it consumes the pending
    /// frame request, then schedules the next one.
    pub fn on_frame<H: Host>(&mut self, host: &mut H) {
        if self.state != LoopState::Running {
            log::trace!("Frame callback while {:?}; ignored", self.state);
            return;
        }
        if self.lifecycle.take_frame().is_none() {
            log::trace!("Frame callback without a pending request; ignored");
            return;
        }
        if let Err(e) = self.try_tick() {
            log::trace!("Tick skipped: {e}");
        }
        self.lifecycle.reschedule(host);
    }

    /// Runs one tick without touching the frame schedule.
    pub fn try_tick(&mut self) -> Result<()> {
        if self.state != LoopState::Running {
            return Err(Error::ResourceAlreadyReleased("tick"));
        }

        self.drain_loads();

        if let Some((width, height)) = self.pending_resize.take()
            && let Err(e) = self.viewport.configure(width, height)
        {
            log::warn!("{e}; keeping the previous viewport configuration");
        }

        if let Some(handle) = self.model {
            match self.scene.get_node_mut(handle) {
                Some(node) => {
                    self.current = self.controller.step(self.current);
                    node.transform
                        .set_rotation_euler(self.current.pitch, self.current.yaw, 0.0);
                }
                None => {
                    log::warn!("Model node vanished from the scene");
                    self.model = None;
                }
            }
        }

        self.scene.update_world_matrices();
        self.viewport.draw_frame(&mut self.scene);
        self.frame_count += 1;
        Ok(())
    }

    // ========================================================================
    // Loading
    // ========================================================================

    fn drain_loads(&mut self) {
        let Some(rx) = self.load_rx.as_ref() else {
            return;
        };
        let events: Vec<LoadEvent> = rx.try_iter().collect();
        for event in events {
            self.apply_load(event);
        }
    }

    fn apply_load(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::Scene(result) => {
                if self.scene_slot.is_settled() {
                    log::warn!("Discarding second scene load outcome");
                    return;
                }
                match result {
                    Ok(mut graph) => {
                        let rewritten = graph.normalize_materials(&self.material);
                        let handle = self.scene.adopt(graph, MODEL_NODE_NAME);
                        if let Some(node) = self.scene.get_node_mut(handle) {
                            node.transform.scale = Vec3::splat(self.model_scale);
                        }
                        self.model = Some(handle);
                        self.scene_slot = SlotState::Ready;
                        log::info!(
                            "Scene ready: {} nodes, {rewritten} materials normalized",
                            self.scene.node_count()
                        );
                    }
                    Err(e) => {
                        log::error!("{e}");
                        self.scene_slot = SlotState::Failed;
                    }
                }
            }
            LoadEvent::Environment(result) => {
                if self.environment_slot.is_settled() {
                    log::warn!("Discarding second environment load outcome");
                    return;
                }
                match result {
                    Ok(mut texture) => {
                        if let Some(mapping) = self.environment_mapping {
                            texture = texture.with_mapping(mapping);
                        }
                        let (label, width, height) =
                            (texture.label.clone(), texture.width(), texture.height());
                        match self.viewport.bind_environment(Arc::new(texture)) {
                            Ok(()) => {
                                log::info!("Environment ready: '{label}' {width}x{height}");
                                self.environment_slot = SlotState::Ready;
                            }
                            Err(e) => {
                                log::error!("{e}");
                                self.environment_slot = SlotState::Failed;
                            }
                        }
                    }
                    Err(e) => {
                        log::error!("{e}");
                        self.environment_slot = SlotState::Failed;
                    }
                }
            }
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn state(&self) -> LoopState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn current_orientation(&self) -> Orientation {
        self.current
    }

    #[inline]
    #[must_use]
    pub fn target_orientation(&self) -> Orientation {
        self.controller.target()
    }

    #[inline]
    #[must_use]
    pub fn controller(&self) -> &OrientationController {
        &self.controller
    }

    #[inline]
    #[must_use]
    pub fn model(&self) -> Option<NodeHandle> {
        self.model
    }

    #[inline]
    #[must_use]
    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    #[inline]
    #[must_use]
    pub fn viewport(&self) -> &Viewport<B> {
        &self.viewport
    }

    #[inline]
    #[must_use]
    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    #[inline]
    #[must_use]
    pub fn scene_slot(&self) -> SlotState {
        self.scene_slot
    }

    #[inline]
    #[must_use]
    pub fn environment_slot(&self) -> SlotState {
        self.environment_slot
    }

    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
