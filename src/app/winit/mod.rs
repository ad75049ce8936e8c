//! Winit-based Application Framework
//!
//! - [`App`]: builder for configuring and launching the viewer window
//! - [`WinitHost`]: [`Host`] implementation over a winit window
//! - `AppRunner`: internal event loop handler
//!
//! # Example
//!
//! ```rust,ignore
//! use vitrine::app::winit::App;
//!
//! fn main() -> vitrine::errors::Result<()> {
//!     App::new().with_title("Toucan").run()
//! }
//! ```

use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
pub use winit::window::{Window, WindowId};

use crate::app::host::{EventSource, FrameRequest, Host, Subscription};
use crate::app::render_loop::{LoopState, RenderLoop};
use crate::assets::{AssetLoader, DefaultAssetLoader};
use crate::errors::{Error, Result};
use crate::renderer::{RenderSettings, WgpuBackend};
use crate::settings::ViewerSettings;

pub mod input_adapter;

use self::input_adapter::{TouchTracker, translate_window_event};

/// [`Host`] backed by a winit window.
///
/// Frame requests map onto `request_redraw`; winit cannot revoke a redraw, so
/// cancelled requests are filtered by the render loop instead.
pub struct WinitHost {
    window: Arc<Window>,
    next_id: u64,
}

impl WinitHost {
    #[must_use]
    pub fn new(window: Arc<Window>) -> Self {
        Self { window, next_id: 0 }
    }

    #[inline]
    #[must_use]
    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl Host for WinitHost {
    fn size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    fn subscribe(&mut self, source: EventSource) -> Subscription {
        Subscription {
            source,
            id: self.next_id(),
        }
    }

    fn unsubscribe(&mut self, subscription: Subscription) {
        log::trace!("Unsubscribed {:?} #{}", subscription.source, subscription.id);
    }

    fn request_frame(&mut self) -> FrameRequest {
        self.window.request_redraw();
        FrameRequest(self.next_id())
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        log::trace!("Cancelled frame #{}", request.0);
    }

    fn mount_surface(&mut self) {
        self.window.set_visible(true);
    }

    fn unmount_surface(&mut self) {
        self.window.set_visible(false);
    }
}

/// Application builder for configuring and launching the viewer.
///
/// ```rust,ignore
/// App::new()
///     .with_title("Showcase")
///     .with_render_settings(RenderSettings {
///         vsync: true,
///         ..Default::default()
///     })
///     .run()?;
/// ```
pub struct App {
    settings: ViewerSettings,
}

impl App {
    #[must_use]
    pub fn new() -> Self {
        Self {
            settings: ViewerSettings::default(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.settings.title = title.into();
        self
    }

    /// Replaces every setting, including the title.
    #[must_use]
    pub fn with_settings(mut self, settings: ViewerSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_render_settings(mut self, render: RenderSettings) -> Self {
        self.settings.render = render;
        self
    }

    /// Runs the viewer with [`DefaultAssetLoader`]. Blocks until the window closes.
    pub fn run(self) -> Result<()> {
        self.run_with_loader(Arc::new(DefaultAssetLoader::new()))
    }

    pub fn run_with_loader<L: AssetLoader>(self, loader: Arc<L>) -> Result<()> {
        self.settings.validate()?;

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut runner = AppRunner {
            settings: self.settings,
            loader,
            host: None,
            render_loop: None,
            touches: TouchTracker::new(),
        };
        event_loop.run_app(&mut runner).map_err(Error::from)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

struct AppRunner<L: AssetLoader> {
    settings: ViewerSettings,
    loader: Arc<L>,

    host: Option<WinitHost>,
    render_loop: Option<RenderLoop<WgpuBackend>>,
    touches: TouchTracker,
}

impl<L: AssetLoader> AppRunner<L> {
    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let [width, height] = self.settings.window_size;
        let attributes = Window::default_attributes()
            .with_title(self.settings.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(width, height))
            .with_transparent(true)
            .with_visible(false);

        let window = Arc::new(event_loop.create_window(attributes)?);

        log::info!("Initializing renderer backend...");
        let size = window.inner_size();
        let backend = pollster::block_on(WgpuBackend::new(
            window.clone(),
            self.settings.render,
            size.width,
            size.height,
        ))?;

        let mut host = WinitHost::new(window);
        let mut render_loop = RenderLoop::from_settings(backend, &self.settings)?;
        render_loop.attach(&mut host)?;
        render_loop.begin_loading(Arc::clone(&self.loader), self.settings.assets.sources());

        self.host = Some(host);
        self.render_loop = Some(render_loop);
        Ok(())
    }

    /// Detaches the loop if the window closed some other way.
    fn shutdown(&mut self) {
        if let (Some(host), Some(render_loop)) = (&mut self.host, &mut self.render_loop)
            && render_loop.state() != LoopState::Stopped
        {
            render_loop.detach(host);
        }
    }
}

impl<L: AssetLoader> ApplicationHandler for AppRunner<L> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.render_loop.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            log::error!("Fatal renderer error: {e}");
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let (Some(host), Some(render_loop)) = (&mut self.host, &mut self.render_loop) else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                render_loop.detach(host);
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => render_loop.on_frame(host),
            event => {
                let size = host.window().inner_size();
                if let Some(input) = translate_window_event(&mut self.touches, &event, size) {
                    render_loop.handle_event(input);
                }
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}
