//! Vitrine: a single-asset 3D showcase viewer.
//!
//! A glTF model is loaded in the background, its materials normalized to a
//! polished metal, and it is drawn under an equirectangular HDR environment.
//! Pointer or touch position sets a target orientation which the model eases
//! toward once per frame.
//!
//! ```rust,ignore
//! fn main() -> vitrine::errors::Result<()> {
//!     vitrine::App::new().with_title("Toucan").run()
//! }
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod app;
pub mod assets;
pub mod controls;
pub mod errors;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod settings;

pub use app::{EventSource, Host, InputEvent, LifecycleManager, LoopState, RenderLoop};
pub use assets::{AssetLoader, AssetSource, AssetSources, DefaultAssetLoader, LoadEvent, SlotState};
pub use controls::{InputPolicy, Orientation, OrientationController};
pub use errors::{ConfigurationError, Error, LoadError, Result};
pub use renderer::{RenderBackend, RenderSettings, Viewport, ViewportConfig, WgpuBackend};
pub use resources::{Geometry, MaterialOverride, Mesh, PbrMaterial, Primitive};
pub use scene::{Camera, EnvironmentTexture, Node, NodeHandle, NodeKind, SceneGraph};
pub use settings::ViewerSettings;

#[cfg(feature = "winit")]
pub use app::winit::App;
