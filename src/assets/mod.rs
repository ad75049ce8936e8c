//! Asset loading: sources, the loader contract and the background dispatcher.

#[cfg(feature = "gltf")]
pub mod gltf;
pub mod hdr;
pub mod io;
pub mod loader;

pub use io::AssetSource;
pub use loader::{AssetLoader, AssetSources, DefaultAssetLoader, LoadEvent, SlotState, dispatch_loads};
