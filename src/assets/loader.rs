use std::future::Future;
use std::sync::{Arc, OnceLock};

use tokio::runtime::Runtime;

use crate::assets::io::AssetSource;
use crate::errors::LoadError;
use crate::scene::{EnvironmentTexture, SceneGraph};

/// Background runtime shared by every asset load.
fn asset_runtime() -> Result<&'static Runtime, &'static std::io::Error> {
    static RUNTIME: OnceLock<std::io::Result<Runtime>> = OnceLock::new();
    RUNTIME
        .get_or_init(|| {
            tokio::runtime::Builder::new_multi_thread()
                .thread_name("vitrine-assets")
                .build()
        })
        .as_ref()
}

/// Produces the two resources the viewer needs. Each call resolves once.
pub trait AssetLoader: Send + Sync + 'static {
    fn load_scene(
        &self,
        source: &AssetSource,
    ) -> impl Future<Output = Result<SceneGraph, LoadError>> + Send;

    fn load_environment(
        &self,
        source: &AssetSource,
    ) -> impl Future<Output = Result<EnvironmentTexture, LoadError>> + Send;
}

/// glTF scenes and HDR/EXR environments from files or memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAssetLoader;

impl DefaultAssetLoader {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Runs `job` on the blocking pool; a panicked or cancelled job becomes `Aborted`.
async fn run_blocking<T, F>(uri: &str, job: F) -> Result<T, LoadError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, LoadError> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| LoadError::Aborted {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?
}

impl AssetLoader for DefaultAssetLoader {
    #[cfg(feature = "gltf")]
    async fn load_scene(&self, source: &AssetSource) -> Result<SceneGraph, LoadError> {
        let uri = source.uri();
        let bytes = source.read_bytes().await?;
        let base_dir = source.base_dir().map(std::path::Path::to_path_buf);

        let job_uri = uri.clone();
        run_blocking(&uri, move || {
            crate::assets::gltf::import_scene(&job_uri, &bytes, base_dir.as_deref())
        })
        .await
    }

    #[cfg(not(feature = "gltf"))]
    async fn load_scene(&self, source: &AssetSource) -> Result<SceneGraph, LoadError> {
        Err(LoadError::Unsupported {
            uri: source.uri(),
            reason: "glTF support is disabled (enable the `gltf` feature)".to_string(),
        })
    }

    async fn load_environment(&self, source: &AssetSource) -> Result<EnvironmentTexture, LoadError> {
        let uri = source.uri();
        let extension = source.extension();
        let bytes = source.read_bytes().await?;

        let job_uri = uri.clone();
        run_blocking(&uri, move || {
            crate::assets::hdr::decode_environment(&job_uri, &bytes, extension.as_deref())
        })
        .await
    }
}

/// Outcome of one background load, delivered to the render loop.
#[derive(Debug)]
pub enum LoadEvent {
    Scene(Result<SceneGraph, LoadError>),
    Environment(Result<EnvironmentTexture, LoadError>),
}

/// Progress of one visual slot. Leaves `Pending` at most once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SlotState {
    #[default]
    Pending,
    Ready,
    Failed,
}

impl SlotState {
    #[inline]
    #[must_use]
    pub fn is_settled(self) -> bool {
        self != Self::Pending
    }
}

/// The two locators supplied at startup.
#[derive(Debug, Clone)]
pub struct AssetSources {
    pub scene: AssetSource,
    pub environment: AssetSource,
}

/// Starts both loads in the background; each outcome is sent on `sender`.
///
/// The loads are independent and may finish in any order. If the receiver is
/// gone by the time a load finishes, the outcome is dropped.
pub fn dispatch_loads<L: AssetLoader>(
    loader: Arc<L>,
    sources: AssetSources,
    sender: flume::Sender<LoadEvent>,
) {
    let AssetSources { scene, environment } = sources;

    let runtime = match asset_runtime() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Asset runtime unavailable: {e}");
            let abort = |source: &AssetSource| LoadError::Aborted {
                uri: source.uri(),
                reason: format!("asset runtime unavailable: {e}"),
            };
            let _ = sender.send(LoadEvent::Scene(Err(abort(&scene))));
            let _ = sender.send(LoadEvent::Environment(Err(abort(&environment))));
            return;
        }
    };

    {
        let loader = Arc::clone(&loader);
        let sender = sender.clone();
        runtime.spawn(async move {
            log::info!("Loading scene '{}'", scene.uri());
            let result = loader.load_scene(&scene).await;
            if sender.send(LoadEvent::Scene(result)).is_err() {
                log::debug!("Scene '{}' finished after the viewer stopped; discarded", scene.uri());
            }
        });
    }

    runtime.spawn(async move {
        log::info!("Loading environment '{}'", environment.uri());
        let result = loader.load_environment(&environment).await;
        if sender.send(LoadEvent::Environment(result)).is_err() {
            log::debug!(
                "Environment '{}' finished after the viewer stopped; discarded",
                environment.uri()
            );
        }
    });
}
