use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::LoadError;

/// Where an asset's bytes come from.
///
/// In-memory sources serve bundled assets and tests.
#[derive(Clone, PartialEq, Eq)]
pub enum AssetSource {
    Path(PathBuf),
    Memory { name: String, bytes: Arc<[u8]> },
}

impl AssetSource {
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Memory {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Human-readable locator used in logs and errors.
    #[must_use]
    pub fn uri(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Memory { name, .. } => format!("memory://{name}"),
        }
    }

    /// Directory that relative references inside the asset resolve against.
    #[must_use]
    pub fn base_dir(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path.parent().unwrap_or_else(|| Path::new("."))),
            Self::Memory { .. } => None,
        }
    }

    /// Lower-cased file extension, if the locator has one.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        let name: &Path = match self {
            Self::Path(path) => path,
            Self::Memory { name, .. } => Path::new(name),
        };
        name.extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }

    /// Reads the full asset. Only filesystem sources suspend.
    pub async fn read_bytes(&self) -> Result<Arc<[u8]>, LoadError> {
        match self {
            Self::Path(path) => tokio::fs::read(path)
                .await
                .map(Arc::from)
                .map_err(|e| LoadError::Io {
                    uri: self.uri(),
                    reason: e.to_string(),
                }),
            Self::Memory { bytes, .. } => Ok(Arc::clone(bytes)),
        }
    }
}

impl fmt::Debug for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Memory { name, bytes } => f
                .debug_struct("Memory")
                .field("name", name)
                .field("len", &bytes.len())
                .finish(),
        }
    }
}

impl From<PathBuf> for AssetSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for AssetSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&str> for AssetSource {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(AssetSource::from("model/Toucan.GLB").extension().as_deref(), Some("glb"));
        assert_eq!(AssetSource::from_bytes("env.hdr", vec![0u8]).extension().as_deref(), Some("hdr"));
    }

    #[test]
    fn memory_uri_is_tagged() {
        assert_eq!(AssetSource::from_bytes("a.glb", Vec::<u8>::new()).uri(), "memory://a.glb");
    }
}
