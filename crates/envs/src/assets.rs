use crate::error::EnvError;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// External asset bundle (meshes, scene XML) environments are built from.
///
/// `ensure_present` is called before every environment construction and must
/// be cheap and idempotent after the first success.
pub trait AssetBundle: Send + Sync {
    fn ensure_present(&self) -> Result<(), EnvError>;
}

/// For scenes built entirely in code.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAssets;

impl AssetBundle for NoAssets {
    fn ensure_present(&self) -> Result<(), EnvError> {
        Ok(())
    }
}

/// Asset bundle checked out to a local directory.
pub struct DirectoryAssets {
    root: PathBuf,
    required: Vec<PathBuf>,
    verified: OnceLock<()>,
}

impl DirectoryAssets {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), required: Vec::new(), verified: OnceLock::new() }
    }

    /// Adds a path, relative to the root, that must exist.
    #[must_use]
    pub fn requiring(mut self, relative: impl AsRef<Path>) -> Self {
        self.required.push(relative.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetBundle for DirectoryAssets {
    fn ensure_present(&self) -> Result<(), EnvError> {
        if self.verified.get().is_some() {
            return Ok(());
        }
        if !self.root.is_dir() {
            return Err(EnvError::MissingAssets(self.root.clone()));
        }
        if let Some(missing) = self
            .required
            .iter()
            .map(|rel| self.root.join(rel))
            .find(|p| !p.exists())
        {
            return Err(EnvError::MissingAssets(missing));
        }
        tracing::debug!("asset bundle verified at {}", self.root.display());
        let _ = self.verified.set(());
        Ok(())
    }
}
