//! Asset root: maps request paths onto files of the built client.
//!
//! DESIGN
//! ======
//! `resolve` is pure path arithmetic; it never touches the filesystem. The
//! router probes the candidate with `lookup` and either streams it or falls
//! back to the entry document, so client-side routes typed straight into the
//! address bar still load the application shell.
//!
//! ERROR HANDLING
//! ==============
//! "Not found" (including directories and `ENOTDIR`) means fallback. Any
//! other I/O failure is a real fault and is reported as such, never masked
//! by the fallback.

#[cfg(test)]
#[path = "assets_test.rs"]
mod tests;

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use percent_encoding::percent_decode_str;

/// Startup failures for the asset root. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset root {path} is unavailable: {source}")]
    RootUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("asset root {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("entry document {0} is missing or not a regular file")]
    EntryMissing(PathBuf),
}

/// Result of probing a resolved candidate on disk.
#[derive(Debug)]
pub enum Lookup {
    /// A regular file exists at the candidate path.
    Found,
    /// Nothing servable there; use the entry document.
    Missing,
    /// The filesystem refused to answer.
    Failed(io::Error),
}

/// Validated asset directory plus its entry document.
///
/// Cheap to clone; shared by every request handler.
#[derive(Debug, Clone)]
pub struct AssetRoot {
    inner: Arc<AssetRootInner>,
}

#[derive(Debug)]
struct AssetRootInner {
    root: PathBuf,
    entry: PathBuf,
}

impl AssetRoot {
    /// Validate `dir` and bind it as the asset root.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError`] if the directory is missing, is not a directory,
    /// cannot be listed, or holds no entry document.
    pub fn open(dir: impl Into<PathBuf>, entry_document: impl AsRef<Path>) -> Result<Self, AssetError> {
        let root = dir.into();
        let meta = std::fs::metadata(&root).map_err(|source| AssetError::RootUnavailable {
            path: root.clone(),
            source,
        })?;
        if !meta.is_dir() {
            return Err(AssetError::NotADirectory(root));
        }
        std::fs::read_dir(&root).map_err(|source| AssetError::RootUnavailable {
            path: root.clone(),
            source,
        })?;

        let entry = root.join(entry_document);
        if !entry.is_file() {
            return Err(AssetError::EntryMissing(entry));
        }

        Ok(Self { inner: Arc::new(AssetRootInner { root, entry }) })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    #[must_use]
    pub fn entry_path(&self) -> &Path {
        &self.inner.entry
    }

    /// Compute the candidate file for a URL path.
    ///
    /// `/`, directory-style paths and anything that could escape the root
    /// resolve to the entry document.
    #[must_use]
    pub fn resolve(&self, request_path: &str) -> PathBuf {
        match relative_asset_path(request_path) {
            Some(rel) => self.inner.root.join(rel),
            None => self.inner.entry.clone(),
        }
    }
}

/// Open `path` and classify the answer.
///
/// Opening (not just `stat`) surfaces permission faults here instead of
/// letting them turn into a 404 further down.
pub async fn lookup(path: &Path) -> Lookup {
    let probe = match tokio::fs::File::open(path).await {
        Ok(file) => file.metadata().await.map(|meta| meta.is_file()),
        Err(e) => Err(e),
    };
    classify(probe)
}

/// Map a probe (`Ok(is_file)`) onto a [`Lookup`].
pub(crate) fn classify(probe: io::Result<bool>) -> Lookup {
    match probe {
        Ok(true) => Lookup::Found,
        Ok(false) => Lookup::Missing,
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => Lookup::Missing,
        Err(e) => Lookup::Failed(e),
    }
}

fn relative_asset_path(request_path: &str) -> Option<PathBuf> {
    // Malformed escapes pass through untouched; the result must be UTF-8.
    let decoded = percent_decode_str(request_path).decode_utf8().ok()?;
    if decoded.ends_with('/') {
        return None;
    }

    let mut rel = PathBuf::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            s if s.contains(['\\', '\0']) => return None,
            s => rel.push(s),
        }
    }

    // Catches drive prefixes and anything else the platform treats specially.
    let contained = rel.components().all(|c| matches!(c, Component::Normal(_)));
    if rel.as_os_str().is_empty() || !contained {
        return None;
    }
    Some(rel)
}
