use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};

use crate::current_unix_timestamp_ms;

static NEXT_SCRATCH_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Request-scoped working directory for pipeline artifacts.
///
/// Every run owns exactly one `ScratchDir`; the directory is removed
/// recursively when the guard drops, on success and failure alike.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Creates a uniquely-named scratch directory under `root`.
    pub fn create(root: &Path, label: &str) -> Result<Self> {
        let sequence = NEXT_SCRATCH_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let name = format!(
            "{}-{}-{}",
            label,
            current_unix_timestamp_ms(),
            sequence
        );
        let path = root.join(name);
        std::fs::create_dir_all(&path)
            .with_context(|| format!("failed to create scratch dir {}", path.display()))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolves a file name inside the scratch directory.
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        // Cleanup is best-effort; a failure here must not panic a request.
        let _ = std::fs::remove_dir_all(&self.path);
    }
}
