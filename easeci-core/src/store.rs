//! Registry store: the single in-memory [`RegistryFile`] and its persisted
//! JSON document.
//!
//! # Consistency
//!
//! Every mutation goes through [`RegistryStore::with_exclusive_access`]. The
//! closure works on a copy of the aggregate; the copy is written to disk and
//! only then swapped in, all while the lock is held. A failing closure or a
//! failing write leaves both the in-memory aggregate and the document as
//! they were.
//!
//! # Write flow
//!
//! serialize → `projects-structure.json.tmp` sibling → `chmod 0600` → `rename`.
//! The `.tmp` file always lives next to the target, so the rename never
//! crosses filesystems.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{io_err, RegistryError};
use crate::types::RegistryFile;

/// Owner of the registry aggregate.
#[derive(Debug)]
pub struct RegistryStore {
    path: PathBuf,
    state: Mutex<Option<RegistryFile>>,
}

impl RegistryStore {
    /// A store backed by the document at `path`. Nothing is read until the
    /// first access.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current aggregate, reading the document (or seeding and
    /// persisting the initial state) if nothing is loaded yet.
    ///
    /// Returns `RegistryError::StorageCorruption` if the document exists but
    /// is not a valid registry.
    pub fn load(&self) -> Result<RegistryFile, RegistryError> {
        self.read(RegistryFile::clone)
    }

    /// Runs `f` against a consistent view of the aggregate.
    pub fn read<T>(&self, f: impl FnOnce(&RegistryFile) -> T) -> Result<T, RegistryError> {
        let mut state = self.state.lock();
        if let Some(registry) = state.as_ref() {
            return Ok(f(registry));
        }
        let registry = load_or_seed_at(&self.path)?;
        let out = f(&registry);
        *state = Some(registry);
        Ok(out)
    }

    /// Runs `f` against the mutable aggregate under the store-wide lock and
    /// persists the result before releasing it.
    ///
    /// The aggregate is committed only if `f` succeeds and the document was
    /// written. An unchanged aggregate is not rewritten.
    pub fn with_exclusive_access<T, F>(&self, f: F) -> Result<T, RegistryError>
    where
        F: FnOnce(&mut RegistryFile) -> Result<T, RegistryError>,
    {
        let mut state = self.state.lock();
        let current = match state.take() {
            Some(registry) => registry,
            None => load_or_seed_at(&self.path)?,
        };

        let mut working = current.clone();
        let result = f(&mut working).and_then(|out| {
            if working != current {
                save_at(&self.path, &working)?;
            }
            Ok(out)
        });

        *state = Some(if result.is_ok() { working } else { current });
        result
    }

    /// Discards the in-memory aggregate; the next access re-reads (or
    /// re-seeds) the document.
    pub fn reset(&self) {
        *self.state.lock() = None;
        tracing::debug!(path = %self.path.display(), "registry state discarded");
    }
}

// ---------------------------------------------------------------------------
// Document I/O
// ---------------------------------------------------------------------------

/// Reads the document at `path`, or materializes and persists the initial
/// state when it does not exist yet.
pub fn load_or_seed_at(path: &Path) -> Result<RegistryFile, RegistryError> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "no projects structure found, seeding initial state");
        let registry = RegistryFile::initial_state();
        save_at(path, &registry)?;
        return Ok(registry);
    }
    load_at(path)
}

/// Reads and validates the document at `path`.
pub fn load_at(path: &Path) -> Result<RegistryFile, RegistryError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let registry: RegistryFile =
        serde_json::from_str(&contents).map_err(|source| RegistryError::StorageCorruption {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!(
        path = %path.display(),
        groups = registry.group_count(),
        projects = registry.project_count(),
        "projects structure loaded"
    );
    Ok(registry)
}

/// Atomically writes `registry` to `path`.
pub fn save_at(path: &Path, registry: &RegistryFile) -> Result<(), RegistryError> {
    if let Some(dir) = path.parent() {
        if !dir.exists() {
            std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
            set_dir_permissions(dir)?;
        }
    }

    let json = serde_json::to_string_pretty(registry)?;
    let tmp = tmp_path(path);
    std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
    set_file_permissions(&tmp)?;
    std::fs::rename(&tmp, path).map_err(|e| io_err(path, e))?;
    tracing::debug!(path = %path.display(), "projects structure persisted");
    Ok(())
}

/// `<path>.tmp` in the same directory as `path`.
pub fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), RegistryError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), RegistryError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), RegistryError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), RegistryError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
