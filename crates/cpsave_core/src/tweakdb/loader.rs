//! Loader state machine.

use super::TweakDb;
use crate::config::TweakDbConfig;
use crate::error::{CoreError, CoreResult, ErrorKind};
use crate::names::NameRegistry;
use cpsave_storage::{FileBackend, StorageBackend};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Why the last load failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadFailure {
    /// Error class.
    pub kind: ErrorKind,
    /// Byte offset of the failure, when it refers to the blob.
    pub offset: Option<u64>,
    /// Human-readable description.
    pub message: String,
}

impl From<&CoreError> for LoadFailure {
    fn from(err: &CoreError) -> Self {
        Self {
            kind: err.kind(),
            offset: err.offset(),
            message: err.to_string(),
        }
    }
}

/// Loader state.
#[derive(Debug, Clone, Default)]
pub enum LoadState {
    /// Nothing has been loaded.
    #[default]
    Unopened,
    /// The last load succeeded.
    Loaded(TweakDb),
    /// The last load failed. No partial database is kept.
    Failed(LoadFailure),
}

/// Loads TweakDB blobs and holds the result.
///
/// ```rust
/// use cpsave_core::{LoadState, NameRegistry, TweakDbConfig, TweakDbLoader};
///
/// let registry = NameRegistry::with_builtin_types();
/// let mut loader = TweakDbLoader::new(&registry, TweakDbConfig::default());
/// assert!(matches!(loader.state(), LoadState::Unopened));
///
/// assert!(loader.load_bytes(&[0u8; 8]).is_err());
/// assert!(matches!(loader.state(), LoadState::Failed(_)));
/// ```
#[derive(Debug)]
pub struct TweakDbLoader<'r> {
    registry: &'r NameRegistry,
    config: TweakDbConfig,
    state: LoadState,
}

impl<'r> TweakDbLoader<'r> {
    /// Creates a loader in the `Unopened` state.
    #[must_use]
    pub fn new(registry: &'r NameRegistry, config: TweakDbConfig) -> Self {
        Self {
            registry,
            config,
            state: LoadState::Unopened,
        }
    }

    /// Loads the blob stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns I/O errors opening or reading the file, and any decoding error.
    /// Either way the state becomes `Failed`.
    pub fn open(&mut self, path: &Path) -> CoreResult<&TweakDb> {
        debug!(path = %path.display(), "opening tweakdb");
        match FileBackend::open(path) {
            Ok(backend) => self.load_from(&backend),
            Err(err) => self.commit(Err(err.into())),
        }
    }

    /// Loads the whole content of `backend`.
    ///
    /// # Errors
    ///
    /// Returns storage and decoding errors.
    pub fn load_from(&mut self, backend: &dyn StorageBackend) -> CoreResult<&TweakDb> {
        match backend.read_all() {
            Ok(data) => self.load_bytes(&data),
            Err(err) => self.commit(Err(err.into())),
        }
    }

    /// Decodes an in-memory blob.
    ///
    /// # Errors
    ///
    /// Returns the first decoding error.
    pub fn load_bytes(&mut self, data: &[u8]) -> CoreResult<&TweakDb> {
        let result = TweakDb::read(data, self.registry, &self.config);
        if let Ok(db) = &result {
            db.log_loaded(data.len() as u64);
        }
        self.commit(result)
    }

    fn commit(&mut self, result: CoreResult<TweakDb>) -> CoreResult<&TweakDb> {
        match result {
            Ok(db) => self.state = LoadState::Loaded(db),
            Err(err) => {
                let failure = LoadFailure::from(&err);
                warn!(kind = %failure.kind, offset = ?failure.offset, "tweakdb load failed: {err}");
                self.state = LoadState::Failed(failure);
                return Err(err);
            }
        }
        self.database().ok_or_else(|| {
            CoreError::InvalidOperation("loaded database missing".to_string())
        })
    }

    /// Writes the loaded database to `backend`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if nothing is loaded, or encoding and
    /// storage errors.
    pub fn save_to(&self, backend: &mut dyn StorageBackend) -> CoreResult<u64> {
        let db = self
            .database()
            .ok_or_else(|| CoreError::InvalidOperation("no database loaded".to_string()))?;
        let written = db.write_to(backend)?;
        info!(bytes = written, pools = db.pool_count(), "tweakdb saved");
        Ok(written)
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// The loaded database, if the last load succeeded.
    #[must_use]
    pub fn database(&self) -> Option<&TweakDb> {
        match &self.state {
            LoadState::Loaded(db) => Some(db),
            _ => None,
        }
    }

    /// Mutable access to the loaded database.
    pub fn database_mut(&mut self) -> Option<&mut TweakDb> {
        match &mut self.state {
            LoadState::Loaded(db) => Some(db),
            _ => None,
        }
    }

    /// The failure of the last load, if it failed.
    #[must_use]
    pub fn failure(&self) -> Option<&LoadFailure> {
        match &self.state {
            LoadState::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// Consumes the loader and returns the loaded database.
    pub fn into_database(self) -> Option<TweakDb> {
        match self.state {
            LoadState::Loaded(db) => Some(db),
            _ => None,
        }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &TweakDbConfig {
        &self.config
    }
}
