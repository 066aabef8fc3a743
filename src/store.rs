use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use log::info;
use parking_lot::Mutex;

use crate::config::LoadPolicy;
use crate::error::ScoringError;
use crate::inference::{load_engine, Prediction, PredictionEngine};
use crate::models::FeatureRow;

/// Identifies one version of the artifact file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArtifactStamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl ArtifactStamp {
    fn read(path: &Path) -> Result<Self, ScoringError> {
        let metadata = fs::metadata(path).map_err(|source| ScoringError::ArtifactIo {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(ArtifactStamp {
            modified: metadata.modified().ok(),
            len: metadata.len(),
        })
    }
}

struct CachedEngine {
    stamp: ArtifactStamp,
    engine: Arc<dyn PredictionEngine>,
}

/// Hands out prediction engines for the configured artifact.
pub struct ModelStore {
    path: PathBuf,
    policy: LoadPolicy,
    cached: Mutex<Option<CachedEngine>>,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>, policy: LoadPolicy) -> Self {
        ModelStore {
            path: path.into(),
            policy,
            cached: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> LoadPolicy {
        self.policy
    }

    /// Returns an engine for the artifact as it is on disk right now.
    pub fn engine(&self) -> Result<Arc<dyn PredictionEngine>, ScoringError> {
        match self.policy {
            LoadPolicy::PerRequest => load_engine(&self.path),
            LoadPolicy::Cached => self.cached_engine(),
        }
    }

    pub fn score(&self, row: &FeatureRow) -> Result<Prediction, ScoringError> {
        self.engine()?.predict(row)
    }

    /// Loads the artifact ahead of the first request. No-op unless cached.
    pub fn warm(&self) -> Result<(), ScoringError> {
        if self.policy == LoadPolicy::Cached {
            self.cached_engine()?;
        }
        Ok(())
    }

    fn cached_engine(&self) -> Result<Arc<dyn PredictionEngine>, ScoringError> {
        let stamp = ArtifactStamp::read(&self.path)?;
        // Held across the load so concurrent requests see a single reload.
        let mut slot = self.cached.lock();
        if let Some(cached) = slot.as_ref().filter(|cached| cached.stamp == stamp) {
            return Ok(cached.engine.clone());
        }

        let engine = load_engine(&self.path)?;
        info!(
            "loaded {:?} model artifact {} ({} bytes)",
            engine.format(),
            self.path.display(),
            stamp.len
        );
        *slot = Some(CachedEngine {
            stamp,
            engine: engine.clone(),
        });
        Ok(engine)
    }
}
