//! Deployable artifact set: scaler, fitted models and the best-model token.
//!
//! A training run's artifacts are written only after the whole run
//! succeeded. Every file is first written to a temporary sibling and then
//! renamed into place: models first, then the scaler, then the best-model
//! token, so a reader never sees a token pointing at a model from an older
//! run.
//!
//! The renames are not one atomic step. If one fails, the staged files not
//! yet moved are removed and the token keeps naming the previous run, but
//! models renamed before the failure stay in place.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::models::classifier::ModelKind;
use crate::models::trainer::TrainingOutcome;

const SCALER_FILE: &str = "scaler.json";
const BEST_MODEL_FILE: &str = "best_model.txt";

/// File-system layout of the models directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    models_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: Into<PathBuf>>(models_dir: P) -> Self {
        Self {
            models_dir: models_dir.into(),
        }
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.models_dir.join(SCALER_FILE)
    }

    pub fn best_model_path(&self) -> PathBuf {
        self.models_dir.join(BEST_MODEL_FILE)
    }

    pub fn model_path(&self, identifier: &str) -> PathBuf {
        self.models_dir.join(format!("{identifier}.json"))
    }

    /// Persist every artifact of a finished training run.
    pub fn commit(&self, outcome: &TrainingOutcome) -> Result<()> {
        fs::create_dir_all(&self.models_dir)
            .with_context(|| format!("Failed to create {}", self.models_dir.display()))?;

        let mut staged = Vec::new();
        let result = (|| -> Result<()> {
            for candidate in &outcome.candidates {
                let path = self.model_path(candidate.report.kind.identifier());
                staged.push(self.stage(&path, &candidate.classifier.to_bytes()?)?);
            }
            staged.push(self.stage(&self.scaler_path(), &outcome.scaler.to_bytes()?)?);
            let token = format!("{}\n", outcome.best.identifier());
            staged.push(self.stage(&self.best_model_path(), token.as_bytes())?);
            Ok(())
        })();

        if let Err(e) = result {
            discard(&staged);
            return Err(e);
        }

        for (i, (tmp, target)) in staged.iter().enumerate() {
            let moved = fs::rename(tmp, target)
                .with_context(|| format!("Failed to move artifact into {}", target.display()));
            if let Err(e) = moved {
                discard(&staged[i..]);
                return Err(e);
            }
        }

        info!(
            models_dir = %self.models_dir.display(),
            best_model = %outcome.best,
            "Artifacts committed"
        );
        Ok(())
    }

    /// Read the selected model identifier.
    pub fn read_best_model(&self) -> Result<ModelKind> {
        let path = self.best_model_path();
        let token = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        token.trim().parse()
    }

    fn stage(&self, target: &Path, bytes: &[u8]) -> Result<(PathBuf, PathBuf)> {
        let file_name = target
            .file_name()
            .context("artifact path has no file name")?
            .to_string_lossy();
        let tmp = target.with_file_name(format!(".{file_name}.tmp"));
        fs::write(&tmp, bytes)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        Ok((tmp, target.to_path_buf()))
    }
}

/// Remove staged temporary files that were not moved into place.
fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged {
        if let Err(e) = fs::remove_file(tmp) {
            warn!(path = %tmp.display(), error = %e, "Failed to remove staged artifact");
        }
    }
}
