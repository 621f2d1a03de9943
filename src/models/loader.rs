//! Loads the deployable artifact set for serving

use anyhow::{ensure, Context, Result};
use tracing::info;

use crate::models::classifier::{Classifier, ModelKind};
use crate::models::registry::ArtifactStore;
use crate::scaler::StandardScaler;

/// The selected model together with the scaler it was trained behind
#[derive(Debug)]
pub struct LoadedModel {
    pub kind: ModelKind,
    pub classifier: Classifier,
    pub scaler: StandardScaler,
}

/// Loader for committed training artifacts
pub struct ModelLoader {
    store: ArtifactStore,
}

impl ModelLoader {
    pub fn new(store: ArtifactStore) -> Self {
        Self { store }
    }

    /// Load the best-model token, then that model and the scaler.
    ///
    /// Fails when any file is missing or unreadable, the token names an
    /// unknown kind, the stored model is of a different kind than the token,
    /// or the scaler and model disagree on the feature count.
    pub fn load_best(&self) -> Result<LoadedModel> {
        let kind = self
            .store
            .read_best_model()
            .context("Failed to read best-model token")?;
        self.load(kind)
    }

    /// Load a specific model kind and the scaler.
    pub fn load(&self, kind: ModelKind) -> Result<LoadedModel> {
        let model_path = self.store.model_path(kind.identifier());
        info!(model = %kind, path = %model_path.display(), "Loading model");

        let classifier = Classifier::load(&model_path)?;
        ensure!(
            classifier.kind() == kind,
            "{} holds a {} model, expected {}",
            model_path.display(),
            classifier.kind(),
            kind
        );

        let scaler = StandardScaler::load(self.store.scaler_path())?;
        ensure!(
            scaler.n_features() == classifier.n_features(),
            "Scaler expects {} features but {} expects {}",
            scaler.n_features(),
            kind,
            classifier.n_features()
        );

        info!(
            model = %kind,
            features = scaler.n_features(),
            "Model loaded successfully"
        );

        Ok(LoadedModel {
            kind,
            classifier,
            scaler,
        })
    }
}
