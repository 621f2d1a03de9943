//! Inference engine serving the selected model

use anyhow::{ensure, Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::feature_extractor::FeatureExtractor;
use crate::models::classifier::{Classifier, ModelKind};
use crate::models::loader::{LoadedModel, ModelLoader};
use crate::models::registry::ArtifactStore;
use crate::scaler::StandardScaler;
use crate::types::{PatientFeatures, Prediction};

/// Scaler plus the selected classifier, immutable once built
#[derive(Debug)]
pub struct InferenceEngine {
    extractor: FeatureExtractor,
    scaler: StandardScaler,
    classifier: Classifier,
    model_used: ModelKind,
}

impl InferenceEngine {
    /// Load the committed best model from a models directory.
    pub fn from_models_dir<P: AsRef<Path>>(models_dir: P) -> Result<Self> {
        let loader = ModelLoader::new(ArtifactStore::new(models_dir.as_ref()));
        let engine = Self::from_loaded(loader.load_best()?)?;
        info!(model_used = %engine.model_used, "Inference engine initialized");
        Ok(engine)
    }

    pub fn from_loaded(loaded: LoadedModel) -> Result<Self> {
        let extractor = FeatureExtractor::new();
        ensure!(
            loaded.scaler.n_features() == extractor.feature_count(),
            "Model was trained on {} features, requests carry {}",
            loaded.scaler.n_features(),
            extractor.feature_count()
        );
        ensure!(
            loaded.classifier.n_features() == loaded.scaler.n_features(),
            "{} expects {} features, scaler produces {}",
            loaded.kind,
            loaded.classifier.n_features(),
            loaded.scaler.n_features()
        );
        Ok(Self {
            extractor,
            scaler: loaded.scaler,
            classifier: loaded.classifier,
            model_used: loaded.kind,
        })
    }

    /// Assemble an engine without the width checks, so tests can reach the
    /// inference failure path.
    #[cfg(test)]
    pub(crate) fn from_parts_unchecked(
        scaler: StandardScaler,
        classifier: Classifier,
        model_used: ModelKind,
    ) -> Self {
        Self {
            extractor: FeatureExtractor::new(),
            scaler,
            classifier,
            model_used,
        }
    }

    /// Identifier of the model answering requests
    pub fn model_used(&self) -> ModelKind {
        self.model_used
    }

    /// Scale one validated record and run the classifier on it.
    pub fn predict(&self, patient: &PatientFeatures) -> Result<Prediction> {
        let x = self.scaler.transform_named(&self.extractor.named(patient))?;

        let class = *self
            .classifier
            .predict(&x)?
            .first()
            .context("Model returned no prediction")?;
        let p1 = *self
            .classifier
            .predict_proba(&x)?
            .first()
            .context("Model returned no probability")?;

        let prediction = Prediction::new(u8::from(class == 1), p1);
        debug!(
            model = %self.model_used,
            prediction = prediction.class,
            probability = prediction.positive_probability,
            confidence = prediction.confidence,
            "Inference complete"
        );
        Ok(prediction)
    }
}
