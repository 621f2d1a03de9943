//! Model training, selection, persistence and inference

pub mod classifier;
pub mod evaluation;
pub mod inference;
pub mod loader;
pub mod registry;
pub mod selector;
pub mod tracking;
pub mod trainer;

pub use classifier::{Classifier, ModelKind};
pub use evaluation::EvaluationMetrics;
pub use inference::InferenceEngine;
pub use loader::ModelLoader;
pub use registry::ArtifactStore;
pub use selector::select_best;
pub use tracking::ExperimentTracker;
pub use trainer::{ModelTrainer, TrainingOutcome};
