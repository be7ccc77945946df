//! Linear perceptron classifiers for two-class problems: a baseline online
//! perceptron, an adaptive variant with feature standardization and
//! cross-validated update-mode selection, and a feature-subsampling
//! majority-vote ensemble.
//!
//! This crate re-exports the shared data model and the individual algorithm
//! crates under one roof.

pub use enhanced_perceptron::AdaptivePerceptron;
pub use perc_helpers::{AttributeKind, DataPoint, Dataset, DatasetError, Float, Schema};
pub use perceptron::{Perceptron, Phase, SchemaError, TrainOutcome, UpdateMode};
pub use perceptron_ensemble::{ClassVotes, EnsembleError, PerceptronEnsemble};
