use ndarray::{Array1, ArrayView1};
use perc_helpers::{AttributeKind, Dataset, Float, Schema};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors raised by the capability check before training starts.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// An attribute kind outside numeric/binary.
    UnsupportedAttribute { index: usize, kind: AttributeKind },
    /// A class kind outside numeric/binary.
    UnsupportedClass(AttributeKind),
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::UnsupportedAttribute { index, kind } => write!(
                f,
                "Attribute {} has kind {:?}, only numeric and binary attributes are supported",
                index, kind
            ),
            SchemaError::UnsupportedClass(kind) => write!(
                f,
                "Class has kind {:?}, only numeric and binary classes are supported",
                kind
            ),
        }
    }
}

impl Error for SchemaError {}

/// Whether the decision rule includes the bias term.
///
/// The bias contributes only while training. Once training finishes the
/// perceptron moves to `Inference` and never goes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Training,
    Inference,
}

/// How weight corrections are applied during the update loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Corrections change the live weight vector immediately.
    Online,
    /// Corrections accumulate separately and merge into the weights at each
    /// full pass over the data.
    Offline,
}

/// How the update loop terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainOutcome {
    /// A full pass produced no corrections.
    Converged,
    /// The configured iteration cap was reached first.
    IterationLimit,
}

/// Per-pass accumulator for offline updates. Online training stays `Idle`;
/// offline training collects deltas in `Accumulating` and moves to `Merged`
/// once they are folded into the live weights at the pass boundary.
#[derive(Debug, Clone, PartialEq)]
enum PassBuffer<F: Float> {
    Idle,
    Accumulating(Array1<F>),
    Merged,
}

/// A linear perceptron for two-class problems.
///
/// Class values map to the targets -1 (class value zero) and +1 (any other
/// class value); the decision rule is the three-way sign of the weighted sum,
/// so an exact zero is a valid output of `classify`.
#[derive(Debug, Clone)]
pub struct Perceptron<F: Float> {
    weights: Array1<F>,
    weights_set: bool,
    bias: F,
    learning_rate: F,
    adjustment: F,
    stopping_condition: u32,
    phase: Phase,
}

impl<F: Float> Default for Perceptron<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> Perceptron<F> {
    pub fn new() -> Self {
        Self {
            weights: Array1::zeros(0),
            weights_set: false,
            bias: F::zero(),
            learning_rate: F::one(),
            adjustment: F::zero(),
            stopping_condition: 0,
            phase: Phase::Training,
        }
    }

    /// Checks a schema against the perceptron's capabilities: numeric or
    /// binary attributes and a numeric or binary class.
    pub fn check_schema(schema: &Schema<F>) -> Result<(), SchemaError> {
        for (index, &kind) in schema.attributes().iter().enumerate() {
            match kind {
                AttributeKind::Numeric | AttributeKind::Binary => {}
                other => {
                    return Err(SchemaError::UnsupportedAttribute { index, kind: other });
                }
            }
        }
        match schema.class_kind() {
            AttributeKind::Numeric | AttributeKind::Binary => Ok(()),
            other => Err(SchemaError::UnsupportedClass(other)),
        }
    }

    /// Trains the perceptron with online updates.
    ///
    /// Weights default to all ones unless set beforehand. Training runs until
    /// a full pass produces no corrections, or until the stopping condition
    /// (when nonzero) caps the iteration count.
    ///
    /// # Errors
    ///
    /// Returns a `SchemaError` if the dataset declares attribute or class
    /// kinds the perceptron cannot handle.
    pub fn train(&mut self, data: &Dataset<F>) -> Result<TrainOutcome, SchemaError> {
        self.init_weights(data.num_features());
        Self::check_schema(data.schema())?;

        let outcome = self.run_updates(data, UpdateMode::Online);
        self.end_training();
        Ok(outcome)
    }

    /// Installs the all-ones default weight vector unless weights were set
    /// explicitly.
    pub fn init_weights(&mut self, num_features: usize) {
        if !self.weights_set {
            self.weights = Array1::ones(num_features);
        }
    }

    /// Ends the training phase. The bias term no longer contributes to the
    /// decision rule; the transition is one-way.
    pub fn end_training(&mut self) {
        self.phase = Phase::Inference;
    }

    /// Runs the update loop over `data` in the given mode.
    ///
    /// This is the raw loop shared with the adaptive variant: it neither
    /// validates the schema nor ends the training phase. A stopping condition
    /// of zero means the loop runs until convergence alone.
    pub fn run_updates(&mut self, data: &Dataset<F>, mode: UpdateMode) -> TrainOutcome {
        let num_instances = data.len();
        let width = self.weights.len();

        let mut buffer = match mode {
            UpdateMode::Online => PassBuffer::Idle,
            UpdateMode::Offline => PassBuffer::Accumulating(Array1::zeros(width)),
        };

        let mut cont = 0usize;
        let mut x = 0usize;
        let mut run_num = 1u32;

        while cont != num_instances && run_num != self.stopping_condition {
            if buffer == PassBuffer::Merged {
                buffer = PassBuffer::Accumulating(Array1::zeros(width));
            }

            let instance = data.get(x);
            let result = self.decision(instance.features.view());
            let target = if instance.class == F::zero() {
                -F::one()
            } else {
                F::one()
            };

            if result != target {
                cont = 0;
                self.adjustment =
                    F::from(0.5).unwrap() * self.learning_rate * (target - result);
                match &mut buffer {
                    PassBuffer::Accumulating(deltas) => {
                        deltas.scaled_add(self.adjustment, &instance.features);
                    }
                    _ => {
                        self.weights.scaled_add(self.adjustment, &instance.features);
                    }
                }
            } else {
                cont += 1;
            }

            if x == num_instances - 1 {
                if let PassBuffer::Accumulating(deltas) = &buffer {
                    self.weights += deltas;
                    buffer = PassBuffer::Merged;
                }
                x = 0;
            } else {
                x += 1;
            }

            run_num += 1;
        }

        if run_num == self.stopping_condition {
            println!("Training stopped after reaching the maximum number of iterations");
            TrainOutcome::IterationLimit
        } else {
            TrainOutcome::Converged
        }
    }

    /// Classifies a feature vector: -1, 0 or +1 by the sign of the weighted
    /// sum. The bias contributes only while the perceptron is training.
    pub fn classify(&self, features: ArrayView1<F>) -> F {
        self.decision(features)
    }

    fn decision(&self, features: ArrayView1<F>) -> F {
        let mut sum = F::zero();
        for (weight, value) in self.weights.iter().zip(features.iter()) {
            sum = sum + *weight * *value;
        }
        if self.phase == Phase::Training {
            sum = sum + self.bias;
        }

        if sum < F::zero() {
            -F::one()
        } else if sum > F::zero() {
            F::one()
        } else {
            F::zero()
        }
    }

    // setters and getters

    pub fn weights(&self) -> ArrayView1<F> {
        self.weights.view()
    }

    pub fn set_weights(&mut self, weights: Array1<F>) {
        self.weights = weights;
        self.weights_set = true;
    }

    pub fn learning_rate(&self) -> F {
        self.learning_rate
    }

    pub fn set_learning_rate(&mut self, learning_rate: F) {
        self.learning_rate = learning_rate;
    }

    pub fn bias(&self) -> F {
        self.bias
    }

    pub fn set_bias(&mut self, bias: F) {
        self.bias = bias;
    }

    pub fn stopping_condition(&self) -> u32 {
        self.stopping_condition
    }

    pub fn set_stopping_condition(&mut self, stopping_condition: u32) {
        self.stopping_condition = stopping_condition;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}
