use ndarray::{Array1, ArrayView1};
use perc_helpers::{Dataset, Float, Schema};
use perceptron::{Perceptron, SchemaError};
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors that can occur when using the perceptron ensemble.
#[derive(Debug, Clone, PartialEq)]
pub enum EnsembleError {
    /// `classify` was called before `train`.
    NotTrained,
    /// A member rejected the dataset schema.
    Schema(SchemaError),
}

impl Display for EnsembleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EnsembleError::NotTrained => {
                write!(f, "Cannot classify with an untrained ensemble")
            }
            EnsembleError::Schema(err) => write!(f, "{}", err),
        }
    }
}

impl Error for EnsembleError {}

/// Vote record for one declared class value.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassVotes<F: Float> {
    pub class_value: F,
    pub count: usize,
    /// All matched votes over this class's own count; zero for classes with
    /// no votes.
    pub proportion: F,
}

#[derive(Debug, Clone)]
struct EnsembleMember<F: Float> {
    perceptron: Perceptron<F>,
    removed: Vec<usize>,
    kept: Vec<usize>,
}

/// A bagging-style ensemble of perceptrons.
///
/// Every member trains on its own shuffled copy of the dataset with a random
/// subset of the feature columns removed; classification is a majority vote
/// across the members.
#[derive(Debug, Clone)]
pub struct PerceptronEnsemble<F: Float> {
    ensemble_size: usize,
    attribute_proportion: F,
    members: Vec<EnsembleMember<F>>,
    schema: Option<Schema<F>>,
}

impl<F: Float> Default for PerceptronEnsemble<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> PerceptronEnsemble<F> {
    /// An ensemble of fifty members, the default size.
    pub fn new() -> Self {
        Self::with_size(50)
    }

    pub fn with_size(ensemble_size: usize) -> Self {
        Self {
            ensemble_size,
            attribute_proportion: F::from(0.5).unwrap(),
            members: Vec::new(),
            schema: None,
        }
    }

    /// Trains with a randomly seeded generator for the per-member shuffles
    /// and feature draws.
    pub fn train(
        &mut self,
        data: &Dataset<F>,
        attribute_proportion: F,
    ) -> Result<(), EnsembleError> {
        self.train_with_seed(data, attribute_proportion, rand::random())
    }

    /// Trains with a specific seed for reproducibility.
    pub fn train_with_seed(
        &mut self,
        data: &Dataset<F>,
        attribute_proportion: F,
        seed: u64,
    ) -> Result<(), EnsembleError> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        self.train_with_rng(data, attribute_proportion, &mut rng)
    }

    /// Builds and trains every member: an independently shuffled copy of
    /// `data` with `floor(num_features * attribute_proportion)` feature
    /// columns removed, drawn without replacement, uniformly and
    /// independently per member.
    ///
    /// # Errors
    ///
    /// Returns `EnsembleError::Schema` if the dataset declares attribute or
    /// class kinds the member perceptrons cannot handle.
    pub fn train_with_rng<R: Rng>(
        &mut self,
        data: &Dataset<F>,
        attribute_proportion: F,
        rng: &mut R,
    ) -> Result<(), EnsembleError> {
        self.attribute_proportion = attribute_proportion;
        let num_features = data.num_features();
        let removed_count: usize =
            (F::from(num_features).unwrap() * attribute_proportion).as_();

        self.members.clear();
        for _ in 0..self.ensemble_size {
            let mut copy = data.clone();
            copy.shuffle(rng);

            let mut removed = index::sample(rng, num_features, removed_count).into_vec();
            removed.sort_unstable();
            for &column in removed.iter().rev() {
                copy.remove_feature(column);
            }
            let kept: Vec<usize> = (0..num_features)
                .filter(|column| !removed.contains(column))
                .collect();

            let mut perceptron = Perceptron::new();
            perceptron.train(&copy).map_err(EnsembleError::Schema)?;
            self.members.push(EnsembleMember {
                perceptron,
                removed,
                kept,
            });
        }
        self.schema = Some(data.schema().clone());
        Ok(())
    }

    /// Majority-vote classification of a full-schema feature vector.
    ///
    /// Each member sees only the columns it was trained on. A member's vote
    /// lands on the declared class value equal to its own classification;
    /// the winner holds the strictly greatest count, with ties going to the
    /// class seen first in declaration order.
    ///
    /// # Errors
    ///
    /// Returns `EnsembleError::NotTrained` before `train` has run.
    pub fn classify(&self, features: ArrayView1<F>) -> Result<F, EnsembleError> {
        let schema = self.schema.as_ref().ok_or(EnsembleError::NotTrained)?;
        let (votes, _) = self.tally(features, schema.class_values());
        Ok(winner(&votes))
    }

    /// Per-class vote records for a feature vector: the counts from a fresh
    /// vote plus, for every class with at least one vote, the ratio of all
    /// matched votes to that class's own count.
    ///
    /// # Errors
    ///
    /// Returns `EnsembleError::NotTrained` before `train` has run.
    pub fn vote_distribution(
        &self,
        features: ArrayView1<F>,
    ) -> Result<Vec<ClassVotes<F>>, EnsembleError> {
        let schema = self.schema.as_ref().ok_or(EnsembleError::NotTrained)?;
        let (mut votes, total) = self.tally(features, schema.class_values());
        assign_proportions(&mut votes, total);
        Ok(votes)
    }

    fn tally(&self, features: ArrayView1<F>, class_values: &[F]) -> (Vec<ClassVotes<F>>, usize) {
        let outputs = self.members.iter().map(|member| {
            let reduced: Array1<F> = member.kept.iter().map(|&column| features[column]).collect();
            member.perceptron.classify(reduced.view())
        });
        tally_votes(outputs, class_values)
    }

    // setters and getters

    pub fn ensemble_size(&self) -> usize {
        self.ensemble_size
    }

    pub fn attribute_proportion(&self) -> F {
        self.attribute_proportion
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// The feature columns removed from one member's training data, in
    /// ascending order.
    pub fn removed_features(&self, member: usize) -> &[usize] {
        &self.members[member].removed
    }

    /// One member's trained weight vector.
    pub fn member_weights(&self, member: usize) -> ArrayView1<F> {
        self.members[member].perceptron.weights()
    }
}

/// Counts one vote per member output against the declared class values,
/// matching by exact equality. Outputs that equal no class value cast no
/// vote. Returns the per-class counters and the total matched votes.
fn tally_votes<F: Float>(
    outputs: impl Iterator<Item = F>,
    class_values: &[F],
) -> (Vec<ClassVotes<F>>, usize) {
    let mut votes: Vec<ClassVotes<F>> = class_values
        .iter()
        .map(|&class_value| ClassVotes {
            class_value,
            count: 0,
            proportion: F::zero(),
        })
        .collect();

    let mut total = 0usize;
    for output in outputs {
        for vote in votes.iter_mut() {
            if vote.class_value == output {
                vote.count += 1;
                total += 1;
            }
        }
    }
    (votes, total)
}

/// The class value holding the strictly greatest count. With no votes at all
/// the zero-valued default wins.
fn winner<F: Float>(votes: &[ClassVotes<F>]) -> F {
    let mut best_value = F::zero();
    let mut best_count = 0usize;
    for vote in votes {
        if vote.count > best_count {
            best_count = vote.count;
            best_value = vote.class_value;
        }
    }
    best_value
}

fn assign_proportions<F: Float>(votes: &mut [ClassVotes<F>], total: usize) {
    for vote in votes.iter_mut() {
        if vote.count != 0 {
            vote.proportion = F::from(total).unwrap() / F::from(vote.count).unwrap();
        }
    }
}
