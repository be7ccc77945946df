use ndarray::{Array1, ArrayView1};
use perc_helpers::{Dataset, Float};
use perceptron::{Perceptron, Phase, SchemaError, TrainOutcome, UpdateMode};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// A perceptron with optional feature standardization and automatic
/// selection between online and offline weight updates.
///
/// Standardization statistics are computed once from the training data and
/// applied to everything classified afterwards. Update-mode selection
/// compares the held-out accuracy of both modes across a k-fold split of the
/// training data before the final training pass.
#[derive(Debug, Clone)]
pub struct AdaptivePerceptron<F: Float> {
    perceptron: Perceptron<F>,
    standardization: bool,
    cross_validation: bool,
    mode: UpdateMode,
    folds: usize,
    means: Array1<F>,
    stds: Array1<F>,
}

impl<F: Float> Default for AdaptivePerceptron<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> AdaptivePerceptron<F> {
    pub fn new() -> Self {
        Self {
            perceptron: Perceptron::new(),
            standardization: false,
            cross_validation: false,
            mode: UpdateMode::Online,
            folds: 4,
            means: Array1::zeros(0),
            stds: Array1::zeros(0),
        }
    }

    /// Trains with a randomly seeded generator for the cross-validation
    /// shuffling and fold draws.
    pub fn train(&mut self, data: &mut Dataset<F>) -> Result<TrainOutcome, SchemaError> {
        self.train_with_seed(data, rand::random())
    }

    /// Trains with a specific seed for reproducibility.
    pub fn train_with_seed(
        &mut self,
        data: &mut Dataset<F>,
        seed: u64,
    ) -> Result<TrainOutcome, SchemaError> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        self.train_with_rng(data, &mut rng)
    }

    /// Trains against `data`, which is standardized in place when
    /// standardization is enabled.
    ///
    /// When cross-validation is enabled the update mode is chosen first by
    /// comparing online and offline accuracy on held-out folds; the final
    /// training pass then runs over the full dataset in the chosen mode.
    ///
    /// # Errors
    ///
    /// Returns a `SchemaError` if the dataset declares attribute or class
    /// kinds the perceptron cannot handle.
    pub fn train_with_rng<R: Rng>(
        &mut self,
        data: &mut Dataset<F>,
        rng: &mut R,
    ) -> Result<TrainOutcome, SchemaError> {
        self.perceptron.init_weights(data.num_features());
        Perceptron::check_schema(data.schema())?;

        if self.standardization {
            self.standardize(data);
        }
        if self.cross_validation {
            self.select_update_mode(data, rng);
        }

        let outcome = self.perceptron.run_updates(data, self.mode);
        self.perceptron.end_training();
        Ok(outcome)
    }

    /// Computes per-feature means and standard deviations over `data`,
    /// stores them, and rewrites every feature value as `(value - mean) /
    /// std` in place.
    ///
    /// A zero standard deviation is not guarded; the division produces the
    /// usual IEEE infinities or NaNs.
    pub fn standardize(&mut self, data: &mut Dataset<F>) {
        let num_features = data.num_features();
        let n = F::from(data.len()).unwrap();

        let mut means: Array1<F> = Array1::zeros(num_features);
        for point in data.iter() {
            means += &point.features;
        }
        means /= n;

        let mut stds: Array1<F> = Array1::zeros(num_features);
        for point in data.iter() {
            let centered = &point.features - &means;
            stds += &(&centered * &centered);
        }
        stds.mapv_inplace(|sum| (sum / (n - F::one())).sqrt());

        self.means = means;
        self.stds = stds;

        for point in data.iter_mut() {
            Self::apply_stats(&self.means, &self.stds, &mut point.features);
        }
    }

    /// Classifies a feature vector. With standardization enabled the stored
    /// training statistics transform a copy of the input first; the caller's
    /// vector is never modified.
    pub fn classify(&self, features: ArrayView1<F>) -> F {
        if self.standardization {
            let mut standardized = features.to_owned();
            Self::apply_stats(&self.means, &self.stds, &mut standardized);
            self.perceptron.classify(standardized.view())
        } else {
            self.perceptron.classify(features)
        }
    }

    fn apply_stats(means: &Array1<F>, stds: &Array1<F>, features: &mut Array1<F>) {
        for (j, (mean, std)) in means.iter().zip(stds.iter()).enumerate() {
            features[j] = (features[j] - *mean) / *std;
        }
    }

    /// Drops the stored statistics so the next standardization pass computes
    /// fresh ones. Empty statistics leave classified vectors untouched.
    fn reset_standardization(&mut self) {
        self.means = Array1::zeros(0);
        self.stds = Array1::zeros(0);
    }

    /// Chooses between online and offline updates by comparing their
    /// accuracy on held-out folds. Online wins ties.
    ///
    /// Each of the two evaluations draws its own held-out fold, so they may
    /// test against different folds.
    fn select_update_mode<R: Rng>(&mut self, data: &Dataset<F>, rng: &mut R) {
        let mut working = data.clone();
        working.shuffle(rng);
        let fold_len = working.len() / self.folds;

        let online_split = self.carve_split(&working, fold_len, rng);
        let offline_split = self.carve_split(&working, fold_len, rng);

        let online_accuracy = self.evaluate_mode(UpdateMode::Online, online_split);
        let offline_accuracy = self.evaluate_mode(UpdateMode::Offline, offline_split);

        self.mode = if online_accuracy >= offline_accuracy {
            UpdateMode::Online
        } else {
            UpdateMode::Offline
        };
    }

    /// Splits the shuffled working copy into owned training and test
    /// datasets. The held-out fold index is drawn from the first `folds - 1`
    /// folds; instances beyond `fold_len * folds` belong to no fold and are
    /// left out of both partitions.
    fn carve_split<R: Rng>(
        &self,
        working: &Dataset<F>,
        fold_len: usize,
        rng: &mut R,
    ) -> (Dataset<F>, Dataset<F>) {
        let held_out = rng.random_range(0..self.folds - 1);

        let mut train = working.clone_empty();
        let mut test = working.clone_empty();
        for (i, point) in working.iter().take(fold_len * self.folds).enumerate() {
            let partition = if i / fold_len == held_out {
                &mut test
            } else {
                &mut train
            };
            partition
                .push(point.clone())
                .expect("fold points share the source schema");
        }
        (train, test)
    }

    /// Runs the update loop on the training partition in the candidate mode,
    /// fits standardization statistics from that partition, measures
    /// accuracy on the test partition, then resets the statistics so the
    /// next evaluation starts clean.
    fn evaluate_mode(&mut self, mode: UpdateMode, split: (Dataset<F>, Dataset<F>)) -> F {
        let (mut train, test) = split;
        self.perceptron.run_updates(&train, mode);
        self.standardize(&mut train);
        let accuracy = self.accuracy(&test);
        self.reset_standardization();
        accuracy
    }

    /// Percentage of test instances whose classification equals the stored
    /// class value exactly.
    fn accuracy(&self, test: &Dataset<F>) -> F {
        let mut correct = F::zero();
        for point in test.iter() {
            if self.classify(point.features.view()) == point.class {
                correct = correct + F::one();
            }
        }
        (correct / F::from(test.len()).unwrap()) * F::from(100).unwrap()
    }

    // setters and getters

    pub fn standardization(&self) -> bool {
        self.standardization
    }

    pub fn set_standardization(&mut self, standardization: bool) {
        self.standardization = standardization;
    }

    pub fn cross_validation(&self) -> bool {
        self.cross_validation
    }

    pub fn set_cross_validation(&mut self, cross_validation: bool) {
        self.cross_validation = cross_validation;
    }

    pub fn folds(&self) -> usize {
        self.folds
    }

    pub fn set_folds(&mut self, folds: usize) {
        self.folds = folds;
    }

    pub fn update_mode(&self) -> UpdateMode {
        self.mode
    }

    pub fn set_update_mode(&mut self, mode: UpdateMode) {
        self.mode = mode;
    }

    pub fn weights(&self) -> ArrayView1<F> {
        self.perceptron.weights()
    }

    pub fn set_weights(&mut self, weights: Array1<F>) {
        self.perceptron.set_weights(weights);
    }

    pub fn learning_rate(&self) -> F {
        self.perceptron.learning_rate()
    }

    pub fn set_learning_rate(&mut self, learning_rate: F) {
        self.perceptron.set_learning_rate(learning_rate);
    }

    pub fn bias(&self) -> F {
        self.perceptron.bias()
    }

    pub fn set_bias(&mut self, bias: F) {
        self.perceptron.set_bias(bias);
    }

    pub fn stopping_condition(&self) -> u32 {
        self.perceptron.stopping_condition()
    }

    pub fn set_stopping_condition(&mut self, stopping_condition: u32) {
        self.perceptron.set_stopping_condition(stopping_condition);
    }

    pub fn phase(&self) -> Phase {
        self.perceptron.phase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use perc_helpers::{DataPoint, Schema};

    fn two_column_dataset(rows: &[([f64; 2], f64)]) -> Dataset<f64> {
        Dataset::from_points(
            Schema::numeric_binary(2),
            rows.iter()
                .map(|&(features, class)| {
                    DataPoint::new(array![features[0], features[1]], class)
                })
                .collect(),
        )
        .unwrap()
    }

    fn separable_dataset() -> Dataset<f64> {
        two_column_dataset(&[
            ([2.0, 3.0], 1.0),
            ([3.0, 2.0], 1.0),
            ([2.5, 2.5], 1.0),
            ([3.5, 3.0], 1.0),
            ([-2.0, -3.0], 0.0),
            ([-3.0, -2.0], 0.0),
            ([-2.5, -2.5], 0.0),
            ([-3.5, -3.0], 0.0),
        ])
    }

    #[test]
    fn test_standardize_computes_sample_statistics() {
        let mut data = two_column_dataset(&[([0.0, 4.0], 0.0), ([2.0, 8.0], 1.0)]);
        let mut adaptive = AdaptivePerceptron::new();
        adaptive.standardize(&mut data);

        assert_abs_diff_eq!(adaptive.means[0], 1.0);
        assert_abs_diff_eq!(adaptive.means[1], 6.0);
        assert_abs_diff_eq!(adaptive.stds[0], 2.0_f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(adaptive.stds[1], 8.0_f64.sqrt(), epsilon = 1e-12);

        assert_abs_diff_eq!(
            data.get(0).features[0],
            -1.0 / 2.0_f64.sqrt(),
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            data.get(1).features[1],
            2.0 / 8.0_f64.sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_standardize_neutral_on_standardized_data() {
        // Each column has mean zero and sample standard deviation one.
        let mut data = two_column_dataset(&[
            ([-1.0, 0.0], 0.0),
            ([0.0, 1.0], 0.0),
            ([1.0, -1.0], 1.0),
        ]);
        let before = data.clone();

        let mut adaptive = AdaptivePerceptron::new();
        adaptive.standardize(&mut data);

        for (after, original) in data.iter().zip(before.iter()) {
            for (a, b) in after.features.iter().zip(original.features.iter()) {
                assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_plain_training_matches_baseline_perceptron() {
        let mut data = separable_dataset();
        let mut adaptive = AdaptivePerceptron::new();
        adaptive.train_with_seed(&mut data, 1).unwrap();

        let mut baseline = Perceptron::new();
        baseline.train(&separable_dataset()).unwrap();

        assert_eq!(adaptive.weights(), baseline.weights());
        assert_eq!(adaptive.phase(), Phase::Inference);
    }

    #[test]
    fn test_classify_uses_stored_statistics() {
        let mut data = separable_dataset();
        let mut adaptive = AdaptivePerceptron::new();
        adaptive.set_standardization(true);
        adaptive.train_with_seed(&mut data, 1).unwrap();

        let point = array![2.5, 3.0];
        let first = adaptive.classify(point.view());
        let second = adaptive.classify(point.view());
        assert_eq!(first, second);

        // The caller's vector is untouched.
        assert_eq!(point, array![2.5, 3.0]);

        // The classification equals the plain decision on the manually
        // standardized input.
        let mut standardized = point.clone();
        AdaptivePerceptron::apply_stats(&adaptive.means, &adaptive.stds, &mut standardized);
        assert_eq!(first, adaptive.perceptron.classify(standardized.view()));
    }

    #[test]
    fn test_empty_statistics_leave_vectors_untouched() {
        let mut features = array![3.0, -4.0];
        AdaptivePerceptron::apply_stats(
            &Array1::<f64>::zeros(0),
            &Array1::<f64>::zeros(0),
            &mut features,
        );
        assert_eq!(features, array![3.0, -4.0]);
    }

    #[test]
    fn test_carve_split_sizes_and_remainder() {
        // Ten instances over four folds: fold length two, the last two
        // instances belong to no fold.
        let data = two_column_dataset(&[
            ([1.0, 1.0], 1.0),
            ([2.0, 2.0], 1.0),
            ([3.0, 3.0], 1.0),
            ([4.0, 4.0], 1.0),
            ([5.0, 5.0], 1.0),
            ([-1.0, -1.0], 0.0),
            ([-2.0, -2.0], 0.0),
            ([-3.0, -3.0], 0.0),
            ([-4.0, -4.0], 0.0),
            ([-5.0, -5.0], 0.0),
        ]);

        let adaptive = AdaptivePerceptron::<f64>::new();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let (train, test) = adaptive.carve_split(&data, data.len() / 4, &mut rng);

        assert_eq!(test.len(), 2);
        assert_eq!(train.len(), 6);
    }

    #[test]
    fn test_cross_validation_is_reproducible_with_seed() {
        let mut first = AdaptivePerceptron::new();
        first.set_cross_validation(true);
        let mut data = separable_dataset();
        first.train_with_seed(&mut data, 42).unwrap();

        let mut second = AdaptivePerceptron::new();
        second.set_cross_validation(true);
        let mut data = separable_dataset();
        second.train_with_seed(&mut data, 42).unwrap();

        assert_eq!(first.update_mode(), second.update_mode());
        assert_eq!(first.weights(), second.weights());
    }

    #[test]
    fn test_cross_validation_tie_selects_online() {
        // Every instance carries class one, so both candidate modes converge
        // immediately and score identically; the tie goes to online updates.
        let mut data = two_column_dataset(&[
            ([1.0, 1.0], 1.0),
            ([2.0, 1.0], 1.0),
            ([1.0, 2.0], 1.0),
            ([2.0, 2.0], 1.0),
            ([3.0, 1.0], 1.0),
            ([1.0, 3.0], 1.0),
            ([3.0, 2.0], 1.0),
            ([2.0, 3.0], 1.0),
        ]);

        let mut adaptive = AdaptivePerceptron::new();
        adaptive.set_cross_validation(true);
        adaptive.train_with_seed(&mut data, 9).unwrap();
        assert_eq!(adaptive.update_mode(), UpdateMode::Online);
    }

    #[test]
    fn test_offline_mode_trains_to_convergence() {
        let mut data = separable_dataset();
        let mut adaptive = AdaptivePerceptron::new();
        adaptive.set_update_mode(UpdateMode::Offline);
        let outcome = adaptive.train_with_seed(&mut data, 5).unwrap();

        assert_eq!(outcome, TrainOutcome::Converged);
        for point in data.iter() {
            let expected = if point.class == 0.0 { -1.0 } else { 1.0 };
            assert_eq!(adaptive.classify(point.features.view()), expected);
        }
    }
}
