use crate::Float;
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::Rng;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Attribute kinds a dataset schema can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub enum AttributeKind {
    Numeric,
    Binary,
    Nominal,
    Text,
}

/// Errors that can occur when assembling a dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetError {
    /// A data point's feature count does not match the schema.
    DimensionMismatch { expected: usize, found: usize },
}

impl Display for DatasetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::DimensionMismatch { expected, found } => write!(
                f,
                "Data point has {} features but the schema declares {}",
                found, expected
            ),
        }
    }
}

impl Error for DatasetError {}

/// Declarative description of a dataset: the kind of every attribute, the
/// kind of the class attribute, and the literal class values.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Schema<F: Float> {
    attributes: Vec<AttributeKind>,
    class_kind: AttributeKind,
    class_values: Vec<F>,
}

impl<F: Float> Schema<F> {
    pub fn new(
        attributes: Vec<AttributeKind>,
        class_kind: AttributeKind,
        class_values: Vec<F>,
    ) -> Self {
        Self {
            attributes,
            class_kind,
            class_values,
        }
    }

    /// All-numeric schema with a binary {0, 1} class, the common case for
    /// two-class problems.
    pub fn numeric_binary(num_features: usize) -> Self {
        Self {
            attributes: vec![AttributeKind::Numeric; num_features],
            class_kind: AttributeKind::Binary,
            class_values: vec![F::zero(), F::one()],
        }
    }

    pub fn num_features(&self) -> usize {
        self.attributes.len()
    }

    pub fn attributes(&self) -> &[AttributeKind] {
        &self.attributes
    }

    pub fn class_kind(&self) -> AttributeKind {
        self.class_kind
    }

    pub fn class_values(&self) -> &[F] {
        &self.class_values
    }

    pub(crate) fn remove_attribute(&mut self, index: usize) {
        self.attributes.remove(index);
    }
}

/// A single labeled observation: a feature vector plus its class value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct DataPoint<F: Float> {
    pub features: Array1<F>,
    pub class: F,
}

impl<F: Float> DataPoint<F> {
    pub fn new(features: Array1<F>, class: F) -> Self {
        DataPoint { features, class }
    }
}

/// An ordered collection of data points sharing one schema.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Dataset<F: Float> {
    schema: Schema<F>,
    points: Vec<DataPoint<F>>,
}

impl<F: Float> Dataset<F> {
    /// Creates an empty dataset for the given schema.
    pub fn new(schema: Schema<F>) -> Self {
        Self {
            schema,
            points: Vec::new(),
        }
    }

    /// Creates a dataset from existing points, checking every point against
    /// the schema's feature count.
    pub fn from_points(
        schema: Schema<F>,
        points: Vec<DataPoint<F>>,
    ) -> Result<Self, DatasetError> {
        let expected = schema.num_features();
        for point in &points {
            if point.features.len() != expected {
                return Err(DatasetError::DimensionMismatch {
                    expected,
                    found: point.features.len(),
                });
            }
        }
        Ok(Self { schema, points })
    }

    /// Appends a point, checking its feature count against the schema.
    pub fn push(&mut self, point: DataPoint<F>) -> Result<(), DatasetError> {
        let expected = self.schema.num_features();
        if point.features.len() != expected {
            return Err(DatasetError::DimensionMismatch {
                expected,
                found: point.features.len(),
            });
        }
        self.points.push(point);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn num_features(&self) -> usize {
        self.schema.num_features()
    }

    pub fn schema(&self) -> &Schema<F> {
        &self.schema
    }

    pub fn get(&self, index: usize) -> &DataPoint<F> {
        &self.points[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataPoint<F>> {
        self.points.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut DataPoint<F>> {
        self.points.iter_mut()
    }

    /// Randomly reorders the points in place.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.points.shuffle(rng);
    }

    /// Deletes one attribute column from the schema and from every point.
    pub fn remove_feature(&mut self, index: usize) {
        self.schema.remove_attribute(index);
        for point in &mut self.points {
            point.features = point
                .features
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != index)
                .map(|(_, &value)| value)
                .collect();
        }
    }

    /// A fresh empty dataset sharing this one's schema.
    pub fn clone_empty(&self) -> Dataset<F> {
        Dataset {
            schema: self.schema.clone(),
            points: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn sample_dataset() -> Dataset<f64> {
        Dataset::from_points(
            Schema::numeric_binary(3),
            vec![
                DataPoint::new(array![1.0, 2.0, 3.0], 0.0),
                DataPoint::new(array![4.0, 5.0, 6.0], 1.0),
                DataPoint::new(array![7.0, 8.0, 9.0], 1.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_from_points_checks_dimensions() {
        let result = Dataset::from_points(
            Schema::numeric_binary(2),
            vec![DataPoint::new(array![1.0, 2.0, 3.0], 0.0)],
        );
        assert_eq!(
            result.unwrap_err(),
            DatasetError::DimensionMismatch {
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn test_push_checks_dimensions() {
        let mut data = sample_dataset();
        data.push(DataPoint::new(array![10.0, 11.0, 12.0], 0.0))
            .unwrap();
        assert_eq!(data.len(), 4);

        let result = data.push(DataPoint::new(array![1.0, 2.0], 1.0));
        assert_eq!(
            result.unwrap_err(),
            DatasetError::DimensionMismatch {
                expected: 3,
                found: 2
            }
        );
        assert_eq!(data.len(), 4);
    }

    #[test]
    fn test_remove_feature_drops_column_everywhere() {
        let mut data = sample_dataset();
        data.remove_feature(1);

        assert_eq!(data.num_features(), 2);
        assert_eq!(data.get(0).features, array![1.0, 3.0]);
        assert_eq!(data.get(2).features, array![7.0, 9.0]);
        assert_eq!(data.get(1).class, 1.0);
    }

    #[test]
    fn test_shuffle_preserves_points() {
        let mut data = sample_dataset();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        data.shuffle(&mut rng);

        assert_eq!(data.len(), 3);
        for original in sample_dataset().iter() {
            assert!(data.iter().any(|point| point == original));
        }
    }

    #[test]
    fn test_clone_empty_keeps_schema() {
        let data = sample_dataset();
        let empty = data.clone_empty();

        assert!(empty.is_empty());
        assert_eq!(empty.schema(), data.schema());
    }

    #[test]
    fn test_numeric_binary_schema() {
        let schema = Schema::<f64>::numeric_binary(2);
        assert_eq!(schema.attributes(), &[AttributeKind::Numeric; 2]);
        assert_eq!(schema.class_kind(), AttributeKind::Binary);
        assert_eq!(schema.class_values(), &[0.0, 1.0]);
    }
}
