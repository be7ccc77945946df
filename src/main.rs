// A small tour of the perc library: train each classifier on inline data
// and print the resulting weights and classifications.
use ndarray::array;
use perc::{AdaptivePerceptron, DataPoint, Dataset, Perceptron, PerceptronEnsemble, Schema};
use std::error::Error;

fn training_data() -> Result<Dataset<f64>, Box<dyn Error>> {
    let points = vec![
        DataPoint::new(array![2.0, 3.0, 2.5, 3.5], 1.0),
        DataPoint::new(array![3.0, 2.0, 3.5, 2.5], 1.0),
        DataPoint::new(array![2.5, 2.5, 3.0, 3.0], 1.0),
        DataPoint::new(array![3.5, 3.0, 2.0, 2.5], 1.0),
        DataPoint::new(array![2.0, 2.5, 3.5, 3.0], 1.0),
        DataPoint::new(array![3.0, 3.5, 2.5, 2.0], 1.0),
        DataPoint::new(array![-2.0, -3.0, -2.5, -3.5], 0.0),
        DataPoint::new(array![-3.0, -2.0, -3.5, -2.5], 0.0),
        DataPoint::new(array![-2.5, -2.5, -3.0, -3.0], 0.0),
        DataPoint::new(array![-3.5, -3.0, -2.0, -2.5], 0.0),
        DataPoint::new(array![-2.0, -2.5, -3.5, -3.0], 0.0),
        DataPoint::new(array![-3.0, -3.5, -2.5, -2.0], 0.0),
    ];
    Ok(Dataset::from_points(Schema::numeric_binary(4), points)?)
}

fn main() -> Result<(), Box<dyn Error>> {
    let data = training_data()?;

    let mut linear = Perceptron::new();
    let outcome = linear.train(&data)?;
    println!("Linear perceptron ({:?})", outcome);
    println!("weights: {:?}", linear.weights());
    for point in data.iter() {
        println!(
            "class {} -> {}",
            point.class,
            linear.classify(point.features.view())
        );
    }

    let mut enhanced = AdaptivePerceptron::new();
    enhanced.set_standardization(true);
    enhanced.set_cross_validation(true);
    let mut enhanced_data = data.clone();
    let outcome = enhanced.train(&mut enhanced_data)?;
    println!(
        "\nEnhanced perceptron ({:?}, {:?} updates)",
        outcome,
        enhanced.update_mode()
    );
    println!("weights: {:?}", enhanced.weights());
    for point in data.iter() {
        println!(
            "class {} -> {}",
            point.class,
            enhanced.classify(point.features.view())
        );
    }

    let mut ensemble = PerceptronEnsemble::new();
    ensemble.train(&data, 0.5)?;
    println!("\nEnsemble of {} members", ensemble.member_count());
    for member in 0..ensemble.member_count() {
        println!(
            "member {member}: weights {:?}, removed columns {:?}",
            ensemble.member_weights(member),
            ensemble.removed_features(member)
        );
    }
    for point in data.iter() {
        println!(
            "class {} -> {}",
            point.class,
            ensemble.classify(point.features.view())?
        );
    }

    Ok(())
}
