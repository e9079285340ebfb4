use cardinality_sketch::{CardinalityEstimator, SketchConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), cardinality_sketch::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut estimator = CardinalityEstimator::new(14)?;
    println!("precision = {}", estimator.precision());
    println!("registers = {}", estimator.register_count());
    println!("size = {} bytes", estimator.size_of());
    println!("expected error = {:.4}%", estimator.relative_error() * 100.0);

    let mut rng = StdRng::seed_from_u64(42);
    for n in [10_000u64, 100_000, 1_000_000, 10_000_000] {
        estimator.reset();
        for i in 0..n {
            estimator.insert(&i);
        }
        let estimate = estimator.estimate();
        let error = (estimate - n as f64).abs() / n as f64 * 100.0;
        println!("actual = {}, estimate = {:.2}, error = {:.2}%", n, estimate, error);
    }

    let config = SketchConfig::default().with_precision(10).with_seed(rng.gen());
    let mut estimator1 = CardinalityEstimator::with_config(config)?;
    for i in 0..50_000u64 {
        estimator1.insert(&i);
    }
    println!("estimator1 estimate = {:.2}", estimator1.estimate());

    let mut estimator2 = CardinalityEstimator::with_config(config)?;
    for i in 40_000..70_000u64 {
        estimator2.insert(&i);
    }
    println!("estimator2 estimate = {:.2}", estimator2.estimate());

    estimator1.merge(&estimator2)?;
    println!("merged estimate = {:.2} (actual = 70000)", estimator1.estimate());

    Ok(())
}
