#![no_main]

use cardinality_sketch::CardinalityEstimator;
use libfuzzer_sys::fuzz_target;
use wyhash::wyhash;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let precision = 4 + (data[0] % 13);
    let split_index = wyhash(data, 0) as usize % data.len();
    let (first_half, second_half) = data.split_at(split_index);

    let mut estimator1 = CardinalityEstimator::new(precision).unwrap();
    for chunk in first_half.chunks(4) {
        estimator1.insert(chunk);
        assert!(estimator1.estimate() > 0.0);
    }

    let mut estimator2 = CardinalityEstimator::new(precision).unwrap();
    for chunk in second_half.chunks(4) {
        estimator2.insert(chunk);
        assert!(estimator2.estimate() > 0.0);
    }

    let registers_before = estimator1.registers().to_vec();
    estimator1.merge(&estimator2).unwrap();
    assert!(estimator1.estimate().is_finite());
    assert!(registers_before
        .iter()
        .zip(estimator1.registers())
        .all(|(before, after)| after >= before));

    estimator1.reset();
    assert_eq!(estimator1.estimate(), 0.0);
});
