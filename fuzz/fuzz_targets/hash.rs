#![no_main]

use cardinality_sketch::hash::murmur3_x64_64;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let seed = data.first().map_or(0, |&b| u32::from(b));
    assert_eq!(murmur3_x64_64(data, seed), murmur3_x64_64(data, seed));
});
