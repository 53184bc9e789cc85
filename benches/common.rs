#![allow(dead_code)]

use criterion::measurement::WallTime;
use criterion::BenchmarkGroup;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::Duration;

pub const SIZES_SMALL: &[usize] = &[8192, 65536];
pub const SIZES_ALL: &[usize] = &[8192, 65536, 4_194_304];

pub fn cap(group: &mut BenchmarkGroup<'_, WallTime>) {
    group.warm_up_time(Duration::from_secs(2));
    group.measurement_time(Duration::from_secs(5));
    group.sample_size(10);
}

/// Deterministic test data: English-like text interleaved with runs and
/// incompressible stretches, so the tree gets both dense match regions
/// and breakpoints.
pub fn get_test_data(size: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(0xe5a);
    let mut data = Vec::with_capacity(size + 64);
    while data.len() < size {
        match rng.gen_range(0..4) {
            0 | 1 => {
                data.extend_from_slice(b"the quick brown fox jumps over the lazy dog. ")
            }
            2 => {
                let byte = rng.gen::<u8>();
                let run = rng.gen_range(4..200);
                data.extend(std::iter::repeat(byte).take(run));
            }
            _ => {
                let stretch = rng.gen_range(8..120);
                data.extend((0..stretch).map(|_| rng.gen::<u8>()));
            }
        }
    }
    data.truncate(size);
    data
}
