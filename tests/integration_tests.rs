use prsort::prelude::*;
use prsort::SortError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_u32(count: usize, seed: u64) -> Vec<u32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_| rng.random()).collect()
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn byte_digit(v: &u32, depth: usize) -> u8 {
    v.msd_digit::<u8>(depth)
}

#[test]
fn test_single_thread_matches_std_sort() {
    init_logger();
    let input = random_u32(1000, 1);
    let mut expected = input.clone();
    expected.sort();

    let mut data = input.clone();
    let sorter = RadixSorter::new(SortConfig::default().with_threads(1));
    sorter.sort(&mut data, byte_digit, 4).unwrap();

    assert_eq!(data, expected);
}

#[test]
fn test_empty_and_single_element() {
    let sorter = RadixSorter::new(SortConfig::default().with_threads(4));

    let mut empty: Vec<u32> = vec![];
    let stats = sorter.sort(&mut empty, byte_digit, 4).unwrap();
    assert!(empty.is_empty());
    assert_eq!(stats, SortStats::default());

    let mut one = vec![42u32];
    let stats = sorter.sort(&mut one, byte_digit, 4).unwrap();
    assert_eq!(one, vec![42]);
    assert_eq!(stats, SortStats::default());
}

#[test]
fn test_recursion_reaches_distinguishing_depth() {
    // first three bytes shared by every key, the fourth one distinct
    let mut rng = StdRng::seed_from_u64(7);
    let mut input: Vec<u64> = (0..256u64).map(|i| 0xABCD_EF00_0000_0000 | (i << 32)).collect();
    for i in (1..input.len()).rev() {
        let j = rng.random_range(0..=i);
        input.swap(i, j);
    }
    let mut expected = input.clone();
    expected.sort();

    for threads in [1, 4] {
        let config = SortConfig::default()
            .with_threads(threads)
            .with_subsort_threshold(1)
            .with_track_remaining(true);
        let mut data = input.clone();
        let stats = RadixSorter::new(config)
            .sort(&mut data, |v: &u64, d| v.msd_digit::<u8>(d), 8)
            .unwrap();

        assert_eq!(data, expected, "threads = {threads}");
        // every key ends up in a singleton bucket at depth 3
        assert_eq!(stats.comparison_sorts, 0, "threads = {threads}");
    }
}

#[test]
fn test_sort_is_idempotent() {
    let mut data = random_u32(50_000, 3);
    par_radix_sort(&mut data).unwrap();
    let once = data.clone();
    par_radix_sort(&mut data).unwrap();
    assert_eq!(data, once);
}

#[test]
fn test_sixteen_bit_digits() {
    let mut rng = StdRng::seed_from_u64(11);
    let input: Vec<u64> = (0..100_000).map(|_| rng.random()).collect();
    let mut expected = input.clone();
    expected.sort();

    let mut data = input;
    let config = SortConfig::default().with_threads(4);
    RadixSorter::new(config)
        .sort(&mut data, |v: &u64, d| v.msd_digit::<u16>(d), u64::msd_depth::<u16>())
        .unwrap();

    assert_eq!(data, expected);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Record {
    key: u32,
    payload: u64,
}

#[test]
fn test_records_with_payload() {
    let mut rng = StdRng::seed_from_u64(5);
    // few distinct keys so buckets hold many equal keys
    let input: Vec<Record> = (0..20_000)
        .map(|i| Record {
            key: rng.random_range(0..500),
            payload: i,
        })
        .collect();

    let mut data = input.clone();
    let config = SortConfig::default().with_threads(3).with_min_parallel_chunk(64);
    radix_sort_by(
        &mut data,
        |r: &Record, d| r.key.msd_digit::<u8>(d),
        |a: &Record, b: &Record| a.key.cmp(&b.key),
        4,
        &config,
    )
    .unwrap();

    assert!(data.windows(2).all(|w| w[0].key <= w[1].key));

    // same multiset of records
    let mut got = data.clone();
    got.sort();
    let mut expected = input;
    expected.sort();
    assert_eq!(got, expected);
}

#[test]
fn test_in_place_small_sort() {
    let input = random_u32(200_000, 13);
    let mut expected = input.clone();
    expected.sort();

    let mut data = input;
    let config = SortConfig::default()
        .with_threads(4)
        .with_in_place_small_sort(true);
    RadixSorter::new(config).sort(&mut data, byte_digit, 4).unwrap();

    assert_eq!(data, expected);
}

#[test]
fn test_track_remaining() {
    let input = random_u32(100_000, 17);
    let mut expected = input.clone();
    expected.sort();

    let mut data = input;
    let config = SortConfig::default()
        .with_threads(4)
        .with_track_remaining(true);
    RadixSorter::new(config).sort(&mut data, byte_digit, 4).unwrap();

    assert_eq!(data, expected);
}

#[test]
fn test_zero_depth_falls_back_to_comparison() {
    let input = random_u32(10_000, 19);
    let mut expected = input.clone();
    expected.sort();

    let mut data = input;
    let stats = radix_sort(&mut data, byte_digit, 0).unwrap();

    assert_eq!(data, expected);
    assert_eq!(stats.big_steps, 0);
    assert_eq!(stats.comparison_sorts, 1);
}

#[test]
fn test_signed_integers() {
    let mut rng = StdRng::seed_from_u64(23);
    let input: Vec<i32> = (0..30_000).map(|_| rng.random()).collect();
    let mut expected = input.clone();
    expected.sort();

    let mut data = input;
    par_radix_sort(&mut data).unwrap();

    assert_eq!(data, expected);
}

#[test]
fn test_parallel_steps_are_used() {
    init_logger();
    let input = random_u32(100_000, 29);
    let mut expected = input.clone();
    expected.sort();

    let mut data = input.clone();
    let config = SortConfig::default().with_threads(4);
    let stats = RadixSorter::new(config).sort(&mut data, byte_digit, 4).unwrap();
    assert_eq!(data, expected);
    assert!(stats.big_steps > 0);
    assert!(stats.small_jobs >= stats.donated_jobs);

    let mut data = input;
    let config = config.with_parallel_radix_step(false);
    let stats = RadixSorter::new(config).sort(&mut data, byte_digit, 4).unwrap();
    assert_eq!(data, expected);
    assert_eq!(stats.big_steps, 0);
}

#[test]
fn test_invalid_config_leaves_input_untouched() {
    let input = vec![3u32, 1, 2];

    for config in [
        SortConfig::default().with_threads(0),
        SortConfig::default().with_subsort_threshold(0),
        SortConfig::default().with_min_parallel_chunk(0),
    ] {
        let mut data = input.clone();
        let err = RadixSorter::new(config).sort(&mut data, byte_digit, 4).unwrap_err();
        assert!(matches!(err, SortError::InvalidConfig { .. }));
        assert_eq!(data, input);
    }
}

#[test]
#[should_panic(expected = "bad key")]
fn test_panicking_key_function_propagates() {
    let mut data = random_u32(10_000, 31);
    data[1234] = 777;
    let config = SortConfig::default().with_threads(2);
    let _ = RadixSorter::new(config).sort(
        &mut data,
        |v: &u32, d| {
            if *v == 777 {
                panic!("bad key");
            }
            v.msd_digit::<u8>(d)
        },
        4,
    );
}
