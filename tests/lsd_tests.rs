use prsort::prelude::*;
use prsort::{SortError, lsd::WRITE_BACK_MAX_ELEMENT_SIZE};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Item {
    key: u32,
    seq: u32,
}

fn random_items(count: usize, key_range: u32, seed: u64) -> Vec<Item> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count as u32)
        .map(|seq| Item {
            key: rng.random_range(0..key_range),
            seq,
        })
        .collect()
}

fn run_all<V, F>(input: &[Item], key_fn: F, threads: usize) -> [Vec<Item>; 3]
where
    V: RadixValue,
    F: Fn(&Item) -> V + Sync + Copy,
{
    let mut cached = input.to_vec();
    lsd_radix_sort_cached(&mut cached, key_fn, threads).unwrap();
    let mut recompute = input.to_vec();
    lsd_radix_sort_recompute(&mut recompute, key_fn, threads).unwrap();
    let mut write_back = input.to_vec();
    lsd_radix_sort_write_back(&mut write_back, key_fn, threads).unwrap();
    [cached, recompute, write_back]
}

#[test]
fn test_variants_agree_with_stable_sort() {
    assert!(size_of::<Item>() <= WRITE_BACK_MAX_ELEMENT_SIZE);

    let input = random_items(10_000, u32::MAX, 1);
    let mut expected = input.clone();
    expected.sort_by_key(|e| e.key);

    for threads in [1, 3, 8] {
        for (variant, out) in run_all(&input, |e: &Item| e.key, threads).iter().enumerate() {
            assert_eq!(out, &expected, "variant {variant}, threads {threads}");
        }
    }
}

#[test]
fn test_duplicate_keys_keep_input_order() {
    let input = random_items(10_000, 100, 2);
    let mut expected = input.clone();
    expected.sort_by_key(|e| e.key);

    for out in run_all(&input, |e: &Item| e.key, 4) {
        assert_eq!(out, expected);
        // stable: sequence numbers ascend within equal keys
        assert!(out.windows(2).all(|w| w[0].key < w[1].key || w[0].seq < w[1].seq));
    }
}

#[test]
fn test_odd_number_of_passes() {
    let input = random_items(5_000, 1 << 20, 3);
    let mut expected = input.clone();
    expected.sort_by_key(|e| e.key as u8);

    for out in run_all(&input, |e: &Item| e.key as u8, 4) {
        assert_eq!(out, expected);
    }
}

#[test]
fn test_signed_keys() {
    let input = random_items(10_000, u32::MAX, 4);
    let mut expected = input.clone();
    expected.sort_by_key(|e| e.key as i32);

    for out in run_all(&input, |e: &Item| e.key as i32, 2) {
        assert_eq!(out, expected);
    }
}

#[test]
fn test_large_elements_with_cached_digits() {
    // too large for the write-back buffer, fine for the other variants
    let mut rng = StdRng::seed_from_u64(5);
    let input: Vec<[u64; 4]> = (0..10_000).map(|_| [rng.random(), 1, 2, 3]).collect();
    let mut expected = input.clone();
    expected.sort_by_key(|e| e[0]);

    let mut cached = input.clone();
    lsd_radix_sort_cached(&mut cached, |e: &[u64; 4]| e[0], 4).unwrap();
    assert_eq!(cached, expected);

    let mut recompute = input;
    lsd_radix_sort_recompute(&mut recompute, |e: &[u64; 4]| e[0], 4).unwrap();
    assert_eq!(recompute, expected);
}

#[test]
fn test_trivial_inputs() {
    let mut empty: Vec<u32> = vec![];
    lsd_radix_sort_cached(&mut empty, |v: &u32| *v, 4).unwrap();
    assert!(empty.is_empty());

    let mut one = vec![9u32];
    lsd_radix_sort_write_back(&mut one, |v: &u32| *v, 4).unwrap();
    assert_eq!(one, vec![9]);
}

#[test]
fn test_zero_threads_rejected() {
    let mut data = vec![2u64, 1];
    let err = lsd_radix_sort_recompute(&mut data, |v: &u64| *v, 0).unwrap_err();
    assert!(matches!(err, SortError::InvalidConfig { .. }));
}
