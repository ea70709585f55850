use twox_hash::XxHash32;

/// Maps a dispatch key to a background worker index. The upper half of the
/// pool (`0..pool_size / 2`) hosts binlog-append workers, the lower half
/// (`pool_size / 2..pool_size`) storage-apply workers; `select_upper_half`
/// picks the range. The hash is deterministic, so all tasks sharing a key land
/// on the same worker and execute in submission order, while distinct keys
/// spread across the pool.
///
/// `pool_size` must be even and non-zero; the pool guarantees this by
/// construction (twice the configured sync thread count).
pub fn hash_index(key: &str, select_upper_half: bool, pool_size: usize) -> usize {
    debug_assert!(pool_size >= 2 && pool_size % 2 == 0);
    let base = pool_size / 2;
    let hash = XxHash32::oneshot(0, key.as_bytes()) as usize;
    if select_upper_half {
        hash % base
    } else {
        base + hash % base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_be_deterministic_for_a_fixed_pool_size() {
        let upper = hash_index("t1:0", true, 4);
        let lower = hash_index("t1:0", false, 4);
        for _ in 0..1000 {
            assert_eq!(hash_index("t1:0", true, 4), upper);
            assert_eq!(hash_index("t1:0", false, 4), lower);
        }
    }

    #[test]
    fn should_keep_halves_disjoint() {
        for pool_size in [2usize, 4, 8, 16, 48] {
            for i in 0..500 {
                let key = format!("table{}:{}", i % 7, i);
                let upper = hash_index(&key, true, pool_size);
                let lower = hash_index(&key, false, pool_size);
                assert!(upper < pool_size / 2);
                assert!(lower >= pool_size / 2);
                assert!(lower < pool_size);
                assert_eq!(lower, upper + pool_size / 2);
            }
        }
    }

    #[test]
    fn odd_thread_count_should_still_bisect_the_doubled_pool() {
        // 3 sync threads -> pool of 6 workers, upper 0..3, lower 3..6.
        let pool_size = 2 * 3;
        for i in 0..200 {
            let key = format!("orders:{i}");
            assert!(hash_index(&key, true, pool_size) < 3);
            let lower = hash_index(&key, false, pool_size);
            assert!((3..6).contains(&lower));
        }
    }
}
