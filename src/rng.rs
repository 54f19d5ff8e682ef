//! Seed derivation for independent random streams.

/// SplitMix64 mixer.
#[inline]
pub fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed of stream `stream` (a worker or restart index) derived from `base`.
#[inline]
pub fn derive_seed(base: u64, stream: u64) -> u64 {
    splitmix64(base ^ stream)
}

/// A fresh seed from the thread-local generator, for runs without an explicit seed.
pub fn fresh_seed() -> u64 {
    rand::random::<u64>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splitmix64_is_deterministic() {
        assert_eq!(splitmix64(0), splitmix64(0));
        assert_ne!(splitmix64(0), splitmix64(1));
    }

    #[test]
    fn streams_differ() {
        let seeds: Vec<u64> = (0..8).map(|i| derive_seed(12345, i)).collect();
        for (i, a) in seeds.iter().enumerate() {
            assert!(seeds[i + 1..].iter().all(|b| a != b));
        }
    }
}
