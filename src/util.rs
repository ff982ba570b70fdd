use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Abbreviates long opaque ids (public keys, channel ids) for display.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(12) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

/// Deterministic pair in [-1, 1] derived from `id`.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_id_truncates_long_keys() {
        assert_eq!(
            short_id("03864ef025fde8fb587d989186ce6a4a186895ee44a926bfc370e2c366597a3f8f"),
            "03864ef025fd"
        );
        assert_eq!(short_id("alice"), "alice");
    }

    #[test]
    fn stable_pair_is_deterministic_and_bounded() {
        let first = stable_pair("node-a");
        assert_eq!(first, stable_pair("node-a"));
        assert_ne!(first, stable_pair("node-b"));
        for value in [first.0, first.1] {
            assert!((-1.0..=1.0).contains(&value));
        }
    }
}
