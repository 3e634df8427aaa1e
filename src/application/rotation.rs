//! Deterministic rotation primitives.
//!
//! Both provider chains and credential pools are rotated by a seed derived
//! from the request subject plus a time bucket. Within one bucket the same
//! request always lands on the same provider/key (retries stay cache-
//! friendly); across buckets the selection moves, spreading load without any
//! coordination between processes.

/// FNV-1a over the seed string. Distribution quality matters more than
/// speed here; the value is only ever taken modulo a small list length.
pub fn stable_hash(seed: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    let mut hash = FNV_OFFSET;
    for byte in seed.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Bucket index for a timestamp, at the given bucket width
pub fn time_bucket(now_ms: i64, bucket_ms: i64) -> i64 {
    if bucket_ms <= 0 {
        return 0;
    }
    now_ms / bucket_ms
}

/// Seed string combining the request subject with its time bucket
pub fn request_seed(subject: &str, bucket: i64) -> String {
    format!("{subject}:{bucket}")
}

/// The full list rotated to start at the seed-selected index
pub fn rotate<T: Clone>(items: &[T], seed: &str) -> Vec<T> {
    if items.len() < 2 {
        return items.to_vec();
    }
    let start = (stable_hash(seed) % items.len() as u64) as usize;
    let mut rotated = Vec::with_capacity(items.len());
    rotated.extend_from_slice(&items[start..]);
    rotated.extend_from_slice(&items[..start]);
    rotated
}

/// An ordered set of credentials for one provider. May be empty (provider
/// unusable), hold one key, or many. Read-only after construction.
#[derive(Debug, Clone, Default)]
pub struct KeyPool {
    keys: Vec<String>,
}

impl KeyPool {
    pub fn new(keys: Vec<String>) -> Self {
        let keys = keys
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keys }
    }

    /// Parse a comma-separated credential list, as configured in env vars
    pub fn from_csv(raw: &str) -> Self {
        Self::new(raw.split(',').map(str::to_string).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Deterministic pick: `stable_hash(seed) mod len`, `None` when empty
    pub fn pick(&self, seed: &str) -> Option<&str> {
        if self.keys.is_empty() {
            return None;
        }
        let idx = (stable_hash(seed) % self.keys.len() as u64) as usize;
        Some(&self.keys[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_stable_hash_is_deterministic() {
        assert_eq!(stable_hash("EUR/USD:1234"), stable_hash("EUR/USD:1234"));
        assert_ne!(stable_hash("EUR/USD:1234"), stable_hash("EUR/USD:1235"));
    }

    #[test]
    fn test_rotate_preserves_members() {
        let items = vec!["a", "b", "c", "d"];
        let rotated = rotate(&items, "seed-1");

        assert_eq!(rotated.len(), 4);
        for item in &items {
            assert!(rotated.contains(item));
        }
        // Rotation keeps relative order
        let start = rotated.iter().position(|i| *i == "a").unwrap();
        assert_eq!(rotated[(start + 1) % 4], "b");
    }

    #[test]
    fn test_rotate_same_seed_same_order() {
        let items = vec![1, 2, 3, 4, 5];
        assert_eq!(rotate(&items, "bucket-7"), rotate(&items, "bucket-7"));
    }

    #[test]
    fn test_pick_empty_pool() {
        let pool = KeyPool::new(vec![]);
        assert!(pool.pick("any").is_none());
        assert!(pool.is_empty());
    }

    #[test]
    fn test_pick_single_key() {
        let pool = KeyPool::from_csv("only-key");
        assert_eq!(pool.pick("whatever"), Some("only-key"));
    }

    #[test]
    fn test_from_csv_trims_and_drops_blanks() {
        let pool = KeyPool::from_csv(" k1 , ,k2,");
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_pick_distribution_across_buckets() {
        // Different buckets should spread over the pool roughly uniformly
        let pool = KeyPool::new(vec!["a".into(), "b".into(), "c".into(), "d".into()]);
        let mut counts: HashMap<String, usize> = HashMap::new();

        for bucket in 0..4000 {
            let seed = request_seed("EUR/USD", bucket);
            let key = pool.pick(&seed).unwrap().to_string();
            *counts.entry(key).or_default() += 1;
        }

        assert_eq!(counts.len(), 4);
        for count in counts.values() {
            // Expected 1000 each; allow generous slack
            assert!(*count > 700 && *count < 1300, "skewed pick: {count}");
        }
    }

    #[test]
    fn test_time_bucket() {
        let minute = 60_000;
        assert_eq!(time_bucket(0, minute), 0);
        assert_eq!(time_bucket(59_999, minute), 0);
        assert_eq!(time_bucket(60_000, minute), 1);
        assert_eq!(time_bucket(60_000, 0), 0);
    }
}
