use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::types::{Pair, SplitData};

/// Split the pairs into training, validation, and testing sets
///
/// The pairs are shuffled with a seeded RNG first, so the same sorted input and
/// seed always give the same split. Test and validation sizes are rounded up;
/// training receives whatever remains.
pub fn split_pairs(mut pairs: Vec<Pair>, val_size: f32, test_size: f32, seed: u64) -> SplitData {
    let mut rng = StdRng::seed_from_u64(seed);
    pairs.shuffle(&mut rng);

    let total = pairs.len();
    let test_count = ((total as f32 * test_size).ceil() as usize).min(total);
    let val_count = ((total as f32 * val_size).ceil() as usize).min(total - test_count);

    let test_pairs: Vec<Pair> = pairs.drain(0..test_count).collect();
    let val_pairs: Vec<Pair> = pairs.drain(0..val_count).collect();

    SplitData {
        train_pairs: pairs,
        val_pairs,
        test_pairs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn pairs(n: usize) -> Vec<Pair> {
        (1..=n)
            .map(|i| Pair::new(format!("image{i}.jpg"), format!("image{i}.xml")))
            .collect()
    }

    #[test]
    fn test_split_pairs() {
        let split_data = split_pairs(pairs(5), 0.2, 0.2, 42);

        assert_eq!(split_data.train_pairs.len(), 3);
        assert_eq!(split_data.val_pairs.len(), 1);
        assert_eq!(split_data.test_pairs.len(), 1);
    }

    #[test]
    fn test_split_pairs_is_a_partition() {
        let split_data = split_pairs(pairs(10), 0.3, 0.1, 7);
        let all: HashSet<_> = split_data
            .train_pairs
            .iter()
            .chain(&split_data.val_pairs)
            .chain(&split_data.test_pairs)
            .map(|pair| pair.image_path.clone())
            .collect();
        assert_eq!(all.len(), 10);
    }

    #[test]
    fn test_split_pairs_is_deterministic() {
        let first = split_pairs(pairs(20), 0.2, 0.0, 42);
        let second = split_pairs(pairs(20), 0.2, 0.0, 42);
        assert_eq!(first.val_pairs, second.val_pairs);
        assert!(first.test_pairs.is_empty());
    }

    #[test]
    fn test_split_pairs_never_overflows() {
        let split_data = split_pairs(pairs(3), 1.0, 1.0, 1);
        assert_eq!(split_data.test_pairs.len(), 3);
        assert!(split_data.val_pairs.is_empty());
        assert!(split_data.train_pairs.is_empty());

        let empty = split_pairs(Vec::new(), 0.2, 0.2, 1);
        assert!(empty.train_pairs.is_empty());
    }
}
