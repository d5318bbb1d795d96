//! Round-robin interleaving for display fairness.
//!
//! A flat result list sorted by population tends to open with a single
//! country's megacities. Interleaving by a grouping key gives every group a
//! turn before any group gets a second one, without changing the relative
//! order inside a group. Shuffling within groups is a separate, composable
//! step for callers that want randomized display order as well.

use rand::Rng;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Interleave `items` round-robin by `group_key`.
///
/// Buckets keep their encounter order and are visited in first-seen key
/// order; a bucket leaves the rotation the moment it empties. The output is
/// always a permutation of the input.
pub fn interleave<T, K, F>(items: Vec<T>, group_key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut bucket_index: HashMap<K, usize> = HashMap::new();
    let mut buckets: Vec<VecDeque<T>> = Vec::new();

    for item in items {
        let key = group_key(&item);
        match bucket_index.get(&key) {
            Some(&i) => buckets[i].push_back(item),
            None => {
                bucket_index.insert(key, buckets.len());
                let mut bucket = VecDeque::new();
                bucket.push_back(item);
                buckets.push(bucket);
            }
        }
    }

    let total: usize = buckets.iter().map(VecDeque::len).sum();
    let mut result = Vec::with_capacity(total);
    while result.len() < total {
        for bucket in &mut buckets {
            if let Some(item) = bucket.pop_front() {
                result.push(item);
            }
        }
    }
    result
}

/// Shuffle each group's items in place, leaving group membership and the
/// overall item positions of other groups untouched in the flat list.
///
/// Composable with [`interleave`]: shuffle first, then interleave, and each
/// bucket's output order equals its post-shuffle order.
pub fn shuffle_groups<T, K, F, R>(items: &mut [T], group_key: F, rng: &mut R)
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
    R: Rng,
{
    let mut positions: HashMap<K, Vec<usize>> = HashMap::new();
    for (i, item) in items.iter().enumerate() {
        positions.entry(group_key(item)).or_default().push(i);
    }

    for slots in positions.into_values() {
        // Fisher-Yates over the slots this group occupies; swaps only ever
        // touch members of the same group
        for j in (1..slots.len()).rev() {
            let r = rng.random_range(0..=j);
            items.swap(slots[j], slots[r]);
        }
    }
}
