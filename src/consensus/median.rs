use std::collections::BTreeMap;
use std::collections::btree_map;

/// Sorted multiset of voted values with their accumulated weights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedTally<V: Ord> {
    weights: BTreeMap<V, u64>,
    total: u64,
}

impl<V: Ord> Default for WeightedTally<V> {
    fn default() -> Self {
        Self {
            weights: BTreeMap::new(),
            total: 0,
        }
    }
}

impl<V: Ord + Copy> WeightedTally<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: V, weight: u64) {
        *self.weights.entry(value).or_insert(0) += weight;
        self.total += weight;
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn weight_of(&self, value: &V) -> u64 {
        self.weights.get(value).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Values in ascending order with their weights.
    pub fn iter(&self) -> btree_map::Iter<'_, V, u64> {
        self.weights.iter()
    }

    /// Smallest value such that the weight voting strictly above it is at
    /// most half of the total. Two equal halves resolve to the lower value.
    /// `None` when nothing carries weight.
    pub fn median(&self) -> Option<V> {
        if self.total == 0 {
            return None;
        }
        let half = self.total / 2;
        let mut above = self.total;
        for (value, weight) in &self.weights {
            above -= weight;
            if above <= half {
                return Some(*value);
            }
        }
        None
    }

    /// Smallest value whose cumulative weight exceeds `threshold`.
    pub fn first_above(&self, threshold: u64) -> Option<V> {
        let mut cumulative = 0u64;
        self.weights.iter().find_map(|(value, weight)| {
            cumulative += weight;
            (cumulative > threshold).then_some(*value)
        })
    }

    /// Smallest value whose cumulative weight reaches `threshold`.
    pub fn first_reaching(&self, threshold: u64) -> Option<V> {
        let mut cumulative = 0u64;
        self.weights.iter().find_map(|(value, weight)| {
            cumulative += weight;
            (cumulative >= threshold).then_some(*value)
        })
    }
}

impl<V: Ord + Copy> FromIterator<(V, u64)> for WeightedTally<V> {
    fn from_iter<I: IntoIterator<Item = (V, u64)>>(iter: I) -> Self {
        let mut tally = WeightedTally::new();
        for (value, weight) in iter {
            tally.add(value, weight);
        }
        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;

    #[test]
    fn empty_or_weightless_has_no_median() {
        let tally: WeightedTally<i64> = WeightedTally::new();
        assert_eq!(tally.median(), None);

        let weightless: WeightedTally<i64> = [(5, 0), (7, 0)].into_iter().collect();
        assert_eq!(weightless.median(), None);
        assert!(!weightless.is_empty());
    }

    #[test]
    fn zero_is_a_real_result() {
        let tally: WeightedTally<i64> = [(0, 10), (5, 3)].into_iter().collect();
        assert_eq!(tally.median(), Some(0));
    }

    #[test]
    fn equal_halves_resolve_low_and_majority_wins() {
        let tally: WeightedTally<i64> = [(100, 1000), (200, 1000)].into_iter().collect();
        assert_eq!(tally.median(), Some(100));

        let tally: WeightedTally<i64> = [(100, 1000), (200, 1001)].into_iter().collect();
        assert_eq!(tally.median(), Some(200));
    }

    #[test]
    fn thresholds() {
        let tally: WeightedTally<u32> = [(1, 2), (2, 2), (3, 2)].into_iter().collect();
        assert_eq!(tally.first_above(3), Some(2));
        assert_eq!(tally.first_above(4), Some(3));
        assert_eq!(tally.first_reaching(4), Some(2));
        assert_eq!(tally.first_above(6), None);
        assert_eq!(tally.weight_of(&2), 2);
        assert_eq!(tally.total(), 6);
    }

    #[test]
    fn order_independent() {
        let mut votes: Vec<(i64, u64)> = (0..200).map(|i| ((i * 37) % 101, (i as u64 * 13) % 17)).collect();
        let expected: WeightedTally<i64> = votes.iter().copied().collect();
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            votes.shuffle(&mut rng);
            let tally: WeightedTally<i64> = votes.iter().copied().collect();
            assert_eq!(tally.median(), expected.median());
            assert_eq!(tally.first_above(500), expected.first_above(500));
        }
    }
}
