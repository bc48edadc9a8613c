//! Label counts in first-seen order.

use hashbrown::HashMap;

/// Count of labels across one Monte Carlo trial set.
///
/// Labels keep the position they were first seen at, and ranking sorts by
/// count descending then first-seen ascending, so equal counts always break
/// the same way for the same sample sequence.
#[derive(Debug, Default, Clone)]
pub struct LabelTally {
    entries: Vec<(String, usize)>,
    positions: HashMap<String, usize>,
    total: usize,
}

impl LabelTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, label: &str) {
        match self.positions.get(label) {
            Some(&pos) => self.entries[pos].1 += 1,
            None => {
                self.positions.insert(label.to_string(), self.entries.len());
                self.entries.push((label.to_string(), 1));
            }
        }
        self.total += 1;
    }

    /// Number of labelled samples
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Number of distinct labels
    pub fn distinct(&self) -> usize {
        self.entries.len()
    }

    pub fn count(&self, label: &str) -> usize {
        self.positions
            .get(label)
            .map(|&pos| self.entries[pos].1)
            .unwrap_or(0)
    }

    /// Top `n` labels with their share of the total
    pub fn most_common(&self, n: usize) -> Vec<(&str, f64)> {
        if self.total == 0 {
            return Vec::new();
        }
        let mut ranked: Vec<&(String, usize)> = self.entries.iter().collect();
        // Stable sort keeps first-seen order among equal counts
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
            .into_iter()
            .take(n)
            .map(|(label, count)| (label.as_str(), *count as f64 / self.total as f64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_total() {
        let mut tally = LabelTally::new();
        for label in ["A", "B", "A", "C", "A"] {
            tally.add(label);
        }
        assert_eq!(tally.total(), 5);
        assert_eq!(tally.distinct(), 3);
        assert_eq!(tally.count("A"), 3);
        assert_eq!(tally.count("Z"), 0);

        let top = tally.most_common(2);
        assert_eq!(top, vec![("A", 0.6), ("B", 0.2)]);
    }

    #[test]
    fn test_ties_break_by_first_seen() {
        let mut tally = LabelTally::new();
        for label in ["B", "A", "A", "B", "C"] {
            tally.add(label);
        }
        let top = tally.most_common(3);
        assert_eq!(top[0].0, "B");
        assert_eq!(top[1].0, "A");
        assert_eq!(top[2].0, "C");
    }

    #[test]
    fn test_shares_sum_to_one() {
        let mut tally = LabelTally::new();
        for (i, label) in ["x", "y", "z"].iter().cycle().take(31).enumerate() {
            tally.add(label);
            if i % 4 == 0 {
                tally.add("w");
            }
        }
        let sum: f64 = tally.most_common(usize::MAX).iter().map(|(_, p)| p).sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty() {
        let tally = LabelTally::new();
        assert!(tally.is_empty());
        assert!(tally.most_common(2).is_empty());
    }
}
