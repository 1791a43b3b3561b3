//! Per-name accumulators that keep first-seen order

use std::collections::HashMap;

/// Values keyed by source name, iterated in the order names first appeared
///
/// Order matters downstream: identity resolution lets the first source name
/// claim a roster entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTotals<V> {
    entries: Vec<(String, V)>,
    index: HashMap<String, usize>,
}

impl<V> Default for NamedTotals<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V: Default> NamedTotals<V> {
    /// Value for `name`, inserted as the default when new
    pub fn entry(&mut self, name: &str) -> &mut V {
        let index = match self.index.get(name) {
            Some(&i) => i,
            None => {
                self.entries.push((name.to_string(), V::default()));
                self.index.insert(name.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }
}

impl<V> NamedTotals<V> {
    /// Empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `name`
    pub fn get(&self, name: &str) -> Option<&V> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    /// Names in first-seen order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// `(name, value)` pairs in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no names were recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Default> FromIterator<(String, V)> for NamedTotals<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut totals = Self::new();
        for (name, value) in iter {
            *totals.entry(&name) = value;
        }
        totals
    }
}
