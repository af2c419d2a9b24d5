use serde::{Deserialize, Serialize};
use std::ops::Index;
use std::sync::Arc;

/// Immutable snapshot of one record type.
///
/// Records are addressed by their arena index (position at load time). The
/// index carries no meaning beyond giving every record a stable, deterministic
/// order. Cloning is cheap and shares the underlying storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureCollection<T> {
    records: Arc<[T]>,
}

impl<T> FeatureCollection<T> {
    pub fn new(records: Vec<T>) -> Self {
        Self {
            records: records.into(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.records
    }
}

impl<T> Default for FeatureCollection<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Index<usize> for FeatureCollection<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.records[index]
    }
}

impl<T> FromIterator<T> for FeatureCollection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a FeatureCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_preserves_order() {
        let coll: FeatureCollection<u32> = vec![3, 1, 2].into_iter().collect();
        assert_eq!(coll.as_slice(), &[3, 1, 2]);
        assert_eq!(coll[1], 1);
        assert_eq!(coll.get(5), None);
    }

    #[test]
    fn test_clone_shares_storage() {
        let coll = FeatureCollection::new(vec![String::from("a")]);
        let snapshot = coll.clone();
        assert!(std::ptr::eq(coll.as_slice(), snapshot.as_slice()));
    }
}
