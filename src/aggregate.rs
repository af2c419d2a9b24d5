//! Reductions over the records matched by a single range query.
//!
//! Sums are additive, so an empty match set sums to a defined `0`. Maxima and
//! "first after sort" have no meaningful value on an empty set and return
//! [`Aggregate::NoData`], which can never be mistaken for a genuine zero.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Result of a reduction that may have nothing to reduce.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Aggregate<T> {
    NoData,
    Value(T),
}

impl<T> Aggregate<T> {
    pub fn is_no_data(&self) -> bool {
        matches!(self, Aggregate::NoData)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Aggregate::Value(value) => Some(value),
            Aggregate::NoData => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Aggregate::Value(value) => Some(value),
            Aggregate::NoData => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Aggregate<U> {
        match self {
            Aggregate::Value(value) => Aggregate::Value(f(value)),
            Aggregate::NoData => Aggregate::NoData,
        }
    }

    pub fn as_ref(&self) -> Aggregate<&T> {
        match self {
            Aggregate::Value(value) => Aggregate::Value(value),
            Aggregate::NoData => Aggregate::NoData,
        }
    }
}

impl<T> From<Option<T>> for Aggregate<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Aggregate::NoData, Aggregate::Value)
    }
}

impl<T: fmt::Display> fmt::Display for Aggregate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregate::Value(value) => value.fmt(f),
            Aggregate::NoData => f.write_str("none found"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Reductions over one query's matches.
///
/// Records are kept in the order the range query returned them (load order),
/// which is the tie-break for [`AggregationEngine::first_after_sort`].
#[derive(Debug, Clone)]
pub struct AggregationEngine<'a, T> {
    records: Vec<&'a T>,
}

impl<'a, T> AggregationEngine<'a, T> {
    pub fn new(records: Vec<&'a T>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[&'a T] {
        &self.records
    }

    /// Sum of an integer field; `0` over an empty set. Saturates instead of wrapping.
    pub fn sum<F>(&self, field: F) -> u64
    where
        F: Fn(&T) -> u64,
    {
        self.records
            .iter()
            .copied()
            .fold(0_u64, |acc, record| acc.saturating_add(field(record)))
    }

    /// Maximum of a real field, ignoring non-finite values.
    pub fn max<F>(&self, field: F) -> Aggregate<f64>
    where
        F: Fn(&T) -> f64,
    {
        self.records
            .iter()
            .copied()
            .map(field)
            .filter(|value| value.is_finite())
            .fold(None, |best: Option<f64>, value| match best {
                Some(current) if current >= value => Some(current),
                _ => Some(value),
            })
            .into()
    }

    /// Records ordered by `field`, stable with respect to query order.
    ///
    /// Unordered keys (NaN) sort after every ordered key in either direction.
    pub fn sorted_by<K, F>(&self, field: F, order: SortOrder) -> Vec<&'a T>
    where
        K: PartialOrd,
        F: Fn(&T) -> K,
    {
        let mut keyed: Vec<(K, &'a T)> = self
            .records
            .iter()
            .copied()
            .map(|record| (field(record), record))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b, order));
        keyed.into_iter().map(|(_, record)| record).collect()
    }

    /// First record after sorting by `field`; equal keys keep query order.
    pub fn first_after_sort<K, F>(&self, field: F, order: SortOrder) -> Aggregate<&'a T>
    where
        K: PartialOrd,
        F: Fn(&T) -> K,
    {
        self.sorted_by(field, order).into_iter().next().into()
    }
}

fn is_ordered<K: PartialOrd>(key: &K) -> bool {
    key.partial_cmp(key).is_some()
}

fn compare_keys<K: PartialOrd>(a: &K, b: &K, order: SortOrder) -> Ordering {
    match (is_ordered(a), is_ordered(b)) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => Ordering::Equal,
        (true, true) => {
            let ord = a.partial_cmp(b).unwrap_or(Ordering::Equal);
            match order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        }
    }
}
