use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// The time axis shared by every series and table in a simulation.
pub type Timestamp = DateTime<Utc>;

/// A named, timestamp-indexed sequence of optional scalars.
///
/// This is the single-asset container for prices, signals and simulation
/// returns. `None` marks an undefined value (warm-up periods, the lagged
/// first position, and so on); NaN is never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    name: String,
    index: Vec<Timestamp>,
    values: Vec<Option<f64>>,
}

impl TimeSeries {
    /// Builds a series, checking that the index and values line up.
    /// NaN inputs are normalized to `None`.
    pub fn new(
        name: impl Into<String>,
        index: Vec<Timestamp>,
        values: Vec<Option<f64>>,
    ) -> Result<Self, CoreError> {
        let name = name.into();
        if index.len() != values.len() {
            return Err(CoreError::LengthMismatch {
                name,
                index: index.len(),
                values: values.len(),
            });
        }
        let values = values
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect();
        Ok(Self { name, index, values })
    }

    /// Builds a fully-defined series from plain floats (NaN becomes `None`).
    pub fn from_values(
        name: impl Into<String>,
        index: Vec<Timestamp>,
        values: Vec<f64>,
    ) -> Result<Self, CoreError> {
        Self::new(name, index, values.into_iter().map(Some).collect())
    }

    /// Assembles a series whose lengths are already known to match.
    pub(crate) fn from_parts(name: String, index: Vec<Timestamp>, values: Vec<Option<f64>>) -> Self {
        debug_assert_eq!(index.len(), values.len());
        Self { name, index, values }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> &[Timestamp] {
        &self.index
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Timestamp, Option<f64>)> + '_ {
        self.index.iter().zip(self.values.iter().copied())
    }

    /// Value at an exact timestamp; `None` if absent or undefined.
    /// Expects a sorted index.
    pub fn get(&self, timestamp: &Timestamp) -> Option<f64> {
        self.index
            .binary_search(timestamp)
            .ok()
            .and_then(|i| self.values[i])
    }

    /// The defined values, in index order.
    pub fn valid_values(&self) -> Vec<f64> {
        self.values.iter().flatten().copied().collect()
    }

    /// Returns a copy sorted by ascending timestamp.
    ///
    /// Fails if the index contains the same timestamp twice, since the
    /// simulation timeline has to be strictly increasing.
    pub fn sort_index(&self) -> Result<Self, CoreError> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by_key(|&i| self.index[i]);
        if order.windows(2).any(|w| self.index[w[0]] == self.index[w[1]]) {
            return Err(CoreError::DuplicateTimestamp(self.name.clone()));
        }
        Ok(Self {
            name: self.name.clone(),
            index: order.iter().map(|&i| self.index[i]).collect(),
            values: order.iter().map(|&i| self.values[i]).collect(),
        })
    }

    /// Drops undefined entries.
    pub fn dropna(&self) -> Self {
        let (index, values) = self
            .iter()
            .filter(|(_, v)| v.is_some())
            .map(|(t, v)| (*t, v))
            .unzip();
        Self {
            name: self.name.clone(),
            index,
            values,
        }
    }

    /// Restricts both series to the timestamps they share, keeping
    /// `self`'s ordering.
    pub fn inner_join(&self, other: &TimeSeries) -> (TimeSeries, TimeSeries) {
        let lookup: HashMap<&Timestamp, usize> =
            other.index.iter().enumerate().map(|(i, t)| (t, i)).collect();

        let mut index = Vec::new();
        let mut left = Vec::new();
        let mut right = Vec::new();
        for (i, timestamp) in self.index.iter().enumerate() {
            if let Some(&j) = lookup.get(timestamp) {
                index.push(*timestamp);
                left.push(self.values[i]);
                right.push(other.values[j]);
            }
        }

        (
            Self {
                name: self.name.clone(),
                index: index.clone(),
                values: left,
            },
            Self {
                name: other.name.clone(),
                index,
                values: right,
            },
        )
    }

    /// Moves values forward by `periods` rows; the vacated head is undefined.
    pub fn shift(&self, periods: usize) -> Self {
        let values = (0..self.len())
            .map(|i| if i < periods { None } else { self.values[i - periods] })
            .collect();
        Self {
            name: self.name.clone(),
            index: self.index.clone(),
            values,
        }
    }

    /// Simple percentage change against the previous row.
    pub fn pct_change(&self) -> Self {
        let values = (0..self.len())
            .map(|i| {
                if i == 0 {
                    return None;
                }
                match (self.values[i - 1], self.values[i]) {
                    (Some(prev), Some(curr)) => Some(curr / prev - 1.0),
                    _ => None,
                }
            })
            .collect();
        Self {
            name: self.name.clone(),
            index: self.index.clone(),
            values,
        }
    }

    /// Clamps defined values into `[lower, upper]`.
    pub fn clip(&self, lower: f64, upper: f64) -> Self {
        Self {
            name: self.name.clone(),
            index: self.index.clone(),
            values: self.values.iter().map(|v| v.map(|x| x.clamp(lower, upper))).collect(),
        }
    }
}

/// Checks that an index has no repeated timestamps.
pub(crate) fn ensure_unique(name: &str, index: &[Timestamp]) -> Result<(), CoreError> {
    let mut seen = HashSet::with_capacity(index.len());
    if index.iter().all(|t| seen.insert(t)) {
        Ok(())
    } else {
        Err(CoreError::DuplicateTimestamp(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn days(n: usize) -> Vec<Timestamp> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| start + Duration::days(i as i64)).collect()
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = TimeSeries::from_values("close", days(3), vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, CoreError::LengthMismatch { index: 3, values: 2, .. }));
    }

    #[test]
    fn nan_is_stored_as_none() {
        let s = TimeSeries::from_values("x", days(2), vec![1.0, f64::NAN]).unwrap();
        assert_eq!(s.values(), &[Some(1.0), None]);
    }

    #[test]
    fn sort_index_reorders_and_rejects_duplicates() {
        let mut idx = days(3);
        idx.reverse();
        let s = TimeSeries::from_values("x", idx, vec![3.0, 2.0, 1.0]).unwrap();
        let sorted = s.sort_index().unwrap();
        assert_eq!(sorted.values(), &[Some(1.0), Some(2.0), Some(3.0)]);

        let dup = vec![days(1)[0], days(1)[0]];
        let s = TimeSeries::from_values("x", dup, vec![1.0, 2.0]).unwrap();
        assert!(matches!(s.sort_index(), Err(CoreError::DuplicateTimestamp(_))));
    }

    #[test]
    fn inner_join_keeps_shared_timestamps() {
        let idx = days(5);
        let a = TimeSeries::from_values("a", idx.clone(), vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let b = TimeSeries::from_values("b", idx[2..].to_vec(), vec![30.0, 40.0, 50.0]).unwrap();
        let (left, right) = a.inner_join(&b);
        assert_eq!(left.index(), &idx[2..]);
        assert_eq!(left.values(), &[Some(3.0), Some(4.0), Some(5.0)]);
        assert_eq!(right.values(), &[Some(30.0), Some(40.0), Some(50.0)]);
    }

    #[test]
    fn shift_and_pct_change() {
        let s = TimeSeries::from_values("p", days(3), vec![100.0, 110.0, 99.0]).unwrap();
        assert_eq!(s.shift(1).values(), &[None, Some(100.0), Some(110.0)]);

        let r = s.pct_change();
        assert_eq!(r.values()[0], None);
        approx::assert_abs_diff_eq!(r.values()[1].unwrap(), 0.1, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(r.values()[2].unwrap(), -0.1, epsilon = 1e-12);
    }

    #[test]
    fn clip_leaves_undefined_values_alone() {
        let s = TimeSeries::new("s", days(3), vec![None, Some(3.0), Some(-3.0)]).unwrap();
        assert_eq!(s.clip(-1.0, 1.0).values(), &[None, Some(1.0), Some(-1.0)]);
    }
}
