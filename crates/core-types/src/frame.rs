use crate::error::CoreError;
use crate::series::{Timestamp, TimeSeries, ensure_unique};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A timestamp × column table of optional scalars.
///
/// Used for per-symbol signal tables and weight matrices. Data is stored
/// column-major; every column has exactly one entry per index row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    index: Vec<Timestamp>,
    columns: Vec<String>,
    data: Vec<Vec<Option<f64>>>,
}

impl Frame {
    pub fn new(
        index: Vec<Timestamp>,
        columns: Vec<(String, Vec<Option<f64>>)>,
    ) -> Result<Self, CoreError> {
        let mut seen = HashSet::new();
        let mut names = Vec::with_capacity(columns.len());
        let mut data = Vec::with_capacity(columns.len());
        for (name, values) in columns {
            if values.len() != index.len() {
                return Err(CoreError::LengthMismatch {
                    name,
                    index: index.len(),
                    values: values.len(),
                });
            }
            if !seen.insert(name.clone()) {
                return Err(CoreError::InvalidInput(
                    "columns".to_string(),
                    format!("duplicate column '{name}'"),
                ));
            }
            names.push(name);
            data.push(values.into_iter().map(|v| v.filter(|x| !x.is_nan())).collect());
        }
        Ok(Self {
            index,
            columns: names,
            data,
        })
    }

    /// Builds a frame from series sharing one index; columns take the
    /// series names.
    pub fn from_series(series: Vec<TimeSeries>) -> Result<Self, CoreError> {
        let Some(first) = series.first() else {
            return Self::new(Vec::new(), Vec::new());
        };
        let index = first.index().to_vec();
        let mut columns = Vec::with_capacity(series.len());
        for s in series {
            if s.index() != index.as_slice() {
                return Err(CoreError::InvalidInput(
                    s.name().to_string(),
                    "series index differs from the first column's index".to_string(),
                ));
            }
            columns.push((s.name().to_string(), s.values().to_vec()));
        }
        Self::new(index, columns)
    }

    pub fn index(&self) -> &[Timestamp] {
        &self.index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn nrows(&self) -> usize {
        self.index.len()
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.data[i].as_slice())
    }

    /// A single column as a named series.
    pub fn series(&self, name: &str) -> Option<TimeSeries> {
        let values = self.column(name)?.to_vec();
        TimeSeries::new(name, self.index.clone(), values).ok()
    }

    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        self.data.get(col).and_then(|c| c.get(row).copied().flatten())
    }

    pub fn row(&self, row: usize) -> Vec<Option<f64>> {
        self.data.iter().map(|c| c[row]).collect()
    }

    /// Returns a copy sorted by ascending timestamp, rejecting duplicates.
    pub fn sort_index(&self) -> Result<Self, CoreError> {
        ensure_unique("frame", &self.index)?;
        let mut order: Vec<usize> = (0..self.nrows()).collect();
        order.sort_by_key(|&i| self.index[i]);
        Ok(Self {
            index: order.iter().map(|&i| self.index[i]).collect(),
            columns: self.columns.clone(),
            data: self
                .data
                .iter()
                .map(|c| order.iter().map(|&i| c[i]).collect())
                .collect(),
        })
    }

    /// Conforms the rows to `index`. Rows missing from this frame come out
    /// undefined; rows not in `index` are dropped.
    pub fn reindex(&self, index: &[Timestamp]) -> Self {
        let lookup: HashMap<&Timestamp, usize> =
            self.index.iter().enumerate().map(|(i, t)| (t, i)).collect();
        let positions: Vec<Option<usize>> = index.iter().map(|t| lookup.get(t).copied()).collect();
        Self {
            index: index.to_vec(),
            columns: self.columns.clone(),
            data: self
                .data
                .iter()
                .map(|c| positions.iter().map(|p| p.and_then(|i| c[i])).collect())
                .collect(),
        }
    }

    /// Moves every column forward by `periods` rows; the vacated head is
    /// undefined.
    pub fn shift(&self, periods: usize) -> Self {
        Self {
            index: self.index.clone(),
            columns: self.columns.clone(),
            data: self
                .data
                .iter()
                .map(|c| (0..c.len()).map(|i| if i < periods { None } else { c[i - periods] }).collect())
                .collect(),
        }
    }

    /// Propagates the last defined value of each column forward.
    pub fn ffill(&self) -> Self {
        let data = self
            .data
            .iter()
            .map(|c| {
                let mut last = None;
                c.iter()
                    .map(|v| {
                        if v.is_some() {
                            last = *v;
                        }
                        last
                    })
                    .collect()
            })
            .collect();
        Self {
            index: self.index.clone(),
            columns: self.columns.clone(),
            data,
        }
    }

    /// Replaces every undefined cell with `value`.
    pub fn fill_none(&self, value: f64) -> Self {
        Self {
            index: self.index.clone(),
            columns: self.columns.clone(),
            data: self
                .data
                .iter()
                .map(|c| c.iter().map(|v| Some(v.unwrap_or(value))).collect())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn days(n: usize) -> Vec<Timestamp> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| start + Duration::days(i as i64)).collect()
    }

    #[test]
    fn rejects_ragged_and_duplicate_columns() {
        let err = Frame::new(days(2), vec![("A".into(), vec![Some(1.0)])]).unwrap_err();
        assert!(matches!(err, CoreError::LengthMismatch { .. }));

        let err = Frame::new(
            days(1),
            vec![("A".into(), vec![Some(1.0)]), ("A".into(), vec![Some(2.0)])],
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(..)));
    }

    #[test]
    fn reindex_then_ffill_then_fill() {
        let idx = days(4);
        let frame = Frame::new(
            vec![idx[1], idx[3]],
            vec![("A".into(), vec![Some(0.5), Some(1.0)])],
        )
        .unwrap();

        let wide = frame.reindex(&idx);
        assert_eq!(wide.column("A").unwrap(), &[None, Some(0.5), None, Some(1.0)]);

        let filled = wide.ffill().fill_none(0.0);
        assert_eq!(
            filled.column("A").unwrap(),
            &[Some(0.0), Some(0.5), Some(0.5), Some(1.0)]
        );
    }

    #[test]
    fn shift_lags_each_column() {
        let frame = Frame::new(
            days(3),
            vec![
                ("A".into(), vec![Some(1.0), Some(2.0), Some(3.0)]),
                ("B".into(), vec![Some(4.0), None, Some(6.0)]),
            ],
        )
        .unwrap();
        let lagged = frame.shift(1);
        assert_eq!(lagged.column("A").unwrap(), &[None, Some(1.0), Some(2.0)]);
        assert_eq!(lagged.column("B").unwrap(), &[None, Some(4.0), None]);
    }

    #[test]
    fn from_series_requires_shared_index() {
        let a = TimeSeries::from_values("A", days(2), vec![1.0, 2.0]).unwrap();
        let b = TimeSeries::from_values("B", days(3), vec![1.0, 2.0, 3.0]).unwrap();
        assert!(Frame::from_series(vec![a.clone(), b]).is_err());

        let frame = Frame::from_series(vec![a]).unwrap();
        assert_eq!(frame.columns(), &["A".to_string()]);
        assert_eq!(frame.row(1), vec![Some(2.0)]);
    }
}
