//! Normalizes a raw CSV table into the canonical bar schema.

use crate::error::DataError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use core_types::{Bar, OhlcvFrame, Timestamp, OHLCV_FIELDS};
use std::io::Read;

/// Parses and cleans an OHLCV CSV.
///
/// Header names are trimmed and lower-cased. The timestamp comes from a
/// `datetime` column, or failing that the first column whose name contains
/// `date`. Rows with an empty or non-numeric OHLCV cell are dropped, rows
/// are sorted ascending, and for repeated timestamps the last row wins.
pub fn parse_csv<R: Read>(reader: R) -> Result<OhlcvFrame, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let datetime = headers
        .iter()
        .position(|h| h == "datetime")
        .or_else(|| headers.iter().position(|h| h.contains("date")))
        .ok_or(DataError::NoDatetimeColumn)?;

    let mut missing = Vec::new();
    let mut fields = [0usize; 5];
    for (slot, name) in fields.iter_mut().zip(OHLCV_FIELDS) {
        match headers.iter().position(|h| h == name) {
            Some(i) => *slot = i,
            None => missing.push(name.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(DataError::MissingColumns(missing));
    }

    let mut bars = Vec::new();
    let mut dropped = 0usize;
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());

        let raw_time = record.get(datetime).unwrap_or_default();
        if raw_time.is_empty() {
            dropped += 1;
            continue;
        }
        let timestamp = parse_timestamp(raw_time).ok_or_else(|| DataError::InvalidDatetime {
            value: raw_time.to_string(),
            line,
        })?;

        let values: Option<Vec<f64>> = fields
            .iter()
            .map(|&i| record.get(i).and_then(|v| v.parse::<f64>().ok()).filter(|v| !v.is_nan()))
            .collect();
        let Some(values) = values else {
            dropped += 1;
            continue;
        };

        bars.push(Bar {
            timestamp,
            open: values[0],
            high: values[1],
            low: values[2],
            close: values[3],
            volume: values[4],
        });
    }

    if dropped > 0 {
        tracing::debug!(dropped, "dropped incomplete rows");
    }
    if bars.is_empty() {
        return Err(DataError::Empty);
    }

    // Stable sort keeps file order among equal timestamps, so the last
    // occurrence is the one retained.
    bars.sort_by_key(|b| b.timestamp);
    let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match deduped.last_mut() {
            Some(last) if last.timestamp == bar.timestamp => *last = bar,
            _ => deduped.push(bar),
        }
    }

    Ok(OhlcvFrame::from_bars(deduped)?)
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` and bare dates. Naive values
/// are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<Timestamp> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
