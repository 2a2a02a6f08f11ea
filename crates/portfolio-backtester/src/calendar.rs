//! Rebalance schedule construction.

use chrono::Datelike;
use core_types::{RebalanceFrequency, Timestamp};

/// Indices of the first timestamp observed in each calendar period.
///
/// Periods are taken from the UTC date: weeks run Monday to Sunday and
/// quarters start in January, April, July and October. The timeline is
/// expected in ascending order; only timestamps present in it are
/// returned.
pub fn rebalance_indices(timeline: &[Timestamp], frequency: RebalanceFrequency) -> Vec<usize> {
    match frequency {
        RebalanceFrequency::Daily => period_starts(timeline, |t| t.date_naive()),
        RebalanceFrequency::Weekly => period_starts(timeline, |t| t.iso_week()),
        RebalanceFrequency::Monthly => period_starts(timeline, |t| (t.year(), t.month())),
        RebalanceFrequency::Quarterly => {
            period_starts(timeline, |t| (t.year(), (t.month() - 1) / 3))
        }
    }
}

/// The rebalance timestamps themselves.
pub fn rebalance_dates(timeline: &[Timestamp], frequency: RebalanceFrequency) -> Vec<Timestamp> {
    rebalance_indices(timeline, frequency)
        .into_iter()
        .map(|i| timeline[i])
        .collect()
}

fn period_starts<K: PartialEq>(timeline: &[Timestamp], key: impl Fn(&Timestamp) -> K) -> Vec<usize> {
    let mut indices = Vec::new();
    let mut current: Option<K> = None;
    for (i, timestamp) in timeline.iter().enumerate() {
        let period = key(timestamp);
        if current.as_ref() != Some(&period) {
            indices.push(i);
            current = Some(period);
        }
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn daily(start: (i32, u32, u32), n: usize) -> Vec<Timestamp> {
        let first = Utc.with_ymd_and_hms(start.0, start.1, start.2, 0, 0, 0).unwrap();
        (0..n).map(|i| first + Duration::days(i as i64)).collect()
    }

    #[test]
    fn monthly_picks_first_observed_day_of_each_month() {
        let timeline = daily((2023, 1, 25), 40);
        let dates = rebalance_dates(&timeline, RebalanceFrequency::Monthly);
        assert_eq!(
            dates,
            vec![
                Utc.with_ymd_and_hms(2023, 1, 25, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2023, 2, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap(),
            ]
        );
    }

    #[test]
    fn weekly_periods_start_on_monday() {
        // 2023-01-05 is a Thursday; the next weeks start on the 9th and 16th.
        let timeline = daily((2023, 1, 5), 14);
        assert_eq!(
            rebalance_indices(&timeline, RebalanceFrequency::Weekly),
            vec![0, 4, 11]
        );
    }

    #[test]
    fn quarterly_groups_three_months() {
        let timeline: Vec<Timestamp> = [(2023, 1, 3), (2023, 3, 31), (2023, 4, 3), (2023, 6, 30), (2023, 7, 3)]
            .iter()
            .map(|&(y, m, d)| Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap())
            .collect();
        assert_eq!(
            rebalance_indices(&timeline, RebalanceFrequency::Quarterly),
            vec![0, 2, 4]
        );
    }

    #[test]
    fn daily_frequency_on_daily_data_keeps_every_row() {
        let timeline = daily((2023, 1, 1), 9);
        assert_eq!(
            rebalance_indices(&timeline, RebalanceFrequency::Daily),
            (0..9).collect::<Vec<_>>()
        );
    }

    #[test]
    fn empty_timeline_has_no_rebalances() {
        assert!(rebalance_indices(&[], RebalanceFrequency::Monthly).is_empty());
    }

    #[test]
    fn schedule_is_deterministic() {
        let timeline = daily((2022, 11, 17), 120);
        assert_eq!(
            rebalance_indices(&timeline, RebalanceFrequency::Quarterly),
            rebalance_indices(&timeline, RebalanceFrequency::Quarterly)
        );
    }
}
