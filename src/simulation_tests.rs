//! End-to-end runs across the workspace crates: load, signal, simulate, score.

use analytics::AnalyticsEngine;
use approx::assert_abs_diff_eq;
use backtester::{Backtester, STRATEGY_RETURNS};
use chrono::{Duration, TimeZone, Utc};
use configuration::{BacktestSettings, FactorParams, MetricsSettings, PortfolioSettings};
use core_types::{FactorId, Frame, OhlcvFrame, PriceTable, RebalanceFrequency, TimeSeries, Timestamp};
use factors::create_factor;
use market_data::LoadSource;
use portfolio_backtester::{PORTFOLIO_RETURNS, PortfolioBacktester};
use std::io::Write;

fn days(start: (i32, u32, u32), n: usize) -> Vec<Timestamp> {
    let first = Utc.with_ymd_and_hms(start.0, start.1, start.2, 0, 0, 0).unwrap();
    (0..n).map(|i| first + Duration::days(i as i64)).collect()
}

fn write_csv(dir: &tempfile::TempDir, name: &str, closes: &[f64]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "Date,Open,High,Low,Close,Volume").unwrap();
    for (ts, close) in days((2024, 1, 2), closes.len()).iter().zip(closes) {
        writeln!(
            file,
            "{},{close},{close},{close},{close},1000",
            ts.format("%Y-%m-%d")
        )
        .unwrap();
    }
    path
}

fn zigzag(n: usize, start: f64) -> Vec<f64> {
    (0..n)
        .map(|i| start + i as f64 * 0.5 + if i % 3 == 0 { -1.5 } else { 1.0 })
        .collect()
}

#[test]
fn csv_to_report_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "spy.csv", &zigzag(60, 100.0));

    let bars = market_data::load("SPY", &LoadSource::file(path)).unwrap();
    assert_eq!(bars.len(), 60);

    let factor = create_factor(FactorId::Momentum, &FactorParams::default()).unwrap();
    let signal = factor.compute(&bars).unwrap();
    assert_eq!(signal.len(), bars.len());

    let backtester = Backtester::new(bars.close_series(), BacktestSettings::default()).unwrap();
    let returns = backtester.run(&signal).unwrap();
    assert_eq!(returns.name(), STRATEGY_RETURNS);

    let report = AnalyticsEngine::new(MetricsSettings::default())
        .unwrap()
        .calculate(&returns)
        .unwrap();
    assert_eq!(report.periods, returns.len());
    assert!(report.total_return.is_some());
    assert!(report.max_drawdown.unwrap() <= 0.0);
}

#[test]
fn worked_single_asset_example() {
    let index = days((2024, 1, 1), 5);
    let prices = TimeSeries::from_values("close", index.clone(), vec![100.0, 101.0, 102.0, 99.0, 100.0]).unwrap();
    let signal = TimeSeries::from_values("signal", index, vec![0.0, 0.5, 1.0, -0.5, 0.0]).unwrap();

    let settings = BacktestSettings {
        max_position: 1.0,
        commission_rate: 0.001,
    };
    let returns = Backtester::new(prices, settings).unwrap().run(&signal).unwrap();

    let positions = [None, Some(0.0), Some(0.5), Some(1.0), Some(-0.5)];
    let asset = [None, Some(0.01), Some(1.0 / 101.0), Some(-3.0 / 102.0), Some(1.0 / 99.0)];
    let mut previous: Option<f64> = None;
    for (i, value) in returns.values().iter().enumerate() {
        match (positions[i], asset[i]) {
            (Some(p), Some(r)) => {
                let turnover = previous.map_or(0.0, |q: f64| (p - q).abs());
                assert_abs_diff_eq!(value.unwrap(), p * r - turnover * 0.001, epsilon = 1e-12);
            }
            _ => assert!(value.is_none()),
        }
        previous = positions[i];
    }
}

#[test]
fn higher_commission_never_helps() {
    let index = days((2024, 1, 1), 40);
    let closes = zigzag(40, 50.0);
    let prices = TimeSeries::from_values("close", index.clone(), closes).unwrap();
    let flips = (0..40).map(|i| if i % 2 == 0 { 1.0 } else { -0.7 }).collect();
    let signal = TimeSeries::from_values("signal", index, flips).unwrap();

    let mut previous = f64::INFINITY;
    for rate in [0.0, 0.0005, 0.001, 0.01] {
        let settings = BacktestSettings {
            max_position: 1.0,
            commission_rate: rate,
        };
        let returns = Backtester::new(prices.clone(), settings)
            .unwrap()
            .run(&signal)
            .unwrap();
        let total = analytics::total_return(&returns);
        assert!(total <= previous, "rate {rate} gave {total} after {previous}");
        previous = total;
    }
}

#[test]
fn one_backtester_serves_parallel_signals() {
    let index = days((2024, 1, 1), 30);
    let prices = TimeSeries::from_values("close", index.clone(), zigzag(30, 20.0)).unwrap();
    let backtester = Backtester::new(prices, BacktestSettings::default()).unwrap();

    let signals: Vec<TimeSeries> = (1..=4)
        .map(|k| {
            let values = (0..30).map(|i| ((i * k) % 5) as f64 / 4.0 - 0.5).collect();
            TimeSeries::from_values("signal", index.clone(), values).unwrap()
        })
        .collect();

    let sequential: Vec<TimeSeries> = signals.iter().map(|s| backtester.run(s).unwrap()).collect();
    let shared = &backtester;
    let parallel: Vec<TimeSeries> = std::thread::scope(|scope| {
        let handles: Vec<_> = signals
            .iter()
            .map(|s| scope.spawn(move || shared.run(s).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(sequential, parallel);
}

fn price_table(index: &[Timestamp], closes: &[(&str, Vec<f64>)]) -> PriceTable {
    let frames: Vec<(String, OhlcvFrame)> = closes
        .iter()
        .map(|(symbol, close)| {
            (
                symbol.to_string(),
                OhlcvFrame::from_closes(index.to_vec(), close.clone()).unwrap(),
            )
        })
        .collect();
    PriceTable::from_frames(&frames).unwrap()
}

#[test]
fn mid_month_equal_weight_portfolio() {
    let index = days((2024, 1, 25), 10);
    let grow = |start: f64, step: f64| (0..10).map(|i| start + step * i as f64).collect::<Vec<f64>>();
    let prices = price_table(
        &index,
        &[("SPY", grow(100.0, 1.0)), ("TLT", grow(50.0, -0.5)), ("GLD", grow(20.0, 0.2))],
    );

    let portfolio = PortfolioBacktester::new(prices, PortfolioSettings::default()).unwrap();
    let trace = portfolio.simulate(None).unwrap();
    assert_eq!(trace.returns.name(), PORTFOLIO_RETURNS);

    let third = 1.0 / 3.0;
    for symbol in ["SPY", "TLT", "GLD"] {
        let positions = trace.positions.column(symbol).unwrap();
        assert_eq!(positions[0], None);
        for position in &positions[1..] {
            assert_abs_diff_eq!(position.unwrap(), third, epsilon = 1e-12);
        }
    }

    // 2024-02-01 is the eighth observation.
    let dates = portfolio_backtester::rebalance_dates(&index, RebalanceFrequency::Monthly);
    assert_eq!(dates, vec![index[0], index[7]]);
}

#[test]
fn signal_driven_portfolio_from_factor_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let spy = write_csv(&dir, "spy.csv", &zigzag(50, 100.0));
    let tlt = write_csv(&dir, "tlt.csv", &zigzag(50, 80.0).iter().rev().copied().collect::<Vec<_>>());

    let frames: Vec<(String, OhlcvFrame)> = [("SPY", spy), ("TLT", tlt)]
        .into_iter()
        .map(|(symbol, path)| (symbol.to_string(), market_data::load(symbol, &LoadSource::file(path)).unwrap()))
        .collect();
    let prices = PriceTable::from_frames(&frames).unwrap();

    let factor = create_factor(FactorId::Rsi, &FactorParams::default()).unwrap();
    let columns = frames
        .iter()
        .map(|(symbol, bars)| factor.compute(bars).unwrap().with_name(symbol.as_str()))
        .collect();
    let signals = Frame::from_series(columns).unwrap();

    let settings = PortfolioSettings {
        commission_rate: 0.001,
        ..Default::default()
    };
    let trace = PortfolioBacktester::new(prices, settings)
        .unwrap()
        .simulate(Some(&signals))
        .unwrap();

    for row in 0..trace.weights.nrows() {
        let gross: f64 = trace.weights.row(row).iter().flatten().map(|w| w.abs()).sum();
        assert!(gross == 0.0 || (gross - 1.0).abs() < 1e-9, "row {row} gross {gross}");
    }
    assert!(trace.returns.values().iter().skip(1).all(|r| r.is_some()));
}
