use analytics::{AnalyticsEngine, PerformanceReport};
use anyhow::{Context, bail};
use backtester::Backtester;
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Table};
use configuration::{Config, SimulationOverrides, TargetWeight, init_logging};
use core_types::{Bar, FactorId, Frame, OHLCV_FIELDS, OhlcvFrame, PriceTable, Timestamp};
use factors::create_factor;
use market_data::LoadSource;
use portfolio_backtester::PortfolioBacktester;
use std::collections::HashSet;
use std::path::PathBuf;

/// The main entry point for the Quantsim backtesting application.
fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => configuration::load_config_from(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => configuration::load_config().context("failed to load configuration")?,
    };

    // Held until exit so the file appender flushes.
    let _guard = init_logging(&config.logging).context("failed to initialise logging")?;

    // Execute the appropriate command
    match cli.command {
        Commands::Backtest(args) => handle_backtest(args, &config),
        Commands::Portfolio(args) => handle_portfolio(args, &config),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Vectorized backtesting of factor signals on daily OHLCV data.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file; defaults to ./quantsim.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a factor signal against a single asset.
    Backtest(BacktestArgs),
    /// Run a multi-asset portfolio on static weights or factor signals.
    Portfolio(PortfolioArgs),
}

#[derive(Parser)]
struct BacktestArgs {
    /// Label for the asset (e.g., "SPY").
    #[arg(long)]
    symbol: String,

    /// Local OHLCV CSV file.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Remote (or file://) OHLCV CSV, tried when the local file fails.
    #[arg(long)]
    url: Option<String>,

    /// The signal to trade.
    #[arg(long, value_enum)]
    factor: FactorId,

    /// Print the report as JSON instead of a table.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    overrides: SimulationOverrides,
}

#[derive(Parser)]
struct PortfolioArgs {
    /// One asset as SYMBOL=SOURCE, where SOURCE is a CSV path or URL. Repeatable.
    #[arg(long = "asset", value_parser = parse_asset, required = true)]
    assets: Vec<(String, String)>,

    /// Target weight as SYMBOL=FRACTION. Repeatable; replaces configured weights.
    #[arg(long = "weight", value_parser = parse_weight)]
    weights: Vec<(String, f64)>,

    /// Weight the assets by this factor's signals instead of static targets.
    #[arg(long, value_enum)]
    factor: Option<FactorId>,

    /// Print the report as JSON instead of a table.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    overrides: SimulationOverrides,
}

fn parse_asset(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((symbol, source)) if !symbol.trim().is_empty() && !source.trim().is_empty() => {
            Ok((symbol.trim().to_string(), source.trim().to_string()))
        }
        _ => Err(format!("expected SYMBOL=SOURCE, got '{raw}'")),
    }
}

fn parse_weight(raw: &str) -> Result<(String, f64), String> {
    let (symbol, weight) = parse_asset(raw)?;
    let weight = weight
        .parse::<f64>()
        .map_err(|e| format!("invalid weight for {symbol}: {e}"))?;
    Ok((symbol, weight))
}

// ==============================================================================
// Backtest Command Logic
// ==============================================================================

fn handle_backtest(args: BacktestArgs, config: &Config) -> anyhow::Result<()> {
    let config = config.apply_overrides(&args.overrides)?;
    if args.csv.is_none() && args.url.is_none() {
        bail!("provide --csv and/or --url for {}", args.symbol);
    }

    let source = LoadSource {
        filepath: args.csv,
        url: args.url,
    };
    let bars = market_data::load(&args.symbol, &source)?;

    let factor = create_factor(args.factor, &config.factors)?;
    let signal = factor
        .compute(&bars)
        .with_context(|| format!("failed to compute {} for {}", args.factor, args.symbol))?;

    let backtester = Backtester::new(bars.close_series(), config.backtest)?;
    let returns = backtester.run(&signal)?;
    let report = AnalyticsEngine::new(config.metrics)?.calculate(&returns)?;

    tracing::info!(
        symbol = %args.symbol,
        factor = %args.factor,
        periods = report.periods,
        "backtest complete"
    );
    let title = format!("{} / {}", args.symbol, args.factor);
    print_report(&title, &report, args.json)
}

// ==============================================================================
// Portfolio Command Logic
// ==============================================================================

fn handle_portfolio(args: PortfolioArgs, config: &Config) -> anyhow::Result<()> {
    let mut config = config.apply_overrides(&args.overrides)?;
    if !args.weights.is_empty() {
        config.portfolio.weights = Some(
            args.weights
                .iter()
                .map(|(symbol, weight)| TargetWeight {
                    symbol: symbol.clone(),
                    weight: *weight,
                })
                .collect(),
        );
        config.validate()?;
    }

    let mut frames = Vec::with_capacity(args.assets.len());
    for (symbol, source) in &args.assets {
        let bars = market_data::load(symbol, &source_for(source))?;
        frames.push((symbol.clone(), bars));
    }
    let frames = align_frames(frames)?;
    let prices = PriceTable::from_frames(&frames)?;

    let signals = match args.factor {
        Some(id) => {
            let factor = create_factor(id, &config.factors)?;
            let mut columns = Vec::with_capacity(frames.len());
            for (symbol, bars) in &frames {
                let signal = factor
                    .compute(bars)
                    .with_context(|| format!("failed to compute {id} for {symbol}"))?;
                columns.push(signal.with_name(symbol.as_str()));
            }
            Some(Frame::from_series(columns)?)
        }
        None => None,
    };

    let frequency = config.portfolio.rebalance_frequency;
    let portfolio = PortfolioBacktester::new(prices, config.portfolio)?;
    let returns = portfolio.run(signals.as_ref())?;
    let report = AnalyticsEngine::new(config.metrics)?.calculate(&returns)?;

    tracing::info!(
        assets = frames.len(),
        rebalance = %frequency,
        periods = report.periods,
        "portfolio backtest complete"
    );
    let mode = args.factor.map_or_else(|| "static weights".to_string(), |id| id.to_string());
    let title = format!("portfolio ({} assets, {mode})", frames.len());
    print_report(&title, &report, args.json)
}

/// URLs go to the remote loader, anything else is a local path.
fn source_for(raw: &str) -> LoadSource {
    if raw.contains("://") {
        LoadSource::url(raw)
    } else {
        LoadSource::file(raw)
    }
}

/// Restricts every frame to the timestamps all of them share.
fn align_frames(frames: Vec<(String, OhlcvFrame)>) -> anyhow::Result<Vec<(String, OhlcvFrame)>> {
    let Some((_, first)) = frames.first() else {
        bail!("at least one --asset is required");
    };
    let mut shared: HashSet<Timestamp> = first.index().iter().copied().collect();
    for (_, frame) in &frames[1..] {
        let index: HashSet<Timestamp> = frame.index().iter().copied().collect();
        shared.retain(|ts| index.contains(ts));
    }
    if shared.is_empty() {
        bail!("the assets do not share any timestamps");
    }

    let mut aligned = Vec::with_capacity(frames.len());
    for (symbol, frame) in frames {
        if frame.len() == shared.len() {
            aligned.push((symbol, frame));
            continue;
        }
        let dropped = frame.len() - shared.len();
        tracing::warn!(symbol = %symbol, dropped, "dropping bars not shared by every asset");
        let bars = bars_at(&frame, &shared);
        aligned.push((symbol, OhlcvFrame::from_bars(bars)?));
    }
    Ok(aligned)
}

fn bars_at(frame: &OhlcvFrame, keep: &HashSet<Timestamp>) -> Vec<Bar> {
    let [open, high, low, close, volume] =
        OHLCV_FIELDS.map(|name| frame.field(name).unwrap_or_default());
    frame
        .index()
        .iter()
        .enumerate()
        .filter(|(_, ts)| keep.contains(*ts))
        .map(|(i, ts)| Bar {
            timestamp: *ts,
            open: open[i],
            high: high[i],
            low: low[i],
            close: close[i],
            volume: volume[i],
        })
        .collect()
}

// ==============================================================================
// Output
// ==============================================================================

fn print_report(title: &str, report: &PerformanceReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Metric", "Value"]);
    table.add_row(vec![Cell::new("Periods"), Cell::new(report.periods)]);
    table.add_row(vec![Cell::new("Total return"), Cell::new(percent(report.total_return))]);
    table.add_row(vec![Cell::new("Sharpe ratio"), Cell::new(ratio(report.sharpe_ratio))]);
    table.add_row(vec![Cell::new("Sortino ratio"), Cell::new(ratio(report.sortino_ratio))]);
    table.add_row(vec![Cell::new("Max drawdown"), Cell::new(percent(report.max_drawdown))]);

    println!("\n{title}");
    println!("{table}");
    Ok(())
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}%", v * 100.0))
}

fn ratio(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.3}"))
}

#[cfg(test)]
mod simulation_tests;
