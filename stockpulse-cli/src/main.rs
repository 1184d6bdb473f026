//! StockPulse CLI: scan a watchlist, look up a ticker, plan an allocation.
//!
//! Commands:
//! - `watchlist`: print the reference watchlist
//! - `scan`: rank tickers into bullish, caution and bearish tiers
//! - `lookup`: explain a single ticker
//! - `allocate`: scan, then split capital across volatility sleeves
//! - `fx`: print the exchange-rate factor applied to foreign prices

mod logging;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use stockpulse_core::config::PulseConfig;
use stockpulse_core::data::{
    CircuitBreaker, MarketDataFetcher, MarketDataProvider, SyntheticProvider, Watchlist,
    YahooProvider,
};
use stockpulse_core::fundamental::Indicator;
use stockpulse_core::Market;
use stockpulse_runner::export::{allocation_json, ranking_json, save_allocation, save_ranking};
use stockpulse_runner::{
    allocate, AllocationPlan, Lookup, LookupOutcome, LookupReport, PriceCurrency, RankedCandidate,
    RankingAggregator, RankingReport, RiskProfile, Sleeve, Tier,
};

#[derive(Parser)]
#[command(
    name = "stockpulse",
    about = "StockPulse: trend, quality and allocation dashboard for IBEX 35 and US equities"
)]
struct Cli {
    /// Path to a TOML config file. Defaults apply to anything it leaves out.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use seeded synthetic data instead of Yahoo Finance.
    #[arg(long, global = true, default_value_t = false)]
    synthetic: bool,

    /// Seed for --synthetic.
    #[arg(long, global = true, default_value_t = 42)]
    seed: u64,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the watchlist (reference table or config override).
    Watchlist,
    /// Rank tickers into bullish, caution and bearish tiers.
    Scan {
        /// Symbols to scan. Defaults to the whole watchlist.
        symbols: Vec<String>,

        #[arg(long, value_enum, default_value = "table")]
        format: Format,

        /// Also write ranking.csv and ranking.json into this directory.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Explain a single ticker, by symbol or company name.
    Lookup {
        #[arg(required = true)]
        query: Vec<String>,

        #[arg(long, value_enum, default_value = "table")]
        format: Format,
    },
    /// Scan the watchlist, then allocate capital across the bullish tier.
    Allocate {
        /// Capital to invest, in domestic currency.
        #[arg(long)]
        capital: f64,

        /// conservative, moderate or aggressive.
        #[arg(long, default_value = "moderate")]
        profile: RiskProfile,

        #[arg(long, value_enum, default_value = "table")]
        format: Format,

        /// Also write allocation.csv and allocation.json into this directory.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Print the exchange-rate factor for foreign prices.
    Fx,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let watchlist = Watchlist::from_config(config.watchlist.as_deref());

    // Only commands that touch market data build a provider.
    let connect = || build_provider(&config, cli.synthetic, cli.seed);

    match cli.command {
        Commands::Watchlist => {
            print_watchlist(&watchlist);
            Ok(())
        }
        Commands::Scan {
            symbols,
            format,
            csv,
        } => {
            let provider = connect()?;
            run_scan(
                provider.as_ref(),
                &config,
                &watchlist,
                &symbols,
                format,
                csv.as_deref(),
            )
        }
        Commands::Lookup { query, format } => {
            let provider = connect()?;
            run_lookup(provider.as_ref(), &config, &watchlist, &query.join(" "), format)
        }
        Commands::Allocate {
            capital,
            profile,
            format,
            csv,
        } => {
            let provider = connect()?;
            run_allocate(
                provider.as_ref(),
                &config,
                &watchlist,
                capital,
                profile,
                format,
                csv.as_deref(),
            )
        }
        Commands::Fx => {
            let provider = connect()?;
            let fetcher = MarketDataFetcher::new(provider.as_ref(), &config.provider);
            println!("{:.6}", fetcher.exchange_rate());
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<PulseConfig> {
    match path {
        Some(p) => PulseConfig::from_file(p)
            .with_context(|| format!("failed to load config {}", p.display())),
        None => Ok(PulseConfig::default()),
    }
}

fn build_provider(
    config: &PulseConfig,
    synthetic: bool,
    seed: u64,
) -> Result<Box<dyn MarketDataProvider>> {
    if synthetic {
        tracing::info!(seed, "using synthetic data");
        return Ok(Box::new(SyntheticProvider::new(seed)));
    }
    let breaker = Arc::new(CircuitBreaker::new(Duration::from_secs(
        config.provider.circuit_breaker_cooldown_secs,
    )));
    let provider = YahooProvider::new(breaker, &config.provider)?;
    Ok(Box::new(provider))
}

fn print_watchlist(watchlist: &Watchlist) {
    println!("{:<10} {:<26} {:<9}", "Symbol", "Name", "Market");
    println!("{}", "-".repeat(47));
    for t in watchlist.tickers() {
        println!("{:<10} {:<26} {:<9}", t.symbol, t.name, t.market.label());
    }
    println!();
    println!(
        "{} tickers: {} domestic, {} foreign",
        watchlist.len(),
        watchlist.count(Market::Domestic),
        watchlist.count(Market::Foreign)
    );
}

fn run_scan(
    provider: &dyn MarketDataProvider,
    config: &PulseConfig,
    watchlist: &Watchlist,
    symbols: &[String],
    format: Format,
    csv: Option<&Path>,
) -> Result<()> {
    let scope = if symbols.is_empty() {
        watchlist.clone()
    } else {
        Watchlist::from_symbols(symbols)
    };
    let report = RankingAggregator::new(provider, config).rank(scope.tickers());

    match format {
        Format::Json => println!("{}", ranking_json(&report)?),
        Format::Table => print_ranking(&report),
    }
    if let Some(dir) = csv {
        for path in save_ranking(&report, dir)? {
            eprintln!("Wrote {}", path.display());
        }
    }
    if report.no_data {
        bail!("no market data available for any requested ticker");
    }
    Ok(())
}

fn print_candidates(candidates: &[RankedCandidate]) {
    if candidates.is_empty() {
        println!("  (none)");
        return;
    }
    println!(
        "  {:<10} {:<24} {:>10} {:>7} {:>6}  {}",
        "Symbol", "Name", "Price", "Vol %", "Score", "Reason"
    );
    for c in candidates {
        println!(
            "  {:<10} {:<24} {:>10.2} {:>7.2} {:>6}  {}",
            c.ticker.symbol,
            c.ticker.name,
            c.price,
            c.volatility() * 100.0,
            c.score(),
            c.fundamentals.note.as_deref().unwrap_or(&c.verdict.reason),
        );
    }
}

fn print_ranking(report: &RankingReport) {
    if report.source.is_synthetic() {
        println!("** SYNTHETIC DATA: not real market prices **");
        println!();
    }
    for tier in Tier::ALL {
        println!("{} ({})", tier.label().to_uppercase(), report.tier(tier).len());
        print_candidates(report.tier(tier));
        println!();
    }
    if !report.skipped.is_empty() {
        println!("SKIPPED ({})", report.skipped.len());
        for s in &report.skipped {
            println!("  {:<10} {}", s.ticker.symbol, s.reason);
        }
        println!();
    }
    println!(
        "Scanned {}, ranked {}, skipped {}. FX factor {:.4}.",
        report.scanned,
        report.ranked(),
        report.skipped.len(),
        report.exchange_rate
    );
    if let Some(as_of) = report.as_of {
        println!("Prices as of {as_of}.");
    }
    println!("Fingerprint {}", &report.fingerprint[..16.min(report.fingerprint.len())]);
}

fn run_lookup(
    provider: &dyn MarketDataProvider,
    config: &PulseConfig,
    watchlist: &Watchlist,
    query: &str,
    format: Format,
) -> Result<()> {
    let outcome = Lookup::new(provider, config, watchlist).run(query)?;
    let report = match outcome {
        LookupOutcome::Found(report) => report,
        LookupOutcome::NoData { symbol } => bail!("no market data for {symbol}"),
    };
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Format::Table => print_lookup(&report),
    }
    Ok(())
}

fn print_lookup(report: &LookupReport) {
    println!("{}", report.ticker);
    let currency = match report.currency {
        PriceCurrency::Domestic => "EUR".to_string(),
        PriceCurrency::Converted { rate } => format!("EUR (converted at {rate:.4})"),
    };
    println!("  Price     {:.2} {currency}", report.price);
    println!("  Trend     {} ({})", report.verdict.state, report.verdict.reason);
    println!("  Score     {}/10", report.fundamentals.score);
    println!("  Verdict   {}", report.recommendation);
    println!();
    println!("{}", report.narrative);
    println!();
    for indicator in Indicator::ALL {
        if let Some(entry) = report.fundamentals.entry(indicator) {
            println!("  {:<16} {entry}", indicator.label());
        }
    }
    if let Some(r) = report.returns {
        println!();
        println!(
            "  Return {:+.1}% over {} sessions, daily risk {:.2}%",
            r.cumulative * 100.0,
            r.observations,
            r.risk * 100.0
        );
    }
    if report.source.is_synthetic() {
        println!();
        println!("** SYNTHETIC DATA: not real market prices **");
    }
}

#[allow(clippy::too_many_arguments)]
fn run_allocate(
    provider: &dyn MarketDataProvider,
    config: &PulseConfig,
    watchlist: &Watchlist,
    capital: f64,
    profile: RiskProfile,
    format: Format,
    csv: Option<&Path>,
) -> Result<()> {
    // Reject bad input before scanning the whole watchlist.
    stockpulse_core::domain::validate_capital(capital)?;

    let report = RankingAggregator::new(provider, config).rank(watchlist.tickers());
    if report.no_data {
        bail!("no market data available; cannot allocate");
    }
    let plan = allocate(capital, profile, &report.bullish, &config.allocation)?;

    match format {
        Format::Json => println!("{}", allocation_json(&plan)?),
        Format::Table => write_plan(&mut std::io::stdout().lock(), &plan)?,
    }
    if let Some(dir) = csv {
        for path in save_allocation(&plan, dir)? {
            eprintln!("Wrote {}", path.display());
        }
    }
    Ok(())
}

fn write_plan(out: &mut impl Write, plan: &AllocationPlan) -> std::io::Result<()> {
    writeln!(out, "Profile {} with {:.2} EUR", plan.profile, plan.capital)?;
    if plan.is_empty() {
        writeln!(out)?;
        writeln!(
            out,
            "No suitable allocation today: no candidate meets the selection criteria."
        )?;
    }
    for sleeve in Sleeve::ALL {
        let lines: Vec<_> = plan.lines_in(sleeve).collect();
        if lines.is_empty() {
            continue;
        }
        writeln!(out)?;
        writeln!(out, "{}", sleeve.label().to_uppercase())?;
        for l in lines {
            writeln!(
                out,
                "  {:<10} {:<24} {:>6} x {:>10.2} = {:>12.2}",
                l.ticker.symbol, l.ticker.name, l.shares, l.unit_price, l.line_total
            )?;
        }
    }
    let s = plan.summary();
    writeln!(out)?;
    writeln!(out, "Invested  {:>12.2}", s.invested)?;
    writeln!(out, "Cash      {:>12.2}", s.cash)?;
    writeln!(out, "Positions {:>12}", s.positions)?;
    if let Some(q) = s.average_quality {
        writeln!(out, "Quality   {q:>12.1}")?;
    }
    Ok(())
}
