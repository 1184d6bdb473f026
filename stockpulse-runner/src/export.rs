//! Report export: JSON and CSV artifacts.
//!
//! - **JSON**: full ranking report or allocation plan with a schema version
//! - **CSV**: one row per ranked candidate, or one row per allocation line
//!
//! Persisted JSON carries a `schema_version`; newer versions are rejected on
//! load.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockpulse_core::fundamental::Indicator;

use crate::allocation::AllocationPlan;
use crate::ranking::{RankingReport, Tier};

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("unsupported schema version {found} (max supported: {max})")]
    UnsupportedSchema { found: u32, max: u32 },
}

/// A versioned JSON envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact<T> {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(flatten)]
    pub body: T,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn ranking_json(report: &RankingReport) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(&Artifact {
        schema_version: SCHEMA_VERSION,
        body: report,
    })?)
}

pub fn allocation_json(plan: &AllocationPlan) -> Result<String, ExportError> {
    let summary = plan.summary();
    Ok(serde_json::to_string_pretty(&Artifact {
        schema_version: SCHEMA_VERSION,
        body: serde_json::json!({ "plan": plan, "summary": summary }),
    })?)
}

/// Load a ranking report, rejecting unknown schema versions.
pub fn import_ranking_json(json: &str) -> Result<RankingReport, ExportError> {
    let artifact: Artifact<RankingReport> = serde_json::from_str(json)?;
    if artifact.schema_version > SCHEMA_VERSION {
        return Err(ExportError::UnsupportedSchema {
            found: artifact.schema_version,
            max: SCHEMA_VERSION,
        });
    }
    Ok(artifact.body)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Ranked candidates, tier by tier, in report order.
///
/// Columns: tier, rank, symbol, name, market, state, reason, price,
/// native_price, volatility, score, valuation, debt, profitability,
/// dividend, growth, note
pub fn ranking_csv(report: &RankingReport) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "tier",
        "rank",
        "symbol",
        "name",
        "market",
        "state",
        "reason",
        "price",
        "native_price",
        "volatility",
        "score",
        "valuation",
        "debt",
        "profitability",
        "dividend",
        "growth",
        "note",
    ])?;

    for tier in Tier::ALL {
        for (i, c) in report.tier(tier).iter().enumerate() {
            let rating = |ind: Indicator| {
                c.fundamentals
                    .entry(ind)
                    .map(|e| e.to_string())
                    .unwrap_or_default()
            };
            let row: [&str; 17] = [
                tier.label(),
                &(i + 1).to_string(),
                &c.ticker.symbol,
                &c.ticker.name,
                c.ticker.market.label(),
                c.verdict.state.label(),
                &c.verdict.reason,
                &format!("{:.4}", c.price),
                &format!("{:.4}", c.native_price()),
                &format!("{:.6}", c.volatility()),
                &c.score().to_string(),
                &rating(Indicator::Valuation),
                &rating(Indicator::Debt),
                &rating(Indicator::Profitability),
                &rating(Indicator::Dividend),
                &rating(Indicator::Growth),
                c.fundamentals.note.as_deref().unwrap_or(""),
            ];
            wtr.write_record(row)?;
        }
    }

    let data = wtr
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8(data)?)
}

/// Columns: sleeve, symbol, name, unit_price, shares, line_total, score,
/// volatility
pub fn allocation_csv(plan: &AllocationPlan) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "sleeve",
        "symbol",
        "name",
        "unit_price",
        "shares",
        "line_total",
        "score",
        "volatility",
    ])?;
    for l in &plan.lines {
        let row: [&str; 8] = [
            l.sleeve.label(),
            &l.ticker.symbol,
            &l.ticker.name,
            &format!("{:.4}", l.unit_price),
            &l.shares.to_string(),
            &format!("{:.2}", l.line_total),
            &l.score.to_string(),
            &format!("{:.6}", l.volatility),
        ];
        wtr.write_record(row)?;
    }
    let data = wtr
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8(data)?)
}

// ─── Artifact bundle ────────────────────────────────────────────────

fn write(path: PathBuf, contents: &str) -> Result<PathBuf, ExportError> {
    std::fs::write(&path, contents).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

fn ensure_dir(dir: &Path) -> Result<(), ExportError> {
    std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

/// Write `ranking.csv` and `ranking.json` under `dir`.
pub fn save_ranking(report: &RankingReport, dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
    ensure_dir(dir)?;
    Ok(vec![
        write(dir.join("ranking.csv"), &ranking_csv(report)?)?,
        write(dir.join("ranking.json"), &ranking_json(report)?)?,
    ])
}

/// Write `allocation.csv` and `allocation.json` under `dir`.
pub fn save_allocation(plan: &AllocationPlan, dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
    ensure_dir(dir)?;
    Ok(vec![
        write(dir.join("allocation.csv"), &allocation_csv(plan)?)?,
        write(dir.join("allocation.json"), &allocation_json(plan)?)?,
    ])
}
