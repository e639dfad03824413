//! Nonprofit Snapshot Module
//!
//! One Form 990 lookup per configured school. A failed lookup still yields
//! a row (see [`FilingSummary::sentinel`]) so the table always has one row
//! per school.

use serde_json::Value;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::FetchError;
use crate::http::{HttpClient, Request};
use crate::types::{CellValue, FilingSummary, NonprofitRow, SchoolRef};

/// Why a lookup produced no summary
#[derive(Debug, Clone, PartialEq)]
pub enum LookupFailure {
    Fetch(FetchError),
    NoFilings,
}

impl std::fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupFailure::Fetch(e) => write!(f, "{}", e),
            LookupFailure::NoFilings => write!(f, "no filings with data"),
        }
    }
}

/// Tax period of a filing: `tax_prd` (YYYYMM) or `tax_prd_yr` scaled to match
fn tax_period(filing: &Value) -> Option<i64> {
    let as_int = |v: &Value| v.as_i64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()));
    filing
        .get("tax_prd")
        .and_then(as_int)
        .or_else(|| filing.get("tax_prd_yr").and_then(as_int).map(|y| y * 100))
}

/// Most recent filing. Ties and undated entries keep list order, so a list
/// that is already newest-first yields its first entry.
pub fn latest_filing(filings: &[Value]) -> Option<&Value> {
    let mut best: Option<(&Value, Option<i64>)> = None;
    for filing in filings {
        let period = tax_period(filing);
        match best {
            Some((_, best_period)) if period <= best_period => {}
            _ => best = Some((filing, period)),
        }
    }
    best.map(|(filing, _)| filing)
}

fn field_or(filing: &Value, key: &str, default: CellValue) -> CellValue {
    match filing.get(key) {
        Some(value) => CellValue::from_json(value),
        None => default,
    }
}

/// Summary of the newest filing in an organization payload
pub fn summarize_filings(payload: &Value) -> Option<FilingSummary> {
    let filings = payload.get("filings_with_data")?.as_array()?;
    let latest = latest_filing(filings)?;
    Some(FilingSummary {
        revenue: field_or(latest, "totrevenue", CellValue::Int(0)),
        expenses: field_or(latest, "totfuncexpns", CellValue::Int(0)),
        assets: field_or(latest, "totassetsend", CellValue::Int(0)),
        tax_year: field_or(latest, "tax_prd_yr", CellValue::text("N/A")),
        filing_pdf: field_or(latest, "pdf_url", CellValue::text("N/A")),
    })
}

pub struct SnapshotBuilder<'a> {
    client: &'a dyn HttpClient,
    config: &'a Config,
}

impl<'a> SnapshotBuilder<'a> {
    pub fn new(client: &'a dyn HttpClient, config: &'a Config) -> Self {
        Self { client, config }
    }

    pub fn fetch_filing(&self, ein: &str) -> Result<FilingSummary, LookupFailure> {
        let request = Request::new(self.config.nonprofit.url_for(ein))
            .header("User-Agent", &self.config.user_agent)
            .timeout(self.config.nonprofit.timeout());
        let payload = self.client.get_json(&request).map_err(LookupFailure::Fetch)?;
        summarize_filings(&payload).ok_or(LookupFailure::NoFilings)
    }

    /// Exactly one row per configured school, in configuration order
    pub fn build(&self, run_date: &str) -> Vec<NonprofitRow> {
        self.config
            .schools
            .iter()
            .map(|school| self.build_row(school, run_date))
            .collect()
    }

    fn build_row(&self, school: &SchoolRef, run_date: &str) -> NonprofitRow {
        info!("  - {}", school.name);
        let summary = match self.fetch_filing(&school.ein) {
            Ok(summary) => summary,
            Err(e) => {
                warn!(ein = %school.ein, "Error fetching filings for {}: {}", school.name, e);
                FilingSummary::sentinel()
            }
        };
        NonprofitRow::new(school, summary, run_date)
    }
}
