//! Source Availability Binary
//!
//! Checks every upstream the refresh depends on and prints the report,
//! without fetching or writing any data.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use nj_school_data::config::Config;
use nj_school_data::http::BlockingClient;
use nj_school_data::source_health::{render_report, AvailabilityProber};
use nj_school_data::types::Availability;

#[derive(Debug, Parser)]
#[command(name = "check_sources", about = "Report which upstream data sources are reachable")]
struct Args {
    /// YAML file overriding the built-in defaults
    #[arg(long, env = "NJ_SCHOOL_DATA_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    nj_school_data::init_tracing();
    let args = Args::parse();

    let config = Config::load(args.config.as_deref())?;
    let client = BlockingClient::new(&config.user_agent).context("Failed to build HTTP client")?;

    println!("=== Source Availability ===");
    let lines = AvailabilityProber::new(&client, &config).check_all();
    println!("{}", render_report(&lines));

    let available = lines
        .iter()
        .filter(|l| l.status == Availability::Available)
        .count();
    println!("\n{}/{} sources available", available, lines.len());

    Ok(())
}
