use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use nj_school_data::config::{Config, WorkbookSettings};
use nj_school_data::http::BlockingClient;
use nj_school_data::pipeline::{OutputResult, Pipeline};
use nj_school_data::workbook::CalamineReader;

#[derive(Debug, Parser)]
#[command(
    name = "nj-school-data",
    about = "Refresh Form 990 and tuition/cost data for New Jersey schools"
)]
struct Args {
    /// YAML file overriding the built-in defaults
    #[arg(long, env = "NJ_SCHOOL_DATA_CONFIG")]
    config: Option<PathBuf>,
    /// Directory the output files are written to
    #[arg(long, env = "NJ_SCHOOL_DATA_OUTPUT")]
    output_dir: Option<PathBuf>,
    /// State filter for the College Scorecard catalog
    #[arg(long)]
    state: Option<String>,
    /// Year of the cost workbook to collect (repeatable)
    #[arg(long = "workbook-year")]
    workbook_years: Vec<i32>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    nj_school_data::init_tracing();
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if let Some(state) = args.state {
        config.scorecard.state = state.to_uppercase();
    }
    if !args.workbook_years.is_empty() {
        let workbook = config.workbook.get_or_insert_with(WorkbookSettings::default);
        anyhow::ensure!(
            !workbook.url_template.is_empty(),
            "--workbook-year needs a workbook url_template in the config file"
        );
        workbook.years = args.workbook_years;
    }

    let client = BlockingClient::new(&config.user_agent).context("Failed to build HTTP client")?;
    let summary = Pipeline::new(&client, &CalamineReader, &config).run();

    for (output, result) in &summary.outputs {
        match result {
            OutputResult::Written { path, rows } => info!(?output, rows, "wrote {}", path.display()),
            OutputResult::Skipped { reason } => info!(?output, "skipped: {}", reason),
        }
    }
    println!("{}", nj_school_data::source_health::render_report(&summary.status_lines));

    Ok(())
}
