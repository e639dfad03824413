//! Refresh Orchestrator
//!
//! Runs each stage in order and writes its file. A stage that fails or finds
//! no data is logged and recorded in the [`RunSummary`]; later stages still run.

use std::path::PathBuf;

use chrono::Local;
use tracing::{info, warn};

use crate::config::{Config, WorkbookSettings};
use crate::http::HttpClient;
use crate::nonprofit::SnapshotBuilder;
use crate::scorecard::collect_cost_records;
use crate::source_health::{render_status_file, AvailabilityProber};
use crate::storage;
use crate::types::StatusLine;
use crate::workbook::{SheetReader, WorkbookCollector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    NonprofitSnapshot,
    CollegeCosts,
    Workbooks,
    StatusReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputResult {
    Written { path: PathBuf, rows: usize },
    Skipped { reason: String },
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub outputs: Vec<(Output, OutputResult)>,
    pub status_lines: Vec<StatusLine>,
}

impl RunSummary {
    pub fn result(&self, output: Output) -> Option<&OutputResult> {
        self.outputs
            .iter()
            .find(|(o, _)| *o == output)
            .map(|(_, r)| r)
    }

    fn record(&mut self, output: Output, path: PathBuf, rows: usize, write: anyhow::Result<()>) {
        let result = match write {
            Ok(()) => {
                info!("Saved {} rows to {:?}", rows, path);
                OutputResult::Written { path, rows }
            }
            Err(e) => {
                warn!("Could not write {:?}: {:#}", path, e);
                OutputResult::Skipped {
                    reason: format!("{:#}", e),
                }
            }
        };
        self.outputs.push((output, result));
    }

    fn skip(&mut self, output: Output, reason: &str) {
        warn!("{}", reason);
        self.outputs.push((
            output,
            OutputResult::Skipped {
                reason: reason.to_string(),
            },
        ));
    }
}

pub struct Pipeline<'a> {
    client: &'a dyn HttpClient,
    reader: &'a dyn SheetReader,
    config: &'a Config,
}

impl<'a> Pipeline<'a> {
    pub fn new(client: &'a dyn HttpClient, reader: &'a dyn SheetReader, config: &'a Config) -> Self {
        Self {
            client,
            reader,
            config,
        }
    }

    pub fn run(&self) -> RunSummary {
        info!("--- Starting NJ college data refresh ---");
        let mut summary = RunSummary::default();
        self.nonprofit_snapshot(&mut summary);
        self.college_costs(&mut summary);
        self.workbooks(&mut summary);
        self.status_report(&mut summary);
        summary
    }

    fn nonprofit_snapshot(&self, summary: &mut RunSummary) {
        info!("Gathering Form 990 summaries for configured EINs...");
        if self.config.schools.is_empty() {
            summary.skip(Output::NonprofitSnapshot, "No EINs configured; skipping nonprofit snapshot.");
            return;
        }
        let run_date = Local::now().format("%Y-%m-%d").to_string();
        let rows = SnapshotBuilder::new(self.client, self.config).build(&run_date);
        let path = self.config.output_path(&self.config.nonprofit.output);
        let write = storage::save_rows(&path, &rows);
        summary.record(Output::NonprofitSnapshot, path, rows.len(), write);
    }

    fn college_costs(&self, summary: &mut RunSummary) {
        let rows = collect_cost_records(self.client, self.config);
        if rows.is_empty() {
            summary.skip(Output::CollegeCosts, "No college cost data captured; skipping CSV export.");
            return;
        }
        let path = self.config.output_path(&self.config.scorecard.output);
        let write = storage::save_rows(&path, &rows);
        summary.record(Output::CollegeCosts, path, rows.len(), write);
    }

    fn workbooks(&self, summary: &mut RunSummary) {
        let Some(settings) = &self.config.workbook else {
            return;
        };
        info!("Collecting cost workbooks for {:?}...", settings.years);
        // Relative staging dirs live under the output dir, like the exports
        let settings = WorkbookSettings {
            staging_dir: self.config.output_path(&settings.staging_dir),
            ..settings.clone()
        };
        let collector = WorkbookCollector::new(self.client, self.reader, &settings, &self.config.user_agent);
        let table = collector.collect();
        if table.is_empty() {
            summary.skip(Output::Workbooks, "No workbook data captured for any year; skipping export.");
            return;
        }
        let path = self.config.output_path(&settings.output);
        let write = storage::save_workbook_table(&path, &table);
        summary.record(Output::Workbooks, path, table.rows.len(), write);
    }

    fn status_report(&self, summary: &mut RunSummary) {
        let lines = AvailabilityProber::new(self.client, self.config).check_all();
        let path = self.config.output_path(&self.config.probe.output);
        let write = storage::save_text(&path, &render_status_file(&lines));
        summary.record(Output::StatusReport, path, lines.len(), write);
        summary.status_lines = lines;
    }
}
