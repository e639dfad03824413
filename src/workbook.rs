//! Yearly Workbook Collector
//!
//! Downloads one spreadsheet per requested year and keeps every sheet in it,
//! since the publisher moves categories between sheets from year to year.
//!
//! Per sheet:
//! - drop fully-empty rows and columns
//! - first surviving row is the header
//! - tag each data row with year and sheet name

use std::fs;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, DataType, Reader};
use chrono::NaiveTime;
use tracing::{info, warn};

use crate::config::WorkbookSettings;
use crate::error::WorkbookError;
use crate::http::{HttpClient, Request};
use crate::types::{CellValue, WorkbookRow};

pub const YEAR_COLUMN: &str = "Source Year";
pub const SHEET_COLUMN: &str = "Source Sheet";

/// A sheet as read from disk, before any cleanup
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    pub name: String,
    pub cells: Vec<Vec<CellValue>>,
}

pub trait SheetReader {
    fn read_sheets(&self, path: &Path) -> Result<Vec<RawSheet>, WorkbookError>;
}

/// Reads xlsx/xls/xlsb/ods, picked by file extension
#[derive(Debug, Clone, Copy, Default)]
pub struct CalamineReader;

/// Date cells become `%Y-%m-%d` (or ISO with a time part). A date that
/// cannot be converted keeps calamine's rendering of the raw value.
fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::DateTime(_) | Data::DateTimeIso(_) => match data.as_datetime() {
            Some(dt) if dt.time() == NaiveTime::MIN => {
                CellValue::Text(dt.format("%Y-%m-%d").to_string())
            }
            Some(dt) => CellValue::Text(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            None => CellValue::Text(data.to_string()),
        },
        other => CellValue::Text(other.to_string()),
    }
}

impl SheetReader for CalamineReader {
    fn read_sheets(&self, path: &Path) -> Result<Vec<RawSheet>, WorkbookError> {
        let mut workbook = open_workbook_auto(path)?;
        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&name)?;
            let cells: Vec<Vec<CellValue>> = range
                .rows()
                .map(|row| row.iter().map(cell_from_data).collect::<Vec<_>>())
                .collect();
            sheets.push(RawSheet { name, cells });
        }
        Ok(sheets)
    }
}

/// Drop rows and columns with no data, padding ragged rows first
pub fn trim_empty(cells: Vec<Vec<CellValue>>) -> Vec<Vec<CellValue>> {
    let width = cells.iter().map(Vec::len).max().unwrap_or(0);
    let rows: Vec<Vec<CellValue>> = cells
        .into_iter()
        .filter(|row| row.iter().any(|c| !c.is_blank()))
        .map(|mut row| {
            row.resize(width, CellValue::Empty);
            row
        })
        .collect();

    let keep: Vec<bool> = (0..width)
        .map(|col| rows.iter().any(|row| !row[col].is_blank()))
        .collect();

    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&keep)
                .filter(|(_, keep)| **keep)
                .map(|(cell, _)| cell)
                .collect()
        })
        .collect()
}

/// Header names with blanks filled in and repeats made unique
fn header_names(header: &[CellValue]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(header.len());
    for (i, cell) in header.iter().enumerate() {
        let base = match cell {
            c if c.is_blank() => format!("Column {}", i + 1),
            c => c.to_string().trim().to_string(),
        };
        let mut name = base.clone();
        let mut n = 1;
        while names.contains(&name) {
            name = format!("{}.{}", base, n);
            n += 1;
        }
        names.push(name);
    }
    names
}

/// Tagged data rows of one sheet; empty when the sheet holds no data
pub fn tag_sheet(year: i32, sheet: RawSheet) -> Vec<WorkbookRow> {
    let mut rows = trim_empty(sheet.cells).into_iter();
    let Some(header) = rows.next() else {
        return Vec::new();
    };
    let columns = header_names(&header);

    rows.map(|row| WorkbookRow {
        year,
        sheet: sheet.name.clone(),
        values: columns.iter().cloned().zip(row).collect(),
    })
    .collect()
}

/// Concatenated rows of every year, with the union of their columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkbookTable {
    pub columns: Vec<String>,
    pub rows: Vec<WorkbookRow>,
}

impl WorkbookTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn extend(&mut self, rows: Vec<WorkbookRow>) {
        for row in &rows {
            for (name, _) in &row.values {
                if !self.columns.contains(name) {
                    self.columns.push(name.clone());
                }
            }
        }
        self.rows.extend(rows);
    }

    /// Header line: tag columns first, then data columns
    pub fn header(&self) -> Vec<String> {
        let mut header = vec![YEAR_COLUMN.to_string(), SHEET_COLUMN.to_string()];
        header.extend(self.columns.iter().cloned());
        header
    }

    /// Records aligned to [`WorkbookTable::header`]
    pub fn records(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.rows.iter().map(|row| {
            let mut record = vec![row.year.to_string(), row.sheet.clone()];
            record.extend(
                self.columns
                    .iter()
                    .map(|c| row.get(c).map(|v| v.to_string()).unwrap_or_default()),
            );
            record
        })
    }
}

pub struct WorkbookCollector<'a> {
    client: &'a dyn HttpClient,
    reader: &'a dyn SheetReader,
    settings: &'a WorkbookSettings,
    user_agent: &'a str,
}

impl<'a> WorkbookCollector<'a> {
    pub fn new(
        client: &'a dyn HttpClient,
        reader: &'a dyn SheetReader,
        settings: &'a WorkbookSettings,
        user_agent: &'a str,
    ) -> Self {
        Self {
            client,
            reader,
            settings,
            user_agent,
        }
    }

    /// Local file for a year's download, keeping the remote extension
    fn staging_path(&self, year: i32, url: &str) -> PathBuf {
        let file_name = url
            .split(['?', '#'])
            .next()
            .and_then(|u| u.rsplit('/').next())
            .unwrap_or_default();
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("xlsx");
        self.settings
            .staging_dir
            .join(format!("workbook_{}.{}", year, extension))
    }

    fn download(&self, year: i32) -> Result<PathBuf, WorkbookError> {
        let url = self.settings.url_for(year);
        let request = Request::new(&url)
            .header("User-Agent", self.user_agent)
            .timeout(self.settings.timeout());
        let bytes = self.client.get_bytes(&request)?;

        fs::create_dir_all(&self.settings.staging_dir)?;
        let path = self.staging_path(year, &url);
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// All tagged rows for one year
    pub fn collect_year(&self, year: i32) -> Result<Vec<WorkbookRow>, WorkbookError> {
        let path = self.download(year)?;
        let sheets = self.reader.read_sheets(&path)?;
        Ok(sheets
            .into_iter()
            .flat_map(|sheet| tag_sheet(year, sheet))
            .collect())
    }

    /// Every configured year; failed years are logged and skipped
    pub fn collect(&self) -> WorkbookTable {
        let mut table = WorkbookTable::default();
        for &year in &self.settings.years {
            match self.collect_year(year) {
                Ok(rows) => {
                    info!("Workbook {}: {} rows", year, rows.len());
                    table.extend(rows);
                }
                Err(e) => warn!("Skipping workbook for {}: {}", year, e),
            }
        }
        table
    }
}
