use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::workbook::WorkbookTable;

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {:?}", parent))?;
    }
    Ok(())
}

/// Write rows as CSV; the header comes from the row type's field order
pub fn save_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to open {:?}", path))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write row to {:?}", path))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_workbook_table(path: &Path, table: &WorkbookTable) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to open {:?}", path))?;
    writer.write_record(table.header())?;
    for record in table.records() {
        writer
            .write_record(&record)
            .with_context(|| format!("Failed to write row to {:?}", path))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_text(path: &Path, content: &str) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CellValue, CostRecord, FilingSummary, NonprofitRow, SchoolRef};

    #[test]
    fn test_nonprofit_columns_in_fixed_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("finances.csv");
        let school = SchoolRef::new("Rider University", "210650678");
        let rows = vec![NonprofitRow::new(&school, FilingSummary::sentinel(), "2026-10-16")];

        save_rows(&path, &rows).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("School Name,Revenue,Expenses,Assets,Tax_Year,Last Updated,EIN,Filing_PDF")
        );
        assert_eq!(lines.next(), Some("Rider University,0,0,0,Error,2026-10-16,210650678,N/A"));
    }

    #[test]
    fn test_cost_record_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("costs.csv");
        let row = CostRecord {
            school_name: CellValue::text("Kean University"),
            admission_rate_pct: CellValue::Float(82.5),
            room_board_on_campus: CellValue::text("Room & Board, shared"),
            ..CostRecord::default()
        };

        save_rows(&path, &[row]).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("School Name,City,Website,Enrollment,Admission Rate (%)"));
        assert!(header.ends_with("IPEDS ID,OPE8 ID"));
        assert_eq!(header.split(',').count(), 19);
        assert_eq!(
            lines.next(),
            Some("Kean University,,,,82.5,,,,,,,\"Room & Board, shared\",,,,,,,")
        );
    }

    #[test]
    fn test_floats_render_alike_in_both_tables() {
        use crate::types::WorkbookRow;

        let dir = tempfile::tempdir().unwrap();
        let costs = dir.path().join("costs.csv");
        let row = CostRecord {
            tuition_in_state: CellValue::Float(1200.0),
            average_net_price: CellValue::Float(1200.25),
            ..CostRecord::default()
        };
        save_rows(&costs, &[row]).unwrap();
        let cost_line = fs::read_to_string(&costs).unwrap().lines().nth(1).unwrap().to_string();
        let cost_cells: Vec<&str> = cost_line.split(',').collect();
        assert_eq!(cost_cells[7], "1200.0");
        assert_eq!(cost_cells[10], "1200.25");

        let workbooks = dir.path().join("workbooks.csv");
        let mut table = WorkbookTable::default();
        table.extend(vec![WorkbookRow {
            year: 2024,
            sheet: "Tuition".to_string(),
            values: vec![
                ("Tuition".to_string(), CellValue::Float(1200.0)),
                ("Net Price".to_string(), CellValue::Float(1200.25)),
            ],
        }]);
        save_workbook_table(&workbooks, &table).unwrap();
        let content = fs::read_to_string(&workbooks).unwrap();
        assert_eq!(content.lines().nth(1), Some("2024,Tuition,1200.0,1200.25"));
    }

    #[test]
    fn test_save_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.txt");
        save_text(&path, "AVAILABLE: api").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "AVAILABLE: api");
    }
}
