//! End-to-end refresh against faked upstream services

mod common;

use std::fs;
use std::path::Path;

use common::{TuitionWorkbook, Upstream};
use nj_school_data::config::{Config, WorkbookSettings};
use nj_school_data::pipeline::{Output, OutputResult, Pipeline};
use nj_school_data::types::Availability;

fn config(dir: &Path, workbook: bool) -> Config {
    Config {
        output_dir: dir.to_path_buf(),
        workbook: workbook.then(|| WorkbookSettings {
            url_template: "https://example.org/tuition_{year}.xlsx".to_string(),
            years: vec![2023, 2024],
            staging_dir: dir.join("staging"),
            ..WorkbookSettings::default()
        }),
        ..Config::default()
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_full_refresh_writes_every_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), true);
    let upstream = Upstream::default();

    let summary = Pipeline::new(&upstream, &TuitionWorkbook, &config).run();

    // One row per configured school, failures included
    let finances = read_lines(&dir.path().join("nj_school_finances.csv"));
    assert_eq!(finances.len(), 1 + config.schools.len());
    assert!(finances[1].starts_with("Princeton University,3000000000,2000000000,40000000000,2023,"));
    assert!(finances[1].ends_with(",210634501,https://example.org/princeton.pdf"));
    assert!(finances[2].contains(",0,0,0,Error,"));

    let costs = read_lines(&dir.path().join("nj_college_costs.csv"));
    assert_eq!(costs.len(), 4);
    assert!(costs[1].starts_with("New Jersey Institute of Technology,"));
    assert!(costs[2].starts_with("Princeton University,,,,4.38,"));
    assert!(costs[3].starts_with("Rutgers University-New Brunswick,"));

    let workbooks = read_lines(&dir.path().join("nj_tuition_workbooks.csv"));
    assert_eq!(workbooks[0], "Source Year,Source Sheet,Institution,Tuition & Fees");
    assert_eq!(workbooks.len(), 5);
    assert_eq!(workbooks[1], "2023,Senior Public,Rutgers,17239");
    assert_eq!(workbooks[4], "2024,Senior Public,Montclair,14318");

    let status = fs::read_to_string(dir.path().join("public_data_status.txt")).unwrap();
    assert!(status.starts_with("Last Checked: "));
    assert!(status.contains("AVAILABLE: College Scorecard API (cost + admissions)"));
    assert!(status.contains("AVAILABLE: ProPublica Nonprofit Explorer API"));
    assert!(status.contains("AVAILABLE: https://example.org/tuition_2024.xlsx"));

    assert_eq!(summary.outputs.len(), 4);
    assert_eq!(summary.status_lines.len(), 4);
    assert!(matches!(
        summary.result(Output::CollegeCosts),
        Some(OutputResult::Written { rows: 3, .. })
    ));
}

#[test]
fn test_outages_degrade_without_stopping_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), true);
    let upstream = Upstream {
        scorecard_down: true,
        propublica_down: true,
        workbooks_down: true,
        ..Upstream::default()
    };

    let summary = Pipeline::new(&upstream, &TuitionWorkbook, &config).run();

    // Snapshot still has every school, all sentinel rows
    let finances = read_lines(&dir.path().join("nj_school_finances.csv"));
    assert_eq!(finances.len(), 1 + config.schools.len());
    assert!(finances[1..].iter().all(|row| row.contains(",0,0,0,Error,")));

    assert!(!dir.path().join("nj_college_costs.csv").exists());
    assert!(!dir.path().join("nj_tuition_workbooks.csv").exists());
    assert!(matches!(
        summary.result(Output::CollegeCosts),
        Some(OutputResult::Skipped { .. })
    ));
    assert!(matches!(
        summary.result(Output::Workbooks),
        Some(OutputResult::Skipped { .. })
    ));

    let statuses: Vec<Availability> = summary.status_lines.iter().map(|l| l.status).collect();
    assert_eq!(
        statuses,
        vec![
            Availability::Unavailable,
            Availability::Error,
            Availability::NotReleased,
            Availability::NotReleased,
        ]
    );
    assert!(dir.path().join("public_data_status.txt").exists());
}

#[test]
fn test_workbook_feed_off_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), false);
    let upstream = Upstream::default();

    let summary = Pipeline::new(&upstream, &TuitionWorkbook, &config).run();

    assert!(summary.result(Output::Workbooks).is_none());
    assert_eq!(summary.status_lines.len(), 2);
    assert!(!upstream
        .requests
        .borrow()
        .iter()
        .any(|url| url.contains("tuition_")));
}

#[test]
fn test_relative_staging_dir_lands_under_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path(), true);
    if let Some(workbook) = config.workbook.as_mut() {
        workbook.staging_dir = "staging".into();
    }
    let upstream = Upstream::default();

    let summary = Pipeline::new(&upstream, &TuitionWorkbook, &config).run();

    assert!(matches!(
        summary.result(Output::Workbooks),
        Some(OutputResult::Written { rows: 4, .. })
    ));
    assert!(dir.path().join("staging").join("workbook_2023.xlsx").exists());
    assert!(dir.path().join("staging").join("workbook_2024.xlsx").exists());
}
