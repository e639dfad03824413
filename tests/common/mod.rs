use std::cell::RefCell;
use std::path::Path;

use nj_school_data::error::{FetchError, WorkbookError};
use nj_school_data::http::{HttpClient, Method, Request};
use nj_school_data::workbook::{RawSheet, SheetReader};
use serde_json::{json, Value};

/// Stand-in for the three upstream services, with switches to take each down
#[derive(Default)]
pub struct Upstream {
    pub scorecard_down: bool,
    pub propublica_down: bool,
    pub workbooks_down: bool,
    pub requests: RefCell<Vec<String>>,
}

impl Upstream {
    fn scorecard_page(&self, request: &Request) -> Result<Value, FetchError> {
        if self.scorecard_down {
            return Err(FetchError::Status(503));
        }
        let page = request.param("page").unwrap_or("0");
        let results = match page {
            "0" => json!([
                {"id": 186131, "school.name": "Princeton University", "latest.admissions.admission_rate.overall": 0.0438},
                {"id": 186380, "school.name": "Rutgers University-New Brunswick", "latest.cost.tuition.in_state": 17239.4}
            ]),
            "1" => json!([
                {"id": 185828, "school.name": "New Jersey Institute of Technology"}
            ]),
            _ => json!([]),
        };
        Ok(json!({"metadata": {"total": 3, "per_page": 2}, "results": results}))
    }

    fn filings(&self, request: &Request) -> Result<Value, FetchError> {
        if self.propublica_down {
            return Err(FetchError::Transport("connection reset".to_string()));
        }
        if request.url.contains("210634501") {
            Ok(json!({"filings_with_data": [{
                "tax_prd_yr": 2023, "totrevenue": 3_000_000_000_i64,
                "totfuncexpns": 2_000_000_000_i64, "totassetsend": 40_000_000_000_i64,
                "pdf_url": "https://example.org/princeton.pdf"
            }]}))
        } else {
            Err(FetchError::Status(404))
        }
    }
}

impl HttpClient for Upstream {
    fn get_json(&self, request: &Request) -> Result<Value, FetchError> {
        self.requests.borrow_mut().push(request.url.clone());
        if request.url.contains("collegescorecard") {
            self.scorecard_page(request)
        } else {
            self.filings(request)
        }
    }

    fn get_bytes(&self, request: &Request) -> Result<Vec<u8>, FetchError> {
        self.requests.borrow_mut().push(request.url.clone());
        if self.workbooks_down {
            return Err(FetchError::Timeout("30s".to_string()));
        }
        Ok(b"PK\x03\x04".to_vec())
    }

    fn status(&self, _method: Method, request: &Request) -> Result<u16, FetchError> {
        self.requests.borrow_mut().push(request.url.clone());
        if request.url.contains("collegescorecard") && self.scorecard_down {
            return Ok(503);
        }
        if request.url.contains("propublica") && self.propublica_down {
            return Err(FetchError::Transport("connection reset".to_string()));
        }
        if self.workbooks_down && request.url.contains("tuition_") {
            return Ok(404);
        }
        Ok(200)
    }
}

/// Two sheets: an empty cover sheet and a tuition table
pub struct TuitionWorkbook;

impl SheetReader for TuitionWorkbook {
    fn read_sheets(&self, _path: &Path) -> Result<Vec<RawSheet>, WorkbookError> {
        use nj_school_data::types::CellValue::{Empty, Int, Text};
        Ok(vec![
            RawSheet {
                name: "Cover".to_string(),
                cells: vec![vec![Empty, Empty], vec![Empty, Empty]],
            },
            RawSheet {
                name: "Senior Public".to_string(),
                cells: vec![
                    vec![Text("Institution".to_string()), Text("Tuition & Fees".to_string())],
                    vec![Text("Rutgers".to_string()), Int(17239)],
                    vec![Text("Montclair".to_string()), Int(14318)],
                ],
            },
        ])
    }
}
