//! Source Availability Module
//!
//! Cheap existence checks against every upstream the refresh depends on.
//! Each check yields exactly one [`StatusLine`]; nothing here fails.
//!
//! Classification:
//! - 2xx: AVAILABLE
//! - 404/410: NOT-RELEASED (e.g. next year's workbook not published yet)
//! - other HTTP codes: UNAVAILABLE
//! - transport failures: ERROR

use chrono::Local;

use crate::config::Config;
use crate::error::FetchError;
use crate::http::{HttpClient, Method, Request};
use crate::types::{Availability, StatusLine};

pub const SCORECARD_LABEL: &str = "College Scorecard API (cost + admissions)";
pub const NONPROFIT_LABEL: &str = "ProPublica Nonprofit Explorer API";

fn classify_http_status(status_code: u16) -> (Availability, Option<String>) {
    match status_code {
        200..=299 => (Availability::Available, None),
        404 | 410 => (Availability::NotReleased, Some(format!("Status {}", status_code))),
        _ => (Availability::Unavailable, Some(format!("Status {}", status_code))),
    }
}

/// Turn the outcome of a probe into a report line
pub fn classify(label: &str, outcome: Result<u16, FetchError>) -> StatusLine {
    let (status, detail) = match outcome {
        Ok(code) => classify_http_status(code),
        Err(FetchError::Status(code)) => classify_http_status(code),
        Err(e) => (Availability::Error, Some(e.to_string())),
    };
    StatusLine {
        label: label.to_string(),
        status,
        detail,
    }
}

/// Servers that refuse HEAD get a second chance with GET
fn should_fallback_to_get(status_code: u16) -> bool {
    matches!(status_code, 403 | 405 | 501)
}

pub struct AvailabilityProber<'a> {
    client: &'a dyn HttpClient,
    config: &'a Config,
}

impl<'a> AvailabilityProber<'a> {
    pub fn new(client: &'a dyn HttpClient, config: &'a Config) -> Self {
        Self { client, config }
    }

    /// Minimal one-record page from the catalog
    pub fn check_scorecard(&self) -> StatusLine {
        let settings = &self.config.scorecard;
        let request = Request::new(&settings.endpoint)
            .query("school.state", &settings.state)
            .query("per_page", 1)
            .query("page", 0)
            .query("fields", "id")
            .query("api_key", &self.config.api_key.value)
            .timeout(self.config.probe.timeout());
        classify(SCORECARD_LABEL, self.client.status(Method::Get, &request))
    }

    /// Lookup of the first configured school
    pub fn check_nonprofit(&self) -> Option<StatusLine> {
        let school = self.config.schools.first()?;
        let request = Request::new(self.config.nonprofit.url_for(&school.ein))
            .header("User-Agent", &self.config.user_agent)
            .timeout(self.config.probe.timeout());
        Some(classify(NONPROFIT_LABEL, self.client.status(Method::Get, &request)))
    }

    /// HEAD the URL, retrying as GET when HEAD is refused
    pub fn check_url(&self, url: &str) -> StatusLine {
        let request = Request::new(url)
            .header("User-Agent", &self.config.user_agent)
            .timeout(self.config.probe.timeout());
        let outcome = match self.client.status(Method::Head, &request) {
            Ok(code) if should_fallback_to_get(code) => self.client.status(Method::Get, &request),
            other => other,
        };
        classify(url, outcome)
    }

    /// One line per checked resource, in a fixed order
    pub fn check_all(&self) -> Vec<StatusLine> {
        let mut lines = vec![self.check_scorecard()];
        lines.extend(self.check_nonprofit());
        if let Some(workbook) = &self.config.workbook {
            for &year in &workbook.years {
                lines.push(self.check_url(&workbook.url_for(year)));
            }
        }
        lines
    }
}

pub fn render_report(lines: &[StatusLine]) -> String {
    lines
        .iter()
        .map(|line| line.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Report body with the `Last Checked` header
pub fn render_status_file(lines: &[StatusLine]) -> String {
    format!(
        "Last Checked: {}\n\n{}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        render_report(lines)
    )
}
