//! Paged Listing Fetcher
//!
//! Walks a `page`/`per_page` listing until the upstream runs out of records.
//! Stops when:
//! - the page count computed from `metadata.total` is reached
//! - a page is short and no total was ever reported
//! - a page comes back empty
//! - a request fails (records gathered so far are kept)

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::http::{HttpClient, Request};

/// Description of one paged listing
#[derive(Debug, Clone)]
pub struct PagedQuery<'a> {
    pub endpoint: &'a str,
    /// Filter parameter, e.g. `("school.state", "NJ")`
    pub filter: (&'a str, &'a str),
    pub fields: &'a [String],
    pub page_size: u32,
    pub api_key: &'a str,
    pub timeout: Duration,
}

impl PagedQuery<'_> {
    fn request(&self, page: u64, per_page: u64) -> Request {
        Request::new(self.endpoint)
            .query(self.filter.0, self.filter.1)
            .query("per_page", per_page)
            .query("page", page)
            .query("fields", self.fields.join(","))
            .query("api_key", self.api_key)
            .timeout(self.timeout)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PagedFetch {
    pub records: Vec<Value>,
    pub requests: u64,
    /// Set when a failed request cut pagination short
    pub error: Option<FetchError>,
}

impl PagedFetch {
    pub fn is_partial(&self) -> bool {
        self.error.is_some()
    }
}

fn positive(value: Option<&Value>) -> Option<u64> {
    value.and_then(Value::as_u64).filter(|n| *n > 0)
}

pub fn fetch_all_pages(client: &dyn HttpClient, query: &PagedQuery<'_>) -> PagedFetch {
    let mut fetch = PagedFetch::default();
    let mut page: u64 = 0;
    let mut per_page = u64::from(query.page_size.max(1));
    let mut total_pages: Option<u64> = None;

    loop {
        fetch.requests += 1;
        let payload = match client.get_json(&query.request(page, per_page)) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(page, error = %e, "Failed to fetch page from {}", query.endpoint);
                fetch.error = Some(e);
                break;
            }
        };

        let page_records = payload
            .get("results")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        if page_records.is_empty() {
            break;
        }
        let received = page_records.len() as u64;
        fetch.records.extend(page_records);

        let metadata = payload.get("metadata");
        let total = positive(metadata.and_then(|m| m.get("total")));
        per_page = positive(metadata.and_then(|m| m.get("per_page"))).unwrap_or(per_page);
        if total_pages.is_none() {
            total_pages = total.map(|t| t.div_ceil(per_page));
        }
        debug!(page, received, ?total_pages, "Fetched page");

        page += 1;
        match total_pages {
            Some(pages) if page >= pages => break,
            None if received < per_page => break,
            _ => {}
        }
    }

    fetch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::fake::FakeClient;
    use serde_json::json;

    fn fields() -> Vec<String> {
        vec!["id".to_string(), "school.name".to_string()]
    }

    fn query(fields: &[String]) -> PagedQuery<'_> {
        PagedQuery {
            endpoint: "https://api.example.org/schools",
            filter: ("school.state", "NJ"),
            fields,
            page_size: 100,
            api_key: "DEMO_KEY",
            timeout: Duration::from_secs(20),
        }
    }

    fn records(start: u64, count: u64) -> Vec<Value> {
        (start..start + count).map(|id| json!({ "id": id })).collect()
    }

    /// Serves `total` records in pages of `per_page`
    fn paged_source(total: u64, per_page: u64, report_total: bool) -> FakeClient {
        FakeClient::new(move |_, request| {
            let page: u64 = request.param("page").unwrap().parse().unwrap();
            let start = page * per_page;
            let count = total.saturating_sub(start).min(per_page);
            let mut body = json!({ "results": records(start, count) });
            if report_total {
                body["metadata"] = json!({ "total": total, "per_page": per_page, "page": page });
            }
            Ok(body)
        })
    }

    #[test]
    fn test_three_pages_with_total() {
        let fields = fields();
        let client = paged_source(250, 100, true);

        let fetch = fetch_all_pages(&client, &query(&fields));
        assert_eq!(fetch.records.len(), 250);
        assert_eq!(fetch.requests, 3);
        assert_eq!(client.call_count(), 3);
        assert!(!fetch.is_partial());
        assert_eq!(fetch.records[249]["id"], 249);
    }

    #[test]
    fn test_short_first_page_without_total_stops() {
        let fields = fields();
        let client = paged_source(40, 100, false);

        let fetch = fetch_all_pages(&client, &query(&fields));
        assert_eq!(fetch.records.len(), 40);
        assert_eq!(fetch.requests, 1);
    }

    #[test]
    fn test_without_total_stops_on_empty_page() {
        let fields = fields();
        let client = paged_source(200, 100, false);

        let fetch = fetch_all_pages(&client, &query(&fields));
        assert_eq!(fetch.records.len(), 200);
        // Two full pages, then an empty one
        assert_eq!(fetch.requests, 3);
    }

    #[test]
    fn test_upstream_page_size_overrides_requested() {
        let fields = fields();
        let client = paged_source(120, 50, true);

        let fetch = fetch_all_pages(&client, &query(&fields));
        assert_eq!(fetch.records.len(), 120);
        assert_eq!(fetch.requests, 3);
        let calls = client.calls.borrow();
        assert_eq!(calls[0].1.param("per_page"), Some("100"));
        assert_eq!(calls[1].1.param("per_page"), Some("50"));
    }

    #[test]
    fn test_failure_keeps_partial_results() {
        let fields = fields();
        let client = FakeClient::new(|_, request| match request.param("page") {
            Some("0") => Ok(json!({
                "results": records(0, 100),
                "metadata": { "total": 300, "per_page": 100 }
            })),
            _ => Err(FetchError::Status(503)),
        });

        let fetch = fetch_all_pages(&client, &query(&fields));
        assert_eq!(fetch.records.len(), 100);
        assert_eq!(fetch.requests, 2);
        assert_eq!(fetch.error, Some(FetchError::Status(503)));
    }

    #[test]
    fn test_request_carries_filter_fields_and_key() {
        let fields = fields();
        let client = paged_source(1, 100, true);
        fetch_all_pages(&client, &query(&fields));

        let calls = client.calls.borrow();
        let request = &calls[0].1;
        assert_eq!(request.url, "https://api.example.org/schools");
        assert_eq!(request.param("school.state"), Some("NJ"));
        assert_eq!(request.param("fields"), Some("id,school.name"));
        assert_eq!(request.param("api_key"), Some("DEMO_KEY"));
        assert_eq!(request.param("page"), Some("0"));
    }
}
