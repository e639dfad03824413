//! College Scorecard cost collection: every institution in the configured
//! state, normalized into the student cost table.

use tracing::{info, warn};

use crate::config::Config;
use crate::http::HttpClient;
use crate::normalize::normalize_scorecard_rows;
use crate::paginate::{fetch_all_pages, PagedQuery};
use crate::types::CostRecord;

pub fn collect_cost_records(client: &dyn HttpClient, config: &Config) -> Vec<CostRecord> {
    let settings = &config.scorecard;
    info!("Fetching College Scorecard cost data for {} institutions...", settings.state);

    let query = PagedQuery {
        endpoint: &settings.endpoint,
        filter: ("school.state", settings.state.as_str()),
        fields: &settings.fields,
        page_size: settings.page_size,
        api_key: &config.api_key.value,
        timeout: settings.timeout(),
    };
    let fetch = fetch_all_pages(client, &query);
    if let Some(e) = &fetch.error {
        warn!(
            "College Scorecard pagination stopped after {} requests ({}); keeping {} records",
            fetch.requests,
            e,
            fetch.records.len()
        );
    }

    normalize_scorecard_rows(&fetch.records)
}
