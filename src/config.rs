//! Run Configuration
//!
//! Immutable settings handed to every component. Built from compiled-in
//! defaults, optionally overlaid by a YAML file, then completed with the
//! Scorecard API key from the environment.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::http::DEFAULT_USER_AGENT;
use crate::types::SchoolRef;

pub const API_KEY_ENV: &str = "SCORECARD_API_KEY";
pub const DEMO_API_KEY: &str = "DEMO_KEY";

const SCORECARD_ENDPOINT: &str = "https://api.data.gov/ed/collegescorecard/v1/schools";
const NONPROFIT_ENDPOINT: &str = "https://projects.propublica.org/nonprofits/api/v2/organizations/{ein}.json";

const SCORECARD_FIELDS: &[&str] = &[
    "id",
    "ope8_id",
    "school.name",
    "school.alias",
    "school.city",
    "school.school_url",
    "latest.student.size",
    "latest.admissions.admission_rate.overall",
    "latest.admissions.sat_scores.average.overall",
    "latest.admissions.act_scores.midpoint.cumulative",
    "latest.cost.tuition.in_state",
    "latest.cost.tuition.out_of_state",
    "latest.cost.attendance.academic_year",
    "latest.cost.average_net_price.overall",
    "latest.cost.roomboard.oncampus",
    "latest.cost.booksupply",
    "latest.cost.otherexpense.oncampus",
    "latest.cost.otherexpense.offcampus_with_family",
    "latest.aid.median_debt.completers.overall",
    "latest.earnings.10_yrs_after_entry.median",
];

fn default_schools() -> Vec<SchoolRef> {
    vec![
        SchoolRef::new("Princeton University", "210634501"),
        SchoolRef::new("Seton Hall University", "221500645"),
        SchoolRef::new("Stevens Institute of Technology", "221487354"),
        SchoolRef::new("Rider University", "210650678"),
        SchoolRef::new("TCNJ Foundation", "222448189"),
        SchoolRef::new("Destination College", "222479262"),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct NonprofitSettings {
    /// `{ein}` is replaced with the school's EIN
    pub endpoint_template: String,
    pub timeout_secs: u64,
    pub output: PathBuf,
}

impl Default for NonprofitSettings {
    fn default() -> Self {
        Self {
            endpoint_template: NONPROFIT_ENDPOINT.to_string(),
            timeout_secs: 10,
            output: PathBuf::from("nj_school_finances.csv"),
        }
    }
}

impl NonprofitSettings {
    pub fn url_for(&self, ein: &str) -> String {
        self.endpoint_template.replace("{ein}", ein)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScorecardSettings {
    pub endpoint: String,
    pub state: String,
    pub page_size: u32,
    pub fields: Vec<String>,
    pub timeout_secs: u64,
    pub output: PathBuf,
}

impl Default for ScorecardSettings {
    fn default() -> Self {
        Self {
            endpoint: SCORECARD_ENDPOINT.to_string(),
            state: "NJ".to_string(),
            page_size: 100,
            fields: SCORECARD_FIELDS.iter().map(|f| f.to_string()).collect(),
            timeout_secs: 20,
            output: PathBuf::from("nj_college_costs.csv"),
        }
    }
}

impl ScorecardSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkbookSettings {
    /// `{year}` is replaced with each requested year
    pub url_template: String,
    pub years: Vec<i32>,
    pub staging_dir: PathBuf,
    pub timeout_secs: u64,
    pub output: PathBuf,
}

impl Default for WorkbookSettings {
    fn default() -> Self {
        Self {
            url_template: String::new(),
            years: Vec::new(),
            staging_dir: PathBuf::from("staging"),
            timeout_secs: 30,
            output: PathBuf::from("nj_tuition_workbooks.csv"),
        }
    }
}

impl WorkbookSettings {
    pub fn url_for(&self, year: i32) -> String {
        self.url_template.replace("{year}", &year.to_string())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeSettings {
    pub timeout_secs: u64,
    pub output: PathBuf,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            output: PathBuf::from("public_data_status.txt"),
        }
    }
}

impl ProbeSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Environment,
    Demo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey {
    pub value: String,
    pub source: KeySource,
}

impl ApiKey {
    /// Pick the configured key or fall back to the public demo key
    pub fn resolve(configured: Option<String>) -> Self {
        match configured.filter(|k| !k.trim().is_empty()) {
            Some(value) => Self {
                value,
                source: KeySource::Environment,
            },
            None => Self {
                value: DEMO_API_KEY.to_string(),
                source: KeySource::Demo,
            },
        }
    }

    pub fn from_env() -> Self {
        let key = Self::resolve(std::env::var(API_KEY_ENV).ok());
        if key.source == KeySource::Demo {
            warn!(
                "Using College Scorecard {}; set {} for higher rate limits",
                DEMO_API_KEY, API_KEY_ENV
            );
        }
        key
    }
}

impl Default for ApiKey {
    fn default() -> Self {
        Self::resolve(None)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub schools: Vec<SchoolRef>,
    pub user_agent: String,
    pub output_dir: PathBuf,
    pub nonprofit: NonprofitSettings,
    pub scorecard: ScorecardSettings,
    /// Yearly workbook feed, off unless configured
    pub workbook: Option<WorkbookSettings>,
    pub probe: ProbeSettings,
    #[serde(skip)]
    pub api_key: ApiKey,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schools: default_schools(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            output_dir: PathBuf::from("."),
            nonprofit: NonprofitSettings::default(),
            scorecard: ScorecardSettings::default(),
            workbook: None,
            probe: ProbeSettings::default(),
            api_key: ApiKey::default(),
        }
    }
}

impl Config {
    /// Defaults, overlaid by `path` when given, with the API key from the
    /// environment. The demo-key warning is logged here, once per process.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.api_key = ApiKey::from_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse config {:?}", path))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content).context("Invalid config YAML")?;
        Ok(config)
    }

    /// Resolve an output file against the output directory
    pub fn output_path(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.output_dir.join(file)
        }
    }
}
