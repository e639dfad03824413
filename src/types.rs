use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// A configured school and the EIN its nonprofit filings are published under
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SchoolRef {
    pub name: String,
    pub ein: String,
}

impl SchoolRef {
    pub fn new(name: &str, ein: &str) -> Self {
        Self {
            name: name.to_string(),
            ein: ein.to_string(),
        }
    }
}

/// One output cell. `Empty` serializes as an empty CSV field.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl CellValue {
    /// Copy a JSON value verbatim; nested values are kept as JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Empty,
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => CellValue::Int(i),
                None => n.as_f64().map(CellValue::Float).unwrap_or(CellValue::Empty),
            },
            Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }

    pub fn text(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }

    /// Empty cells and empty strings
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl From<Option<f64>> for CellValue {
    fn from(value: Option<f64>) -> Self {
        value.map(CellValue::Float).unwrap_or(CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Int(i) => write!(f, "{}", i),
            // Whole numbers keep one decimal: 1200.0
            CellValue::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{:.1}", x),
            CellValue::Float(x) => write!(f, "{}", x),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Empty => serializer.serialize_str(""),
            CellValue::Int(i) => serializer.serialize_i64(*i),
            CellValue::Float(_) => serializer.collect_str(self),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Financial summary of the most recent Form 990 filing
#[derive(Debug, Clone, PartialEq)]
pub struct FilingSummary {
    pub revenue: CellValue,
    pub expenses: CellValue,
    pub assets: CellValue,
    pub tax_year: CellValue,
    pub filing_pdf: CellValue,
}

impl FilingSummary {
    /// Placeholder used when the lookup failed, keeps one row per school
    pub fn sentinel() -> Self {
        Self {
            revenue: CellValue::Int(0),
            expenses: CellValue::Int(0),
            assets: CellValue::Int(0),
            tax_year: CellValue::text("Error"),
            filing_pdf: CellValue::text("N/A"),
        }
    }
}

/// Row of the nonprofit snapshot table. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NonprofitRow {
    #[serde(rename = "School Name")]
    pub school_name: String,
    #[serde(rename = "Revenue")]
    pub revenue: CellValue,
    #[serde(rename = "Expenses")]
    pub expenses: CellValue,
    #[serde(rename = "Assets")]
    pub assets: CellValue,
    #[serde(rename = "Tax_Year")]
    pub tax_year: CellValue,
    #[serde(rename = "Last Updated")]
    pub last_updated: String,
    #[serde(rename = "EIN")]
    pub ein: String,
    #[serde(rename = "Filing_PDF")]
    pub filing_pdf: CellValue,
}

impl NonprofitRow {
    pub fn new(school: &SchoolRef, summary: FilingSummary, last_updated: &str) -> Self {
        Self {
            school_name: school.name.clone(),
            revenue: summary.revenue,
            expenses: summary.expenses,
            assets: summary.assets,
            tax_year: summary.tax_year,
            last_updated: last_updated.to_string(),
            ein: school.ein.clone(),
            filing_pdf: summary.filing_pdf,
        }
    }
}

/// Student-facing cost row built from one College Scorecard institution.
/// Field order is the column order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CostRecord {
    #[serde(rename = "School Name")]
    pub school_name: CellValue,
    #[serde(rename = "City")]
    pub city: CellValue,
    #[serde(rename = "Website")]
    pub website: CellValue,
    #[serde(rename = "Enrollment")]
    pub enrollment: CellValue,
    #[serde(rename = "Admission Rate (%)")]
    pub admission_rate_pct: CellValue,
    #[serde(rename = "Average SAT")]
    pub average_sat: CellValue,
    #[serde(rename = "Average ACT")]
    pub average_act: CellValue,
    #[serde(rename = "Tuition (In State)")]
    pub tuition_in_state: CellValue,
    #[serde(rename = "Tuition (Out of State)")]
    pub tuition_out_of_state: CellValue,
    #[serde(rename = "Published Cost (Academic Year)")]
    pub published_cost: CellValue,
    #[serde(rename = "Average Net Price")]
    pub average_net_price: CellValue,
    #[serde(rename = "Room & Board (On Campus)")]
    pub room_board_on_campus: CellValue,
    #[serde(rename = "Books & Supplies")]
    pub books_supplies: CellValue,
    #[serde(rename = "Other On-Campus Expenses")]
    pub other_on_campus: CellValue,
    #[serde(rename = "Other Off-Campus w/Family")]
    pub other_off_campus_family: CellValue,
    #[serde(rename = "Median Debt at Graduation")]
    pub median_debt: CellValue,
    #[serde(rename = "Median Earnings 10y After Entry")]
    pub median_earnings_10y: CellValue,
    #[serde(rename = "IPEDS ID")]
    pub ipeds_id: CellValue,
    #[serde(rename = "OPE8 ID")]
    pub ope8_id: CellValue,
}

/// A data row from a yearly workbook, keyed by the sheet's header names
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookRow {
    pub year: i32,
    pub sheet: String,
    pub values: Vec<(String, CellValue)>,
}

impl WorkbookRow {
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Availability {
    Available,
    Unavailable,
    NotReleased,
    Error,
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Available => write!(f, "AVAILABLE"),
            Availability::Unavailable => write!(f, "UNAVAILABLE"),
            Availability::NotReleased => write!(f, "NOT-RELEASED"),
            Availability::Error => write!(f, "ERROR"),
        }
    }
}

/// One line of the availability report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub label: String,
    pub status: Availability,
    pub detail: Option<String>,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {} ({})", self.status, self.label, detail),
            None => write!(f, "{}: {}", self.status, self.label),
        }
    }
}
