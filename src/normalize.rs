//! Record Normalization Module
//!
//! Turns raw College Scorecard records into flat [`CostRecord`] rows.
//!
//! Coercion is lenient and never fails:
//! - percentage fields: fraction -> percent, rounded to 2 decimals, otherwise `None`
//! - numeric fields: rounded to 2 decimals, otherwise the raw value passes through
//! - everything else is copied verbatim

use serde_json::Value;

use crate::types::{CellValue, CostRecord};

/// Round to two decimal places
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Numeric view of a JSON value; numeric strings count
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|x| x.is_finite()),
        _ => None,
    }
}

fn is_missing(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Fraction to percentage. `null` and non-numeric input yield `None`.
pub fn to_percent(value: &Value) -> Option<f64> {
    if is_missing(value) {
        return None;
    }
    numeric(value).map(|x| round2(x * 100.0))
}

/// Round numeric input to two decimals; anything non-numeric passes through.
pub fn clean_number(value: &Value) -> CellValue {
    if is_missing(value) {
        return CellValue::Empty;
    }
    match numeric(value) {
        Some(x) => CellValue::Float(round2(x)),
        None => CellValue::from_json(value),
    }
}

/// Scorecard records use dotted field names as flat keys
fn field<'a>(record: &'a Value, key: &str) -> &'a Value {
    record.get(key).unwrap_or(&Value::Null)
}

fn raw(record: &Value, key: &str) -> CellValue {
    CellValue::from_json(field(record, key))
}

fn number(record: &Value, key: &str) -> CellValue {
    clean_number(field(record, key))
}

pub fn normalize_scorecard_record(record: &Value) -> CostRecord {
    CostRecord {
        school_name: raw(record, "school.name"),
        city: raw(record, "school.city"),
        website: raw(record, "school.school_url"),
        enrollment: raw(record, "latest.student.size"),
        admission_rate_pct: to_percent(field(record, "latest.admissions.admission_rate.overall")).into(),
        average_sat: number(record, "latest.admissions.sat_scores.average.overall"),
        average_act: number(record, "latest.admissions.act_scores.midpoint.cumulative"),
        tuition_in_state: number(record, "latest.cost.tuition.in_state"),
        tuition_out_of_state: number(record, "latest.cost.tuition.out_of_state"),
        published_cost: number(record, "latest.cost.attendance.academic_year"),
        average_net_price: number(record, "latest.cost.average_net_price.overall"),
        room_board_on_campus: number(record, "latest.cost.roomboard.oncampus"),
        books_supplies: number(record, "latest.cost.booksupply"),
        other_on_campus: number(record, "latest.cost.otherexpense.oncampus"),
        other_off_campus_family: number(record, "latest.cost.otherexpense.offcampus_with_family"),
        median_debt: number(record, "latest.aid.median_debt.completers.overall"),
        median_earnings_10y: number(record, "latest.earnings.10_yrs_after_entry.median"),
        ipeds_id: raw(record, "id"),
        ope8_id: raw(record, "ope8_id"),
    }
}

/// Normalize and sort by school name; unnamed rows go last
pub fn normalize_scorecard_rows(records: &[Value]) -> Vec<CostRecord> {
    let mut rows: Vec<CostRecord> = records.iter().map(normalize_scorecard_record).collect();
    rows.sort_by(|a, b| {
        let key = |r: &CostRecord| match &r.school_name {
            CellValue::Empty => None,
            other => Some(other.to_string()),
        };
        match (key(a), key(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
    });
    rows
}
