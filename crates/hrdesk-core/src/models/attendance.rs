use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: i64,
    #[serde(default)]
    pub employee_id: Option<i64>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    // Timestamps are passed through as sent; the backend mixes naive and
    // offset formats.
    #[serde(default)]
    pub check_in: Option<String>,
    #[serde(default)]
    pub check_out: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollRecord {
    pub id: i64,
    #[serde(default)]
    pub employee_id: Option<i64>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub basic_salary: Option<f64>,
    #[serde(default)]
    pub allowances: Option<f64>,
    #[serde(default)]
    pub deductions: Option<f64>,
    #[serde(default)]
    pub bonus: Option<f64>,
    #[serde(default)]
    pub net_salary: Option<f64>,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<String>,
}

impl PayrollRecord {
    /// Pay period as `YYYY-MM`
    pub fn period(&self) -> Option<String> {
        match (self.year, self.month) {
            (Some(year), Some(month)) => Some(format!("{:04}-{:02}", year, month)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReview {
    pub id: i64,
    #[serde(default)]
    pub employee_id: Option<i64>,
    #[serde(default)]
    pub reviewer_id: Option<i64>,
    #[serde(default)]
    pub review_period_start: Option<NaiveDate>,
    #[serde(default)]
    pub review_period_end: Option<NaiveDate>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub goals_met: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}
