use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub department_id: Option<i64>,
    #[serde(default)]
    pub requirements: Option<String>,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub posted_by: Option<i64>,
    #[serde(default)]
    pub posted_date: Option<NaiveDate>,
    #[serde(default)]
    pub closing_date: Option<NaiveDate>,
}

impl JobPosting {
    pub fn is_open(&self) -> bool {
        self.status.as_deref() == Some("open")
    }
}

/// Payload for `POST /api/recruitment/jobs`.
///
/// `posted_by` is filled from the signed-in user when left empty.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewJobPosting {
    pub title: String,
    pub description: Option<String>,
    pub department_id: Option<i64>,
    pub requirements: Option<String>,
    pub salary_range: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub posted_date: Option<NaiveDate>,
    pub closing_date: Option<NaiveDate>,
    pub posted_by: Option<i64>,
}

/// Payload for `PUT /api/recruitment/jobs/{id}`. Unset fields are left
/// unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobPostingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Applicant {
    pub id: i64,
    #[serde(default)]
    pub job_posting_id: Option<i64>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub applied_date: Option<NaiveDate>,
    #[serde(default)]
    pub resume_url: Option<String>,
    #[serde(default)]
    pub cover_letter: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Payload for `PUT /api/recruitment/applicants/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicantStatusUpdate {
    /// applied, screening, interview, offered, rejected or hired
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Applicant {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}
