use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingProgram {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub trainer: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub duration_hours: Option<f64>,
    #[serde(default)]
    pub max_participants: Option<i64>,
    #[serde(default)]
    pub current_participants: Option<i64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub training_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl TrainingProgram {
    pub fn seats_left(&self) -> Option<i64> {
        let max = self.max_participants?;
        Some((max - self.current_participants.unwrap_or(0)).max(0))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingEnrollment {
    pub id: i64,
    #[serde(default)]
    pub employee_id: Option<i64>,
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(default)]
    pub program_id: Option<i64>,
    #[serde(default)]
    pub program_title: Option<String>,
    // Timestamps, passed through as sent
    #[serde(default)]
    pub enrollment_date: Option<String>,
    #[serde(default)]
    pub completion_date: Option<String>,
    #[serde(default)]
    pub completion_status: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub certificate_issued: Option<bool>,
}

impl TrainingEnrollment {
    pub fn is_completed(&self) -> bool {
        self.completion_status.as_deref() == Some("completed")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benefit {
    pub id: i64,
    #[serde(default)]
    pub employee_id: Option<i64>,
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(default)]
    pub benefit_type: Option<String>,
    #[serde(default)]
    pub benefit_name: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub policy_number: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub premium_amount: Option<f64>,
    #[serde(default)]
    pub employer_contribution: Option<f64>,
    #[serde(default)]
    pub employee_contribution: Option<f64>,
    #[serde(default)]
    pub coverage_details: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeDocument {
    pub id: i64,
    #[serde(default)]
    pub employee_id: Option<i64>,
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(default)]
    pub document_name: Option<String>,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub file_size: Option<i64>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub uploaded_by: Option<i64>,
    #[serde(default)]
    pub uploaded_at: Option<String>,
    #[serde(default)]
    pub is_confidential: bool,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Payload for `POST /api/training/programs`.
#[derive(Debug, Clone, Serialize)]
pub struct NewTrainingProgram {
    pub title: String,
    pub start_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trainer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<i64>,
    /// Server default is 20
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub training_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Body of `PUT /api/training/enrollments/{id}/complete`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EnrollmentCompletion {
    pub score: Option<f64>,
    pub feedback: Option<String>,
    pub certificate_issued: bool,
}

/// Payload for `POST /api/training/benefits`.
#[derive(Debug, Clone, Serialize)]
pub struct NewBenefit {
    pub employee_id: i64,
    pub benefit_type: String,
    pub benefit_name: String,
    pub start_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub premium_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employer_contribution: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_contribution: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Payload for `POST /api/training/documents`. The backend records the
/// document's metadata only; `file_path` points at storage managed elsewhere.
#[derive(Debug, Clone, Serialize)]
pub struct NewDocument {
    pub employee_id: i64,
    pub document_name: String,
    pub document_type: String,
    pub file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub is_confidential: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
