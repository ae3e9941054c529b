use tracing::{debug, info};

use crate::api::{ApiClient, ApiError, RequestOptions};
use crate::auth::SessionManager;
use crate::models::{
    Applicant, ApplicantStatusUpdate, AttendanceRecord, Benefit, Department, Employee,
    EmployeeDocument, EmployeeUpdate, EmployeeUpdated, EnrollmentCompletion, JobPosting,
    JobPostingUpdate, Leave, LeaveStatus, NewBenefit, NewDocument, NewEmployee, NewJobPosting,
    NewTrainingProgram, PayrollRecord, PerformanceReview, TrainingEnrollment, TrainingProgram, User,
};

/// Client for the HR resource endpoints.
/// Clone is cheap - the underlying gateway shares its connection pool.
#[derive(Debug, Clone)]
pub struct HrClient {
    api: ApiClient,
    user_id: Option<i64>,
}

impl HrClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api, user_id: None }
    }

    /// Client bound to the session's current token and user
    pub fn from_session(sessions: &SessionManager) -> Self {
        Self {
            api: sessions.gateway(),
            user_id: sessions.current_user().and_then(User::numeric_id),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    // ===== Employees =====

    pub async fn list_employees(&self) -> Result<Vec<Employee>, ApiError> {
        self.api.get_json("/api/employees").await
    }

    pub async fn get_employee(&self, id: i64) -> Result<Employee, ApiError> {
        self.api.get_json(&format!("/api/employees/{}", id)).await
    }

    pub async fn create_employee(&self, employee: &NewEmployee) -> Result<Employee, ApiError> {
        let options = RequestOptions::post().json(employee)?;
        let created: Employee = self.api.send_json("/api/employees", options).await?;
        info!(employee_id = created.id, "Employee created");
        Ok(created)
    }

    /// Apply a partial update. The backend echoes which fields changed.
    pub async fn update_employee(
        &self,
        id: i64,
        update: &EmployeeUpdate,
    ) -> Result<EmployeeUpdated, ApiError> {
        let options = RequestOptions::put().json(update)?;
        let updated: EmployeeUpdated =
            self.api.send_json(&format!("/api/employees/{}", id), options).await?;
        info!(employee_id = id, fields = ?updated.updated_fields, "Employee updated");
        Ok(updated)
    }

    pub async fn list_departments(&self) -> Result<Vec<Department>, ApiError> {
        self.api.get_json("/api/employees/departments").await
    }

    // ===== Leave =====

    /// List leave requests, optionally only those in `status`
    pub async fn list_leaves(&self, status: Option<&LeaveStatus>) -> Result<Vec<Leave>, ApiError> {
        let endpoint = match status {
            Some(status) => format!("/api/leaves?status={}", status.as_str()),
            None => "/api/leaves".to_string(),
        };
        self.api.get_json(&endpoint).await
    }

    /// Approve a pending request. The server refuses non-pending ones with 400.
    pub async fn approve_leave(&self, id: i64) -> Result<Leave, ApiError> {
        self.decide_leave(id, "approve").await
    }

    pub async fn reject_leave(&self, id: i64) -> Result<Leave, ApiError> {
        self.decide_leave(id, "reject").await
    }

    async fn decide_leave(&self, id: i64, action: &str) -> Result<Leave, ApiError> {
        let endpoint = format!("/api/leaves/{}/{}", id, action);
        let leave: Leave = self.api.send_json(&endpoint, RequestOptions::post()).await?;
        info!(leave_id = id, status = %leave.status, "Leave request updated");
        Ok(leave)
    }

    // ===== Recruitment =====

    pub async fn list_jobs(&self) -> Result<Vec<JobPosting>, ApiError> {
        self.api.get_json("/api/recruitment/jobs").await
    }

    /// Post a job opening. `posted_by` defaults to the signed-in user.
    pub async fn create_job(&self, job: &NewJobPosting) -> Result<JobPosting, ApiError> {
        let mut job = job.clone();
        if job.posted_by.is_none() {
            job.posted_by = self.user_id;
        }
        let options = RequestOptions::post().json(&job)?;
        let created: JobPosting = self.api.send_json("/api/recruitment/jobs", options).await?;
        info!(job_id = created.id, "Job posted");
        Ok(created)
    }

    pub async fn update_job(&self, id: i64, update: &JobPostingUpdate) -> Result<JobPosting, ApiError> {
        let options = RequestOptions::put().json(update)?;
        let updated: JobPosting = self
            .api
            .send_json(&format!("/api/recruitment/jobs/{}", id), options)
            .await?;
        info!(job_id = id, "Job posting updated");
        Ok(updated)
    }

    pub async fn list_applicants(&self) -> Result<Vec<Applicant>, ApiError> {
        self.api.get_json("/api/recruitment/applicants").await
    }

    /// Move an applicant through the hiring pipeline
    pub async fn update_applicant_status(
        &self,
        id: i64,
        update: &ApplicantStatusUpdate,
    ) -> Result<Applicant, ApiError> {
        let options = RequestOptions::put().json(update)?;
        let applicant: Applicant = self
            .api
            .send_json(&format!("/api/recruitment/applicants/{}", id), options)
            .await?;
        info!(applicant_id = id, status = %update.status, "Applicant status updated");
        Ok(applicant)
    }

    // ===== Time, pay and reviews =====

    pub async fn list_attendance(&self) -> Result<Vec<AttendanceRecord>, ApiError> {
        self.api.get_json("/api/attendance").await
    }

    pub async fn list_payroll(&self) -> Result<Vec<PayrollRecord>, ApiError> {
        self.api.get_json("/api/payroll").await
    }

    pub async fn list_performance_reviews(&self) -> Result<Vec<PerformanceReview>, ApiError> {
        self.api.get_json("/api/performance").await
    }

    // ===== Training, benefits, documents =====

    pub async fn list_training_programs(&self) -> Result<Vec<TrainingProgram>, ApiError> {
        self.api.get_json("/api/training/programs").await
    }

    pub async fn create_training_program(
        &self,
        program: &NewTrainingProgram,
    ) -> Result<TrainingProgram, ApiError> {
        let options = RequestOptions::post().json(program)?;
        let created: TrainingProgram = self.api.send_json("/api/training/programs", options).await?;
        info!(program_id = created.id, "Training program created");
        Ok(created)
    }

    pub async fn list_training_enrollments(&self) -> Result<Vec<TrainingEnrollment>, ApiError> {
        self.api.get_json("/api/training/enrollments").await
    }

    /// Mark an enrollment completed. The backend always expects a body here,
    /// even when no score is recorded.
    pub async fn complete_enrollment(
        &self,
        id: i64,
        completion: &EnrollmentCompletion,
    ) -> Result<TrainingEnrollment, ApiError> {
        let options = RequestOptions::put().json(completion)?;
        let enrollment: TrainingEnrollment = self
            .api
            .send_json(&format!("/api/training/enrollments/{}/complete", id), options)
            .await?;
        info!(enrollment_id = id, "Training completed");
        Ok(enrollment)
    }

    pub async fn list_benefits(&self) -> Result<Vec<Benefit>, ApiError> {
        self.api.get_json("/api/training/benefits").await
    }

    pub async fn create_benefit(&self, benefit: &NewBenefit) -> Result<Benefit, ApiError> {
        let options = RequestOptions::post().json(benefit)?;
        let created: Benefit = self.api.send_json("/api/training/benefits", options).await?;
        info!(benefit_id = created.id, employee_id = benefit.employee_id, "Benefit created");
        Ok(created)
    }

    pub async fn list_documents(&self) -> Result<Vec<EmployeeDocument>, ApiError> {
        let documents: Vec<EmployeeDocument> = self.api.get_json("/api/training/documents").await?;
        debug!(count = documents.len(), "Documents fetched");
        Ok(documents)
    }

    pub async fn create_document(&self, document: &NewDocument) -> Result<EmployeeDocument, ApiError> {
        let options = RequestOptions::post().json(document)?;
        let created: EmployeeDocument = self.api.send_json("/api/training/documents", options).await?;
        info!(document_id = created.id, employee_id = document.employee_id, "Document recorded");
        Ok(created)
    }
}
