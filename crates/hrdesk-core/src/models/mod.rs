//! Data models for hrdesk entities.
//!
//! - `User`: the signed-in identity, treated as an opaque server record
//! - `Employee`, `Department`: staff directory
//! - `Leave`: leave requests and their approval status
//! - `JobPosting`, `Applicant`: recruitment
//! - Attendance, payroll, performance, training, benefits and documents
//!
//! Resource records are lenient: unknown fields are ignored and most known
//! fields are optional, since the backend omits or nulls them freely.

pub mod attendance;
pub mod employee;
pub mod leave;
pub mod recruitment;
pub mod training;
pub mod user;

pub use attendance::{AttendanceRecord, PayrollRecord, PerformanceReview};
pub use employee::{Department, Employee, EmployeeUpdate, EmployeeUpdated, NewEmployee};
pub use leave::{Leave, LeaveStatus};
pub use recruitment::{Applicant, ApplicantStatusUpdate, JobPosting, JobPostingUpdate, NewJobPosting};
pub use training::{
    Benefit, EmployeeDocument, EnrollmentCompletion, NewBenefit, NewDocument, NewTrainingProgram,
    TrainingEnrollment, TrainingProgram,
};
pub use user::{User, UserId};
pub(crate) use user::MeResponse;
