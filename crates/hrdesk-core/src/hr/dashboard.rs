use tracing::warn;

use super::HrClient;
use crate::api::ApiError;

/// Headline counters for the dashboard landing page.
///
/// Each counter comes from its own request; a counter whose request failed
/// is `None` rather than failing the whole summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardSummary {
    pub total_employees: Option<usize>,
    pub pending_leaves: Option<usize>,
    pub open_jobs: Option<usize>,
    pub attendance_records: Option<usize>,
}

impl DashboardSummary {
    pub async fn fetch(hr: &HrClient) -> Self {
        let (employees, leaves, jobs, attendance) = tokio::join!(
            hr.list_employees(),
            hr.list_leaves(None),
            hr.list_jobs(),
            hr.list_attendance()
        );

        Self {
            total_employees: counter("employees", employees.map(|e| e.len())),
            pending_leaves: counter(
                "leaves",
                leaves.map(|l| l.iter().filter(|leave| leave.is_pending()).count()),
            ),
            open_jobs: counter("jobs", jobs.map(|j| j.iter().filter(|job| job.is_open()).count())),
            attendance_records: counter("attendance", attendance.map(|a| a.len())),
        }
    }

    /// True when every counter failed to load
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn counter(source: &str, result: Result<usize, ApiError>) -> Option<usize> {
    match result {
        Ok(count) => Some(count),
        Err(e) => {
            warn!(source, error = %e, "Dashboard counter unavailable");
            None
        }
    }
}
