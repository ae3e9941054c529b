//! Command parsing and execution.

use anyhow::{anyhow, bail, Context, Result};
use tracing::{debug, warn};

use hrdesk_core::api::ApiError;
use hrdesk_core::hr::{DashboardSummary, HrClient};
use hrdesk_core::models::{Employee, JobPosting, Leave, LeaveStatus, PayrollRecord};
use hrdesk_core::utils::{format_date, format_money, format_optional, pad, truncate_string};
use hrdesk_core::{Config, RestoreOutcome, SessionManager};

const ENV_PASSWORD: &str = "HRDESK_PASSWORD";

/// Widest a free-text table cell may grow before it is truncated
const NAME_WIDTH: usize = 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Login { email: Option<String> },
    Logout,
    Whoami,
    Dashboard,
    Employees,
    Leaves { status: Option<LeaveStatus> },
    ApproveLeave { id: i64 },
    RejectLeave { id: i64 },
    Jobs,
    Payroll,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let mut args = args.iter().map(String::as_str);
        let name = args.next().unwrap_or("help");
        let arg = args.next();
        if let Some(extra) = args.next() {
            bail!("Unexpected argument '{}'", extra);
        }

        let command = match (name, arg) {
            ("help" | "-h" | "--help", None) => Command::Help,
            ("login", email) => Command::Login {
                email: email.map(str::to_string),
            },
            ("logout", None) => Command::Logout,
            ("whoami", None) => Command::Whoami,
            ("dashboard", None) => Command::Dashboard,
            ("employees", None) => Command::Employees,
            ("jobs", None) => Command::Jobs,
            ("payroll", None) => Command::Payroll,
            ("leaves", status) => Command::Leaves {
                status: status.map(parse_status).transpose()?,
            },
            ("approve-leave", Some(id)) => Command::ApproveLeave { id: parse_id(id)? },
            ("reject-leave", Some(id)) => Command::RejectLeave { id: parse_id(id)? },
            ("approve-leave" | "reject-leave", None) => bail!("'{}' needs a leave id", name),
            (_, Some(extra)) if is_known(name) => bail!("Unexpected argument '{}'", extra),
            _ => bail!("Unknown command '{}'", name),
        };
        Ok(command)
    }
}

fn is_known(name: &str) -> bool {
    matches!(
        name,
        "help" | "-h" | "--help" | "logout" | "whoami" | "dashboard" | "employees" | "jobs"
            | "payroll"
    )
}

fn parse_id(raw: &str) -> Result<i64> {
    raw.parse()
        .with_context(|| format!("'{}' is not a valid id", raw))
}

fn parse_status(raw: &str) -> Result<LeaveStatus> {
    match raw.to_ascii_lowercase().as_str() {
        "pending" => Ok(LeaveStatus::Pending),
        "approved" => Ok(LeaveStatus::Approved),
        "rejected" => Ok(LeaveStatus::Rejected),
        _ => bail!("Unknown leave status '{}'", raw),
    }
}

pub async fn run(command: Command) -> Result<()> {
    let mut config = Config::load()?;
    let mut sessions = config.session_manager()?;

    match command {
        Command::Help => Ok(()),
        Command::Login { email } => login(&mut config, &mut sessions, email).await,
        Command::Logout => {
            sessions.logout();
            println!("Signed out.");
            Ok(())
        }
        command => {
            require_session(&mut sessions).await?;
            let hr = HrClient::from_session(&sessions);
            match command {
                Command::Whoami => whoami(&sessions),
                Command::Dashboard => dashboard(&hr).await,
                Command::Employees => employees(&hr).await,
                Command::Leaves { status } => leaves(&hr, status.as_ref()).await,
                Command::ApproveLeave { id } => {
                    let leave = hr.approve_leave(id).await.map_err(api_failure)?;
                    println!("Leave request {} is now {}.", leave.id, leave.status);
                    Ok(())
                }
                Command::RejectLeave { id } => {
                    let leave = hr.reject_leave(id).await.map_err(api_failure)?;
                    println!("Leave request {} is now {}.", leave.id, leave.status);
                    Ok(())
                }
                Command::Jobs => jobs(&hr).await,
                Command::Payroll => payroll(&hr).await,
                Command::Help | Command::Login { .. } | Command::Logout => Ok(()),
            }
        }
    }
}

async fn login(
    config: &mut Config,
    sessions: &mut SessionManager,
    email: Option<String>,
) -> Result<()> {
    let email = email
        .or_else(|| config.last_email.clone())
        .ok_or_else(|| anyhow!("Usage: hrdesk login <email>"))?;

    let password = match std::env::var(ENV_PASSWORD) {
        Ok(password) => password,
        Err(_) => rpassword::prompt_password(format!("Password for {}: ", email))
            .context("Failed to read password")?,
    };

    sessions
        .login(&email, &password)
        .await
        .map_err(|e| anyhow!(e.user_message()))?;

    config.last_email = Some(email);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to remember email");
    }

    if let Some(user) = sessions.current_user() {
        println!("Signed in as {}.", user.display_name());
    }
    Ok(())
}

/// Restore the persisted session, failing when there is none to use.
async fn require_session(sessions: &mut SessionManager) -> Result<()> {
    match sessions.restore_session().await {
        RestoreOutcome::Restored => Ok(()),
        RestoreOutcome::NoSession => bail!("Not signed in. Run 'hrdesk login' first."),
        RestoreOutcome::Invalidated(e) => {
            debug!(error = %e, "Saved session rejected");
            bail!("{}. Run 'hrdesk login' to sign in again.", e.user_message())
        }
        RestoreOutcome::Deferred(e) => bail!(e.user_message()),
    }
}

fn api_failure(e: ApiError) -> anyhow::Error {
    if e.is_unauthorized() {
        anyhow!("{}. Run 'hrdesk login' to sign in again.", e.user_message())
    } else {
        anyhow!(e.user_message())
    }
}

fn whoami(sessions: &SessionManager) -> Result<()> {
    let session = sessions
        .session()
        .ok_or_else(|| anyhow!("Not signed in"))?;
    println!("{}", session.user.display_name());
    let id = session.user.id.as_ref().map(|id| id.to_string());
    println!("  id:     {}", format_optional(id.as_deref()));
    println!("  email:  {}", format_optional(session.user.email.as_deref()));
    println!(
        "  since:  {}",
        session.authenticated_at.format("%Y-%m-%d %H:%M UTC")
    );
    Ok(())
}

async fn dashboard(hr: &HrClient) -> Result<()> {
    let summary = DashboardSummary::fetch(hr).await;
    if summary.is_empty() {
        bail!(hrdesk_core::api::NETWORK_ERROR_MESSAGE);
    }

    let rows = [
        ("Employees", summary.total_employees),
        ("Pending leave", summary.pending_leaves),
        ("Open jobs", summary.open_jobs),
        ("Attendance records", summary.attendance_records),
    ];
    for (label, value) in rows {
        let value = value.map(|v| v.to_string());
        println!("{} {}", pad(label, 20), format_optional(value.as_deref()));
    }
    Ok(())
}

async fn employees(hr: &HrClient) -> Result<()> {
    let employees = hr.list_employees().await.map_err(api_failure)?;
    println!(
        "{} {} {} {} {}",
        pad("ID", 6),
        pad("Name", NAME_WIDTH),
        pad("Position", NAME_WIDTH),
        pad("Status", 10),
        "Hired"
    );
    for employee in &employees {
        println!("{}", employee_row(employee));
    }
    println!("\n{} employees", employees.len());
    Ok(())
}

fn employee_row(employee: &Employee) -> String {
    format!(
        "{} {} {} {} {}",
        pad(&employee.id.to_string(), 6),
        pad(&truncate_string(&employee.full_name(), NAME_WIDTH), NAME_WIDTH),
        pad(
            &truncate_string(&format_optional(employee.position.as_deref()), NAME_WIDTH),
            NAME_WIDTH
        ),
        pad(&format_optional(employee.status.as_deref()), 10),
        format_date(employee.hire_date)
    )
}

async fn leaves(hr: &HrClient, status: Option<&LeaveStatus>) -> Result<()> {
    let leaves = hr.list_leaves(status).await.map_err(api_failure)?;
    println!(
        "{} {} {} {} {} {}",
        pad("ID", 6),
        pad("Employee", NAME_WIDTH),
        pad("Type", 10),
        pad("From", 12),
        pad("To", 12),
        "Status"
    );
    for leave in &leaves {
        println!("{}", leave_row(leave));
    }
    Ok(())
}

fn leave_row(leave: &Leave) -> String {
    let employee = leave
        .employee_name
        .clone()
        .or_else(|| leave.employee_id.map(|id| format!("#{}", id)));
    format!(
        "{} {} {} {} {} {}",
        pad(&leave.id.to_string(), 6),
        pad(
            &truncate_string(&format_optional(employee.as_deref()), NAME_WIDTH),
            NAME_WIDTH
        ),
        pad(&format_optional(leave.leave_type.as_deref()), 10),
        pad(&format_date(leave.start_date), 12),
        pad(&format_date(leave.end_date), 12),
        leave.status
    )
}

async fn jobs(hr: &HrClient) -> Result<()> {
    let jobs = hr.list_jobs().await.map_err(api_failure)?;
    println!(
        "{} {} {} {} {}",
        pad("ID", 6),
        pad("Title", NAME_WIDTH),
        pad("Location", 16),
        pad("Status", 8),
        "Closes"
    );
    for job in &jobs {
        println!("{}", job_row(job));
    }
    Ok(())
}

fn job_row(job: &JobPosting) -> String {
    format!(
        "{} {} {} {} {}",
        pad(&job.id.to_string(), 6),
        pad(&truncate_string(&job.title, NAME_WIDTH), NAME_WIDTH),
        pad(
            &truncate_string(&format_optional(job.location.as_deref()), 16),
            16
        ),
        pad(&format_optional(job.status.as_deref()), 8),
        format_date(job.closing_date)
    )
}

async fn payroll(hr: &HrClient) -> Result<()> {
    let records = hr.list_payroll().await.map_err(api_failure)?;
    println!(
        "{} {} {} {} {}",
        pad("ID", 6),
        pad("Employee", 10),
        pad("Period", 8),
        pad("Net", 14),
        "Status"
    );
    for record in &records {
        println!("{}", payroll_row(record));
    }
    Ok(())
}

fn payroll_row(record: &PayrollRecord) -> String {
    let employee = record.employee_id.map(|id| format!("#{}", id));
    format!(
        "{} {} {} {} {}",
        pad(&record.id.to_string(), 6),
        pad(&format_optional(employee.as_deref()), 10),
        pad(&format_optional(record.period().as_deref()), 8),
        pad(&format_money(record.net_salary), 14),
        format_optional(record.status.as_deref())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_defaults_to_help() {
        assert_eq!(Command::parse(&[]).unwrap(), Command::Help);
        assert_eq!(Command::parse(&args(&["--help"])).unwrap(), Command::Help);
    }

    #[test]
    fn test_parse_login_email_is_optional() {
        assert_eq!(
            Command::parse(&args(&["login"])).unwrap(),
            Command::Login { email: None }
        );
        assert_eq!(
            Command::parse(&args(&["login", "hana@x.com"])).unwrap(),
            Command::Login {
                email: Some("hana@x.com".to_string())
            }
        );
    }

    #[test]
    fn test_parse_leave_commands() {
        assert_eq!(
            Command::parse(&args(&["leaves", "Pending"])).unwrap(),
            Command::Leaves {
                status: Some(LeaveStatus::Pending)
            }
        );
        assert_eq!(
            Command::parse(&args(&["approve-leave", "12"])).unwrap(),
            Command::ApproveLeave { id: 12 }
        );
        assert!(Command::parse(&args(&["reject-leave"])).is_err());
        assert!(Command::parse(&args(&["reject-leave", "twelve"])).is_err());
        assert!(Command::parse(&args(&["leaves", "cancelled"])).is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_and_extra_args() {
        assert!(Command::parse(&args(&["reports"])).is_err());
        assert!(Command::parse(&args(&["whoami", "now"])).is_err());
        assert!(Command::parse(&args(&["login", "a@x.com", "pw"])).is_err());
    }

    #[test]
    fn test_payroll_row_formats_money() {
        let record: PayrollRecord = serde_json::from_str(
            r#"{"id":7,"employee_id":3,"month":2,"year":2024,"net_salary":85000.5,"status":"paid"}"#,
        )
        .unwrap();
        let row = payroll_row(&record);
        assert!(row.contains("2024-02"));
        assert!(row.contains("85,000.50"));
        assert!(row.ends_with("paid"));
        assert_eq!(
            Command::parse(&args(&["payroll"])).unwrap(),
            Command::Payroll
        );
    }

    #[test]
    fn test_leave_row_falls_back_to_employee_id() {
        let leave: Leave =
            serde_json::from_str(r#"{"id":4,"employee_id":9,"status":"pending"}"#).unwrap();
        let row = leave_row(&leave);
        assert!(row.contains("#9"));
        assert!(row.ends_with("pending"));
    }
}
