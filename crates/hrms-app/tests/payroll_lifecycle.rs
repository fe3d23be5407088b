//! End-to-end run over an in-memory SQLite database: set up a department,
//! hire two people, mark attendance, decide a leave request, then run and
//! pay the monthly payroll.

use std::sync::Arc;

use chrono::NaiveDate;
use hrms_app::services::NewEmployee;
use hrms_app::{Actor, AppConfig, ApiError, ErrorCode, Services, SqliteStore, Store};
use hrms_core::filters::PayrollFilter;
use hrms_core::leave::LeaveApplication;
use hrms_core::{
    AttendanceStatus, EmployeeStatus, EmployeeType, LeaveStatus, LeaveType, Money, PayrollPeriod,
    UserRole,
};
use hrms_db::{Database, DbConfig};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn hire(code: &str, first_name: &str, department_id: &str, role_id: &str, salary: i64) -> NewEmployee {
    NewEmployee {
        employee_code: code.to_string(),
        user_id: Some(format!("u-{}", first_name.to_lowercase())),
        first_name: first_name.to_string(),
        last_name: "Sharma".to_string(),
        email: format!("{}@example.com", first_name.to_lowercase()),
        phone: "555-0100".to_string(),
        photo_url: None,
        department_id: department_id.to_string(),
        role_id: role_id.to_string(),
        date_of_birth: None,
        address: None,
        join_date: date(2023, 4, 1),
        salary_monthly: Money::from_minor(salary),
        bank_account: None,
        ifsc_code: None,
        employee_type: EmployeeType::Permanent,
        emergency_contact: None,
    }
}

async fn services() -> (Services, Arc<dyn Store>) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let store: Arc<dyn Store> = Arc::new(SqliteStore::new(db));
    (Services::new(store.clone(), &AppConfig::default()), store)
}

#[tokio::test]
async fn test_month_end_over_sqlite() {
    let (services, store) = services().await;
    let hr = Actor::new("u-hr", Some(UserRole::Hr));

    let engineering = services.departments.create(&hr, "Engineering", None).await.unwrap();
    let engineer = services
        .departments
        .create_role(&hr, &engineering.id, "Engineer", None)
        .await
        .unwrap();

    let priya = services
        .employees
        .create(&hr, hire("EMP-0001", "Priya", &engineering.id, &engineer.id, 50_000))
        .await
        .unwrap();
    let rahul = services
        .employees
        .create(&hr, hire("EMP-0002", "Rahul", &engineering.id, &engineer.id, 40_000))
        .await
        .unwrap();

    // Attendance: bulk mark, then correct one entry.
    let day = date(2024, 11, 4);
    let ids = vec![priya.id.clone(), rahul.id.clone()];
    let report = services
        .attendance
        .mark_bulk(&hr, &ids, day, AttendanceStatus::Present)
        .await
        .unwrap();
    assert!(report.is_complete());
    services
        .attendance
        .mark(&hr, &rahul.id, day, AttendanceStatus::Leave, None)
        .await
        .unwrap();
    let stats = services.attendance.day_stats(&hr, day).await.unwrap();
    assert_eq!(stats.present, 1);
    assert_eq!(stats.on_leave, 1);

    // Leave: Rahul applies, HR approves once.
    let rahul_actor = Actor::new("u-rahul", Some(UserRole::Employee)).with_employee(rahul.id.clone());
    let request = services
        .leave
        .submit(
            &rahul_actor,
            LeaveApplication {
                employee_id: rahul.id.clone(),
                leave_type: LeaveType::Medical,
                from_date: date(2024, 11, 4),
                to_date: date(2024, 11, 5),
                reason: "Fever".to_string(),
                attachment_url: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(request.total_days, 2);
    let approved = services.leave.approve(&hr, &request.id, None).await.unwrap();
    assert_eq!(approved.status, LeaveStatus::Approved);
    let again = services.leave.reject(&hr, &request.id, None).await.unwrap_err();
    assert_eq!(ApiError::from(again).code, ErrorCode::InvalidState);

    // Payroll: Rahul leaves before month end, so only Priya is paid.
    services
        .employees
        .set_status(&hr, &rahul.id, EmployeeStatus::Inactive)
        .await
        .unwrap();
    let period = PayrollPeriod::new(2024, 11).unwrap();
    let generated = services.payroll.generate(&hr, period).await.unwrap();
    assert_eq!(generated.len(), 1);
    assert_eq!(generated[0].employee_id(), priya.id);
    assert!(services.payroll.generate(&hr, period).await.unwrap().is_empty());

    let payroll = &generated[0];
    assert_eq!(payroll.basic().minor(), 50_000);
    assert_eq!(payroll.net_pay(), payroll.gross_pay() - payroll.total_deductions());

    let paid = services
        .payroll
        .mark_paid(&hr, payroll.id(), None, None)
        .await
        .unwrap();
    assert!(paid.is_paid());
    assert_eq!(paid.payment_method(), Some("Bank Transfer"));
    assert!(paid.transaction_id().is_some_and(|t| t.starts_with("TXN")));

    let err = services
        .payroll
        .mark_paid(&hr, payroll.id(), Some("Cash"), Some("TXN1"))
        .await
        .unwrap_err();
    assert!(err.is_invalid_transition());

    let stats = services
        .payroll
        .stats(&hr, &PayrollFilter::for_period(period))
        .await
        .unwrap();
    assert_eq!(stats.paid_count, 1);

    // Both decisions reached the employees' inboxes.
    assert_eq!(store.notifications_for("u-rahul", false).await.unwrap().len(), 1);
    assert_eq!(store.notifications_for("u-priya", false).await.unwrap().len(), 1);

    let summary = services.dashboard.summary(&hr, day).await.unwrap();
    assert_eq!(summary.total_employees, 2);
    assert_eq!(summary.active_employees, 1);
    assert_eq!(summary.pending_leaves, 0);
    assert_eq!(summary.total_net_payroll, paid.net_pay());

    let trail = services
        .activity
        .audit_trail(&hr, Some("payroll"), None, 50)
        .await
        .unwrap();
    assert!(trail.iter().any(|entry| entry.action == "payroll.mark_paid"));
}

#[tokio::test]
async fn test_employee_is_kept_out_of_payroll() {
    let (services, _) = services().await;
    let employee = Actor::new("u-e", Some(UserRole::Employee));
    let period = PayrollPeriod::new(2024, 11).unwrap();

    let err = services.payroll.generate(&employee, period).await.unwrap_err();
    let api = ApiError::from(err);
    assert_eq!(api.code, ErrorCode::Forbidden);
    assert_eq!(api.message, "You do not have permission to manage payroll");

    let manager = Actor::new("u-m", Some(UserRole::Manager));
    assert!(services
        .payroll
        .list(&manager, &PayrollFilter::default())
        .await
        .unwrap()
        .is_empty());
}
