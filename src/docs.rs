use crate::api::logs::LogListResponse;
use crate::api::presence::MarkPresenceResponse;
use crate::api::student::{CreateStudent, StudentListResponse};
use crate::model::daily_log::DailyLogEntry;
use crate::model::student::Student;
use crate::models::{ApiMessage, PasswordBody};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pointage API",
        version = "1.0.0",
        description = r#"
## Application de Présence QR

Backend for a QR-badge attendance tracker.

### 🔹 Key Features
- **Presence marking**
  - One endpoint decides check-in vs check-out from the employee's state
  - Overtime past 16:00 (UTC+3) accrued at 10 000 Ar per hour
- **Employee Management**
  - Create, update, list, and delete employee records
- **Admin**
  - Password-gated resets of presence state, and a full wipe

### 📦 Response Format
JSON responses with a `status`/`message` envelope; list endpoints wrap
their rows in `data`.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::presence::mark_presence,
        crate::api::logs::student_logs,

        crate::api::student::list_students,
        crate::api::student::create_student,
        crate::api::student::update_student,
        crate::api::student::delete_student,

        crate::api::admin::login,
        crate::api::admin::reset_presence,
        crate::api::admin::reset_entry_exit,
        crate::api::admin::wipe_all,

        crate::api::health::status
    ),
    components(
        schemas(
            Student,
            DailyLogEntry,
            CreateStudent,
            StudentListResponse,
            LogListResponse,
            MarkPresenceResponse,
            PasswordBody,
            ApiMessage
        )
    ),
    tags(
        (name = "Presence", description = "Check-in/check-out and history"),
        (name = "Students", description = "Employee record management"),
        (name = "Admin", description = "Password-gated maintenance operations"),
        (name = "Health", description = "Liveness probes"),
    )
)]
pub struct ApiDoc;
