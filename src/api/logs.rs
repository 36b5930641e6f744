use crate::model::daily_log::DailyLogEntry;
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct LogListResponse {
    pub data: Vec<DailyLogEntry>,
}

/// Presence history for one employee
///
/// Daily summaries (days with overtime only) joined with identity fields.
#[utoipa::path(
    get,
    path = "/api/logs/{matricule}",
    params(
        ("matricule", Path, description = "Business identifier")
    ),
    responses(
        (status = 200, description = "Daily summaries, oldest first", body = LogListResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Presence"
)]
pub async fn student_logs(
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let matricule = path.into_inner();

    let logs = sqlx::query_as::<_, DailyLogEntry>(
        r#"
        SELECT d.matricule, s.nom, s.prenom, s.emploi,
               d.date, d.entry_time, d.exit_time, d.overtime, d.overtime_amount
        FROM daily_logs d
        JOIN students s ON s.matricule = d.matricule
        WHERE d.matricule = ?
        ORDER BY d.date ASC, d.id ASC
        "#,
    )
    .bind(&matricule)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, %matricule, "Failed to fetch logs");
        ErrorInternalServerError("Erreur de base de données")
    })?;

    Ok(HttpResponse::Ok().json(LogListResponse { data: logs }))
}
