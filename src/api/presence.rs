use crate::model::student::Student;
use crate::utils::matricule_index;
use crate::utils::overtime::{
    business_date, format_hm, overtime_amount, overtime_minutes, parse_hm,
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct MarkPresenceResponse {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = "Entrée enregistrée")]
    pub message: String,
    /// Entry already on record today, or the timestamp this call just set.
    #[schema(example = "2025-03-10 05:55:00", nullable = true)]
    pub entry_time: Option<String>,
    /// Null on a check-in.
    #[schema(example = "2025-03-10 13:45:00", nullable = true)]
    pub exit_time: Option<String>,
    /// Cumulative totals after this call.
    #[schema(example = "2H15")]
    pub overtime: String,
    #[schema(example = 22500)]
    pub overtime_amount: i64,
}

/// Mark presence (check-in / check-out)
///
/// `{id}` is the raw matricule or the SHA-256 hex digest the QR scanner
/// sends. Whether the scan is an entry or an exit depends solely on the
/// record's `entry_time`: absent or dated before today means check-in,
/// anything from today means check-out. A checkout never clears
/// `entry_time`, so a repeated scan after leaving is treated as another
/// checkout recomputed from the original entry; that matches the historical
/// behavior and the admin reset is the only way out of it.
#[utoipa::path(
    post,
    path = "/api/mark_presence/{id}",
    params(
        ("id", Path, description = "Matricule or its SHA-256 hex digest")
    ),
    responses(
        (status = 200, description = "Presence recorded", body = MarkPresenceResponse),
        (status = 404, description = "Unknown identifier", body = Object, example = json!({
            "status": "error",
            "message": "Étudiant introuvable"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Presence"
)]
pub async fn mark_presence(
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let identifier = path.into_inner();

    let matricule = matricule_index::resolve(pool.get_ref(), &identifier)
        .await
        .map_err(|e| {
            error!(error = %e, %identifier, "Failed to resolve identifier");
            actix_web::error::ErrorInternalServerError("Erreur de base de données")
        })?;

    let Some(matricule) = matricule else {
        return Ok(HttpResponse::NotFound().json(json!({
            "status": "error",
            "message": "Étudiant introuvable"
        })));
    };

    let student = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE matricule = ?")
        .bind(&matricule)
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, %matricule, "Failed to fetch student");
            actix_web::error::ErrorInternalServerError("Erreur de base de données")
        })?;

    let response = record_presence(pool.get_ref(), &student, Utc::now())
        .await
        .map_err(|e| {
            error!(error = %e, %matricule, "Failed to record presence");
            actix_web::error::ErrorInternalServerError("Erreur de base de données")
        })?;

    Ok(HttpResponse::Ok().json(response))
}

/// Applies one scan to the record at the given instant. The handler passes
/// the current time; taking it as a parameter pins down the day-boundary
/// and overtime rules at fixed instants.
pub async fn record_presence(
    pool: &SqlitePool,
    student: &Student,
    now: DateTime<Utc>,
) -> Result<MarkPresenceResponse, sqlx::Error> {
    let now_str = now.format("%Y-%m-%d %H:%M:%S").to_string();
    let today = now.format("%Y-%m-%d").to_string();

    // entry_time from a previous day belongs to an unclosed cycle and does
    // not block today's check-in
    let is_check_in = student
        .entry_time
        .as_deref()
        .is_none_or(|t| !t.starts_with(&today));

    if is_check_in {
        check_in(pool, student, &now_str).await
    } else {
        check_out(pool, student, now, &now_str).await
    }
}

async fn check_in(
    pool: &SqlitePool,
    student: &Student,
    now_str: &str,
) -> Result<MarkPresenceResponse, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE students SET entry_time = ?, presence = presence + 1 WHERE id = ?")
        .bind(now_str)
        .bind(student.id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("INSERT INTO presence_log (matricule, timestamp) VALUES (?, ?)")
        .bind(&student.matricule)
        .bind(now_str)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(MarkPresenceResponse {
        status: "ok".to_string(),
        message: "Entrée enregistrée".to_string(),
        entry_time: Some(now_str.to_string()),
        exit_time: None,
        overtime: student.overtime.clone(),
        overtime_amount: student.overtime_amount,
    })
}

async fn check_out(
    pool: &SqlitePool,
    student: &Student,
    now: chrono::DateTime<Utc>,
    now_str: &str,
) -> Result<MarkPresenceResponse, sqlx::Error> {
    let minutes = overtime_minutes(now);

    let mut tx = pool.begin().await?;

    let (message, overtime, amount) = if minutes == 0 {
        sqlx::query("UPDATE students SET exit_time = ?, presence = presence + 1 WHERE id = ?")
            .bind(now_str)
            .bind(student.id)
            .execute(&mut *tx)
            .await?;

        (
            "Sortie enregistrée - pas d'heure supplémentaire".to_string(),
            student.overtime.clone(),
            student.overtime_amount,
        )
    } else {
        let daily_overtime = format_hm(minutes);
        let daily_amount = overtime_amount(minutes);
        let new_overtime = format_hm(parse_hm(&student.overtime) + minutes);
        let new_amount = student.overtime_amount + daily_amount;

        sqlx::query(
            r#"
            UPDATE students
            SET exit_time = ?, daily_overtime = ?, daily_amount = ?,
                overtime = ?, overtime_amount = ?, presence = presence + 1
            WHERE id = ?
            "#,
        )
        .bind(now_str)
        .bind(&daily_overtime)
        .bind(daily_amount)
        .bind(&new_overtime)
        .bind(new_amount)
        .bind(student.id)
        .execute(&mut *tx)
        .await?;

        // The summary row carries the day's values, not the running totals.
        sqlx::query(
            r#"
            INSERT INTO daily_logs (matricule, date, entry_time, exit_time, overtime, overtime_amount)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&student.matricule)
        .bind(business_date(now))
        .bind(&student.entry_time)
        .bind(now_str)
        .bind(&daily_overtime)
        .bind(daily_amount)
        .execute(&mut *tx)
        .await?;

        (
            format!(
                "Sortie enregistrée - {daily_overtime} d'heures supplémentaires ({daily_amount} Ar)"
            ),
            new_overtime,
            new_amount,
        )
    };

    sqlx::query("INSERT INTO presence_log (matricule, timestamp) VALUES (?, ?)")
        .bind(&student.matricule)
        .bind(now_str)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(MarkPresenceResponse {
        status: "ok".to_string(),
        message,
        entry_time: student.entry_time.clone(),
        exit_time: Some(now_str.to_string()),
        overtime,
        overtime_amount: amount,
    })
}
