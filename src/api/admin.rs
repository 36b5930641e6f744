use crate::config::Config;
use crate::models::{ApiMessage, PasswordBody};
use crate::utils::matricule_index;
use actix_web::{HttpResponse, Responder, web};
use sqlx::SqlitePool;
use tracing::{error, info};

fn check_password(config: &Config, body: &PasswordBody) -> Result<(), HttpResponse> {
    if body.password == config.admin_password {
        Ok(())
    } else {
        Err(HttpResponse::Unauthorized().json(ApiMessage::error("Mot de passe incorrect")))
    }
}

/// Admin login
///
/// A plain password-equality check; there is no session or token, the
/// frontend just remembers that the password was accepted once.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = PasswordBody,
    responses(
        (status = 200, description = "Password accepted", body = ApiMessage),
        (status = 401, description = "Wrong password", body = ApiMessage)
    ),
    tag = "Admin"
)]
pub async fn login(
    config: web::Data<Config>,
    body: web::Json<PasswordBody>,
) -> impl Responder {
    match check_password(&config, &body) {
        Ok(()) => HttpResponse::Ok().json(ApiMessage::ok("Connexion réussie")),
        Err(resp) => resp,
    }
}

/// Reset all presence state
///
/// Zeroes counters, entry/exit times and overtime for every employee and
/// empties both log tables, in one transaction.
#[utoipa::path(
    post,
    path = "/api/reset_presence",
    request_body = PasswordBody,
    responses(
        (status = 200, description = "State reset", body = ApiMessage),
        (status = 401, description = "Wrong password", body = ApiMessage),
        (status = 500, description = "Internal server error")
    ),
    tag = "Admin"
)]
pub async fn reset_presence(
    config: web::Data<Config>,
    pool: web::Data<SqlitePool>,
    body: web::Json<PasswordBody>,
) -> actix_web::Result<impl Responder> {
    if let Err(resp) = check_password(&config, &body) {
        return Ok(resp);
    }

    let result = async {
        let mut tx = pool.begin().await?;
        sqlx::query(
            r#"
            UPDATE students
            SET presence = 0, entry_time = NULL, exit_time = NULL,
                daily_overtime = NULL, daily_amount = 0,
                overtime = '0H00', overtime_amount = 0
            "#,
        )
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM presence_log").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM daily_logs").execute(&mut *tx).await?;
        tx.commit().await
    }
    .await;

    match result {
        Ok(()) => {
            info!("Presence state reset by admin");
            Ok(HttpResponse::Ok().json(ApiMessage::ok("Présences réinitialisées")))
        }
        Err(e) => {
            error!(error = %e, "Failed to reset presence state");
            Ok(HttpResponse::InternalServerError()
                .json(ApiMessage::error("Erreur de base de données")))
        }
    }
}

/// Clear entry/exit times only
///
/// Counters and overtime totals are left untouched.
#[utoipa::path(
    post,
    path = "/api/reset_entry_exit",
    request_body = PasswordBody,
    responses(
        (status = 200, description = "Entry/exit times cleared", body = ApiMessage),
        (status = 401, description = "Wrong password", body = ApiMessage),
        (status = 500, description = "Internal server error")
    ),
    tag = "Admin"
)]
pub async fn reset_entry_exit(
    config: web::Data<Config>,
    pool: web::Data<SqlitePool>,
    body: web::Json<PasswordBody>,
) -> actix_web::Result<impl Responder> {
    if let Err(resp) = check_password(&config, &body) {
        return Ok(resp);
    }

    let result = sqlx::query("UPDATE students SET entry_time = NULL, exit_time = NULL")
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(_) => Ok(HttpResponse::Ok().json(ApiMessage::ok("Entrées/Sorties réinitialisées"))),
        Err(e) => {
            error!(error = %e, "Failed to reset entry/exit times");
            Ok(HttpResponse::InternalServerError()
                .json(ApiMessage::error("Erreur de base de données")))
        }
    }
}

/// Delete everything
///
/// Drops all rows from all three tables and invalidates the digest index.
/// Irreversible.
#[utoipa::path(
    post,
    path = "/api/wipe_all",
    request_body = PasswordBody,
    responses(
        (status = 200, description = "All data deleted", body = ApiMessage),
        (status = 401, description = "Wrong password", body = ApiMessage),
        (status = 500, description = "Internal server error")
    ),
    tag = "Admin"
)]
pub async fn wipe_all(
    config: web::Data<Config>,
    pool: web::Data<SqlitePool>,
    body: web::Json<PasswordBody>,
) -> actix_web::Result<impl Responder> {
    if let Err(resp) = check_password(&config, &body) {
        return Ok(resp);
    }

    let result = async {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM daily_logs").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM presence_log").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM students").execute(&mut *tx).await?;
        tx.commit().await
    }
    .await;

    match result {
        Ok(()) => {
            matricule_index::clear_index();
            info!("All data wiped by admin");
            Ok(HttpResponse::Ok().json(ApiMessage::ok("Toutes les données ont été supprimées")))
        }
        Err(e) => {
            error!(error = %e, "Failed to wipe data");
            Ok(HttpResponse::InternalServerError()
                .json(ApiMessage::error("Erreur de base de données")))
        }
    }
}
