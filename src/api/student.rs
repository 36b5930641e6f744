use crate::model::student::Student;
use crate::utils::db_utils::{build_student_update, execute_update};
use crate::utils::matricule_index;
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateStudent {
    #[serde(rename = "Matricule")]
    #[schema(example = "4521")]
    pub matricule: String,
    #[serde(rename = "Nom", default)]
    #[schema(example = "Rakoto")]
    pub nom: String,
    #[serde(rename = "Prenom", default)]
    #[schema(example = "Jean")]
    pub prenom: String,
    #[serde(rename = "Emploi", default)]
    #[schema(example = "Caissier")]
    pub emploi: String,
    #[serde(rename = "Affectation", default)]
    #[schema(example = "Agence Analakely")]
    pub affectation: String,
    #[serde(rename = "Numero", default)]
    #[schema(example = "+261340000000")]
    pub numero: String,
    #[serde(rename = "Mail", default)]
    #[schema(example = "jean.rakoto@example.mg")]
    pub mail: String,
}

#[derive(Serialize, ToSchema)]
pub struct StudentListResponse {
    pub data: Vec<Student>,
}

/// List all employees
#[utoipa::path(
    get,
    path = "/api/students",
    responses(
        (status = 200, description = "All employees, ordered by surname", body = StudentListResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Students"
)]
pub async fn list_students(pool: web::Data<SqlitePool>) -> actix_web::Result<impl Responder> {
    let students =
        sqlx::query_as::<_, Student>("SELECT * FROM students ORDER BY nom ASC")
            .fetch_all(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch students");
                ErrorInternalServerError("Erreur de base de données")
            })?;

    Ok(HttpResponse::Ok().json(StudentListResponse { data: students }))
}

/// Register an employee
#[utoipa::path(
    post,
    path = "/api/students",
    request_body = CreateStudent,
    responses(
        (status = 200, description = "Employee created", body = Object, example = json!({
            "status": "ok",
            "message": "Employé ajouté"
        })),
        (status = 400, description = "Matricule already registered", body = Object, example = json!({
            "status": "error",
            "message": "Matricule déjà existant"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Students"
)]
pub async fn create_student(
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreateStudent>,
) -> impl Responder {
    let result = sqlx::query(
        r#"
        INSERT INTO students (matricule, nom, prenom, emploi, affectation, numero, mail)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payload.matricule)
    .bind(&payload.nom)
    .bind(&payload.prenom)
    .bind(&payload.emploi)
    .bind(&payload.affectation)
    .bind(&payload.numero)
    .bind(&payload.mail)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            matricule_index::index_matricule(&payload.matricule).await;
            HttpResponse::Ok().json(json!({
                "status": "ok",
                "message": "Employé ajouté"
            }))
        }
        Err(e) => {
            // UNIQUE constraint on matricule (1555 = pk, 2067 = unique)
            if let sqlx::Error::Database(db_err) = &e {
                if matches!(db_err.code().as_deref(), Some("2067") | Some("1555")) {
                    return HttpResponse::BadRequest().json(json!({
                        "status": "error",
                        "message": "Matricule déjà existant"
                    }));
                }
            }

            error!(error = %e, matricule = %payload.matricule, "Failed to create student");
            HttpResponse::InternalServerError().json(json!({
                "status": "error",
                "message": "Erreur de base de données"
            }))
        }
    }
}

/// Update an employee's identity fields
///
/// Partial update; only identity fields are accepted, the matricule itself
/// is immutable.
#[utoipa::path(
    put,
    path = "/api/students/{matricule}",
    params(
        ("matricule", Path, description = "Business identifier")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Employee updated", body = Object, example = json!({
            "status": "ok",
            "message": "Employé mis à jour"
        })),
        (status = 400, description = "Unknown or immutable field in payload"),
        (status = 404, description = "Unknown matricule"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Students"
)]
pub async fn update_student(
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    let matricule = path.into_inner();

    let update = build_student_update(&body, &matricule)?;

    let affected = execute_update(pool.get_ref(), update).await.map_err(|e| {
        error!(error = %e, %matricule, "Failed to update student");
        ErrorInternalServerError("Erreur de base de données")
    })?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "status": "error",
            "message": "Étudiant introuvable"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "status": "ok",
        "message": "Employé mis à jour"
    })))
}

/// Remove an employee
#[utoipa::path(
    delete,
    path = "/api/students/{matricule}",
    params(
        ("matricule", Path, description = "Business identifier")
    ),
    responses(
        (status = 200, description = "Employee deleted", body = Object, example = json!({
            "status": "ok",
            "message": "Employé supprimé"
        })),
        (status = 404, description = "Unknown matricule"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Students"
)]
pub async fn delete_student(
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let matricule = path.into_inner();

    let result = sqlx::query("DELETE FROM students WHERE matricule = ?")
        .bind(&matricule)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(res) => {
            if res.rows_affected() == 0 {
                return Ok(HttpResponse::NotFound().json(json!({
                    "status": "error",
                    "message": "Étudiant introuvable"
                })));
            }

            matricule_index::forget_matricule(&matricule).await;

            Ok(HttpResponse::Ok().json(json!({
                "status": "ok",
                "message": "Employé supprimé"
            })))
        }

        Err(e) => {
            error!(error = %e, %matricule, "Failed to delete student");

            Ok(HttpResponse::InternalServerError().json(json!({
                "status": "error",
                "message": "Erreur de base de données"
            })))
        }
    }
}
