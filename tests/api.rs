use actix_web::dev::{Service, ServiceResponse};
use actix_web::{App, test, web};
use chrono::{TimeZone, Utc};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use pointage::api::presence::record_presence;
use pointage::config::Config;
use pointage::db;
use pointage::model::student::Student;
use pointage::routes;
use pointage::utils::matricule_index;

const PASSWORD: &str = "baobab123";

fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        server_addr: "127.0.0.1:0".to_string(),
        admin_password: PASSWORD.to_string(),
        rate_login_per_min: 1000,
        rate_admin_per_min: 1000,
        api_prefix: "/api".to_string(),
    }
}

async fn setup_pool() -> SqlitePool {
    // A single connection keeps every statement on the same in-memory db
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::migrate(&pool).await.unwrap();
    pool
}

async fn setup_app(
    pool: &SqlitePool,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    let config = test_config();
    let config_for_routes = config.clone();
    test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config))
            .configure(|cfg| routes::configure(cfg, config_for_routes.clone())),
    )
    .await
}

fn peer() -> std::net::SocketAddr {
    "127.0.0.1:45000".parse().unwrap()
}

async fn create_student<S>(app: &S, matricule: &str, nom: &str) -> ServiceResponse
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri("/api/students")
        .set_json(json!({
            "Matricule": matricule,
            "Nom": nom,
            "Prenom": "Jean",
            "Emploi": "Caissier",
            "Affectation": "Agence Analakely",
            "Numero": "+261340000000",
            "Mail": "jean@example.mg"
        }))
        .to_request();
    test::call_service(app, req).await
}

#[actix_web::test]
async fn status_endpoint_reports_ok() {
    let pool = setup_pool().await;
    let app = setup_app(&pool).await;

    let req = test::TestRequest::get().uri("/api/status").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn login_checks_the_password() {
    let pool = setup_pool().await;
    let app = setup_app(&pool).await;

    let req = test::TestRequest::post()
        .uri("/api/login")
        .peer_addr(peer())
        .set_json(json!({ "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = test::TestRequest::post()
        .uri("/api/login")
        .peer_addr(peer())
        .set_json(json!({ "password": "wrong" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Mot de passe incorrect");
}

#[actix_web::test]
async fn first_mark_of_the_day_is_a_check_in() {
    let pool = setup_pool().await;
    let app = setup_app(&pool).await;

    create_student(&app, "ci-1001", "Rakoto").await;

    let req = test::TestRequest::post()
        .uri("/api/mark_presence/ci-1001")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "Entrée enregistrée");
    assert!(body["entry_time"].is_string());
    assert!(body["exit_time"].is_null());
    assert_eq!(body["overtime"], "0H00");
    assert_eq!(body["overtime_amount"], 0);

    let req = test::TestRequest::get().uri("/api/students").to_request();
    let list: Value = test::call_and_read_body_json(&app, req).await;
    let row = &list["data"][0];
    assert_eq!(row["Matricule"], "ci-1001");
    assert_eq!(row["presence"], 1);
    assert!(row["entry_time"].is_string());
    assert!(row["exit_time"].is_null());

    let events: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM presence_log")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(events, 1);
}

#[actix_web::test]
async fn scanner_digest_resolves_to_the_matricule() {
    let pool = setup_pool().await;
    let app = setup_app(&pool).await;

    create_student(&app, "dg-2002", "Rasoa").await;

    let digest = matricule_index::digest("dg-2002");
    let req = test::TestRequest::post()
        .uri(&format!("/api/mark_presence/{digest}"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "Entrée enregistrée");
}

#[actix_web::test]
async fn unknown_identifier_is_a_404() {
    let pool = setup_pool().await;
    let app = setup_app(&pool).await;

    let req = test::TestRequest::post()
        .uri("/api/mark_presence/nobody-at-all")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Étudiant introuvable");
}

#[actix_web::test]
async fn same_day_rescans_stay_checkouts() {
    let pool = setup_pool().await;
    let app = setup_app(&pool).await;

    create_student(&app, "re-3003", "Randria").await;

    let mark = || {
        test::TestRequest::post()
            .uri("/api/mark_presence/re-3003")
            .to_request()
    };

    let first: Value = test::call_and_read_body_json(&app, mark()).await;
    assert_eq!(first["message"], "Entrée enregistrée");

    // entry_time survives the checkout, so every later scan today is
    // another checkout against the original entry
    let second: Value = test::call_and_read_body_json(&app, mark()).await;
    assert!(
        second["message"].as_str().unwrap().starts_with("Sortie enregistrée"),
        "second scan should be a checkout: {second}"
    );
    assert!(second["exit_time"].is_string());

    let third: Value = test::call_and_read_body_json(&app, mark()).await;
    assert!(third["message"].as_str().unwrap().starts_with("Sortie enregistrée"));
    assert!(third["overtime_amount"].as_i64() >= second["overtime_amount"].as_i64());

    let req = test::TestRequest::get().uri("/api/students").to_request();
    let list: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(list["data"][0]["presence"], 3);
}

#[actix_web::test]
async fn duplicate_matricule_is_rejected() {
    let pool = setup_pool().await;
    let app = setup_app(&pool).await;

    let resp = create_student(&app, "du-4004", "Premier").await;
    assert!(resp.status().is_success());

    let resp = create_student(&app, "du-4004", "Deuxième").await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Matricule déjà existant");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);

    let nom: String = sqlx::query_scalar("SELECT nom FROM students WHERE matricule = 'du-4004'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(nom, "Premier");
}

#[actix_web::test]
async fn update_touches_identity_fields_only() {
    let pool = setup_pool().await;
    let app = setup_app(&pool).await;

    create_student(&app, "up-5005", "Avant").await;

    let req = test::TestRequest::put()
        .uri("/api/students/up-5005")
        .set_json(json!({ "Nom": "Après", "Emploi": "Guichetier" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let (nom, emploi): (String, String) =
        sqlx::query_as("SELECT nom, emploi FROM students WHERE matricule = 'up-5005'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(nom, "Après");
    assert_eq!(emploi, "Guichetier");

    // the matricule is immutable and overtime is not admin-editable
    let req = test::TestRequest::put()
        .uri("/api/students/up-5005")
        .set_json(json!({ "Matricule": "hijack" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let req = test::TestRequest::put()
        .uri("/api/students/absent")
        .set_json(json!({ "Nom": "X" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn delete_removes_the_row() {
    let pool = setup_pool().await;
    let app = setup_app(&pool).await;

    create_student(&app, "de-6006", "Éphémère").await;

    let req = test::TestRequest::delete()
        .uri("/api/students/de-6006")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);

    let req = test::TestRequest::delete()
        .uri("/api/students/de-6006")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn students_are_listed_by_surname() {
    let pool = setup_pool().await;
    let app = setup_app(&pool).await;

    create_student(&app, "or-7007", "Zafy").await;
    create_student(&app, "or-7008", "Andrian").await;

    let req = test::TestRequest::get().uri("/api/students").to_request();
    let list: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(list["data"][0]["Nom"], "Andrian");
    assert_eq!(list["data"][1]["Nom"], "Zafy");

    // legacy alias used by the admin list page
    let req = test::TestRequest::get().uri("/api/students/full").to_request();
    let list: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn logs_join_daily_summaries_with_identity() {
    let pool = setup_pool().await;
    let app = setup_app(&pool).await;

    create_student(&app, "lg-8008", "Rabe").await;
    sqlx::query(
        r#"
        INSERT INTO daily_logs (matricule, date, entry_time, exit_time, overtime, overtime_amount)
        VALUES ('lg-8008', '2025-03-10', '2025-03-10 05:55:00', '2025-03-10 13:45:00', '0H45', 7500)
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    let req = test::TestRequest::get().uri("/api/logs/lg-8008").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let row = &body["data"][0];
    assert_eq!(row["Matricule"], "lg-8008");
    assert_eq!(row["Nom"], "Rabe");
    assert_eq!(row["overtime"], "0H45");
    assert_eq!(row["overtime_amount"], 7500);
}

async fn student_row(pool: &SqlitePool, matricule: &str) -> Student {
    sqlx::query_as::<_, Student>("SELECT * FROM students WHERE matricule = ?")
        .bind(matricule)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[actix_web::test]
async fn overtime_checkout_writes_daily_summary() {
    let pool = setup_pool().await;
    let app = setup_app(&pool).await;

    create_student(&app, "ot-1212", "Ranaivo").await;
    sqlx::query(
        "UPDATE students SET entry_time = '2025-03-10 05:55:00', presence = 1 WHERE matricule = 'ot-1212'",
    )
    .execute(&pool)
    .await
    .unwrap();

    // 13:45 UTC is 16:45 at UTC+3, 45 minutes past the threshold
    let now = Utc.with_ymd_and_hms(2025, 3, 10, 13, 45, 0).unwrap();
    let student = student_row(&pool, "ot-1212").await;
    let resp = record_presence(&pool, &student, now).await.unwrap();

    assert_eq!(
        resp.message,
        "Sortie enregistrée - 0H45 d'heures supplémentaires (7500 Ar)"
    );
    assert_eq!(resp.entry_time.as_deref(), Some("2025-03-10 05:55:00"));
    assert_eq!(resp.exit_time.as_deref(), Some("2025-03-10 13:45:00"));
    assert_eq!(resp.overtime, "0H45");
    assert_eq!(resp.overtime_amount, 7500);

    let row = student_row(&pool, "ot-1212").await;
    assert_eq!(row.entry_time.as_deref(), Some("2025-03-10 05:55:00"));
    assert_eq!(row.exit_time.as_deref(), Some("2025-03-10 13:45:00"));
    assert_eq!(row.daily_overtime.as_deref(), Some("0H45"));
    assert_eq!(row.daily_amount, 7500);
    assert_eq!(row.overtime, "0H45");
    assert_eq!(row.overtime_amount, 7500);
    assert_eq!(row.presence, 2);

    let (date, entry, exit, overtime, amount): (
        String,
        Option<String>,
        Option<String>,
        Option<String>,
        i64,
    ) = sqlx::query_as(
        "SELECT date, entry_time, exit_time, overtime, overtime_amount FROM daily_logs WHERE matricule = 'ot-1212'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(date, "2025-03-10");
    assert_eq!(entry.as_deref(), Some("2025-03-10 05:55:00"));
    assert_eq!(exit.as_deref(), Some("2025-03-10 13:45:00"));
    assert_eq!(overtime.as_deref(), Some("0H45"));
    assert_eq!(amount, 7500);

    // a later rescan the same day is another checkout; the day's 60 minutes
    // land on top of the stored 0H45
    let later = Utc.with_ymd_and_hms(2025, 3, 10, 14, 0, 0).unwrap();
    let student = student_row(&pool, "ot-1212").await;
    let resp = record_presence(&pool, &student, later).await.unwrap();
    assert_eq!(
        resp.message,
        "Sortie enregistrée - 1H00 d'heures supplémentaires (10000 Ar)"
    );
    assert_eq!(resp.overtime, "1H45");
    assert_eq!(resp.overtime_amount, 17500);

    let summaries: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM daily_logs WHERE matricule = 'ot-1212'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(summaries, 2);
}

#[actix_web::test]
async fn checkout_before_threshold_leaves_totals_alone() {
    let pool = setup_pool().await;
    let app = setup_app(&pool).await;

    create_student(&app, "nt-1313", "Rasolo").await;
    sqlx::query(
        "UPDATE students SET entry_time = '2025-03-10 05:55:00', presence = 1 WHERE matricule = 'nt-1313'",
    )
    .execute(&pool)
    .await
    .unwrap();

    // 10:00 UTC is 13:00 at UTC+3, well before the threshold
    let now = Utc.with_ymd_and_hms(2025, 3, 10, 10, 0, 0).unwrap();
    let student = student_row(&pool, "nt-1313").await;
    let resp = record_presence(&pool, &student, now).await.unwrap();

    assert_eq!(resp.message, "Sortie enregistrée - pas d'heure supplémentaire");
    assert_eq!(resp.exit_time.as_deref(), Some("2025-03-10 10:00:00"));
    assert_eq!(resp.overtime, "0H00");
    assert_eq!(resp.overtime_amount, 0);

    let row = student_row(&pool, "nt-1313").await;
    assert_eq!(row.exit_time.as_deref(), Some("2025-03-10 10:00:00"));
    assert_eq!(row.overtime, "0H00");
    assert_eq!(row.overtime_amount, 0);
    assert!(row.daily_overtime.is_none());
    assert_eq!(row.presence, 2);

    let summaries: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM daily_logs WHERE matricule = 'nt-1313'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(summaries, 0);
}

#[actix_web::test]
async fn unknown_digest_stays_not_found_until_registered() {
    let pool = setup_pool().await;
    let app = setup_app(&pool).await;

    let digest = matricule_index::digest("gd-1414");

    // repeated garbage scans stay 404 (the second answer comes from the
    // negative memo, without rescanning)
    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri(&format!("/api/mark_presence/{digest}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }

    // registering the matricule evicts its digest from the memo right away
    create_student(&app, "gd-1414", "Nouveau").await;
    let req = test::TestRequest::post()
        .uri(&format!("/api/mark_presence/{digest}"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "Entrée enregistrée");
}

#[actix_web::test]
async fn reset_presence_clears_state_and_logs() {
    let pool = setup_pool().await;
    let app = setup_app(&pool).await;

    create_student(&app, "rp-9009", "Raharisoa").await;
    let req = test::TestRequest::post()
        .uri("/api/mark_presence/rp-9009")
        .to_request();
    test::call_service(&app, req).await;
    sqlx::query(
        "INSERT INTO daily_logs (matricule, date, overtime, overtime_amount) VALUES ('rp-9009', '2025-03-10', '0H45', 7500)",
    )
    .execute(&pool)
    .await
    .unwrap();

    // wrong password leaves everything alone
    let req = test::TestRequest::post()
        .uri("/api/reset_presence")
        .peer_addr(peer())
        .set_json(json!({ "password": "wrong" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let req = test::TestRequest::post()
        .uri("/api/reset_presence")
        .peer_addr(peer())
        .set_json(json!({ "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let row: (i64, Option<String>, Option<String>, String, i64) = sqlx::query_as(
        "SELECT presence, entry_time, exit_time, overtime, overtime_amount FROM students WHERE matricule = 'rp-9009'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(row, (0, None, None, "0H00".to_string(), 0));

    let events: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM presence_log")
        .fetch_one(&pool)
        .await
        .unwrap();
    let summaries: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM daily_logs")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!((events, summaries), (0, 0));
}

#[actix_web::test]
async fn reset_entry_exit_keeps_counters_and_overtime() {
    let pool = setup_pool().await;
    let app = setup_app(&pool).await;

    create_student(&app, "re-1010", "Rasolofo").await;
    sqlx::query(
        "UPDATE students SET presence = 4, entry_time = '2025-03-10 05:55:00', exit_time = '2025-03-10 13:45:00', overtime = '1H30', overtime_amount = 15000",
    )
    .execute(&pool)
    .await
    .unwrap();

    let req = test::TestRequest::post()
        .uri("/api/reset_entry_exit")
        .peer_addr(peer())
        .set_json(json!({ "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let row: (i64, Option<String>, Option<String>, String, i64) = sqlx::query_as(
        "SELECT presence, entry_time, exit_time, overtime, overtime_amount FROM students WHERE matricule = 're-1010'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(row, (4, None, None, "1H30".to_string(), 15000));
}

#[actix_web::test]
async fn wipe_all_empties_every_table() {
    let pool = setup_pool().await;
    let app = setup_app(&pool).await;

    create_student(&app, "wa-1111", "Dernier").await;
    let req = test::TestRequest::post()
        .uri("/api/mark_presence/wa-1111")
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/wipe_all")
        .peer_addr(peer())
        .set_json(json!({ "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    for table in ["students", "presence_log", "daily_logs"] {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0, "{table} should be empty");
    }
}
