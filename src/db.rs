use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

pub async fn init_db(database_url: &str) -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .expect("Failed to connect to database");

    migrate(&pool).await.expect("Failed to run migrations");

    pool
}

/// Creates the three tables and applies the add-column-if-missing pass so a
/// database from an older deployment upgrades in place.
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS students (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            matricule TEXT NOT NULL UNIQUE,
            nom TEXT NOT NULL DEFAULT '',
            prenom TEXT NOT NULL DEFAULT '',
            emploi TEXT NOT NULL DEFAULT '',
            affectation TEXT NOT NULL DEFAULT '',
            numero TEXT NOT NULL DEFAULT '',
            mail TEXT NOT NULL DEFAULT '',
            presence INTEGER NOT NULL DEFAULT 0,
            entry_time TEXT,
            exit_time TEXT
        )
        "#,
    )
    .execute(pool)
    .await
    .context("create students table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS presence_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            matricule TEXT NOT NULL,
            timestamp TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .context("create presence_log table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS daily_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            matricule TEXT NOT NULL,
            date TEXT NOT NULL,
            entry_time TEXT,
            exit_time TEXT,
            overtime TEXT,
            overtime_amount INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await
    .context("create daily_logs table")?;

    // Overtime columns arrived after the first deployments.
    ensure_column(pool, "students", "daily_overtime", "daily_overtime TEXT").await?;
    ensure_column(
        pool,
        "students",
        "daily_amount",
        "daily_amount INTEGER NOT NULL DEFAULT 0",
    )
    .await?;
    ensure_column(
        pool,
        "students",
        "overtime",
        "overtime TEXT NOT NULL DEFAULT '0H00'",
    )
    .await?;
    ensure_column(
        pool,
        "students",
        "overtime_amount",
        "overtime_amount INTEGER NOT NULL DEFAULT 0",
    )
    .await?;

    Ok(())
}

async fn ensure_column(pool: &SqlitePool, table: &str, column: &str, ddl: &str) -> Result<()> {
    let exists: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?")
            .bind(table)
            .bind(column)
            .fetch_one(pool)
            .await
            .with_context(|| format!("inspect {table}"))?;

    if exists == 0 {
        sqlx::query(&format!("ALTER TABLE {table} ADD COLUMN {ddl}"))
            .execute(pool)
            .await
            .with_context(|| format!("add {table}.{column}"))?;
        tracing::info!(table, column, "Added missing column");
    }

    Ok(())
}
