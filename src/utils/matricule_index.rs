use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::time::Duration;

/// digest (lowercase hex SHA-256 of the matricule) => matricule
///
/// The scanner never sends the raw matricule, only its digest; this index
/// replaces rehashing every row on each scan. It is a cache, not the source
/// of truth: a miss falls back to a table scan that also reprimes it.
pub static MATRICULE_INDEX: Lazy<Cache<String, String>> =
    Lazy::new(|| Cache::builder().max_capacity(100_000).build());

/// Identifiers that recently resolved to nothing. Bounds the cost of
/// repeated garbage scans, which would otherwise digest the whole table
/// every time. Short TTL; registering a matricule also evicts its digest.
static UNKNOWN_IDS: Lazy<Cache<String, ()>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(10_000)
        .time_to_live(Duration::from_secs(60))
        .build()
});

pub fn digest(matricule: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(matricule.as_bytes());
    hex::encode(hasher.finalize())
}

/// Register a matricule (new employee, warmup).
pub async fn index_matricule(matricule: &str) {
    let d = digest(matricule);
    UNKNOWN_IDS.invalidate(&d).await;
    MATRICULE_INDEX.insert(d, matricule.to_string()).await;
}

/// Drop a matricule (employee deleted).
pub async fn forget_matricule(matricule: &str) {
    MATRICULE_INDEX.invalidate(&digest(matricule)).await;
}

/// Drop everything (wipe-all).
pub fn clear_index() {
    MATRICULE_INDEX.invalidate_all();
    UNKNOWN_IDS.invalidate_all();
}

/// Resolve a scanned identifier to a matricule. The identifier is either the
/// raw matricule or its hex digest; raw wins when both could match.
pub async fn resolve(pool: &SqlitePool, identifier: &str) -> Result<Option<String>, sqlx::Error> {
    let direct: Option<(String,)> =
        sqlx::query_as("SELECT matricule FROM students WHERE matricule = ?")
            .bind(identifier)
            .fetch_optional(pool)
            .await?;
    if let Some((matricule,)) = direct {
        return Ok(Some(matricule));
    }

    let wanted = identifier.to_lowercase();
    if let Some(matricule) = MATRICULE_INDEX.get(&wanted).await {
        return Ok(Some(matricule));
    }
    if UNKNOWN_IDS.get(&wanted).await.is_some() {
        return Ok(None);
    }

    // Miss: scan and reprime. Keeps working even if the cache was cold or
    // evicted the entry.
    let mut stream = sqlx::query_as::<_, (String,)>("SELECT matricule FROM students").fetch(pool);
    while let Some(row) = stream.next().await {
        let (matricule,) = row?;
        let d = digest(&matricule);
        let hit = d == wanted;
        MATRICULE_INDEX.insert(d, matricule.clone()).await;
        if hit {
            return Ok(Some(matricule));
        }
    }

    UNKNOWN_IDS.insert(wanted, ()).await;
    Ok(None)
}

/// Load every matricule digest into the index at startup (batched).
pub async fn warmup_matricule_index(pool: &SqlitePool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>("SELECT matricule FROM students").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let (matricule,) = row?;
        batch.push(matricule);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_index(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        batch_index(&batch).await;
    }

    tracing::info!("Matricule index warmup complete: {} entries", total_count);

    Ok(())
}

async fn batch_index(matricules: &[String]) {
    let futures: Vec<_> = matricules
        .iter()
        .map(|m| MATRICULE_INDEX.insert(digest(m), m.clone()))
        .collect();

    futures::future::join_all(futures).await;
}
