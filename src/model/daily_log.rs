use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A daily summary row joined with the owner's identity, as served by
/// `GET /api/logs/{matricule}`.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct DailyLogEntry {
    #[serde(rename = "Matricule")]
    pub matricule: String,

    #[serde(rename = "Nom")]
    pub nom: String,

    #[serde(rename = "Prenom")]
    pub prenom: String,

    #[serde(rename = "Emploi")]
    pub emploi: String,

    pub date: String,
    pub entry_time: Option<String>,
    pub exit_time: Option<String>,

    /// That day's overtime only, not the running total.
    pub overtime: Option<String>,
    pub overtime_amount: i64,
}
