use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One tracked person. The identity keys keep the capitalized French names
/// the badge-scanner frontend expects on the wire.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "Matricule": "4521",
        "Nom": "Rakoto",
        "Prenom": "Jean",
        "Emploi": "Caissier",
        "Affectation": "Agence Analakely",
        "Numero": "+261340000000",
        "Mail": "jean.rakoto@example.mg",
        "presence": 12,
        "entry_time": "2025-03-10 05:55:00",
        "exit_time": "2025-03-10 13:45:00",
        "daily_overtime": "0H45",
        "daily_amount": 7500,
        "overtime": "2H15",
        "overtime_amount": 22500
    })
)]
pub struct Student {
    pub id: i64,

    #[serde(rename = "Matricule")]
    pub matricule: String,

    #[serde(rename = "Nom")]
    pub nom: String,

    #[serde(rename = "Prenom")]
    pub prenom: String,

    #[serde(rename = "Emploi")]
    pub emploi: String,

    #[serde(rename = "Affectation")]
    pub affectation: String,

    #[serde(rename = "Numero")]
    pub numero: String,

    #[serde(rename = "Mail")]
    pub mail: String,

    /// Counts every mark-presence event, entries and exits alike.
    pub presence: i64,

    /// Naive UTC `YYYY-MM-DD HH:MM:SS`, or null before the first scan.
    pub entry_time: Option<String>,
    pub exit_time: Option<String>,

    /// Last completed day's overtime as `{H}H{MM}` / Ariary.
    pub daily_overtime: Option<String>,
    pub daily_amount: i64,

    /// Cumulative overtime since the last reset, `{H}H{MM}` / Ariary.
    pub overtime: String,
    pub overtime_amount: i64,
}
