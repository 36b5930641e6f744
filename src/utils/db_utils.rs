use actix_web::error::ErrorBadRequest;
use serde_json::Value;
use sqlx::SqlitePool;

/// Wire key => students column, for the admin update endpoint. The matricule
/// is deliberately absent: it is immutable once assigned.
const UPDATABLE_FIELDS: &[(&str, &str)] = &[
    ("Nom", "nom"),
    ("Prenom", "prenom"),
    ("Emploi", "emploi"),
    ("Affectation", "affectation"),
    ("Numero", "numero"),
    ("Mail", "mail"),
];

#[derive(Debug)]
pub enum SqlValue {
    String(String),
    I64(i64),
    F64(f64),
    Bool(bool),
    Null,
}

#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Build a dynamic UPDATE over the whitelisted identity columns from a
/// partial JSON payload. Unknown keys are rejected, not ignored.
pub fn build_student_update(
    payload: &Value,
    matricule: &str,
) -> Result<SqlUpdate, actix_web::Error> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ErrorBadRequest("Payload must be a JSON object"))?;

    if obj.is_empty() {
        return Err(ErrorBadRequest("No fields provided for update"));
    }

    let mut columns = Vec::with_capacity(obj.len());
    let mut values = Vec::with_capacity(obj.len() + 1);

    for (key, value) in obj {
        let column = UPDATABLE_FIELDS
            .iter()
            .find(|(wire, _)| wire == key)
            .map(|(_, column)| *column)
            .ok_or_else(|| ErrorBadRequest(format!("Champ non modifiable: {key}")))?;

        columns.push(format!("{column} = ?"));

        match value {
            Value::String(s) => values.push(SqlValue::String(s.clone())),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    values.push(SqlValue::I64(i));
                } else if let Some(f) = n.as_f64() {
                    values.push(SqlValue::F64(f));
                }
            }
            Value::Bool(b) => values.push(SqlValue::Bool(*b)),
            Value::Null => values.push(SqlValue::Null),
            _ => return Err(ErrorBadRequest("Unsupported JSON value type")),
        }
    }

    let sql = format!(
        "UPDATE students SET {} WHERE matricule = ?",
        columns.join(", ")
    );
    values.push(SqlValue::String(matricule.to_string()));

    Ok(SqlUpdate { sql, values })
}

pub async fn execute_update(pool: &SqlitePool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_whitelisted_update() {
        // serde_json orders object keys alphabetically
        let update =
            build_student_update(&json!({"Nom": "Rakoto", "Mail": "r@x.mg"}), "4521").unwrap();
        assert_eq!(update.sql, "UPDATE students SET mail = ?, nom = ? WHERE matricule = ?");
        assert_eq!(update.values.len(), 3);
    }

    #[test]
    fn rejects_non_identity_fields() {
        assert!(build_student_update(&json!({"Matricule": "9"}), "4521").is_err());
        assert!(build_student_update(&json!({"overtime": "9H99"}), "4521").is_err());
        assert!(build_student_update(&json!({}), "4521").is_err());
    }
}
