use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, Serialize, ToSchema)]
pub struct PasswordBody {
    #[schema(example = "baobab123")]
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiMessage {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = "Connexion réussie")]
    pub message: String,
}

impl ApiMessage {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}
