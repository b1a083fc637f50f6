use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account. The password is stored as an argon2 hash and is
/// never serialized into responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub active: bool,
}
