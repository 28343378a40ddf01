use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Administrator {
    pub id: u64,
    pub id_administrator: String,
    pub username: String,
    pub email: String,
    pub phone_number: u64,
    #[serde(skip_serializing)]
    pub password: String, // argon2 PHC string
    pub is_staff: bool,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewAdministrator {
    pub id_administrator: String,
    pub username: String,
    pub email: String,
    pub phone_number: u64,
    pub password_hash: String,
    pub is_staff: bool,
}

impl NewAdministrator {
    pub fn into_administrator(self, id: u64, created_at: NaiveDateTime) -> Administrator {
        Administrator {
            id,
            id_administrator: self.id_administrator,
            username: self.username,
            email: self.email,
            phone_number: self.phone_number,
            password: self.password_hash,
            is_staff: self.is_staff,
            is_active: true,
            created_at,
        }
    }
}
