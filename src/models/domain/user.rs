use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::domain::quiz_session::QuizSession;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    #[serde(default)]
    pub solved_questions: i64,
    #[serde(default)]
    pub total_points: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub surname: String,
    pub email: String,
    /// Argon2 PHC string.
    pub password: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub stats: UserStats,
    /// SHA-256 of the outstanding password reset token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_token_expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub current_quiz: Option<QuizSession>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(name: &str, surname: &str, email: &str, password_hash: &str) -> Self {
        User {
            id: Some(ObjectId::new()),
            name: name.to_string(),
            surname: surname.to_string(),
            email: normalize_email(email),
            password: password_hash.to_string(),
            avatar_url: None,
            stats: UserStats::default(),
            reset_token: None,
            reset_token_expiry: None,
            current_quiz: None,
            created_at: Some(Utc::now()),
        }
    }

    pub fn id_hex(&self) -> String {
        self.id.map(|oid| oid.to_hex()).unwrap_or_default()
    }

    pub fn reset_token_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.reset_token.is_some()
            && self
                .reset_token_expiry
                .map(|expiry| expiry > now)
                .unwrap_or(false)
    }
}

/// Emails are stored lowercase so lookups are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
