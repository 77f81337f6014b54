use secrecy::SecretString;
use std::env;

use crate::errors::{AppError, AppResult};

const DEV_JWT_SECRET: &str = "dev_secret_key_change_in_production";

/// Fixed shape of every quiz attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizSettings {
    pub total_questions: usize,
    pub time_limit_minutes: i64,
    /// Extra candidates requested per category on top of the even split.
    pub overfetch: usize,
    /// Duration recorded on a result when the client omits it.
    pub default_duration: i64,
}

impl QuizSettings {
    pub fn time_limit_seconds(&self) -> i64 {
        self.time_limit_minutes * 60
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            total_questions: 50,
            time_limit_minutes: 50,
            overfetch: 2,
            default_duration: 50,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub users_collection: String,
    pub results_collection: String,
    pub refresh_tokens_collection: String,
    pub question_collections: Vec<String>,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub jwt_secret: SecretString,
    pub jwt_expiration_hours: i64,
    pub jwt_refresh_expiration_hours: i64,
    pub password_reset_url: String,
    pub password_reset_ttl_minutes: i64,
    pub quiz: QuizSettings,
}

fn default_question_collections() -> Vec<String> {
    (1..=6).map(|part| format!("questions_part{}", part)).collect()
}

fn parse_collection_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    pub fn from_env() -> Self {
        let question_collections = env::var("QUESTION_COLLECTIONS")
            .ok()
            .map(|raw| parse_collection_list(&raw))
            .filter(|list| !list.is_empty())
            .unwrap_or_else(default_question_collections);

        Self {
            mongo_conn_string: env::var("MONGO_CONN_STRING")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db_name: env::var("MONGO_DB_NAME").unwrap_or_else(|_| "law-quiz".to_string()),
            users_collection: env::var("USERS_COLLECTION").unwrap_or_else(|_| "users".to_string()),
            results_collection: env::var("RESULTS_COLLECTION")
                .unwrap_or_else(|_| "results".to_string()),
            refresh_tokens_collection: env::var("REFRESH_TOKENS_COLLECTION")
                .unwrap_or_else(|_| "refresh_tokens".to_string()),
            question_collections,
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            web_server_port: env::var("WEB_SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            jwt_secret: SecretString::from(
                env::var("JWT_SECRET").unwrap_or_else(|_| DEV_JWT_SECRET.to_string()),
            ),
            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|h| h.parse().ok())
                .unwrap_or(24),
            jwt_refresh_expiration_hours: env::var("JWT_REFRESH_EXPIRATION_HOURS")
                .ok()
                .and_then(|h| h.parse().ok())
                .unwrap_or(168),
            password_reset_url: env::var("PASSWORD_RESET_URL")
                .unwrap_or_else(|_| "http://localhost:3000/reset-password".to_string()),
            password_reset_ttl_minutes: env::var("PASSWORD_RESET_TTL_MINUTES")
                .ok()
                .and_then(|m| m.parse().ok())
                .unwrap_or(60),
            quiz: QuizSettings::default(),
        }
    }

    /// Rejects secrets that are only fit for local development.
    pub fn validate_for_production(&self) -> AppResult<()> {
        use secrecy::ExposeSecret;

        let jwt_secret = self.jwt_secret.expose_secret();

        if jwt_secret == DEV_JWT_SECRET {
            return Err(AppError::ValidationError(
                "JWT_SECRET is using the development default".to_string(),
            ));
        }

        if jwt_secret.len() < 32 {
            return Err(AppError::ValidationError(format!(
                "JWT_SECRET is too short ({}), at least 32 characters are required",
                jwt_secret.len()
            )));
        }

        Ok(())
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "law-quiz-test".to_string(),
            users_collection: "users".to_string(),
            results_collection: "results".to_string(),
            refresh_tokens_collection: "refresh_tokens".to_string(),
            question_collections: default_question_collections(),
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 5000,
            jwt_secret: SecretString::from("test_jwt_secret_key".to_string()),
            jwt_expiration_hours: 1,
            jwt_refresh_expiration_hours: 168,
            password_reset_url: "http://localhost:3000/reset-password".to_string(),
            password_reset_ttl_minutes: 60,
            quiz: QuizSettings::default(),
        }
    }
}
