#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use law_quiz_server::{
    app_state::{AppState, Repositories},
    config::{Config, QuizSettings},
    errors::{AppError, AppResult},
    models::domain::{QuestionRecord, QuizResult, QuizSession, RefreshToken, User},
    repositories::{
        ProfileUpdate, QuestionSource, RefreshTokenRepository, ResultRepository, SessionStore,
        UserRepository,
    },
    services::Mailer,
};

/// Users keyed by id hex. Doubles as the session store, since sessions live
/// inside the user record.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, User>>,
    lose_swaps: AtomicBool,
    swap_attempts: AtomicUsize,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user: User) -> String {
        let id = user.id_hex();
        self.users.write().await.insert(id.clone(), user);
        id
    }

    pub async fn get(&self, id: &str) -> Option<User> {
        self.users.read().await.get(id).cloned()
    }

    /// Makes every conditional write lose, as if another writer always got
    /// there first.
    pub fn set_lose_swaps(&self, lose: bool) {
        self.lose_swaps.store(lose, Ordering::SeqCst);
    }

    pub fn swap_attempts(&self) -> usize {
        self.swap_attempts.load(Ordering::SeqCst)
    }
}

fn user_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("User '{}' not found", id))
}

#[async_trait]
impl UserRepository for InMemoryUserStore {
    async fn create(&self, user: User) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::AlreadyExists(format!(
                "User with email '{}' already exists",
                user.email
            )));
        }
        users.insert(user.id_hex(), user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let email = email.trim().to_lowercase();
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn update_profile(&self, id: &str, update: ProfileUpdate) -> AppResult<User> {
        let mut users = self.users.write().await;
        let user = users.get_mut(id).ok_or_else(|| user_not_found(id))?;
        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(surname) = update.surname {
            user.surname = surname;
        }
        if let Some(avatar_url) = update.avatar_url {
            user.avatar_url = Some(avatar_url);
        }
        Ok(user.clone())
    }

    async fn set_password(&self, id: &str, password_hash: &str) -> AppResult<()> {
        let mut users = self.users.write().await;
        let user = users.get_mut(id).ok_or_else(|| user_not_found(id))?;
        user.password = password_hash.to_string();
        user.reset_token = None;
        user.reset_token_expiry = None;
        Ok(())
    }

    async fn set_reset_token(
        &self,
        id: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut users = self.users.write().await;
        let user = users.get_mut(id).ok_or_else(|| user_not_found(id))?;
        user.reset_token = Some(token_hash.to_string());
        user.reset_token_expiry = Some(expires_at);
        Ok(())
    }

    async fn find_by_reset_token(&self, token_hash: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.reset_token.as_deref() == Some(token_hash))
            .cloned())
    }

    async fn increment_stats(&self, id: &str, solved: i64, points: i64) -> AppResult<()> {
        let mut users = self.users.write().await;
        if let Some(user) = users.get_mut(id) {
            user.stats.solved_questions += solved;
            user.stats.total_points += points;
        }
        Ok(())
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl SessionStore for InMemoryUserStore {
    async fn load_session(&self, user_id: &str) -> AppResult<Option<QuizSession>> {
        let users = self.users.read().await;
        let user = users.get(user_id).ok_or_else(|| user_not_found(user_id))?;
        Ok(user.current_quiz.clone())
    }

    async fn replace_session(&self, user_id: &str, session: QuizSession) -> AppResult<()> {
        let mut users = self.users.write().await;
        let user = users.get_mut(user_id).ok_or_else(|| user_not_found(user_id))?;
        user.current_quiz = Some(session);
        Ok(())
    }

    async fn swap_session(
        &self,
        user_id: &str,
        expected_revision: i64,
        next: Option<QuizSession>,
    ) -> AppResult<bool> {
        self.swap_attempts.fetch_add(1, Ordering::SeqCst);
        if self.lose_swaps.load(Ordering::SeqCst) {
            return Ok(false);
        }
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(user_id) else {
            return Ok(false);
        };
        match &user.current_quiz {
            Some(current) if current.revision == expected_revision => {
                user.current_quiz = next;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear_session(&self, user_id: &str) -> AppResult<()> {
        let mut users = self.users.write().await;
        if let Some(user) = users.get_mut(user_id) {
            user.current_quiz = None;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryResultRepository {
    results: RwLock<Vec<QuizResult>>,
    fail_writes: AtomicBool,
}

impl InMemoryResultRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn count(&self) -> usize {
        self.results.read().await.len()
    }
}

#[async_trait]
impl ResultRepository for InMemoryResultRepository {
    async fn create(&self, result: QuizResult) -> AppResult<QuizResult> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::PersistenceUnavailable(
                "server selection timed out".to_string(),
            ));
        }
        self.results.write().await.push(result.clone());
        Ok(result)
    }

    async fn find_by_user(
        &self,
        user_id: &str,
        offset: u64,
        limit: i64,
    ) -> AppResult<(Vec<QuizResult>, u64)> {
        let results = self.results.read().await;
        let mut items: Vec<_> = results
            .iter()
            .filter(|r| r.user.to_hex() == user_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.date.cmp(&a.date));

        let total = items.len() as u64;
        let page = items
            .into_iter()
            .skip(offset as usize)
            .take(limit.max(0) as usize)
            .collect();

        Ok((page, total))
    }

    async fn find_by_id_for_user(
        &self,
        user_id: &str,
        result_id: &str,
    ) -> AppResult<Option<QuizResult>> {
        let results = self.results.read().await;
        Ok(results
            .iter()
            .find(|r| r.id.to_hex() == result_id && r.user.to_hex() == user_id)
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryRefreshTokenRepository {
    tokens: RwLock<HashMap<String, RefreshToken>>,
}

impl InMemoryRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn live_count(&self, user_id: &str) -> usize {
        self.tokens
            .read()
            .await
            .values()
            .filter(|t| t.user_id == user_id && !t.revoked)
            .count()
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokenRepository {
    async fn store(&self, token: RefreshToken) -> AppResult<()> {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&token.token_hash) {
            return Err(AppError::AlreadyExists("Refresh token already stored".to_string()));
        }
        tokens.insert(token.token_hash.clone(), token);
        Ok(())
    }

    async fn consume(&self, token_hash: &str) -> AppResult<Option<RefreshToken>> {
        let mut tokens = self.tokens.write().await;
        match tokens.get_mut(token_hash) {
            Some(token) if !token.revoked => {
                let previous = token.clone();
                token.revoked = true;
                Ok(Some(previous))
            }
            _ => Ok(None),
        }
    }

    async fn revoke_for_user(&self, user_id: &str) -> AppResult<u64> {
        let mut tokens = self.tokens.write().await;
        let mut revoked = 0;
        for token in tokens.values_mut() {
            if token.user_id == user_id && !token.revoked {
                token.revoked = true;
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Fixed inventory per category; categories listed in `failing` error out.
pub struct InMemoryQuestionBank {
    inventory: HashMap<String, Vec<QuestionRecord>>,
    failing: HashSet<String>,
}

impl InMemoryQuestionBank {
    pub fn with_inventory(categories: &[String], per_category: usize) -> Self {
        let inventory = categories
            .iter()
            .map(|category| (category.clone(), question_records(category, per_category)))
            .collect();
        Self {
            inventory,
            failing: HashSet::new(),
        }
    }

    pub fn failing(mut self, category: &str) -> Self {
        self.failing.insert(category.to_string());
        self
    }
}

#[async_trait]
impl QuestionSource for InMemoryQuestionBank {
    async fn fetch_category(&self, category: &str, limit: usize) -> AppResult<Vec<QuestionRecord>> {
        if self.failing.contains(category) {
            return Err(AppError::PersistenceUnavailable(format!(
                "collection '{}' unreachable",
                category
            )));
        }
        Ok(self
            .inventory
            .get(category)
            .map(|records| records.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

/// Keeps every reset link so tests can pull the token back out.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: RwLock<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub async fn last_token(&self) -> Option<String> {
        let sent = self.sent.read().await;
        sent.last()
            .and_then(|(_, link)| link.split("token=").nth(1).map(str::to_string))
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_password_reset(&self, to: &str, reset_link: &str) -> AppResult<()> {
        self.sent
            .write()
            .await
            .push((to.to_string(), reset_link.to_string()));
        Ok(())
    }
}

pub fn question_records(category: &str, count: usize) -> Vec<QuestionRecord> {
    (0..count)
        .map(|i| QuestionRecord {
            question_id: format!("{}-{:03}", category, i),
            question: format!("{} question {}", category, i),
            options: vec![
                "Option A".to_string(),
                "Option B".to_string(),
                "Option C".to_string(),
            ],
            correct_answer: "Option A".to_string(),
            category: category.to_string(),
        })
        .collect()
}

pub fn test_config() -> Config {
    let mut config = Config::from_env();
    config.jwt_secret = "integration_test_secret_key_with_enough_length".to_string().into();
    config.jwt_expiration_hours = 1;
    config.question_collections = (1..=6).map(|i| format!("questions_part{}", i)).collect();
    config.password_reset_url = "http://localhost:3000/reset-password".to_string();
    config.password_reset_ttl_minutes = 60;
    config.quiz = QuizSettings::default();
    config
}

/// Everything a test needs to drive the app and inspect storage afterwards.
pub struct TestContext {
    pub users: Arc<InMemoryUserStore>,
    pub results: Arc<InMemoryResultRepository>,
    pub refresh_tokens: Arc<InMemoryRefreshTokenRepository>,
    pub mailer: Arc<RecordingMailer>,
    pub state: AppState,
    pub config: Config,
}

impl TestContext {
    pub fn new() -> Self {
        let config = test_config();
        let bank = InMemoryQuestionBank::with_inventory(&config.question_collections, 12);
        Self::with_bank(config, bank)
    }

    pub fn with_bank(config: Config, bank: InMemoryQuestionBank) -> Self {
        let users = Arc::new(InMemoryUserStore::new());
        let results = Arc::new(InMemoryResultRepository::new());
        let refresh_tokens = Arc::new(InMemoryRefreshTokenRepository::new());
        let mailer = Arc::new(RecordingMailer::default());

        let repositories = Repositories {
            users: users.clone(),
            sessions: users.clone(),
            results: results.clone(),
            refresh_tokens: refresh_tokens.clone(),
            questions: Arc::new(bank),
            mailer: mailer.clone(),
        };
        let state = AppState::with_repositories(config.clone(), repositories);

        Self {
            users,
            results,
            refresh_tokens,
            mailer,
            state,
            config,
        }
    }

    /// Inserts a user directly, bypassing signup.
    pub async fn seed_user(&self, email: &str) -> String {
        self.users
            .insert(User::new("Test", "User", email, "$argon2id$unused"))
            .await
    }
}
