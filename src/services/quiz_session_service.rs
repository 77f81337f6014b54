use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};

use crate::{
    config::QuizSettings,
    errors::{AppError, AppResult},
    models::{
        domain::QuizSession,
        dto::quiz_dto::{QuizSessionView, SyncResponse},
    },
    repositories::SessionStore,
    services::question_sampler::QuestionSampler,
};

/// Attempts at a conditional write before giving up on a contended session.
const MAX_WRITE_ATTEMPTS: usize = 5;

/// Detail of the error returned when every write attempt lost a race. Lets
/// clients tell contention apart from a storage outage.
pub const CONTENDED_DETAIL: &str = "quiz session is being modified concurrently, retry";

enum Outcome<T> {
    Write(QuizSession, T),
    Clear(AppError),
}

/// Owns the lifecycle of the single in-progress attempt each user may have.
pub struct QuizSessionService {
    store: Arc<dyn SessionStore>,
    sampler: Arc<QuestionSampler>,
    time_limit_seconds: i64,
}

impl QuizSessionService {
    pub fn new(
        store: Arc<dyn SessionStore>,
        sampler: Arc<QuestionSampler>,
        settings: &QuizSettings,
    ) -> Self {
        Self {
            store,
            sampler,
            time_limit_seconds: settings.time_limit_seconds(),
        }
    }

    /// Samples a fresh question set and installs it, replacing any session the
    /// user already had.
    pub async fn start(&self, user_id: &str) -> AppResult<QuizSessionView> {
        self.start_at(user_id, Utc::now()).await
    }

    pub async fn start_at(&self, user_id: &str, now: DateTime<Utc>) -> AppResult<QuizSessionView> {
        let questions = self.sampler.sample().await?;
        let session = QuizSession::new(questions, now, self.time_limit_seconds);

        self.store.replace_session(user_id, session.clone()).await?;
        log::info!(
            "Started quiz for user {} with {} questions",
            user_id,
            session.questions.len()
        );

        Ok(QuizSessionView::project(session, self.time_limit_seconds))
    }

    pub async fn sync(
        &self,
        user_id: &str,
        index: i64,
        answers: HashMap<String, String>,
    ) -> AppResult<SyncResponse> {
        self.sync_at(user_id, index, answers, Utc::now()).await
    }

    pub async fn sync_at(
        &self,
        user_id: &str,
        index: i64,
        answers: HashMap<String, String>,
        now: DateTime<Utc>,
    ) -> AppResult<SyncResponse> {
        let limit = self.time_limit_seconds;
        let response = self
            .mutate(user_id, |mut session| {
                if session.is_expired(now, limit) {
                    return Ok(Outcome::Clear(AppError::SessionExpired(
                        "time limit reached".to_string(),
                    )));
                }
                let remaining = session.apply_sync(index, answers.clone(), now, limit)?;
                let response = SyncResponse {
                    current_question_index: session.current_question_index,
                    remaining_time: remaining,
                    last_updated: now,
                };
                Ok(Outcome::Write(session, response))
            })
            .await?;

        log::debug!(
            "Synced quiz for user {} at question {}",
            user_id,
            response.current_question_index
        );
        Ok(response)
    }

    /// Like `sync`, but also stores the client's remaining-time display. The
    /// stored hint can only shorten what is kept and never feeds the reply.
    pub async fn save_state(
        &self,
        user_id: &str,
        index: i64,
        answers: HashMap<String, String>,
        remaining_hint: Option<i64>,
    ) -> AppResult<SyncResponse> {
        self.save_state_at(user_id, index, answers, remaining_hint, Utc::now())
            .await
    }

    pub async fn save_state_at(
        &self,
        user_id: &str,
        index: i64,
        answers: HashMap<String, String>,
        remaining_hint: Option<i64>,
        now: DateTime<Utc>,
    ) -> AppResult<SyncResponse> {
        let limit = self.time_limit_seconds;
        self.mutate(user_id, |mut session| {
            if session.is_expired(now, limit) {
                return Ok(Outcome::Clear(AppError::SessionExpired(
                    "time limit reached".to_string(),
                )));
            }
            let remaining = session.apply_sync(index, answers.clone(), now, limit)?;
            if let Some(hint) = remaining_hint {
                session.apply_remaining_hint(hint);
            }
            let response = SyncResponse {
                current_question_index: session.current_question_index,
                remaining_time: remaining,
                last_updated: now,
            };
            Ok(Outcome::Write(session, response))
        })
        .await
    }

    /// Returns the active session with its remaining time recomputed. An
    /// expired session is discarded and reported as absent.
    pub async fn get_current(&self, user_id: &str) -> AppResult<QuizSessionView> {
        self.get_current_at(user_id, Utc::now()).await
    }

    pub async fn get_current_at(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<QuizSessionView> {
        let limit = self.time_limit_seconds;

        for _ in 0..MAX_WRITE_ATTEMPTS {
            let session = self
                .store
                .load_session(user_id)
                .await?
                .ok_or_else(|| AppError::NoActiveSession("no quiz in progress".to_string()))?;

            if !session.is_expired(now, limit) {
                let remaining = session.remaining_seconds(now, limit);
                return Ok(QuizSessionView::project(session, remaining));
            }

            if self
                .store
                .swap_session(user_id, session.revision, None)
                .await?
            {
                log::info!("Discarded expired quiz for user {}", user_id);
                return Err(AppError::NoActiveSession("quiz has expired".to_string()));
            }
        }

        Err(contended(user_id))
    }

    /// Abandons the active session. Succeeds when there is none.
    pub async fn clear(&self, user_id: &str) -> AppResult<()> {
        self.store.clear_session(user_id).await?;
        log::info!("Cleared quiz state for user {}", user_id);
        Ok(())
    }

    /// Read, transform, conditional write. Retries when another request
    /// changed the session in between. After `MAX_WRITE_ATTEMPTS` lost rounds
    /// the caller gets `PersistenceUnavailable` carrying `CONTENDED_DETAIL`,
    /// even though the store itself is healthy; the client may simply retry.
    async fn mutate<T, F>(&self, user_id: &str, mut apply: F) -> AppResult<T>
    where
        F: FnMut(QuizSession) -> AppResult<Outcome<T>>,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let session = self
                .store
                .load_session(user_id)
                .await?
                .ok_or_else(|| AppError::NoActiveSession("no quiz in progress".to_string()))?;
            let expected = session.revision;

            match apply(session)? {
                Outcome::Write(mut next, value) => {
                    next.revision = expected + 1;
                    if self
                        .store
                        .swap_session(user_id, expected, Some(next))
                        .await?
                    {
                        return Ok(value);
                    }
                }
                Outcome::Clear(err) => {
                    if self.store.swap_session(user_id, expected, None).await? {
                        log::info!("Discarded expired quiz for user {}", user_id);
                        return Err(err);
                    }
                }
            }

            log::debug!(
                "Quiz session for user {} changed concurrently, retry {}",
                user_id,
                attempt
            );
        }

        Err(contended(user_id))
    }
}

fn contended(user_id: &str) -> AppError {
    log::warn!("Gave up updating contended quiz session for user {}", user_id);
    AppError::PersistenceUnavailable(CONTENDED_DETAIL.to_string())
}
