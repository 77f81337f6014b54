use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    errors::{AppError, AppResult},
    models::domain::question::QuestionRecord,
};

/// In-progress attempt embedded in the owning user's document as `currentQuiz`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSession {
    pub questions: Vec<QuestionRecord>,
    pub start_time: DateTime<Utc>,
    pub current_question_index: u32,
    #[serde(default)]
    pub user_answers: HashMap<String, String>,
    /// Last remaining-time value the server accepted, in seconds.
    pub remaining_time: i64,
    pub last_updated: DateTime<Utc>,
    /// Bumped on every accepted write; conditional updates key on it.
    #[serde(default)]
    pub revision: i64,
}

impl QuizSession {
    pub fn new(questions: Vec<QuestionRecord>, now: DateTime<Utc>, time_limit_seconds: i64) -> Self {
        QuizSession {
            questions,
            start_time: now,
            current_question_index: 0,
            user_answers: HashMap::new(),
            remaining_time: time_limit_seconds,
            last_updated: now,
            revision: 0,
        }
    }

    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.start_time).num_seconds().max(0)
    }

    /// Whole seconds left, recomputed from `start_time`; never negative and
    /// never above the budget.
    pub fn remaining_seconds(&self, now: DateTime<Utc>, time_limit_seconds: i64) -> i64 {
        (time_limit_seconds - self.elapsed_seconds(now)).clamp(0, time_limit_seconds.max(0))
    }

    pub fn is_expired(&self, now: DateTime<Utc>, time_limit_seconds: i64) -> bool {
        self.remaining_seconds(now, time_limit_seconds) <= 0
    }

    pub fn validate_index(&self, index: i64) -> AppResult<u32> {
        if index < 0 || index >= self.questions.len() as i64 {
            return Err(AppError::InvalidIndex(format!(
                "index {} is outside 0..{}",
                index,
                self.questions.len()
            )));
        }
        Ok(index as u32)
    }

    /// Applies a client sync: index and answer map are replaced wholesale.
    /// Returns the server-computed remaining time.
    pub fn apply_sync(
        &mut self,
        index: i64,
        answers: HashMap<String, String>,
        now: DateTime<Utc>,
        time_limit_seconds: i64,
    ) -> AppResult<i64> {
        let index = self.validate_index(index)?;
        let remaining = self.remaining_seconds(now, time_limit_seconds);

        self.current_question_index = index;
        self.user_answers = answers;
        self.remaining_time = remaining;
        self.last_updated = now;

        Ok(remaining)
    }

    /// Records a client-side remaining time. The hint can only lower the
    /// stored value, never extend it.
    pub fn apply_remaining_hint(&mut self, hint: i64) {
        let hint = hint.max(0);
        if hint < self.remaining_time {
            self.remaining_time = hint;
        }
    }
}
