use std::sync::Arc;

use crate::{
    db::parse_object_id,
    errors::{AppError, AppResult},
    models::{
        domain::{QuizResult, ResultQuestion},
        dto::{
            quiz_dto::{FinalizeRequest, ResultListResponse, ResultView, SubmittedQuestion},
            request::PaginationParams,
        },
    },
    repositories::{ResultRepository, SessionStore, UserRepository},
};

/// Grades each submission by exact string equality. No trimming, no case
/// folding; a missing answer is wrong.
pub fn grade(submissions: Vec<SubmittedQuestion>) -> Vec<ResultQuestion> {
    submissions
        .into_iter()
        .map(|submitted| {
            let is_correct = submitted.user_answer.as_deref() == Some(submitted.correct_answer.as_str());
            ResultQuestion {
                question_id: submitted.question_id,
                question: submitted.question,
                options: submitted.options,
                user_answer: submitted.user_answer,
                correct_answer: submitted.correct_answer,
                is_correct,
            }
        })
        .collect()
}

/// Accepts only a non-empty array of well-formed entries.
fn parse_submissions(raw: serde_json::Value) -> AppResult<Vec<SubmittedQuestion>> {
    let entries = match raw {
        serde_json::Value::Array(entries) if !entries.is_empty() => entries,
        serde_json::Value::Array(_) => {
            return Err(AppError::EmptySubmission("no questions submitted".to_string()))
        }
        _ => {
            return Err(AppError::EmptySubmission(
                "questions must be a list".to_string(),
            ))
        }
    };

    serde_json::from_value(serde_json::Value::Array(entries))
        .map_err(|e| AppError::EmptySubmission(format!("malformed question entry: {}", e)))
}

/// Reads an optional positive count from a loosely typed field. Numbers and
/// numeric strings are truncated to whole numbers; `null`, `false`, `""`,
/// zero and anything non-numeric read as absent.
fn positive_count(value: &serde_json::Value) -> Option<i64> {
    let number = match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.trunc() as i64),
        _ => None,
    };
    number.filter(|n| *n > 0)
}

fn is_falsy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Bool(b) => !b,
        serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
        serde_json::Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// `positive_count` with a default; unusable values that are not plain
/// falsy are logged before falling back.
fn count_or(value: &serde_json::Value, field: &str, default: i64) -> i64 {
    positive_count(value).unwrap_or_else(|| {
        if !is_falsy(value) {
            log::warn!("Ignoring unusable {} {}, using {}", field, value, default);
        }
        default
    })
}

pub struct ResultService {
    results: Arc<dyn ResultRepository>,
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserRepository>,
    default_duration: i64,
}

impl ResultService {
    pub fn new(
        results: Arc<dyn ResultRepository>,
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserRepository>,
        default_duration: i64,
    ) -> Self {
        Self {
            results,
            sessions,
            users,
            default_duration,
        }
    }

    /// Scores the submission and stores it as a new result. The session is
    /// only cleared once the result is durable, so a failed write can be
    /// retried by the client.
    pub async fn finalize(&self, user_id: &str, request: FinalizeRequest) -> AppResult<ResultView> {
        let submissions = parse_submissions(request.questions)?;
        let user = parse_object_id(user_id)?;

        let total_questions = count_or(
            &request.total_questions,
            "totalQuestions",
            submissions.len() as i64,
        );
        let duration = count_or(&request.duration, "duration", self.default_duration);

        let result = QuizResult::new(user, total_questions, duration, grade(submissions));
        let result = self.results.create(result).await?;
        log::info!(
            "Recorded result {} for user {}: {}/{}",
            result.id,
            user_id,
            result.score,
            result.total_questions
        );

        if let Err(e) = self.sessions.clear_session(user_id).await {
            log::warn!(
                "Result {} stored but quiz state for user {} was not cleared: {}",
                result.id,
                user_id,
                e
            );
        }

        let answered = result
            .questions
            .iter()
            .filter(|q| q.user_answer.is_some())
            .count() as i64;
        if let Err(e) = self
            .users
            .increment_stats(user_id, answered, result.score)
            .await
        {
            log::warn!("Failed to update stats for user {}: {}", user_id, e);
        }

        Ok(ResultView::from(result))
    }

    pub async fn list_results(
        &self,
        user_id: &str,
        pagination: &PaginationParams,
    ) -> AppResult<ResultListResponse> {
        let limit = pagination.limit();
        let (results, total) = self
            .results
            .find_by_user(user_id, pagination.offset(), limit)
            .await?;

        Ok(ResultListResponse {
            results: results.into_iter().map(ResultView::from).collect(),
            total,
            page: pagination.page(),
            limit,
        })
    }

    pub async fn get_result(&self, user_id: &str, result_id: &str) -> AppResult<ResultView> {
        self.results
            .find_by_id_for_user(user_id, result_id)
            .await?
            .map(ResultView::from)
            .ok_or_else(|| AppError::NotFound(format!("Result '{}' not found", result_id)))
    }
}
