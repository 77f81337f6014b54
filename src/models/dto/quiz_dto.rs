use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::domain::{QuestionRecord, QuizResult, QuizSession, ResultQuestion};

/// Unanswered questions may arrive as `null`; they are simply left out.
fn answers_skipping_nulls<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<HashMap<String, Option<String>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(id, answer)| answer.map(|answer| (id, answer)))
        .collect())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub current_question_index: i64,
    #[serde(default, deserialize_with = "answers_skipping_nulls")]
    pub user_answers: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveStateRequest {
    pub current_question_index: i64,
    #[serde(default, deserialize_with = "answers_skipping_nulls")]
    pub user_answers: HashMap<String, String>,
    /// Client countdown, display hint only.
    #[serde(default)]
    pub remaining_time: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub current_question_index: u32,
    pub remaining_time: i64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuestionView {
    pub question_id: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub category: String,
    pub user_answer: Option<String>,
}

/// Read model of an active session with each answer folded back into its
/// question.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSessionView {
    pub questions: Vec<SessionQuestionView>,
    pub start_time: DateTime<Utc>,
    pub current_question_index: u32,
    pub user_answers: HashMap<String, String>,
    pub remaining_time: i64,
    pub last_updated: DateTime<Utc>,
    pub total_questions: usize,
}

impl QuizSessionView {
    pub fn project(session: QuizSession, remaining_time: i64) -> Self {
        let answers = session.user_answers;
        let questions = session
            .questions
            .into_iter()
            .map(|record: QuestionRecord| {
                let user_answer = answers.get(&record.question_id).cloned();
                SessionQuestionView {
                    question_id: record.question_id,
                    question: record.question,
                    options: record.options,
                    correct_answer: record.correct_answer,
                    category: record.category,
                    user_answer,
                }
            })
            .collect::<Vec<_>>();

        QuizSessionView {
            total_questions: questions.len(),
            questions,
            start_time: session.start_time,
            current_question_index: session.current_question_index,
            user_answers: answers,
            remaining_time,
            last_updated: session.last_updated,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedQuestion {
    pub question_id: String,
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub user_answer: Option<String>,
    pub correct_answer: String,
}

/// Body of `POST /results`. Every field stays a raw JSON value: a missing or
/// non-array `questions` is an empty submission, and falsy counts such as
/// `false`, `""` or `0` fall back to their defaults instead of failing the
/// request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeRequest {
    #[serde(default)]
    pub questions: serde_json::Value,
    #[serde(default)]
    pub total_questions: serde_json::Value,
    #[serde(default)]
    pub duration: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultQuestionView {
    pub question_id: String,
    pub question: String,
    pub options: Vec<String>,
    pub user_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
}

impl From<ResultQuestion> for ResultQuestionView {
    fn from(outcome: ResultQuestion) -> Self {
        ResultQuestionView {
            question_id: outcome.question_id,
            question: outcome.question,
            options: outcome.options,
            user_answer: outcome.user_answer,
            correct_answer: outcome.correct_answer,
            is_correct: outcome.is_correct,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultView {
    pub id: String,
    pub user: String,
    pub score: i64,
    pub total_questions: i64,
    pub duration: i64,
    pub percentage: f64,
    pub date: DateTime<Utc>,
    pub questions: Vec<ResultQuestionView>,
}

impl From<QuizResult> for ResultView {
    fn from(result: QuizResult) -> Self {
        let percentage = result.percentage();
        let date = DateTime::<Utc>::from_timestamp_millis(result.date.timestamp_millis())
            .unwrap_or_default();

        ResultView {
            id: result.id.to_hex(),
            user: result.user.to_hex(),
            score: result.score,
            total_questions: result.total_questions,
            duration: result.duration,
            percentage,
            date,
            questions: result
                .questions
                .into_iter()
                .map(ResultQuestionView::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultListResponse {
    pub results: Vec<ResultView>,
    pub total: u64,
    pub page: u64,
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    fn record(id: &str) -> QuestionRecord {
        QuestionRecord {
            question_id: id.to_string(),
            question: format!("Question {}", id),
            options: vec!["Paris".to_string(), "Berlin".to_string()],
            correct_answer: "Paris".to_string(),
            category: "part1".to_string(),
        }
    }

    #[test]
    fn session_view_folds_answers_into_questions() {
        let mut session = QuizSession::new(vec![record("q1"), record("q2")], Utc::now(), 3000);
        session
            .user_answers
            .insert("q2".to_string(), "Berlin".to_string());

        let view = QuizSessionView::project(session, 2999);

        assert_eq!(view.total_questions, 2);
        assert_eq!(view.remaining_time, 2999);
        assert_eq!(view.questions[0].user_answer, None);
        assert_eq!(view.questions[1].user_answer.as_deref(), Some("Berlin"));
        assert_eq!(view.user_answers.len(), 1);
    }

    #[test]
    fn sync_request_accepts_camel_case_and_missing_answers() {
        let request: SyncRequest =
            serde_json::from_str(r#"{ "currentQuestionIndex": 4 }"#).unwrap();

        assert_eq!(request.current_question_index, 4);
        assert!(request.user_answers.is_empty());
    }

    #[test]
    fn null_answers_are_dropped() {
        let request: SaveStateRequest = serde_json::from_str(
            r#"{ "currentQuestionIndex": 1, "userAnswers": { "q1": null, "q2": "Paris" } }"#,
        )
        .unwrap();
        assert_eq!(request.user_answers.len(), 1);
        assert_eq!(request.user_answers["q2"], "Paris");

        let request: SyncRequest =
            serde_json::from_str(r#"{ "currentQuestionIndex": 0, "userAnswers": null }"#).unwrap();
        assert!(request.user_answers.is_empty());
    }

    #[test]
    fn finalize_request_tolerates_missing_fields() {
        let request: FinalizeRequest = serde_json::from_str("{}").unwrap();

        assert!(request.questions.is_null());
        assert!(request.total_questions.is_null());
        assert!(request.duration.is_null());
    }

    #[test]
    fn finalize_request_accepts_falsy_counts_of_any_type() {
        let request: FinalizeRequest =
            serde_json::from_str(r#"{ "questions": [], "totalQuestions": "", "duration": false }"#)
                .unwrap();

        assert_eq!(request.total_questions, serde_json::json!(""));
        assert_eq!(request.duration, serde_json::json!(false));
    }

    #[test]
    fn result_view_carries_percentage_and_hex_ids() {
        let user = ObjectId::new();
        let result = QuizResult::new(
            user,
            2,
            50,
            vec![ResultQuestion {
                question_id: "q1".to_string(),
                question: "Capital of France?".to_string(),
                options: vec!["Paris".to_string()],
                user_answer: Some("Paris".to_string()),
                correct_answer: "Paris".to_string(),
                is_correct: true,
            }],
        );

        let view = ResultView::from(result);

        assert_eq!(view.user, user.to_hex());
        assert_eq!(view.score, 1);
        assert_eq!(view.percentage, 50.0);
        assert!(view.questions[0].is_correct);
    }
}
