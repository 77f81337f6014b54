use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

/// Scored outcome of a finished attempt. Written once, never updated.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user: ObjectId,
    pub score: i64,
    pub total_questions: i64,
    pub duration: i64,
    pub date: BsonDateTime,
    pub questions: Vec<ResultQuestion>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultQuestion {
    pub question_id: String,
    pub question: String,
    pub options: Vec<String>,
    pub user_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
}

impl QuizResult {
    pub fn new(
        user: ObjectId,
        total_questions: i64,
        duration: i64,
        questions: Vec<ResultQuestion>,
    ) -> Self {
        let score = questions.iter().filter(|q| q.is_correct).count() as i64;

        QuizResult {
            id: ObjectId::new(),
            user,
            score,
            total_questions,
            duration,
            date: BsonDateTime::now(),
            questions,
        }
    }

    /// Score as a percentage of `total_questions`, one decimal place.
    pub fn percentage(&self) -> f64 {
        if self.total_questions <= 0 {
            return 0.0;
        }
        let raw = self.score as f64 / self.total_questions as f64 * 100.0;
        (raw * 10.0).round() / 10.0
    }
}
