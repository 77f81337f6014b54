use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A frozen copy of a bank question, embedded into sessions so later edits to
/// the bank never reach an attempt that already sampled it.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub question_id: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub category: String,
}

/// Raw document shape of the question bank collections.
#[derive(Clone, Debug, Deserialize)]
pub struct BankQuestion {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(alias = "correctAnswer")]
    pub answer: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl BankQuestion {
    /// Normalises the bank document, or `None` when its answer does not name
    /// one of its options.
    pub fn into_record(self, category: &str) -> Option<QuestionRecord> {
        let correct_answer = resolve_correct_answer(&self.options, &self.answer)?;

        Some(QuestionRecord {
            question_id: self.id.to_hex(),
            question: self.question,
            options: self.options,
            correct_answer,
            category: self.category.unwrap_or_else(|| category.to_string()),
        })
    }
}

/// Accepts either the option text itself or an option letter (`A` is the
/// first option).
fn resolve_correct_answer(options: &[String], answer: &str) -> Option<String> {
    if options.iter().any(|option| option == answer) {
        return Some(answer.to_string());
    }

    let mut chars = answer.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), None) if letter.is_ascii_uppercase() => {
            let index = (letter as u8 - b'A') as usize;
            options.get(index).cloned()
        }
        _ => None,
    }
}
