use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, from_document, Document};

use crate::{
    db::Database,
    errors::AppResult,
    models::domain::{BankQuestion, QuestionRecord},
};

/// Read access to one categorised question collection. Returning fewer
/// records than `limit` is not an error here.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn fetch_category(&self, category: &str, limit: usize) -> AppResult<Vec<QuestionRecord>>;
}

pub struct MongoQuestionSource {
    db: Database,
}

impl MongoQuestionSource {
    pub fn new(db: &Database) -> Self {
        Self { db: db.clone() }
    }
}

/// `questions_part3` is tagged `part3`.
fn category_tag(collection: &str) -> &str {
    collection.strip_prefix("questions_").unwrap_or(collection)
}

#[async_trait]
impl QuestionSource for MongoQuestionSource {
    async fn fetch_category(&self, category: &str, limit: usize) -> AppResult<Vec<QuestionRecord>> {
        let collection = self.db.get_collection::<Document>(category);
        let pipeline = vec![doc! { "$sample": { "size": limit as i64 } }];

        let documents: Vec<Document> = collection.aggregate(pipeline).await?.try_collect().await?;
        let fetched = documents.len();

        let tag = category_tag(category);
        let records: Vec<QuestionRecord> = documents
            .into_iter()
            .filter_map(|document| match from_document::<BankQuestion>(document) {
                Ok(bank) => bank.into_record(tag),
                Err(err) => {
                    log::warn!("Skipping malformed question in '{}': {}", category, err);
                    None
                }
            })
            .collect();

        if records.len() < fetched {
            log::warn!(
                "Dropped {} of {} questions from '{}' during normalisation",
                fetched - records.len(),
                fetched,
                category
            );
        }

        Ok(records)
    }
}
