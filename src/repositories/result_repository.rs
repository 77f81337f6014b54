use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::{parse_object_id, Database},
    errors::AppResult,
    models::domain::QuizResult,
};

/// Append-only store of finalized results.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    async fn create(&self, result: QuizResult) -> AppResult<QuizResult>;
    /// Newest first, with the total count for the user.
    async fn find_by_user(
        &self,
        user_id: &str,
        offset: u64,
        limit: i64,
    ) -> AppResult<(Vec<QuizResult>, u64)>;
    async fn find_by_id_for_user(
        &self,
        user_id: &str,
        result_id: &str,
    ) -> AppResult<Option<QuizResult>>;
}

pub struct MongoResultRepository {
    collection: Collection<QuizResult>,
}

impl MongoResultRepository {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        let collection = db.get_collection(collection_name);
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for results collection");

        let user_date_index = IndexModel::builder()
            .keys(doc! { "user": 1, "date": -1 })
            .options(
                IndexOptions::builder()
                    .name("user_date".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(user_date_index).await?;

        log::info!("Successfully created indexes for results collection");
        Ok(())
    }
}

#[async_trait]
impl ResultRepository for MongoResultRepository {
    async fn create(&self, result: QuizResult) -> AppResult<QuizResult> {
        self.collection.insert_one(&result).await?;
        Ok(result)
    }

    async fn find_by_user(
        &self,
        user_id: &str,
        offset: u64,
        limit: i64,
    ) -> AppResult<(Vec<QuizResult>, u64)> {
        let user = parse_object_id(user_id)?;
        let filter = doc! { "user": user };

        let total = self.collection.count_documents(filter.clone()).await?;

        let results = self
            .collection
            .find(filter)
            .sort(doc! { "date": -1 })
            .skip(offset)
            .limit(limit)
            .await?
            .try_collect()
            .await?;

        Ok((results, total))
    }

    async fn find_by_id_for_user(
        &self,
        user_id: &str,
        result_id: &str,
    ) -> AppResult<Option<QuizResult>> {
        let user = parse_object_id(user_id)?;
        let id = parse_object_id(result_id)?;

        let result = self
            .collection
            .find_one(doc! { "_id": id, "user": user })
            .await?;
        Ok(result)
    }
}
