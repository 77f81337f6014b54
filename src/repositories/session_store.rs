use async_trait::async_trait;
use mongodb::{
    bson::{doc, to_bson, Bson, Document},
    options::FindOneOptions,
    Collection,
};
use serde::Deserialize;

use crate::{
    db::{parse_object_id, Database},
    errors::{AppError, AppResult},
    models::domain::QuizSession,
};

/// Access to the quiz session embedded in a user document. Every method is a
/// single-document operation.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load_session(&self, user_id: &str) -> AppResult<Option<QuizSession>>;

    /// Unconditionally installs `session`, discarding any previous one.
    async fn replace_session(&self, user_id: &str, session: QuizSession) -> AppResult<()>;

    /// Writes `next` only if the stored session still has `expected_revision`.
    /// Returns `false` when another writer got there first.
    async fn swap_session(
        &self,
        user_id: &str,
        expected_revision: i64,
        next: Option<QuizSession>,
    ) -> AppResult<bool>;

    /// Removes the session; succeeds when none exists.
    async fn clear_session(&self, user_id: &str) -> AppResult<()>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionProjection {
    #[serde(default)]
    current_quiz: Option<QuizSession>,
}

pub struct MongoSessionStore {
    collection: Collection<Document>,
}

impl MongoSessionStore {
    pub fn new(db: &Database, users_collection: &str) -> Self {
        let collection = db.get_collection(users_collection);
        Self { collection }
    }
}

fn user_not_found(user_id: &str) -> AppError {
    AppError::NotFound(format!("User '{}' not found", user_id))
}

#[async_trait]
impl SessionStore for MongoSessionStore {
    async fn load_session(&self, user_id: &str) -> AppResult<Option<QuizSession>> {
        let oid = parse_object_id(user_id)?;
        let options = FindOneOptions::builder()
            .projection(doc! { "currentQuiz": 1 })
            .build();

        let document = self
            .collection
            .find_one(doc! { "_id": oid })
            .with_options(options)
            .await?
            .ok_or_else(|| user_not_found(user_id))?;

        let projection: SessionProjection = mongodb::bson::from_document(document)?;
        Ok(projection.current_quiz)
    }

    async fn replace_session(&self, user_id: &str, session: QuizSession) -> AppResult<()> {
        let oid = parse_object_id(user_id)?;
        let result = self
            .collection
            .update_one(
                doc! { "_id": oid },
                doc! { "$set": { "currentQuiz": to_bson(&session)? } },
            )
            .await?;

        if result.matched_count == 0 {
            return Err(user_not_found(user_id));
        }
        Ok(())
    }

    async fn swap_session(
        &self,
        user_id: &str,
        expected_revision: i64,
        next: Option<QuizSession>,
    ) -> AppResult<bool> {
        let oid = parse_object_id(user_id)?;
        let replacement = match next {
            Some(session) => to_bson(&session)?,
            None => Bson::Null,
        };

        // Sessions written before revisions existed read back as revision 0.
        let filter = if expected_revision == 0 {
            doc! {
                "_id": oid,
                "currentQuiz": { "$type": "object" },
                "$or": [
                    { "currentQuiz.revision": 0_i64 },
                    { "currentQuiz.revision": { "$exists": false } },
                ],
            }
        } else {
            doc! { "_id": oid, "currentQuiz.revision": expected_revision }
        };

        let result = self
            .collection
            .update_one(filter, doc! { "$set": { "currentQuiz": replacement } })
            .await?;

        Ok(result.matched_count == 1)
    }

    async fn clear_session(&self, user_id: &str) -> AppResult<()> {
        let oid = parse_object_id(user_id)?;
        self.collection
            .update_one(
                doc! { "_id": oid },
                doc! { "$set": { "currentQuiz": Bson::Null } },
            )
            .await?;
        Ok(())
    }
}
