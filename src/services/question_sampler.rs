use std::{collections::HashSet, sync::Arc};

use futures::future::join_all;
use rand::{seq::SliceRandom, Rng};

use crate::{
    config::QuizSettings,
    errors::{AppError, AppResult},
    models::domain::QuestionRecord,
    repositories::QuestionSource,
};

/// Draws a fixed-size, duplicate-free, shuffled question set spread evenly
/// over the configured categories.
pub struct QuestionSampler {
    source: Arc<dyn QuestionSource>,
    categories: Vec<String>,
    total: usize,
    overfetch: usize,
}

impl QuestionSampler {
    pub fn new(
        source: Arc<dyn QuestionSource>,
        categories: Vec<String>,
        settings: &QuizSettings,
    ) -> Self {
        Self {
            source,
            categories,
            total: settings.total_questions,
            overfetch: settings.overfetch,
        }
    }

    /// `ceil(total / categories) + overfetch`.
    pub fn per_category_request(&self) -> usize {
        let categories = self.categories.len().max(1);
        self.total.div_ceil(categories) + self.overfetch
    }

    pub async fn sample(&self) -> AppResult<Vec<QuestionRecord>> {
        let per_category = self.per_category_request();

        let fetches = self
            .categories
            .iter()
            .map(|category| self.source.fetch_category(category, per_category));
        let outcomes = join_all(fetches).await;

        let mut buckets = Vec::with_capacity(outcomes.len());
        for (category, outcome) in self.categories.iter().zip(outcomes) {
            match outcome {
                Ok(records) => {
                    log::debug!("Fetched {} candidates from '{}'", records.len(), category);
                    buckets.push(records);
                }
                Err(err) => {
                    log::warn!("Skipping category '{}' after fetch failure: {}", category, err);
                }
            }
        }

        select_balanced(buckets, self.total, &mut rand::thread_rng())
    }
}

/// Picks exactly `total` distinct records, round-robin across buckets so each
/// category contributes as evenly as inventory allows, then shuffles.
pub fn select_balanced<R: Rng + ?Sized>(
    buckets: Vec<Vec<QuestionRecord>>,
    total: usize,
    rng: &mut R,
) -> AppResult<Vec<QuestionRecord>> {
    let mut seen = HashSet::new();
    let mut pools: Vec<Vec<QuestionRecord>> = buckets
        .into_iter()
        .map(|bucket| {
            let mut unique: Vec<QuestionRecord> = bucket
                .into_iter()
                .filter(|record| seen.insert(record.question_id.clone()))
                .collect();
            unique.shuffle(rng);
            unique
        })
        .collect();

    let available: usize = pools.iter().map(Vec::len).sum();
    if available < total {
        return Err(AppError::InsufficientInventory {
            available,
            required: total,
        });
    }

    let mut selection = Vec::with_capacity(total);
    while selection.len() < total {
        for pool in pools.iter_mut() {
            if selection.len() == total {
                break;
            }
            if let Some(record) = pool.pop() {
                selection.push(record);
            }
        }
    }

    selection.shuffle(rng);
    Ok(selection)
}
