//! The recommendation engine: an offline batch job invoked by
//! the Platform that reads snapshots of `user`/`post`/`trace`/`rec` and
//! writes a fresh `rec` table under one of four pluggable strategies.

pub mod embedding;
pub mod random;
pub mod reddit;
pub mod twhin;
pub mod twitter;

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::RecsysType;
use crate::error::RecEngineError;
use crate::store::{self, DbPool};
use embedding::EmbeddingProvider;
use twhin::TwhinCache;

/// The RecEngine: holds the strategy selected at construction time plus any
/// strategy-specific state (the twhin caches, the embedding provider).
pub struct RecEngine {
    strategy: RecsysType,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    twhin_cache: TwhinCache,
    max_rec_post_len: usize,
    swap_rate: f64,
}

impl RecEngine {
    /// Build a RecEngine for `strategy`, backed by `embedding_provider` for
    /// the embedding-dependent strategies (twhin/twitter).
    pub fn new(
        strategy: RecsysType,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        max_rec_post_len: usize,
        swap_rate: f64,
    ) -> Self {
        Self {
            strategy,
            embedding_provider,
            twhin_cache: TwhinCache::default(),
            max_rec_post_len,
            swap_rate,
        }
    }

    /// Mutable access to the twhin cache, so the Platform can keep it
    /// up to date as posts/users change and tests can clear it between runs.
    pub fn twhin_cache_mut(&mut self) -> &mut TwhinCache {
        &mut self.twhin_cache
    }

    /// Recompute the `rec` table for every known user and write it via
    /// [`store::rec::replace_all`]. On any failure the previous `rec`
    /// contents are left untouched — a resource failure aborts the refresh
    /// rather than leaving a partially-written table.
    pub async fn refresh(&mut self, pool: &DbPool, now_epoch: i64) -> Result<(), RecEngineError> {
        let posts = store::posts::list_posts(pool).await?;
        let users = store::users::list_users(pool).await?;
        let user_ids: Vec<i64> = users.iter().map(|u| u.id).collect();

        if posts.len() <= self.max_rec_post_len {
            let rows: Vec<(i64, i64)> = user_ids
                .iter()
                .flat_map(|&u| posts.iter().map(move |p| (u, p.id)))
                .collect();
            store::rec::replace_all(pool, &rows).await?;
            return Ok(());
        }

        let rows = match self.strategy {
            RecsysType::Random => random::refresh(&posts, &user_ids, self.max_rec_post_len),
            RecsysType::Reddit => {
                let times: Vec<i64> = posts
                    .iter()
                    .map(|p| parse_epoch_seconds(&p.created_at))
                    .collect();
                reddit::refresh(&posts, &times, &user_ids, self.max_rec_post_len)
            }
            RecsysType::Twhin => {
                self.ensure_twhin_cache_populated(pool, &posts, &users).await?;
                let mut recent_liked = HashMap::new();
                for &user_id in &user_ids {
                    let liked = store::ratings::recent_liked_post_ids(pool, user_id, 5).await?;
                    recent_liked.insert(user_id, liked);
                }
                twhin::refresh(
                    self.embedding_provider.as_ref(),
                    &self.twhin_cache,
                    &user_ids,
                    &posts,
                    &recent_liked,
                    now_epoch,
                    self.max_rec_post_len,
                )
                .await?
            }
            RecsysType::Twitter => self.refresh_twitter(pool, &posts, &users).await?,
        };

        store::rec::replace_all(pool, &rows).await?;
        Ok(())
    }

    async fn ensure_twhin_cache_populated(
        &mut self,
        pool: &DbPool,
        posts: &[store::posts::Post],
        users: &[store::users::User],
    ) -> Result<(), RecEngineError> {
        for post in posts {
            self.twhin_cache
                .post_content
                .entry(post.id)
                .or_insert_with(|| post.content.clone().or_else(|| post.quote_content.clone()).unwrap_or_default());
            self.twhin_cache
                .post_created_epoch
                .entry(post.id)
                .or_insert_with(|| parse_epoch_seconds(&post.created_at));
        }
        for user in users {
            self.twhin_cache
                .author_followers
                .entry(user.id)
                .or_insert(user.num_followers);
            self.twhin_cache.user_bio.entry(user.id).or_insert_with(|| {
                format!("{} {}", user.display_name, user.bio)
            });
        }
        let _ = pool;
        Ok(())
    }

    async fn refresh_twitter(
        &self,
        pool: &DbPool,
        posts: &[store::posts::Post],
        users: &[store::users::User],
    ) -> Result<Vec<(i64, i64)>, RecEngineError> {
        let post_ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        let post_texts: Vec<String> = posts
            .iter()
            .map(|p| p.content.clone().or_else(|| p.quote_content.clone()).unwrap_or_default())
            .collect();
        let user_texts: Vec<String> = users
            .iter()
            .map(|u| format!("{} {}", u.display_name, u.bio))
            .collect();

        let mut batch = user_texts.clone();
        batch.extend(post_texts.clone());
        let embeddings = self.embedding_provider.embed_batch(&batch).await?;
        let (user_vectors, post_vectors) = embeddings.split_at(users.len());
        let post_vector_by_id: HashMap<i64, Vec<f64>> = post_ids
            .iter()
            .zip(post_vectors.iter())
            .map(|(&id, v)| (id, v.clone()))
            .collect();

        let mut rows = Vec::new();
        for (idx, user) in users.iter().enumerate() {
            let (liked_ids, disliked_ids) =
                store::ratings::liked_and_disliked_post_ids(pool, user.id).await?;
            let liked_vectors: Vec<Vec<f64>> = liked_ids
                .iter()
                .filter_map(|id| post_vector_by_id.get(id).cloned())
                .collect();
            let disliked_vectors: Vec<Vec<f64>> = disliked_ids
                .iter()
                .filter_map(|id| post_vector_by_id.get(id).cloned())
                .collect();

            let mut slate = twitter::rank(
                &post_ids,
                post_vectors,
                &user_vectors[idx],
                &liked_vectors,
                &disliked_vectors,
                self.max_rec_post_len,
            );

            let interacted: std::collections::HashSet<i64> =
                liked_ids.iter().chain(disliked_ids.iter()).copied().collect();
            let candidate_pool: Vec<i64> = post_ids
                .iter()
                .copied()
                .filter(|id| !interacted.contains(id))
                .collect();
            twitter::swap_random_posts(&mut slate, self.swap_rate, &candidate_pool);

            rows.extend(slate.into_iter().map(|post_id| (user.id, post_id)));
        }
        Ok(rows)
    }
}

/// Parse the opaque `created_at` string as epoch seconds: a bare integer in
/// tick mode, an RFC3339 datetime in scaled mode.
fn parse_epoch_seconds(created_at: &str) -> i64 {
    if let Ok(tick) = created_at.parse::<i64>() {
        return tick;
    }
    chrono::DateTime::parse_from_rfc3339(created_at)
        .map(|dt| dt.timestamp())
        .unwrap_or(0)
}
