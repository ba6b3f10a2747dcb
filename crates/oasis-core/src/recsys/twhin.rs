//! The `twhin` (embedding-based, personalized) RecEngine strategy — the
//! hardest of the four to get right.
//!
//! Scoring combines a content-independent *prior* (how fresh and how
//! well-followed the author is) with a content-dependent cosine similarity
//! between a user's profile and a post, plus an optional like-affinity term
//! nudging the score toward posts similar to what the user has recently
//! liked.

use std::collections::HashMap;

use crate::error::RecEngineError;
use crate::recsys::embedding::{cosine_similarity, EmbeddingProvider};
use crate::store::posts::Post;

/// Time-decay window constant for the prior-score time term.
const TIME_SCORE_T: f64 = 271.8;
/// Number of recent likes folded into the like-affinity term.
const LIKE_AFFINITY_WINDOW: usize = 5;

/// Process-wide caches the twhin strategy maintains between refreshes,
/// owned by the Platform and never shared with Agents.
#[derive(Debug, Default, Clone)]
pub struct TwhinCache {
    /// Per-user profile text, augmented with a `"Recent post: …"` suffix
    /// reflecting that user's latest post.
    pub user_bio: HashMap<i64, String>,
    /// Per-post content text (root content for reposts/quotes is resolved
    /// by the caller before populating this).
    pub post_content: HashMap<i64, String>,
    /// Per-post creation time, in epoch seconds.
    pub post_created_epoch: HashMap<i64, i64>,
    /// Per-author follower count at cache time.
    pub author_followers: HashMap<i64, i64>,
}

impl TwhinCache {
    /// Drop all cached state. Mirrors the original's `reset_globals`, scoped
    /// to an instance the Platform owns rather than a process global.
    pub fn clear(&mut self) {
        self.user_bio.clear();
        self.post_content.clear();
        self.post_created_epoch.clear();
        self.author_followers.clear();
    }

    /// Update a user's cached bio text, appending the recent-post suffix if
    /// `latest_post_content` is given.
    pub fn set_user_bio(&mut self, user_id: i64, bio: &str, latest_post_content: Option<&str>) {
        let text = match latest_post_content {
            Some(post) => format!("{bio}\nRecent post: {post}"),
            None => bio.to_string(),
        };
        self.user_bio.insert(user_id, text);
    }
}

/// `log((T − (now − created))/100)`, capped so the argument to `log` stays
/// positive (the denominator shrinks toward an epsilon rather than going
/// non-positive as a post ages past the window).
pub fn time_score(now_epoch: i64, created_epoch: i64) -> f64 {
    let elapsed = (now_epoch - created_epoch) as f64;
    let denom = ((TIME_SCORE_T - elapsed) / 100.0).max(1e-6);
    denom.ln()
}

/// `max(1, log(followers+1)/log(1000))`.
pub fn audience_score(followers: i64) -> f64 {
    let score = ((followers + 1) as f64).ln() / 1000_f64.ln();
    score.max(1.0)
}

/// `time_score * audience_score`, the content-independent prior for a post.
pub fn prior_score(now_epoch: i64, created_epoch: i64, followers: i64) -> f64 {
    time_score(now_epoch, created_epoch) * audience_score(followers)
}

/// Compute the refresh rows for every user in `user_ids`, against every post
/// in `posts`, using `cache` for prior-score inputs and `provider` to embed
/// bios/content in one combined batch.
///
/// `recent_liked_post_ids` maps a user id to their most-recently-liked post
/// ids (already ordered newest-first, already capped to
/// [`LIKE_AFFINITY_WINDOW`] by the caller is not required — this function
/// pads/truncates itself).
pub async fn refresh(
    provider: &dyn EmbeddingProvider,
    cache: &TwhinCache,
    user_ids: &[i64],
    posts: &[Post],
    recent_liked_post_ids: &HashMap<i64, Vec<i64>>,
    now_epoch: i64,
    max_rec_post_len: usize,
) -> Result<Vec<(i64, i64)>, RecEngineError> {
    if posts.is_empty() || user_ids.is_empty() {
        return Ok(Vec::new());
    }

    let user_bios: Vec<String> = user_ids
        .iter()
        .map(|id| cache.user_bio.get(id).cloned().unwrap_or_default())
        .collect();
    let post_contents: Vec<String> = posts
        .iter()
        .map(|p| cache.post_content.get(&p.id).cloned().unwrap_or_default())
        .collect();

    let mut batch = user_bios.clone();
    batch.extend(post_contents.clone());
    let embeddings = provider.embed_batch(&batch).await?;
    let (user_vectors, post_vectors) = embeddings.split_at(user_ids.len());

    let priors: Vec<f64> = posts
        .iter()
        .map(|p| {
            let created = cache.post_created_epoch.get(&p.id).copied().unwrap_or(now_epoch);
            let followers = cache.author_followers.get(&p.user_id).copied().unwrap_or(0);
            prior_score(now_epoch, created, followers)
        })
        .collect();

    let post_vector_by_id: HashMap<i64, &Vec<f64>> = posts
        .iter()
        .zip(post_vectors.iter())
        .map(|(p, v)| (p.id, v))
        .collect();

    let mut rows = Vec::new();
    for (u_idx, &user_id) in user_ids.iter().enumerate() {
        let user_vector = &user_vectors[u_idx];
        let affinity_vectors = like_affinity_vectors(
            recent_liked_post_ids.get(&user_id).map(Vec::as_slice).unwrap_or(&[]),
            &post_vector_by_id,
            user_vector,
        );

        let mut scored: Vec<(i64, f64)> = posts
            .iter()
            .enumerate()
            .map(|(p_idx, post)| {
                let base = cosine_similarity(user_vector, &post_vectors[p_idx]) * priors[p_idx];
                let affinity = if affinity_vectors.is_empty() {
                    0.0
                } else {
                    affinity_vectors
                        .iter()
                        .map(|v| cosine_similarity(v, &post_vectors[p_idx]))
                        .sum::<f64>()
                        / affinity_vectors.len() as f64
                };
                (post.id, base + affinity)
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(max_rec_post_len);
        rows.extend(scored.into_iter().map(|(post_id, _)| (user_id, post_id)));
    }

    Ok(rows)
}

/// Resolve the up-to-five most recent liked post vectors, padded by
/// repeating the latest when fewer than five exist, falling back to the
/// user's own profile vector when there are none at all.
fn like_affinity_vectors<'a>(
    recent_liked_post_ids: &[i64],
    post_vector_by_id: &HashMap<i64, &'a Vec<f64>>,
    user_vector: &'a [f64],
) -> Vec<Vec<f64>> {
    let mut vectors: Vec<Vec<f64>> = recent_liked_post_ids
        .iter()
        .filter_map(|id| post_vector_by_id.get(id).map(|v| (*v).clone()))
        .take(LIKE_AFFINITY_WINDOW)
        .collect();

    if vectors.is_empty() {
        return vec![user_vector.to_vec()];
    }
    while vectors.len() < LIKE_AFFINITY_WINDOW {
        let latest = vectors[0].clone();
        vectors.push(latest);
    }
    vectors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recsys::embedding::HashEmbeddingProvider;

    fn post(id: i64, user_id: i64, content: &str) -> Post {
        Post {
            id,
            user_id,
            original_post_id: None,
            content: Some(content.to_string()),
            quote_content: None,
            created_at: "0".to_string(),
            num_likes: 0,
            num_dislikes: 0,
            num_shares: 0,
            num_reports: 0,
        }
    }

    #[test]
    fn time_score_decreases_as_post_ages() {
        let fresh = time_score(1000, 990);
        let stale = time_score(1000, 500);
        assert!(fresh > stale);
    }

    #[test]
    fn audience_score_floors_at_one() {
        assert_eq!(audience_score(0), 1.0);
        assert!(audience_score(10_000) > 1.0);
    }

    #[tokio::test]
    async fn refresh_returns_at_most_max_rec_post_len_per_user() {
        let provider = HashEmbeddingProvider::new(16);
        let mut cache = TwhinCache::default();
        cache.set_user_bio(1, "loves rust", None);
        for i in 1..=5 {
            cache.post_content.insert(i, format!("post number {i}"));
            cache.post_created_epoch.insert(i, 1000);
            cache.author_followers.insert(2, 10);
        }
        let posts: Vec<Post> = (1..=5).map(|i| post(i, 2, &format!("post number {i}"))).collect();

        let rows = refresh(&provider, &cache, &[1], &posts, &HashMap::new(), 1001, 2)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn like_affinity_pads_by_repeating_latest() {
        let mut map: HashMap<i64, &Vec<f64>> = HashMap::new();
        let v = vec![1.0, 0.0];
        map.insert(1, &v);
        let user_vector = vec![0.0, 1.0];
        let vectors = like_affinity_vectors(&[1], &map, &user_vector);
        assert_eq!(vectors.len(), LIKE_AFFINITY_WINDOW);
        assert!(vectors.iter().all(|x| x == &v));
    }

    #[test]
    fn like_affinity_falls_back_to_profile_vector_when_empty() {
        let map: HashMap<i64, &Vec<f64>> = HashMap::new();
        let user_vector = vec![0.5, 0.5];
        let vectors = like_affinity_vectors(&[], &map, &user_vector);
        assert_eq!(vectors, vec![user_vector]);
    }
}
