//! The `twitter` (legacy, trace-aware) RecEngine strategy.
//!
//! Base ranking is cosine similarity between a user's bio and a post's
//! content; it is then nudged by how similar the post is to posts the user
//! has liked versus disliked, and finally a fraction of the slate is swapped
//! for posts the user has not interacted with at all — preserving some
//! exploration the way the original `rec_sys_personalized_with_trace` does.

use std::collections::HashSet;

use rand::seq::SliceRandom;

use crate::recsys::embedding::cosine_similarity;

/// Rank candidate post indices for one user.
///
/// `user_vector` is the user's bio embedding; `post_vectors` are the
/// candidate posts' content embeddings (index-aligned with `post_ids`);
/// `liked_vectors`/`disliked_vectors` are embeddings of posts the user has
/// rated. Returns post ids ordered best-first, truncated to
/// `max_rec_post_len`.
pub fn rank(
    post_ids: &[i64],
    post_vectors: &[Vec<f64>],
    user_vector: &[f64],
    liked_vectors: &[Vec<f64>],
    disliked_vectors: &[Vec<f64>],
    max_rec_post_len: usize,
) -> Vec<i64> {
    let base: Vec<f64> = post_vectors
        .iter()
        .map(|pv| cosine_similarity(user_vector, pv))
        .collect();

    let raw_adjustments: Vec<f64> = post_vectors
        .iter()
        .map(|pv| trace_adjustment(pv, liked_vectors, disliked_vectors))
        .collect();

    let (min_base, max_base) = range(&base);
    let adjustments = normalize_similarity_adjustments(&raw_adjustments, min_base, max_base);

    let mut scored: Vec<(i64, f64)> = post_ids
        .iter()
        .zip(base.iter().zip(adjustments.iter()))
        .map(|(&id, (&b, &adj))| (id, b + adj))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(max_rec_post_len);
    scored.into_iter().map(|(id, _)| id).collect()
}

/// Mean cosine similarity to liked posts minus mean cosine similarity to
/// disliked posts; zero terms contribute zero.
fn trace_adjustment(post_vector: &[f64], liked: &[Vec<f64>], disliked: &[Vec<f64>]) -> f64 {
    let liked_term = mean_similarity(post_vector, liked);
    let disliked_term = mean_similarity(post_vector, disliked);
    liked_term - disliked_term
}

fn mean_similarity(post_vector: &[f64], vectors: &[Vec<f64>]) -> f64 {
    if vectors.is_empty() {
        return 0.0;
    }
    vectors.iter().map(|v| cosine_similarity(post_vector, v)).sum::<f64>() / vectors.len() as f64
}

fn range(values: &[f64]) -> (f64, f64) {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if values.is_empty() {
        (0.0, 0.0)
    } else {
        (min, max)
    }
}

/// Rescale `adjustments` linearly so they span the same `[min, max]` range
/// as the base similarity scores, so the trace-similarity term contributes
/// proportionally rather than dominating or vanishing by its own scale.
pub fn normalize_similarity_adjustments(adjustments: &[f64], target_min: f64, target_max: f64) -> Vec<f64> {
    let (min, max) = range(adjustments);
    if (max - min).abs() < 1e-12 {
        return adjustments.iter().map(|_| 0.0).collect();
    }
    adjustments
        .iter()
        .map(|v| target_min + (v - min) * (target_max - target_min) / (max - min))
        .collect()
}

/// Replace `swap_rate` fraction of `slate` with posts from `candidate_pool`
/// the user has not interacted with (`candidate_pool` must already exclude
/// posts the user liked/disliked/authored — the caller filters that).
pub fn swap_random_posts(slate: &mut Vec<i64>, swap_rate: f64, candidate_pool: &[i64]) {
    if slate.is_empty() || candidate_pool.is_empty() || swap_rate <= 0.0 {
        return;
    }
    let already_in_slate: HashSet<i64> = slate.iter().copied().collect();
    let mut pool: Vec<i64> = candidate_pool
        .iter()
        .copied()
        .filter(|id| !already_in_slate.contains(id))
        .collect();
    if pool.is_empty() {
        return;
    }
    pool.shuffle(&mut rand::thread_rng());

    let swap_count = ((slate.len() as f64) * swap_rate).round() as usize;
    let swap_count = swap_count.min(pool.len()).min(slate.len());
    for i in 0..swap_count {
        slate[slate.len() - 1 - i] = pool[i];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_prefers_posts_closer_to_liked_traces() {
        let post_ids = vec![1, 2];
        let post_vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let user_vector = vec![0.5, 0.5];
        let liked = vec![vec![1.0, 0.0]];
        let disliked = vec![vec![0.0, 1.0]];
        let ranked = rank(&post_ids, &post_vectors, &user_vector, &liked, &disliked, 2);
        assert_eq!(ranked[0], 1);
    }

    #[test]
    fn normalize_handles_constant_input() {
        let out = normalize_similarity_adjustments(&[0.5, 0.5, 0.5], -1.0, 1.0);
        assert_eq!(out, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn swap_random_posts_replaces_fraction_of_slate() {
        let mut slate: Vec<i64> = (0..10).collect();
        let pool: Vec<i64> = (100..110).collect();
        swap_random_posts(&mut slate, 0.1, &pool);
        let swapped_in_count = slate.iter().filter(|id| **id >= 100).count();
        assert_eq!(swapped_in_count, 1);
    }

    #[test]
    fn swap_random_posts_is_noop_with_zero_rate() {
        let mut slate: Vec<i64> = (0..10).collect();
        let original = slate.clone();
        let pool: Vec<i64> = (100..110).collect();
        swap_random_posts(&mut slate, 0.0, &pool);
        assert_eq!(slate, original);
    }
}
