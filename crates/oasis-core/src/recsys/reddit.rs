//! The `reddit` (hot-score) RecEngine strategy: every user sees
//! the same slate, ranked by a Reddit-style time-biased score.

use crate::store::posts::Post;

/// Epoch offset (seconds) subtracted from a post's creation time before the
/// hot-score time term is computed. A fixed constant, not a tunable.
pub const REDDIT_HOT_SCORE_EPOCH_OFFSET: i64 = 1_134_028_003;

/// `sign(s)·log10(max(|s|,1)) + t/45000` where `s = likes - dislikes` and
/// `t` is epoch seconds since [`REDDIT_HOT_SCORE_EPOCH_OFFSET`].
pub fn hot_score(num_likes: i64, num_dislikes: i64, created_at_epoch_seconds: i64) -> f64 {
    let s = (num_likes - num_dislikes) as f64;
    let sign = if s > 0.0 {
        1.0
    } else if s < 0.0 {
        -1.0
    } else {
        0.0
    };
    let magnitude = s.abs().max(1.0);
    let t = (created_at_epoch_seconds - REDDIT_HOT_SCORE_EPOCH_OFFSET) as f64;
    sign * magnitude.log10() + t / 45_000.0
}

/// Produce the top `max_rec_post_len` post ids by hot score (descending),
/// given every post's epoch-seconds creation time resolved by the caller
/// (`created_epoch_seconds` must be index-aligned with `posts`).
pub fn top_post_ids(posts: &[Post], created_epoch_seconds: &[i64], max_rec_post_len: usize) -> Vec<i64> {
    let mut scored: Vec<(i64, f64)> = posts
        .iter()
        .zip(created_epoch_seconds.iter())
        .map(|(post, &t)| (post.id, hot_score(post.num_likes, post.num_dislikes, t)))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(max_rec_post_len);
    scored.into_iter().map(|(id, _)| id).collect()
}

/// Build the `(user_id, post_id)` rows for one refresh: every user gets the
/// same top-scored slate.
pub fn refresh(
    posts: &[Post],
    created_epoch_seconds: &[i64],
    user_ids: &[i64],
    max_rec_post_len: usize,
) -> Vec<(i64, i64)> {
    let slate = top_post_ids(posts, created_epoch_seconds, max_rec_post_len);
    let mut rows = Vec::with_capacity(user_ids.len() * slate.len());
    for &user_id in user_ids {
        for &post_id in &slate {
            rows.push((user_id, post_id));
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: i64, likes: i64, dislikes: i64) -> Post {
        Post {
            id,
            user_id: 1,
            original_post_id: None,
            content: Some("x".to_string()),
            quote_content: None,
            created_at: "0".to_string(),
            num_likes: likes,
            num_dislikes: dislikes,
            num_shares: 0,
            num_reports: 0,
        }
    }

    #[test]
    fn newer_post_with_equal_engagement_ranks_first() {
        let posts = vec![post(1, 10, 0), post(2, 10, 0)];
        let times = vec![REDDIT_HOT_SCORE_EPOCH_OFFSET, REDDIT_HOT_SCORE_EPOCH_OFFSET + 100];
        let ranked = top_post_ids(&posts, &times, 10);
        assert_eq!(ranked, vec![2, 1]);
    }

    #[test]
    fn negative_score_uses_negative_sign() {
        let score_positive = hot_score(10, 0, REDDIT_HOT_SCORE_EPOCH_OFFSET);
        let score_negative = hot_score(0, 10, REDDIT_HOT_SCORE_EPOCH_OFFSET);
        assert!(score_positive > 0.0);
        assert!(score_negative < 0.0);
    }

    #[test]
    fn zero_score_posts_rank_by_time_only() {
        let score = hot_score(0, 0, REDDIT_HOT_SCORE_EPOCH_OFFSET);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn refresh_gives_every_user_the_same_slate() {
        let posts = vec![post(1, 5, 0), post(2, 3, 0)];
        let times = vec![REDDIT_HOT_SCORE_EPOCH_OFFSET; 2];
        let rows = refresh(&posts, &times, &[1, 2, 3], 10);
        let slate_for_1: Vec<i64> = rows.iter().filter(|(u, _)| *u == 1).map(|(_, p)| *p).collect();
        let slate_for_2: Vec<i64> = rows.iter().filter(|(u, _)| *u == 2).map(|(_, p)| *p).collect();
        assert_eq!(slate_for_1, slate_for_2);
    }
}
