//! The `random` RecEngine strategy: shuffle all post ids and
//! give every user the same first `max_rec_post_len` of them.

use rand::seq::SliceRandom;

use crate::store::posts::Post;

/// Produce the `(user_id, post_id)` rows for one refresh under the random
/// strategy.
pub fn refresh(posts: &[Post], user_ids: &[i64], max_rec_post_len: usize) -> Vec<(i64, i64)> {
    let mut ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
    ids.shuffle(&mut rand::thread_rng());
    ids.truncate(max_rec_post_len);

    let mut rows = Vec::with_capacity(user_ids.len() * ids.len());
    for &user_id in user_ids {
        for &post_id in &ids {
            rows.push((user_id, post_id));
        }
    }
    rows
}
