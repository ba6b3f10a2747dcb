//! Default value functions for [`super::Config`]'s `#[serde(default = "...")]`
//! fields, kept in their own module so the main struct stays readable.

pub fn default_refresh_rec_post_count() -> u32 {
    2
}

pub fn default_max_rec_post_len() -> u32 {
    100
}

pub fn default_following_post_count() -> u32 {
    3
}

pub fn default_trend_num_days() -> u32 {
    7
}

pub fn default_trend_top_k() -> u32 {
    10
}

pub fn default_report_threshold() -> u32 {
    100
}

pub fn default_semaphore() -> usize {
    128
}

pub fn default_swap_rate() -> f64 {
    0.1
}

pub fn default_db_path() -> String {
    "oasis.db".to_string()
}

pub fn default_clock_scale_k() -> f64 {
    1.0
}
