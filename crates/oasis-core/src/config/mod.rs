//! Configuration management for the simulation engine.
//!
//! Three-layer configuration loading:
//! 1. Built-in defaults
//! 2. TOML config file
//! 3. Environment variable overrides (`OASIS_` prefix)

mod defaults;

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

use defaults::*;

/// The RecEngine strategy selected at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecsysType {
    /// Uniform random slate.
    Random,
    /// Reddit-style hot score ranking, identical slate for every user.
    Reddit,
    /// Embedding-based personalized ranking (the "hard path").
    Twhin,
    /// Legacy trace-aware similarity ranking with random swap-in.
    Twitter,
}

impl Default for RecsysType {
    fn default() -> Self {
        RecsysType::Random
    }
}

/// Selects the [`crate::clock::Clock`] variant the Platform constructs:
/// tick mode for Twitter-style runs, scaled mode for Reddit-style runs.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase", tag = "mode")]
pub enum ClockMode {
    /// Monotonic integer tick counter, advanced explicitly by the Driver.
    Tick,
    /// Real-time clock scaled by `k` against a fixed start instant.
    Scaled {
        /// One real second is `k` virtual seconds.
        #[serde(default = "default_clock_scale_k")]
        k: f64,
    },
}

impl Default for ClockMode {
    fn default() -> Self {
        ClockMode::Tick
    }
}

/// Top-level configuration for the simulation engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Selects the RecEngine strategy.
    #[serde(default)]
    pub recsys_type: RecsysType,

    /// Selects the Clock variant.
    #[serde(default)]
    pub clock_mode: ClockMode,

    /// Upper bound on posts returned per `refresh` from the `rec` pool.
    #[serde(default = "default_refresh_rec_post_count")]
    pub refresh_rec_post_count: u32,

    /// Upper bound on `rec` rows written per user per refresh.
    #[serde(default = "default_max_rec_post_len")]
    pub max_rec_post_len: u32,

    /// Top-liked followee posts added to each non-Reddit refresh.
    #[serde(default = "default_following_post_count")]
    pub following_post_count: u32,

    /// Permits a user to like/dislike their own posts/comments.
    #[serde(default)]
    pub allow_self_rating: bool,

    /// Reddit-style `score = likes - dislikes` displayed in place of
    /// separate counts, where the caller surfaces scores.
    #[serde(default)]
    pub show_score: bool,

    /// Window (in virtual days) considered by `trend`.
    #[serde(default = "default_trend_num_days")]
    pub trend_num_days: u32,

    /// Maximum posts returned by `trend`.
    #[serde(default = "default_trend_top_k")]
    pub trend_top_k: u32,

    /// Reserved for future moderation; currently informative only.
    #[serde(default = "default_report_threshold")]
    pub report_threshold: u32,

    /// Maximum concurrent agent LLM calls during a Driver step.
    #[serde(default = "default_semaphore")]
    pub semaphore: usize,

    /// Fraction of the "twitter legacy" slate swapped with random,
    /// not-yet-interacted-with posts.
    #[serde(default = "default_swap_rate")]
    pub swap_rate: f64,

    /// Database and persistence settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// LLM provider configuration.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Embedding backend configuration (used by the twhin/twitter strategies).
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            recsys_type: RecsysType::default(),
            clock_mode: ClockMode::default(),
            refresh_rec_post_count: default_refresh_rec_post_count(),
            max_rec_post_len: default_max_rec_post_len(),
            following_post_count: default_following_post_count(),
            allow_self_rating: false,
            show_score: false,
            trend_num_days: default_trend_num_days(),
            trend_top_k: default_trend_top_k(),
            report_threshold: default_report_threshold(),
            semaphore: default_semaphore(),
            swap_rate: default_swap_rate(),
            storage: StorageConfig::default(),
            llm: LlmConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

/// Database and persistence settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file, or `:memory:`/`sqlite::memory:` for
    /// an ephemeral run.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            db_path: default_db_path(),
        }
    }
}

/// LLM provider configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Provider name, e.g. `"openai"`, `"anthropic"`.
    #[serde(default)]
    pub provider: String,

    /// API key for the LLM provider.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Provider-specific model name.
    #[serde(default)]
    pub model: String,

    /// Override URL for custom/self-hosted endpoints.
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Embedding backend configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// Provider name, e.g. `"openai"`, or `"hash"` for the deterministic
    /// offline fallback used in tests.
    #[serde(default)]
    pub provider: String,

    /// API key for the embedding provider.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Provider-specific model name.
    #[serde(default)]
    pub model: String,

    /// Override URL for custom/self-hosted endpoints.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file with environment variable
    /// overrides applied afterward.
    ///
    /// Sequence: (1) determine config path (argument > `OASIS_CONFIG` env
    /// var > none), (2) parse TOML if a path resolved, else start from
    /// defaults, (3) apply environment variable overrides.
    pub fn load(config_path: Option<&str>) -> Result<Config, ConfigError> {
        let resolved = Self::resolve_config_path(config_path);

        let mut config = match resolved {
            Some((path, explicit)) => match std::fs::read_to_string(&path) {
                Ok(contents) => toml::from_str::<Config>(&contents)
                    .map_err(|e| ConfigError::ParseError { source: e })?,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    if explicit {
                        return Err(ConfigError::FileNotFound {
                            path: path.display().to_string(),
                        });
                    }
                    Config::default()
                }
                Err(_) => {
                    return Err(ConfigError::FileNotFound {
                        path: path.display().to_string(),
                    });
                }
            },
            None => Config::default(),
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load and validate, returning all validation errors at once.
    pub fn load_and_validate(config_path: Option<&str>) -> Result<Config, Vec<ConfigError>> {
        let config = Config::load(config_path).map_err(|e| vec![e])?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration, returning every violation found.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();

        if self.refresh_rec_post_count == 0 {
            errors.push(ConfigError::InvalidValue {
                field: "refresh_rec_post_count".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if self.max_rec_post_len == 0 {
            errors.push(ConfigError::InvalidValue {
                field: "max_rec_post_len".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if self.trend_top_k == 0 {
            errors.push(ConfigError::InvalidValue {
                field: "trend_top_k".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if self.semaphore == 0 {
            errors.push(ConfigError::InvalidValue {
                field: "semaphore".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.swap_rate) {
            errors.push(ConfigError::InvalidValue {
                field: "swap_rate".to_string(),
                message: "must be between 0.0 and 1.0".to_string(),
            });
        }
        if self.storage.db_path.is_empty() {
            errors.push(ConfigError::MissingField {
                field: "storage.db_path".to_string(),
            });
        }
        if let ClockMode::Scaled { k } = self.clock_mode {
            if k <= 0.0 {
                errors.push(ConfigError::InvalidValue {
                    field: "clock_mode.k".to_string(),
                    message: "must be greater than 0".to_string(),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn resolve_config_path(config_path: Option<&str>) -> Option<(PathBuf, bool)> {
        if let Some(path) = config_path {
            return Some((expand_tilde(path), true));
        }
        if let Ok(env_path) = env::var("OASIS_CONFIG") {
            return Some((expand_tilde(&env_path), true));
        }
        None
    }

    /// Apply `OASIS_` environment variable overrides.
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = env::var("OASIS_RECSYS_TYPE") {
            self.recsys_type = match val.to_lowercase().as_str() {
                "random" => RecsysType::Random,
                "reddit" => RecsysType::Reddit,
                "twhin" => RecsysType::Twhin,
                "twitter" => RecsysType::Twitter,
                other => {
                    return Err(ConfigError::InvalidValue {
                        field: "OASIS_RECSYS_TYPE".to_string(),
                        message: format!(
                            "'{other}' must be one of random, reddit, twhin, twitter"
                        ),
                    })
                }
            };
        }
        if let Ok(val) = env::var("OASIS_REFRESH_REC_POST_COUNT") {
            self.refresh_rec_post_count = parse_env(&"OASIS_REFRESH_REC_POST_COUNT", &val)?;
        }
        if let Ok(val) = env::var("OASIS_MAX_REC_POST_LEN") {
            self.max_rec_post_len = parse_env(&"OASIS_MAX_REC_POST_LEN", &val)?;
        }
        if let Ok(val) = env::var("OASIS_FOLLOWING_POST_COUNT") {
            self.following_post_count = parse_env(&"OASIS_FOLLOWING_POST_COUNT", &val)?;
        }
        if let Ok(val) = env::var("OASIS_ALLOW_SELF_RATING") {
            self.allow_self_rating = parse_env_bool("OASIS_ALLOW_SELF_RATING", &val)?;
        }
        if let Ok(val) = env::var("OASIS_SHOW_SCORE") {
            self.show_score = parse_env_bool("OASIS_SHOW_SCORE", &val)?;
        }
        if let Ok(val) = env::var("OASIS_TREND_NUM_DAYS") {
            self.trend_num_days = parse_env(&"OASIS_TREND_NUM_DAYS", &val)?;
        }
        if let Ok(val) = env::var("OASIS_TREND_TOP_K") {
            self.trend_top_k = parse_env(&"OASIS_TREND_TOP_K", &val)?;
        }
        if let Ok(val) = env::var("OASIS_REPORT_THRESHOLD") {
            self.report_threshold = parse_env(&"OASIS_REPORT_THRESHOLD", &val)?;
        }
        if let Ok(val) = env::var("OASIS_SEMAPHORE") {
            self.semaphore = parse_env(&"OASIS_SEMAPHORE", &val)?;
        }
        if let Ok(val) = env::var("OASIS_SWAP_RATE") {
            self.swap_rate = val.parse::<f64>().map_err(|_| ConfigError::InvalidValue {
                field: "OASIS_SWAP_RATE".to_string(),
                message: format!("'{val}' is not a valid f64"),
            })?;
        }
        if let Ok(val) = env::var("OASIS_CLOCK_MODE") {
            self.clock_mode = match val.to_lowercase().as_str() {
                "tick" => ClockMode::Tick,
                "scaled" => ClockMode::Scaled {
                    k: match &self.clock_mode {
                        ClockMode::Scaled { k } => *k,
                        ClockMode::Tick => default_clock_scale_k(),
                    },
                },
                other => {
                    return Err(ConfigError::InvalidValue {
                        field: "OASIS_CLOCK_MODE".to_string(),
                        message: format!("'{other}' must be one of tick, scaled"),
                    })
                }
            };
        }
        if let Ok(val) = env::var("OASIS_CLOCK_SCALE_K") {
            let k: f64 = val.parse().map_err(|_| ConfigError::InvalidValue {
                field: "OASIS_CLOCK_SCALE_K".to_string(),
                message: format!("'{val}' is not a valid f64"),
            })?;
            self.clock_mode = ClockMode::Scaled { k };
        }
        if let Ok(val) = env::var("OASIS_STORAGE__DB_PATH") {
            self.storage.db_path = val;
        }
        if let Ok(val) = env::var("OASIS_LLM__PROVIDER") {
            self.llm.provider = val;
        }
        if let Ok(val) = env::var("OASIS_LLM__API_KEY") {
            self.llm.api_key = Some(val);
        }
        if let Ok(val) = env::var("OASIS_LLM__MODEL") {
            self.llm.model = val;
        }
        if let Ok(val) = env::var("OASIS_LLM__BASE_URL") {
            self.llm.base_url = Some(val);
        }
        if let Ok(val) = env::var("OASIS_EMBEDDING__PROVIDER") {
            self.embedding.provider = val;
        }
        if let Ok(val) = env::var("OASIS_EMBEDDING__API_KEY") {
            self.embedding.api_key = Some(val);
        }
        if let Ok(val) = env::var("OASIS_EMBEDDING__MODEL") {
            self.embedding.model = val;
        }
        if let Ok(val) = env::var("OASIS_EMBEDDING__BASE_URL") {
            self.embedding.base_url = Some(val);
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(var_name: &str, val: &str) -> Result<T, ConfigError> {
    val.parse::<T>().map_err(|_| ConfigError::InvalidValue {
        field: var_name.to_string(),
        message: format!("'{val}' is not a valid value"),
    })
}

fn parse_env_bool(var_name: &str, val: &str) -> Result<bool, ConfigError> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: var_name.to_string(),
            message: format!("'{val}' is not a valid boolean (use true/false/1/0/yes/no)"),
        }),
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
