//! Error types for the oasis-core library.
//!
//! Each module has its own error enum to provide clear error boundaries.
//! The library uses `thiserror` for structured, typed errors.

/// Errors related to configuration loading, parsing, and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required configuration field is absent.
    #[error("missing required config field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: String,
    },

    /// A configuration field has an unacceptable value.
    #[error("invalid value for config field '{field}': {message}")]
    InvalidValue {
        /// The name of the invalid field.
        field: String,
        /// A description of why the value is invalid.
        message: String,
    },

    /// The configuration file does not exist at the specified path.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// The path that was searched.
        path: String,
    },

    /// TOML deserialization failed.
    #[error("failed to parse config file: {source}")]
    ParseError {
        /// The underlying TOML parse error.
        #[source]
        source: toml::de::Error,
    },
}

/// Errors from SQLite storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Failed to connect to SQLite database.
    #[error("database connection error: {source}")]
    Connection {
        /// The underlying SQLx error.
        #[source]
        source: sqlx::Error,
    },

    /// Database migration failed.
    #[error("database migration error: {source}")]
    Migration {
        /// The underlying migration error.
        #[source]
        source: sqlx::migrate::MigrateError,
    },

    /// A database query failed.
    #[error("database query error: {source}")]
    Query {
        /// The underlying SQLx error.
        #[source]
        source: sqlx::Error,
    },
}

/// Errors surfaced from the Channel request/response bus.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The Platform closed the channel before replying.
    #[error("channel closed before a reply for request {request_id} arrived")]
    Closed {
        /// The request id that never received a reply.
        request_id: u64,
    },

    /// The calling task's await was cancelled.
    #[error("request {request_id} was cancelled")]
    Cancelled {
        /// The request id that was cancelled.
        request_id: u64,
    },
}

/// Precondition and resource failures raised by Platform handlers.
///
/// Precondition failures are expected and carried in the reply payload
/// (`{success: false, error}`), never as a Rust `Result::Err` crossing the
/// Platform boundary. This enum exists so handler bodies can
/// use `?` internally; [`crate::platform`] converts it to a reply.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// Caller violated a contract: duplicate follow, missing post, unknown
    /// group, self-rating when disabled, etc.
    #[error("{0}")]
    Precondition(String),

    /// An unexpected error occurred while applying a handler (store failure).
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for PlatformError {
    fn from(e: StoreError) -> Self {
        PlatformError::Internal(e.to_string())
    }
}

/// Errors from the recommendation engine.
#[derive(Debug, thiserror::Error)]
pub enum RecEngineError {
    /// The embedding backend failed or was unreachable.
    #[error("embedding backend error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// A store read/write failed during refresh.
    #[error("store error during rec refresh: {0}")]
    Store(#[from] StoreError),
}

/// Errors from interacting with LLM providers.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// HTTP request to the LLM endpoint failed.
    #[error("LLM HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// LLM API returned an error response.
    #[error("LLM API error (status {status}): {message}")]
    Api {
        /// The HTTP status code.
        status: u16,
        /// The error message from the API.
        message: String,
    },

    /// LLM response could not be parsed into tool calls or text.
    #[error("failed to parse LLM response: {0}")]
    Parse(String),

    /// The LLM call was cancelled by the driver.
    #[error("LLM call cancelled")]
    Cancelled,

    /// No LLM provider configured.
    #[error("no LLM provider configured")]
    NotConfigured,
}

/// Errors from the embedding backend used by the twhin/twitter RecEngine
/// strategies.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    /// HTTP request to the embedding endpoint failed.
    #[error("embedding HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Embedding API returned an error response.
    #[error("embedding API error (status {status}): {message}")]
    Api {
        /// The HTTP status code.
        status: u16,
        /// The error message from the API.
        message: String,
    },

    /// No embedding backend configured.
    #[error("no embedding backend configured")]
    NotConfigured,
}

/// Errors from ingesting agent profile data (CSV/JSON loaders).
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Failed to read the source file.
    #[error("failed to read profile source {path}: {source}")]
    Io {
        /// The path that failed to read.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// CSV parsing failed.
    #[error("failed to parse CSV profile source: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing failed.
    #[error("failed to parse JSON profile source: {0}")]
    Json(#[from] serde_json::Error),

    /// A list-literal column (e.g. `following_agentid_list`) was malformed.
    #[error("malformed list literal in column '{column}': {value}")]
    MalformedListLiteral {
        /// The column name.
        column: String,
        /// The raw value that failed to parse.
        value: String,
    },
}

/// Errors from the Environment Driver's step loop.
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    /// A request to the Platform (sign-up, scripted action, `recRefresh`,
    /// clock advance) never received a reply.
    #[error("driver channel error: {0}")]
    Channel(#[from] ChannelError),

    /// `reset()` was asked to sign up an agent id that was already
    /// registered for this driver.
    #[error("duplicate agent id {0} in driver registry")]
    DuplicateAgent(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_missing_field_message() {
        let err = ConfigError::MissingField {
            field: "recsys_type".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "missing required config field: recsys_type"
        );
    }

    #[test]
    fn config_error_file_not_found_message() {
        let err = ConfigError::FileNotFound {
            path: "/tmp/oasis.toml".to_string(),
        };
        assert_eq!(err.to_string(), "config file not found: /tmp/oasis.toml");
    }

    #[test]
    fn platform_error_precondition_message() {
        let err = PlatformError::Precondition("cannot rate own post".to_string());
        assert_eq!(err.to_string(), "cannot rate own post");
    }

    #[test]
    fn platform_error_from_store_error_is_internal() {
        let store_err = StoreError::Query {
            source: sqlx::Error::RowNotFound,
        };
        let err: PlatformError = store_err.into();
        assert!(matches!(err, PlatformError::Internal(_)));
    }

    #[test]
    fn llm_error_not_configured_message() {
        let err = LlmError::NotConfigured;
        assert_eq!(err.to_string(), "no LLM provider configured");
    }

    #[test]
    fn embedding_error_api_error_message() {
        let err = EmbeddingError::Api {
            status: 500,
            message: "internal".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "embedding API error (status 500): internal"
        );
    }

    #[test]
    fn ingest_error_malformed_list_literal_message() {
        let err = IngestError::MalformedListLiteral {
            column: "following_agentid_list".to_string(),
            value: "not-a-list".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "malformed list literal in column 'following_agentid_list': not-a-list"
        );
    }
}
