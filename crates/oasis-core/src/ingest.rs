//! Agent profile ingest: Twitter-mode CSV and Reddit-mode JSON
//! profile loaders, plus the `list_literal` parser for the CSV's
//! bracketed-list columns.
//!
//! Unknown columns are ignored; missing optional columns default to
//! zero/empty.

use std::path::Path;

use serde::Deserialize;

use crate::error::IngestError;

/// A Twitter-mode profile row.
#[derive(Debug, Clone, PartialEq)]
pub struct TwitterProfile {
    /// Agent id, assigned as the row's 0-based position in the CSV.
    pub agent_id: i64,
    pub username: String,
    pub name: String,
    pub description: String,
    pub user_char: String,
    /// Parsed `following_agentid_list` column.
    pub following_agent_ids: Vec<i64>,
    /// Parsed `previous_tweets` column.
    pub previous_tweets: Vec<String>,
    pub following_count: i64,
    pub followers_count: i64,
}

/// A Reddit-mode profile row.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RedditProfile {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub realname: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub persona: String,
    #[serde(default)]
    pub mbti: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub age: i64,
    #[serde(default)]
    pub country: String,
}

/// Parse a Python-style bracketed list literal (e.g.
/// `"['alice', 'it was a dark, stormy night', 'bob']"`) into its elements,
/// trimming surrounding quotes/whitespace from each one. Commas inside a
/// quoted element do not split it. An empty or `"[]"` input yields an empty
/// vec.
pub fn list_literal(raw: &str) -> Result<Vec<String>, IngestError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| IngestError::MalformedListLiteral {
            column: String::new(),
            value: raw.to_string(),
        })?;
    let inner = inner.trim();
    if inner.is_empty() {
        return Ok(Vec::new());
    }

    let mut items = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for c in inner.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == ',' => {
                items.push(current.trim().to_string());
                current = String::new();
            }
            None => current.push(c),
        }
    }
    items.push(current.trim().to_string());
    Ok(items)
}

fn parse_int_list(raw: &str, column: &str) -> Result<Vec<i64>, IngestError> {
    list_literal(raw)?
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>().map_err(|_| IngestError::MalformedListLiteral {
                column: column.to_string(),
                value: s,
            })
        })
        .collect()
}

/// Load a Twitter-mode profile CSV. `agent_id` is assigned by row order.
pub fn load_twitter_csv(path: &Path) -> Result<Vec<TwitterProfile>, IngestError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path).map_err(|e| match e.into_kind() {
        csv::ErrorKind::Io(source) => IngestError::Io { path: path.display().to_string(), source },
        kind => IngestError::Csv(csv::Error::new(kind)),
    })?;

    let headers = reader.headers().map_err(IngestError::Csv)?.clone();
    let col = |name: &str| headers.iter().position(|h| h == name);

    let username_col = col("username");
    let name_col = col("name");
    let description_col = col("description");
    let user_char_col = col("user_char");
    let following_col = col("following_agentid_list");
    let tweets_col = col("previous_tweets");
    let following_count_col = col("following_count");
    let followers_count_col = col("followers_count");

    let mut profiles = Vec::new();
    for (row_index, record) in reader.records().enumerate() {
        let record = record.map_err(IngestError::Csv)?;
        let field = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("");

        profiles.push(TwitterProfile {
            agent_id: row_index as i64,
            username: field(username_col).to_string(),
            name: field(name_col).to_string(),
            description: field(description_col).to_string(),
            user_char: field(user_char_col).to_string(),
            following_agent_ids: parse_int_list(field(following_col), "following_agentid_list")?,
            previous_tweets: list_literal(field(tweets_col))?,
            following_count: field(following_count_col).parse().unwrap_or(0),
            followers_count: field(followers_count_col).parse().unwrap_or(0),
        });
    }
    Ok(profiles)
}

/// Load a Reddit-mode profile JSON array.
pub fn load_reddit_json(path: &Path) -> Result<Vec<RedditProfile>, IngestError> {
    let bytes = std::fs::read(path).map_err(|source| IngestError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let profiles: Vec<RedditProfile> = serde_json::from_slice(&bytes)?;
    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn list_literal_splits_simple_ints() {
        assert_eq!(list_literal("[1, 2, 3]").unwrap(), vec!["1", "2", "3"]);
    }

    #[test]
    fn list_literal_empty_bracket_is_empty_vec() {
        assert_eq!(list_literal("[]").unwrap(), Vec::<String>::new());
        assert_eq!(list_literal("").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn list_literal_preserves_commas_inside_quotes() {
        let parsed = list_literal("['hello, world', 'second tweet']").unwrap();
        assert_eq!(parsed, vec!["hello, world", "second tweet"]);
    }

    #[test]
    fn list_literal_rejects_unbracketed_input() {
        let err = list_literal("1, 2, 3").unwrap_err();
        assert!(matches!(err, IngestError::MalformedListLiteral { .. }));
    }

    #[test]
    fn load_twitter_csv_parses_known_columns_and_ignores_unknown() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "username,name,description,user_char,following_agentid_list,previous_tweets,following_count,followers_count,unknown_col"
        )
        .unwrap();
        writeln!(
            file,
            "alice,Alice,bio text,curious,\"[1, 2]\",\"['hi there', 'second, tweet']\",2,10,ignored"
        )
        .unwrap();

        let profiles = load_twitter_csv(file.path()).unwrap();
        assert_eq!(profiles.len(), 1);
        let p = &profiles[0];
        assert_eq!(p.agent_id, 0);
        assert_eq!(p.username, "alice");
        assert_eq!(p.following_agent_ids, vec![1, 2]);
        assert_eq!(p.previous_tweets, vec!["hi there", "second, tweet"]);
        assert_eq!(p.following_count, 2);
        assert_eq!(p.followers_count, 10);
    }

    #[test]
    fn load_twitter_csv_defaults_missing_optional_columns() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "username,name").unwrap();
        writeln!(file, "bob,Bob").unwrap();

        let profiles = load_twitter_csv(file.path()).unwrap();
        assert_eq!(profiles[0].following_agent_ids, Vec::<i64>::new());
        assert_eq!(profiles[0].following_count, 0);
        assert_eq!(profiles[0].followers_count, 0);
    }

    #[test]
    fn load_reddit_json_parses_persona_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"username": "u1", "realname": "Real One", "bio": "hi", "persona": "curious", "mbti": "INTJ", "gender": "f", "age": 30, "country": "US"}}]"#
        )
        .unwrap();

        let profiles = load_reddit_json(file.path()).unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].mbti, "INTJ");
        assert_eq!(profiles[0].age, 30);
    }
}
