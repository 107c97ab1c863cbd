//! Decoded payload shapes for the remote API.
//!
//! Only the fields the crawl actually consumes are declared; everything else
//! in a response is dropped at deserialization time, which doubles as the
//! trimming step before tweets are persisted.

use super::id::{TweetId, UserId};
use serde::{Deserialize, Serialize};

/// A user profile as returned by the single and batch lookup endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub id_str: UserId,
    pub screen_name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub friends_count: u64,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub statuses_count: u64,
    #[serde(default)]
    pub favourites_count: u64,
    #[serde(default)]
    pub protected: bool,
}

/// One page of a cursor walk over a friends or followers list.
#[derive(Debug, Clone, Deserialize)]
pub struct IdPage {
    #[serde(default)]
    pub ids: Vec<UserId>,
    pub next_cursor_str: String,
}

/// A single timeline entry, trimmed to the fields worth keeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tweet {
    pub id_str: TweetId,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub text: String,
    pub user: TweetAuthor,
    #[serde(default)]
    pub favorite_count: u64,
    #[serde(default)]
    pub retweet_count: u64,
    #[serde(default)]
    pub entities: TweetEntities,
    #[serde(default)]
    pub lang: Option<String>,
}

/// The author reference embedded in a tweet fetched with `trim_user`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetAuthor {
    pub id_str: UserId,
}

/// Entity references extracted by the API from a tweet's text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TweetEntities {
    #[serde(default)]
    pub hashtags: Vec<HashtagRef>,
    #[serde(default)]
    pub urls: Vec<UrlRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashtagRef {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlRef {
    #[serde(default)]
    pub expanded_url: Option<String>,
}
