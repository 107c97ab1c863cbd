//! Hashtag and URL tallies over a user's timeline.

use super::api::Tweet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// Hosts whose status permalinks are self-referential noise rather than
/// outbound links.
const PERMALINK_HOSTS: &[&str] = &["twitter.com", "www.twitter.com"];
const PERMALINK_PATH_PREFIX: &str = "/i/web/status/";

/// Per-user aggregate of entity occurrences.
///
/// Derived entirely from the user's tweets; every occurrence counts, repeats
/// within a single tweet included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityTally {
    pub hashtags: BTreeMap<String, u64>,
    pub hashtags_count: u64,
    pub urls: BTreeMap<String, u64>,
    pub urls_count: u64,
}

impl EntityTally {
    /// Build a tally from a single pass over the given tweets.
    #[must_use]
    pub fn from_tweets<'a>(tweets: impl IntoIterator<Item = &'a Tweet>) -> Self {
        let mut tally = Self::default();
        for tweet in tweets {
            tally.observe(tweet);
        }
        tally
    }

    /// Fold one tweet's entities into the tally.
    pub fn observe(&mut self, tweet: &Tweet) {
        for hashtag in &tweet.entities.hashtags {
            *self.hashtags.entry(hashtag.text.clone()).or_insert(0) += 1;
            self.hashtags_count += 1;
        }

        for url_ref in &tweet.entities.urls {
            let Some(expanded) = &url_ref.expanded_url else {
                continue;
            };
            if is_status_permalink(expanded) {
                continue;
            }
            *self.urls.entry(expanded.clone()).or_insert(0) += 1;
            self.urls_count += 1;
        }
    }
}

/// Whether a URL merely points back at the API's own status-permalink pages.
fn is_status_permalink(raw: &str) -> bool {
    Url::parse(raw).is_ok_and(|url| {
        url.host_str().is_some_and(|host| PERMALINK_HOSTS.contains(&host)) && url.path().starts_with(PERMALINK_PATH_PREFIX)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tweet(hashtags: &[&str], urls: &[&str]) -> Tweet {
        serde_json::from_value(serde_json::json!({
            "id_str": "1",
            "text": "",
            "user": {"id_str": "2"},
            "entities": {
                "hashtags": hashtags.iter().map(|t| serde_json::json!({"text": t})).collect::<Vec<_>>(),
                "urls": urls.iter().map(|u| serde_json::json!({"expanded_url": u})).collect::<Vec<_>>()
            }
        }))
        .unwrap()
    }

    #[test]
    fn hashtags_count_every_occurrence() {
        let tweets = vec![tweet(&["rust", "rust"], &[]), tweet(&["rust"], &[])];
        let tally = EntityTally::from_tweets(&tweets);

        assert_eq!(tally.hashtags.get("rust"), Some(&3));
        assert_eq!(tally.hashtags_count, 3);
    }

    #[test]
    fn urls_are_tallied() {
        let tweets = vec![tweet(&[], &["https://example.com/a", "https://example.com/a", "https://example.com/b"])];
        let tally = EntityTally::from_tweets(&tweets);

        assert_eq!(tally.urls.get("https://example.com/a"), Some(&2));
        assert_eq!(tally.urls.get("https://example.com/b"), Some(&1));
        assert_eq!(tally.urls_count, 3);
    }

    #[test]
    fn status_permalinks_are_excluded() {
        let tweets = vec![tweet(&[], &["https://twitter.com/i/web/status/12345", "https://example.com/a"])];
        let tally = EntityTally::from_tweets(&tweets);

        assert_eq!(tally.urls_count, 1);
        assert!(tally.urls.contains_key("https://example.com/a"));
    }

    #[test]
    fn other_links_on_the_same_host_are_kept() {
        let tweets = vec![tweet(&[], &["https://twitter.com/someone/status/9"])];
        let tally = EntityTally::from_tweets(&tweets);
        assert_eq!(tally.urls_count, 1);
    }

    #[test]
    fn unparsable_urls_are_kept_verbatim() {
        let tweets = vec![tweet(&[], &["not a url"])];
        let tally = EntityTally::from_tweets(&tweets);
        assert_eq!(tally.urls.get("not a url"), Some(&1));
    }

    #[test]
    fn missing_expanded_url_is_skipped() {
        let tweet: Tweet = serde_json::from_value(serde_json::json!({
            "id_str": "1",
            "text": "",
            "user": {"id_str": "2"},
            "entities": {"urls": [{"url": "https://t.co/x"}]}
        }))
        .unwrap();

        let tally = EntityTally::from_tweets(core::iter::once(&tweet));
        assert_eq!(tally.urls_count, 0);
    }
}
