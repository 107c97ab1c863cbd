//! The single choke-point for outbound API calls.
//!
//! Every request the crawl makes goes through [`Gateway::call`], which tags
//! the call with a purpose, keeps the run statistics, absorbs rate limiting
//! via the governor, and maps access restrictions to the recovery path the
//! purpose demands. Callers never see a rate-limit failure, only latency.

use super::api::{IdPage, Profile, Tweet};
use super::client::{ApiResponse, Client};
use super::governor::Governor;
use super::id::{TweetId, UserId};
use super::stats::RunStats;
use crate::Result;
use ohno::{EnrichableExt, IntoAppError, app_err};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

const LOG_TARGET: &str = "   gateway";

/// The batch lookup endpoint rejects more than this many identities per call.
pub const BATCH_LIMIT: usize = 99;

/// Why a call is being made; selects the recovery path for restricted resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPurpose {
    /// Look up a single profile.
    Single,

    /// Look up a batch of profiles.
    Batch,

    /// Fetch one page of a cursor walk.
    CursorPage,

    /// Fetch one page of a max-id walk.
    MaxIdPage,
}

impl CallPurpose {
    const fn label(self) -> &'static str {
        match self {
            Self::Single => "single lookup",
            Self::Batch => "batch lookup",
            Self::CursorPage => "cursor page",
            Self::MaxIdPage => "max-id page",
        }
    }
}

/// Outcome of a gateway call once rate limiting has been absorbed.
#[derive(Debug)]
pub enum Fetch {
    /// The endpoint's decoded payload.
    Payload(Value),

    /// The resource is access-restricted; recovery is up to the caller's purpose.
    Restricted,
}

/// Outcome of fetching one cursor page.
#[derive(Debug)]
pub enum PageFetch {
    Page(IdPage),
    Restricted,
}

/// The friends and followers list endpoints share pagination mechanics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowEndpoint {
    Friends,
    Followers,
}

impl FollowEndpoint {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Friends => "friends/ids",
            Self::Followers => "followers/ids",
        }
    }

    #[must_use]
    pub const fn noun(self) -> &'static str {
        match self {
            Self::Friends => "friends",
            Self::Followers => "followers",
        }
    }
}

/// Gateway dispatching all outbound requests.
#[derive(Debug)]
pub struct Gateway {
    client: Client,
    governor: Arc<Governor>,
    stats: Arc<RunStats>,
}

impl Gateway {
    #[must_use]
    pub fn new(client: Client, governor: Arc<Governor>, stats: Arc<RunStats>) -> Self {
        Self { client, governor, stats }
    }

    /// Issue a call, retrying transparently across rate-limit cooldowns.
    ///
    /// Rate limiting is the only automatically retried failure class; the
    /// retry budget is unbounded because the limit is expected to clear.
    /// A vanished resource or an unrecognized failure is fatal.
    pub async fn call(&self, path: &str, params: &[(String, String)], purpose: CallPurpose) -> Result<Fetch> {
        loop {
            self.governor.ready().await;
            self.stats.record_issued();

            let response = self
                .client
                .get(path, params)
                .await
                .map_err(|e| e.enrich_with(|| format!("issuing {} to '{path}'", purpose.label())))?;

            match response {
                ApiResponse::Payload(payload) => {
                    self.stats.record_without_cooldown();
                    self.stats.record_resolved();
                    return Ok(Fetch::Payload(payload));
                }
                ApiResponse::RateLimited => {
                    log::debug!(target: LOG_TARGET, "rate limited during {} to '{path}'", purpose.label());
                    let _ = self.governor.begin_cooldown();
                }
                ApiResponse::Restricted => {
                    self.stats.record_without_cooldown();
                    self.stats.record_resolved();
                    log::debug!(target: LOG_TARGET, "access restricted during {} to '{path}'", purpose.label());
                    return Ok(Fetch::Restricted);
                }
                ApiResponse::Gone => {
                    self.stats.record_without_cooldown();
                    return Err(app_err!(
                        "resource gone during {} to '{path}' (params: {params:?})",
                        purpose.label()
                    ));
                }
            }
        }
    }

    /// Fetch a single profile by screen name; `None` when access-restricted.
    pub async fn user_by_name(&self, screen_name: &str) -> Result<Option<Profile>> {
        self.user_lookup(&[(String::from("screen_name"), screen_name.to_string())]).await
    }

    /// Fetch a single profile by identity; `None` when access-restricted.
    pub async fn user_by_id(&self, id: &UserId) -> Result<Option<Profile>> {
        self.user_lookup(&[(String::from("user_id"), id.as_str().to_string())]).await
    }

    async fn user_lookup(&self, params: &[(String, String)]) -> Result<Option<Profile>> {
        match self.call("users/show", params, CallPurpose::Single).await? {
            Fetch::Payload(payload) => Ok(Some(decode(payload, "users/show")?)),
            Fetch::Restricted => Ok(None),
        }
    }

    /// Resolve profiles for the given identities, chunked at [`BATCH_LIMIT`].
    ///
    /// A restricted batch is split into one lookup per identity, since a
    /// single protected member poisons the whole batch response. Identities
    /// the API does not return (deleted, suspended, protected) are skipped.
    pub async fn users_by_ids(&self, ids: &[UserId]) -> Result<Vec<Profile>> {
        let mut profiles = Vec::with_capacity(ids.len());

        for chunk in ids.chunks(BATCH_LIMIT) {
            let joined = chunk.iter().map(UserId::as_str).collect::<Vec<_>>().join(",");
            let params = [(String::from("user_id"), joined)];

            match self.call("users/lookup", &params, CallPurpose::Batch).await? {
                Fetch::Payload(payload) => {
                    profiles.extend(decode::<Vec<Profile>>(payload, "users/lookup")?);
                }
                Fetch::Restricted => {
                    log::debug!(target: LOG_TARGET, "batch of {} poisoned by a restricted member, splitting", chunk.len());
                    for id in chunk {
                        let params = [(String::from("user_id"), id.as_str().to_string())];
                        match self.call("users/lookup", &params, CallPurpose::Single).await? {
                            Fetch::Payload(payload) => {
                                profiles.extend(decode::<Vec<Profile>>(payload, "users/lookup")?);
                            }
                            Fetch::Restricted => {
                                log::debug!(target: LOG_TARGET, "profile {id} is restricted, skipping");
                            }
                        }
                    }
                }
            }
        }

        Ok(profiles)
    }

    /// Fetch one page of a friends or followers cursor walk.
    pub async fn id_page(&self, endpoint: FollowEndpoint, user: &UserId, cursor: i64, count: u32) -> Result<PageFetch> {
        let params = [
            (String::from("user_id"), user.as_str().to_string()),
            (String::from("cursor"), cursor.to_string()),
            (String::from("count"), count.to_string()),
            (String::from("stringify_ids"), String::from("true")),
        ];

        match self.call(endpoint.path(), &params, CallPurpose::CursorPage).await? {
            Fetch::Payload(payload) => Ok(PageFetch::Page(decode(payload, endpoint.path())?)),
            Fetch::Restricted => Ok(PageFetch::Restricted),
        }
    }

    /// Fetch one timeline page; `None` when the timeline is access-restricted.
    ///
    /// Restricted timelines cannot be paged at all, so the sentinel doubles
    /// as "no more data" for walks already in flight.
    pub async fn timeline_page(&self, user: &UserId, max_id: Option<&TweetId>, count: u32) -> Result<Option<Vec<Tweet>>> {
        let mut params = vec![
            (String::from("user_id"), user.as_str().to_string()),
            (String::from("count"), count.to_string()),
            (String::from("include_rts"), String::from("false")),
            (String::from("exclude_replies"), String::from("true")),
            (String::from("trim_user"), String::from("true")),
        ];
        if let Some(max_id) = max_id {
            params.push((String::from("max_id"), max_id.as_str().to_string()));
        }

        match self.call("statuses/user_timeline", &params, CallPurpose::MaxIdPage).await? {
            Fetch::Payload(payload) => Ok(Some(decode(payload, "statuses/user_timeline")?)),
            Fetch::Restricted => Ok(None),
        }
    }
}

/// Decode a JSON payload into the expected shape; a malformed payload is fatal.
fn decode<T: DeserializeOwned>(payload: Value, path: &str) -> Result<T> {
    serde_json::from_value(payload).into_app_err_with(|| format!("decoding '{path}' payload"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purpose_labels() {
        assert_eq!(CallPurpose::Single.label(), "single lookup");
        assert_eq!(CallPurpose::Batch.label(), "batch lookup");
        assert_eq!(CallPurpose::CursorPage.label(), "cursor page");
        assert_eq!(CallPurpose::MaxIdPage.label(), "max-id page");
    }

    #[test]
    fn follow_endpoint_paths() {
        assert_eq!(FollowEndpoint::Friends.path(), "friends/ids");
        assert_eq!(FollowEndpoint::Followers.path(), "followers/ids");
        assert_eq!(FollowEndpoint::Friends.noun(), "friends");
        assert_eq!(FollowEndpoint::Followers.noun(), "followers");
    }

    #[test]
    fn decode_rejects_wrong_shape() {
        let payload = serde_json::json!({"unexpected": true});
        let result: Result<IdPage> = decode(payload, "friends/ids");
        assert!(result.is_err());
    }
}
