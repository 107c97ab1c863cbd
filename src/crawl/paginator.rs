//! Drains cursor- and max-id-paginated endpoints to completion.

use super::api::Tweet;
use super::gateway::{FollowEndpoint, Gateway, PageFetch};
use super::id::UserId;
use super::progress::Progress;
use crate::Result;
use core::sync::atomic::{AtomicU64, Ordering};
use ohno::IntoAppError;
use std::sync::Arc;

const LOG_TARGET: &str = " paginator";

/// Sentinel cursor for the first page of a cursor walk.
const CURSOR_START: i64 = -1;

/// Max items the API returns per cursor page.
const CURSOR_PAGE_SIZE: u32 = 1000;

/// Max items the API returns per timeline page.
const TIMELINE_PAGE_SIZE: u32 = 200;

/// Outcome of a full page walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageWalk<T> {
    /// Every page was drained; items are in original API order.
    Complete(Vec<T>),

    /// The very first page was denied, so the resource cannot be read at all.
    Inaccessible,
}

/// Drain a cursor endpoint into the complete, order-preserving item list.
///
/// A page denied mid-walk is retried with a page size of one; if even that
/// fails, a `None` entry marks the position and the cursor is decremented so
/// the walk cannot spin on the same value. The walk ends when the next cursor
/// is `"0"` or goes negative.
pub async fn drain_cursor(
    gateway: &Gateway,
    endpoint: FollowEndpoint,
    user: &UserId,
    progress: &Arc<dyn Progress>,
) -> Result<PageWalk<Option<UserId>>> {
    let fetched = Arc::new(AtomicU64::new(0));
    {
        let fetched = Arc::clone(&fetched);
        let label = format!("{} of {user}", endpoint.noun());
        progress.set_indeterminate(Box::new(move || format!("{} {label}", fetched.load(Ordering::Relaxed))));
    }

    let mut items: Vec<Option<UserId>> = Vec::new();
    let mut cursor = CURSOR_START;

    loop {
        match gateway.id_page(endpoint, user, cursor, CURSOR_PAGE_SIZE).await? {
            PageFetch::Page(page) => {
                cursor = advance(&mut items, page, &fetched)?;
            }
            PageFetch::Restricted if cursor == CURSOR_START && items.is_empty() => {
                log::debug!(target: LOG_TARGET, "{} of {user} are fully inaccessible", endpoint.noun());
                return Ok(PageWalk::Inaccessible);
            }
            PageFetch::Restricted => {
                // Narrow to a single item before giving up on this position.
                match gateway.id_page(endpoint, user, cursor, 1).await? {
                    PageFetch::Page(page) => {
                        cursor = advance(&mut items, page, &fetched)?;
                    }
                    PageFetch::Restricted => {
                        items.push(None);
                        cursor -= 1;
                    }
                }
            }
        }

        if cursor <= 0 {
            break;
        }
    }

    log::debug!(target: LOG_TARGET, "drained {} {} of {user}", items.len(), endpoint.noun());
    Ok(PageWalk::Complete(items))
}

/// Append a page's ids and return the parsed next cursor.
fn advance(items: &mut Vec<Option<UserId>>, page: super::api::IdPage, fetched: &AtomicU64) -> Result<i64> {
    let next = page
        .next_cursor_str
        .parse::<i64>()
        .into_app_err_with(|| format!("cursor token '{}' is not numeric", page.next_cursor_str))?;

    let _ = fetched.fetch_add(page.ids.len() as u64, Ordering::Relaxed);
    items.extend(page.ids.into_iter().map(Some));
    Ok(next)
}

/// Drain a timeline via max-id pagination into the complete tweet list,
/// newest first.
///
/// The API's boundary semantics include the watermark tweet in the next page,
/// so each page is deduplicated against the watermark before being appended.
/// The walk ends when a page yields at most one item. A restriction on the
/// first page reports the timeline fully inaccessible; mid-walk it just ends
/// the walk, since restricted timelines cannot be paged further.
pub async fn drain_timeline(
    gateway: &Gateway,
    user: &UserId,
    expected: u64,
    progress: &Arc<dyn Progress>,
) -> Result<PageWalk<Tweet>> {
    let fetched = Arc::new(AtomicU64::new(0));
    {
        let fetched = Arc::clone(&fetched);
        let label = format!("tweets of {user}");
        progress.set_determinate(Box::new(move || {
            let n = fetched.load(Ordering::Relaxed);
            (expected.max(1), n.min(expected), format!("{n} {label}"))
        }));
    }

    let Some(mut tweets) = gateway.timeline_page(user, None, TIMELINE_PAGE_SIZE).await? else {
        log::debug!(target: LOG_TARGET, "timeline of {user} is fully inaccessible");
        return Ok(PageWalk::Inaccessible);
    };

    sort_newest_first(&mut tweets);
    fetched.store(tweets.len() as u64, Ordering::Relaxed);

    while let Some(last) = tweets.last() {
        let watermark = last.id_str.clone();

        let Some(mut page) = gateway.timeline_page(user, Some(&watermark), TIMELINE_PAGE_SIZE).await? else {
            break;
        };

        if page.len() <= 1 {
            break; // nothing beyond the boundary tweet itself
        }

        sort_newest_first(&mut page);
        page.retain(|tweet| tweet.id_str < watermark);
        if page.is_empty() {
            break;
        }

        let _ = fetched.fetch_add(page.len() as u64, Ordering::Relaxed);
        tweets.extend(page);
    }

    log::debug!(target: LOG_TARGET, "drained {} tweets of {user}", tweets.len());
    Ok(PageWalk::Complete(tweets))
}

/// Sort tweets descending by id with arbitrary-precision comparison.
fn sort_newest_first(tweets: &mut [Tweet]) {
    tweets.sort_by(|a, b| b.id_str.cmp(&a.id_str));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tweet(id: &str) -> Tweet {
        serde_json::from_value(serde_json::json!({
            "id_str": id,
            "text": "",
            "user": {"id_str": "1"}
        }))
        .unwrap()
    }

    #[test]
    fn sort_newest_first_uses_numeric_order() {
        // Lexicographic order would put "9..." before "10..."; numeric must not.
        let mut tweets = vec![tweet("9007199254740993"), tweet("10007199254740993"), tweet("999")];
        sort_newest_first(&mut tweets);
        let ids: Vec<&str> = tweets.iter().map(|t| t.id_str.as_str()).collect();
        assert_eq!(ids, vec!["10007199254740993", "9007199254740993", "999"]);
    }

    #[test]
    fn boundary_dedup_removes_watermark_tweet() {
        let mut page = vec![tweet("500"), tweet("400"), tweet("300")];
        let watermark = tweet("500").id_str;
        page.retain(|t| t.id_str < watermark);
        let ids: Vec<&str> = page.iter().map(|t| t.id_str.as_str()).collect();
        assert_eq!(ids, vec!["400", "300"]);
    }
}
