//! The crawl core: pagination, rate-limit governance, request gatewaying,
//! frontier management, and the breadth-first crawl driver.

mod api;
mod client;
mod driver;
mod entities;
mod frontier;
mod gateway;
mod governor;
mod id;
mod paginator;
mod progress;
mod stats;

pub use api::{HashtagRef, IdPage, Profile, Tweet, TweetAuthor, TweetEntities, UrlRef};
pub use client::{ApiResponse, Client};
pub use driver::{CrawlSummary, Crawler};
pub use entities::EntityTally;
pub use frontier::{CrawlLimits, Disposition, DispositionCounts, Frontier, UserRecord};
pub use gateway::{BATCH_LIMIT, CallPurpose, Fetch, FollowEndpoint, Gateway, PageFetch};
pub use governor::Governor;
pub use id::{TweetId, UserId};
pub use paginator::{PageWalk, drain_cursor, drain_timeline};
pub use progress::Progress;
pub use stats::{RunStats, StatsSnapshot};
