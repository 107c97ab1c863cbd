//! Breadth-first crawl orchestration.
//!
//! The driver owns the run lifecycle: seed ingestion, frontier draining, and
//! per-user fetch sequencing. Requests for a user's sub-resources are always
//! issued in the fixed order profile, friends, followers, timeline, and no
//! two users' requests ever interleave.

use super::api::{Profile, Tweet};
use super::entities::EntityTally;
use super::frontier::{Disposition, DispositionCounts, Frontier};
use super::gateway::{FollowEndpoint, Gateway};
use super::id::UserId;
use super::paginator::{PageWalk, drain_cursor, drain_timeline};
use super::progress::Progress;
use super::stats::{RunStats, StatsSnapshot};
use crate::Result;
use crate::store::{Store, UserDocument};
use std::sync::Arc;

const LOG_TARGET: &str = "    driver";

/// What a finished run looked like.
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub users: DispositionCounts,
    pub requests: StatsSnapshot,
}

/// How a single user's expansion ended.
enum Expansion {
    Completed(Vec<Tweet>),
    Inaccessible,
}

/// Drives the whole crawl from seeds to a drained frontier.
pub struct Crawler {
    gateway: Gateway,
    frontier: Frontier,
    store: Store,
    stats: Arc<RunStats>,
    progress: Arc<dyn Progress>,
}

impl core::fmt::Debug for Crawler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Crawler")
            .field("gateway", &self.gateway)
            .field("frontier", &self.frontier)
            .field("progress", &"<dyn Progress>")
            .finish_non_exhaustive()
    }
}

impl Crawler {
    #[must_use]
    pub fn new(gateway: Gateway, frontier: Frontier, store: Store, stats: Arc<RunStats>, progress: Arc<dyn Progress>) -> Self {
        Self {
            gateway,
            frontier,
            store,
            stats,
            progress,
        }
    }

    /// Run the crawl to completion.
    ///
    /// The aggregate documents are written whether the run finishes cleanly
    /// or dies on a fatal error, so whatever was learned is never lost.
    pub async fn run(&mut self, seeds: &[String]) -> Result<CrawlSummary> {
        let outcome = self.crawl(seeds).await;

        let summary = CrawlSummary {
            users: self.frontier.counts(),
            requests: self.stats.snapshot(),
        };

        if let Err(e) = self.store.save_aggregates(self.frontier.records(), summary.users, &summary.requests) {
            match &outcome {
                // Don't mask the original failure with a flush failure.
                Err(_) => log::error!(target: LOG_TARGET, "could not flush aggregates: {e:#}"),
                Ok(()) => return Err(e),
            }
        }

        outcome.map(|()| summary)
    }

    async fn crawl(&mut self, seeds: &[String]) -> Result<()> {
        self.progress.set_phase("Seeding");
        for seed in seeds {
            log::info!(target: LOG_TARGET, "starting with seed @{seed}");
            match self.gateway.user_by_name(seed).await? {
                None => log::warn!(target: LOG_TARGET, "seed @{seed} is inaccessible, skipping"),
                Some(profile) => {
                    if self.store.has_user_document(&profile.id_str) {
                        self.resume_user(&profile.id_str)?;
                    } else if self.frontier.classify(&profile) == Disposition::ToVisit {
                        self.expand(&profile).await?;
                    }
                }
            }
        }

        self.progress.set_phase("Expanding");
        while let Some(id) = self.frontier.next_pending() {
            if self.store.has_user_document(&id) {
                self.resume_user(&id)?;
                continue;
            }

            let profile = match self.frontier.get(&id).and_then(|record| record.profile.clone()) {
                Some(profile) => profile,
                None => match self.gateway.user_by_id(&id).await? {
                    Some(profile) => profile,
                    None => {
                        self.frontier.mark_protected(&id);
                        continue;
                    }
                },
            };

            if self.frontier.classify(&profile) == Disposition::ToVisit {
                self.expand(&profile).await?;
            }
        }

        log::info!(target: LOG_TARGET, "frontier drained, {} users known", self.frontier.len());
        Ok(())
    }

    /// Fully expand one eligible user: friends, followers, timeline.
    ///
    /// On a fatal error the partially filled document is flushed before the
    /// error propagates, preserving whatever was already fetched.
    async fn expand(&mut self, profile: &Profile) -> Result<()> {
        self.stats.set_current_user(&profile.screen_name);
        log::info!(target: LOG_TARGET, "expanding @{}", profile.screen_name);

        let stats = Arc::clone(&self.stats);
        self.progress.set_indeterminate(Box::new(move || format!("expanding @{}", stats.current_user())));

        let mut doc = self.store.new_document(profile);
        match self.expand_into(profile, &mut doc).await {
            Ok(Expansion::Completed(tweets)) => {
                self.store.save_user_document(&doc)?;
                self.store.save_tweets(&doc.id, &tweets)?;
                self.store.save_entities(&doc.id, &doc.entities)?;
                self.frontier.mark_visited(&doc.id);
                Ok(())
            }
            Ok(Expansion::Inaccessible) => {
                // The account turned restricted between classification and
                // expansion; no document is written so a later run retries.
                log::warn!(target: LOG_TARGET, "@{} became inaccessible mid-run", profile.screen_name);
                self.frontier.mark_protected(&doc.id);
                Ok(())
            }
            Err(e) => {
                if let Err(flush_err) = self.store.save_user_document(&doc) {
                    log::error!(target: LOG_TARGET, "could not flush partial document for @{}: {flush_err:#}", profile.screen_name);
                }
                Err(e)
            }
        }
    }

    async fn expand_into(&mut self, profile: &Profile, doc: &mut UserDocument) -> Result<Expansion> {
        let id = &profile.id_str;

        // No wasted round-trips on users with nothing to list.
        if profile.friends_count > 0 || profile.followers_count > 0 {
            log::info!(target: LOG_TARGET, "getting friends of @{}", profile.screen_name);
            match drain_cursor(&self.gateway, FollowEndpoint::Friends, id, &self.progress).await? {
                PageWalk::Complete(friends) => doc.friends = friends,
                PageWalk::Inaccessible => return Ok(Expansion::Inaccessible),
            }

            log::info!(target: LOG_TARGET, "getting followers of @{}", profile.screen_name);
            match drain_cursor(&self.gateway, FollowEndpoint::Followers, id, &self.progress).await? {
                PageWalk::Complete(followers) => doc.followers = followers,
                PageWalk::Inaccessible => return Ok(Expansion::Inaccessible),
            }

            self.register_discoveries(doc).await?;
        }

        if profile.statuses_count > 0 {
            log::info!(target: LOG_TARGET, "getting tweets of @{}", profile.screen_name);
            match drain_timeline(&self.gateway, id, profile.statuses_count, &self.progress).await? {
                PageWalk::Complete(tweets) => {
                    doc.tweets = tweets.iter().map(|tweet| tweet.id_str.clone()).collect();
                    doc.entities = EntityTally::from_tweets(&tweets);
                    return Ok(Expansion::Completed(tweets));
                }
                PageWalk::Inaccessible => return Ok(Expansion::Inaccessible),
            }
        }

        Ok(Expansion::Completed(Vec::new()))
    }

    /// Feed freshly listed identities into the frontier and resolve their
    /// profiles in bulk so ineligible users never cost a lookup of their own.
    async fn register_discoveries(&mut self, doc: &UserDocument) -> Result<()> {
        let mut fresh: Vec<UserId> = Vec::new();
        for id in doc.friends.iter().chain(doc.followers.iter()).flatten() {
            if self.frontier.discover(id.clone(), None) && !self.store.has_user_document(id) {
                fresh.push(id.clone());
            }
        }

        if fresh.is_empty() {
            return Ok(());
        }

        log::info!(target: LOG_TARGET, "looking up {} newly discovered users", fresh.len());
        for profile in self.gateway.users_by_ids(&fresh).await? {
            let _ = self.frontier.classify(&profile);
        }
        Ok(())
    }

    /// Re-adopt a user whose document survives from an earlier run.
    ///
    /// No requests are issued for the user; their stored friends and
    /// followers still feed the frontier so the expansion can continue
    /// where the interrupted run left off.
    fn resume_user(&mut self, id: &UserId) -> Result<()> {
        let Some(doc) = self.store.load_user_document(id)? else {
            return Ok(());
        };

        log::info!(target: LOG_TARGET, "@{} already on disk, resuming from checkpoint", doc.name);
        for friend in doc.friends.iter().chain(doc.followers.iter()).flatten() {
            let _ = self.frontier.discover(friend.clone(), None);
        }

        let _ = self.frontier.discover(id.clone(), Some(&doc.name));
        self.frontier.mark_visited(id);
        Ok(())
    }
}
