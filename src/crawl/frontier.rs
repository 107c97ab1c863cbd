//! The set of known identities, partitioned by crawl disposition.

use super::api::Profile;
use super::id::UserId;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};

const LOG_TARGET: &str = "  frontier";

/// Crawl status of a known identity.
///
/// Transitions move forward only: `ToVisit` resolves to exactly one of the
/// other variants and never returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Disposition {
    /// Discovered but not yet resolved; queued for expansion.
    ToVisit,

    /// Fully expanded: friends, followers, and timeline fetched.
    Visited,

    /// Follower or friend count exceeds the configured ceiling.
    TooBig,

    /// Tweet count is at or below the configured floor.
    Inactive,

    /// The account is protected and cannot be expanded.
    Protected,
}

impl Disposition {
    /// Whether this disposition is final.
    #[must_use]
    pub const fn is_resolved(self) -> bool {
        !matches!(self, Self::ToVisit)
    }
}

/// Ceilings and floors deciding whether a user is worth expanding.
#[derive(Debug, Clone, Copy)]
pub struct CrawlLimits {
    pub tweets_min: u64,
    pub followers_max: u64,
    pub friends_max: u64,
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self {
            tweets_min: 5,
            followers_max: 10_000,
            friends_max: 5_000,
        }
    }
}

/// A known identity and what is known about it.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: UserId,
    pub name: Option<String>,
    pub disposition: Disposition,
    pub profile: Option<Profile>,
}

impl UserRecord {
    /// A record for an identity seen only in someone else's friend or follower list.
    fn from_discovery(id: UserId, name: Option<&str>) -> Self {
        Self {
            id,
            name: name.map(str::to_string),
            disposition: Disposition::ToVisit,
            profile: None,
        }
    }

    /// A fully-formed record for a freshly resolved profile.
    fn from_profile(profile: Profile, disposition: Disposition) -> Self {
        Self {
            id: profile.id_str.clone(),
            name: Some(profile.screen_name.clone()),
            disposition,
            profile: Some(profile),
        }
    }
}

/// Per-disposition tallies of all known identities.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispositionCounts {
    pub to_visit: u64,
    pub visited: u64,
    pub too_big: u64,
    pub inactive: u64,
    pub protected: u64,
}

/// Tracks every identity the crawl has seen and drives expansion order.
///
/// The pending queue is FIFO, so expansion is strictly breadth-first.
#[derive(Debug)]
pub struct Frontier {
    limits: CrawlLimits,
    records: HashMap<UserId, UserRecord>,
    pending: VecDeque<UserId>,
}

impl Frontier {
    #[must_use]
    pub fn new(limits: CrawlLimits) -> Self {
        Self {
            limits,
            records: HashMap::new(),
            pending: VecDeque::new(),
        }
    }

    /// Whether the identity has been seen before, in any disposition.
    #[must_use]
    pub fn is_known(&self, id: &UserId) -> bool {
        self.records.contains_key(id)
    }

    /// Record an identity discovered in a friend or follower list.
    ///
    /// Re-discovering a known identity is a no-op. Returns `true` when the
    /// identity was newly added.
    pub fn discover(&mut self, id: UserId, name: Option<&str>) -> bool {
        if self.records.contains_key(&id) {
            return false;
        }

        self.pending.push_back(id.clone());
        let _ = self.records.insert(id.clone(), UserRecord::from_discovery(id, name));
        true
    }

    /// Classify a freshly resolved profile and store its record.
    ///
    /// Already-resolved records keep their disposition; classification never
    /// moves a user backward. An unknown identity enters the pending queue so
    /// an eligible profile is expanded in discovery order.
    pub fn classify(&mut self, profile: &Profile) -> Disposition {
        let id = profile.id_str.clone();

        if let Some(existing) = self.records.get(&id) {
            if existing.disposition.is_resolved() {
                return existing.disposition;
            }
        } else {
            self.pending.push_back(id.clone());
        }

        let disposition = self.decide(profile);
        if disposition.is_resolved() {
            log::debug!(target: LOG_TARGET, "@{} classified as {disposition}", profile.screen_name);
        }
        let _ = self.records.insert(id, UserRecord::from_profile(profile.clone(), disposition));
        disposition
    }

    /// The classification policy, evaluated on known profile fields.
    const fn decide(&self, profile: &Profile) -> Disposition {
        if profile.protected {
            Disposition::Protected
        } else if profile.statuses_count <= self.limits.tweets_min {
            Disposition::Inactive
        } else if profile.followers_count >= self.limits.followers_max || profile.friends_count >= self.limits.friends_max {
            Disposition::TooBig
        } else {
            Disposition::ToVisit
        }
    }

    /// Dequeue the next pending identity in discovery order.
    ///
    /// Identities resolved since they were queued are skipped silently.
    pub fn next_pending(&mut self) -> Option<UserId> {
        while let Some(id) = self.pending.pop_front() {
            if self.records.get(&id).is_some_and(|r| r.disposition == Disposition::ToVisit) {
                return Some(id);
            }
        }
        None
    }

    /// Mark an identity as fully expanded. Resolved records are left alone.
    pub fn mark_visited(&mut self, id: &UserId) {
        if let Some(record) = self.records.get_mut(id) {
            if record.disposition == Disposition::ToVisit {
                record.disposition = Disposition::Visited;
            }
        }
    }

    /// Mark an identity as protected (e.g. turned restricted mid-run).
    /// Resolved records are left alone.
    pub fn mark_protected(&mut self, id: &UserId) {
        if let Some(record) = self.records.get_mut(id) {
            if record.disposition == Disposition::ToVisit {
                record.disposition = Disposition::Protected;
            }
        }
    }

    #[must_use]
    pub fn get(&self, id: &UserId) -> Option<&UserRecord> {
        self.records.get(id)
    }

    /// All known records, in no particular order.
    pub fn records(&self) -> impl Iterator<Item = &UserRecord> {
        self.records.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Tally all known identities by disposition.
    #[must_use]
    pub fn counts(&self) -> DispositionCounts {
        let mut counts = DispositionCounts::default();
        for record in self.records.values() {
            match record.disposition {
                Disposition::ToVisit => counts.to_visit += 1,
                Disposition::Visited => counts.visited += 1,
                Disposition::TooBig => counts.too_big += 1,
                Disposition::Inactive => counts.inactive += 1,
                Disposition::Protected => counts.protected += 1,
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> CrawlLimits {
        CrawlLimits {
            tweets_min: 5,
            followers_max: 10_000,
            friends_max: 5_000,
        }
    }

    fn profile(id: &str, tweets: u64, followers: u64, friends: u64, protected: bool) -> Profile {
        serde_json::from_value(serde_json::json!({
            "id_str": id,
            "screen_name": format!("user{id}"),
            "statuses_count": tweets,
            "followers_count": followers,
            "friends_count": friends,
            "protected": protected
        }))
        .unwrap()
    }

    #[test]
    fn low_tweet_count_is_inactive() {
        let mut frontier = Frontier::new(limits());
        assert_eq!(frontier.classify(&profile("1", 3, 0, 0, false)), Disposition::Inactive);
    }

    #[test]
    fn tweet_floor_is_inclusive() {
        let mut frontier = Frontier::new(limits());
        assert_eq!(frontier.classify(&profile("1", 5, 10, 10, false)), Disposition::Inactive);
        assert_eq!(frontier.classify(&profile("2", 6, 10, 10, false)), Disposition::ToVisit);
    }

    #[test]
    fn excess_followers_is_too_big() {
        let mut frontier = Frontier::new(limits());
        assert_eq!(frontier.classify(&profile("1", 100, 20_000, 0, false)), Disposition::TooBig);
    }

    #[test]
    fn excess_friends_is_too_big() {
        let mut frontier = Frontier::new(limits());
        assert_eq!(frontier.classify(&profile("1", 100, 10, 5_000, false)), Disposition::TooBig);
    }

    #[test]
    fn protected_wins_over_other_rules() {
        let mut frontier = Frontier::new(limits());
        assert_eq!(frontier.classify(&profile("1", 0, 50_000, 50_000, true)), Disposition::Protected);
    }

    #[test]
    fn modest_profile_is_eligible() {
        let mut frontier = Frontier::new(limits());
        assert_eq!(frontier.classify(&profile("1", 100, 10, 10, false)), Disposition::ToVisit);
    }

    #[test]
    fn discovery_is_deduplicated() {
        let mut frontier = Frontier::new(limits());
        assert!(frontier.discover(UserId::new("1"), Some("alice")));
        assert!(!frontier.discover(UserId::new("1"), None));
        assert_eq!(frontier.len(), 1);
    }

    #[test]
    fn pending_queue_is_fifo() {
        let mut frontier = Frontier::new(limits());
        let _ = frontier.discover(UserId::new("1"), None);
        let _ = frontier.discover(UserId::new("2"), None);
        let _ = frontier.discover(UserId::new("3"), None);

        assert_eq!(frontier.next_pending(), Some(UserId::new("1")));
        assert_eq!(frontier.next_pending(), Some(UserId::new("2")));
        assert_eq!(frontier.next_pending(), Some(UserId::new("3")));
        assert_eq!(frontier.next_pending(), None);
    }

    #[test]
    fn resolved_identities_are_skipped_by_the_queue() {
        let mut frontier = Frontier::new(limits());
        let _ = frontier.discover(UserId::new("1"), None);
        let _ = frontier.discover(UserId::new("2"), None);

        // "1" resolves to inactive before it is dequeued.
        let _ = frontier.classify(&profile("1", 0, 0, 0, false));

        assert_eq!(frontier.next_pending(), Some(UserId::new("2")));
        assert_eq!(frontier.next_pending(), None);
    }

    #[test]
    fn dispositions_never_move_backward() {
        let mut frontier = Frontier::new(limits());
        let _ = frontier.classify(&profile("1", 100, 10, 10, false));
        frontier.mark_visited(&UserId::new("1"));

        // A later classification of the same identity is a no-op.
        assert_eq!(frontier.classify(&profile("1", 0, 0, 0, false)), Disposition::Visited);
    }

    #[test]
    fn counts_partition_all_records() {
        let mut frontier = Frontier::new(limits());
        let _ = frontier.discover(UserId::new("1"), None);
        let _ = frontier.classify(&profile("2", 0, 0, 0, false));
        let _ = frontier.classify(&profile("3", 100, 20_000, 0, false));
        let _ = frontier.classify(&profile("4", 100, 10, 10, false));
        frontier.mark_visited(&UserId::new("4"));
        let _ = frontier.classify(&profile("5", 0, 0, 0, true));

        let counts = frontier.counts();
        assert_eq!(counts.to_visit, 1);
        assert_eq!(counts.inactive, 1);
        assert_eq!(counts.too_big, 1);
        assert_eq!(counts.visited, 1);
        assert_eq!(counts.protected, 1);
    }

    #[test]
    fn disposition_labels_render_snake_case() {
        assert_eq!(Disposition::ToVisit.to_string(), "to_visit");
        assert_eq!(Disposition::TooBig.to_string(), "too_big");
    }
}
