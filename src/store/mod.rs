//! On-disk JSON documents: per-user checkpoints and end-of-run aggregates.
//!
//! A user's document doubles as the resume checkpoint: its presence on disk
//! means "already visited, skip re-fetch". Everything is emitted through
//! serde; documents are buffered in memory and written whole.

use crate::Result;
use crate::config::DispositionLabels;
use crate::crawl::{Disposition, EntityTally, Profile, StatsSnapshot, Tweet, TweetId, UserId, UserRecord};
use chrono::{DateTime, Utc};
use ohno::IntoAppError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const LOG_TARGET: &str = "     store";

const USERS_DIR: &str = "users";
const USER_DOC_FILE: &str = "user.json";
const TWEETS_FILE: &str = "tweets.json";
const ENTITIES_FILE: &str = "entities.json";
const RESOLVED_FILE: &str = "resolved_users.json";
const UNRESOLVED_FILE: &str = "unresolved_users.json";
const STATS_FILE: &str = "run_stats.json";

/// The per-user document persisted once a user is fully expanded.
///
/// `friends` and `followers` carry a `null` entry wherever even a single-item
/// page was denied during the walk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDocument {
    pub id: UserId,
    pub name: String,
    pub disposition: String,
    #[serde(default)]
    pub bio_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    pub friends_count: u64,
    pub followers_count: u64,
    pub tweets_count: u64,
    pub favourites_count: u64,
    #[serde(default)]
    pub protected: bool,
    pub fetched_at: DateTime<Utc>,
    #[serde(default)]
    pub friends: Vec<Option<UserId>>,
    #[serde(default)]
    pub followers: Vec<Option<UserId>>,
    #[serde(default)]
    pub tweets: Vec<TweetId>,
    #[serde(default)]
    pub entities: EntityTally,
}

/// One line of the resolved/unresolved aggregate documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AggregateEntry {
    name: Option<String>,
    disposition: String,
}

/// The end-of-run statistics document.
#[derive(Debug, Clone, Serialize)]
struct RunReport {
    requests: StatsSnapshot,
    users: crate::crawl::DispositionCounts,
}

/// Writes and reads crawl output under a root directory.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
    labels: DispositionLabels,
}

impl Store {
    /// Create a store rooted at `root`, creating the directory layout.
    pub fn new(root: impl Into<PathBuf>, labels: DispositionLabels) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(USERS_DIR))
            .into_app_err_with(|| format!("creating output directory '{}'", root.display()))?;
        Ok(Self { root, labels })
    }

    /// The output root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The persisted label for a disposition.
    #[must_use]
    pub fn label(&self, disposition: Disposition) -> &str {
        match disposition {
            Disposition::ToVisit => &self.labels.to_visit,
            Disposition::Visited => &self.labels.visited,
            Disposition::TooBig => &self.labels.too_big,
            Disposition::Inactive => &self.labels.inactive,
            Disposition::Protected => &self.labels.protected,
        }
    }

    fn user_dir(&self, id: &UserId) -> PathBuf {
        self.root.join(USERS_DIR).join(id.as_str())
    }

    /// Whether a completed document exists for this identity.
    #[must_use]
    pub fn has_user_document(&self, id: &UserId) -> bool {
        self.user_dir(id).join(USER_DOC_FILE).is_file()
    }

    /// Load a previously persisted user document, if one exists.
    ///
    /// A corrupt document is treated as absent so the user is simply
    /// re-fetched instead of wedging the resume path.
    pub fn load_user_document(&self, id: &UserId) -> Result<Option<UserDocument>> {
        let path = self.user_dir(id).join(USER_DOC_FILE);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(_) => return Ok(None),
        };

        match serde_json::from_reader(BufReader::new(file)) {
            Ok(doc) => Ok(Some(doc)),
            Err(e) => {
                log::debug!(target: LOG_TARGET, "ignoring corrupt document '{}': {e}", path.display());
                Ok(None)
            }
        }
    }

    /// Start a document for a freshly fetched profile.
    #[must_use]
    pub fn new_document(&self, profile: &Profile) -> UserDocument {
        UserDocument {
            id: profile.id_str.clone(),
            name: profile.screen_name.clone(),
            disposition: self.labels.visited.clone(),
            bio_url: profile.url.clone(),
            description: profile.description.clone(),
            created_at: profile.created_at.clone(),
            friends_count: profile.friends_count,
            followers_count: profile.followers_count,
            tweets_count: profile.statuses_count,
            favourites_count: profile.favourites_count,
            protected: profile.protected,
            fetched_at: Utc::now(),
            friends: Vec::new(),
            followers: Vec::new(),
            tweets: Vec::new(),
            entities: EntityTally::default(),
        }
    }

    /// Persist a user's document, establishing the resume checkpoint.
    pub fn save_user_document(&self, doc: &UserDocument) -> Result<()> {
        self.write_json(&self.user_dir(&doc.id).join(USER_DOC_FILE), doc)
    }

    /// Persist a user's trimmed tweets.
    pub fn save_tweets(&self, id: &UserId, tweets: &[Tweet]) -> Result<()> {
        self.write_json(&self.user_dir(id).join(TWEETS_FILE), &tweets)
    }

    /// Persist a user's entity tally.
    pub fn save_entities(&self, id: &UserId, tally: &EntityTally) -> Result<()> {
        self.write_json(&self.user_dir(id).join(ENTITIES_FILE), tally)
    }

    /// Write the end-of-run aggregates: resolved users, unresolved users, and
    /// request statistics.
    pub fn save_aggregates<'a>(
        &self,
        records: impl IntoIterator<Item = &'a UserRecord>,
        counts: crate::crawl::DispositionCounts,
        stats: &StatsSnapshot,
    ) -> Result<()> {
        let mut resolved: BTreeMap<String, AggregateEntry> = BTreeMap::new();
        let mut unresolved: BTreeMap<String, AggregateEntry> = BTreeMap::new();

        for record in records {
            let entry = AggregateEntry {
                name: record.name.clone(),
                disposition: self.label(record.disposition).to_string(),
            };
            let target = if record.disposition == Disposition::Visited {
                &mut resolved
            } else {
                &mut unresolved
            };
            let _ = target.insert(record.id.as_str().to_string(), entry);
        }

        self.write_json(&self.root.join(RESOLVED_FILE), &resolved)?;
        self.write_json(&self.root.join(UNRESOLVED_FILE), &unresolved)?;
        self.write_json(
            &self.root.join(STATS_FILE),
            &RunReport {
                requests: stats.clone(),
                users: counts,
            },
        )?;
        Ok(())
    }

    /// Serialize a value to a file, creating parent directories as needed.
    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).into_app_err_with(|| format!("creating directory '{}'", parent.display()))?;
        }

        let file = File::create(path).into_app_err_with(|| format!("creating file '{}'", path.display()))?;
        let mut writer = BufWriter::new(file);

        serde_json::to_writer_pretty(&mut writer, value).into_app_err_with(|| format!("writing file '{}'", path.display()))?;
        writer.flush().into_app_err_with(|| format!("flushing file '{}'", path.display()))?;
        Ok(())
    }
}
