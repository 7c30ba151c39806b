//! Sidekicks: metadata for search-index cores hosted on an index instance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::naming::{NAME_SUFFIX_LEN, random_mood, random_nick, random_string};

/// Where new sidekick cores are placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPlacement {
    /// Instance name.
    pub instance_name: String,
    /// Instance address used for provisioning.
    pub instance_ip: String,
    /// Instance region.
    pub region: String,
}

/// A sidekick record. `name` is unique and is also the core name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Sidekick {
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Last update timestamp.
    pub updated: DateTime<Utc>,
    /// When the index was started.
    pub started: DateTime<Utc>,
    /// Creating user.
    pub uid: String,
    /// Core name, `sidekick_<suffix>`.
    pub name: String,
    /// Title.
    pub title: String,
    /// Friendly alias.
    pub nick: String,
    /// Instance running the index.
    pub instance_name: String,
    /// Instance address.
    pub instance_ip: String,
    /// Instance region.
    pub region: String,
    /// Cosmetic mood label.
    pub mood: String,
    /// Documents in the index.
    pub num_docs: i64,
}

impl Sidekick {
    /// Builds a new sidekick with generated name, nick and mood.
    #[must_use]
    pub fn new(uid: &str, title: &str, placement: &IndexPlacement) -> Self {
        let now = Utc::now();
        Self {
            created: now,
            updated: now,
            started: now,
            uid: uid.to_string(),
            name: format!("sidekick_{}", random_string(NAME_SUFFIX_LEN)),
            title: title.to_string(),
            nick: random_nick(2),
            instance_name: placement.instance_name.clone(),
            instance_ip: placement.instance_ip.clone(),
            region: placement.region.clone(),
            mood: random_mood().to_string(),
            num_docs: 0,
        }
    }

    /// Documents currently in the index.
    #[must_use]
    pub const fn num_docs(&self) -> i64 {
        self.num_docs
    }
}

/// Ways to look a sidekick up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidekickLookup<'a> {
    /// By nick.
    Nick(&'a str),
    /// By owner and name.
    UidName {
        /// Owner.
        uid: &'a str,
        /// Name.
        name: &'a str,
    },
    /// By owner and nick.
    UidNick {
        /// Owner.
        uid: &'a str,
        /// Nick.
        nick: &'a str,
    },
}

impl SidekickLookup<'_> {
    /// Returns `true` when `sidekick` matches this lookup.
    #[must_use]
    pub fn matches(&self, sidekick: &Sidekick) -> bool {
        match *self {
            Self::Nick(nick) => sidekick.nick == nick,
            Self::UidName { uid, name } => sidekick.uid == uid && sidekick.name == name,
            Self::UidNick { uid, nick } => sidekick.uid == uid && sidekick.nick == nick,
        }
    }
}
