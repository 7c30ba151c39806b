//! Spools: named object-storage namespaces owned by a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::naming::{NAME_SUFFIX_LEN, random_nick, random_string};

/// Longest title stored on a spool, in characters.
pub const MAX_TITLE_CHARS: usize = 1000;

/// A spool record. `name` is unique and doubles as the storage prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Spool {
    /// Owning user.
    pub uid: String,
    /// Reference name, `spool_<suffix>`.
    pub name: String,
    /// Readable without authentication.
    pub public: bool,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Last update timestamp.
    pub updated: DateTime<Utc>,
    /// Optional expiry.
    pub expires: Option<DateTime<Utc>>,
    /// User-friendly alias.
    pub nick: String,
    /// Title, at most [`MAX_TITLE_CHARS`] characters.
    pub title: String,
    /// Hostname the spool was created for.
    pub fq_domain: Option<String>,
}

impl Spool {
    /// Builds a new spool with a generated name and nick.
    #[must_use]
    pub fn new(uid: &str, title: &str, fq_domain: Option<&str>, public: bool) -> Self {
        let now = Utc::now();
        Self {
            uid: uid.to_string(),
            name: format!("spool_{}", random_string(NAME_SUFFIX_LEN)),
            public,
            created: now,
            updated: now,
            expires: None,
            nick: random_nick(3),
            title: truncate_title(title),
            fq_domain: fq_domain.map(str::to_string),
        }
    }

    /// Storage prefix holding this spool's blobs, `"{uid}/{name}"`.
    #[must_use]
    pub fn storage_prefix(&self) -> String {
        format!("{}/{}", self.uid, self.name)
    }
}

/// Cuts `title` to at most [`MAX_TITLE_CHARS`] characters.
#[must_use]
pub fn truncate_title(title: &str) -> String {
    title.chars().take(MAX_TITLE_CHARS).collect()
}

/// Ways to look a spool up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpoolLookup<'a> {
    /// By name.
    Name(&'a str),
    /// By name, public spools only.
    NamePublic(&'a str),
    /// By nick with the given visibility.
    Nick {
        /// Nick to match.
        nick: &'a str,
        /// Required `public` flag.
        public: bool,
    },
    /// By hostname.
    FqDomain(&'a str),
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

impl SpoolLookup<'_> {
    /// Returns `true` when `spool` matches this lookup.
    #[must_use]
    pub fn matches(&self, spool: &Spool) -> bool {
        match *self {
            Self::Name(name) => spool.name == name,
            Self::NamePublic(name) => spool.name == name && spool.public,
            Self::Nick { nick, public } => spool.nick == nick && spool.public == public,
            Self::FqDomain(domain) => spool.fq_domain.as_deref() == Some(domain),
            Self::UidName { uid, name } => spool.uid == uid && spool.name == name,
            Self::UidNick { uid, nick } => spool.uid == uid && spool.nick == nick,
        }
    }
}

/// A file inside a spool as listed from object storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SpoolFile {
    /// Path relative to the spool prefix.
    pub filename: String,
    /// Last update, formatted `%Y-%m-%dT%H:%M:%SZ`.
    pub updated: String,
}
