//! Spools: create-or-merge on hostname, lookups and blob listings.

use std::sync::Arc;

use chrono::Utc;

use super::require;
use crate::domain::spool::truncate_title;
use crate::domain::{Spool, SpoolFile, SpoolLookup};
use crate::error::ServiceError;
use crate::persistence::{Datastore, TASK_SCAN_LIMIT};
use crate::storage::BlobStore;

/// Timestamp layout used in file listings.
const FILE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Spool operations.
#[derive(Debug, Clone)]
pub struct SpoolService {
    store: Arc<dyn Datastore>,
    blobs: Arc<dyn BlobStore>,
}

impl SpoolService {
    /// Creates a new `SpoolService`.
    #[must_use]
    pub fn new(store: Arc<dyn Datastore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    /// Creates a spool, or merges into the existing one for `fq_domain`.
    ///
    /// With a hostname that already has a spool:
    /// - a public spool is returned with its owner unchanged; the title
    ///   and `updated` are refreshed only when `uid` owns it,
    /// - a private spool owned by `uid` is refreshed and returned,
    /// - a private spool owned by someone else is left alone and a new
    ///   spool is created for `uid`.
    ///
    /// New spools default to public. Titles are cut to 1000 characters.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for an empty `uid`, or a
    /// datastore error.
    pub async fn create(
        &self,
        uid: &str,
        title: Option<&str>,
        fq_domain: Option<&str>,
        public: Option<bool>,
    ) -> Result<Spool, ServiceError> {
        require("uid", uid)?;
        let fq_domain = fq_domain.map(str::trim).filter(|d| !d.is_empty());

        if let Some(domain) = fq_domain
            && let Some(existing) = self.store.find_spool(SpoolLookup::FqDomain(domain)).await?
            && (existing.public || existing.uid == uid)
        {
            return self.merge(existing, uid, title).await;
        }

        let spool = Spool::new(uid, title.unwrap_or_default(), fq_domain, public.unwrap_or(true));
        let spool = self.store.insert_spool(&spool).await?;
        tracing::info!(uid, name = %spool.name, nick = %spool.nick, "spool created");
        Ok(spool)
    }

    async fn merge(
        &self,
        mut existing: Spool,
        uid: &str,
        title: Option<&str>,
    ) -> Result<Spool, ServiceError> {
        if existing.uid != uid {
            tracing::debug!(name = %existing.name, "returning shared public spool");
            return Ok(existing);
        }
        if let Some(title) = title {
            existing.title = truncate_title(title);
        }
        existing.updated = Utc::now();
        if !self.store.put_spool(&existing).await? {
            return Err(ServiceError::not_found("spool", existing.name));
        }
        tracing::info!(uid, name = %existing.name, "spool refreshed");
        Ok(existing)
    }

    /// Public spool with `nick`.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_by_nick(&self, nick: &str) -> Result<Option<Spool>, ServiceError> {
        self.store
            .find_spool(SpoolLookup::Nick { nick, public: true })
            .await
    }

    /// Private spool with `nick`.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_by_nick_private(&self, nick: &str) -> Result<Option<Spool>, ServiceError> {
        self.store
            .find_spool(SpoolLookup::Nick {
                nick,
                public: false,
            })
            .await
    }

    /// Spool with `name`.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Spool>, ServiceError> {
        self.store.find_spool(SpoolLookup::Name(name)).await
    }

    /// Public spool with `name`.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_by_name_public(&self, name: &str) -> Result<Option<Spool>, ServiceError> {
        self.store.find_spool(SpoolLookup::NamePublic(name)).await
    }

    /// Oldest spool created for `fq_domain`.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_by_fq_domain(&self, fq_domain: &str) -> Result<Option<Spool>, ServiceError> {
        self.store.find_spool(SpoolLookup::FqDomain(fq_domain)).await
    }

    /// Spool `name` owned by `uid`.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_by_uid_name(
        &self,
        uid: &str,
        name: &str,
    ) -> Result<Option<Spool>, ServiceError> {
        self.store
            .find_spool(SpoolLookup::UidName { uid, name })
            .await
    }

    /// Spool `nick` owned by `uid`.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_by_uid_nick(
        &self,
        uid: &str,
        nick: &str,
    ) -> Result<Option<Spool>, ServiceError> {
        self.store
            .find_spool(SpoolLookup::UidNick { uid, nick })
            .await
    }

    /// Private spools of `uid`.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_all(&self, uid: &str) -> Result<Vec<Spool>, ServiceError> {
        self.store
            .list_spools(Some(uid), Some(false), TASK_SCAN_LIMIT)
            .await
    }

    /// Every spool, for background tasks.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_all_for_tasks(&self) -> Result<Vec<Spool>, ServiceError> {
        self.store.list_spools(None, None, TASK_SCAN_LIMIT).await
    }

    /// Files stored under spool `name` of `uid`, oldest update first.
    ///
    /// An unknown spool lists as empty.
    ///
    /// # Errors
    ///
    /// Returns a datastore or [`ServiceError::Storage`] error.
    pub async fn get_filenames(&self, uid: &str, name: &str) -> Result<Vec<SpoolFile>, ServiceError> {
        let Some(spool) = self.get_by_uid_name(uid, name).await? else {
            return Ok(Vec::new());
        };
        self.list_files(&spool).await
    }

    /// Files stored under an already-fetched `spool`, oldest update first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] when the listing fails.
    pub async fn list_files(&self, spool: &Spool) -> Result<Vec<SpoolFile>, ServiceError> {
        let prefix = spool.storage_prefix();
        let dir = format!("{prefix}/");

        let mut files: Vec<SpoolFile> = self
            .blobs
            .list_blobs(&prefix)
            .await?
            .into_iter()
            .filter_map(|blob| {
                let filename = blob.name.strip_prefix(&dir)?;
                (!filename.is_empty()).then(|| SpoolFile {
                    filename: filename.to_string(),
                    updated: blob.updated.format(FILE_TIME_FORMAT).to_string(),
                })
            })
            .collect();
        files.sort_by(|a, b| a.updated.cmp(&b.updated));
        Ok(files)
    }

    /// Number of files stored under spool `name` of `uid`.
    ///
    /// # Errors
    ///
    /// Returns a datastore or [`ServiceError::Storage`] error.
    pub async fn get_filecount(&self, uid: &str, name: &str) -> Result<usize, ServiceError> {
        Ok(self.get_filenames(uid, name).await?.len())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::spool::MAX_TITLE_CHARS;
    use crate::persistence::{MemoryDatastore, SpoolStore};
    use crate::storage::MemoryBlobStore;
    use chrono::{DateTime, TimeZone};

    struct Fixture {
        svc: SpoolService,
        store: Arc<MemoryDatastore>,
        blobs: Arc<MemoryBlobStore>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryDatastore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        Fixture {
            svc: SpoolService::new(Arc::clone(&store) as _, Arc::clone(&blobs) as _),
            store,
            blobs,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        let Some(ts) = Utc.timestamp_opt(1_700_000_000 + secs, 0).single() else {
            panic!("valid timestamp");
        };
        ts
    }

    #[tokio::test]
    async fn create_defaults_to_public() {
        let f = fixture();
        let spool = tokio_test::assert_ok!(f.svc.create("u1", Some("notes"), None, None).await);
        assert!(spool.public);
        assert_eq!(spool.title, "notes");
        assert!(spool.name.starts_with("spool_"));
    }

    #[tokio::test]
    async fn create_truncates_long_title() {
        let f = fixture();
        let long = "t".repeat(MAX_TITLE_CHARS + 10);
        let spool = tokio_test::assert_ok!(f.svc.create("u1", Some(&long), None, None).await);
        assert_eq!(spool.title.chars().count(), MAX_TITLE_CHARS);
    }

    #[tokio::test]
    async fn public_domain_spool_keeps_owner() {
        let f = fixture();
        let original = tokio_test::assert_ok!(
            f.svc
                .create("owner", Some("site"), Some("example.com"), Some(true))
                .await
        );
        let merged = tokio_test::assert_ok!(
            f.svc
                .create("visitor", Some("hijack"), Some("example.com"), None)
                .await
        );
        assert_eq!(merged.name, original.name);
        assert_eq!(merged.uid, "owner");
        assert_eq!(merged.title, "site");

        let all = tokio_test::assert_ok!(f.svc.get_all_for_tasks().await);
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn owner_recreate_refreshes_title() {
        let f = fixture();
        let original = tokio_test::assert_ok!(
            f.svc
                .create("owner", Some("old"), Some("example.com"), Some(false))
                .await
        );
        let merged = tokio_test::assert_ok!(
            f.svc
                .create("owner", Some("new"), Some("example.com"), None)
                .await
        );
        assert_eq!(merged.name, original.name);
        assert_eq!(merged.title, "new");
        assert!(merged.updated >= original.updated);

        let stored = tokio_test::assert_ok!(f.svc.get_by_name(&original.name).await);
        assert_eq!(stored.map(|s| s.title), Some("new".to_string()));
    }

    #[tokio::test]
    async fn foreign_private_domain_spool_is_not_shared() {
        let f = fixture();
        let private = tokio_test::assert_ok!(
            f.svc
                .create("owner", Some("mine"), Some("example.com"), Some(false))
                .await
        );
        let other = tokio_test::assert_ok!(
            f.svc
                .create("visitor", Some("theirs"), Some("example.com"), None)
                .await
        );
        assert_ne!(other.name, private.name);
        assert_eq!(other.uid, "visitor");

        let untouched = tokio_test::assert_ok!(f.svc.get_by_name(&private.name).await);
        assert_eq!(untouched.map(|s| s.title), Some("mine".to_string()));
    }

    #[tokio::test]
    async fn nick_lookups_respect_visibility() {
        let f = fixture();
        let public = tokio_test::assert_ok!(f.svc.create("u1", None, None, Some(true)).await);
        let private = tokio_test::assert_ok!(f.svc.create("u1", None, None, Some(false)).await);

        let found = tokio_test::assert_ok!(f.svc.get_by_nick(&public.nick).await);
        assert!(found.is_some());
        let hidden = tokio_test::assert_ok!(f.svc.get_by_nick(&private.nick).await);
        assert!(hidden.is_none());
        let private_found = tokio_test::assert_ok!(f.svc.get_by_nick_private(&private.nick).await);
        assert!(private_found.is_some());
        let not_public = tokio_test::assert_ok!(f.svc.get_by_name_public(&private.name).await);
        assert!(not_public.is_none());
        let by_uid_nick = tokio_test::assert_ok!(f.svc.get_by_uid_nick("u1", &public.nick).await);
        assert!(by_uid_nick.is_some());

        let mine = tokio_test::assert_ok!(f.svc.get_all("u1").await);
        assert_eq!(mine.len(), 1);
    }

    #[tokio::test]
    async fn filenames_strip_prefix_and_sort_by_update() {
        let f = fixture();
        let spool = tokio_test::assert_ok!(f.svc.create("u1", None, None, None).await);
        let prefix = spool.storage_prefix();
        f.blobs.put(format!("{prefix}/b.png"), at(10)).await;
        f.blobs.put(format!("{prefix}/a.png"), at(20)).await;
        f.blobs.put(format!("{prefix}/docs/c.txt"), at(0)).await;
        f.blobs.put("u1/spool_other/z.png", at(5)).await;

        let files = tokio_test::assert_ok!(f.svc.get_filenames("u1", &spool.name).await);
        let names: Vec<&str> = files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["docs/c.txt", "b.png", "a.png"]);
        assert_eq!(files.first().map(|f| f.updated.as_str()), Some("2023-11-14T22:13:20Z"));

        let count = tokio_test::assert_ok!(f.svc.get_filecount("u1", &spool.name).await);
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn empty_or_unknown_spool_lists_nothing() {
        let f = fixture();
        let spool = tokio_test::assert_ok!(f.svc.create("u1", None, None, None).await);
        let files = tokio_test::assert_ok!(f.svc.get_filenames("u1", &spool.name).await);
        assert!(files.is_empty());

        let unknown = tokio_test::assert_ok!(f.svc.get_filecount("u1", "spool_missing").await);
        assert_eq!(unknown, 0);
    }

    #[tokio::test]
    async fn other_users_cannot_list_files() {
        let f = fixture();
        let spool = tokio_test::assert_ok!(f.svc.create("u1", None, None, None).await);
        f.blobs
            .put(format!("{}/a.png", spool.storage_prefix()), at(0))
            .await;
        let files = tokio_test::assert_ok!(f.svc.get_filenames("u2", &spool.name).await);
        assert!(files.is_empty());
        let stored = tokio_test::assert_ok!(f.store.list_spools(None, None, 10).await);
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn list_files_reads_blobs_of_given_spool() {
        let f = fixture();
        let unsaved = Spool::new("u9", "scratch", None, false);
        f.blobs
            .put(format!("{}/n.txt", unsaved.storage_prefix()), at(0))
            .await;

        let files = tokio_test::assert_ok!(f.svc.list_files(&unsaved).await);
        assert_eq!(files.len(), 1);
        assert_eq!(files.first().map(|f| f.filename.as_str()), Some("n.txt"));
        let by_name = tokio_test::assert_ok!(f.svc.get_filenames("u9", &unsaved.name).await);
        assert!(by_name.is_empty());
    }
}
