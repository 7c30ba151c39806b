//! PostgreSQL implementation of the datastore.
//!
//! Natural keys are backed by primary keys / unique constraints, so
//! create-or-fetch is `INSERT .. ON CONFLICT DO NOTHING` followed by a
//! re-read, and a queue pop is a single `DELETE .. RETURNING`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::Postgres;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::{Query, QueryAs};

use super::{
    EventStore, LedgerStore, SettingsStore, SidekickStore, SignupStore, SpoolStore, Stored,
    UserStore,
};
use crate::config::ServiceConfig;
use crate::domain::{
    EventKey, QueuedEvent, Setting, Sidekick, SidekickLookup, SlackEvent, Spool, SpoolLookup,
    Transaction, User, UserLookup, Version, WaitlistEntry,
};
use crate::error::ServiceError;

const USER_COLUMNS: &str = "uid, name, created, updated, expires, admin, email, phone, \
     phone_code, failed_2fa_attempts, mail_token, mail_confirm, mail_tries, authenticated, \
     active, anonymous, paid, account_type, slack_id, slack_team_id, slack_access_token, api_token";

const SPOOL_COLUMNS: &str = "uid, name, public, created, updated, expires, nick, title, fq_domain";

const SIDEKICK_COLUMNS: &str = "created, updated, started, uid, name, title, nick, \
     instance_name, instance_ip, region, mood, num_docs";

const EVENT_COLUMNS: &str = "eid, uid, pipe, entity, text, created";

/// PostgreSQL-backed datastore using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresDatastore {
    pool: PgPool,
}

/// A positional bind value for dynamically chosen filters.
#[derive(Debug, Clone, Copy)]
enum Arg<'a> {
    Text(&'a str),
    Bool(bool),
}

impl PostgresDatastore {
    /// Creates a datastore over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects using the pool settings in `config` and applies the
    /// embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError::Backend`] if the database is unreachable
    /// or a migration fails.
    pub async fn connect(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .map_err(db_err)?;

        sqlx::migrate!()
            .run(&pool)
            .await
            .map_err(|e| ServiceError::Backend(e.to_string()))?;

        tracing::info!("postgres datastore ready");
        Ok(Self::new(pool))
    }
}

/// Maps a driver error, surfacing unique violations as conflicts.
fn db_err(e: sqlx::Error) -> ServiceError {
    if let Some(db) = e.as_database_error()
        && db.is_unique_violation()
    {
        return ServiceError::Conflict(db.message().to_string());
    }
    ServiceError::Backend(e.to_string())
}

fn bind_args<'q, O>(
    mut query: QueryAs<'q, Postgres, O, PgArguments>,
    args: &[Arg<'q>],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for arg in args {
        query = match *arg {
            Arg::Text(value) => query.bind(value),
            Arg::Bool(value) => query.bind(value),
        };
    }
    query
}

fn bind_user<'q>(
    query: Query<'q, Postgres, PgArguments>,
    user: &'q User,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&user.uid)
        .bind(&user.name)
        .bind(user.created)
        .bind(user.updated)
        .bind(user.expires)
        .bind(user.admin)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.phone_code)
        .bind(user.failed_2fa_attempts)
        .bind(&user.mail_token)
        .bind(user.mail_confirm)
        .bind(user.mail_tries)
        .bind(user.authenticated)
        .bind(user.active)
        .bind(user.anonymous)
        .bind(user.paid)
        .bind(&user.account_type)
        .bind(&user.slack_id)
        .bind(&user.slack_team_id)
        .bind(&user.slack_access_token)
        .bind(&user.api_token)
}

fn user_filter<'a>(lookup: UserLookup<'a>) -> (&'static str, Vec<Arg<'a>>) {
    match lookup {
        UserLookup::Uid(v) => ("uid = $1", vec![Arg::Text(v)]),
        UserLookup::Name(v) => ("name = $1", vec![Arg::Text(v)]),
        UserLookup::Email(v) => ("email = $1", vec![Arg::Text(v)]),
        UserLookup::Phone(v) => ("phone = $1", vec![Arg::Text(v)]),
        UserLookup::EmailPhone { email, phone } => (
            "email = $1 AND phone = $2",
            vec![Arg::Text(email), Arg::Text(phone)],
        ),
        UserLookup::MailToken(v) => ("mail_token = $1", vec![Arg::Text(v)]),
        UserLookup::ApiToken(v) => ("api_token = $1", vec![Arg::Text(v)]),
        UserLookup::Slack { slack_id, team_id } => (
            "slack_id = $1 AND slack_team_id = $2",
            vec![Arg::Text(slack_id), Arg::Text(team_id)],
        ),
    }
}

fn spool_filter<'a>(lookup: SpoolLookup<'a>) -> (&'static str, Vec<Arg<'a>>) {
    match lookup {
        SpoolLookup::Name(v) => ("name = $1", vec![Arg::Text(v)]),
        SpoolLookup::NamePublic(v) => ("name = $1 AND public", vec![Arg::Text(v)]),
        SpoolLookup::Nick { nick, public } => (
            "nick = $1 AND public = $2",
            vec![Arg::Text(nick), Arg::Bool(public)],
        ),
        SpoolLookup::FqDomain(v) => ("fq_domain = $1", vec![Arg::Text(v)]),
        SpoolLookup::UidName { uid, name } => {
            ("uid = $1 AND name = $2", vec![Arg::Text(uid), Arg::Text(name)])
        }
        SpoolLookup::UidNick { uid, nick } => {
            ("uid = $1 AND nick = $2", vec![Arg::Text(uid), Arg::Text(nick)])
        }
    }
}

fn sidekick_filter<'a>(lookup: SidekickLookup<'a>) -> (&'static str, Vec<Arg<'a>>) {
    match lookup {
        SidekickLookup::Nick(v) => ("nick = $1", vec![Arg::Text(v)]),
        SidekickLookup::UidName { uid, name } => {
            ("uid = $1 AND name = $2", vec![Arg::Text(uid), Arg::Text(name)])
        }
        SidekickLookup::UidNick { uid, nick } => {
            ("uid = $1 AND nick = $2", vec![Arg::Text(uid), Arg::Text(nick)])
        }
    }
}

#[async_trait]
impl UserStore for PostgresDatastore {
    async fn insert_user_if_absent(&self, user: &User) -> Result<Stored<User>, ServiceError> {
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, \
             $19, $20, $21, $22) ON CONFLICT (email, phone) DO NOTHING"
        );
        let result = bind_user(sqlx::query(&sql), user)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 1 {
            return Ok(Stored::created(user.clone()));
        }
        self.find_user(UserLookup::EmailPhone {
            email: &user.email,
            phone: &user.phone,
        })
        .await?
        .map(Stored::existing)
        .ok_or_else(|| ServiceError::Conflict(format!("user {} lost after insert", user.email)))
    }

    async fn put_user(&self, user: &User) -> Result<bool, ServiceError> {
        let sql = "UPDATE users SET name = $2, created = $3, updated = $4, expires = $5, \
                   admin = $6, email = $7, phone = $8, phone_code = $9, \
                   failed_2fa_attempts = $10, mail_token = $11, mail_confirm = $12, \
                   mail_tries = $13, authenticated = $14, active = $15, anonymous = $16, \
                   paid = $17, account_type = $18, slack_id = $19, slack_team_id = $20, \
                   slack_access_token = $21, api_token = $22 WHERE uid = $1";
        let result = bind_user(sqlx::query(sql), user)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_user(&self, lookup: UserLookup<'_>) -> Result<Option<User>, ServiceError> {
        let (clause, args) = user_filter(lookup);
        let sql =
            format!("SELECT {USER_COLUMNS} FROM users WHERE {clause} ORDER BY created LIMIT 1");
        bind_args(sqlx::query_as::<_, User>(&sql), &args)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn list_users(
        &self,
        updated_before: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<User>, ServiceError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE ($1::timestamptz IS NULL OR updated < $1) \
             ORDER BY created LIMIT $2"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(updated_before)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl SettingsStore for PostgresDatastore {
    async fn insert_setting_if_absent(
        &self,
        setting: &Setting,
    ) -> Result<Stored<Setting>, ServiceError> {
        let inserted = sqlx::query_as::<_, Setting>(
            "INSERT INTO settings (uid, name, value, updated) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (uid, name) DO NOTHING RETURNING uid, name, value, updated",
        )
        .bind(&setting.uid)
        .bind(&setting.name)
        .bind(&setting.value)
        .bind(setting.updated)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match inserted {
            Some(row) => Ok(Stored::created(row)),
            None => self
                .find_setting(&setting.uid, &setting.name)
                .await?
                .map(Stored::existing)
                .ok_or_else(|| {
                    ServiceError::Conflict(format!("setting {} lost after insert", setting.name))
                }),
        }
    }

    async fn upsert_setting(&self, setting: &Setting) -> Result<Setting, ServiceError> {
        sqlx::query_as::<_, Setting>(
            "INSERT INTO settings (uid, name, value, updated) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (uid, name) DO UPDATE SET value = EXCLUDED.value, \
             updated = EXCLUDED.updated RETURNING uid, name, value, updated",
        )
        .bind(&setting.uid)
        .bind(&setting.name)
        .bind(&setting.value)
        .bind(setting.updated)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn find_setting(&self, uid: &str, name: &str) -> Result<Option<Setting>, ServiceError> {
        sqlx::query_as::<_, Setting>(
            "SELECT uid, name, value, updated FROM settings WHERE uid = $1 AND name = $2",
        )
        .bind(uid)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn list_settings(&self, uid: &str, limit: u32) -> Result<Vec<Setting>, ServiceError> {
        sqlx::query_as::<_, Setting>(
            "SELECT uid, name, value, updated FROM settings WHERE uid = $1 \
             ORDER BY name LIMIT $2",
        )
        .bind(uid)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)
    }
}

#[async_trait]
impl SpoolStore for PostgresDatastore {
    async fn insert_spool(&self, spool: &Spool) -> Result<Spool, ServiceError> {
        let sql = format!(
            "INSERT INTO spools ({SPOOL_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {SPOOL_COLUMNS}"
        );
        sqlx::query_as::<_, Spool>(&sql)
            .bind(&spool.uid)
            .bind(&spool.name)
            .bind(spool.public)
            .bind(spool.created)
            .bind(spool.updated)
            .bind(spool.expires)
            .bind(&spool.nick)
            .bind(&spool.title)
            .bind(&spool.fq_domain)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn put_spool(&self, spool: &Spool) -> Result<bool, ServiceError> {
        let result = sqlx::query(
            "UPDATE spools SET uid = $1, public = $3, created = $4, updated = $5, \
             expires = $6, nick = $7, title = $8, fq_domain = $9 WHERE name = $2",
        )
        .bind(&spool.uid)
        .bind(&spool.name)
        .bind(spool.public)
        .bind(spool.created)
        .bind(spool.updated)
        .bind(spool.expires)
        .bind(&spool.nick)
        .bind(&spool.title)
        .bind(&spool.fq_domain)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_spool(&self, lookup: SpoolLookup<'_>) -> Result<Option<Spool>, ServiceError> {
        let (clause, args) = spool_filter(lookup);
        let sql =
            format!("SELECT {SPOOL_COLUMNS} FROM spools WHERE {clause} ORDER BY created LIMIT 1");
        bind_args(sqlx::query_as::<_, Spool>(&sql), &args)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn list_spools(
        &self,
        uid: Option<&str>,
        public: Option<bool>,
        limit: u32,
    ) -> Result<Vec<Spool>, ServiceError> {
        let sql = format!(
            "SELECT {SPOOL_COLUMNS} FROM spools \
             WHERE ($1::text IS NULL OR uid = $1) AND ($2::boolean IS NULL OR public = $2) \
             ORDER BY created LIMIT $3"
        );
        sqlx::query_as::<_, Spool>(&sql)
            .bind(uid)
            .bind(public)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl SidekickStore for PostgresDatastore {
    async fn insert_sidekick(&self, sidekick: &Sidekick) -> Result<Sidekick, ServiceError> {
        let sql = format!(
            "INSERT INTO sidekicks ({SIDEKICK_COLUMNS}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING {SIDEKICK_COLUMNS}"
        );
        sqlx::query_as::<_, Sidekick>(&sql)
            .bind(sidekick.created)
            .bind(sidekick.updated)
            .bind(sidekick.started)
            .bind(&sidekick.uid)
            .bind(&sidekick.name)
            .bind(&sidekick.title)
            .bind(&sidekick.nick)
            .bind(&sidekick.instance_name)
            .bind(&sidekick.instance_ip)
            .bind(&sidekick.region)
            .bind(&sidekick.mood)
            .bind(sidekick.num_docs)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn find_sidekick(
        &self,
        lookup: SidekickLookup<'_>,
    ) -> Result<Option<Sidekick>, ServiceError> {
        let (clause, args) = sidekick_filter(lookup);
        let sql = format!(
            "SELECT {SIDEKICK_COLUMNS} FROM sidekicks WHERE {clause} ORDER BY created LIMIT 1"
        );
        bind_args(sqlx::query_as::<_, Sidekick>(&sql), &args)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn list_sidekicks(&self, uid: &str, limit: u32) -> Result<Vec<Sidekick>, ServiceError> {
        let sql = format!(
            "SELECT {SIDEKICK_COLUMNS} FROM sidekicks WHERE uid = $1 ORDER BY created LIMIT $2"
        );
        sqlx::query_as::<_, Sidekick>(&sql)
            .bind(uid)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl EventStore for PostgresDatastore {
    async fn insert_event(&self, event: &QueuedEvent) -> Result<(), ServiceError> {
        sqlx::query(
            "INSERT INTO events (eid, uid, pipe, entity, text, created) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&event.eid)
        .bind(&event.uid)
        .bind(&event.pipe)
        .bind(&event.entity)
        .bind(&event.text)
        .bind(event.created)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn find_event(&self, eid: &str) -> Result<Option<QueuedEvent>, ServiceError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE eid = $1");
        sqlx::query_as::<_, QueuedEvent>(&sql)
            .bind(eid)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn delete_events_before(&self, cutoff: DateTime<Utc>) -> Result<u64, ServiceError> {
        let result = sqlx::query("DELETE FROM events WHERE created < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected())
    }

    async fn take_oldest_event(
        &self,
        key: EventKey<'_>,
        not_before: DateTime<Utc>,
    ) -> Result<Option<QueuedEvent>, ServiceError> {
        let sql = format!(
            "DELETE FROM events WHERE eid = (\
                 SELECT eid FROM events \
                 WHERE uid = $1 AND pipe = $2 AND ($3::text IS NULL OR entity = $3) \
                 AND created >= $4 \
                 ORDER BY created LIMIT 1 FOR UPDATE SKIP LOCKED) \
             RETURNING {EVENT_COLUMNS}"
        );
        sqlx::query_as::<_, QueuedEvent>(&sql)
            .bind(key.uid)
            .bind(key.pipe)
            .bind(key.entity)
            .bind(not_before)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl LedgerStore for PostgresDatastore {
    async fn insert_transaction_if_absent(
        &self,
        tx: &Transaction,
    ) -> Result<Stored<Transaction>, ServiceError> {
        let inserted = sqlx::query_as::<_, Transaction>(
            "INSERT INTO transactions (tid, uid, created) VALUES ($1, $2, $3) \
             ON CONFLICT (tid) DO NOTHING RETURNING tid, uid, created",
        )
        .bind(&tx.tid)
        .bind(&tx.uid)
        .bind(tx.created)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match inserted {
            Some(row) => Ok(Stored::created(row)),
            None => self
                .find_transaction(&tx.tid)
                .await?
                .map(Stored::existing)
                .ok_or_else(|| {
                    ServiceError::Conflict(format!("transaction {} lost after insert", tx.tid))
                }),
        }
    }

    async fn find_transaction(&self, tid: &str) -> Result<Option<Transaction>, ServiceError> {
        sqlx::query_as::<_, Transaction>(
            "SELECT tid, uid, created FROM transactions WHERE tid = $1",
        )
        .bind(tid)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn list_transactions_before(
        &self,
        cutoff: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Transaction>, ServiceError> {
        sqlx::query_as::<_, Transaction>(
            "SELECT tid, uid, created FROM transactions WHERE created < $1 \
             ORDER BY created LIMIT $2",
        )
        .bind(cutoff)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn delete_transactions_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, ServiceError> {
        let result = sqlx::query("DELETE FROM transactions WHERE created < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected())
    }

    async fn insert_slack_event_if_absent(
        &self,
        event: &SlackEvent,
    ) -> Result<Stored<SlackEvent>, ServiceError> {
        let inserted = sqlx::query_as::<_, SlackEvent>(
            "INSERT INTO slack_events (event_id, event_time, created) VALUES ($1, $2, $3) \
             ON CONFLICT (event_id) DO NOTHING RETURNING event_id, event_time, created",
        )
        .bind(&event.event_id)
        .bind(event.event_time)
        .bind(event.created)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match inserted {
            Some(row) => Ok(Stored::created(row)),
            None => self
                .find_slack_event(&event.event_id)
                .await?
                .map(Stored::existing)
                .ok_or_else(|| {
                    ServiceError::Conflict(format!(
                        "slack event {} lost after insert",
                        event.event_id
                    ))
                }),
        }
    }

    async fn find_slack_event(&self, event_id: &str) -> Result<Option<SlackEvent>, ServiceError> {
        sqlx::query_as::<_, SlackEvent>(
            "SELECT event_id, event_time, created FROM slack_events WHERE event_id = $1",
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn delete_slack_events_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, ServiceError> {
        let result = sqlx::query("DELETE FROM slack_events WHERE created < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl SignupStore for PostgresDatastore {
    async fn insert_waitlist_if_absent(
        &self,
        entry: &WaitlistEntry,
    ) -> Result<Stored<WaitlistEntry>, ServiceError> {
        let inserted = sqlx::query_as::<_, WaitlistEntry>(
            "INSERT INTO waitlist (name, email, allow, created) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (email) DO NOTHING RETURNING name, email, allow, created",
        )
        .bind(&entry.name)
        .bind(&entry.email)
        .bind(entry.allow)
        .bind(entry.created)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match inserted {
            Some(row) => Ok(Stored::created(row)),
            None => self
                .find_waitlist(&entry.email, false)
                .await?
                .map(Stored::existing)
                .ok_or_else(|| {
                    ServiceError::Conflict(format!("waitlist {} lost after insert", entry.email))
                }),
        }
    }

    async fn find_waitlist(
        &self,
        email: &str,
        allowed_only: bool,
    ) -> Result<Option<WaitlistEntry>, ServiceError> {
        sqlx::query_as::<_, WaitlistEntry>(
            "SELECT name, email, allow, created FROM waitlist \
             WHERE email = $1 AND (allow OR NOT $2)",
        )
        .bind(email)
        .bind(allowed_only)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn list_waitlist(&self, limit: u32) -> Result<Vec<WaitlistEntry>, ServiceError> {
        sqlx::query_as::<_, WaitlistEntry>(
            "SELECT name, email, allow, created FROM waitlist ORDER BY created LIMIT $1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn set_waitlist_allow(
        &self,
        email: &str,
        allow: bool,
    ) -> Result<Option<WaitlistEntry>, ServiceError> {
        sqlx::query_as::<_, WaitlistEntry>(
            "UPDATE waitlist SET allow = $2 WHERE email = $1 \
             RETURNING name, email, allow, created",
        )
        .bind(email)
        .bind(allow)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn insert_version_if_absent(
        &self,
        version: &Version,
    ) -> Result<Stored<Version>, ServiceError> {
        let inserted = sqlx::query_as::<_, Version>(
            "INSERT INTO versions (name, allow, created) VALUES ($1, $2, $3) \
             ON CONFLICT (name) DO NOTHING RETURNING name, allow, created",
        )
        .bind(&version.name)
        .bind(version.allow)
        .bind(version.created)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match inserted {
            Some(row) => Ok(Stored::created(row)),
            None => self
                .find_version(&version.name, false)
                .await?
                .map(Stored::existing)
                .ok_or_else(|| {
                    ServiceError::Conflict(format!("version {} lost after insert", version.name))
                }),
        }
    }

    async fn find_version(
        &self,
        name: &str,
        allowed_only: bool,
    ) -> Result<Option<Version>, ServiceError> {
        sqlx::query_as::<_, Version>(
            "SELECT name, allow, created FROM versions WHERE name = $1 AND (allow OR NOT $2)",
        )
        .bind(name)
        .bind(allowed_only)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn list_versions(&self, limit: u32) -> Result<Vec<Version>, ServiceError> {
        sqlx::query_as::<_, Version>(
            "SELECT name, allow, created FROM versions ORDER BY created LIMIT $1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)
    }
}
