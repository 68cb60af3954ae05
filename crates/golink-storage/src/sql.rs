use crate::config::{ConcurrencyPolicy, StoreConfig};
use crate::error::{is_already_exists, map_sqlx_error};
use async_trait::async_trait;
use golink_core::{
    ClickStats, Clock, Link, LinkKey, LinkRepository, Result, StatsRepository, StorageError,
    SystemClock,
};
use jiff::Timestamp;
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Row};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

const SELECT_ALL_LINKS: &str = "SELECT Short, Long, Created, LastEdit, Owner FROM Links";

const SELECT_LINK: &str =
    "SELECT Short, Long, Created, LastEdit, Owner FROM Links WHERE ID = $1 LIMIT 1";

const UPSERT_LINK: &str = r#"
    INSERT INTO Links (ID, Short, Long, Created, LastEdit, Owner)
    VALUES ($1, $2, $3, $4, $5, $6)
    ON CONFLICT (ID) DO UPDATE SET
        Short = excluded.Short,
        Long = excluded.Long,
        Created = excluded.Created,
        LastEdit = excluded.LastEdit,
        Owner = excluded.Owner
"#;

const DELETE_LINK: &str = "DELETE FROM Links WHERE ID = $1";

const SUM_STATS: &str = "SELECT ID, CAST(SUM(Clicks) AS BIGINT) FROM Stats GROUP BY ID";

const INSERT_STAT: &str = "INSERT INTO Stats (ID, Created, Clicks) VALUES ($1, $2, $3)";

const DELETE_STATS: &str = "DELETE FROM Stats WHERE ID = $1";

/// SQL implementation of the link and stats repositories.
///
/// Runs on PostgreSQL and SQLite through sqlx's `Any` driver; the statements
/// only use syntax both understand. Links live one row per canonical key in
/// `Links`; clicks are appended to `Stats` and summed on read.
///
/// Under [`ConcurrencyPolicy::InProcessLock`] link reads share a lock that
/// link writes and stats writes take exclusively. `load_stats` never takes
/// it, so totals may lag a concurrent `save_stats`. Clones share the pool and
/// the lock.
#[derive(Debug, Clone)]
pub struct LinkStore<C: Clock = SystemClock> {
    pool: AnyPool,
    lock: Option<Arc<RwLock<()>>>,
    clock: C,
}

impl LinkStore<SystemClock> {
    /// Opens a pool for `config.database_url` and bootstraps the schema.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        Self::connect_with_clock(config, SystemClock).await
    }
}

impl<C: Clock> LinkStore<C> {
    /// Like [`LinkStore::connect`], stamping stats rows with `clock`.
    pub async fn connect_with_clock(config: &StoreConfig, clock: C) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .connect(&config.database_url)
            .await
            .map_err(map_sqlx_error)?;

        for statement in config.schema_statements() {
            match sqlx::query(&statement).execute(&pool).await {
                Ok(_) => {}
                Err(err) if is_already_exists(&err) => {
                    debug!(error = %err, "schema object already exists");
                }
                Err(err) => {
                    pool.close().await;
                    return Err(StorageError::Schema(err.to_string()));
                }
            }
        }

        let lock = match config.concurrency {
            ConcurrencyPolicy::InProcessLock => Some(Arc::new(RwLock::new(()))),
            ConcurrencyPolicy::DatabaseOnly => None,
        };

        debug!(concurrency = ?config.concurrency, "link store ready");

        Ok(Self { pool, lock, clock })
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Returns the current time of the store's clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Closes every pooled connection. Operations issued afterwards fail
    /// with [`StorageError::Unavailable`].
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn read_guard(&self) -> Option<RwLockReadGuard<'_, ()>> {
        match &self.lock {
            Some(lock) => Some(lock.read().await),
            None => None,
        }
    }

    async fn write_guard(&self) -> Option<RwLockWriteGuard<'_, ()>> {
        match &self.lock {
            Some(lock) => Some(lock.write().await),
            None => None,
        }
    }
}

fn parse_timestamp(column: &str, seconds: i64) -> Result<Timestamp> {
    Timestamp::from_second(seconds).map_err(|e| {
        StorageError::InvalidData(format!("invalid {column} timestamp '{seconds}': {e}"))
    })
}

fn link_from_row(row: &AnyRow) -> Result<Link> {
    // by position: PostgreSQL folds the unquoted column names to lower case
    let short: String = row.try_get(0).map_err(map_sqlx_error)?;
    let long: String = row.try_get(1).map_err(map_sqlx_error)?;
    let created: i64 = row.try_get(2).map_err(map_sqlx_error)?;
    let last_edit: i64 = row.try_get(3).map_err(map_sqlx_error)?;
    let owner: String = row.try_get(4).map_err(map_sqlx_error)?;

    Ok(Link {
        short,
        long,
        created: parse_timestamp("Created", created)?,
        last_edit: parse_timestamp("LastEdit", last_edit)?,
        owner,
    })
}

#[async_trait]
impl<C: Clock + 'static> LinkRepository for LinkStore<C> {
    async fn load_all(&self) -> Result<Vec<Link>> {
        let _guard = self.read_guard().await;

        let rows = sqlx::query(SELECT_ALL_LINKS)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(link_from_row).collect()
    }

    async fn load(&self, short: &str) -> Result<Link> {
        let key = LinkKey::from_short(short);
        let _guard = self.read_guard().await;

        let row = sqlx::query(SELECT_LINK)
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => link_from_row(&row),
            None => Err(StorageError::NotFound(key.into_string())),
        }
    }

    async fn save(&self, link: &Link) -> Result<()> {
        let key = link.key();
        let _guard = self.write_guard().await;

        // The affected-row count of an upsert differs between drivers and
        // between its insert and update branches, so it is not checked.
        sqlx::query(UPSERT_LINK)
            .bind(key.as_str())
            .bind(link.short.as_str())
            .bind(link.long.as_str())
            .bind(link.created.as_second())
            .bind(link.last_edit.as_second())
            .bind(link.owner.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        debug!(key = %key, "saved link");
        Ok(())
    }

    async fn delete(&self, short: &str) -> Result<()> {
        let key = LinkKey::from_short(short);
        let _guard = self.write_guard().await;

        let result = sqlx::query(DELETE_LINK)
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        match result.rows_affected() {
            1 => {
                debug!(key = %key, "deleted link");
                Ok(())
            }
            0 => Err(StorageError::NotFound(key.into_string())),
            affected => {
                warn!(key = %key, affected, "link delete affected more than one row");
                Err(StorageError::UnexpectedRowCount {
                    key: key.into_string(),
                    affected,
                })
            }
        }
    }
}

#[async_trait]
impl<C: Clock + 'static> StatsRepository for LinkStore<C> {
    async fn load_stats(&self) -> Result<ClickStats> {
        let rows = sqlx::query(SUM_STATS)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let mut stats = ClickStats::with_capacity(rows.len());
        for row in &rows {
            let id: String = row.try_get(0).map_err(map_sqlx_error)?;
            let clicks: i64 = row.try_get(1).map_err(map_sqlx_error)?;
            stats.insert(id, clicks);
        }

        debug!(links = stats.len(), "loaded click stats");
        Ok(stats)
    }

    async fn save_stats(&self, delta: &ClickStats) -> Result<()> {
        if delta.is_empty() {
            return Ok(());
        }

        let _guard = self.write_guard().await;
        let now = self.clock.now().as_second();

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        for (short, clicks) in delta {
            let key = LinkKey::from_short(short);
            let inserted = sqlx::query(INSERT_STAT)
                .bind(key.as_str())
                .bind(now)
                .bind(*clicks)
                .execute(&mut *tx)
                .await;

            if let Err(err) = inserted {
                warn!(key = %key, error = %err, "rolling back click stats batch");
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "click stats rollback failed");
                }
                return Err(map_sqlx_error(err));
            }
        }
        tx.commit().await.map_err(map_sqlx_error)?;

        debug!(links = delta.len(), "recorded click stats");
        Ok(())
    }

    async fn delete_stats(&self, short: &str) -> Result<()> {
        let key = LinkKey::from_short(short);
        let _guard = self.write_guard().await;

        let result = sqlx::query(DELETE_STATS)
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        debug!(key = %key, rows = result.rows_affected(), "deleted click stats");
        Ok(())
    }
}
