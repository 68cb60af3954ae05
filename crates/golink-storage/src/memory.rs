use async_trait::async_trait;
use dashmap::DashMap;
use golink_core::{
    ClickStats, Clock, Link, LinkKey, LinkRepository, Result, StatsRepository, StorageError,
    SystemClock,
};
use jiff::Timestamp;
use std::sync::{Mutex, PoisonError};

/// One recorded batch entry, mirroring a row of the `Stats` table.
#[derive(Debug, Clone)]
struct StatRecord {
    key: String,
    created: Timestamp,
    clicks: i64,
}

/// In-memory implementation of the link and stats repositories.
///
/// Follows the same contract as [`LinkStore`](crate::LinkStore): names are
/// normalized, saves upsert, deleting a missing link fails with `NotFound`
/// and clicks are appended and summed on read. Timestamps keep their full
/// precision. Nothing survives the process.
#[derive(Debug)]
pub struct InMemoryLinkStore<C: Clock = SystemClock> {
    links: DashMap<String, Link>,
    stats: Mutex<Vec<StatRecord>>,
    clock: C,
}

impl InMemoryLinkStore<SystemClock> {
    /// Creates a new in-memory store.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Creates a new in-memory store with room for `capacity` links.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            links: DashMap::with_capacity(capacity),
            stats: Mutex::new(Vec::new()),
            clock: SystemClock,
        }
    }
}

impl Default for InMemoryLinkStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> InMemoryLinkStore<C> {
    /// Creates a new in-memory store stamping stats with `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self {
            links: DashMap::new(),
            stats: Mutex::new(Vec::new()),
            clock,
        }
    }
}

#[async_trait]
impl<C: Clock + 'static> LinkRepository for InMemoryLinkStore<C> {
    async fn load_all(&self) -> Result<Vec<Link>> {
        Ok(self
            .links
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn load(&self, short: &str) -> Result<Link> {
        let key = LinkKey::from_short(short);
        self.links
            .get(key.as_str())
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StorageError::NotFound(key.into_string()))
    }

    async fn save(&self, link: &Link) -> Result<()> {
        self.links.insert(link.key().into_string(), link.clone());
        Ok(())
    }

    async fn delete(&self, short: &str) -> Result<()> {
        let key = LinkKey::from_short(short);
        match self.links.remove(key.as_str()) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(key.into_string())),
        }
    }
}

#[async_trait]
impl<C: Clock + 'static> StatsRepository for InMemoryLinkStore<C> {
    async fn load_stats(&self) -> Result<ClickStats> {
        let records = self.stats.lock().unwrap_or_else(PoisonError::into_inner);

        let mut stats = ClickStats::new();
        for record in records.iter() {
            let total = stats.entry(record.key.clone()).or_insert(0);
            *total = total.checked_add(record.clicks).ok_or_else(|| {
                StorageError::InvalidData(format!("click total of '{}' overflows", record.key))
            })?;
        }
        Ok(stats)
    }

    async fn save_stats(&self, delta: &ClickStats) -> Result<()> {
        let created = self.clock.now();
        let batch = delta.iter().map(|(short, clicks)| StatRecord {
            key: LinkKey::from_short(short).into_string(),
            created,
            clicks: *clicks,
        });

        // extended under one lock so readers never see half a batch
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(batch);
        Ok(())
    }

    async fn delete_stats(&self, short: &str) -> Result<()> {
        let key = LinkKey::from_short(short);
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|record| record.key != key.as_str());
        Ok(())
    }
}

#[cfg(test)]
impl<C: Clock> InMemoryLinkStore<C> {
    /// Timestamps of every recorded batch entry for `short`, oldest first.
    fn stat_times(&self, short: &str) -> Vec<Timestamp> {
        let key = LinkKey::from_short(short);
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|record| record.key == key.as_str())
            .map(|record| record.created)
            .collect()
    }
}
