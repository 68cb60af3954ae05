use crate::error::Result;
use crate::link::{ClickStats, Link};
use async_trait::async_trait;

/// CRUD access to stored links.
///
/// Every method takes the short name in any display form and normalizes it
/// to the canonical key before touching storage.
#[async_trait]
pub trait LinkRepository: Send + Sync + 'static {
    /// Returns every stored link, in no particular order.
    async fn load_all(&self) -> Result<Vec<Link>>;

    /// Returns the link stored under `short`'s key.
    /// Fails with `NotFound` if there is none.
    async fn load(&self, short: &str) -> Result<Link>;

    /// Inserts the link, or replaces every field of the one already stored
    /// under the same key. Saving the same value twice is a no-op.
    async fn save(&self, link: &Link) -> Result<()>;

    /// Removes the link stored under `short`'s key.
    /// Fails with `NotFound` if there is none.
    async fn delete(&self, short: &str) -> Result<()>;
}

/// Append-only click statistics.
#[async_trait]
pub trait StatsRepository: Send + Sync + 'static {
    /// Returns the all-time click total of every key that was ever clicked.
    async fn load_stats(&self) -> Result<ClickStats>;

    /// Records a batch of click increments. Either the whole batch is
    /// recorded or none of it is.
    async fn save_stats(&self, delta: &ClickStats) -> Result<()>;

    /// Forgets every recorded increment for `short`'s key.
    /// It is not an error if nothing was recorded.
    async fn delete_stats(&self, short: &str) -> Result<()>;
}
