use std::borrow::Cow;
use std::time::Duration;
use typed_builder::TypedBuilder;

/// Statements creating the `Links` and `Stats` tables, if missing.
pub const SCHEMA: &str = include_str!("../ddl/schema.sql");

/// How a [`LinkStore`](crate::LinkStore) serializes access within one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConcurrencyPolicy {
    /// Reads share, writes exclude, through a per-store read/write lock held
    /// on top of the database's own atomicity.
    #[default]
    InProcessLock,
    /// No in-process lock. Every statement relies on database atomicity
    /// alone, which is all that coordinates several service instances anyway.
    DatabaseOnly,
}

/// Configures a [`LinkStore`](crate::LinkStore).
#[derive(Debug, Clone, TypedBuilder)]
pub struct StoreConfig {
    /// `postgres://…` or `sqlite:…` connection URL.
    #[builder(setter(into))]
    pub database_url: String,
    #[builder(default = 10)]
    pub max_connections: u32,
    #[builder(default = Duration::from_secs(30))]
    pub acquire_timeout: Duration,
    #[builder(default = Some(Duration::from_secs(10 * 60)))]
    pub idle_timeout: Option<Duration>,
    #[builder(default = Some(Duration::from_secs(30 * 60)))]
    pub max_lifetime: Option<Duration>,
    #[builder(default)]
    pub concurrency: ConcurrencyPolicy,
    /// Schema bootstrap SQL, executed statement by statement on connect.
    /// Statements are separated by `;`, and `--` comment lines are skipped.
    #[builder(default = Cow::Borrowed(SCHEMA), setter(into))]
    pub schema: Cow<'static, str>,
}

impl StoreConfig {
    /// Default settings for the given database URL.
    pub fn from_url(database_url: impl Into<String>) -> Self {
        Self::builder().database_url(database_url).build()
    }

    pub(crate) fn schema_statements(&self) -> Vec<String> {
        let without_comments = self
            .schema
            .lines()
            .filter(|line| !line.trim_start().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");

        without_comments
            .split(';')
            .map(str::trim)
            .filter(|statement| !statement.is_empty())
            .map(str::to_owned)
            .collect()
    }
}
