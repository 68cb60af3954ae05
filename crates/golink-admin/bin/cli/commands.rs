use crate::cli::Command;
use anyhow::{Context, Result};
use golink_core::{ClickStats, Link, LinkKey, LinkRepository, StatsRepository};
use jiff::Timestamp;
use std::collections::BTreeMap;
use std::io::Write;
use tracing::info;

/// Builds the link written by `put`.
///
/// An existing link keeps its creation time; the store replaces every
/// column on save, so it has to be carried over here.
pub fn link_for_put(
    existing: Option<Link>,
    short: &str,
    long: &str,
    owner: &str,
    now: Timestamp,
) -> Link {
    Link {
        short: short.to_string(),
        long: long.to_string(),
        created: existing.map_or(now, |link| link.created),
        last_edit: now,
        owner: owner.to_string(),
    }
}

/// Runs a command that does not touch the database.
pub fn run_offline(command: &Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Key { short } => writeln!(out, "{}", LinkKey::from_short(short))?,
        other => anyhow::bail!("{other:?} needs a database"),
    }
    Ok(())
}

/// Runs a command against `store`, writing results as JSON to `out`.
pub async fn run<S>(command: &Command, store: &S, out: &mut impl Write) -> Result<()>
where
    S: LinkRepository + StatsRepository,
{
    match command {
        Command::Init => info!("schema is ready"),
        Command::List => {
            let mut links = store.load_all().await.context("loading links")?;
            links.sort_by_key(|link| link.key());
            for link in &links {
                serde_json::to_writer(&mut *out, link)?;
                writeln!(out)?;
            }
        }
        Command::Get { short } => {
            let link = store
                .load(short)
                .await
                .with_context(|| format!("loading link '{short}'"))?;
            serde_json::to_writer(&mut *out, &link)?;
            writeln!(out)?;
        }
        Command::Put { short, long, owner } => {
            let existing = match store.load(short).await {
                Ok(link) => Some(link),
                Err(err) if err.is_not_found() => None,
                Err(err) => return Err(err).context("loading existing link"),
            };
            let link = link_for_put(existing, short, long, owner, Timestamp::now());
            store
                .save(&link)
                .await
                .with_context(|| format!("saving link '{short}'"))?;
            info!(key = %link.key(), long = %link.long, "saved link");
        }
        Command::Delete { short } => {
            store
                .delete(short)
                .await
                .with_context(|| format!("deleting link '{short}'"))?;
            info!(key = %LinkKey::from_short(short), "deleted link");
        }
        Command::Stats => {
            let stats: BTreeMap<_, _> = store
                .load_stats()
                .await
                .context("loading click stats")?
                .into_iter()
                .collect();
            serde_json::to_writer(&mut *out, &stats)?;
            writeln!(out)?;
        }
        Command::Click { short, clicks } => {
            let delta = ClickStats::from([(short.clone(), *clicks)]);
            store
                .save_stats(&delta)
                .await
                .context("recording clicks")?;
        }
        Command::DeleteStats { short } => {
            store
                .delete_stats(short)
                .await
                .with_context(|| format!("deleting click stats of '{short}'"))?;
        }
        Command::Key { .. } => run_offline(command, out)?,
    }
    Ok(())
}
