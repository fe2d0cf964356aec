//! Offline self-check: configuration, token presence, and store health.

use crate::config::Config;
use crate::error::AppResult;
use crate::store::Store;
use tracing::{info, warn};

/// Validate the local setup without connecting to Discord.
///
/// Reports token presence (never the token itself), the store location, and a
/// per-guild summary of the persisted state. A corrupt store file is the one
/// condition that fails the check, matching what startup would do.
pub async fn run(config: &Config) -> AppResult<()> {
    match config.bot.resolve_token() {
        Ok(_) => info!("Discord token: present"),
        Err(e) => warn!("Discord token: {e}"),
    }

    info!("Store path: {}", config.store.path.display());
    if !config.store.path.exists() {
        info!("Store file does not exist yet; it will be created on first use.");
        return Ok(());
    }

    let store = Store::load(&config.store.path)?;
    let summary = store
        .call(|inner| {
            Ok(inner
                .db
                .iter()
                .map(|(guild_id, state)| {
                    let tasks: usize = state.lists.values().map(Vec::len).sum();
                    (guild_id.clone(), state.lists.len(), tasks)
                })
                .collect::<Vec<_>>())
        })
        .await?;

    info!("Store OK: {} guild(s)", summary.len());
    for (guild_id, lists, tasks) in summary {
        info!(guild_id = %guild_id, lists, tasks, "Guild state");
    }
    Ok(())
}
