//! JSON-file store for per-guild to-do state.

use crate::error::AppResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;

/// Name of the list every guild starts with. Protected from deletion.
pub const DEFAULT_LIST: &str = "default";

/// A single to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub text: String,
    pub done: bool,
}

impl Task {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            done: false,
        }
    }
}

/// Per-guild state: the active list name plus all named lists.
///
/// Invariants: `lists` always contains [`DEFAULT_LIST`], and `current_list`
/// always names a key present in `lists`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerState {
    pub current_list: String,
    pub lists: BTreeMap<String, Vec<Task>>,
}

impl Default for ServerState {
    fn default() -> Self {
        let mut lists = BTreeMap::new();
        lists.insert(DEFAULT_LIST.to_string(), Vec::new());
        Self {
            current_list: DEFAULT_LIST.to_string(),
            lists,
        }
    }
}

impl ServerState {
    /// Tasks of the active list, in insertion order.
    pub fn current_tasks(&self) -> &[Task] {
        self.lists
            .get(&self.current_list)
            .expect("current_list names an existing list")
    }

    /// Mutable tasks of the active list.
    pub fn current_tasks_mut(&mut self) -> &mut Vec<Task> {
        self.lists
            .get_mut(&self.current_list)
            .expect("current_list names an existing list")
    }
}

/// The whole persisted database, keyed by guild id.
pub type Database = BTreeMap<String, ServerState>;

/// In-memory image of the database plus the file it persists to.
pub struct StoreInner {
    path: PathBuf,
    pub db: Database,
}

impl StoreInner {
    /// State for `guild_id`, creating the default structure when the guild is
    /// seen for the first time. Creation persists immediately; a plain lookup
    /// does not touch the file.
    pub fn ensure_server(&mut self, guild_id: &str) -> AppResult<&mut ServerState> {
        if !self.db.contains_key(guild_id) {
            info!(guild_id, "Creating default state for new guild");
            self.db
                .insert(guild_id.to_string(), ServerState::default());
            self.save()?;
        }
        Ok(self
            .db
            .get_mut(guild_id)
            .expect("entry exists after ensure"))
    }

    /// Serialize the full database and overwrite the store file.
    ///
    /// No atomic rename; a crash mid-write can corrupt the file.
    pub fn save(&self) -> AppResult<()> {
        let json = serde_json::to_string_pretty(&self.db)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

/// A thread-safe handle to the on-disk to-do database.
///
/// The store is loaded once and held in memory; every mutating command
/// rewrites the whole file. A command's full read-mutate-save sequence runs
/// under a single lock acquisition, so concurrent commands serialize instead
/// of losing updates. File work runs on `spawn_blocking` threads to avoid
/// blocking the async runtime.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Mutex<StoreInner>>,
}

impl Store {
    /// Load the database from `path`, starting empty if the file does not
    /// exist yet. An existing file that cannot be read or parsed is a fatal
    /// error, as is a well-formed one that violates the state invariants.
    pub fn load(path: &Path) -> AppResult<Self> {
        let db: Database = if path.exists() {
            let json = std::fs::read_to_string(path)?;
            serde_json::from_str(&json)?
        } else {
            Database::new()
        };
        for (guild_id, state) in &db {
            if !state.lists.contains_key(DEFAULT_LIST) {
                return Err(anyhow::anyhow!(
                    "Corrupt store: guild {} has no '{}' list",
                    guild_id,
                    DEFAULT_LIST
                )
                .into());
            }
            if !state.lists.contains_key(&state.current_list) {
                return Err(anyhow::anyhow!(
                    "Corrupt store: guild {} points at missing list '{}'",
                    guild_id,
                    state.current_list
                )
                .into());
            }
        }
        Ok(Self {
            inner: Arc::new(Mutex::new(StoreInner {
                path: path.to_path_buf(),
                db,
            })),
        })
    }

    /// Execute a read-only closure with a shared reference to the store.
    pub async fn call<F, T>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&StoreInner) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = inner.lock().unwrap();
            f(&guard)
        })
        .await?
    }

    /// Execute a mutating closure with a mutable reference to the store.
    pub async fn call_mut<F, T>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut StoreInner) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = inner.lock().unwrap();
            f(&mut guard)
        })
        .await?
    }
}
