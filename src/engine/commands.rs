//! The `/todo` command handlers.
//!
//! Each handler takes the invoking guild's id and the command arguments,
//! mutates the guild's state through the store, and returns the reply text.
//! Nothing here knows about Discord; the gateway forwards invocations.

use crate::config::Config;
use crate::error::AppResult;
use crate::store::{DEFAULT_LIST, Store, Task};
use std::sync::Arc;

/// The shared application state handed to every command.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Store,
}

impl AppState {
    pub fn new(config: Config, store: Store) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }

    /// Append a task to the current list.
    pub async fn add(&self, guild_id: &str, task: String) -> AppResult<String> {
        let guild_id = guild_id.to_string();
        self.store
            .call_mut(move |inner| {
                let state = inner.ensure_server(&guild_id)?;
                let list = state.current_list.clone();
                state.current_tasks_mut().push(Task::new(task.as_str()));
                inner.save()?;
                Ok(format!("✅ Added task: **{task}** to list **{list}**"))
            })
            .await
    }

    /// Split one input string on the configured delimiter and append every
    /// non-empty trimmed piece as its own task.
    pub async fn add_bulk(&self, guild_id: &str, tasks: String) -> AppResult<String> {
        let guild_id = guild_id.to_string();
        let delimiter = self.config.bot.bulk_delimiter().to_string();
        self.store
            .call_mut(move |inner| {
                let state = inner.ensure_server(&guild_id)?;
                let list = state.current_list.clone();
                let items: Vec<Task> = tasks
                    .split(delimiter.as_str())
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(Task::new)
                    .collect();
                let count = items.len();
                if count > 0 {
                    state.current_tasks_mut().extend(items);
                    inner.save()?;
                }
                Ok(format!("✅ Added **{count}** tasks to list **{list}**"))
            })
            .await
    }

    /// Render the current list as numbered lines with a done marker.
    pub async fn list(&self, guild_id: &str) -> AppResult<String> {
        let guild_id = guild_id.to_string();
        self.store
            .call_mut(move |inner| {
                let state = inner.ensure_server(&guild_id)?;
                let name = state.current_list.clone();
                let tasks = state.current_tasks();
                if tasks.is_empty() {
                    return Ok(format!("📭 **List '{name}' is empty.**"));
                }
                let mut msg = format!("📋 **TODO LIST: {name}**\n\n");
                for (i, task) in tasks.iter().enumerate() {
                    let status = if task.done { "✔️" } else { "❌" };
                    msg.push_str(&format!("{}. {} {}\n", i + 1, status, task.text));
                }
                Ok(msg)
            })
            .await
    }

    /// Mark the task at the 1-based `index` as done.
    pub async fn check(&self, guild_id: &str, index: i64) -> AppResult<String> {
        self.set_done(guild_id, index, true).await
    }

    /// Mark the task at the 1-based `index` as not done.
    pub async fn uncheck(&self, guild_id: &str, index: i64) -> AppResult<String> {
        self.set_done(guild_id, index, false).await
    }

    async fn set_done(&self, guild_id: &str, index: i64, done: bool) -> AppResult<String> {
        let guild_id = guild_id.to_string();
        self.store
            .call_mut(move |inner| {
                let state = inner.ensure_server(&guild_id)?;
                let tasks = state.current_tasks_mut();
                // 1-based index; anything outside [1, len] leaves state untouched.
                if index < 1 || index as usize > tasks.len() {
                    return Ok("❌ Invalid task number.".to_string());
                }
                tasks[index as usize - 1].done = done;
                inner.save()?;
                Ok(if done {
                    format!("✔️ Marked task **#{index}** as complete.")
                } else {
                    format!("❌ Unchecked task **#{index}**.")
                })
            })
            .await
    }

    /// Remove every task from the current list.
    pub async fn clear(&self, guild_id: &str) -> AppResult<String> {
        let guild_id = guild_id.to_string();
        self.store
            .call_mut(move |inner| {
                let state = inner.ensure_server(&guild_id)?;
                let list = state.current_list.clone();
                state.current_tasks_mut().clear();
                inner.save()?;
                Ok(format!("🗑 Cleared list **{list}**"))
            })
            .await
    }

    /// Create a new empty list under `name`.
    pub async fn list_create(&self, guild_id: &str, name: String) -> AppResult<String> {
        let guild_id = guild_id.to_string();
        self.store
            .call_mut(move |inner| {
                let state = inner.ensure_server(&guild_id)?;
                if state.lists.contains_key(&name) {
                    return Ok("⚠️ List already exists.".to_string());
                }
                state.lists.insert(name.clone(), Vec::new());
                inner.save()?;
                Ok(format!("📁 Created new list: **{name}**"))
            })
            .await
    }

    /// Make `name` the current list.
    pub async fn list_switch(&self, guild_id: &str, name: String) -> AppResult<String> {
        let guild_id = guild_id.to_string();
        self.store
            .call_mut(move |inner| {
                let state = inner.ensure_server(&guild_id)?;
                if !state.lists.contains_key(&name) {
                    return Ok("❌ List does not exist.".to_string());
                }
                state.current_list = name.clone();
                inner.save()?;
                Ok(format!("🔄 Switched to list: **{name}**"))
            })
            .await
    }

    /// Delete the list named `name`. The default list is protected; deleting
    /// the current list switches back to the default one.
    pub async fn list_delete(&self, guild_id: &str, name: String) -> AppResult<String> {
        let guild_id = guild_id.to_string();
        self.store
            .call_mut(move |inner| {
                let state = inner.ensure_server(&guild_id)?;
                if name == DEFAULT_LIST {
                    return Ok(format!(
                        "⚠️ The **{DEFAULT_LIST}** list is protected and can't be deleted."
                    ));
                }
                if state.lists.remove(&name).is_none() {
                    return Ok("❌ List does not exist.".to_string());
                }
                let reply = if state.current_list == name {
                    state.current_list = DEFAULT_LIST.to_string();
                    format!("🗑 Deleted list **{name}** and switched back to **{DEFAULT_LIST}**.")
                } else {
                    format!("🗑 Deleted list **{name}**.")
                };
                inner.save()?;
                Ok(reply)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BotConfig;
    use crate::store::Database;
    use tempfile::TempDir;

    const GUILD: &str = "42";

    fn setup() -> (AppState, TempDir) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = Store::load(&dir.path().join("todo_data.json")).expect("load empty store");
        (AppState::new(Config::default(), store), dir)
    }

    async fn snapshot(state: &AppState) -> Database {
        state
            .store
            .call(|inner| Ok(inner.db.clone()))
            .await
            .expect("snapshot store")
    }

    #[tokio::test]
    async fn add_then_list_shows_task_not_done_in_last_position() {
        let (state, _dir) = setup();
        state.add(GUILD, "buy milk".to_string()).await.unwrap();
        let reply = state.add(GUILD, "walk dog".to_string()).await.unwrap();
        assert_eq!(reply, "✅ Added task: **walk dog** to list **default**");

        let listing = state.list(GUILD).await.unwrap();
        assert!(listing.starts_with("📋 **TODO LIST: default**"));
        assert!(listing.ends_with("2. ❌ walk dog\n"));

        let db = snapshot(&state).await;
        let tasks = &db[GUILD].lists[DEFAULT_LIST];
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].text, "walk dog");
        assert!(!tasks[1].done);
    }

    #[tokio::test]
    async fn list_reports_empty_state() {
        let (state, _dir) = setup();
        let reply = state.list(GUILD).await.unwrap();
        assert_eq!(reply, "📭 **List 'default' is empty.**");
    }

    #[tokio::test]
    async fn check_then_uncheck_restores_not_done() {
        let (state, _dir) = setup();
        state.add(GUILD, "buy milk".to_string()).await.unwrap();

        let reply = state.check(GUILD, 1).await.unwrap();
        assert_eq!(reply, "✔️ Marked task **#1** as complete.");
        assert!(snapshot(&state).await[GUILD].lists[DEFAULT_LIST][0].done);

        let reply = state.uncheck(GUILD, 1).await.unwrap();
        assert_eq!(reply, "❌ Unchecked task **#1**.");
        assert!(!snapshot(&state).await[GUILD].lists[DEFAULT_LIST][0].done);
    }

    #[tokio::test]
    async fn out_of_range_indices_never_mutate() {
        let (state, _dir) = setup();
        state.add(GUILD, "buy milk".to_string()).await.unwrap();
        let before = snapshot(&state).await;

        for index in [0, -1, 2, i64::MAX] {
            let reply = state.check(GUILD, index).await.unwrap();
            assert_eq!(reply, "❌ Invalid task number.");
            let reply = state.uncheck(GUILD, index).await.unwrap();
            assert_eq!(reply, "❌ Invalid task number.");
        }
        assert_eq!(before, snapshot(&state).await);
    }

    #[tokio::test]
    async fn clear_empties_current_list_only() {
        let (state, _dir) = setup();
        state.add(GUILD, "buy milk".to_string()).await.unwrap();
        state
            .list_create(GUILD, "work".to_string())
            .await
            .unwrap();
        state
            .list_switch(GUILD, "work".to_string())
            .await
            .unwrap();
        state.add(GUILD, "standup".to_string()).await.unwrap();

        let reply = state.clear(GUILD).await.unwrap();
        assert_eq!(reply, "🗑 Cleared list **work**");

        let db = snapshot(&state).await;
        assert!(db[GUILD].lists["work"].is_empty());
        assert_eq!(db[GUILD].lists[DEFAULT_LIST].len(), 1);
    }

    #[tokio::test]
    async fn add_bulk_trims_and_drops_empty_items() {
        let (state, _dir) = setup();
        let reply = state.add_bulk(GUILD, "a; b ;;c".to_string()).await.unwrap();
        assert_eq!(reply, "✅ Added **3** tasks to list **default**");

        let db = snapshot(&state).await;
        let texts: Vec<&str> = db[GUILD].lists[DEFAULT_LIST]
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(texts, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn add_bulk_with_no_valid_items_reports_zero() {
        let (state, _dir) = setup();
        let reply = state.add_bulk(GUILD, " ; ;; ".to_string()).await.unwrap();
        assert_eq!(reply, "✅ Added **0** tasks to list **default**");
        assert!(snapshot(&state).await[GUILD].lists[DEFAULT_LIST].is_empty());
    }

    #[tokio::test]
    async fn add_bulk_respects_configured_delimiter() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = Store::load(&dir.path().join("todo_data.json")).expect("load empty store");
        let config = Config {
            bot: BotConfig {
                token: None,
                bulk_delimiter: ",".to_string(),
            },
            ..Config::default()
        };
        let state = AppState::new(config, store);

        state.add_bulk(GUILD, "a,b;c".to_string()).await.unwrap();
        let db = snapshot(&state).await;
        let texts: Vec<&str> = db[GUILD].lists[DEFAULT_LIST]
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(texts, ["a", "b;c"]);
    }

    #[tokio::test]
    async fn list_create_twice_reports_conflict() {
        let (state, _dir) = setup();
        let reply = state.list_create(GUILD, "work".to_string()).await.unwrap();
        assert_eq!(reply, "📁 Created new list: **work**");

        let reply = state.list_create(GUILD, "work".to_string()).await.unwrap();
        assert_eq!(reply, "⚠️ List already exists.");

        let db = snapshot(&state).await;
        assert_eq!(db[GUILD].lists.len(), 2);
    }

    #[tokio::test]
    async fn list_switch_targets_later_adds() {
        let (state, _dir) = setup();
        state
            .list_create(GUILD, "work".to_string())
            .await
            .unwrap();
        let reply = state
            .list_switch(GUILD, "work".to_string())
            .await
            .unwrap();
        assert_eq!(reply, "🔄 Switched to list: **work**");

        state.add(GUILD, "standup".to_string()).await.unwrap();
        let db = snapshot(&state).await;
        assert_eq!(db[GUILD].current_list, "work");
        assert_eq!(db[GUILD].lists["work"].len(), 1);
        assert!(db[GUILD].lists[DEFAULT_LIST].is_empty());
    }

    #[tokio::test]
    async fn list_switch_to_missing_list_reports_not_found() {
        let (state, _dir) = setup();
        let reply = state
            .list_switch(GUILD, "nope".to_string())
            .await
            .unwrap();
        assert_eq!(reply, "❌ List does not exist.");
        assert_eq!(snapshot(&state).await[GUILD].current_list, DEFAULT_LIST);
    }

    #[tokio::test]
    async fn list_delete_refuses_default_list() {
        let (state, _dir) = setup();
        state.add(GUILD, "buy milk".to_string()).await.unwrap();
        let before = snapshot(&state).await;

        let reply = state
            .list_delete(GUILD, DEFAULT_LIST.to_string())
            .await
            .unwrap();
        assert_eq!(
            reply,
            "⚠️ The **default** list is protected and can't be deleted."
        );
        assert_eq!(before, snapshot(&state).await);
    }

    #[tokio::test]
    async fn list_delete_current_list_resets_to_default() {
        let (state, _dir) = setup();
        state
            .list_create(GUILD, "work".to_string())
            .await
            .unwrap();
        state
            .list_switch(GUILD, "work".to_string())
            .await
            .unwrap();

        let reply = state
            .list_delete(GUILD, "work".to_string())
            .await
            .unwrap();
        assert_eq!(
            reply,
            "🗑 Deleted list **work** and switched back to **default**."
        );

        let db = snapshot(&state).await;
        assert_eq!(db[GUILD].current_list, DEFAULT_LIST);
        assert!(!db[GUILD].lists.contains_key("work"));
    }

    #[tokio::test]
    async fn list_delete_other_list_keeps_current() {
        let (state, _dir) = setup();
        state
            .list_create(GUILD, "work".to_string())
            .await
            .unwrap();

        let reply = state
            .list_delete(GUILD, "work".to_string())
            .await
            .unwrap();
        assert_eq!(reply, "🗑 Deleted list **work**.");

        let db = snapshot(&state).await;
        assert_eq!(db[GUILD].current_list, DEFAULT_LIST);
    }

    #[tokio::test]
    async fn list_delete_missing_list_reports_not_found() {
        let (state, _dir) = setup();
        let reply = state
            .list_delete(GUILD, "nope".to_string())
            .await
            .unwrap();
        assert_eq!(reply, "❌ List does not exist.");
    }

    #[tokio::test]
    async fn guilds_are_isolated_namespaces() {
        let (state, _dir) = setup();
        state.add("1", "alpha".to_string()).await.unwrap();
        state.add("2", "beta".to_string()).await.unwrap();

        let db = snapshot(&state).await;
        assert_eq!(db["1"].lists[DEFAULT_LIST][0].text, "alpha");
        assert_eq!(db["2"].lists[DEFAULT_LIST][0].text, "beta");
    }
}
