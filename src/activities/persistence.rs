// activities/persistence.rs
// Durable storage for account activity states.
//
// One row per account; the state is stored as a JSON document.

use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection};

use super::state::AccountActivityState;
use crate::config::ActivityConfig;
use crate::errors::{ActivityError, ActivityResult};
use crate::logger::{self, LogTag};

pub trait ActivityPersistence: Send + Sync {
    fn read_all(&self) -> ActivityResult<Vec<AccountActivityState>>;
    fn upsert(&self, state: &AccountActivityState) -> ActivityResult<()>;
    fn delete(&self, account_id: &str) -> ActivityResult<()>;
    fn delete_all(&self) -> ActivityResult<()>;
}

// =============================================================================
// SQLITE
// =============================================================================

pub struct SqliteActivityPersistence {
    db: Mutex<Connection>,
    database_path: String,
}

impl SqliteActivityPersistence {
    /// Open (or create) the database file and its schema
    pub fn open<P: AsRef<Path>>(path: P) -> ActivityResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Connection::open(path).map_err(|e| {
            ActivityError::Persistence(format!("Failed to open database {}: {}", path.display(), e))
        })?;

        let persistence = Self {
            db: Mutex::new(db),
            database_path: path.display().to_string(),
        };
        persistence.create_tables()?;

        logger::info(
            LogTag::Database,
            &format!("Activity database ready at {}", persistence.database_path),
        );
        Ok(persistence)
    }

    /// Open the database named by `database_path`
    pub fn from_config(config: &ActivityConfig) -> ActivityResult<Self> {
        let path = config.database_path.trim();
        if path.is_empty() {
            return Err(ActivityError::InvalidArgument(
                "database_path must not be empty".to_string(),
            ));
        }
        Self::open(path)
    }

    pub fn open_in_memory() -> ActivityResult<Self> {
        let persistence = Self {
            db: Mutex::new(Connection::open_in_memory()?),
            database_path: ":memory:".to_string(),
        };
        persistence.create_tables()?;
        Ok(persistence)
    }

    pub fn database_path(&self) -> &str {
        &self.database_path
    }

    fn create_tables(&self) -> ActivityResult<()> {
        let db = self.db.lock();
        db.execute(
            "CREATE TABLE IF NOT EXISTS account_activities (
                account_id TEXT PRIMARY KEY,
                state TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(())
    }
}

impl ActivityPersistence for SqliteActivityPersistence {
    fn read_all(&self) -> ActivityResult<Vec<AccountActivityState>> {
        let db = self.db.lock();
        let mut stmt = db.prepare("SELECT account_id, state FROM account_activities")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut states = Vec::new();
        for row in rows {
            let (account_id, json) = row?;
            match serde_json::from_str::<AccountActivityState>(&json) {
                Ok(state) => states.push(state),
                Err(e) => {
                    // A row from an incompatible build is dropped, the next
                    // initial load rebuilds it.
                    logger::error(
                        LogTag::Database,
                        &format!("Skipping unreadable state for {}: {}", account_id, e),
                    );
                }
            }
        }
        Ok(states)
    }

    fn upsert(&self, state: &AccountActivityState) -> ActivityResult<()> {
        let json = serde_json::to_string(state)?;
        let db = self.db.lock();
        db.execute(
            "INSERT INTO account_activities (account_id, state, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(account_id) DO UPDATE SET state = excluded.state, updated_at = excluded.updated_at",
            params![state.account_id, json, Utc::now().timestamp()],
        )?;
        Ok(())
    }

    fn delete(&self, account_id: &str) -> ActivityResult<()> {
        let db = self.db.lock();
        db.execute(
            "DELETE FROM account_activities WHERE account_id = ?1",
            params![account_id],
        )?;
        Ok(())
    }

    fn delete_all(&self) -> ActivityResult<()> {
        let db = self.db.lock();
        let removed = db.execute("DELETE FROM account_activities", [])?;
        logger::debug(
            LogTag::Database,
            &format!("Deleted {} account activity rows", removed),
        );
        Ok(())
    }
}

// =============================================================================
// IN-MEMORY
// =============================================================================

/// Keeps states in a map. Useful for tests and for running without a disk.
#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    states: Mutex<HashMap<String, AccountActivityState>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_states(states: Vec<AccountActivityState>) -> Self {
        let map = states
            .into_iter()
            .map(|state| (state.account_id.clone(), state))
            .collect();
        Self {
            states: Mutex::new(map),
        }
    }

    pub fn get(&self, account_id: &str) -> Option<AccountActivityState> {
        self.states.lock().get(account_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.states.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.lock().is_empty()
    }
}

impl ActivityPersistence for InMemoryPersistence {
    fn read_all(&self) -> ActivityResult<Vec<AccountActivityState>> {
        Ok(self.states.lock().values().cloned().collect())
    }

    fn upsert(&self, state: &AccountActivityState) -> ActivityResult<()> {
        self.states
            .lock()
            .insert(state.account_id.clone(), state.clone());
        Ok(())
    }

    fn delete(&self, account_id: &str) -> ActivityResult<()> {
        self.states.lock().remove(account_id);
        Ok(())
    }

    fn delete_all(&self) -> ActivityResult<()> {
        self.states.lock().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activities::fixtures::*;
    use crate::activities::types::Chain;

    fn sample_state(account_id: &str) -> AccountActivityState {
        let mut state = AccountActivityState::new(account_id);
        state.add_new_activities(
            &[tx_record(confirmed_tx("c1:0", 100)), swap("s1:0", 200)],
            None,
        );
        state.add_new_activities(&[tx_record(pending_tx("p1:0", 300))], Some(Chain::Ton));
        state
    }

    #[test]
    fn test_sqlite_upsert_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = SqliteActivityPersistence::open(dir.path().join("db").join("activities.db")).unwrap();

        let mut state = sample_state("acc-1");
        persistence.upsert(&state).unwrap();
        state.is_main_history_end_reached = true;
        persistence.upsert(&state).unwrap();
        persistence.upsert(&sample_state("acc-2")).unwrap();

        let mut loaded = persistence.read_all().unwrap();
        loaded.sort_by(|a, b| a.account_id.cmp(&b.account_id));
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0], state);
    }

    #[test]
    fn test_sqlite_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activities.db");
        {
            let persistence = SqliteActivityPersistence::open(&path).unwrap();
            persistence.upsert(&sample_state("acc-1")).unwrap();
        }
        let reopened = SqliteActivityPersistence::open(&path).unwrap();
        assert_eq!(reopened.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_from_config_opens_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("wallet.db");
        let config = ActivityConfig {
            database_path: path.display().to_string(),
            ..ActivityConfig::default()
        };

        let persistence = SqliteActivityPersistence::from_config(&config).unwrap();
        persistence.upsert(&sample_state("acc-1")).unwrap();
        assert_eq!(persistence.database_path(), config.database_path);
        assert!(path.exists());
    }

    #[test]
    fn test_from_config_rejects_empty_path() {
        let config = ActivityConfig {
            database_path: "  ".to_string(),
            ..ActivityConfig::default()
        };
        let result = SqliteActivityPersistence::from_config(&config);
        assert!(matches!(result, Err(ActivityError::InvalidArgument(_))));
    }

    #[test]
    fn test_sqlite_delete() {
        let persistence = SqliteActivityPersistence::open_in_memory().unwrap();
        persistence.upsert(&sample_state("acc-1")).unwrap();
        persistence.upsert(&sample_state("acc-2")).unwrap();

        persistence.delete("acc-1").unwrap();
        let remaining = persistence.read_all().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].account_id, "acc-2");

        persistence.delete_all().unwrap();
        assert!(persistence.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_unreadable_rows_are_skipped() {
        let persistence = SqliteActivityPersistence::open_in_memory().unwrap();
        persistence.upsert(&sample_state("acc-1")).unwrap();
        persistence
            .db
            .lock()
            .execute(
                "INSERT INTO account_activities (account_id, state, updated_at) VALUES ('bad', '{', 0)",
                [],
            )
            .unwrap();

        let loaded = persistence.read_all().unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn test_in_memory_driver() {
        let persistence = InMemoryPersistence::new();
        persistence.upsert(&sample_state("acc-1")).unwrap();
        assert_eq!(persistence.len(), 1);
        assert!(persistence.get("acc-1").is_some());

        persistence.delete_all().unwrap();
        assert!(persistence.is_empty());
    }
}
