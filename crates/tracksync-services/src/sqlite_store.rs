// crates/tracksync-services/src/sqlite_store.rs

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::task::{issue_id_from_title, LocalTask, NewTask, TaskStatus};
use crate::task_store::{validate_title, TaskStore, TaskStoreResult};

const SCHEMA_VERSION: i32 = 2;

const TASK_COLUMNS: &str =
    "id, project_id, source_issue_id, title, description, status, created_at, updated_at";

/// Local SQLite storage for tasks
pub struct SqliteTaskStore {
    conn: Connection,
}

impl SqliteTaskStore {
    /// Open or create the database, creating its parent directory if needed
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }

        let conn = Connection::open(path).context("Failed to open tasks database")?;
        let store = Self { conn };
        store.init_schema()?;

        tracing::debug!("Opened task database at {}", path.display());
        Ok(store)
    }

    /// Create an in-memory store (for tests and dry experiments)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize database schema and run migrations if needed
    fn init_schema(&self) -> Result<()> {
        self.conn
            .execute("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)", [])?;

        let version = self.schema_version()?;
        if version < SCHEMA_VERSION {
            self.migrate_to_v2()?;
        }

        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                source_issue_id TEXT,
                title TEXT NOT NULL,
                description TEXT,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id);
            CREATE INDEX IF NOT EXISTS idx_tasks_source ON tasks(project_id, source_issue_id);",
            )
            .context("Failed to initialize schema")?;

        if version < SCHEMA_VERSION {
            self.set_schema_version(SCHEMA_VERSION)?;
        }

        Ok(())
    }

    /// Current schema version (0 for a fresh database)
    pub fn schema_version(&self) -> Result<i32> {
        let version: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
            .optional()?
            .unwrap_or(0);
        Ok(version)
    }

    fn set_schema_version(&self, version: i32) -> Result<()> {
        self.conn.execute("DELETE FROM schema_version", [])?;
        self.conn
            .execute("INSERT INTO schema_version (version) VALUES (?1)", params![version])?;
        Ok(())
    }

    /// Migrate from v1 (title-prefix sync markers, `body` column) to v2
    /// (explicit `source_issue_id`)
    fn migrate_to_v2(&self) -> Result<()> {
        let has_tasks: bool = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='tasks'",
            [],
            |row| row.get::<_, i32>(0),
        )? > 0;

        if !has_tasks {
            return Ok(());
        }

        let columns: Vec<String> = self
            .conn
            .prepare("PRAGMA table_info(tasks)")?
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;

        if columns.iter().any(|c| c == "source_issue_id") {
            return Ok(());
        }

        tracing::info!("Migrating task database to schema v{}", SCHEMA_VERSION);

        let tx = self.conn.unchecked_transaction()?;

        if columns.iter().any(|c| c == "body") && !columns.iter().any(|c| c == "description") {
            tx.execute("ALTER TABLE tasks RENAME COLUMN body TO description", [])?;
        } else if !columns.iter().any(|c| c == "description") {
            tx.execute("ALTER TABLE tasks ADD COLUMN description TEXT", [])?;
        }
        tx.execute("ALTER TABLE tasks ADD COLUMN source_issue_id TEXT", [])?;

        // Tasks synced before v2 carry the issue id only as a `[ID] ` title prefix.
        let legacy: Vec<(String, String)> = tx
            .prepare("SELECT id, title FROM tasks")?
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut backfilled = 0usize;
        for (id, title) in &legacy {
            if let Some(issue_id) = issue_id_from_title(title) {
                tx.execute(
                    "UPDATE tasks SET source_issue_id = ?1 WHERE id = ?2",
                    params![issue_id, id],
                )?;
                backfilled += 1;
            }
        }

        tx.commit().context("Failed to migrate tasks table")?;

        tracing::info!("Back-filled source issue ids for {} of {} tasks", backfilled, legacy.len());
        Ok(())
    }

    /// Convert a database row to a LocalTask.
    fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<LocalTask> {
        let status_str: String = row.get(5)?;
        let created_at_str: String = row.get(6)?;
        let updated_at_str: String = row.get(7)?;

        Ok(LocalTask {
            id: row.get(0)?,
            project_id: row.get(1)?,
            source_issue_id: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            status: TaskStatus::from_stored(&status_str),
            created_at: parse_timestamp(&created_at_str),
            updated_at: parse_timestamp(&updated_at_str),
        })
    }
}

/// Parse a stored RFC 3339 timestamp, falling back to now for corrupt values.
fn parse_timestamp(value: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(e) => {
            tracing::warn!("Unparseable task timestamp {:?} ({}); using current time", value, e);
            Utc::now()
        }
    }
}

impl TaskStore for SqliteTaskStore {
    fn list_for_project(&self, project_id: &str) -> TaskStoreResult<Vec<LocalTask>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = ?1 ORDER BY created_at, rowid"
        ))?;

        let tasks = stmt
            .query_map([project_id], Self::row_to_task)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tasks)
    }

    fn create(&self, task: &NewTask) -> TaskStoreResult<LocalTask> {
        validate_title(&task.title)?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let now_str = now.to_rfc3339_opts(SecondsFormat::Micros, true);

        self.conn.execute(
            "INSERT INTO tasks (id, project_id, source_issue_id, title, description, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                task.project_id,
                task.source_issue_id,
                task.title,
                task.description,
                task.status.as_str(),
                now_str,
                now_str,
            ],
        )?;

        tracing::debug!("Created task {} ({:?})", id, task.source_issue_id);

        Ok(LocalTask {
            id,
            project_id: task.project_id.clone(),
            source_issue_id: task.source_issue_id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            created_at: now,
            updated_at: now,
        })
    }

    fn count_for_project(&self, project_id: &str) -> TaskStoreResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE project_id = ?1",
            [project_id],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::task_store::TaskStoreError;
    use tempfile::tempdir;

    fn synced(project_id: &str, issue_id: &str, title: &str) -> NewTask {
        NewTask {
            source_issue_id: Some(issue_id.to_string()),
            ..NewTask::new(project_id, title)
        }
    }

    #[test]
    fn test_create_and_list_tasks() {
        let store = SqliteTaskStore::in_memory().unwrap();

        let created = store.create(&synced("proj-1", "PRJ-1", "Fix login")).unwrap();
        store.create(&NewTask::new("proj-1", "Write notes")).unwrap();

        let tasks = store.list_for_project("proj-1").unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, created.id);
        assert_eq!(tasks[0].source_issue_id.as_deref(), Some("PRJ-1"));
        assert_eq!(tasks[0].status, TaskStatus::Todo);
        assert_eq!(tasks[1].source_issue_id, None);
    }

    #[test]
    fn test_tasks_scoped_to_project() {
        let store = SqliteTaskStore::in_memory().unwrap();
        store.create(&synced("proj-1", "PRJ-1", "A")).unwrap();
        store.create(&synced("proj-2", "PRJ-1", "A")).unwrap();
        store.create(&synced("proj-2", "PRJ-2", "B")).unwrap();

        assert_eq!(store.count_for_project("proj-1").unwrap(), 1);
        assert_eq!(store.count_for_project("proj-2").unwrap(), 2);
        assert_eq!(store.count_for_project("proj-3").unwrap(), 0);
    }

    #[test]
    fn test_parse_timestamp() {
        let parsed = parse_timestamp("2026-01-21T08:30:00.000001Z");
        assert_eq!(parsed.to_rfc3339_opts(SecondsFormat::Micros, true), "2026-01-21T08:30:00.000001Z");

        let before = Utc::now();
        assert!(parse_timestamp("not a date") >= before);
    }

    #[test]
    fn test_create_blank_title_rejected() {
        let store = SqliteTaskStore::in_memory().unwrap();
        let result = store.create(&NewTask::new("proj-1", "   "));
        assert!(matches!(result, Err(TaskStoreError::Validation(_))));
        assert_eq!(store.count_for_project("proj-1").unwrap(), 0);
    }

    #[test]
    fn test_fresh_database_is_current_version() {
        let dir = tempdir().unwrap();
        let store = SqliteTaskStore::open(&dir.path().join("nested").join("tasks.db")).unwrap();
        assert_eq!(store.schema_version().unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_reopen_keeps_tasks() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("tasks.db");
        {
            let store = SqliteTaskStore::open(&db_path).unwrap();
            store.create(&synced("proj-1", "PRJ-1", "Persisted")).unwrap();
        }
        let store = SqliteTaskStore::open(&db_path).unwrap();
        let tasks = store.list_for_project("proj-1").unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Persisted");
    }

    #[test]
    fn test_migrate_v1_backfills_source_issue_id() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("legacy.db");
        {
            let conn = Connection::open(&db_path).unwrap();
            conn.execute_batch(
                "CREATE TABLE tasks (
                    id TEXT PRIMARY KEY,
                    project_id TEXT NOT NULL,
                    title TEXT NOT NULL,
                    body TEXT,
                    status TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                INSERT INTO tasks VALUES ('t1', 'proj-1', '[PRJ-7] Synced earlier', 'YouTrack: x', '\"todo\"', '2026-01-21T00:00:00Z', '2026-01-21T00:00:00Z');
                INSERT INTO tasks VALUES ('t2', 'proj-1', 'Hand written', NULL, '\"inprogress\"', '2026-01-22T00:00:00Z', '2026-01-22T00:00:00Z');
                INSERT INTO tasks VALUES ('t3', 'proj-1', '[WIP] refactor', NULL, 'todo', '2026-01-23T00:00:00Z', '2026-01-23T00:00:00Z');",
            )
            .unwrap();
        }

        let store = SqliteTaskStore::open(&db_path).unwrap();
        assert_eq!(store.schema_version().unwrap(), SCHEMA_VERSION);

        let tasks = store.list_for_project("proj-1").unwrap();
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].source_issue_id.as_deref(), Some("PRJ-7"));
        assert_eq!(tasks[0].description.as_deref(), Some("YouTrack: x"));
        assert_eq!(tasks[1].source_issue_id, None);
        assert_eq!(tasks[1].status, TaskStatus::InProgress);
        assert_eq!(tasks[2].source_issue_id, None);
    }
}
