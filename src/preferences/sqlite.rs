use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;

use super::{PreferenceResult, PreferenceStore};

pub struct SqlitePreferenceStore {
    connection: Mutex<Connection>,
}

impl SqlitePreferenceStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PreferenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PreferenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PreferenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value_json TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }
}

impl PreferenceStore for SqlitePreferenceStore {
    fn get(&self, key: &str) -> PreferenceResult<Option<Value>> {
        let conn = self.connection.lock();
        let json: Option<String> = conn
            .query_row(
                "SELECT value_json FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: Value) -> PreferenceResult<()> {
        let json = serde_json::to_string(&value)?;
        let conn = self.connection.lock();
        conn.execute(
            "INSERT INTO preferences (key, value_json) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
            params![key, json],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> PreferenceResult<()> {
        let conn = self.connection.lock();
        conn.execute("DELETE FROM preferences WHERE key = ?1", params![key])?;
        Ok(())
    }
}
