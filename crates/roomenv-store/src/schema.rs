//! Database schema.

use rusqlite::Connection;

use crate::error::Result;

/// Create the sample table and its index if they do not exist yet.
///
/// Safe to run on every open; existing rows are left untouched.
pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Raw samples, append only
        CREATE TABLE IF NOT EXISTS environment (
            uid         INTEGER PRIMARY KEY AUTOINCREMENT,
            at          INTEGER NOT NULL,
            room        TEXT NOT NULL,
            temperature REAL NOT NULL,
            humidity    REAL NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_environment_room_at
            ON environment(room, at);
        "#,
    )?;

    Ok(())
}
