use super::schema::SCHEMA;
use rusqlite::{Connection, Result};

/// Apply the schema. Safe to run on every open; all statements are
/// IF NOT EXISTS.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
