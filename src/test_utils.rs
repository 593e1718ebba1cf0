use tempfile::TempDir;

use crate::db::{migrations, Database};

/// Fresh migrated database in a temp dir. Keep the `TempDir` alive for the
/// duration of the test or the file disappears under the connection.
pub fn setup_test_db() -> (Database, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let db = Database::open(&dir.path().join("test.db")).expect("failed to open test database");
    migrations::run(db.connection()).expect("failed to run migrations");
    (db, dir)
}
