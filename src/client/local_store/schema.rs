//! Pending-records schema
//!
//! The local store holds one table, `pending_records`, with the records the
//! server has not acknowledged yet. Applied versions are tracked in
//! `schema_migrations`; each migration runs in its own transaction.

/// Schema version this build writes
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Bookkeeping table for applied migrations
pub const CREATE_MIGRATIONS_TABLE: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
)";

/// `timestamp` holds fixed-width RFC 3339 text so lexical order is time order.
const CREATE_PENDING_RECORDS: &str = "CREATE TABLE IF NOT EXISTS pending_records (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    value INTEGER NOT NULL,
    timestamp TEXT NOT NULL,
    pending INTEGER NOT NULL DEFAULT 1
)";

const CREATE_PENDING_RECORDS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_pending_records_timestamp ON pending_records (timestamp)";

/// One schema step
#[derive(Debug)]
pub struct Migration {
    pub version: i32,
    pub description: &'static str,
    pub statements: &'static [&'static str],
}

/// Every migration, in version order
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "pending record table",
    statements: &[CREATE_PENDING_RECORDS, CREATE_PENDING_RECORDS_INDEX],
}];

/// Whether a database at `version` is behind this build
pub fn needs_migration(version: i32) -> bool {
    version < CURRENT_SCHEMA_VERSION
}

/// Migrations still to apply to a database at `version`
pub fn pending_migrations(version: i32) -> impl Iterator<Item = &'static Migration> {
    MIGRATIONS.iter().filter(move |m| m.version > version)
}
