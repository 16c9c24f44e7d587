//! SQL DDL for the task database.
//! WAL mode enabled at connection time.

/// Bumped whenever [`CREATE_TABLES`] changes shape.
pub const SCHEMA_VERSION: u32 = 1;

/// `AUTOINCREMENT` keeps deleted ids from being handed out again.
/// `title_key` holds the lowercased title and carries the uniqueness
/// constraint; `NOCASE` would only fold ASCII.
pub const CREATE_TABLES: &str = r"
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    title_key TEXT NOT NULL UNIQUE,
    completed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);
";

/// Connection pragmas.
pub const PRAGMAS: &str = r"
PRAGMA journal_mode = WAL;
PRAGMA busy_timeout = 5000;
PRAGMA synchronous = FULL;
";
