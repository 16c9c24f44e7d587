//! Translating `rusqlite` failures into [`StoreError`].

use rusqlite::ErrorCode;
use tasker_core::StoreError;

/// Constraint text `SQLite` reports for a clash on the unique title key.
const TITLE_CONSTRAINT: &str = "tasks.title_key";

/// Map a database error, recognising title-uniqueness violations.
///
/// `title` is the value that was being written, used for the conflict message.
pub(crate) fn classify(e: rusqlite::Error, title: &str) -> StoreError {
    if is_title_conflict(&e) {
        StoreError::Conflict(title.to_string())
    } else {
        database(e)
    }
}

/// Map any other database error.
pub(crate) fn database(e: rusqlite::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn is_title_conflict(e: &rusqlite::Error) -> bool {
    match e {
        rusqlite::Error::SqliteFailure(err, Some(msg)) => {
            err.code == ErrorCode::ConstraintViolation && msg.contains(TITLE_CONSTRAINT)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rusqlite::Connection;

    fn conn_with_unique_title() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(crate::schema::CREATE_TABLES).unwrap();
        conn.execute(
            "INSERT INTO tasks (title, title_key, completed, created_at, updated_at) VALUES ('a', 'a', 0, 'x', 'x')",
            [],
        )
        .unwrap();
        conn
    }

    #[test]
    fn unique_title_violation_is_conflict() {
        let conn = conn_with_unique_title();
        let err = conn
            .execute(
                "INSERT INTO tasks (title, title_key, completed, created_at, updated_at) VALUES ('A', 'a', 0, 'x', 'x')",
                [],
            )
            .unwrap_err();
        assert_matches!(classify(err, "A"), StoreError::Conflict(t) if t == "A");
    }

    #[test]
    fn other_constraint_is_database_error() {
        let conn = conn_with_unique_title();
        let err = conn
            .execute(
                "INSERT INTO tasks (title, title_key, completed, created_at, updated_at) VALUES (NULL, 'n', 0, 'x', 'x')",
                [],
            )
            .unwrap_err();
        assert_matches!(classify(err, ""), StoreError::Database(msg) if msg.contains("NOT NULL"));
    }

    #[test]
    fn syntax_error_is_database_error() {
        let conn = Connection::open_in_memory().unwrap();
        let err = conn.execute("SELEC 1", []).unwrap_err();
        assert_matches!(classify(err, "t"), StoreError::Database(_));
    }
}
