//! SQLite persistence.
//!
//! Every function takes a `&Connection` (or `&mut Connection` when it needs a
//! transaction); callers hold the shared connection lock for the duration.

mod attendance;
mod classes;
mod students;
mod subjects;
mod users;

pub use attendance::{
    delete_attendance_day, history_dates, history_rows, load_marks, replace_attendance,
    set_attendance_status,
};
pub use classes::{
    class_label, delete_class, find_class, find_or_create_class, get_class, list_classes,
};
pub use students::{delete_student, list_students, upsert_student};
pub use subjects::{add_subjects, delete_subject, list_subjects};
pub use users::{Registration, RegisterError, StudentLink, find_user_by_credentials, register};
#[cfg(test)]
pub(crate) use users::find_user_by_name;

use crate::auth::hash_password;
use crate::models::Role;
use rusqlite::{Connection, ErrorCode, params};
use std::path::Path;
use tracing::info;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT UNIQUE NOT NULL,
    password TEXT NOT NULL,
    role TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS classes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    class_name TEXT NOT NULL,
    section TEXT NOT NULL,
    UNIQUE(class_name, section)
);
CREATE TABLE IF NOT EXISTS students (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    reg_no TEXT UNIQUE NOT NULL,
    name TEXT NOT NULL,
    class_id INTEGER,
    user_id INTEGER UNIQUE,
    FOREIGN KEY (class_id) REFERENCES classes (id),
    FOREIGN KEY (user_id) REFERENCES users (id)
);
CREATE TABLE IF NOT EXISTS subjects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    class_id INTEGER NOT NULL,
    subject_name TEXT NOT NULL,
    UNIQUE(class_id, subject_name),
    FOREIGN KEY (class_id) REFERENCES classes (id)
);
CREATE TABLE IF NOT EXISTS attendance (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    class_id INTEGER NOT NULL,
    subject_id INTEGER,
    att_date DATE NOT NULL,
    reg_no TEXT NOT NULL,
    present BOOLEAN NOT NULL,
    UNIQUE(class_id, subject_id, att_date, reg_no),
    FOREIGN KEY (class_id) REFERENCES classes (id),
    FOREIGN KEY (subject_id) REFERENCES subjects (id)
);
";

pub fn open(path: &Path) -> rusqlite::Result<Connection> {
    let conn = if path.as_os_str() == ":memory:" {
        Connection::open_in_memory()?
    } else {
        Connection::open(path)?
    };
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)?;
    info!("database schema ready");
    Ok(())
}

/// Fills empty tables with the demo accounts, classes 1-12 (sections A and B)
/// and two students in every section A class.
pub fn seed_sample_data(conn: &mut Connection) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;

    if count(&tx, "users")? == 0 {
        info!("inserting sample users");
        for (username, password, role) in [
            ("teacher1", "pass123", Role::Teacher),
            ("admin1", "admin123", Role::Admin),
        ] {
            tx.execute(
                "INSERT INTO users (username, password, role) VALUES (?1, ?2, ?3)",
                params![username, hash_password(password), role.as_str()],
            )?;
        }
    }

    if count(&tx, "classes")? == 0 {
        info!("inserting sample classes");
        for num in 1..=12 {
            for section in ["A", "B"] {
                tx.execute(
                    "INSERT INTO classes (class_name, section) VALUES (?1, ?2)",
                    params![class_label(&num.to_string()), section],
                )?;
            }
        }
    }

    if count(&tx, "students")? == 0 {
        info!("inserting sample students");
        let classes: Vec<(i64, String)> = {
            let mut stmt = tx.prepare("SELECT id, class_name FROM classes WHERE section = 'A'")?;
            stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<rusqlite::Result<_>>()?
        };
        for (class_id, class_name) in classes {
            for (idx, label) in [(1, "A"), (2, "B")] {
                tx.execute(
                    "INSERT INTO students (reg_no, name, class_id) VALUES (?1, ?2, ?3)",
                    params![
                        format!("REG-{class_id}-{idx}"),
                        format!("Student {label} ({class_name})"),
                        class_id
                    ],
                )?;
            }
        }
    }

    tx.commit()
}

fn count(conn: &Connection, table: &str) -> rusqlite::Result<i64> {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
}

/// The message of a UNIQUE/FOREIGN KEY violation, e.g.
/// `UNIQUE constraint failed: users.username`.
pub(crate) fn constraint_violation(err: &rusqlite::Error) -> Option<&str> {
    match err {
        rusqlite::Error::SqliteFailure(failure, message)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            Some(message.as_deref().unwrap_or("constraint failed"))
        }
        _ => None,
    }
}

#[cfg(test)]
pub(crate) fn test_connection() -> Connection {
    let mut conn = open(Path::new(":memory:")).unwrap();
    init_schema(&conn).unwrap();
    seed_sample_data(&mut conn).unwrap();
    conn
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeding_is_idempotent() {
        let mut conn = test_connection();
        seed_sample_data(&mut conn).unwrap();

        assert_eq!(count(&conn, "users").unwrap(), 2);
        assert_eq!(count(&conn, "classes").unwrap(), 24);
        assert_eq!(count(&conn, "students").unwrap(), 24);
    }

    #[test]
    fn schema_init_can_run_twice() {
        let conn = test_connection();
        init_schema(&conn).unwrap();
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let conn = test_connection();
        let err = conn
            .execute(
                "INSERT INTO subjects (class_id, subject_name) VALUES (9999, 'Ghost')",
                [],
            )
            .unwrap_err();
        assert!(constraint_violation(&err).is_some());
    }
}
