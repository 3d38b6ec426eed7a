use crate::models::Subject;
use rusqlite::{Connection, params};

pub fn list_subjects(conn: &Connection, class_id: i64) -> rusqlite::Result<Vec<Subject>> {
    let mut stmt = conn.prepare(
        "SELECT id, subject_name FROM subjects WHERE class_id = ?1 ORDER BY subject_name",
    )?;
    stmt.query_map([class_id], |row| {
        Ok(Subject {
            id: row.get(0)?,
            subject_name: row.get(1)?,
        })
    })?
    .collect()
}

/// Returns `(added, duplicates)`. Names already present for the class are
/// counted as duplicates and left untouched.
pub fn add_subjects(
    conn: &Connection,
    class_id: i64,
    names: &[String],
) -> rusqlite::Result<(usize, usize)> {
    let mut stmt = conn
        .prepare("INSERT OR IGNORE INTO subjects (class_id, subject_name) VALUES (?1, ?2)")?;
    let mut added = 0;
    let mut duplicates = 0;
    for name in names {
        if stmt.execute(params![class_id, name])? > 0 {
            added += 1;
        } else {
            duplicates += 1;
        }
    }
    Ok((added, duplicates))
}

/// Removes the subject and the attendance recorded against it.
pub fn delete_subject(conn: &mut Connection, id: i64) -> rusqlite::Result<bool> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM attendance WHERE subject_id = ?1", [id])?;
    let removed = tx.execute("DELETE FROM subjects WHERE id = ?1", [id])?;
    tx.commit()?;
    Ok(removed > 0)
}
