use crate::models::ClassRecord;
use rusqlite::{Connection, OptionalExtension, Row, params};

/// Classes are stored as `Class {num}`.
pub fn class_label(num: &str) -> String {
    format!("Class {}", num.trim())
}

fn class_from_row(row: &Row<'_>) -> rusqlite::Result<ClassRecord> {
    Ok(ClassRecord {
        id: row.get(0)?,
        class_name: row.get(1)?,
        section: row.get(2)?,
    })
}

pub fn find_class(conn: &Connection, num: &str, section: &str) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        "SELECT id FROM classes WHERE class_name = ?1 AND section = ?2",
        params![class_label(num), section.trim()],
        |row| row.get(0),
    )
    .optional()
}

pub fn find_or_create_class(conn: &Connection, num: &str, section: &str) -> rusqlite::Result<i64> {
    if let Some(id) = find_class(conn, num, section)? {
        return Ok(id);
    }
    conn.execute(
        "INSERT INTO classes (class_name, section) VALUES (?1, ?2)",
        params![class_label(num), section.trim()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_class(conn: &Connection, id: i64) -> rusqlite::Result<Option<ClassRecord>> {
    conn.query_row(
        "SELECT id, class_name, section FROM classes WHERE id = ?1",
        [id],
        class_from_row,
    )
    .optional()
}

/// Ordered so that `Class 2` sorts before `Class 10`.
pub fn list_classes(conn: &Connection) -> rusqlite::Result<Vec<ClassRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, class_name, section FROM classes
         ORDER BY length(class_name), class_name, section",
    )?;
    stmt.query_map([], class_from_row)?.collect()
}

/// Removes the class with its students, subjects and every attendance row
/// that references the class or one of its students.
pub fn delete_class(conn: &mut Connection, id: i64) -> rusqlite::Result<bool> {
    let tx = conn.transaction()?;
    tx.execute(
        "DELETE FROM attendance
         WHERE class_id = ?1
            OR reg_no IN (SELECT reg_no FROM students WHERE class_id = ?1)",
        [id],
    )?;
    tx.execute("DELETE FROM students WHERE class_id = ?1", [id])?;
    tx.execute("DELETE FROM subjects WHERE class_id = ?1", [id])?;
    let removed = tx.execute("DELETE FROM classes WHERE id = ?1", [id])?;
    tx.commit()?;
    Ok(removed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{list_students, list_subjects, add_subjects, test_connection};

    #[test]
    fn find_or_create_reuses_existing_rows() {
        let conn = test_connection();
        let existing = find_class(&conn, "3", "B").unwrap().unwrap();
        assert_eq!(find_or_create_class(&conn, "3", "B").unwrap(), existing);

        let created = find_or_create_class(&conn, "3", "C").unwrap();
        assert_ne!(created, existing);
        assert_eq!(find_class(&conn, "3", "C").unwrap(), Some(created));
    }

    #[test]
    fn classes_list_in_numeric_order() {
        let conn = test_connection();
        let names: Vec<String> = list_classes(&conn)
            .unwrap()
            .into_iter()
            .map(|class| class.label())
            .collect();
        assert_eq!(names.len(), 24);
        assert_eq!(names[0], "Class 1 - A");
        assert_eq!(names[1], "Class 1 - B");
        assert_eq!(names[23], "Class 12 - B");
    }

    #[test]
    fn deleting_a_class_cascades() {
        let mut conn = test_connection();
        let class_id = find_class(&conn, "1", "A").unwrap().unwrap();
        add_subjects(&conn, class_id, &["Math".to_string()]).unwrap();
        conn.execute(
            "INSERT INTO attendance (class_id, subject_id, att_date, reg_no, present)
             VALUES (?1, NULL, '2026-01-05', 'REG-1-1', 1)",
            [class_id],
        )
        .unwrap();

        assert!(delete_class(&mut conn, class_id).unwrap());
        assert!(get_class(&conn, class_id).unwrap().is_none());
        assert!(list_students(&conn, class_id).unwrap().is_empty());
        assert!(list_subjects(&conn, class_id).unwrap().is_empty());
        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM attendance", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
        assert!(!delete_class(&mut conn, class_id).unwrap());
    }
}
