use crate::models::{Student, Upsert};
use rusqlite::{Connection, OptionalExtension, params};

pub fn list_students(conn: &Connection, class_id: i64) -> rusqlite::Result<Vec<Student>> {
    let mut stmt = conn.prepare(
        "SELECT id, reg_no, name FROM students WHERE class_id = ?1 ORDER BY name, reg_no",
    )?;
    stmt.query_map([class_id], |row| {
        Ok(Student {
            id: row.get(0)?,
            reg_no: row.get(1)?,
            name: row.get(2)?,
        })
    })?
    .collect()
}

/// Inserts a new student or moves an existing registration number to the
/// given name and class.
pub fn upsert_student(
    conn: &Connection,
    reg_no: &str,
    name: &str,
    class_id: i64,
) -> rusqlite::Result<Upsert> {
    let updated = conn.execute(
        "UPDATE students SET name = ?1, class_id = ?2 WHERE reg_no = ?3",
        params![name, class_id, reg_no],
    )?;
    if updated > 0 {
        return Ok(Upsert::Updated);
    }
    conn.execute(
        "INSERT INTO students (reg_no, name, class_id) VALUES (?1, ?2, ?3)",
        params![reg_no, name, class_id],
    )?;
    Ok(Upsert::Added)
}

/// Deletes the student, their attendance and the account linked to them.
/// Returns the registration number of the removed student.
pub fn delete_student(conn: &mut Connection, id: i64) -> rusqlite::Result<Option<String>> {
    let tx = conn.transaction()?;
    let found: Option<(String, Option<i64>)> = tx
        .query_row(
            "SELECT reg_no, user_id FROM students WHERE id = ?1",
            [id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    let Some((reg_no, user_id)) = found else {
        return Ok(None);
    };

    tx.execute("DELETE FROM attendance WHERE reg_no = ?1", [&reg_no])?;
    tx.execute("DELETE FROM students WHERE id = ?1", [id])?;
    if let Some(user_id) = user_id {
        tx.execute("DELETE FROM users WHERE id = ?1", [user_id])?;
    }
    tx.commit()?;
    Ok(Some(reg_no))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;
    use crate::models::Role;
    use crate::storage::{
        Registration, StudentLink, find_class, find_user_by_name, register, test_connection,
    };

    #[test]
    fn upsert_moves_existing_students() {
        let conn = test_connection();
        let class_1a = find_class(&conn, "1", "A").unwrap().unwrap();
        let class_1b = find_class(&conn, "1", "B").unwrap().unwrap();

        assert_eq!(upsert_student(&conn, "NEW-1", "Nia", class_1b).unwrap(), Upsert::Added);
        assert_eq!(
            upsert_student(&conn, "REG-1-1", "Renamed", class_1b).unwrap(),
            Upsert::Updated
        );

        let names: Vec<String> = list_students(&conn, class_1b)
            .unwrap()
            .into_iter()
            .map(|student| student.name)
            .collect();
        assert_eq!(names, vec!["Nia", "Renamed"]);
        assert_eq!(list_students(&conn, class_1a).unwrap().len(), 1);
    }

    #[test]
    fn deleting_a_student_removes_linked_account() {
        let mut conn = test_connection();
        let registration = Registration {
            username: "pupil".into(),
            password_hash: hash_password("pw"),
            role: Role::Student,
            student: Some(StudentLink {
                reg_no: "P-1".into(),
                class_num: "4".into(),
                section: "A".into(),
            }),
        };
        register(&mut conn, &registration).unwrap();
        let class_id = find_class(&conn, "4", "A").unwrap().unwrap();
        let student = list_students(&conn, class_id)
            .unwrap()
            .into_iter()
            .find(|student| student.reg_no == "P-1")
            .unwrap();

        assert_eq!(delete_student(&mut conn, student.id).unwrap(), Some("P-1".to_string()));
        assert!(find_user_by_name(&conn, "pupil").unwrap().is_none());
        assert_eq!(delete_student(&mut conn, student.id).unwrap(), None);
    }
}
