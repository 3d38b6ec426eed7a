use super::{constraint_violation, find_or_create_class};
use crate::models::{Role, User};
use rusqlite::{Connection, OptionalExtension, Row, params};

/// Class placement for a student account created at registration.
#[derive(Debug, Clone)]
pub struct StudentLink {
    pub reg_no: String,
    pub class_num: String,
    pub section: String,
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub student: Option<StudentLink>,
}

#[derive(Debug)]
pub enum RegisterError {
    DuplicateUsername,
    DuplicateRegNo,
    Db(rusqlite::Error),
}

impl From<rusqlite::Error> for RegisterError {
    fn from(err: rusqlite::Error) -> Self {
        match constraint_violation(&err) {
            Some(message) if message.contains("users.username") => Self::DuplicateUsername,
            Some(message) if message.contains("students.reg_no") => Self::DuplicateRegNo,
            _ => Self::Db(err),
        }
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(2)?;
    let role = role.parse::<Role>().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            err.into(),
        )
    })?;
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        role,
    })
}

pub fn find_user_by_credentials(
    conn: &Connection,
    username: &str,
    password_hash: &str,
    role: Role,
) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT id, username, role FROM users
         WHERE username = ?1 AND password = ?2 AND role = ?3",
        params![username, password_hash, role.as_str()],
        user_from_row,
    )
    .optional()
}

#[cfg(test)]
pub(crate) fn find_user_by_name(conn: &Connection, username: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT id, username, role FROM users WHERE username = ?1",
        [username],
        user_from_row,
    )
    .optional()
}

/// Creates the account and, for students, the linked student record. Both
/// rows are written in one transaction.
pub fn register(conn: &mut Connection, registration: &Registration) -> Result<User, RegisterError> {
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO users (username, password, role) VALUES (?1, ?2, ?3)",
        params![
            registration.username,
            registration.password_hash,
            registration.role.as_str()
        ],
    )?;
    let user = User {
        id: tx.last_insert_rowid(),
        username: registration.username.clone(),
        role: registration.role,
    };

    if let Some(link) = &registration.student {
        let class_id = find_or_create_class(&tx, &link.class_num, &link.section)?;
        tx.execute(
            "INSERT INTO students (reg_no, name, class_id, user_id) VALUES (?1, ?2, ?3, ?4)",
            params![link.reg_no, registration.username, class_id, user.id],
        )?;
    }

    tx.commit()?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;
    use crate::storage::{find_class, list_students, test_connection};

    fn registration(username: &str, student: Option<StudentLink>) -> Registration {
        Registration {
            username: username.to_string(),
            password_hash: hash_password("secret"),
            role: if student.is_some() { Role::Student } else { Role::Teacher },
            student,
        }
    }

    #[test]
    fn seeded_users_log_in_with_their_role_only() {
        let conn = test_connection();
        let hash = hash_password("admin123");
        let admin = find_user_by_credentials(&conn, "admin1", &hash, Role::Admin).unwrap();
        assert_eq!(admin.map(|user| user.role), Some(Role::Admin));
        assert!(find_user_by_credentials(&conn, "admin1", &hash, Role::Teacher)
            .unwrap()
            .is_none());
    }

    #[test]
    fn student_registration_creates_class_and_record() {
        let mut conn = test_connection();
        let link = StudentLink {
            reg_no: "S-100".into(),
            class_num: "13".into(),
            section: "C".into(),
        };
        let user = register(&mut conn, &registration("newkid", Some(link))).unwrap();
        assert_eq!(user.role, Role::Student);

        let class_id = find_class(&conn, "13", "C").unwrap().unwrap();
        let students = list_students(&conn, class_id).unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].reg_no, "S-100");
        assert_eq!(students[0].name, "newkid");
    }

    #[test]
    fn duplicate_username_is_reported() {
        let mut conn = test_connection();
        let err = register(&mut conn, &registration("teacher1", None)).unwrap_err();
        assert!(matches!(err, RegisterError::DuplicateUsername));
    }

    #[test]
    fn duplicate_reg_no_rolls_back_the_user() {
        let mut conn = test_connection();
        let link = StudentLink {
            reg_no: "REG-1-1".into(),
            class_num: "1".into(),
            section: "A".into(),
        };
        let err = register(&mut conn, &registration("copycat", Some(link))).unwrap_err();
        assert!(matches!(err, RegisterError::DuplicateRegNo));
        assert!(find_user_by_name(&conn, "copycat").unwrap().is_none());
    }
}
