//! Attendance rows are keyed by class, optional subject, date and
//! registration number. Subject-less attendance is stored with a NULL
//! `subject_id`; the queries compare with `IS` so one statement covers both.

use crate::models::HistoryStudent;
use crate::roster::AttendanceMark;
use rusqlite::{Connection, params};
use std::collections::HashMap;

/// Recorded presence for one class/subject/date, keyed by registration number.
pub fn load_marks(
    conn: &Connection,
    class_id: i64,
    subject_id: Option<i64>,
    date: &str,
) -> rusqlite::Result<HashMap<String, bool>> {
    let mut stmt = conn.prepare(
        "SELECT reg_no, present FROM attendance
         WHERE class_id = ?1 AND subject_id IS ?2 AND att_date = ?3",
    )?;
    stmt.query_map(params![class_id, subject_id, date], |row| {
        Ok((row.get(0)?, row.get(1)?))
    })?
    .collect()
}

/// Deletes whatever was recorded for the class/subject/date and inserts
/// `marks` in its place, atomically. Returns the number of rows written.
pub fn replace_attendance(
    conn: &mut Connection,
    class_id: i64,
    subject_id: Option<i64>,
    date: &str,
    marks: &[AttendanceMark],
) -> rusqlite::Result<usize> {
    let tx = conn.transaction()?;
    tx.execute(
        "DELETE FROM attendance WHERE class_id = ?1 AND subject_id IS ?2 AND att_date = ?3",
        params![class_id, subject_id, date],
    )?;
    {
        let mut insert = tx.prepare(
            "INSERT INTO attendance (class_id, subject_id, att_date, reg_no, present)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for mark in marks {
            insert.execute(params![class_id, subject_id, date, mark.reg_no, mark.present])?;
        }
    }
    tx.commit()?;
    Ok(marks.len())
}

pub fn delete_attendance_day(
    conn: &Connection,
    class_id: i64,
    subject_id: Option<i64>,
    date: &str,
) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM attendance WHERE class_id = ?1 AND subject_id IS ?2 AND att_date = ?3",
        params![class_id, subject_id, date],
    )
}

pub fn set_attendance_status(conn: &Connection, id: i64, present: bool) -> rusqlite::Result<bool> {
    let updated = conn.execute(
        "UPDATE attendance SET present = ?1 WHERE id = ?2",
        params![present, id],
    )?;
    Ok(updated > 0)
}

/// Dates with recorded attendance, newest first.
pub fn history_dates(
    conn: &Connection,
    class_id: i64,
    subject_id: Option<i64>,
) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT att_date FROM attendance
         WHERE class_id = ?1 AND subject_id IS ?2
         ORDER BY att_date DESC",
    )?;
    stmt.query_map(params![class_id, subject_id], |row| row.get(0))?
        .collect()
}

/// Every student currently in the class with their record for `date`, if any.
pub fn history_rows(
    conn: &Connection,
    class_id: i64,
    subject_id: Option<i64>,
    date: &str,
) -> rusqlite::Result<Vec<HistoryStudent>> {
    let mut stmt = conn.prepare(
        "SELECT s.reg_no, s.name, a.present, a.id FROM students s
         LEFT JOIN attendance a
           ON s.reg_no = a.reg_no AND a.att_date = ?1 AND a.class_id = ?2 AND a.subject_id IS ?3
         WHERE s.class_id = ?2
         ORDER BY s.name, s.reg_no",
    )?;
    stmt.query_map(params![date, class_id, subject_id], |row| {
        Ok(HistoryStudent {
            reg_no: row.get(0)?,
            name: row.get(1)?,
            present: row.get(2)?,
            att_id: row.get(3)?,
        })
    })?
    .collect()
}
