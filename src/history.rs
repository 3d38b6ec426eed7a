use crate::models::{ClassRecord, HistoryRecord, HistoryStudent};
use crate::roster::RosterSummary;
use crate::storage;
use rusqlite::Connection;

/// Attendance history for a class, one record per recorded date, newest
/// first. Returns `None` when the class does not exist.
pub fn build_history(
    conn: &Connection,
    class_id: i64,
    subject_id: Option<i64>,
) -> rusqlite::Result<Option<Vec<HistoryRecord>>> {
    let Some(class) = storage::get_class(conn, class_id)? else {
        return Ok(None);
    };

    let mut records = Vec::new();
    for date in storage::history_dates(conn, class_id, subject_id)? {
        let students = storage::history_rows(conn, class_id, subject_id, &date)?;
        records.push(to_record(&class, date, students));
    }
    Ok(Some(records))
}

fn to_record(class: &ClassRecord, date: String, students: Vec<HistoryStudent>) -> HistoryRecord {
    // Students without a record for the day count as absent.
    let summary = RosterSummary::from_flags(
        students
            .iter()
            .map(|student| student.present.unwrap_or(false)),
    );
    HistoryRecord {
        date,
        class_name: class.class_name.clone(),
        section: class.section.clone(),
        students,
        summary,
    }
}
