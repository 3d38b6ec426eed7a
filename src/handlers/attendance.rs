use super::{flash_redirect, non_blank, parse_date, today_string};
use crate::auth::{CurrentUser, FlashKind};
use crate::errors::AppError;
use crate::models::{AttendanceSelection, ClassStudentsResponse, Subject, optional_id};
use crate::roster::{Effect, Message, RosterController, RosterRow, RosterSummary};
use crate::state::AppState;
use crate::storage;
use crate::ui::{AttendancePage, render_attendance};
use axum::{
    Form, Json,
    extract::{Path, State},
    response::{Html, Redirect},
};
use rusqlite::Connection;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

pub async fn attendance_page(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Html<String>, AppError> {
    user.require_staff()?;
    render_roster(&state, &user, None, None, None, today_string()).await
}

/// Loads the roster for the posted class/section/subject/date selection.
pub async fn attendance_select(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(selection): Form<AttendanceSelection>,
) -> Result<Html<String>, AppError> {
    user.require_staff()?;
    let att_date = parse_date(selection.att_date.as_deref()).unwrap_or_else(today_string);
    render_roster(
        &state,
        &user,
        non_blank(selection.class_num.as_deref()),
        non_blank(selection.section.as_deref()),
        optional_id(selection.subject_id.as_deref()),
        att_date,
    )
    .await
}

async fn render_roster(
    state: &AppState,
    user: &CurrentUser,
    class_num: Option<&str>,
    section: Option<&str>,
    subject_id: Option<i64>,
    att_date: String,
) -> Result<Html<String>, AppError> {
    let flashes = user.take_flashes(state).await;

    let (class_id, students, subjects, marks) = {
        let conn = state.db.lock().await;
        let class_id = match (class_num, section) {
            (Some(num), Some(section)) => storage::find_class(&conn, num, section)?,
            _ => None,
        };
        match class_id {
            Some(id) => {
                let students = storage::list_students(&conn, id)?;
                let subjects = storage::list_subjects(&conn, id)?;
                let subject_id = known_subject(&subjects, subject_id);
                let marks = storage::load_marks(&conn, id, subject_id, &att_date)?;
                (class_id, students, subjects, marks)
            }
            None => (None, Vec::new(), Vec::new(), HashMap::new()),
        }
    };
    let subject_id = known_subject(&subjects, subject_id);

    let rows = students
        .iter()
        .map(|student| {
            let present = marks.get(&student.reg_no).copied().unwrap_or(false);
            RosterRow::new(&student.reg_no, &student.name, present)
        })
        .collect();
    let mut roster = RosterController::new(rows);
    roster.dispatch(Message::Init);

    let student_ids: HashMap<String, i64> = students
        .iter()
        .map(|student| (student.reg_no.clone(), student.id))
        .collect();

    Ok(Html(render_attendance(&AttendancePage {
        user: &user.user,
        flashes: &flashes,
        class_num,
        section,
        class_id,
        subject_id,
        subjects: &subjects,
        att_date: &att_date,
        roster: &roster,
        student_ids: &student_ids,
    })))
}

fn known_subject(subjects: &[Subject], subject_id: Option<i64>) -> Option<i64> {
    subject_id.filter(|id| subjects.iter().any(|subject| subject.id == *id))
}

#[derive(Debug, Default)]
struct SubmittedAttendance {
    class_id: Option<i64>,
    subject_id: Option<i64>,
    att_date: Option<String>,
    present: HashSet<String>,
}

impl SubmittedAttendance {
    /// `present[]` repeats once per checked student.
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut submitted = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "class_id" => submitted.class_id = optional_id(Some(&value)),
                "subject_id" => submitted.subject_id = optional_id(Some(&value)),
                "att_date" => submitted.att_date = parse_date(Some(&value)),
                "present[]" | "present" => {
                    submitted.present.insert(value.trim().to_string());
                }
                _ => {}
            }
        }
        submitted
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Submission {
    Saved(RosterSummary),
    /// The class has no students; nothing stored is touched.
    Empty,
    UnknownClassOrSubject,
}

/// Rebuilds the roster for the class from the posted checkboxes and, when
/// the roster is not empty, replaces the stored marks for that day.
fn record_submission(
    conn: &mut Connection,
    class_id: i64,
    submitted: &SubmittedAttendance,
    att_date: &str,
) -> rusqlite::Result<Submission> {
    if storage::get_class(conn, class_id)?.is_none() {
        return Ok(Submission::UnknownClassOrSubject);
    }
    let subjects = storage::list_subjects(conn, class_id)?;
    if known_subject(&subjects, submitted.subject_id) != submitted.subject_id {
        return Ok(Submission::UnknownClassOrSubject);
    }

    let students = storage::list_students(conn, class_id)?;
    let mut roster = RosterController::from_submission(
        students
            .iter()
            .map(|student| (student.reg_no.as_str(), student.name.as_str())),
        &submitted.present,
    );
    let summary = roster.summary();
    let Effect::Submit(marks) = roster.dispatch(Message::SubmitRequested) else {
        return Ok(Submission::Empty);
    };
    storage::replace_attendance(conn, class_id, submitted.subject_id, att_date, &marks)?;
    Ok(Submission::Saved(summary))
}

pub async fn submit_attendance(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Redirect, AppError> {
    user.require_staff()?;
    let submitted = SubmittedAttendance::from_pairs(pairs);
    let (Some(class_id), Some(att_date)) = (submitted.class_id, submitted.att_date.clone()) else {
        return Ok(flash_redirect(
            &state,
            &user,
            FlashKind::Danger,
            "Missing class or date information",
            "/attendance",
        )
        .await);
    };

    let outcome = {
        let mut conn = state.db.lock().await;
        record_submission(&mut conn, class_id, &submitted, &att_date)?
    };

    let (kind, message) = match outcome {
        Submission::Saved(summary) => {
            info!(
                class_id,
                subject_id = ?submitted.subject_id,
                date = %att_date,
                present = summary.present,
                absent = summary.absent,
                "attendance submitted"
            );
            (FlashKind::Success, "Attendance submitted successfully!")
        }
        Submission::Empty => (FlashKind::Warning, "No students in this class to mark"),
        Submission::UnknownClassOrSubject => {
            warn!(class_id, subject_id = ?submitted.subject_id, "attendance for unknown class or subject");
            (FlashKind::Danger, "Class or subject not found")
        }
    };
    Ok(flash_redirect(&state, &user, kind, message, "/attendance").await)
}

/// Subjects for a class addressed as `{num}-{section}`, e.g. `10-A`.
pub async fn get_subjects(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(class_key): Path<String>,
) -> Result<Json<Vec<Subject>>, AppError> {
    let Some((num, section)) = class_key.rsplit_once('-') else {
        return Ok(Json(Vec::new()));
    };
    let conn = state.db.lock().await;
    let subjects = match storage::find_class(&conn, num, section)? {
        Some(class_id) => storage::list_subjects(&conn, class_id)?,
        None => Vec::new(),
    };
    Ok(Json(subjects))
}

pub async fn get_class_students(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(class_id): Path<i64>,
) -> Result<Json<ClassStudentsResponse>, AppError> {
    user.require_staff()?;
    let conn = state.db.lock().await;
    let students = storage::list_students(&conn, class_id)?;
    Ok(Json(ClassStudentsResponse {
        success: true,
        students,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::AttendanceMark;
    use crate::storage::{find_class, load_marks, replace_attendance, test_connection};

    #[test]
    fn submitted_pairs_collect_every_checked_student() {
        let pairs = vec![
            ("class_id".to_string(), "3".to_string()),
            ("subject_id".to_string(), "".to_string()),
            ("att_date".to_string(), "2026-01-05".to_string()),
            ("present[]".to_string(), "REG-3-1".to_string()),
            ("present[]".to_string(), "REG-3-2".to_string()),
        ];
        let submitted = SubmittedAttendance::from_pairs(pairs);
        assert_eq!(submitted.class_id, Some(3));
        assert_eq!(submitted.subject_id, None);
        assert_eq!(submitted.att_date.as_deref(), Some("2026-01-05"));
        assert_eq!(submitted.present.len(), 2);
        assert!(submitted.present.contains("REG-3-2"));
    }

    fn submission(class_id: i64, present: &[&str]) -> SubmittedAttendance {
        SubmittedAttendance {
            class_id: Some(class_id),
            subject_id: None,
            att_date: Some("2026-04-10".into()),
            present: present.iter().map(|reg| reg.to_string()).collect(),
        }
    }

    #[test]
    fn empty_class_leaves_stored_marks_alone() {
        let mut conn = test_connection();
        let class_id = find_class(&conn, "1", "B").unwrap().unwrap();
        let earlier = vec![AttendanceMark {
            reg_no: "LEFT-1".into(),
            present: true,
        }];
        replace_attendance(&mut conn, class_id, None, "2026-04-10", &earlier).unwrap();

        let outcome =
            record_submission(&mut conn, class_id, &submission(class_id, &[]), "2026-04-10")
                .unwrap();
        assert_eq!(outcome, Submission::Empty);
        let marks = load_marks(&conn, class_id, None, "2026-04-10").unwrap();
        assert_eq!(marks.get("LEFT-1"), Some(&true));
    }

    #[test]
    fn submission_replaces_the_day() {
        let mut conn = test_connection();
        let class_id = find_class(&conn, "1", "A").unwrap().unwrap();
        let outcome = record_submission(
            &mut conn,
            class_id,
            &submission(class_id, &["REG-1-2", "NOT-ENROLLED"]),
            "2026-04-10",
        )
        .unwrap();
        assert_eq!(
            outcome,
            Submission::Saved(RosterSummary {
                total: 2,
                present: 1,
                absent: 1
            })
        );
        let marks = load_marks(&conn, class_id, None, "2026-04-10").unwrap();
        assert_eq!(marks.len(), 2);
        assert_eq!(marks["REG-1-2"], true);
        assert_eq!(marks["REG-1-1"], false);
    }

    #[test]
    fn foreign_subject_is_rejected() {
        let mut conn = test_connection();
        let class_id = find_class(&conn, "1", "A").unwrap().unwrap();
        let mut posted = submission(class_id, &["REG-1-1"]);
        posted.subject_id = Some(4242);
        let outcome = record_submission(&mut conn, class_id, &posted, "2026-04-10").unwrap();
        assert_eq!(outcome, Submission::UnknownClassOrSubject);
        assert!(load_marks(&conn, class_id, None, "2026-04-10").unwrap().is_empty());
    }

    #[test]
    fn subjects_outside_the_class_are_dropped() {
        let subjects = vec![Subject {
            id: 4,
            subject_name: "Math".into(),
        }];
        assert_eq!(known_subject(&subjects, Some(4)), Some(4));
        assert_eq!(known_subject(&subjects, Some(5)), None);
        assert_eq!(known_subject(&subjects, None), None);
    }
}
