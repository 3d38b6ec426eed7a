//! Admin-only roster management. Every action answers with a flash and a
//! redirect back to the attendance page.

use super::{flash_redirect, non_blank};
use crate::auth::{CurrentUser, FlashKind};
use crate::errors::AppError;
use crate::import::{
    CsvParse, RowError, parse_student_csv, parse_student_sheet, split_subjects, summarize_errors,
};
use crate::models::{AddSubjectsForm, StudentSheetForm, Upsert, optional_id};
use crate::state::AppState;
use crate::storage;
use axum::{
    Form,
    extract::{Multipart, Path, State},
    response::Redirect,
};
use rusqlite::Connection;
use tracing::{info, warn};

const BACK: &str = "/attendance";

pub async fn add_subjects(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<AddSubjectsForm>,
) -> Result<Redirect, AppError> {
    user.require_admin()?;
    let names = split_subjects(&form.subjects);
    let class_id = optional_id(form.class_id.as_deref());
    let class_key = non_blank(form.class_num.as_deref()).zip(non_blank(form.section.as_deref()));
    if names.is_empty() || (class_id.is_none() && class_key.is_none()) {
        return Ok(flash_redirect(
            &state,
            &user,
            FlashKind::Danger,
            "Missing class or subjects data",
            BACK,
        )
        .await);
    }

    let outcome = {
        let conn = state.db.lock().await;
        let class_id = match (class_id, class_key) {
            (Some(id), _) => storage::get_class(&conn, id)?.map(|class| class.id),
            (None, Some((num, section))) => {
                Some(storage::find_or_create_class(&conn, num, &section.to_uppercase())?)
            }
            (None, None) => None,
        };
        match class_id {
            Some(class_id) => Some((class_id, storage::add_subjects(&conn, class_id, &names)?)),
            None => None,
        }
    };

    let Some((class_id, (added, duplicates))) = outcome else {
        return Ok(flash_redirect(&state, &user, FlashKind::Danger, "Class not found", BACK).await);
    };
    info!(class_id, added, duplicates, "subjects added");
    let (kind, message) = subjects_message(added, duplicates);
    Ok(flash_redirect(&state, &user, kind, message, BACK).await)
}

fn subjects_message(added: usize, duplicates: usize) -> (FlashKind, String) {
    match (added, duplicates) {
        (0, _) => (FlashKind::Warning, "No new subjects added".to_string()),
        (added, 0) => (FlashKind::Success, format!("Added {added} subject(s)")),
        (added, duplicates) => (
            FlashKind::Success,
            format!("Added {added} subject(s). ({duplicates} already existed)"),
        ),
    }
}

/// Upserts the JSON sheet into one class inside a single transaction.
pub async fn submit_student_sheet(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<StudentSheetForm>,
) -> Result<Redirect, AppError> {
    user.require_admin()?;
    let (Some(num), Some(section), Some(data)) = (
        non_blank(Some(form.sheet_class.as_str())),
        non_blank(Some(form.sheet_section.as_str())),
        non_blank(Some(form.student_data.as_str())),
    ) else {
        return Ok(
            flash_redirect(&state, &user, FlashKind::Danger, "Missing required data", BACK).await,
        );
    };

    let students = match parse_student_sheet(data) {
        Ok(students) => students,
        Err(err) => {
            return Ok(flash_redirect(&state, &user, FlashKind::Danger, err.message(), BACK).await);
        }
    };

    let (added, updated) = {
        let mut conn = state.db.lock().await;
        let tx = conn.transaction()?;
        let class_id = storage::find_or_create_class(&tx, num, &section.to_uppercase())?;
        let mut added = 0;
        let mut updated = 0;
        for student in &students {
            match storage::upsert_student(&tx, &student.reg_no, &student.name, class_id)? {
                Upsert::Added => added += 1,
                Upsert::Updated => updated += 1,
            }
        }
        tx.commit()?;
        (added, updated)
    };

    info!(added, updated, "student sheet saved");
    let message =
        format!("Successfully added {added} new student(s) and updated {updated} student(s)");
    Ok(flash_redirect(&state, &user, FlashKind::Success, message, BACK).await)
}

pub async fn upload_students(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> Result<Redirect, AppError> {
    user.require_admin()?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(err.body_text()))?
    {
        if field.name() != Some("student_file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::bad_request(err.body_text()))?;
        upload = Some((file_name, bytes));
    }

    let Some((file_name, bytes)) = upload.filter(|(name, _)| !name.is_empty()) else {
        return Ok(flash_redirect(&state, &user, FlashKind::Danger, "No file selected", BACK).await);
    };
    if !file_name.to_ascii_lowercase().ends_with(".csv") {
        return Ok(
            flash_redirect(&state, &user, FlashKind::Danger, "Please upload a CSV file", BACK)
                .await,
        );
    }

    let parsed = match parse_student_csv(bytes.as_ref()) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!(file = %file_name, error = %err, "student csv unreadable");
            let message = format!("Error uploading file: {err}");
            return Ok(flash_redirect(&state, &user, FlashKind::Danger, message, BACK).await);
        }
    };

    let (uploaded, errors) = {
        let mut conn = state.db.lock().await;
        apply_csv(&mut conn, parsed)?
    };
    info!(file = %file_name, uploaded, errors = errors.len(), "student csv imported");

    let (kind, message) = if errors.is_empty() {
        (
            FlashKind::Success,
            format!("Successfully uploaded {uploaded} student(s)"),
        )
    } else {
        (
            FlashKind::Warning,
            format!(
                "Uploaded {uploaded} students. Errors: {}",
                summarize_errors(&errors)
            ),
        )
    };
    Ok(flash_redirect(&state, &user, kind, message, BACK).await)
}

/// Writes the parsed rows in one transaction. A row that fails to store is
/// reported next to the rows the parser already rejected.
fn apply_csv(conn: &mut Connection, parsed: CsvParse) -> rusqlite::Result<(usize, Vec<RowError>)> {
    let CsvParse {
        students,
        mut errors,
    } = parsed;
    let tx = conn.transaction()?;
    let mut uploaded = 0;
    for student in students {
        let stored = storage::find_or_create_class(&tx, &student.class_num, &student.section)
            .and_then(|class_id| {
                storage::upsert_student(&tx, &student.reg_no, &student.name, class_id)
            });
        match stored {
            Ok(_) => uploaded += 1,
            Err(err) => errors.push(RowError {
                row: student.row,
                message: err.to_string(),
            }),
        }
    }
    tx.commit()?;
    errors.sort_by_key(|error| error.row);
    Ok((uploaded, errors))
}

pub async fn delete_student(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Redirect, AppError> {
    user.require_admin()?;
    let removed = {
        let mut conn = state.db.lock().await;
        storage::delete_student(&mut conn, id)?
    };
    let (kind, message) = match removed {
        Some(reg_no) => {
            info!(student_id = id, reg_no = %reg_no, "student deleted");
            (FlashKind::Success, format!("Student {reg_no} deleted"))
        }
        None => (FlashKind::Danger, "Student not found".to_string()),
    };
    Ok(flash_redirect(&state, &user, kind, message, BACK).await)
}

pub async fn delete_class(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Redirect, AppError> {
    user.require_admin()?;
    let removed = {
        let mut conn = state.db.lock().await;
        storage::delete_class(&mut conn, id)?
    };
    let (kind, message) = if removed {
        info!(class_id = id, "class deleted");
        (FlashKind::Success, "Class and all its records deleted")
    } else {
        (FlashKind::Danger, "Class not found")
    };
    Ok(flash_redirect(&state, &user, kind, message, BACK).await)
}

pub async fn delete_subject(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Redirect, AppError> {
    user.require_admin()?;
    let removed = {
        let mut conn = state.db.lock().await;
        storage::delete_subject(&mut conn, id)?
    };
    let (kind, message) = if removed {
        info!(subject_id = id, "subject deleted");
        (FlashKind::Success, "Subject deleted")
    } else {
        (FlashKind::Danger, "Subject not found")
    };
    Ok(flash_redirect(&state, &user, kind, message, BACK).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{find_class, list_students, test_connection};

    #[test]
    fn subject_messages_mention_duplicates() {
        assert_eq!(
            subjects_message(2, 0),
            (FlashKind::Success, "Added 2 subject(s)".to_string())
        );
        assert_eq!(
            subjects_message(1, 3),
            (
                FlashKind::Success,
                "Added 1 subject(s). (3 already existed)".to_string()
            )
        );
        assert_eq!(subjects_message(0, 2).0, FlashKind::Warning);
    }

    #[test]
    fn csv_rows_land_in_their_classes() {
        let mut conn = test_connection();
        let parsed =
            parse_student_csv("7,b,Nia,R-700\n7,B,Omar,R-701\nbroken,row\n".as_bytes()).unwrap();
        let (uploaded, errors) = apply_csv(&mut conn, parsed).unwrap();
        assert_eq!(uploaded, 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 3);

        let class_id = find_class(&conn, "7", "B").unwrap().unwrap();
        let names: Vec<String> = list_students(&conn, class_id)
            .unwrap()
            .into_iter()
            .map(|student| student.name)
            .collect();
        assert_eq!(names, vec!["Nia", "Omar"]);
    }
}
