use super::{flash_redirect, parse_date};
use crate::auth::{CurrentUser, FlashKind};
use crate::errors::AppError;
use crate::history::build_history;
use crate::models::{
    AttendanceStatusUpdate, DeleteAttendanceDayForm, HistoryResponse, StatusResponse,
    SubjectQuery, optional_id,
};
use crate::state::AppState;
use crate::storage;
use crate::ui::{HistoryPage, render_class_picker, render_history};
use axum::{
    Form, Json,
    extract::{Path, Query, State},
    response::{Html, Redirect},
};
use tracing::info;

pub async fn history(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Html<String>, AppError> {
    let flashes = user.take_flashes(&state).await;
    let classes = {
        let conn = state.db.lock().await;
        storage::list_classes(&conn)?
    };
    Ok(Html(render_class_picker(&user.user, &flashes, &classes)))
}

pub async fn attendance_history(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(class_id): Path<i64>,
    Query(query): Query<SubjectQuery>,
) -> Result<Html<String>, AppError> {
    user.require_staff()?;
    let flashes = user.take_flashes(&state).await;

    let (class, subjects, subject_id, records) = {
        let conn = state.db.lock().await;
        let class = storage::get_class(&conn, class_id)?
            .ok_or_else(|| AppError::not_found("Class not found"))?;
        let subjects = storage::list_subjects(&conn, class_id)?;
        let subject_id = optional_id(query.subject_id.as_deref());
        let records = build_history(&conn, class_id, subject_id)?.unwrap_or_default();
        (class, subjects, subject_id, records)
    };

    Ok(Html(render_history(&HistoryPage {
        user: &user.user,
        flashes: &flashes,
        class: &class,
        subjects: &subjects,
        subject_id,
        records: &records,
    })))
}

/// JSON history for any signed-in user.
pub async fn get_attendance_history(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(class_id): Path<i64>,
    Query(query): Query<SubjectQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let subject_id = optional_id(query.subject_id.as_deref());
    let records = {
        let conn = state.db.lock().await;
        build_history(&conn, class_id, subject_id)?
    };
    Ok(Json(match records {
        Some(records) => HistoryResponse::Found {
            success: true,
            records,
        },
        None => HistoryResponse::Missing {
            success: false,
            message: "Class not found".to_string(),
        },
    }))
}

pub async fn delete_attendance_day(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<DeleteAttendanceDayForm>,
) -> Result<Redirect, AppError> {
    user.require_staff()?;
    let class_id = optional_id(form.class_id.as_deref());
    let att_date = parse_date(form.att_date.as_deref());
    let (Some(class_id), Some(att_date)) = (class_id, att_date) else {
        return Ok(flash_redirect(
            &state,
            &user,
            FlashKind::Danger,
            "Missing class or date information",
            "/history",
        )
        .await);
    };
    let subject_id = optional_id(form.subject_id.as_deref());

    let removed = {
        let conn = state.db.lock().await;
        storage::delete_attendance_day(&conn, class_id, subject_id, &att_date)?
    };
    info!(class_id, ?subject_id, date = %att_date, removed, "attendance day deleted");
    Ok(flash_redirect(
        &state,
        &user,
        FlashKind::Success,
        "Attendance record deleted",
        "/history",
    )
    .await)
}

pub async fn update_attendance_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(update): Json<AttendanceStatusUpdate>,
) -> Result<Json<StatusResponse>, AppError> {
    user.require_admin()?;
    let updated = {
        let conn = state.db.lock().await;
        storage::set_attendance_status(&conn, update.id, update.present)?
    };
    if updated {
        info!(attendance_id = update.id, present = update.present, "attendance corrected");
    }
    Ok(Json(StatusResponse {
        success: updated,
        message: if updated {
            "Attendance updated"
        } else {
            "Attendance record not found"
        }
        .to_string(),
    }))
}
