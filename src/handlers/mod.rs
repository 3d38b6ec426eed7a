mod account;
mod attendance;
mod history;
mod manage;

pub use account::{dashboard, index, login, login_page, logout, register, register_page};
pub use attendance::{
    attendance_page, attendance_select, get_class_students, get_subjects, submit_attendance,
};
pub use history::{
    attendance_history, delete_attendance_day, get_attendance_history, history,
    update_attendance_status,
};
pub use manage::{
    add_subjects, delete_class, delete_student, delete_subject, submit_student_sheet,
    upload_students,
};

use crate::auth::{CurrentUser, FlashKind};
use crate::models::HealthResponse;
use crate::state::AppState;
use axum::{Json, response::Redirect};
use chrono::{Local, NaiveDate};

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

/// Queues a flash on the user's session and redirects to `to`.
async fn flash_redirect(
    state: &AppState,
    user: &CurrentUser,
    kind: FlashKind,
    message: impl Into<String>,
    to: &str,
) -> Redirect {
    user.flash(state, kind, message).await;
    Redirect::to(to)
}

fn today_string() -> String {
    Local::now().date_naive().to_string()
}

/// Accepts `YYYY-MM-DD` only and returns it normalized.
fn parse_date(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| date.to_string())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_must_be_iso() {
        assert_eq!(parse_date(Some("2026-01-05")), Some("2026-01-05".to_string()));
        assert_eq!(parse_date(Some(" 2026-01-05 ")), Some("2026-01-05".to_string()));
        assert_eq!(parse_date(Some("2026-02-30")), None);
        assert_eq!(parse_date(Some("05/01/2026")), None);
        assert_eq!(parse_date(None), None);
    }

    #[test]
    fn blank_values_are_dropped() {
        assert_eq!(non_blank(Some("  x ")), Some("x"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
