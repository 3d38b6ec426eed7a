use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::index))
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/register", get(handlers::register_page).post(handlers::register))
        .route("/logout", get(handlers::logout))
        .route("/dashboard", get(handlers::dashboard))
        .route(
            "/attendance",
            get(handlers::attendance_page).post(handlers::attendance_select),
        )
        .route("/submit_attendance", post(handlers::submit_attendance))
        .route("/get_subjects/:class_key", get(handlers::get_subjects))
        .route("/get_class_students/:class_id", get(handlers::get_class_students))
        .route("/add_subjects", post(handlers::add_subjects))
        .route("/submit_student_sheet", post(handlers::submit_student_sheet))
        .route("/upload_students", post(handlers::upload_students))
        .route("/history", get(handlers::history))
        .route("/attendance_history/:class_id", get(handlers::attendance_history))
        .route(
            "/get_attendance_history/:class_id",
            get(handlers::get_attendance_history),
        )
        .route("/delete_attendance_day", post(handlers::delete_attendance_day))
        .route("/update_attendance_status", post(handlers::update_attendance_status))
        .route("/delete_student/:id", post(handlers::delete_student))
        .route("/delete_class/:id", post(handlers::delete_class))
        .route("/delete_subject/:id", post(handlers::delete_subject))
        .with_state(state)
}
