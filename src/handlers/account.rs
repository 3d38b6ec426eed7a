use super::non_blank;
use crate::auth::{
    CurrentUser, Flash, FlashKind, clear_session_cookie, hash_password, session_cookie,
    session_token,
};
use crate::errors::AppError;
use crate::import::parse_class_field;
use crate::models::{LoginForm, RegisterForm, Role, User};
use crate::state::AppState;
use crate::storage::{self, RegisterError, Registration, StudentLink};
use crate::ui::{render_dashboard, render_index, render_login, render_register};
use axum::{
    Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, warn};

pub async fn index(State(state): State<AppState>, jar: CookieJar) -> Html<String> {
    let user = match session_token(&jar) {
        Some(token) => state.sessions.user(&token).await,
        None => None,
    };
    Html(render_index(user.as_ref()))
}

pub async fn login_page() -> Html<String> {
    Html(render_login(&[], "", None))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let username = form.username.trim();
    let password_hash = hash_password(&form.password);
    let role = form.role.as_deref().and_then(|role| role.parse::<Role>().ok());

    let user = match role {
        Some(role) => {
            let conn = state.db.lock().await;
            storage::find_user_by_credentials(&conn, username, &password_hash, role)?
        }
        None => None,
    };

    match user {
        Some(user) => {
            info!(user_id = user.id, role = %user.role, "login succeeded");
            Ok(start_session(&state, jar, user, None).await.into_response())
        }
        None => {
            warn!(username = %username, "login failed");
            let flash = Flash::new(
                FlashKind::Danger,
                format!("Invalid credentials or incorrect role selected for {username}"),
            );
            Ok(Html(render_login(&[flash], username, form.role.as_deref())).into_response())
        }
    }
}

pub async fn register_page() -> Html<String> {
    Html(render_register(&[]))
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let rejected = |message: &str| -> Result<Response, AppError> {
        Ok(Html(render_register(&[Flash::new(FlashKind::Danger, message)])).into_response())
    };

    let username = form.username.trim();
    let password = form.password.trim();
    if username.is_empty() || password.is_empty() {
        return rejected("Username and password are required");
    }
    let Ok(role) = form.role.parse::<Role>() else {
        return rejected("Please choose a valid role");
    };

    let student = match (role, non_blank(Some(form.register_no.as_str()))) {
        (Role::Student, Some(reg_no)) => {
            parse_class_field(&form.class).map(|(class_num, section)| StudentLink {
                reg_no: reg_no.to_string(),
                class_num,
                section,
            })
        }
        _ => None,
    };
    let registration = Registration {
        username: username.to_string(),
        password_hash: hash_password(password),
        role,
        student,
    };

    let result = {
        let mut conn = state.db.lock().await;
        storage::register(&mut conn, &registration)
    };
    match result {
        Ok(user) => {
            info!(user_id = user.id, role = %user.role, "user registered");
            let welcome = Flash::new(FlashKind::Success, "Registered successfully! Welcome to Scientia");
            Ok(start_session(&state, jar, user, Some(welcome)).await.into_response())
        }
        Err(RegisterError::DuplicateUsername) => {
            rejected("Username already exists. Please choose a different username.")
        }
        Err(RegisterError::DuplicateRegNo) => rejected("Registration number already exists."),
        Err(RegisterError::Db(err)) => Err(AppError::internal(err)),
    }
}

async fn start_session(
    state: &AppState,
    jar: CookieJar,
    user: User,
    flash: Option<Flash>,
) -> (CookieJar, Redirect) {
    let token = state.sessions.create(user).await;
    if let Some(flash) = flash {
        state.sessions.push_flash(&token, flash).await;
    }
    (jar.add(session_cookie(token)), Redirect::to("/dashboard"))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    user: CurrentUser,
) -> (CookieJar, Redirect) {
    state.sessions.remove(&user.token).await;
    info!(user_id = user.user.id, "logged out");
    (clear_session_cookie(jar), Redirect::to("/"))
}

pub async fn dashboard(State(state): State<AppState>, user: CurrentUser) -> Html<String> {
    let flashes = user.take_flashes(&state).await;
    Html(render_dashboard(&user.user, &flashes))
}
