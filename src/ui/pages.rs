use super::{escape, layout};
use crate::auth::Flash;
use crate::models::{Role, User};

pub fn render_index(user: Option<&User>) -> String {
    let action = match user {
        Some(_) => r#"<a href="/dashboard"><button type="button">Go to dashboard</button></a>"#,
        None => {
            r#"<a href="/login"><button type="button">Log in</button></a>
      <a href="/register"><button type="button">Register</button></a>"#
        }
    };
    let content = format!(
        r#"<section class="card">
      <h1>Scientia</h1>
      <p>Daily attendance, class rosters and attendance history for your school.</p>
      <div class="row">{action}</div>
    </section>"#
    );
    layout("Welcome", user, &[], &content)
}

fn role_options(selected: Option<&str>) -> String {
    [Role::Teacher, Role::Admin, Role::Student]
        .iter()
        .map(|role| {
            let value = role.as_str();
            let marker = if selected == Some(value) { " selected" } else { "" };
            format!(r#"<option value="{value}"{marker}>{value}</option>"#)
        })
        .collect()
}

pub fn render_login(flashes: &[Flash], username: &str, role: Option<&str>) -> String {
    let content = format!(
        r#"<section class="card">
      <h1>Log in</h1>
      <form method="post" action="/login" class="row">
        <label>Username <input name="username" value="{username}" required /></label>
        <label>Password <input name="password" type="password" required /></label>
        <label>Role <select name="role">{roles}</select></label>
        <button type="submit">Log in</button>
      </form>
    </section>"#,
        username = escape(username),
        roles = role_options(role),
    );
    layout("Log in", None, flashes, &content)
}

pub fn render_register(flashes: &[Flash]) -> String {
    let content = format!(
        r#"<section class="card">
      <h1>Register</h1>
      <form method="post" action="/register" class="row">
        <label>Username <input name="username" required /></label>
        <label>Password <input name="password" type="password" required /></label>
        <label>Role <select name="role">{roles}</select></label>
        <label>Register no. (students) <input name="register_no" /></label>
        <label>Class (e.g. 10-A) <input name="class" /></label>
        <button type="submit">Create account</button>
      </form>
    </section>"#,
        roles = role_options(None),
    );
    layout("Register", None, flashes, &content)
}

pub fn render_dashboard(user: &User, flashes: &[Flash]) -> String {
    let mut tiles = String::new();
    if user.role.is_staff() {
        tiles.push_str(
            r#"<a href="/attendance"><button type="button">Mark attendance</button></a>"#,
        );
    }
    tiles.push_str(r#"<a href="/history"><button type="button">Attendance history</button></a>"#);

    let content = format!(
        r#"<section class="card">
      <h1>Welcome, {name}</h1>
      <p>Signed in as {role}.</p>
      <div class="row">{tiles}</div>
    </section>"#,
        name = escape(&user.username),
        role = user.role,
    );
    layout("Dashboard", Some(user), flashes, &content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_keeps_entered_values() {
        let html = render_login(&[], "te<a>cher", Some("admin"));
        assert!(html.contains(r#"value="te&lt;a&gt;cher""#));
        assert!(html.contains(r#"<option value="admin" selected>admin</option>"#));
    }

    #[test]
    fn students_do_not_get_the_marking_tile() {
        let student = User {
            id: 3,
            username: "kid".into(),
            role: Role::Student,
        };
        let html = render_dashboard(&student, &[]);
        assert!(!html.contains("Mark attendance"));
        assert!(html.contains("Attendance history"));
    }
}
