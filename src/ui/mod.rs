//! Server-rendered pages. Every value that reaches the markup goes through
//! [`escape`].

mod attendance;
mod history;
mod pages;

pub use attendance::{AttendancePage, ROSTER_SCRIPT, render_attendance};
pub use history::{HistoryPage, render_class_picker, render_history};
pub use pages::{render_dashboard, render_index, render_login, render_register};

use crate::auth::Flash;
use crate::models::User;

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

fn render_flashes(flashes: &[Flash]) -> String {
    flashes
        .iter()
        .map(|flash| {
            format!(
                r#"<div class="flash flash-{}">{}</div>"#,
                flash.kind.as_str(),
                escape(&flash.message)
            )
        })
        .collect()
}

fn render_nav(user: Option<&User>) -> String {
    match user {
        Some(user) => {
            let mut links = String::from(r#"<a href="/dashboard">Dashboard</a>"#);
            if user.role.is_staff() {
                links.push_str(r#"<a href="/attendance">Attendance</a>"#);
            }
            links.push_str(r#"<a href="/history">History</a>"#);
            links.push_str(&format!(
                r#"<span class="who">{} ({})</span><a href="/logout">Log out</a>"#,
                escape(&user.username),
                user.role
            ));
            links
        }
        None => r#"<a href="/login">Log in</a><a href="/register">Register</a>"#.to_string(),
    }
}

fn layout(title: &str, user: Option<&User>, flashes: &[Flash], content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{title} · Scientia</title>
  <style>{STYLE}</style>
</head>
<body>
  <nav class="topbar"><a class="brand" href="/">Scientia</a>{nav}</nav>
  <main class="app">
    {flashes}
    {content}
  </main>
</body>
</html>
"#,
        title = escape(title),
        nav = render_nav(user),
        flashes = render_flashes(flashes),
    )
}

const STYLE: &str = r#"
    :root {
      --bg: #f4f1ea;
      --ink: #2b2a28;
      --accent: #2f4858;
      --present: #dff3e4;
      --absent: #fbe1dc;
      --card: #ffffff;
    }
    * { box-sizing: border-box; }
    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
    }
    .topbar {
      display: flex;
      gap: 18px;
      align-items: center;
      padding: 14px 28px;
      background: var(--accent);
    }
    .topbar a, .topbar .who { color: white; text-decoration: none; }
    .topbar .brand { font-weight: 700; margin-right: auto; }
    .app {
      width: min(960px, 100%);
      margin: 28px auto;
      padding: 0 18px;
      display: grid;
      gap: 22px;
    }
    .card {
      background: var(--card);
      border-radius: 16px;
      padding: 22px;
      box-shadow: 0 12px 30px rgba(47, 72, 88, 0.12);
    }
    .flash { padding: 12px 16px; border-radius: 10px; }
    .flash-success { background: #dff3e4; }
    .flash-danger { background: #fbe1dc; }
    .flash-warning { background: #fff1cc; }
    form.inline { display: inline; }
    .row { display: flex; flex-wrap: wrap; gap: 12px; align-items: end; }
    label { display: grid; gap: 4px; font-size: 0.9rem; }
    input, select, textarea { padding: 8px; border-radius: 8px; border: 1px solid #c9c4bb; }
    button {
      border: none;
      border-radius: 999px;
      padding: 10px 18px;
      background: var(--accent);
      color: white;
      font-weight: 600;
      cursor: pointer;
    }
    button:disabled { opacity: 0.4; cursor: not-allowed; }
    button.danger { background: #c63b2b; }
    table { width: 100%; border-collapse: collapse; }
    th, td { padding: 8px 10px; text-align: left; border-bottom: 1px solid #eee; }
    tr.present { background: var(--present); }
    tr.absent { background: var(--absent); }
    .summary { display: flex; gap: 22px; font-size: 1.05rem; }
    .summary strong { font-size: 1.4rem; }
"#;
