use super::{escape, layout};
use crate::auth::Flash;
use crate::models::{Role, Subject, User};
use crate::roster::{RosterController, RosterRow};
use std::collections::HashMap;

/// Keeps row classes, the `#total`/`#present`/`#absent` counters and the
/// `#submitBtn` gate in step with the checkboxes rendered by
/// [`render_attendance`]. Same rules as [`RosterController`].
pub const ROSTER_SCRIPT: &str = r#"
function updateRow(row) {
  const checkbox = row.querySelector('input[type="checkbox"]');
  row.classList.toggle('present', checkbox.checked);
  row.classList.toggle('absent', !checkbox.checked);
}

function updateSummary() {
  const total = document.querySelectorAll('tr[data-reg]').length;
  const present = document.querySelectorAll('input[type="checkbox"]:checked').length;
  document.getElementById('total').textContent = total;
  document.getElementById('present').textContent = present;
  document.getElementById('absent').textContent = total - present;
  document.getElementById('submitBtn').disabled = total === 0;
}

function reloadStudents() {
  document.getElementById('selectForm').submit();
}

document.addEventListener('DOMContentLoaded', () => {
  document.querySelectorAll('tr[data-reg]').forEach((row) => {
    updateRow(row);
    row.querySelector('input[type="checkbox"]').addEventListener('change', () => {
      updateRow(row);
      updateSummary();
    });
  });
  updateSummary();
});
"#;

const SECTIONS: [&str; 4] = ["A", "B", "C", "D"];

pub struct AttendancePage<'a> {
    pub user: &'a User,
    pub flashes: &'a [Flash],
    pub class_num: Option<&'a str>,
    pub section: Option<&'a str>,
    pub class_id: Option<i64>,
    pub subject_id: Option<i64>,
    pub subjects: &'a [Subject],
    pub att_date: &'a str,
    /// Initialized roster for the selection; empty when nothing is selected.
    pub roster: &'a RosterController,
    /// Student row ids by registration number, for the admin delete buttons.
    pub student_ids: &'a HashMap<String, i64>,
}

fn options<'a>(values: impl IntoIterator<Item = String>, selected: Option<&'a str>) -> String {
    let mut values: Vec<String> = values.into_iter().collect();
    if let Some(selected) = selected {
        if !values.iter().any(|value| value == selected) {
            values.push(selected.to_string());
        }
    }
    values
        .iter()
        .map(|value| {
            let marker = if selected == Some(value.as_str()) { " selected" } else { "" };
            let value = escape(value);
            format!(r#"<option value="{value}"{marker}>{value}</option>"#)
        })
        .collect()
}

fn subject_options(subjects: &[Subject], selected: Option<i64>) -> String {
    let mut out = String::from(r#"<option value="">All day (no subject)</option>"#);
    for subject in subjects {
        let marker = if selected == Some(subject.id) { " selected" } else { "" };
        out.push_str(&format!(
            r#"<option value="{}"{marker}>{}</option>"#,
            subject.id,
            escape(&subject.subject_name)
        ));
    }
    out
}

fn render_row(row: &RosterRow, delete_id: Option<i64>) -> String {
    let reg_no = escape(&row.reg_no);
    let class = row.category().map(|category| category.as_str()).unwrap_or("");
    let checked = if row.present() { " checked" } else { "" };
    let delete = delete_id
        .map(|id| {
            format!(
                r#"<button class="danger" type="submit" formaction="/delete_student/{id}" formnovalidate>Delete</button>"#
            )
        })
        .unwrap_or_default();
    format!(
        r#"<tr data-reg="{reg_no}" class="{class}">
          <td><input type="checkbox" name="present[]" value="{reg_no}"{checked} /></td>
          <td>{reg_no}</td>
          <td>{name}</td>
          <td>{delete}</td>
        </tr>"#,
        name = escape(&row.name),
    )
}

pub fn render_attendance(page: &AttendancePage<'_>) -> String {
    let is_admin = page.user.role == Role::Admin;
    let summary = page.roster.summary();
    let disabled = if page.roster.submit_disabled() { " disabled" } else { "" };

    let rows: String = page
        .roster
        .rows()
        .iter()
        .map(|row| {
            let delete_id = is_admin
                .then(|| page.student_ids.get(&row.reg_no).copied())
                .flatten();
            render_row(row, delete_id)
        })
        .collect();

    let class_id = page.class_id.map(|id| id.to_string()).unwrap_or_default();
    let subject_id = page.subject_id.map(|id| id.to_string()).unwrap_or_default();
    let heading = match (page.class_num, page.section, page.class_id) {
        (Some(num), Some(section), Some(_)) => {
            format!("Class {} - {}", escape(num), escape(section))
        }
        (Some(_), Some(_), None) => "Class not found".to_string(),
        _ => "Select a class to load its roster".to_string(),
    };

    let mut content = format!(
        r#"<section class="card">
      <h1>Mark attendance</h1>
      <form id="selectForm" method="post" action="/attendance" class="row">
        <label>Class <select name="class_num" onchange="reloadStudents()">{class_options}</select></label>
        <label>Section <select name="section" onchange="reloadStudents()">{section_options}</select></label>
        <label>Subject <select name="subject_id" onchange="reloadStudents()">{subject_options}</select></label>
        <label>Date <input type="date" name="att_date" value="{att_date}" onchange="reloadStudents()" /></label>
        <button type="submit">Load students</button>
      </form>
    </section>
    <section class="card">
      <h2>{heading}</h2>
      <form id="attendanceForm" method="post" action="/submit_attendance">
        <input type="hidden" name="class_id" value="{class_id}" />
        <input type="hidden" name="subject_id" value="{subject_id}" />
        <input type="hidden" name="att_date" value="{att_date}" />
        <div class="summary">
          <span>Total <strong id="total">{total}</strong></span>
          <span>Present <strong id="present">{present}</strong></span>
          <span>Absent <strong id="absent">{absent}</strong></span>
        </div>
        <table>
          <thead><tr><th>Present</th><th>Reg. no</th><th>Name</th><th></th></tr></thead>
          <tbody>{rows}</tbody>
        </table>
        <button id="submitBtn" type="submit"{disabled}>Submit attendance</button>
      </form>
    </section>"#,
        class_options = options((1..=12).map(|num| num.to_string()), page.class_num),
        section_options = options(SECTIONS.iter().map(|s| s.to_string()), page.section),
        subject_options = subject_options(page.subjects, page.subject_id),
        att_date = escape(page.att_date),
        total = summary.total,
        present = summary.present,
        absent = summary.absent,
    );

    if is_admin {
        content.push_str(&render_admin_tools(page, &class_id));
    }
    content.push_str(&format!("<script>{ROSTER_SCRIPT}</script>"));

    layout("Attendance", Some(page.user), page.flashes, &content)
}

fn render_admin_tools(page: &AttendancePage<'_>, class_id: &str) -> String {
    let num = escape(page.class_num.unwrap_or_default());
    let section = escape(page.section.unwrap_or_default());

    let mut subjects = String::new();
    for subject in page.subjects {
        subjects.push_str(&format!(
            r#"<form class="inline" method="post" action="/delete_subject/{}"><button class="danger" type="submit">Delete {}</button></form> "#,
            subject.id,
            escape(&subject.subject_name)
        ));
    }
    let delete_class = if class_id.is_empty() {
        String::new()
    } else {
        format!(
            r#"<form method="post" action="/delete_class/{class_id}"><button class="danger" type="submit">Delete this class and its records</button></form>"#
        )
    };

    format!(
        r#"<section class="card">
      <h2>Subjects</h2>
      <form method="post" action="/add_subjects" class="row">
        <label>Class <input name="class_num" value="{num}" required /></label>
        <label>Section <input name="section" value="{section}" required /></label>
        <label>Subjects (comma separated) <input name="subjects" required /></label>
        <button type="submit">Add subjects</button>
      </form>
      <div class="row">{subjects}</div>
    </section>
    <section class="card">
      <h2>Add students</h2>
      <form method="post" action="/upload_students" enctype="multipart/form-data" class="row">
        <label>CSV file (Class,Section,Name,RegNo) <input type="file" name="student_file" accept=".csv" required /></label>
        <button type="submit">Upload CSV</button>
      </form>
      <form method="post" action="/submit_student_sheet" class="row">
        <label>Class <input name="sheet_class" value="{num}" required /></label>
        <label>Section <input name="sheet_section" value="{section}" required /></label>
        <label>Students (JSON: [{{"regNo": "...", "studentName": "..."}}])
          <textarea name="student_data" rows="3" cols="48" required></textarea></label>
        <button type="submit">Save students</button>
      </form>
      {delete_class}
    </section>"#
    )
}
