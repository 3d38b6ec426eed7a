use super::{escape, layout};
use crate::auth::Flash;
use crate::models::{ClassRecord, HistoryRecord, Subject, User};

pub fn render_class_picker(user: &User, flashes: &[Flash], classes: &[ClassRecord]) -> String {
    let target = if user.role.is_staff() {
        "/attendance_history"
    } else {
        "/get_attendance_history"
    };
    let items: String = classes
        .iter()
        .map(|class| {
            format!(
                r#"<li><a href="{target}/{}">{}</a></li>"#,
                class.id,
                escape(&class.label())
            )
        })
        .collect();
    let content = format!(
        r#"<section class="card">
      <h1>Attendance history</h1>
      <p>Pick a class to see every recorded day.</p>
      <ul>{items}</ul>
    </section>"#
    );
    layout("History", Some(user), flashes, &content)
}

pub struct HistoryPage<'a> {
    pub user: &'a User,
    pub flashes: &'a [Flash],
    pub class: &'a ClassRecord,
    pub subjects: &'a [Subject],
    pub subject_id: Option<i64>,
    pub records: &'a [HistoryRecord],
}

fn render_record(page: &HistoryPage<'_>, record: &HistoryRecord) -> String {
    let rows: String = record
        .students
        .iter()
        .map(|student| {
            let (class, status) = match student.present {
                Some(true) => ("present", "Present"),
                Some(false) => ("absent", "Absent"),
                None => ("", "Not marked"),
            };
            format!(
                r#"<tr class="{class}"><td>{}</td><td>{}</td><td>{status}</td></tr>"#,
                escape(&student.reg_no),
                escape(&student.name)
            )
        })
        .collect();
    let subject_id = page.subject_id.map(|id| id.to_string()).unwrap_or_default();
    format!(
        r#"<section class="card">
      <h2>{date}</h2>
      <div class="summary">
        <span>Total <strong>{total}</strong></span>
        <span>Present <strong>{present}</strong></span>
        <span>Absent <strong>{absent}</strong></span>
      </div>
      <table>
        <thead><tr><th>Reg. no</th><th>Name</th><th>Status</th></tr></thead>
        <tbody>{rows}</tbody>
      </table>
      <form method="post" action="/delete_attendance_day">
        <input type="hidden" name="class_id" value="{class_id}" />
        <input type="hidden" name="att_date" value="{date}" />
        <input type="hidden" name="subject_id" value="{subject_id}" />
        <button class="danger" type="submit">Delete this day</button>
      </form>
    </section>"#,
        date = escape(&record.date),
        total = record.summary.total,
        present = record.summary.present,
        absent = record.summary.absent,
        class_id = page.class.id,
    )
}

pub fn render_history(page: &HistoryPage<'_>) -> String {
    let mut subject_options = String::from(r#"<option value="">All day (no subject)</option>"#);
    for subject in page.subjects {
        let marker = if page.subject_id == Some(subject.id) { " selected" } else { "" };
        subject_options.push_str(&format!(
            r#"<option value="{}"{marker}>{}</option>"#,
            subject.id,
            escape(&subject.subject_name)
        ));
    }

    let mut content = format!(
        r#"<section class="card">
      <h1>{label}</h1>
      <form method="get" action="/attendance_history/{id}" class="row">
        <label>Subject <select name="subject_id">{subject_options}</select></label>
        <button type="submit">Filter</button>
      </form>
    </section>"#,
        label = escape(&page.class.label()),
        id = page.class.id,
    );

    if page.records.is_empty() {
        content.push_str(r#"<section class="card"><p>No attendance recorded yet.</p></section>"#);
    }
    for record in page.records {
        content.push_str(&render_record(page, record));
    }
    layout("History", Some(page.user), page.flashes, &content)
}
