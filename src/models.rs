use crate::roster::RosterSummary;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Admin => "admin",
        }
    }

    /// Teachers and admins may mark and review attendance.
    pub fn is_staff(self) -> bool {
        matches!(self, Self::Teacher | Self::Admin)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "student" => Ok(Self::Student),
            "teacher" => Ok(Self::Teacher),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassRecord {
    pub id: i64,
    pub class_name: String,
    pub section: String,
}

impl ClassRecord {
    /// The class number without the stored `Class ` prefix.
    pub fn number(&self) -> &str {
        self.class_name
            .strip_prefix("Class ")
            .unwrap_or(&self.class_name)
    }

    pub fn label(&self) -> String {
        format!("{} - {}", self.class_name, self.section)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subject {
    pub id: i64,
    pub subject_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Student {
    #[serde(skip)]
    pub id: i64,
    pub reg_no: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Added,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryStudent {
    pub reg_no: String,
    pub name: String,
    /// `None` when the student has no record for that day.
    pub present: Option<bool>,
    pub att_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryRecord {
    pub date: String,
    pub class_name: String,
    pub section: String,
    pub students: Vec<HistoryStudent>,
    pub summary: RosterSummary,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ClassStudentsResponse {
    pub success: bool,
    pub students: Vec<Student>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum HistoryResponse {
    Found {
        success: bool,
        records: Vec<HistoryRecord>,
    },
    Missing {
        success: bool,
        message: String,
    },
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub register_no: String,
    #[serde(default)]
    pub class: String,
}

#[derive(Debug, Deserialize)]
pub struct AttendanceSelection {
    pub class_num: Option<String>,
    pub section: Option<String>,
    pub subject_id: Option<String>,
    pub att_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddSubjectsForm {
    pub class_id: Option<String>,
    pub class_num: Option<String>,
    pub section: Option<String>,
    #[serde(default)]
    pub subjects: String,
}

#[derive(Debug, Deserialize)]
pub struct StudentSheetForm {
    #[serde(default)]
    pub sheet_class: String,
    #[serde(default)]
    pub sheet_section: String,
    #[serde(default)]
    pub student_data: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteAttendanceDayForm {
    pub class_id: Option<String>,
    pub att_date: Option<String>,
    pub subject_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubjectQuery {
    pub subject_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AttendanceStatusUpdate {
    pub id: i64,
    pub present: bool,
}

/// Optional numeric id from a form or query field. Blank, `None` and
/// non-numeric values all read as absent.
pub fn optional_id(value: Option<&str>) -> Option<i64> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty() && *value != "None")
        .and_then(|value| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_parse_and_classify() {
        assert_eq!("teacher".parse::<Role>(), Ok(Role::Teacher));
        assert!(Role::Admin.is_staff());
        assert!(!Role::Student.is_staff());
        assert!("principal".parse::<Role>().is_err());
    }

    #[test]
    fn optional_id_treats_placeholders_as_missing() {
        assert_eq!(optional_id(None), None);
        assert_eq!(optional_id(Some("")), None);
        assert_eq!(optional_id(Some("None")), None);
        assert_eq!(optional_id(Some("abc")), None);
        assert_eq!(optional_id(Some(" 7 ")), Some(7));
    }

    #[test]
    fn class_number_strips_prefix() {
        let class = ClassRecord {
            id: 1,
            class_name: "Class 10".into(),
            section: "B".into(),
        };
        assert_eq!(class.number(), "10");
        assert_eq!(class.label(), "Class 10 - B");
    }
}
