//! Student roster imports: CSV uploads and the JSON sheet posted by the
//! bulk-entry form.

use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvStudent {
    pub row: usize,
    pub class_num: String,
    pub section: String,
    pub name: String,
    pub reg_no: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Row {}: {}", self.row, self.message)
    }
}

#[derive(Debug, Default)]
pub struct CsvParse {
    pub students: Vec<CsvStudent>,
    pub errors: Vec<RowError>,
}

/// Reads `Class,Section,Name,RegNo` rows. Rows are numbered from 1 and every
/// row is data; a header line will simply be imported as a student.
pub fn parse_student_csv<R: Read>(reader: R) -> Result<CsvParse, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut parsed = CsvParse::default();
    for (idx, record) in csv_reader.records().enumerate() {
        let row = idx + 1;
        let record = record?;
        if record.len() < 4 {
            parsed.errors.push(RowError {
                row,
                message: "Invalid format (need: Class,Section,Name,RegNo)".to_string(),
            });
            continue;
        }

        let class_num = record[0].to_string();
        let section = record[1].to_uppercase();
        let name = record[2].to_string();
        let reg_no = record[3].to_string();
        if [&class_num, &section, &name, &reg_no].iter().any(|field| field.is_empty()) {
            parsed.errors.push(RowError {
                row,
                message: "Some fields are empty".to_string(),
            });
            continue;
        }

        parsed.students.push(CsvStudent {
            row,
            class_num,
            section,
            name,
            reg_no,
        });
    }
    Ok(parsed)
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    #[serde(rename = "regNo", default)]
    reg_no: serde_json::Value,
    #[serde(rename = "studentName", default)]
    student_name: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetStudent {
    pub reg_no: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetError {
    InvalidFormat,
    Empty,
}

impl SheetError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "Invalid student data format",
            Self::Empty => "No student data to submit",
        }
    }
}

/// Parses a JSON array of `{regNo, studentName}`. Numbers are accepted for
/// either field; entries with a blank value are skipped.
pub fn parse_student_sheet(json: &str) -> Result<Vec<SheetStudent>, SheetError> {
    let entries: Vec<SheetEntry> =
        serde_json::from_str(json).map_err(|_| SheetError::InvalidFormat)?;
    if entries.is_empty() {
        return Err(SheetError::Empty);
    }

    Ok(entries
        .into_iter()
        .filter_map(|entry| {
            let reg_no = scalar_text(&entry.reg_no);
            let name = scalar_text(&entry.student_name);
            (!reg_no.is_empty() && !name.is_empty()).then_some(SheetStudent { reg_no, name })
        })
        .collect())
}

fn scalar_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.trim().to_string(),
        serde_json::Value::Number(number) => number.to_string(),
        _ => String::new(),
    }
}

/// Shows at most five errors, then how many were left out.
pub fn summarize_errors(errors: &[RowError]) -> String {
    const SHOWN: usize = 5;
    let mut summary = errors
        .iter()
        .take(SHOWN)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    if errors.len() > SHOWN {
        summary.push_str(&format!("... and {} more errors", errors.len() - SHOWN));
    }
    summary
}

/// Splits a comma-separated subject list, dropping blanks.
pub fn split_subjects(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads a registration class such as `10-A`, `10 A` or `10` into a class
/// number and section. The section defaults to `A`.
pub fn parse_class_field(raw: &str) -> Option<(String, String)> {
    let raw = raw.trim();
    let number = raw
        .split('-')
        .next()
        .and_then(|head| head.split_whitespace().next())
        .unwrap_or_default();
    if number.is_empty() {
        return None;
    }
    let section = match raw.split_once('-') {
        Some((_, section)) => section.trim(),
        None => raw.split_whitespace().nth(1).unwrap_or("A"),
    };
    let section = if section.is_empty() { "A" } else { section };
    Some((number.to_string(), section.to_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_rows_are_validated_individually() {
        let data = "5,a,Asha,R-1\n5,B,Ben\n6, ,Cara,R-3\n 7 , c , Dev , R-4 \n";
        let parsed = parse_student_csv(data.as_bytes()).unwrap();

        assert_eq!(
            parsed.students,
            vec![
                CsvStudent {
                    row: 1,
                    class_num: "5".into(),
                    section: "A".into(),
                    name: "Asha".into(),
                    reg_no: "R-1".into(),
                },
                CsvStudent {
                    row: 4,
                    class_num: "7".into(),
                    section: "C".into(),
                    name: "Dev".into(),
                    reg_no: "R-4".into(),
                },
            ]
        );
        assert_eq!(
            parsed.errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec![
                "Row 2: Invalid format (need: Class,Section,Name,RegNo)",
                "Row 3: Some fields are empty",
            ]
        );
    }

    #[test]
    fn sheet_skips_blank_entries() {
        let json = r#"[{"regNo": "A1", "studentName": "Ann"},
                       {"regNo": 42, "studentName": "Num"},
                       {"regNo": "", "studentName": "Nobody"},
                       {"studentName": "Missing"}]"#;
        let students = parse_student_sheet(json).unwrap();
        assert_eq!(
            students,
            vec![
                SheetStudent { reg_no: "A1".into(), name: "Ann".into() },
                SheetStudent { reg_no: "42".into(), name: "Num".into() },
            ]
        );
    }

    #[test]
    fn sheet_rejects_bad_json_and_empty_lists() {
        assert_eq!(parse_student_sheet("not json"), Err(SheetError::InvalidFormat));
        assert_eq!(parse_student_sheet("{}"), Err(SheetError::InvalidFormat));
        assert_eq!(parse_student_sheet("[]"), Err(SheetError::Empty));
    }

    #[test]
    fn error_summary_is_truncated() {
        let errors: Vec<RowError> = (1..=7)
            .map(|row| RowError {
                row,
                message: "bad".into(),
            })
            .collect();
        assert_eq!(
            summarize_errors(&errors),
            "Row 1: bad, Row 2: bad, Row 3: bad, Row 4: bad, Row 5: bad... and 2 more errors"
        );
        assert_eq!(summarize_errors(&errors[..1]), "Row 1: bad");
    }

    #[test]
    fn subject_lists_drop_blanks() {
        assert_eq!(split_subjects(" Math, ,English ,"), vec!["Math", "English"]);
        assert!(split_subjects("  ").is_empty());
    }

    #[test]
    fn class_field_accepts_common_shapes() {
        assert_eq!(parse_class_field("10-B"), Some(("10".into(), "B".into())));
        assert_eq!(parse_class_field("10 c"), Some(("10".into(), "C".into())));
        assert_eq!(parse_class_field("9"), Some(("9".into(), "A".into())));
        assert_eq!(parse_class_field("  "), None);
    }
}
