//! Attendance roster view model.
//!
//! A [`RosterController`] owns one [`RosterRow`] per student shown for a
//! class/date and keeps every row's category and the [`RosterSummary`]
//! consistent with the presence flags. Events are applied one at a time
//! through [`RosterController::dispatch`]; each runs to completion before the
//! next one is accepted.
//!
//! The server uses the controller both to render the initial marking page and
//! to turn a posted form into a full set of [`AttendanceMark`]s. The browser
//! script in `ui::attendance` applies the same rules to the rendered table.

use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Present,
    Absent,
}

impl Category {
    pub fn of(present: bool) -> Self {
        if present { Self::Present } else { Self::Absent }
    }

    /// CSS class applied to the row.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRow {
    pub reg_no: String,
    pub name: String,
    present: bool,
    category: Option<Category>,
}

impl RosterRow {
    pub fn new(reg_no: impl Into<String>, name: impl Into<String>, present: bool) -> Self {
        Self {
            reg_no: reg_no.into(),
            name: name.into(),
            present,
            category: None,
        }
    }

    pub fn present(&self) -> bool {
        self.present
    }

    /// `None` until the row has been classified at least once.
    pub fn category(&self) -> Option<Category> {
        self.category
    }

    fn classify(&mut self) {
        self.category = Some(Category::of(self.present));
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RosterSummary {
    pub total: usize,
    pub present: usize,
    pub absent: usize,
}

impl RosterSummary {
    pub fn from_flags<I>(flags: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let (total, present) = flags
            .into_iter()
            .fold((0usize, 0usize), |(total, present), flag| {
                (total + 1, present + usize::from(flag))
            });
        Self {
            total,
            present,
            absent: total - present,
        }
    }

    pub fn submit_allowed(&self) -> bool {
        self.total > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceMark {
    pub reg_no: String,
    pub present: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Init,
    Toggle(String),
    SubmitRequested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    /// One mark per row, in roster order.
    Submit(Vec<AttendanceMark>),
    /// Submission was requested on an empty roster.
    Blocked,
}

#[derive(Debug, Clone, Default)]
pub struct RosterController {
    rows: Vec<RosterRow>,
    summary: RosterSummary,
}

impl RosterController {
    pub fn new(rows: Vec<RosterRow>) -> Self {
        Self {
            rows,
            summary: RosterSummary::default(),
        }
    }

    /// Builds and initializes a roster from a submitted form: every student
    /// starts unchecked and each one listed in `present` is toggled once.
    /// Registration numbers that are not on the roster are ignored.
    pub fn from_submission<'a, I>(students: I, present: &HashSet<String>) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let rows = students
            .into_iter()
            .map(|(reg_no, name)| RosterRow::new(reg_no, name, false))
            .collect();
        let mut controller = Self::new(rows);
        controller.dispatch(Message::Init);

        let checked: Vec<String> = controller
            .rows
            .iter()
            .filter(|row| present.contains(&row.reg_no))
            .map(|row| row.reg_no.clone())
            .collect();
        for reg_no in checked {
            controller.dispatch(Message::Toggle(reg_no));
        }
        controller
    }

    pub fn dispatch(&mut self, message: Message) -> Effect {
        match message {
            Message::Init => {
                for row in &mut self.rows {
                    row.classify();
                }
                self.recompute();
                Effect::None
            }
            Message::Toggle(reg_no) => {
                self.toggle(&reg_no);
                self.recompute();
                Effect::None
            }
            Message::SubmitRequested => {
                if self.summary.submit_allowed() {
                    Effect::Submit(self.marks())
                } else {
                    Effect::Blocked
                }
            }
        }
    }

    /// # Panics
    ///
    /// Panics if no row carries `reg_no`. Toggles only originate from rows
    /// the controller rendered, so an unknown id means the page and the
    /// roster disagree.
    fn toggle(&mut self, reg_no: &str) {
        let Some(row) = self.rows.iter_mut().find(|row| row.reg_no == reg_no) else {
            panic!("toggle for registration {reg_no:?} which is not on the roster");
        };
        row.present = !row.present;
        row.classify();
    }

    fn recompute(&mut self) {
        self.summary = RosterSummary::from_flags(self.rows.iter().map(RosterRow::present));
    }

    pub fn rows(&self) -> &[RosterRow] {
        &self.rows
    }

    pub fn summary(&self) -> RosterSummary {
        self.summary
    }

    pub fn submit_disabled(&self) -> bool {
        !self.summary.submit_allowed()
    }

    pub fn marks(&self) -> Vec<AttendanceMark> {
        self.rows
            .iter()
            .map(|row| AttendanceMark {
                reg_no: row.reg_no.clone(),
                present: row.present,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(flags: &[bool]) -> RosterController {
        let rows = flags
            .iter()
            .enumerate()
            .map(|(idx, flag)| RosterRow::new(format!("REG-{idx}"), format!("Student {idx}"), *flag))
            .collect();
        let mut controller = RosterController::new(rows);
        controller.dispatch(Message::Init);
        controller
    }

    fn assert_rows_classified(controller: &RosterController) {
        for row in controller.rows() {
            assert_eq!(row.category(), Some(Category::of(row.present())), "{}", row.reg_no);
        }
    }

    #[test]
    fn three_unchecked_rows_are_all_absent() {
        let controller = roster(&[false, false, false]);
        assert_eq!(
            controller.summary(),
            RosterSummary { total: 3, present: 0, absent: 3 }
        );
        assert!(!controller.submit_disabled());
        assert_rows_classified(&controller);
    }

    #[test]
    fn empty_roster_blocks_submission() {
        let mut controller = roster(&[]);
        assert_eq!(controller.summary(), RosterSummary::default());
        assert!(controller.submit_disabled());
        assert_eq!(controller.dispatch(Message::SubmitRequested), Effect::Blocked);
    }

    #[test]
    fn checking_two_of_four_splits_evenly() {
        let mut controller = roster(&[false, false, false, false]);
        controller.dispatch(Message::Toggle("REG-1".into()));
        controller.dispatch(Message::Toggle("REG-3".into()));

        assert_eq!(
            controller.summary(),
            RosterSummary { total: 4, present: 2, absent: 2 }
        );
        let categories: Vec<_> = controller.rows().iter().filter_map(RosterRow::category).collect();
        assert_eq!(
            categories,
            vec![Category::Absent, Category::Present, Category::Absent, Category::Present]
        );
    }

    #[test]
    fn unchecking_flips_row_and_decrements_present() {
        let mut controller = roster(&[true, true, false]);
        let before = controller.summary();

        controller.dispatch(Message::Toggle("REG-0".into()));

        let after = controller.summary();
        assert_eq!(after.present, before.present - 1);
        assert_eq!(after.absent, before.absent + 1);
        assert_eq!(controller.rows()[0].category(), Some(Category::Absent));
        assert_rows_classified(&controller);
    }

    #[test]
    fn summary_invariants_hold_after_every_toggle() {
        let mut controller = roster(&[false, true, false, true, true]);
        for reg_no in ["REG-0", "REG-4", "REG-2", "REG-0", "REG-1"] {
            controller.dispatch(Message::Toggle(reg_no.into()));
            let summary = controller.summary();
            let checked = controller.rows().iter().filter(|row| row.present()).count();
            assert_eq!(summary.total, 5);
            assert_eq!(summary.present, checked);
            assert_eq!(summary.present + summary.absent, summary.total);
            assert_rows_classified(&controller);
        }
    }

    #[test]
    fn recompute_is_idempotent() {
        let mut controller = roster(&[true, false]);
        controller.recompute();
        let first = controller.summary();
        controller.recompute();
        assert_eq!(controller.summary(), first);
    }

    #[test]
    fn submit_allowed_regardless_of_split() {
        for flags in [[false, false], [true, false], [true, true]] {
            let mut controller = roster(&flags);
            match controller.dispatch(Message::SubmitRequested) {
                Effect::Submit(marks) => assert_eq!(marks.len(), 2),
                other => panic!("unexpected effect {other:?}"),
            }
        }
    }

    #[test]
    fn rows_are_unclassified_until_init() {
        let controller = RosterController::new(vec![RosterRow::new("A", "a", true)]);
        assert_eq!(controller.rows()[0].category(), None);
        assert_eq!(controller.summary().total, 0);
    }

    #[test]
    fn submission_ignores_unknown_registrations() {
        let present: HashSet<String> = ["B".to_string(), "ZZZ".to_string()].into_iter().collect();
        let mut controller =
            RosterController::from_submission([("A", "Ann"), ("B", "Bob"), ("C", "Cy")], &present);

        assert_eq!(
            controller.summary(),
            RosterSummary { total: 3, present: 1, absent: 2 }
        );
        let Effect::Submit(marks) = controller.dispatch(Message::SubmitRequested) else {
            panic!("submission blocked");
        };
        assert_eq!(
            marks,
            vec![
                AttendanceMark { reg_no: "A".into(), present: false },
                AttendanceMark { reg_no: "B".into(), present: true },
                AttendanceMark { reg_no: "C".into(), present: false },
            ]
        );
    }

    #[test]
    #[should_panic(expected = "not on the roster")]
    fn toggling_unknown_row_fails_fast() {
        let mut controller = roster(&[false]);
        controller.dispatch(Message::Toggle("missing".into()));
    }
}
