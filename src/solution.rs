//! Result projection: turn raw engine values into the reported roster,
//! stripped of the shift-cycle coupling week.

use std::collections::BTreeSet;

use serde_json::json;

use crate::cp::Assignment;
use crate::input_data::ModelInput;
use crate::universe::{
    render_absence_key, render_work_key, AbsenceKey, AbsenceKind, DayRef, EmployeeRef, ParsedKey,
    Universe, WorkKey,
};

/// The reported roster: every true decision whose (week, day) lies within
/// the visible horizon, plus the objective value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterSolution {
    pub assignments: BTreeSet<WorkKey>,
    pub absences: BTreeSet<AbsenceKey>,
    pub objective: i64,
}

impl RosterSolution {
    /// Filters a complete engine assignment down to the visible horizon.
    pub fn project(
        input: &ModelInput,
        universe: &Universe,
        assignment: &Assignment,
        objective: i64,
    ) -> Self {
        let visible = input.horizon.visible_count();
        let mut assignments = BTreeSet::new();
        let mut absences = BTreeSet::new();
        for e in input.employees() {
            for slot in input.slots() {
                if slot.week < visible && assignment.bool_value(universe.work(e, slot)) {
                    assignments.insert(WorkKey { employee: e, slot });
                }
            }
            for day in input.days() {
                if day.week >= visible {
                    continue;
                }
                if assignment.bool_value(universe.vacation(e, day)) {
                    absences.insert(AbsenceKey {
                        employee: e,
                        day,
                        kind: AbsenceKind::Vacation,
                    });
                }
                if assignment.bool_value(universe.illness(e, day)) {
                    absences.insert(AbsenceKey {
                        employee: e,
                        day,
                        kind: AbsenceKind::Illness,
                    });
                }
            }
        }
        Self {
            assignments,
            absences,
            objective,
        }
    }

    /// Builds a solution from parsed keys (a read-back grid). Keys on the
    /// coupling week are dropped the same way projection drops them.
    pub fn from_keys(input: &ModelInput, keys: &[ParsedKey], objective: i64) -> Self {
        let visible = input.horizon.visible_count();
        let mut assignments = BTreeSet::new();
        let mut absences = BTreeSet::new();
        for key in keys {
            match *key {
                ParsedKey::Work(k) if k.slot.week < visible => {
                    assignments.insert(k);
                }
                ParsedKey::Absence(k) if k.day.week < visible => {
                    absences.insert(k);
                }
                _ => {}
            }
        }
        Self {
            assignments,
            absences,
            objective,
        }
    }

    /// The canonical textual key set, ordered.
    pub fn rendered_keys(&self, input: &ModelInput) -> BTreeSet<String> {
        let mut keys: BTreeSet<String> = self
            .assignments
            .iter()
            .map(|k| render_work_key(input, k))
            .collect();
        keys.extend(self.absences.iter().map(|k| render_absence_key(input, k)));
        keys
    }

    /// Work assignments of one employee on one day.
    pub fn assignments_on(&self, e: EmployeeRef, d: DayRef) -> Vec<WorkKey> {
        self.assignments
            .iter()
            .filter(|k| k.employee == e && k.slot.day_ref() == d)
            .copied()
            .collect()
    }

    pub fn absence_on(&self, e: EmployeeRef, d: DayRef) -> Option<AbsenceKind> {
        self.absences
            .iter()
            .find(|k| k.employee == e && k.day == d)
            .map(|k| k.kind)
    }

    /// Works/rests pattern over the visible days, in calendar order.
    pub fn worked_pattern(&self, input: &ModelInput, e: EmployeeRef) -> Vec<bool> {
        input
            .visible_days()
            .map(|d| !self.assignments_on(e, d).is_empty())
            .collect()
    }

    /// Same pattern restricted to one shift kind.
    pub fn kind_pattern(&self, input: &ModelInput, e: EmployeeRef, shift_name: &str) -> Vec<bool> {
        input
            .visible_days()
            .map(|d| {
                self.assignments_on(e, d)
                    .iter()
                    .any(|k| input.shift(k.slot).name == shift_name)
            })
            .collect()
    }

    /// Number of assignments of one employee, optionally restricted to a
    /// shift kind.
    pub fn assignment_count(
        &self,
        input: &ModelInput,
        e: EmployeeRef,
        shift_name: Option<&str>,
    ) -> usize {
        self.assignments
            .iter()
            .filter(|k| k.employee == e)
            .filter(|k| shift_name.map_or(true, |name| input.shift(k.slot).name == name))
            .count()
    }

    pub fn to_json(&self, input: &ModelInput) -> serde_json::Value {
        json!({
            "objective": self.objective,
            "assignments": self
                .assignments
                .iter()
                .map(|k| render_work_key(input, k))
                .collect::<Vec<_>>(),
            "absences": self
                .absences
                .iter()
                .map(|k| render_absence_key(input, k))
                .collect::<Vec<_>>(),
        })
    }
}

/// Counts works/rests flips in a day pattern, including the virtual leading
/// transition when the pattern starts inside a block.
pub fn count_transitions(pattern: &[bool]) -> usize {
    let flips = pattern.windows(2).filter(|w| w[0] != w[1]).count();
    flips + usize::from(pattern.first().copied().unwrap_or(false))
}

/// Number of maximal true-runs in a day pattern.
pub fn count_blocks(pattern: &[bool]) -> usize {
    let mut blocks = 0;
    let mut previous = false;
    for &day in pattern {
        if day && !previous {
            blocks += 1;
        }
        previous = day;
    }
    blocks
}
