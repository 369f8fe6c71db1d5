//! Generated absence blocks: vacation and illness quotas arranged as
//! fixed-length consecutive runs, gated by a per-employee "used" indicator.

use std::collections::BTreeSet;

use crate::cp::{BoolVar, CpModel, LinearExpr, Literal};
use crate::input_data::ModelInput;
use crate::rules::{day_work_sum, employee_tag, horizon_work_sum};
use crate::universe::{DayRef, EmployeeRef, Universe};

/// `intervals` blocks of exactly `length` consecutive days each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpec {
    pub intervals: usize,
    pub length: usize,
}

impl BlockSpec {
    pub fn total_days(&self) -> usize {
        self.intervals * self.length
    }
}

/// Per-invocation absence quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbsencePlan {
    pub vacation: BlockSpec,
    pub illness: BlockSpec,
}

/// Employees with any work get exactly the configured vacation and illness
/// blocks; unused employees get none. `exempt` employees (those pinned by a
/// seed) are skipped entirely.
pub fn add_absence_blocks(
    model: &mut CpModel,
    input: &ModelInput,
    universe: &Universe,
    plan: &AbsencePlan,
    exempt: &BTreeSet<EmployeeRef>,
) {
    let days: Vec<DayRef> = input.days().collect();
    for e in input.employees() {
        if exempt.contains(&e) {
            continue;
        }
        let tag = employee_tag(input, e);
        let used = model.indicator_ge(
            horizon_work_sum(input, universe, e),
            1,
            format!("help_bool_{tag}_is_used"),
        );
        let vacation_days: Vec<BoolVar> = days.iter().map(|&d| universe.vacation(e, d)).collect();
        add_kind_blocks(
            model,
            &vacation_days,
            &plan.vacation,
            used,
            &format!("vacation_{tag}"),
        );
        let illness_days: Vec<BoolVar> = days.iter().map(|&d| universe.illness(e, d)).collect();
        add_kind_blocks(
            model,
            &illness_days,
            &plan.illness,
            used,
            &format!("illness_{tag}"),
        );
    }
}

/// Block structure for one absence kind of one employee.
fn add_kind_blocks(
    model: &mut CpModel,
    day_vars: &[BoolVar],
    spec: &BlockSpec,
    used: BoolVar,
    tag: &str,
) {
    let day_sum = LinearExpr::sum(day_vars.iter().copied());
    if spec.intervals == 0 || spec.length == 0 || spec.length > day_vars.len() {
        model.add_eq(day_sum, 0);
        return;
    }

    let length = spec.length;
    let start_count = day_vars.len() - length + 1;
    let starts: Vec<BoolVar> = (0..start_count)
        .map(|d| model.new_bool_var(format!("help_var_{tag}_block_start_{d}")))
        .collect();

    for (d, &start) in starts.iter().enumerate() {
        // A start forces the whole span.
        model
            .add_bool_and((d..d + length).map(|i| day_vars[i].lit()))
            .only_enforce_if([start.lit()]);
        // And excludes another start inside the span.
        let clashing: Vec<Literal> = (d + 1..(d + length).min(start_count))
            .map(|i| starts[i].not())
            .collect();
        if !clashing.is_empty() {
            model.add_bool_and(clashing).only_enforce_if([start.lit()]);
        }
    }

    // Every absence day belongs to some block.
    for (i, &day_var) in day_vars.iter().enumerate() {
        let window: Vec<Literal> = (i.saturating_sub(length - 1)..=i)
            .filter(|&d| d < start_count)
            .map(|d| starts[d].lit())
            .collect();
        model.add_bool_or(window).only_enforce_if([day_var.lit()]);
    }

    let start_sum = LinearExpr::sum(starts.iter().copied());
    model
        .add_eq(day_sum.clone(), spec.total_days() as i64)
        .only_enforce_if([used.lit()]);
    model.add_eq(day_sum, 0).only_enforce_if([used.not()]);
    model
        .add_eq(start_sum.clone(), spec.intervals as i64)
        .only_enforce_if([used.lit()]);
    model.add_eq(start_sum, 0).only_enforce_if([used.not()]);
}

/// No work assignment on a vacation or illness day, for every employee.
pub fn add_absence_work_exclusion(model: &mut CpModel, input: &ModelInput, universe: &Universe) {
    for e in input.employees() {
        for d in input.days() {
            let on_vacation = universe.vacation(e, d);
            model
                .add_eq(day_work_sum(input, universe, e, d), 0)
                .only_enforce_if([on_vacation.lit()]);
            let ill = universe.illness(e, d);
            model
                .add_eq(day_work_sum(input, universe, e, d), 0)
                .only_enforce_if([ill.lit()]);
        }
    }
}

/// A day is at most one of vacation/illness.
pub fn add_vacation_illness_exclusion(
    model: &mut CpModel,
    input: &ModelInput,
    universe: &Universe,
) {
    for e in input.employees() {
        for d in input.days() {
            let mut both = LinearExpr::from_bool(universe.illness(e, d));
            both.add_bool(universe.vacation(e, d));
            model.add_le(both, 1);
        }
    }
}

/// Zeroes the absence variables that no rule manages, so they cannot float:
/// everything except the days pinned manually or by the seed (`free`) and the
/// employees whose absences the block rules decide (`managed`).
pub fn zero_unmanaged_absences(
    model: &mut CpModel,
    input: &ModelInput,
    universe: &Universe,
    managed: &BTreeSet<EmployeeRef>,
    free: &BTreeSet<(EmployeeRef, DayRef)>,
) {
    for e in input.employees() {
        if managed.contains(&e) {
            continue;
        }
        for d in input.days() {
            if free.contains(&(e, d)) {
                continue;
            }
            model.add_eq(LinearExpr::from_bool(universe.vacation(e, d)), 0);
            model.add_eq(LinearExpr::from_bool(universe.illness(e, d)), 0);
        }
    }
}
