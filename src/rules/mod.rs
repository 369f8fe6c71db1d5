//! The constraint catalogue: every hard and soft rostering rule.

pub mod absence;
pub mod hard;
pub mod soft;

use crate::cp::{CpModel, IntVar, LinearExpr};
use crate::input_data::ModelInput;
use crate::universe::{DayRef, EmployeeRef, Universe};

/// One soft rule's contribution: the squared, summed objective part plus the
/// per-employee weighted metric handles used for reporting.
#[derive(Debug, Clone)]
pub struct CostTerm {
    pub label: &'static str,
    pub weight: i64,
    /// Sum over employees of `(weight * metric)^2`.
    pub total: IntVar,
    /// `weight * metric` per employee, in canonical employee order.
    pub per_employee: Vec<(EmployeeRef, IntVar)>,
    /// Reward terms are subtracted from the objective instead of added.
    pub reward: bool,
}

/// `{Team}_{Employee}` tag used in auxiliary variable names.
pub(crate) fn employee_tag(input: &ModelInput, e: EmployeeRef) -> String {
    format!("{}_{}", input.team(e.team), input.employee(e))
}

/// Sum of every work variable of one employee on one day.
pub(crate) fn day_work_sum(
    input: &ModelInput,
    universe: &Universe,
    e: EmployeeRef,
    d: DayRef,
) -> LinearExpr {
    LinearExpr::sum(input.slots_of_day(d).map(|s| universe.work(e, s)))
}

/// Sum of one employee's work variables on one day, restricted to shifts with
/// the given name.
pub(crate) fn day_shift_kind_sum(
    input: &ModelInput,
    universe: &Universe,
    e: EmployeeRef,
    d: DayRef,
    shift_name: &str,
) -> LinearExpr {
    let vars = input
        .day(d)
        .shifts
        .iter()
        .enumerate()
        .filter(|(_, shift)| shift.name == shift_name)
        .flat_map(|(idx, _)| input.slots_of_shift(d, idx))
        .map(|s| universe.work(e, s));
    LinearExpr::sum(vars)
}

/// Sum of every work variable of one employee across the whole horizon.
pub(crate) fn horizon_work_sum(
    input: &ModelInput,
    universe: &Universe,
    e: EmployeeRef,
) -> LinearExpr {
    LinearExpr::sum(input.slots().map(|s| universe.work(e, s)))
}

/// One works/rests Boolean per horizon day for the employee.
pub(crate) fn day_work_indicators(
    model: &mut CpModel,
    input: &ModelInput,
    universe: &Universe,
    e: EmployeeRef,
) -> Vec<crate::cp::BoolVar> {
    let tag = employee_tag(input, e);
    input
        .days()
        .map(|d| {
            let name = format!(
                "help_var_{tag}_works_on_{}_{}",
                input.week(d.week),
                input.day(d)
            );
            let sum = day_work_sum(input, universe, e, d);
            model.indicator_ge(sum, 1, name)
        })
        .collect()
}

/// One Boolean per horizon day: works the named shift kind that day.
pub(crate) fn day_shift_kind_indicators(
    model: &mut CpModel,
    input: &ModelInput,
    universe: &Universe,
    e: EmployeeRef,
    shift_name: &str,
) -> Vec<crate::cp::BoolVar> {
    let tag = employee_tag(input, e);
    input
        .days()
        .map(|d| {
            let name = format!(
                "help_var_{tag}_works_{shift_name}_on_{}_{}",
                input.week(d.week),
                input.day(d)
            );
            let sum = day_shift_kind_sum(input, universe, e, d, shift_name);
            model.indicator_ge(sum, 1, name)
        })
        .collect()
}

/// Transition Booleans over a day-state sequence, including the leading
/// virtual transition for the first day (starting inside a block is not
/// free).
pub(crate) fn transition_vars(
    model: &mut CpModel,
    states: &[crate::cp::BoolVar],
    tag: &str,
) -> Vec<crate::cp::BoolVar> {
    let mut transitions = Vec::with_capacity(states.len());
    for i in 0..states.len().saturating_sub(1) {
        let t = model.transition(
            states[i],
            states[i + 1],
            format!("help_bool_var_transition_{tag}_{i}_{}", i + 1),
        );
        transitions.push(t);
    }
    if let Some(&first) = states.first() {
        transitions.push(first);
    }
    transitions
}
