//! Soft rostering rules. Each builds a per-employee integer metric `m`,
//! scales it by the rule weight `c`, and contributes `(c*m)^2` per employee
//! to the objective. Squaring penalizes outliers super-linearly, which is
//! what balances the metrics across employees.

use crate::cp::{BoolVar, CpModel, IntVar, LinearExpr};
use crate::input_data::ModelInput;
use crate::rules::{
    day_work_indicators, employee_tag, horizon_work_sum, transition_vars, CostTerm,
};
use crate::universe::{DayRef, EmployeeRef, Universe};

/// Work days should clump into blocks: counts works/rests transitions across
/// the horizon, including a virtual leading transition for day one.
pub fn add_work_block_cohesion(
    model: &mut CpModel,
    input: &ModelInput,
    universe: &Universe,
    cost: i64,
) -> CostTerm {
    let sum_max = input.days().count() as i64 * cost;
    let mut minimize = Vec::new();
    let mut per_employee = Vec::new();
    for e in input.employees() {
        let tag = employee_tag(input, e);
        let works = day_work_indicators(model, input, universe, e);
        let transitions = transition_vars(model, &works, &tag);
        let transitions_sum = model.new_int_var(0, sum_max, format!("transition_sum_{tag}"));
        model.add_equality(transitions_sum, LinearExpr::sum(transitions).scaled(cost));
        let transitions_mul =
            model.new_int_var(0, sum_max * sum_max, format!("transition_mul_{tag}"));
        model.add_multiplication_equality(transitions_mul, transitions_sum, transitions_sum);
        per_employee.push((e, transitions_sum));
        minimize.push(transitions_mul);
    }
    let total = model.new_int_var(
        0,
        sum_max * sum_max * input.employee_count() as i64,
        "minimize_sum_work_in_a_row",
    );
    model.add_equality(total, LinearExpr::sum_ints(minimize));
    CostTerm {
        label: "transitions",
        weight: cost,
        total,
        per_employee,
        reward: false,
    }
}

/// Night-shift days should clump into blocks, same structure as
/// [`add_work_block_cohesion`] but restricted to the night shift.
pub fn add_night_block_cohesion(
    model: &mut CpModel,
    input: &ModelInput,
    universe: &Universe,
    cost: i64,
    night_shift: &str,
) -> CostTerm {
    let sum_max = input.days().count() as i64 * cost;
    let mut minimize = Vec::new();
    let mut per_employee = Vec::new();
    for e in input.employees() {
        let tag = employee_tag(input, e);
        let nights =
            crate::rules::day_shift_kind_indicators(model, input, universe, e, night_shift);
        let transitions = transition_vars(model, &nights, &format!("in_night_shift_{tag}"));
        let transitions_sum =
            model.new_int_var(0, sum_max, format!("transition_sum_night_shifts_{tag}"));
        model.add_equality(transitions_sum, LinearExpr::sum(transitions).scaled(cost));
        let transitions_mul = model.new_int_var(
            0,
            sum_max * sum_max,
            format!("transition_mul_night_shift_{tag}"),
        );
        model.add_multiplication_equality(transitions_mul, transitions_sum, transitions_sum);
        per_employee.push((e, transitions_sum));
        minimize.push(transitions_mul);
    }
    let total = model.new_int_var(
        0,
        sum_max * sum_max * input.employee_count() as i64,
        "minimize_sum_work_in_a_row_night_shifts",
    );
    model.add_equality(total, LinearExpr::sum_ints(minimize));
    CostTerm {
        label: "night transitions",
        weight: cost,
        total,
        per_employee,
        reward: false,
    }
}

/// Night shifts should be spread evenly: the squared per-employee night
/// count equalizes totals.
pub fn add_night_share_balance(
    model: &mut CpModel,
    input: &ModelInput,
    universe: &Universe,
    cost: i64,
    night_shift: &str,
) -> CostTerm {
    let mut minimize = Vec::new();
    let mut per_employee = Vec::new();
    let mut total_max = 0i64;
    for e in input.employees() {
        let tag = employee_tag(input, e);
        let nights: Vec<BoolVar> = night_slot_vars(input, universe, e, night_shift);
        let ub = nights.len() as i64 * cost;
        let amount_sum =
            model.new_int_var(0, ub, format!("help_same_night_shift_amount_sum_{tag}"));
        model.add_equality(amount_sum, LinearExpr::sum(nights).scaled(cost));
        let amount_mul =
            model.new_int_var(0, ub * ub, format!("help_same_night_shift_amount_mul_{tag}"));
        model.add_multiplication_equality(amount_mul, amount_sum, amount_sum);
        total_max += ub * ub;
        per_employee.push((e, amount_sum));
        minimize.push(amount_mul);
    }
    let total = model.new_int_var(0, total_max, "minimize_value_for_same_night_shift_amount");
    model.add_equality(total, LinearExpr::sum_ints(minimize));
    CostTerm {
        label: "night shifts",
        weight: cost,
        total,
        per_employee,
        reward: false,
    }
}

/// Total shifts should be spread evenly across employees.
pub fn add_shift_share_balance(
    model: &mut CpModel,
    input: &ModelInput,
    universe: &Universe,
    cost: i64,
) -> CostTerm {
    let mut minimize = Vec::new();
    let mut per_employee = Vec::new();
    let mut total_max = 0i64;
    for e in input.employees() {
        let tag = employee_tag(input, e);
        let slots = input.slots().count() as i64;
        let ub = slots * cost;
        let amount_sum = model.new_int_var(0, ub, format!("help_same_shift_amount_sum_{tag}"));
        model.add_equality(amount_sum, horizon_work_sum(input, universe, e).scaled(cost));
        let amount_mul =
            model.new_int_var(0, ub * ub, format!("help_same_shift_amount_mul_{tag}"));
        model.add_multiplication_equality(amount_mul, amount_sum, amount_sum);
        total_max += ub * ub;
        per_employee.push((e, amount_sum));
        minimize.push(amount_mul);
    }
    let total = model.new_int_var(0, total_max, "minimize_value_for_same_shift_amount");
    model.add_equality(total, LinearExpr::sum_ints(minimize));
    CostTerm {
        label: "total shifts",
        weight: cost,
        total,
        per_employee,
        reward: false,
    }
}

/// Six- and seven-day work spans are heavily penalized: every 7-day window
/// (stepping by two days) contributes `max(0, worked - 5)`.
pub fn add_long_span_penalty(
    model: &mut CpModel,
    input: &ModelInput,
    universe: &Universe,
    cost: i64,
) -> CostTerm {
    let days: Vec<DayRef> = input.days().collect();
    let mut minimize = Vec::new();
    let mut per_employee = Vec::new();
    let mut total_max = 0i64;
    for e in input.employees() {
        let tag = employee_tag(input, e);
        let mut overtime_vars: Vec<IntVar> = Vec::new();
        let mut unique_index = 0usize;
        let mut start = 0usize;
        while start + 7 <= days.len() {
            let window_sum = LinearExpr::sum(
                days[start..start + 7]
                    .iter()
                    .flat_map(|&d| input.slots_of_day(d))
                    .map(|s| universe.work(e, s)),
            );
            let worked = model.new_int_var(
                0,
                7,
                format!("int_var_help_long_span_{tag}_{unique_index}"),
            );
            model.add_equality(worked, window_sum);
            let over_five = model.indicator_ge(
                LinearExpr::from_int(worked),
                6,
                format!("help_var_more_than_five_{tag}_{unique_index}"),
            );
            let overtime = model.new_int_var(
                0,
                2,
                format!("int_var_help_over_time_{tag}_{unique_index}"),
            );
            model
                .add_eq(LinearExpr::from_int(overtime), 0)
                .only_enforce_if([over_five.not()]);
            let mut diff = LinearExpr::from_int(worked);
            diff.add_int_term(overtime, -1);
            model.add_eq(diff, 5).only_enforce_if([over_five.lit()]);
            overtime_vars.push(overtime);
            unique_index += 1;
            start += 2;
        }
        let ub = 2 * overtime_vars.len() as i64 * cost;
        let span_sum = model.new_int_var(0, ub, format!("help_long_span_sum_{tag}"));
        model.add_equality(span_sum, LinearExpr::sum_ints(overtime_vars).scaled(cost));
        let span_mul = model.new_int_var(0, ub * ub, format!("help_long_span_mul_{tag}"));
        model.add_multiplication_equality(span_mul, span_sum, span_sum);
        total_max += ub * ub;
        per_employee.push((e, span_sum));
        minimize.push(span_mul);
    }
    let total = model.new_int_var(0, total_max, "minimize_value_long_spans");
    model.add_equality(total, LinearExpr::sum_ints(minimize));
    CostTerm {
        label: "long spans",
        weight: cost,
        total,
        per_employee,
        reward: false,
    }
}

/// Headcount minimization for staffing analysis: every open-skill employee
/// that works at all costs `cost`.
pub fn add_headcount_cost(
    model: &mut CpModel,
    input: &ModelInput,
    universe: &Universe,
    cost: i64,
) -> CostTerm {
    let mut minimize = Vec::new();
    let mut per_employee = Vec::new();
    let mut total_max = 0i64;
    for e in input.employees() {
        if input.employee(e).fixed_skills {
            continue;
        }
        let tag = employee_tag(input, e);
        let needed = model.indicator_ge(
            horizon_work_sum(input, universe, e),
            1,
            format!("help_bool_{tag}_is_needed"),
        );
        let needed_cost = model.new_int_var(0, cost, format!("help_headcount_cost_{tag}"));
        model.add_equality(needed_cost, LinearExpr::from_bool(needed).scaled(cost));
        let needed_mul = model.new_int_var(0, cost * cost, format!("help_headcount_mul_{tag}"));
        model.add_multiplication_equality(needed_mul, needed_cost, needed_cost);
        total_max += cost * cost;
        per_employee.push((e, needed_cost));
        minimize.push(needed_mul);
    }
    let total = model.new_int_var(0, total_max, "minimize_value_headcount");
    model.add_equality(total, LinearExpr::sum_ints(minimize));
    CostTerm {
        label: "headcount",
        weight: cost,
        total,
        per_employee,
        reward: false,
    }
}

/// Skill-footprint minimization for staffing analysis: one cost unit per
/// (employee, skill) the roster actually relies on. Declared skills of
/// fixed-skill employees always count.
pub fn add_skill_footprint_cost(
    model: &mut CpModel,
    input: &ModelInput,
    universe: &Universe,
    cost: i64,
) -> CostTerm {
    let mut minimize = Vec::new();
    let mut per_employee = Vec::new();
    let mut total_max = 0i64;
    for e in input.employees() {
        let tag = employee_tag(input, e);
        let employee = input.employee(e);
        let mut has_vars: Vec<BoolVar> = Vec::new();
        for skill in &input.skill_catalog {
            let name = format!("help_bool_{tag}_has_{skill}");
            if employee.fixed_skills {
                let has = model.new_bool_var(name);
                let declared = i64::from(employee.has_skill(skill));
                model.add_eq(LinearExpr::from_bool(has), declared);
                has_vars.push(has);
            } else {
                let uses = LinearExpr::sum(
                    input
                        .slots()
                        .filter(|&s| input.slot_skill(s) == skill)
                        .map(|s| universe.work(e, s)),
                );
                has_vars.push(model.indicator_ge(uses, 1, name));
            }
        }
        let ub = has_vars.len() as i64 * cost;
        let footprint_sum = model.new_int_var(0, ub, format!("help_skill_footprint_sum_{tag}"));
        model.add_equality(footprint_sum, LinearExpr::sum(has_vars).scaled(cost));
        let footprint_mul =
            model.new_int_var(0, ub * ub, format!("help_skill_footprint_mul_{tag}"));
        model.add_multiplication_equality(footprint_mul, footprint_sum, footprint_sum);
        total_max += ub * ub;
        per_employee.push((e, footprint_sum));
        minimize.push(footprint_mul);
    }
    let total = model.new_int_var(0, total_max, "minimize_value_skill_footprint");
    model.add_equality(total, LinearExpr::sum_ints(minimize));
    CostTerm {
        label: "skill footprint",
        weight: cost,
        total,
        per_employee,
        reward: false,
    }
}

/// Dormant reward: an employee should keep the same duty within a week. The
/// squared per-week maximum of same-skill assignments is rewarded. Kept out
/// of both default profiles.
pub fn add_same_duty_reward(
    model: &mut CpModel,
    input: &ModelInput,
    universe: &Universe,
) -> CostTerm {
    let mut maximize = Vec::new();
    let mut total_max = 0i64;
    for (w, week) in input.horizon.decision_weeks().iter().enumerate() {
        let day_count = week.days.len() as i64;
        for e in input.employees() {
            let tag = employee_tag(input, e);
            let mut by_skill: Vec<(String, Vec<BoolVar>)> = Vec::new();
            for (d, day) in week.days.iter().enumerate() {
                for shift_idx in 0..day.shifts.len() {
                    for s in input.slots_of_shift(DayRef { week: w, day: d }, shift_idx) {
                        let label = input.slot_skill(s).label().to_string();
                        let var = universe.work(e, s);
                        match by_skill.iter_mut().find(|(l, _)| *l == label) {
                            Some((_, vars)) => vars.push(var),
                            None => by_skill.push((label, vec![var])),
                        }
                    }
                }
            }
            let mut sums = Vec::with_capacity(by_skill.len());
            for (label, vars) in &by_skill {
                let sum = model.new_int_var(
                    0,
                    day_count,
                    format!("help_var_same_job_a_week_{}_{tag}_{label}", week.name),
                );
                model.add_equality(sum, LinearExpr::sum(vars.iter().copied()));
                sums.push(sum);
            }
            if sums.is_empty() {
                continue;
            }
            let max = model.new_int_var(
                0,
                day_count,
                format!("help_var_same_job_a_week_max_var_{}_{tag}", week.name),
            );
            model.add_max_equality(max, sums);
            let max_mul = model.new_int_var(
                0,
                day_count * day_count,
                format!("help_var_same_job_a_week_max_var_mult_{}_{tag}", week.name),
            );
            model.add_multiplication_equality(max_mul, max, max);
            total_max += day_count * day_count;
            maximize.push(max_mul);
        }
    }
    let total = model.new_int_var(0, total_max, "maximize_value_same_duty");
    model.add_equality(total, LinearExpr::sum_ints(maximize));
    CostTerm {
        label: "same duty",
        weight: 1,
        total,
        per_employee: Vec::new(),
        reward: true,
    }
}

fn night_slot_vars(
    input: &ModelInput,
    universe: &Universe,
    e: EmployeeRef,
    night_shift: &str,
) -> Vec<BoolVar> {
    input
        .slots()
        .filter(|&s| input.shift(s).name == night_shift)
        .map(|s| universe.work(e, s))
        .collect()
}
