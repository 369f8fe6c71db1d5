//! Hard rostering rules. Every function posts constraints over the full
//! decision horizon, including the shift-cycle coupling week.

use crate::cp::{BoolVar, CpModel, LinearExpr};
use crate::error::RosterError;
use crate::input_data::ModelInput;
use crate::rules::{day_shift_kind_indicators, employee_tag, transition_vars};
use crate::universe::{DayRef, EmployeeRef, SlotRef, Universe};

/// Every required skill slot of every shift is filled by exactly one
/// employee.
pub fn add_full_coverage(model: &mut CpModel, input: &ModelInput, universe: &Universe) {
    for slot in input.slots() {
        let literals: Vec<_> = input
            .employees()
            .map(|e| universe.work(e, slot).lit())
            .collect();
        model.add_exactly_one(literals);
    }
}

/// At most one (shift, slot) assignment per employee per day.
pub fn add_one_assignment_per_day(model: &mut CpModel, input: &ModelInput, universe: &Universe) {
    for e in input.employees() {
        for d in input.days() {
            let literals: Vec<_> = input
                .slots_of_day(d)
                .map(|s| universe.work(e, s).lit())
                .collect();
            model.add_at_most_one(literals);
        }
    }
}

/// Fixed-skill employees never fill slots outside their declared skill set.
pub fn add_skill_eligibility(model: &mut CpModel, input: &ModelInput, universe: &Universe) {
    for e in input.employees() {
        let employee = input.employee(e);
        if !employee.fixed_skills {
            continue;
        }
        for slot in input.slots() {
            if !employee.has_skill(input.slot_skill(slot)) {
                model.add_eq(LinearExpr::from_bool(universe.work(e, slot)), 0);
            }
        }
    }
}

/// No two distinct teams both contribute to the same (week, day, shift).
pub fn add_team_exclusivity(model: &mut CpModel, input: &ModelInput, universe: &Universe) {
    for i in 0..input.teams.len() {
        for j in i + 1..input.teams.len() {
            for e1 in 0..input.teams[i].employees.len() {
                for e2 in 0..input.teams[j].employees.len() {
                    let first = EmployeeRef {
                        team: i,
                        employee: e1,
                    };
                    let second = EmployeeRef {
                        team: j,
                        employee: e2,
                    };
                    for d in input.days() {
                        for shift in 0..input.day(d).shifts.len() {
                            let slots: Vec<SlotRef> = input.slots_of_shift(d, shift).collect();
                            for &s1 in &slots {
                                for &s2 in &slots {
                                    model.add_bool_or([
                                        universe.work(first, s1).not(),
                                        universe.work(second, s2).not(),
                                    ]);
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// At most five assignments per employee per calendar week.
pub fn add_weekly_workload_cap(model: &mut CpModel, input: &ModelInput, universe: &Universe) {
    for e in input.employees() {
        let tag = employee_tag(input, e);
        for (w, week) in input.horizon.decision_weeks().iter().enumerate() {
            let sum = LinearExpr::sum(
                (0..week.days.len())
                    .flat_map(|d| input.slots_of_day(DayRef { week: w, day: d }))
                    .map(|s| universe.work(e, s)),
            );
            let days_worked = model.new_int_var(0, 7, format!("{tag}_days_worked_in_{week}"));
            model.add_le(LinearExpr::from_int(days_worked), 5);
            model.add_equality(days_worked, sum);
        }
    }
}

/// At most five assignments in any six consecutive days.
pub fn add_six_day_window_cap(model: &mut CpModel, input: &ModelInput, universe: &Universe) {
    let days: Vec<DayRef> = input.days().collect();
    for e in input.employees() {
        let tag = employee_tag(input, e);
        let mut unique_index = 0;
        for window in days.windows(6) {
            let sum = LinearExpr::sum(
                window
                    .iter()
                    .flat_map(|&d| input.slots_of_day(d))
                    .map(|s| universe.work(e, s)),
            );
            let worked = model.new_int_var(
                0,
                6,
                format!("int_var_help_five_days_a_row_{tag}_{unique_index}"),
            );
            unique_index += 1;
            model.add_equality(worked, sum);
            model.add_le(LinearExpr::from_int(worked), 5);
        }
    }
}

/// Within one week an employee works a single shift kind only.
pub fn add_single_shift_kind_week(model: &mut CpModel, input: &ModelInput, universe: &Universe) {
    let mut unique_key = 1usize;
    for (w, week) in input.horizon.decision_weeks().iter().enumerate() {
        for e in input.employees() {
            let tag = employee_tag(input, e);
            let mut kinds: Vec<(String, Vec<BoolVar>)> = Vec::new();
            for (d, day) in week.days.iter().enumerate() {
                for (shift_idx, shift) in day.shifts.iter().enumerate() {
                    let vars: Vec<BoolVar> = input
                        .slots_of_shift(DayRef { week: w, day: d }, shift_idx)
                        .map(|s| universe.work(e, s))
                        .collect();
                    match kinds.iter_mut().find(|(name, _)| *name == shift.name) {
                        Some((_, existing)) => existing.extend(vars),
                        None => kinds.push((shift.name.clone(), vars)),
                    }
                }
            }
            for (name1, vars1) in &kinds {
                for (name2, vars2) in &kinds {
                    if name1 == name2 {
                        continue;
                    }
                    let works_kind = model.indicator_ge(
                        LinearExpr::sum(vars1.iter().copied()),
                        1,
                        format!("bool_help_{name1}_{week}_{tag}_{unique_key}"),
                    );
                    unique_key += 1;
                    model
                        .add_bool_and(vars2.iter().map(|v| v.not()))
                        .only_enforce_if([works_kind.lit()]);
                }
            }
        }
    }
}

/// At least two shift slots separate consecutive assignments of the same
/// employee. Windows stop at the horizon boundary; they do not wrap.
pub fn add_two_shift_rest(model: &mut CpModel, input: &ModelInput, universe: &Universe) {
    let positions: Vec<(DayRef, usize)> = input
        .days()
        .flat_map(|d| (0..input.day(d).shifts.len()).map(move |s| (d, s)))
        .collect();
    for e in input.employees() {
        for i in 0..positions.len() {
            for j in i + 1..(i + 3).min(positions.len()) {
                let (day_i, shift_i) = positions[i];
                let (day_j, shift_j) = positions[j];
                for s1 in input.slots_of_shift(day_i, shift_i) {
                    for s2 in input.slots_of_shift(day_j, shift_j) {
                        model
                            .add_eq(LinearExpr::from_bool(universe.work(e, s2)), 0)
                            .only_enforce_if([universe.work(e, s1).lit()]);
                    }
                }
            }
        }
    }
}

/// If anyone on a team works shift kind X in week k, the whole team works
/// only `next(X)` in week k+1, rotating through `cycle`.
pub fn add_shift_cycle(
    model: &mut CpModel,
    input: &ModelInput,
    universe: &Universe,
    cycle: &[String],
) {
    let weeks = input.horizon.decision_weeks();
    for (t, team) in input.teams.iter().enumerate() {
        for i in 0..weeks.len().saturating_sub(1) {
            for (pos, shift_name) in cycle.iter().enumerate() {
                let current: Vec<BoolVar> = week_kind_vars(input, universe, t, i, |name| {
                    name == shift_name.as_str()
                });
                let works_kind = model.indicator_ge(
                    LinearExpr::sum(current),
                    1,
                    format!("help_bool_shift_cycle_{}_{}_{shift_name}", team, weeks[i]),
                );
                let next = &cycle[(pos + 1) % cycle.len()];
                let off_cycle: Vec<BoolVar> =
                    week_kind_vars(input, universe, t, i + 1, |name| name != next.as_str());
                model
                    .add_eq(LinearExpr::sum(off_cycle), 0)
                    .only_enforce_if([works_kind.lit()]);
            }
        }
    }
}

/// All work variables of one team in one week whose shift name matches the
/// filter.
fn week_kind_vars(
    input: &ModelInput,
    universe: &Universe,
    team: usize,
    week: usize,
    matches: impl Fn(&str) -> bool,
) -> Vec<BoolVar> {
    let mut vars = Vec::new();
    for (d, day) in input.week(week).days.iter().enumerate() {
        for e in 0..input.teams[team].employees.len() {
            let employee = EmployeeRef { team, employee: e };
            for (shift_idx, shift) in day.shifts.iter().enumerate() {
                if !matches(&shift.name) {
                    continue;
                }
                for s in input.slots_of_shift(DayRef { week, day: d }, shift_idx) {
                    vars.push(universe.work(employee, s));
                }
            }
        }
    }
    vars
}

/// Every team has at least one shift manager with an assignment on every
/// day.
pub fn add_manager_presence(model: &mut CpModel, input: &ModelInput, universe: &Universe) {
    for (t, team) in input.teams.iter().enumerate() {
        let managers: Vec<usize> = team.shift_managers().map(|(idx, _)| idx).collect();
        for d in input.days() {
            let literals: Vec<_> = managers
                .iter()
                .flat_map(|&m| {
                    let e = EmployeeRef {
                        team: t,
                        employee: m,
                    };
                    input
                        .slots_of_day(d)
                        .map(move |s| universe.work(e, s).lit())
                })
                .collect();
            model.add_at_least_one(literals);
        }
    }
}

/// At most one contiguous block of night-shift days per employee over the
/// horizon. Working the night shift on day one counts as a transition, so
/// starting inside a block is not free.
pub fn add_night_block_limit(
    model: &mut CpModel,
    input: &ModelInput,
    universe: &Universe,
    night_shift: &str,
) {
    for e in input.employees() {
        let nights = day_shift_kind_indicators(model, input, universe, e, night_shift);
        let tag = format!("night_block_{}", employee_tag(input, e));
        let transitions = transition_vars(model, &nights, &tag);
        model.add_le(LinearExpr::sum(transitions), 2);
    }
}

/// A manually pinned absence: the employee does not work the listed days and
/// each of them is exactly one of vacation/illness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualAbsence {
    pub team: String,
    pub employee: String,
    /// `(week name, day name)` pairs.
    pub days: Vec<(String, String)>,
}

/// Applies the manual pins and returns the affected (employee, day) pairs so
/// the caller can leave their absence variables free.
pub fn add_manual_absences(
    model: &mut CpModel,
    input: &ModelInput,
    universe: &Universe,
    pins: &[ManualAbsence],
) -> Result<Vec<(EmployeeRef, DayRef)>, RosterError> {
    let mut pinned = Vec::new();
    for pin in pins {
        let team = input
            .find_team(&pin.team)
            .ok_or_else(|| RosterError::UnknownPinTarget {
                what: "team",
                name: pin.team.clone(),
            })?;
        let e = input.find_employee(team, &pin.employee).ok_or_else(|| {
            RosterError::UnknownPinTarget {
                what: "employee",
                name: pin.employee.clone(),
            }
        })?;
        for (week_name, day_name) in &pin.days {
            let week = input
                .horizon
                .decision_weeks()
                .iter()
                .position(|w| &w.name == week_name)
                .ok_or_else(|| RosterError::UnknownPinTarget {
                    what: "week",
                    name: week_name.clone(),
                })?;
            let day = input
                .week(week)
                .days
                .iter()
                .position(|d| &d.name == day_name)
                .ok_or_else(|| RosterError::UnknownPinTarget {
                    what: "day",
                    name: day_name.clone(),
                })?;
            let d = DayRef { week, day };
            for s in input.slots_of_day(d) {
                model.add_eq(LinearExpr::from_bool(universe.work(e, s)), 0);
            }
            let mut either = LinearExpr::from_bool(universe.vacation(e, d));
            either.add_bool(universe.illness(e, d));
            model.add_eq(either, 1);
            pinned.push((e, d));
        }
    }
    Ok(pinned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::{Assignment, Constraint};
    use crate::domain::{Day, Employee, PlanningHorizon, Shift, Skill, Team};
    use crate::input_data::ModelInput;

    fn skill(label: &str) -> Skill {
        Skill::new(label)
    }

    /// One team, three employees, one visible week of `days` days with
    /// shifts M/A/N requiring one `MO:M1` slot each.
    fn tiny_input(days: usize) -> ModelInput {
        let templates: Vec<Day> = (0..days)
            .map(|d| {
                Day::new(
                    crate::input_data::WEEKDAYS[d % 7],
                    vec![
                        Shift::new("M", vec![skill("MO:M1")]),
                        Shift::new("A", vec![skill("MO:M1")]),
                        Shift::new("N", vec![skill("MO:M1")]),
                    ],
                )
            })
            .collect();
        let horizon = PlanningHorizon::from_templates(&templates, 1);
        let team = Team::new(
            "Team1",
            vec![
                Employee::new("P1", vec![skill("MO:M1")]).shift_manager(),
                Employee::new("P2", vec![skill("MO:M1")]),
                Employee::new("P3", vec![skill("MO:M1")]),
            ],
        );
        ModelInput::new(horizon, vec![team], vec![skill("MO:M1"), skill("H:M2")]).unwrap()
    }

    fn built(input: &ModelInput) -> (CpModel, Universe) {
        let mut model = CpModel::new();
        let universe = Universe::build(&mut model, input);
        (model, universe)
    }

    #[test]
    fn coverage_posts_exactly_one_per_slot() {
        let input = tiny_input(2);
        let (mut model, universe) = built(&input);
        add_full_coverage(&mut model, &input, &universe);

        let slots = input.slots().count();
        assert_eq!(model.stats().exactly_one, slots);
        for c in model.constraints() {
            match c {
                Constraint::ExactlyOne { literals } => assert_eq!(literals.len(), 3),
                _ => panic!("unexpected constraint {c:?}"),
            }
        }
    }

    #[test]
    fn eligibility_zeroes_only_unqualified_slots() {
        let mut input = tiny_input(2);
        // P3 loses the skill; P2 keeps it but with open skills.
        input.teams[0].employees[2].skills = vec![skill("H:M2")];
        input.teams[0].employees[1].fixed_skills = false;
        input.teams[0].employees[1].skills = vec![];
        let (mut model, universe) = built(&input);
        add_skill_eligibility(&mut model, &input, &universe);

        // Only P3 is pinned to zero, on every slot of the decision horizon.
        let slots = input.slots().count();
        assert_eq!(model.stats().linear, slots);
    }

    #[test]
    fn weekly_cap_accepts_five_and_rejects_six() {
        let input = tiny_input(7);
        let (mut model, universe) = built(&input);
        add_weekly_workload_cap(&mut model, &input, &universe);

        let e = EmployeeRef {
            team: 0,
            employee: 0,
        };
        let mut assignment = Assignment::zeroed(&model);
        for d in 0..5 {
            assignment.set_bool(
                universe.work(
                    e,
                    SlotRef {
                        week: 0,
                        day: d,
                        shift: 0,
                        slot: 0,
                    },
                ),
                true,
            );
        }
        // One <= and one == per (employee, week).
        assert_eq!(model.stats().linear, 3 * 2 * 2);

        let mut ok = assignment.clone();
        set_week_counters(&universe, &input, &mut ok);
        assert!(model.check(&ok).is_empty());

        assignment.set_bool(
            universe.work(
                e,
                SlotRef {
                    week: 0,
                    day: 5,
                    shift: 0,
                    slot: 0,
                },
            ),
            true,
        );
        let mut bad = assignment.clone();
        set_week_counters(&universe, &input, &mut bad);
        assert!(!model.check(&bad).is_empty());
    }

    /// Sets every `days_worked` helper to the actual sum so only the cap can
    /// fail. The helpers are created right after the universe, employee by
    /// employee then week by week.
    fn set_week_counters(universe: &Universe, input: &ModelInput, assignment: &mut Assignment) {
        let mut int_id = universe.work_var_count() + universe.absence_var_count();
        for e in input.employees() {
            for (w, week) in input.horizon.decision_weeks().iter().enumerate() {
                let worked: i64 = (0..week.days.len())
                    .flat_map(|d| input.slots_of_day(DayRef { week: w, day: d }))
                    .filter(|&s| assignment.bool_value(universe.work(e, s)))
                    .count() as i64;
                assignment.set_int(crate::cp::IntVar::from_index(int_id), worked);
                int_id += 1;
            }
        }
    }

    #[test]
    fn two_shift_rest_blocks_adjacent_positions() {
        let input = tiny_input(2);
        let (mut model, universe) = built(&input);
        add_two_shift_rest(&mut model, &input, &universe);

        let e = EmployeeRef {
            team: 0,
            employee: 0,
        };
        let morning = SlotRef {
            week: 0,
            day: 0,
            shift: 0,
            slot: 0,
        };
        let afternoon = SlotRef {
            week: 0,
            day: 0,
            shift: 1,
            slot: 0,
        };
        let night = SlotRef {
            week: 0,
            day: 0,
            shift: 2,
            slot: 0,
        };
        let mut assignment = Assignment::zeroed(&model);
        assignment.set_bool(universe.work(e, morning), true);
        assignment.set_bool(universe.work(e, afternoon), true);
        assert!(!model.check(&assignment).is_empty());

        // One slot apart is still too close.
        let mut close = Assignment::zeroed(&model);
        close.set_bool(universe.work(e, morning), true);
        close.set_bool(universe.work(e, night), true);
        assert!(!model.check(&close).is_empty());

        // Three positions apart (next day's morning) is allowed.
        let next_morning = SlotRef {
            week: 0,
            day: 1,
            shift: 0,
            slot: 0,
        };
        let mut spaced = Assignment::zeroed(&model);
        spaced.set_bool(universe.work(e, morning), true);
        spaced.set_bool(universe.work(e, next_morning), true);
        assert!(model.check(&spaced).is_empty());
    }

    #[test]
    fn rest_windows_do_not_wrap_around_the_horizon() {
        let input = tiny_input(1);
        let (mut model, universe) = built(&input);
        add_two_shift_rest(&mut model, &input, &universe);

        let e = EmployeeRef {
            team: 0,
            employee: 0,
        };
        // Last position of the horizon plus the first: legal, no wrap.
        let days: Vec<DayRef> = input.days().collect();
        let last_day = *days.last().unwrap();
        let first = SlotRef {
            week: 0,
            day: 0,
            shift: 0,
            slot: 0,
        };
        let last = SlotRef {
            week: last_day.week,
            day: last_day.day,
            shift: 2,
            slot: 0,
        };
        let mut assignment = Assignment::zeroed(&model);
        assignment.set_bool(universe.work(e, first), true);
        assignment.set_bool(universe.work(e, last), true);
        assert!(model.check(&assignment).is_empty());
    }

    #[test]
    fn manager_presence_covers_every_day() {
        let input = tiny_input(3);
        let (mut model, universe) = built(&input);
        add_manager_presence(&mut model, &input, &universe);

        let days = input.days().count();
        assert_eq!(model.stats().at_least_one, days);
        // P1 is the only manager: three shifts, one slot each.
        for c in model.constraints() {
            if let Constraint::AtLeastOne { literals } = c {
                assert_eq!(literals.len(), 3);
            }
        }
        let _ = universe;
    }

    #[test]
    fn manual_absence_resolves_and_pins() {
        let input = tiny_input(3);
        let (mut model, universe) = built(&input);
        let pins = vec![ManualAbsence {
            team: "Team1".into(),
            employee: "P2".into(),
            days: vec![("Week1".into(), "Tu".into())],
        }];
        let pinned = add_manual_absences(&mut model, &input, &universe, &pins).unwrap();
        assert_eq!(pinned.len(), 1);

        let e = pinned[0].0;
        let d = pinned[0].1;
        let mut assignment = Assignment::zeroed(&model);
        assignment.set_bool(universe.vacation(e, d), true);
        assert!(model.check(&assignment).is_empty());

        let unknown = vec![ManualAbsence {
            team: "Team9".into(),
            employee: "P2".into(),
            days: vec![],
        }];
        assert!(add_manual_absences(&mut model, &input, &universe, &unknown).is_err());
    }

    /// Two teams of two, one-day template with single-slot M and A shifts.
    fn two_team_input() -> ModelInput {
        let templates = vec![Day::new(
            "Mo",
            vec![
                Shift::new("M", vec![skill("MO:M1")]),
                Shift::new("A", vec![skill("MO:M1")]),
            ],
        )];
        let horizon = PlanningHorizon::from_templates(&templates, 1);
        let teams = vec![
            Team::new(
                "Team1",
                vec![
                    Employee::new("P1", vec![skill("MO:M1")]).shift_manager(),
                    Employee::new("P2", vec![skill("MO:M1")]),
                ],
            ),
            Team::new(
                "Team2",
                vec![
                    Employee::new("P3", vec![skill("MO:M1")]).shift_manager(),
                    Employee::new("P4", vec![skill("MO:M1")]),
                ],
            ),
        ];
        ModelInput::new(horizon, teams, vec![skill("MO:M1")]).unwrap()
    }

    #[test]
    fn team_exclusivity_rejects_mixed_teams_on_one_shift() {
        let input = two_team_input();
        let (mut model, universe) = built(&input);
        add_team_exclusivity(&mut model, &input, &universe);

        let p1 = EmployeeRef {
            team: 0,
            employee: 0,
        };
        let p2 = EmployeeRef {
            team: 0,
            employee: 1,
        };
        let p3 = EmployeeRef {
            team: 1,
            employee: 0,
        };
        let morning = SlotRef {
            week: 0,
            day: 0,
            shift: 0,
            slot: 0,
        };
        let afternoon = SlotRef {
            week: 0,
            day: 0,
            shift: 1,
            slot: 0,
        };

        // Two teams on the same shift break the model.
        let mut mixed = Assignment::zeroed(&model);
        mixed.set_bool(universe.work(p1, morning), true);
        mixed.set_bool(universe.work(p3, morning), true);
        assert!(!model.check(&mixed).is_empty());

        // The same team works a shift together.
        let mut same_team = Assignment::zeroed(&model);
        same_team.set_bool(universe.work(p1, morning), true);
        same_team.set_bool(universe.work(p2, morning), true);
        assert!(model.check(&same_team).is_empty());

        // Distinct shifts keep the teams apart.
        let mut split = Assignment::zeroed(&model);
        split.set_bool(universe.work(p1, morning), true);
        split.set_bool(universe.work(p3, afternoon), true);
        assert!(model.check(&split).is_empty());
    }

    /// Sets every shift-kind indicator the single-kind rule creates, walking
    /// the same (week, employee, kind-pair) order as the builder.
    fn set_kind_indicators(
        model: &CpModel,
        universe: &Universe,
        input: &ModelInput,
        assignment: &mut Assignment,
    ) {
        let mut unique_key = 1usize;
        for (w, week) in input.horizon.decision_weeks().iter().enumerate() {
            for e in input.employees() {
                let tag = employee_tag(input, e);
                let mut kinds: Vec<(String, Vec<SlotRef>)> = Vec::new();
                for (d, day) in week.days.iter().enumerate() {
                    for (shift_idx, shift) in day.shifts.iter().enumerate() {
                        let slots: Vec<SlotRef> = input
                            .slots_of_shift(DayRef { week: w, day: d }, shift_idx)
                            .collect();
                        match kinds.iter_mut().find(|(name, _)| *name == shift.name) {
                            Some((_, existing)) => existing.extend(slots),
                            None => kinds.push((shift.name.clone(), slots)),
                        }
                    }
                }
                for (name1, slots1) in &kinds {
                    for (name2, _) in &kinds {
                        if name1 == name2 {
                            continue;
                        }
                        let works = slots1
                            .iter()
                            .any(|&s| assignment.bool_value(universe.work(e, s)));
                        let var = model
                            .find_bool(&format!("bool_help_{name1}_{week}_{tag}_{unique_key}"))
                            .unwrap();
                        assignment.set_bool(var, works);
                        unique_key += 1;
                    }
                }
            }
        }
    }

    #[test]
    fn single_kind_week_forbids_mixing_shift_kinds() {
        let input = tiny_input(2);
        let (mut model, universe) = built(&input);
        add_single_shift_kind_week(&mut model, &input, &universe);

        let e = EmployeeRef {
            team: 0,
            employee: 0,
        };
        let monday_m = SlotRef {
            week: 0,
            day: 0,
            shift: 0,
            slot: 0,
        };
        let tuesday_m = SlotRef {
            week: 0,
            day: 1,
            shift: 0,
            slot: 0,
        };
        let tuesday_a = SlotRef {
            week: 0,
            day: 1,
            shift: 1,
            slot: 0,
        };

        // The same kind on both days passes.
        let mut steady = Assignment::zeroed(&model);
        steady.set_bool(universe.work(e, monday_m), true);
        steady.set_bool(universe.work(e, tuesday_m), true);
        set_kind_indicators(&model, &universe, &input, &mut steady);
        assert!(model.check(&steady).is_empty());

        // Morning Monday plus afternoon Tuesday in one week is rejected.
        let mut mixed = Assignment::zeroed(&model);
        mixed.set_bool(universe.work(e, monday_m), true);
        mixed.set_bool(universe.work(e, tuesday_a), true);
        set_kind_indicators(&model, &universe, &input, &mut mixed);
        assert!(!model.check(&mixed).is_empty());
    }

    #[test]
    fn shift_cycle_forces_the_next_kind_in_the_following_week() {
        let input = tiny_input(1);
        let (mut model, universe) = built(&input);
        let cycle = vec!["M".to_string(), "A".to_string(), "N".to_string()];
        add_shift_cycle(&mut model, &input, &universe, &cycle);

        let e = EmployeeRef {
            team: 0,
            employee: 0,
        };
        let week1_m = SlotRef {
            week: 0,
            day: 0,
            shift: 0,
            slot: 0,
        };
        let week2_a = SlotRef {
            week: 1,
            day: 0,
            shift: 1,
            slot: 0,
        };
        let week2_n = SlotRef {
            week: 1,
            day: 0,
            shift: 2,
            slot: 0,
        };
        let works_m = model
            .find_bool("help_bool_shift_cycle_Team1_Week1_M")
            .unwrap();

        // M in week one followed by A in week two honors the rotation.
        let mut rotating = Assignment::zeroed(&model);
        rotating.set_bool(universe.work(e, week1_m), true);
        rotating.set_bool(universe.work(e, week2_a), true);
        rotating.set_bool(works_m, true);
        assert!(model.check(&rotating).is_empty());

        // Jumping M -> N breaks it.
        let mut skipping = Assignment::zeroed(&model);
        skipping.set_bool(universe.work(e, week1_m), true);
        skipping.set_bool(universe.work(e, week2_n), true);
        skipping.set_bool(works_m, true);
        assert!(!model.check(&skipping).is_empty());
    }

    /// One-employee input whose days carry a single night shift.
    fn night_only_input(days: usize) -> ModelInput {
        let templates: Vec<Day> = (0..days)
            .map(|d| {
                Day::new(
                    crate::input_data::WEEKDAYS[d % 7],
                    vec![Shift::new("N", vec![skill("MO:M1")])],
                )
            })
            .collect();
        let horizon = PlanningHorizon::from_templates(&templates, 1);
        let team = Team::new(
            "Team1",
            vec![Employee::new("P1", vec![skill("MO:M1")]).shift_manager()],
        );
        ModelInput::new(horizon, vec![team], vec![skill("MO:M1")]).unwrap()
    }

    /// Completes the night-day indicators and transition helpers for the
    /// given night pattern.
    fn set_night_aux(
        model: &CpModel,
        input: &ModelInput,
        assignment: &mut Assignment,
        pattern: &[bool],
    ) {
        for (i, d) in input.days().enumerate() {
            let name = format!(
                "help_var_Team1_P1_works_N_on_{}_{}",
                input.week(d.week),
                input.day(d)
            );
            assignment.set_bool(model.find_bool(&name).unwrap(), pattern[i]);
        }
        for i in 0..pattern.len().saturating_sub(1) {
            let name = format!("help_bool_var_transition_night_block_Team1_P1_{i}_{}", i + 1);
            assignment.set_bool(model.find_bool(&name).unwrap(), pattern[i] != pattern[i + 1]);
        }
    }

    #[test]
    fn night_block_limit_allows_one_block_only() {
        let input = night_only_input(4);
        let (mut model, universe) = built(&input);
        add_night_block_limit(&mut model, &input, &universe, "N");

        let e = EmployeeRef {
            team: 0,
            employee: 0,
        };
        let set_nights = |assignment: &mut Assignment, pattern: &[bool]| {
            for (i, d) in input.days().enumerate() {
                if pattern[i] {
                    assignment.set_bool(
                        universe.work(
                            e,
                            SlotRef {
                                week: d.week,
                                day: d.day,
                                shift: 0,
                                slot: 0,
                            },
                        ),
                        true,
                    );
                }
            }
        };

        // Nights on days 1-2 of the eight-day horizon form a single block.
        let mut pattern = vec![false; 8];
        pattern[1] = true;
        pattern[2] = true;
        let mut block = Assignment::zeroed(&model);
        set_nights(&mut block, &pattern);
        set_night_aux(&model, &input, &mut block, &pattern);
        assert!(model.check(&block).is_empty());

        // Nights on days 0 and 2 form two blocks and are rejected.
        let mut split_pattern = vec![false; 8];
        split_pattern[0] = true;
        split_pattern[2] = true;
        let mut split = Assignment::zeroed(&model);
        set_nights(&mut split, &split_pattern);
        set_night_aux(&model, &input, &mut split, &split_pattern);
        assert!(!model.check(&split).is_empty());
    }
}
