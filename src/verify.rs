//! Solution checkers mirroring the hard guarantees of the builder. The
//! driver's verification mode and the test suite run a reported roster
//! through the full battery.

use std::collections::BTreeSet;

use crate::builder::BuildOptions;
use crate::input_data::ModelInput;
use crate::solution::{count_blocks, RosterSolution};
use crate::universe::{parse_key, AbsenceKind, DayRef, ParsedKey};

/// One broken guarantee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub rule: &'static str,
    pub detail: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.rule, self.detail)
    }
}

/// Runs every applicable checker over the visible horizon.
pub fn verify_solution(
    input: &ModelInput,
    options: &BuildOptions,
    solution: &RosterSolution,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    check_coverage(input, solution, &mut violations);
    check_single_assignment(input, solution, &mut violations);
    check_eligibility(input, solution, &mut violations);
    if options.weekly_cap {
        check_weekly_cap(input, solution, &mut violations);
    }
    if options.six_day_window_cap {
        check_window_cap(input, solution, &mut violations);
    }
    check_single_kind(input, solution, &mut violations);
    check_team_exclusivity(input, solution, &mut violations);
    if let Some(cycle) = &options.shift_cycle {
        check_cycle(input, solution, cycle, &mut violations);
    }
    check_manager_presence(input, solution, &mut violations);
    check_night_blocks(input, solution, &options.night_shift, &mut violations);
    if let Some(plan) = &options.absence {
        check_absences(input, solution, plan, &mut violations);
    }
    check_seed_pins(input, solution, &options.seed_keys, &mut violations);
    violations
}

fn check_coverage(input: &ModelInput, solution: &RosterSolution, out: &mut Vec<Violation>) {
    for d in input.visible_days() {
        for slot in input.slots_of_day(d) {
            let filled = solution
                .assignments
                .iter()
                .filter(|k| k.slot == slot)
                .count();
            if filled != 1 {
                out.push(Violation {
                    rule: "coverage",
                    detail: format!(
                        "slot {}/{}/{} skill {} filled {filled} times",
                        input.week(slot.week),
                        input.day(slot.day_ref()),
                        input.shift(slot),
                        input.slot_skill(slot)
                    ),
                });
            }
        }
    }
}

fn check_single_assignment(input: &ModelInput, solution: &RosterSolution, out: &mut Vec<Violation>) {
    for e in input.employees() {
        for d in input.visible_days() {
            let count = solution.assignments_on(e, d).len();
            if count > 1 {
                out.push(Violation {
                    rule: "one shift per day",
                    detail: format!(
                        "{} works {count} slots on {}/{}",
                        input.employee(e),
                        input.week(d.week),
                        input.day(d)
                    ),
                });
            }
        }
    }
}

fn check_eligibility(input: &ModelInput, solution: &RosterSolution, out: &mut Vec<Violation>) {
    for key in &solution.assignments {
        let employee = input.employee(key.employee);
        let skill = input.slot_skill(key.slot);
        if employee.fixed_skills && !employee.has_skill(skill) {
            out.push(Violation {
                rule: "skill eligibility",
                detail: format!("{} assigned to undeclared skill {skill}", employee.name),
            });
        }
    }
}

fn check_weekly_cap(input: &ModelInput, solution: &RosterSolution, out: &mut Vec<Violation>) {
    for e in input.employees() {
        for w in 0..input.horizon.visible_count() {
            let count = solution
                .assignments
                .iter()
                .filter(|k| k.employee == e && k.slot.week == w)
                .count();
            if count > 5 {
                out.push(Violation {
                    rule: "five days a week",
                    detail: format!(
                        "{} has {count} assignments in {}",
                        input.employee(e),
                        input.week(w)
                    ),
                });
            }
        }
    }
}

fn check_window_cap(input: &ModelInput, solution: &RosterSolution, out: &mut Vec<Violation>) {
    let days: Vec<DayRef> = input.visible_days().collect();
    for e in input.employees() {
        let pattern = solution.worked_pattern(input, e);
        for (start, window) in pattern.windows(6).enumerate() {
            let worked = window.iter().filter(|&&w| w).count();
            if worked > 5 {
                out.push(Violation {
                    rule: "five days in a row",
                    detail: format!(
                        "{} works {worked} of the 6 days starting {}/{}",
                        input.employee(e),
                        input.week(days[start].week),
                        input.day(days[start])
                    ),
                });
            }
        }
    }
}

fn check_single_kind(input: &ModelInput, solution: &RosterSolution, out: &mut Vec<Violation>) {
    for e in input.employees() {
        for w in 0..input.horizon.visible_count() {
            let kinds: BTreeSet<&str> = solution
                .assignments
                .iter()
                .filter(|k| k.employee == e && k.slot.week == w)
                .map(|k| input.shift(k.slot).name.as_str())
                .collect();
            if kinds.len() > 1 {
                out.push(Violation {
                    rule: "one shift kind per week",
                    detail: format!(
                        "{} works {kinds:?} in {}",
                        input.employee(e),
                        input.week(w)
                    ),
                });
            }
        }
    }
}

fn check_team_exclusivity(input: &ModelInput, solution: &RosterSolution, out: &mut Vec<Violation>) {
    for d in input.visible_days() {
        for shift_idx in 0..input.day(d).shifts.len() {
            let teams: BTreeSet<usize> = solution
                .assignments
                .iter()
                .filter(|k| k.slot.day_ref() == d && k.slot.shift == shift_idx)
                .map(|k| k.employee.team)
                .collect();
            if teams.len() > 1 {
                out.push(Violation {
                    rule: "team exclusivity",
                    detail: format!(
                        "{} teams share shift {} on {}/{}",
                        teams.len(),
                        input.day(d).shifts[shift_idx].name,
                        input.week(d.week),
                        input.day(d)
                    ),
                });
            }
        }
    }
}

fn check_cycle(
    input: &ModelInput,
    solution: &RosterSolution,
    cycle: &[String],
    out: &mut Vec<Violation>,
) {
    for t in 0..input.teams.len() {
        for w in 0..input.horizon.visible_count().saturating_sub(1) {
            let kinds_of = |week: usize| -> BTreeSet<&str> {
                solution
                    .assignments
                    .iter()
                    .filter(|k| k.employee.team == t && k.slot.week == week)
                    .map(|k| input.shift(k.slot).name.as_str())
                    .collect()
            };
            let current = kinds_of(w);
            let following = kinds_of(w + 1);
            for kind in &current {
                let Some(pos) = cycle.iter().position(|c| c == kind) else {
                    continue;
                };
                let expected = &cycle[(pos + 1) % cycle.len()];
                if !following.is_empty() && following.iter().any(|k| k != expected) {
                    out.push(Violation {
                        rule: "shift cycle",
                        detail: format!(
                            "{} works {kind} in {} but {following:?} in {}",
                            input.team(t),
                            input.week(w),
                            input.week(w + 1)
                        ),
                    });
                }
            }
        }
    }
}

fn check_manager_presence(input: &ModelInput, solution: &RosterSolution, out: &mut Vec<Violation>) {
    for (t, team) in input.teams.iter().enumerate() {
        let managers: BTreeSet<usize> = team.shift_managers().map(|(idx, _)| idx).collect();
        for d in input.visible_days() {
            let covered = solution.assignments.iter().any(|k| {
                k.employee.team == t
                    && managers.contains(&k.employee.employee)
                    && k.slot.day_ref() == d
            });
            if !covered {
                out.push(Violation {
                    rule: "shift manager presence",
                    detail: format!(
                        "{} has no shift manager on {}/{}",
                        team,
                        input.week(d.week),
                        input.day(d)
                    ),
                });
            }
        }
    }
}

fn check_night_blocks(
    input: &ModelInput,
    solution: &RosterSolution,
    night_shift: &str,
    out: &mut Vec<Violation>,
) {
    for e in input.employees() {
        let nights = solution.kind_pattern(input, e, night_shift);
        let blocks = count_blocks(&nights);
        if blocks > 1 {
            out.push(Violation {
                rule: "night continuity",
                detail: format!(
                    "{} has {blocks} separate night blocks",
                    input.employee(e)
                ),
            });
        }
    }
}

fn check_absences(
    input: &ModelInput,
    solution: &RosterSolution,
    plan: &crate::rules::absence::AbsencePlan,
    out: &mut Vec<Violation>,
) {
    let last_ordinal = input.visible_days().count().saturating_sub(1);
    for e in input.employees() {
        let used = solution.assignments.iter().any(|k| k.employee == e);
        let days: Vec<DayRef> = input.visible_days().collect();
        let marked = |kind: AbsenceKind| -> Vec<bool> {
            days.iter()
                .map(|&d| solution.absence_on(e, d) == Some(kind))
                .collect()
        };
        let vacation = marked(AbsenceKind::Vacation);
        let illness = marked(AbsenceKind::Illness);

        for (i, &d) in days.iter().enumerate() {
            if (vacation[i] || illness[i]) && !solution.assignments_on(e, d).is_empty() {
                out.push(Violation {
                    rule: "absence excludes work",
                    detail: format!(
                        "{} works on an absence day {}/{}",
                        input.employee(e),
                        input.week(d.week),
                        input.day(d)
                    ),
                });
            }
        }

        if !used {
            if vacation.iter().chain(illness.iter()).any(|&b| b) {
                out.push(Violation {
                    rule: "absence quota",
                    detail: format!("unused employee {} has absence days", input.employee(e)),
                });
            }
            continue;
        }

        for (kind, pattern, spec) in [
            ("vacation", &vacation, plan.vacation),
            ("illness", &illness, plan.illness),
        ] {
            let total = pattern.iter().filter(|&&b| b).count();
            if total > spec.total_days() {
                out.push(Violation {
                    rule: "absence quota",
                    detail: format!(
                        "{} has {total} {kind} days, quota {}",
                        input.employee(e),
                        spec.total_days()
                    ),
                });
            }
            if count_blocks(pattern) > spec.intervals {
                out.push(Violation {
                    rule: "absence blocks",
                    detail: format!(
                        "{} has more than {} {kind} runs",
                        input.employee(e),
                        spec.intervals
                    ),
                });
            }
            // Runs fully inside the visible horizon must be whole blocks;
            // the final run may be truncated by the unreported coupling
            // week.
            if spec.length > 0 {
                for (_, len, end) in runs(pattern) {
                    if end != last_ordinal && len % spec.length != 0 {
                        out.push(Violation {
                            rule: "absence blocks",
                            detail: format!(
                                "{} has a {kind} run of {len} days (block length {})",
                                input.employee(e),
                                spec.length
                            ),
                        });
                    }
                }
            }
        }
    }
}

/// Maximal true-runs as (start, length, end) triples.
fn runs(pattern: &[bool]) -> Vec<(usize, usize, usize)> {
    let mut result = Vec::new();
    let mut start = None;
    for (i, &value) in pattern.iter().enumerate() {
        match (value, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                result.push((s, i - s, i - 1));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        result.push((s, pattern.len() - s, pattern.len() - 1));
    }
    result
}

fn check_seed_pins(
    input: &ModelInput,
    solution: &RosterSolution,
    seed_keys: &[String],
    out: &mut Vec<Violation>,
) {
    for text in seed_keys {
        let Ok(parsed) = parse_key(input, text) else {
            out.push(Violation {
                rule: "seed pins",
                detail: format!("unresolvable seed key '{text}'"),
            });
            continue;
        };
        let present = match parsed {
            ParsedKey::Work(k) => {
                k.slot.week >= input.horizon.visible_count() || solution.assignments.contains(&k)
            }
            ParsedKey::Absence(k) => {
                k.day.week >= input.horizon.visible_count() || solution.absences.contains(&k)
            }
        };
        if !present {
            out.push(Violation {
                rule: "seed pins",
                detail: format!("seeded key '{text}' is not in the solution"),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Day, Employee, PlanningHorizon, Shift, Skill, Team};
    use crate::universe::{EmployeeRef, SlotRef, WorkKey};
    use std::collections::BTreeSet;

    fn skill(label: &str) -> Skill {
        Skill::new(label)
    }

    /// One team of three, five-day week, three single-slot shifts per day.
    fn five_day_input() -> ModelInput {
        let templates: Vec<Day> = (0..5)
            .map(|d| {
                Day::new(
                    crate::input_data::WEEKDAYS[d],
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
        ModelInput::new(horizon, vec![team], vec![skill("MO:M1")]).unwrap()
    }

    /// P1 on mornings, P2 on afternoons, P3 on nights, all five days.
    fn clean_solution() -> RosterSolution {
        let mut assignments = BTreeSet::new();
        for day in 0..5 {
            for (employee, shift) in [(0usize, 0usize), (1, 1), (2, 2)] {
                assignments.insert(WorkKey {
                    employee: EmployeeRef { team: 0, employee },
                    slot: SlotRef {
                        week: 0,
                        day,
                        shift,
                        slot: 0,
                    },
                });
            }
        }
        RosterSolution {
            assignments,
            absences: BTreeSet::new(),
            objective: 0,
        }
    }

    fn options() -> BuildOptions {
        BuildOptions {
            shift_cycle: None,
            ..BuildOptions::default()
        }
    }

    #[test]
    fn clean_roster_passes_all_checks() {
        let input = five_day_input();
        let solution = clean_solution();
        let violations = verify_solution(&input, &options(), &solution);
        assert!(violations.is_empty(), "unexpected: {violations:?}");
    }

    #[test]
    fn missing_slot_breaks_coverage() {
        let input = five_day_input();
        let mut solution = clean_solution();
        let dropped = *solution.assignments.iter().next().unwrap();
        solution.assignments.remove(&dropped);
        let violations = verify_solution(&input, &options(), &solution);
        assert!(violations.iter().any(|v| v.rule == "coverage"));
    }

    #[test]
    fn double_shift_and_mixed_kinds_are_flagged() {
        let input = five_day_input();
        let mut solution = clean_solution();
        // P1 additionally takes P2's Tuesday afternoon slot.
        solution.assignments.remove(&WorkKey {
            employee: EmployeeRef {
                team: 0,
                employee: 1,
            },
            slot: SlotRef {
                week: 0,
                day: 1,
                shift: 1,
                slot: 0,
            },
        });
        solution.assignments.insert(WorkKey {
            employee: EmployeeRef {
                team: 0,
                employee: 0,
            },
            slot: SlotRef {
                week: 0,
                day: 1,
                shift: 1,
                slot: 0,
            },
        });
        let violations = verify_solution(&input, &options(), &solution);
        assert!(violations.iter().any(|v| v.rule == "one shift per day"));
        assert!(violations
            .iter()
            .any(|v| v.rule == "one shift kind per week"));
    }

    #[test]
    fn night_fragmentation_is_flagged() {
        let input = five_day_input();
        let mut solution = clean_solution();
        // P3 swaps Wednesday night for rest: nights Mo,Tu / Th,Fr.
        solution.assignments.remove(&WorkKey {
            employee: EmployeeRef {
                team: 0,
                employee: 2,
            },
            slot: SlotRef {
                week: 0,
                day: 2,
                shift: 2,
                slot: 0,
            },
        });
        solution.assignments.insert(WorkKey {
            employee: EmployeeRef {
                team: 0,
                employee: 0,
            },
            slot: SlotRef {
                week: 0,
                day: 2,
                shift: 2,
                slot: 0,
            },
        });
        let violations = verify_solution(&input, &options(), &solution);
        assert!(violations.iter().any(|v| v.rule == "night continuity"));
    }

    #[test]
    fn seed_pins_must_appear_in_the_solution() {
        let input = five_day_input();
        let solution = clean_solution();
        let mut opts = options();
        opts.seed_keys = vec!["Week1_Mo_M_Team1_P1_MO:M1".to_string()];
        assert!(verify_solution(&input, &opts, &solution).is_empty());

        opts.seed_keys = vec!["Week1_Mo_M_Team1_P2_MO:M1".to_string()];
        let violations = verify_solution(&input, &opts, &solution);
        assert!(violations.iter().any(|v| v.rule == "seed pins"));
    }

    #[test]
    fn manager_absence_is_flagged() {
        let input = five_day_input();
        let mut solution = clean_solution();
        // Replace the manager's Friday shift with P2 (who then has two).
        solution.assignments.remove(&WorkKey {
            employee: EmployeeRef {
                team: 0,
                employee: 0,
            },
            slot: SlotRef {
                week: 0,
                day: 4,
                shift: 0,
                slot: 0,
            },
        });
        solution.assignments.insert(WorkKey {
            employee: EmployeeRef {
                team: 0,
                employee: 1,
            },
            slot: SlotRef {
                week: 0,
                day: 4,
                shift: 0,
                slot: 0,
            },
        });
        let violations = verify_solution(&input, &options(), &solution);
        assert!(violations
            .iter()
            .any(|v| v.rule == "shift manager presence"));
    }
}
