//! The decision-variable universe.
//!
//! Keys are typed index tuples stored densely; the underscore-joined textual
//! form exists only for logging, seed interchange and the schedule grids.
//!
//! Enumeration order is part of the contract: work variables are created for
//! teams, employees within a team, weeks, days, shifts, then skill slots;
//! the vacation/illness pair per (team, employee, week, day) follows. Equal
//! inputs therefore always produce the same key sequence.

use crate::cp::{BoolVar, CpModel};
use crate::error::RosterError;
use crate::input_data::ModelInput;

/// An employee, addressed by team position and position within the team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmployeeRef {
    pub team: usize,
    pub employee: usize,
}

/// A calendar day within the decision horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayRef {
    pub week: usize,
    pub day: usize,
}

/// One required-skill slot of one shift on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotRef {
    pub week: usize,
    pub day: usize,
    pub shift: usize,
    pub slot: usize,
}

impl SlotRef {
    pub fn day_ref(&self) -> DayRef {
        DayRef {
            week: self.week,
            day: self.day,
        }
    }
}

/// A work decision: employee fills a skill slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkKey {
    pub employee: EmployeeRef,
    pub slot: SlotRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AbsenceKind {
    Vacation,
    Illness,
}

impl AbsenceKind {
    pub fn label(self) -> &'static str {
        match self {
            AbsenceKind::Vacation => "vac",
            AbsenceKind::Illness => "ill",
        }
    }
}

/// An absence decision: employee is on vacation or ill that day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AbsenceKey {
    pub employee: EmployeeRef,
    pub day: DayRef,
    pub kind: AbsenceKind,
}

/// A parsed textual key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedKey {
    Work(WorkKey),
    Absence(AbsenceKey),
}

/// Dense storage of one Boolean per decision key.
#[derive(Debug, Clone)]
pub struct Universe {
    slots_total: usize,
    days_total: usize,
    slot_base: Vec<Vec<Vec<usize>>>,
    day_base: Vec<usize>,
    emp_base: Vec<usize>,
    work_vars: Vec<BoolVar>,
    vac_vars: Vec<BoolVar>,
    ill_vars: Vec<BoolVar>,
}

impl Universe {
    /// Creates every decision variable in the canonical order.
    pub fn build(model: &mut CpModel, input: &ModelInput) -> Self {
        let weeks = input.horizon.decision_weeks();

        let mut slot_base = Vec::with_capacity(weeks.len());
        let mut day_base = Vec::with_capacity(weeks.len());
        let mut slots_total = 0usize;
        let mut days_total = 0usize;
        for week in weeks {
            let mut per_day = Vec::with_capacity(week.days.len());
            day_base.push(days_total);
            for day in &week.days {
                let mut per_shift = Vec::with_capacity(day.shifts.len());
                for shift in &day.shifts {
                    per_shift.push(slots_total);
                    slots_total += shift.needed_skills.len();
                }
                per_day.push(per_shift);
                days_total += 1;
            }
            slot_base.push(per_day);
        }

        let mut emp_base = Vec::with_capacity(input.teams.len());
        let mut employees_total = 0usize;
        for team in &input.teams {
            emp_base.push(employees_total);
            employees_total += team.employees.len();
        }

        let mut work_vars = Vec::with_capacity(employees_total * slots_total);
        let mut vac_vars = Vec::with_capacity(employees_total * days_total);
        let mut ill_vars = Vec::with_capacity(employees_total * days_total);
        for e in input.employees() {
            for slot in input.slots() {
                let key = WorkKey { employee: e, slot };
                work_vars.push(model.new_bool_var(render_work_key(input, &key)));
            }
            for day in input.days() {
                let vac = AbsenceKey {
                    employee: e,
                    day,
                    kind: AbsenceKind::Vacation,
                };
                let ill = AbsenceKey {
                    employee: e,
                    day,
                    kind: AbsenceKind::Illness,
                };
                vac_vars.push(model.new_bool_var(render_absence_key(input, &vac)));
                ill_vars.push(model.new_bool_var(render_absence_key(input, &ill)));
            }
        }

        Self {
            slots_total,
            days_total,
            slot_base,
            day_base,
            emp_base,
            work_vars,
            vac_vars,
            ill_vars,
        }
    }

    fn employee_ordinal(&self, e: EmployeeRef) -> usize {
        self.emp_base[e.team] + e.employee
    }

    fn slot_ordinal(&self, s: SlotRef) -> usize {
        self.slot_base[s.week][s.day][s.shift] + s.slot
    }

    fn day_ordinal(&self, d: DayRef) -> usize {
        self.day_base[d.week] + d.day
    }

    pub fn work(&self, e: EmployeeRef, s: SlotRef) -> BoolVar {
        self.work_vars[self.employee_ordinal(e) * self.slots_total + self.slot_ordinal(s)]
    }

    pub fn work_key(&self, key: &WorkKey) -> BoolVar {
        self.work(key.employee, key.slot)
    }

    pub fn vacation(&self, e: EmployeeRef, d: DayRef) -> BoolVar {
        self.vac_vars[self.employee_ordinal(e) * self.days_total + self.day_ordinal(d)]
    }

    pub fn illness(&self, e: EmployeeRef, d: DayRef) -> BoolVar {
        self.ill_vars[self.employee_ordinal(e) * self.days_total + self.day_ordinal(d)]
    }

    pub fn absence(&self, key: &AbsenceKey) -> BoolVar {
        match key.kind {
            AbsenceKind::Vacation => self.vacation(key.employee, key.day),
            AbsenceKind::Illness => self.illness(key.employee, key.day),
        }
    }

    pub fn var_of(&self, key: &ParsedKey) -> BoolVar {
        match key {
            ParsedKey::Work(k) => self.work_key(k),
            ParsedKey::Absence(k) => self.absence(k),
        }
    }

    pub fn work_var_count(&self) -> usize {
        self.work_vars.len()
    }

    pub fn absence_var_count(&self) -> usize {
        self.vac_vars.len() + self.ill_vars.len()
    }
}

/// Renders `{Week}_{Day}_{Shift}_{Team}_{Employee}_{Skill}`.
pub fn render_work_key(input: &ModelInput, key: &WorkKey) -> String {
    let team = input.team(key.employee.team);
    let employee = input.employee(key.employee);
    let week = input.week(key.slot.week);
    let day = input.day(key.slot.day_ref());
    let shift = input.shift(key.slot);
    let skill = input.slot_skill(key.slot);
    format!("{week}_{day}_{shift}_{team}_{employee}_{skill}")
}

/// Renders `{Week}_{Day}_vac_{Team}_{Employee}_vac` (and the `ill` form).
pub fn render_absence_key(input: &ModelInput, key: &AbsenceKey) -> String {
    let team = input.team(key.employee.team);
    let employee = input.employee(key.employee);
    let week = input.week(key.day.week);
    let day = input.day(key.day);
    let label = key.kind.label();
    format!("{week}_{day}_{label}_{team}_{employee}_{label}")
}

/// Resolves a textual key back to its typed form.
pub fn parse_key(input: &ModelInput, text: &str) -> Result<ParsedKey, RosterError> {
    let malformed = |reason: &str| RosterError::MalformedKey {
        key: text.to_string(),
        reason: reason.to_string(),
    };
    let unknown = |what: &'static str, name: &str| RosterError::UnknownKeyPart {
        key: text.to_string(),
        what,
        name: name.to_string(),
    };

    let parts: Vec<&str> = text.split('_').collect();
    let [week_name, day_name, shift_name, team_name, employee_name, skill_name]: [&str; 6] = parts
        .try_into()
        .map_err(|_| malformed("expected six underscore-separated parts"))?;

    let week = input
        .horizon
        .decision_weeks()
        .iter()
        .position(|w| w.name == week_name)
        .ok_or_else(|| unknown("week", week_name))?;
    let day = input.week(week).days.iter().position(|d| d.name == day_name);
    let day = day.ok_or_else(|| unknown("day", day_name))?;
    let team = input
        .find_team(team_name)
        .ok_or_else(|| unknown("team", team_name))?;
    let employee = input
        .find_employee(team, employee_name)
        .ok_or_else(|| unknown("employee", employee_name))?;

    let absence_kind = match (shift_name, skill_name) {
        ("vac", "vac") => Some(AbsenceKind::Vacation),
        ("ill", "ill") => Some(AbsenceKind::Illness),
        ("vac", _) | (_, "vac") | ("ill", _) | (_, "ill") => {
            return Err(malformed("mismatched absence marker"))
        }
        _ => None,
    };
    if let Some(kind) = absence_kind {
        return Ok(ParsedKey::Absence(AbsenceKey {
            employee,
            day: DayRef { week, day },
            kind,
        }));
    }

    let day_ref = DayRef { week, day };
    let shift = input
        .day(day_ref)
        .shifts
        .iter()
        .position(|s| s.name == shift_name)
        .ok_or_else(|| unknown("shift", shift_name))?;
    let slot = input.day(day_ref).shifts[shift]
        .needed_skills
        .iter()
        .position(|s| s.label() == skill_name)
        .ok_or_else(|| unknown("skill", skill_name))?;

    Ok(ParsedKey::Work(WorkKey {
        employee,
        slot: SlotRef {
            week,
            day,
            shift,
            slot,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input_data::create_input;

    #[test]
    fn creates_one_var_per_key() {
        let input = create_input(1).unwrap();
        let mut model = CpModel::new();
        let universe = Universe::build(&mut model, &input);

        let slots: usize = input.slots().count();
        let days: usize = input.days().count();
        let employees = input.employee_count();
        assert_eq!(universe.work_var_count(), employees * slots);
        assert_eq!(universe.absence_var_count(), employees * days * 2);
        assert_eq!(model.num_vars(), employees * (slots + days * 2));
    }

    #[test]
    fn var_names_are_canonical_keys() {
        let input = create_input(1).unwrap();
        let mut model = CpModel::new();
        let universe = Universe::build(&mut model, &input);

        let e = EmployeeRef {
            team: 0,
            employee: 0,
        };
        let slot = SlotRef {
            week: 0,
            day: 0,
            shift: 0,
            slot: 0,
        };
        let var = universe.work(e, slot);
        assert_eq!(
            model.var_name_of_bool(var),
            "Week1_Mo_M_Team1_P1_MO:M1"
        );

        let vac = universe.vacation(e, DayRef { week: 1, day: 2 });
        assert_eq!(model.var_name_of_bool(vac), "Week2_We_vac_Team1_P1_vac");
    }

    #[test]
    fn parse_round_trips_rendered_keys() {
        let input = create_input(1).unwrap();
        let key = WorkKey {
            employee: EmployeeRef {
                team: 1,
                employee: 3,
            },
            slot: SlotRef {
                week: 1,
                day: 4,
                shift: 2,
                slot: 3,
            },
        };
        let text = render_work_key(&input, &key);
        assert_eq!(parse_key(&input, &text).unwrap(), ParsedKey::Work(key));

        let absence = AbsenceKey {
            employee: EmployeeRef {
                team: 2,
                employee: 0,
            },
            day: DayRef { week: 0, day: 6 },
            kind: AbsenceKind::Illness,
        };
        let text = render_absence_key(&input, &absence);
        assert_eq!(
            parse_key(&input, &text).unwrap(),
            ParsedKey::Absence(absence)
        );
    }

    #[test]
    fn parse_rejects_bad_keys() {
        let input = create_input(1).unwrap();
        assert!(matches!(
            parse_key(&input, "Week1_Mo_M_Team1_P1"),
            Err(RosterError::MalformedKey { .. })
        ));
        assert!(matches!(
            parse_key(&input, "Week9_Mo_M_Team1_P1_MO:M1"),
            Err(RosterError::UnknownKeyPart { what: "week", .. })
        ));
        assert!(matches!(
            parse_key(&input, "Week1_Mo_M_Team1_P99_MO:M1"),
            Err(RosterError::UnknownKeyPart {
                what: "employee",
                ..
            })
        ));
        assert!(matches!(
            parse_key(&input, "Week1_Mo_vac_Team1_P1_MO:M1"),
            Err(RosterError::MalformedKey { .. })
        ));
        // Sunday morning carries no MO:M4 slot.
        assert!(matches!(
            parse_key(&input, "Week1_Su_M_Team1_P12_MO:M4"),
            Err(RosterError::UnknownKeyPart { what: "skill", .. })
        ));
    }
}
