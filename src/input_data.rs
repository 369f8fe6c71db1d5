//! Input assembly: staff catalog, weekday templates, horizon construction.

use crate::domain::{Day, Employee, PlanningHorizon, Shift, Skill, Team, Week};
use crate::error::RosterError;
use crate::universe::{DayRef, EmployeeRef, SlotRef};

/// Weekday names in calendar order, shared by templates, seed grids and
/// report headers.
pub const WEEKDAYS: [&str; 7] = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"];

/// The assembled, validated problem input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInput {
    pub horizon: PlanningHorizon,
    pub teams: Vec<Team>,
    pub skill_catalog: Vec<Skill>,
}

impl ModelInput {
    pub fn new(
        horizon: PlanningHorizon,
        teams: Vec<Team>,
        skill_catalog: Vec<Skill>,
    ) -> Result<Self, RosterError> {
        let input = Self {
            horizon,
            teams,
            skill_catalog,
        };
        input.validate()?;
        Ok(input)
    }

    pub fn team(&self, team: usize) -> &Team {
        &self.teams[team]
    }

    pub fn employee(&self, e: EmployeeRef) -> &Employee {
        &self.teams[e.team].employees[e.employee]
    }

    pub fn week(&self, week: usize) -> &Week {
        &self.horizon.decision_weeks()[week]
    }

    pub fn day(&self, d: DayRef) -> &Day {
        &self.week(d.week).days[d.day]
    }

    pub fn shift(&self, s: SlotRef) -> &Shift {
        &self.day(s.day_ref()).shifts[s.shift]
    }

    pub fn slot_skill(&self, s: SlotRef) -> &Skill {
        &self.shift(s).needed_skills[s.slot]
    }

    pub fn employee_count(&self) -> usize {
        self.teams.iter().map(|t| t.employees.len()).sum()
    }

    /// Employees in canonical order: teams, then employees within a team.
    pub fn employees(&self) -> impl Iterator<Item = EmployeeRef> + '_ {
        self.teams.iter().enumerate().flat_map(|(t, team)| {
            (0..team.employees.len()).map(move |e| EmployeeRef {
                team: t,
                employee: e,
            })
        })
    }

    /// Days of the decision horizon in calendar order.
    pub fn days(&self) -> impl Iterator<Item = DayRef> + '_ {
        self.horizon
            .decision_weeks()
            .iter()
            .enumerate()
            .flat_map(|(w, week)| (0..week.days.len()).map(move |d| DayRef { week: w, day: d }))
    }

    /// Days of the visible horizon only.
    pub fn visible_days(&self) -> impl Iterator<Item = DayRef> + '_ {
        self.days()
            .filter(|d| d.week < self.horizon.visible_count())
    }

    /// Skill slots of one day, in shift order then slot order.
    pub fn slots_of_day(&self, d: DayRef) -> impl Iterator<Item = SlotRef> + '_ {
        self.day(d)
            .shifts
            .iter()
            .enumerate()
            .flat_map(move |(s, shift)| {
                (0..shift.needed_skills.len()).map(move |k| SlotRef {
                    week: d.week,
                    day: d.day,
                    shift: s,
                    slot: k,
                })
            })
    }

    /// All skill slots of the decision horizon in canonical order.
    pub fn slots(&self) -> impl Iterator<Item = SlotRef> + '_ {
        self.days().flat_map(move |d| self.slots_of_day(d))
    }

    /// Skill slots of one shift.
    pub fn slots_of_shift(&self, d: DayRef, shift: usize) -> impl Iterator<Item = SlotRef> + '_ {
        let count = self.day(d).shifts[shift].needed_skills.len();
        (0..count).map(move |k| SlotRef {
            week: d.week,
            day: d.day,
            shift,
            slot: k,
        })
    }

    pub fn find_team(&self, name: &str) -> Option<usize> {
        self.teams.iter().position(|t| t.name == name)
    }

    pub fn find_employee(&self, team: usize, name: &str) -> Option<EmployeeRef> {
        self.teams[team]
            .employees
            .iter()
            .position(|e| e.name == name)
            .map(|employee| EmployeeRef { team, employee })
    }

    /// Fails fast on inputs the model cannot represent.
    pub fn validate(&self) -> Result<(), RosterError> {
        if self.horizon.visible_count() == 0 {
            return Err(RosterError::EmptyHorizon);
        }
        for week in self.horizon.decision_weeks() {
            check_identifier(&week.name)?;
            if week.days.is_empty() {
                return Err(RosterError::EmptyWeek(week.name.clone()));
            }
            for day in &week.days {
                check_identifier(&day.name)?;
                for shift in &day.shifts {
                    check_identifier(&shift.name)?;
                    for (i, skill) in shift.needed_skills.iter().enumerate() {
                        check_identifier(skill.label())?;
                        if !self.skill_catalog.contains(skill) {
                            return Err(RosterError::UnknownSkill {
                                skill: skill.label().to_string(),
                                context: format!("shift '{}' on '{}'", shift.name, day.name),
                            });
                        }
                        if shift.needed_skills[..i].contains(skill) {
                            return Err(RosterError::DuplicateShiftSkill {
                                day: day.name.clone(),
                                shift: shift.name.clone(),
                                skill: skill.label().to_string(),
                            });
                        }
                    }
                }
            }
        }
        for team in &self.teams {
            check_identifier(&team.name)?;
            for (i, employee) in team.employees.iter().enumerate() {
                check_identifier(&employee.name)?;
                if team.employees[..i].iter().any(|e| e.name == employee.name) {
                    return Err(RosterError::DuplicateEmployee {
                        team: team.name.clone(),
                        name: employee.name.clone(),
                    });
                }
                for skill in &employee.skills {
                    if !self.skill_catalog.contains(skill) {
                        return Err(RosterError::UnknownSkill {
                            skill: skill.label().to_string(),
                            context: format!("employee '{}'", employee.name),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Decision keys are rendered as underscore-joined identifiers, so the parts
/// themselves must not contain underscores.
fn check_identifier(name: &str) -> Result<(), RosterError> {
    if name.is_empty() || name.contains('_') {
        return Err(RosterError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

/// The in-use skill catalog.
pub fn skill_catalog() -> Vec<Skill> {
    ["MO:M1", "H1:M1", "H2:M1", "H:M2", "MO:M3", "H:M3", "MO:M4"]
        .into_iter()
        .map(Skill::new)
        .collect()
}

fn s(label: &str) -> Skill {
    Skill::new(label)
}

/// The helper skill set most employees carry.
fn helper_skills() -> Vec<Skill> {
    vec![s("H1:M1"), s("H2:M1"), s("H:M2"), s("H:M3")]
}

fn with_helper(mut skills: Vec<Skill>) -> Vec<Skill> {
    skills.extend(helper_skills());
    skills
}

/// The fixed three-team staff roster.
pub fn staff() -> Vec<Team> {
    let team1 = Team::new(
        "Team1",
        vec![
            Employee::new("P1", with_helper(vec![s("MO:M1"), s("MO:M3")])).shift_manager(),
            Employee::new("P2", with_helper(vec![s("MO:M3")])),
            Employee::new("P3", with_helper(vec![s("MO:M1"), s("MO:M3")])),
            Employee::new("P4", vec![s("H:M3")]),
            Employee::new("P5", helper_skills()),
            Employee::new("P6", with_helper(vec![s("MO:M1"), s("MO:M3")])).shift_manager(),
            Employee::new("P7", helper_skills()),
            Employee::new("P8", helper_skills()),
            Employee::new("P9", helper_skills()),
            Employee::new("P10", helper_skills()),
            Employee::new("P11", helper_skills()),
            Employee::new("P12", with_helper(vec![s("MO:M4")])),
        ],
    );
    let team2 = Team::new(
        "Team2",
        vec![
            Employee::new("P13", with_helper(vec![s("MO:M1"), s("MO:M3")])).shift_manager(),
            Employee::new("P14", with_helper(vec![s("MO:M1"), s("MO:M3")])),
            Employee::new("P15", helper_skills()),
            Employee::new("P16", with_helper(vec![s("MO:M1"), s("MO:M3")])),
            Employee::new("P17", with_helper(vec![s("MO:M1"), s("MO:M3")])).shift_manager(),
            Employee::new("P18", helper_skills()),
            Employee::new("P19", helper_skills()),
            Employee::new("P20", with_helper(vec![s("MO:M1"), s("MO:M3")])),
            Employee::new("P21", helper_skills()),
            Employee::new("P22", helper_skills()),
            Employee::new("P23", with_helper(vec![s("MO:M3"), s("MO:M4")])),
        ],
    );
    let team3 = Team::new(
        "Team3",
        vec![
            Employee::new("P24", with_helper(vec![s("MO:M1"), s("MO:M3")])).shift_manager(),
            Employee::new("P25", helper_skills()),
            Employee::new("P26", with_helper(vec![s("MO:M1"), s("MO:M3")])),
            Employee::new("P27", helper_skills()),
            Employee::new("P28", helper_skills()),
            Employee::new("P29", helper_skills()),
            Employee::new("P30", with_helper(vec![s("MO:M1"), s("MO:M3")])).shift_manager(),
            Employee::new("P31", with_helper(vec![s("MO:M1"), s("MO:M3")])),
            Employee::new("P32", helper_skills()),
            Employee::new("P33", helper_skills()),
            Employee::new("P34", with_helper(vec![s("MO:M4")])),
        ],
    );
    vec![team1, team2, team3]
}

/// Weekday shift templates. Weekend shifts drop the `H:M2` and `MO:M4`
/// coverage the weekday shifts carry.
pub fn day_templates() -> Vec<Day> {
    let m1 = || vec![s("MO:M1"), s("H1:M1"), s("H2:M1")];
    let m2 = || vec![s("H:M2")];
    let m3 = || vec![s("MO:M3"), s("H:M3")];
    let m4 = || vec![s("MO:M4")];
    let full = || {
        let mut skills = m1();
        skills.extend(m2());
        skills.extend(m3());
        skills.extend(m4());
        skills
    };
    let weekend = || {
        let mut skills = m1();
        skills.extend(m3());
        skills
    };

    let mut monday_morning = m1();
    monday_morning.extend(m3());
    monday_morning.extend(m4());

    let mut saturday_morning = m1();
    saturday_morning.extend(m2());
    saturday_morning.extend(m3());

    vec![
        Day::new(
            "Mo",
            vec![
                Shift::new("M", monday_morning),
                Shift::new("A", full()),
                Shift::new("N", full()),
            ],
        ),
        Day::new(
            "Tu",
            vec![
                Shift::new("M", full()),
                Shift::new("A", full()),
                Shift::new("N", full()),
            ],
        ),
        Day::new(
            "We",
            vec![
                Shift::new("M", full()),
                Shift::new("A", full()),
                Shift::new("N", full()),
            ],
        ),
        Day::new(
            "Th",
            vec![
                Shift::new("M", full()),
                Shift::new("A", full()),
                Shift::new("N", full()),
            ],
        ),
        Day::new(
            "Fr",
            vec![
                Shift::new("M", full()),
                Shift::new("A", full()),
                Shift::new("N", full()),
            ],
        ),
        Day::new(
            "Sa",
            vec![
                Shift::new("M", saturday_morning),
                Shift::new("A", weekend()),
                Shift::new("N", weekend()),
            ],
        ),
        Day::new(
            "Su",
            vec![
                Shift::new("M", weekend()),
                Shift::new("A", weekend()),
                Shift::new("N", weekend()),
            ],
        ),
    ]
}

/// Assembles the default input for the given visible horizon.
pub fn create_input(visible_weeks: usize) -> Result<ModelInput, RosterError> {
    let horizon = PlanningHorizon::from_templates(&day_templates(), visible_weeks);
    ModelInput::new(horizon, staff(), skill_catalog())
}

/// Appends `per_team` open-skill employees (`V1`, `V2`, ...) to every team,
/// for staffing analysis runs.
pub fn add_virtual_employees(input: &mut ModelInput, per_team: usize) {
    for team in &mut input.teams {
        for i in 1..=per_team {
            team.employees
                .push(Employee::new(format!("V{i}"), vec![]).open_skills());
        }
    }
}
