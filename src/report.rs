//! Reporting: the schedule grid (CSV for machine round-trips, styled XLSX
//! for humans) and per-employee cost tables on the console.

use std::path::Path;

use chrono::{Duration, NaiveDate};
use comfy_table::Table;
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook};

use crate::cp::Assignment;
use crate::error::RosterError;
use crate::input_data::ModelInput;
use crate::objective::{ObjectiveTerms, SoftWeights};
use crate::solution::{count_transitions, RosterSolution};

/// The tabular schedule: one header row, two rows per employee (shift names
/// above chosen skills), one column per visible day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleGrid {
    pub header: Vec<String>,
    pub rows: Vec<EmployeeRows>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeRows {
    pub team: String,
    pub team_index: usize,
    pub name: String,
    pub skills: String,
    pub manager: bool,
    pub shift_cells: Vec<String>,
    pub skill_cells: Vec<String>,
}

/// Lays the solution out as a grid in canonical employee order.
pub fn build_grid(input: &ModelInput, solution: &RosterSolution) -> ScheduleGrid {
    let day_count = input.visible_days().count();
    let mut header = vec!["Team".to_string(), "Name".to_string(), "Skills".to_string()];
    header.extend(input.visible_days().map(|d| input.day(d).name.clone()));

    let mut rows = Vec::new();
    for e in input.employees() {
        let employee = input.employee(e);
        let mut shift_cells = vec![String::new(); day_count];
        let mut skill_cells = vec![String::new(); day_count];
        for (i, d) in input.visible_days().enumerate() {
            if let Some(kind) = solution.absence_on(e, d) {
                shift_cells[i] = kind.label().to_string();
                skill_cells[i] = kind.label().to_string();
            }
            for key in solution.assignments_on(e, d) {
                shift_cells[i] = input.shift(key.slot).name.clone();
                skill_cells[i] = input.slot_skill(key.slot).label().to_string();
            }
        }
        rows.push(EmployeeRows {
            team: input.team(e.team).name.clone(),
            team_index: e.team,
            name: employee.name.clone(),
            skills: employee
                .skills
                .iter()
                .map(|s| s.label())
                .collect::<Vec<_>>()
                .join(", "),
            manager: employee.is_shift_manager,
            shift_cells,
            skill_cells,
        });
    }
    ScheduleGrid { header, rows }
}

/// Writes the grid in the layout the seed loader reads back.
pub fn write_csv(grid: &ScheduleGrid, path: &Path) -> Result<(), RosterError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&grid.header)?;
    for row in &grid.rows {
        let mut upper = vec![row.team.clone(), row.name.clone(), row.skills.clone()];
        upper.extend(row.shift_cells.iter().cloned());
        writer.write_record(&upper)?;
        let mut lower = vec![String::new(), String::new(), String::new()];
        lower.extend(row.skill_cells.iter().cloned());
        writer.write_record(&lower)?;
    }
    writer.flush()?;
    Ok(())
}

const WEEKEND_COLOR: u32 = 0xF3AF9A;
const TEAM_COLORS: [u32; 3] = [0xFFF2CC, 0xE2F0D9, 0xDEEBF7];

/// Cell fill of the fixed palette, keyed by shift or skill label.
fn fill_color(label: &str) -> Option<u32> {
    match label {
        "M" => Some(0x92D050),
        "A" => Some(0xFFC000),
        "N" => Some(0x00B0F0),
        "MO:M1" | "H1:M1" | "H2:M1" => Some(0xFF99FF),
        "H:M2" => Some(0x99FF99),
        "MO:M3" | "H:M3" => Some(0x66FFFF),
        "MO:M4" => Some(0xCC9900),
        "vac" | "ill" => Some(0xD9D9D9),
        _ => None,
    }
}

fn is_weekend(day_name: &str) -> bool {
    day_name == "Sa" || day_name == "Su"
}

/// Writes the styled workbook: palette fills per shift/skill, shaded weekend
/// columns, emphasized shift-manager rows, thin borders.
pub fn write_xlsx(
    grid: &ScheduleGrid,
    path: &Path,
    anchor_monday: Option<NaiveDate>,
) -> Result<(), RosterError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let thin = Format::new().set_border(FormatBorder::Thin);

    for (col, title) in grid.header.iter().take(3).enumerate() {
        sheet.write_string_with_format(0, col as u16, title, &thin)?;
    }

    // Team band across each employee's first row.
    for (i, row) in grid.rows.iter().enumerate() {
        let sheet_row = 1 + 2 * i as u32;
        let band = Format::new()
            .set_background_color(Color::RGB(TEAM_COLORS[row.team_index % TEAM_COLORS.len()]));
        for col in 0..grid.header.len() as u16 {
            sheet.write_blank(sheet_row, col, &band)?;
        }
        let label = if row.manager {
            band.clone().set_bold()
        } else {
            band.clone()
        };
        sheet.write_string_with_format(sheet_row, 0, &row.team, &label)?;
        sheet.write_string_with_format(sheet_row, 1, &row.name, &label)?;
        sheet.write_string_with_format(sheet_row, 2, &row.skills, &label)?;
    }

    // Day columns: header plus weekend shading down the whole column.
    let day_names: Vec<&String> = grid.header.iter().skip(3).collect();
    let total_rows = 1 + 2 * grid.rows.len() as u32;
    for (i, day_name) in day_names.iter().enumerate() {
        let col = (3 + i) as u16;
        let title = match anchor_monday {
            Some(monday) => {
                let date = monday + Duration::days(i as i64);
                format!("{day_name} {}", date.format("%d.%m."))
            }
            None => day_name.to_string(),
        };
        sheet.write_string_with_format(0, col, &title, &thin)?;
        if is_weekend(day_name) {
            let weekend = Format::new()
                .set_background_color(Color::RGB(WEEKEND_COLOR))
                .set_border(FormatBorder::Thin);
            for sheet_row in 1..total_rows {
                sheet.write_blank(sheet_row, col, &weekend)?;
            }
        }
    }

    // Assignment cells overwrite the band/weekend fills.
    for (i, row) in grid.rows.iter().enumerate() {
        let upper = 1 + 2 * i as u32;
        for (d, (shift, skill)) in row
            .shift_cells
            .iter()
            .zip(row.skill_cells.iter())
            .enumerate()
        {
            let col = (3 + d) as u16;
            for (sheet_row, label) in [(upper, shift), (upper + 1, skill)] {
                if label.is_empty() {
                    continue;
                }
                let mut format = Format::new().set_border(FormatBorder::Thin);
                if let Some(rgb) = fill_color(label) {
                    format = format.set_background_color(Color::RGB(rgb));
                }
                sheet.write_string_with_format(sheet_row, col, label, &format)?;
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// Per-employee cost table from a solved model, one count and one squared
/// cost column per term, with a totals row.
pub fn cost_table(
    input: &ModelInput,
    terms: &ObjectiveTerms,
    assignment: &Assignment,
) -> Table {
    let reported: Vec<_> = terms
        .terms
        .iter()
        .filter(|t| !t.per_employee.is_empty())
        .collect();

    let mut table = Table::new();
    let mut header = vec!["Team".to_string(), "Employee".to_string()];
    for term in &reported {
        header.push(term.label.to_string());
        header.push(format!("{} cost", term.label));
    }
    header.push("sum costs".to_string());
    table.set_header(header);

    let mut totals = vec![0i64; reported.len()];
    let mut grand_total = 0i64;
    for e in input.employees() {
        let mut cells = vec![
            input.team(e.team).name.clone(),
            input.employee(e).name.clone(),
        ];
        let mut employee_sum = 0i64;
        for (i, term) in reported.iter().enumerate() {
            match term.per_employee.iter().find(|(emp, _)| *emp == e) {
                Some((_, var)) => {
                    let weighted = assignment.int_value(*var);
                    let cost = weighted * weighted;
                    cells.push((weighted / term.weight.max(1)).to_string());
                    cells.push(cost.to_string());
                    totals[i] += cost;
                    employee_sum += cost;
                }
                None => {
                    cells.push("-".to_string());
                    cells.push("-".to_string());
                }
            }
        }
        grand_total += employee_sum;
        cells.push(employee_sum.to_string());
        table.add_row(cells);
    }

    let mut footer = vec!["sum".to_string(), String::new()];
    for total in &totals {
        footer.push(String::new());
        footer.push(total.to_string());
    }
    footer.push(grand_total.to_string());
    table.add_row(footer);
    table
}

/// Per-employee cost table recomputed directly from a reported roster (used
/// when verifying an externally solved grid, where no engine values exist).
pub fn metric_table(
    input: &ModelInput,
    solution: &RosterSolution,
    weights: &SoftWeights,
    night_shift: &str,
) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Team",
        "Employee",
        "transitions",
        "transition cost",
        "night transitions",
        "night transition cost",
        "night shifts",
        "night shift cost",
        "total shifts",
        "total shift cost",
        "overtime",
        "overtime cost",
        "sum costs",
    ]);

    for e in input.employees() {
        let worked = solution.worked_pattern(input, e);
        let nights = solution.kind_pattern(input, e, night_shift);

        let transitions = count_transitions(&worked) as i64;
        let night_transitions = count_transitions(&nights) as i64;
        let night_count = solution.assignment_count(input, e, Some(night_shift)) as i64;
        let total_count = solution.assignment_count(input, e, None) as i64;
        let overtime = long_span_overtime(&worked);

        let costs = [
            (transitions, weights.transitions),
            (night_transitions, weights.night_transitions),
            (night_count, weights.night_balance),
            (total_count, weights.shift_balance),
            (overtime, weights.long_spans),
        ];
        let mut cells = vec![
            input.team(e.team).name.clone(),
            input.employee(e).name.clone(),
        ];
        let mut employee_sum = 0i64;
        for (metric, weight) in costs {
            let cost = (metric * weight).pow(2);
            employee_sum += cost;
            cells.push(metric.to_string());
            cells.push(cost.to_string());
        }
        cells.push(employee_sum.to_string());
        table.add_row(cells);
    }
    table
}

/// Overtime metric over the visible pattern: 7-day windows stepping by two
/// days, `max(0, worked - 5)` each.
fn long_span_overtime(pattern: &[bool]) -> i64 {
    let mut overtime = 0i64;
    let mut start = 0usize;
    while start + 7 <= pattern.len() {
        let worked = pattern[start..start + 7].iter().filter(|&&w| w).count() as i64;
        overtime += (worked - 5).max(0);
        start += 2;
    }
    overtime
}
