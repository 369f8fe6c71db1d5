//! Seed loading: read a previously produced schedule grid and pin its
//! decisions as equalities.

use std::path::Path;

use crate::cp::{CpModel, LinearExpr};
use crate::error::RosterError;
use crate::input_data::{ModelInput, WEEKDAYS};
use crate::universe::{parse_key, ParsedKey, Universe};

/// Reads a schedule grid and extracts the textual decision keys.
///
/// Layout: row 0 is the header (weekday names from column 4 on); every
/// employee occupies two rows, the upper carrying shift names per day, the
/// lower the chosen skill; columns 1-3 are team, name and skills (skills are
/// ignored on read).
pub fn read_seed_grid(path: &Path) -> Result<Vec<String>, RosterError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|cell| cell.trim().to_string()).collect());
    }
    Ok(keys_from_rows(&rows))
}

/// Grid rows to textual keys. A populated (shift, skill) pair at day index d
/// yields `Week{d/7+1}_{weekday}_{shift}_{team}_{name}_{skill}`.
pub fn keys_from_rows(rows: &[Vec<String>]) -> Vec<String> {
    let mut keys = Vec::new();
    let mut i = 1;
    while i < rows.len() {
        let Some(next) = rows.get(i + 1) else { break };
        let row = &rows[i];
        let team = row.first().cloned().unwrap_or_default();
        let name = row.get(1).cloned().unwrap_or_default();
        let day_cells = row.len().max(next.len()).saturating_sub(3);
        for day_number in 0..day_cells {
            let shift = row.get(day_number + 3).map(String::as_str).unwrap_or("");
            let skill = next.get(day_number + 3).map(String::as_str).unwrap_or("");
            if shift.is_empty() || skill.is_empty() {
                continue;
            }
            keys.push(format!(
                "Week{}_{}_{}_{}_{}_{}",
                day_number / 7 + 1,
                WEEKDAYS[day_number % 7],
                shift,
                team,
                name,
                skill
            ));
        }
        i += 2;
    }
    keys
}

/// Resolves the textual keys and pins each underlying variable to one.
/// Malformed or unknown keys fail the build.
pub fn pin_seed_keys(
    model: &mut CpModel,
    input: &ModelInput,
    universe: &Universe,
    keys: &[String],
) -> Result<Vec<ParsedKey>, RosterError> {
    let mut parsed = Vec::with_capacity(keys.len());
    for key in keys {
        let resolved = parse_key(input, key)?;
        model.add_eq(LinearExpr::from_bool(universe.var_of(&resolved)), 1);
        parsed.push(resolved);
    }
    Ok(parsed)
}
