//! Workbook → [`LookupTable`] with an error-accumulating checker.
//!
//! Validation never fails fast: one pass collects every violation, each
//! error naming the sheet, row/column, and broken rule, so the whole
//! source can be fixed in one round.

use crate::error::{ModelError, Result};
use crate::ident::is_valid_ident;
use crate::lookup::{FACTOR_WILDCARD, Factor, LookupGroup, LookupTable, SourceEntry, SourceTab};
use crate::workbook::{Sheet, Workbook};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

pub const MASTER_SHEET: &str = "MASTER";

const REQUIRED_COLUMNS: [&str; 6] = [
    "Group",
    "Signal",
    "Factor",
    "Units",
    "Comments",
    "Descriptions",
];

/// Standalone checker: `(is_valid, errors)`.
pub fn check_workbook(workbook: &Workbook) -> (bool, Vec<String>) {
    let (_, errors) = parse_workbook(workbook);
    (errors.is_empty(), errors)
}

/// Parse and validate; any violation fails the build with the full list.
pub fn build(workbook: &Workbook) -> Result<LookupTable> {
    let (table, errors) = parse_workbook(workbook);
    if !errors.is_empty() {
        return Err(ModelError::SchemaViolation { errors });
    }
    info!(
        layers = table.layers.len(),
        groups = table.groups.len(),
        source_tabs = table.source_tabs.len(),
        "lookup table loaded"
    );
    Ok(table)
}

fn parse_workbook(workbook: &Workbook) -> (LookupTable, Vec<String>) {
    let mut errors = Vec::new();
    let mut table = LookupTable::default();

    match workbook.sheet(MASTER_SHEET) {
        Some(master) => parse_master(master, &mut table, &mut errors),
        None => errors.push(format!("workbook has no {MASTER_SHEET:?} sheet")),
    }

    let tags: BTreeSet<String> = table.source_type_of.values().cloned().collect();
    for tag in &tags {
        match workbook.sheet(tag) {
            Some(sheet) => {
                let tab = parse_source_tab(sheet, &mut errors);
                table.source_tabs.insert(tag.clone(), tab);
            }
            None => errors.push(format!("missing source sheet {tag:?}")),
        }
    }

    cross_check(&table, &mut errors);
    (table, errors)
}

/// Header row = layer identifiers, second row = per-layer source types,
/// body rows = group name then one name per layer, blank rows separating
/// groups.
fn parse_master(sheet: &Sheet, table: &mut LookupTable, errors: &mut Vec<String>) {
    if sheet.rows.len() < 2 {
        errors.push("MASTER: need a layer header row and a source-type row".to_string());
        return;
    }

    let header = &sheet.rows[0];
    if header.len() < 2 {
        errors.push("MASTER row 1: no layer columns".to_string());
    }
    for (col, cell) in header.iter().enumerate().skip(1) {
        if !is_valid_ident(cell) {
            errors.push(format!(
                "MASTER row 1, column {}: invalid layer identifier {cell:?}",
                col + 1
            ));
        }
        table.layers.push(cell.clone());
    }

    let types = &sheet.rows[1];
    for (idx, layer) in table.layers.iter().enumerate() {
        let col = idx + 1;
        let tag = types.get(col).map_or("", String::as_str);
        if tag.is_empty() {
            errors.push(format!(
                "MASTER row 2: missing source type for layer {layer:?}"
            ));
        } else if !is_valid_ident(tag) {
            errors.push(format!(
                "MASTER row 2, column {}: invalid source type {tag:?}",
                col + 1
            ));
        } else {
            table.source_type_of.insert(layer.clone(), tag.to_string());
        }
    }

    let layer_count = table.layers.len();
    let mut current: Option<usize> = None;
    let mut seen_groups: BTreeSet<String> = BTreeSet::new();

    for (row_idx, row) in sheet.rows.iter().enumerate().skip(2) {
        let rowno = row_idx + 1;
        if row.is_empty() {
            current = None;
            continue;
        }

        let group_name = row.first().map_or("", String::as_str);
        if group_name.is_empty() {
            errors.push(format!("MASTER row {rowno}: signal row is missing its group"));
            continue;
        }
        if !is_valid_ident(group_name) {
            errors.push(format!(
                "MASTER row {rowno}: invalid group name {group_name:?}"
            ));
        }

        let start_new = match current {
            Some(idx) => table.groups[idx].name != group_name,
            None => true,
        };
        if start_new {
            if !seen_groups.insert(group_name.to_string()) {
                errors.push(format!(
                    "MASTER row {rowno}: group {group_name:?} appears in more than one block"
                ));
            }
            table.groups.push(LookupGroup {
                name: group_name.to_string(),
                rows: Vec::new(),
            });
            current = Some(table.groups.len() - 1);
        }

        if row.len() > layer_count + 1 {
            errors.push(format!(
                "MASTER row {rowno}: {} name cells for {layer_count} layer(s)",
                row.len() - 1
            ));
        }

        let mut names = Vec::with_capacity(layer_count);
        for col in 0..layer_count {
            let name = row.get(col + 1).map_or("", String::as_str);
            if !name.is_empty() && !is_valid_ident(name) {
                errors.push(format!(
                    "MASTER row {rowno}, column {}: invalid signal name {name:?}",
                    col + 2
                ));
            }
            names.push(name.to_string());
        }
        if let Some(idx) = current {
            table.groups[idx].rows.push(names);
        }
    }
}

/// Required columns are matched by header name, order-independent; extra
/// columns are ignored.
fn parse_source_tab(sheet: &Sheet, errors: &mut Vec<String>) -> SourceTab {
    let mut tab = SourceTab::new();
    let tag = sheet.name.as_str();

    let Some(header) = sheet.rows.first() else {
        errors.push(format!("sheet {tag:?}: empty sheet"));
        return tab;
    };

    let mut columns: BTreeMap<&str, usize> = BTreeMap::new();
    for required in REQUIRED_COLUMNS {
        match header.iter().position(|cell| cell == required) {
            Some(idx) => {
                columns.insert(required, idx);
            }
            None => errors.push(format!(
                "sheet {tag:?}: missing required column {required:?}"
            )),
        }
    }
    if columns.len() != REQUIRED_COLUMNS.len() {
        return tab;
    }
    let cell = |row: &[String], key: &str| -> String {
        columns
            .get(key)
            .and_then(|&i| row.get(i))
            .cloned()
            .unwrap_or_default()
    };

    for (row_idx, row) in sheet.rows.iter().enumerate().skip(1) {
        let rowno = row_idx + 1;
        if row.is_empty() {
            continue;
        }

        let signal = cell(row, "Signal");
        if signal.is_empty() {
            errors.push(format!("sheet {tag:?} row {rowno}: missing signal name"));
            continue;
        }
        if !is_valid_ident(&signal) {
            errors.push(format!(
                "sheet {tag:?} row {rowno}: invalid signal name {signal:?}"
            ));
        }

        let group = cell(row, "Group");
        if group.is_empty() {
            errors.push(format!(
                "sheet {tag:?} row {rowno}: signal {signal:?} is missing its group"
            ));
        } else if !is_valid_ident(&group) {
            errors.push(format!(
                "sheet {tag:?} row {rowno}: invalid group name {group:?}"
            ));
        }

        let factor_cell = cell(row, "Factor");
        let factor = match Factor::parse(&factor_cell) {
            Some(f) => f,
            None => {
                errors.push(format!(
                    "sheet {tag:?} row {rowno}: factor {factor_cell:?} is neither \
                     numeric nor {FACTOR_WILDCARD:?}"
                ));
                Factor::Free
            }
        };

        let entry = SourceEntry {
            group,
            factor,
            units: cell(row, "Units"),
            description: cell(row, "Descriptions"),
        };
        if tab.insert(signal.clone(), entry).is_some() {
            errors.push(format!(
                "sheet {tag:?} row {rowno}: duplicate signal {signal:?}"
            ));
        }
    }
    tab
}

/// Every signal referenced by a source-assigned layer must be registered
/// in that layer's source tab.
fn cross_check(table: &LookupTable, errors: &mut Vec<String>) {
    for (idx, layer) in table.layers.iter().enumerate() {
        let Some(tag) = table.source_type(layer) else {
            continue;
        };
        let Some(tab) = table.source_tabs.get(tag) else {
            continue;
        };
        for group in &table.groups {
            for row in &group.rows {
                let name = row[idx].as_str();
                if !name.is_empty() && !tab.contains_key(name) {
                    errors.push(format!(
                        "layer {layer:?}: signal {name:?} (group {:?}) is not \
                         registered in source sheet {tag:?}",
                        group.name
                    ));
                }
            }
        }
    }
}
