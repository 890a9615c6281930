//! Flat, diffable rendering of a parsed lookup table.
//!
//! One section per sheet, tab-separated cells, deterministic ordering
//! (master order for groups, sorted order for source tabs and their
//! signals). The layout is stable so exports can be tracked with plain
//! text diffs.

use crate::lookup::LookupTable;
use crate::lookup::parse::MASTER_SHEET;

pub fn export_flat(table: &LookupTable) -> String {
    let mut out = String::new();

    section(&mut out, MASTER_SHEET);
    push_line(&mut out, "layers", table.layers.iter().map(String::as_str));
    push_line(
        &mut out,
        "types",
        table
            .layers
            .iter()
            .map(|l| table.source_type(l).unwrap_or("")),
    );
    for group in &table.groups {
        out.push_str("group\t");
        out.push_str(&group.name);
        out.push('\n');
        for row in &group.rows {
            out.push('\t');
            out.push_str(&row.join("\t"));
            out.push('\n');
        }
    }

    for (tag, tab) in &table.source_tabs {
        section(&mut out, tag);
        for (signal, entry) in tab {
            out.push_str(signal);
            out.push('\t');
            out.push_str(&entry.group);
            out.push('\t');
            out.push_str(&entry.factor.to_string());
            out.push('\t');
            out.push_str(&entry.units);
            out.push('\t');
            out.push_str(&entry.description);
            out.push('\n');
        }
    }

    out
}

fn section(out: &mut String, name: &str) {
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str("== ");
    out.push_str(name);
    out.push_str(" ==\n");
}

fn push_line<'a>(out: &mut String, label: &str, cells: impl Iterator<Item = &'a str>) {
    out.push_str(label);
    for cell in cells {
        out.push('\t');
        out.push_str(cell);
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::testutil::table;
    use pretty_assertions::assert_eq;

    #[test]
    fn stable_layout() {
        let rendered = export_flat(&table());
        let expected = "\
== MASTER ==
layers\toem_names\tiso_names
types\tRig\tBus
group\tEng
\trpm\tenginespeed
\ttorque\tenginetorque
group\tAmb
\twind\twindspeed

== Bus ==
enginespeed\tEng\t-\trpm\tEngine speed
enginetorque\tEng\t-\tNm\tEngine torque
windspeed\tAmb\t-\tm/s\tWind speed

== Rig ==
rpm\tEng\t1\t1/min\tEngine speed
torque\tEng\t1\tNm\tEngine torque
wind\tAmb\t0.514\tm/s\tWind speed
";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn rendering_is_deterministic() {
        assert_eq!(export_flat(&table()), export_flat(&table()));
    }
}
