//! Mutators: the sanctioned transformations over signal groups and
//! datasets. Every mutator takes an owned or borrowed input and produces
//! a fresh value; inputs are never aliased into outputs.
//!
//! Unresolved selectors follow one dual-mode contract throughout: the
//! plain form returns a match report and warns, the `_strict` form turns
//! any miss into a hard error.

use crate::dataset::Dataset;
use crate::error::{ModelError, Result};
use crate::group::{SignalGroup, TimeMode};
use crate::ident::is_valid_ident;
use crate::lookup::LookupTable;
use crate::resolve::find_name;
use crate::value::Value;
use tracing::warn;

/// Channel selector: a name list (resolved like `find_name`, first match
/// per name) or explicit column indices.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    Names(Vec<String>),
    Indices(Vec<usize>),
}

impl Selector {
    pub fn names<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self::Names(names.into_iter().map(Into::into).collect())
    }

    pub fn indices(indices: impl IntoIterator<Item = usize>) -> Self {
        Self::Indices(indices.into_iter().collect())
    }

    fn len(&self) -> usize {
        match self {
            Self::Names(n) => n.len(),
            Self::Indices(i) => i.len(),
        }
    }

    fn describe(&self, entry: usize) -> String {
        match self {
            Self::Names(n) => n[entry].clone(),
            Self::Indices(i) => format!("#{}", i[entry]),
        }
    }
}

/// Result of [`select_channels`]: the reduced group, one matched flag per
/// selector entry, and the source column for each kept channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub group: SignalGroup,
    pub matched: Vec<bool>,
    pub index_map: Vec<usize>,
}

/// Gather channels in selector order (not original column order).
/// Duplicate selector entries yield duplicate output columns. Unmatched
/// entries are dropped from the result and flagged in `matched`.
pub fn select_channels(selector: &Selector, group: &SignalGroup) -> Result<Selection> {
    group.ensure_valid(TimeMode::Plain)?;

    let mut matched = Vec::with_capacity(selector.len());
    let mut index_map = Vec::new();
    match selector {
        Selector::Names(names) => {
            for name in names {
                let hits = find_name(name, group);
                match hits.first() {
                    Some(&first) => {
                        if hits.len() > 1 {
                            warn!(
                                name = %name,
                                hits = hits.len(),
                                "name is ambiguous, using first match"
                            );
                        }
                        matched.push(true);
                        index_map.push(first);
                    }
                    None => matched.push(false),
                }
            }
        }
        Selector::Indices(indices) => {
            for &idx in indices {
                if idx < group.channel_count() {
                    matched.push(true);
                    index_map.push(idx);
                } else {
                    matched.push(false);
                }
            }
        }
    }

    if matched.iter().any(|m| !m) {
        let missing: Vec<String> = matched
            .iter()
            .enumerate()
            .filter(|(_, m)| !**m)
            .map(|(i, _)| selector.describe(i))
            .collect();
        warn!(?missing, "selector entries matched no channel, dropped");
    }

    Ok(Selection {
        group: gather(group, &index_map),
        matched,
        index_map,
    })
}

/// Hard-error form: every selector entry must resolve.
pub fn select_channels_strict(selector: &Selector, group: &SignalGroup) -> Result<SignalGroup> {
    let selection = select_channels(selector, group)?;
    if let Some(entry) = selection.matched.iter().position(|m| !m) {
        return Err(ModelError::unresolved(
            selector.describe(entry),
            "signal group",
        ));
    }
    Ok(selection.group)
}

fn gather(group: &SignalGroup, index_map: &[usize]) -> SignalGroup {
    let mut out = SignalGroup {
        layers: group.layers.clone(),
        units: Vec::with_capacity(index_map.len()),
        descriptions: Vec::with_capacity(index_map.len()),
        values: Vec::with_capacity(index_map.len()),
    };
    for (layer, _) in group.layers.iter() {
        let picked = index_map
            .iter()
            .map(|&src| group.name_on(layer, src).to_string())
            .collect();
        out.layers.insert(layer.to_string(), picked);
    }
    for &src in index_map {
        out.units.push(group.units[src].clone());
        out.descriptions.push(group.descriptions[src].clone());
        out.values.push(group.values[src].clone());
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveMode {
    /// Delete matched columns, compacting the group.
    Drop,
    /// Keep the column but set its data to NaN and clear its names,
    /// units, and description.
    Blank,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Removal {
    pub group: SignalGroup,
    pub matched: Vec<bool>,
}

/// Remove every channel matched by any selector entry — all matches per
/// entry, not just the first.
pub fn remove_channels(
    selector: &Selector,
    group: &SignalGroup,
    mode: RemoveMode,
) -> Result<Removal> {
    group.ensure_valid(TimeMode::Plain)?;

    let width = group.channel_count();
    let mut doomed = vec![false; width];
    let mut matched = Vec::with_capacity(selector.len());
    match selector {
        Selector::Names(names) => {
            for name in names {
                let hits = find_name(name, group);
                matched.push(!hits.is_empty());
                for hit in hits {
                    doomed[hit] = true;
                }
            }
        }
        Selector::Indices(indices) => {
            for &idx in indices {
                if idx < width {
                    matched.push(true);
                    doomed[idx] = true;
                } else {
                    matched.push(false);
                }
            }
        }
    }

    if matched.iter().any(|m| !m) {
        let missing: Vec<String> = matched
            .iter()
            .enumerate()
            .filter(|(_, m)| !**m)
            .map(|(i, _)| selector.describe(i))
            .collect();
        warn!(?missing, "removal selectors matched no channel");
    }

    let out = match mode {
        RemoveMode::Drop => {
            let keep: Vec<usize> = (0..width).filter(|&c| !doomed[c]).collect();
            gather(group, &keep)
        }
        RemoveMode::Blank => {
            let mut out = group.clone();
            let rows = group.sample_count();
            for channel in 0..width {
                if !doomed[channel] {
                    continue;
                }
                out.values[channel] = vec![f64::NAN; rows];
                out.units[channel].clear();
                out.descriptions[channel].clear();
                for layer in group.layers.keys() {
                    if let Some(names) = out.layers.get_mut(layer) {
                        names[channel].clear();
                    }
                }
            }
            out
        }
    };

    Ok(Removal { group: out, matched })
}

pub fn remove_channels_strict(
    selector: &Selector,
    group: &SignalGroup,
    mode: RemoveMode,
) -> Result<SignalGroup> {
    let removal = remove_channels(selector, group, mode)?;
    if let Some(entry) = removal.matched.iter().position(|m| !m) {
        return Err(ModelError::unresolved(
            selector.describe(entry),
            "signal group",
        ));
    }
    Ok(removal.group)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CopyReport {
    pub group: SignalGroup,
    pub matched: Vec<bool>,
}

/// Broadcast named channels from `src` onto `dst`: each name must
/// resolve to exactly one source column, and overwrites the data, units,
/// and description of every matching destination column. Names that
/// resolve nowhere on either side are flagged; an ambiguous source name
/// is a hard error.
pub fn copy_signals(src: &SignalGroup, dst: &SignalGroup, names: &[&str]) -> Result<CopyReport> {
    src.ensure_valid(TimeMode::Plain)?;
    dst.ensure_valid(TimeMode::Plain)?;
    if src.sample_count() != dst.sample_count() {
        return Err(ModelError::content(
            "copy signals",
            format!(
                "source has {} rows, destination has {}",
                src.sample_count(),
                dst.sample_count()
            ),
        ));
    }

    let mut out = dst.clone();
    let mut matched = Vec::with_capacity(names.len());
    for &name in names {
        let src_hits = find_name(name, src);
        if src_hits.len() > 1 {
            return Err(ModelError::content(
                "copy signals",
                format!("name {name:?} is ambiguous in the source group"),
            ));
        }
        let Some(&src_col) = src_hits.first() else {
            matched.push(false);
            continue;
        };
        let dst_hits = find_name(name, dst);
        if dst_hits.is_empty() {
            matched.push(false);
            continue;
        }
        for dst_col in dst_hits {
            out.values[dst_col] = src.values[src_col].clone();
            out.units[dst_col] = src.units[src_col].clone();
            out.descriptions[dst_col] = src.descriptions[src_col].clone();
        }
        matched.push(true);
    }

    if matched.iter().any(|m| !m) {
        let missing: Vec<&str> = names
            .iter()
            .zip(&matched)
            .filter(|(_, m)| !**m)
            .map(|(n, _)| *n)
            .collect();
        warn!(?missing, "signals not copied, unresolved on one side");
    }
    Ok(CopyReport { group: out, matched })
}

pub fn copy_signals_strict(
    src: &SignalGroup,
    dst: &SignalGroup,
    names: &[&str],
) -> Result<SignalGroup> {
    let report = copy_signals(src, dst, names)?;
    if let Some(entry) = report.matched.iter().position(|m| !m) {
        return Err(ModelError::unresolved(names[entry], "copy signals"));
    }
    Ok(report.group)
}

/// Set the name on one layer for every channel matching `name` on any
/// layer. Returns the new group and whether anything matched.
pub fn rename_on_layer(
    group: &SignalGroup,
    layer: &str,
    name: &str,
    new_name: &str,
) -> Result<(SignalGroup, bool)> {
    group.ensure_valid(TimeMode::Plain)?;
    if !group.layers.contains(layer) {
        return Err(ModelError::content(
            "rename",
            format!("group has no layer {layer:?}"),
        ));
    }
    if !new_name.is_empty() && !is_valid_ident(new_name) {
        return Err(ModelError::content(
            "rename",
            format!("{new_name:?} is not a valid identifier"),
        ));
    }

    let hits = find_name(name, group);
    let mut out = group.clone();
    if let Some(names) = out.layers.get_mut(layer) {
        for &hit in &hits {
            names[hit] = new_name.to_string();
        }
    }
    if hits.is_empty() {
        warn!(name, layer, "rename matched no channel");
    }
    Ok((out, !hits.is_empty()))
}

pub fn rename_on_layer_strict(
    group: &SignalGroup,
    layer: &str,
    name: &str,
    new_name: &str,
) -> Result<SignalGroup> {
    let (out, any) = rename_on_layer(group, layer, name, new_name)?;
    if !any {
        return Err(ModelError::unresolved(name, "signal group"));
    }
    Ok(out)
}

/// Replace the units string of every channel matching `name`.
pub fn replace_units(group: &SignalGroup, name: &str, units: &str) -> Result<(SignalGroup, bool)> {
    replace_attr(group, name, units, |out, channel, value| {
        out.units[channel] = value.to_string();
    })
}

pub fn replace_units_strict(group: &SignalGroup, name: &str, units: &str) -> Result<SignalGroup> {
    let (out, any) = replace_units(group, name, units)?;
    if !any {
        return Err(ModelError::unresolved(name, "signal group"));
    }
    Ok(out)
}

/// Replace the description of every channel matching `name`.
pub fn replace_description(
    group: &SignalGroup,
    name: &str,
    description: &str,
) -> Result<(SignalGroup, bool)> {
    replace_attr(group, name, description, |out, channel, value| {
        out.descriptions[channel] = value.to_string();
    })
}

pub fn replace_description_strict(
    group: &SignalGroup,
    name: &str,
    description: &str,
) -> Result<SignalGroup> {
    let (out, any) = replace_description(group, name, description)?;
    if !any {
        return Err(ModelError::unresolved(name, "signal group"));
    }
    Ok(out)
}

fn replace_attr(
    group: &SignalGroup,
    name: &str,
    value: &str,
    apply: impl Fn(&mut SignalGroup, usize, &str),
) -> Result<(SignalGroup, bool)> {
    group.ensure_valid(TimeMode::Plain)?;
    let hits = find_name(name, group);
    let mut out = group.clone();
    for &hit in &hits {
        apply(&mut out, hit, value);
    }
    if hits.is_empty() {
        warn!(name, "attribute replacement matched no channel");
    }
    Ok((out, !hits.is_empty()))
}

/// Canonicalize field and layer order: dataset fields per the canonical
/// schema, group layers per the lookup table's layer order when one is
/// given (other layers keep their relative position).
pub fn reorder_fields(mut value: Value, table: Option<&LookupTable>) -> Value {
    if let Some(table) = table {
        value.for_each_group_mut(|group| group.layers.reorder(&table.layers));
    }
    match &mut value {
        Value::Dataset(ds) => reorder_dataset(ds),
        Value::DatasetArray(dss) => dss.iter_mut().for_each(reorder_dataset),
        Value::Group(_) | Value::GroupArray(_) => {}
    }
    value
}

fn reorder_dataset(ds: &mut Dataset) {
    let order = ds.canonical_order();
    let mut fields: Vec<Option<(String, crate::dataset::Field)>> =
        std::mem::take(&mut ds.fields).into_iter().map(Some).collect();
    ds.fields = order
        .into_iter()
        .map(|idx| fields[idx].take().expect("permutation visits once"))
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::testutil::dataset;
    use crate::group::testutil::group;
    use crate::lookup::testutil::table;
    use pretty_assertions::assert_eq;

    fn abc() -> SignalGroup {
        let mut g = group(
            &[("oem_names", &["a", "b", "c"])],
            &["ua", "ub", "uc"],
            3,
        );
        // Distinct data per channel so gathering is observable.
        g.values = vec![vec![1.0; 3], vec![2.0; 3], vec![3.0; 3]];
        g
    }

    #[test]
    fn selection_follows_selector_order() {
        let g = abc();
        let sel = select_channels(&Selector::names(["b", "a"]), &g).unwrap();
        assert_eq!(sel.index_map, vec![1, 0]);
        assert_eq!(sel.matched, vec![true, true]);
        assert_eq!(sel.group.channel_count(), 2);
        assert_eq!(sel.group.name_on("oem_names", 0), "b");
        assert_eq!(sel.group.name_on("oem_names", 1), "a");
        assert_eq!(sel.group.units, vec!["ub".to_string(), "ua".into()]);
        assert_eq!(sel.group.values[0], vec![2.0; 3]);
    }

    #[test]
    fn duplicate_selectors_duplicate_columns() {
        let g = abc();
        let sel = select_channels(&Selector::names(["c", "c"]), &g).unwrap();
        assert_eq!(sel.index_map, vec![2, 2]);
        assert_eq!(sel.group.channel_count(), 2);
    }

    #[test]
    fn unmatched_selectors_are_dropped_and_flagged() {
        let g = abc();
        let sel = select_channels(&Selector::names(["a", "nope"]), &g).unwrap();
        assert_eq!(sel.matched, vec![true, false]);
        assert_eq!(sel.group.channel_count(), 1);
        assert!(select_channels_strict(&Selector::names(["a", "nope"]), &g).is_err());
    }

    #[test]
    fn index_selector_bounds() {
        let g = abc();
        let sel = select_channels(&Selector::indices([2, 7]), &g).unwrap();
        assert_eq!(sel.matched, vec![true, false]);
        assert_eq!(sel.index_map, vec![2]);
    }

    #[test]
    fn drop_removes_all_matches() {
        let mut g = abc();
        // Second layer aliasing channel 0 as "z", and channel 2 also "z"
        // on the first layer: one selector, two matched channels.
        g.layers.insert(
            "iso_names".to_string(),
            vec!["z".to_string(), String::new(), String::new()],
        );
        if let Some(names) = g.layers.get_mut("oem_names") {
            names[2] = "z".to_string();
        }
        let removal = remove_channels(&Selector::names(["z"]), &g, RemoveMode::Drop).unwrap();
        assert_eq!(removal.matched, vec![true]);
        assert_eq!(removal.group.channel_count(), 1);
        assert_eq!(removal.group.name_on("oem_names", 0), "b");
    }

    #[test]
    fn blank_preserves_width() {
        let g = abc();
        let removal = remove_channels(&Selector::names(["b"]), &g, RemoveMode::Blank).unwrap();
        assert_eq!(removal.group.channel_count(), 3);
        assert!(removal.group.values[1].iter().all(|v| v.is_nan()));
        assert_eq!(removal.group.name_on("oem_names", 1), "");
        assert_eq!(removal.group.units[1], "");
        // Neighbours untouched.
        assert_eq!(removal.group.values[0], vec![1.0; 3]);
        assert_eq!(removal.group.name_on("oem_names", 2), "c");
    }

    #[test]
    fn copy_broadcasts_to_every_destination_match() {
        let mut src = group(&[("oem_names", &["a"])], &["V"], 3);
        src.values = vec![vec![9.0; 3]];
        src.descriptions[0] = "calibrated".to_string();

        let mut dst = abc();
        // "a" appears twice in dst via a second layer.
        dst.layers.insert(
            "iso_names".to_string(),
            vec![String::new(), String::new(), "a".to_string()],
        );

        let report = copy_signals(&src, &dst, &["a"]).unwrap();
        assert_eq!(report.matched, vec![true]);
        assert_eq!(report.group.values[0], vec![9.0; 3]);
        assert_eq!(report.group.values[2], vec![9.0; 3]);
        assert_eq!(report.group.units[0], "V");
        assert_eq!(report.group.units[2], "V");
        assert_eq!(report.group.descriptions[2], "calibrated");
        assert_eq!(report.group.values[1], vec![2.0; 3]);
    }

    #[test]
    fn copy_rejects_row_mismatch_and_ambiguity() {
        let src = group(&[("oem_names", &["a"])], &["V"], 4);
        let dst = abc();
        assert!(matches!(
            copy_signals(&src, &dst, &["a"]),
            Err(ModelError::Content { .. })
        ));

        let src = group(&[("oem_names", &["a", "a"])], &["V", "V"], 3);
        assert!(matches!(
            copy_signals(&src, &dst, &["a"]),
            Err(ModelError::Content { .. })
        ));
    }

    #[test]
    fn copy_strict_requires_both_sides() {
        let src = group(&[("oem_names", &["x"])], &["V"], 3);
        let dst = abc();
        assert!(matches!(
            copy_signals_strict(&src, &dst, &["x"]),
            Err(ModelError::UnresolvedName { .. })
        ));
    }

    #[test]
    fn rename_touches_only_the_named_layer() {
        let mut g = abc();
        g.layers.insert(
            "iso_names".to_string(),
            vec!["ia".to_string(), "ib".into(), "ic".into()],
        );
        let (out, any) = rename_on_layer(&g, "iso_names", "a", "renamed").unwrap();
        assert!(any);
        assert_eq!(out.name_on("iso_names", 0), "renamed");
        assert_eq!(out.name_on("oem_names", 0), "a");
        // Resolution spans layers: renaming by the iso alias works too.
        let (out, any) = rename_on_layer(&g, "oem_names", "ib", "bee").unwrap();
        assert!(any);
        assert_eq!(out.name_on("oem_names", 1), "bee");
    }

    #[test]
    fn rename_dual_mode() {
        let g = abc();
        let (_, any) = rename_on_layer(&g, "oem_names", "ghost", "x").unwrap();
        assert!(!any);
        assert!(matches!(
            rename_on_layer_strict(&g, "oem_names", "ghost", "x"),
            Err(ModelError::UnresolvedName { .. })
        ));
    }

    #[test]
    fn replace_units_and_description() {
        let g = abc();
        let (out, any) = replace_units(&g, "b", "kW").unwrap();
        assert!(any);
        assert_eq!(out.units, vec!["ua".to_string(), "kW".into(), "uc".into()]);
        let (out, any) = replace_description(&g, "c", "third channel").unwrap();
        assert!(any);
        assert_eq!(out.descriptions[2], "third channel");
    }

    #[test]
    fn reorder_canonicalizes_dataset_fields() {
        let mut ds = dataset(4);
        ds.fields.rotate_left(2);
        assert!(!ds.is_canonical());
        let value = reorder_fields(Value::Dataset(ds), None);
        match value {
            Value::Dataset(ds) => {
                assert!(ds.is_canonical());
                assert!(ds.check().is_valid());
            }
            other => panic!("expected dataset, got {}", other.kind()),
        }
    }

    #[test]
    fn reorder_applies_table_layer_order() {
        let t = table();
        let g = group(
            &[
                ("private_names", &["p"]),
                ("iso_names", &["enginespeed"]),
                ("oem_names", &["rpm"]),
            ],
            &["1/min"],
            2,
        );
        let value = reorder_fields(Value::Group(g), Some(&t));
        match value {
            Value::Group(g) => {
                let keys: Vec<&str> = g.layers.keys().collect();
                assert_eq!(keys, vec!["oem_names", "iso_names", "private_names"]);
            }
            other => panic!("expected group, got {}", other.kind()),
        }
    }
}
