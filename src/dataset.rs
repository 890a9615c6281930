//! Datasets: named bundles of signal groups sharing one time axis, plus
//! free-form metadata fields.
//!
//! Field order is an explicit, ordered key list with a canonical schema:
//! metadata first, then the time group, then the remaining groups in
//! discovery order, with a conventional `source` metadata field last.

use crate::check::Report;
use crate::error::Result;
use crate::group::{SignalGroup, TimeMode, check_group_refs};
use crate::ident::is_valid_ident;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Name of the mandatory time-axis group.
pub const TIME_FIELD: &str = "Time";

/// Conventional trailing metadata field.
pub const SOURCE_FIELD: &str = "source";

/// One dataset field: a signal group or an arbitrary metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Field {
    Group(SignalGroup),
    Meta(serde_json::Value),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub fields: Vec<(String, Field)>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_group(&mut self, name: impl Into<String>, group: SignalGroup) {
        self.fields.push((name.into(), Field::Group(group)));
    }

    pub fn push_meta(&mut self, name: impl Into<String>, value: serde_json::Value) {
        self.fields.push((name.into(), Field::Meta(value)));
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, f)| f)
    }

    pub fn group(&self, name: &str) -> Option<&SignalGroup> {
        match self.field(name) {
            Some(Field::Group(g)) => Some(g),
            _ => None,
        }
    }

    pub fn time(&self) -> Option<&SignalGroup> {
        self.group(TIME_FIELD)
    }

    /// Signal-group fields in field order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &SignalGroup)> {
        self.fields.iter().filter_map(|(k, f)| match f {
            Field::Group(g) => Some((k.as_str(), g)),
            Field::Meta(_) => None,
        })
    }

    pub fn groups_mut(&mut self) -> impl Iterator<Item = (&str, &mut SignalGroup)> {
        self.fields.iter_mut().filter_map(|(k, f)| match f {
            Field::Group(g) => Some((k.as_str(), g)),
            Field::Meta(_) => None,
        })
    }

    pub fn group_names(&self) -> Vec<&str> {
        self.groups().map(|(k, _)| k).collect()
    }

    /// Row count shared by every group, taken from the time axis.
    pub fn data_len(&self) -> Option<usize> {
        self.time().map(SignalGroup::sample_count)
    }

    /// Canonical field permutation: metadata (minus `source`), `Time`,
    /// remaining groups in discovery order, `source` last.
    pub fn canonical_order(&self) -> Vec<usize> {
        let rank = |(name, field): &(String, Field)| match field {
            Field::Meta(_) if name == SOURCE_FIELD => 3usize,
            Field::Meta(_) => 0,
            Field::Group(_) if name == TIME_FIELD => 1,
            Field::Group(_) => 2,
        };
        let mut order: Vec<usize> = (0..self.fields.len()).collect();
        order.sort_by_key(|&i| rank(&self.fields[i]));
        order
    }

    pub fn is_canonical(&self) -> bool {
        self.canonical_order()
            .iter()
            .enumerate()
            .all(|(pos, &idx)| pos == idx)
    }

    /// Validity check; accumulates every violation.
    pub fn check(&self) -> Report {
        let mut report = Report::new("dataset");

        let time_fields = self
            .fields
            .iter()
            .filter(|(k, _)| k == TIME_FIELD)
            .count();
        match (time_fields, self.time()) {
            (0, _) => report.shape("missing the \"Time\" group"),
            (1, None) => report.shape("field \"Time\" is not a signal group"),
            (1, Some(_)) => {}
            (n, _) => report.shape(format!("{n} fields named \"Time\"")),
        }

        let mut seen = BTreeSet::new();
        for (name, _) in &self.fields {
            if !seen.insert(name.as_str()) {
                report.shape(format!("duplicate field {name:?}"));
            }
        }

        for (name, group) in self.groups() {
            if !is_valid_ident(name) {
                report.content(format!("group name {name:?} is not a valid identifier"));
            }
            let mode = if name == TIME_FIELD {
                TimeMode::Time
            } else {
                TimeMode::Plain
            };
            let mut inner = group.check(mode);
            inner.subject = format!("group {name:?}");
            report.absorb(inner);
        }

        if let Some(rows) = self.data_len() {
            for (name, group) in self.groups() {
                if name != TIME_FIELD && group.sample_count() != rows {
                    report.content(format!(
                        "group {name:?} has {} rows, time axis has {rows}",
                        group.sample_count()
                    ));
                }
            }
        }

        if !self.is_canonical() {
            report.content("fields are not in canonical order");
        }

        report
    }

    pub fn ensure_valid(&self) -> Result<()> {
        self.check().into_result()
    }
}

/// Homogeneity check for an ordered sequence of datasets: same group
/// names everywhere, and per-group signal-group-array homogeneity across
/// the sequence. Row counts may vary per element.
pub fn check_dataset_array(elements: &[Dataset]) -> Report {
    let mut report = Report::new("dataset array");

    for (idx, element) in elements.iter().enumerate() {
        let mut inner = element.check();
        inner.subject = format!("element {idx}");
        report.absorb(inner);
    }

    if elements.len() < 2 {
        return report;
    }

    let first_names: Vec<&str> = elements[0].group_names();
    for (idx, element) in elements.iter().enumerate().skip(1) {
        let names = element.group_names();
        if names != first_names {
            report.content(format!(
                "element {idx}: group names {names:?} differ from {first_names:?}"
            ));
        }
    }
    if !report.is_valid() {
        return report;
    }

    for name in &first_names {
        let slice: Vec<&SignalGroup> = elements.iter().filter_map(|d| d.group(name)).collect();
        let mode = if *name == TIME_FIELD {
            TimeMode::Time
        } else {
            TimeMode::Plain
        };
        let mut inner = check_group_refs(&slice, mode);
        inner.subject = format!("group {name:?} across elements");
        report.absorb(inner);
    }

    report
}


#[cfg(test)]
mod tests {
    use super::testutil::dataset;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn valid_dataset_passes() {
        let ds = dataset(8);
        let report = ds.check();
        assert!(report.is_candidate());
        assert!(report.is_valid(), "flaws: {:?}", report.flaws);
        assert_eq!(ds.data_len(), Some(8));
    }

    #[test]
    fn missing_time_is_not_a_candidate() {
        let mut ds = dataset(4);
        ds.fields.retain(|(k, _)| k != TIME_FIELD);
        let report = ds.check();
        assert!(!report.is_candidate());
    }

    #[test]
    fn row_count_mismatch_names_the_group() {
        let mut ds = dataset(4);
        if let Some(Field::Group(g)) = ds
            .fields
            .iter_mut()
            .find(|(k, _)| k == "Eng")
            .map(|(_, f)| f)
        {
            for column in &mut g.values {
                column.pop();
            }
        }
        let report = ds.check();
        assert!(report.is_candidate());
        assert!(!report.is_valid());
        assert!(report.messages().join("; ").contains("\"Eng\""));
    }

    #[test]
    fn non_canonical_order_is_flagged() {
        let mut ds = dataset(4);
        ds.fields.swap(0, 1);
        assert!(!ds.check().is_valid());
    }

    #[test]
    fn source_field_sorts_last() {
        let mut ds = Dataset::new();
        ds.push_meta(SOURCE_FIELD, serde_json::json!("x"));
        ds.push_group(TIME_FIELD, crate::group::testutil::time_group("s", 2));
        ds.push_meta("comment", serde_json::json!("y"));
        assert_eq!(ds.canonical_order(), vec![2, 1, 0]);
    }

    #[test]
    fn dataset_array_flags_group_set_mismatch() {
        let a = dataset(4);
        let mut b = dataset(6);
        b.fields.retain(|(k, _)| k != "Eng");
        let report = check_dataset_array(&[a, b]);
        assert!(!report.is_valid());
    }

    #[test]
    fn dataset_array_allows_varying_row_counts() {
        let report = check_dataset_array(&[dataset(4), dataset(9)]);
        assert!(report.is_valid(), "flaws: {:?}", report.flaws);
    }
}
