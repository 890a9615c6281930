//! Tagged variant over the four container kinds the engine operates on.
//!
//! Layer operations and mutators match exhaustively on this enum instead
//! of probing containers with boolean predicates.

use crate::check::Report;
use crate::dataset::{Dataset, check_dataset_array};
use crate::group::{SignalGroup, TimeMode, check_group_array};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Group(SignalGroup),
    GroupArray(Vec<SignalGroup>),
    Dataset(Dataset),
    DatasetArray(Vec<Dataset>),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Group(_) => "signal group",
            Value::GroupArray(_) => "signal group array",
            Value::Dataset(_) => "dataset",
            Value::DatasetArray(_) => "dataset array",
        }
    }

    /// Validity check for whichever kind this value carries. Plain time
    /// rules; datasets apply time rules to their own time axis.
    pub fn check(&self) -> Report {
        match self {
            Value::Group(g) => g.check(TimeMode::Plain),
            Value::GroupArray(gs) => check_group_array(gs, TimeMode::Plain),
            Value::Dataset(ds) => ds.check(),
            Value::DatasetArray(dss) => check_dataset_array(dss),
        }
    }

    /// Visit every contained signal group, in container order.
    pub fn for_each_group(&self, mut f: impl FnMut(&SignalGroup)) {
        match self {
            Value::Group(g) => f(g),
            Value::GroupArray(gs) => gs.iter().for_each(f),
            Value::Dataset(ds) => ds.groups().for_each(|(_, g)| f(g)),
            Value::DatasetArray(dss) => dss
                .iter()
                .for_each(|ds| ds.groups().for_each(|(_, g)| f(g))),
        }
    }

    /// Mutating visit over every contained signal group.
    pub fn for_each_group_mut(&mut self, mut f: impl FnMut(&mut SignalGroup)) {
        match self {
            Value::Group(g) => f(g),
            Value::GroupArray(gs) => gs.iter_mut().for_each(&mut f),
            Value::Dataset(ds) => ds.groups_mut().for_each(|(_, g)| f(g)),
            Value::DatasetArray(dss) => dss
                .iter_mut()
                .for_each(|ds| ds.groups_mut().for_each(|(_, g)| f(g))),
        }
    }

    /// Union of layer keys across every contained group, first-seen order.
    pub fn layer_union(&self) -> Vec<String> {
        let mut union: Vec<String> = Vec::new();
        self.for_each_group(|g| {
            for key in g.layers.keys() {
                if !union.iter().any(|u| u == key) {
                    union.push(key.to_string());
                }
            }
        });
        union
    }
}
