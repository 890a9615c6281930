//! Collections of named, multi-aliased time-series channels.
//!
//! A [`SignalGroup`] is a rectangular block of same-length channels
//! carrying one or more parallel naming schemes ("layers"), units, and
//! descriptions; a [`Dataset`] bundles groups around one time axis. The
//! name-resolution engine ([`resolve`], [`layers`]) lets any channel be
//! addressed through any layer and populates new layers from an external
//! [`lookup::LookupTable`]. The [`mutate`] module holds the sanctioned
//! transformations; every one preserves the structural invariants the
//! [`check`] predicates verify.

pub mod check;
pub mod dataset;
pub mod error;
pub mod group;
pub mod ident;
pub mod layers;
pub mod lookup;
pub mod mutate;
pub mod resolve;
pub mod value;
pub mod workbook;

pub use check::{Flaw, Report};
pub use dataset::{Dataset, Field, check_dataset_array};
pub use error::{ModelError, Result};
pub use group::{LayerMap, SignalGroup, TimeMode, check_group_array};
pub use layers::{LayerContext, UnmatchedTuple, add_layer, add_layers, reconcile_layers, remove_layers};
pub use lookup::LookupTable;
pub use mutate::{RemoveMode, Selection, Selector};
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // One pass over the whole surface: build a table, populate a layer,
    // select through the populated alias, and round-trip the result.
    #[test]
    fn table_to_selection_flow() {
        let table = lookup::testutil::table();
        let group = group::testutil::group(
            &[("oem_names", &["rpm", "torque", "extra"])],
            &["1/min", "Nm", "-"],
            16,
        );

        let ctx = LayerContext::with_table(&table);
        let (value, unmatched) = add_layer(Value::Group(group), "iso_names", &ctx).unwrap();
        assert_eq!(unmatched.len(), 1);
        assert_eq!(unmatched[0].names, vec!["extra".to_string()]);

        let Value::Group(group) = value else {
            panic!("group in, group out");
        };
        assert!(group.check(TimeMode::Plain).is_valid());

        // The populated alias resolves like any other name.
        let picked =
            mutate::select_channels_strict(&Selector::names(["enginetorque"]), &group).unwrap();
        assert_eq!(picked.channel_count(), 1);
        assert_eq!(picked.units, vec!["Nm".to_string()]);

        let json = serde_json::to_string(&picked).unwrap();
        let back: SignalGroup = serde_json::from_str(&json).unwrap();
        assert_eq!(back, picked);
    }
}
