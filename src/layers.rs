//! Adding, removing, and reconciling name layers.
//!
//! Population of a new layer matches each channel's existing name tuple
//! against the lookup table: the key is the intersection of the layers
//! the channel already carries with the layers the table registers, and a
//! table row matches only when every key layer agrees exactly. Misses are
//! collected and reported in one batch.

use crate::error::{ModelError, Result};
use crate::group::SignalGroup;
use crate::ident::is_valid_ident;
use crate::lookup::LookupTable;
use crate::value::Value;
use serde::Serialize;
use tracing::warn;

/// Explicit context for layer population; the lookup table is always
/// passed in, never ambient state.
#[derive(Debug, Clone, Copy)]
pub struct LayerContext<'a> {
    pub table: Option<&'a LookupTable>,
    /// Force the all-blank path even when a table is present.
    pub no_lookup: bool,
    /// Minimum number of shared key layers before a tuple match is
    /// trusted. An empty intersection never matches.
    pub min_overlap: usize,
}

impl<'a> LayerContext<'a> {
    pub fn new() -> Self {
        Self {
            table: None,
            no_lookup: false,
            min_overlap: 1,
        }
    }

    pub fn with_table(table: &'a LookupTable) -> Self {
        Self {
            table: Some(table),
            ..Self::new()
        }
    }
}

impl Default for LayerContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// A channel whose existing names matched no table row during population.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmatchedTuple {
    pub channel: usize,
    pub key_layers: Vec<String>,
    pub names: Vec<String>,
}

/// Add one layer to every contained group. Groups already carrying the
/// layer are left untouched, so adding a present layer is a no-op.
pub fn add_layer(value: Value, layer: &str, ctx: &LayerContext) -> Result<(Value, Vec<UnmatchedTuple>)> {
    add_layers(value, &[layer], ctx)
}

/// Add several layers; table-registered layers are processed first so
/// blank-filled unregistered layers never get in the way of lookups.
pub fn add_layers(
    mut value: Value,
    layers: &[&str],
    ctx: &LayerContext,
) -> Result<(Value, Vec<UnmatchedTuple>)> {
    for layer in layers {
        if !is_valid_ident(layer) {
            return Err(ModelError::content(
                "add layer",
                format!("{layer:?} is not a valid identifier"),
            ));
        }
    }

    let is_registered = |layer: &str| {
        !ctx.no_lookup && ctx.table.is_some_and(|table| table.has_layer(layer))
    };
    let mut ordered: Vec<&str> = layers
        .iter()
        .copied()
        .filter(|l| is_registered(l))
        .collect();
    ordered.extend(layers.iter().copied().filter(|l| !is_registered(l)));

    let mut unmatched = Vec::new();
    value.for_each_group_mut(|group| {
        for layer in &ordered {
            populate_group(group, layer, ctx, &mut unmatched);
        }
    });

    if !unmatched.is_empty() {
        let samples: Vec<&[String]> = unmatched
            .iter()
            .take(5)
            .map(|t| t.names.as_slice())
            .collect();
        warn!(
            count = unmatched.len(),
            sample = ?samples,
            "name tuple(s) matched no lookup row; new layer left blank there"
        );
    }
    Ok((value, unmatched))
}

fn populate_group(
    group: &mut SignalGroup,
    layer: &str,
    ctx: &LayerContext,
    unmatched: &mut Vec<UnmatchedTuple>,
) {
    if group.layers.contains(layer) {
        return;
    }
    let width = group.channel_count();
    let mut names = vec![String::new(); width];

    if !ctx.no_lookup {
        if let Some(table) = ctx.table {
            if let Some(target) = table.layer_index(layer) {
                // Key layers: the table's layers this group already has,
                // in table order.
                let key: Vec<(usize, &str)> = table
                    .layers
                    .iter()
                    .enumerate()
                    .filter(|(_, l)| group.layers.contains(l))
                    .map(|(col, l)| (col, l.as_str()))
                    .collect();

                if key.is_empty() || key.len() < ctx.min_overlap {
                    warn!(
                        layer,
                        shared = key.len(),
                        minimum = ctx.min_overlap.max(1),
                        "too few shared layers with the lookup table; \
                         new layer left blank"
                    );
                } else {
                    for channel in 0..width {
                        let tuple: Vec<&str> = key
                            .iter()
                            .map(|(_, l)| group.name_on(l, channel))
                            .collect();
                        let hit = table.rows().find(|(_, row)| {
                            key.iter()
                                .zip(&tuple)
                                .all(|(&(col, _), &name)| row[col] == name)
                        });
                        match hit {
                            Some((_, row)) => names[channel] = row[target].clone(),
                            None => unmatched.push(UnmatchedTuple {
                                channel,
                                key_layers: key.iter().map(|&(_, l)| l.to_string()).collect(),
                                names: tuple.iter().map(|n| n.to_string()).collect(),
                            }),
                        }
                    }
                }
            }
        }
    }

    group.layers.insert(layer.to_string(), names);
}

/// Strip layers from every contained group. Removal that would leave any
/// group without a single layer is refused.
pub fn remove_layers(mut value: Value, layers: &[&str]) -> Result<Value> {
    let mut violation: Option<String> = None;
    value.for_each_group(|group| {
        let remaining = group
            .layers
            .keys()
            .filter(|key| !layers.iter().any(|l| l == key))
            .count();
        if remaining == 0 && violation.is_none() {
            violation = Some(format!(
                "removing {layers:?} would leave a group with no name layers"
            ));
        }
    });
    if let Some(detail) = violation {
        return Err(ModelError::content("remove layer", detail));
    }

    value.for_each_group_mut(|group| {
        for layer in layers {
            group.layers.remove(layer);
        }
    });
    Ok(value)
}

/// Bring N independently-typed values to one shared layer set: the union
/// of all layers present, populated via [`add_layers`] on each value.
/// Output order matches input order.
pub fn reconcile_layers(values: Vec<Value>, ctx: &LayerContext) -> Result<Vec<Value>> {
    let mut union: Vec<String> = Vec::new();
    for value in &values {
        for layer in value.layer_union() {
            if !union.contains(&layer) {
                union.push(layer);
            }
        }
    }
    let union_refs: Vec<&str> = union.iter().map(String::as_str).collect();

    let mut out = Vec::with_capacity(values.len());
    for value in values {
        let (value, _) = add_layers(value, &union_refs, ctx)?;
        out.push(value);
    }
    Ok(out)
}
