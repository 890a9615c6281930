//! Signal groups: rectangular blocks of same-length channels carrying one
//! or more parallel naming schemes ("layers"), units, and descriptions.
//!
//! Layer order is significant — population and default-name fallback walk
//! layers in order — so layers live in an ordered key/value list rather
//! than a sorted map.

use crate::check::Report;
use crate::error::Result;
use crate::ident::is_valid_ident;
use serde::{Deserialize, Serialize};

/// Which validity rules apply: an ordinary group, or the time axis
/// (always exactly one channel wide).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeMode {
    Plain,
    Time,
}

/// Ordered layer-name → channel-names map. Insertion order is preserved;
/// keys are expected to be unique (the validity check flags duplicates).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerMap(Vec<(String, Vec<String>)>);

impl LayerMap {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_pairs(pairs: Vec<(String, Vec<String>)>) -> Self {
        Self(pairs)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, layer: &str) -> bool {
        self.0.iter().any(|(k, _)| k == layer)
    }

    pub fn get(&self, layer: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(k, _)| k == layer)
            .map(|(_, v)| v.as_slice())
    }

    pub fn get_mut(&mut self, layer: &str) -> Option<&mut Vec<String>> {
        self.0.iter_mut().find(|(k, _)| k == layer).map(|(_, v)| v)
    }

    /// Replace an existing layer in place, or append a new one.
    pub fn insert(&mut self, layer: impl Into<String>, names: Vec<String>) {
        let layer = layer.into();
        match self.get_mut(&layer) {
            Some(slot) => *slot = names,
            None => self.0.push((layer, names)),
        }
    }

    pub fn remove(&mut self, layer: &str) -> Option<Vec<String>> {
        let idx = self.0.iter().position(|(k, _)| k == layer)?;
        Some(self.0.remove(idx).1)
    }

    /// Layer keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Reorder keys: those listed in `order` first (in that order), the
    /// rest keep their relative position.
    pub fn reorder(&mut self, order: &[String]) {
        let mut reordered = Vec::with_capacity(self.0.len());
        for wanted in order {
            if let Some(idx) = self.0.iter().position(|(k, _)| k == wanted) {
                reordered.push(self.0.remove(idx));
            }
        }
        reordered.append(&mut self.0);
        self.0 = reordered;
    }
}

/// The atomic record: an N×M numeric block plus M-length name arrays (one
/// per layer) and M-length units/description arrays.
///
/// Samples are stored column-major: `values[channel][sample]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalGroup {
    pub layers: LayerMap,
    pub units: Vec<String>,
    pub descriptions: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl SignalGroup {
    /// Build and validate in one step.
    pub fn try_new(
        layers: LayerMap,
        units: Vec<String>,
        descriptions: Vec<String>,
        values: Vec<Vec<f64>>,
        mode: TimeMode,
    ) -> Result<Self> {
        let group = Self {
            layers,
            units,
            descriptions,
            values,
        };
        group.check(mode).into_result()?;
        Ok(group)
    }

    /// Number of channels (columns).
    pub fn channel_count(&self) -> usize {
        self.values.len()
    }

    /// Number of samples per channel (rows).
    pub fn sample_count(&self) -> usize {
        self.values.first().map_or(0, Vec::len)
    }

    /// The channel's name on `layer`, empty-string when absent.
    pub fn name_on(&self, layer: &str, channel: usize) -> &str {
        self.layers
            .get(layer)
            .and_then(|names| names.get(channel))
            .map_or("", String::as_str)
    }

    /// A human label for a channel: its first non-empty name in layer
    /// order, else the channel index.
    pub fn channel_label(&self, channel: usize) -> String {
        for (_, names) in self.layers.iter() {
            if let Some(name) = names.get(channel) {
                if !name.is_empty() {
                    return name.clone();
                }
            }
        }
        format!("#{channel}")
    }

    /// Validity check; accumulates every violation. See [`Report`] for
    /// the candidate/valid tri-state.
    pub fn check(&self, mode: TimeMode) -> Report {
        let mut report = Report::new("signal group");

        if self.layers.is_empty() {
            report.shape("carries no name layers");
        }
        let mut seen = Vec::new();
        for key in self.layers.keys() {
            if seen.contains(&key) {
                report.shape(format!("duplicate layer key {key:?}"));
            }
            seen.push(key);
        }

        let width = self.channel_count();
        let rows = self.sample_count();

        for (channel, column) in self.values.iter().enumerate() {
            if column.len() != rows {
                report.content(format!(
                    "channel {channel}: column has {} samples, expected {rows}",
                    column.len()
                ));
            }
        }

        for (layer, names) in self.layers.iter() {
            if names.len() != width {
                report.content(format!(
                    "layer {layer:?} has {} names for {width} channel(s)",
                    names.len()
                ));
            }
            for (channel, name) in names.iter().enumerate() {
                if !name.is_empty() && !is_valid_ident(name) {
                    report.content(format!(
                        "layer {layer:?}, channel {channel}: invalid name {name:?}"
                    ));
                }
            }
        }

        if self.units.len() != width {
            report.content(format!(
                "units has {} entries for {width} channel(s)",
                self.units.len()
            ));
        }
        if self.descriptions.len() != width {
            report.content(format!(
                "descriptions has {} entries for {width} channel(s)",
                self.descriptions.len()
            ));
        }

        if mode == TimeMode::Time && width != 1 {
            report.content(format!(
                "time group must be exactly one channel wide, found {width}"
            ));
        }

        report
    }

    pub fn ensure_valid(&self, mode: TimeMode) -> Result<()> {
        self.check(mode).into_result()
    }
}

/// Homogeneity check for an ordered sequence of signal groups.
///
/// With more than one element, all elements must share the layer set, the
/// full name matrix, and the per-channel units; any divergence names the
/// offending channel.
pub fn check_group_array(elements: &[SignalGroup], mode: TimeMode) -> Report {
    let refs: Vec<&SignalGroup> = elements.iter().collect();
    check_group_refs(&refs, mode)
}

/// Reference form of [`check_group_array`], for callers that gather
/// elements out of larger containers.
pub(crate) fn check_group_refs(elements: &[&SignalGroup], mode: TimeMode) -> Report {
    let mut report = Report::new("signal group array");

    for (idx, element) in elements.iter().enumerate() {
        let mut inner = element.check(mode);
        inner.subject = format!("element {idx}");
        report.absorb(inner);
    }

    if elements.len() < 2 {
        return report;
    }

    let first = &elements[0];
    let first_keys: Vec<&str> = first.layers.keys().collect();

    for (idx, element) in elements.iter().enumerate().skip(1) {
        let keys: Vec<&str> = element.layers.keys().collect();
        if keys != first_keys {
            report.content(format!(
                "element {idx}: layer set {keys:?} differs from {first_keys:?}"
            ));
            continue;
        }

        for (layer, names) in first.layers.iter() {
            let other = element.layers.get(layer).unwrap_or(&[]);
            let width = names.len().max(other.len());
            for channel in 0..width {
                let a = names.get(channel).map_or("", String::as_str);
                let b = other.get(channel).map_or("", String::as_str);
                if a != b {
                    report.content(format!(
                        "element {idx}, layer {layer:?}, channel {channel} \
                         ({}): name {b:?} differs from {a:?}",
                        first.channel_label(channel)
                    ));
                }
            }
        }

        let width = first.units.len().max(element.units.len());
        for channel in 0..width {
            let a = first.units.get(channel).map_or("", String::as_str);
            let b = element.units.get(channel).map_or("", String::as_str);
            if a != b {
                report.content(format!(
                    "element {idx}, channel {channel} ({}): units {b:?} differ from {a:?}",
                    first.channel_label(channel)
                ));
            }
        }
    }

    report
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;

    /// Shorthand group builder: layers as (key, names), one unit and
    /// description per channel, constant sample data.
    pub fn group(layers: &[(&str, &[&str])], units: &[&str], rows: usize) -> SignalGroup {
        let width = layers[0].1.len();
        let mut map = LayerMap::new();
        for (key, names) in layers {
            map.insert(
                key.to_string(),
                names.iter().map(|n| n.to_string()).collect(),
            );
        }
        SignalGroup {
            layers: map,
            units: units.iter().map(|u| u.to_string()).collect(),
            descriptions: vec![String::new(); width],
            values: (0..width).map(|c| vec![c as f64; rows]).collect(),
        }
    }

    pub fn time_group(unit: &str, rows: usize) -> SignalGroup {
        let mut map = LayerMap::new();
        map.insert("base_names".to_string(), vec!["t".to_string()]);
        SignalGroup {
            layers: map,
            units: vec![unit.to_string()],
            descriptions: vec![String::new()],
            values: vec![(0..rows).map(|r| r as f64).collect()],
        }
    }
}
