//! Name resolution across layers: exact search, the names matrix, and
//! default display names.

use crate::dataset::Dataset;
use crate::group::SignalGroup;
use serde::Serialize;
use tracing::warn;

/// Channel indices in `group` whose name on *any* layer equals `name`.
///
/// The empty string is special: it matches a channel only when that
/// channel is unnamed on every layer simultaneously. Indices are
/// ascending, one entry per channel however many layers matched.
pub fn find_name(name: &str, group: &SignalGroup) -> Vec<usize> {
    let width = group.channel_count();
    let mut hits = Vec::new();
    for channel in 0..width {
        let matched = if name.is_empty() {
            group
                .layers
                .iter()
                .all(|(_, names)| names.get(channel).map_or(true, String::is_empty))
        } else {
            group
                .layers
                .iter()
                .any(|(_, names)| names.get(channel).is_some_and(|n| n == name))
        };
        if matched {
            hits.push(channel);
        }
    }
    hits
}

/// [`find_name`] broadened across every signal-group field of a dataset.
/// Groups with no match are omitted.
pub fn find_name_in_dataset(name: &str, dataset: &Dataset) -> Vec<(String, Vec<usize>)> {
    dataset
        .groups()
        .filter_map(|(group_name, group)| {
            let hits = find_name(name, group);
            if hits.is_empty() {
                None
            } else {
                Some((group_name.to_string(), hits))
            }
        })
        .collect()
}

/// One row per channel, one column per layer, empty string where a
/// channel has no name on a layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamesMatrix {
    pub layers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn names_matrix(group: &SignalGroup) -> NamesMatrix {
    let layers: Vec<String> = group.layers.keys().map(str::to_string).collect();
    let rows = (0..group.channel_count())
        .map(|channel| {
            layers
                .iter()
                .map(|layer| group.name_on(layer, channel).to_string())
                .collect()
        })
        .collect();
    NamesMatrix { layers, rows }
}

/// Names matrix over a whole dataset: channels of all groups in field
/// order, columns the union of all layers in first-seen order.
pub fn dataset_names_matrix(dataset: &Dataset) -> NamesMatrix {
    let mut layers: Vec<String> = Vec::new();
    for (_, group) in dataset.groups() {
        for key in group.layers.keys() {
            if !layers.iter().any(|l| l == key) {
                layers.push(key.to_string());
            }
        }
    }

    let mut rows = Vec::new();
    for (_, group) in dataset.groups() {
        for channel in 0..group.channel_count() {
            rows.push(
                layers
                    .iter()
                    .map(|layer| group.name_on(layer, channel).to_string())
                    .collect(),
            );
        }
    }
    NamesMatrix { layers, rows }
}

/// One display name per channel: the name on `default_layer` when
/// present, else the first layer (in layer order) carrying a non-empty
/// name for that channel. Channels unnamed everywhere come back empty and
/// are reported in one batched warning.
pub fn default_names(group: &SignalGroup, default_layer: &str) -> Vec<String> {
    let mut names = Vec::with_capacity(group.channel_count());
    let mut unnamed = Vec::new();

    for channel in 0..group.channel_count() {
        let preferred = group.name_on(default_layer, channel);
        if !preferred.is_empty() {
            names.push(preferred.to_string());
            continue;
        }
        let fallback = group
            .layers
            .iter()
            .find_map(|(_, layer_names)| {
                layer_names
                    .get(channel)
                    .filter(|n| !n.is_empty())
                    .cloned()
            })
            .unwrap_or_default();
        if fallback.is_empty() {
            unnamed.push(channel);
        }
        names.push(fallback);
    }

    if !unnamed.is_empty() {
        warn!(
            channels = ?unnamed,
            "no layer carries a name for {} channel(s)",
            unnamed.len()
        );
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::testutil::dataset;
    use crate::group::testutil::group;
    use pretty_assertions::assert_eq;

    #[test]
    fn finds_name_on_any_layer() {
        let g = group(
            &[("oem_names", &["rpm", "torque"]), ("iso_names", &["n", ""])],
            &["1/min", "Nm"],
            2,
        );
        assert_eq!(find_name("rpm", &g), vec![0]);
        assert_eq!(find_name("n", &g), vec![0]);
        assert_eq!(find_name("torque", &g), vec![1]);
        assert_eq!(find_name("boost", &g), Vec::<usize>::new());
    }

    #[test]
    fn duplicate_names_across_layers_collapse_to_one_index() {
        let g = group(
            &[("oem_names", &["rpm", ""]), ("iso_names", &["rpm", "x"])],
            &["1/min", "-"],
            2,
        );
        assert_eq!(find_name("rpm", &g), vec![0]);
    }

    #[test]
    fn empty_name_matches_only_fully_unnamed_channels() {
        let g = group(
            &[("a_names", &["x", "", ""]), ("b_names", &["x", "y", ""])],
            &["-", "-", "-"],
            2,
        );
        assert_eq!(find_name("", &g), vec![2]);
    }

    #[test]
    fn dataset_search_spans_groups() {
        let ds = dataset(3);
        let hits = find_name_in_dataset("rpm", &ds);
        assert_eq!(hits, vec![("Eng".to_string(), vec![0])]);
    }

    #[test]
    fn names_matrix_shape() {
        let g = group(
            &[("oem_names", &["rpm", "torque"]), ("iso_names", &["n", ""])],
            &["1/min", "Nm"],
            2,
        );
        let m = names_matrix(&g);
        assert_eq!(m.layers, vec!["oem_names", "iso_names"]);
        assert_eq!(
            m.rows,
            vec![
                vec!["rpm".to_string(), "n".into()],
                vec!["torque".to_string(), "".into()],
            ]
        );
    }

    #[test]
    fn dataset_matrix_unions_layers() {
        let ds = dataset(3);
        let m = dataset_names_matrix(&ds);
        assert_eq!(m.layers, vec!["base_names", "oem_names", "iso_names"]);
        // One row for the time channel, two for the engine group.
        assert_eq!(m.rows.len(), 3);
        assert_eq!(m.rows[0], vec!["t".to_string(), "".into(), "".into()]);
        assert_eq!(m.rows[1], vec!["".to_string(), "rpm".into(), "n".into()]);
    }

    #[test]
    fn default_names_prefer_default_layer_then_fall_back() {
        let g = group(
            &[("oem_names", &["", "torque", ""]), ("iso_names", &["n", "m", ""])],
            &["-", "-", "-"],
            2,
        );
        let names = default_names(&g, "oem_names");
        assert_eq!(names, vec!["n".to_string(), "torque".into(), "".into()]);
    }
}
