//! Identifier rules and the source/layer name codec.
//!
//! Signal names, group names, layer names, and source-type tags all share
//! one lexical rule: a letter followed by word characters. Layer names are
//! derived from source identifiers by a fixed suffix, so the two schemes
//! stay mechanically convertible in both directions.

use crate::error::{ModelError, Result};
use regex::Regex;
use std::sync::OnceLock;

/// Suffix that turns a source identifier into its layer identifier.
pub const LAYER_SUFFIX: &str = "_names";

static IDENT_RE: OnceLock<Regex> = OnceLock::new();

fn ident_re() -> &'static Regex {
    IDENT_RE.get_or_init(|| Regex::new(r"^[A-Za-z]\w*$").expect("identifier regex"))
}

/// True iff `s` is a bare identifier: `^[A-Za-z]\w*$`.
pub fn is_valid_ident(s: &str) -> bool {
    ident_re().is_match(s)
}

/// Append [`LAYER_SUFFIX`] to a source identifier.
///
/// Idempotent: input already carrying the suffix is returned unchanged.
/// Anything that is not an identifier is a usage error, not a silent
/// default.
pub fn source_to_layer(source: &str) -> Result<String> {
    if !is_valid_ident(source) {
        return Err(ModelError::content(
            "layer codec",
            format!("{source:?} is not a valid identifier"),
        ));
    }
    if source.ends_with(LAYER_SUFFIX) {
        return Ok(source.to_string());
    }
    Ok(format!("{source}{LAYER_SUFFIX}"))
}

/// Strict inverse of [`source_to_layer`]: the suffix must be present.
pub fn layer_to_source(layer: &str) -> Result<String> {
    if !is_valid_ident(layer) {
        return Err(ModelError::content(
            "layer codec",
            format!("{layer:?} is not a valid identifier"),
        ));
    }
    match layer.strip_suffix(LAYER_SUFFIX) {
        Some(source) if !source.is_empty() => Ok(source.to_string()),
        _ => Err(ModelError::content(
            "layer codec",
            format!("{layer:?} does not carry the {LAYER_SUFFIX:?} suffix"),
        )),
    }
}
