//! Bundled handler packs.
//!
//! A pack is a named set of registrations applied to a [`HandlerRegistry`].
//! `defaults` is always applied first; later packs override its entries.

pub mod defaults;
pub mod dictionary;

use mockseed_core::{Filter, Relation, Value};

use crate::errors::PopulateError;
use crate::registry::{HandlerContext, HandlerRegistry};

pub const DEFAULTS_PACK: &str = "defaults";
pub const DICTIONARY_PACK: &str = "dictionary";

/// Names accepted by [`apply_pack`].
pub fn pack_names() -> &'static [&'static str] {
    &[DEFAULTS_PACK, DICTIONARY_PACK]
}

pub fn apply_pack(registry: &mut HandlerRegistry, name: &str) -> Result<(), PopulateError> {
    match name {
        DEFAULTS_PACK => defaults::register(registry),
        DICTIONARY_PACK => dictionary::register(registry),
        other => {
            return Err(PopulateError::Config(format!(
                "unknown handler pack '{other}' (expected one of: {})",
                pack_names().join(", ")
            )));
        }
    }
    Ok(())
}

/// Relation of the field being generated; relation handlers need one.
pub(crate) fn relation<'a>(ctx: &HandlerContext<'a>) -> Result<&'a Relation, PopulateError> {
    ctx.field()
        .relation
        .as_ref()
        .ok_or_else(|| PopulateError::handler(ctx.path(), "field declares no relation target"))
}

pub(crate) fn relation_filter(relation: &Relation) -> Filter {
    relation
        .limit_to
        .iter()
        .map(|(field, value)| (field.clone(), Value::from_json(value)))
        .collect()
}

/// Cut `text` to at most `max_length` characters.
pub(crate) fn truncate(text: String, max_length: Option<u32>) -> String {
    match max_length {
        Some(max) if text.chars().count() > max as usize => {
            text.chars().take(max as usize).collect::<String>().trim_end().to_string()
        }
        _ => text,
    }
}
