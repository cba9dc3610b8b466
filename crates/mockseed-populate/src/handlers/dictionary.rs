use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, warn};

use mockseed_core::{FieldKind, Value};

use crate::errors::PopulateError;
use crate::handlers::truncate;
use crate::registry::{HandlerContext, HandlerRegistry};

pub const DICTIONARY_ENV: &str = "MOCKSEED_DICTIONARY";
pub const DEFAULT_DICTIONARY: &str = "/usr/share/dict/words";

const EMAIL_TLDS: &[&str] = &["com", "org", "net", "gov", "eu"];

/// Word list location: `MOCKSEED_DICTIONARY` when set, else the system list.
pub fn dictionary_path() -> PathBuf {
    std::env::var_os(DICTIONARY_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DICTIONARY))
}

/// Read a newline separated word list, keeping plain alphabetic entries.
pub fn load_words(path: &Path) -> std::io::Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|word| !word.is_empty() && word.chars().all(|ch| ch.is_ascii_alphabetic()))
        .map(|word| word.to_lowercase())
        .collect())
}

/// Override the text handlers with words from the dictionary file.
///
/// Leaves the registry untouched when no usable word list exists.
pub fn register(registry: &mut HandlerRegistry) {
    let path = dictionary_path();
    match load_words(&path) {
        Ok(words) if !words.is_empty() => {
            debug!(path = %path.display(), words = words.len(), "dictionary loaded");
            register_words(registry, words);
        }
        Ok(_) => warn!(path = %path.display(), "dictionary is empty; keeping lorem handlers"),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "dictionary unavailable; keeping lorem handlers")
        }
    }
}

pub fn register_words(registry: &mut HandlerRegistry, words: Vec<String>) {
    let words: Arc<[String]> = words.into();

    let list = Arc::clone(&words);
    registry.register_global(FieldKind::Char, move |ctx| {
        let text = pick_words(&list, 3, ctx).join(" ");
        Ok(Value::Text(truncate(text, ctx.field().max_length)))
    });

    let list = Arc::clone(&words);
    registry.register_global(FieldKind::Text, move |ctx| {
        let mut paragraphs = Vec::with_capacity(4);
        for _ in 0..4 {
            let count = ctx.rng().random_range(20..=60);
            paragraphs.push(sentence(&pick_words(&list, count, ctx)));
        }
        Ok(Value::Text(truncate(
            paragraphs.join("\n\n"),
            ctx.field().max_length,
        )))
    });

    let list = Arc::clone(&words);
    registry.register_global(FieldKind::Slug, move |ctx| {
        let slug = pick_words(&list, 3, ctx).join("-");
        Ok(Value::Text(
            truncate(slug, ctx.field().max_length)
                .trim_end_matches('-')
                .to_string(),
        ))
    });

    let list = words;
    registry.register_global(FieldKind::Email, move |ctx| {
        let parts = pick_words(&list, 2, ctx);
        let [user, domain] = parts.as_slice() else {
            return Err(PopulateError::handler(ctx.path(), "dictionary has no words"));
        };
        let tld = EMAIL_TLDS.choose(ctx.rng()).copied().unwrap_or("com");
        Ok(Value::Text(truncate(
            format!("{user}@{domain}.{tld}"),
            ctx.field().max_length,
        )))
    });
}

fn pick_words<'w>(
    words: &'w [String],
    count: usize,
    ctx: &mut HandlerContext<'_>,
) -> Vec<&'w str> {
    let rng = ctx.rng();
    (0..count)
        .filter_map(|_| words.choose(rng).map(String::as_str))
        .collect()
}

fn sentence(words: &[&str]) -> String {
    let mut text = words.join(" ");
    if let Some(first) = text.chars().next() {
        let upper: String = first.to_uppercase().collect();
        text.replace_range(..first.len_utf8(), &upper);
    }
    text.push('.');
    text
}
