use chrono::{Days, NaiveDate, NaiveTime};
use fake::Fake;
use fake::faker::lorem::en::{Paragraphs, Word, Words};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::info;

use mockseed_core::{FieldKind, RecordId, Value};

use crate::errors::PopulateError;
use crate::handlers::{relation, relation_filter, truncate};
use crate::registry::{HandlerContext, HandlerRegistry};

const INT_MIN: i64 = -10_000;
const INT_MAX: i64 = 10_000;
const POSITIVE_INT_MAX: i64 = 10_000;
const EMAIL_TLDS: &[&str] = &["com", "org", "net", "gov", "eu"];
const DATE_WINDOW_DAYS: u64 = 9_131;
const MAX_RELATED: usize = 5;

pub fn register(registry: &mut HandlerRegistry) {
    registry
        .register_global(FieldKind::Char, char_field)
        .register_global(FieldKind::Text, text_field)
        .register_global(FieldKind::Slug, slug_field)
        .register_global(FieldKind::Email, email_field)
        .register_global(FieldKind::IpAddress, ip_address_field)
        .register_global(FieldKind::Boolean, boolean_field)
        .register_global(FieldKind::Integer, integer_field)
        .register_global(FieldKind::PositiveInteger, positive_integer_field)
        .register_global(FieldKind::Decimal, decimal_field)
        .register_global(FieldKind::Float, float_field)
        .register_global(FieldKind::Date, date_field)
        .register_global(FieldKind::DateTime, date_time_field)
        .register_global(FieldKind::ForeignKey, foreign_key_field)
        .register_global(FieldKind::ManyToMany, many_to_many_field);
}

fn char_field(ctx: &mut HandlerContext<'_>) -> Result<Value, PopulateError> {
    let words: Vec<String> = Words(3..4).fake_with_rng(ctx.rng());
    Ok(Value::Text(truncate(words.join(" "), ctx.field().max_length)))
}

fn text_field(ctx: &mut HandlerContext<'_>) -> Result<Value, PopulateError> {
    let paragraphs: Vec<String> = Paragraphs(4..5).fake_with_rng(ctx.rng());
    Ok(Value::Text(truncate(
        paragraphs.join("\n\n"),
        ctx.field().max_length,
    )))
}

fn slug_field(ctx: &mut HandlerContext<'_>) -> Result<Value, PopulateError> {
    let words: Vec<String> = Words(2..4).fake_with_rng(ctx.rng());
    let slug = words.join("-").to_lowercase();
    Ok(Value::Text(
        truncate(slug, ctx.field().max_length)
            .trim_end_matches('-')
            .to_string(),
    ))
}

fn email_field(ctx: &mut HandlerContext<'_>) -> Result<Value, PopulateError> {
    let user: String = Word().fake_with_rng(ctx.rng());
    let domain: String = Word().fake_with_rng(ctx.rng());
    let tld = EMAIL_TLDS.choose(ctx.rng()).copied().unwrap_or("com");
    Ok(Value::Text(truncate(
        format!("{user}@{domain}.{tld}"),
        ctx.field().max_length,
    )))
}

fn ip_address_field(ctx: &mut HandlerContext<'_>) -> Result<Value, PopulateError> {
    let rng = ctx.rng();
    let octets: Vec<String> = (0..4)
        .map(|_| rng.random_range(0..=255_u16).to_string())
        .collect();
    Ok(Value::Text(octets.join(".")))
}

fn boolean_field(ctx: &mut HandlerContext<'_>) -> Result<Value, PopulateError> {
    Ok(Value::Bool(ctx.rng().random_bool(0.5)))
}

fn integer_field(ctx: &mut HandlerContext<'_>) -> Result<Value, PopulateError> {
    Ok(Value::Int(ctx.rng().random_range(INT_MIN..=INT_MAX)))
}

fn positive_integer_field(ctx: &mut HandlerContext<'_>) -> Result<Value, PopulateError> {
    Ok(Value::Int(ctx.rng().random_range(0..=POSITIVE_INT_MAX)))
}

fn decimal_field(ctx: &mut HandlerContext<'_>) -> Result<Value, PopulateError> {
    let places = ctx.field().decimal_places.unwrap_or(2).min(10);
    let rng = ctx.rng();
    let value = rng.random::<f64>() + rng.random_range(1..=20) as f64;
    let factor = 10_f64.powi(places as i32);
    Ok(Value::Float((value * factor).round() / factor))
}

fn float_field(ctx: &mut HandlerContext<'_>) -> Result<Value, PopulateError> {
    Ok(Value::Float(ctx.rng().random_range(0.0..1_000.0)))
}

fn date_field(ctx: &mut HandlerContext<'_>) -> Result<Value, PopulateError> {
    Ok(Value::Date(random_date(ctx)))
}

fn date_time_field(ctx: &mut HandlerContext<'_>) -> Result<Value, PopulateError> {
    let date = random_date(ctx);
    let seconds = ctx.rng().random_range(0..86_400_u32);
    let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0).unwrap_or_default();
    Ok(Value::DateTime(date.and_time(time)))
}

fn random_date(ctx: &mut HandlerContext<'_>) -> NaiveDate {
    let base = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default();
    let offset = ctx.rng().random_range(0..=DATE_WINDOW_DAYS);
    base.checked_add_days(Days::new(offset)).unwrap_or(base)
}

fn foreign_key_field(ctx: &mut HandlerContext<'_>) -> Result<Value, PopulateError> {
    let relation = relation(ctx)?;
    let target = relation.target();
    let ids = ctx.store().find_ids(&target, &relation_filter(relation))?;
    match ids.choose(ctx.rng()) {
        Some(id) => Ok(Value::Ref(*id)),
        None => {
            info!(field = %ctx.path(), target = %target, "no related records to point at");
            Ok(Value::Null)
        }
    }
}

fn many_to_many_field(ctx: &mut HandlerContext<'_>) -> Result<Value, PopulateError> {
    let relation = relation(ctx)?;
    let target = relation.target();
    let ids = ctx.store().find_ids(&target, &relation_filter(relation))?;
    if ids.is_empty() {
        info!(field = %ctx.path(), target = %target, "no related records to associate");
        return Ok(Value::Refs(Vec::new()));
    }

    let rng = ctx.rng();
    let count = rng.random_range(1..=MAX_RELATED).min(ids.len());
    let mut picked: Vec<RecordId> = ids.choose_multiple(rng, count).copied().collect();
    picked.sort();
    Ok(Value::Refs(picked))
}
