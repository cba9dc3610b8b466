use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use mockseed_config::PopulateConfig;
use mockseed_core::{CompositeRef, Field, FieldKind, PersistenceBackend, RecordId, Relation, Value};
use mockseed_populate::handlers::{self, dictionary};
use mockseed_populate::{FieldNode, HandlerContext, HandlerRegistry, MemoryBackend};

fn generate(
    registry: &HandlerRegistry,
    store: &MemoryBackend,
    field: &Field,
    seed: u64,
) -> Value {
    let composite = CompositeRef::new("library", "Book");
    let node = FieldNode::new(&composite, field);
    let handler = registry.resolve(&node, false).expect("handler registered");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut ctx = HandlerContext::new(node, store, &mut rng);
    handler(&mut ctx).expect("generated value")
}

fn text(value: Value) -> String {
    match value {
        Value::Text(text) => text,
        other => panic!("expected text, got {other:?}"),
    }
}

fn temp_file(label: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mockseed_{label}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp dir");
    let path = dir.join("words");
    fs::write(&path, contents).expect("write word list");
    path
}

#[test]
fn defaults_cover_every_builtin_kind() {
    let registry = HandlerRegistry::with_defaults();
    let keys = registry.global_keys();
    for tag in [
        "CharField",
        "TextField",
        "SlugField",
        "EmailField",
        "IPAddressField",
        "BooleanField",
        "IntegerField",
        "PositiveIntegerField",
        "DecimalField",
        "FloatField",
        "DateField",
        "DateTimeField",
        "ForeignKey",
        "ManyToManyField",
    ] {
        assert!(keys.iter().any(|key| key == tag), "missing {tag}");
    }
    assert!(!keys.iter().any(|key| key == "AutoField"));
    assert!(registry.strict_keys().is_empty());
}

#[test]
fn text_handlers_respect_max_length() {
    let registry = HandlerRegistry::with_defaults();
    let store = MemoryBackend::new();
    let title = Field::new("title", FieldKind::Char).with_max_length(10);
    let contents = Field::new("contents", FieldKind::Text).with_max_length(40);

    for seed in 0..20 {
        assert!(text(generate(&registry, &store, &title, seed)).chars().count() <= 10);
        assert!(text(generate(&registry, &store, &contents, seed)).chars().count() <= 40);
    }
}

#[test]
fn emails_slugs_and_addresses_have_their_shape() {
    let registry = HandlerRegistry::with_defaults();
    let store = MemoryBackend::new();
    let email = Field::new("email", FieldKind::Email);
    let slug = Field::new("slug", FieldKind::Slug);
    let ip = Field::new("ip", FieldKind::IpAddress);

    for seed in 0..20 {
        let email = text(generate(&registry, &store, &email, seed));
        let (user, domain) = email.split_once('@').expect("email has @");
        assert!(!user.is_empty());
        let tld = domain.rsplit('.').next().expect("tld");
        assert!(["com", "org", "net", "gov", "eu"].contains(&tld), "{email}");

        let slug = text(generate(&registry, &store, &slug, seed));
        assert!(!slug.contains(' '), "{slug}");
        assert_eq!(slug, slug.to_lowercase());

        let ip = text(generate(&registry, &store, &ip, seed));
        let octets: Vec<u16> = ip
            .split('.')
            .map(|octet| octet.parse().expect("numeric octet"))
            .collect();
        assert_eq!(octets.len(), 4);
        assert!(octets.iter().all(|octet| *octet <= 255));
    }
}

#[test]
fn numeric_handlers_stay_in_range() {
    let registry = HandlerRegistry::with_defaults();
    let store = MemoryBackend::new();
    let integer = Field::new("delta", FieldKind::Integer);
    let positive = Field::new("page", FieldKind::PositiveInteger);
    let mut price = Field::new("price", FieldKind::Decimal);
    price.decimal_places = Some(2);

    for seed in 0..50 {
        let delta = generate(&registry, &store, &integer, seed).as_i64().expect("int");
        assert!((-10_000..=10_000).contains(&delta));
        let page = generate(&registry, &store, &positive, seed).as_i64().expect("int");
        assert!((0..=10_000).contains(&page));
        match generate(&registry, &store, &price, seed) {
            Value::Float(value) => {
                assert!((1.0..=21.0).contains(&value));
                assert!(((value * 100.0).round() - value * 100.0).abs() < 1e-6);
            }
            other => panic!("expected float, got {other:?}"),
        }
    }
}

#[test]
fn foreign_keys_pick_existing_records_or_null() {
    let registry = HandlerRegistry::with_defaults();
    let shelf_book = Field::new("book", FieldKind::ForeignKey)
        .with_relation(Relation::to_one("library", "Book"));

    let empty = MemoryBackend::new();
    assert_eq!(generate(&registry, &empty, &shelf_book, 1), Value::Null);

    let mut store = MemoryBackend::new();
    let book = CompositeRef::new("library", "Book");
    let ids: Vec<RecordId> = (0..3)
        .map(|_| store.preload(&book, BTreeMap::new()))
        .collect();
    for seed in 0..10 {
        match generate(&registry, &store, &shelf_book, seed) {
            Value::Ref(id) => assert!(ids.contains(&id)),
            other => panic!("expected ref, got {other:?}"),
        }
    }
}

#[test]
fn many_to_many_picks_distinct_ids_and_honors_limit_to() {
    let registry = HandlerRegistry::with_defaults();
    let author = CompositeRef::new("library", "Author");
    let mut store = MemoryBackend::new();

    let mut active_ids = Vec::new();
    for index in 0..8 {
        let mut values = BTreeMap::new();
        values.insert("active".to_string(), Value::Bool(index % 2 == 0));
        let id = store.preload(&author, values);
        if index % 2 == 0 {
            active_ids.push(id);
        }
    }

    let mut relation = Relation::to_many("library", "Author");
    relation
        .limit_to
        .insert("active".to_string(), serde_json::json!(true));
    let authors = Field::new("authors", FieldKind::ManyToMany).with_relation(relation);

    for seed in 0..20 {
        let Value::Refs(picked) = generate(&registry, &store, &authors, seed) else {
            panic!("expected refs");
        };
        assert!((1..=4).contains(&picked.len()));
        assert!(picked.iter().all(|id| active_ids.contains(id)));
        let mut distinct = picked.clone();
        distinct.dedup();
        assert_eq!(distinct.len(), picked.len());
    }
}

#[test]
fn relation_handlers_need_a_relation_target() {
    let registry = HandlerRegistry::with_defaults();
    let store = MemoryBackend::new();
    let composite = CompositeRef::new("library", "Shelf");
    let broken = Field::new("book", FieldKind::ForeignKey);
    let node = FieldNode::new(&composite, &broken);
    let handler = registry.resolve(&node, false).expect("fk handler");
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut ctx = HandlerContext::new(node, &store, &mut rng);
    assert!(handler(&mut ctx).is_err());
}

#[test]
fn dictionary_words_replace_lorem_text() {
    let path = temp_file("dict", "apple\nBanana\nit's\n\ncherry\n");
    let words = dictionary::load_words(&path).expect("load words");
    assert_eq!(words, vec!["apple", "banana", "cherry"]);

    let mut registry = HandlerRegistry::with_defaults();
    dictionary::register_words(&mut registry, words.clone());
    let store = MemoryBackend::new();
    let title = Field::new("title", FieldKind::Char);
    let email = Field::new("email", FieldKind::Email);

    for seed in 0..10 {
        let title = text(generate(&registry, &store, &title, seed));
        assert!(title.split(' ').all(|word| words.iter().any(|known| known == word)));
        let email = text(generate(&registry, &store, &email, seed));
        let user = email.split('@').next().expect("user");
        assert!(words.iter().any(|known| known == user), "{email}");
    }
}

#[test]
fn missing_dictionary_is_reported() {
    let missing = std::env::temp_dir().join(format!("mockseed_missing_{}", uuid::Uuid::new_v4()));
    assert!(dictionary::load_words(&missing).is_err());
}

#[test]
fn packs_are_applied_by_name() {
    assert_eq!(handlers::pack_names(), &["defaults", "dictionary"]);

    let mut registry = HandlerRegistry::new();
    registry.apply_pack("defaults").expect("defaults pack");
    assert!(!registry.is_empty());
    assert!(registry.apply_pack("lorem-ipsum").is_err());

    let mut config = PopulateConfig::new(vec!["library".to_string()]);
    config.handler_packs = vec!["defaults".to_string()];
    let registry = HandlerRegistry::from_config(&config).expect("registry");
    assert_eq!(registry.global_keys(), HandlerRegistry::with_defaults().global_keys());
}

#[test]
fn handlers_see_records_staged_by_the_open_transaction() {
    let registry = HandlerRegistry::with_defaults();
    let mut store = MemoryBackend::new();
    let book = CompositeRef::new("library", "Book");
    store.begin().expect("begin");
    let mut record = store.construct(&book).expect("construct");
    let id = store.persist(&mut record).expect("persist");

    let fk = Field::new("book", FieldKind::ForeignKey)
        .with_relation(Relation::to_one("library", "Book"));
    assert_eq!(generate(&registry, &store, &fk, 9), Value::Ref(id));
}
