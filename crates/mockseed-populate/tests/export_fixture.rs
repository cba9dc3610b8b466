use std::fs;
use std::path::{Path, PathBuf};

use mockseed_config::load_config;
use mockseed_core::{CompositeRef, SchemaCatalog};
use mockseed_populate::output::csv::write_composite_csv;
use mockseed_populate::output::json::write_records_json;
use mockseed_populate::{HandlerRegistry, MemoryBackend, PopulateOptions, PopulationEngine};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../fixtures")
        .join(name)
}

fn load_catalog() -> SchemaCatalog {
    let path = fixture("library.catalog.json");
    let contents =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing json at {}", path.display()));
    serde_json::from_str(&contents).expect("parse catalog")
}

fn temp_out_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mockseed_{label}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn populate() -> (SchemaCatalog, MemoryBackend) {
    let catalog = load_catalog();
    let config = load_config(&fixture("library.populate.toml")).expect("load config");
    let registry = HandlerRegistry::from_config(&config).expect("registry");
    let mut engine = PopulationEngine::new(PopulateOptions::from_config(&config), registry);
    let mut store = MemoryBackend::new();

    let report = engine.run(&catalog, &mut store).expect("run");
    assert_eq!(report.seed, 42);
    assert_eq!(report.composites_persisted, 15);
    (catalog, store)
}

#[test]
fn fixture_run_exports_one_csv_per_composite() {
    let (catalog, store) = populate();
    let out_dir = temp_out_dir("csv");

    let container = catalog.container("library").expect("library");
    for composite in &container.composites {
        let reference = CompositeRef::new("library", &composite.name);
        let path = out_dir.join(format!("{reference}.csv"));
        let bytes = write_composite_csv(&path, &composite.fields, store.records(&reference))
            .expect("write csv");
        assert!(bytes > 0);

        let mut reader = csv::Reader::from_path(&path).expect("open csv");
        let header: Vec<String> = reader
            .headers()
            .expect("header")
            .iter()
            .map(str::to_string)
            .collect();
        let expected: Vec<String> = composite.fields.iter().map(|f| f.name.clone()).collect();
        assert_eq!(header, expected);
        assert_eq!(reader.records().count(), 3, "{reference}");
    }

    let mut chapters = csv::Reader::from_path(out_dir.join("library.Chapter.csv")).expect("open");
    for row in chapters.records() {
        let row = row.expect("row");
        assert_eq!(&row[2], "1");
        assert!(!row[1].is_empty(), "chapter points at a book");
    }
}

#[test]
fn fixture_run_exports_json_snapshot() {
    let (_, store) = populate();
    let path = temp_out_dir("json").join("records.json");
    write_records_json(&path, store.all_records()).expect("write json");

    let snapshot: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("read json")).expect("parse json");
    let books = snapshot["library.Book"].as_array().expect("books");
    assert_eq!(books.len(), 3);
    for book in books {
        assert!(book["id"].is_u64());
        assert!(book["isbn"].is_i64());
        assert!(book["authors"].as_array().is_some_and(|ids| !ids.is_empty()));
    }
    let bookmarks = snapshot["library.Bookmark"].as_array().expect("bookmarks");
    for bookmark in bookmarks {
        let color = bookmark["color"].as_i64().expect("color");
        assert!((1..=3).contains(&color));
    }
}
