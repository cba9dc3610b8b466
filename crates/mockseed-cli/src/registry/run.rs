use std::fs::{OpenOptions, create_dir_all};
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use serde::Serialize;

use mockseed_config::PopulateConfig;
use mockseed_core::{CompositeRef, SchemaCatalog};
use mockseed_populate::output::csv::write_composite_csv;
use mockseed_populate::output::json::write_records_json;
use mockseed_populate::{MemoryBackend, PopulateError, RunReport};

use super::RegistryResult;

/// Metadata captured at run start.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub run_dir: PathBuf,
    pub schema_path: PathBuf,
    pub config_path: PathBuf,
}

/// JSON config written to each run directory.
#[derive(Debug, Serialize)]
pub struct RunConfig<'a> {
    pub run_id: String,
    pub started_at: String,
    pub schema_path: String,
    pub config_path: String,
    pub config: &'a PopulateConfig,
    pub git: GitInfo,
}

/// Git metadata for reproducibility.
#[derive(Debug, Serialize)]
pub struct GitInfo {
    pub commit: Option<String>,
    pub dirty: Option<bool>,
}

/// Paths for run artifacts.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub root: PathBuf,
    pub report_path: PathBuf,
    pub records_path: PathBuf,
    pub logs_path: PathBuf,
}

/// Create `{timestamp}__run_{id}` and write the effective config into it.
pub fn start_run(ctx: &RunContext, config: &PopulateConfig) -> RegistryResult<RunPaths> {
    let timestamp = ctx.started_at.format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let root = ctx
        .run_dir
        .join(format!("{timestamp}__run_{}", ctx.run_id));

    create_dir_all(&root)?;

    let logs_path = root.join("logs.ndjson");
    let run_config = RunConfig {
        run_id: ctx.run_id.clone(),
        started_at: ctx.started_at.to_rfc3339(),
        schema_path: ctx.schema_path.display().to_string(),
        config_path: ctx.config_path.display().to_string(),
        config,
        git: collect_git_info(),
    };
    write_json(&root.join("config.json"), &run_config)?;

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&logs_path)?;

    Ok(RunPaths {
        report_path: root.join("report.json"),
        records_path: root.join("records.json"),
        logs_path,
        root,
    })
}

pub fn write_report(paths: &RunPaths, report: &RunReport) -> RegistryResult<()> {
    write_json(&paths.report_path, report)
}

pub fn write_records(paths: &RunPaths, store: &MemoryBackend) -> RegistryResult<()> {
    write_records_json(&paths.records_path, store.all_records())?;
    Ok(())
}

/// One `<container>.<Composite>.csv` per walked composite; returns bytes written.
pub fn write_composite_csvs(
    paths: &RunPaths,
    catalog: &SchemaCatalog,
    composites: &[CompositeRef],
    store: &MemoryBackend,
) -> RegistryResult<u64> {
    let mut bytes = 0;
    for composite in composites {
        let Some(definition) = catalog.composite(composite) else {
            continue;
        };
        let path = paths.root.join(format!("{composite}.csv"));
        bytes += write_composite_csv(&path, &definition.fields, store.records(composite))
            .map_err(PopulateError::from)?;
    }
    Ok(bytes)
}

pub fn collect_git_info() -> GitInfo {
    let commit = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
            } else {
                None
            }
        })
        .filter(|value| !value.is_empty());

    let dirty = Command::new("git")
        .args(["status", "--porcelain"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| !output.stdout.is_empty());

    GitInfo { commit, dirty }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> RegistryResult<()> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}
