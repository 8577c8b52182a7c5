//! CSV manifest import: extract from storage, transform rows into cargo
//! payloads, load them through the API in one batch.

use crate::domain::model::{FailedImport, ImportReport, NewCargo};
use crate::domain::ports::{CargoApi, Storage};
use crate::utils::error::{Result, StowageError};
use std::collections::HashMap;

pub const REQUIRED_COLUMNS: [&str; 3] = ["name", "size", "priority"];

/// Rows that parsed, plus the ones that did not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    pub items: Vec<NewCargo>,
    /// `rows[i]` is the data-row index `items[i]` came from.
    pub rows: Vec<usize>,
    pub errors: Vec<FailedImport>,
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

struct Columns(HashMap<String, usize>);

impl Columns {
    fn cell<'r>(&self, record: &'r csv::StringRecord, column: &str) -> Option<&'r str> {
        self.0
            .get(column)
            .and_then(|i| record.get(*i))
            .filter(|value| !value.is_empty())
    }
}

fn parse_row(columns: &Columns, record: &csv::StringRecord) -> std::result::Result<NewCargo, String> {
    let name = columns
        .cell(record, "name")
        .ok_or_else(|| "name is empty".to_string())?;
    let size_cell = columns.cell(record, "size").unwrap_or_default();
    let size: f64 = size_cell
        .parse()
        .map_err(|_| format!("invalid size '{}'", size_cell))?;
    let priority_cell = columns.cell(record, "priority").unwrap_or_default();
    let priority: u32 = priority_cell
        .parse()
        .map_err(|_| format!("invalid priority '{}'", priority_cell))?;

    let mut cargo = NewCargo::new(name, size, priority);

    if let Some(value) = columns.cell(record, "expiry_days") {
        cargo.expiry_days = value
            .parse()
            .map_err(|_| format!("invalid expiry_days '{}'", value))?;
    }
    if let Some(value) = columns.cell(record, "mass") {
        cargo.mass = Some(value.parse().map_err(|_| format!("invalid mass '{}'", value))?);
    }
    for (column, flag) in [
        ("temperature_sensitive", &mut cargo.temperature_sensitive),
        ("hazardous", &mut cargo.hazardous),
        ("fragile", &mut cargo.fragile),
    ] {
        if let Some(value) = columns.cell(record, column) {
            *flag = parse_bool(value).ok_or_else(|| format!("invalid {} '{}'", column, value))?;
        }
    }

    cargo.zone = columns.cell(record, "zone").map(str::to_string);
    cargo.id = columns.cell(record, "id").map(str::to_string);
    if let Some(description) = columns.cell(record, "description") {
        cargo.description = description.to_string();
    }
    Ok(cargo)
}

/// Parses a cargo manifest. Only a missing required column fails the whole
/// file; bad rows are collected and skipped.
pub fn parse_manifest(data: &[u8]) -> Result<Manifest> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    let columns = Columns(
        reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, header)| (header.to_ascii_lowercase(), i))
            .collect(),
    );

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !columns.0.contains_key(*column))
        .collect();
    if !missing.is_empty() {
        return Err(StowageError::validation(format!(
            "missing required column(s): {}",
            missing.join(", ")
        )));
    }

    let mut manifest = Manifest::default();
    for (index, record) in reader.records().enumerate() {
        let parsed = match record {
            Ok(record) => parse_row(&columns, &record).map_err(|error| {
                // 保留名稱以便回報
                let name = columns.cell(&record, "name").unwrap_or_default();
                (name.to_string(), error)
            }),
            Err(e) => Err((String::new(), e.to_string())),
        };

        match parsed {
            Ok(cargo) => {
                manifest.items.push(cargo);
                manifest.rows.push(index);
            }
            Err((name, error)) => {
                tracing::warn!(row = index + 1, "⚠️ Skipping manifest row: {}", error);
                manifest.errors.push(FailedImport {
                    index,
                    name,
                    error,
                });
            }
        }
    }

    Ok(manifest)
}

pub struct ImportJob<'a, S: Storage, A: CargoApi> {
    storage: S,
    api: &'a A,
    manifest_path: String,
    report_path: Option<String>,
}

impl<'a, S: Storage, A: CargoApi> ImportJob<'a, S, A> {
    pub fn new(storage: S, api: &'a A, manifest_path: impl Into<String>) -> Self {
        Self {
            storage,
            api,
            manifest_path: manifest_path.into(),
            report_path: None,
        }
    }

    /// Also write the final report as JSON through the storage.
    pub fn with_report_path(mut self, path: impl Into<String>) -> Self {
        self.report_path = Some(path.into());
        self
    }

    pub async fn extract(&self) -> Result<Vec<u8>> {
        tracing::debug!("Reading manifest from {}", self.manifest_path);
        self.storage.read_file(&self.manifest_path).await
    }

    pub fn transform(&self, data: &[u8]) -> Result<Manifest> {
        parse_manifest(data)
    }

    pub async fn load(&self, manifest: Manifest) -> Result<ImportReport> {
        let mut report = if manifest.items.is_empty() {
            tracing::warn!("No valid rows to import");
            ImportReport::default()
        } else {
            self.api.import_items(&manifest.items).await?
        };

        // 伺服器回報的 index 是批次內位置，換回 CSV 列號
        for failed in &mut report.failed_items {
            if let Some(row) = manifest.rows.get(failed.index) {
                failed.index = *row;
            }
        }
        report.failed_items.extend(manifest.errors);
        report.failed_items.sort_by_key(|failed| failed.index);

        if let Some(path) = &self.report_path {
            let json = serde_json::to_vec_pretty(&report)?;
            self.storage.write_file(path, &json).await?;
            tracing::debug!("Import report saved to {}", path);
        }

        Ok(report)
    }

    pub async fn run(&self) -> Result<ImportReport> {
        tracing::info!("🚀 Starting manifest import");

        let data = self.extract().await?;
        tracing::info!("📄 Read {} bytes from {}", data.len(), self.manifest_path);

        let manifest = self.transform(&data)?;
        tracing::info!(
            "🔄 Parsed {} rows ({} rejected locally)",
            manifest.items.len(),
            manifest.errors.len()
        );

        let report = self.load(manifest).await?;
        tracing::info!(
            "✅ Imported {} items, {} failed",
            report.success_count,
            report.failed_items.len()
        );
        Ok(report)
    }
}
