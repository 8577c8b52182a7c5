use crate::domain::model::ArrangementRow;
use crate::domain::ports::ExportFormat;
use crate::utils::error::{Result, StowageError};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const CSV_HEADER: [&str; 9] = [
    "item_id", "zone", "name", "x", "y", "z", "width", "depth", "height",
];

pub fn content_type(format: ExportFormat) -> &'static str {
    match format {
        ExportFormat::Csv => "text/csv",
        ExportFormat::Json => "application/json",
        ExportFormat::Zip => "application/zip",
    }
}

pub fn file_name(format: ExportFormat) -> String {
    format!("arrangement.{}", format.as_str())
}

pub fn to_csv(rows: &[ArrangementRow]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for row in rows {
        writer.write_record([
            row.item_id.clone(),
            row.zone.clone(),
            row.name.clone(),
            format!("{:.3}", row.x),
            format!("{:.3}", row.y),
            format!("{:.3}", row.z),
            format!("{:.3}", row.width),
            format!("{:.3}", row.depth),
            format!("{:.3}", row.height),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| StowageError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| StowageError::validation(e.to_string()))
}

/// ZIP bundle with `arrangement.csv` and `arrangement.json`.
pub fn to_zip(rows: &[ArrangementRow]) -> Result<Vec<u8>> {
    let csv_output = to_csv(rows)?;
    let json_output = serde_json::to_string_pretty(rows)?;

    tracing::debug!("Creating arrangement bundle with {} rows", rows.len());

    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    zip.start_file::<_, ()>("arrangement.csv", FileOptions::default())?;
    zip.write_all(csv_output.as_bytes())?;

    zip.start_file::<_, ()>("arrangement.json", FileOptions::default())?;
    zip.write_all(json_output.as_bytes())?;

    // 完成並取回底層 Vec<u8>
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

pub fn render(rows: &[ArrangementRow], format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Csv => Ok(to_csv(rows)?.into_bytes()),
        ExportFormat::Json => Ok(serde_json::to_vec_pretty(rows)?),
        ExportFormat::Zip => to_zip(rows),
    }
}
