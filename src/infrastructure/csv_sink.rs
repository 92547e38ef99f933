// CSV file sink for aggregation results
use crate::application::reading_sink::ReadingSink;
use crate::domain::reading::{AggregationResult, PollutantValue};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

const FIXED_COLUMNS: [&str; 5] = [
    "requested_at",
    "location",
    "latitude",
    "longitude",
    "last_observed_at",
];

/// Appends one row per station under the most recent header in the file.
/// A result carrying a pollutant the header lacks starts a new header section with the
/// union of both column sets, so a value never lands under another pollutant's column.
pub struct CsvReadingSink {
    path: PathBuf,
    // Pollutant columns of the last header written; also serializes appends
    columns: Mutex<Option<Vec<String>>>,
}

impl CsvReadingSink {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            columns: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ReadingSink for CsvReadingSink {
    async fn append(&self, requested_at: DateTime<Utc>, result: &AggregationResult) -> Result<()> {
        let mut columns = self.columns.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            *columns = None;
        } else if columns.is_none() {
            *columns = read_last_header(&self.path).await?;
        }

        let (layout, with_header) = column_layout(columns.as_deref(), result);
        if with_header && columns.is_some() {
            tracing::info!(
                "Pollutant columns changed, starting a new header section in {}",
                self.path.display()
            );
        }
        let contents = render_csv(requested_at, result, &layout, with_header);

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        file.write_all(contents.as_bytes())
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        file.flush().await?;

        *columns = Some(layout);
        tracing::debug!("Appended {} rows to {}", result.len(), self.path.display());
        Ok(())
    }
}

/// Pollutant columns of the last header line in an existing file
async fn read_last_header(path: &Path) -> Result<Option<Vec<String>>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let header_prefix = format!("{},", FIXED_COLUMNS[0]);

    Ok(contents
        .lines()
        .rev()
        .find(|line| line.starts_with(&header_prefix))
        .map(|line| {
            line.split(',')
                .skip(FIXED_COLUMNS.len())
                .map(str::to_string)
                .collect()
        }))
}

/// Existing columns are reused when they cover every key of the result.
/// Otherwise the union is returned and a new header is required.
fn column_layout(existing: Option<&[String]>, result: &AggregationResult) -> (Vec<String>, bool) {
    let keys = result.parameter_keys();
    match existing {
        Some(columns) if keys.iter().all(|key| columns.contains(key)) => (columns.to_vec(), false),
        Some(columns) => {
            let union: BTreeSet<String> = columns.iter().cloned().chain(keys).collect();
            (union.into_iter().collect(), true)
        }
        None => (keys.into_iter().collect(), true),
    }
}

fn render_csv(
    requested_at: DateTime<Utc>,
    result: &AggregationResult,
    columns: &[String],
    with_header: bool,
) -> String {
    let mut out = String::new();

    if with_header {
        let header: Vec<String> = FIXED_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(columns.iter().cloned())
            .collect();
        push_row(&mut out, &header);
    }

    let requested_at = requested_at.to_rfc3339_opts(SecondsFormat::Secs, true);
    for reading in &result.stations {
        let mut row = vec![
            requested_at.clone(),
            reading.station.name.clone(),
            reading.station.coordinates.latitude.to_string(),
            reading.station.coordinates.longitude.to_string(),
            reading
                .last_observed_at
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
                .unwrap_or_default(),
        ];
        row.extend(columns.iter().map(|key| match reading.pollutants.get(key) {
            Some(PollutantValue::Measured(p)) => p.to_string(),
            _ => String::new(),
        }));
        push_row(&mut out, &row);
    }
    out
}

fn push_row(out: &mut String, fields: &[String]) {
    let escaped: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
    out.push_str(&escaped.join(","));
    out.push('\n');
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
