use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

use adpipe_bucket::{BucketStore, ObjectSummary};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{PipelineError, Result};
use crate::schema;

const CSV_EXTENSION: &str = ".csv";
const CSV_CONTENT_TYPE: &str = "text/csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Source,
    Raw,
    Clean,
    Enriched,
    Summary,
}

impl Stage {
    pub fn prefix(self) -> &'static str {
        match self {
            Stage::Source => "source",
            Stage::Raw => "raw",
            Stage::Clean => "clean",
            Stage::Enriched => "enriched",
            Stage::Summary => "summary",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Location of a persisted dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetHandle {
    pub stage: Stage,
    pub key: String,
}

/// Builds `<stage>/<name>_<YYYYmmdd_HHMMSS>_<id>.csv`; summary tables get their own
/// folder under `summary/<name>/`.
pub fn dataset_key(stage: Stage, name: &str, at: DateTime<Utc>, id: Uuid) -> String {
    let file = format!(
        "{name}_{}_{}{CSV_EXTENSION}",
        at.format("%Y%m%d_%H%M%S"),
        id.simple()
    );
    match stage {
        Stage::Summary => format!("{}/{name}/{file}", stage.prefix()),
        _ => format!("{}/{file}", stage.prefix()),
    }
}

/// Picks the most recently modified CSV object; equal timestamps fall to the greater key.
pub fn select_latest(objects: &[ObjectSummary]) -> Option<&ObjectSummary> {
    objects
        .iter()
        .filter(|object| object.key.ends_with(CSV_EXTENSION))
        .max_by(|a, b| {
            a.last_modified
                .cmp(&b.last_modified)
                .then_with(|| a.key.cmp(&b.key))
        })
}

pub fn encode_csv(df: &DataFrame) -> PolarsResult<Bytes> {
    let mut buffer = Vec::new();
    let mut clone = df.clone();
    CsvWriter::new(&mut buffer)
        .include_header(true)
        .finish(&mut clone)?;
    Ok(Bytes::from(buffer))
}

/// Parses CSV bytes with every known campaign column pinned to its canonical type.
/// Other columns are inferred over the whole file, not a leading sample.
pub fn decode_csv(bytes: &[u8]) -> Result<DataFrame> {
    let header = CsvReadOptions::default()
        .with_has_header(true)
        .with_n_rows(Some(0))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;
    let pinned = schema::canonical_schema(
        header
            .get_column_names()
            .into_iter()
            .map(|name| name.as_str()),
    );

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_schema_overwrite(Some(Arc::new(pinned)))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;
    Ok(schema::coerce_known_columns(&df)?)
}

/// Stage-aware view over a [`BucketStore`]. Every collaborator call of the pipeline goes
/// through here.
#[derive(Clone)]
pub struct StageStore {
    store: Arc<dyn BucketStore>,
}

impl StageStore {
    pub fn new(store: Arc<dyn BucketStore>) -> Self {
        Self { store }
    }

    /// Handle of the newest dataset persisted under `stage`.
    pub async fn latest(&self, stage: Stage) -> Result<DatasetHandle> {
        let prefix = format!("{}/", stage.prefix());
        let objects = self.store.list_objects(&prefix).await?;
        let latest = select_latest(&objects).ok_or(PipelineError::NoDataset { stage })?;
        debug!(
            %stage,
            key = %latest.key,
            candidates = objects.len(),
            "selected latest dataset"
        );
        Ok(DatasetHandle {
            stage,
            key: latest.key.clone(),
        })
    }

    pub async fn fetch_latest(&self, stage: Stage) -> Result<(DatasetHandle, DataFrame)> {
        let handle = self.latest(stage).await?;
        let df = self.fetch(&handle.key).await?;
        Ok((handle, df))
    }

    pub async fn fetch(&self, key: &str) -> Result<DataFrame> {
        let bytes = self.store.get_object(key).await?;
        let df = decode_csv(&bytes)?;
        info!(key = %key, rows = df.height(), "loaded dataset");
        Ok(df)
    }

    pub async fn persist(&self, stage: Stage, name: &str, df: &DataFrame) -> Result<DatasetHandle> {
        let key = dataset_key(stage, name, Utc::now(), Uuid::new_v4());
        let bytes = encode_csv(df)?;
        self.store
            .put_object(&key, bytes, CSV_CONTENT_TYPE)
            .await?;
        info!(%stage, key = %key, rows = df.height(), "persisted dataset");
        Ok(DatasetHandle { stage, key })
    }
}
