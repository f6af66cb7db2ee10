use adpipe_bucket::BucketError;
use thiserror::Error;

use crate::rules::RulesError;
use crate::schema::SchemaError;
use crate::stages::Stage;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("input validation failed: {0}")]
    Schema(#[from] SchemaError),

    #[error("object storage unavailable: {0}")]
    Store(#[from] BucketError),

    #[error("no {stage} dataset found")]
    NoDataset { stage: Stage },

    #[error("business rules error: {0}")]
    Rules(#[from] RulesError),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
