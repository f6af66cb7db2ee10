pub mod aggregator;
pub mod categories;
pub mod cleaner;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod record;
pub mod rules;
pub mod runner;
pub mod schema;
pub mod stages;
pub mod warnings;

pub use aggregator::{aggregate, SummaryTables};
pub use cleaner::{clean, clean_frame, CleaningReport};
pub use error::{PipelineError, Result};
pub use extract::add_cost_data;
pub use metrics::{derive_frame, derive_metrics, DerivationReport};
pub use rules::BusinessRules;
pub use runner::{run_aggregate, run_all, run_clean, run_enrich, run_extract, RunReport};
pub use stages::{DatasetHandle, Stage, StageStore};
pub use warnings::DegenerateWarning;

pub use polars::prelude::DataFrame;
