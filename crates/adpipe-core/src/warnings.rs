use std::fmt;

use serde::Serialize;

/// Non-fatal conditions. The affected cells carry a null sentinel and the run continues.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DegenerateWarning {
    /// Values below the first bin boundary of a category column.
    Unbucketed { column: &'static str, rows: usize },
    /// Budget shares are undefined when the platform ROIs do not sum to a positive total.
    NonPositiveRoiTotal { total: f64 },
    /// No platform rows, so there is no best platform to report.
    NoPlatforms,
    /// Averages over zero records.
    EmptyInput { table: &'static str },
}

impl fmt::Display for DegenerateWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbucketed { column, rows } => {
                write!(f, "{rows} rows have no {column} bucket")
            }
            Self::NonPositiveRoiTotal { total } => write!(
                f,
                "platform avg_roi values sum to {total}; budget allocation left empty"
            ),
            Self::NoPlatforms => f.write_str("no platform rows; best platform unavailable"),
            Self::EmptyInput { table } => write!(f, "{table} computed over zero records"),
        }
    }
}
