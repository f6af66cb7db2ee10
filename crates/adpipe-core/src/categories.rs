//! Ordered business categories. Each binning function is total: it answers for every
//! input, with `None` meaning the value sits below the first boundary.

use std::cmp::Ordering;
use std::fmt;

macro_rules! labelled_enum {
    ($name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            pub fn from_label(label: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|value| value.label() == label)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

labelled_enum!(RoiCategory {
    Loss => "Loss",
    Low => "Low ROI",
    Good => "Good ROI",
    Excellent => "Excellent ROI",
});

labelled_enum!(PerformanceCategory {
    Poor => "Poor",
    Fair => "Fair",
    Good => "Good",
    Excellent => "Excellent",
});

labelled_enum!(AgeGroup {
    UpTo25 => "18-25",
    From26To35 => "26-35",
    From36To45 => "36-45",
    From46To55 => "46-55",
    Over55 => "56+",
});

labelled_enum!(SpendingTier {
    Low => "Low",
    Medium => "Medium",
    High => "High",
    VeryHigh => "Very High",
});

labelled_enum!(DayOfWeek {
    Monday => "Monday",
    Tuesday => "Tuesday",
    Wednesday => "Wednesday",
    Thursday => "Thursday",
    Friday => "Friday",
    Saturday => "Saturday",
    Sunday => "Sunday",
});

labelled_enum!(BudgetRecommendation {
    IncreaseStrong => "Increase Budget +30%",
    Increase => "Increase Budget +15%",
    Maintain => "Maintain Budget",
    Reduce => "Reduce Budget -20%",
});

/// Right-closed bins: `value` lands in the first bucket whose upper edge it does not
/// exceed. Anything above the last edge goes to the last bucket.
fn bin<T: Copy>(value: f64, lower: f64, edges: &[(f64, T)]) -> Option<T> {
    if value.is_nan() || value <= lower {
        return None;
    }
    edges
        .iter()
        .find(|(upper, _)| value <= *upper)
        .or_else(|| edges.last())
        .map(|(_, bucket)| *bucket)
}

impl RoiCategory {
    pub fn from_roi(roi_percentage: f64) -> Option<Self> {
        bin(
            roi_percentage,
            f64::NEG_INFINITY,
            &[
                (0.0, Self::Loss),
                (100.0, Self::Low),
                (300.0, Self::Good),
                (f64::INFINITY, Self::Excellent),
            ],
        )
    }
}

impl PerformanceCategory {
    pub fn from_quality_score(quality_score: f64) -> Option<Self> {
        bin(
            quality_score,
            0.0,
            &[
                (20.0, Self::Poor),
                (40.0, Self::Fair),
                (60.0, Self::Good),
                (100.0, Self::Excellent),
            ],
        )
    }
}

impl AgeGroup {
    pub fn from_age(age: i64) -> Option<Self> {
        bin(
            age as f64,
            0.0,
            &[
                (25.0, Self::UpTo25),
                (35.0, Self::From26To35),
                (45.0, Self::From36To45),
                (55.0, Self::From46To55),
                (100.0, Self::Over55),
            ],
        )
    }
}

impl SpendingTier {
    pub fn from_spend(amount_spent: f64) -> Option<Self> {
        bin(
            amount_spent,
            0.0,
            &[
                (5.0, Self::Low),
                (10.0, Self::Medium),
                (20.0, Self::High),
                (f64::INFINITY, Self::VeryHigh),
            ],
        )
    }
}

impl DayOfWeek {
    /// Calendar position, Monday first. Labels that are not weekday names rank after
    /// Sunday.
    pub fn rank(label: &str) -> usize {
        Self::from_label(label)
            .map(|day| day as usize)
            .unwrap_or(Self::ALL.len())
    }

    /// Total order over raw labels: calendar order, unknown labels last and sorted among
    /// themselves by text.
    pub fn compare_labels(a: &str, b: &str) -> Ordering {
        Self::rank(a).cmp(&Self::rank(b)).then_with(|| a.cmp(b))
    }
}

impl BudgetRecommendation {
    pub fn from_avg_roi(avg_roi: f64) -> Self {
        if avg_roi > 200.0 {
            Self::IncreaseStrong
        } else if avg_roi > 100.0 {
            Self::Increase
        } else if avg_roi > 50.0 {
            Self::Maintain
        } else {
            Self::Reduce
        }
    }
}
