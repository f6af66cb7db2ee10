use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("failed to read rules file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse rules file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid business rule: {0}")]
    Invalid(String),
}

/// Constants used to price source records before they enter the pipeline.
///
/// ```toml
/// default_cpc = 1.50
/// conversion_value = 50.0
///
/// [cpc_rates]
/// Facebook = 1.72
/// LinkedIn = 5.26
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BusinessRules {
    /// Cost per click by platform label, matched exactly as it appears in the source.
    pub cpc_rates: BTreeMap<String, f64>,
    pub default_cpc: f64,
    /// Revenue credited per conversion.
    pub conversion_value: f64,
}

impl Default for BusinessRules {
    fn default() -> Self {
        let cpc_rates = [
            ("Facebook", 1.72),
            ("Instagram", 1.20),
            ("Twitter", 0.38),
            ("LinkedIn", 5.26),
        ]
        .into_iter()
        .map(|(platform, rate)| (platform.to_string(), rate))
        .collect();

        Self {
            cpc_rates,
            default_cpc: 1.50,
            conversion_value: 50.0,
        }
    }
}

impl BusinessRules {
    pub fn from_toml_str(contents: &str) -> Result<Self, RulesError> {
        let rules: Self = toml::from_str(contents)?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RulesError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn cpc_for(&self, platform: &str) -> f64 {
        self.cpc_rates
            .get(platform)
            .copied()
            .unwrap_or(self.default_cpc)
    }

    fn validate(&self) -> Result<(), RulesError> {
        let non_negative = |value: f64| value.is_finite() && value >= 0.0;

        if let Some((platform, rate)) = self
            .cpc_rates
            .iter()
            .find(|(_, rate)| !non_negative(**rate))
        {
            return Err(RulesError::Invalid(format!(
                "cpc rate for {platform} must be a non-negative number, got {rate}"
            )));
        }
        if !non_negative(self.default_cpc) {
            return Err(RulesError::Invalid(format!(
                "default_cpc must be a non-negative number, got {}",
                self.default_cpc
            )));
        }
        if !non_negative(self.conversion_value) {
            return Err(RulesError::Invalid(format!(
                "conversion_value must be a non-negative number, got {}",
                self.conversion_value
            )));
        }
        Ok(())
    }
}
