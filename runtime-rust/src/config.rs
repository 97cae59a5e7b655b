//! Run configuration
//!
//! Column roles and policies shared by every (k, l) run. k and l themselves are per-run parameters.

use flightanon_validator::errors::*;

use clap::ValueEnum;
use flightanon_validator::base::{PrivacyDefinition, QuasiIdentifiers};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Treatment of a category that is present in the original data but absent after anonymization.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DivergencePolicy {
    /// fail with `DivergenceUndefined`
    Error,
    /// report an infinite divergence
    Infinity,
}

impl Default for DivergencePolicy {
    fn default() -> Self {
        DivergencePolicy::Error
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnonymizationConfig {
    pub identifiers: QuasiIdentifiers,
    /// directly-identifying columns removed from every record
    pub suppressed: Vec<String>,
    /// every value of the sensitive attribute that l is checked against
    pub sensitive_categories: Vec<String>,
    /// chrono formats accepted for the temporal quasi-identifier, tried in order
    pub date_formats: Vec<String>,
    pub exempt_absent_categories: bool,
    pub divergence: DivergencePolicy,
    /// fail instead of warning when a partition cannot reach k and l
    pub deny_unsatisfiable: bool,
}

impl Default for AnonymizationConfig {
    fn default() -> Self {
        AnonymizationConfig {
            identifiers: QuasiIdentifiers::default(),
            suppressed: ["Passenger ID", "First Name", "Last Name", "Nationality", "Pilot Name"]
                .iter().map(|name| name.to_string()).collect(),
            sensitive_categories: ["Delayed", "On Time", "Cancelled"]
                .iter().map(|name| name.to_string()).collect(),
            date_formats: ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"]
                .iter().map(|format| format.to_string()).collect(),
            exempt_absent_categories: false,
            divergence: DivergencePolicy::default(),
            deny_unsatisfiable: false,
        }
    }
}

impl AnonymizationConfig {
    /// Loads a JSON configuration file. Missing fields take their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<AnonymizationConfig> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .chain_err(|| format!("unable to read config {}", path.display()))?;
        AnonymizationConfig::from_json(&text)
            .chain_err(|| format!("unable to parse config {}", path.display()))
    }

    /// # Example
    /// ```
    /// use flightanon_runtime::config::{AnonymizationConfig, DivergencePolicy};
    ///
    /// let config = AnonymizationConfig::from_json(r#"{"divergence": "infinity", "suppressed": ["Passenger ID"]}"#).unwrap();
    /// assert_eq!(config.divergence, DivergencePolicy::Infinity);
    /// assert_eq!(config.suppressed, vec!["Passenger ID"]);
    /// assert_eq!(config.identifiers.numeric, "Age");
    /// ```
    pub fn from_json(text: &str) -> Result<AnonymizationConfig> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn privacy_definition(&self, k: usize, l: usize) -> PrivacyDefinition {
        PrivacyDefinition::new(k, l, self.sensitive_categories.clone())
            .exempt_absent_categories(self.exempt_absent_categories)
    }
}
