use serde::Deserialize;

use crate::error::ReconError;
use crate::model::RoleMap;
use crate::normalize::{KeyMode, KEY_SEPARATOR};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub keys: KeyConfig,
    #[serde(default)]
    pub duplicates: DuplicateConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Manual column selections. Any role set here replaces the classifier's guess.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourcesConfig {
    #[serde(default)]
    pub pedro: RoleMap,
    #[serde(default)]
    pub dga: RoleMap,
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyConfig {
    #[serde(default)]
    pub mode: KeyMode,
    #[serde(default = "default_separator")]
    pub separator: String,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            mode: KeyMode::default(),
            separator: default_separator(),
        }
    }
}

fn default_separator() -> String {
    KEY_SEPARATOR.to_string()
}

// ---------------------------------------------------------------------------
// Duplicates + Report
// ---------------------------------------------------------------------------

/// What to do when several joined rows share one composite key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the first joined row per key, drop the rest with a warning.
    #[default]
    KeepFirst,
    /// Fail the run and list the offending keys.
    Reject,
}

impl std::str::FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep_first" | "keep-first" => Ok(Self::KeepFirst),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown duplicate policy '{other}' (expected keep_first or reject)")),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DuplicateConfig {
    #[serde(default)]
    pub policy: DuplicatePolicy,
}

pub const DEFAULT_REPORT_PREFIX: &str = "controle_envio";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { prefix: default_prefix() }
    }
}

fn default_prefix() -> String {
    DEFAULT_REPORT_PREFIX.to_string()
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let sep = &self.keys.separator;
        if sep.is_empty() {
            return Err(ReconError::ConfigValidation("keys.separator must not be empty".into()));
        }
        // Digit-only key parts would make a digit separator ambiguous.
        if sep.chars().any(|c| c.is_ascii_digit()) {
            return Err(ReconError::ConfigValidation(format!(
                "keys.separator '{sep}' must not contain digits"
            )));
        }

        if self.report.prefix.trim().is_empty() {
            return Err(ReconError::ConfigValidation("report.prefix must not be empty".into()));
        }
        if self.report.prefix.contains(['/', '\\']) {
            return Err(ReconError::ConfigValidation(format!(
                "report.prefix '{}' must be a file name, not a path",
                self.report.prefix
            )));
        }

        for (side, map) in [("pedro", &self.sources.pedro), ("dga", &self.sources.dga)] {
            for column in [&map.invoice, &map.order, &map.customer].into_iter().flatten() {
                if column.trim().is_empty() {
                    return Err(ReconError::ConfigValidation(format!(
                        "sources.{side}: column names must not be blank"
                    )));
                }
            }
        }

        Ok(())
    }
}
