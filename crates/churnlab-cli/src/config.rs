use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use churnlab_clean::CleanOptions;
use churnlab_generate::GeneratorConfig;
use churnlab_report::ReportOptions;

use crate::CliError;

/// Whole-pipeline configuration, one TOML table per stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub generator: GeneratorConfig,
    pub cleaner: CleanOptions,
    pub report: ReportOptions,
}

impl PipelineConfig {
    /// Load from `path`, or fall back to defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path).map_err(|err| {
                    CliError::InvalidConfig(format!("cannot read {}: {err}", path.display()))
                })?;
                Self::from_toml(&contents)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, CliError> {
        toml::from_str(contents).map_err(|err| CliError::InvalidConfig(err.to_string()))
    }

    pub fn to_toml(&self) -> Result<String, CliError> {
        toml::to_string_pretty(self).map_err(|err| CliError::InvalidConfig(err.to_string()))
    }

    /// Both stages measure durations against the same reference date.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.generator.as_of != self.cleaner.as_of {
            return Err(CliError::InvalidConfig(format!(
                "generator.as_of ({}) and cleaner.as_of ({}) must match",
                self.generator.as_of, self.cleaner.as_of
            )));
        }
        Ok(())
    }
}

pub fn schema_json() -> Result<String, CliError> {
    let schema = schemars::schema_for!(PipelineConfig);
    Ok(serde_json::to_string_pretty(&schema)?)
}
