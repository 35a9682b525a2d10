// src/fmu/config.rs

//! Repackaging configuration
//!
//! Everything the pipeline needs is passed in explicitly through
//! [`RepackageConfig`]; nothing is read from the environment.

use crate::error::{Error, Result};
use crate::fmu::descriptor::{Causality, Variability};
use crate::fmu::mutate::{TypedValue, VariableSpec};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Suffix appended to the vendor description
pub const DEFAULT_DESCRIPTION_SUFFIX: &str = "[MCP-Enhanced]";

/// Default `server_name` in the injected config document
pub const DEFAULT_SERVER_NAME: &str = "fmu-mcp-wrapper";

/// Default wrapper `version` in the injected config document
pub const DEFAULT_WRAPPER_VERSION: &str = "1.0.0";

/// `generationTool` stamp used when the caller does not supply one
pub fn default_tool_stamp() -> String {
    format!("FMU-MCP-Repackager v{}", env!("CARGO_PKG_VERSION"))
}

/// The status and version variables every wrapped FMU exposes
pub fn wrapper_variables(version: &str) -> Vec<VariableSpec> {
    vec![
        VariableSpec::new(
            "mcp_server_status",
            Causality::Output,
            Variability::Discrete,
            TypedValue::String(Some("active".to_string())),
        )
        .with_description("MCP Server operational status"),
        VariableSpec::new(
            "mcp_server_version",
            Causality::Parameter,
            Variability::Fixed,
            TypedValue::String(Some(version.to_string())),
        )
        .with_description("MCP Server version"),
    ]
}

/// Options for one repackaging run
#[derive(Debug, Clone)]
pub struct RepackageConfig {
    /// Variables to inject; `None` injects [`wrapper_variables`] using the
    /// effective wrapper version
    pub variables: Option<Vec<VariableSpec>>,
    pub description_suffix: String,
    pub tool_stamp: String,
    /// Generation time; `None` means the moment the run starts
    pub timestamp: Option<DateTime<Utc>>,
    /// Keys merged over the built-in MCP config defaults
    pub overrides: Map<String, Value>,
    /// Allow injected resources to replace files shipped in the source FMU
    pub allow_overwrite: bool,
    /// Also write `resources/MCP_README.txt`
    pub include_readme: bool,
}

impl Default for RepackageConfig {
    fn default() -> Self {
        Self {
            variables: None,
            description_suffix: DEFAULT_DESCRIPTION_SUFFIX.to_string(),
            tool_stamp: default_tool_stamp(),
            timestamp: None,
            overrides: Map::new(),
            allow_overwrite: false,
            include_readme: true,
        }
    }
}

impl RepackageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(mut self, overrides: Map<String, Value>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_variables(mut self, variables: Vec<VariableSpec>) -> Self {
        self.variables = Some(variables);
        self
    }

    pub fn with_tool_stamp(mut self, stamp: impl Into<String>) -> Self {
        self.tool_stamp = stamp.into();
        self
    }

    pub fn with_description_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.description_suffix = suffix.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn allow_overwrite(mut self, allow: bool) -> Self {
        self.allow_overwrite = allow;
        self
    }

    pub fn include_readme(mut self, include: bool) -> Self {
        self.include_readme = include;
        self
    }

    /// Wrapper version after overrides are applied
    pub fn wrapper_version(&self) -> String {
        self.overrides
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_WRAPPER_VERSION)
            .to_string()
    }

    /// Reject overrides the wrapper cannot use
    ///
    /// `version` also becomes the start value of a string variable, so it
    /// has to be a JSON string.
    pub fn validate(&self) -> Result<()> {
        check_overrides(&self.overrides)
    }

    /// Variables this run will inject
    pub fn effective_variables(&self) -> Vec<VariableSpec> {
        match &self.variables {
            Some(variables) => variables.clone(),
            None => wrapper_variables(&self.wrapper_version()),
        }
    }

    /// Parse an override document; it must be a JSON object
    pub fn parse_overrides(json: &str) -> Result<Map<String, Value>> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| Error::InvalidConfig(format!("override document: {}", e)))?;
        match value {
            Value::Object(map) => {
                check_overrides(&map)?;
                Ok(map)
            }
            other => Err(Error::InvalidConfig(format!(
                "override document must be a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }
}

fn check_overrides(overrides: &Map<String, Value>) -> Result<()> {
    match overrides.get("version") {
        None | Some(Value::String(_)) => Ok(()),
        Some(other) => Err(Error::InvalidConfig(format!(
            "override \"version\" must be a string, found {}",
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
