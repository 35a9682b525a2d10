// src/fmu/mcp.rs

//! MCP wrapper resources
//!
//! Builds the three files written under `resources/`: the JSON config
//! document, the static wrapper script and the integration readme.

use crate::error::{Error, Result};
use crate::fmu::config::{RepackageConfig, DEFAULT_SERVER_NAME, DEFAULT_WRAPPER_VERSION};
use crate::fmu::resources::InjectedResource;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

pub const CONFIG_FILE: &str = "mcp_config.json";
pub const WRAPPER_FILE: &str = "mcp_wrapper.py";
pub const README_FILE: &str = "MCP_README.txt";

const WRAPPER_SCRIPT: &str = include_str!("templates/mcp_wrapper.py");

/// Capability flags advertised by the wrapper
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Capabilities {
    pub tools: bool,
    pub resources: bool,
    pub prompts: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            tools: true,
            resources: false,
            prompts: false,
        }
    }
}

/// Built-in contents of `resources/mcp_config.json`
#[derive(Debug, Clone, Serialize)]
pub struct McpConfig {
    pub enabled: bool,
    pub version: String,
    pub server_name: String,
    pub capabilities: Capabilities,
    pub original_fmu: String,
    pub repackaged_timestamp: String,
}

impl McpConfig {
    pub fn new(original_fmu: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            enabled: true,
            version: DEFAULT_WRAPPER_VERSION.to_string(),
            server_name: DEFAULT_SERVER_NAME.to_string(),
            capabilities: Capabilities::default(),
            original_fmu: original_fmu.into(),
            repackaged_timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }

    /// Defaults with `overrides` replacing top-level keys
    pub fn merged(&self, overrides: &Map<String, Value>) -> Result<Map<String, Value>> {
        let mut document = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(Error::InvalidConfig(format!(
                    "config defaults did not serialize to an object: {other}"
                )));
            }
            Err(e) => return Err(Error::InvalidConfig(e.to_string())),
        };
        for (key, value) in overrides {
            document.insert(key.clone(), value.clone());
        }
        Ok(document)
    }

    /// Pretty-printed merged document
    pub fn render(&self, overrides: &Map<String, Value>) -> Result<String> {
        let document = self.merged(overrides)?;
        let mut text = serde_json::to_string_pretty(&Value::Object(document))
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        text.push('\n');
        Ok(text)
    }
}

/// The wrapper script shipped in every repackaged FMU
pub fn wrapper_script() -> &'static str {
    WRAPPER_SCRIPT
}

/// Text of `resources/MCP_README.txt`
pub fn readme(
    original_fmu: &str,
    output_fmu: &str,
    fmi_version: &str,
    timestamp: DateTime<Utc>,
) -> String {
    format!(
        "MCP Server Integration for FMU\n\
         \n\
         This FMU has been repackaged with MCP (Model Context Protocol) Server capabilities.\n\
         \n\
         Original FMU: {original_fmu}\n\
         Repackaged FMU: {output_fmu}\n\
         Repackaged: {} UTC\n\
         FMI Version: {fmi_version}\n\
         \n\
         The simulation binaries and model description are unchanged apart from\n\
         the injected MCP variables, so the FMU loads in any FMI-compliant tool.\n\
         \n\
         MCP Server Usage:\n\
         The MCP server wrapper is located in resources/{WRAPPER_FILE}\n\
         Configuration is in resources/{CONFIG_FILE}\n\
         Run `python resources/{WRAPPER_FILE}` for a status summary, or add\n\
         `--tools` to list the available operations.\n",
        timestamp.format("%Y-%m-%d %H:%M:%S"),
    )
}

/// Context shared by the generated resources of one run
#[derive(Debug, Clone)]
pub struct ResourceContext<'a> {
    pub original_fmu: &'a str,
    pub output_fmu: &'a str,
    pub fmi_version: &'a str,
    pub timestamp: DateTime<Utc>,
}

/// All resources a run injects, in write order
pub fn wrapper_resources(
    config: &RepackageConfig,
    context: &ResourceContext<'_>,
) -> Result<Vec<InjectedResource>> {
    let document =
        McpConfig::new(context.original_fmu, context.timestamp).render(&config.overrides)?;

    let mut resources = vec![
        InjectedResource::new(CONFIG_FILE, document),
        InjectedResource::new(WRAPPER_FILE, wrapper_script()),
    ];
    if config.include_readme {
        resources.push(InjectedResource::new(
            README_FILE,
            readme(
                context.original_fmu,
                context.output_fmu,
                context.fmi_version,
                context.timestamp,
            ),
        ));
    }
    Ok(resources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_default_document() {
        let doc = McpConfig::new("vendor.fmu", at()).merged(&Map::new()).unwrap();
        assert_eq!(doc["enabled"], json!(true));
        assert_eq!(doc["version"], json!("1.0.0"));
        assert_eq!(doc["server_name"], json!("fmu-mcp-wrapper"));
        assert_eq!(
            doc["capabilities"],
            json!({"tools": true, "resources": false, "prompts": false})
        );
        assert_eq!(doc["original_fmu"], json!("vendor.fmu"));
        assert_eq!(doc["repackaged_timestamp"], json!("2026-03-01T12:30:00.000000Z"));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let overrides = RepackageConfig::parse_overrides(
            r#"{"server_name": "ecu-bridge", "capabilities": {"tools": false}, "owner": "lab"}"#,
        )
        .unwrap();
        let doc = McpConfig::new("vendor.fmu", at()).merged(&overrides).unwrap();

        assert_eq!(doc["server_name"], json!("ecu-bridge"));
        assert_eq!(doc["capabilities"], json!({"tools": false}));
        assert_eq!(doc["owner"], json!("lab"));
        assert_eq!(doc["version"], json!("1.0.0"));
    }

    #[test]
    fn test_render_is_pretty_json() {
        let text = McpConfig::new("a.fmu", at()).render(&Map::new()).unwrap();
        assert!(text.contains("\n  \"enabled\": true"));
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert!(parsed.is_object());
    }

    #[test]
    fn test_wrapper_script_is_self_describing() {
        let script = wrapper_script();
        assert!(script.contains("def get_status"));
        assert!(script.contains("def list_tools"));
        assert!(script.contains(CONFIG_FILE));
    }

    #[test]
    fn test_resource_set() {
        let context = ResourceContext {
            original_fmu: "vendor.fmu",
            output_fmu: "vendor_mcp.fmu",
            fmi_version: "2.0",
            timestamp: at(),
        };

        let all = wrapper_resources(&RepackageConfig::default(), &context).unwrap();
        let names: Vec<_> = all.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec![CONFIG_FILE, WRAPPER_FILE, README_FILE]);

        let readme = String::from_utf8(all[2].content.clone()).unwrap();
        assert!(readme.contains("Original FMU: vendor.fmu"));
        assert!(readme.contains("Repackaged: 2026-03-01 12:30:00 UTC"));
        assert!(readme.contains("FMI Version: 2.0"));

        let without = wrapper_resources(&RepackageConfig::new().include_readme(false), &context)
            .unwrap();
        assert_eq!(without.len(), 2);
    }
}
