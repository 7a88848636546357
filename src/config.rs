//! Manager configuration loading.
//!
//! A configuration wires one component kind into each capability slot. It is read
//! either from the embedded default or from a named file, placeholders are
//! resolved once, and the result is validated before any manager is built.
use crate::error::SmatchError;
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Name reported in diagnostics for the embedded configuration.
pub const DEFAULT_CONFIG_NAME: &str = "s-match.json";

const DEFAULT_CONFIG_JSON: &str = include_str!("../conf/default.json");

/// Where the manager configuration comes from for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigLocator {
    #[default]
    Default,
    Named(PathBuf),
}

impl fmt::Display for ConfigLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigLocator::Default => write!(f, "<embedded {DEFAULT_CONFIG_NAME}>"),
            ConfigLocator::Named(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Process-level `key=value` pairs used to fill `${key}` placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    values: BTreeMap<String, String>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Override first, then the process environment.
    fn resolve(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(str::to_string)
            .or_else(|| std::env::var(key).ok())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ManagerConfig {
    pub schema_version: u32,
    #[serde(default)]
    pub components: ComponentsConfig,
}

/// One optional component per capability slot.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ComponentsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_loader: Option<ComponentSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_renderer: Option<ComponentSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping_loader: Option<ComponentSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping_renderer: Option<ComponentSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preprocessor: Option<ComponentSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matcher: Option<ComponentSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<ComponentSpec>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ComponentSpec {
    pub kind: String,
    #[serde(default, skip_serializing_if = "ComponentParams::is_empty")]
    pub params: ComponentParams,
}

impl ComponentSpec {
    pub fn new(kind: impl Into<String>) -> Self {
        ComponentSpec {
            kind: kind.into(),
            params: ComponentParams::default(),
        }
    }
}

/// Free-form component parameters with typed accessors.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct ComponentParams(Map<String, Value>);

impl ComponentParams {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn string(&self, key: &str) -> Result<Option<String>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(other) => Err(anyhow!("param {key} must be a string (got {other})")),
        }
    }

    pub fn bool(&self, key: &str) -> Result<Option<bool>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(Value::Bool(value)) => Ok(Some(*value)),
            Some(other) => Err(anyhow!("param {key} must be a boolean (got {other})")),
        }
    }

    pub fn string_list(&self, key: &str) -> Result<Option<Vec<String>>> {
        let Some(value) = self.0.get(key) else {
            return Ok(None);
        };
        let items = value
            .as_array()
            .ok_or_else(|| anyhow!("param {key} must be an array of strings"))?;
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| anyhow!("param {key} must be an array of strings"))
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    /// Reject keys a component does not understand.
    pub fn expect_only(&self, allowed: &[&str]) -> Result<()> {
        for key in self.0.keys() {
            if !allowed.contains(&key.as_str()) {
                return Err(anyhow!(
                    "unknown param {key:?} (expected one of: {})",
                    allowed.join(", ")
                ));
            }
        }
        Ok(())
    }
}

/// Read, interpolate, and validate the configuration named by `locator`.
pub fn load_config(
    locator: &ConfigLocator,
    overrides: &Overrides,
) -> Result<ManagerConfig, SmatchError> {
    read_config(locator, overrides).map_err(|err| SmatchError::configuration(locator, err))
}

fn read_config(locator: &ConfigLocator, overrides: &Overrides) -> Result<ManagerConfig> {
    let text = match locator {
        ConfigLocator::Default => {
            tracing::info!(config = DEFAULT_CONFIG_NAME, "using embedded default config");
            DEFAULT_CONFIG_JSON.to_string()
        }
        ConfigLocator::Named(path) => {
            tracing::info!(path = %path.display(), "using config file");
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?
        }
    };
    parse_config(&text, overrides)
}

/// Parse config text, substituting placeholders inside string values only.
pub fn parse_config(text: &str, overrides: &Overrides) -> Result<ManagerConfig> {
    let mut raw: Value = serde_json::from_str(text).context("parse config JSON")?;
    interpolate(&mut raw, overrides)?;
    let config: ManagerConfig = serde_json::from_value(raw).context("decode config")?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &ManagerConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {} (expected {CONFIG_SCHEMA_VERSION})",
            config.schema_version
        ));
    }
    Ok(())
}

/// `${key}` placeholder inside a JSON string.
static PLACEHOLDER: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]*)\}"));

fn interpolate(value: &mut Value, overrides: &Overrides) -> Result<()> {
    let pattern = PLACEHOLDER
        .as_ref()
        .map_err(|err| anyhow!("compile placeholder pattern: {err}"))?;
    interpolate_with(value, overrides, pattern)
}

fn interpolate_with(value: &mut Value, overrides: &Overrides, pattern: &Regex) -> Result<()> {
    match value {
        Value::String(text) => {
            if pattern.is_match(text) {
                *text = substitute(text, overrides, pattern)?;
            }
        }
        Value::Array(items) => {
            for item in items {
                interpolate_with(item, overrides, pattern)?;
            }
        }
        Value::Object(entries) => {
            for item in entries.values_mut() {
                interpolate_with(item, overrides, pattern)?;
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
    Ok(())
}

fn substitute(text: &str, overrides: &Overrides, pattern: &Regex) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for captures in pattern.captures_iter(text) {
        let (Some(whole), Some(key)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let key = key.as_str().trim();
        if key.is_empty() {
            return Err(anyhow!("empty placeholder in {text:?}"));
        }
        let value = overrides
            .resolve(key)
            .ok_or_else(|| anyhow!("unresolved placeholder ${{{key}}} (pass -D{key}=<value>)"))?;
        out.push_str(&text[last..whole.start()]);
        out.push_str(&value);
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
