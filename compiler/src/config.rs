//! `hxmacro.toml` parsing.
//!
//! ```toml
//! [macro]
//! max-depth = 64
//!
//! [defines]
//! debug = true        # defined with value "1"
//! target = "js"
//! release = false     # not defined
//!
//! [log]
//! level = "debug"
//! ```
//!
//! Every section is optional.

use crate::logging;
use crate::macro_system::context::{CompilationContext, DEFAULT_MAX_DEPTH};
use log::LevelFilter;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(rename = "macro")]
    macro_section: Option<MacroSection>,
    defines: Option<BTreeMap<String, toml::Value>>,
    log: Option<LogSection>,
}

/// `[macro]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct MacroSection {
    /// Maximum nesting of macro invocations
    max_depth: Option<usize>,
}

/// `[log]` section.
#[derive(Debug, Clone, Deserialize)]
struct LogSection {
    level: Option<String>,
}

/// Resolved configuration with defaults filled in
#[derive(Debug, Clone, PartialEq)]
pub struct MacroConfig {
    pub max_depth: usize,
    pub defines: BTreeMap<String, String>,
    pub log_level: LevelFilter,
}

impl Default for MacroConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            defines: BTreeMap::new(),
            log_level: LevelFilter::Warn,
        }
    }
}

impl MacroConfig {
    /// Copy depth limit and defines into `ctx`. Existing defines with the same
    /// name are overwritten.
    pub fn apply(&self, ctx: &mut CompilationContext) {
        ctx.set_max_depth(self.max_depth);
        for (name, value) in &self.defines {
            ctx.define(name.clone(), value.clone());
        }
    }
}

/// Haxe `-D name=value` semantics: `true` is "1", `false` leaves the flag unset
fn define_value(name: &str, value: toml::Value) -> Result<Option<String>, String> {
    match value {
        toml::Value::Boolean(true) => Ok(Some("1".to_string())),
        toml::Value::Boolean(false) => Ok(None),
        toml::Value::String(s) => Ok(Some(s)),
        toml::Value::Integer(i) => Ok(Some(i.to_string())),
        toml::Value::Float(f) => Ok(Some(f.to_string())),
        other => Err(format!(
            "define '{}' must be a boolean, string or number, found {}",
            name,
            other.type_str()
        )),
    }
}

/// Parse an `hxmacro.toml` string.
pub fn parse_config(content: &str) -> Result<MacroConfig, String> {
    let raw: RawConfig =
        toml::from_str(content).map_err(|e| format!("Failed to parse hxmacro.toml: {}", e))?;

    let mut config = MacroConfig::default();

    if let Some(max_depth) = raw.macro_section.and_then(|m| m.max_depth) {
        if max_depth == 0 {
            return Err("[macro] max-depth must be at least 1".to_string());
        }
        config.max_depth = max_depth;
    }

    for (name, value) in raw.defines.unwrap_or_default() {
        if let Some(value) = define_value(&name, value)? {
            config.defines.insert(name, value);
        }
    }

    if let Some(level) = raw.log.and_then(|l| l.level) {
        config.log_level = logging::parse_level(&level)?;
    }

    Ok(config)
}

pub fn load_config(path: &Path) -> Result<MacroConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    log::debug!("loading macro configuration from {}", path.display());
    parse_config(&content)
}
