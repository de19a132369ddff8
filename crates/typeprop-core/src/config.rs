//! Pass configuration

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Switches for the rewrites the transform performs. The analysis always
/// runs in full; the options only decide which of its facts are applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagatorOptions {
    /// Splice constants in place of expressions proven constant
    pub fold_constants: bool,
    /// Turn branches with one reachable side into jumps
    pub eliminate_branches: bool,
    /// Replace dynamic operator calls with builtin operators
    pub specialize_operators: bool,
    /// Drop casts that always succeed, mark failing ones unreachable
    pub eliminate_type_casts: bool,
    /// Lower `is int` checks on numbers to floor checks
    pub specialize_type_tests: bool,
    /// Log the graph before and after the pass at trace level
    pub trace_graphs: bool,
}

impl Default for PropagatorOptions {
    fn default() -> Self {
        Self {
            fold_constants: true,
            eliminate_branches: true,
            specialize_operators: true,
            eliminate_type_casts: true,
            specialize_type_tests: true,
            trace_graphs: false,
        }
    }
}

impl PropagatorOptions {
    /// Options with every rewrite disabled; the pass then only analyzes
    pub fn analysis_only() -> Self {
        Self {
            fold_constants: false,
            eliminate_branches: false,
            specialize_operators: false,
            eliminate_type_casts: false,
            specialize_type_tests: false,
            trace_graphs: false,
        }
    }

    /// Load options from a `.json` or `.toml` file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read options from {}", path.display()))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("toml") => Self::from_toml_str(&content),
            other => bail!("unsupported options format: {:?}", other.unwrap_or("")),
        }
    }

    /// Parses options from a JSON document
    pub fn from_json_str(content: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(content)?;
        Ok(options)
    }

    /// Parses options from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let options: Self = toml::from_str(content)?;
        Ok(options)
    }
}
