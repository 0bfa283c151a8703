//! Engine configuration
//!
//! Hosts typically ship this as a TOML file next to their tree content packs;
//! the evaluation depth limit defends against pathologically composed packs
//! at registration time rather than overflowing the stack mid-cycle.

use crate::core::error::ConfigError;
use serde::Deserialize;
use std::path::Path;

/// Hard ceiling on static tree depth accepted at freeze time.
///
/// Depth counts nested nodes across subtree references and tag splices.
/// Well-formed content sits far below this; the limit exists so a bad pack
/// fails registration instead of recursing at runtime.
pub const MAX_EVAL_DEPTH: usize = 64;

/// Configuration for a decision engine instance
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Name of the always-evaluated-first tree (interrupt checks and the like)
    pub constant_tree: String,

    /// Name of the main behavior tree, overlay target for directives
    pub primary_tree: String,

    /// Static depth limit enforced when the registry freezes
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    MAX_EVAL_DEPTH
}

impl EngineConfig {
    pub fn new(constant_tree: impl Into<String>, primary_tree: impl Into<String>) -> Self {
        Self {
            constant_tree: constant_tree.into(),
            primary_tree: primary_tree.into(),
            max_depth: MAX_EVAL_DEPTH,
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}
