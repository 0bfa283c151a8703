use crate::core::types::{AgentId, AnchorTag};
use thiserror::Error;

/// Load-time registration failures. Fatal to the offending batch: the batch
/// is rejected wholesale and the registry keeps its last valid state.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("duplicate tree definition name: {0}")]
    DuplicateName(String),

    #[error("subtree reference to unknown definition: {0}")]
    DanglingRef(String),

    #[error("cycle through subtree references: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("tree '{tree}' exceeds maximum evaluation depth {max}")]
    TooDeep { tree: String, max: usize },

    #[error("random node in tree '{0}' has no children")]
    EmptyRandom(String),

    #[error("random node in tree '{tree}' has invalid weight {weight}")]
    InvalidWeight { tree: String, weight: f32 },

    #[error("config names unknown tree: {0}")]
    UnknownTree(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Directive assignment failures. The agent's prior directive is preserved
/// unchanged whenever one of these is returned.
#[derive(Error, Debug)]
pub enum DirectiveError {
    #[error("unknown tree definition: {0}")]
    UnknownTree(String),

    #[error("primary tree has no anchor point '{}'", anchor.0)]
    UnknownAnchor { anchor: AnchorTag },

    #[error("unknown agent: {0:?}")]
    UnknownAgent(AgentId),
}

/// Failure inside an external generator capability. Downgraded to a null
/// result at the owning node; never aborts the decision cycle.
#[derive(Error, Debug)]
#[error("generator failed: {0}")]
pub struct GeneratorError(pub String);

impl From<&str> for GeneratorError {
    fn from(msg: &str) -> Self {
        Self(msg.to_string())
    }
}

impl From<String> for GeneratorError {
    fn from(msg: String) -> Self {
        Self(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_error_formats_path() {
        let err = ConfigError::Cycle {
            path: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "cycle through subtree references: a -> b -> a"
        );
    }

    #[test]
    fn test_unknown_anchor_message() {
        let err = DirectiveError::UnknownAnchor {
            anchor: AnchorTag::from("haul_slot"),
        };
        assert!(err.to_string().contains("haul_slot"));
    }
}
