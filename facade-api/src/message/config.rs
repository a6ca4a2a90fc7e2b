use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfigAction {
    New,
    Update,
    Delete,
}

impl fmt::Display for ConfigAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigAction::New => write!(f, "NEW"),
            ConfigAction::Update => write!(f, "UPDATE"),
            ConfigAction::Delete => write!(f, "DELETE"),
        }
    }
}

/// Change notification emitted by the config store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEvent {
    /// Agent identity owning the config
    pub identity: String,
    /// Config name, e.g. `config` or `areas/east-office`
    pub name: String,
    /// What happened to the config
    pub action: ConfigAction,
    /// Document after the change, `null` on delete
    pub contents: Value,
}

/// Config name filter: an exact name or a `prefix/*` wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigPattern {
    Exact(String),
    Prefix(String),
}

impl ConfigPattern {
    pub fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix('*') {
            Some(prefix) => ConfigPattern::Prefix(prefix.to_string()),
            None => ConfigPattern::Exact(pattern.to_string()),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            ConfigPattern::Exact(exact) => exact == name,
            ConfigPattern::Prefix(prefix) => name.starts_with(prefix.as_str()),
        }
    }

    /// Part of the name after a wildcard prefix.
    pub fn strip<'a>(&self, name: &'a str) -> &'a str {
        match self {
            ConfigPattern::Exact(_) => name,
            ConfigPattern::Prefix(prefix) => name.strip_prefix(prefix.as_str()).unwrap_or(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns() {
        let singleton = ConfigPattern::parse("config");
        let areas = ConfigPattern::parse("areas/*");

        assert!(singleton.matches("config"));
        assert!(!singleton.matches("config/extra"));
        assert!(areas.matches("areas/east"));
        assert!(!areas.matches("servers/east"));
        assert_eq!(areas.strip("areas/east"), "east");
        assert_eq!(singleton.strip("config"), "config");
    }

    #[test]
    fn test_action_wire_names() {
        assert_eq!(serde_json::to_string(&ConfigAction::Update).unwrap(), "\"UPDATE\"");
        assert_eq!(ConfigAction::Delete.to_string(), "DELETE");
    }
}
