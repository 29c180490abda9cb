use crate::config::EngineConfig;
use crate::error::{SchemaError, SchemaResult};
use regex::Regex;

/// Caller options for turning a schema instance into JSON.
#[derive(Debug, Clone, Default)]
pub struct ProjectionOptions {
    /// Include items flagged sensitive.
    pub verbose: bool,
    /// Inline referenced documents in place of their ids.
    pub expand_foreign_keys: bool,
    /// How many levels of references may be inlined. Must be set whenever
    /// `expand_foreign_keys` is.
    pub expand_max_depth: Option<u32>,
    /// Item names matching any of these patterns are never inlined.
    pub expand_schema_blacklist: Vec<Regex>,
}

impl ProjectionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Enables expansion up to `max_depth` levels.
    pub fn expand(mut self, max_depth: u32) -> Self {
        self.expand_foreign_keys = true;
        self.expand_max_depth = Some(max_depth);
        self
    }

    /// Expansion with the configured default depth.
    pub fn expanded_default(config: &EngineConfig) -> Self {
        Self::new().expand(config.default_expand_max_depth)
    }

    pub fn blacklist(mut self, patterns: &[&str]) -> SchemaResult<Self> {
        for pattern in patterns {
            let regex = Regex::new(pattern).map_err(|e| {
                SchemaError::InvalidData(format!("Invalid blacklist pattern '{}': {}", pattern, e))
            })?;
            self.expand_schema_blacklist.push(regex);
        }
        Ok(self)
    }

    /// Depth limit for an expanding projection.
    pub fn require_max_depth(&self) -> SchemaResult<u32> {
        self.expand_max_depth.ok_or_else(|| {
            SchemaError::InvalidData(
                "expand_max_depth must be set when expanding foreign keys".to_string(),
            )
        })
    }

    pub fn is_blacklisted(&self, name: &str) -> bool {
        self.expand_schema_blacklist.iter().any(|r| r.is_match(name))
    }
}
