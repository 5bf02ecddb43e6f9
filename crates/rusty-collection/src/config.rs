// File: src/config.rs
// Purpose: Configuration parsing from collection.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::collection::Mode;

/// Library configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub collection: CollectionConfig,

    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Collection construction defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CollectionConfig {
    /// Unknown-key policy used by `Collection::with_config`
    #[serde(default)]
    pub mode: Mode,
}

/// Validator and built-in rule settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Domains rejected by `noPublicDomain`
    #[serde(default = "default_public_domains")]
    pub public_domains: Vec<String>,

    /// Domains always rejected by `blockedDomains`
    #[serde(default)]
    pub blocked_domains: Vec<String>,

    /// Log failing field names after each failed pass
    #[serde(default = "default_true")]
    pub log_failures: bool,

    #[serde(default)]
    pub required: RequiredPolicy,
}

/// How `required` treats an explicitly assigned empty string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyString {
    /// `""` satisfies `required`
    Present,
    /// `""` fails `required`
    Absent,
}

/// Empty-string policy per rule source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredPolicy {
    #[serde(default = "default_present")]
    pub table: EmptyString,

    #[serde(default = "default_present")]
    pub inline: EmptyString,

    #[serde(default = "default_absent")]
    pub reflected: EmptyString,
}

// Default values
fn default_public_domains() -> Vec<String> {
    rusty_collection_validation::PUBLIC_DOMAINS
        .iter()
        .map(|d| d.to_string())
        .collect()
}

fn default_true() -> bool {
    true
}

fn default_present() -> EmptyString {
    EmptyString::Present
}

fn default_absent() -> EmptyString {
    EmptyString::Absent
}

// Default implementations
impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            public_domains: default_public_domains(),
            blocked_domains: Vec::new(),
            log_failures: true,
            required: RequiredPolicy::default(),
        }
    }
}

impl Default for RequiredPolicy {
    fn default() -> Self {
        Self {
            table: default_present(),
            inline: default_present(),
            reflected: default_absent(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // If file doesn't exist or is empty, return default config
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Load configuration from default path (./collection.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("collection.toml")
    }
}
