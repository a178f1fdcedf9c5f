// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Converter configuration

use crate::geometry::FragmentSettings;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file looked up by [`ConverterConfig::load`]
pub const CONFIG_FILE: &str = "polyframe-csg.toml";

/// What to do with an invocation whose name is not a known construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownConstructPolicy {
    /// Fail the conversion
    #[default]
    Error,
    /// Produce empty geometry and log a warning
    Ignore,
    /// Treat the call as a group of its children
    Group,
}

impl std::str::FromStr for UnknownConstructPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "ignore" => Ok(Self::Ignore),
            "group" => Ok(Self::Group),
            other => bail!("Unknown construct policy '{}' (expected error, ignore or group)", other),
        }
    }
}

/// Converter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Maximum recursion depth of the AST walk
    pub max_depth: usize,
    pub unknown_constructs: UnknownConstructPolicy,
    /// `$fn` used when neither the call nor the scope sets one
    pub default_fn: f64,
    pub default_fa: f64,
    pub default_fs: f64,
    /// Upper bound on segments for circular primitives
    pub max_fragments: u32,
    /// Memoize subtree results
    pub cache: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            max_depth: 256,
            unknown_constructs: UnknownConstructPolicy::Error,
            default_fn: 0.0,
            default_fa: 12.0,
            default_fs: 2.0,
            max_fragments: 360,
            cache: true,
        }
    }
}

impl ConverterConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: ConverterConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(depth) = std::env::var("POLYFRAME_MAX_DEPTH") {
            self.max_depth = depth
                .parse()
                .with_context(|| format!("Invalid POLYFRAME_MAX_DEPTH: {}", depth))?;
        }

        if let Ok(policy) = std::env::var("POLYFRAME_UNKNOWN_CONSTRUCTS") {
            self.unknown_constructs = policy.parse()?;
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Fragment settings before scope or call overrides
    pub fn fragment_settings(&self) -> FragmentSettings {
        FragmentSettings {
            fn_: self.default_fn,
            fa: self.default_fa,
            fs: self.default_fs,
            max_fragments: self.max_fragments,
        }
    }

    /// Stable text form used when fingerprinting cached results
    pub(crate) fn fingerprint(&self) -> String {
        format!(
            "{}|{:?}|{}|{}|{}|{}",
            self.max_depth,
            self.unknown_constructs,
            self.default_fn,
            self.default_fa,
            self.default_fs,
            self.max_fragments
        )
    }
}
