//! Configuration file support for phpsort
//!
//! Loads `.phpsort.toml` from current directory or parent directories.

use anyhow::{Context, Result};
use phpsort_core::SortConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = ".phpsort.toml";

/// Configuration file structure
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sort: SortSection,
    pub paths: PathsConfig,
    pub output: OutputConfig,
}

/// `[sort]`: unset keys keep the engine defaults
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SortSection {
    pub sort_properties: Option<bool>,
    pub sort_traits: Option<bool>,
    pub sort_namespace_uses: Option<bool>,
    pub sort_constants: Option<bool>,
    pub remove_unused_imports: Option<bool>,
    pub add_newline_between_const_and_properties: Option<bool>,
    pub add_visibility_spacing: Option<bool>,
    /// "public", "protected" or "private"
    pub default_visibility: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Glob patterns to exclude from processing
    pub exclude: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "text", "json" or "diff"
    pub format: Option<String>,
}

impl Config {
    /// Load config from `.phpsort.toml` searching from current directory upward
    pub fn load() -> Result<Option<(Config, PathBuf)>> {
        Self::load_from(std::env::current_dir()?)
    }

    /// Load config searching from the given directory upward
    pub fn load_from(start_dir: PathBuf) -> Result<Option<(Config, PathBuf)>> {
        let mut current = Some(start_dir.as_path());

        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                let config = Self::load_path(&config_path)?;
                return Ok(Some((config, config_path)));
            }
            current = dir.parent();
        }

        Ok(None)
    }

    /// Load config from a specific path
    pub fn load_path(path: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Engine configuration with the `[sort]` overrides applied
    pub fn sort_config(&self) -> Result<SortConfig> {
        let section = &self.sort;
        let defaults = SortConfig::default();
        let config = SortConfig {
            sort_properties: section.sort_properties.unwrap_or(defaults.sort_properties),
            sort_traits: section.sort_traits.unwrap_or(defaults.sort_traits),
            sort_namespace_uses: section.sort_namespace_uses.unwrap_or(defaults.sort_namespace_uses),
            sort_constants: section.sort_constants.unwrap_or(defaults.sort_constants),
            remove_unused_imports: section
                .remove_unused_imports
                .unwrap_or(defaults.remove_unused_imports),
            add_newline_between_const_and_properties: section
                .add_newline_between_const_and_properties
                .unwrap_or(defaults.add_newline_between_const_and_properties),
            add_visibility_spacing: section
                .add_visibility_spacing
                .unwrap_or(defaults.add_visibility_spacing),
            default_visibility: defaults.default_visibility,
        };

        match &section.default_visibility {
            Some(visibility) => config
                .with_default_visibility(visibility)
                .context("Invalid [sort] default_visibility"),
            None => Ok(config),
        }
    }

    /// Check if a path should be excluded based on config patterns
    pub fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        for pattern in &self.paths.exclude {
            if let Ok(glob_pattern) = glob::Pattern::new(pattern) {
                if glob_pattern.matches(&path_str) {
                    return true;
                }
                if let Some(file_name) = path.file_name() {
                    if glob_pattern.matches(&file_name.to_string_lossy()) {
                        return true;
                    }
                }
            }

            // directory patterns match any path component
            if pattern.ends_with('/') {
                let dir_pattern = pattern.trim_end_matches('/');
                if path_str.contains(&format!("/{}/", dir_pattern))
                    || path_str.starts_with(&format!("{}/", dir_pattern))
                {
                    return true;
                }
            }
        }

        false
    }
}
