//! Pipeline configuration
//!
//! One [`PipelineConfig`] value describes all three stages. It deserializes
//! from TOML; every field has a default, so an empty document is a valid
//! configuration, while unknown keys are rejected.
//!
//! ```toml
//! [locator]
//! selectors = ["main", "article", ".main", "#main", ".content", "#content"]
//!
//! [sanitizer]
//! strip_styles = true
//! mark_links_nofollow = true
//!
//! [markdown]
//! heading_markers = ["##", "###", "####", "#####", "######", "#######"]
//! escape_underscores = false
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::locator::{DEFAULT_SELECTORS, SelectorList};
use crate::mapping::{DEFAULT_BULLETS, DEFAULT_HEADING_MARKERS, MarkdownMapping};
use crate::policy::SanitizationPolicy;

/// Configuration for the whole pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub locator: LocatorConfig,
    pub sanitizer: SanitizationPolicy,
    pub markdown: MarkdownConfig,
}

/// Selector rules, in priority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocatorConfig {
    pub selectors: Vec<String>,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            selectors: DEFAULT_SELECTORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl LocatorConfig {
    pub fn selector_list(&self) -> Result<SelectorList, ConfigError> {
        SelectorList::from_strs(&self.selectors)
    }
}

/// Text options and heading markers for the transformer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkdownConfig {
    /// Markers for `h1`..`h6`
    pub heading_markers: [String; 6],
    pub escape_underscores: bool,
    pub escape_asterisks: bool,
    /// Bullet characters cycled by list depth
    pub bullets: String,
    pub autolinks: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            heading_markers: DEFAULT_HEADING_MARKERS.map(str::to_string),
            escape_underscores: false,
            escape_asterisks: true,
            bullets: DEFAULT_BULLETS.to_string(),
            autolinks: true,
        }
    }
}

impl MarkdownConfig {
    /// Build the transformer mapping, validating markers and bullets.
    pub fn mapping(&self) -> Result<MarkdownMapping, ConfigError> {
        if let Some(index) = self
            .heading_markers
            .iter()
            .position(|marker| marker.trim().is_empty())
        {
            return Err(ConfigError::InvalidHeadingMarker { level: index + 1 });
        }
        let bullets: Vec<char> = self.bullets.chars().filter(|c| !c.is_whitespace()).collect();
        if bullets.is_empty() {
            return Err(ConfigError::EmptyBullets);
        }

        let mut mapping =
            MarkdownMapping::default().with_heading_markers(self.heading_markers.clone());
        mapping.escape_underscores = self.escape_underscores;
        mapping.escape_asterisks = self.escape_asterisks;
        mapping.bullets = bullets;
        mapping.autolinks = self.autolinks;
        Ok(mapping)
    }
}

impl PipelineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Check that every section can be turned into its stage.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.locator.selector_list()?;
        self.markdown.mapping()?;
        Ok(())
    }
}
