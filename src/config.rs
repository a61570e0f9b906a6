// Engine configuration: failure policy and drawing frame

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::scale::PixelSpan;

/// How the engine treats values it cannot interpret.
///
/// `FailSoft` keeps rendering: unparseable or missing numbers become 0, a
/// zero-total pie and a zero-based trend report undefined percentages, and a
/// diagnostic is recorded for each. `FailFast` returns the matching error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    #[default]
    FailSoft,
    FailFast,
}

impl FailurePolicy {
    pub fn is_strict(self) -> bool {
        matches!(self, FailurePolicy::FailFast)
    }
}

/// Margins around the plot area, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Insets {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Default for Insets {
    fn default() -> Self {
        Insets {
            left: 48.0,
            right: 16.0,
            top: 32.0,
            bottom: 32.0,
        }
    }
}

/// Output surface plus the margins reserved for titles and axis labels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub insets: Insets,
}

impl Default for Frame {
    fn default() -> Self {
        Frame {
            width: 480,
            height: 300,
            insets: Insets::default(),
        }
    }
}

impl Frame {
    pub fn plot_width(&self) -> f64 {
        self.width as f64 - self.insets.left - self.insets.right
    }

    pub fn plot_height(&self) -> f64 {
        self.height as f64 - self.insets.top - self.insets.bottom
    }

    /// Pixel span of the plot area along the x axis
    pub fn horizontal_span(&self) -> PixelSpan {
        PixelSpan::new(self.insets.left, self.plot_width())
    }

    /// Pixel span of the plot area along the y axis
    pub fn vertical_span(&self) -> PixelSpan {
        PixelSpan::new(self.insets.top, self.plot_height())
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.insets.left + self.plot_width() / 2.0,
            self.insets.top + self.plot_height() / 2.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub failure_policy: FailurePolicy,
    pub frame: Frame,
}

impl EngineConfig {
    /// Load a TOML config file; absent keys keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::from_toml(&text)
            .with_context(|| format!("Failed to load config file '{}'", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(text).context("Failed to parse TOML config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.frame.plot_width() <= 0.0 || self.frame.plot_height() <= 0.0 {
            return Err(anyhow!(
                "Frame {}x{} leaves no plot area after insets",
                self.frame.width,
                self.frame.height
            ));
        }
        Ok(())
    }
}
