use serde::{Deserialize, Serialize};

use crate::error::{ConfigIssue, Result, SheetPackerError};

/// Packing policy for the single output canvas.
/// Key notes:
///   - `smart` grows the canvas from the smallest feasible size instead of using the maxima as-is
///   - `pot` and `square` shape the canvas; they also shrink the effective maxima when needed
///   - `spacing` is reserved to the right of and below every frame
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PackerConfig {
    /// Maximum canvas width in pixels.
    pub max_width: u32,
    /// Maximum canvas height in pixels.
    pub max_height: u32,
    /// Start small and grow the canvas until every frame fits.
    pub smart: bool,
    /// Canvas dimensions are powers of two.
    pub pot: bool,
    /// Canvas width equals height.
    pub square: bool,
    /// Pixels between frames.
    pub spacing: u32,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            max_width: 1024,
            max_height: 1024,
            smart: true,
            pot: true,
            square: true,
            spacing: 1,
        }
    }
}

impl PackerConfig {
    /// Create a fluent builder for `PackerConfig`.
    pub fn builder() -> PackerConfigBuilder {
        PackerConfigBuilder::new()
    }

    /// Largest canvas the shape policy allows within `max_width x max_height`.
    pub fn effective_max(&self) -> (u32, u32) {
        let (mut w, mut h) = (self.max_width, self.max_height);
        if self.pot {
            w = prev_pow2(w);
            h = prev_pow2(h);
        }
        if self.square {
            let m = w.min(h);
            w = m;
            h = m;
        }
        (w, h)
    }

    pub(crate) fn collect_issues(&self, issues: &mut Vec<ConfigIssue>) {
        if self.max_width == 0 {
            issues.push(ConfigIssue {
                option: "max_width",
                value: self.max_width.to_string(),
                expected: "positive integer",
            });
        }
        if self.max_height == 0 {
            issues.push(ConfigIssue {
                option: "max_height",
                value: self.max_height.to_string(),
                expected: "positive integer",
            });
        }
        if self.spacing == 0 {
            issues.push(ConfigIssue {
                option: "spacing",
                value: self.spacing.to_string(),
                expected: "positive integer",
            });
        }
    }

    /// Validates the packing options, reporting every rejected option at once.
    pub fn validate(&self) -> Result<()> {
        let mut issues = Vec::new();
        self.collect_issues(&mut issues);
        if issues.is_empty() {
            Ok(())
        } else {
            Err(SheetPackerError::InvalidConfig(issues))
        }
    }
}

/// Options for a whole atlas run: naming, manifest formatting, logging and packing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AtlasConfig {
    /// Output base name; files become `<file_name>.png` / `<file_name>.json`.
    pub file_name: String,
    /// Indent the manifest.
    pub prettify: bool,
    /// Report progress; a no-op sink is used when false.
    pub log: bool,
    pub pack: PackerConfig,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            file_name: "atlas".into(),
            prettify: false,
            log: true,
            pack: PackerConfig::default(),
        }
    }
}

impl AtlasConfig {
    /// Validates all options. Returns `InvalidConfig` listing every problem found.
    pub fn validate(&self) -> Result<()> {
        let mut issues = Vec::new();
        if self.file_name.is_empty() {
            issues.push(ConfigIssue {
                option: "file_name",
                value: self.file_name.clone(),
                expected: "non-empty string",
            });
        } else if self.file_name.contains(['/', '\\']) {
            issues.push(ConfigIssue {
                option: "file_name",
                value: self.file_name.clone(),
                expected: "file name without path separators",
            });
        }
        self.pack.collect_issues(&mut issues);
        if issues.is_empty() {
            Ok(())
        } else {
            Err(SheetPackerError::InvalidConfig(issues))
        }
    }

    /// Name of the image file referenced from the manifest.
    pub fn image_name(&self) -> String {
        format!("{}.png", self.file_name)
    }

    pub fn manifest_name(&self) -> String {
        format!("{}.json", self.file_name)
    }
}

pub(crate) fn next_pow2(v: u32) -> u32 {
    if v <= 1 { 1 } else { v.next_power_of_two() }
}

pub(crate) fn prev_pow2(v: u32) -> u32 {
    if v == 0 { 0 } else { 1 << (31 - v.leading_zeros()) }
}

/// Builder for `PackerConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct PackerConfigBuilder {
    cfg: PackerConfig,
}

impl PackerConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: PackerConfig::default(),
        }
    }
    pub fn with_max_dimensions(mut self, w: u32, h: u32) -> Self {
        self.cfg.max_width = w;
        self.cfg.max_height = h;
        self
    }
    pub fn smart(mut self, v: bool) -> Self {
        self.cfg.smart = v;
        self
    }
    pub fn pot(mut self, v: bool) -> Self {
        self.cfg.pot = v;
        self
    }
    pub fn square(mut self, v: bool) -> Self {
        self.cfg.square = v;
        self
    }
    pub fn spacing(mut self, v: u32) -> Self {
        self.cfg.spacing = v;
        self
    }
    pub fn build(self) -> PackerConfig {
        self.cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pow2_helpers() {
        assert_eq!(next_pow2(0), 1);
        assert_eq!(next_pow2(33), 64);
        assert_eq!(next_pow2(64), 64);
        assert_eq!(prev_pow2(1000), 512);
        assert_eq!(prev_pow2(1024), 1024);
    }

    #[test]
    fn effective_max_applies_shape() {
        let cfg = PackerConfig::builder()
            .with_max_dimensions(1000, 300)
            .pot(true)
            .square(false)
            .build();
        assert_eq!(cfg.effective_max(), (512, 256));
        let cfg = PackerConfig::builder()
            .with_max_dimensions(1000, 300)
            .pot(false)
            .square(true)
            .build();
        assert_eq!(cfg.effective_max(), (300, 300));
    }
}
