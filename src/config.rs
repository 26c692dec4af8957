// MIT License
//
// Copyright (c) 2024 Erik Holum
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Tunable parameters of the growth engine.
//!
//! Every field may be omitted from a TOML document and falls back to its default:
//!
//! ```toml
//! sample_step = 0.25
//! max_branch_length = 15.0
//! seed = 42
//! ```
use serde::Deserialize;
use std::path::Path;

use crate::error::RrtError;

fn default_sample_step() -> f32 {
    0.25
}

fn default_max_branch_length() -> f32 {
    15.0
}

/// Parameters fixed for the lifetime of an [`Rrt`](crate::planning::rrt::Rrt).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RrtConfig {
    /// Distance advanced along a candidate branch between two collision checks, > 0.
    #[serde(default = "default_sample_step")]
    pub sample_step: f32,

    /// Longest edge a single growth step may add, >= 1.
    #[serde(default = "default_max_branch_length")]
    pub max_branch_length: f32,

    /// Seed applied at every `prepare`. `None` seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for RrtConfig {
    fn default() -> Self {
        RrtConfig {
            sample_step: default_sample_step(),
            max_branch_length: default_max_branch_length(),
            seed: None,
        }
    }
}

impl RrtConfig {
    /// Same as the default configuration but with a fixed seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        RrtConfig {
            seed: Some(seed),
            ..Default::default()
        }
    }

    /// # Errors
    ///
    /// If the sample step is not a positive finite number, or the maximum
    /// branch length is not a finite number of at least one.
    pub fn validate(&self) -> Result<(), RrtError> {
        if !(self.sample_step.is_finite() && self.sample_step > 0.0) {
            return Err(RrtError::InvalidConfig(format!(
                "sample_step must be positive, got {}",
                self.sample_step
            )));
        }
        if !(self.max_branch_length.is_finite() && self.max_branch_length >= 1.0) {
            return Err(RrtError::InvalidConfig(format!(
                "max_branch_length must be at least 1, got {}",
                self.max_branch_length
            )));
        }
        Ok(())
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// If the document is malformed or the values are out of range.
    pub fn from_toml_str(contents: &str) -> Result<Self, RrtError> {
        let config: RrtConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration file, see [`RrtConfig::from_toml_str`].
    ///
    /// # Errors
    ///
    /// If the file cannot be read, is malformed, or holds out of range values.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RrtError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        log::debug!("Loaded RRT config from {}", path.display());
        Ok(config)
    }
}
