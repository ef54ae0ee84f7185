// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration support for the log parser.

use crate::errors::ConfigParseError;
use camino::Utf8Path;
use config::{Config, ConfigBuilder, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::num::NonZeroUsize;

/// Overall configuration for a demux run.
///
/// The built-in defaults live in `default-config.toml`. A user-provided TOML file is layered on
/// top of them, so it only needs to mention the settings it changes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParserConfig {
    suite_name: String,
    channel_capacity: NonZeroUsize,
    untagged_lines: UntaggedLines,
}

impl ParserConfig {
    /// Contains the default config as a TOML file.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the config from the given file, layered over the default config.
    ///
    /// If no file is specified, uses the default config.
    pub fn from_sources(config_file: Option<&Utf8Path>) -> Result<Self, ConfigParseError> {
        let Some(config_file) = config_file else {
            return Ok(Self::default_config());
        };

        let builder = Self::make_default_config()
            .add_source(File::new(config_file.as_str(), FileFormat::Toml));
        let inner: ParserConfigImpl = builder
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|err| ConfigParseError::new(config_file, err))?;

        Ok(inner.into())
    }

    /// Returns the default config.
    pub fn default_config() -> Self {
        let inner: ParserConfigImpl = Self::make_default_config()
            .build()
            .expect("default config is always valid")
            .try_deserialize()
            .expect("default config is always valid");
        inner.into()
    }

    /// Overrides the suite name, typically from the command line.
    pub fn set_suite_name(&mut self, suite_name: impl Into<String>) -> &mut Self {
        self.suite_name = suite_name.into();
        self
    }

    /// Overrides the per-writer channel capacity.
    pub fn set_channel_capacity(&mut self, channel_capacity: NonZeroUsize) -> &mut Self {
        self.channel_capacity = channel_capacity;
        self
    }

    /// Overrides where untagged lines are written.
    pub fn set_untagged_lines(&mut self, untagged_lines: UntaggedLines) -> &mut Self {
        self.untagged_lines = untagged_lines;
        self
    }

    /// Returns the suite name used when the input doesn't name a package.
    pub fn suite_name(&self) -> &str {
        &self.suite_name
    }

    /// Returns the number of lines that can be buffered per writer.
    pub fn channel_capacity(&self) -> NonZeroUsize {
        self.channel_capacity
    }

    /// Returns where untagged lines are written.
    pub fn untagged_lines(&self) -> UntaggedLines {
        self.untagged_lines
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

/// Where lines that don't name a test are written.
#[derive(Copy, Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum UntaggedLines {
    /// Write them to the catch-all `_raw.log`.
    #[default]
    Raw,

    /// Write them to the most recently named test if it's still running, otherwise to `_raw.log`.
    ///
    /// This matches how `go test -v` prints `t.Log` continuation lines underneath the line that
    /// named the test.
    LastTest,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ParserConfigImpl {
    parser: ParserSectionImpl,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ParserSectionImpl {
    suite_name: String,
    channel_capacity: NonZeroUsize,
    untagged_lines: UntaggedLines,
}

impl From<ParserConfigImpl> for ParserConfig {
    fn from(inner: ParserConfigImpl) -> Self {
        let ParserSectionImpl {
            suite_name,
            channel_capacity,
            untagged_lines,
        } = inner.parser;
        Self {
            suite_name,
            channel_capacity,
            untagged_lines,
        }
    }
}
