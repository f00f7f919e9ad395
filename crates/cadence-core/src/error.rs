// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for the configuration boundary.

use std::fmt::Display;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised at the configuration boundary.
///
/// Invalid values are rejected here, before they can reach the scheduler's
/// interval math. Nothing in the per-frame path ever produces one of these.
#[derive(Debug)]
pub enum ConfigError {
    /// The target frame rate was zero; the frame interval would be
    /// undefined.
    InvalidTargetRate(u32),
    /// The sleep granularity was zero; the timer loop would busy-spin.
    InvalidSleepGranularity(u64),
    /// The configuration file could not be read.
    Io(std::io::Error),
    /// The configuration text was not valid JSON for the expected shape.
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidTargetRate(fps) => {
                write!(f, "invalid target frame rate: {fps} fps")
            }
            ConfigError::InvalidSleepGranularity(ms) => {
                write!(f, "invalid sleep granularity: {ms} ms")
            }
            ConfigError::Io(err) => write!(f, "failed to read configuration: {err}"),
            ConfigError::Parse(err) => write!(f, "failed to parse configuration: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}
