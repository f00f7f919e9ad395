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

//! Scheduler configuration.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_target_frame_rate() -> u32 {
    // 1000 / 71 truncates to a 14ms frame interval.
    71
}

fn default_sleep_granularity_ms() -> u64 {
    // Windows timer resolution is coarser than elsewhere.
    if cfg!(windows) {
        10
    } else {
        7
    }
}

/// Configuration for a frame scheduler.
///
/// All fields have sensible defaults; a `SchedulerConfig::default()` paces
/// at roughly 71 frames per second with a platform-appropriate sleep
/// quantum and no debug diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Target frames per second. The frame interval is `1000 / rate`
    /// milliseconds; must be nonzero.
    #[serde(default = "default_target_frame_rate")]
    pub target_frame_rate: u32,
    /// Length of the timer thread's sleep quantum in milliseconds. This
    /// bounds wake-up jitter independently of the frame interval; must be
    /// nonzero or the timer loop would busy-spin.
    #[serde(default = "default_sleep_granularity_ms")]
    pub sleep_granularity_ms: u64,
    /// Enables long-delay diagnostics: gaps over 100ms between ticks are
    /// reported, and individual participants that hold a tick too long are
    /// named in the log.
    #[serde(default)]
    pub hang_debug: bool,
    /// Enables microsecond-level timing capture and the per-phase entries
    /// in the periodic rate report.
    #[serde(default)]
    pub perf_debug: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            target_frame_rate: default_target_frame_rate(),
            sleep_granularity_ms: default_sleep_granularity_ms(),
            hang_debug: false,
            perf_debug: false,
        }
    }
}

impl SchedulerConfig {
    /// Checks the configuration for values that would corrupt interval
    /// math, rejecting them before they reach the scheduler.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.target_frame_rate == 0 {
            return Err(ConfigError::InvalidTargetRate(self.target_frame_rate));
        }
        if self.sleep_granularity_ms == 0 {
            return Err(ConfigError::InvalidSleepGranularity(
                self.sleep_granularity_ms,
            ));
        }
        Ok(())
    }

    /// The target frame interval in microseconds.
    pub fn interval_micros(&self) -> u64 {
        interval_micros_for(self.target_frame_rate)
    }

    /// Loads a configuration from a JSON string.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Saves the configuration to a JSON file.
    pub fn to_file(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Computes the frame interval in microseconds for a target rate.
///
/// Shared with the scheduler's `set_target_rate`, which revalidates the
/// rate before calling this.
pub fn interval_micros_for(fps: u32) -> u64 {
    1_000_000 / fps as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SchedulerConfig::default();
        config.validate().expect("defaults must validate");
        assert_eq!(config.target_frame_rate, 71);
        assert!(!config.hang_debug);
        assert!(!config.perf_debug);
    }

    #[test]
    fn default_interval_is_roughly_fourteen_millis() {
        let config = SchedulerConfig::default();
        let interval = config.interval_micros();
        assert!((14_000..14_200).contains(&interval), "interval {interval}us");
    }

    #[test]
    fn zero_target_rate_is_rejected() {
        let config = SchedulerConfig {
            target_frame_rate: 0,
            ..Default::default()
        };
        match config.validate() {
            Err(ConfigError::InvalidTargetRate(0)) => {}
            other => panic!("expected InvalidTargetRate, got {other:?}"),
        }
    }

    #[test]
    fn zero_granularity_is_rejected() {
        let config = SchedulerConfig {
            sleep_granularity_ms: 0,
            ..Default::default()
        };
        match config.validate() {
            Err(ConfigError::InvalidSleepGranularity(0)) => {}
            other => panic!("expected InvalidSleepGranularity, got {other:?}"),
        }
    }

    #[test]
    fn json_round_trip_preserves_fields() {
        let config = SchedulerConfig {
            target_frame_rate: 50,
            sleep_granularity_ms: 5,
            hang_debug: true,
            perf_debug: true,
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed = SchedulerConfig::from_json(&json).unwrap();
        assert_eq!(parsed.target_frame_rate, 50);
        assert_eq!(parsed.sleep_granularity_ms, 5);
        assert!(parsed.hang_debug);
        assert!(parsed.perf_debug);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let parsed = SchedulerConfig::from_json(r#"{"target_frame_rate": 30}"#).unwrap();
        assert_eq!(parsed.target_frame_rate, 30);
        assert_eq!(
            parsed.sleep_granularity_ms,
            SchedulerConfig::default().sleep_granularity_ms
        );
    }

    #[test]
    fn invalid_json_values_are_rejected_on_load() {
        let err = SchedulerConfig::from_json(r#"{"target_frame_rate": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTargetRate(0)));
    }

    #[test]
    fn garbage_json_is_a_parse_error() {
        let err = SchedulerConfig::from_json("not json at all").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
