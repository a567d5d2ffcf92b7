//! # Runtime configuration.
//!
//! [`Config`] centralizes the retry budgets used by the data-access layer and
//! the event bus capacity.
//!
//! Config is used in two ways:
//! 1. **Services creation**: `QnaServices::builder(config)`
//! 2. **Per-operation policies**: [`Config::fixed_policy`] / [`Config::exponential_policy`]
//!    hand out a **fresh** [`RetryPolicy`] for every top-level operation.
//!
//! ## Environment
//! | Variable                      | Default |
//! |-------------------------------|---------|
//! | `QNA_RETRY_MAX_COUNT`         | 9       |
//! | `QNA_RETRY_DELAY_MS`          | 500     |
//! | `QNA_RETRY_MAX_WAIT_MS`       | 5000    |
//! | `QNA_EXP_RETRY_MAX_COUNT`     | 10      |
//! | `QNA_EXP_RETRY_BASE_DELAY_MS` | 100     |
//! | `QNA_EXP_RETRY_MAX_WAIT_MS`   | 30000   |
//! | `QNA_RETRY_JITTER`            | none    |
//! | `QNA_BUS_CAPACITY`            | 1024    |
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use qnasaga::Config;
//!
//! let cfg = Config::from_lookup(|key| match key {
//!     "QNA_RETRY_DELAY_MS" => Some("250".to_string()),
//!     _ => None,
//! })
//! .unwrap();
//!
//! assert_eq!(cfg.fixed.delay, Duration::from_millis(250));
//! assert_eq!(cfg.fixed.max_retry_count, 9);
//! ```

use std::{fmt::Display, str::FromStr, time::Duration};

use tracing::info;

use crate::error::ConfigError;
use crate::policies::{JitterPolicy, RetryPolicy, RetrySettings};

const RETRY_MAX_COUNT: &str = "QNA_RETRY_MAX_COUNT";
const RETRY_DELAY_MS: &str = "QNA_RETRY_DELAY_MS";
const RETRY_MAX_WAIT_MS: &str = "QNA_RETRY_MAX_WAIT_MS";
const EXP_RETRY_MAX_COUNT: &str = "QNA_EXP_RETRY_MAX_COUNT";
const EXP_RETRY_BASE_DELAY_MS: &str = "QNA_EXP_RETRY_BASE_DELAY_MS";
const EXP_RETRY_MAX_WAIT_MS: &str = "QNA_EXP_RETRY_MAX_WAIT_MS";
const RETRY_JITTER: &str = "QNA_RETRY_JITTER";
const BUS_CAPACITY: &str = "QNA_BUS_CAPACITY";

/// Global configuration.
///
/// ## Field semantics
/// - `fixed`: budget for throttle-only retries (inserts, reads, deletes)
/// - `exponential`: budget for throttle/conflict retries (versioned updates)
/// - `jitter`: randomization of retry sleeps, shared by both variants
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Fixed-delay retry budget.
    pub fixed: RetrySettings,
    /// Exponential retry budget (smaller base delay, larger max wait).
    pub exponential: RetrySettings,
    /// Randomization applied to every retry sleep (`none`, `full`, `equal`).
    pub jitter: JitterPolicy,
    /// Capacity of the event bus broadcast channel.
    pub bus_capacity: usize,
}

impl Config {
    /// Loads the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration from an arbitrary key lookup.
    ///
    /// Missing keys fall back to defaults; malformed values are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        Ok(Self {
            fixed: RetrySettings {
                max_retry_count: load(&lookup, RETRY_MAX_COUNT, d.fixed.max_retry_count)?,
                delay: load_ms(&lookup, RETRY_DELAY_MS, d.fixed.delay)?,
                max_wait_time: load_ms(&lookup, RETRY_MAX_WAIT_MS, d.fixed.max_wait_time)?,
            },
            exponential: RetrySettings {
                max_retry_count: load(
                    &lookup,
                    EXP_RETRY_MAX_COUNT,
                    d.exponential.max_retry_count,
                )?,
                delay: load_ms(&lookup, EXP_RETRY_BASE_DELAY_MS, d.exponential.delay)?,
                max_wait_time: load_ms(
                    &lookup,
                    EXP_RETRY_MAX_WAIT_MS,
                    d.exponential.max_wait_time,
                )?,
            },
            jitter: load(&lookup, RETRY_JITTER, d.jitter)?,
            bus_capacity: load(&lookup, BUS_CAPACITY, d.bus_capacity)?,
        })
    }

    /// Fresh fixed-delay policy for one operation.
    #[inline]
    pub fn fixed_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.fixed).with_jitter(self.jitter)
    }

    /// Fresh exponential policy for one operation.
    #[inline]
    pub fn exponential_policy(&self) -> RetryPolicy {
        RetryPolicy::exponential(self.exponential).with_jitter(self.jitter)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `fixed = 9 retries / 500ms / 5s`
    /// - `exponential = 10 retries / 100ms doubling / 30s`
    /// - `jitter = none`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            fixed: RetrySettings::fixed_default(),
            exponential: RetrySettings::exponential_default(),
            jitter: JitterPolicy::None,
            bus_capacity: 1024,
        }
    }
}

fn load<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

fn load_ms<F>(lookup: &F, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    load(lookup, key, default_ms).map(Duration::from_millis)
}
