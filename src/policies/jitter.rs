//! # Jitter policy for retry sleeps.
//!
//! [`JitterPolicy`] adds randomness to retry sleeps so that many writers throttled
//! by the store at the same moment do not come back in lockstep.
//!
//! - [`JitterPolicy::None`]: no randomization, predictable delays
//! - [`JitterPolicy::Full`]: random delay in [0, delay]
//! - [`JitterPolicy::Equal`]: delay/2 + random[0, delay/2]

use rand::Rng;
use std::{fmt, str::FromStr, time::Duration};

/// Policy controlling randomization of retry sleeps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// Use the exact delay.
    #[default]
    None,
    /// Random delay in [0, delay].
    Full,
    /// delay/2 + random[0, delay/2]; keeps ~75% of the delay on average.
    Equal,
}

impl JitterPolicy {
    /// Applies jitter to the given delay.
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Full => full_jitter(delay),
            JitterPolicy::Equal => equal_jitter(delay),
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            JitterPolicy::None => "none",
            JitterPolicy::Full => "full",
            JitterPolicy::Equal => "equal",
        }
    }
}

impl fmt::Display for JitterPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Parses `none`, `full` or `equal` (case-insensitive).
impl FromStr for JitterPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(JitterPolicy::None),
            "full" => Ok(JitterPolicy::Full),
            "equal" => Ok(JitterPolicy::Equal),
            other => Err(format!("unknown jitter policy `{other}` (none, full, equal)")),
        }
    }
}

fn full_jitter(delay: Duration) -> Duration {
    let ms = delay.as_millis() as u64;
    if ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..=ms))
}

fn equal_jitter(delay: Duration) -> Duration {
    let ms = delay.as_millis() as u64;
    if ms == 0 {
        return Duration::ZERO;
    }
    let half = ms / 2;
    let jitter = if half == 0 {
        0
    } else {
        rand::rng().random_range(0..=half)
    };
    Duration::from_millis(half + jitter)
}
