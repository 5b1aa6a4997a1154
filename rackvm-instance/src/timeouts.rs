//! Per-operation timeout budgets.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Budget applied to any operation without a configured timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Upper bound on how long each lifecycle operation may block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutBudget {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for TimeoutBudget {
    fn default() -> Self {
        Self {
            create: DEFAULT_TIMEOUT,
            read: DEFAULT_TIMEOUT,
            update: DEFAULT_TIMEOUT,
            delete: DEFAULT_TIMEOUT,
        }
    }
}

/// The declared `timeouts` block.
///
/// Update has no entry: it never reaches the control plane, so there is
/// nothing to bound. An `update` key is rejected when parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeoutsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<String>,
}

impl TimeoutsConfig {
    /// Resolve the declared durations, falling back to [`DEFAULT_TIMEOUT`].
    pub fn budget(&self) -> Result<TimeoutBudget, DurationError> {
        let resolve = |field: &'static str, value: &Option<String>| match value {
            Some(text) => parse_duration(text).map_err(|e| e.in_field(field)),
            None => Ok(DEFAULT_TIMEOUT),
        };

        Ok(TimeoutBudget {
            create: resolve("create", &self.create)?,
            read: resolve("read", &self.read)?,
            update: DEFAULT_TIMEOUT,
            delete: resolve("delete", &self.delete)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("invalid duration {input:?}, expected e.g. 90s, 1m30s, 2h")]
    Invalid { input: String },

    #[error("duration {input:?} is too large")]
    Overflow { input: String },

    #[error("timeouts.{field}: {source}")]
    Field {
        field: &'static str,
        #[source]
        source: Box<DurationError>,
    },
}

impl DurationError {
    fn in_field(self, field: &'static str) -> Self {
        DurationError::Field {
            field,
            source: Box::new(self),
        }
    }
}

/// Parse a duration such as `90s`, `1m30s`, `250ms` or `2h`.
///
/// A bare integer is taken as seconds.
pub fn parse_duration(s: &str) -> Result<Duration, DurationError> {
    let input = s.trim();
    let invalid = || DurationError::Invalid {
        input: input.to_string(),
    };
    let overflow = || DurationError::Overflow {
        input: input.to_string(),
    };

    if input.is_empty() {
        return Err(invalid());
    }
    if let Ok(secs) = input.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = input;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return Err(invalid());
        }
        let n: u64 = rest[..digits].parse().map_err(|_| overflow())?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let part = match &rest[..unit_len] {
            "ms" => Some(Duration::from_millis(n)),
            "s" => Some(Duration::from_secs(n)),
            "m" => n.checked_mul(60).map(Duration::from_secs),
            "h" => n.checked_mul(3600).map(Duration::from_secs),
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];

        total = part
            .and_then(|p| total.checked_add(p))
            .ok_or_else(overflow)?;
    }
    Ok(total)
}
