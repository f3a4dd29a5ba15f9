//! Unix timestamp utilities for permit deadlines.
//!
//! A permit is only consumable by the token contract while `block.timestamp <= deadline`.
//! [`UnixTimestamp`] is the type that carries that deadline from configuration, through the
//! signed EIP-712 message, into the `depositWithPermit` call.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::ops::Add;
use std::str::FromStr;
use std::time::SystemTime;

/// A Unix timestamp representing seconds since the Unix epoch (1970-01-01T00:00:00Z).
///
/// # Serialization
///
/// Serialized as a stringified integer to avoid loss of precision in JSON, since
/// JavaScript's `Number` type cannot safely represent all 64-bit integers.
///
/// ```json
/// "1699999999"
/// ```
///
/// # Example
///
/// ```
/// use bank_permit_types::timestamp::UnixTimestamp;
///
/// let now = UnixTimestamp::now();
/// let deadline = now + 1200;
/// assert_eq!(deadline.as_secs() - now.as_secs(), 1200);
///
/// let parsed: UnixTimestamp = "1699999999".parse().unwrap();
/// assert_eq!(parsed.as_secs(), 1699999999);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub struct UnixTimestamp(u64);

impl Serialize for UnixTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for UnixTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Display for UnixTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<u64> for UnixTimestamp {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        UnixTimestamp(self.0.saturating_add(rhs))
    }
}

/// Error returned when a string is not a valid unix timestamp.
#[derive(Debug, thiserror::Error)]
#[error("timestamp must be a non-negative integer number of seconds, got {0:?}")]
pub struct UnixTimestampParseError(String);

impl FromStr for UnixTimestamp {
    type Err = UnixTimestampParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(UnixTimestamp)
            .map_err(|_| UnixTimestampParseError(s.to_string()))
    }
}

impl UnixTimestamp {
    /// Creates a new [`UnixTimestamp`] from a raw seconds value.
    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Returns the current system time as a [`UnixTimestamp`].
    ///
    /// # Panics
    ///
    /// Panics if the system clock is set to a time before the Unix epoch,
    /// which should never happen on properly configured systems.
    pub fn now() -> Self {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .expect("SystemTime before UNIX epoch?!?")
            .as_secs();
        Self(now)
    }

    /// Returns the timestamp as raw seconds since the Unix epoch.
    pub fn as_secs(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_negative_and_garbage() {
        assert!("-5".parse::<UnixTimestamp>().is_err());
        assert!("tomorrow".parse::<UnixTimestamp>().is_err());
        assert!("".parse::<UnixTimestamp>().is_err());
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let ts: UnixTimestamp = " 1700000000 ".parse().unwrap();
        assert_eq!(ts, UnixTimestamp::from_secs(1_700_000_000));
    }

    #[test]
    fn test_serde_as_string() {
        let ts = UnixTimestamp::from_secs(1_700_000_000);
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"1700000000\"");
        let back: UnixTimestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn test_add_saturates() {
        let ts = UnixTimestamp::from_secs(u64::MAX - 1);
        assert_eq!((ts + 10).as_secs(), u64::MAX);
    }
}
