//! Identifier types.
//!
//! Member identifiers come from the eligibility system and are opaque
//! strings; estimate identifiers are generated here as UUIDs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest member identifier accepted.
pub const MAX_MEMBER_ID_LEN: usize = 128;

/// A member identifier.
///
/// Non-empty, at most [`MAX_MEMBER_ID_LEN`] bytes, limited to ASCII
/// alphanumerics and `-`, `_`, `.` so it can be used directly as a storage key
/// and path segment.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemberId(String);

impl MemberId {
    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for MemberId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        if s.len() > MAX_MEMBER_ID_LEN {
            return Err(IdError::TooLong(s.len()));
        }
        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(IdError::InvalidCharacter(c));
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Debug for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberId({})", self.0)
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for MemberId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MemberId> for String {
    fn from(id: MemberId) -> Self {
        id.0
    }
}

impl AsRef<[u8]> for MemberId {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// Identifier of one estimate response.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EstimateId(uuid::Uuid);

impl EstimateId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Return the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl FromStr for EstimateId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = uuid::Uuid::parse_str(s).map_err(|_| IdError::InvalidUuid)?;
        Ok(Self(uuid))
    }
}

impl fmt::Debug for EstimateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EstimateId({})", self.0)
    }
}

impl fmt::Display for EstimateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for EstimateId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EstimateId> for String {
    fn from(id: EstimateId) -> Self {
        id.0.to_string()
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input is empty.
    #[error("identifier must not be empty")]
    Empty,

    /// The input exceeds [`MAX_MEMBER_ID_LEN`].
    #[error("identifier too long: {0} bytes")]
    TooLong(usize),

    /// The input contains a character outside the allowed set.
    #[error("invalid character in identifier: {0:?}")]
    InvalidCharacter(char),

    /// The input is not a valid UUID.
    #[error("invalid UUID format")]
    InvalidUuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_id_accepts_typical_ids() {
        assert!("M-10023".parse::<MemberId>().is_ok());
        assert!("member_7.a".parse::<MemberId>().is_ok());
    }

    #[test]
    fn member_id_rejects_bad_input() {
        assert_eq!("".parse::<MemberId>(), Err(IdError::Empty));
        assert_eq!("a/b".parse::<MemberId>(), Err(IdError::InvalidCharacter('/')));
        assert_eq!(
            "x".repeat(MAX_MEMBER_ID_LEN + 1).parse::<MemberId>(),
            Err(IdError::TooLong(MAX_MEMBER_ID_LEN + 1))
        );
    }

    #[test]
    fn member_id_serde_json() {
        let id: MemberId = serde_json::from_str("\"M-1\"").unwrap();
        assert_eq!(id.as_str(), "M-1");
        assert!(serde_json::from_str::<MemberId>("\"\"").is_err());
    }

    #[test]
    fn estimate_id_roundtrip() {
        let id = EstimateId::generate();
        let parsed = EstimateId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }
}
