use crate::error::SettlementError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MAX_ID_LEN: usize = 64;

/// Opaque identifier shared by events, students, registrations and users.
///
/// Ids are validated once when they cross the boundary (CLI arguments, CSV
/// rows, stored records) and are passed around typed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    pub fn parse(raw: &str) -> Result<Self, SettlementError> {
        let raw = raw.trim();
        if raw.is_empty() || raw.len() > MAX_ID_LEN {
            return Err(SettlementError::ValidationError(format!(
                "Identifier must be 1-{} characters: {:?}",
                MAX_ID_LEN, raw
            )));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(SettlementError::ValidationError(format!(
                "Identifier contains invalid characters: {:?}",
                raw
            )));
        }
        Ok(Self(raw.to_string()))
    }

    /// Generates a fresh 24 character lowercase hex id.
    pub fn generate() -> Self {
        let bytes: [u8; 12] = rand::thread_rng().r#gen();
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The trailing `n` characters of the id (the whole id when shorter).
    pub fn tail(&self, n: usize) -> &str {
        // ids are ASCII, so byte offsets are char offsets
        let start = self.0.len().saturating_sub(n);
        &self.0[start..]
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RecordId {
    type Err = SettlementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RecordId {
    type Error = SettlementError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}
