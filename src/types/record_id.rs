//! Store-assigned record identifiers.
//!
//! Identifiers are 12 bytes rendered as 24 lowercase hex characters:
//! a 4-byte big-endian unix timestamp, 5 random bytes and a 3-byte counter.
//! The random bytes are drawn per id, so a counter wrap within one second
//! cannot repeat an id.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::{CourierError, Result};

const ID_BYTES: usize = 12;
const ID_HEX_LEN: usize = ID_BYTES * 2;

/// Opaque primary key assigned by a [`DocumentStore`](crate::store::DocumentStore).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or_default();
        let entropy: [u8; 5] = rand::random();
        let count = COUNTER.fetch_add(1, Ordering::Relaxed);

        let mut bytes = [0u8; ID_BYTES];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&entropy);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);

        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RecordId {
    type Err = CourierError;

    fn from_str(s: &str) -> Result<Self> {
        let well_formed = s.len() == ID_HEX_LEN
            && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if well_formed {
            Ok(Self(s.to_string()))
        } else {
            Err(CourierError::MalformedId(s.to_string()))
        }
    }
}

impl TryFrom<String> for RecordId {
    type Error = CourierError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
