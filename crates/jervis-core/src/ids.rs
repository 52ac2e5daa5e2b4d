//! Opaque 12-byte identifiers, sortable by birth time
//!
//! Every persisted entity gets one of these: a 4-byte big-endian unix
//! timestamp followed by 8 random bytes. Lexicographic byte order therefore
//! matches creation order, which is what the data model's "lexicographically
//! sortable by birth time" requirement asks for, without needing a central
//! counter.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngCore;
use serde::{Deserialize, Serialize};

/// A 12-byte opaque, time-sortable identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(#[serde(with = "hex_bytes")] [u8; 12]);

impl ObjectId {
    /// Generate a new id stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&(secs as u32).to_be_bytes());
        rand::thread_rng().fill_bytes(&mut bytes[4..]);
        Self(bytes)
    }

    /// Render as a lowercase hex string (the "hex string id" the notification
    /// bus requires for cross-process compatibility).
    #[must_use]
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(24);
        for b in self.0 {
            out.push_str(&format!("{b:02x}"));
        }
        out
    }

    /// Parse a hex string produced by [`Self::to_hex`].
    pub fn from_hex(s: &str) -> Result<Self, InvalidObjectId> {
        if s.len() != 24 {
            return Err(InvalidObjectId);
        }
        let mut bytes = [0u8; 12];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|_| InvalidObjectId)?;
        }
        Ok(Self(bytes))
    }

    /// The creation timestamp, seconds since the Unix epoch.
    #[must_use]
    pub fn created_at_secs(&self) -> u32 {
        u32::from_be_bytes(self.0[..4].try_into().expect("4 bytes"))
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Returned by [`ObjectId::from_hex`] on malformed input.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("invalid object id")]
pub struct InvalidObjectId;

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 12], serializer: S) -> Result<S::Ok, S::Error> {
        super::ObjectId(*bytes).to_hex().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 12], D::Error> {
        let s = String::deserialize(deserializer)?;
        super::ObjectId::from_hex(&s)
            .map(|id| id.0)
            .map_err(serde::de::Error::custom)
    }
}

/// Declares a newtype wrapper around [`ObjectId`] for a specific entity kind.
macro_rules! id_type {
    ($name:ident) => {
        #[doc = concat!("Opaque identifier for a [`", stringify!($name), "`].")]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub ObjectId);

        impl $name {
            /// Generate a new, freshly-stamped id.
            #[must_use]
            pub fn new() -> Self {
                Self(ObjectId::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0.to_hex())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

id_type!(ClientId);
id_type!(ProjectId);
id_type!(ConnectionId);
id_type!(PlanId);
id_type!(StepId);
id_type!(ContextId);
id_type!(TaskId);
id_type!(DialogId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trips() {
        let id = ObjectId::new();
        let hex = id.to_hex();
        assert_eq!(hex.len(), 24);
        assert_eq!(ObjectId::from_hex(&hex).unwrap(), id);
    }

    #[test]
    fn ids_generated_in_sequence_sort_non_decreasing() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert!(a <= b);
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(ObjectId::from_hex("not-hex").is_err());
        assert!(ObjectId::from_hex("00").is_err());
    }

    #[test]
    fn typed_ids_serialize_as_hex_strings() {
        let id = PlanId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.0.to_hex()));
        let back: PlanId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
