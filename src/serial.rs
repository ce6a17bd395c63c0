//! Binary cache format for built rule sets.
//!
//! Building a [`RuleSet`](crate::RuleSet) from DSL text means parsing and
//! walking the whole source. A cached rule set skips both: the AST is stored
//! as a 32-byte fixed header followed by a bincode-encoded payload.
//!
//! ## Wire Format
//!
//! ```text
//! Offset  Size  Field
//! 0       4     Magic bytes: b"RFRG"
//! 4       2     Format version (u16, little-endian)
//! 6       2     Engine version (u16, little-endian)
//! 8       4     Flags (u32, reserved)
//! 12      4     Payload length in bytes (u32, little-endian)
//! 16      16    BLAKE3 hash of the payload (truncated to 16 bytes)
//! 32..    var   Bincode-encoded payload
//! ```
//!
//! ## Versioning
//!
//! The format version in the header must match exactly. If it does not,
//! deserialization fails immediately with [`DeserializeError::IncompatibleVersion`].
//! The engine version is informational only.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{RuleEntry, RuleSet};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAGIC: &[u8; 4] = b"RFRG";
const FORMAT_VERSION: u16 = 1;
const ENGINE_VERSION: u16 = 1;
const HEADER_SIZE: usize = 32;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when serializing a [`RuleSet`](crate::RuleSet) to bytes.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to encode ruleset: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("payload of {0} bytes exceeds the 4 GiB format limit")]
    TooLarge(usize),

    #[error("I/O error during serialization: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when deserializing a [`RuleSet`](crate::RuleSet) from bytes.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("not a ruleforge cache: invalid magic bytes")]
    BadMagic,

    #[error("incompatible format version: blob is v{blob}, engine supports v{supported}")]
    IncompatibleVersion { blob: u16, supported: u16 },

    #[error("integrity check failed: BLAKE3 checksum mismatch")]
    ChecksumMismatch,

    #[error("payload length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u32, actual: usize },

    #[error("failed to decode payload: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("I/O error during deserialization: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct RuleSetMetadata {
    rule_count: usize,
    source_digest: Option<[u8; 32]>,
}

/// Borrowing twin of [`Payload`], encoded without cloning the rules.
#[derive(Serialize)]
struct PayloadRef<'a> {
    metadata: RuleSetMetadata,
    rules: Vec<&'a RuleEntry>,
}

#[derive(Deserialize)]
struct Payload {
    metadata: RuleSetMetadata,
    rules: Vec<RuleEntry>,
}

fn digest(source_text: &str) -> [u8; 32] {
    *blake3::hash(source_text.as_bytes()).as_bytes()
}

fn into_ruleset(payload: Payload) -> Result<RuleSet, DeserializeError> {
    if payload.metadata.rule_count != payload.rules.len() {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} rules but payload has {}",
            payload.metadata.rule_count,
            payload.rules.len()
        )));
    }

    let mut ruleset = RuleSet::default();
    for rule in payload.rules {
        if rule.name.is_empty() {
            return Err(DeserializeError::Validation("rule with an empty name".to_owned()));
        }
        if rule.then.assignments.expressions.is_empty() {
            return Err(DeserializeError::Validation(format!(
                "rule '{}' has no actions",
                rule.name
            )));
        }
        if let Err(rejected) = ruleset.insert(rule) {
            return Err(DeserializeError::Validation(format!(
                "duplicate rule name '{}'",
                rejected.name
            )));
        }
    }
    Ok(ruleset)
}

// ---------------------------------------------------------------------------
// Header I/O
// ---------------------------------------------------------------------------

fn write_header(buf: &mut Vec<u8>, payload: &[u8]) -> Result<(), SerializeError> {
    let payload_len =
        u32::try_from(payload.len()).map_err(|_| SerializeError::TooLarge(payload.len()))?;
    let hash = blake3::hash(payload);

    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&ENGINE_VERSION.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // flags (reserved)
    buf.extend_from_slice(&payload_len.to_le_bytes());
    buf.extend_from_slice(&hash.as_bytes()[..16]);
    Ok(())
}

#[allow(clippy::cast_possible_truncation)] // HEADER_SIZE is 32, always fits in u32
fn read_header(bytes: &[u8]) -> Result<(u16, u32, [u8; 16]), DeserializeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(DeserializeError::LengthMismatch {
            expected: HEADER_SIZE as u32,
            actual: bytes.len(),
        });
    }

    if &bytes[0..4] != MAGIC {
        return Err(DeserializeError::BadMagic);
    }

    let format_version = u16::from_le_bytes([bytes[4], bytes[5]]);
    // bytes[6..8] is engine_version, bytes[8..12] is flags
    let payload_len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);

    let mut hash = [0u8; 16];
    hash.copy_from_slice(&bytes[16..32]);

    Ok((format_version, payload_len, hash))
}

fn read_payload(bytes: &[u8]) -> Result<Payload, DeserializeError> {
    let (format_version, payload_len, stored_hash) = read_header(bytes)?;

    if format_version != FORMAT_VERSION {
        return Err(DeserializeError::IncompatibleVersion {
            blob: format_version,
            supported: FORMAT_VERSION,
        });
    }

    let payload_end = HEADER_SIZE + payload_len as usize;
    if bytes.len() != payload_end {
        return Err(DeserializeError::LengthMismatch {
            expected: payload_len,
            actual: bytes.len() - HEADER_SIZE,
        });
    }
    let payload = &bytes[HEADER_SIZE..payload_end];

    if blake3::hash(payload).as_bytes()[..16] != stored_hash {
        return Err(DeserializeError::ChecksumMismatch);
    }

    let (payload, _): (Payload, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())?;
    Ok(payload)
}

// ---------------------------------------------------------------------------
// Public encode/decode
// ---------------------------------------------------------------------------

pub(crate) fn encode(
    ruleset: &RuleSet,
    source_text: Option<&str>,
) -> Result<Vec<u8>, SerializeError> {
    let payload = PayloadRef {
        metadata: RuleSetMetadata {
            rule_count: ruleset.len(),
            source_digest: source_text.map(digest),
        },
        rules: ruleset.iter().collect(),
    };
    let payload = bincode::serde::encode_to_vec(&payload, bincode::config::standard())?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    write_header(&mut buf, &payload)?;
    buf.extend_from_slice(&payload);
    Ok(buf)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<RuleSet, DeserializeError> {
    into_ruleset(read_payload(bytes)?)
}

/// Decode a cache only if it was written from exactly `source_text`.
pub(crate) fn decode_if_current(
    bytes: &[u8],
    source_text: &str,
) -> Result<Option<RuleSet>, DeserializeError> {
    let payload = read_payload(bytes)?;
    if payload.metadata.source_digest != Some(digest(source_text)) {
        return Ok(None);
    }
    into_ruleset(payload).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
        rule "Adult" "" salience 2 when user.Age >= 18 && user.Name != null then user.Adult = true; end
        rule "Log" "" when user.Adult then Log("adult: " + user.Name); Retract(); end
    "#;

    fn ruleset() -> RuleSet {
        RuleSet::from_dsl(SOURCE).unwrap()
    }

    #[test]
    fn header_layout() {
        let bytes = encode(&ruleset(), None).unwrap();
        assert_eq!(&bytes[..4], MAGIC);
        assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), FORMAT_VERSION);
        let len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]) as usize;
        assert_eq!(bytes.len(), HEADER_SIZE + len);
    }

    #[test]
    fn decode_restores_rules_in_order() {
        let rs = ruleset();
        let decoded = decode(&encode(&rs, None).unwrap()).unwrap();
        assert_eq!(decoded, rs);
        assert_eq!(decoded.names(), vec!["Adult", "Log"]);
    }

    #[test]
    fn rejects_bad_magic_and_version() {
        let mut bytes = encode(&ruleset(), None).unwrap();
        bytes[0] = b'X';
        assert!(matches!(decode(&bytes), Err(DeserializeError::BadMagic)));

        let mut bytes = encode(&ruleset(), None).unwrap();
        bytes[4] = 9;
        assert!(matches!(
            decode(&bytes),
            Err(DeserializeError::IncompatibleVersion { blob: 9, .. })
        ));
    }

    #[test]
    fn rejects_corruption_and_truncation() {
        let mut bytes = encode(&ruleset(), None).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        assert!(matches!(decode(&bytes), Err(DeserializeError::ChecksumMismatch)));

        let bytes = encode(&ruleset(), None).unwrap();
        assert!(matches!(
            decode(&bytes[..bytes.len() - 1]),
            Err(DeserializeError::LengthMismatch { .. })
        ));
        assert!(matches!(
            decode(&bytes[..10]),
            Err(DeserializeError::LengthMismatch { expected: 32, actual: 10 })
        ));
    }

    #[test]
    fn validation_rejects_duplicate_names() {
        let rs = ruleset();
        let adult = rs.get("Adult").unwrap();
        let payload = PayloadRef {
            metadata: RuleSetMetadata {
                rule_count: 2,
                source_digest: None,
            },
            rules: vec![adult, adult],
        };
        let payload = bincode::serde::encode_to_vec(&payload, bincode::config::standard()).unwrap();
        let mut bytes = Vec::new();
        write_header(&mut bytes, &payload).unwrap();
        bytes.extend_from_slice(&payload);
        let err = decode(&bytes).unwrap_err();
        assert!(err.to_string().contains("duplicate rule name 'Adult'"));
    }

    #[test]
    fn validation_rejects_rules_without_actions() {
        let mut empty = ruleset().get("Adult").unwrap().clone();
        empty.then = crate::types::ThenScope::default();
        let payload = PayloadRef {
            metadata: RuleSetMetadata {
                rule_count: 1,
                source_digest: None,
            },
            rules: vec![&empty],
        };
        let payload = bincode::serde::encode_to_vec(&payload, bincode::config::standard()).unwrap();
        let mut bytes = Vec::new();
        write_header(&mut bytes, &payload).unwrap();
        bytes.extend_from_slice(&payload);
        let err = decode(&bytes).unwrap_err();
        assert!(err.to_string().contains("rule 'Adult' has no actions"));
    }

    #[test]
    fn source_digest_detects_stale_caches() {
        let bytes = encode(&ruleset(), Some(SOURCE)).unwrap();
        assert!(decode_if_current(&bytes, SOURCE).unwrap().is_some());
        assert!(decode_if_current(&bytes, "rule changed").unwrap().is_none());

        let undigested = encode(&ruleset(), None).unwrap();
        assert!(decode_if_current(&undigested, SOURCE).unwrap().is_none());
    }
}
