//! Signed-record wire format
//!
//! Every consent field except the stop list travels as a compact signed
//! binary record:
//!
//! ```text
//! version:u8 | kind:u8 | domain_len:u8 | domain | minutes:u32 LE
//!   | payload_len:u16 LE | payload | signature[64]
//! ```
//!
//! `minutes` counts whole minutes since [`timestamp_epoch`]. The signature
//! covers every byte before it. Producing the signature is the job of a
//! `SignerEffects` handler; this module only lays out and parses bytes.

use crate::fields::{Email, FieldKind, FieldPayload, Identifier, Preferences, Salt, SecondaryId};
use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Current wire version
pub const WIRE_VERSION: u8 = 1;

/// Length of an Ed25519 signature
pub const SIGNATURE_LENGTH: usize = 64;

/// Failure to lay out or parse a signed record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// Fewer bytes than the header or declared lengths require
    #[error("record truncated")]
    Truncated,
    /// Bytes left over after the signature
    #[error("{0} trailing bytes after signature")]
    TrailingBytes(usize),
    /// Unsupported version byte
    #[error("unsupported version {0}")]
    UnsupportedVersion(u8),
    /// Kind byte does not match the expected field
    #[error("expected {expected:?} record, found tag {found}")]
    KindMismatch {
        /// Kind the caller asked for
        expected: FieldKind,
        /// Tag byte present in the record
        found: u8,
    },
    /// Domain was empty, too long or not UTF-8
    #[error("invalid domain: {0}")]
    InvalidDomain(String),
    /// Timestamp outside the representable range
    #[error("timestamp out of range")]
    TimestampRange,
    /// Payload bytes were rejected by the field type
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    /// Payload too large to encode
    #[error("payload too large ({0} bytes)")]
    PayloadTooLarge(usize),
}

impl WireError {
    /// Create an invalid payload error
    pub fn payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload(message.into())
    }
}

/// Zero point of record timestamps: 2020-01-01T00:00:00Z.
pub fn timestamp_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Truncate a timestamp to the precision the wire format keeps.
pub fn truncate_to_minute(at: DateTime<Utc>) -> DateTime<Utc> {
    at.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at)
}

fn encode_minutes(at: DateTime<Utc>) -> Result<u32, WireError> {
    let minutes = (at - timestamp_epoch()).num_minutes();
    u32::try_from(minutes).map_err(|_| WireError::TimestampRange)
}

fn decode_minutes(minutes: u32) -> DateTime<Utc> {
    timestamp_epoch() + Duration::minutes(i64::from(minutes))
}

/// Signature and provenance attached to a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedRecord {
    /// Domain of the operator that created and signed the record.
    ///
    /// The signing domain and the creator domain are always the same: an
    /// operator only creates records under the domain it holds the key for,
    /// so one field carries both.
    pub domain: String,
    /// When the record was signed, minute precision
    pub timestamp: DateTime<Utc>,
    /// Signature over the record header and payload
    pub signature: Vec<u8>,
}

/// A typed payload together with its signed record.
#[derive(Debug, Clone, PartialEq)]
pub struct Signed<T: FieldPayload> {
    /// The field payload
    pub payload: T,
    /// Signature and provenance
    pub record: SignedRecord,
}

impl<T: FieldPayload> Signed<T> {
    /// The bytes a signer must sign for this payload, domain and time.
    ///
    /// `timestamp` is truncated to the minute.
    pub fn signing_message(
        payload: &T,
        domain: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Vec<u8>, WireError> {
        let domain_bytes = domain.as_bytes();
        if domain_bytes.is_empty() || domain_bytes.len() > usize::from(u8::MAX) {
            return Err(WireError::InvalidDomain(domain.to_string()));
        }
        let body = payload.encode_payload()?;
        let body_len =
            u16::try_from(body.len()).map_err(|_| WireError::PayloadTooLarge(body.len()))?;
        let minutes = encode_minutes(truncate_to_minute(timestamp))?;

        let mut out = Vec::with_capacity(9 + domain_bytes.len() + body.len() + SIGNATURE_LENGTH);
        out.push(WIRE_VERSION);
        out.push(T::KIND.tag());
        out.push(domain_bytes.len() as u8);
        out.extend_from_slice(domain_bytes);
        out.extend_from_slice(&minutes.to_le_bytes());
        out.extend_from_slice(&body_len.to_le_bytes());
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Assemble a signed field from a signature produced over
    /// [`Signed::signing_message`].
    pub fn from_parts(
        payload: T,
        domain: impl Into<String>,
        timestamp: DateTime<Utc>,
        signature: Vec<u8>,
    ) -> Self {
        Self {
            payload,
            record: SignedRecord {
                domain: domain.into(),
                timestamp: truncate_to_minute(timestamp),
                signature,
            },
        }
    }

    /// Bytes covered by this field's signature.
    pub fn message(&self) -> Result<Vec<u8>, WireError> {
        Self::signing_message(&self.payload, &self.record.domain, self.record.timestamp)
    }

    /// Full wire encoding, signature included.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        let mut out = self.message()?;
        out.extend_from_slice(&self.record.signature);
        Ok(out)
    }

    /// Parse the wire encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        let mut reader = Reader::new(bytes);
        let version = reader.u8()?;
        if version != WIRE_VERSION {
            return Err(WireError::UnsupportedVersion(version));
        }
        let tag = reader.u8()?;
        if tag != T::KIND.tag() {
            return Err(WireError::KindMismatch {
                expected: T::KIND,
                found: tag,
            });
        }
        let domain_len = usize::from(reader.u8()?);
        if domain_len == 0 {
            return Err(WireError::InvalidDomain(String::new()));
        }
        let domain = std::str::from_utf8(reader.take(domain_len)?)
            .map_err(|_| WireError::InvalidDomain("not utf-8".to_string()))?
            .to_string();
        let minutes = u32::from_le_bytes(reader.array::<4>()?);
        let payload_len = usize::from(u16::from_le_bytes(reader.array::<2>()?));
        let payload = T::decode_payload(reader.take(payload_len)?)?;
        let signature = reader.take(SIGNATURE_LENGTH)?.to_vec();
        if reader.remaining() > 0 {
            return Err(WireError::TrailingBytes(reader.remaining()));
        }
        Ok(Self {
            payload,
            record: SignedRecord {
                domain,
                timestamp: decode_minutes(minutes),
                signature,
            },
        })
    }

    /// Wire encoding as URL-safe unpadded base64.
    pub fn to_base64(&self) -> Result<String, WireError> {
        Ok(crate::encode_base64(&self.to_bytes()?))
    }
}

/// Signing time of an encoded record of any kind, read from the header
/// without decoding the payload.
pub fn header_timestamp(bytes: &[u8]) -> Result<DateTime<Utc>, WireError> {
    let mut reader = Reader::new(bytes);
    let version = reader.u8()?;
    if version != WIRE_VERSION {
        return Err(WireError::UnsupportedVersion(version));
    }
    reader.u8()?;
    let domain_len = usize::from(reader.u8()?);
    reader.take(domain_len)?;
    Ok(decode_minutes(u32::from_le_bytes(reader.array::<4>()?)))
}

struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        if self.bytes.len() < len {
            return Err(WireError::Truncated);
        }
        let (head, tail) = self.bytes.split_at(len);
        self.bytes = tail;
        Ok(head)
    }

    fn u8(&mut self) -> Result<u8, WireError> {
        Ok(self.take(1)?[0])
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn remaining(&self) -> usize {
        self.bytes.len()
    }
}

/// A signed consent field of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum SignedField {
    /// Random resettable identifier
    Identifier(Signed<Identifier>),
    /// Advertising preferences
    Preferences(Signed<Preferences>),
    /// Email address
    Email(Signed<Email>),
    /// Salt
    Salt(Signed<Salt>),
    /// Derived secondary identifier
    SecondaryIdentifier(Signed<SecondaryId>),
}

impl SignedField {
    /// Parse the wire encoding of a field of the given kind.
    pub fn from_bytes(kind: FieldKind, bytes: &[u8]) -> Result<Self, WireError> {
        Ok(match kind {
            FieldKind::Identifier => Self::Identifier(Signed::from_bytes(bytes)?),
            FieldKind::Preferences => Self::Preferences(Signed::from_bytes(bytes)?),
            FieldKind::Email => Self::Email(Signed::from_bytes(bytes)?),
            FieldKind::Salt => Self::Salt(Signed::from_bytes(bytes)?),
            FieldKind::SecondaryIdentifier => {
                Self::SecondaryIdentifier(Signed::from_bytes(bytes)?)
            }
        })
    }

    /// Kind of this field
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Identifier(_) => FieldKind::Identifier,
            Self::Preferences(_) => FieldKind::Preferences,
            Self::Email(_) => FieldKind::Email,
            Self::Salt(_) => FieldKind::Salt,
            Self::SecondaryIdentifier(_) => FieldKind::SecondaryIdentifier,
        }
    }

    /// Signature and provenance of this field
    pub fn record(&self) -> &SignedRecord {
        match self {
            Self::Identifier(f) => &f.record,
            Self::Preferences(f) => &f.record,
            Self::Email(f) => &f.record,
            Self::Salt(f) => &f.record,
            Self::SecondaryIdentifier(f) => &f.record,
        }
    }

    /// Bytes covered by this field's signature.
    pub fn message(&self) -> Result<Vec<u8>, WireError> {
        match self {
            Self::Identifier(f) => f.message(),
            Self::Preferences(f) => f.message(),
            Self::Email(f) => f.message(),
            Self::Salt(f) => f.message(),
            Self::SecondaryIdentifier(f) => f.message(),
        }
    }

    /// Full wire encoding, signature included.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        match self {
            Self::Identifier(f) => f.to_bytes(),
            Self::Preferences(f) => f.to_bytes(),
            Self::Email(f) => f.to_bytes(),
            Self::Salt(f) => f.to_bytes(),
            Self::SecondaryIdentifier(f) => f.to_bytes(),
        }
    }
}
