//! Field keys and typed field payloads
//!
//! `FieldKey` is the string-keyed vocabulary shared with the storage network.
//! `FieldKind` is the closed set of signed field kinds; the key string never
//! travels further into the engine than the codec boundary.

use crate::signed::WireError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Keys used for consent data in the storage network and in responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKey {
    /// Random resettable identifier
    Rid,
    /// Advertising preferences
    Pref,
    /// Email address (raw variant only)
    Email,
    /// Salt used to hash the email (raw variant only)
    Salt,
    /// Secondary identifier derived from email and salt
    Sid,
    /// Revoked-domain list
    Stop,
    /// Aggregate validity, response only
    Val,
}

impl FieldKey {
    /// Keys read back from storage on a fetch operation.
    pub const READABLE: [FieldKey; 5] = [
        FieldKey::Rid,
        FieldKey::Pref,
        FieldKey::Email,
        FieldKey::Salt,
        FieldKey::Stop,
    ];

    /// Wire name of the key
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::Rid => "rid",
            FieldKey::Pref => "pref",
            FieldKey::Email => "email",
            FieldKey::Salt => "salt",
            FieldKey::Sid => "sid",
            FieldKey::Stop => "stop",
            FieldKey::Val => "val",
        }
    }

    /// Signed field kind stored under this key, if any.
    pub fn kind(&self) -> Option<FieldKind> {
        match self {
            FieldKey::Rid => Some(FieldKind::Identifier),
            FieldKey::Pref => Some(FieldKind::Preferences),
            FieldKey::Email => Some(FieldKind::Email),
            FieldKey::Salt => Some(FieldKind::Salt),
            FieldKey::Sid => Some(FieldKind::SecondaryIdentifier),
            FieldKey::Stop | FieldKey::Val => None,
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the fixed field keys.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field key '{0}'")]
pub struct UnknownFieldKey(pub String);

impl FromStr for FieldKey {
    type Err = UnknownFieldKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Keys are case-sensitive.
        match s {
            "rid" => Ok(FieldKey::Rid),
            "pref" => Ok(FieldKey::Pref),
            "email" => Ok(FieldKey::Email),
            "salt" => Ok(FieldKey::Salt),
            "sid" => Ok(FieldKey::Sid),
            "stop" => Ok(FieldKey::Stop),
            "val" => Ok(FieldKey::Val),
            other => Err(UnknownFieldKey(other.to_string())),
        }
    }
}

/// The five kinds of signed consent field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// Opaque random token
    Identifier,
    /// Boolean preference flags
    Preferences,
    /// Email address
    Email,
    /// Salt for hashing the email
    Salt,
    /// Hash of email and salt
    SecondaryIdentifier,
}

impl FieldKind {
    /// Tag byte written into the signed-record header
    pub fn tag(&self) -> u8 {
        match self {
            FieldKind::Identifier => 1,
            FieldKind::Preferences => 2,
            FieldKind::Email => 3,
            FieldKind::Salt => 4,
            FieldKind::SecondaryIdentifier => 5,
        }
    }

    /// Inverse of [`FieldKind::tag`]
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(FieldKind::Identifier),
            2 => Some(FieldKind::Preferences),
            3 => Some(FieldKind::Email),
            4 => Some(FieldKind::Salt),
            5 => Some(FieldKind::SecondaryIdentifier),
            _ => None,
        }
    }

    /// Storage key the field kind lives under
    pub fn key(&self) -> FieldKey {
        match self {
            FieldKind::Identifier => FieldKey::Rid,
            FieldKind::Preferences => FieldKey::Pref,
            FieldKind::Email => FieldKey::Email,
            FieldKind::Salt => FieldKey::Salt,
            FieldKind::SecondaryIdentifier => FieldKey::Sid,
        }
    }
}

/// A payload that can be carried inside a signed record.
pub trait FieldPayload: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// Kind written into the record header
    const KIND: FieldKind;

    /// Encode the payload bytes that follow the record header
    fn encode_payload(&self) -> Result<Vec<u8>, WireError>;

    /// Decode payload bytes produced by [`FieldPayload::encode_payload`]
    fn decode_payload(bytes: &[u8]) -> Result<Self, WireError>;
}

/// Identifier type written for browser identifiers minted by the operator.
pub const BROWSER_ID_TYPE: &str = "paf_browser_id";

/// Random resettable identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    /// Identifier type, e.g. [`BROWSER_ID_TYPE`]
    pub id_type: String,
    /// The random value
    pub value: Uuid,
}

impl Identifier {
    /// Browser identifier with the given value
    pub fn browser(value: Uuid) -> Self {
        Self {
            id_type: BROWSER_ID_TYPE.to_string(),
            value,
        }
    }
}

impl FieldPayload for Identifier {
    const KIND: FieldKind = FieldKind::Identifier;

    fn encode_payload(&self) -> Result<Vec<u8>, WireError> {
        let id_type = self.id_type.as_bytes();
        let len = u8::try_from(id_type.len())
            .map_err(|_| WireError::payload("identifier type longer than 255 bytes"))?;
        let mut out = Vec::with_capacity(1 + id_type.len() + 16);
        out.push(len);
        out.extend_from_slice(id_type);
        out.extend_from_slice(self.value.as_bytes());
        Ok(out)
    }

    fn decode_payload(bytes: &[u8]) -> Result<Self, WireError> {
        let (&len, rest) = bytes.split_first().ok_or(WireError::Truncated)?;
        let len = len as usize;
        if rest.len() != len + 16 {
            return Err(WireError::payload("identifier length mismatch"));
        }
        let id_type = std::str::from_utf8(&rest[..len])
            .map_err(|_| WireError::payload("identifier type not utf-8"))?;
        let value = Uuid::from_slice(&rest[len..])
            .map_err(|e| WireError::payload(format!("identifier value: {e}")))?;
        Ok(Self {
            id_type: id_type.to_string(),
            value,
        })
    }
}

/// Advertising preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Whether browsing may be used for personalised advertising
    pub use_browsing_for_personalization: bool,
}

impl Preferences {
    const PERSONALIZATION: u8 = 0b0000_0001;
}

impl FieldPayload for Preferences {
    const KIND: FieldKind = FieldKind::Preferences;

    fn encode_payload(&self) -> Result<Vec<u8>, WireError> {
        let mut flags = 0u8;
        if self.use_browsing_for_personalization {
            flags |= Self::PERSONALIZATION;
        }
        Ok(vec![flags])
    }

    fn decode_payload(bytes: &[u8]) -> Result<Self, WireError> {
        match bytes {
            [flags] if flags & !Self::PERSONALIZATION == 0 => Ok(Self {
                use_browsing_for_personalization: flags & Self::PERSONALIZATION != 0,
            }),
            [_] => Err(WireError::payload("reserved preference bits set")),
            _ => Err(WireError::payload("preferences must be one byte")),
        }
    }
}

/// Email address as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    /// The address
    pub address: String,
}

impl Email {
    /// Create an email payload; the address must not be blank.
    pub fn new(address: impl Into<String>) -> Result<Self, WireError> {
        let address = address.into();
        if address.trim().is_empty() {
            return Err(WireError::payload("email is empty"));
        }
        Ok(Self { address })
    }

    /// Canonical form used when hashing: trimmed and lower-cased.
    pub fn canonical(&self) -> String {
        self.address.trim().to_lowercase()
    }
}

impl FieldPayload for Email {
    const KIND: FieldKind = FieldKind::Email;

    fn encode_payload(&self) -> Result<Vec<u8>, WireError> {
        Ok(self.address.as_bytes().to_vec())
    }

    fn decode_payload(bytes: &[u8]) -> Result<Self, WireError> {
        let text =
            std::str::from_utf8(bytes).map_err(|_| WireError::payload("email not utf-8"))?;
        Self::new(text)
    }
}

/// Salt used when hashing the email into a secondary identifier.
///
/// Salts are short numeric strings produced by the user interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Salt {
    /// Decimal digits
    pub value: String,
}

impl Salt {
    /// Create a salt; must be a non-empty string of ASCII digits.
    pub fn new(value: impl Into<String>) -> Result<Self, WireError> {
        let value = value.into();
        if value.is_empty() {
            return Err(WireError::payload("salt is empty"));
        }
        if !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(WireError::payload("salt must be numeric"));
        }
        Ok(Self { value })
    }
}

impl FieldPayload for Salt {
    const KIND: FieldKind = FieldKind::Salt;

    fn encode_payload(&self) -> Result<Vec<u8>, WireError> {
        Ok(self.value.as_bytes().to_vec())
    }

    fn decode_payload(bytes: &[u8]) -> Result<Self, WireError> {
        let text = std::str::from_utf8(bytes).map_err(|_| WireError::payload("salt not utf-8"))?;
        Self::new(text)
    }
}

/// Hashed secondary identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecondaryId {
    /// SHA-256 of the canonical email and salt
    pub digest: [u8; 32],
}

impl fmt::Display for SecondaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.digest))
    }
}

impl FieldPayload for SecondaryId {
    const KIND: FieldKind = FieldKind::SecondaryIdentifier;

    fn encode_payload(&self) -> Result<Vec<u8>, WireError> {
        Ok(self.digest.to_vec())
    }

    fn decode_payload(bytes: &[u8]) -> Result<Self, WireError> {
        let digest: [u8; 32] = bytes
            .try_into()
            .map_err(|_| WireError::payload("secondary identifier must be 32 bytes"))?;
        Ok(Self { digest })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_key_strings() {
        for key in [
            FieldKey::Rid,
            FieldKey::Pref,
            FieldKey::Email,
            FieldKey::Salt,
            FieldKey::Sid,
            FieldKey::Stop,
            FieldKey::Val,
        ] {
            assert_eq!(key.as_str().parse::<FieldKey>(), Ok(key));
        }
        assert!("RID".parse::<FieldKey>().is_err());
        assert!("swid".parse::<FieldKey>().is_err());
    }

    #[test]
    fn test_kind_key_mapping() {
        for tag in 1..=5u8 {
            let kind = FieldKind::from_tag(tag).unwrap();
            assert_eq!(kind.tag(), tag);
            assert_eq!(kind.key().kind(), Some(kind));
        }
        assert_eq!(FieldKind::from_tag(0), None);
        assert_eq!(FieldKey::Stop.kind(), None);
    }

    #[test]
    fn test_preferences_reserved_bits() {
        assert_eq!(
            Preferences::decode_payload(&[1]).unwrap(),
            Preferences {
                use_browsing_for_personalization: true
            }
        );
        assert!(Preferences::decode_payload(&[0b10]).is_err());
        assert!(Preferences::decode_payload(&[]).is_err());
    }

    #[test]
    fn test_salt_must_be_numeric() {
        assert!(Salt::new("1234").is_ok());
        assert!(Salt::new("").is_err());
        assert!(Salt::new("12a4").is_err());
    }

    #[test]
    fn test_email_canonical() {
        let email = Email::new("  Someone@Example.COM ").unwrap();
        assert_eq!(email.canonical(), "someone@example.com");
        assert!(Email::new("   ").is_err());
    }

    #[test]
    fn test_identifier_payload() {
        let id = Identifier::browser(Uuid::from_bytes([7; 16]));
        let bytes = id.encode_payload().unwrap();
        assert_eq!(Identifier::decode_payload(&bytes).unwrap(), id);
        assert!(Identifier::decode_payload(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn test_identifier_type_too_long() {
        let id = Identifier {
            id_type: "t".repeat(256),
            value: Uuid::from_bytes([7; 16]),
        };
        assert!(matches!(
            id.encode_payload(),
            Err(WireError::InvalidPayload(_))
        ));
        let longest = Identifier {
            id_type: "t".repeat(255),
            ..id
        };
        let bytes = longest.encode_payload().unwrap();
        assert_eq!(Identifier::decode_payload(&bytes).unwrap(), longest);
    }

    #[test]
    fn test_secondary_id_displays_as_hex() {
        let mut digest = [0u8; 32];
        digest[0] = 0xab;
        digest[31] = 0x01;
        let text = SecondaryId { digest }.to_string();
        assert_eq!(text.len(), 64);
        assert!(text.starts_with("ab00"));
        assert!(text.ends_with("01"));
    }
}
