//! Outbound consent records
//!
//! [`RawRecord`] carries every field, email and salt included, and exists
//! only for the editing user interface. [`PublicRecord`] has no email or
//! salt field at all; the only way from one to the other is
//! [`RawRecord::into_public`], which drops them.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use swan_core::{
    Email, FieldPayload, Identifier, Preferences, Salt, SecondaryId, Signed, StopList, UiOptions,
    Validity,
};

/// A signed field together with its validity window.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEntry<T: FieldPayload> {
    /// The signed field
    pub field: Signed<T>,
    /// When the field stops being usable
    pub validity: Validity,
}

impl<T: FieldPayload> FieldEntry<T> {
    /// Pair a field with its window
    pub fn new(field: Signed<T>, validity: Validity) -> Self {
        Self { field, validity }
    }
}

// {"value": <base64 signed record>, "created": <rfc3339>, "expires": <rfc3339>}
impl<T: FieldPayload> Serialize for FieldEntry<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.field.to_base64().map_err(serde::ser::Error::custom)?;
        let mut state = serializer.serialize_struct("FieldEntry", 3)?;
        state.serialize_field("value", &value)?;
        state.serialize_field("created", &self.validity.created)?;
        state.serialize_field("expires", &self.validity.expires)?;
        state.end()
    }
}

/// Stop list as returned to callers: one space-joined string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopEntry(pub StopList);

impl Serialize for StopEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("StopEntry", 3)?;
        state.serialize_field("value", &self.0.joined())?;
        state.serialize_field("created", &self.0.validity.created)?;
        state.serialize_field("expires", &self.0.validity.expires)?;
        state.end()
    }
}

/// Record returned to ordinary callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicRecord {
    /// Identifier; always present
    pub rid: FieldEntry<Identifier>,
    /// Preferences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pref: Option<FieldEntry<Preferences>>,
    /// Secondary identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<FieldEntry<SecondaryId>>,
    /// Revoked domains
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<StopEntry>,
    /// Aggregate window; revalidate with the network by `val.expires`
    pub val: Validity,
    /// Caller state from storage
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub state: Vec<String>,
}

/// Record including email and salt, for the editing user interface only.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Identifier; always present
    pub rid: FieldEntry<Identifier>,
    /// Preferences
    pub pref: Option<FieldEntry<Preferences>>,
    /// Email
    pub email: Option<FieldEntry<Email>>,
    /// Salt
    pub salt: Option<FieldEntry<Salt>>,
    /// Secondary identifier
    pub sid: Option<FieldEntry<SecondaryId>>,
    /// Revoked domains
    pub stop: Option<StopEntry>,
    /// Aggregate window
    pub val: Validity,
    /// Caller state from storage
    pub state: Vec<String>,
}

impl RawRecord {
    /// Drop email and salt.
    pub fn into_public(self) -> PublicRecord {
        PublicRecord {
            rid: self.rid,
            pref: self.pref,
            sid: self.sid,
            stop: self.stop,
            val: self.val,
            state: self.state,
        }
    }

    /// Flattened map of primitive values for the editing user interface.
    ///
    /// `rid` stays a signed base64 value so the interface can submit it back
    /// unchanged; `pref` becomes a boolean, `email` and `salt` plain strings
    /// (salt is empty when absent). The interface options and state are
    /// added alongside.
    pub fn to_ui_map(&self, ui: &UiOptions) -> Result<Map<String, Value>, swan_core::SwanError> {
        let mut map = Map::new();
        let rid = self
            .rid
            .field
            .to_base64()
            .map_err(|e| swan_core::SwanError::serialization(e.to_string()))?;
        map.insert("rid".into(), Value::String(rid));
        if let Some(pref) = &self.pref {
            map.insert(
                "pref".into(),
                Value::Bool(pref.field.payload.use_browsing_for_personalization),
            );
        }
        if let Some(email) = &self.email {
            map.insert(
                "email".into(),
                Value::String(email.field.payload.address.clone()),
            );
        }
        let salt = self
            .salt
            .as_ref()
            .map(|s| s.field.payload.value.clone())
            .unwrap_or_default();
        map.insert("salt".into(), Value::String(salt));

        map.insert("title".into(), Value::String(ui.title.clone()));
        map.insert(
            "backgroundColor".into(),
            Value::String(ui.background_color.clone()),
        );
        map.insert(
            "messageColor".into(),
            Value::String(ui.message_color.clone()),
        );
        map.insert(
            "progressColor".into(),
            Value::String(ui.progress_color.clone()),
        );
        map.insert("message".into(), Value::String(ui.message.clone()));
        map.insert(
            "state".into(),
            Value::Array(self.state.iter().cloned().map(Value::String).collect()),
        );
        Ok(map)
    }
}
