// Acknowledgment envelope decoding.
//
// Every command ack has the shape `{ ok, msg, ...command-specific fields }`.
// The envelope is decoded once at the bridge boundary; callers pull out the
// fields they need with typed accessors.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::Error;
use crate::transport::Args;

/// Decoded acknowledgment of an emitted command.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Response {
    /// Server success flag. Absent or `null` decodes as `false`.
    pub ok: bool,
    /// Human-readable message (may be an i18n key on newer servers).
    pub msg: Option<String>,
    /// Every other field in the envelope.
    pub fields: Map<String, Value>,
}

impl Response {
    /// Decode the first positional ack argument of `event` into an envelope.
    pub fn from_ack(event: &str, args: Args) -> Result<Self, Error> {
        let Some(first) = args.into_iter().next() else {
            return Err(Error::protocol(
                format!("{event}: acknowledgment carried no payload"),
                "[]",
            ));
        };

        let mut map = match first {
            Value::Object(map) => map,
            other => {
                return Err(Error::protocol(
                    format!("{event}: acknowledgment is not an object"),
                    other.to_string(),
                ));
            }
        };

        let ok = match map.remove("ok") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => b,
            Some(other) => {
                return Err(Error::protocol(
                    format!("{event}: `ok` is not a boolean"),
                    other.to_string(),
                ));
            }
        };

        let msg = match map.remove("msg") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
        };

        Ok(Self {
            ok,
            msg,
            fields: map,
        })
    }

    /// The server message, or an empty string.
    pub fn message(&self) -> &str {
        self.msg.as_deref().unwrap_or("")
    }

    /// Convert `ok: false` into [`Error::Rejected`] with the server text.
    pub fn into_result(self) -> Result<Self, Error> {
        if self.ok {
            Ok(self)
        } else {
            Err(Error::Rejected {
                message: self.msg.unwrap_or_else(|| "request rejected".into()),
            })
        }
    }

    /// Extract a required field, failing with a protocol error if it is
    /// absent or of the wrong type.
    pub fn field<T: DeserializeOwned>(&self, key: &str) -> Result<T, Error> {
        self.optional_field(key)?.ok_or_else(|| {
            Error::protocol(
                format!("acknowledgment is missing `{key}`"),
                Value::Object(self.fields.clone()).to_string(),
            )
        })
    }

    /// Extract an optional field. `null` counts as absent.
    pub fn optional_field<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, Error> {
        match self.fields.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone()).map(Some).map_err(|e| {
                Error::protocol(format!("field `{key}`: {e}"), value.to_string())
            }),
        }
    }

    /// `true` if `key` is present and truthy.
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.fields.get(key), Some(Value::Bool(true)))
    }
}
