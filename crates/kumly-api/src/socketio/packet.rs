// Engine.IO v4 / Socket.IO v5 text packet codec.
//
// Engine.IO frames are `<type><payload>` with a single-digit type.
// Socket.IO packets ride inside Engine.IO `message` frames as
// `<type>[<nsp>,][<ack id>][<json>]`. Binary attachments are not supported.

use serde::Deserialize;
use serde_json::Value;

use crate::error::Error;
use crate::transport::{AckId, Args};

/// Default Socket.IO namespace.
pub const DEFAULT_NAMESPACE: &str = "/";

// ── Engine.IO ────────────────────────────────────────────────────────

/// Handshake payload of the Engine.IO `open` packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPayload {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Milliseconds between server pings.
    pub ping_interval: u64,
    /// Milliseconds the server waits for a pong.
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnginePacket {
    Open(OpenPayload),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(frame: &str) -> Result<Self, Error> {
        let mut chars = frame.chars();
        let kind = chars
            .next()
            .ok_or_else(|| Error::protocol("empty Engine.IO frame", frame))?;
        let payload = chars.as_str();

        match kind {
            '0' => serde_json::from_str(payload).map(Self::Open).map_err(|e| {
                Error::protocol(format!("invalid Engine.IO open payload: {e}"), frame)
            }),
            '1' => Ok(Self::Close),
            '2' => Ok(Self::Ping(payload.to_owned())),
            '3' => Ok(Self::Pong(payload.to_owned())),
            '4' => Ok(Self::Message(payload.to_owned())),
            '5' => Ok(Self::Upgrade),
            '6' => Ok(Self::Noop),
            other => Err(Error::protocol(
                format!("unknown Engine.IO packet type {other:?}"),
                frame,
            )),
        }
    }

    /// Encode a client-originated packet. `Open` is server-only and encodes
    /// as an empty open frame.
    pub fn encode(&self) -> String {
        match self {
            Self::Open(_) => "0".to_owned(),
            Self::Close => "1".to_owned(),
            Self::Ping(data) => format!("2{data}"),
            Self::Pong(data) => format!("3{data}"),
            Self::Message(data) => format!("4{data}"),
            Self::Upgrade => "5".to_owned(),
            Self::Noop => "6".to_owned(),
        }
    }
}

// ── Socket.IO ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        nsp: String,
        data: Option<Value>,
    },
    Disconnect {
        nsp: String,
    },
    Event {
        nsp: String,
        id: Option<AckId>,
        name: String,
        args: Args,
    },
    Ack {
        nsp: String,
        id: AckId,
        args: Args,
    },
    ConnectError {
        nsp: String,
        data: Value,
    },
}

impl SocketPacket {
    pub fn decode(raw: &str) -> Result<Self, Error> {
        let mut rest = raw;
        let kind = take_char(&mut rest).ok_or_else(|| Error::protocol("empty Socket.IO packet", raw))?;

        if matches!(kind, '5' | '6') {
            return Err(Error::protocol("binary Socket.IO packets are not supported", raw));
        }

        let nsp = if rest.starts_with('/') {
            let (nsp, tail) = rest.split_once(',').unwrap_or((rest, ""));
            rest = tail;
            nsp.to_owned()
        } else {
            DEFAULT_NAMESPACE.to_owned()
        };

        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (id_str, json) = rest.split_at(digits);
        let id = if id_str.is_empty() {
            None
        } else {
            Some(
                id_str
                    .parse::<AckId>()
                    .map_err(|e| Error::protocol(format!("invalid ack id: {e}"), raw))?,
            )
        };

        let data: Option<Value> = if json.is_empty() {
            None
        } else {
            Some(
                serde_json::from_str(json)
                    .map_err(|e| Error::protocol(format!("invalid packet JSON: {e}"), raw))?,
            )
        };

        match kind {
            '0' => Ok(Self::Connect { nsp, data }),
            '1' => Ok(Self::Disconnect { nsp }),
            '2' => {
                let Some(Value::Array(mut items)) = data else {
                    return Err(Error::protocol("event payload is not an array", raw));
                };
                if items.is_empty() {
                    return Err(Error::protocol("event payload has no name", raw));
                }
                let Value::String(name) = items.remove(0) else {
                    return Err(Error::protocol("event name is not a string", raw));
                };
                Ok(Self::Event {
                    nsp,
                    id,
                    name,
                    args: items,
                })
            }
            '3' => {
                let id = id.ok_or_else(|| Error::protocol("ack without id", raw))?;
                let args = match data {
                    Some(Value::Array(items)) => items,
                    None => Vec::new(),
                    Some(_) => return Err(Error::protocol("ack payload is not an array", raw)),
                };
                Ok(Self::Ack { nsp, id, args })
            }
            '4' => Ok(Self::ConnectError {
                nsp,
                data: data.unwrap_or(Value::Null),
            }),
            other => Err(Error::protocol(
                format!("unknown Socket.IO packet type {other:?}"),
                raw,
            )),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            Self::Connect { nsp, data } => {
                let mut out = format!("0{}", nsp_prefix(nsp));
                if let Some(data) = data {
                    out.push_str(&data.to_string());
                }
                out
            }
            Self::Disconnect { nsp } => format!("1{}", nsp_prefix(nsp)),
            Self::Event {
                nsp,
                id,
                name,
                args,
            } => {
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(name.clone()));
                items.extend(args.iter().cloned());
                let id = id.map(|id| id.to_string()).unwrap_or_default();
                format!("2{}{id}{}", nsp_prefix(nsp), Value::Array(items))
            }
            Self::Ack { nsp, id, args } => {
                format!("3{}{id}{}", nsp_prefix(nsp), Value::Array(args.clone()))
            }
            Self::ConnectError { nsp, data } => format!("4{}{data}", nsp_prefix(nsp)),
        }
    }

    /// Wrap this packet in an Engine.IO message frame.
    pub fn to_frame(&self) -> String {
        EnginePacket::Message(self.encode()).encode()
    }
}

fn nsp_prefix(nsp: &str) -> String {
    if nsp == DEFAULT_NAMESPACE {
        String::new()
    } else {
        format!("{nsp},")
    }
}

fn take_char(s: &mut &str) -> Option<char> {
    let mut chars = s.chars();
    let c = chars.next()?;
    *s = chars.as_str();
    Some(c)
}
