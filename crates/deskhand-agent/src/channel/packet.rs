//! Engine.IO v4 and Socket.IO v5 text framing.
//!
//! Every WebSocket text frame is one Engine.IO packet: a single type digit
//! followed by its payload. Socket.IO packets travel inside Engine.IO
//! `message` packets and carry an optional namespace, an optional ack id
//! and a JSON payload:
//!
//! ```text
//! 0{"sid":"…","pingInterval":25000,"pingTimeout":20000}   open
//! 2 / 3                                                    ping / pong
//! 40                                                       connect "/"
//! 40/agents,                                               connect "/agents"
//! 42["execute_actions",{"userId":"u","actions":[]}]        event
//! 44{"message":"not authorized"}                           connect error
//! ```

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PacketError {
    #[error("empty packet")]
    Empty,

    #[error("unknown {layer} packet type '{ty}'")]
    UnknownType { layer: &'static str, ty: char },

    #[error("binary Socket.IO packets are not supported")]
    Binary,

    #[error("malformed {what}: {message}")]
    Malformed { what: &'static str, message: String },
}

fn malformed(what: &'static str, message: impl ToString) -> PacketError {
    PacketError::Malformed {
        what,
        message: message.to_string(),
    }
}

// ─── Engine.IO ────────────────────────────────────────────────────────────

/// Payload of the Engine.IO `open` packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    pub ping_interval: u64,
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(frame: &str) -> Result<Self, PacketError> {
        let mut chars = frame.chars();
        let ty = chars.next().ok_or(PacketError::Empty)?;
        let body = chars.as_str();
        Ok(match ty {
            '0' => EnginePacket::Open(
                serde_json::from_str(body).map_err(|e| malformed("open packet", e))?,
            ),
            '1' => EnginePacket::Close,
            '2' => EnginePacket::Ping(body.to_string()),
            '3' => EnginePacket::Pong(body.to_string()),
            '4' => EnginePacket::Message(body.to_string()),
            '5' => EnginePacket::Upgrade,
            '6' => EnginePacket::Noop,
            ty => {
                return Err(PacketError::UnknownType {
                    layer: "Engine.IO",
                    ty,
                })
            }
        })
    }

    /// Client-side encoding. `Open` is only ever sent by the server, so it
    /// encodes as a bare type digit.
    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(_) => "0".to_string(),
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(data) => format!("2{data}"),
            EnginePacket::Pong(data) => format!("3{data}"),
            EnginePacket::Message(data) => format!("4{data}"),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

// ─── Socket.IO ────────────────────────────────────────────────────────────

pub const DEFAULT_NAMESPACE: &str = "/";

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        data: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        ack_id: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    Ack {
        namespace: String,
        ack_id: u64,
        args: Vec<Value>,
    },
    ConnectError {
        namespace: String,
        data: Option<Value>,
    },
}

impl SocketPacket {
    /// Connect request for `namespace`.
    pub fn connect(namespace: impl Into<String>) -> Self {
        SocketPacket::Connect {
            namespace: namespace.into(),
            data: None,
        }
    }

    /// Event on `namespace` with a single payload argument.
    pub fn event(namespace: impl Into<String>, name: impl Into<String>, payload: Value) -> Self {
        SocketPacket::Event {
            namespace: namespace.into(),
            ack_id: None,
            name: name.into(),
            args: vec![payload],
        }
    }

    pub fn namespace(&self) -> &str {
        match self {
            SocketPacket::Connect { namespace, .. }
            | SocketPacket::Disconnect { namespace }
            | SocketPacket::Event { namespace, .. }
            | SocketPacket::Ack { namespace, .. }
            | SocketPacket::ConnectError { namespace, .. } => namespace,
        }
    }

    pub fn decode(body: &str) -> Result<Self, PacketError> {
        let mut chars = body.chars();
        let ty = chars.next().ok_or(PacketError::Empty)?;
        if matches!(ty, '5' | '6') {
            return Err(PacketError::Binary);
        }
        if !matches!(ty, '0'..='4') {
            return Err(PacketError::UnknownType {
                layer: "Socket.IO",
                ty,
            });
        }

        let mut rest = chars.as_str();

        let namespace = if rest.starts_with('/') {
            let (ns, tail) = match rest.find(',') {
                Some(i) => (&rest[..i], &rest[i + 1..]),
                None => (rest, ""),
            };
            rest = tail;
            ns.to_string()
        } else {
            DEFAULT_NAMESPACE.to_string()
        };

        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        let ack_id = if digits > 0 {
            let id = rest[..digits]
                .parse::<u64>()
                .map_err(|e| malformed("ack id", e))?;
            rest = &rest[digits..];
            Some(id)
        } else {
            None
        };

        let data = if rest.is_empty() {
            None
        } else {
            Some(serde_json::from_str::<Value>(rest).map_err(|e| malformed("payload", e))?)
        };

        Ok(match ty {
            '0' => SocketPacket::Connect { namespace, data },
            '1' => SocketPacket::Disconnect { namespace },
            '2' => {
                let mut args = match data {
                    Some(Value::Array(args)) => args,
                    _ => return Err(malformed("event", "payload must be a non-empty array")),
                };
                if args.is_empty() {
                    return Err(malformed("event", "payload must be a non-empty array"));
                }
                let name = match args.remove(0) {
                    Value::String(name) => name,
                    other => {
                        return Err(malformed("event", format!("name is not a string: {other}")))
                    }
                };
                SocketPacket::Event {
                    namespace,
                    ack_id,
                    name,
                    args,
                }
            }
            '3' => {
                let ack_id = ack_id.ok_or_else(|| malformed("ack", "missing ack id"))?;
                let args = match data {
                    Some(Value::Array(args)) => args,
                    _ => return Err(malformed("ack", "payload must be an array")),
                };
                SocketPacket::Ack {
                    namespace,
                    ack_id,
                    args,
                }
            }
            _ => SocketPacket::ConnectError { namespace, data },
        })
    }

    pub fn encode(&self) -> String {
        let (ty, ack_id, data) = match self {
            SocketPacket::Connect { data, .. } => ('0', None, data.clone()),
            SocketPacket::Disconnect { .. } => ('1', None, None),
            SocketPacket::Event {
                ack_id, name, args, ..
            } => {
                let mut array = Vec::with_capacity(args.len() + 1);
                array.push(Value::String(name.clone()));
                array.extend(args.iter().cloned());
                ('2', *ack_id, Some(Value::Array(array)))
            }
            SocketPacket::Ack { ack_id, args, .. } => {
                ('3', Some(*ack_id), Some(Value::Array(args.clone())))
            }
            SocketPacket::ConnectError { data, .. } => ('4', None, data.clone()),
        };

        let mut out = String::new();
        out.push(ty);
        let namespace = self.namespace();
        if namespace != DEFAULT_NAMESPACE {
            out.push_str(namespace);
            out.push(',');
        }
        if let Some(id) = ack_id {
            out.push_str(&id.to_string());
        }
        if let Some(data) = data {
            out.push_str(&data.to_string());
        }
        out
    }

    /// The full WebSocket frame: this packet wrapped in an Engine.IO message.
    pub fn to_frame(&self) -> String {
        EnginePacket::Message(self.encode()).encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_open() {
        let frame = r#"0{"sid":"lv_VI97HAXpY6yYWAAAC","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;
        let EnginePacket::Open(hs) = EnginePacket::decode(frame).unwrap() else {
            panic!("expected open")
        };
        assert_eq!(hs.sid, "lv_VI97HAXpY6yYWAAAC");
        assert_eq!(hs.ping_interval, 25_000);
        assert_eq!(hs.ping_timeout, 20_000);
        assert_eq!(hs.max_payload, Some(1_000_000));
    }

    #[test]
    fn ping_is_answered_with_matching_pong() {
        let EnginePacket::Ping(data) = EnginePacket::decode("2").unwrap() else {
            panic!("expected ping")
        };
        assert_eq!(EnginePacket::Pong(data).encode(), "3");
        assert_eq!(
            EnginePacket::decode("2upgrade-check").unwrap(),
            EnginePacket::Ping("upgrade-check".into())
        );
    }

    #[test]
    fn engine_errors() {
        assert_eq!(EnginePacket::decode(""), Err(PacketError::Empty));
        assert!(matches!(
            EnginePacket::decode("9"),
            Err(PacketError::UnknownType { ty: '9', .. })
        ));
        assert!(matches!(
            EnginePacket::decode("0not json"),
            Err(PacketError::Malformed { .. })
        ));
    }

    #[test]
    fn connect_frame() {
        assert_eq!(SocketPacket::connect("/").to_frame(), "40");
        let ack = SocketPacket::decode(r#"0{"sid":"abc"}"#).unwrap();
        assert_eq!(
            ack,
            SocketPacket::Connect {
                namespace: "/".into(),
                data: Some(json!({"sid": "abc"})),
            }
        );
    }

    #[test]
    fn connect_frame_for_namespace() {
        assert_eq!(SocketPacket::connect("/agents").to_frame(), "40/agents,");
        let ack = SocketPacket::decode(r#"0/agents,{"sid":"abc"}"#).unwrap();
        assert_eq!(ack.namespace(), "/agents");
        assert_eq!(
            SocketPacket::Disconnect {
                namespace: "/agents".into()
            }
            .to_frame(),
            "41/agents,"
        );
    }

    #[test]
    fn decode_event() {
        let frame = r#"42["execute_actions",{"userId":"u-1","actions":[{"type":"wait","ms":5}]}]"#;
        let EnginePacket::Message(body) = EnginePacket::decode(frame).unwrap() else {
            panic!("expected message")
        };
        let SocketPacket::Event {
            namespace,
            ack_id,
            name,
            args,
        } = SocketPacket::decode(&body).unwrap()
        else {
            panic!("expected event")
        };
        assert_eq!(namespace, "/");
        assert_eq!(ack_id, None);
        assert_eq!(name, "execute_actions");
        assert_eq!(args[0]["userId"], "u-1");
    }

    #[test]
    fn decode_event_with_namespace_and_ack() {
        let packet = SocketPacket::decode(r#"2/admin,17["ping",1]"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Event {
                namespace: "/admin".into(),
                ack_id: Some(17),
                name: "ping".into(),
                args: vec![json!(1)],
            }
        );
        assert_eq!(packet.encode(), r#"2/admin,17["ping",1]"#);
    }

    #[test]
    fn encode_event() {
        let frame = SocketPacket::event("/", "identify", json!({"userId": "desk-1"})).to_frame();
        assert_eq!(frame, r#"42["identify",{"userId":"desk-1"}]"#);
        let frame = SocketPacket::event("/agents", "identify", json!({"userId": "desk-1"})).to_frame();
        assert_eq!(frame, r#"42/agents,["identify",{"userId":"desk-1"}]"#);
    }

    #[test]
    fn connect_error_carries_message() {
        let packet = SocketPacket::decode(r#"4{"message":"Not authorized"}"#).unwrap();
        let SocketPacket::ConnectError { data, .. } = packet else {
            panic!("expected connect error")
        };
        assert_eq!(data.unwrap()["message"], "Not authorized");
    }

    #[test]
    fn socket_errors() {
        assert_eq!(SocketPacket::decode("51-[]"), Err(PacketError::Binary));
        assert!(SocketPacket::decode("2{}").is_err());
        assert!(SocketPacket::decode("2[]").is_err());
        assert!(SocketPacket::decode("2[42]").is_err());
        assert!(SocketPacket::decode("3[]").is_err());
        assert!(matches!(
            SocketPacket::decode("8"),
            Err(PacketError::UnknownType { ty: '8', .. })
        ));
    }

    #[test]
    fn disconnect_round_trips() {
        let packet = SocketPacket::decode("1").unwrap();
        assert_eq!(packet, SocketPacket::Disconnect { namespace: "/".into() });
        assert_eq!(packet.to_frame(), "41");
    }
}
