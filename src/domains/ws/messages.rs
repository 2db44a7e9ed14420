use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// =====================================================
// WebSocket 와이어 메시지
// =====================================================

/// 모든 주문(와일드카드) 구독 토픽
pub const WILDCARD_TOPIC: &str = "*";

/// 서버 → 클라이언트 공통 봉투
/// Server-to-client envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsEnvelope {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,

    /// epoch millis
    pub timestamp: i64,
}

impl WsEnvelope {
    fn new(kind: &str, payload: Option<Value>) -> Self {
        Self {
            kind: kind.to_string(),
            payload,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn connected(connection_id: u64) -> Self {
        Self::new(
            "connected",
            Some(json!({ "connectionId": connection_id.to_string() })),
        )
    }

    pub fn subscribed(topic: &str) -> Self {
        Self::new("subscribed", Some(json!({ "topic": topic })))
    }

    pub fn order_update(payload: Value) -> Self {
        Self::new("order-update", Some(payload))
    }

    pub fn error(message: &str) -> Self {
        Self::new("error", Some(json!({ "message": message })))
    }

    pub fn ping() -> Self {
        Self::new("ping", None)
    }

    pub fn pong() -> Self {
        Self::new("pong", None)
    }

    pub fn to_json(&self) -> String {
        // 구조상 직렬화 실패 불가
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// 클라이언트 → 서버 메시지
/// Client-to-server message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// 주문 구독. orderId는 숫자 문자열 또는 "*"
    Subscribe { order_id: String },

    /// 주문 구독 해제
    Unsubscribe { order_id: String },

    Ping,
    Pong,
}

/// 수신 프레임. 봉투 형태 {type, payload, timestamp}가 정규 형태이고,
/// 평탄한 {type, orderId}도 구형 클라이언트 호환으로 허용
#[derive(Deserialize)]
struct InboundFrame {
    #[serde(rename = "type")]
    kind: String,

    #[serde(default)]
    payload: Option<Value>,

    #[serde(default, rename = "orderId")]
    order_id: Option<String>,
}

impl InboundFrame {
    fn order_id(&self) -> Result<String, serde_json::Error> {
        use serde::de::Error;

        if let Some(id) = &self.order_id {
            return Ok(id.clone());
        }
        self.payload
            .as_ref()
            .and_then(|p| p.get("orderId"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| serde_json::Error::custom("missing payload.orderId"))
    }
}

impl ClientMessage {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        use serde::de::Error;

        let frame: InboundFrame = serde_json::from_str(text)?;
        match frame.kind.as_str() {
            "subscribe" => Ok(ClientMessage::Subscribe {
                order_id: frame.order_id()?,
            }),
            "unsubscribe" => Ok(ClientMessage::Unsubscribe {
                order_id: frame.order_id()?,
            }),
            "ping" => Ok(ClientMessage::Ping),
            "pong" => Ok(ClientMessage::Pong),
            other => Err(serde_json::Error::custom(format!(
                "unknown message type: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_envelope_subscribe() {
        let msg = ClientMessage::parse(
            r#"{"type":"subscribe","payload":{"orderId":"42"},"timestamp":1725000000000}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::Subscribe {
                order_id: "42".to_string()
            }
        );
    }

    #[test]
    fn test_parse_envelope_unsubscribe() {
        let msg =
            ClientMessage::parse(r#"{"type":"unsubscribe","payload":{"orderId":"7"}}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Unsubscribe {
                order_id: "7".to_string()
            }
        );
    }

    #[test]
    fn test_parse_flat_subscribe() {
        let msg = ClientMessage::parse(r#"{"type":"subscribe","orderId":"42"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Subscribe {
                order_id: "42".to_string()
            }
        );
    }

    #[test]
    fn test_parse_wildcard_subscribe() {
        let msg =
            ClientMessage::parse(r#"{"type":"subscribe","payload":{"orderId":"*"}}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Subscribe {
                order_id: WILDCARD_TOPIC.to_string()
            }
        );
    }

    #[test]
    fn test_parse_subscribe_without_order_id_is_error() {
        assert!(ClientMessage::parse(r#"{"type":"subscribe","payload":{}}"#).is_err());
        assert!(ClientMessage::parse(r#"{"type":"subscribe"}"#).is_err());
    }

    #[test]
    fn test_parse_ping() {
        assert_eq!(
            ClientMessage::parse(r#"{"type":"ping"}"#).unwrap(),
            ClientMessage::Ping
        );
    }

    #[test]
    fn test_parse_garbage_is_error() {
        assert!(ClientMessage::parse("not json").is_err());
        assert!(ClientMessage::parse(r#"{"type":"unknown"}"#).is_err());
    }

    #[test]
    fn test_envelope_wire_shape() {
        let env = WsEnvelope::subscribed("42");
        let value: Value = serde_json::from_str(&env.to_json()).unwrap();
        assert_eq!(value["type"], "subscribed");
        assert_eq!(value["payload"]["topic"], "42");
        assert!(value["timestamp"].is_i64());
    }
}
