//! Webhook request and response bodies
//!
//! Shapes follow the conversational-agent webhook contract. Unknown fields
//! are ignored on every request type.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MSG_BLOCKED: &str = "Este número de teléfono ha sido bloqueado por actividad sospechosa.";
pub const MSG_ALLOWED: &str = "Número de teléfono permitido.";
pub const MSG_MALFORMED: &str = "No se pudo obtener el número de teléfono o el rut.";

// ============ Request Types ============

#[derive(Debug, Clone, Deserialize)]
pub struct Telephony {
    pub caller_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Payload {
    pub telephony: Telephony,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckRequest {
    pub payload: Payload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryParameters {
    pub national_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionInfo {
    pub parameters: QueryParameters,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub payload: Payload,
    #[serde(rename = "sessionInfo")]
    pub session_info: SessionInfo,
}

// ============ Response Types ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockParameters {
    pub block: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSessionInfo {
    pub parameters: BlockParameters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageText {
    pub text: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub text: MessageText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentResponse {
    pub messages: Vec<ResponseMessage>,
}

/// Envelope read by the agent: sets the `block` session parameter and
/// speaks one message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookResponse {
    #[serde(rename = "sessionInfo")]
    pub session_info: ResponseSessionInfo,
    pub fulfillment_response: FulfillmentResponse,
}

impl WebhookResponse {
    pub fn new(block: bool, message: impl Into<String>) -> Self {
        Self {
            session_info: ResponseSessionInfo {
                parameters: BlockParameters { block },
            },
            fulfillment_response: FulfillmentResponse {
                messages: vec![ResponseMessage {
                    text: MessageText {
                        text: vec![message.into()],
                    },
                }],
            },
        }
    }

    pub fn blocked() -> Self {
        Self::new(true, MSG_BLOCKED)
    }

    pub fn allowed() -> Self {
        Self::new(false, MSG_ALLOWED)
    }

    /// Malformed requests are answered as blocked
    pub fn malformed() -> Self {
        Self::new(true, MSG_MALFORMED)
    }

    pub fn is_block(&self) -> bool {
        self.session_info.parameters.block
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryAccepted {
    pub status: String,
    pub query_id: Uuid,
}

impl QueryAccepted {
    pub fn new(query_id: Uuid) -> Self {
        Self {
            status: "ok".to_string(),
            query_id,
        }
    }
}
