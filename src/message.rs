//! Wire-level conversation types shared by the transport, the orchestrator,
//! and the view. Identifiers and roles are assigned by the backend; the
//! client never mutates a message after receiving it.

use serde::{Deserialize, Serialize};

/// One message in the conversation, as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub role: Role,
    pub content: String,
}

/// The sender of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}
