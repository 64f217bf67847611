//! WebSocket message types.
//!
//! Both directions are JSON objects discriminated on a `type` field.

use membudget::category::CategorySizes;
use serde::{Deserialize, Serialize};

use crate::snapshot::AllocationSnapshot;

/// A message sent from the server to a WebSocket client.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// Current allocation, sent after `open`, every `move`, and `reset`.
    Allocation { data: AllocationSnapshot },
    /// The allocation was persisted.
    Saved {
        user: String,
        allocation: CategorySizes,
        updated_at: Option<String>,
    },
    /// A request could not be served. The session, if any, is unchanged.
    Error { message: String },
}

/// A message received from a WebSocket client.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start editing a user's settings. Replaces any open session.
    Open { user: String },
    /// Drag a handle. `handle` is signed so bad indices reach the allocator
    /// and come back as a proper error instead of a parse failure.
    Move { handle: i64, value: i64 },
    /// Persist the current allocation.
    Save,
    /// Restore the default split.
    Reset,
    /// Discard unsaved changes by reloading from the store.
    Reload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_deserialize() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"open","user":"alice"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Open {
                user: "alice".into()
            }
        );

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"move","handle":6,"value":7950}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Move {
                handle: 6,
                value: 7950
            }
        );

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"save"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Save);
    }

    #[test]
    fn error_message_serializes_with_type_tag() {
        let json = serde_json::to_value(WsMessage::Error {
            message: "nope".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "nope");
    }

    #[test]
    fn saved_message_carries_flat_sizes() {
        let json = serde_json::to_value(WsMessage::Saved {
            user: "alice".into(),
            allocation: CategorySizes::from_array([1000; 8]),
            updated_at: None,
        })
        .unwrap();
        assert_eq!(json["type"], "saved");
        assert_eq!(json["allocation"]["ltm2"], 1000);
    }
}
