//! Notification payloads.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::jsonrpc::RequestId;

/// `notifications/cancelled` payload sent by a client.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelledNotification {
    /// Request ID the client gave up on.
    pub request_id: RequestId,
    /// Reason for cancellation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
