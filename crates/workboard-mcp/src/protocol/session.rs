//! Connection lifecycle state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::registry::CapabilityKind;
use crate::types::{Implementation, McpError, McpResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Uninitialized,
    Negotiating,
    Ready,
    Closed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Negotiating => "negotiating",
            SessionState::Ready => "ready",
            SessionState::Closed => "closed",
        }
    }

    /// Whether the lifecycle permits moving to `next`.
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Uninitialized, Negotiating)
                | (Negotiating, Ready)
                | (Uninitialized | Negotiating | Ready, Closed)
        )
    }

    /// Fail with `InvalidState` unless the current state is one of `allowed`.
    pub fn require(&self, allowed: &[SessionState]) -> McpResult<()> {
        if allowed.contains(self) {
            Ok(())
        } else {
            Err(McpError::InvalidState {
                current: *self,
                allowed: allowed.to_vec(),
            })
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One client link, created when the handshake starts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSession {
    pub id: Uuid,
    pub negotiated: Vec<CapabilityKind>,
    pub created_at: DateTime<Utc>,
    pub client: Implementation,
}

impl ConnectionSession {
    pub fn new(client: Implementation) -> Self {
        Self {
            id: Uuid::new_v4(),
            negotiated: Vec::new(),
            created_at: Utc::now(),
            client,
        }
    }

    pub fn allows(&self, kind: CapabilityKind) -> bool {
        self.negotiated.contains(&kind)
    }
}
