//! Identifier newtypes. Home-protocol identifiers (`UserId`, `RoomId`) and
//! external-network identifiers (`SessionId`, `RemoteUserId`,
//! `ConversationKey`) are distinct namespaces; the newtypes keep them from
//! being mixed up at call sites.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Home-protocol user identifier (e.g. `@alice:example.org`).
    UserId
);
string_id!(
    /// Home-protocol room identifier.
    RoomId
);
string_id!(
    /// Network-assigned identifier for one authenticated session. Distinct
    /// from the owning account's `UserId`.
    SessionId
);
string_id!(
    /// External-network user identifier, keyed separately from accounts and
    /// sessions.
    RemoteUserId
);

/// Composite key for a bridged conversation on the external network.
///
/// `receiver` scopes the conversation to the session that sees it, for
/// networks where the same remote chat looks different per login (DMs,
/// notably). `None` means the conversation is global to the network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<SessionId>,
}

impl ConversationKey {
    pub fn global(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            receiver: None,
        }
    }

    pub fn scoped(id: impl Into<String>, receiver: SessionId) -> Self {
        Self {
            id: id.into(),
            receiver: Some(receiver),
        }
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.receiver {
            Some(receiver) => write!(f, "{}/{receiver}", self.id),
            None => f.write_str(&self.id),
        }
    }
}
