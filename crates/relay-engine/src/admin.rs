//! Two-step admin actions: the admin picks an action, then sends its argument.

use crate::types::ClientId;
use std::fmt;

/// An admin action waiting for its text argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PendingAdminAction {
    AddAdmin,
    RemoveAdmin,
    Ban,
    Unban,
    AddService,
    Broadcast,
}

impl PendingAdminAction {
    /// Parse the action keyword used by `!admin <action>`.
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "addadmin" | "add-admin" => Some(Self::AddAdmin),
            "removeadmin" | "remove-admin" => Some(Self::RemoveAdmin),
            "ban" => Some(Self::Ban),
            "unban" => Some(Self::Unban),
            "addservice" | "add-service" => Some(Self::AddService),
            "broadcast" => Some(Self::Broadcast),
            _ => None,
        }
    }

    /// Prompt shown when the action starts.
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::AddAdmin => "➕ Send the id of the new admin:",
            Self::RemoveAdmin => "➖ Send the id of the admin to remove:",
            Self::Ban => "🚫 Send the id of the user to ban:",
            Self::Unban => "✅ Send the id of the user to unban:",
            Self::AddService => "📦 Send the name of the new service (e.g. Instagram):",
            Self::Broadcast => "📢 Send the message to broadcast to every user:",
        }
    }
}

/// Result of completing a pending action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminOutcome {
    AdminAdded(ClientId),
    AdminRemoved(ClientId),
    Banned(ClientId),
    Unbanned(ClientId),
    ServiceAdded(String),
    ServiceExists(String),
    Broadcast { sent: usize, failed: usize },
}

impl fmt::Display for AdminOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminOutcome::AdminAdded(id) => write!(f, "✅ Admin added: {id}"),
            AdminOutcome::AdminRemoved(id) => write!(f, "❌ Admin removed: {id}"),
            AdminOutcome::Banned(id) => write!(f, "🚫 Banned: {id}"),
            AdminOutcome::Unbanned(id) => write!(f, "✅ Unbanned: {id}"),
            AdminOutcome::ServiceAdded(name) => write!(f, "✅ Service added: {name}"),
            AdminOutcome::ServiceExists(name) => write!(f, "⚠️ {name} already exists."),
            AdminOutcome::Broadcast { sent, failed } => {
                write!(f, "✅ Sent to {sent} users")?;
                if *failed > 0 {
                    write!(f, " ({failed} failed)")?;
                }
                Ok(())
            }
        }
    }
}
