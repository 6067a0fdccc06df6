//! # Messages
//!
//! Contains constant strings and format functions for user-facing messages.

pub const RATE_LIMITED: &str = "🚦 **Slow down** — you are sending messages too quickly.";
pub const SESSION_CLOSED: &str = "👋 Session closed. A new one starts with your next message.";
pub const NOTES_EMPTY: &str = "No notes saved in this conversation.";
pub const NOTES_CLEARED: &str = "🗑️ Notes cleared.";
pub const NOTE_USAGE: &str = "Usage: `/note <text>`, `/note list`, `/note clear`";

pub fn note_added(count: usize) -> String {
    format!("📝 Noted. ({count} saved)")
}

pub fn greeting(sender: &str) -> String {
    format!("👋 Hello, {sender}!")
}

pub fn status_report(uptime_secs: u64, session_age: &str, version: u64, notes: usize) -> String {
    format!(
        "**📊 Status**\n* Uptime: {uptime_secs}s\n* Session since: {session_age}\n* Session version: {version}\n* Notes: {notes}"
    )
}
