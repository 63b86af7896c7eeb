// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Empty assistant message passes.
//!
//! The two passes are alternatives: the hosted chat path drops empty
//! assistant turns, the plugin path fills them. A caller applies one or the
//! other, never both.

use parley_core::types::{BuiltChatMessage, MessageContent, Role};

pub const FILLER: &str = "Sure.";

fn is_empty_assistant(message: &BuiltChatMessage) -> bool {
    message.role == Role::Assistant && message.content.is_blank()
}

/// Removes assistant messages with no content.
pub fn filter_empty_assistant_messages(messages: &mut Vec<BuiltChatMessage>) {
    messages.retain(|m| !is_empty_assistant(m));
}

/// Replaces empty assistant content with [`FILLER`].
pub fn ensure_assistant_messages_not_empty(messages: &mut [BuiltChatMessage]) {
    for message in messages.iter_mut().filter(|m| is_empty_assistant(m)) {
        message.content = MessageContent::Text(FILLER.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn built(role: Role, text: &str) -> BuiltChatMessage {
        BuiltChatMessage {
            role,
            content: MessageContent::Text(text.into()),
        }
    }

    fn sample() -> Vec<BuiltChatMessage> {
        vec![
            built(Role::System, ""),
            built(Role::User, "hi"),
            built(Role::Assistant, "  "),
            built(Role::User, ""),
            built(Role::Assistant, "ok"),
        ]
    }

    #[test]
    fn filter_drops_only_empty_assistant() {
        let mut messages = sample();
        filter_empty_assistant_messages(&mut messages);
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::User, Role::Assistant]);
    }

    #[test]
    fn filter_is_idempotent() {
        let mut once = sample();
        filter_empty_assistant_messages(&mut once);
        let mut twice = once.clone();
        filter_empty_assistant_messages(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn fill_replaces_empty_assistant() {
        let mut messages = sample();
        ensure_assistant_messages_not_empty(&mut messages);
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[2].content, MessageContent::Text("Sure.".into()));
        assert_eq!(messages[3].content, MessageContent::Text(String::new()));
        assert_eq!(messages[4].content, MessageContent::Text("ok".into()));
    }
}
