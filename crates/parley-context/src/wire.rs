// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of truncated history into wire messages.

use parley_core::types::{
    BuiltChatMessage, ContentPart, FileItem, ImageUrl, Message, MessageContent, MessageImage,
    PluginId, Role,
};
use tracing::debug;

use crate::retrieval::{build_retrieval_text, retrieval_instructions};

/// Resolves an image reference to a URL.
///
/// Data URIs pass through; anything else is looked up by path in the image
/// cache. A miss yields an empty URL.
pub fn resolve_image_url(path: &str, chat_images: &[MessageImage]) -> String {
    if path.starts_with("data") {
        return path.to_string();
    }
    match chat_images.iter().find(|image| image.path == path) {
        Some(image) => image.base64.clone(),
        None => {
            debug!(path, "image not in cache, sending empty url");
            String::new()
        }
    }
}

/// Plain text for image-free messages, otherwise `[text, image_url...]`.
pub fn to_wire(message: &Message, chat_images: &[MessageImage]) -> BuiltChatMessage {
    let content = if message.image_paths.is_empty() {
        MessageContent::Text(message.content.clone())
    } else {
        let mut parts = Vec::with_capacity(message.image_paths.len() + 1);
        parts.push(ContentPart::Text {
            text: message.content.clone(),
        });
        parts.extend(message.image_paths.iter().map(|path| ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: resolve_image_url(path, chat_images),
            },
        }));
        MessageContent::Multipart(parts)
    };

    BuiltChatMessage {
        role: message.role,
        content,
    }
}

/// Wraps the second-to-last message (the current user query; the last one is
/// the assistant placeholder) in the retrieval instruction template.
///
/// Skipped when there are no standalone file items, when the auto selector
/// is active, or when there are fewer than two messages.
///
/// The target is picked by position only. If truncation kept nothing but the
/// system prompt and the placeholder, the system prompt is what gets wrapped.
pub fn splice_retrieval(
    messages: &mut [BuiltChatMessage],
    message_file_items: &[FileItem],
    plugin: PluginId,
) {
    if message_file_items.is_empty() || plugin == PluginId::AutoPluginSelector {
        return;
    }
    let Some(index) = messages.len().checked_sub(2) else {
        return;
    };

    let retrieval = build_retrieval_text(message_file_items);
    let target = &mut messages[index];
    if target.role != Role::User {
        debug!(
            role = ?target.role,
            "retrieval wraps a non-user message, user query was truncated"
        );
    }
    let instructions = retrieval_instructions(&target.content.text(), &retrieval);
    match &mut target.content {
        MessageContent::Text(text) => *text = instructions,
        MessageContent::Multipart(parts) => {
            let mut wrapped = Some(instructions);
            parts.retain_mut(|part| match part {
                ContentPart::Text { text } => match wrapped.take() {
                    Some(instructions) => {
                        *text = instructions;
                        true
                    }
                    None => false,
                },
                ContentPart::ImageUrl { .. } => true,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn message(content: &str, image_paths: &[&str]) -> Message {
        Message {
            id: "1".into(),
            chat_id: "c".into(),
            user_id: "u".into(),
            role: Role::User,
            content: content.into(),
            image_paths: image_paths.iter().map(|p| p.to_string()).collect(),
            sequence_number: 1,
            model: "m".into(),
            plugin: PluginId::None,
            created_at: String::new(),
            updated_at: None,
        }
    }

    fn cache() -> Vec<MessageImage> {
        vec![MessageImage {
            message_id: None,
            path: "u/1.png".into(),
            base64: "data:image/png;base64,AAA".into(),
        }]
    }

    fn item() -> FileItem {
        FileItem {
            id: "i".into(),
            file_id: "f".into(),
            content: "port 22 open".into(),
            tokens: 3,
        }
    }

    fn text(role: Role, s: &str) -> BuiltChatMessage {
        BuiltChatMessage {
            role,
            content: MessageContent::Text(s.into()),
        }
    }

    #[test]
    fn text_only_passes_through() {
        let built = to_wire(&message("hello", &[]), &cache());
        assert_eq!(built.content, MessageContent::Text("hello".into()));
    }

    #[test]
    fn images_expand_in_order() {
        let built = to_wire(
            &message("look", &["data:image/png;base64,ZZZ", "u/1.png", "u/missing.png"]),
            &cache(),
        );
        let MessageContent::Multipart(parts) = built.content else {
            panic!("expected multipart");
        };
        let urls: Vec<&str> = parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::ImageUrl { image_url } => Some(image_url.url.as_str()),
                ContentPart::Text { .. } => None,
            })
            .collect();
        assert_eq!(parts[0], ContentPart::Text { text: "look".into() });
        assert_eq!(
            urls,
            vec!["data:image/png;base64,ZZZ", "data:image/png;base64,AAA", ""]
        );
    }

    #[test]
    fn splice_wraps_second_to_last() {
        let mut messages = vec![
            text(Role::System, "sys"),
            text(Role::User, "what ports?"),
            text(Role::Assistant, ""),
        ];
        splice_retrieval(&mut messages, &[item()], PluginId::None);
        let spliced = messages[1].content.text();
        assert!(spliced.starts_with("Assist with the user's query: 'what ports?'"));
        assert!(spliced.contains("<BEGIN SOURCE>\nport 22 open\n<END SOURCE>"));
        assert_eq!(messages[0].content.text(), "sys");
    }

    #[test]
    #[traced_test]
    fn splice_falls_back_to_system_prompt_when_query_was_truncated() {
        let mut messages = vec![text(Role::System, "sys"), text(Role::Assistant, "")];
        splice_retrieval(&mut messages, &[item()], PluginId::None);
        assert!(
            messages[0]
                .content
                .text()
                .starts_with("Assist with the user's query: 'sys'")
        );
        assert!(logs_contain("retrieval wraps a non-user message"));
    }

    #[test]
    fn splice_applies_for_concrete_plugins_too() {
        let mut messages = vec![text(Role::User, "q"), text(Role::Assistant, "")];
        splice_retrieval(&mut messages, &[item()], PluginId::Nuclei);
        assert!(messages[0].content.text().contains("<BEGIN SOURCE>"));
    }

    #[test]
    fn splice_skipped_for_auto_selector_or_no_items() {
        let mut messages = vec![text(Role::User, "q"), text(Role::Assistant, "")];
        splice_retrieval(&mut messages, &[item()], PluginId::AutoPluginSelector);
        splice_retrieval(&mut messages, &[], PluginId::None);
        assert_eq!(messages[0].content.text(), "q");
    }

    #[test]
    fn splice_keeps_images_in_multipart() {
        let mut messages = vec![
            to_wire(&message("describe", &["u/1.png"]), &cache()),
            text(Role::Assistant, ""),
        ];
        splice_retrieval(&mut messages, &[item()], PluginId::None);
        let MessageContent::Multipart(parts) = &messages[0].content else {
            panic!("expected multipart");
        };
        assert_eq!(parts.len(), 2);
        assert!(matches!(&parts[0], ContentPart::Text { text } if text.contains("'describe'")));
        assert!(matches!(&parts[1], ContentPart::ImageUrl { .. }));
    }
}
