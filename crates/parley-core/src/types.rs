// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data model shared by the context builder, the send orchestrator, and the
//! collaborator traits.
//!
//! Row types (`Message`, `Chat`, `FileRecord`, ...) keep the snake_case field
//! names of the persistence layer. Request-scoped aggregates that travel to
//! the hosted backend (`ChatPayload`, `ChatSettings`) serialize in camelCase.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Author of a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Named alternate processing path a turn can be routed to.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PluginId {
    #[default]
    None,
    AutoPluginSelector,
    #[strum(serialize = "webscraper")]
    #[serde(rename = "webscraper")]
    WebScraper,
    Nuclei,
    Naabu,
    Alterx,
    Dnsx,
    Httpx,
    Katana,
    Subfinder,
    Gau,
    Cvemap,
}

impl PluginId {
    /// A concrete plugin: not `None`, not the auto selector, not the web scraper.
    ///
    /// Only concrete plugins are dispatched to the hosted plugin transport.
    pub fn is_concrete(self) -> bool {
        !matches!(
            self,
            PluginId::None | PluginId::AutoPluginSelector | PluginId::WebScraper
        )
    }
}

/// Embeddings backend used for retrieval and web ingestion.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingsProvider {
    #[default]
    Openai,
    Local,
}

/// Per-chat model settings. Immutable for the duration of a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSettings {
    /// Model id, resolved against custom and built-in models at validation.
    pub model: String,
    /// System prompt written by the user or copied from an assistant.
    pub prompt: String,
    pub temperature: f32,
    /// Token budget for prompt plus history when no chunk size overrides it.
    pub context_length: usize,
    /// Whether the profile context is injected as "User Info".
    pub include_profile_context: bool,
    /// Whether workspace instructions are injected as "System Instructions".
    pub include_workspace_instructions: bool,
    /// Embeddings backend used for retrieval over attached files.
    #[serde(default)]
    pub embeddings_provider: EmbeddingsProvider,
}

/// A persona with its own default settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assistant {
    pub id: String,
    pub name: String,
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub context_length: usize,
    pub include_profile_context: bool,
    pub include_workspace_instructions: bool,
    #[serde(default)]
    pub embeddings_provider: EmbeddingsProvider,
}

/// A saved settings preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub context_length: usize,
    pub include_profile_context: bool,
    pub include_workspace_instructions: bool,
    #[serde(default)]
    pub embeddings_provider: EmbeddingsProvider,
}

impl From<&Assistant> for ChatSettings {
    fn from(a: &Assistant) -> Self {
        Self {
            model: a.model.clone(),
            prompt: a.prompt.clone(),
            temperature: a.temperature,
            context_length: a.context_length,
            include_profile_context: a.include_profile_context,
            include_workspace_instructions: a.include_workspace_instructions,
            embeddings_provider: a.embeddings_provider,
        }
    }
}

impl From<&Preset> for ChatSettings {
    fn from(p: &Preset) -> Self {
        Self {
            model: p.model.clone(),
            prompt: p.prompt.clone(),
            temperature: p.temperature,
            context_length: p.context_length,
            include_profile_context: p.include_profile_context,
            include_workspace_instructions: p.include_workspace_instructions,
            embeddings_provider: p.embeddings_provider,
        }
    }
}

/// The signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    /// Free text about the user, injected when the chat settings allow it.
    #[serde(default)]
    pub profile_context: Option<String>,
}

/// The workspace a chat belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    /// Instructions applied to every chat in the workspace.
    #[serde(default)]
    pub instructions: Option<String>,
}

/// A persisted (or temporary) chat message row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Row id. Temporary entries of an in-flight turn use a fresh UUID.
    pub id: String,
    /// Owning chat. Empty for temporary entries of a chat not yet created.
    pub chat_id: String,
    pub user_id: String,
    pub role: Role,
    /// Plain text; images travel separately in `image_paths`.
    pub content: String,
    /// Storage paths of attached images, resolved through the image cache.
    #[serde(default)]
    pub image_paths: Vec<String>,
    /// Monotonic per chat; drives ordering and edit truncation.
    pub sequence_number: i64,
    /// Model that produced (or was asked to answer) this message.
    pub model: String,
    /// Plugin the turn was routed to.
    #[serde(default)]
    pub plugin: PluginId,
    /// RFC 3339 creation time.
    #[serde(default)]
    pub created_at: String,
    /// RFC 3339 time of the last content update, if any.
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// A chunk of a retrieved or uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileItem {
    pub id: String,
    /// File this chunk was cut from.
    #[serde(default)]
    pub file_id: String,
    /// Chunk text, quoted verbatim between source markers.
    pub content: String,
    /// Token count reported by the retriever.
    #[serde(default)]
    pub tokens: usize,
}

/// A file row as stored by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    /// Display name.
    pub name: String,
    /// Coarse type, e.g. `"text"`, `"pdf"`, `"docx"`.
    #[serde(rename = "type")]
    pub file_type: String,
    #[serde(default)]
    pub description: String,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Good,
    Bad,
}

/// Feedback row for a single message; the latest one wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: String,
    /// Message the feedback is about.
    pub message_id: String,
    pub chat_id: String,
    pub user_id: String,
    /// Thumbs up or down.
    pub feedback: FeedbackKind,
    /// Short reason picked by the user.
    #[serde(default)]
    pub reason: Option<String>,
    /// Free-text explanation.
    #[serde(default)]
    pub detailed_feedback: Option<String>,
    /// Model of the rated message.
    pub model: String,
    /// Time of the first feedback on this message; kept across updates.
    pub created_at: String,
    pub updated_at: String,
    /// Sequence number of the rated message.
    pub sequence_number: i64,
    /// Whether the user may be contacted about this feedback.
    #[serde(default)]
    pub allow_email: Option<bool>,
    /// Whether the rated conversation may be shared for review.
    #[serde(default)]
    pub allow_sharing: Option<bool>,
    /// Whether the rated message carried retrieved file items.
    pub has_files: bool,
    /// Plugin of the rated message.
    pub plugin: PluginId,
}

/// Insert shape for [`Feedback`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackInsert {
    pub message_id: String,
    pub chat_id: String,
    pub user_id: String,
    pub feedback: FeedbackKind,
    pub reason: Option<String>,
    pub detailed_feedback: Option<String>,
    pub model: String,
    pub created_at: String,
    pub updated_at: String,
    pub sequence_number: i64,
    pub allow_email: Option<bool>,
    pub allow_sharing: Option<bool>,
    pub has_files: bool,
    pub plugin: PluginId,
}

/// A message as shown in the chat list: the row plus its retrieval context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub message: Message,
    /// File chunks retrieved for this message, shown as its sources.
    #[serde(default)]
    pub file_items: Vec<FileItem>,
    /// Latest feedback on the message.
    #[serde(default)]
    pub feedback: Option<Feedback>,
}

impl ChatMessage {
    pub fn new(message: Message) -> Self {
        Self {
            message,
            file_items: Vec::new(),
            feedback: None,
        }
    }
}

/// Highest sequence number in `messages`, or 0 when empty.
pub fn last_sequence_number(messages: &[ChatMessage]) -> i64 {
    messages
        .iter()
        .fold(0, |max, m| max.max(m.message.sequence_number))
}

/// An image attached to a message, cached by storage path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageImage {
    /// Persisted message the image belongs to; `None` until the turn commits.
    #[serde(default)]
    pub message_id: Option<String>,
    /// Storage path referenced from `Message::image_paths`.
    pub path: String,
    /// Data URI (`data:image/...;base64,...`).
    pub base64: String,
}

/// Request-scoped aggregate owned by exactly one in-flight send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPayload {
    /// Settings of this turn, model override applied.
    pub chat_settings: ChatSettings,
    #[serde(default)]
    pub workspace_instructions: String,
    /// Visible history including the turn's temporary entries.
    pub chat_messages: Vec<ChatMessage>,
    /// Persona whose name is injected into the system prompt.
    #[serde(default)]
    pub assistant: Option<Assistant>,
    /// Chunks retrieved for this turn, spliced around the user query.
    #[serde(default)]
    pub message_file_items: Vec<FileItem>,
}

/// One part of a multipart wire message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// Wire content: either plain text or an ordered list of parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Multipart(Vec<ContentPart>),
}

impl MessageContent {
    /// Text view of the content; text parts are joined with a single space.
    pub fn text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Multipart(parts) => parts
                .iter()
                .map(|p| match p {
                    ContentPart::Text { text } => text.as_str(),
                    ContentPart::ImageUrl { .. } => "",
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// True when there is no non-whitespace text and no image part.
    pub fn is_blank(&self) -> bool {
        match self {
            MessageContent::Text(text) => text.trim().is_empty(),
            MessageContent::Multipart(parts) => parts.iter().all(|p| match p {
                ContentPart::Text { text } => text.trim().is_empty(),
                ContentPart::ImageUrl { .. } => false,
            }),
        }
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        MessageContent::Text(text)
    }
}

/// Wire-format message sent to the model. Built fresh each turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

/// A conversation row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    pub workspace_id: String,
    pub user_id: String,
    /// Assistant the chat was started with. A chat without one sends no persona.
    #[serde(default)]
    pub assistant_id: Option<String>,
    /// First characters of the opening message.
    pub name: String,
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub context_length: usize,
    pub include_profile_context: bool,
    pub include_workspace_instructions: bool,
    #[serde(default)]
    pub embeddings_provider: EmbeddingsProvider,
    /// Finish reason of the latest turn (`"stop"`, `"aborted"`, ...).
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub created_at: String,
    /// Time of the latest completed turn; `None` until a second turn.
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Insert shape for [`Chat`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewChat {
    pub workspace_id: String,
    pub user_id: String,
    pub assistant_id: Option<String>,
    pub name: String,
    pub settings: ChatSettings,
    pub finish_reason: Option<String>,
}

/// Columns rewritten on a chat after each completed turn.
///
/// Both values are written as given, so a patch built from a chat's
/// previous row restores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPatch {
    /// New value of `Chat::updated_at`.
    pub updated_at: Option<String>,
    /// New value of `Chat::finish_reason`.
    pub finish_reason: Option<String>,
}

/// Insert shape for [`Message`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageInsert {
    pub chat_id: String,
    pub user_id: String,
    pub role: Role,
    pub content: String,
    pub model: String,
    pub plugin: PluginId,
    pub image_paths: Vec<String>,
    pub sequence_number: i64,
}

/// Answer of the web ingestion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionResponse {
    pub message: String,
    #[serde(default)]
    pub file_id: Option<String>,
}

impl IngestionResponse {
    /// The only success sentinel the ingestion endpoint emits.
    pub const SUCCESS: &'static str = "Embed Successful";

    pub fn is_success(&self) -> bool {
        self.message == Self::SUCCESS
    }
}

/// A file converted to text by the extraction endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFile {
    pub file_name: String,
    pub file_content: String,
}

/// Body sent to a hosted chat transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostedChatRequest {
    pub chat_settings: ChatSettings,
    /// Final wire messages, system prompt first.
    pub messages: Vec<BuiltChatMessage>,
    pub is_regeneration: bool,
    pub is_continuation: bool,
    /// True when retrieval returned at least one chunk for this turn.
    pub use_rag: bool,
}

/// One increment of a streamed response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamChunk {
    /// Text appended to the reply; `None` for metadata-only chunks.
    pub text: Option<String>,
    /// Set once the backend reports why the reply ended.
    pub finish_reason: Option<String>,
}

/// Final result of a streamed response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportOutcome {
    pub full_text: String,
    pub finish_reason: String,
}
