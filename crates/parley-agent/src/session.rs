// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat session: turn lifecycle from validation to persistence.
//!
//! A turn runs `Idle -> Validating -> (WebPreprocessing) -> Dispatched ->
//! Streaming -> Finalizing -> Idle`. `Aborting` is entered when a stop
//! request cancels the stream. Any failure passes through `Error`, restores
//! the message list captured before the turn, and returns to `Idle`.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use parley_config::model::SessionConfig;
use parley_context::{
    ContextEngine, ensure_assistant_messages_not_empty, filter_empty_assistant_messages,
};
use parley_core::error::ParleyError;
use parley_core::models::{builtin_models, find_model};
use parley_core::traits::{
    ChatStream, ChatTransport, FileExtractor, Persistence, PluginDetector, Retriever,
    WebIngestion,
};
use parley_core::types::{
    Chat, ChatMessage, ChatPatch, ChatPayload, ChatSettings, Feedback, FileItem, FileRecord,
    HostedChatRequest, Message, MessageImage, MessageInsert, NewChat, PluginId, Profile, Role,
    Workspace,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::context::{ComposerState, SessionContext};
use crate::events::{EventSink, SessionEvent};
use crate::feedback::{FeedbackRequest, build_feedback_insert};
use crate::routing::{detect_plugin, fetch_file_context};
use crate::stop::{StopHandle, TurnControl};
use crate::turn::{Draft, TurnKind, TurnRequest, apply_delta, splice_history};
use crate::validation::{TurnInput, validate_chat_settings};
use crate::web::{extract_urls, ingest_urls};

/// Finish reason recorded when a stop request ends the stream.
pub const ABORTED_FINISH_REASON: &str = "aborted";

/// Turn lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Validating,
    WebPreprocessing,
    Dispatched,
    Streaming,
    Aborting,
    Finalizing,
    Error,
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnState::Idle => write!(f, "idle"),
            TurnState::Validating => write!(f, "validating"),
            TurnState::WebPreprocessing => write!(f, "web_preprocessing"),
            TurnState::Dispatched => write!(f, "dispatched"),
            TurnState::Streaming => write!(f, "streaming"),
            TurnState::Aborting => write!(f, "aborting"),
            TurnState::Finalizing => write!(f, "finalizing"),
            TurnState::Error => write!(f, "error"),
        }
    }
}

/// External systems a session talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub persistence: Arc<dyn Persistence>,
    pub transport: Arc<dyn ChatTransport>,
    pub ingestion: Arc<dyn WebIngestion>,
    pub detector: Arc<dyn PluginDetector>,
    pub extractor: Arc<dyn FileExtractor>,
    pub retriever: Arc<dyn Retriever>,
}

/// Result of a completed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Text produced by this turn (for continuations, only the extension).
    pub full_text: String,
    pub finish_reason: String,
    /// Plugin the turn was routed to after detection.
    pub plugin: PluginId,
    pub aborted: bool,
    pub warnings: Vec<String>,
}

/// Streamed reply before persistence.
struct Reply {
    full_text: String,
    finish_reason: String,
    aborted: bool,
}

/// Turn-scoped values resolved during validation.
struct Prepared {
    content: Option<String>,
    model_id: String,
    settings: ChatSettings,
    profile: Profile,
    workspace: Workspace,
}

/// Rows written by a successful finalization.
struct Committed {
    chat: Chat,
    created: bool,
    rows: CommittedRows,
}

enum CommittedRows {
    Pair(Message, Message),
    Updated(Message),
}

/// A finalization write that a later failing write has to reverse.
#[derive(Debug)]
enum Undo {
    DeleteChat(String),
    RestoreChat(String, ChatPatch),
    UnlinkFiles(String, Vec<String>),
}

/// Session state a failed turn puts back.
struct Snapshot {
    chat_messages: Vec<ChatMessage>,
    chats: Vec<Chat>,
    selected_chat: Option<Chat>,
    chat_images: Vec<MessageImage>,
}

impl Snapshot {
    fn take(ctx: &SessionContext) -> Self {
        Self {
            chat_messages: ctx.chat_messages.clone(),
            chats: ctx.chats.clone(),
            selected_chat: ctx.selected_chat.clone(),
            chat_images: ctx.chat_images.clone(),
        }
    }

    fn restore(self, ctx: &mut SessionContext) {
        ctx.chat_messages = self.chat_messages;
        ctx.chats = self.chats;
        ctx.selected_chat = self.selected_chat;
        ctx.chat_images = self.chat_images;
    }
}

/// Owns the conversation state of one chat view and runs its turns.
///
/// At most one turn runs at a time: [`ChatSession::send`] takes `&mut self`.
/// Use [`ChatSession::stop_handle`] to stop a turn from another task.
pub struct ChatSession {
    session_id: String,
    state: TurnState,
    ctx: SessionContext,
    composer: ComposerState,
    collaborators: Collaborators,
    engine: Arc<ContextEngine>,
    config: SessionConfig,
    control: TurnControl,
    events: EventSink,
}

impl ChatSession {
    pub fn new(
        ctx: SessionContext,
        collaborators: Collaborators,
        engine: Arc<ContextEngine>,
        config: SessionConfig,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, rx) = EventSink::channel();
        let control = TurnControl::new(Duration::from_millis(config.stop_grace_ms));
        let session = Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            state: TurnState::Idle,
            ctx,
            composer: ComposerState::default(),
            collaborators,
            engine,
            config,
            control,
            events,
        };
        (session, rx)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut SessionContext {
        &mut self.ctx
    }

    pub fn composer(&self) -> &ComposerState {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut ComposerState {
        &mut self.composer
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.ctx.chat_messages
    }

    pub fn is_generating(&self) -> bool {
        self.control.is_generating()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.control.handle()
    }

    /// Stops the in-flight turn, if any. See [`StopHandle::stop`].
    pub async fn stop(&self) {
        self.control.handle().stop().await;
    }

    /// Runs one turn.
    ///
    /// On failure the message list, chat list, selected chat, and image cache
    /// are restored to their state before the call, writes already made are
    /// undone, an [`SessionEvent::Error`] is published, and the error is
    /// returned.
    pub async fn send(&mut self, request: TurnRequest) -> Result<TurnOutcome, ParleyError> {
        let snapshot = Snapshot::take(&self.ctx);
        if request.kind != TurnKind::Regenerate {
            self.composer.user_input.clear();
        }
        self.composer.is_prompt_picker_open = false;
        self.composer.is_at_picker_open = false;

        let token = self.control.begin().await;
        self.events.emit(SessionEvent::GeneratingChanged(true));

        let result = self.run_turn(&request, &token).await;

        if let Err(ref e) = result {
            self.transition(TurnState::Error);
            warn!(
                session_id = %self.session_id,
                error = %e,
                "turn failed, restoring message list"
            );
            snapshot.restore(&mut self.ctx);
            self.set_tool("none");
            self.events
                .emit(SessionEvent::MessagesReplaced(self.ctx.chat_messages.clone()));
            self.events.emit(SessionEvent::Error(e.to_string()));
        }

        self.control.finish().await;
        self.events.emit(SessionEvent::GeneratingChanged(false));
        self.transition(TurnState::Idle);

        if let Ok(ref outcome) = result {
            info!(
                session_id = %self.session_id,
                plugin = %outcome.plugin,
                finish_reason = %outcome.finish_reason,
                chars = outcome.full_text.len(),
                "turn completed"
            );
        }
        result
    }

    async fn run_turn(
        &mut self,
        request: &TurnRequest,
        token: &CancellationToken,
    ) -> Result<TurnOutcome, ParleyError> {
        self.transition(TurnState::Validating);
        let prepared = self.prepare(request)?;
        let is_continuation = request.is_continuation();
        let mut warnings = Vec::new();

        // Files gained here are committed only when the turn succeeds.
        let mut new_files = self.ctx.new_message_files.clone();
        if !is_continuation
            && self.ctx.selected_plugin != PluginId::WebScraper
            && let Some(text) = prepared.content.as_deref()
        {
            let urls = extract_urls(text);
            if !urls.is_empty() {
                self.transition(TurnState::WebPreprocessing);
                let report = ingest_urls(
                    self.collaborators.ingestion.as_ref(),
                    self.collaborators.persistence.as_ref(),
                    &prepared.workspace.id,
                    &urls,
                    &new_files,
                    &self.ctx.chat_files,
                )
                .await;
                for warning in report.warnings {
                    self.warn_user(&mut warnings, warning);
                }
                new_files.extend(report.added);
            }
        }

        let images = self.ctx.new_message_images.clone();
        let chat_id = self
            .ctx
            .selected_chat
            .as_ref()
            .map(|c| c.id.clone())
            .unwrap_or_default();
        let draft = Draft {
            chat_id: &chat_id,
            user_id: &prepared.profile.user_id,
            content: prepared.content.as_deref().unwrap_or_default(),
            model: &prepared.model_id,
            plugin: self.ctx.selected_plugin,
            image_paths: images.iter().map(|i| i.base64.clone()).collect(),
        };
        self.ctx.chat_messages = splice_history(&self.ctx.chat_messages, request.kind, &draft)?;
        self.transition(TurnState::Dispatched);
        self.events
            .emit(SessionEvent::MessagesReplaced(self.ctx.chat_messages.clone()));

        let retrieved = self
            .retrieve(&prepared, &new_files, is_continuation)
            .await?;

        let payload = ChatPayload {
            chat_settings: prepared.settings.clone(),
            workspace_instructions: prepared.workspace.instructions.clone().unwrap_or_default(),
            chat_messages: self.ctx.chat_messages.clone(),
            assistant: match &self.ctx.selected_chat {
                Some(chat) if chat.assistant_id.is_none() => None,
                _ => self.ctx.selected_assistant.clone(),
            },
            message_file_items: retrieved.clone(),
        };

        let selected = self.ctx.selected_plugin;
        let plugin = if !is_continuation && selected == PluginId::AutoPluginSelector {
            detect_plugin(self.collaborators.detector.as_ref(), &payload, selected).await
        } else {
            selected
        };

        let mut messages = self.engine.build_final_messages(
            &payload,
            &prepared.profile,
            &self.ctx.chat_images,
            plugin,
        )?;

        let stream = if plugin.is_concrete() {
            let (file_data, warning) = fetch_file_context(
                self.collaborators.extractor.as_ref(),
                plugin,
                prepared.content.as_deref(),
                &new_files,
            )
            .await;
            if let Some(warning) = warning {
                self.warn_user(&mut warnings, warning);
            }
            ensure_assistant_messages_not_empty(&mut messages);
            let body = self.hosted_request(&prepared, messages, request.kind, !retrieved.is_empty());
            debug!(session_id = %self.session_id, plugin = %plugin, "dispatching to plugin chat");
            open_stream(
                token,
                self.collaborators
                    .transport
                    .stream_plugin_chat(body, plugin, file_data),
            )
            .await?
        } else {
            filter_empty_assistant_messages(&mut messages);
            let body = self.hosted_request(&prepared, messages, request.kind, !retrieved.is_empty());
            debug!(session_id = %self.session_id, "dispatching to hosted chat");
            open_stream(token, self.collaborators.transport.stream_chat(body)).await?
        };

        let reply = self.stream_reply(stream, token).await?;

        self.transition(TurnState::Finalizing);
        let mut written = Vec::new();
        let committed = match self
            .persist_turn(
                &mut written,
                request.kind,
                &prepared,
                &new_files,
                plugin,
                &images,
                &reply.finish_reason,
            )
            .await
        {
            Ok(committed) => committed,
            Err(e) => {
                self.undo_writes(written).await;
                return Err(e);
            }
        };
        self.apply_commit(committed, request.kind, &retrieved, &images);

        for file in new_files {
            if !self.ctx.chat_files.iter().any(|f| f.id == file.id) {
                self.ctx.chat_files.push(file);
            }
        }
        self.ctx.new_message_files.clear();
        self.ctx.new_message_images.clear();
        self.set_tool("none");
        self.events
            .emit(SessionEvent::MessagesReplaced(self.ctx.chat_messages.clone()));

        Ok(TurnOutcome {
            full_text: reply.full_text,
            finish_reason: reply.finish_reason,
            plugin,
            aborted: reply.aborted,
            warnings,
        })
    }

    /// Resolves the turn's content and model and validates them.
    fn prepare(&self, request: &TurnRequest) -> Result<Prepared, ParleyError> {
        let content = match request.kind {
            TurnKind::Regenerate => request.content.clone().or_else(|| {
                self.ctx
                    .chat_messages
                    .iter()
                    .rev()
                    .find(|m| m.message.role == Role::User)
                    .map(|m| m.message.content.clone())
            }),
            _ => request.content.clone(),
        };

        let model_id = request
            .model
            .clone()
            .unwrap_or_else(|| self.ctx.chat_settings.model.clone());
        let mut settings = self.ctx.chat_settings.clone();
        settings.model = model_id.clone();

        let builtin = builtin_models();
        let model = find_model(&model_id, &self.ctx.custom_models, &builtin, &[]);
        validate_chat_settings(
            &settings,
            model,
            self.ctx.profile.as_ref(),
            self.ctx.workspace.as_ref(),
            TurnInput {
                content: content.as_deref(),
                is_continuation: request.is_continuation(),
                has_images: !self.ctx.new_message_images.is_empty(),
            },
        )?;

        if matches!(request.kind, TurnKind::Edit { .. }) && self.ctx.selected_chat.is_none() {
            return Err(ParleyError::Validation(
                "only messages of a saved chat can be edited".into(),
            ));
        }

        let profile = self
            .ctx
            .profile
            .clone()
            .ok_or_else(|| ParleyError::Internal("profile vanished after validation".into()))?;
        let workspace = self
            .ctx
            .workspace
            .clone()
            .ok_or_else(|| ParleyError::Internal("workspace vanished after validation".into()))?;

        Ok(Prepared {
            content,
            model_id,
            settings,
            profile,
            workspace,
        })
    }

    async fn retrieve(
        &mut self,
        prepared: &Prepared,
        new_files: &[FileRecord],
        is_continuation: bool,
    ) -> Result<Vec<FileItem>, ParleyError> {
        let has_files = !new_files.is_empty() || !self.ctx.chat_files.is_empty();
        if !has_files || !self.ctx.use_retrieval || !self.config.use_retrieval || is_continuation {
            return Ok(Vec::new());
        }

        self.set_tool("retrieval");
        let file_ids: Vec<String> = new_files
            .iter()
            .chain(&self.ctx.chat_files)
            .map(|f| f.id.clone())
            .collect();
        let items = self
            .collaborators
            .retriever
            .retrieve(
                prepared.content.as_deref().unwrap_or_default(),
                &file_ids,
                prepared.settings.embeddings_provider,
                self.config.source_count,
            )
            .await?;
        debug!(
            session_id = %self.session_id,
            files = file_ids.len(),
            items = items.len(),
            "retrieval completed"
        );
        Ok(items)
    }

    fn hosted_request(
        &self,
        prepared: &Prepared,
        messages: Vec<parley_core::types::BuiltChatMessage>,
        kind: TurnKind,
        use_rag: bool,
    ) -> HostedChatRequest {
        HostedChatRequest {
            chat_settings: prepared.settings.clone(),
            messages,
            is_regeneration: kind == TurnKind::Regenerate,
            is_continuation: kind == TurnKind::Continue,
            use_rag,
        }
    }

    /// Forwards stream increments into the receiving assistant message until
    /// the stream ends or the turn is cancelled.
    async fn stream_reply(
        &mut self,
        mut stream: ChatStream,
        token: &CancellationToken,
    ) -> Result<Reply, ParleyError> {
        self.transition(TurnState::Streaming);
        let mut full_text = String::new();
        let mut finish_reason = None;
        let mut first_token = false;
        let mut aborted = false;

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    self.transition(TurnState::Aborting);
                    aborted = true;
                    break;
                }
                next = stream.next() => match next {
                    Some(Ok(chunk)) => {
                        if let Some(text) = chunk.text
                            && !text.is_empty()
                        {
                            if !first_token {
                                first_token = true;
                                self.events.emit(SessionEvent::FirstTokenReceived);
                            }
                            apply_delta(&mut self.ctx.chat_messages, &text);
                            full_text.push_str(&text);
                            self.events.emit(SessionEvent::TextDelta(text));
                        }
                        if chunk.finish_reason.is_some() {
                            finish_reason = chunk.finish_reason;
                        }
                    }
                    Some(Err(e)) => return Err(e),
                    None => break,
                },
            }
        }
        drop(stream);

        let finish_reason = if aborted {
            ABORTED_FINISH_REASON.to_string()
        } else {
            finish_reason.unwrap_or_else(|| "stop".to_string())
        };
        debug!(
            session_id = %self.session_id,
            aborted,
            finish_reason = %finish_reason,
            "stream ended"
        );
        Ok(Reply {
            full_text,
            finish_reason,
            aborted,
        })
    }

    /// Writes the finished turn.
    ///
    /// The chat row and file links go first, the message write last. Each
    /// completed write is recorded in `written` so a later failure can be
    /// undone. Session state is left untouched.
    #[allow(clippy::too_many_arguments)]
    async fn persist_turn(
        &self,
        written: &mut Vec<Undo>,
        kind: TurnKind,
        prepared: &Prepared,
        new_files: &[FileRecord],
        plugin: PluginId,
        images: &[MessageImage],
        finish_reason: &str,
    ) -> Result<Committed, ParleyError> {
        let persistence = self.collaborators.persistence.as_ref();
        let user_id = &prepared.profile.user_id;
        let file_ids: Vec<String> = new_files
            .iter()
            .filter(|f| !self.ctx.chat_files.iter().any(|c| c.id == f.id))
            .map(|f| f.id.clone())
            .collect();

        let (chat, created) = match &self.ctx.selected_chat {
            None => {
                let name: String = prepared
                    .content
                    .as_deref()
                    .unwrap_or_default()
                    .chars()
                    .take(self.config.title_max_chars)
                    .collect();
                let chat = persistence
                    .create_chat(NewChat {
                        workspace_id: prepared.workspace.id.clone(),
                        user_id: user_id.clone(),
                        assistant_id: self.ctx.selected_assistant.as_ref().map(|a| a.id.clone()),
                        name,
                        settings: prepared.settings.clone(),
                        finish_reason: Some(finish_reason.to_string()),
                    })
                    .await?;
                written.push(Undo::DeleteChat(chat.id.clone()));
                (chat, true)
            }
            Some(current) => {
                let chat = persistence
                    .update_chat(
                        &current.id,
                        ChatPatch {
                            updated_at: Some(chrono::Utc::now().to_rfc3339()),
                            finish_reason: Some(finish_reason.to_string()),
                        },
                    )
                    .await?;
                written.push(Undo::RestoreChat(
                    current.id.clone(),
                    ChatPatch {
                        updated_at: current.updated_at.clone(),
                        finish_reason: current.finish_reason.clone(),
                    },
                ));
                (chat, false)
            }
        };

        if !file_ids.is_empty() {
            persistence
                .create_chat_files(&chat.id, user_id, &file_ids)
                .await?;
            written.push(Undo::UnlinkFiles(chat.id.clone(), file_ids));
        }

        let rows = match kind {
            TurnKind::Send | TurnKind::Edit { .. } => {
                let [.., user_temp, assistant_temp] = self.ctx.chat_messages.as_slice() else {
                    return Err(ParleyError::Internal(
                        "temporary turn messages missing at finalization".into(),
                    ));
                };
                let insert = |temp: &ChatMessage, image_paths: Vec<String>| MessageInsert {
                    chat_id: chat.id.clone(),
                    user_id: user_id.clone(),
                    role: temp.message.role,
                    content: temp.message.content.clone(),
                    model: prepared.model_id.clone(),
                    plugin,
                    image_paths,
                    sequence_number: temp.message.sequence_number,
                };
                let inserts = vec![
                    insert(user_temp, images.iter().map(|i| i.path.clone()).collect()),
                    insert(assistant_temp, Vec::new()),
                ];

                let rows = match kind {
                    TurnKind::Edit { sequence_number } => {
                        persistence
                            .replace_messages_from(&chat.id, sequence_number, inserts)
                            .await?
                    }
                    _ => persistence.create_messages(inserts).await?,
                };
                let Ok([user_row, assistant_row]) = <[_; 2]>::try_from(rows) else {
                    return Err(ParleyError::persistence(
                        "expected two rows for the turn's message pair",
                    ));
                };
                CommittedRows::Pair(user_row, assistant_row)
            }
            TurnKind::Regenerate | TurnKind::Continue => {
                let Some(last) = self.ctx.chat_messages.last() else {
                    return Err(ParleyError::Internal(
                        "assistant message missing at finalization".into(),
                    ));
                };
                let row = persistence
                    .update_message_content(&last.message.id, &last.message.content)
                    .await?;
                CommittedRows::Updated(row)
            }
        };

        if created {
            info!(session_id = %self.session_id, chat_id = %chat.id, "chat created");
        }
        Ok(Committed { chat, created, rows })
    }

    /// Reverses the writes of a failed finalization, newest first.
    async fn undo_writes(&self, written: Vec<Undo>) {
        let persistence = self.collaborators.persistence.as_ref();
        for step in written.into_iter().rev() {
            let result = match &step {
                Undo::DeleteChat(chat_id) => persistence.delete_chat(chat_id).await,
                Undo::RestoreChat(chat_id, patch) => persistence
                    .update_chat(chat_id, patch.clone())
                    .await
                    .map(|_| ()),
                Undo::UnlinkFiles(chat_id, file_ids) => {
                    persistence.delete_chat_files(chat_id, file_ids).await
                }
            };
            match result {
                Ok(()) => {
                    debug!(session_id = %self.session_id, ?step, "finalization write undone")
                }
                Err(e) => warn!(
                    session_id = %self.session_id,
                    ?step,
                    error = %e,
                    "failed to undo finalization write"
                ),
            }
        }
    }

    /// Swaps the temporary entries for the stored rows and records the chat
    /// in the session.
    fn apply_commit(
        &mut self,
        committed: Committed,
        kind: TurnKind,
        retrieved: &[FileItem],
        images: &[MessageImage],
    ) {
        let Committed { chat, created, rows } = committed;
        if created {
            self.ctx.chats.insert(0, chat.clone());
        } else {
            for existing in self.ctx.chats.iter_mut().filter(|c| c.id == chat.id) {
                *existing = chat.clone();
            }
        }
        if self
            .ctx
            .selected_chat
            .as_ref()
            .is_none_or(|selected| selected.id == chat.id)
        {
            self.ctx.selected_chat = Some(chat);
        }

        match rows {
            CommittedRows::Pair(user_row, assistant_row) => {
                self.ctx.chat_images.extend(images.iter().map(|image| MessageImage {
                    message_id: Some(user_row.id.clone()),
                    ..image.clone()
                }));

                let len = self.ctx.chat_messages.len();
                self.ctx.chat_messages.truncate(len.saturating_sub(2));
                self.ctx.chat_messages.push(ChatMessage {
                    message: user_row,
                    file_items: retrieved.to_vec(),
                    feedback: None,
                });
                self.ctx.chat_messages.push(ChatMessage::new(assistant_row));
            }
            CommittedRows::Updated(row) => {
                if let Some(last) = self.ctx.chat_messages.last_mut() {
                    last.message = row;
                    if kind == TurnKind::Regenerate {
                        last.feedback = None;
                    }
                }
            }
        }
    }

    /// Starts a fresh chat.
    ///
    /// Settings are re-seeded from the selected assistant, else the selected
    /// preset, else left as they are.
    pub async fn new_chat(&mut self) {
        self.stop().await;

        self.composer = ComposerState::default();
        self.ctx.chat_messages.clear();
        self.ctx.selected_chat = None;
        self.ctx.chat_files.clear();
        self.ctx.chat_images.clear();
        self.ctx.new_message_files.clear();
        self.ctx.new_message_images.clear();
        self.ctx.use_retrieval = false;
        self.set_tool("none");

        if let Some(assistant) = &self.ctx.selected_assistant {
            self.ctx.chat_settings = ChatSettings::from(assistant);
        } else if let Some(preset) = &self.ctx.selected_preset {
            self.ctx.chat_settings = ChatSettings::from(preset);
        }

        debug!(session_id = %self.session_id, model = %self.ctx.chat_settings.model, "new chat");
        self.events.emit(SessionEvent::MessagesReplaced(Vec::new()));
    }

    /// Loads an existing chat with its messages and linked files.
    pub async fn select_chat(
        &mut self,
        chat: Chat,
        messages: Vec<ChatMessage>,
        chat_files: Vec<FileRecord>,
    ) {
        self.stop().await;

        self.ctx.chat_settings = ChatSettings {
            model: chat.model.clone(),
            prompt: chat.prompt.clone(),
            temperature: chat.temperature,
            context_length: chat.context_length,
            include_profile_context: chat.include_profile_context,
            include_workspace_instructions: chat.include_workspace_instructions,
            embeddings_provider: chat.embeddings_provider,
        };
        debug!(
            session_id = %self.session_id,
            chat_id = %chat.id,
            messages = messages.len(),
            "chat selected"
        );
        self.ctx.selected_chat = Some(chat);
        self.ctx.chat_messages = messages;
        self.ctx.chat_files = chat_files;
        self.ctx.new_message_files.clear();
        self.ctx.new_message_images.clear();
        self.events
            .emit(SessionEvent::MessagesReplaced(self.ctx.chat_messages.clone()));
    }

    /// Records feedback on a message; the returned row replaces any previous one.
    pub async fn send_feedback(
        &mut self,
        request: FeedbackRequest,
    ) -> Result<Feedback, ParleyError> {
        let target = self
            .ctx
            .chat_messages
            .iter()
            .find(|m| m.message.id == request.message_id)
            .ok_or_else(|| {
                ParleyError::Validation(format!("message `{}` not found", request.message_id))
            })?;
        let insert = build_feedback_insert(target, &request, &chrono::Utc::now().to_rfc3339());

        let rows = self
            .collaborators
            .persistence
            .create_message_feedback(insert)
            .await?;
        let feedback = rows
            .into_iter()
            .next()
            .ok_or_else(|| ParleyError::persistence("feedback insert returned no rows"))?;

        for message in self
            .ctx
            .chat_messages
            .iter_mut()
            .filter(|m| m.message.id == request.message_id)
        {
            message.feedback = Some(feedback.clone());
        }
        debug!(
            session_id = %self.session_id,
            message_id = %request.message_id,
            feedback = %feedback.feedback,
            "feedback recorded"
        );
        self.events
            .emit(SessionEvent::MessagesReplaced(self.ctx.chat_messages.clone()));
        Ok(feedback)
    }

    fn transition(&mut self, next: TurnState) {
        if self.state == next {
            return;
        }
        debug!(
            session_id = %self.session_id,
            from = %self.state,
            to = %next,
            "turn state transition"
        );
        self.state = next;
        self.events.emit(SessionEvent::StateChanged(next));
    }

    fn set_tool(&mut self, tool: &str) {
        if self.ctx.tool_in_use != tool {
            self.ctx.tool_in_use = tool.to_string();
            self.events.emit(SessionEvent::ToolInUse(tool.to_string()));
        }
    }

    fn warn_user(&self, warnings: &mut Vec<String>, warning: String) {
        self.events.emit(SessionEvent::Warning(warning.clone()));
        warnings.push(warning);
    }
}

/// Awaits a transport call unless the turn is cancelled first.
async fn open_stream(
    token: &CancellationToken,
    opening: impl std::future::Future<Output = Result<ChatStream, ParleyError>>,
) -> Result<ChatStream, ParleyError> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ParleyError::Cancelled),
        opened = opening => opened,
    }
}
