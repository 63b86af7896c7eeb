// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token budgeter: token counting and per-model chunk sizes.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use parley_config::model::ContextConfig;
use parley_core::types::{ChatSettings, PluginId};
use tiktoken_rs::CoreBPE;
use tracing::warn;

/// Counts tokens for a piece of text.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

static CL100K: LazyLock<Option<CoreBPE>> = LazyLock::new(|| match tiktoken_rs::cl100k_base() {
    Ok(bpe) => Some(bpe),
    Err(e) => {
        warn!(error = %e, "failed to load cl100k_base tables, using chars/4 estimate");
        None
    }
});

/// `cl100k_base` tokenizer shared by the GPT-4 and GPT-3.5 families.
///
/// Falls back to a chars/4 estimate when the BPE tables cannot be loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cl100kCounter;

impl TokenCounter for Cl100kCounter {
    fn count(&self, text: &str) -> usize {
        match CL100K.as_ref() {
            Some(bpe) => bpe.encode_ordinary(text).len(),
            None => text.len().div_ceil(4),
        }
    }
}

/// Resolves the token ceiling applied to prompt + history.
#[derive(Debug, Clone)]
pub struct ChunkSizer {
    plugin_chunk_size: usize,
    model_chunk_sizes: BTreeMap<String, usize>,
}

impl ChunkSizer {
    pub fn new(config: &ContextConfig) -> Self {
        Self {
            plugin_chunk_size: config.plugin_chunk_size,
            model_chunk_sizes: config.model_chunk_sizes.clone(),
        }
    }

    /// Any active plugin (the auto selector included) forces the plugin
    /// ceiling; otherwise a per-model override applies, else the chat's
    /// context length.
    pub fn chunk_size(&self, settings: &ChatSettings, plugin: PluginId) -> usize {
        if plugin != PluginId::None {
            return self.plugin_chunk_size;
        }
        self.model_chunk_sizes
            .get(&settings.model)
            .copied()
            .unwrap_or(settings.context_length)
    }
}
