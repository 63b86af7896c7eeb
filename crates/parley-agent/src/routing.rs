// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin selection and plugin file context.

use std::str::FromStr;
use std::sync::LazyLock;

use parley_core::traits::{FileExtractor, PluginDetector};
use parley_core::types::{ChatPayload, ExtractedFile, FileRecord, PluginId};
use regex::Regex;
use tracing::{debug, warn};

/// Plugins that receive the text of attached files.
pub const FILE_CONTEXT_PLUGINS: [PluginId; 6] = [
    PluginId::Nuclei,
    PluginId::Naabu,
    PluginId::Alterx,
    PluginId::Dnsx,
    PluginId::Httpx,
    PluginId::Katana,
];

static FILE_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/(nuclei|naabu|alterx|dnsx|httpx|katana)(?:\s+(?:-[a-z]+|\S+))*$")
        .expect("static command pattern")
});

/// True when `message` is a slash command for one of the file-context plugins.
pub fn is_file_command(message: &str) -> bool {
    if !message.starts_with('/') {
        return false;
    }
    FILE_COMMAND.is_match(&message.trim().to_lowercase())
}

/// Asks the detector which plugin should handle `payload`.
///
/// The literal `"None"`, an empty answer, an unknown plugin name, or a
/// detector failure all keep `selected`.
pub async fn detect_plugin(
    detector: &dyn PluginDetector,
    payload: &ChatPayload,
    selected: PluginId,
) -> PluginId {
    match detector.detect(payload, selected).await {
        Ok(answer) if answer.is_empty() || answer == "None" => {
            debug!(plugin = %selected, "detector kept selected plugin");
            selected
        }
        Ok(answer) => match PluginId::from_str(&answer) {
            Ok(plugin) => {
                debug!(plugin = %plugin, "detector chose plugin");
                plugin
            }
            Err(_) => {
                warn!(answer = %answer, "detector returned unknown plugin");
                selected
            }
        },
        Err(e) => {
            warn!(error = %e, "plugin detection failed");
            selected
        }
    }
}

/// Extracts text from the composing message's text files for `plugin`.
///
/// Only runs when there is message content, the first attached file is
/// text-typed, and the plugin is in [`FILE_CONTEXT_PLUGINS`] or the message
/// is a file command. A failed extraction yields no files and a warning.
pub async fn fetch_file_context(
    extractor: &dyn FileExtractor,
    plugin: PluginId,
    content: Option<&str>,
    new_files: &[FileRecord],
) -> (Vec<ExtractedFile>, Option<String>) {
    let Some(content) = content else {
        return (Vec::new(), None);
    };
    let first_is_text = new_files.first().is_some_and(|f| f.file_type == "text");
    if !first_is_text || !(FILE_CONTEXT_PLUGINS.contains(&plugin) || is_file_command(content)) {
        return (Vec::new(), None);
    }

    let file_ids: Vec<String> = new_files
        .iter()
        .filter(|f| f.file_type == "text")
        .map(|f| f.id.clone())
        .collect();

    match extractor.extract(&file_ids).await {
        Ok(files) => {
            debug!(plugin = %plugin, count = files.len(), "plugin file context extracted");
            (files, None)
        }
        Err(e) => {
            warn!(plugin = %plugin, error = %e, "plugin file extraction failed");
            (Vec::new(), Some(e.to_string()))
        }
    }
}
