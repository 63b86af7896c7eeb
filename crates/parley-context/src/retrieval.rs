// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrieval text formatting for prompt injection.

use parley_core::types::FileItem;

pub const BEGIN_SOURCE: &str = "<BEGIN SOURCE>";
pub const END_SOURCE: &str = "<END SOURCE>";

/// Wraps each fragment in source delimiters, joined by a blank line.
///
/// Order is preserved; an empty slice yields an empty string.
pub fn build_retrieval_text(file_items: &[FileItem]) -> String {
    file_items
        .iter()
        .map(|item| format!("{BEGIN_SOURCE}\n{}\n{END_SOURCE}", item.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Instruction block wrapping the current query with its retrieved sources.
pub fn retrieval_instructions(query: &str, retrieval_text: &str) -> String {
    format!(
        "Assist with the user's query: '{query}' using uploaded files.\n\
         Each {BEGIN_SOURCE}...{END_SOURCE} section represents part of the overall file.\n\
         Assess each section for information pertinent to the query.\n\
         \n\
         {retrieval_text}\n\
         \n\
         Draw insights directly from file content to provide specific guidance.\n\
         Ensure answers are actionable, focusing on practical relevance.\n\
         Highlight or address any ambiguities found in the content.\n\
         State clearly if information related to the query is not available."
    )
}

/// Inline form used for past messages that carried their own file items.
pub fn inline_query_with_sources(query: &str, retrieval_text: &str) -> String {
    format!("User Query: \"{query}\"\n\nFile Content:\n{retrieval_text}")
}
