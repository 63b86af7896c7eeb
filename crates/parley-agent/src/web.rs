// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! URL ingestion run before a turn is dispatched.

use std::sync::LazyLock;

use parley_core::traits::{Persistence, WebIngestion};
use parley_core::types::{EmbeddingsProvider, FileRecord};
use regex::Regex;
use tracing::{debug, warn};

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s]+").expect("static url pattern"));

/// Every `http(s)://` run up to the next whitespace, in order of appearance.
pub fn extract_urls(text: &str) -> Vec<&str> {
    URL_PATTERN.find_iter(text).map(|m| m.as_str()).collect()
}

/// Files gained from ingestion, plus warnings for the URLs that failed.
#[derive(Debug, Default)]
pub struct IngestionReport {
    pub added: Vec<FileRecord>,
    pub warnings: Vec<String>,
}

/// Submits each URL for embedding and resolves successful ones to file rows.
///
/// Files already present in `pending` or `attached` are not added again.
/// Failures never abort the turn; they become warnings.
pub async fn ingest_urls(
    ingestion: &dyn WebIngestion,
    persistence: &dyn Persistence,
    workspace_id: &str,
    urls: &[&str],
    pending: &[FileRecord],
    attached: &[FileRecord],
) -> IngestionReport {
    let mut report = IngestionReport::default();

    for url in urls {
        let response = match ingestion
            .process_url(EmbeddingsProvider::Openai, workspace_id, url)
            .await
        {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                warn!(url, message = %response.message, "web ingestion rejected url");
                report.warnings.push("Failed to process websites.".to_string());
                continue;
            }
            Err(e) => {
                warn!(url, error = %e, "web ingestion failed");
                report.warnings.push("Failed to process websites.".to_string());
                continue;
            }
        };

        let file = match response.file_id.as_deref() {
            Some(file_id) => persistence.get_file_by_id(file_id).await,
            None => Ok(None),
        };
        match file {
            Ok(Some(file)) => {
                let known = pending
                    .iter()
                    .chain(attached)
                    .chain(&report.added)
                    .any(|f| f.id == file.id);
                if known {
                    debug!(url, file_id = %file.id, "ingested file already attached");
                } else {
                    debug!(url, file_id = %file.id, "ingested url attached as file");
                    report.added.push(file);
                }
            }
            Ok(None) => {
                warn!(url, "ingested file not found");
                report.warnings.push("File not found in database.".to_string());
            }
            Err(e) => {
                warn!(url, error = %e, "failed to load ingested file");
                report.warnings.push("File not found in database.".to_string());
            }
        }
    }

    report
}
